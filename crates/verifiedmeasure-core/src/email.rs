//! Work-email check used at signup.

/// Consumer mailbox providers that do not count as a work address.
pub const PERSONAL_DOMAINS: [&str; 10] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "proton.me",
    "protonmail.com",
    "gmx.com",
    "live.com",
];

/// Check whether `email` looks like a work address.
///
/// The address must be `local@domain` with exactly one `@` and non-empty
/// parts, and the domain must not be a known personal provider.
#[must_use]
pub fn is_work_email(email: &str) -> bool {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    !PERSONAL_DOMAINS.contains(&domain)
}
