//! Redaction of lead fields for users without an entitlement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Lead, LeadId};

/// Placeholder shown for a missing value.
pub const EMPTY_PLACEHOLDER: &str = "—";

/// Mask a company name (also used for websites).
#[must_use]
pub fn mask_company(name: Option<&str>) -> String {
    let s: Vec<char> = name.unwrap_or("").trim().chars().collect();
    match s.len() {
        0 => EMPTY_PLACEHOLDER.to_string(),
        1 | 2 => format!("{}*", s[0]),
        3..=5 => format!("{}{}", prefix(&s, 2), "*".repeat(s.len() - 2)),
        n => format!("{}{}", prefix(&s, 3), "*".repeat((n - 3).min(6))),
    }
}

/// Mask an email address, keeping the first character of each part and the TLD.
#[must_use]
pub fn mask_email(email: Option<&str>) -> String {
    let s = email.unwrap_or("").trim();
    if s.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let at = match s.find('@') {
        Some(at) if at > 0 => at,
        _ => return "***@***".to_string(),
    };
    let local = &s[..at];
    let domain = &s[at + 1..];

    let (domain_name, tld) = match domain.rfind('.') {
        Some(dot) if dot > 0 => (&domain[..dot], &domain[dot..]),
        _ => (domain, ""),
    };

    format!("{}@{}{tld}", mask_part(local, 4), mask_part(domain_name, 6))
}

/// Mask a phone number, keeping only its last two digits.
#[must_use]
pub fn mask_phone(phone: Option<&str>) -> String {
    let s = phone.unwrap_or("").trim();
    if s.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    let digits: Vec<char> = s.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return "***".to_string();
    }

    let last2: String = digits[digits.len() - 2..].iter().collect();
    format!("***-***-**{last2}")
}

fn prefix(chars: &[char], n: usize) -> String {
    chars.iter().take(n).collect()
}

fn mask_part(part: &str, cap: usize) -> String {
    let chars: Vec<char> = part.chars().collect();
    let Some(first) = chars.first() else {
        // An empty domain name still renders one star.
        return "*".to_string();
    };
    if chars.len() <= 2 {
        format!("{first}*")
    } else {
        format!("{first}{}", "*".repeat((chars.len() - 1).min(cap)))
    }
}

/// A lead rendered for one viewer: full when entitled, redacted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadView {
    /// Lead identifier (always visible, needed to claim).
    pub id: LeadId,
    /// Company name.
    pub company: String,
    /// Website.
    pub website: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Attributes; empty when redacted.
    pub meta: serde_json::Value,
    /// Whether the viewer holds an entitlement for this lead.
    pub entitled: bool,
    /// Import time.
    pub created_at: DateTime<Utc>,
}

impl LeadView {
    /// Choose the rendering for a viewer based on their entitlement.
    #[must_use]
    pub fn render(lead: &Lead, entitled: bool) -> Self {
        if entitled {
            return Self {
                id: lead.id,
                company: lead.company.clone(),
                website: lead.website.clone(),
                email: lead.email.clone(),
                phone: lead.phone.clone(),
                meta: lead.meta.clone(),
                entitled,
                created_at: lead.created_at,
            };
        }

        Self {
            id: lead.id,
            company: mask_company(Some(&lead.company)),
            website: Some(mask_company(lead.website.as_deref())),
            email: Some(mask_email(lead.email.as_deref())),
            phone: Some(mask_phone(lead.phone.as_deref())),
            meta: serde_json::Value::Object(serde_json::Map::new()),
            entitled,
            created_at: lead.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_masking_by_length() {
        assert_eq!(mask_company(None), "—");
        assert_eq!(mask_company(Some("  ")), "—");
        assert_eq!(mask_company(Some("AB")), "A*");
        assert_eq!(mask_company(Some("Acme")), "Ac**");
        assert_eq!(mask_company(Some("Globex")), "Glo***");
        assert_eq!(mask_company(Some("International Widgets")), "Int******");
    }

    #[test]
    fn email_masking_keeps_tld() {
        assert_eq!(mask_email(Some("jane.doe@example.com")), "j****@e******.com");
        assert_eq!(mask_email(Some("jo@ab.io")), "j*@a*.io");
        assert_eq!(mask_email(Some("@example.com")), "***@***");
        assert_eq!(mask_email(Some("plain")), "***@***");
        assert_eq!(mask_email(Some("")), "—");
    }

    #[test]
    fn phone_masking_keeps_last_two_digits() {
        assert_eq!(mask_phone(Some("+1 (555) 010-0199")), "***-***-**99");
        assert_eq!(mask_phone(Some("12")), "***");
        assert_eq!(mask_phone(None), "—");
    }

    fn lead() -> Lead {
        Lead {
            id: LeadId::generate(),
            company: "Acme Corporation".into(),
            website: Some("acme.io".into()),
            email: Some("sales@acme.io".into()),
            phone: Some("555-0142".into()),
            meta: serde_json::json!({ "industry": "widgets" }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn entitled_view_is_unmasked() {
        let lead = lead();
        let view = LeadView::render(&lead, true);

        assert!(view.entitled);
        assert_eq!(view.company, lead.company);
        assert_eq!(view.email, lead.email);
        assert_eq!(view.meta, lead.meta);
    }

    #[test]
    fn unentitled_view_is_redacted() {
        let view = LeadView::render(&lead(), false);

        assert!(!view.entitled);
        assert_eq!(view.company, "Acm******");
        assert_eq!(view.website.as_deref(), Some("acm****"));
        assert_eq!(view.email.as_deref(), Some("s****@a***.io"));
        assert_eq!(view.phone.as_deref(), Some("***-***-**42"));
        assert_eq!(view.meta, serde_json::json!({}));
    }
}
