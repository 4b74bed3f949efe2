//! CSV ingestion for lead imports.
//!
//! The parser is line based: input is split into lines first, so quoted
//! fields may contain commas and doubled quotes but not newlines.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::lead::{parse_meta_text, NewLead};

const COMPANY_COLUMNS: [&str; 3] = ["company", "company_name", "name"];
const WEBSITE_COLUMNS: [&str; 2] = ["website", "domain"];
const EMAIL_COLUMNS: [&str; 1] = ["email"];
const PHONE_COLUMNS: [&str; 2] = ["phone", "phone_number"];
const META_COLUMN: &str = "meta";

/// Split one CSV line into trimmed fields.
///
/// A doubled quote inside a quoted field yields one literal quote.
#[must_use]
pub fn split_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut cur)),
            _ => cur.push(ch),
        }
    }
    out.push(cur);

    out.into_iter().map(|s| s.trim().to_string()).collect()
}

/// Turn a header cell into a field key: lower-case, whitespace runs as `_`.
#[must_use]
pub fn header_key(cell: &str) -> String {
    cell.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Parse CSV text into normalized leads. Rows without a company are skipped.
#[must_use]
pub fn parse_leads_csv(text: &str) -> Vec<NewLead> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = text.trim().lines().filter(|l| !l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let header: Vec<String> = split_line(header_line).iter().map(|h| header_key(h)).collect();

    lines
        .filter_map(|line| {
            let cols = split_line(line);
            let record: HashMap<&str, &str> = header
                .iter()
                .enumerate()
                .map(|(j, key)| (key.as_str(), cols.get(j).map_or("", String::as_str)))
                .collect();
            lead_from_record(&record)
        })
        .collect()
}

fn lead_from_record(record: &HashMap<&str, &str>) -> Option<NewLead> {
    let company = first_value(record, &COMPANY_COLUMNS)?;

    let meta = match record.get(META_COLUMN).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => parse_meta_text(raw),
        None => extra_columns(record),
    };

    Some(NewLead {
        company,
        website: first_value(record, &WEBSITE_COLUMNS),
        email: first_value(record, &EMAIL_COLUMNS),
        phone: first_value(record, &PHONE_COLUMNS),
        meta,
    })
}

/// First non-empty value among synonym columns.
fn first_value(record: &HashMap<&str, &str>, columns: &[&str]) -> Option<String> {
    columns
        .iter()
        .filter_map(|c| record.get(c))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_base_column(key: &str) -> bool {
    key == META_COLUMN
        || COMPANY_COLUMNS.contains(&key)
        || WEBSITE_COLUMNS.contains(&key)
        || EMAIL_COLUMNS.contains(&key)
        || PHONE_COLUMNS.contains(&key)
}

fn extra_columns(record: &HashMap<&str, &str>) -> Map<String, Value> {
    record
        .iter()
        .filter(|(k, v)| !is_base_column(k) && !v.trim().is_empty())
        .map(|(k, v)| ((*k).to_string(), Value::String(v.trim().to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_field_with_comma_and_escaped_quotes() {
        let fields = split_line(r#""Acme, Inc.""Premium""",acme.io"#);
        assert_eq!(fields, vec![r#"Acme, Inc."Premium""#, "acme.io"]);
    }

    #[test]
    fn split_trims_fields_and_keeps_empty_trailing_field() {
        assert_eq!(split_line(" a , b ,"), vec!["a", "b", ""]);
    }

    #[test]
    fn header_is_lowercased_with_underscores() {
        assert_eq!(header_key("Company   Name"), "company_name");
        assert_eq!(header_key("Phone\tNumber"), "phone_number");
    }

    #[test]
    fn parses_synonym_columns() {
        let csv = "Company Name,Domain,Email,Phone Number\r\nAcme,acme.io,a@acme.io,555-0100\r\n";
        let leads = parse_leads_csv(csv);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].company, "Acme");
        assert_eq!(leads[0].website.as_deref(), Some("acme.io"));
        assert_eq!(leads[0].email.as_deref(), Some("a@acme.io"));
        assert_eq!(leads[0].phone.as_deref(), Some("555-0100"));
        assert!(leads[0].meta.is_empty());
    }

    #[test]
    fn extra_columns_fold_into_meta() {
        let csv = "company,industry,employees,notes\nAcme,Widgets,40,\n";
        let leads = parse_leads_csv(csv);

        assert_eq!(leads[0].meta["industry"], "Widgets");
        assert_eq!(leads[0].meta["employees"], "40");
        assert!(!leads[0].meta.contains_key("notes"));
    }

    #[test]
    fn explicit_meta_column_wins_over_extras() {
        let csv = "company,industry,meta\nAcme,Widgets,\"{\"\"tier\"\":\"\"gold\"\"}\"\nGlobex,Gas,oops\n";
        let leads = parse_leads_csv(csv);

        assert_eq!(leads[0].meta["tier"], "gold");
        assert!(!leads[0].meta.contains_key("industry"));
        assert_eq!(leads[1].meta["raw"], "oops");
    }

    #[test]
    fn rows_without_company_and_blank_lines_are_skipped() {
        let csv = "company,email\n\n,nobody@x.io\nAcme,\n   \n";
        let leads = parse_leads_csv(csv);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].company, "Acme");
        assert_eq!(leads[0].email, None);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_leads_csv("").is_empty());
        assert!(parse_leads_csv("company,email").is_empty());
    }
}
