//! Lead records and import-row normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{CoreError, Result};
use crate::LeadId;

/// A lead as stored in the shared pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Row identifier.
    pub id: LeadId,
    /// Company name (always present).
    pub company: String,
    /// Company website.
    pub website: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Open key/value attributes.
    #[serde(default)]
    pub meta: Value,
    /// Import time.
    pub created_at: DateTime<Utc>,
}

/// A normalized lead ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    /// Company name, trimmed and non-empty.
    pub company: String,
    /// Trimmed website, if any.
    pub website: Option<String>,
    /// Trimmed email, if any.
    pub email: Option<String>,
    /// Trimmed phone, if any.
    pub phone: Option<String>,
    /// Attribute map; empty when the source had none.
    pub meta: Map<String, Value>,
}

/// An import row as submitted by a client. Every field is loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLeadRow {
    /// Company name (required after normalization).
    #[serde(default)]
    pub company: Option<Value>,
    /// Website.
    #[serde(default)]
    pub website: Option<Value>,
    /// Email.
    #[serde(default)]
    pub email: Option<Value>,
    /// Phone.
    #[serde(default)]
    pub phone: Option<Value>,
    /// Structured map or a JSON string.
    #[serde(default)]
    pub meta: Option<Value>,
}

impl RawLeadRow {
    /// Normalize the row, returning `None` when it has no usable company.
    #[must_use]
    pub fn normalize(&self) -> Option<NewLead> {
        let company = to_text(self.company.as_ref())?;

        let meta = match &self.meta {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::String(s)) => parse_meta_text(s),
            _ => Map::new(),
        };

        Some(NewLead {
            company,
            website: to_text(self.website.as_ref()),
            email: to_text(self.email.as_ref()),
            phone: to_text(self.phone.as_ref()),
            meta,
        })
    }
}

/// Normalize a batch of raw rows, silently dropping rows without a company.
///
/// # Errors
///
/// - `CoreError::Required("rows")` if the batch is empty.
/// - `CoreError::NoValidRows` if every row was dropped.
pub fn normalize_rows(rows: &[RawLeadRow]) -> Result<Vec<NewLead>> {
    if rows.is_empty() {
        return Err(CoreError::Required("rows"));
    }

    let normalized: Vec<NewLead> = rows.iter().filter_map(RawLeadRow::normalize).collect();
    if normalized.is_empty() {
        return Err(CoreError::NoValidRows);
    }

    Ok(normalized)
}

/// Parse a textual `meta` value.
///
/// A JSON object is used as is; anything else (invalid JSON or a non-object
/// value) is kept verbatim under the `raw` key.
#[must_use]
pub fn parse_meta_text(text: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert("raw".into(), Value::String(text.to_string()));
            map
        }
    }
}

/// Coerce a scalar JSON value to trimmed, non-empty text.
fn to_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Whole-valued floats print without a fractional part, so `3.0` reads `3`.
#[allow(clippy::float_cmp)]
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            if f == 0.0 {
                "0".to_string()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}
