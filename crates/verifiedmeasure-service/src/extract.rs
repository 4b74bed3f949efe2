//! Request extraction.
//!
//! Clients send hand-built JSON. A body that is not a JSON object is read as
//! `{}` so the caller gets the validation error for the field it is missing
//! instead of a parse error. Every extractor here rejects with [`ApiError`],
//! so unreadable bodies and queries still answer with the JSON error shape.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A request body read as a JSON object, or `{}` when it is not one.
#[derive(Debug, Clone, Default)]
pub struct LooseJson(pub Map<String, Value>);

#[axum::async_trait]
impl<S> FromRequest<S> for LooseJson
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        Ok(Self::parse(&bytes))
    }
}

/// A request body read as UTF-8 text.
#[derive(Debug, Clone, Default)]
pub struct TextBody(pub String);

#[axum::async_trait]
impl<S> FromRequest<S> for TextBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let text = String::from_request(req, state).await?;
        Ok(Self(text))
    }
}

/// Query parameters deserialized into `T`.
#[derive(Debug, Clone, Default)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl LooseJson {
    /// Parse raw bytes, falling back to an empty object.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Self(map),
            _ => Self::default(),
        }
    }

    /// A field as text. Strings are returned as is, other scalars are
    /// stringified, and `null` or a missing key yields `None`.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// A field as a number. Numeric strings are accepted; anything else
    /// yields NaN so range checks reject it.
    #[must_use]
    pub fn number(&self, key: &str) -> f64 {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    /// A field as an array; anything else is treated as empty.
    #[must_use]
    pub fn array(&self, key: &str) -> &[Value] {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_body_is_empty_object() {
        assert!(LooseJson::parse(b"{not json").0.is_empty());
        assert!(LooseJson::parse(b"[1,2]").0.is_empty());
        assert!(LooseJson::parse(b"").0.is_empty());
    }

    #[test]
    fn text_stringifies_scalars() {
        let body = LooseJson::parse(br#"{"a":"x","b":12,"c":true,"d":null}"#);
        assert_eq!(body.text("a").as_deref(), Some("x"));
        assert_eq!(body.text("b").as_deref(), Some("12"));
        assert_eq!(body.text("c").as_deref(), Some("true"));
        assert_eq!(body.text("d"), None);
        assert_eq!(body.text("missing"), None);
    }

    #[test]
    fn number_accepts_numeric_strings() {
        let body = LooseJson::parse(br#"{"a":2.5,"b":" 40 ","c":"lots","d":[1]}"#);
        assert!((body.number("a") - 2.5).abs() < f64::EPSILON);
        assert!((body.number("b") - 40.0).abs() < f64::EPSILON);
        assert!(body.number("c").is_nan());
        assert!(body.number("d").is_nan());
        assert!(body.number("missing").is_nan());
    }

    #[test]
    fn array_defaults_to_empty() {
        let body = LooseJson::parse(br#"{"rows":[{}],"ids":"abc"}"#);
        assert_eq!(body.array("rows").len(), 1);
        assert!(body.array("ids").is_empty());
    }
}
