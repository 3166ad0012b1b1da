//! Defensive decoding of service responses.
//!
//! Endpoints under test have returned JSON, plain text, and empty bodies for
//! the same route depending on deploy state. Parsing therefore never fails:
//! anything that does not decode is retained as raw text, and field access
//! goes through an ordered list of candidate paths where both absence and
//! type mismatch resolve to `None`.

use serde_json::Value;

/// Outcome of decoding a raw response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Json(Value),
    Raw(String),
}

impl Parsed {
    pub fn into_json(self) -> Option<Value> {
        match self {
            Parsed::Json(value) => Some(value),
            Parsed::Raw(_) => None,
        }
    }
}

/// Decode a raw body. Non-JSON input is kept verbatim, never an error.
pub fn parse(raw: &str) -> Parsed {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Parsed::Json(value),
        Err(_) => Parsed::Raw(raw.to_string()),
    }
}

/// Resolve the first candidate path that exists in `value`.
///
/// Each candidate is a field path tried against nested objects. A path step
/// into a non-object, or a missing key, moves on to the next candidate.
pub fn lookup<'a>(value: &'a Value, candidates: &[&[&str]]) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|path| resolve_path(value, path))
}

fn resolve_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// `lookup` restricted to string values.
pub fn lookup_str<'a>(value: &'a Value, candidates: &[&[&str]]) -> Option<&'a str> {
    lookup(value, candidates).and_then(Value::as_str)
}

/// `lookup` for identifier-shaped values: strings pass through, integers are
/// stringified. Some deployments return numeric row ids where others return
/// UUID strings.
pub fn lookup_id(value: &Value, candidates: &[&[&str]]) -> Option<String> {
    match lookup(value, candidates)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a well-formed response carries a top-level `error` field.
pub fn has_error_field(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("error"))
}

/// Whether the serialized form of a response mentions "error" anywhere.
/// Looser than `has_error_field`; used for endpoints that bury failures in
/// nested payloads.
pub fn text_contains_error(value: &Value) -> bool {
    value.to_string().contains("error")
}
