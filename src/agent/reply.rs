use serde_json::{Map, Value};

/// A reasoning-service reply after JSON extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    Structured(Map<String, Value>),
    /// Neither the whole reply nor its outermost `{...}` span is a JSON object.
    Malformed(String),
}

/// Parse the reply as a JSON object. When the raw text has prose around the
/// object, retry on the span from the first `{` to the last `}`.
pub fn parse_reply(raw: &str) -> ParsedReply {
    if let Some(obj) = as_object(raw.trim()) {
        return ParsedReply::Structured(obj);
    }
    if let Some(obj) = salvage(raw) {
        return ParsedReply::Structured(obj);
    }
    ParsedReply::Malformed(raw.to_string())
}

fn as_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(obj) => Some(obj),
        _ => None,
    }
}

fn salvage(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&raw[start..=end])
}

/// String field, or `default` when absent or not a string.
pub fn str_field<'a>(obj: &'a Map<String, Value>, key: &str, default: &'a str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Boolean field; `"true"`/`"false"` strings are accepted.
pub fn bool_field(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
