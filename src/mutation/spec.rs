use serde_json::Value;
use std::fmt;

use crate::errors::VulnAgentError;

/// Value the reasoning service sends to ask for a corpus payload.
pub const AUTO_PAYLOAD: &str = "auto";

/// Where a mutation lands in the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationTarget {
    UrlQuery { name: String },
    UrlPath,
    PostBody { name: String },
    JsonBody { name: String },
    Header { name: String },
    Cookie { name: String },
    RawBody,
    FileUpload { name: Option<String> },
}

impl MutationTarget {
    /// Wire name of the target kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UrlQuery { .. } => "url_query",
            Self::UrlPath => "url_path",
            Self::PostBody { .. } => "post_body",
            Self::JsonBody { .. } => "json",
            Self::Header { .. } => "header",
            Self::Cookie { .. } => "cookie",
            Self::RawBody => "raw_body",
            Self::FileUpload { .. } => "file_upload",
        }
    }

    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::UrlQuery { name }
            | Self::PostBody { name }
            | Self::JsonBody { name }
            | Self::Header { name }
            | Self::Cookie { name } => Some(name),
            Self::FileUpload { name } => name.as_deref(),
            Self::UrlPath | Self::RawBody => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    None,
    UrlEncode,
    UrlDecode,
    Base64Encode,
    Base64Decode,
    HtmlEntityEncode,
}

impl Encoding {
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "" | "none" => Some(Self::None),
            "url_encode" => Some(Self::UrlEncode),
            "url_decode" => Some(Self::UrlDecode),
            "base64" | "base64_encode" => Some(Self::Base64Encode),
            "base64_decode" => Some(Self::Base64Decode),
            "html_entity" | "html_entity_encode" => Some(Self::HtmlEntityEncode),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::UrlEncode => "url_encode",
            Self::UrlDecode => "url_decode",
            Self::Base64Encode => "base64_encode",
            Self::Base64Decode => "base64_decode",
            Self::HtmlEntityEncode => "html_entity_encode",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request modification proposed by the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSpec {
    pub target: MutationTarget,
    pub value: String,
    pub encoding: Encoding,
}

impl MutationSpec {
    pub fn new(target: MutationTarget, value: impl Into<String>) -> Self {
        Self { target, value: value.into(), encoding: Encoding::None }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// True when a file upload should draw the next corpus payload.
    pub fn wants_corpus_payload(&self) -> bool {
        matches!(self.target, MutationTarget::FileUpload { .. })
            && (self.value.is_empty() || self.value == AUTO_PAYLOAD)
    }

    /// Parse a `request_modification` object:
    /// `{"type": ..., "parameter": ..., "value": ..., "encoding": ...}`.
    pub fn from_json(modification: &Value) -> Result<Self, VulnAgentError> {
        let obj = modification.as_object().ok_or_else(|| {
            VulnAgentError::Protocol("request_modification must be a JSON object".into())
        })?;

        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| VulnAgentError::Protocol("Missing type in request_modification".into()))?;
        let parameter = obj
            .get("parameter")
            .and_then(scalar_text)
            .filter(|p| !p.is_empty());
        let value = obj.get("value").and_then(scalar_text).unwrap_or_default();
        let encoding = match obj.get("encoding").and_then(Value::as_str) {
            Some(name) => Encoding::parse(name).ok_or_else(|| {
                VulnAgentError::Protocol(format!("Unknown encoding: {}", name))
            })?,
            None => Encoding::None,
        };

        let named = |parameter: Option<String>| {
            parameter.ok_or_else(|| {
                VulnAgentError::Protocol(format!("Missing parameter for {} modification", kind))
            })
        };

        let target = match kind.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "url_query" => MutationTarget::UrlQuery { name: named(parameter)? },
            "url_path" => MutationTarget::UrlPath,
            "post_body" => MutationTarget::PostBody { name: named(parameter)? },
            "json" | "json_body" => MutationTarget::JsonBody { name: named(parameter)? },
            "header" => MutationTarget::Header { name: named(parameter)? },
            "cookie" => MutationTarget::Cookie { name: named(parameter)? },
            "raw_body" => MutationTarget::RawBody,
            "file_upload" | "multipart" => MutationTarget::FileUpload { name: parameter },
            other => {
                return Err(VulnAgentError::Protocol(format!("Unknown modification type: {}", other)));
            }
        };

        Ok(Self { target, value, encoding })
    }
}

/// Strings as-is; numbers and booleans by their JSON text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query_modification() {
        let spec = MutationSpec::from_json(&json!({
            "type": "url_query",
            "parameter": "id",
            "value": "1' OR '1'='1",
            "encoding": "url_encode"
        }))
        .unwrap();
        assert_eq!(spec.target, MutationTarget::UrlQuery { name: "id".into() });
        assert_eq!(spec.value, "1' OR '1'='1");
        assert_eq!(spec.encoding, Encoding::UrlEncode);
    }

    #[test]
    fn test_aliases_and_hyphens() {
        let spec = MutationSpec::from_json(&json!({"type": "json-body", "parameter": "id", "value": 2})).unwrap();
        assert_eq!(spec.target, MutationTarget::JsonBody { name: "id".into() });
        assert_eq!(spec.value, "2");

        let spec = MutationSpec::from_json(&json!({"type": "multipart", "encoding": "base64"})).unwrap();
        assert_eq!(spec.target, MutationTarget::FileUpload { name: None });
        assert_eq!(spec.encoding, Encoding::Base64Encode);
        assert!(spec.wants_corpus_payload());
    }

    #[test]
    fn test_unknown_type_is_protocol_error() {
        let err = MutationSpec::from_json(&json!({"type": "smtp", "value": "x"})).unwrap_err();
        assert!(matches!(err, VulnAgentError::Protocol(_)));
        assert!(err.to_string().contains("Unknown modification type: smtp"));
    }

    #[test]
    fn test_named_kind_requires_parameter() {
        let err = MutationSpec::from_json(&json!({"type": "header", "value": "x"})).unwrap_err();
        assert!(matches!(err, VulnAgentError::Protocol(_)));
        assert!(MutationSpec::from_json(&json!({"type": "raw_body", "value": "x"})).is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(MutationSpec::from_json(&json!("url_query")).is_err());
        assert!(MutationSpec::from_json(&json!({"parameter": "id"})).is_err());
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = MutationSpec::from_json(&json!({"type": "raw_body", "encoding": "rot13"})).unwrap_err();
        assert!(err.to_string().contains("Unknown encoding"));
    }
}
