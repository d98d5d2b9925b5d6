use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "llm": {
                "type": "object",
                "properties": {
                    "provider": {
                        "type": "string",
                        "enum": ["OpenAI", "Azure", "Local", "Anthropic", "openai", "azure", "local", "anthropic"]
                    },
                    "api_key": { "type": "string" },
                    "model": { "type": "string", "minLength": 1 },
                    "base_url": { "type": "string", "pattern": "^https?://" },
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "temperature": { "type": "number", "minimum": 0, "maximum": 2 }
                }
            },
            "policy": {
                "type": "object",
                "properties": {
                    "sql_injection": { "type": "boolean" },
                    "xss": { "type": "boolean" },
                    "idor": { "type": "boolean" },
                    "ssrf": { "type": "boolean" },
                    "file_upload": { "type": "boolean" },
                    "rce": { "type": "boolean" },
                    "business_logic": { "type": "boolean" },
                    "max_iterations": { "type": "integer", "minimum": 1 },
                    "confidence_level": {
                        "type": "string",
                        "enum": ["Low", "Medium", "High", "low", "medium", "high"]
                    }
                }
            },
            "scope": {
                "type": "object",
                "properties": {
                    "include_hosts": { "type": "array", "items": { "type": "string" } },
                    "exclude_hosts": { "type": "array", "items": { "type": "string" } },
                    "exclude_extensions": { "type": "array", "items": { "type": "string" } }
                }
            },
            "scheduler": {
                "type": "object",
                "properties": {
                    "concurrency": { "type": "integer", "minimum": 1 }
                }
            },
            "http": {
                "type": "object",
                "properties": {
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "accept_invalid_certs": { "type": "boolean" },
                    "follow_redirects": { "type": "boolean" }
                }
            }
        }
    })
});
