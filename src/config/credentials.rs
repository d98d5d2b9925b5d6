use tracing::debug;

/// Resolve a credential value. If the value starts with '$', treat it as an
/// environment variable reference and resolve from the environment.
pub fn resolve_credential(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved credential from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "Environment variable not set, using literal");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

/// Replace every occurrence of the given secrets with `[REDACTED]`.
/// Secrets shorter than four characters are left alone.
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if !secret.is_empty() && secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}

/// Short masked form of an API key for display: first and last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credential_literal() {
        assert_eq!(resolve_credential("sk-literal"), "sk-literal");
    }

    #[test]
    fn test_resolve_credential_env_var() {
        std::env::set_var("TEST_VULNAGENT_KEY", "secret123");
        assert_eq!(resolve_credential("$TEST_VULNAGENT_KEY"), "secret123");
        std::env::remove_var("TEST_VULNAGENT_KEY");
    }

    #[test]
    fn test_resolve_credential_missing_env_var() {
        let result = resolve_credential("$NONEXISTENT_VULNAGENT_VAR");
        assert_eq!(result, "$NONEXISTENT_VULNAGENT_VAR");
    }

    #[test]
    fn test_redact_credentials() {
        let text = "Authorization: Bearer sk-abc123XYZ failed";
        let redacted = redact_credentials(text, &["sk-abc123XYZ"]);
        assert_eq!(redacted, "Authorization: Bearer [REDACTED] failed");
    }

    #[test]
    fn test_redact_credentials_short_secret_ignored() {
        let text = "key=ab";
        let redacted = redact_credentials(text, &["ab"]);
        assert_eq!(redacted, "key=ab");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-1234567890abcd"), "sk-1...abcd");
        assert_eq!(mask_key("short"), "*****");
    }
}
