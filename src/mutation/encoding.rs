use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::spec::Encoding;

/// Apply `encoding` to a mutation value. Values that can't be decoded come
/// back unchanged.
pub fn apply_encoding(value: &str, encoding: Encoding) -> String {
    match encoding {
        Encoding::None => value.to_string(),
        Encoding::UrlEncode => form_encode(value),
        Encoding::UrlDecode => form_decode(value).unwrap_or_else(|| value.to_string()),
        Encoding::Base64Encode => STANDARD.encode(value.as_bytes()),
        Encoding::Base64Decode => match STANDARD.decode(value.trim()) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => value.to_string(),
        },
        Encoding::HtmlEntityEncode => html_entity_encode(value),
    }
}

/// `application/x-www-form-urlencoded` encoding: percent-encoding with spaces as `+`.
fn form_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

fn form_decode(value: &str) -> Option<String> {
    urlencoding::decode(&value.replace('+', " ")).ok().map(|s| s.into_owned())
}

fn html_entity_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
