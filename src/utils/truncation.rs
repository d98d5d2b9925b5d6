/// Cap applied to request and response bodies before they enter a prompt.
pub const MAX_BODY_LENGTH: usize = 2048;

const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// Truncate a body to `MAX_BODY_LENGTH` bytes, appending a marker when cut.
/// Never splits a UTF-8 character.
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_LENGTH {
        return body.to_string();
    }
    let end = floor_char_boundary(body, MAX_BODY_LENGTH);
    format!("{}{}", &body[..end], TRUNCATION_MARKER)
}

/// Shorten a value for one-line display, e.g. in mutation descriptions.
pub fn elide(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let head: String = value.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
