//! `multipart/form-data` encoding and field extraction.

const BOUNDARY_PREFIX: &str = "----WebKitFormBoundary";

/// Fresh boundary token: a fixed marker plus 16 random hex characters.
pub fn generate_boundary() -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", BOUNDARY_PREFIX, &token[..16])
}

/// Extract the `boundary=` parameter from a multipart `Content-Type` value.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    if !content_type.to_ascii_lowercase().starts_with("multipart/") {
        return None;
    }
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Builds a multipart body part by part.
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new(boundary: String) -> Self {
        Self { boundary, body: Vec::new() }
    }

    pub fn add_file(&mut self, field: &str, filename: &str, content_type: &str, content: &[u8]) {
        self.open_part();
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                field, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
    }

    pub fn add_field(&mut self, name: &str, value: &str) {
        self.open_part();
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
        );
    }

    /// Copy an already encoded part (headers, blank line, content and the
    /// trailing line break) under this builder's boundary.
    pub fn add_raw_part(&mut self, part: &[u8]) {
        self.open_part();
        self.body.extend_from_slice(part);
    }

    /// Close the body and return `(content_type_header_value, body)`.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (format!("multipart/form-data; boundary={}", self.boundary), self.body)
    }

    fn open_part(&mut self) {
        self.body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

/// Non-file fields of a multipart body, in order.
pub fn parse_form_fields(body: &[u8], boundary: &str) -> Vec<(String, String)> {
    split_parts(body, boundary)
        .into_iter()
        .filter_map(Part::parse)
        .filter(|part| part.filename.is_none())
        .filter_map(|part| Some((part.name?, String::from_utf8_lossy(part.value).into_owned())))
        .collect()
}

/// Rewrite a multipart body with the first non-file field `name` set to
/// `value`, or with the field appended when absent. Every other part is
/// copied byte for byte and the boundary is kept.
pub fn set_form_field(body: &[u8], boundary: &str, name: &str, value: &str) -> Vec<u8> {
    let mut builder = MultipartBuilder::new(boundary.to_string());
    let mut replaced = false;
    for raw in split_parts(body, boundary) {
        let is_target = !replaced
            && Part::parse(raw).is_some_and(|p| p.filename.is_none() && p.name.as_deref() == Some(name));
        if is_target {
            builder.add_field(name, value);
            replaced = true;
        } else {
            builder.add_raw_part(raw);
        }
    }
    if !replaced {
        builder.add_field(name, value);
    }
    builder.finish().1
}

struct Part<'a> {
    name: Option<String>,
    filename: Option<String>,
    value: &'a [u8],
}

impl<'a> Part<'a> {
    fn parse(raw: &'a [u8]) -> Option<Self> {
        let (head_end, separator) = match find_subslice(raw, b"\r\n\r\n") {
            Some(i) => (i, 4),
            None => (find_subslice(raw, b"\n\n")?, 2),
        };
        let head = String::from_utf8_lossy(&raw[..head_end]);
        let disposition = head
            .lines()
            .find(|l| l.to_ascii_lowercase().starts_with("content-disposition:"))?;
        let value = &raw[head_end + separator..];
        let value = value
            .strip_suffix(b"\r\n")
            .or_else(|| value.strip_suffix(b"\n"))
            .unwrap_or(value);
        Some(Self {
            name: disposition_param(disposition, "name"),
            filename: disposition_param(disposition, "filename"),
            value,
        })
    }
}

/// Raw parts between delimiters, each starting at its first header line and
/// ending with the line break before the next delimiter. Preamble and
/// epilogue are dropped.
fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();
    let mut parts = Vec::new();
    let Some(first) = find_subslice(body, delimiter) else {
        return parts;
    };
    let mut rest = &body[first + delimiter.len()..];
    while !rest.starts_with(b"--") {
        let next = find_subslice(rest, delimiter);
        let segment = match next {
            Some(i) => &rest[..i],
            None => rest,
        };
        let segment = segment
            .strip_prefix(b"\r\n")
            .or_else(|| segment.strip_prefix(b"\n"))
            .unwrap_or(segment);
        parts.push(segment);
        match next {
            Some(i) => rest = &rest[i + delimiter.len()..],
            None => break,
        }
    }
    parts
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn disposition_param(line: &str, key: &str) -> Option<String> {
    line.split(';').skip(1).find_map(|param| {
        let (k, v) = param.trim().split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_fresh_and_prefixed() {
        let a = generate_boundary();
        let b = generate_boundary();
        assert!(a.starts_with(BOUNDARY_PREFIX));
        assert_eq!(a.len(), BOUNDARY_PREFIX.len() + 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type("multipart/form-data; boundary=\"abc123\""),
            Some("abc123".to_string())
        );
        assert_eq!(boundary_from_content_type("application/json"), None);
    }

    #[test]
    fn test_builder_layout() {
        let mut builder = MultipartBuilder::new("XYZ".to_string());
        builder.add_file("avatar", "a.php", "image/png", b"<?php ?>");
        builder.add_field("user", "bob");
        let (ct, body) = builder.finish();
        assert_eq!(ct, "multipart/form-data; boundary=XYZ");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(
            text,
            "--XYZ\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"a.php\"\r\n\
             Content-Type: image/png\r\n\r\n<?php ?>\r\n\
             --XYZ\r\nContent-Disposition: form-data; name=\"user\"\r\n\r\nbob\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn test_parse_form_fields_skips_files() {
        let body = "--B\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n\
                    --B\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"x.txt\"\r\n\
                    Content-Type: text/plain\r\n\r\ncontent\r\n\
                    --B\r\nContent-Disposition: form-data; name=\"csrf\"\r\n\r\ntok\r\n--B--\r\n";
        let fields = parse_form_fields(body.as_bytes(), "B");
        assert_eq!(
            fields,
            vec![
                ("title".to_string(), "hello".to_string()),
                ("csrf".to_string(), "tok".to_string()),
            ]
        );
    }

    fn profile_form() -> (String, Vec<u8>) {
        let mut builder = MultipartBuilder::new("B".to_string());
        builder.add_field("user", "bob");
        builder.add_file("avatar", "me.png", "image/png", b"\x89PNG\r\n\x1a\n\xff\x00");
        builder.add_field("role", "member");
        builder.finish()
    }

    #[test]
    fn test_set_form_field_replaces_value_and_keeps_file_bytes() {
        let (_, body) = profile_form();
        let out = set_form_field(&body, "B", "role", "admin");

        assert_eq!(
            parse_form_fields(&out, "B"),
            vec![("user".to_string(), "bob".to_string()), ("role".to_string(), "admin".to_string())]
        );
        let file = b"filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n\x89PNG\r\n\x1a\n\xff\x00\r\n--B\r\n";
        assert!(out.windows(file.len()).any(|w| w == file));
        assert!(out.ends_with(b"--B--\r\n"));
    }

    #[test]
    fn test_set_form_field_appends_before_closing_delimiter() {
        let (_, body) = profile_form();
        let out = set_form_field(&body, "B", "debug", "1");
        let fields = parse_form_fields(&out, "B");
        assert_eq!(fields.last(), Some(&("debug".to_string(), "1".to_string())));
        assert_eq!(fields.len(), 3);
        assert!(out.ends_with(b"name=\"debug\"\r\n\r\n1\r\n--B--\r\n"));
    }

    #[test]
    fn test_set_form_field_untouched_parts_round_trip() {
        let (_, body) = profile_form();
        let out = set_form_field(&body, "B", "user", "bob");
        assert_eq!(out, body);
    }
}
