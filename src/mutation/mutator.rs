use regex::Regex;
use serde_json::Value;

use crate::http::multipart::{generate_boundary, MultipartBuilder};
use crate::http::HttpRequest;
use crate::payloads::{self, PayloadEntry};
use crate::utils::truncation::elide;

use super::encoding::apply_encoding;
use super::spec::{MutationSpec, MutationTarget};

const DESCRIBE_VALUE_CHARS: usize = 50;
const DEFAULT_FILE_FIELD: &str = "file";
const CUSTOM_UPLOAD_CONTENT_TYPE: &str = "application/x-php";

/// Applies [`MutationSpec`]s to a base request.
///
/// Holds the rotating cursor into the payload corpus, so one mutator
/// belongs to one reasoning loop run. [`describe`](Self::describe) reports
/// the payload drawn by the preceding [`apply`](Self::apply); call them in
/// that order for every file-upload mutation.
#[derive(Debug)]
pub struct RequestMutator {
    corpus: &'static [PayloadEntry],
    cursor: usize,
    last_drawn: Option<usize>,
}

impl Default for RequestMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMutator {
    pub fn new() -> Self {
        Self::with_corpus(payloads::corpus())
    }

    pub fn with_corpus(corpus: &'static [PayloadEntry]) -> Self {
        Self { corpus, cursor: 0, last_drawn: None }
    }

    /// Index of the payload the next automatic file upload will draw.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.last_drawn = None;
    }

    /// Build a modified copy of `base`. `base` itself is never touched.
    pub fn apply(&mut self, base: &HttpRequest, spec: &MutationSpec) -> HttpRequest {
        let value = apply_encoding(&spec.value, spec.encoding);
        match &spec.target {
            MutationTarget::UrlQuery { name } => base.with_query_param(name, &value),
            MutationTarget::UrlPath => replace_last_path_segment(base, &value),
            MutationTarget::PostBody { name } => base.with_body_param(name, &value),
            MutationTarget::JsonBody { name } => replace_json_value(base, name, &value),
            MutationTarget::Header { name } => base.with_header(name, &value),
            MutationTarget::Cookie { name } => set_cookie(base, name, &value),
            MutationTarget::RawBody => base.with_body(value.into_bytes()),
            MutationTarget::FileUpload { name } => {
                let auto = spec.wants_corpus_payload();
                self.file_upload(base, name.as_deref(), auto, &value)
            }
        }
    }

    /// One-line summary of a mutation for the activity log.
    pub fn describe(&self, spec: &MutationSpec) -> String {
        let mut desc = format!("Type: {}", spec.target.kind());

        if let MutationTarget::FileUpload { name } = &spec.target {
            desc.push_str(&format!(", Parameter: {}", name.as_deref().unwrap_or(DEFAULT_FILE_FIELD)));
            if spec.wants_corpus_payload() && !self.corpus.is_empty() {
                let number = self.last_drawn.unwrap_or(self.cursor) + 1;
                desc.push_str(&format!(", Payload: Generated #{}", number));
            } else {
                desc.push_str(", Custom content");
            }
            return desc;
        }

        if let Some(parameter) = spec.target.parameter() {
            desc.push_str(&format!(", Parameter: {}", parameter));
        }
        if !spec.value.is_empty() {
            desc.push_str(&format!(", Value: {}", elide(&spec.value, DESCRIBE_VALUE_CHARS)));
        }
        desc
    }

    fn next_payload(&mut self) -> Option<&'static PayloadEntry> {
        if self.corpus.is_empty() {
            return None;
        }
        let index = self.cursor % self.corpus.len();
        self.last_drawn = Some(index);
        self.cursor = (index + 1) % self.corpus.len();
        self.corpus.get(index)
    }

    fn file_upload(&mut self, base: &HttpRequest, name: Option<&str>, auto: bool, value: &str) -> HttpRequest {
        let field = name.unwrap_or(DEFAULT_FILE_FIELD);
        let drawn = if auto { self.next_payload() } else { None };

        let mut builder = MultipartBuilder::new(generate_boundary());
        match drawn {
            Some(entry) => builder.add_file(field, &entry.filename, &entry.content_type, &entry.content),
            None => {
                let filename = match name {
                    Some(n) => format!("{}.php", n),
                    None => "upload.php".to_string(),
                };
                builder.add_file(field, &filename, CUSTOM_UPLOAD_CONTENT_TYPE, value.as_bytes());
            }
        }
        for (other, other_value) in base.body_params() {
            if other != field {
                builder.add_field(&other, &other_value);
            }
        }

        let (content_type, body) = builder.finish();
        let length = body.len().to_string();
        base.with_header("Content-Type", &content_type)
            .with_body(body)
            .with_header("Content-Length", &length)
    }
}

/// Replace the text after the last `/` of the path, keeping query and fragment.
fn replace_last_path_segment(base: &HttpRequest, value: &str) -> HttpRequest {
    let parts = base.url_parts();
    let Some(slash) = parts.path.rfind('/') else {
        return base.clone();
    };
    let url = format!("{}{}{}{}", parts.origin, &parts.path[..=slash], value, parts.tail);
    base.with_url(&url)
}

/// Swap the value of the first `"name": ...` pair in the raw body text.
/// String values are tried first, then bare numbers.
fn replace_json_value(base: &HttpRequest, name: &str, value: &str) -> HttpRequest {
    let body = base.body_text().into_owned();
    let key = regex::escape(name);

    let string_pattern = format!(r#""{}"\s*:\s*"(?:[^"\\]|\\.)*""#, key);
    if let Some(range) = first_match(&string_pattern, &body) {
        let replacement = format!("\"{}\": {}", name, Value::String(value.to_string()));
        return base.with_body(splice(&body, range, &replacement));
    }

    let number_pattern = format!(r#""{}"\s*:\s*-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?"#, key);
    if let Some(range) = first_match(&number_pattern, &body) {
        let replacement = format!("\"{}\": {}", name, value);
        return base.with_body(splice(&body, range, &replacement));
    }

    base.clone()
}

fn first_match(pattern: &str, text: &str) -> Option<std::ops::Range<usize>> {
    let re = Regex::new(pattern).ok()?;
    re.find(text).map(|m| m.range())
}

fn splice(text: &str, range: std::ops::Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}

fn set_cookie(base: &HttpRequest, name: &str, value: &str) -> HttpRequest {
    let Some(header) = base.header_value("Cookie") else {
        return base.with_added_header("Cookie", &format!("{}={}", name, value));
    };

    let mut cookies: Vec<String> = header
        .split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    let position = cookies
        .iter()
        .position(|c| c.split_once('=').is_some_and(|(n, _)| n.trim() == name));

    match position {
        Some(idx) => {
            cookies[idx] = format!("{}={}", name, value);
            base.with_header("Cookie", &cookies.join("; "))
        }
        None => base.clone(),
    }
}
