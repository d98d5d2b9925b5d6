use std::borrow::Cow;
use url::{Host, Url};
use crate::errors::VulnAgentError;
use crate::utils::truncation::truncate_body;
use super::multipart;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: &str, value: &str) -> Self {
        Self { name: name.to_string(), value: value.to_string() }
    }
}

/// An HTTP/1.x request snapshot.
///
/// All `with_*` methods return a modified copy; the receiver is never
/// changed, so a captured base request can be reused for every mutation.
///
/// The URL is stored as text and mutations splice it directly; parsing it
/// into a [`Url`] would normalise `../` segments and percent-encoded
/// payloads. [`parsed_url`](Self::parsed_url) is for host and scope checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    url: String,
    headers: Vec<Header>,
    body: Vec<u8>,
}

/// An absolute URL split into `scheme://authority`, path, and the `?query#fragment` tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub origin: &'a str,
    pub path: &'a str,
    pub tail: &'a str,
}

impl HttpRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Parse a raw HTTP/1.x request as captured by an intercepting proxy.
    ///
    /// Origin-form targets (`GET /path HTTP/1.1`) are resolved against the
    /// `Host` header using `default_scheme`.
    pub fn parse_raw(raw: &[u8], default_scheme: &str) -> Result<Self, VulnAgentError> {
        let (head, body) = split_head_and_body(raw);
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines();

        let request_line = lines
            .by_ref()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| VulnAgentError::InvalidRequest("Empty request".into()))?;
        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| VulnAgentError::InvalidRequest("Missing method".into()))?;
        let target = parts
            .next()
            .ok_or_else(|| VulnAgentError::InvalidRequest(format!("Missing target in '{}'", request_line)))?;

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| {
                VulnAgentError::InvalidRequest(format!("Malformed header line: '{}'", line))
            })?;
            headers.push(Header::new(name.trim(), value.trim()));
        }

        let url = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            let host = headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("host"))
                .map(|h| h.value.clone())
                .ok_or_else(|| VulnAgentError::InvalidRequest("Missing Host header".into()))?;
            let path = if target.starts_with('/') { target.to_string() } else { format!("/{}", target) };
            format!("{}://{}{}", default_scheme, host, path)
        };

        let request = Self {
            method: method.to_uppercase(),
            url,
            headers,
            body: body.to_vec(),
        };
        request.parsed_url()?;
        Ok(request)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// First header value with a case-insensitive name match.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_value("Content-Type")
    }

    pub fn url_parts(&self) -> UrlParts<'_> {
        split_url(&self.url)
    }

    pub fn parsed_url(&self) -> Result<Url, VulnAgentError> {
        Url::parse(&self.url).map_err(|e| VulnAgentError::InvalidRequest(format!("Invalid URL '{}': {}", self.url, e)))
    }

    /// Host portion of the URL, without port or IPv6 brackets.
    pub fn host(&self) -> Option<String> {
        let url = self.parsed_url().ok()?;
        match url.host()? {
            Host::Domain(domain) => Some(domain.to_string()),
            Host::Ipv4(addr) => Some(addr.to_string()),
            Host::Ipv6(addr) => Some(addr.to_string()),
        }
    }

    /// Set a header, replacing the first case-insensitive match and dropping
    /// any duplicates; appended when absent.
    pub fn with_header(&self, name: &str, value: &str) -> Self {
        let mut next = self.clone();
        let mut replaced = false;
        next.headers.retain_mut(|h| {
            if !h.name.eq_ignore_ascii_case(name) {
                return true;
            }
            if replaced {
                return false;
            }
            h.value = value.to_string();
            replaced = true;
            true
        });
        if !replaced {
            next.headers.push(Header::new(name, value));
        }
        next
    }

    pub fn with_added_header(&self, name: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.headers.push(Header::new(name, value));
        next
    }

    pub fn with_url(&self, url: &str) -> Self {
        let mut next = self.clone();
        next.url = url.to_string();
        next
    }

    /// Replace the body. An existing `Content-Length` header is kept in sync.
    pub fn with_body(&self, body: impl Into<Vec<u8>>) -> Self {
        let mut next = self.clone();
        next.body = body.into();
        if next.header_value("Content-Length").is_some() {
            next = next.with_header("Content-Length", &next.body.len().to_string());
        }
        next
    }

    /// Query parameters in URL order, undecoded.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let tail = self.url_parts().tail;
        match tail.strip_prefix('?') {
            Some(q) => parse_pairs(q.split('#').next().unwrap_or("")),
            None => Vec::new(),
        }
    }

    /// Body-located form fields: urlencoded pairs, or the non-file parts of
    /// a multipart body. JSON and XML bodies have none.
    pub fn body_params(&self) -> Vec<(String, String)> {
        if let Some(boundary) = self.content_type().and_then(multipart::boundary_from_content_type) {
            return multipart::parse_form_fields(&self.body, &boundary);
        }
        if self.has_form_body() {
            return parse_pairs(&self.body_text());
        }
        Vec::new()
    }

    /// Replace the first query parameter named `name`, or append it.
    pub fn with_query_param(&self, name: &str, value: &str) -> Self {
        let parts = self.url_parts();
        let (query, fragment) = match parts.tail.strip_prefix('?') {
            Some(q) => match q.split_once('#') {
                Some((q, f)) => (q, Some(f)),
                None => (q, None),
            },
            None => ("", parts.tail.strip_prefix('#')),
        };
        let mut url = format!("{}{}?{}", parts.origin, parts.path, replace_or_append_pair(query, name, value));
        if let Some(f) = fragment {
            url.push('#');
            url.push_str(f);
        }
        self.with_url(&url)
    }

    /// Replace the first body field named `name`, or append it. Multipart
    /// bodies keep their boundary and file parts; anything else is treated
    /// as `&`-joined pairs.
    pub fn with_body_param(&self, name: &str, value: &str) -> Self {
        if let Some(boundary) = self.content_type().and_then(multipart::boundary_from_content_type) {
            return self.with_body(multipart::set_form_field(&self.body, &boundary, name, value));
        }
        let body = self.body_text().into_owned();
        let next = self.with_body(replace_or_append_pair(&body, name, value));
        if self.content_type().is_none() {
            next.with_header("Content-Type", "application/x-www-form-urlencoded")
        } else {
            next
        }
    }

    /// Render the request for a prompt, with the body capped.
    pub fn format_for_llm(&self) -> String {
        let mut out = format!("Method: {}\nURL: {}\n\nHeaders:\n", self.method, self.url);
        for h in &self.headers {
            out.push_str(&format!("{}: {}\n", h.name, h.value));
        }
        out.push('\n');
        let body = self.body_text();
        if !body.is_empty() {
            out.push_str("Body:\n");
            out.push_str(&truncate_body(&body));
            out.push('\n');
        }
        out
    }

    fn has_form_body(&self) -> bool {
        match self.content_type() {
            Some(ct) => ct.to_ascii_lowercase().contains("application/x-www-form-urlencoded"),
            None => {
                let text = self.body_text();
                let trimmed = text.trim_start();
                !trimmed.is_empty() && !trimmed.starts_with('{') && !trimmed.starts_with('[') && !trimmed.starts_with('<')
            }
        }
    }
}

fn split_head_and_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = find_subslice(raw, b"\r\n\r\n") {
        return (&raw[..pos], &raw[pos + 4..]);
    }
    if let Some(pos) = find_subslice(raw, b"\n\n") {
        return (&raw[..pos], &raw[pos + 2..]);
    }
    (raw, &[])
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split_url(url: &str) -> UrlParts<'_> {
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let rest = &url[authority_start..];
    let path_start = rest
        .find(|c| c == '/' || c == '?' || c == '#')
        .map(|i| authority_start + i)
        .unwrap_or(url.len());
    let tail_start = url[path_start..]
        .find(|c| c == '?' || c == '#')
        .map(|i| path_start + i)
        .unwrap_or(url.len());
    UrlParts {
        origin: &url[..path_start],
        path: &url[path_start..tail_start],
        tail: &url[tail_start..],
    }
}

fn parse_pairs(encoded: &str) -> Vec<(String, String)> {
    encoded
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((n, v)) => (n.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn pair_name(pair: &str) -> &str {
    pair.split_once('=').map(|(n, _)| n).unwrap_or(pair)
}

/// Replace the value of the first `name=` pair in an `&`-joined string,
/// or append a new pair. Untouched pairs keep their exact text.
fn replace_or_append_pair(encoded: &str, name: &str, value: &str) -> String {
    let mut pairs: Vec<String> = encoded
        .split('&')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    match pairs.iter().position(|p| pair_name(p) == name) {
        Some(idx) => pairs[idx] = format!("{}={}", name, value),
        None => pairs.push(format!("{}={}", name, value)),
    }
    pairs.join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_POST: &str = "POST /login?next=/home HTTP/1.1\r\n\
        Host: example.com\r\n\
        Content-Type: application/x-www-form-urlencoded\r\n\
        Content-Length: 27\r\n\
        Cookie: a=1; b=2\r\n\
        \r\n\
        user=admin&pass=hunter2&x=1";

    #[test]
    fn test_parse_raw_origin_form() {
        let req = HttpRequest::parse_raw(RAW_POST.as_bytes(), "https").unwrap();
        assert_eq!(req.method(), "POST");
        assert_eq!(req.url(), "https://example.com/login?next=/home");
        assert_eq!(req.header_value("cookie"), Some("a=1; b=2"));
        assert_eq!(req.body_text(), "user=admin&pass=hunter2&x=1");
    }

    #[test]
    fn test_parse_raw_absolute_form() {
        let raw = "GET http://internal:8080/a HTTP/1.1\nHost: ignored\n\n";
        let req = HttpRequest::parse_raw(raw.as_bytes(), "https").unwrap();
        assert_eq!(req.url(), "http://internal:8080/a");
        assert!(req.body().is_empty());
    }

    #[test]
    fn test_parse_raw_missing_host_is_error() {
        let raw = "GET /a HTTP/1.1\r\nAccept: */*\r\n\r\n";
        assert!(HttpRequest::parse_raw(raw.as_bytes(), "https").is_err());
    }

    #[test]
    fn test_parse_raw_empty_is_error() {
        assert!(HttpRequest::parse_raw(b"", "https").is_err());
    }

    #[test]
    fn test_url_parts() {
        let req = HttpRequest::new("GET", "https://example.com/a/b?x=1#frag");
        let parts = req.url_parts();
        assert_eq!(parts.origin, "https://example.com");
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.tail, "?x=1#frag");
    }

    #[test]
    fn test_url_parts_without_path() {
        let req = HttpRequest::new("GET", "https://example.com");
        let parts = req.url_parts();
        assert_eq!(parts.origin, "https://example.com");
        assert_eq!(parts.path, "");
    }

    #[test]
    fn test_parse_raw_rejects_unparseable_url() {
        let raw = "GET /a HTTP/1.1\r\nHost: bad host\r\n\r\n";
        assert!(HttpRequest::parse_raw(raw.as_bytes(), "https").is_err());
    }

    #[test]
    fn test_host() {
        assert_eq!(HttpRequest::new("GET", "https://Example.com:8443/a").host().as_deref(), Some("example.com"));
        assert_eq!(HttpRequest::new("GET", "http://user:pw@internal/").host().as_deref(), Some("internal"));
        assert_eq!(HttpRequest::new("GET", "http://[::1]:8080/").host().as_deref(), Some("::1"));
        assert_eq!(HttpRequest::new("GET", "not a url").host(), None);
    }

    #[test]
    fn test_parsed_url_does_not_change_stored_url() {
        let req = HttpRequest::new("GET", "https://e.com/a/../etc/passwd");
        assert_eq!(req.parsed_url().unwrap().path(), "/etc/passwd");
        assert_eq!(req.url(), "https://e.com/a/../etc/passwd");
        assert_eq!(req.url_parts().path, "/a/../etc/passwd");
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let req = HttpRequest::new("GET", "https://e.com/")
            .with_added_header("X-Test", "1")
            .with_added_header("x-test", "2");
        let next = req.with_header("X-TEST", "9");
        assert_eq!(next.headers().len(), 1);
        assert_eq!(next.header_value("x-test"), Some("9"));
        assert_eq!(req.headers().len(), 2);
    }

    #[test]
    fn test_with_body_syncs_content_length() {
        let req = HttpRequest::parse_raw(RAW_POST.as_bytes(), "https").unwrap();
        let next = req.with_body("a=1");
        assert_eq!(next.header_value("Content-Length"), Some("3"));
        assert_eq!(req.header_value("Content-Length"), Some("27"));
    }

    #[test]
    fn test_query_param_replace_and_append() {
        let req = HttpRequest::new("GET", "https://e.com/s?q=1&page=2#top");
        let replaced = req.with_query_param("q", "test");
        assert_eq!(replaced.url(), "https://e.com/s?q=test&page=2#top");
        let appended = req.with_query_param("debug", "true");
        assert_eq!(appended.url(), "https://e.com/s?q=1&page=2&debug=true#top");
    }

    #[test]
    fn test_query_param_on_url_without_query() {
        let req = HttpRequest::new("GET", "https://e.com/s");
        assert_eq!(req.with_query_param("id", "5").url(), "https://e.com/s?id=5");
    }

    #[test]
    fn test_body_params_urlencoded() {
        let req = HttpRequest::parse_raw(RAW_POST.as_bytes(), "https").unwrap();
        let params = req.body_params();
        assert_eq!(params.len(), 3);
        assert_eq!(params[1], ("pass".to_string(), "hunter2".to_string()));
    }

    #[test]
    fn test_body_params_json_is_empty() {
        let req = HttpRequest::new("POST", "https://e.com/api")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"a": 1}"#);
        assert!(req.body_params().is_empty());
    }

    #[test]
    fn test_with_body_param_adds_form_content_type() {
        let req = HttpRequest::new("POST", "https://e.com/");
        let next = req.with_body_param("a", "1");
        assert_eq!(next.body_text(), "a=1");
        assert_eq!(next.content_type(), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_with_body_param_on_multipart_form() {
        let mut form = multipart::MultipartBuilder::new("B".to_string());
        form.add_field("user", "bob");
        form.add_field("role", "member");
        let (ct, body) = form.finish();
        let req = HttpRequest::new("POST", "https://e.com/profile")
            .with_header("Content-Type", &ct)
            .with_header("Content-Length", &body.len().to_string())
            .with_body(body);

        let next = req.with_body_param("role", "admin").with_body_param("role", "root");
        assert_eq!(
            next.body_params(),
            vec![("user".to_string(), "bob".to_string()), ("role".to_string(), "root".to_string())]
        );
        assert!(next.body_text().ends_with("--B--\r\n"));
        assert_eq!(next.content_type(), Some(ct.as_str()));
        assert_eq!(next.header_value("Content-Length"), Some(next.body().len().to_string().as_str()));
    }

    #[test]
    fn test_format_for_llm_includes_body() {
        let req = HttpRequest::parse_raw(RAW_POST.as_bytes(), "https").unwrap();
        let text = req.format_for_llm();
        assert!(text.starts_with("Method: POST\nURL: https://example.com/login?next=/home"));
        assert!(text.contains("Cookie: a=1; b=2"));
        assert!(text.contains("Body:\nuser=admin"));
    }
}
