use crate::utils::truncation::truncate_body;
use super::request::Header;

/// A response observed from the target.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: Vec<Header>,
    pub body: String,
    /// Length of the full body in bytes, before any truncation.
    pub content_length: usize,
    pub response_time_ms: u64,
}

impl HttpResponse {
    /// Render the response as an observation block, with the body capped.
    pub fn format_for_llm(&self) -> String {
        let mut out = format!(
            "Status Code: {}\nResponse Time: {}ms\nContent-Length: {}\n\nResponse Headers:\n",
            self.status_code, self.response_time_ms, self.content_length
        );
        for h in &self.headers {
            out.push_str(&format!("{}: {}\n", h.name, h.value));
        }
        out.push_str("\nResponse Body:\n");
        out.push_str(&truncate_body(&self.body));
        out
    }

    /// One-line summary for progress output.
    pub fn summary(&self) -> String {
        format!(
            "Status: {}, Time: {}ms, Length: {}",
            self.status_code, self.response_time_ms, self.content_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> HttpResponse {
        HttpResponse {
            status_code: 500,
            headers: vec![Header::new("Server", "nginx")],
            body: body.to_string(),
            content_length: body.len(),
            response_time_ms: 42,
        }
    }

    #[test]
    fn test_format_for_llm() {
        let text = response("SQL syntax error").format_for_llm();
        assert!(text.starts_with("Status Code: 500\nResponse Time: 42ms\nContent-Length: 16\n"));
        assert!(text.contains("Server: nginx\n"));
        assert!(text.ends_with("Response Body:\nSQL syntax error"));
    }

    #[test]
    fn test_format_for_llm_caps_body() {
        let body = "x".repeat(10_000);
        let text = response(&body).format_for_llm();
        assert!(text.ends_with("... [TRUNCATED]"));
        assert!(text.contains("Content-Length: 10000"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(response("abc").summary(), "Status: 500, Time: 42ms, Length: 3");
    }
}
