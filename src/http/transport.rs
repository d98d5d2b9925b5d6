use std::time::{Duration, Instant};
use async_trait::async_trait;
use reqwest::{redirect, Client, Method};
use crate::config::HttpConfig;
use crate::errors::VulnAgentError;
use super::request::{Header, HttpRequest};
use super::response::HttpResponse;

/// Sends a probe request to the target and captures the response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, VulnAgentError>;
}

/// Headers the client computes itself from the body. `Host` is forwarded
/// as captured or mutated; the client only fills it in when absent.
const CLIENT_MANAGED_HEADERS: &[&str] = &["content-length", "transfer-encoding", "connection"];

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, VulnAgentError> {
        let redirect_policy = if config.follow_redirects {
            redirect::Policy::limited(10)
        } else {
            redirect::Policy::none()
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(redirect_policy)
            .build()
            .map_err(|e| VulnAgentError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, VulnAgentError> {
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|e| VulnAgentError::Transport(format!("Invalid method '{}': {}", request.method(), e)))?;

        let mut builder = self.client.request(method, request.url());
        for header in request.headers() {
            if CLIENT_MANAGED_HEADERS.iter().any(|h| header.name.eq_ignore_ascii_case(h)) {
                continue;
            }
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if !request.body().is_empty() {
            builder = builder.body(request.body().to_vec());
        }

        let start = Instant::now();
        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                VulnAgentError::Timeout(format!("Request to {} timed out", request.url()))
            } else {
                VulnAgentError::Transport(format!("Failed to send request: {}", e))
            }
        })?;

        let status_code = resp.status().as_u16();
        let headers: Vec<Header> = resp
            .headers()
            .iter()
            .map(|(name, value)| Header::new(name.as_str(), &String::from_utf8_lossy(value.as_bytes())))
            .collect();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| VulnAgentError::Transport(format!("Failed to read response body: {}", e)))?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        Ok(HttpResponse {
            status_code,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            content_length: bytes.len(),
            response_time_ms,
        })
    }
}
