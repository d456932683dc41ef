use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use std::time::Duration;
use tracing::{debug, warn};

/// Thin wrapper over `reqwest` that turns non-2xx responses into typed errors.
///
/// Every request is attempted exactly once.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self { client })
    }

    pub async fn get_text(&self, url: &str, headers: &[(&str, String)]) -> Result<String> {
        let req = with_headers(self.client.get(url), headers);
        self.send(req).await
    }

    pub async fn post_json_raw(
        &self,
        url: &str,
        body: &str,
        headers: &[(&str, String)],
    ) -> Result<String> {
        let req = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send(with_headers(req, headers)).await
    }

    async fn send(&self, req: RequestBuilder) -> Result<String> {
        match req.send().await {
            Ok(resp) => self.handle_response(resp).await,
            Err(e) => {
                if e.is_timeout() || e.is_connect() {
                    warn!("transport failure: {e}");
                }
                Err(Error::http(e.to_string()))
            }
        }
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let url = resp.url().to_string();
        debug!(status = status.as_u16(), %url, "response received");

        match status {
            s if s.is_success() => resp.text().await.map_err(|e| Error::http(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = resp
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                Err(Error::RateLimit {
                    platform: extract_domain(&url),
                    retry_after_secs: retry_after,
                })
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(Error::api_with_status(
                    extract_domain(&url),
                    body,
                    status.as_u16(),
                ))
            }
        }
    }
}

fn with_headers(mut req: RequestBuilder, headers: &[(&str, String)]) -> RequestBuilder {
    for (k, v) in headers {
        req = req.header(*k, v.as_str());
    }
    req
}

fn extract_domain(url: &str) -> String {
    url.split("//")
        .nth(1)
        .and_then(|s| s.split('/').next())
        .unwrap_or("unknown")
        .to_string()
}
