use crate::error::{Result, ScanError};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderValue};
use std::time::Duration;

pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Settings shared by every client that talks to the target.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    pub timeout_secs: u64,
    pub cookie: Option<String>,
    pub authorization: Option<String>,
    /// Skip certificate validation (script body fetches only)
    pub accept_invalid_certs: bool,
}

impl HttpOptions {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            ..Default::default()
        }
    }

    pub fn insecure(&self) -> Self {
        Self {
            accept_invalid_certs: true,
            ..self.clone()
        }
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = self.cookie.as_deref().filter(|c| !c.is_empty()) {
            headers.insert(COOKIE, header_value("Cookie", cookie)?);
        }
        if let Some(auth) = self.authorization.as_deref().filter(|a| !a.is_empty()) {
            headers.insert(AUTHORIZATION, header_value("Authorization", auth)?);
        }
        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ScanError::ParseError(format!("invalid {} header value: {}", name, e)))
}

/// Build a client carrying the configured cookie and authorization headers.
pub fn build_client(options: &HttpOptions) -> Result<Client> {
    let timeout = Duration::from_secs(options.timeout_secs.max(1));
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(options.default_headers()?)
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .pool_max_idle_per_host(50)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(5))
        .danger_accept_invalid_certs(options.accept_invalid_certs)
        .build()?;
    Ok(client)
}
