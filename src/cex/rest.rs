//! Thin JSON-over-HTTPS transport shared by the venue clients.

use crate::errors::{AppError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;
use url::form_urlencoded;

const BODY_EXCERPT_LEN: usize = 200;

/// HTTP client bound to one venue's base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: Url,
    http: Client,
}

impl RestClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GET `path_with_query` (as produced by [`request_path`]) and decode the
    /// JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path_with_query: &str,
        headers: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.url_for(path_with_query)?;
        let mut req = self.http.get(url);
        for (name, value) in headers {
            req = req.header(*name, value);
        }

        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;

        serde_json::from_str(&body).map_err(|e| {
            AppError::Format(format!("{e} in response from {path_with_query}"))
        })
    }

    fn url_for(&self, path_with_query: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path_with_query}"))?)
    }
}

/// Path plus url-encoded query, exactly as it goes on the wire. Venue
/// signatures are computed over this string.
pub fn request_path(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let mut ser = form_urlencoded::Serializer::new(String::new());
    for (k, v) in query {
        ser.append_pair(k, v);
    }
    format!("{path}?{}", ser.finish())
}

fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(AppError::Auth(format!("HTTP {status}: {excerpt}")))
        }
        _ => Err(AppError::Network(format!("HTTP {status}: {excerpt}"))),
    }
}
