use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{Endpoint, UpstreamReply, WeatherSource};

/// OpenWeatherMap `data/2.5` API, keyed by city name.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    lang: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: String, lang: String, base_url: String) -> Self {
        Self {
            api_key,
            lang,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.as_str())
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn fetch(&self, endpoint: Endpoint, city: &str) -> Result<UpstreamReply> {
        let url = self.endpoint_url(endpoint);
        debug!(%endpoint, city, "requesting OpenWeather");

        // City goes through `query` so it is percent-encoded, never spliced into the URL.
        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("lang", self.lang.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({endpoint})"))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            debug!(%endpoint, %status, body = %truncate_body(&body), "OpenWeather rejected request");
            return Ok(UpstreamReply::failed(status.as_u16()));
        }

        let body: Value = res
            .json()
            .await
            .with_context(|| format!("Failed to parse OpenWeather {endpoint} JSON"))?;

        Ok(UpstreamReply { status: status.as_u16(), body: Some(body) })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
