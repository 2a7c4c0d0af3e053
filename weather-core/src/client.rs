use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    model::{CityQuery, CurrentWeatherReading, ErrorBody, ForecastSeries, PayloadError},
    provider::Endpoint,
};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The proxy answered with a non-success status.
    #[error("{}", .endpoint.user_message())]
    Rejected { endpoint: Endpoint, status: u16 },
    #[error("Could not reach the weather server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// HTTP client for the weather proxy.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub async fn current(&self, city: &CityQuery) -> Result<CurrentWeatherReading, FetchError> {
        let body = self.get(Endpoint::Current, city).await?;
        Ok(CurrentWeatherReading::from_upstream(body)?)
    }

    pub async fn forecast(&self, city: &CityQuery) -> Result<ForecastSeries, FetchError> {
        let body = self.get(Endpoint::Forecast, city).await?;
        Ok(ForecastSeries::from_upstream(body)?)
    }

    async fn get(&self, endpoint: Endpoint, city: &CityQuery) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint.route());
        debug!(%endpoint, %city, "querying weather proxy");

        let res = self.http.get(&url).query(&[("city", city.as_str())]).send().await?;

        let status = res.status();
        if !status.is_success() {
            let reason = res
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "<no error body>".to_string());
            warn!(%endpoint, %status, %reason, "weather proxy rejected lookup");
            return Err(FetchError::Rejected { endpoint, status: status.as_u16() });
        }

        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes).map_err(PayloadError::from)?)
    }
}
