use crate::{ServerSettings, provider::openweather::OpenWeatherSource};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// The two upstream lookups the proxy relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    /// Path segment, shared by the proxy route and the upstream API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Endpoint::Current => "/weather",
            Endpoint::Forecast => "/forecast",
        }
    }

    /// Message the proxy returns when the upstream call is rejected.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Current => "Failed to fetch current weather",
            Endpoint::Forecast => "Failed to fetch forecast",
        }
    }

    /// Message shown to the user when the proxy rejects a lookup.
    pub fn user_message(&self) -> &'static str {
        match self {
            Endpoint::Current => "Could not retrieve current weather information",
            Endpoint::Forecast => "Could not retrieve the weather forecast",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What came back from the upstream provider.
///
/// `body` is only decoded for success statuses; failures carry just the status.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Option<Value>,
}

impl UpstreamReply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body: Some(body) }
    }

    pub fn failed(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Upstream weather data provider keyed by city name.
///
/// `Err` means the call itself failed (transport, unreadable body); a rejected
/// lookup is an `Ok` reply with a non-success status.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, endpoint: Endpoint, city: &str) -> anyhow::Result<UpstreamReply>;
}

/// Construct the upstream source from resolved server settings.
pub fn source_from_settings(settings: &ServerSettings) -> Arc<dyn WeatherSource> {
    Arc::new(OpenWeatherSource::new(
        settings.api_key.clone(),
        settings.lang.clone(),
        settings.upstream_url.clone(),
    ))
}
