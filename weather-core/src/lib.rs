//! Core library for the weather proxy and the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream provider seam used by the proxy server
//! - A client for the proxy, plus rendering of its responses
//! - The persisted search history and the search flow tying it all together
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod client;
pub mod config;
pub mod controller;
pub mod history;
pub mod model;
pub mod provider;
pub mod render;

pub use client::{FetchError, ProxyClient};
pub use config::{Config, ServerSettings};
pub use controller::{SearchController, SearchOutcome, View};
pub use history::{FileStorage, HistoryEntry, HistoryStore, MemoryStorage, Storage};
pub use model::{CityQuery, CurrentWeatherReading, ErrorBody, ForecastSeries};
pub use provider::{Endpoint, UpstreamReply, WeatherSource};
