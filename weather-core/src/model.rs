use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A trimmed, non-empty city name as typed by the user.
///
/// Identity is case-insensitive: "Tokyo" and "tokyo" name the same city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery(String);

impl CityQuery {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        same_city(&self.0, other)
    }
}

impl std::fmt::Display for CityQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn same_city(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Error envelope returned by the proxy on every failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Unexpected weather data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Weather data is missing {0}")]
    Missing(&'static str),
}

/// Snapshot of current conditions, temperatures still in Kelvin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherReading {
    pub city_name: String,
    pub temperature_kelvin: f64,
    pub feels_like_kelvin: f64,
    pub humidity_percent: u8,
    pub description: String,
    pub icon_id: String,
    pub wind_speed_mps: f64,
}

impl CurrentWeatherReading {
    pub fn from_upstream(body: Value) -> Result<Self, PayloadError> {
        let parsed: OwCurrentResponse = serde_json::from_value(body)?;
        let weather = parsed.weather.into_iter().next().ok_or(PayloadError::Missing("weather[0]"))?;

        Ok(Self {
            city_name: parsed.name,
            temperature_kelvin: parsed.main.temp,
            feels_like_kelvin: parsed.main.feels_like,
            humidity_percent: parsed.main.humidity,
            description: weather.description,
            icon_id: weather.icon,
            wind_speed_mps: parsed.wind.speed,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: NaiveDateTime,
    pub temperature_kelvin: f64,
}

/// Forecast samples in upstream order (3-hour cadence).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub samples: Vec<ForecastSample>,
}

impl ForecastSeries {
    pub fn from_upstream(body: Value) -> Result<Self, PayloadError> {
        let parsed: OwForecastResponse = serde_json::from_value(body)?;

        let samples = parsed
            .list
            .into_iter()
            .map(|entry| {
                let timestamp = entry
                    .dt_txt
                    .as_deref()
                    .and_then(|txt| NaiveDateTime::parse_from_str(txt, "%Y-%m-%d %H:%M:%S").ok())
                    .or_else(|| DateTime::<Utc>::from_timestamp(entry.dt, 0).map(|dt| dt.naive_utc()))
                    .ok_or(PayloadError::Missing("list[].dt"))?;

                Ok(ForecastSample { timestamp, temperature_kelvin: entry.main.temp })
            })
            .collect::<Result<Vec<_>, PayloadError>>()?;

        Ok(Self { samples })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: Option<String>,
    main: OwForecastMain,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn city_query_trims_and_rejects_blank() {
        assert_eq!(CityQuery::parse("  Osaka ").unwrap().as_str(), "Osaka");
        assert!(CityQuery::parse("   ").is_none());
        assert!(CityQuery::parse("").is_none());
    }

    #[test]
    fn city_query_matches_ignoring_case() {
        let city = CityQuery::parse("Tokyo").unwrap();
        assert!(city.matches("TOKYO"));
        assert!(city.matches("tokyo"));
        assert!(!city.matches("Kyoto"));
    }

    #[test]
    fn decodes_current_weather() {
        let body = json!({
            "name": "Tokyo",
            "main": { "temp": 300.15, "feels_like": 301.0, "humidity": 70 },
            "weather": [{ "description": "晴天", "icon": "01d" }],
            "wind": { "speed": 3.6 }
        });

        let reading = CurrentWeatherReading::from_upstream(body).unwrap();
        assert_eq!(reading.city_name, "Tokyo");
        assert_eq!(reading.humidity_percent, 70);
        assert_eq!(reading.icon_id, "01d");
        assert_eq!(reading.description, "晴天");
    }

    #[test]
    fn current_weather_without_conditions_is_an_error() {
        let body = json!({
            "name": "Tokyo",
            "main": { "temp": 300.15, "feels_like": 301.0, "humidity": 70 },
            "weather": [],
            "wind": { "speed": 3.6 }
        });

        let err = CurrentWeatherReading::from_upstream(body).unwrap_err();
        assert!(matches!(err, PayloadError::Missing("weather[0]")));
    }

    #[test]
    fn current_weather_missing_fields_is_malformed() {
        let err = CurrentWeatherReading::from_upstream(json!({ "cod": 200 })).unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn current_weather_without_feels_like_is_malformed() {
        let body = json!({
            "name": "Tokyo",
            "main": { "temp": 300.15, "humidity": 70 },
            "weather": [{ "description": "clear sky", "icon": "01d" }],
            "wind": { "speed": 3.6 }
        });

        let err = CurrentWeatherReading::from_upstream(body).unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn current_weather_without_humidity_is_malformed() {
        let body = json!({
            "name": "Tokyo",
            "main": { "temp": 300.15, "feels_like": 301.0 },
            "weather": [{ "description": "clear sky", "icon": "01d" }],
            "wind": { "speed": 3.6 }
        });

        let err = CurrentWeatherReading::from_upstream(body).unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn forecast_prefers_dt_txt_and_falls_back_to_dt() {
        let body = json!({
            "list": [
                { "dt": 0, "dt_txt": "2024-05-01 09:00:00", "main": { "temp": 290.0 } },
                { "dt": 1714564800, "main": { "temp": 291.0 } }
            ]
        });

        let series = ForecastSeries::from_upstream(body).unwrap();
        assert_eq!(series.samples.len(), 2);
        assert_eq!(series.samples[0].timestamp.to_string(), "2024-05-01 09:00:00");
        assert_eq!(series.samples[1].timestamp.to_string(), "2024-05-01 12:00:00");
    }
}
