use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde_json::Value;
use std::{path::Path, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, instrument};
use weather_core::{Endpoint, WeatherSource};

use crate::error::ProxyError;

/// Application state shared across handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub source: Arc<dyn WeatherSource>,
}

/// Raw query pairs. Decoding into pairs cannot fail, so every bad request
/// still gets the `ErrorBody` envelope.
type QueryPairs = Vec<(String, String)>;

/// Proxy routes, with `static_dir` served for every other path when given.
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route(Endpoint::Current.route(), get(get_current))
        .route(Endpoint::Forecast.route(), get(get_forecast));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[instrument(skip(state))]
async fn get_current(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<Value>, ProxyError> {
    relay(&state, Endpoint::Current, &params).await
}

#[instrument(skip(state))]
async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<Value>, ProxyError> {
    relay(&state, Endpoint::Forecast, &params).await
}

async fn relay(
    state: &AppState,
    endpoint: Endpoint,
    params: &[(String, String)],
) -> Result<Json<Value>, ProxyError> {
    let city = city_param(params).ok_or(ProxyError::MissingParameter)?;

    let reply = state.source.fetch(endpoint, &city).await.map_err(|err| {
        error!(%endpoint, error = ?err, "upstream call failed");
        ProxyError::Transport
    })?;

    match reply.body {
        Some(body) if reply.is_success() => Ok(Json(body)),
        _ => Err(ProxyError::Upstream { endpoint, status: reply.status }),
    }
}

/// Repeated `city` values are joined with commas.
fn city_param(params: &[(String, String)]) -> Option<String> {
    let city = params
        .iter()
        .filter(|(key, _)| key == "city")
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(",");

    (!city.is_empty()).then_some(city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use parking_lot::Mutex;
    use serde_json::json;
    use weather_core::{ErrorBody, UpstreamReply};

    /// Answers every lookup with a canned reply and records what was asked.
    #[derive(Debug)]
    struct FakeSource {
        reply: Option<UpstreamReply>,
        calls: Mutex<Vec<(Endpoint, String)>>,
    }

    impl FakeSource {
        fn replying(reply: UpstreamReply) -> Arc<Self> {
            Arc::new(Self { reply: Some(reply), calls: Mutex::new(Vec::new()) })
        }

        fn broken() -> Arc<Self> {
            Arc::new(Self { reply: None, calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<(Endpoint, String)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch(&self, endpoint: Endpoint, city: &str) -> anyhow::Result<UpstreamReply> {
            self.calls.lock().push((endpoint, city.to_string()));
            self.reply.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn server(source: Arc<FakeSource>) -> TestServer {
        let app = create_router(AppState { source }, None);
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn missing_city_is_rejected_without_upstream_call() {
        let source = FakeSource::replying(UpstreamReply::ok(json!({})));
        let server = server(source.clone());

        for route in ["/weather", "/forecast"] {
            let response = server.get(route).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&ErrorBody::new("Missing city parameter"));
        }

        let response = server.get("/weather").add_query_param("city", "").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&ErrorBody::new("Missing city parameter"));

        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn repeated_city_is_joined_not_rejected() {
        let source = FakeSource::replying(UpstreamReply::ok(json!({ "name": "Tokyo" })));
        let server = server(source.clone());

        let response = server
            .get("/weather")
            .add_query_param("city", "Tokyo")
            .add_query_param("city", "Osaka")
            .await;

        response.assert_status_ok();
        assert_eq!(source.calls(), vec![(Endpoint::Current, "Tokyo,Osaka".to_string())]);
    }

    #[tokio::test]
    async fn unrelated_parameters_still_yield_error_envelope() {
        let source = FakeSource::replying(UpstreamReply::ok(json!({})));
        let server = server(source.clone());

        let response = server.get("/forecast").add_query_param("town", "Tokyo").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&ErrorBody::new("Missing city parameter"));
        assert!(source.calls().is_empty());
    }

    #[test]
    fn city_param_resolution() {
        let pairs = |items: &[(&str, &str)]| -> Vec<(String, String)> {
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };

        assert_eq!(city_param(&pairs(&[("city", "Tokyo")])), Some("Tokyo".to_string()));
        assert_eq!(city_param(&pairs(&[("city", "")])), None);
        assert_eq!(city_param(&pairs(&[])), None);
        assert_eq!(
            city_param(&pairs(&[("city", "Tokyo"), ("lang", "en"), ("city", "Osaka")])),
            Some("Tokyo,Osaka".to_string())
        );
    }

    #[tokio::test]
    async fn relays_upstream_body_verbatim() {
        let upstream = json!({ "name": "Tokyo", "main": { "temp": 300.15 }, "cod": 200 });
        let source = FakeSource::replying(UpstreamReply::ok(upstream.clone()));
        let server = server(source.clone());

        let response = server.get("/weather").add_query_param("city", "Tokyo").await;

        response.assert_status_ok();
        response.assert_json(&upstream);
        assert_eq!(source.calls(), vec![(Endpoint::Current, "Tokyo".to_string())]);
    }

    #[tokio::test]
    async fn forecast_route_uses_forecast_endpoint() {
        let source = FakeSource::replying(UpstreamReply::ok(json!({ "list": [] })));
        let server = server(source.clone());

        server.get("/forecast").add_query_param("city", "São Paulo").await.assert_status_ok();

        assert_eq!(source.calls(), vec![(Endpoint::Forecast, "São Paulo".to_string())]);
    }

    #[tokio::test]
    async fn upstream_not_found_is_passed_through() {
        let server = server(FakeSource::replying(UpstreamReply::failed(404)));

        let response = server.get("/weather").add_query_param("city", "Nonexistentville").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&ErrorBody::new("Failed to fetch current weather"));
    }

    #[tokio::test]
    async fn forecast_failure_uses_forecast_message() {
        let server = server(FakeSource::replying(UpstreamReply::failed(401)));

        let response = server.get("/forecast").add_query_param("city", "Tokyo").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&ErrorBody::new("Failed to fetch forecast"));
    }

    #[tokio::test]
    async fn transport_failure_is_a_generic_server_error() {
        let server = server(FakeSource::broken());

        let response = server.get("/weather").add_query_param("city", "Tokyo").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&ErrorBody::new("Server error"));
        assert!(!response.text().contains("connection refused"));
    }

    #[tokio::test]
    async fn serves_static_assets_as_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>weather</h1>").unwrap();

        let source = FakeSource::replying(UpstreamReply::ok(json!({})));
        let app = create_router(AppState { source }, Some(dir.path()));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/index.html").await;
        response.assert_status_ok();
        response.assert_text("<h1>weather</h1>");

        server.get("/missing.js").await.assert_status(StatusCode::NOT_FOUND);
    }
}
