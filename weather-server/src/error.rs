use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use weather_core::{Endpoint, ErrorBody};

/// Everything a proxy route can fail with. Only the fixed message reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Missing city parameter")]
    MissingParameter,
    #[error("{}", .endpoint.failure_message())]
    Upstream { endpoint: Endpoint, status: u16 },
    #[error("Server error")]
    Transport,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::Transport => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ProxyError::MissingParameter.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::Transport.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ProxyError::Upstream { endpoint: Endpoint::Current, status: 401 }.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn out_of_range_upstream_status_becomes_bad_gateway() {
        let err = ProxyError::Upstream { endpoint: Endpoint::Forecast, status: 42 };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Failed to fetch forecast");
    }
}
