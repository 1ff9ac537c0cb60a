use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use zorych_core::GatewayError;

#[derive(Debug)]
pub enum AppError {
    /// Caller-side configuration problem (missing price reference and the
    /// like). Distinct from provider failures so operators can tell them
    /// apart.
    ValidationError(String),
    /// The payment provider rejected the request; `message` is the
    /// provider's own text, passed through verbatim.
    ProviderError { status: u16, message: String },
    /// Could not reach the payment provider at all.
    TransportError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ProviderError { status, message } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, message)
            }
            AppError::TransportError(msg) => {
                tracing::warn!("Payment provider unreachable: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Config(msg) => AppError::ValidationError(msg),
            GatewayError::Provider { status, message } => {
                AppError::ProviderError { status, message }
            }
            GatewayError::Transport(msg) => AppError::TransportError(msg),
        }
    }
}
