use axum::{
    extract::{Json, State},
    http::{header, HeaderMap},
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::info;
use zorych_core::{CheckoutRequest, CheckoutSession};

use crate::error::AppError;
use crate::state::AppState;

/// Fallback redirect base when neither the request, the config nor the
/// Origin header supplies one (local development).
const DEFAULT_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    price_id: String,
    #[serde(default)]
    success_url: Option<String>,
    #[serde(default)]
    cancel_url: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/create-checkout-session", post(create_checkout_session))
}

async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    if req.price_id.is_empty() {
        return Err(AppError::ValidationError("priceId is required".to_string()));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_ORIGIN);

    let success_url = req
        .success_url
        .or_else(|| state.checkout.success_url.clone())
        .unwrap_or_else(|| format!("{}?payment=success", origin));
    let cancel_url = req
        .cancel_url
        .or_else(|| state.checkout.cancel_url.clone())
        .unwrap_or_else(|| format!("{}?payment=cancelled", origin));

    info!(price_id = %req.price_id, "Creating checkout session");

    let session = state
        .gateway
        .create_session(&CheckoutRequest {
            price_id: req.price_id,
            success_url: Some(success_url),
            cancel_url: Some(cancel_url),
        })
        .await?;

    Ok(Json(session))
}
