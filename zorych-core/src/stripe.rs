use crate::checkout::{CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError};
use async_trait::async_trait;
use serde::Deserialize;

const SESSIONS_ENDPOINT: &str = "https://api.stripe.com/v1/checkout/sessions";

/// Stripe-backed gateway. Lives server-side only: it holds the secret key,
/// which must never reach the browser.
#[derive(Debug)]
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: &str) -> Result<Self, GatewayError> {
        if secret_key.is_empty() {
            return Err(GatewayError::Config(
                "Stripe secret key is not set".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
            endpoint: SESSIONS_ENDPOINT.to_string(),
        })
    }

    /// Point the gateway at a different sessions endpoint (stub servers).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl CheckoutGateway for StripeGateway {
    async fn create_session(&self, req: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        if req.price_id.is_empty() {
            return Err(GatewayError::Config("priceId is required".to_string()));
        }

        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("line_items[0][price]", &req.price_id),
            ("line_items[0][quantity]", "1"),
        ];
        if let Some(url) = req.success_url.as_deref() {
            form.push(("success_url", url));
        }
        if let Some(url) = req.cancel_url.as_deref() {
            form.push(("cancel_url", url));
        }

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Surface Stripe's own message so operators can see e.g. an
            // invalid price reference, rather than a generic failure.
            let message = match response.json::<StripeErrorBody>().await {
                Ok(body) => body
                    .error
                    .message
                    .unwrap_or_else(|| "Failed to create checkout session".to_string()),
                Err(_) => "Failed to create checkout session".to_string(),
            };
            tracing::warn!(status = status.as_u16(), %message, "Stripe rejected session creation");
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        tracing::info!(session_id = %session.id, "Created checkout session");
        Ok(CheckoutSession {
            session_id: Some(session.id),
            url: session.url,
        })
    }
}
