use crate::checkout::{CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError};
use async_trait::async_trait;
use serde::Deserialize;

/// Client for the session-proxy endpoint. This is what the booking flow uses
/// when a backend is configured: the proxy holds the provider secret, the
/// client only ever sees the resulting session handle or URL.
#[derive(Debug)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    error: Option<String>,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        if base_url.is_empty() {
            return Err(GatewayError::Config(
                "Session proxy base URL is not set".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CheckoutGateway for ProxyClient {
    async fn create_session(&self, req: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        let url = format!("{}/create-checkout-session", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Session proxy unreachable");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            // Any non-2xx is a failure; surface the body's `error` verbatim
            // when present.
            let message = match response.json::<ProxyErrorBody>().await {
                Ok(ProxyErrorBody { error: Some(msg) }) => msg,
                _ => "Failed to create checkout session".to_string(),
            };
            tracing::warn!(
                status = status.as_u16(),
                %message,
                "Session proxy rejected session creation"
            );
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if session.is_empty() {
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                message: "Session response carried neither sessionId nor url".to_string(),
            });
        }

        Ok(session)
    }
}
