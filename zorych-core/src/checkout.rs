use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Request to create a hosted-checkout session. Serialized shape matches the
/// proxy wire contract (`priceId` / `successUrl` / `cancelUrl`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub price_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

impl CheckoutRequest {
    pub fn new(price_id: &str) -> Self {
        Self {
            price_id: price_id.to_string(),
            success_url: None,
            cancel_url: None,
        }
    }
}

/// Short-lived, single-use handle for one purchase attempt. At least one of
/// `session_id` / `url` is present in a valid session; a retry must request a
/// fresh one rather than reuse this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CheckoutSession {
    pub fn from_url(url: &str) -> Self {
        Self {
            session_id: None,
            url: Some(url.to_string()),
        }
    }

    pub fn from_session_id(session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_string()),
            url: None,
        }
    }

    /// A session that carries neither a URL nor an id cannot be redirected to.
    pub fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.url.is_none()
    }
}

/// Session-creation failures, split so callers can tell operator
/// misconfiguration from provider rejections from network trouble.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Checkout is not configured: {0}")]
    Config(String),

    /// The provider rejected session creation. `message` is the provider's
    /// own text, propagated verbatim for operator diagnosis.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("Could not reach the payment backend: {0}")]
    Transport(String),
}

/// Seam between the booking flow and whatever actually mints checkout
/// sessions (the Stripe API server-side, the session proxy client-side).
/// Every successful call creates billable provider-side state; callers own
/// duplicate suppression.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(&self, req: &CheckoutRequest) -> Result<CheckoutSession, GatewayError>;
}

/// Canned gateway for tests and local development. Returns a hosted URL for
/// any price reference except the failure triggers below, and counts calls so
/// tests can assert the reentrancy guard.
pub struct MockGateway {
    calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckoutGateway for MockGateway {
    async fn create_session(&self, req: &CheckoutRequest) -> Result<CheckoutSession, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        // Triggers for exercising the failure paths.
        if req.price_id == "price_missing" {
            return Err(GatewayError::Provider {
                status: 400,
                message: "no such price".to_string(),
            });
        }
        if req.price_id == "price_unreachable" {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }
        if req.price_id == "price_sdk_only" {
            return Ok(CheckoutSession::from_session_id(&format!("cs_mock_{}", n)));
        }

        Ok(CheckoutSession::from_url(&format!(
            "https://pay.example/cs_mock_{}",
            n
        )))
    }
}
