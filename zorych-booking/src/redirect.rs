use crate::error::BookingError;
use async_trait::async_trait;
use std::sync::Arc;
use zorych_core::CheckoutSession;

/// Where the browser should go for payment, in preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Pre-provisioned static payment link; no session was needed.
    PaymentLink(String),
    /// Direct hosted-checkout URL from the session proxy.
    HostedUrl(String),
    /// Session handle to exchange via the payment SDK.
    SdkSession(String),
}

/// Seam over full-page navigation, so tests can capture the redirect instead
/// of performing it. Navigating abandons the in-memory attempt; the payment
/// provider owns the rest of the flow.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> Result<(), BookingError>;
}

/// The payment provider's client SDK, reduced to the one operation the flow
/// needs: redirect-by-session-handle.
#[async_trait]
pub trait PaymentSdk: Send + Sync {
    async fn redirect_to_checkout(&self, session_id: &str) -> Result<(), BookingError>;
}

/// Process-wide SDK handle, created once at startup and injected into the
/// flow. Replaces the lazily-initialized module global the provider SDKs
/// encourage.
#[derive(Clone)]
pub struct SdkHandle {
    inner: Arc<dyn PaymentSdk>,
}

impl SdkHandle {
    pub fn init(publishable_key: &str, sdk: Arc<dyn PaymentSdk>) -> Result<Self, BookingError> {
        if publishable_key.is_empty() {
            return Err(BookingError::Config(
                "Payment provider publishable key is not set".to_string(),
            ));
        }
        Ok(Self { inner: sdk })
    }

    pub async fn redirect_to_checkout(&self, session_id: &str) -> Result<(), BookingError> {
        self.inner.redirect_to_checkout(session_id).await
    }
}

/// Resolve the redirect path for a checkout, each option a fallback for the
/// previous: static payment link, then the session's direct URL, then its
/// SDK handle. No viable path is an operator configuration error.
pub fn resolve(
    static_link: Option<&str>,
    session: Option<&CheckoutSession>,
) -> Result<RedirectTarget, BookingError> {
    if let Some(link) = static_link {
        return Ok(RedirectTarget::PaymentLink(link.to_string()));
    }
    if let Some(session) = session {
        if let Some(url) = session.url.as_deref() {
            return Ok(RedirectTarget::HostedUrl(url.to_string()));
        }
        if let Some(id) = session.session_id.as_deref() {
            return Ok(RedirectTarget::SdkSession(id.to_string()));
        }
    }
    Err(BookingError::Config(
        "No viable redirect path: configure a session proxy backend or a static payment link for this service".to_string(),
    ))
}
