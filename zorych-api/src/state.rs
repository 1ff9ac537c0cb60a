use crate::app_config::CheckoutConfig;
use std::sync::Arc;
use zorych_core::CheckoutGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn CheckoutGateway>,
    pub checkout: CheckoutConfig,
}
