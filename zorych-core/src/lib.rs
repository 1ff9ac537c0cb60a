pub mod checkout;
pub mod proxy;
pub mod stripe;

pub use checkout::{CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError, MockGateway};
pub use proxy::ProxyClient;
pub use stripe::StripeGateway;
