use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zorych_api::{app, AppState};
use zorych_core::StripeGateway;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zorych_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = zorych_api::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Zorych session proxy on port {}", config.server.port);

    let gateway = StripeGateway::new(&config.stripe.secret_key)
        .expect("Stripe secret key is not configured");

    let app_state = AppState {
        gateway: Arc::new(gateway),
        checkout: config.checkout.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
