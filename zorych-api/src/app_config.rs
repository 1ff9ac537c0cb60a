use serde::Deserialize;
use std::env;
use zorych_booking::FlowConfig;
use zorych_catalog::{CatalogError, ServiceCatalog};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Client-side key handed to the payment SDK for session redirects.
    #[serde(default)]
    pub publishable_key: Option<String>,
    /// Price reference used when a service carries none of its own.
    #[serde(default)]
    pub default_price_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CheckoutConfig {
    /// Overrides for the redirect targets; when unset, targets are derived
    /// from the requesting page's Origin header.
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    /// Advance past the schedule step as soon as the bridge confirms,
    /// instead of waiting for an explicit continue.
    #[serde(default)]
    pub auto_advance: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Path to the service catalog JSON document.
    pub path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in.
            .add_source(config::File::with_name("config/local").required(false))
            // E.g. ZORYCH__STRIPE__SECRET_KEY=sk_live_...
            .add_source(config::Environment::with_prefix("ZORYCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Booking-flow knobs as the orchestrator consumes them.
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig {
            auto_advance: self.checkout.auto_advance,
            default_price_id: self.stripe.default_price_id.clone(),
            success_url: self.checkout.success_url.clone(),
            cancel_url: self.checkout.cancel_url.clone(),
        }
    }

    /// Load the service catalog named by `catalog.path`, if one is configured.
    pub fn load_catalog(&self) -> Result<Option<ServiceCatalog>, CatalogError> {
        self.catalog
            .path
            .as_deref()
            .map(ServiceCatalog::from_file)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
        [server]
        port = 3001

        [stripe]
        secret_key = "sk_test_123"
        publishable_key = "pk_test_123"
        default_price_id = "price_general"

        [checkout]
        success_url = "https://clinic.example/?payment=success"
        auto_advance = true

        [catalog]
        path = "config/catalog.json"
    "#;

    const MINIMAL_TOML: &str = r#"
        [server]
        port = 3001

        [stripe]
        secret_key = "sk_test_123"
    "#;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_reads_full_surface() {
        let cfg = parse(FULL_TOML);
        assert_eq!(cfg.stripe.publishable_key.as_deref(), Some("pk_test_123"));
        assert_eq!(cfg.stripe.default_price_id.as_deref(), Some("price_general"));
        assert!(cfg.checkout.auto_advance);
        assert_eq!(cfg.catalog.path.as_deref(), Some("config/catalog.json"));
    }

    #[test]
    fn test_optional_sections_default() {
        let cfg = parse(MINIMAL_TOML);
        assert!(cfg.stripe.publishable_key.is_none());
        assert!(cfg.stripe.default_price_id.is_none());
        assert!(!cfg.checkout.auto_advance);
        assert!(cfg.catalog.path.is_none());
        assert!(cfg.load_catalog().unwrap().is_none());
    }

    #[test]
    fn test_flow_config_mapping() {
        let flow = parse(FULL_TOML).flow_config();
        assert!(flow.auto_advance);
        assert_eq!(flow.default_price_id.as_deref(), Some("price_general"));
        assert_eq!(
            flow.success_url.as_deref(),
            Some("https://clinic.example/?payment=success")
        );
        assert!(flow.cancel_url.is_none());
    }

    #[test]
    fn test_load_catalog_from_configured_path() {
        let path = std::env::temp_dir().join("zorych-app-config-catalog.json");
        std::fs::write(
            &path,
            r#"{
                "services": [
                    {
                        "id": "1",
                        "name": "General consultation",
                        "description": "Initial appointment",
                        "duration": "30 min",
                        "price": { "amount": 30000, "currency": "CZK" },
                        "category": "CONSULTATION"
                    }
                ]
            }"#,
        )
        .unwrap();

        let mut cfg = parse(MINIMAL_TOML);
        cfg.catalog.path = Some(path.to_string_lossy().into_owned());
        let catalog = cfg.load_catalog().unwrap().unwrap();
        assert_eq!(catalog.len(), 1);
        std::fs::remove_file(&path).ok();
    }
}
