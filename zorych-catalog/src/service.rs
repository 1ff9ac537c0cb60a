use serde::{Deserialize, Serialize};

/// Booking categories offered by the clinic. Each category drives its own
/// flow plan (see `zorych-booking::plan`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Consultation,
    Insurance,
    Laboratory,
}

/// Price in minor units plus ISO currency code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Price {
    pub amount: i32,
    pub currency: String,
}

impl Price {
    pub fn new(amount: i32, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// A sellable appointment type. Immutable once the catalog is loaded;
/// selecting a service never mutates the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Display label, e.g. "30 min".
    pub duration: String,
    pub price: Price,
    #[serde(default)]
    pub icon: Option<String>,
    pub category: ServiceCategory,
    /// Slug understood only by the embedded scheduler (e.g. "clinic/30min").
    #[serde(default)]
    pub cal_link: Option<String>,
    /// Opaque payment-provider price reference (e.g. "price_...").
    #[serde(default)]
    pub stripe_price_id: Option<String>,
    /// Pre-provisioned static payment-link URL. When present, checkout
    /// bypasses session creation entirely.
    #[serde(default)]
    pub payment_link: Option<String>,
}

impl Service {
    /// The price reference to bill with, falling back to a catalog-wide
    /// default for services that share one.
    pub fn price_ref<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.stripe_price_id.as_deref().or(default)
    }
}
