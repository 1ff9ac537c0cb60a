use crate::service::{Service, ServiceCategory};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Immutable service catalog. Built once from a JSON document, read-only
/// afterwards; lookups never hand out mutable references.
#[derive(Debug)]
pub struct ServiceCatalog {
    services: Vec<Service>,
    by_id: HashMap<String, usize>,
    default_price_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    default_price_id: Option<String>,
    services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<Service>, default_price_id: Option<String>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(services.len());
        for (idx, svc) in services.iter().enumerate() {
            if by_id.insert(svc.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(svc.id.clone()));
            }
        }
        Ok(Self {
            services,
            by_id,
            default_price_id,
        })
    }

    /// Parse a catalog from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.services, file.default_price_id)
    }

    /// Load a catalog from a JSON file on disk (`catalog.path` in config).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn get(&self, id: &str) -> Option<&Service> {
        self.by_id.get(id).map(|&idx| &self.services[idx])
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn by_category(&self, category: ServiceCategory) -> impl Iterator<Item = &Service> {
        self.services.iter().filter(move |s| s.category == category)
    }

    /// Resolve the billable price reference for a service, applying the
    /// catalog-wide default when the service carries none.
    pub fn price_ref_for<'a>(&'a self, service: &'a Service) -> Option<&'a str> {
        service.price_ref(self.default_price_id.as_deref())
    }

    pub fn default_price_id(&self) -> Option<&str> {
        self.default_price_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate service id: {0}")]
    DuplicateId(String),

    #[error("Could not read catalog file: {0}")]
    Io(#[from] std::io::Error),
}
