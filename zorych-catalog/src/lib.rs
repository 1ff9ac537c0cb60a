pub mod catalog;
pub mod service;

pub use catalog::{CatalogError, ServiceCatalog};
pub use service::{Price, Service, ServiceCategory};
