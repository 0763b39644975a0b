pub mod catalog_provider;
pub mod http_catalog;
