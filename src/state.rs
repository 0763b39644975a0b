use std::sync::Arc;

use crate::services::catalog_service::CatalogService;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
}
