//! Shared application state: one `InMemoryStore` behind an `Arc`, cloned
//! cheaply into every handler the way `axum::extract::State` expects.

use std::sync::Arc;

use reel_model::{InMemoryStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new() -> Self {
        Self { store: Arc::new(InMemoryStore::new()) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
