//! Application state for the QA server

use std::sync::Arc;

use crate::config::QaConfig;
use crate::service::QaService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: QaService,
}

impl AppState {
    /// Wrap an already-built service
    pub fn new(service: QaService) -> Self {
        tracing::info!(
            "Application state ready (index: {})",
            service.config().vector_db.persist_path.display()
        );
        Self {
            inner: Arc::new(AppStateInner { service }),
        }
    }

    /// Get the QA service
    pub fn service(&self) -> &QaService {
        &self.inner.service
    }

    /// Get configuration
    pub fn config(&self) -> &QaConfig {
        self.inner.service.config()
    }
}
