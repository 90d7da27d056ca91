use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Config;
use crate::store::AnnotationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable aggregate store. Production wires `PgStore`; tests use `MemoryStore`.
    pub store: Arc<dyn AnnotationStore>,
    /// Server time source for observation timestamps. See `clock.rs`.
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}
