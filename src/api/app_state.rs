use crate::observability::AppMetrics;
use crate::security::validation::QueryValidator;
use crate::services::memoization::MemoizationStore;
use crate::services::resolver::Resolver;
use std::sync::Arc;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Query orchestrator
    pub resolver: Arc<Resolver>,
    /// Memo store, the same instance the resolver writes to
    pub memory: Arc<MemoizationStore>,
    /// Query validator
    pub validator: Arc<QueryValidator>,
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("resolver", &self.resolver)
            .field("memory", &self.memory)
            .field("validator", &self.validator)
            .field("metrics", &"Arc<AppMetrics>")
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(resolver: Arc<Resolver>, validator: QueryValidator, metrics: Arc<AppMetrics>) -> Self {
        Self {
            memory: resolver.memory().clone(),
            resolver,
            validator: Arc::new(validator),
            metrics,
        }
    }
}
