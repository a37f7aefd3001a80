use std::sync::Arc;

use crate::config::Config;
use crate::job_match::score::{ContainmentScorer, MatchScorer};
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    /// Pluggable match scorer. Default: ContainmentScorer.
    pub scorer: Arc<dyn MatchScorer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: Arc::new(SessionStore::from_config(&config)),
            scorer: Arc::new(ContainmentScorer),
            config,
        }
    }
}
