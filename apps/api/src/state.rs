use std::sync::Arc;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::auth::Authenticator;
use crate::config::Config;
use crate::quota::QuotaGate;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<AnalysisPipeline>,
    /// Same gate the pipeline uses; handlers read it for usage summaries.
    pub quota: Arc<QuotaGate>,
    pub authenticator: Arc<dyn Authenticator>,
}
