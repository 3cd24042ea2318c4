//! Resume analysis pipeline: one request/response cycle.
//!
//! Flow: validate input → quota check → build prompt → invoke model (with
//!       retry) → extract + validate JSON → record usage → return result.
//!
//! The caller is already authenticated (see `auth::AuthUser`). Every stage
//! fails fast and no partial result is returned. Usage is recorded only after
//! a successful extraction, so an abandoned request (dropped future) never
//! consumes quota.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::extractor::ResponseExtractor;
use crate::analysis::invoker::ModelInvoker;
use crate::analysis::models::{AnalysisRequest, AnalysisResult};
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::validation::validate_request;
use crate::analysis::AnalysisError;
use crate::quota::QuotaGate;

pub struct AnalysisPipeline {
    invoker: ModelInvoker,
    quota: Arc<QuotaGate>,
    extractor: ResponseExtractor,
}

impl AnalysisPipeline {
    pub fn new(invoker: ModelInvoker, quota: Arc<QuotaGate>, extractor: ResponseExtractor) -> Self {
        Self {
            invoker,
            quota,
            extractor,
        }
    }

    pub async fn run(
        &self,
        request: AnalysisRequest,
        user_id: Uuid,
    ) -> Result<AnalysisResult, AnalysisError> {
        // Step 1: Input validation
        let format = validate_request(&request)?;

        // Step 2: Quota gate
        let decision = self.quota.evaluate(user_id).await?;
        if !decision.allowed() {
            info!(
                "Quota exceeded for user {user_id}: {}/{}",
                decision.count,
                self.quota.ceiling()
            );
            return Err(AnalysisError::QuotaExceeded);
        }

        // Step 3: Prompt
        let prompt = build_analysis_prompt(&request.resume_text, &request.job_description);
        info!(
            "Analyzing {} resume for user {user_id} ({} chars resume, {} chars JD)",
            format.extension(),
            request.resume_text.len(),
            request.job_description.len()
        );

        // Step 4: Model call with bounded retry
        let raw_text = self.invoker.invoke(&prompt).await?;

        // Step 5: Extraction; raw output is logged for diagnosis, never returned
        let result = self.extractor.extract(&raw_text).map_err(|e| {
            error!("Failed to extract analysis for user {user_id}: {e}. Raw output: {raw_text:?}");
            e
        })?;

        // Step 6: Meter free-tier users only
        if !decision.subscribed {
            self.quota.record_use(user_id).await?;
        }

        info!("Analysis complete for user {user_id}: score={}", result.score);

        Ok(result)
    }
}
