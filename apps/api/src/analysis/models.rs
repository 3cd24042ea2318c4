use serde::{Deserialize, Serialize};

/// One analysis call's input. Lives only for the duration of the pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Original upload name; its suffix selects the accepted format.
    pub file_name: String,
    pub resume_text: String,
    pub job_description: String,
}

/// Validated model verdict returned to the caller.
///
/// `score` is always within 0–100. `recommendations` may be empty but is never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: u8,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_content: Option<String>,
}
