// Resume analysis: validation, prompt construction, model invocation with
// bounded retry, structured-response extraction, and quota gating.
// All completion calls go through llm_client::CompletionCapability.

pub mod document;
pub mod extractor;
pub mod handlers;
pub mod invoker;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod validation;

use thiserror::Error;

use crate::analysis::extractor::ShapeViolation;
use crate::errors::FailureCategory;

/// Every way an analysis request can fail. Each stage fails fast with one of these.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid file type: '{0}'")]
    InvalidFileType(String),

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Upload exceeds the request size limit")]
    UploadTooLarge,

    #[error("Malformed multipart upload")]
    MalformedUpload,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Free-tier quota exceeded")]
    QuotaExceeded,

    #[error("Completion service rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Completion service failure: {0}")]
    Upstream(String),

    #[error("No JSON object found in model output")]
    NoJsonFound,

    #[error("Malformed JSON in model output: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("Model output has invalid shape: {0}")]
    InvalidShape(ShapeViolation),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn category(&self) -> FailureCategory {
        match self {
            AnalysisError::InvalidFileType(_)
            | AnalysisError::EmptyInput(_)
            | AnalysisError::MissingField(_)
            | AnalysisError::UnreadableFile(_)
            | AnalysisError::MalformedUpload => FailureCategory::BadInput,
            AnalysisError::UploadTooLarge => FailureCategory::PayloadTooLarge,
            AnalysisError::Unauthorized => FailureCategory::Unauthorized,
            AnalysisError::QuotaExceeded => FailureCategory::QuotaExceeded,
            AnalysisError::RateLimited { .. } => FailureCategory::UpstreamRateLimited,
            AnalysisError::Upstream(_)
            | AnalysisError::NoJsonFound
            | AnalysisError::MalformedJson(_)
            | AnalysisError::InvalidShape(_) => FailureCategory::UpstreamFailure,
            AnalysisError::Internal(_) => FailureCategory::InternalError,
        }
    }

    /// Human-readable message safe to show the caller. Never includes model
    /// output or upstream error bodies.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::InvalidFileType(_) => {
                "Invalid file type. Please upload a .txt, .doc, or .docx file only."
            }
            AnalysisError::EmptyInput("resume") => {
                "The resume file appears to be empty. Please upload a file with content."
            }
            AnalysisError::EmptyInput(_) => "Job description cannot be empty.",
            AnalysisError::MissingField("resume") => "Resume file is required",
            AnalysisError::MissingField(_) => "Job description is required",
            AnalysisError::UnreadableFile(_) => {
                "Unable to read file content. Please ensure the file is a valid text document."
            }
            AnalysisError::UploadTooLarge => "Resume file is too large.",
            AnalysisError::MalformedUpload => {
                "Invalid upload. Please send the resume and job description as a multipart form."
            }
            AnalysisError::Unauthorized => "Authentication required",
            AnalysisError::QuotaExceeded => "Free trial has expired. Please upgrade to pro.",
            AnalysisError::RateLimited { .. } => {
                "Our AI system is currently experiencing high demand. Please try again in a few moments."
            }
            AnalysisError::Upstream(_) => "Failed to analyze resume. Please try again.",
            AnalysisError::NoJsonFound
            | AnalysisError::MalformedJson(_)
            | AnalysisError::InvalidShape(_) => "Failed to parse analysis results. Please try again.",
            AnalysisError::Internal(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_input_errors_are_bad_input() {
        for err in [
            AnalysisError::InvalidFileType(".pdf".to_string()),
            AnalysisError::EmptyInput("resume"),
            AnalysisError::MissingField("jobDescription"),
            AnalysisError::UnreadableFile("bad utf-8".to_string()),
            AnalysisError::MalformedUpload,
        ] {
            assert_eq!(err.category(), FailureCategory::BadInput, "{err}");
        }
    }

    #[test]
    fn test_oversized_upload_has_its_own_category() {
        let err = AnalysisError::UploadTooLarge;
        assert_eq!(err.category(), FailureCategory::PayloadTooLarge);
        assert_eq!(err.user_message(), "Resume file is too large.");
    }

    #[test]
    fn test_extraction_errors_share_generic_message() {
        let no_json = AnalysisError::NoJsonFound;
        let shape = AnalysisError::InvalidShape(ShapeViolation::ScoreNotNumber);
        assert_eq!(no_json.category(), FailureCategory::UpstreamFailure);
        assert_eq!(no_json.user_message(), shape.user_message());
    }

    #[test]
    fn test_empty_input_messages_name_the_field() {
        assert!(AnalysisError::EmptyInput("resume")
            .user_message()
            .contains("resume file"));
        assert!(AnalysisError::EmptyInput("jobDescription")
            .user_message()
            .contains("Job description"));
    }
}
