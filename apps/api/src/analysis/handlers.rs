//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::analysis::document::{extract_text, UploadedFile};
use crate::analysis::models::{AnalysisRequest, AnalysisResult};
use crate::analysis::validation::validate_file_name;
use crate::analysis::AnalysisError;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::quota::UsageSummary;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const JOB_DESCRIPTION_FIELD: &str = "jobDescription";

/// POST /api/v1/analysis
///
/// Multipart form: `resume` (file, .txt/.doc/.docx) and `jobDescription` (text).
/// Returns `{score, recommendations, optimizedContent}`.
pub async fn handle_analysis(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut resume: Option<UploadedFile> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(RESUME_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let contents = field.bytes().await.map_err(upload_error)?;
                resume = Some(UploadedFile {
                    file_name,
                    contents,
                });
            }
            Some(JOB_DESCRIPTION_FIELD) => {
                let text = field.text().await.map_err(upload_error)?;
                job_description = Some(text);
            }
            _ => {}
        }
    }

    let resume = resume.ok_or(AnalysisError::MissingField(RESUME_FIELD))?;
    let job_description =
        job_description.ok_or(AnalysisError::MissingField(JOB_DESCRIPTION_FIELD))?;

    // The extension decides how to decode; the pipeline re-checks it with the text
    let format = validate_file_name(&resume.file_name)?;
    let resume_text = extract_text(format, &resume.contents)?;

    let request = AnalysisRequest {
        file_name: resume.file_name,
        resume_text,
        job_description,
    };

    let result = state.pipeline.run(request, user_id).await?;

    Ok(Json(result))
}

/// Maps a multipart read failure onto the taxonomy. The library's detail is
/// logged, never returned.
fn upload_error(e: MultipartError) -> AnalysisError {
    let status = e.status();
    warn!("Rejected multipart upload ({status}): {e}");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AnalysisError::UploadTooLarge
    } else {
        AnalysisError::MalformedUpload
    }
}

/// GET /api/v1/usage
///
/// Free-tier usage for the caller, for rendering the remaining-credits counter.
pub async fn handle_usage(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UsageSummary>, AppError> {
    let summary = state.quota.summary(user_id).await?;
    Ok(Json(summary))
}
