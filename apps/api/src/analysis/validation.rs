//! Input checks run before any quota lookup or completion call. Pure; no I/O.

use crate::analysis::models::AnalysisRequest;
use crate::analysis::AnalysisError;

/// Upload formats accepted for resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Txt,
    Doc,
    Docx,
}

impl ResumeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ResumeFormat::Txt => ".txt",
            ResumeFormat::Doc => ".doc",
            ResumeFormat::Docx => ".docx",
        }
    }
}

/// Resolves the upload format from the lowercase suffix after the last `.`.
/// The name is taken as sent; trailing whitespace is part of the suffix.
pub fn validate_file_name(file_name: &str) -> Result<ResumeFormat, AnalysisError> {
    let lower = file_name.to_lowercase();
    let suffix = lower.rfind('.').map(|idx| &lower[idx..]).unwrap_or("");

    match suffix {
        ".txt" => Ok(ResumeFormat::Txt),
        ".doc" => Ok(ResumeFormat::Doc),
        ".docx" => Ok(ResumeFormat::Docx),
        _ => Err(AnalysisError::InvalidFileType(file_name.to_string())),
    }
}

/// Fails with `EmptyInput` when `text` is empty after trimming whitespace.
pub fn require_text(text: &str, field: &'static str) -> Result<(), AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput(field));
    }
    Ok(())
}

/// Full request check: file type first, then resume text, then job description.
pub fn validate_request(request: &AnalysisRequest) -> Result<ResumeFormat, AnalysisError> {
    let format = validate_file_name(&request.file_name)?;
    require_text(&request.resume_text, "resume")?;
    require_text(&request.job_description, "jobDescription")?;
    Ok(format)
}
