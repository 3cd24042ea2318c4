// System prompts sent alongside every completion call.
// Task-specific instruction templates live next to the code that fills them.

/// System message establishing the assistant's role for resume analysis.
pub const ATS_ANALYZER_SYSTEM: &str =
    "You are an expert ATS system analyzer that helps optimize resumes.";
