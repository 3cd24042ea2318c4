// Instruction template for ATS resume analysis.
// The system message lives in llm_client::prompts.

/// ATS analysis prompt template. Replace `{resume_text}` and `{job_description}`.
/// The template is static, so equal inputs always yield byte-identical prompts.
pub const ATS_ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert ATS (Applicant Tracking System) analyzer. Your task is to analyze a resume against a job description and return ONLY a JSON object with no additional text or explanation.

Resume to analyze:
{resume_text}

Job Description:
{job_description}

Return ONLY a JSON object with this exact structure:
{
  "score": <number between 0-100>,
  "recommendations": [<array of string recommendations>],
  "optimizedContent": "<optimized resume content as a string>"
}

Remember:
1. Return ONLY the JSON object, no other text
2. Ensure the score is a number between 0-100
3. Recommendations should be an array of strings
4. Optimized content should be a string
5. Use proper JSON formatting with double quotes"#;

/// Renders the analysis prompt with both inputs embedded verbatim.
///
/// Substitution is single-pass and positional, so placeholder-like text inside
/// the resume is never expanded a second time.
pub fn build_analysis_prompt(resume_text: &str, job_description: &str) -> String {
    let (head, rest) = ATS_ANALYSIS_PROMPT_TEMPLATE
        .split_once("{resume_text}")
        .unwrap_or((ATS_ANALYSIS_PROMPT_TEMPLATE, ""));
    let (middle, tail) = rest.split_once("{job_description}").unwrap_or((rest, ""));

    let mut prompt = String::with_capacity(
        ATS_ANALYSIS_PROMPT_TEMPLATE.len() + resume_text.len() + job_description.len(),
    );
    prompt.push_str(head);
    prompt.push_str(resume_text);
    prompt.push_str(middle);
    prompt.push_str(job_description);
    prompt.push_str(tail);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_inputs_verbatim() {
        let prompt = build_analysis_prompt("  Jane Doe\nRust, Go  ", "Senior Backend Engineer");
        assert!(prompt.contains("Resume to analyze:\n  Jane Doe\nRust, Go  \n"));
        assert!(prompt.contains("Job Description:\nSenior Backend Engineer\n"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_analysis_prompt("resume", "jd");
        let b = build_analysis_prompt("resume", "jd");
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_declares_role_and_output_shape() {
        let prompt = build_analysis_prompt("resume", "jd");
        assert!(prompt.starts_with("You are an expert ATS"));
        for field in ["\"score\"", "\"recommendations\"", "\"optimizedContent\""] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("Return ONLY the JSON object"));
    }

    #[test]
    fn test_placeholder_text_in_resume_is_not_expanded() {
        let prompt = build_analysis_prompt("my {job_description} section", "Platform role");
        assert!(prompt.contains("my {job_description} section"));
        assert_eq!(prompt.matches("Platform role").count(), 1);
    }

    #[test]
    fn test_no_placeholders_remain() {
        let prompt = build_analysis_prompt("r", "j");
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{job_description}"));
    }
}
