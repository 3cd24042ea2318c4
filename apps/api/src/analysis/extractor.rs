//! Pulls the analysis JSON object out of free-form model output and checks its shape.
//!
//! The brace span runs from the first `{` to the last `}`, so prose or code
//! fences around the object are ignored. Validation is explicit per field and
//! yields a `ShapeViolation` naming what was wrong instead of a generic error.

use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use crate::analysis::models::AnalysisResult;
use crate::analysis::AnalysisError;

const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 100.0;

/// What made a parsed JSON value fail the analysis schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeViolation {
    NotAnObject,
    ScoreNotNumber,
    RecommendationsNotArray,
    RecommendationNotString { index: usize },
    OptimizedContentNotString,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeViolation::NotAnObject => write!(f, "top-level value is not an object"),
            ShapeViolation::ScoreNotNumber => write!(f, "`score` is missing or not a number"),
            ShapeViolation::RecommendationsNotArray => {
                write!(f, "`recommendations` is missing or not an array")
            }
            ShapeViolation::RecommendationNotString { index } => {
                write!(f, "`recommendations[{index}]` is not a string")
            }
            ShapeViolation::OptimizedContentNotString => {
                write!(f, "`optimizedContent` is missing or not a string")
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseExtractor {
    /// Require `optimizedContent` to be present as a string. When false, a
    /// missing or null value is accepted and reported as `None`.
    require_optimized_content: bool,
}

impl ResponseExtractor {
    pub fn new(require_optimized_content: bool) -> Self {
        Self {
            require_optimized_content,
        }
    }

    pub fn extract(&self, raw_text: &str) -> Result<AnalysisResult, AnalysisError> {
        let span = locate_json_span(raw_text).ok_or(AnalysisError::NoJsonFound)?;
        let value: Value = serde_json::from_str(span).map_err(AnalysisError::MalformedJson)?;
        self.validate(&value).map_err(AnalysisError::InvalidShape)
    }

    /// Schema check over a parsed value. Pure; returns a tagged result.
    pub fn validate(&self, value: &Value) -> Result<AnalysisResult, ShapeViolation> {
        let object = value.as_object().ok_or(ShapeViolation::NotAnObject)?;

        let score = object
            .get("score")
            .and_then(Value::as_f64)
            .ok_or(ShapeViolation::ScoreNotNumber)?;

        let recommendations = read_recommendations(object)?;

        let optimized_content = match object.get("optimizedContent") {
            Some(Value::String(s)) => Some(s.clone()),
            None | Some(Value::Null) if !self.require_optimized_content => None,
            _ => return Err(ShapeViolation::OptimizedContentNotString),
        };

        Ok(AnalysisResult {
            score: normalize_score(score),
            recommendations,
            optimized_content,
        })
    }
}

/// Returns the slice from the first `{` through the last `}`, if both exist in order.
pub fn locate_json_span(raw_text: &str) -> Option<&str> {
    let start = raw_text.find('{')?;
    let end = raw_text.rfind('}')?;
    (end > start).then(|| &raw_text[start..=end])
}

fn read_recommendations(object: &Map<String, Value>) -> Result<Vec<String>, ShapeViolation> {
    let items = object
        .get("recommendations")
        .and_then(Value::as_array)
        .ok_or(ShapeViolation::RecommendationsNotArray)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_owned)
                .ok_or(ShapeViolation::RecommendationNotString { index })
        })
        .collect()
}

/// Rounds to the nearest integer and clamps into 0–100.
fn normalize_score(score: f64) -> u8 {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        warn!("Model returned out-of-range score {score}; clamping to [0, 100]");
    }
    score.round().clamp(MIN_SCORE, MAX_SCORE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> ResponseExtractor {
        ResponseExtractor::new(true)
    }

    fn lenient() -> ResponseExtractor {
        ResponseExtractor::new(false)
    }

    #[test]
    fn test_extracts_object_surrounded_by_noise() {
        let raw = r#"noise {"score":80,"recommendations":["fix X"],"optimizedContent":"..."} trailing"#;
        let result = strict().extract(raw).unwrap();
        assert_eq!(
            result,
            AnalysisResult {
                score: 80,
                recommendations: vec!["fix X".to_string()],
                optimized_content: Some("...".to_string()),
            }
        );
    }

    #[test]
    fn test_extracts_from_markdown_fence() {
        let raw = "Here you go:\n```json\n{\"score\": 55, \"recommendations\": [], \"optimizedContent\": \"x\"}\n```";
        let result = strict().extract(raw).unwrap();
        assert_eq!(result.score, 55);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_no_brace_is_no_json_found() {
        let err = strict().extract("I cannot help with that.").unwrap_err();
        assert!(matches!(err, AnalysisError::NoJsonFound));
    }

    #[test]
    fn test_closing_brace_before_opening_is_no_json_found() {
        let err = strict().extract("} oops {").unwrap_err();
        assert!(matches!(err, AnalysisError::NoJsonFound));
    }

    #[test]
    fn test_truncated_object_is_malformed() {
        let err = strict()
            .extract(r#"{"score": 80, "recommendations": ["a", } "#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedJson(_)));
    }

    #[test]
    fn test_two_objects_span_is_malformed() {
        let raw = r#"{"score": 1} and also {"score": 2}"#;
        assert!(matches!(
            strict().extract(raw).unwrap_err(),
            AnalysisError::MalformedJson(_)
        ));
    }

    #[test]
    fn test_non_numeric_score_is_invalid_shape() {
        let raw = r#"{"score":"high","recommendations":[],"optimizedContent":""}"#;
        let err = strict().extract(raw).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidShape(ShapeViolation::ScoreNotNumber)
        ));
    }

    #[test]
    fn test_recommendations_must_be_strings() {
        let raw = r#"{"score":60,"recommendations":["ok", 3],"optimizedContent":""}"#;
        let err = strict().extract(raw).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidShape(ShapeViolation::RecommendationNotString { index: 1 })
        ));
    }

    #[test]
    fn test_recommendations_must_be_array() {
        let raw = r#"{"score":60,"recommendations":"add keywords","optimizedContent":""}"#;
        assert!(matches!(
            strict().extract(raw).unwrap_err(),
            AnalysisError::InvalidShape(ShapeViolation::RecommendationsNotArray)
        ));
    }

    #[test]
    fn test_strict_requires_optimized_content() {
        let raw = r#"{"score":60,"recommendations":[]}"#;
        assert!(matches!(
            strict().extract(raw).unwrap_err(),
            AnalysisError::InvalidShape(ShapeViolation::OptimizedContentNotString)
        ));
    }

    #[test]
    fn test_lenient_allows_missing_or_null_optimized_content() {
        let missing = lenient()
            .extract(r#"{"score":60,"recommendations":[]}"#)
            .unwrap();
        assert_eq!(missing.optimized_content, None);

        let null = lenient()
            .extract(r#"{"score":60,"recommendations":[],"optimizedContent":null}"#)
            .unwrap();
        assert_eq!(null.optimized_content, None);
    }

    #[test]
    fn test_lenient_still_rejects_wrong_type() {
        let raw = r#"{"score":60,"recommendations":[],"optimizedContent":42}"#;
        assert!(matches!(
            lenient().extract(raw).unwrap_err(),
            AnalysisError::InvalidShape(ShapeViolation::OptimizedContentNotString)
        ));
    }

    #[test]
    fn test_array_top_level_is_not_an_object() {
        let value = serde_json::json!([1, 2, 3]);
        assert_eq!(
            strict().validate(&value).unwrap_err(),
            ShapeViolation::NotAnObject
        );
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let high = strict()
            .extract(r#"{"score":150,"recommendations":[],"optimizedContent":""}"#)
            .unwrap();
        assert_eq!(high.score, 100);

        let low = strict()
            .extract(r#"{"score":-5,"recommendations":[],"optimizedContent":""}"#)
            .unwrap();
        assert_eq!(low.score, 0);
    }

    #[test]
    fn test_fractional_score_is_rounded() {
        let result = strict()
            .extract(r#"{"score":72.6,"recommendations":[],"optimizedContent":""}"#)
            .unwrap();
        assert_eq!(result.score, 73);
    }

    #[test]
    fn test_recommendation_order_is_preserved() {
        let result = strict()
            .extract(r#"{"score":50,"recommendations":["first","second","third"],"optimizedContent":""}"#)
            .unwrap();
        assert_eq!(result.recommendations, vec!["first", "second", "third"]);
    }
}
