//! Query validation and canonicalization

use codemate_core::{PipelineConfig, PipelineError, Query, Result};

/// Validate and canonicalize raw request input into a `Query`.
///
/// The question is trimmed; an empty or whitespace-only question is
/// rejected. The requested result count is clamped into
/// `[1, max_results_cap]`, with the configured default applied when the
/// request leaves it unset or non-positive. Pure, no suspension.
pub fn normalize(
    question: &str,
    max_results: Option<i64>,
    config: &PipelineConfig,
) -> Result<Query> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }

    let requested = match max_results {
        Some(n) if n > 0 => n as usize,
        _ => config.default_max_results,
    };

    Ok(Query {
        question: trimmed.to_string(),
        max_results: requested.min(config.max_results_cap).max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[test]
    fn rejects_empty_question() {
        let err = normalize("", None, &config()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn rejects_whitespace_only_question() {
        let err = normalize("   \t\n  ", Some(3), &config()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn trims_question_text() {
        let query = normalize("  How does auth work?  ", None, &config()).unwrap();
        assert_eq!(query.question, "How does auth work?");
    }

    #[test]
    fn applies_default_when_unset_or_non_positive() {
        let cfg = config();
        assert_eq!(normalize("q", None, &cfg).unwrap().max_results, 5);
        assert_eq!(normalize("q", Some(0), &cfg).unwrap().max_results, 5);
        assert_eq!(normalize("q", Some(-7), &cfg).unwrap().max_results, 5);
    }

    #[test]
    fn clamps_to_cap() {
        let query = normalize("q", Some(10_000), &config()).unwrap();
        assert_eq!(query.max_results, config().max_results_cap);
    }

    #[test]
    fn keeps_value_inside_bounds() {
        let query = normalize("q", Some(3), &config()).unwrap();
        assert_eq!(query.max_results, 3);
    }

    proptest! {
        #[test]
        fn never_fails_on_nonblank_text(
            text in "\\PC*[^\\s]\\PC*",
            max_results in proptest::option::of(any::<i64>()),
        ) {
            let query = normalize(&text, max_results, &config()).unwrap();
            prop_assert!(!query.question.is_empty());
            prop_assert!(query.max_results >= 1);
            prop_assert!(query.max_results <= config().max_results_cap);
        }
    }
}
