// Risk Scoring Service
// Maps a detected clause set to a heuristic risk score in [0, 100].
// Pure function: no I/O, safe to call concurrently on independent inputs.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::models::{DetectedClause, RiskScoringOptions};

/// Notice period in days, e.g. "30 days notice" or "30-day notice".
fn notice_period_regex() -> &'static Regex {
    static NOTICE_PERIOD: OnceLock<Regex> = OnceLock::new();
    NOTICE_PERIOD.get_or_init(|| {
        RegexBuilder::new(r"(\d+)[\s-]*days?\s+notice")
            .case_insensitive(true)
            .build()
            .expect("notice period pattern")
    })
}

/// Calculate a normalized risk score (0-100) from the clause set.
///
/// Each required clause type absent from the set adds
/// `missing_required_clause_weight`; an auto-renewal clause whose excerpt
/// names a notice period strictly below `short_notice_days` adds
/// `auto_renew_short_notice_weight` once. An auto-renewal excerpt with no
/// notice period at all is treated as not short-notice.
pub fn calculate_risk_score(clauses: &[DetectedClause], options: &RiskScoringOptions) -> f64 {
    let clause_types: HashSet<String> = clauses
        .iter()
        .map(|c| c.clause_type.to_lowercase())
        .collect();

    let mut risk_score = 0.0;

    let missing_required: Vec<&str> = options
        .required_clauses
        .iter()
        .filter(|required| !clause_types.contains(&required.to_lowercase()))
        .map(|s| s.as_str())
        .collect();

    if !missing_required.is_empty() {
        let penalty = missing_required.len() as f64 * options.missing_required_clause_weight;
        risk_score += penalty;
        debug!(
            missing = %missing_required.join(", "),
            penalty,
            "missing required clauses"
        );
    }

    if clause_types.contains("auto_renewal") {
        let auto_renewal = clauses
            .iter()
            .find(|c| c.clause_type.eq_ignore_ascii_case("auto_renewal"));

        if let Some(clause) = auto_renewal {
            if has_short_notice_period(&clause.excerpt, options.short_notice_days) {
                risk_score += options.auto_renew_short_notice_weight;
                debug!(
                    penalty = options.auto_renew_short_notice_weight,
                    "auto-renewal with short notice period"
                );
            }
        }
    }

    let normalized = risk_score.clamp(0.0, 100.0);

    info!(
        score = normalized,
        clause_count = clauses.len(),
        "calculated risk score"
    );

    normalized
}

fn has_short_notice_period(excerpt: &str, short_notice_days: u32) -> bool {
    if let Some(caps) = notice_period_regex().captures(excerpt) {
        if let Ok(days) = caps[1].parse::<u32>() {
            return days < short_notice_days;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(clause_type: &str, excerpt: &str) -> DetectedClause {
        DetectedClause {
            clause_type: clause_type.to_string(),
            excerpt: excerpt.to_string(),
            confidence: 0.75,
            page_number: None,
        }
    }

    fn all_required() -> Vec<DetectedClause> {
        vec![
            clause("renewal", "Renewal term is 12 months."),
            clause("termination", "Termination notice is 60 days."),
            clause("data_protection", "GDPR compliance required."),
            clause("liability_cap", "Liability capped at $100,000."),
            clause("governing_law", "Governed by laws of California."),
        ]
    }

    #[test]
    fn test_all_required_clauses_present_scores_zero() {
        let score = calculate_risk_score(&all_required(), &RiskScoringOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_one_missing_required_clause() {
        let mut clauses = all_required();
        clauses.retain(|c| c.clause_type != "liability_cap");

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 15.0);
    }

    #[test]
    fn test_multiple_missing_required_clauses() {
        let clauses = vec![
            clause("renewal", "Renewal term is 12 months."),
            clause("termination", "Termination notice is 60 days."),
        ];

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 45.0); // 3 missing * 15
    }

    #[test]
    fn test_empty_clause_set_scores_all_missing() {
        let score = calculate_risk_score(&[], &RiskScoringOptions::default());
        assert_eq!(score, 75.0); // 5 missing * 15
    }

    #[test]
    fn test_clause_type_comparison_is_case_insensitive() {
        let clauses: Vec<DetectedClause> = all_required()
            .into_iter()
            .map(|mut c| {
                c.clause_type = c.clause_type.to_uppercase();
                c
            })
            .collect();

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_auto_renewal_with_short_notice_adds_penalty() {
        let mut clauses = all_required();
        clauses.push(clause(
            "auto_renewal",
            "This contract will auto-renew with 15 days notice.",
        ));

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 25.0);
    }

    #[test]
    fn test_auto_renewal_with_long_notice_adds_nothing() {
        let mut clauses = all_required();
        clauses.push(clause(
            "auto_renewal",
            "This contract will auto-renew with 60 days notice.",
        ));

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_auto_renewal_at_threshold_is_not_short() {
        let mut clauses = all_required();
        clauses.push(clause(
            "auto_renewal",
            "This contract will auto-renew with 30 days notice.",
        ));

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_auto_renewal_without_notice_period_adds_nothing() {
        let mut clauses = all_required();
        clauses.push(clause(
            "auto_renewal",
            "This contract renews automatically each year.",
        ));

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_hyphenated_notice_period_is_recognized() {
        let mut clauses = all_required();
        clauses.push(clause(
            "auto_renewal",
            "Automatic renewal applies unless 10-day notice is given.",
        ));

        let score = calculate_risk_score(&clauses, &RiskScoringOptions::default());
        assert_eq!(score, 25.0);
    }

    #[test]
    fn test_score_is_clamped_at_one_hundred() {
        let options = RiskScoringOptions {
            missing_required_clause_weight: 30.0,
            ..RiskScoringOptions::default()
        };

        let score = calculate_risk_score(&[], &options);
        assert_eq!(score, 100.0); // 5 * 30 = 150, clamped
    }
}
