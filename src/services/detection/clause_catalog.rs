// Clause Pattern Catalog
// Fixed, ordered table of matching rules. The detector iterates in table
// order, so detection output order is stable across runs.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// One entry of the catalog: a clause type key, its matching rule, and the
/// static confidence assigned to every match of that rule.
#[derive(Debug)]
pub struct ClausePattern {
    pub clause_type: &'static str,
    pub regex: Regex,
    pub confidence: f64,
}

static CATALOG: OnceLock<Vec<ClausePattern>> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .expect("clause pattern failed to compile")
}

/// The process-wide clause pattern catalog, built once on first use.
pub fn clause_patterns() -> &'static [ClausePattern] {
    CATALOG
        .get_or_init(|| {
            vec![
                ClausePattern {
                    clause_type: "renewal",
                    regex: compile(
                        r"\b(renew|renewal|extend|extension)\s+(term|period|clause|provision|agreement|contract)\b",
                    ),
                    confidence: 0.75,
                },
                ClausePattern {
                    clause_type: "auto_renewal",
                    regex: compile(
                        r"\b(auto(matic(ally)?)?[\s-]*(renew|renewal|extend)|renew\s+automatic(ally)?|automatic(ally)?\s+(renew|renewal))\b",
                    ),
                    confidence: 0.80,
                },
                ClausePattern {
                    clause_type: "termination",
                    regex: compile(
                        r"\b(terminat(e|ion)|cancel(lation)?|end(ing)?)\s+(clause|provision|notice|period|rights?|agreement|contract)\b|\b(notice\s+period|termination\s+notice)\s*[:\-]?\s*(\d+\s*(days?|months?|weeks?))\b",
                    ),
                    confidence: 0.75,
                },
                ClausePattern {
                    clause_type: "data_protection",
                    regex: compile(
                        r"\b(data\s+protection|privacy|GDPR|personal\s+data|confidential\s+information|data\s+security|information\s+security)\s+(clause|provision|requirements?|obligations?|act|law|regulation)\b",
                    ),
                    confidence: 0.70,
                },
                ClausePattern {
                    clause_type: "liability_cap",
                    regex: compile(
                        r"\b(liabilit(y|ies)|indemnit(y|ies))\s+(cap|limit(ation)?|ceiling|maximum)\b|\b(cap|limit)\s+(on|of)\s+(liabilit(y|ies)|indemnit(y|ies))\b|\bliabilit(y|ies)\s+shall\s+(not\s+)?exceed\b",
                    ),
                    confidence: 0.80,
                },
                ClausePattern {
                    clause_type: "governing_law",
                    regex: compile(
                        r"\b(govern(ing|ed)\s+(by|under)|subject\s+to|construed\s+in\s+accordance\s+with)\s+(the\s+)?(laws?|jurisdiction)\s+(of|in)\b|\b(jurisdiction|venue)\s+clause\b",
                    ),
                    confidence: 0.75,
                },
            ]
        })
        .as_slice()
}
