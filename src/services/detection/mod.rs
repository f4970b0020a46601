// Detection Module
// Rule-based clause detection over extracted contract text:
// - clause_catalog: fixed table of (pattern, clause type, confidence)
// - clause_detector: matching, excerpt windowing, page attribution

pub mod clause_catalog;
pub mod clause_detector;

pub use clause_catalog::{clause_patterns, ClausePattern};
pub use clause_detector::detect_clauses;
