// ContractIntel Data Models
// Value objects passed between pipeline stages; persistence mapping lives
// behind the store traits in services::pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============ Extraction ============

/// Text extracted from a single PDF page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageText {
    /// 1-based page number as reported by the document's page tree.
    pub page_number: u32,
    pub text: String,
}

/// Full extraction result: normalized full text plus the per-page breakdown.
///
/// `full_text` is the newline-joined concatenation of the page texts; pages
/// are ordered by page number ascending. Page numbers start at 1 in the
/// common case but contiguity is not guaranteed for malformed documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    pub full_text: String,
    pub pages: Vec<PageText>,
}

impl ExtractedDocument {
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}

// ============ Clause Detection ============

/// A clause found by the detector. Transient: created fresh on every
/// detection run and superseded, not merged, by the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedClause {
    /// Key from the fixed pattern catalog (e.g. "termination").
    pub clause_type: String,
    /// Bounded text window around the match, used for display and
    /// best-effort page attribution.
    pub excerpt: String,
    /// Static per-pattern plausibility in [0,1], not a per-match probability.
    pub confidence: f64,
    pub page_number: Option<u32>,
}

// ============ Persisted Shapes ============

/// Persisted clause row. The core mints these during a pipeline run; the
/// approval fields are set only by the API layer and never read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseRecord {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub document_id: Option<Uuid>,
    pub clause_type: String,
    pub excerpt: String,
    pub confidence: Option<f64>,
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub extracted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

/// An uploaded document belonging to a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDocument {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub file_name: String,
    /// Path relative to the file storage root.
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A contract with its documents and currently stored clauses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub title: String,
    pub vendor: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub risk_score: Option<f64>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub documents: Vec<ContractDocument>,
    #[serde(default)]
    pub clauses: Vec<ClauseRecord>,
}

// ============ Pipeline Output ============

/// Summary returned to the caller after a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub contract_id: Uuid,
    pub document_id: Uuid,
    pub page_count: usize,
    pub total_clauses: usize,
    pub clauses_by_type: HashMap<String, usize>,
    pub risk_score: f64,
}

// ============ Risk Scoring Options ============

/// Configuration for the risk scorer. Defaults match the canonical catalog;
/// overridable via the config file (see services::config_store).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoringOptions {
    /// Penalty points per missing required clause.
    #[serde(default = "default_missing_weight")]
    pub missing_required_clause_weight: f64,
    /// Extra penalty when auto-renewal carries a short notice period.
    #[serde(default = "default_auto_renew_weight")]
    pub auto_renew_short_notice_weight: f64,
    /// Notice periods strictly below this many days count as short.
    #[serde(default = "default_short_notice_days")]
    pub short_notice_days: u32,
    /// Clause types whose absence is penalized.
    #[serde(default = "default_required_clauses")]
    pub required_clauses: Vec<String>,
}

impl Default for RiskScoringOptions {
    fn default() -> Self {
        Self {
            missing_required_clause_weight: default_missing_weight(),
            auto_renew_short_notice_weight: default_auto_renew_weight(),
            short_notice_days: default_short_notice_days(),
            required_clauses: default_required_clauses(),
        }
    }
}

fn default_missing_weight() -> f64 { 15.0 }
fn default_auto_renew_weight() -> f64 { 25.0 }
fn default_short_notice_days() -> u32 { 30 }
fn default_required_clauses() -> Vec<String> {
    [
        "renewal",
        "termination",
        "data_protection",
        "liability_cap",
        "governing_law",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
