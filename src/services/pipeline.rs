// Contract Extraction Pipeline
// Orchestrates extraction -> detection -> scoring -> clause replacement for
// one contract. The store's replace step is the single atomic boundary:
// either the new clause set, risk score, and timestamp all land, or none do.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{
    ClauseRecord, Contract, DetectedClause, ExtractedDocument, ExtractionSummary,
    RiskScoringOptions,
};
use crate::services::detection::detect_clauses;
use crate::services::pdf_extractor::{self, ExtractionError};
use crate::services::risk_scoring::calculate_risk_score;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("contract {0} not found")]
    ContractNotFound(Uuid),
    #[error("no documents found for contract {0}")]
    NoDocument(Uuid),
    #[error("file not found: {0}")]
    FileMissing(String),
    #[error("no text extracted from document {0}; file may be empty, corrupted, or an image-based PDF")]
    EmptyExtraction(String),
    #[error("failed to extract text from document: {0}")]
    Extraction(#[source] ExtractionError),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("pipeline run cancelled")]
    Cancelled,
}

/// Read access to stored document files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn file_exists(&self, relative_path: &str) -> bool;
    async fn open_file(&self, relative_path: &str) -> anyhow::Result<Vec<u8>>;
}

/// Contract persistence as seen by the pipeline.
///
/// `replace_clauses` must be atomic per contract: all previously stored
/// clauses are removed and the new set, risk score, and updated timestamp
/// committed together, serialized against concurrent runs for the same
/// contract. Concurrent readers must never observe a partial replacement.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn get_contract_with_details(&self, id: Uuid) -> anyhow::Result<Option<Contract>>;
    async fn replace_clauses(
        &self,
        contract_id: Uuid,
        clauses: Vec<ClauseRecord>,
        risk_score: f64,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}

/// Text extraction as seen by the pipeline.
#[async_trait]
pub trait TextExtraction: Send + Sync {
    async fn extract(
        &self,
        bytes: Vec<u8>,
        cancel: CancellationToken,
    ) -> Result<ExtractedDocument, ExtractionError>;
}

/// Production extractor: lopdf-based parsing on the blocking pool.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtraction for PdfTextExtractor {
    async fn extract(
        &self,
        bytes: Vec<u8>,
        cancel: CancellationToken,
    ) -> Result<ExtractedDocument, ExtractionError> {
        tokio::task::spawn_blocking(move || pdf_extractor::extract_from_bytes(&bytes, &cancel))
            .await
            .map_err(|e| ExtractionError::Failed(Box::new(e)))?
    }
}

pub struct ContractPipeline {
    store: Arc<dyn ContractStore>,
    files: Arc<dyn FileStorage>,
    extractor: Arc<dyn TextExtraction>,
    options: RiskScoringOptions,
}

impl ContractPipeline {
    pub fn new(
        store: Arc<dyn ContractStore>,
        files: Arc<dyn FileStorage>,
        extractor: Arc<dyn TextExtraction>,
        options: RiskScoringOptions,
    ) -> Self {
        Self {
            store,
            files,
            extractor,
            options,
        }
    }

    /// Process the latest document of a contract: extract text, detect
    /// clauses, recompute the risk score, and atomically replace the stored
    /// clause set. Cancellation at any point leaves persisted state
    /// unchanged.
    pub async fn process_contract(
        &self,
        contract_id: Uuid,
        cancel: CancellationToken,
    ) -> Result<ExtractionSummary, PipelineError> {
        info!(%contract_id, "starting extraction pipeline");

        let contract = self
            .store
            .get_contract_with_details(contract_id)
            .await?
            .ok_or(PipelineError::ContractNotFound(contract_id))?;

        let document = contract
            .documents
            .iter()
            .max_by_key(|d| d.uploaded_at)
            .ok_or(PipelineError::NoDocument(contract_id))?
            .clone();

        info!(
            document_id = %document.id,
            file_name = %document.file_name,
            %contract_id,
            "processing document"
        );

        if !self.files.file_exists(&document.file_path).await {
            return Err(PipelineError::FileMissing(document.file_path.clone()));
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let bytes = self.files.open_file(&document.file_path).await?;

        let extracted = match self.extractor.extract(bytes, cancel.clone()).await {
            Ok(doc) => doc,
            Err(ExtractionError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(e) => {
                error!(file_path = %document.file_path, error = %e, "text extraction failed");
                return Err(PipelineError::Extraction(e));
            }
        };

        if extracted.is_empty() {
            return Err(PipelineError::EmptyExtraction(document.file_name.clone()));
        }

        info!(
            chars = extracted.full_text.len(),
            pages = extracted.pages.len(),
            "extracted text"
        );

        let detected = detect_clauses(&extracted.full_text, Some(&extracted.pages));
        info!(clause_count = detected.len(), "detected clauses");

        let risk_score = calculate_risk_score(&detected, &self.options);
        let now = Utc::now();
        let records = mint_clause_records(&detected, contract_id, document.id, now);

        let mut clauses_by_type: HashMap<String, usize> = HashMap::new();
        for record in &records {
            *clauses_by_type.entry(record.clause_type.clone()).or_insert(0) += 1;
        }
        let total_clauses = records.len();

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.store
            .replace_clauses(contract_id, records, risk_score, now)
            .await?;

        info!(
            risk_score,
            %contract_id,
            "extraction pipeline completed"
        );

        Ok(ExtractionSummary {
            contract_id,
            document_id: document.id,
            page_count: extracted.pages.len(),
            total_clauses,
            clauses_by_type,
            risk_score,
        })
    }
}

/// Turn transient detection results into persisted clause rows sharing one
/// extraction timestamp.
fn mint_clause_records(
    detected: &[DetectedClause],
    contract_id: Uuid,
    document_id: Uuid,
    extracted_at: DateTime<Utc>,
) -> Vec<ClauseRecord> {
    detected
        .iter()
        .map(|dc| ClauseRecord {
            id: Uuid::new_v4(),
            contract_id,
            document_id: Some(document_id),
            clause_type: dc.clause_type.clone(),
            excerpt: dc.excerpt.clone(),
            confidence: Some(dc.confidence),
            page_number: dc.page_number,
            analysis: None,
            extracted_at,
            approved_by: None,
            approved_at: None,
        })
        .collect()
}
