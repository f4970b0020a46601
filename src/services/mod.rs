// ContractIntel Core Services
// Extraction, detection, scoring, and storage for contract documents

pub mod config_store;
pub mod detection;
pub mod pdf_extractor;
pub mod pipeline;
pub mod risk_scoring;
pub mod storage;

pub use config_store::*;
pub use pdf_extractor::{extract_from_bytes, extract_from_path, ExtractionError};
pub use pipeline::{
    ContractPipeline, ContractStore, FileStorage, PdfTextExtractor, PipelineError, TextExtraction,
};
pub use risk_scoring::calculate_risk_score;
pub use storage::{LocalFileStorage, MemoryContractStore};

// Re-export detection module functions
pub use detection::{clause_patterns, detect_clauses, ClausePattern};
