use contract_intel::models::{Contract, ContractDocument};
use contract_intel::services::{
    AppConfig, ConfigStore, ContractPipeline, LocalFileStorage, MemoryContractStore,
    PdfTextExtractor,
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    contract_intel::init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin analyze_contract -- <contract.pdf> [--title <title>] [--vendor <name>] [--out <json_path>]"
        );
        return Ok(());
    }

    let path = args[1].clone();
    let title = parse_arg_value(&args, "--title").unwrap_or_else(|| "Untitled Contract".to_string());
    let vendor = parse_arg_value(&args, "--vendor").unwrap_or_else(|| "Unknown".to_string());
    let out_path = parse_arg_value(&args, "--out");

    let file_name = Path::new(&path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "contract.pdf".to_string());
    let bytes = std::fs::read(&path)?;

    let config = match ConfigStore::default_config_dir() {
        Some(dir) => ConfigStore::new(dir)
            .load()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => AppConfig::default(),
    };

    let store = Arc::new(MemoryContractStore::default());
    let storage_root = config.resolve_storage_root();
    let files = Arc::new(LocalFileStorage::new(&storage_root)?);

    let contract_id = Uuid::new_v4();
    let now = Utc::now();
    let relative_path = files.save_file(contract_id, &file_name, &bytes).await?;

    store.insert_contract(Contract {
        id: contract_id,
        title: title.clone(),
        vendor: vendor.clone(),
        start_date: now,
        end_date: now,
        renewal_date: None,
        risk_score: None,
        status: Some("active".to_string()),
        created_at: now,
        updated_at: now,
        documents: vec![ContractDocument {
            id: Uuid::new_v4(),
            contract_id,
            file_name: file_name.clone(),
            file_path: relative_path,
            file_size: bytes.len() as u64,
            mime_type: Some("application/pdf".to_string()),
            uploaded_at: now,
        }],
        clauses: Vec::new(),
    });

    let pipeline = ContractPipeline::new(
        Arc::clone(&store) as Arc<dyn contract_intel::services::ContractStore>,
        files,
        Arc::new(PdfTextExtractor),
        config.risk_scoring.clone(),
    );

    let summary = pipeline
        .process_contract(contract_id, CancellationToken::new())
        .await?;

    println!("File: {}", path);
    println!("Title: {}  Vendor: {}", title, vendor);
    println!("Pages: {}", summary.page_count);
    println!("Risk score: {:.1}", summary.risk_score);
    println!("Clauses: {}", summary.total_clauses);

    let contract = store
        .get_contract(contract_id)
        .ok_or_else(|| anyhow::anyhow!("contract disappeared from store"))?;

    for clause in &contract.clauses {
        println!(
            "[{}] page={} confidence={:.2}  {}",
            clause.clause_type,
            clause
                .page_number
                .map(|p| p.to_string())
                .unwrap_or_else(|| "?".to_string()),
            clause.confidence.unwrap_or(0.0),
            preview(&clause.excerpt, 120)
        );
    }

    if let Some(out_path) = out_path {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output {
            file: String,
            title: String,
            vendor: String,
            summary: contract_intel::models::ExtractionSummary,
            clauses: Vec<contract_intel::models::ClauseRecord>,
        }

        let out = Output {
            file: path.clone(),
            title,
            vendor,
            summary,
            clauses: contract.clauses.clone(),
        };

        let json = serde_json::to_string_pretty(&out)?;
        std::fs::write(&out_path, json)?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
