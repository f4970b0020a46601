// Storage Backends
// LocalFileStorage keeps uploaded documents under a per-contract folder on
// disk; MemoryContractStore holds contract rows behind a single mutex so
// clause replacement is atomic per store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{ClauseRecord, Contract};
use crate::services::pipeline::{ContractStore, FileStorage};

/// Document file storage rooted at a local directory.
///
/// Files are stored as `<root>/<contract_id>/<file_name>`; the pipeline only
/// ever sees the relative part.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn full_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Store `bytes` under the contract's folder and return the relative
    /// path to record on the document row.
    pub async fn save_file(
        &self,
        contract_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let relative = Path::new(&contract_id.to_string()).join(file_name);
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;

        info!(path = %full.display(), size = bytes.len(), "saved document file");
        Ok(relative.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn file_exists(&self, relative_path: &str) -> bool {
        self.full_path(relative_path).exists()
    }

    async fn open_file(&self, relative_path: &str) -> anyhow::Result<Vec<u8>> {
        let full = self.full_path(relative_path);
        debug!(path = %full.display(), "opening document file");
        Ok(tokio::fs::read(full).await?)
    }
}

/// In-memory contract store.
///
/// All rows live behind one mutex; `replace_clauses` performs the delete and
/// insert under a single lock acquisition, so concurrent runs serialize and
/// readers never observe a half-replaced clause set.
#[derive(Default)]
pub struct MemoryContractStore {
    contracts: Mutex<HashMap<Uuid, Contract>>,
}

impl MemoryContractStore {
    pub fn insert_contract(&self, contract: Contract) {
        let mut contracts = self.contracts.lock().expect("contract store poisoned");
        contracts.insert(contract.id, contract);
    }

    pub fn get_contract(&self, id: Uuid) -> Option<Contract> {
        let contracts = self.contracts.lock().expect("contract store poisoned");
        contracts.get(&id).cloned()
    }
}

#[async_trait]
impl ContractStore for MemoryContractStore {
    async fn get_contract_with_details(&self, id: Uuid) -> anyhow::Result<Option<Contract>> {
        Ok(self.get_contract(id))
    }

    async fn replace_clauses(
        &self,
        contract_id: Uuid,
        clauses: Vec<ClauseRecord>,
        risk_score: f64,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut contracts = self.contracts.lock().expect("contract store poisoned");
        let contract = contracts
            .get_mut(&contract_id)
            .ok_or_else(|| anyhow::anyhow!("contract {contract_id} not found"))?;

        let removed = contract.clauses.len();
        contract.clauses = clauses;
        contract.risk_score = Some(risk_score);
        contract.updated_at = updated_at;

        info!(
            %contract_id,
            removed,
            inserted = contract.clauses.len(),
            risk_score,
            "replaced clause set"
        );
        Ok(())
    }
}
