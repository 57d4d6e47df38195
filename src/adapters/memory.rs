use crate::core::{DocumentStore, ProfileChanges, Result, UserRecord};
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::RwLock;

/// In-process document store. Iteration follows insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Loads a JSON array of user documents.
    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read(path.as_ref()).await?;
        let records: Vec<UserRecord> = serde_json::from_slice(&content)?;
        tracing::debug!(
            "Loaded {} records from {}",
            records.len(),
            path.as_ref().display()
        );
        Ok(Self::with_records(records))
    }

    pub async fn save_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let records = self.records.read().await;
        let content = serde_json::to_vec_pretty(&*records)?;
        if let Some(parent) = path.as_ref().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.user_id() == id).cloned())
    }

    async fn set(&self, id: &str, changes: &ProfileChanges) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.user_id() == id)
            .ok_or_else(|| DirectoryError::retrieval(format!("no document for {}", id)))?;
        changes.apply_to(record);
        Ok(())
    }

    async fn query(&self, field: &str, value: &str) -> Result<Vec<UserRecord>> {
        let records = self.records.read().await;
        let mut matches = Vec::new();
        for record in records.iter() {
            let document = serde_json::to_value(record)?;
            if document.get(field).and_then(|v| v.as_str()) == Some(value) {
                matches.push(record.clone());
            }
        }
        Ok(matches)
    }

    async fn put(&self, record: &UserRecord) -> Result<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.user_id() == record.user_id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        Ok(self.records.read().await.clone())
    }
}
