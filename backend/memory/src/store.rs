use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reframe_core::ReframeError;

use crate::types::DialogRecord;

/// Abstract interface for the insert-only dialog log.
#[async_trait]
pub trait DialogLog: Send + Sync {
    /// Append one record.
    async fn append(&self, record: DialogRecord) -> Result<(), ReframeError>;

    /// Records for one user, oldest first.
    async fn history(&self, user_id: i64) -> Result<Vec<DialogRecord>, ReframeError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64, ReframeError>;
}

/// Process-local dialog log for tests.
#[derive(Default, Clone)]
pub struct InMemoryDialogLog {
    records: Arc<RwLock<Vec<DialogRecord>>>,
}

impl InMemoryDialogLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DialogLog for InMemoryDialogLog {
    async fn append(&self, record: DialogRecord) -> Result<(), ReframeError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
        Ok(())
    }

    async fn history(&self, user_id: i64) -> Result<Vec<DialogRecord>, ReframeError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, ReframeError> {
        Ok(self.records.read().unwrap_or_else(|e| e.into_inner()).len() as u64)
    }
}
