use crate::{
    adapters::ErasedPoisonError,
    domain::{HistoryRecord, TransactionKind, UserId},
    ports::history::{Error, HistoryStore},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Debug, Default)]
struct HistoryTable {
    /// Identifier of the last appended record
    last_id: u64,
    records: HashMap<UserId, Vec<HistoryRecord>>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryHistoryStore {
    table: Arc<Mutex<HistoryTable>>,
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: u64,
        occurred_at: DateTime<Utc>,
    ) -> Result<HistoryRecord, Error> {
        let mut table = self.table.lock()?;
        table.last_id += 1;

        let record = HistoryRecord {
            id: table.last_id,
            user_id,
            kind,
            amount,
            occurred_at,
        };
        table
            .records
            .entry(user_id)
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryRecord>, Error> {
        let records = self
            .table
            .lock()?
            .records
            .get(&user_id)
            .cloned()
            .unwrap_or_default();

        Ok(records)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError::from(err)))
    }
}
