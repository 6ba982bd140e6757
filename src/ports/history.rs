use chrono::{DateTime, Utc};

use crate::domain::{HistoryRecord, TransactionKind, UserId};

#[mockall::automock]
#[async_trait::async_trait]
pub trait HistoryStore {
    /// Append a record for the user and assign it a fresh identifier
    async fn append(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: u64,
        occurred_at: DateTime<Utc>,
    ) -> Result<HistoryRecord, Error>;

    /// All records of the user, in the order they were appended
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<HistoryRecord>, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
