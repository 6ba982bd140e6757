use chrono::{DateTime, Utc};

use crate::domain::{Balance, UserId};

#[mockall::automock]
#[async_trait::async_trait]
pub trait BalanceStore {
    /// Current balance of the user
    ///
    /// Users without a stored balance get the zero-value balance instead of an error.
    async fn get(&self, user_id: UserId) -> Result<Balance, Error>;

    /// Unconditionally replace the balance of the user
    async fn put(
        &self,
        user_id: UserId,
        points: u64,
        updated_at: DateTime<Utc>,
    ) -> Result<Balance, Error>;
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
