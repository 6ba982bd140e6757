use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::{
    config::LedgerConfig,
    domain::{Balance, HistoryRecord, TransactionKind, UserId},
    ports::{balance::BalanceStore, history::HistoryStore},
};

pub mod charge;
pub mod get_balance;
pub mod get_history;
pub mod use_points;

pub use charge::ChargeRequest;
pub use get_balance::GetBalanceRequest;
pub use get_history::GetHistoryRequest;
pub use use_points::UseRequest;

/// Point balances and their history
///
/// Charges and uses for the same user are serialized through a per-user lock, so that reading
/// the balance, validating the request, writing the new balance and appending the history record
/// happen as one step. Operations for different users never wait on each other.
///
/// Once a charge or use holds the user lock, the rest of it runs on its own task. Dropping the
/// caller's future from then on does not stop the balance write and its history append.
///
/// Lock entries are created on first use of a user and kept for the lifetime of the ledger.
pub struct PointLedger<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
    config: LedgerConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot {kind} {amount} points: amount must be positive")]
    InvalidAmount { kind: TransactionKind, amount: i64 },
    #[error("charging {amount} points to {current} would exceed the limit of {limit}")]
    LimitExceeded { current: u64, amount: u64, limit: u64 },
    #[error("cannot use {amount} points, only {current} available")]
    InsufficientBalance { current: u64, amount: u64 },

    #[error("balance port error: {0:?}")]
    Balance(#[from] crate::ports::balance::Error),
    #[error("history port error: {0:?}")]
    History(#[from] crate::ports::history::Error),
    /// The task applying the change was cancelled by the runtime
    #[error("ledger task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Response for the `ChargeRequest` and `UseRequest` services
#[derive(Debug, PartialEq, Eq)]
pub struct PointsResponse {
    pub user_id: UserId,
    /// Previous number of points
    pub old_points: u64,
    /// New number of points
    pub new_points: u64,
    pub updated_at: DateTime<Utc>,
}

impl<B, H> PointLedger<B, H>
where
    B: BalanceStore + Send + Sync + 'static,
    H: HistoryStore + Send + Sync + 'static,
{
    pub fn new(balances: Arc<B>, history: Arc<H>) -> Self {
        Self::with_config(balances, history, LedgerConfig::default())
    }

    pub fn with_config(balances: Arc<B>, history: Arc<H>, config: LedgerConfig) -> Self {
        Self {
            balances,
            history,
            locks: Arc::default(),
            config,
        }
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, Error> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        Ok(self.balances.get(user_id).await?)
    }

    pub async fn charge(&self, user_id: UserId, amount: i64) -> Result<Balance, Error> {
        let (_, balance) = self
            .transition(user_id, TransactionKind::Charge, amount)
            .await?;
        Ok(balance)
    }

    pub async fn use_points(&self, user_id: UserId, amount: i64) -> Result<Balance, Error> {
        let (_, balance) = self
            .transition(user_id, TransactionKind::Use, amount)
            .await?;
        Ok(balance)
    }

    /// Records in append order. Does not take the user lock.
    pub async fn get_history(&self, user_id: UserId) -> Result<Vec<HistoryRecord>, Error> {
        Ok(self.history.list_by_user(user_id).await?)
    }

    /// Apply a charge or use and return the previous number of points with the new balance
    #[tracing::instrument(skip(self))]
    async fn transition(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: i64,
    ) -> Result<(u64, Balance), Error> {
        // Reject malformed amounts before touching any store
        let amount = match u64::try_from(amount) {
            Ok(amount) if amount > 0 => amount,
            _ => {
                tracing::warn!("rejected non-positive amount");
                return Err(Error::InvalidAmount { kind, amount });
            }
        };

        let guard = self.user_lock(user_id).lock_owned().await;
        let ledger = self.clone();
        let task = tokio::spawn(
            async move {
                let res = ledger.apply(user_id, kind, amount).await;
                drop(guard);
                res
            }
            .in_current_span(),
        );

        match task.await {
            Ok(res) => res,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(err.into()),
        }
    }

    /// Read, validate and commit a change for a positive amount
    ///
    /// Must be called while holding the user lock.
    async fn apply(
        &self,
        user_id: UserId,
        kind: TransactionKind,
        amount: u64,
    ) -> Result<(u64, Balance), Error> {
        let current = self.balances.get(user_id).await?;
        let points = match kind {
            TransactionKind::Charge => current
                .points
                .checked_add(amount)
                .filter(|points| *points <= self.config.point_limit)
                .ok_or(Error::LimitExceeded {
                    current: current.points,
                    amount,
                    limit: self.config.point_limit,
                }),
            TransactionKind::Use => {
                current
                    .points
                    .checked_sub(amount)
                    .ok_or(Error::InsufficientBalance {
                        current: current.points,
                        amount,
                    })
            }
        };
        let points = points.map_err(|err| {
            tracing::warn!(current = current.points, "{err}");
            err
        })?;

        let updated = self.commit(&current, kind, amount, points).await?;
        tracing::debug!(old = current.points, new = updated.points, "points updated");

        Ok((current.points, updated))
    }

    /// Write the new balance and its history record
    ///
    /// Must be called while holding the user lock. If the history append fails, the previous
    /// balance is written back before returning the error. If that write fails too, the balance
    /// port error is returned and the new balance stays without a history record.
    async fn commit(
        &self,
        previous: &Balance,
        kind: TransactionKind,
        amount: u64,
        points: u64,
    ) -> Result<Balance, Error> {
        let updated = self
            .balances
            .put(previous.user_id, points, Utc::now())
            .await?;

        if let Err(err) = self
            .history
            .append(updated.user_id, kind, amount, updated.updated_at)
            .await
        {
            tracing::warn!(error = %err, "history append failed, restoring previous balance");
            if let Err(restore_err) = self
                .balances
                .put(previous.user_id, previous.points, previous.updated_at)
                .await
            {
                tracing::error!(error = %restore_err, "could not restore previous balance");
                return Err(restore_err.into());
            }
            return Err(err.into());
        }

        Ok(updated)
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        // Clone the lock out so the map shard is released before awaiting it
        self.locks.entry(user_id).or_default().clone()
    }
}

impl<B, H> Clone for PointLedger<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: self.balances.clone(),
            history: self.history.clone(),
            locks: self.locks.clone(),
            config: self.config,
        }
    }
}
