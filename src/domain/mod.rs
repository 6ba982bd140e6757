use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum number of points a single user can hold
pub const POINT_LIMIT: u64 = 10_000;

pub type UserId = Uuid;

/// Current point balance of a user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Balance {
    pub user_id: UserId,

    /// Current amount of points
    pub points: u64,

    /// Time of the last successful charge or use
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Zero-value balance for a user without any activity
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Charge,
    Use,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Charge => f.write_str("charge"),
            TransactionKind::Use => f.write_str("use"),
        }
    }
}

/// Immutable record of one successful charge or use
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Unique identifier, assigned in append order
    pub id: u64,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Magnitude of the change
    ///
    /// This is always positive, the direction is given by `kind`.
    pub amount: u64,
    /// Same timestamp as the `updated_at` of the balance written alongside this record
    pub occurred_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Difference in points applied by this record
    ///
    /// Exact for every `u64` amount.
    pub fn signed_amount(&self) -> i128 {
        match self.kind {
            TransactionKind::Charge => i128::from(self.amount),
            TransactionKind::Use => -i128::from(self.amount),
        }
    }
}

/// Replay a sequence of records from a zero balance
///
/// For the full history of a user, this is equal to their current number of points.
pub fn replay(records: &[HistoryRecord]) -> i128 {
    records.iter().map(HistoryRecord::signed_amount).sum()
}
