//! Per-user point balances with an append-only history.
//!
//! Balances are charged and used through a [`PointLedger`], which validates each request,
//! replaces the balance, and appends the matching [`HistoryRecord`] under a per-user lock.
//! Storage lives behind the [`ports`], with in-memory [`adapters`] for each of them.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod ports;

pub use commands::{Error, PointLedger, PointsResponse};
pub use config::LedgerConfig;
pub use domain::{Balance, HistoryRecord, TransactionKind, UserId, POINT_LIMIT};
