//! `PostgreSQL` data layer for Prospect.
//!
//! Implements the engine's [`PlayerRecordStore`](prospect_core::PlayerRecordStore)
//! and [`CurrencyLedger`](prospect_core::CurrencyLedger) over four tables:
//!
//! ```text
//! players    one progress record per player
//! inventory  (player, resource) -> quantity, zero lines deleted
//! wallets    player -> balance
//! ledger     append-only audit of every wallet movement
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration and migrations
//! - [`player_store`] -- Per-player transactional sessions ([`PgPlayerStore`])
//! - [`error`] -- Shared error types

pub mod error;
pub mod player_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::DbError;
pub use player_store::{LedgerRow, PgPlayerStore, PgSession, PlayerRow};
pub use postgres::{PostgresConfig, PostgresPool};
