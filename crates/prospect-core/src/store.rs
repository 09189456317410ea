//! Storage seams: the Player Record Store and the Currency Ledger.
//!
//! Every engine operation runs inside one [`StoreSession`] for one player.
//! A session reads the player's record, inventory and wallet, stages
//! writes, and makes them visible only on [`StoreSession::commit`].
//! Dropping a session without committing discards everything it staged.
//! While a session is open, other sessions for the same player wait, so
//! concurrent operations on one player are serialized by the store.
//!
//! Two implementations exist: [`MemoryStore`](crate::memory::MemoryStore)
//! for tests and embedding, and the `PostgreSQL` store in `prospect-db`.

use std::future::Future;

use prospect_types::{Inventory, LedgerEntryType, PlayerId, PlayerProgress};

use crate::inventory::InventoryDelta;

/// Failures reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded or would become invalid.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Result of attempting to debit a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The amount was taken.
    Debited {
        /// Balance after the debit.
        balance_after: u64,
    },
    /// The wallet holds less than the amount. Nothing was taken.
    InsufficientFunds {
        /// The current balance.
        balance: u64,
    },
}

/// The session player's wallet.
///
/// Every movement is recorded as an append-only ledger entry tagged with
/// `entry_type` and a free-form `reference` naming what was bought or sold.
pub trait CurrencyLedger: Send {
    /// Current balance.
    fn balance(&mut self) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Add `amount`, returning the new balance.
    fn credit(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Take `amount` if the balance covers it.
    fn debit(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> impl Future<Output = Result<DebitOutcome, StoreError>> + Send;
}

/// One atomic unit of work against a single player's records.
pub trait StoreSession: CurrencyLedger + Sized {
    /// The player's progress record, if registered.
    fn read_progress(
        &mut self,
    ) -> impl Future<Output = Result<Option<PlayerProgress>, StoreError>> + Send;

    /// Insert or replace the player's progress record.
    fn write_progress(
        &mut self,
        progress: &PlayerProgress,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The player's inventory.
    fn read_inventory(&mut self) -> impl Future<Output = Result<Inventory, StoreError>> + Send;

    /// Apply signed per-kind changes. Lines reaching zero are deleted.
    fn write_inventory_delta(
        &mut self,
        delta: &InventoryDelta,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Make every staged write visible and release the player.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Opens per-player sessions.
pub trait PlayerRecordStore: Send + Sync {
    /// Session type handed out by [`begin`](Self::begin).
    type Session: StoreSession;

    /// Open a session for `player`, waiting for any other session on the
    /// same player to finish.
    fn begin(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<Self::Session, StoreError>> + Send;
}
