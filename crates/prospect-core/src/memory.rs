//! In-memory implementation of the store and ledger traits.
//!
//! Each player's records sit behind their own [`tokio::sync::Mutex`]. A
//! session holds that lock from [`begin`](PlayerRecordStore::begin) until
//! it is committed or dropped, and works on a staged copy that replaces the
//! live record only on commit.
//!
//! A session that leaves its player's record empty removes it from the map
//! when dropped, so looking up unregistered players does not grow the store.
//!
//! The store can be switched into an unavailable state to exercise storage
//! failure paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use prospect_types::{
    Inventory, LedgerEntry, LedgerEntryId, LedgerEntryType, PlayerId, PlayerProgress,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::inventory::{InventoryDelta, apply_delta};
use crate::store::{CurrencyLedger, DebitOutcome, PlayerRecordStore, StoreError, StoreSession};

/// Everything stored for one player.
#[derive(Debug, Clone, Default)]
struct PlayerRecord {
    progress: Option<PlayerProgress>,
    inventory: Inventory,
    balance: u64,
    ledger: Vec<LedgerEntry>,
}

impl PlayerRecord {
    fn is_empty(&self) -> bool {
        self.progress.is_none()
            && self.inventory.is_empty()
            && self.balance == 0
            && self.ledger.is_empty()
    }
}

type RecordMap = BTreeMap<PlayerId, Arc<Mutex<PlayerRecord>>>;

/// Process-local player store with per-player locking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<RecordMap>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with
    /// [`StoreError::Unavailable`], including those of open sessions.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Write a player's records directly, bypassing the engine.
    pub async fn seed(&self, progress: PlayerProgress, inventory: Inventory, balance: u64) {
        let record = self.record(progress.player_id).await;
        let mut guard = record.lock().await;
        guard.progress = Some(progress);
        guard.inventory = inventory;
        guard.balance = balance;
    }

    /// Committed progress, inventory and balance for `player`.
    pub async fn snapshot(&self, player: PlayerId) -> Option<(PlayerProgress, Inventory, u64)> {
        let record = self.records.lock().await.get(&player).cloned()?;
        let guard = record.lock().await;
        let progress = guard.progress.clone()?;
        Some((progress, guard.inventory.clone(), guard.balance))
    }

    /// Committed ledger entries for `player`, oldest first.
    pub async fn ledger_entries(&self, player: PlayerId) -> Vec<LedgerEntry> {
        let Some(record) = self.records.lock().await.get(&player).cloned() else {
            return Vec::new();
        };
        let guard = record.lock().await;
        guard.ledger.clone()
    }

    async fn record(&self, player: PlayerId) -> Arc<Mutex<PlayerRecord>> {
        let mut records = self.records.lock().await;
        Arc::clone(records.entry(player).or_default())
    }
}

impl PlayerRecordStore for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self, player: PlayerId) -> Result<MemorySession, StoreError> {
        check_available(&self.unavailable)?;
        let record = self.record(player).await;
        let guard = record.lock_owned().await;
        let staged = guard.clone();
        Ok(MemorySession {
            player,
            guard,
            staged,
            records: Arc::clone(&self.records),
            unavailable: Arc::clone(&self.unavailable),
        })
    }
}

/// An open session on one player of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemorySession {
    player: PlayerId,
    guard: OwnedMutexGuard<PlayerRecord>,
    staged: PlayerRecord,
    records: Arc<Mutex<RecordMap>>,
    unavailable: Arc<AtomicBool>,
}

impl MemorySession {
    fn append_ledger(&mut self, entry_type: LedgerEntryType, amount: u64, reference: &str) {
        self.staged.ledger.push(LedgerEntry {
            id: LedgerEntryId::new(),
            player_id: self.player,
            entry_type,
            amount,
            balance_after: self.staged.balance,
            reference: reference.to_owned(),
            created_at: Utc::now(),
        });
    }
}

impl CurrencyLedger for MemorySession {
    async fn balance(&mut self) -> Result<u64, StoreError> {
        check_available(&self.unavailable)?;
        Ok(self.staged.balance)
    }

    async fn credit(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<u64, StoreError> {
        check_available(&self.unavailable)?;
        self.staged.balance = self
            .staged
            .balance
            .checked_add(amount)
            .ok_or_else(|| StoreError::Corrupt(format!("balance overflow for {}", self.player)))?;
        self.append_ledger(entry_type, amount, reference);
        Ok(self.staged.balance)
    }

    async fn debit(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<DebitOutcome, StoreError> {
        check_available(&self.unavailable)?;
        let Some(balance_after) = self.staged.balance.checked_sub(amount) else {
            return Ok(DebitOutcome::InsufficientFunds {
                balance: self.staged.balance,
            });
        };
        self.staged.balance = balance_after;
        self.append_ledger(entry_type, amount, reference);
        Ok(DebitOutcome::Debited { balance_after })
    }
}

impl StoreSession for MemorySession {
    async fn read_progress(&mut self) -> Result<Option<PlayerProgress>, StoreError> {
        check_available(&self.unavailable)?;
        Ok(self.staged.progress.clone())
    }

    async fn write_progress(&mut self, progress: &PlayerProgress) -> Result<(), StoreError> {
        check_available(&self.unavailable)?;
        if progress.player_id != self.player {
            return Err(StoreError::Corrupt(format!(
                "session for {} cannot write record of {}",
                self.player, progress.player_id
            )));
        }
        self.staged.progress = Some(progress.clone());
        Ok(())
    }

    async fn read_inventory(&mut self) -> Result<Inventory, StoreError> {
        check_available(&self.unavailable)?;
        Ok(self.staged.inventory.clone())
    }

    async fn write_inventory_delta(&mut self, delta: &InventoryDelta) -> Result<(), StoreError> {
        check_available(&self.unavailable)?;
        apply_delta(&mut self.staged.inventory, delta).ok_or_else(|| {
            StoreError::Corrupt(format!("inventory delta out of range for {}", self.player))
        })
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        check_available(&self.unavailable)?;
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if !self.guard.is_empty() {
            return;
        }
        // Skipped under contention; the next session on this player retries.
        let Ok(mut records) = self.records.try_lock() else {
            return;
        };
        // The map and this guard are the only holders unless another
        // session is already queued on the record.
        let record = OwnedMutexGuard::mutex(&self.guard);
        if Arc::strong_count(record) == 2
            && records
                .get(&self.player)
                .is_some_and(|live| Arc::ptr_eq(live, record))
        {
            records.remove(&self.player);
        }
    }
}

fn check_available(flag: &AtomicBool) -> Result<(), StoreError> {
    if flag.load(Ordering::SeqCst) {
        Err(StoreError::Unavailable(String::from(
            "in-memory store switched off",
        )))
    } else {
        Ok(())
    }
}
