//! `PostgreSQL` implementation of the player store and currency ledger.
//!
//! A [`PgSession`] is one database transaction. Opening it takes a
//! transaction-scoped advisory lock keyed by the player id, so sessions for
//! the same player queue up behind each other while different players
//! proceed in parallel. Committing releases the lock; dropping the session
//! rolls the transaction back.

use chrono::{DateTime, Utc};
use prospect_core::store::{
    CurrencyLedger, DebitOutcome, PlayerRecordStore, StoreError, StoreSession,
};
use prospect_core::InventoryDelta;
use prospect_types::{
    Gear, Inventory, LedgerEntryId, LedgerEntryType, PlayerId, PlayerProgress, ResourceKind,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DbError;

/// Player store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgPlayerStore {
    pool: PgPool,
}

impl PgPlayerStore {
    /// Create a store over an existing pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Audit ledger rows for `player`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn ledger_entries(&self, player: PlayerId) -> Result<Vec<LedgerRow>, DbError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r"SELECT id, player_id, entry_type::TEXT AS entry_type, amount, balance_after, reference, created_at
              FROM ledger
              WHERE player_id = $1
              ORDER BY created_at, id",
        )
        .bind(player_key(player))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn open(&self, player: PlayerId) -> Result<PgSession, DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(player_key(player))
            .execute(&mut *tx)
            .await?;
        tracing::trace!(player = %player, "Player session opened");
        Ok(PgSession { player, tx })
    }
}

impl PlayerRecordStore for PgPlayerStore {
    type Session = PgSession;

    async fn begin(&self, player: PlayerId) -> Result<PgSession, StoreError> {
        Ok(self.open(player).await?)
    }
}

/// An open transaction holding one player's advisory lock.
pub struct PgSession {
    player: PlayerId,
    tx: Transaction<'static, Postgres>,
}

impl PgSession {
    const fn key(&self) -> i64 {
        player_key(self.player)
    }

    async fn fetch_progress(&mut self) -> Result<Option<PlayerProgress>, DbError> {
        let key = self.key();
        let row = sqlx::query_as::<_, PlayerRow>(
            r"SELECT player_id, level, experience, tool, container, last_collection_at, rebirth_count
              FROM players
              WHERE player_id = $1",
        )
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(PlayerRow::into_progress).transpose()
    }

    async fn upsert_progress(&mut self, progress: &PlayerProgress) -> Result<(), DbError> {
        if progress.player_id != self.player {
            return Err(DbError::Corrupt(format!(
                "session for {} cannot write record of {}",
                self.player, progress.player_id
            )));
        }
        let key = self.key();
        sqlx::query(
            r"INSERT INTO players (player_id, level, experience, tool, container, last_collection_at, rebirth_count)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT (player_id) DO UPDATE SET
                  level = EXCLUDED.level,
                  experience = EXCLUDED.experience,
                  tool = EXCLUDED.tool,
                  container = EXCLUDED.container,
                  last_collection_at = EXCLUDED.last_collection_at,
                  rebirth_count = EXCLUDED.rebirth_count,
                  updated_at = now()",
        )
        .bind(key)
        .bind(to_column::<i32, _>(progress.level, "level")?)
        .bind(to_column::<i64, _>(progress.experience, "experience")?)
        .bind(progress.tool.name())
        .bind(progress.container.name())
        .bind(progress.last_collection_at)
        .bind(to_column::<i32, _>(progress.rebirth_count, "rebirth_count")?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn fetch_inventory(&mut self) -> Result<Inventory, DbError> {
        let key = self.key();
        let rows: Vec<(String, i32)> =
            sqlx::query_as("SELECT resource, quantity FROM inventory WHERE player_id = $1")
                .bind(key)
                .fetch_all(&mut *self.tx)
                .await?;

        let mut inventory = Inventory::new();
        for (name, quantity) in rows {
            let resource = ResourceKind::from_name(&name)
                .ok_or_else(|| DbError::Corrupt(format!("unknown resource {name:?}")))?;
            let quantity = from_column::<u32, _>(quantity, "inventory.quantity")?;
            if quantity > 0 {
                inventory.insert(resource, quantity);
            }
        }
        Ok(inventory)
    }

    async fn apply_inventory_delta(&mut self, delta: &InventoryDelta) -> Result<(), DbError> {
        let key = self.key();
        for (resource, change) in delta {
            if *change == 0 {
                continue;
            }
            let change = to_column::<i32, _>(*change, "inventory delta")?;
            // The quantity CHECK applies to the proposed insert row before
            // ON CONFLICT runs, so removals never go through the upsert.
            let remaining: Option<i32> = sqlx::query_scalar(inventory_change_sql(change))
                .bind(key)
                .bind(resource.name())
                .bind(change)
                .fetch_optional(&mut *self.tx)
                .await?;
            let remaining = remaining.ok_or_else(|| {
                DbError::Corrupt(format!("cannot remove {} {resource}", change.unsigned_abs()))
            })?;

            if remaining == 0 {
                sqlx::query("DELETE FROM inventory WHERE player_id = $1 AND resource = $2")
                    .bind(key)
                    .bind(resource.name())
                    .execute(&mut *self.tx)
                    .await?;
            }
        }
        Ok(())
    }

    async fn fetch_balance(&mut self) -> Result<u64, DbError> {
        let key = self.key();
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE player_id = $1 FOR UPDATE")
                .bind(key)
                .fetch_optional(&mut *self.tx)
                .await?;
        from_column(balance.unwrap_or(0), "wallets.balance")
    }

    async fn store_balance(
        &mut self,
        balance: u64,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<(), DbError> {
        let key = self.key();
        let balance = to_column::<i64, _>(balance, "wallets.balance")?;
        sqlx::query(
            r"INSERT INTO wallets (player_id, balance) VALUES ($1, $2)
              ON CONFLICT (player_id) DO UPDATE SET balance = EXCLUDED.balance",
        )
        .bind(key)
        .bind(balance)
        .execute(&mut *self.tx)
        .await?;

        sqlx::query(
            r"INSERT INTO ledger (id, player_id, entry_type, amount, balance_after, reference, created_at)
              VALUES ($1, $2, $3::ledger_entry_type, $4, $5, $6, $7)",
        )
        .bind(LedgerEntryId::new().into_inner())
        .bind(key)
        .bind(ledger_entry_type_to_db(entry_type))
        .bind(to_column::<i64, _>(amount, "ledger.amount")?)
        .bind(balance)
        .bind(reference)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn add_funds(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<u64, DbError> {
        let balance = self
            .fetch_balance()
            .await?
            .checked_add(amount)
            .ok_or_else(|| DbError::Corrupt(format!("balance overflow for {}", self.player)))?;
        self.store_balance(balance, amount, entry_type, reference)
            .await?;
        Ok(balance)
    }

    async fn take_funds(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<DebitOutcome, DbError> {
        let balance = self.fetch_balance().await?;
        let Some(balance_after) = balance.checked_sub(amount) else {
            return Ok(DebitOutcome::InsufficientFunds { balance });
        };
        self.store_balance(balance_after, amount, entry_type, reference)
            .await?;
        Ok(DebitOutcome::Debited { balance_after })
    }
}

impl CurrencyLedger for PgSession {
    async fn balance(&mut self) -> Result<u64, StoreError> {
        Ok(self.fetch_balance().await?)
    }

    async fn credit(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<u64, StoreError> {
        Ok(self.add_funds(amount, entry_type, reference).await?)
    }

    async fn debit(
        &mut self,
        amount: u64,
        entry_type: LedgerEntryType,
        reference: &str,
    ) -> Result<DebitOutcome, StoreError> {
        Ok(self.take_funds(amount, entry_type, reference).await?)
    }
}

impl StoreSession for PgSession {
    async fn read_progress(&mut self) -> Result<Option<PlayerProgress>, StoreError> {
        Ok(self.fetch_progress().await?)
    }

    async fn write_progress(&mut self, progress: &PlayerProgress) -> Result<(), StoreError> {
        Ok(self.upsert_progress(progress).await?)
    }

    async fn read_inventory(&mut self) -> Result<Inventory, StoreError> {
        Ok(self.fetch_inventory().await?)
    }

    async fn write_inventory_delta(&mut self, delta: &InventoryDelta) -> Result<(), StoreError> {
        Ok(self.apply_inventory_delta(delta).await?)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let player = self.player;
        self.tx.commit().await.map_err(DbError::from)?;
        tracing::trace!(player = %player, "Player session committed");
        Ok(())
    }
}

/// A row from the `players` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    /// Player id, bit-for-bit.
    pub player_id: i64,
    /// Current level.
    pub level: i32,
    /// Experience toward the next level.
    pub experience: i64,
    /// Equipped tool name.
    pub tool: String,
    /// Equipped container name.
    pub container: String,
    /// Last collection time.
    pub last_collection_at: DateTime<Utc>,
    /// Completed rebirths.
    pub rebirth_count: i32,
}

impl PlayerRow {
    /// Decode into a [`PlayerProgress`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Corrupt`] if a gear name is unknown or a number
    /// is out of range.
    pub fn into_progress(self) -> Result<PlayerProgress, DbError> {
        Ok(PlayerProgress {
            player_id: player_from_key(self.player_id),
            level: from_column(self.level, "players.level")?,
            experience: from_column(self.experience, "players.experience")?,
            tool: gear_from_db(&self.tool)?,
            container: gear_from_db(&self.container)?,
            last_collection_at: self.last_collection_at,
            rebirth_count: from_column(self.rebirth_count, "players.rebirth_count")?,
        })
    }
}

/// A row from the `ledger` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    /// Ledger entry UUID.
    pub id: Uuid,
    /// Wallet owner, bit-for-bit.
    pub player_id: i64,
    /// Entry type as a string (cast from the `PostgreSQL` enum).
    pub entry_type: String,
    /// Amount moved.
    pub amount: i64,
    /// Balance after the movement.
    pub balance_after: i64,
    /// What was bought or sold.
    pub reference: String,
    /// Real-world timestamp.
    pub created_at: DateTime<Utc>,
}

/// Convert a [`LedgerEntryType`] to its `PostgreSQL` enum string.
const fn ledger_entry_type_to_db(entry_type: LedgerEntryType) -> &'static str {
    match entry_type {
        LedgerEntryType::Purchase => "purchase",
        LedgerEntryType::Sale => "sale",
    }
}

fn gear_from_db(name: &str) -> Result<Gear, DbError> {
    Gear::from_name(name).ok_or_else(|| DbError::Corrupt(format!("unknown gear {name:?}")))
}

/// The `BIGINT` key for a player: the id's bits reinterpreted as signed.
const fn player_key(player: PlayerId) -> i64 {
    i64::from_ne_bytes(player.into_inner().to_ne_bytes())
}

const fn player_from_key(key: i64) -> PlayerId {
    PlayerId(u64::from_ne_bytes(key.to_ne_bytes()))
}

/// Statement applying one non-zero inventory change.
///
/// Additions upsert. Removals update in place and return no row when the
/// line is missing or holds fewer units than removed.
const fn inventory_change_sql(change: i32) -> &'static str {
    if change > 0 {
        r"INSERT INTO inventory (player_id, resource, quantity)
          VALUES ($1, $2, $3)
          ON CONFLICT (player_id, resource)
          DO UPDATE SET quantity = inventory.quantity + EXCLUDED.quantity
          RETURNING quantity"
    } else {
        r"UPDATE inventory SET quantity = quantity + $3
          WHERE player_id = $1 AND resource = $2 AND quantity + $3 >= 0
          RETURNING quantity"
    }
}

fn to_column<T, V>(value: V, column: &str) -> Result<T, DbError>
where
    T: TryFrom<V>,
    V: Copy + core::fmt::Display,
{
    T::try_from(value)
        .ok()
        .ok_or_else(|| DbError::Corrupt(format!("{column} value {value} out of range")))
}

fn from_column<T, V>(value: V, column: &str) -> Result<T, DbError>
where
    T: TryFrom<V>,
    V: Copy + core::fmt::Display,
{
    T::try_from(value)
        .ok()
        .ok_or_else(|| DbError::Corrupt(format!("{column} holds invalid {value}")))
}
