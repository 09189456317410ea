//! The progression engine: the Command Interface over a player store.
//!
//! Every operation opens one store session for the player, reads what it
//! needs, computes the new state with the pure modules of this crate and
//! commits once. Any error returned before the commit drops the session,
//! so nothing is persisted.

use chrono::{DateTime, Utc};
use prospect_types::{
    CollectionReport, Gear, LedgerEntryType, PlayerId, PlayerProgress, PlayerStatus,
    PurchaseReceipt, RebirthOutcome, RebirthPreview, ResourceKind, SaleReceipt,
};
use rand::Rng;

use crate::accumulation::{accumulate, seconds_until_ready};
use crate::config::ProgressionConfig;
use crate::drop_table::DropTable;
use crate::equipment::EquipmentCatalog;
use crate::error::{ProgressionError, Requirement};
use crate::inventory::{InventoryDelta, delta_for_admitted, quantity, total_units};
use crate::leveling::{award, experience_required};
use crate::rebirth;
use crate::resolver::{WeightedResolver, unit_experience};
use crate::store::{CurrencyLedger, DebitOutcome, PlayerRecordStore, StoreSession};
use crate::writer::{DrawBatch, admit, available_space};

/// How much of a resource to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellAmount {
    /// Everything held of the kind.
    All,
    /// An exact number of units.
    Exactly(u32),
}

/// Idle progression over a [`PlayerRecordStore`].
#[derive(Debug)]
pub struct ProgressionEngine<S> {
    store: S,
    config: ProgressionConfig,
    drops: DropTable,
    catalog: EquipmentCatalog,
}

impl<S: PlayerRecordStore> ProgressionEngine<S> {
    /// Create an engine with the standard drop table and shop.
    pub fn new(store: S, config: ProgressionConfig) -> Self {
        Self::with_catalogs(store, config, DropTable::standard(), EquipmentCatalog::standard())
    }

    /// Create an engine with explicit catalogs.
    pub const fn with_catalogs(
        store: S,
        config: ProgressionConfig,
        drops: DropTable,
        catalog: EquipmentCatalog,
    ) -> Self {
        Self {
            store,
            config,
            drops,
            catalog,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The active tuning.
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Create the progress record for a new player.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::AlreadyRegistered`] if a record exists,
    /// or [`ProgressionError::Store`] if the store fails.
    pub async fn register(
        &self,
        player: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerProgress, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        if session.read_progress().await?.is_some() {
            tracing::warn!(player = %player, "Registration rejected: already registered");
            return Err(ProgressionError::AlreadyRegistered(player));
        }

        let progress = PlayerProgress::new(player, now);
        session.write_progress(&progress).await?;
        session.commit().await?;

        tracing::info!(player = %player, "Player registered");
        Ok(progress)
    }

    /// Collect everything accumulated since the last collection.
    ///
    /// Rolls one draw per unit of accumulated time, admits what fits in the
    /// container, awards experience for the admitted share and advances the
    /// collection clock to `now` (never backward).
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NotRegistered`] without a record,
    /// [`ProgressionError::InventoryFull`] when the container has no free
    /// space, or [`ProgressionError::Store`] if the store fails. Nothing is
    /// persisted on error.
    pub async fn collect<R: Rng>(
        &self,
        player: PlayerId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<CollectionReport, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        let mut progress = read_registered(&mut session, player).await?;
        let inventory = session.read_inventory().await?;

        let capacity = self.catalog.capacity(progress.container)?;
        let space = match available_space(&inventory, capacity) {
            Ok(space) => space,
            Err(err) => {
                tracing::warn!(player = %player, error = %err, "Collection rejected");
                return Err(err);
            }
        };

        let bonuses = rebirth::bonuses(&progress, &self.config.rebirth)?;
        let tool = self.catalog.tool_bonus(progress.tool)?;
        let speed_pct = bonuses
            .speed_pct
            .checked_add(tool.speed_pct)
            .ok_or_else(|| ProgressionError::overflow("speed bonus"))?;

        let accumulation = accumulate(
            progress.level,
            speed_pct,
            progress.last_collection_at,
            now,
            &self.config,
        )?;

        let resolver = WeightedResolver::new(&self.drops, progress.level, tool.luck_pct)?;
        let mut batch = DrawBatch::new();
        for _ in 0..accumulation.draw_count {
            let entry = resolver.resolve(rng);
            let experience = unit_experience(
                entry,
                progress.level,
                accumulation.penalty,
                &self.config.leveling,
            )?;
            batch.record(entry.resource, experience)?;
        }

        let admission = admit(&batch, space)?;
        let previous_level = progress.level;
        let leveled = award(
            progress.level,
            progress.experience,
            admission.experience,
            &self.config.leveling,
        )?;

        progress.level = leveled.level;
        progress.experience = leveled.experience;
        progress.last_collection_at = progress.last_collection_at.max(now);

        session
            .write_inventory_delta(&delta_for_admitted(&admission.admitted))
            .await?;
        session.write_progress(&progress).await?;
        session.commit().await?;

        tracing::debug!(
            player = %player,
            draw_count = accumulation.draw_count,
            early = accumulation.early,
            progress_ratio = %accumulation.progress_ratio,
            admitted = admission.admitted_total(),
            lost_count = admission.lost_count,
            experience = admission.experience,
            "Collection resolved"
        );
        if leveled.leveled_up() {
            tracing::info!(
                player = %player,
                from = previous_level,
                to = leveled.level,
                "Player leveled up"
            );
        }

        Ok(CollectionReport {
            player_id: player,
            collected_at: now,
            draw_count: accumulation.draw_count,
            early: accumulation.early,
            progress_ratio: accumulation.progress_ratio,
            admitted: admission.admitted,
            lost_count: admission.lost_count,
            experience_gained: admission.experience,
            previous_level,
            new_level: leveled.level,
            leveled_up: leveled.leveled_up(),
            experience: leveled.experience,
        })
    }

    /// Reset level, experience and gear for a permanent bonus.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NotRegistered`] without a record,
    /// [`ProgressionError::RequirementNotMet`] below the level floor, or
    /// [`ProgressionError::Store`] if the store fails.
    pub async fn rebirth(&self, player: PlayerId) -> Result<RebirthOutcome, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        let mut progress = read_registered(&mut session, player).await?;

        let outcome = match rebirth::apply(&mut progress, &self.config.rebirth) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(player = %player, error = %err, "Rebirth rejected");
                return Err(err);
            }
        };

        session.write_progress(&progress).await?;
        session.commit().await?;

        tracing::info!(
            player = %player,
            previous_level = outcome.previous_level,
            rebirth_count = outcome.rebirth_count,
            speed_pct = outcome.bonuses.speed_pct,
            yield_pct = outcome.bonuses.yield_pct,
            "Player reborn"
        );
        Ok(outcome)
    }

    /// What a rebirth would do right now. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NotRegistered`] without a record, or
    /// [`ProgressionError::Store`] if the store fails.
    pub async fn preview_rebirth(
        &self,
        player: PlayerId,
    ) -> Result<RebirthPreview, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        let progress = read_registered(&mut session, player).await?;
        rebirth::preview(&progress, &self.config.rebirth)
    }

    /// Buy `gear` and equip it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NotRegistered`] without a record,
    /// [`ProgressionError::RequirementNotMet`] if the level gate fails or
    /// the slot already holds this tier or better,
    /// [`ProgressionError::InsufficientFunds`] if the wallet cannot pay, or
    /// [`ProgressionError::Store`] if the store fails.
    pub async fn purchase_equipment(
        &self,
        player: PlayerId,
        gear: Gear,
    ) -> Result<PurchaseReceipt, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        let mut progress = read_registered(&mut session, player).await?;
        let entry = *self.catalog.entry(gear)?;

        if progress.level < entry.min_level {
            let requirement = Requirement::LevelTooLow {
                gear,
                required: entry.min_level,
                current: progress.level,
            };
            tracing::warn!(player = %player, %requirement, "Purchase rejected");
            return Err(ProgressionError::RequirementNotMet(requirement));
        }

        let equipped = progress.equipped(gear.family());
        if entry.tier <= self.catalog.entry(equipped)?.tier {
            let requirement = Requirement::AlreadyOwned { gear, equipped };
            tracing::warn!(player = %player, %requirement, "Purchase rejected");
            return Err(ProgressionError::RequirementNotMet(requirement));
        }

        let balance_after = match session
            .debit(entry.price, LedgerEntryType::Purchase, gear.name())
            .await?
        {
            DebitOutcome::Debited { balance_after } => balance_after,
            DebitOutcome::InsufficientFunds { balance } => {
                tracing::warn!(
                    player = %player,
                    gear = %gear,
                    price = entry.price,
                    balance,
                    "Purchase rejected: insufficient funds"
                );
                return Err(ProgressionError::InsufficientFunds {
                    price: entry.price,
                    balance,
                });
            }
        };

        let replaced = progress.equip(gear);
        session.write_progress(&progress).await?;
        session.commit().await?;

        tracing::info!(
            player = %player,
            gear = %gear,
            replaced = %replaced,
            price = entry.price,
            "Gear purchased"
        );
        Ok(PurchaseReceipt {
            gear,
            replaced,
            price: entry.price,
            balance_after,
        })
    }

    /// Sell units of one resource for currency.
    ///
    /// The credit is `floor(sale_value * quantity * (100 + yield) / 100)`
    /// where `yield` is the rebirth yield bonus.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NotRegistered`] without a record,
    /// [`ProgressionError::InsufficientResource`] if fewer units are held
    /// than requested (or none at all), or [`ProgressionError::Store`] if
    /// the store fails.
    pub async fn sell(
        &self,
        player: PlayerId,
        resource: ResourceKind,
        amount: SellAmount,
    ) -> Result<SaleReceipt, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        let progress = read_registered(&mut session, player).await?;
        let inventory = session.read_inventory().await?;

        let available = quantity(&inventory, resource);
        let requested = match amount {
            SellAmount::All => available,
            SellAmount::Exactly(units) => units,
        };
        if requested == 0 || requested > available {
            tracing::warn!(
                player = %player,
                resource = %resource,
                requested,
                available,
                "Sale rejected"
            );
            return Err(ProgressionError::InsufficientResource {
                resource,
                requested: requested.max(1),
                available,
            });
        }

        let unit_value = self
            .drops
            .entry(resource)
            .ok_or_else(|| ProgressionError::InvalidCatalog {
                reason: format!("{resource} has no sale value"),
            })?
            .sale_value;
        let yield_bonus_pct = rebirth::bonuses(&progress, &self.config.rebirth)?.yield_pct;
        let credited = sale_credit(unit_value, requested, yield_bonus_pct)?;

        let mut delta = InventoryDelta::new();
        delta.insert(resource, -i64::from(requested));
        session.write_inventory_delta(&delta).await?;
        let reference = format!("{requested} {resource}");
        let balance_after = session
            .credit(credited, LedgerEntryType::Sale, &reference)
            .await?;
        session.commit().await?;

        tracing::info!(
            player = %player,
            resource = %resource,
            quantity = requested,
            credited,
            "Resources sold"
        );
        Ok(SaleReceipt {
            resource,
            quantity: requested,
            unit_value,
            yield_bonus_pct,
            credited,
            balance_after,
        })
    }

    /// Read-only summary of a player at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::NotRegistered`] without a record, or
    /// [`ProgressionError::Store`] if the store fails.
    pub async fn status(
        &self,
        player: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<PlayerStatus, ProgressionError> {
        let mut session = self.store.begin(player).await?;
        let progress = read_registered(&mut session, player).await?;
        let inventory = session.read_inventory().await?;
        let balance = session.balance().await?;

        let bonuses = rebirth::bonuses(&progress, &self.config.rebirth)?;
        let tool = self.catalog.tool_bonus(progress.tool)?;
        let speed_pct = bonuses
            .speed_pct
            .checked_add(tool.speed_pct)
            .ok_or_else(|| ProgressionError::overflow("speed bonus"))?;
        let seconds_until_ready = seconds_until_ready(
            progress.level,
            speed_pct,
            progress.last_collection_at,
            now,
            &self.config.cooldown,
        )?;
        let experience_required = experience_required(progress.level, &self.config.leveling)
            .ok_or_else(|| ProgressionError::overflow("level-up threshold"))?;
        let occupancy = total_units(&inventory)
            .ok_or_else(|| ProgressionError::overflow("inventory occupancy"))?;
        let capacity = self.catalog.capacity(progress.container)?;

        Ok(PlayerStatus {
            progress,
            bonuses,
            experience_required,
            occupancy,
            capacity,
            balance,
            seconds_until_ready,
        })
    }
}

async fn read_registered<T: StoreSession>(
    session: &mut T,
    player: PlayerId,
) -> Result<PlayerProgress, ProgressionError> {
    session
        .read_progress()
        .await?
        .ok_or(ProgressionError::NotRegistered(player))
}

fn sale_credit(unit_value: u64, quantity: u32, yield_pct: u32) -> Result<u64, ProgressionError> {
    let multiplier = 100_u64
        .checked_add(u64::from(yield_pct))
        .ok_or_else(|| ProgressionError::overflow("yield multiplier"))?;
    unit_value
        .checked_mul(u64::from(quantity))
        .and_then(|gross| gross.checked_mul(multiplier))
        .and_then(|scaled| scaled.checked_div(100))
        .ok_or_else(|| ProgressionError::overflow("sale credit"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeDelta;
    use prospect_types::{Inventory, RebirthBonuses};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::StoreError;

    const PLAYER: PlayerId = PlayerId(42);

    fn engine() -> ProgressionEngine<MemoryStore> {
        ProgressionEngine::new(MemoryStore::new(), ProgressionConfig::default())
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    async fn registered(now: DateTime<Utc>) -> ProgressionEngine<MemoryStore> {
        let engine = engine();
        engine.register(PLAYER, now).await.unwrap();
        engine
    }

    async fn seeded(
        progress: PlayerProgress,
        inventory: Inventory,
        balance: u64,
    ) -> ProgressionEngine<MemoryStore> {
        let engine = engine();
        engine.store().seed(progress, inventory, balance).await;
        engine
    }

    async fn snapshot(
        engine: &ProgressionEngine<MemoryStore>,
    ) -> (PlayerProgress, Inventory, u64) {
        engine.store().snapshot(PLAYER).await.unwrap()
    }

    fn stone(units: u32) -> Inventory {
        let mut inventory = Inventory::new();
        inventory.insert(ResourceKind::Stone, units);
        inventory
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn register_twice_is_rejected() {
        let now = Utc::now();
        let engine = registered(now).await;
        let result = engine.register(PLAYER, now).await;
        assert!(matches!(result, Err(ProgressionError::AlreadyRegistered(PLAYER))));
    }

    #[tokio::test]
    async fn unregistered_player_is_rejected_everywhere() {
        let engine = engine();
        let now = Utc::now();
        assert!(matches!(
            engine.collect(PLAYER, now, &mut rng()).await,
            Err(ProgressionError::NotRegistered(PLAYER))
        ));
        assert!(matches!(
            engine.rebirth(PLAYER).await,
            Err(ProgressionError::NotRegistered(_))
        ));
        assert!(matches!(
            engine.preview_rebirth(PLAYER).await,
            Err(ProgressionError::NotRegistered(_))
        ));
        assert!(matches!(
            engine.purchase_equipment(PLAYER, Gear::LeatherPouch).await,
            Err(ProgressionError::NotRegistered(_))
        ));
        assert!(matches!(
            engine.status(PLAYER, now).await,
            Err(ProgressionError::NotRegistered(_))
        ));
        assert!(engine.store().snapshot(PLAYER).await.is_none());
    }

    // -----------------------------------------------------------------------
    // Collection
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn immediate_collection_is_early_and_small() {
        let start = Utc::now();
        let engine = registered(start).await;
        let now = start + TimeDelta::milliseconds(1);
        let report = engine.collect(PLAYER, now, &mut rng()).await.unwrap();
        assert!(report.early);
        assert!((1..=3).contains(&report.draw_count));
        assert_eq!(report.admitted_total(), report.draw_count);
        assert_eq!(report.lost_count, 0);

        let (progress, inventory, _) = snapshot(&engine).await;
        assert_eq!(progress.last_collection_at, now);
        assert_eq!(total_units(&inventory), Some(report.draw_count));
    }

    #[tokio::test]
    async fn two_cooldowns_give_ten_draws() {
        let start = Utc::now();
        let engine = registered(start).await;
        let now = start + TimeDelta::seconds(240);
        let report = engine.collect(PLAYER, now, &mut rng()).await.unwrap();
        assert!(!report.early);
        assert_eq!(report.draw_count, 10);
        assert_eq!(report.admitted_total(), 10);
        assert!(report.experience_gained >= 10);

        let (progress, inventory, _) = snapshot(&engine).await;
        assert_eq!(total_units(&inventory), Some(10));
        assert_eq!(progress.experience, report.experience);
    }

    #[tokio::test]
    async fn full_container_rejects_without_change() {
        let start = Utc::now();
        let progress = PlayerProgress::new(PLAYER, start);
        let engine = seeded(progress.clone(), stone(50), 0).await;
        let later = start + TimeDelta::hours(1);

        let result = engine.collect(PLAYER, later, &mut rng()).await;
        assert!(matches!(
            result,
            Err(ProgressionError::InventoryFull {
                occupancy: 50,
                capacity: 50
            })
        ));
        let (after, inventory, _) = snapshot(&engine).await;
        assert_eq!(after, progress);
        assert_eq!(inventory, stone(50));
    }

    #[tokio::test]
    async fn nearly_full_container_truncates_and_fills_exactly() {
        let start = Utc::now();
        let engine = seeded(PlayerProgress::new(PLAYER, start), stone(47), 0).await;
        let later = start + TimeDelta::seconds(240);

        let report = engine.collect(PLAYER, later, &mut rng()).await.unwrap();
        assert_eq!(report.draw_count, 10);
        assert_eq!(report.admitted_total(), 3);
        assert_eq!(report.lost_count, 7);

        let (_, inventory, _) = snapshot(&engine).await;
        assert_eq!(total_units(&inventory), Some(50));
    }

    #[tokio::test]
    async fn capacity_and_experience_invariants_hold_over_many_collections() {
        let start = Utc::now();
        let engine = registered(start).await;
        let mut rng = rng();
        let mut now = start;
        let cfg = ProgressionConfig::default();

        for round in 0..40 {
            now += TimeDelta::seconds(90 + round * 7);
            let result = engine.collect(PLAYER, now, &mut rng).await;
            if matches!(result, Err(ProgressionError::InventoryFull { .. })) {
                engine
                    .sell(PLAYER, ResourceKind::Stone, SellAmount::All)
                    .await
                    .ok();
                engine
                    .sell(PLAYER, ResourceKind::Coal, SellAmount::All)
                    .await
                    .ok();
                continue;
            }
            let report = result.unwrap();
            assert!(report.new_level >= report.previous_level);

            let (progress, inventory, _) = snapshot(&engine).await;
            let required = experience_required(progress.level, &cfg.leveling).unwrap();
            assert!(progress.experience < required);
            assert!(total_units(&inventory).unwrap() <= 50);
        }
    }

    #[tokio::test]
    async fn collection_clock_never_moves_backward() {
        let start = Utc::now();
        let engine = registered(start).await;
        let earlier = start - TimeDelta::seconds(30);
        let report = engine.collect(PLAYER, earlier, &mut rng()).await.unwrap();
        assert_eq!(report.draw_count, 1);
        let (progress, _, _) = snapshot(&engine).await;
        assert_eq!(progress.last_collection_at, start);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_storage_error() {
        let start = Utc::now();
        let engine = registered(start).await;
        engine.store().set_unavailable(true);
        let result = engine
            .collect(PLAYER, start + TimeDelta::seconds(240), &mut rng())
            .await;
        assert!(matches!(
            result,
            Err(ProgressionError::Store(StoreError::Unavailable(_)))
        ));
        engine.store().set_unavailable(false);
        let (progress, inventory, _) = snapshot(&engine).await;
        assert_eq!(progress.last_collection_at, start);
        assert!(inventory.is_empty());
    }

    // -----------------------------------------------------------------------
    // Rebirth
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn rebirth_from_two_to_three() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.level = 14;
        progress.experience = 300;
        progress.rebirth_count = 2;
        progress.tool = Gear::IronPickaxe;
        progress.container = Gear::Backpack;
        let engine = seeded(progress, stone(30), 10).await;

        let outcome = engine.rebirth(PLAYER).await.unwrap();
        assert_eq!(outcome.rebirth_count, 3);
        assert_eq!(
            outcome.bonuses,
            RebirthBonuses {
                speed_pct: 15,
                yield_pct: 15
            }
        );

        let (after, inventory, balance) = snapshot(&engine).await;
        assert_eq!(after.level, 1);
        assert_eq!(after.experience, 0);
        assert_eq!(after.tool, Gear::WoodenPickaxe);
        assert_eq!(after.container, Gear::ClothSack);
        assert_eq!(inventory, stone(30));
        assert_eq!(balance, 10);
    }

    #[tokio::test]
    async fn rebirth_below_floor_changes_nothing() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.level = 9;
        progress.experience = 500;
        let engine = seeded(progress.clone(), stone(3), 0).await;

        let result = engine.rebirth(PLAYER).await;
        assert!(matches!(
            result,
            Err(ProgressionError::RequirementNotMet(Requirement::RebirthLevel { .. }))
        ));
        let (after, inventory, _) = snapshot(&engine).await;
        assert_eq!(after, progress);
        assert_eq!(inventory, stone(3));
    }

    #[tokio::test]
    async fn preview_matches_outcome_and_does_not_mutate() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.level = 10;
        let engine = seeded(progress.clone(), Inventory::new(), 0).await;

        let preview = engine.preview_rebirth(PLAYER).await.unwrap();
        assert!(preview.eligible);
        assert_eq!(snapshot(&engine).await.0, progress);

        let outcome = engine.rebirth(PLAYER).await.unwrap();
        assert_eq!(outcome.bonuses, preview.next);
    }

    #[tokio::test]
    async fn rebirth_speed_bonus_shortens_cooldown() {
        let start = Utc::now();
        let mut progress = PlayerProgress::new(PLAYER, start);
        progress.rebirth_count = 20;
        let engine = seeded(progress, Inventory::new(), 0).await;
        // +100% speed: 60s is a full cycle.
        let report = engine
            .collect(PLAYER, start + TimeDelta::seconds(60), &mut rng())
            .await
            .unwrap();
        assert!(!report.early);
        assert_eq!(report.draw_count, 5);
    }

    // -----------------------------------------------------------------------
    // Shop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn purchase_equips_and_debits() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.level = 6;
        let engine = seeded(progress, Inventory::new(), 2_500).await;

        let receipt = engine
            .purchase_equipment(PLAYER, Gear::Backpack)
            .await
            .unwrap();
        assert_eq!(receipt.replaced, Gear::ClothSack);
        assert_eq!(receipt.balance_after, 500);

        let (after, _, balance) = snapshot(&engine).await;
        assert_eq!(after.container, Gear::Backpack);
        assert_eq!(balance, 500);
        let ledger = engine.store().ledger_entries(PLAYER).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.first().map(|e| e.entry_type), Some(LedgerEntryType::Purchase));
    }

    #[tokio::test]
    async fn purchase_level_gate() {
        let engine = seeded(
            PlayerProgress::new(PLAYER, Utc::now()),
            Inventory::new(),
            1_000_000,
        )
        .await;
        let result = engine.purchase_equipment(PLAYER, Gear::IronPickaxe).await;
        assert!(matches!(
            result,
            Err(ProgressionError::RequirementNotMet(Requirement::LevelTooLow {
                required: 8,
                current: 1,
                ..
            }))
        ));
        assert_eq!(snapshot(&engine).await.2, 1_000_000);
    }

    #[tokio::test]
    async fn purchase_of_same_or_lower_tier_is_rejected() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.level = 20;
        progress.container = Gear::MineCart;
        let engine = seeded(progress, Inventory::new(), 1_000_000).await;

        for gear in [Gear::MineCart, Gear::Backpack] {
            let result = engine.purchase_equipment(PLAYER, gear).await;
            assert!(matches!(
                result,
                Err(ProgressionError::RequirementNotMet(Requirement::AlreadyOwned {
                    equipped: Gear::MineCart,
                    ..
                }))
            ));
        }
        assert_eq!(snapshot(&engine).await.0.container, Gear::MineCart);
    }

    #[tokio::test]
    async fn purchase_without_funds_changes_nothing() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.level = 3;
        let engine = seeded(progress.clone(), Inventory::new(), 499).await;

        let result = engine.purchase_equipment(PLAYER, Gear::StonePickaxe).await;
        assert!(matches!(
            result,
            Err(ProgressionError::InsufficientFunds {
                price: 500,
                balance: 499
            })
        ));
        let (after, _, balance) = snapshot(&engine).await;
        assert_eq!(after, progress);
        assert_eq!(balance, 499);
        assert!(engine.store().ledger_entries(PLAYER).await.is_empty());
    }

    // -----------------------------------------------------------------------
    // Sale and status
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn sale_credits_with_yield_bonus() {
        let mut progress = PlayerProgress::new(PLAYER, Utc::now());
        progress.rebirth_count = 3;
        let mut inventory = stone(10);
        inventory.insert(ResourceKind::Coal, 7);
        let engine = seeded(progress, inventory, 0).await;

        // Coal sells for 3: floor(3 * 7 * 115 / 100) = 24.
        let receipt = engine
            .sell(PLAYER, ResourceKind::Coal, SellAmount::All)
            .await
            .unwrap();
        assert_eq!(receipt.quantity, 7);
        assert_eq!(receipt.yield_bonus_pct, 15);
        assert_eq!(receipt.credited, 24);

        let (_, inventory, balance) = snapshot(&engine).await;
        assert!(!inventory.contains_key(&ResourceKind::Coal));
        assert_eq!(inventory, stone(10));
        assert_eq!(balance, 24);
    }

    #[tokio::test]
    async fn selling_more_than_held_is_rejected() {
        let engine = seeded(PlayerProgress::new(PLAYER, Utc::now()), stone(4), 0).await;
        let result = engine
            .sell(PLAYER, ResourceKind::Stone, SellAmount::Exactly(5))
            .await;
        assert!(matches!(
            result,
            Err(ProgressionError::InsufficientResource {
                requested: 5,
                available: 4,
                ..
            })
        ));
        let nothing = engine.sell(PLAYER, ResourceKind::Gold, SellAmount::All).await;
        assert!(matches!(
            nothing,
            Err(ProgressionError::InsufficientResource { available: 0, .. })
        ));
        assert_eq!(snapshot(&engine).await.1, stone(4));
    }

    #[tokio::test]
    async fn status_reports_derived_figures() {
        let start = Utc::now();
        let mut progress = PlayerProgress::new(PLAYER, start);
        progress.level = 4;
        progress.rebirth_count = 1;
        let engine = seeded(progress, stone(12), 77).await;

        let status = engine
            .status(PLAYER, start + TimeDelta::seconds(20))
            .await
            .unwrap();
        assert_eq!(status.experience_required, 400);
        assert_eq!(status.occupancy, 12);
        assert_eq!(status.capacity, 50);
        assert_eq!(status.balance, 77);
        assert_eq!(status.bonuses.speed_pct, 5);
        // 120s / 1.05 = 114285ms; 94285ms left -> 95s.
        assert_eq!(status.seconds_until_ready, 95);
    }
}
