//! Core record and result structs.
//!
//! [`PlayerProgress`] is the persisted per-player record. The remaining
//! structs are results the engine hands back to the Command Interface for
//! presentation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{Gear, GearFamily, LedgerEntryType, ResourceKind};
use crate::ids::{LedgerEntryId, PlayerId};

/// A player's inventory: resource kind to quantity.
///
/// Quantities are always positive; a kind with nothing left is absent.
pub type Inventory = BTreeMap<ResourceKind, u32>;

// ---------------------------------------------------------------------------
// PlayerProgress
// ---------------------------------------------------------------------------

/// Persistent progression state for one player.
///
/// The permanent rebirth bonuses are not stored; they are derived from
/// `rebirth_count` via [`RebirthBonuses::for_rebirths`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    /// Owner of this record.
    pub player_id: PlayerId,
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience toward the next level. Always below the requirement for
    /// `level` once an update completes.
    pub experience: u64,
    /// Equipped gathering tool.
    pub tool: Gear,
    /// Equipped storage container.
    pub container: Gear,
    /// When the player last collected. Never moves backward.
    pub last_collection_at: DateTime<Utc>,
    /// Number of completed rebirths.
    pub rebirth_count: u32,
}

impl PlayerProgress {
    /// Create the record for a newly registered player.
    ///
    /// The collection clock starts at `now` so the first collection begins a
    /// fresh cooldown instead of paying out a backlog.
    pub const fn new(player_id: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            level: 1,
            experience: 0,
            tool: Gear::starter(GearFamily::Tool),
            container: Gear::starter(GearFamily::Container),
            last_collection_at: now,
            rebirth_count: 0,
        }
    }

    /// The gear currently occupying `family`'s slot.
    pub const fn equipped(&self, family: GearFamily) -> Gear {
        match family {
            GearFamily::Tool => self.tool,
            GearFamily::Container => self.container,
        }
    }

    /// Put `gear` into the slot of its family, returning what it replaced.
    pub const fn equip(&mut self, gear: Gear) -> Gear {
        match gear.family() {
            GearFamily::Tool => core::mem::replace(&mut self.tool, gear),
            GearFamily::Container => core::mem::replace(&mut self.container, gear),
        }
    }
}

// ---------------------------------------------------------------------------
// Rebirth
// ---------------------------------------------------------------------------

/// Permanent percentage bonuses earned through rebirth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebirthBonuses {
    /// Cooldown speed bonus in percent.
    pub speed_pct: u32,
    /// Sale value bonus in percent.
    pub yield_pct: u32,
}

impl RebirthBonuses {
    /// Bonuses after `rebirth_count` rebirths at `pct_per_rebirth` each.
    ///
    /// Returns `None` on overflow.
    pub const fn for_rebirths(rebirth_count: u32, pct_per_rebirth: u32) -> Option<Self> {
        match rebirth_count.checked_mul(pct_per_rebirth) {
            Some(pct) => Some(Self {
                speed_pct: pct,
                yield_pct: pct,
            }),
            None => None,
        }
    }
}

/// Result of a completed rebirth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebirthOutcome {
    /// Level the player was at before resetting.
    pub previous_level: u32,
    /// Rebirth count after this rebirth.
    pub rebirth_count: u32,
    /// Bonuses now in effect.
    pub bonuses: RebirthBonuses,
}

/// Side-effect free look at what a rebirth would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebirthPreview {
    /// Whether the player currently meets the level floor.
    pub eligible: bool,
    /// The level floor.
    pub required_level: u32,
    /// The player's current level.
    pub current_level: u32,
    /// Current rebirth count.
    pub rebirth_count: u32,
    /// Bonuses in effect now.
    pub current: RebirthBonuses,
    /// Bonuses that would be in effect after rebirthing.
    pub next: RebirthBonuses,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A quantity of one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceYield {
    /// The resource kind.
    pub resource: ResourceKind,
    /// How many units.
    pub quantity: u32,
}

/// Everything a single collection produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    /// Who collected.
    pub player_id: PlayerId,
    /// When the collection was made. Becomes the new last-collection time.
    pub collected_at: DateTime<Utc>,
    /// Number of draws the elapsed time was worth.
    pub draw_count: u32,
    /// Whether the collection came before a full cooldown.
    pub early: bool,
    /// Fraction of the cooldown that had elapsed, capped at 1.
    pub progress_ratio: Decimal,
    /// Units actually placed into the inventory, in the order produced.
    pub admitted: Vec<ResourceYield>,
    /// Units rolled but discarded for lack of space.
    pub lost_count: u32,
    /// Experience credited.
    pub experience_gained: u64,
    /// Level before the award.
    pub previous_level: u32,
    /// Level after the award.
    pub new_level: u32,
    /// Whether at least one level was gained.
    pub leveled_up: bool,
    /// Experience toward the next level after the award.
    pub experience: u64,
}

impl CollectionReport {
    /// Total units admitted across every kind.
    pub fn admitted_total(&self) -> u32 {
        self.admitted
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// Result of buying a piece of gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Gear bought and equipped.
    pub gear: Gear,
    /// Gear that was in the slot before.
    pub replaced: Gear,
    /// Price paid.
    pub price: u64,
    /// Wallet balance after paying.
    pub balance_after: u64,
}

/// Result of selling resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    /// Resource sold.
    pub resource: ResourceKind,
    /// Units sold.
    pub quantity: u32,
    /// Catalog value of one unit before bonuses.
    pub unit_value: u64,
    /// Rebirth yield bonus applied, in percent.
    pub yield_bonus_pct: u32,
    /// Currency credited.
    pub credited: u64,
    /// Wallet balance after the credit.
    pub balance_after: u64,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Read-only summary of a player for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// The stored record.
    pub progress: PlayerProgress,
    /// Bonuses derived from the rebirth count.
    pub bonuses: RebirthBonuses,
    /// Experience needed to reach the next level.
    pub experience_required: u64,
    /// Units currently held.
    pub occupancy: u32,
    /// Units the equipped container can hold.
    pub capacity: u32,
    /// Wallet balance.
    pub balance: u64,
    /// Seconds until a full cooldown has elapsed; zero when ready.
    pub seconds_until_ready: u64,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One append-only record of currency moving in or out of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// Wallet owner.
    pub player_id: PlayerId,
    /// Why the currency moved.
    pub entry_type: LedgerEntryType,
    /// Amount moved, always positive.
    pub amount: u64,
    /// Wallet balance after the movement.
    pub balance_after: u64,
    /// What was bought or sold.
    pub reference: String,
    /// Real-world timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_starts_fresh() {
        let now = Utc::now();
        let progress = PlayerProgress::new(PlayerId(7), now);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.experience, 0);
        assert_eq!(progress.rebirth_count, 0);
        assert_eq!(progress.tool, Gear::WoodenPickaxe);
        assert_eq!(progress.container, Gear::ClothSack);
        assert_eq!(progress.last_collection_at, now);
    }

    #[test]
    fn equip_replaces_matching_slot_only() {
        let mut progress = PlayerProgress::new(PlayerId(7), Utc::now());
        let replaced = progress.equip(Gear::Backpack);
        assert_eq!(replaced, Gear::ClothSack);
        assert_eq!(progress.container, Gear::Backpack);
        assert_eq!(progress.tool, Gear::WoodenPickaxe);
        assert_eq!(progress.equipped(GearFamily::Container), Gear::Backpack);
    }

    #[test]
    fn bonuses_scale_with_rebirths() {
        assert_eq!(
            RebirthBonuses::for_rebirths(3, 5),
            Some(RebirthBonuses {
                speed_pct: 15,
                yield_pct: 15
            })
        );
        assert_eq!(RebirthBonuses::for_rebirths(0, 5), Some(RebirthBonuses::default()));
        assert_eq!(RebirthBonuses::for_rebirths(u32::MAX, 5), None);
    }
}
