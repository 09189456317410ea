//! Enumeration types for the Prospect economy.
//!
//! Resource kinds and gear identities are closed sets known at compile
//! time. Their numeric properties (weights, prices, bonuses) live in the
//! catalogs of `prospect-core`; this module only names them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A kind of resource a player can mine.
///
/// Declaration order matches the drop table order and runs from the most
/// common to the rarest kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Loose rubble. Always available.
    Stone,
    /// Coal seams close to the surface.
    Coal,
    /// Copper ore.
    Copper,
    /// Iron ore.
    Iron,
    /// Clear quartz crystals.
    Quartz,
    /// Silver ore.
    Silver,
    /// Gold ore.
    Gold,
    /// Sapphire gems.
    Sapphire,
    /// Ruby gems.
    Ruby,
    /// Emerald gems.
    Emerald,
    /// Diamonds.
    Diamond,
    /// Starstone, the rarest find in the mine.
    Starstone,
}

impl ResourceKind {
    /// Every resource kind in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Stone,
        Self::Coal,
        Self::Copper,
        Self::Iron,
        Self::Quartz,
        Self::Silver,
        Self::Gold,
        Self::Sapphire,
        Self::Ruby,
        Self::Emerald,
        Self::Diamond,
        Self::Starstone,
    ];

    /// Stable lowercase name, used for storage keys and display.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stone => "stone",
            Self::Coal => "coal",
            Self::Copper => "copper",
            Self::Iron => "iron",
            Self::Quartz => "quartz",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Sapphire => "sapphire",
            Self::Ruby => "ruby",
            Self::Emerald => "emerald",
            Self::Diamond => "diamond",
            Self::Starstone => "starstone",
        }
    }

    /// Look up a resource kind by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Gear
// ---------------------------------------------------------------------------

/// The equipment slot a piece of gear occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearFamily {
    /// Gathering tools. Affect cooldown speed and drop luck.
    Tool,
    /// Storage containers. Define inventory capacity.
    Container,
}

/// A purchasable piece of gear.
///
/// Tools and containers share one identifier space; [`Gear::family`]
/// tells which slot an item occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gear {
    // --- Tools ---
    /// Starter tool every player owns.
    WoodenPickaxe,
    /// First upgrade.
    StonePickaxe,
    /// Iron-headed pickaxe.
    IronPickaxe,
    /// Gilded pickaxe with a luck bonus.
    GoldPickaxe,
    /// Diamond-tipped pickaxe.
    DiamondPickaxe,
    /// End-game mechanical drill.
    StarforgedDrill,

    // --- Containers ---
    /// Starter container every player owns.
    ClothSack,
    /// Stitched leather pouch.
    LeatherPouch,
    /// Framed backpack.
    Backpack,
    /// Rail mine cart.
    MineCart,
    /// Rented warehouse space.
    Warehouse,
}

impl Gear {
    /// Every gear item, tools first, each family in ascending tier.
    pub const ALL: [Self; 11] = [
        Self::WoodenPickaxe,
        Self::StonePickaxe,
        Self::IronPickaxe,
        Self::GoldPickaxe,
        Self::DiamondPickaxe,
        Self::StarforgedDrill,
        Self::ClothSack,
        Self::LeatherPouch,
        Self::Backpack,
        Self::MineCart,
        Self::Warehouse,
    ];

    /// The slot this item is equipped into.
    pub const fn family(self) -> GearFamily {
        match self {
            Self::WoodenPickaxe
            | Self::StonePickaxe
            | Self::IronPickaxe
            | Self::GoldPickaxe
            | Self::DiamondPickaxe
            | Self::StarforgedDrill => GearFamily::Tool,
            Self::ClothSack
            | Self::LeatherPouch
            | Self::Backpack
            | Self::MineCart
            | Self::Warehouse => GearFamily::Container,
        }
    }

    /// The item a fresh (or reborn) player has equipped in `family`.
    pub const fn starter(family: GearFamily) -> Self {
        match family {
            GearFamily::Tool => Self::WoodenPickaxe,
            GearFamily::Container => Self::ClothSack,
        }
    }

    /// Stable lowercase name, used for storage keys and display.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WoodenPickaxe => "wooden_pickaxe",
            Self::StonePickaxe => "stone_pickaxe",
            Self::IronPickaxe => "iron_pickaxe",
            Self::GoldPickaxe => "gold_pickaxe",
            Self::DiamondPickaxe => "diamond_pickaxe",
            Self::StarforgedDrill => "starforged_drill",
            Self::ClothSack => "cloth_sack",
            Self::LeatherPouch => "leather_pouch",
            Self::Backpack => "backpack",
            Self::MineCart => "mine_cart",
            Self::Warehouse => "warehouse",
        }
    }

    /// Look up a gear item by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gear| gear.name() == name)
    }
}

impl core::fmt::Display for Gear {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Why currency moved in or out of a player's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    /// Gear bought from the shop (debit).
    Purchase,
    /// Resources sold to the shop (credit).
    Sale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_roundtrip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_name("mithril"), None);
    }

    #[test]
    fn gear_names_roundtrip() {
        for gear in Gear::ALL {
            assert_eq!(Gear::from_name(gear.name()), Some(gear));
        }
    }

    #[test]
    fn starters_belong_to_their_family() {
        assert_eq!(Gear::starter(GearFamily::Tool).family(), GearFamily::Tool);
        assert_eq!(
            Gear::starter(GearFamily::Container).family(),
            GearFamily::Container
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Gear::MineCart).ok();
        assert_eq!(json.as_deref(), Some("\"mine_cart\""));
        let json = serde_json::to_string(&ResourceKind::Starstone).ok();
        assert_eq!(json.as_deref(), Some("\"starstone\""));
    }
}
