//! The equipment catalog.
//!
//! Tools and containers are modeled as one catalog of gear slots. Each
//! entry carries a [`GearEffect`] describing what it does when equipped:
//! tools shorten the cooldown and add luck, containers set capacity.
//! Adding a new gear family means adding an effect variant, not a new map.

use prospect_types::{Gear, GearFamily};

use crate::error::ProgressionError;

/// What a piece of gear does while equipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GearEffect {
    /// A gathering tool.
    Tool {
        /// Cooldown speed bonus in percent, added to the rebirth bonus.
        speed_pct: u32,
        /// Drop luck bonus in percent.
        luck_pct: u32,
    },
    /// A storage container.
    Container {
        /// Total units the container holds.
        capacity: u32,
    },
}

impl GearEffect {
    /// The slot family this effect belongs to.
    pub const fn family(self) -> GearFamily {
        match self {
            Self::Tool { .. } => GearFamily::Tool,
            Self::Container { .. } => GearFamily::Container,
        }
    }
}

/// One row of the equipment catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GearEntry {
    /// The gear item.
    pub gear: Gear,
    /// Rank within its family; higher is better.
    pub tier: u8,
    /// Shop price.
    pub price: u64,
    /// Minimum player level to buy.
    pub min_level: u32,
    /// Effect while equipped.
    pub effect: GearEffect,
}

/// Bonuses the equipped tool contributes to a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolBonus {
    /// Cooldown speed bonus in percent.
    pub speed_pct: u32,
    /// Drop luck bonus in percent.
    pub luck_pct: u32,
}

/// Validated, immutable equipment catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentCatalog {
    entries: Vec<GearEntry>,
}

impl EquipmentCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidCatalog`] if any gear item is
    /// missing or listed twice, or an entry's effect does not match its
    /// gear family.
    pub fn new(entries: Vec<GearEntry>) -> Result<Self, ProgressionError> {
        for gear in Gear::ALL {
            let count = entries.iter().filter(|entry| entry.gear == gear).count();
            if count != 1 {
                return Err(ProgressionError::InvalidCatalog {
                    reason: format!("{gear} must appear exactly once, found {count}"),
                });
            }
        }
        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.effect.family() != entry.gear.family())
        {
            return Err(ProgressionError::InvalidCatalog {
                reason: format!("{} has an effect for the wrong slot", entry.gear),
            });
        }
        Ok(Self { entries })
    }

    /// The live shop.
    pub fn standard() -> Self {
        const fn tool(
            gear: Gear,
            tier: u8,
            price: u64,
            min_level: u32,
            speed_pct: u32,
            luck_pct: u32,
        ) -> GearEntry {
            GearEntry {
                gear,
                tier,
                price,
                min_level,
                effect: GearEffect::Tool {
                    speed_pct,
                    luck_pct,
                },
            }
        }
        const fn container(
            gear: Gear,
            tier: u8,
            price: u64,
            min_level: u32,
            capacity: u32,
        ) -> GearEntry {
            GearEntry {
                gear,
                tier,
                price,
                min_level,
                effect: GearEffect::Container { capacity },
            }
        }

        Self {
            entries: vec![
                tool(Gear::WoodenPickaxe, 0, 0, 1, 0, 0),
                tool(Gear::StonePickaxe, 1, 500, 3, 5, 5),
                tool(Gear::IronPickaxe, 2, 2_500, 8, 10, 10),
                tool(Gear::GoldPickaxe, 3, 10_000, 15, 15, 25),
                tool(Gear::DiamondPickaxe, 4, 50_000, 25, 25, 40),
                tool(Gear::StarforgedDrill, 5, 250_000, 40, 40, 60),
                container(Gear::ClothSack, 0, 0, 1, 50),
                container(Gear::LeatherPouch, 1, 400, 2, 100),
                container(Gear::Backpack, 2, 2_000, 6, 250),
                container(Gear::MineCart, 3, 12_000, 14, 600),
                container(Gear::Warehouse, 4, 75_000, 25, 1_500),
            ],
        }
    }

    /// All entries, tools first.
    pub fn entries(&self) -> &[GearEntry] {
        &self.entries
    }

    /// The catalog row for `gear`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidCatalog`] if the gear is missing,
    /// which a catalog built through [`EquipmentCatalog::new`] rules out.
    pub fn entry(&self, gear: Gear) -> Result<&GearEntry, ProgressionError> {
        self.entries
            .iter()
            .find(|entry| entry.gear == gear)
            .ok_or_else(|| ProgressionError::InvalidCatalog {
                reason: format!("{gear} is not in the equipment catalog"),
            })
    }

    /// Capacity of a container.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidCatalog`] if `container` is not a
    /// container or is missing.
    pub fn capacity(&self, container: Gear) -> Result<u32, ProgressionError> {
        match self.entry(container)?.effect {
            GearEffect::Container { capacity } => Ok(capacity),
            GearEffect::Tool { .. } => Err(ProgressionError::InvalidCatalog {
                reason: format!("{container} is not a container"),
            }),
        }
    }

    /// Speed and luck bonuses of a tool.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidCatalog`] if `tool` is not a tool
    /// or is missing.
    pub fn tool_bonus(&self, tool: Gear) -> Result<ToolBonus, ProgressionError> {
        match self.entry(tool)?.effect {
            GearEffect::Tool {
                speed_pct,
                luck_pct,
            } => Ok(ToolBonus {
                speed_pct,
                luck_pct,
            }),
            GearEffect::Container { .. } => Err(ProgressionError::InvalidCatalog {
                reason: format!("{tool} is not a tool"),
            }),
        }
    }
}

impl Default for EquipmentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_passes_validation() {
        let catalog = EquipmentCatalog::standard();
        assert!(EquipmentCatalog::new(catalog.entries().to_vec()).is_ok());
    }

    #[test]
    fn starters_are_free_and_neutral() {
        let catalog = EquipmentCatalog::standard();
        let pick = catalog.entry(Gear::starter(GearFamily::Tool));
        assert!(matches!(pick, Ok(entry) if entry.price == 0 && entry.tier == 0));
        assert_eq!(
            catalog.tool_bonus(Gear::WoodenPickaxe).ok(),
            Some(ToolBonus::default())
        );
        assert_eq!(catalog.capacity(Gear::ClothSack).ok(), Some(50));
    }

    #[test]
    fn tiers_rise_with_price_within_family() {
        let catalog = EquipmentCatalog::standard();
        for family in [GearFamily::Tool, GearFamily::Container] {
            let rows: Vec<&GearEntry> = catalog
                .entries()
                .iter()
                .filter(|entry| entry.gear.family() == family)
                .collect();
            for pair in rows.windows(2) {
                if let [lower, higher] = pair {
                    assert!(lower.tier < higher.tier);
                    assert!(lower.price < higher.price);
                }
            }
        }
    }

    #[test]
    fn wrong_slot_lookups_fail() {
        let catalog = EquipmentCatalog::standard();
        assert!(catalog.capacity(Gear::IronPickaxe).is_err());
        assert!(catalog.tool_bonus(Gear::Backpack).is_err());
    }

    #[test]
    fn missing_gear_rejected() {
        let mut entries = EquipmentCatalog::standard().entries().to_vec();
        entries.retain(|entry| entry.gear != Gear::Warehouse);
        assert!(EquipmentCatalog::new(entries).is_err());
    }

    #[test]
    fn mismatched_effect_rejected() {
        let mut entries = EquipmentCatalog::standard().entries().to_vec();
        if let Some(entry) = entries.iter_mut().find(|e| e.gear == Gear::Backpack) {
            entry.effect = GearEffect::Tool {
                speed_pct: 1,
                luck_pct: 1,
            };
        }
        assert!(EquipmentCatalog::new(entries).is_err());
    }
}
