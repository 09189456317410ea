//! JSON views for results that have no serializable form of their own.

use chrono::{DateTime, Utc};
use prospect_core::{DropTable, EquipmentCatalog, GearEffect};
use prospect_db::LedgerRow;
use prospect_types::GearFamily;
use serde::Serialize;

/// One shop row.
#[derive(Debug, Serialize)]
pub struct GearView {
    /// Snake-case gear name, as accepted by `buy`.
    pub gear: &'static str,
    /// Tool or container.
    pub family: GearFamily,
    /// Rank within the family.
    pub tier: u8,
    /// Price.
    pub price: u64,
    /// Level gate.
    pub min_level: u32,
    /// Speed bonus in percent (tools).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_pct: Option<u32>,
    /// Luck bonus in percent (tools).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luck_pct: Option<u32>,
    /// Units held (containers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// One drop table row.
#[derive(Debug, Serialize)]
pub struct DropView {
    /// Snake-case resource name, as accepted by `sell`.
    pub resource: &'static str,
    /// Relative weight, rendered exactly.
    pub weight: String,
    /// Experience per unit.
    pub base_experience: u32,
    /// Sale value per unit.
    pub sale_value: u64,
    /// Level gate.
    pub min_level: u32,
}

/// The `shop` listing.
#[derive(Debug, Serialize)]
pub struct ShopView {
    /// Everything for sale.
    pub gear: Vec<GearView>,
    /// Everything that can drop.
    pub drops: Vec<DropView>,
}

impl ShopView {
    /// Build the listing from the catalogs.
    pub fn new(catalog: &EquipmentCatalog, drops: &DropTable) -> Self {
        let gear = catalog
            .entries()
            .iter()
            .map(|entry| {
                let (speed_pct, luck_pct, capacity) = match entry.effect {
                    GearEffect::Tool {
                        speed_pct,
                        luck_pct,
                    } => (Some(speed_pct), Some(luck_pct), None),
                    GearEffect::Container { capacity } => (None, None, Some(capacity)),
                };
                GearView {
                    gear: entry.gear.name(),
                    family: entry.effect.family(),
                    tier: entry.tier,
                    price: entry.price,
                    min_level: entry.min_level,
                    speed_pct,
                    luck_pct,
                    capacity,
                }
            })
            .collect();
        let drops = drops
            .entries()
            .iter()
            .map(|entry| DropView {
                resource: entry.resource.name(),
                weight: entry.weight.to_string(),
                base_experience: entry.base_experience,
                sale_value: entry.sale_value,
                min_level: entry.min_level,
            })
            .collect();
        Self { gear, drops }
    }
}

/// One ledger line.
#[derive(Debug, Serialize)]
pub struct LedgerView {
    /// Entry id.
    pub id: String,
    /// `purchase` or `sale`.
    pub entry_type: String,
    /// Amount moved.
    pub amount: i64,
    /// Balance afterward.
    pub balance_after: i64,
    /// What moved.
    pub reference: String,
    /// When.
    pub created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LedgerView {
    fn from(row: LedgerRow) -> Self {
        Self {
            id: row.id.to_string(),
            entry_type: row.entry_type,
            amount: row.amount,
            balance_after: row.balance_after,
            reference: row.reference,
            created_at: row.created_at,
        }
    }
}

/// Pretty-print any serializable value to stdout.
pub fn print<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
