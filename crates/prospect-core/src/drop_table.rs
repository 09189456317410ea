//! The drop table: every resource kind the mine can produce.
//!
//! Entries are kept in declaration order, which is also the order the
//! [`WeightedResolver`](crate::resolver::WeightedResolver) walks when it
//! picks a draw. Weights are relative and need not sum to anything in
//! particular.

use prospect_types::ResourceKind;
use rust_decimal::Decimal;

use crate::error::ProgressionError;

/// One row of the drop table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEntry {
    /// The resource produced.
    pub resource: ResourceKind,
    /// Relative rarity weight. Strictly positive.
    pub weight: Decimal,
    /// Experience granted per unit before level scaling.
    pub base_experience: u32,
    /// Currency one unit sells for before bonuses.
    pub sale_value: u64,
    /// Player level at which this kind starts dropping.
    pub min_level: u32,
}

impl DropEntry {
    /// Create a drop table row.
    pub const fn new(
        resource: ResourceKind,
        weight: Decimal,
        base_experience: u32,
        sale_value: u64,
        min_level: u32,
    ) -> Self {
        Self {
            resource,
            weight,
            base_experience,
            sale_value,
            min_level,
        }
    }
}

/// Validated, immutable drop table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    entries: Vec<DropEntry>,
}

impl DropTable {
    /// Build a drop table from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidCatalog`] if the table is empty,
    /// a weight is not positive, a resource appears twice, or nothing is
    /// unlocked at level 1.
    pub fn new(entries: Vec<DropEntry>) -> Result<Self, ProgressionError> {
        if entries.is_empty() {
            return Err(invalid("drop table has no entries"));
        }

        for (idx, entry) in entries.iter().enumerate() {
            if entry.weight <= Decimal::ZERO {
                return Err(invalid(&format!(
                    "{} has non-positive weight {}",
                    entry.resource, entry.weight
                )));
            }
            let duplicate = entries
                .iter()
                .take(idx)
                .any(|earlier| earlier.resource == entry.resource);
            if duplicate {
                return Err(invalid(&format!("{} appears more than once", entry.resource)));
            }
        }

        if !entries.iter().any(|entry| entry.min_level <= 1) {
            return Err(invalid("no resource is unlocked at level 1"));
        }

        Ok(Self { entries })
    }

    /// The live drop table.
    pub fn standard() -> Self {
        use ResourceKind::{
            Coal, Copper, Diamond, Emerald, Gold, Iron, Quartz, Ruby, Sapphire, Silver, Starstone,
            Stone,
        };

        Self {
            entries: vec![
                DropEntry::new(Stone, Decimal::new(40, 0), 1, 1, 1),
                DropEntry::new(Coal, Decimal::new(25, 0), 2, 3, 1),
                DropEntry::new(Copper, Decimal::new(15, 0), 3, 6, 3),
                DropEntry::new(Iron, Decimal::new(10, 0), 5, 10, 5),
                DropEntry::new(Quartz, Decimal::new(6, 0), 7, 15, 8),
                DropEntry::new(Silver, Decimal::new(4, 0), 9, 25, 12),
                DropEntry::new(Gold, Decimal::new(25, 1), 12, 50, 15),
                DropEntry::new(Sapphire, Decimal::new(12, 1), 18, 90, 20),
                DropEntry::new(Ruby, Decimal::new(8, 1), 22, 120, 25),
                DropEntry::new(Emerald, Decimal::new(5, 1), 28, 160, 30),
                DropEntry::new(Diamond, Decimal::new(25, 2), 40, 300, 40),
                DropEntry::new(Starstone, Decimal::new(5, 2), 80, 1000, 60),
            ],
        }
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[DropEntry] {
        &self.entries
    }

    /// The entry for `resource`, if the table has one.
    pub fn entry(&self, resource: ResourceKind) -> Option<&DropEntry> {
        self.entries.iter().find(|entry| entry.resource == resource)
    }

    /// Entries a player at `level` can roll, in declaration order.
    pub fn eligible(&self, level: u32) -> impl Iterator<Item = &DropEntry> {
        self.entries.iter().filter(move |entry| entry.min_level <= level)
    }
}

impl Default for DropTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn invalid(reason: &str) -> ProgressionError {
    ProgressionError::InvalidCatalog {
        reason: reason.to_owned(),
    }
}
