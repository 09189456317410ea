//! Inventory operations.
//!
//! An inventory maps resource kinds to positive quantities; a kind with
//! nothing left is removed from the map. Capacity is enforced upstream by
//! the [`writer`](crate::writer); applying a delta here only guards
//! against lines going negative or overflowing.

use std::collections::BTreeMap;

use prospect_types::{Inventory, ResourceKind, ResourceYield};

/// Signed per-kind changes to apply to a stored inventory in one write.
pub type InventoryDelta = BTreeMap<ResourceKind, i64>;

/// Total units held across every kind.
///
/// Returns `None` if the sum overflows `u32`.
pub fn total_units(inventory: &Inventory) -> Option<u32> {
    let mut total: u32 = 0;
    for qty in inventory.values() {
        total = total.checked_add(*qty)?;
    }
    Some(total)
}

/// Units held of one kind.
pub fn quantity(inventory: &Inventory, resource: ResourceKind) -> u32 {
    inventory.get(&resource).copied().unwrap_or(0)
}

/// Delta that adds every admitted line.
pub fn delta_for_admitted(admitted: &[ResourceYield]) -> InventoryDelta {
    let mut delta = InventoryDelta::new();
    for line in admitted {
        let entry = delta.entry(line.resource).or_insert(0);
        *entry = entry.saturating_add(i64::from(line.quantity));
    }
    delta
}

/// Apply a signed delta in place.
///
/// Returns `None`, leaving `inventory` untouched, if any line would go
/// negative or overflow.
pub fn apply_delta(inventory: &mut Inventory, delta: &InventoryDelta) -> Option<()> {
    let mut updated = inventory.clone();
    for (resource, change) in delta {
        let current = i64::from(quantity(&updated, *resource));
        let next = u32::try_from(current.checked_add(*change)?).ok()?;
        if next == 0 {
            updated.remove(resource);
        } else {
            updated.insert(*resource, next);
        }
    }
    *inventory = updated;
    Some(())
}
