//! Capacity-constrained admission of a batch of draws.
//!
//! Draws are aggregated per kind in the order each kind first appeared.
//! When the container cannot take everything, kinds produced earlier are
//! filled first and later kinds get whatever is left, possibly nothing.
//! The experience award shrinks in proportion to what was admitted.
//!
//! The empty-container check ([`available_space`]) runs before any draw is
//! rolled; [`admit`] itself never sees zero space in the normal flow.

use prospect_types::{Inventory, ResourceKind, ResourceYield};

use crate::error::ProgressionError;
use crate::inventory::total_units;

/// Draws rolled for one collection, aggregated per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawBatch {
    lines: Vec<ResourceYield>,
    raw_experience: u64,
}

impl DrawBatch {
    /// Create an empty batch.
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            raw_experience: 0,
        }
    }

    /// Record one drawn unit worth `experience`.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::ArithmeticOverflow`] on overflow.
    pub fn record(
        &mut self,
        resource: ResourceKind,
        experience: u64,
    ) -> Result<(), ProgressionError> {
        self.raw_experience = self
            .raw_experience
            .checked_add(experience)
            .ok_or_else(|| ProgressionError::overflow("batch experience"))?;

        if let Some(line) = self.lines.iter_mut().find(|line| line.resource == resource) {
            line.quantity = line
                .quantity
                .checked_add(1)
                .ok_or_else(|| ProgressionError::overflow("batch quantity"))?;
        } else {
            self.lines.push(ResourceYield {
                resource,
                quantity: 1,
            });
        }
        Ok(())
    }

    /// Requested lines in production order.
    pub fn lines(&self) -> &[ResourceYield] {
        &self.lines
    }

    /// Experience the whole batch would be worth if fully admitted.
    pub const fn raw_experience(&self) -> u64 {
        self.raw_experience
    }

    /// Units requested across all kinds.
    pub fn requested_total(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }
}

/// What actually fits into the container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admission {
    /// Admitted lines in production order. Kinds that got nothing are
    /// omitted.
    pub admitted: Vec<ResourceYield>,
    /// Units requested but not admitted.
    pub lost_count: u32,
    /// Experience to award after truncation.
    pub experience: u64,
}

impl Admission {
    /// Units admitted across all kinds.
    pub fn admitted_total(&self) -> u32 {
        self.admitted
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }
}

/// Free space left in the container.
///
/// # Errors
///
/// Returns [`ProgressionError::InventoryFull`] when nothing fits, which
/// aborts a collection before any draw is rolled.
pub fn available_space(inventory: &Inventory, capacity: u32) -> Result<u32, ProgressionError> {
    let occupancy = total_units(inventory)
        .ok_or_else(|| ProgressionError::overflow("inventory occupancy"))?;
    match capacity.checked_sub(occupancy) {
        Some(space) if space > 0 => Ok(space),
        _ => Err(ProgressionError::InventoryFull {
            occupancy,
            capacity,
        }),
    }
}

/// Admit as much of `batch` as fits in `space`.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] on overflow.
pub fn admit(batch: &DrawBatch, space: u32) -> Result<Admission, ProgressionError> {
    let mut remaining = space;
    let mut admitted = Vec::new();

    for line in batch.lines() {
        if remaining == 0 {
            break;
        }
        let taken = line.quantity.min(remaining);
        remaining = remaining.saturating_sub(taken);
        if taken > 0 {
            admitted.push(ResourceYield {
                resource: line.resource,
                quantity: taken,
            });
        }
    }

    let requested = batch.requested_total();
    let admitted_total = admitted
        .iter()
        .fold(0_u32, |acc, line: &ResourceYield| acc.saturating_add(line.quantity));
    let lost_count = requested.saturating_sub(admitted_total);

    let experience = if lost_count == 0 {
        batch.raw_experience()
    } else {
        batch
            .raw_experience()
            .checked_mul(u64::from(admitted_total))
            .and_then(|scaled| scaled.checked_div(u64::from(requested)))
            .ok_or_else(|| ProgressionError::overflow("truncated experience"))?
    };

    if lost_count > 0 {
        tracing::debug!(
            requested,
            admitted = admitted_total,
            lost_count,
            "Container full, truncating batch"
        );
    }

    Ok(Admission {
        admitted,
        lost_count,
        experience,
    })
}
