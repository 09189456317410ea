//! Weighted resolution of draws into resource kinds.
//!
//! The resolver filters the drop table to what a player's level unlocks,
//! scales every weight by the tool's luck bonus and then performs standard
//! roulette selection: roll uniformly in `[0, total)` and take the first
//! entry whose cumulative weight reaches the roll. Every draw rolls again.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::LevelingConfig;
use crate::drop_table::{DropEntry, DropTable};
use crate::error::ProgressionError;

/// Granularity of the uniform roll.
const ROLL_RESOLUTION: u64 = 1_000_000_000;

/// Roulette over the drop table entries a player can currently roll.
#[derive(Debug, Clone)]
pub struct WeightedResolver<'a> {
    /// Eligible entries paired with their cumulative adjusted weight.
    cumulative: Vec<(&'a DropEntry, Decimal)>,
    /// Sum of all adjusted weights.
    total: Decimal,
    /// Lowest-level eligible entry, used if the walk ever falls through.
    fallback: &'a DropEntry,
}

impl<'a> WeightedResolver<'a> {
    /// Prepare a resolver for a player at `level` with `luck_pct` luck.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionError::InvalidCatalog`] if nothing is eligible
    /// at `level`, or [`ProgressionError::ArithmeticOverflow`] if the
    /// weights overflow.
    pub fn new(table: &'a DropTable, level: u32, luck_pct: u32) -> Result<Self, ProgressionError> {
        let luck = Decimal::from(luck_pct);
        let mut cumulative = Vec::new();
        let mut total = Decimal::ZERO;

        for entry in table.eligible(level) {
            let adjusted = adjusted_weight(entry.weight, luck)?;
            total = total
                .checked_add(adjusted)
                .ok_or_else(|| ProgressionError::overflow("cumulative drop weight"))?;
            cumulative.push((entry, total));
        }

        let fallback = cumulative
            .iter()
            .map(|(entry, _)| *entry)
            .min_by_key(|entry| entry.min_level)
            .ok_or_else(|| ProgressionError::InvalidCatalog {
                reason: format!("no resource is eligible at level {level}"),
            })?;

        Ok(Self {
            cumulative,
            total,
            fallback,
        })
    }

    /// Roll one draw.
    pub fn resolve(&self, rng: &mut impl Rng) -> &'a DropEntry {
        let ticks = rng.random_range(0..ROLL_RESOLUTION);
        let roll = self
            .total
            .checked_mul(Decimal::from(ticks))
            .and_then(|scaled| scaled.checked_div(Decimal::from(ROLL_RESOLUTION)))
            .unwrap_or(Decimal::ZERO);
        self.select(roll)
    }

    /// Pick the entry for a roll in `[0, total)`.
    ///
    /// The first entry whose cumulative weight is at least `roll` wins, in
    /// drop table order.
    pub fn select(&self, roll: Decimal) -> &'a DropEntry {
        self.cumulative
            .iter()
            .find(|(_, cumulative)| *cumulative >= roll)
            .map_or(self.fallback, |(entry, _)| *entry)
    }
}

/// `weight + luck * (weight / 100)`.
fn adjusted_weight(weight: Decimal, luck_pct: Decimal) -> Result<Decimal, ProgressionError> {
    weight
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|share| share.checked_mul(luck_pct))
        .and_then(|boost| weight.checked_add(boost))
        .ok_or_else(|| ProgressionError::overflow("luck-adjusted weight"))
}

/// Experience one unit of `entry` is worth to a player at `level`.
///
/// `max(1, floor(base * (1 + level * bonus_pct / 100)))`, then for early
/// collections `max(1, floor(unit * penalty))`.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] on overflow.
pub fn unit_experience(
    entry: &DropEntry,
    level: u32,
    penalty: Decimal,
    config: &LevelingConfig,
) -> Result<u64, ProgressionError> {
    let bonus = Decimal::from(level)
        .checked_mul(Decimal::from(config.experience_bonus_pct_per_level))
        .and_then(|pct| pct.checked_div(Decimal::ONE_HUNDRED))
        .and_then(|fraction| Decimal::ONE.checked_add(fraction))
        .ok_or_else(|| ProgressionError::overflow("level experience multiplier"))?;

    let nominal = Decimal::from(entry.base_experience)
        .checked_mul(bonus)
        .and_then(|xp| xp.floor().to_u64())
        .ok_or_else(|| ProgressionError::overflow("unit experience"))?
        .max(1);

    if penalty >= Decimal::ONE {
        return Ok(nominal);
    }

    let penalized = Decimal::from(nominal)
        .checked_mul(penalty)
        .and_then(|xp| xp.floor().to_u64())
        .ok_or_else(|| ProgressionError::overflow("penalized unit experience"))?;
    Ok(penalized.max(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeMap;

    use prospect_types::ResourceKind;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal_macros::dec;

    use super::*;

    /// Stone and coal at level 1 (weights 3:1), gold from level 10.
    fn sample_table() -> DropTable {
        DropTable::new(vec![
            DropEntry::new(ResourceKind::Stone, dec!(3), 10, 1, 1),
            DropEntry::new(ResourceKind::Coal, dec!(1), 20, 2, 1),
            DropEntry::new(ResourceKind::Gold, dec!(50), 30, 3, 10),
        ])
        .unwrap()
    }

    #[test]
    fn only_unlocked_entries_are_eligible() {
        let table = sample_table();
        let low = WeightedResolver::new(&table, 1, 0);
        assert!(matches!(&low, Ok(r) if r.cumulative.len() == 2 && r.total == dec!(4)));
        let high = WeightedResolver::new(&table, 10, 0);
        assert!(matches!(&high, Ok(r) if r.cumulative.len() == 3));
    }

    #[test]
    fn luck_scales_weights_proportionally() {
        let table = sample_table();
        let lucky = WeightedResolver::new(&table, 1, 50);
        assert!(matches!(&lucky, Ok(r) if r.total == dec!(6)));
    }

    #[test]
    fn select_uses_reach_or_exceed_tie_break() {
        let table = sample_table();
        let resolver = WeightedResolver::new(&table, 1, 0).unwrap();
        assert_eq!(resolver.select(dec!(0)).resource, ResourceKind::Stone);
        assert_eq!(resolver.select(dec!(3)).resource, ResourceKind::Stone);
        assert_eq!(resolver.select(dec!(3.0001)).resource, ResourceKind::Coal);
        assert_eq!(resolver.select(dec!(3.9999)).resource, ResourceKind::Coal);
    }

    #[test]
    fn out_of_range_roll_falls_back_to_lowest_level_entry() {
        let table = sample_table();
        let resolver = WeightedResolver::new(&table, 10, 0).unwrap();
        assert_eq!(resolver.select(dec!(1000)).resource, ResourceKind::Stone);
    }

    #[test]
    fn nothing_eligible_is_a_catalog_error() {
        let table = sample_table();
        assert!(WeightedResolver::new(&table, 0, 0).is_err());
    }

    #[test]
    fn draws_follow_the_weights() {
        let table = sample_table();
        let resolver = WeightedResolver::new(&table, 1, 0).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts: BTreeMap<ResourceKind, u32> = BTreeMap::new();
        for _ in 0..4000 {
            let entry = resolver.resolve(&mut rng);
            *counts.entry(entry.resource).or_insert(0) += 1;
        }
        let stone = counts.get(&ResourceKind::Stone).copied().unwrap_or(0);
        let coal = counts.get(&ResourceKind::Coal).copied().unwrap_or(0);
        assert_eq!(stone + coal, 4000);
        // Expected 3000 / 1000; allow generous slack.
        assert!((2700..=3300).contains(&stone), "stone drawn {stone} times");
        assert!(!counts.contains_key(&ResourceKind::Gold));
    }

    #[test]
    fn unit_experience_scales_with_level() {
        let cfg = LevelingConfig::default();
        let entry = DropEntry::new(ResourceKind::Iron, dec!(1), 5, 10, 1);
        // 5 * (1 + 1 * 0.05) = 5.25 -> 5
        assert_eq!(unit_experience(&entry, 1, Decimal::ONE, &cfg).ok(), Some(5));
        // 5 * (1 + 20 * 0.05) = 10
        assert_eq!(unit_experience(&entry, 20, Decimal::ONE, &cfg).ok(), Some(10));
    }

    #[test]
    fn early_penalty_never_drops_below_one() {
        let cfg = LevelingConfig::default();
        let stone = DropEntry::new(ResourceKind::Stone, dec!(1), 1, 1, 1);
        assert_eq!(unit_experience(&stone, 1, dec!(0.3), &cfg).ok(), Some(1));
        let iron = DropEntry::new(ResourceKind::Iron, dec!(1), 5, 10, 1);
        // 10 * 0.5 = 5 at level 20
        assert_eq!(unit_experience(&iron, 20, dec!(0.5), &cfg).ok(), Some(5));
    }
}
