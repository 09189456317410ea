//! Accumulation: turning idle time into a number of draws.
//!
//! A player's cooldown grows by a fixed step every ten levels, up to a cap,
//! and shrinks with speed bonuses. Collecting after a full cooldown pays a
//! fixed number of draws per cycle plus one draw per `seconds_per_draw` of
//! leftover time. Collecting early pays a progress-scaled amount and
//! carries a penalty multiplier for experience.
//!
//! All time arithmetic is in whole milliseconds. Elapsed time that would
//! be negative (clock skew) counts as zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::{CooldownConfig, ProgressionConfig};
use crate::error::ProgressionError;

const MILLIS_PER_SEC: u64 = 1000;

/// Outcome of converting elapsed time into draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulation {
    /// Draws to roll. Always at least 1.
    pub draw_count: u32,
    /// Whether the collection came before a full cooldown.
    pub early: bool,
    /// Elapsed fraction of the cooldown, capped at 1.
    pub progress_ratio: Decimal,
    /// Multiplier for per-unit experience: 1 for full collections,
    /// `max(floor, progress_ratio)` for early ones.
    pub penalty: Decimal,
    /// The cooldown that applied, in milliseconds.
    pub effective_cooldown_ms: u64,
    /// Time since the last collection, in milliseconds.
    pub elapsed_ms: u64,
}

/// Cooldown before speed bonuses, in seconds.
///
/// `base + floor(level / 10) * step`, capped at `max`.
pub fn base_cooldown_secs(level: u32, config: &CooldownConfig) -> u64 {
    let steps = u64::from(level.checked_div(10).unwrap_or(0));
    config
        .base_secs
        .saturating_add(steps.saturating_mul(config.step_secs_per_ten_levels))
        .min(config.max_secs)
}

/// Cooldown after applying `speed_pct`, in milliseconds. Never below 1.
///
/// `floor(base / (1 + speed_pct / 100))`.
pub fn effective_cooldown_ms(
    level: u32,
    speed_pct: u32,
    config: &CooldownConfig,
) -> Result<u64, ProgressionError> {
    let base_ms = base_cooldown_secs(level, config)
        .checked_mul(MILLIS_PER_SEC)
        .ok_or_else(|| ProgressionError::overflow("base cooldown in milliseconds"))?;
    let divisor = 100_u64
        .checked_add(u64::from(speed_pct))
        .ok_or_else(|| ProgressionError::overflow("speed divisor"))?;
    let effective = base_ms
        .checked_mul(100)
        .and_then(|scaled| scaled.checked_div(divisor))
        .ok_or_else(|| ProgressionError::overflow("effective cooldown"))?;
    Ok(effective.max(1))
}

/// Milliseconds from `last` to `now`, zero if `now` is earlier.
pub fn elapsed_ms(last: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(last).num_milliseconds()).unwrap_or(0)
}

/// Convert the time since `last` into draws.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] if an intermediate
/// value overflows.
pub fn accumulate(
    level: u32,
    speed_pct: u32,
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &ProgressionConfig,
) -> Result<Accumulation, ProgressionError> {
    let effective = effective_cooldown_ms(level, speed_pct, &config.cooldown)?;
    let elapsed = elapsed_ms(last, now);
    let accumulation = &config.accumulation;
    let draw_ms = accumulation
        .seconds_per_draw
        .checked_mul(MILLIS_PER_SEC)
        .ok_or_else(|| ProgressionError::overflow("draw interval in milliseconds"))?
        .max(1);

    if elapsed < effective {
        let ratio = Decimal::from(elapsed)
            .checked_div(Decimal::from(effective))
            .ok_or_else(|| ProgressionError::overflow("early progress ratio"))?;

        let min_draws = floor_to_u32(ratio, accumulation.early_min_factor)?.max(1);
        let max_draws = floor_to_u32(ratio, accumulation.early_max_factor)?.max(min_draws);
        let raw = u32::try_from(elapsed.checked_div(draw_ms).unwrap_or(0)).unwrap_or(u32::MAX);
        let draw_count = raw
            .clamp(min_draws, max_draws)
            .min(accumulation.max_draws)
            .max(1);

        let floor = Decimal::new(i64::from(accumulation.early_penalty_floor_pct), 2);
        return Ok(Accumulation {
            draw_count,
            early: true,
            progress_ratio: ratio,
            penalty: ratio.max(floor),
            effective_cooldown_ms: effective,
            elapsed_ms: elapsed,
        });
    }

    let cycles = elapsed.checked_div(effective).unwrap_or(0);
    let leftover = elapsed.checked_rem(effective).unwrap_or(0);
    let draws = cycles
        .saturating_mul(u64::from(accumulation.draws_per_cycle))
        .saturating_add(leftover.checked_div(draw_ms).unwrap_or(0))
        .min(u64::from(accumulation.max_draws));
    let draw_count = u32::try_from(draws).unwrap_or(accumulation.max_draws).max(1);

    Ok(Accumulation {
        draw_count,
        early: false,
        progress_ratio: Decimal::ONE,
        penalty: Decimal::ONE,
        effective_cooldown_ms: effective,
        elapsed_ms: elapsed,
    })
}

/// Seconds until a full cooldown will have elapsed, rounded up.
pub fn seconds_until_ready(
    level: u32,
    speed_pct: u32,
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &CooldownConfig,
) -> Result<u64, ProgressionError> {
    let effective = effective_cooldown_ms(level, speed_pct, config)?;
    let remaining = effective.saturating_sub(elapsed_ms(last, now));
    Ok(remaining.div_ceil(MILLIS_PER_SEC))
}

/// `floor(ratio * factor)` as a `u32`.
fn floor_to_u32(ratio: Decimal, factor: u32) -> Result<u32, ProgressionError> {
    ratio
        .checked_mul(Decimal::from(factor))
        .and_then(|scaled| scaled.floor().to_u32())
        .ok_or_else(|| ProgressionError::overflow("early draw bound"))
}
