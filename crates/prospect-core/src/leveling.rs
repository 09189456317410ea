//! Leveling: experience accumulation and level-up.
//!
//! Advancing from level N to N+1 costs `N * experience_per_level`. A single
//! large award can cross several thresholds; the loop keeps subtracting and
//! leveling until the remainder is below the next requirement, so after
//! every award `experience < experience_required(level)` holds.

use crate::config::LevelingConfig;
use crate::error::ProgressionError;

/// Experience needed to advance past `level`.
///
/// Returns `None` on overflow.
pub fn experience_required(level: u32, config: &LevelingConfig) -> Option<u64> {
    u64::from(level).checked_mul(config.experience_per_level)
}

/// Level state after an award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    /// Level after the award.
    pub level: u32,
    /// Experience left toward the next level.
    pub experience: u64,
    /// Levels gained by this award.
    pub levels_gained: u32,
}

impl LevelProgress {
    /// Whether the award crossed at least one threshold.
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Add `amount` experience to a player at `level` holding `experience`.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] if the experience total
/// or the level overflows.
pub fn award(
    level: u32,
    experience: u64,
    amount: u64,
    config: &LevelingConfig,
) -> Result<LevelProgress, ProgressionError> {
    let mut level = level.max(1);
    let mut experience = experience
        .checked_add(amount)
        .ok_or_else(|| ProgressionError::overflow("experience total"))?;
    let mut levels_gained: u32 = 0;

    loop {
        let threshold = experience_required(level, config)
            .ok_or_else(|| ProgressionError::overflow("level-up threshold"))?;
        if experience < threshold {
            break;
        }
        experience = experience
            .checked_sub(threshold)
            .ok_or_else(|| ProgressionError::overflow("experience subtraction"))?;
        level = level
            .checked_add(1)
            .ok_or_else(|| ProgressionError::overflow("level increment"))?;
        levels_gained = levels_gained
            .checked_add(1)
            .ok_or_else(|| ProgressionError::overflow("levels gained"))?;
    }

    Ok(LevelProgress {
        level,
        experience,
        levels_gained,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cfg() -> LevelingConfig {
        LevelingConfig::default()
    }

    #[test]
    fn thresholds_grow_linearly() {
        assert_eq!(experience_required(1, &cfg()), Some(100));
        assert_eq!(experience_required(2, &cfg()), Some(200));
        assert_eq!(experience_required(10, &cfg()), Some(1000));
    }

    #[test]
    fn small_award_accumulates() {
        let progress = award(1, 40, 30, &cfg()).unwrap();
        assert_eq!(progress.level, 1);
        assert_eq!(progress.experience, 70);
        assert!(!progress.leveled_up());
    }

    #[test]
    fn exact_threshold_levels_up_with_zero_left() {
        let progress = award(1, 0, 100, &cfg()).unwrap();
        assert_eq!(progress.level, 2);
        assert_eq!(progress.experience, 0);
        assert_eq!(progress.levels_gained, 1);
    }

    #[test]
    fn large_award_cascades() {
        // 100 (1->2) + 200 (2->3) + 300 (3->4) = 600, 50 left over.
        let progress = award(1, 0, 650, &cfg()).unwrap();
        assert_eq!(progress.level, 4);
        assert_eq!(progress.experience, 50);
        assert_eq!(progress.levels_gained, 3);
    }

    #[test]
    fn remainder_stays_below_requirement() {
        for amount in [0_u64, 1, 99, 100, 101, 5_000, 123_456] {
            let progress = award(3, 120, amount, &cfg()).unwrap();
            let required = experience_required(progress.level, &cfg()).unwrap();
            assert!(progress.experience < required, "amount {amount}");
            assert!(progress.level >= 3);
        }
    }

    #[test]
    fn overflowing_experience_is_an_error() {
        assert!(award(1, u64::MAX, 1, &cfg()).is_err());
    }
}
