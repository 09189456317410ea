//! The rebirth transition.
//!
//! Rebirth trades level, experience and equipment for a permanent bonus.
//! The bonus is never stored: it is recomputed from `rebirth_count` each
//! time it is needed. The inventory is left alone.

use prospect_types::{
    Gear, GearFamily, PlayerProgress, RebirthBonuses, RebirthOutcome, RebirthPreview,
};

use crate::config::RebirthConfig;
use crate::error::{ProgressionError, Requirement};

/// Bonuses currently in effect for `progress`.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] on overflow.
pub fn bonuses(
    progress: &PlayerProgress,
    config: &RebirthConfig,
) -> Result<RebirthBonuses, ProgressionError> {
    RebirthBonuses::for_rebirths(progress.rebirth_count, config.bonus_pct_per_rebirth)
        .ok_or_else(|| ProgressionError::overflow("rebirth bonus"))
}

/// What a rebirth would do, without doing it.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] on overflow.
pub fn preview(
    progress: &PlayerProgress,
    config: &RebirthConfig,
) -> Result<RebirthPreview, ProgressionError> {
    let next_count = progress
        .rebirth_count
        .checked_add(1)
        .ok_or_else(|| ProgressionError::overflow("rebirth count"))?;
    let next = RebirthBonuses::for_rebirths(next_count, config.bonus_pct_per_rebirth)
        .ok_or_else(|| ProgressionError::overflow("rebirth bonus"))?;

    Ok(RebirthPreview {
        eligible: progress.level >= config.min_level,
        required_level: config.min_level,
        current_level: progress.level,
        rebirth_count: progress.rebirth_count,
        current: bonuses(progress, config)?,
        next,
    })
}

/// Perform a rebirth in place.
///
/// On any error `progress` is left exactly as it was.
///
/// # Errors
///
/// Returns [`ProgressionError::RequirementNotMet`] below the level floor,
/// or [`ProgressionError::ArithmeticOverflow`] on overflow.
pub fn apply(
    progress: &mut PlayerProgress,
    config: &RebirthConfig,
) -> Result<RebirthOutcome, ProgressionError> {
    if progress.level < config.min_level {
        return Err(ProgressionError::RequirementNotMet(
            Requirement::RebirthLevel {
                required: config.min_level,
                current: progress.level,
            },
        ));
    }

    let rebirth_count = progress
        .rebirth_count
        .checked_add(1)
        .ok_or_else(|| ProgressionError::overflow("rebirth count"))?;
    let bonuses = RebirthBonuses::for_rebirths(rebirth_count, config.bonus_pct_per_rebirth)
        .ok_or_else(|| ProgressionError::overflow("rebirth bonus"))?;

    let previous_level = progress.level;
    progress.rebirth_count = rebirth_count;
    progress.level = 1;
    progress.experience = 0;
    progress.tool = Gear::starter(GearFamily::Tool);
    progress.container = Gear::starter(GearFamily::Container);

    Ok(RebirthOutcome {
        previous_level,
        rebirth_count,
        bonuses,
    })
}
