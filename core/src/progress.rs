use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{
    Level, SkillKind, LEVELS, LEVEL_UP_MASTERY, LEVEL_UP_MIN_ATTEMPTS, MAX_SKILL_LEVEL,
};
use crate::error::StoreError;
use crate::records::{Progress, ProgressPatch, SkillProgress, SkillProgressPatch};
use crate::store::{RecordStore, Stored};

pub const MAX_STARS: u8 = 3;

/// Stars for a fixed-length session: perfect is 3, each miss costs one.
pub fn stars_for_score(score: u32, total: u32) -> u8 {
    if score >= total {
        3
    } else if score + 1 >= total {
        2
    } else if score + 2 >= total {
        1
    } else {
        0
    }
}

/// Stars for a time challenge, gated on both accuracy and volume.
pub fn time_challenge_stars(score: u32, attempted: u32) -> u8 {
    // accuracy >= p  <=>  100 * score >= p * attempted
    let at_least = |pct: u32| attempted > 0 && 100 * score >= pct * attempted;
    if at_least(90) && score >= 10 {
        3
    } else if at_least(70) && score >= 5 {
        2
    } else if score >= 3 {
        1
    } else {
        0
    }
}

pub fn percent(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    let pct = (200 * part + whole) / (2 * whole);
    pct.min(100) as u8
}

fn find_level(records: &[Stored<Progress>], level_id: u32) -> Option<&Stored<Progress>> {
    records.iter().find(|p| p.level_id == level_id)
}

/// Level 1 is always open; any other level opens once the one before it is
/// completed with at least one star.
pub fn is_level_unlocked(level_id: u32, records: &[Stored<Progress>]) -> bool {
    if level_id <= 1 {
        return true;
    }
    find_level(records, level_id - 1).is_some_and(|p| p.completed && p.stars_earned >= 1)
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelStatus {
    pub level: Level,
    pub stars_earned: u8,
    pub completed: bool,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelBoard {
    pub levels: Vec<LevelStatus>,
    pub total_stars: u32,
    pub max_stars: u32,
}

impl LevelBoard {
    pub fn from_records(records: &[Stored<Progress>]) -> Self {
        let levels = LEVELS
            .iter()
            .map(|level| {
                let stored = find_level(records, level.id);
                LevelStatus {
                    level: *level,
                    stars_earned: stored.map_or(0, |p| p.stars_earned),
                    completed: stored.is_some_and(|p| p.completed),
                    unlocked: is_level_unlocked(level.id, records),
                }
            })
            .collect();

        Self {
            levels,
            total_stars: records.iter().map(|p| u32::from(p.stars_earned)).sum(),
            max_stars: LEVELS.len() as u32 * u32::from(MAX_STARS),
        }
    }

    pub fn load<S: RecordStore>(store: &S) -> Result<Self, StoreError> {
        let records = store.list::<Progress>(None, None)?;
        Ok(Self::from_records(&records))
    }

    pub fn status(&self, level_id: u32) -> Option<&LevelStatus> {
        self.levels.iter().find(|s| s.level.id == level_id)
    }
}

/// Write-if-better: a level's record only changes when the new result has
/// strictly more stars. Otherwise the stored record comes back untouched.
pub fn save_level_progress<S: RecordStore>(
    store: &mut S,
    result: Progress,
) -> Result<Stored<Progress>, StoreError> {
    let records = store.list::<Progress>(None, None)?;
    match find_level(&records, result.level_id) {
        Some(existing) if result.stars_earned > existing.stars_earned => {
            info!(
                level = result.level_id,
                from = existing.stars_earned,
                to = result.stars_earned,
                "new best for level"
            );
            store.update::<Progress>(existing.id, ProgressPatch::from(&result))
        }
        Some(existing) => {
            debug!(level = result.level_id, "kept existing progress");
            Ok(existing.clone())
        }
        None => store.create(result),
    }
}

/// Result of folding one practice session into a skill's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillAdvance {
    pub progress: SkillProgress,
    pub leveled_up: bool,
}

/// Adds a session's answers to the running totals, recomputes mastery and
/// moves up one level when mastery is at least 80% over 10 or more answers.
/// The level never goes down.
pub fn advance_skill(previous: &SkillProgress, correct: u32, attempted: u32) -> SkillAdvance {
    let total_correct = previous.total_correct + correct;
    let total_attempted = previous.total_attempted + attempted;
    let mastery_percentage = percent(total_correct, total_attempted);

    let leveled_up = mastery_percentage >= LEVEL_UP_MASTERY
        && total_attempted >= LEVEL_UP_MIN_ATTEMPTS
        && previous.level < MAX_SKILL_LEVEL;
    let level = if leveled_up {
        previous.level + 1
    } else {
        previous.level
    };

    SkillAdvance {
        progress: SkillProgress {
            skill_type: previous.skill_type,
            level,
            total_correct,
            total_attempted,
            mastery_percentage,
        },
        leveled_up,
    }
}

pub fn find_skill_progress<S: RecordStore>(
    store: &S,
    skill: SkillKind,
) -> Result<Option<Stored<SkillProgress>>, StoreError> {
    Ok(store
        .list::<SkillProgress>(None, None)?
        .into_iter()
        .find(|p| p.skill_type == skill))
}

pub fn skill_overview<S: RecordStore>(store: &S) -> Result<Vec<SkillProgress>, StoreError> {
    let records = store.list::<SkillProgress>(None, None)?;
    Ok(SkillKind::ALL
        .into_iter()
        .map(|kind| {
            records
                .iter()
                .find(|p| p.skill_type == kind)
                .map(|p| p.record.clone())
                .unwrap_or_else(|| SkillProgress::new(kind))
        })
        .collect())
}

pub fn save_skill_progress<S: RecordStore>(
    store: &mut S,
    progress: SkillProgress,
) -> Result<Stored<SkillProgress>, StoreError> {
    match find_skill_progress(store, progress.skill_type)? {
        Some(existing) => {
            store.update::<SkillProgress>(existing.id, SkillProgressPatch::from(&progress))
        }
        None => store.create(progress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::OperationKind;
    use crate::store::MemoryStore;

    fn progress(level_id: u32, stars: u8) -> Progress {
        Progress {
            level_id,
            stars_earned: stars,
            best_score: u32::from(stars) + 2,
            completed: true,
            operation_type: OperationKind::Addition,
        }
    }

    #[test]
    fn stars_per_miss() {
        assert_eq!(stars_for_score(5, 5), 3);
        assert_eq!(stars_for_score(4, 5), 2);
        assert_eq!(stars_for_score(3, 5), 1);
        assert_eq!(stars_for_score(2, 5), 0);
        assert_eq!(stars_for_score(0, 5), 0);
    }

    #[test]
    fn time_challenge_star_gates() {
        assert_eq!(time_challenge_stars(12, 13), 3);
        assert_eq!(time_challenge_stars(12, 20), 1);
        assert_eq!(time_challenge_stars(9, 9), 2);
        assert_eq!(time_challenge_stars(7, 10), 2);
        assert_eq!(time_challenge_stars(3, 30), 1);
        assert_eq!(time_challenge_stars(2, 2), 0);
        assert_eq!(time_challenge_stars(0, 0), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(8, 10), 80);
        assert_eq!(percent(12, 13), 92);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn unlocks_follow_previous_level() {
        let mut store = MemoryStore::new();
        store.create(progress(1, 2)).unwrap();
        store.create(progress(2, 0)).unwrap();
        let records = store.list::<Progress>(None, None).unwrap();

        assert!(is_level_unlocked(1, &[]));
        assert!(!is_level_unlocked(2, &[]));
        assert!(is_level_unlocked(2, &records));
        assert!(!is_level_unlocked(3, &records));
        assert!(!is_level_unlocked(4, &records));
    }

    #[test]
    fn board_totals() {
        let mut store = MemoryStore::new();
        store.create(progress(1, 3)).unwrap();
        store.create(progress(2, 1)).unwrap();
        let board = LevelBoard::load(&store).unwrap();

        assert_eq!(board.levels.len(), 9);
        assert_eq!(board.total_stars, 4);
        assert_eq!(board.max_stars, 27);
        let third = board.status(3).unwrap();
        assert!(third.unlocked);
        assert!(!third.completed);
        assert_eq!(third.stars_earned, 0);
        assert!(!board.status(4).unwrap().unlocked);
    }

    #[test]
    fn progress_is_write_if_better() {
        let mut store = MemoryStore::new();
        let first = save_level_progress(&mut store, progress(4, 2)).unwrap();

        let kept = save_level_progress(&mut store, progress(4, 1)).unwrap();
        assert_eq!(kept, first);

        let same = save_level_progress(&mut store, progress(4, 2)).unwrap();
        assert_eq!(same.id, first.id);

        let better = save_level_progress(&mut store, progress(4, 3)).unwrap();
        assert_eq!(better.id, first.id);
        assert_eq!(better.stars_earned, 3);

        let all = store.list::<Progress>(None, None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].stars_earned, 3);
    }

    #[test]
    fn level_up_needs_mastery_and_volume() {
        let prev = SkillProgress {
            skill_type: SkillKind::AddNoCarry,
            level: 1,
            total_correct: 3,
            total_attempted: 5,
            mastery_percentage: 60,
        };
        let next = advance_skill(&prev, 5, 5);
        assert_eq!(next.progress.total_correct, 8);
        assert_eq!(next.progress.total_attempted, 10);
        assert_eq!(next.progress.mastery_percentage, 80);
        assert!(next.leveled_up);
        assert_eq!(next.progress.level, 2);

        let short = SkillProgress {
            total_correct: 4,
            total_attempted: 4,
            ..prev.clone()
        };
        let next = advance_skill(&short, 5, 5);
        assert_eq!(next.progress.total_attempted, 9);
        assert_eq!(next.progress.mastery_percentage, 100);
        assert!(!next.leveled_up);
        assert_eq!(next.progress.level, 1);
    }

    #[test]
    fn level_caps_at_five_and_never_drops() {
        let top = SkillProgress {
            skill_type: SkillKind::SubTens,
            level: 5,
            total_correct: 40,
            total_attempted: 40,
            mastery_percentage: 100,
        };
        let next = advance_skill(&top, 5, 5);
        assert_eq!(next.progress.level, 5);
        assert!(!next.leveled_up);

        let mid = SkillProgress {
            level: 3,
            ..SkillProgress::new(SkillKind::AddTens)
        };
        let poor = advance_skill(&mid, 0, 5);
        assert_eq!(poor.progress.level, 3);
        assert_eq!(poor.progress.mastery_percentage, 0);
    }

    #[test]
    fn skill_progress_upserts() {
        let mut store = MemoryStore::new();
        let created =
            save_skill_progress(&mut store, SkillProgress::new(SkillKind::AddTens)).unwrap();
        let advanced = advance_skill(&created, 4, 5).progress;
        let updated = save_skill_progress(&mut store, advanced).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.total_correct, 4);

        let overview = skill_overview(&store).unwrap();
        assert_eq!(overview.len(), 6);
        let add_tens = overview
            .iter()
            .find(|p| p.skill_type == SkillKind::AddTens)
            .unwrap();
        assert_eq!(add_tens.mastery_percentage, 80);
        let other = overview
            .iter()
            .find(|p| p.skill_type == SkillKind::SubTens)
            .unwrap();
        assert_eq!(other, &SkillProgress::new(SkillKind::SubTens));
    }
}
