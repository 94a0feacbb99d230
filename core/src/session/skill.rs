use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::{persist, Notice};
use crate::catalog::{skill, SkillKind};
use crate::error::{GameError, Result};
use crate::generator::generate_skill;
use crate::progress::{
    advance_skill, find_skill_progress, save_skill_progress, stars_for_score, SkillAdvance,
};
use crate::question::Question;
use crate::records::{Collection, SkillProgress};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillPhase {
    #[default]
    Select,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillSummary {
    pub skill: SkillKind,
    pub level_played: u8,
    pub score: u32,
    pub total: u32,
    pub stars: u8,
    pub advance: SkillAdvance,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillFeedback {
    pub correct: bool,
    pub correct_answer: u32,
    pub summary: Option<SkillSummary>,
}

/// Five questions from one skill track at the player's current level for
/// that track.
#[derive(Debug, Clone, Default)]
pub struct SkillPractice {
    phase: SkillPhase,
    baseline: Option<SkillProgress>,
    questions: Vec<Question>,
    index: usize,
    score: u32,
    summary: Option<SkillSummary>,
}

impl SkillPractice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SkillPhase {
        self.phase
    }

    pub fn skill(&self) -> Option<SkillKind> {
        self.baseline.as_ref().map(|p| p.skill_type)
    }

    pub fn level(&self) -> Option<u8> {
        self.baseline.as_ref().map(|p| p.level)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn question_number(&self) -> usize {
        (self.index + 1).min(self.questions.len())
    }

    pub fn current(&self) -> Option<&Question> {
        match self.phase {
            SkillPhase::Playing => self.questions.get(self.index),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&SkillSummary> {
        self.summary.as_ref()
    }

    /// Begins a session for `kind`, at the level stored for it.
    ///
    /// If the stored level cannot be read the session starts at level 1 and
    /// the failure comes back as a notice.
    pub fn start<S, R>(&mut self, store: &S, rng: &mut R, kind: SkillKind) -> Result<Vec<Notice>>
    where
        S: RecordStore,
        R: Rng + ?Sized,
    {
        if self.phase == SkillPhase::Playing {
            return Err(GameError::InvalidTransition {
                action: "start a skill",
                phase: "playing",
            });
        }

        let mut notices = Vec::new();
        let baseline = persist(
            &mut notices,
            Collection::SkillProgress,
            find_skill_progress(store, kind),
        )
        .flatten()
        .map(|stored| stored.record)
        .unwrap_or_else(|| SkillProgress::new(kind));

        let config = skill(kind).level(baseline.level);
        let questions = (0..config.questions)
            .map(|_| Ok(generate_skill(rng, kind, config.range)?))
            .collect::<Result<Vec<_>>>()?;

        info!(skill = %kind, level = baseline.level, "skill practice started");
        self.phase = SkillPhase::Playing;
        self.baseline = Some(baseline);
        self.questions = questions;
        self.index = 0;
        self.score = 0;
        self.summary = None;
        Ok(notices)
    }

    pub fn submit<S: RecordStore>(
        &mut self,
        store: &mut S,
        user_answer: i64,
    ) -> Result<SkillFeedback> {
        let question = *self.current().ok_or(GameError::NotPlaying)?;
        let correct = question.is_correct(user_answer);
        debug!(question = %question.display(), user_answer, correct, "answer");

        if correct {
            self.score += 1;
        }
        self.index += 1;

        let summary = if self.index >= self.questions.len() {
            Some(self.finish(store)?)
        } else {
            None
        };

        Ok(SkillFeedback {
            correct,
            correct_answer: question.answer(),
            summary,
        })
    }

    fn finish<S: RecordStore>(&mut self, store: &mut S) -> Result<SkillSummary> {
        let baseline = self.baseline.clone().ok_or(GameError::NotPlaying)?;
        let kind = baseline.skill_type;
        let total = self.questions.len() as u32;
        let mut notices = Vec::new();

        // Totals may have moved since the session started.
        let previous = persist(
            &mut notices,
            Collection::SkillProgress,
            find_skill_progress(store, kind),
        )
        .flatten()
        .map(|stored| stored.record)
        .unwrap_or_else(|| baseline.clone());

        let advance = advance_skill(&previous, self.score, total);
        info!(
            skill = %kind,
            score = self.score,
            mastery = advance.progress.mastery_percentage,
            level = advance.progress.level,
            leveled_up = advance.leveled_up,
            "skill practice finished"
        );
        persist(
            &mut notices,
            Collection::SkillProgress,
            save_skill_progress(store, advance.progress.clone()),
        );

        let summary = SkillSummary {
            skill: kind,
            level_played: baseline.level,
            score: self.score,
            total,
            stars: stars_for_score(self.score, total),
            advance,
            notices,
        };
        self.phase = SkillPhase::Finished;
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn back_to_select(&mut self) -> Result<()> {
        if self.phase == SkillPhase::Playing {
            return Err(GameError::InvalidTransition {
                action: "return to skill selection",
                phase: "playing",
            });
        }
        self.phase = SkillPhase::Select;
        self.questions.clear();
        self.index = 0;
        Ok(())
    }
}
