use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::{persist, Notice};
use crate::catalog::{has_next_level, level_by_id, Level, QUESTIONS_PER_SESSION};
use crate::classify::{classify, MistakeScheme};
use crate::error::{GameError, Result};
use crate::generator;
use crate::notebook::record_mistake;
use crate::progress::{save_level_progress, stars_for_score};
use crate::question::Question;
use crate::records::{Collection, MistakeKind, Progress};
use crate::store::{RecordStore, Stored};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelPhase {
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    pub level_id: u32,
    pub score: u32,
    pub total: u32,
    pub stars: u8,
    pub has_next_level: bool,
    pub progress: Option<Stored<Progress>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelFeedback {
    pub correct: bool,
    pub correct_answer: u32,
    pub mistake_type: Option<MistakeKind>,
    pub summary: Option<LevelSummary>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone)]
pub struct LevelSession {
    level: &'static Level,
    questions: Vec<Question>,
    index: usize,
    score: u32,
    phase: LevelPhase,
}

impl LevelSession {
    pub fn start<R: Rng + ?Sized>(level_id: u32, rng: &mut R) -> Result<Self> {
        let level = level_by_id(level_id)?;
        let questions = Self::draw(level, rng)?;
        info!(level = level.id, "level started");
        Ok(Self {
            level,
            questions,
            index: 0,
            score: 0,
            phase: LevelPhase::Playing,
        })
    }

    fn draw<R: Rng + ?Sized>(level: &Level, rng: &mut R) -> Result<Vec<Question>> {
        (0..QUESTIONS_PER_SESSION)
            .map(|_| Ok(generator::generate(rng, level.operation, level.range)?))
            .collect()
    }

    pub fn retry<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.questions = Self::draw(self.level, rng)?;
        self.index = 0;
        self.score = 0;
        self.phase = LevelPhase::Playing;
        Ok(())
    }

    pub fn level(&self) -> &'static Level {
        self.level
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn question_number(&self) -> usize {
        (self.index + 1).min(self.questions.len())
    }

    pub fn current(&self) -> Option<&Question> {
        match self.phase {
            LevelPhase::Playing => self.questions.get(self.index),
            LevelPhase::Finished => None,
        }
    }

    pub fn stars(&self) -> u8 {
        stars_for_score(self.score, self.total())
    }

    pub fn submit<S: RecordStore>(
        &mut self,
        store: &mut S,
        user_answer: i64,
    ) -> Result<LevelFeedback> {
        let question = *self.current().ok_or(GameError::NotPlaying)?;
        let correct = question.is_correct(user_answer);
        let mut notices = Vec::new();
        let mut mistake_type = None;

        debug!(
            level = self.level.id,
            question = %question.display(),
            user_answer,
            correct,
            "answer"
        );
        if correct {
            self.score += 1;
        } else {
            let scheme = MistakeScheme::LevelKind {
                kind: self.level.operation,
            };
            let kind = classify(&question, scheme);
            mistake_type = Some(kind);
            persist(
                &mut notices,
                Collection::MistakeNote,
                record_mistake(store, &question, user_answer, kind),
            );
        }

        self.index += 1;
        let summary = if self.index >= self.questions.len() {
            Some(self.finish(store, &mut notices))
        } else {
            None
        };

        Ok(LevelFeedback {
            correct,
            correct_answer: question.answer(),
            mistake_type,
            summary,
            notices,
        })
    }

    fn finish<S: RecordStore>(
        &mut self,
        store: &mut S,
        notices: &mut Vec<Notice>,
    ) -> LevelSummary {
        self.phase = LevelPhase::Finished;
        let stars = self.stars();
        info!(level = self.level.id, score = self.score, stars, "level finished");

        let result = Progress {
            level_id: self.level.id,
            stars_earned: stars,
            best_score: self.score,
            completed: true,
            operation_type: self.level.operation,
        };
        let progress = persist(notices, Collection::Progress, save_level_progress(store, result));

        LevelSummary {
            level_id: self.level.id,
            score: self.score,
            total: self.total(),
            stars,
            has_next_level: has_next_level(self.level.id),
            progress,
        }
    }
}
