use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use super::{persist, Notice};
use crate::catalog::{Difficulty, TimeMode};
use crate::classify::{classify, MistakeScheme};
use crate::error::{GameError, Result, StoreError};
use crate::generator;
use crate::notebook::record_mistake;
use crate::progress::{percent, time_challenge_stars};
use crate::question::{OperationKind, Question};
use crate::records::{Collection, MistakeKind, TimeChallengeScore};
use crate::store::{RecordStore, SortSpec, Stored};

pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimedPhase {
    #[default]
    Setup,
    Playing,
    Finished,
}

impl TimedPhase {
    fn name(&self) -> &'static str {
        match self {
            TimedPhase::Setup => "in setup",
            TimedPhase::Playing => "playing",
            TimedPhase::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimedSummary {
    pub mode: TimeMode,
    pub difficulty: Difficulty,
    pub score: u32,
    pub total_attempted: u32,
    pub accuracy: u8,
    pub max_streak: u32,
    pub stars: u8,
    pub saved: Option<Stored<TimeChallengeScore>>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimedFeedback {
    pub correct: bool,
    pub correct_answer: u32,
    pub mistake_type: Option<MistakeKind>,
    pub streak: u32,
    pub next: Question,
    pub notices: Vec<Notice>,
}

/// Answer as many questions as possible before the countdown runs out.
///
/// The countdown itself lives outside: whoever hosts the session calls
/// [`TimeChallenge::tick`] once a second while the phase is `Playing`, and
/// stops calling it as soon as the phase changes.
#[derive(Debug, Clone, Default)]
pub struct TimeChallenge {
    mode: TimeMode,
    difficulty: Difficulty,
    phase: TimedPhase,
    time_left: u32,
    score: u32,
    total_attempted: u32,
    streak: u32,
    max_streak: u32,
    current: Option<Question>,
    summary: Option<TimedSummary>,
}

impl TimeChallenge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TimedPhase {
        self.phase
    }

    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_attempted(&self) -> u32 {
        self.total_attempted
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn summary(&self) -> Option<&TimedSummary> {
        self.summary.as_ref()
    }

    pub fn accuracy(&self) -> u8 {
        percent(self.score, self.total_attempted)
    }

    pub fn stars(&self) -> u8 {
        time_challenge_stars(self.score, self.total_attempted)
    }

    fn require(&self, action: &'static str, allowed: &[TimedPhase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                phase: self.phase.name(),
            })
        }
    }

    pub fn configure(&mut self, mode: TimeMode, difficulty: Difficulty) -> Result<()> {
        self.require("change settings", &[TimedPhase::Setup])?;
        self.mode = mode;
        self.difficulty = difficulty;
        Ok(())
    }

    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Question> {
        self.require("start", &[TimedPhase::Setup, TimedPhase::Finished])?;
        let first = self.next_question(rng)?;
        self.time_left = self.mode.seconds();
        self.score = 0;
        self.total_attempted = 0;
        self.streak = 0;
        self.max_streak = 0;
        self.current = Some(first);
        self.summary = None;
        self.phase = TimedPhase::Playing;
        info!(
            mode = self.mode.as_str(),
            difficulty = self.difficulty.as_str(),
            "time challenge started"
        );
        Ok(first)
    }

    pub fn back_to_setup(&mut self) -> Result<()> {
        self.require("return to setup", &[TimedPhase::Setup, TimedPhase::Finished])?;
        self.phase = TimedPhase::Setup;
        self.current = None;
        self.summary = None;
        Ok(())
    }

    fn next_question<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Question> {
        Ok(generator::generate(
            rng,
            OperationKind::Mixed,
            self.difficulty.range(),
        )?)
    }

    pub fn submit<S, R>(
        &mut self,
        store: &mut S,
        rng: &mut R,
        user_answer: i64,
    ) -> Result<TimedFeedback>
    where
        S: RecordStore,
        R: Rng + ?Sized,
    {
        if self.phase != TimedPhase::Playing {
            return Err(GameError::NotPlaying);
        }
        let question = self.current.ok_or(GameError::NotPlaying)?;
        let next = self.next_question(rng)?;
        let correct = question.is_correct(user_answer);
        let mut notices = Vec::new();
        let mut mistake_type = None;

        self.total_attempted += 1;
        if correct {
            self.score += 1;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
        } else {
            self.streak = 0;
            let kind = classify(&question, MistakeScheme::Digits);
            mistake_type = Some(kind);
            persist(
                &mut notices,
                Collection::MistakeNote,
                record_mistake(store, &question, user_answer, kind),
            );
        }
        debug!(
            question = %question.display(),
            user_answer,
            correct,
            streak = self.streak,
            "answer"
        );

        self.current = Some(next);
        Ok(TimedFeedback {
            correct,
            correct_answer: question.answer(),
            mistake_type,
            streak: self.streak,
            next,
            notices,
        })
    }

    /// One second of the countdown. Returns the summary when this tick ends
    /// the run; does nothing outside `Playing`.
    pub fn tick<S: RecordStore>(&mut self, store: &mut S) -> Option<TimedSummary> {
        if self.phase != TimedPhase::Playing {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            Some(self.finish(store))
        } else {
            None
        }
    }

    fn finish<S: RecordStore>(&mut self, store: &mut S) -> TimedSummary {
        self.phase = TimedPhase::Finished;
        self.current = None;

        let record = TimeChallengeScore {
            mode: self.mode,
            score: self.score,
            total_attempted: self.total_attempted,
            accuracy: self.accuracy(),
            difficulty: self.difficulty,
        };
        info!(
            score = self.score,
            attempted = self.total_attempted,
            stars = self.stars(),
            "time challenge finished"
        );

        let mut notices = Vec::new();
        let saved = persist(
            &mut notices,
            Collection::TimeChallengeScore,
            store.create(record),
        );

        let summary = TimedSummary {
            mode: self.mode,
            difficulty: self.difficulty,
            score: self.score,
            total_attempted: self.total_attempted,
            accuracy: self.accuracy(),
            max_streak: self.max_streak,
            stars: self.stars(),
            saved,
            notices,
        };
        self.summary = Some(summary.clone());
        summary
    }

    /// Highest score among the top leaderboard entries for the selected
    /// mode and difficulty, 0 if there is none.
    pub fn best_score<S: RecordStore>(&self, store: &S) -> Result<u32, StoreError> {
        let top = store.list::<TimeChallengeScore>(
            Some(&SortSpec::desc("score")),
            Some(LEADERBOARD_SIZE),
        )?;
        Ok(top
            .iter()
            .find(|s| s.mode == self.mode && s.difficulty == self.difficulty)
            .map_or(0, |s| s.score))
    }
}

pub fn leaderboard<S: RecordStore>(
    store: &S,
    limit: usize,
) -> Result<Vec<Stored<TimeChallengeScore>>, StoreError> {
    store.list(Some(&SortSpec::desc("score")), Some(limit))
}
