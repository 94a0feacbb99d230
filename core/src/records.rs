use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{Difficulty, SkillKind, TimeMode};
use crate::question::{Operation, OperationKind, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Progress,
    SkillProgress,
    MistakeNote,
    TimeChallengeScore,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Progress => "Progress",
            Collection::SkillProgress => "SkillProgress",
            Collection::MistakeNote => "MistakeNote",
            Collection::TimeChallengeScore => "TimeChallengeScore",
        };
        f.write_str(name)
    }
}

/// A record type and the partial update it accepts.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + 'static {
    const COLLECTION: Collection;

    /// Partial record for `update`. Fields left as `None` are not touched.
    type Patch: Serialize;
}

#[derive(Debug, Clone, Copy, Serialize)]
pub enum Immutable {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub level_id: u32,
    pub stars_earned: u8,
    pub best_score: u32,
    pub completed: bool,
    pub operation_type: OperationKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars_earned: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationKind>,
}

impl From<&Progress> for ProgressPatch {
    fn from(p: &Progress) -> Self {
        Self {
            stars_earned: Some(p.stars_earned),
            best_score: Some(p.best_score),
            completed: Some(p.completed),
            operation_type: Some(p.operation_type),
        }
    }
}

impl Record for Progress {
    const COLLECTION: Collection = Collection::Progress;
    type Patch = ProgressPatch;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    pub skill_type: SkillKind,
    pub level: u8,
    pub total_correct: u32,
    pub total_attempted: u32,
    pub mastery_percentage: u8,
}

impl SkillProgress {
    pub fn new(skill_type: SkillKind) -> Self {
        Self {
            skill_type,
            level: 1,
            total_correct: 0,
            total_attempted: 0,
            mastery_percentage: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillProgressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_correct: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_attempted: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_percentage: Option<u8>,
}

impl From<&SkillProgress> for SkillProgressPatch {
    fn from(p: &SkillProgress) -> Self {
        Self {
            level: Some(p.level),
            total_correct: Some(p.total_correct),
            total_attempted: Some(p.total_attempted),
            mastery_percentage: Some(p.mastery_percentage),
        }
    }
}

impl Record for SkillProgress {
    const COLLECTION: Collection = Collection::SkillProgress;
    type Patch = SkillProgressPatch;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    Carry,
    Borrow,
    Basic,
    MixedError,
    AdditionError,
    SubtractionError,
}

impl MistakeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MistakeKind::Carry => "carry",
            MistakeKind::Borrow => "borrow",
            MistakeKind::Basic => "basic",
            MistakeKind::MixedError => "mixed_error",
            MistakeKind::AdditionError => "addition_error",
            MistakeKind::SubtractionError => "subtraction_error",
        }
    }
}

impl fmt::Display for MistakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeNote {
    pub num1: u32,
    pub num2: u32,
    pub operation: Operation,
    pub correct_answer: u32,
    pub user_answer: i64,
    pub mistake_type: MistakeKind,
    pub practiced: bool,
    pub practice_count: u32,
}

impl MistakeNote {
    pub fn new(question: &Question, user_answer: i64, mistake_type: MistakeKind) -> Self {
        Self {
            num1: question.num1,
            num2: question.num2,
            operation: question.operation,
            correct_answer: question.answer(),
            user_answer,
            mistake_type,
            practiced: false,
            practice_count: 0,
        }
    }

    pub fn question(&self) -> Question {
        Question::new(self.num1, self.num2, self.operation)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MistakeNotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practiced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_count: Option<u32>,
}

impl Record for MistakeNote {
    const COLLECTION: Collection = Collection::MistakeNote;
    type Patch = MistakeNotePatch;
}

/// Leaderboard entry for one finished time challenge. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeChallengeScore {
    pub mode: TimeMode,
    pub score: u32,
    pub total_attempted: u32,
    pub accuracy: u8,
    pub difficulty: Difficulty,
}

impl Record for TimeChallengeScore {
    const COLLECTION: Collection = Collection::TimeChallengeScore;
    type Patch = Immutable;
}
