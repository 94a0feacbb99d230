use serde::Serialize;
use tracing::{debug, info};

use super::{persist, Notice};
use crate::error::{GameError, Result};
use crate::notebook::{list_mistakes, MistakeFilter};
use crate::records::{Collection, MistakeNote, MistakeNotePatch};
use crate::store::{RecordStore, Stored};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub correct: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewFeedback {
    pub correct: bool,
    pub correct_answer: u32,
    pub summary: Option<ReviewSummary>,
    pub notices: Vec<Notice>,
}

/// Re-asks notebook questions one by one, marking each as practiced.
#[derive(Debug, Clone)]
pub struct MistakeReview {
    queue: Vec<Stored<MistakeNote>>,
    index: usize,
    correct: u32,
    total: u32,
}

impl MistakeReview {
    pub fn new(queue: Vec<Stored<MistakeNote>>) -> Result<Self> {
        if queue.is_empty() {
            return Err(GameError::EmptyReview);
        }
        info!(notes = queue.len(), "mistake review started");
        Ok(Self {
            queue,
            index: 0,
            correct: 0,
            total: 0,
        })
    }

    pub fn unpracticed<S: RecordStore>(store: &S, filter: MistakeFilter) -> Result<Self> {
        let queue = list_mistakes(store, filter)?
            .into_iter()
            .filter(|n| !n.practiced)
            .collect();
        Self::new(queue)
    }

    pub fn current(&self) -> Option<&Stored<MistakeNote>> {
        self.queue.get(self.index)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len() - self.index.min(self.queue.len())
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.queue.len()
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            correct: self.correct,
            total: self.total,
        }
    }

    pub fn submit<S: RecordStore>(
        &mut self,
        store: &mut S,
        user_answer: i64,
    ) -> Result<ReviewFeedback> {
        let note = self.current().ok_or(GameError::NotPlaying)?;
        let question = note.question();
        let correct = question.is_correct(user_answer);
        let patch = MistakeNotePatch {
            practiced: Some(true),
            practice_count: Some(note.practice_count + 1),
        };
        let id = note.id;
        debug!(note = id, user_answer, correct, "review answer");

        let mut notices = Vec::new();
        if let Some(updated) = persist(
            &mut notices,
            Collection::MistakeNote,
            store.update::<MistakeNote>(id, patch),
        ) {
            self.queue[self.index] = updated;
        }

        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.index += 1;

        let summary = self.is_finished().then(|| {
            info!(correct = self.correct, total = self.total, "mistake review finished");
            self.summary()
        });

        Ok(ReviewFeedback {
            correct,
            correct_answer: question.answer(),
            summary,
            notices,
        })
    }
}
