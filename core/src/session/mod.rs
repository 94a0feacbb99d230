mod level;
mod review;
mod skill;
mod timed;

pub use level::{LevelFeedback, LevelPhase, LevelSession, LevelSummary};
pub use review::{MistakeReview, ReviewFeedback, ReviewSummary};
pub use skill::{SkillFeedback, SkillPhase, SkillPractice, SkillSummary};
pub use timed::{
    leaderboard, TimeChallenge, TimedFeedback, TimedPhase, TimedSummary, LEADERBOARD_SIZE,
};

use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::records::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub collection: Collection,
    pub message: String,
}

pub(crate) fn persist<T>(
    notices: &mut Vec<Notice>,
    collection: Collection,
    result: Result<T, StoreError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%collection, error = %err, "could not save record");
            notices.push(Notice {
                collection,
                message: err.to_string(),
            });
            None
        }
    }
}
