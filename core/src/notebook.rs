use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GameError, StoreError};
use crate::question::Question;
use crate::records::{MistakeKind, MistakeNote};
use crate::store::{RecordId, RecordStore, SortSpec, Stored};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeFilter {
    #[default]
    All,
    Unpracticed,
    Practiced,
    Kind(MistakeKind),
}

impl MistakeFilter {
    pub fn matches(&self, note: &MistakeNote) -> bool {
        match self {
            MistakeFilter::All => true,
            MistakeFilter::Unpracticed => !note.practiced,
            MistakeFilter::Practiced => note.practiced,
            MistakeFilter::Kind(kind) => note.mistake_type == *kind,
        }
    }
}

impl FromStr for MistakeFilter {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s {
            "all" => MistakeFilter::All,
            "unpracticed" => MistakeFilter::Unpracticed,
            "practiced" => MistakeFilter::Practiced,
            "carry" => MistakeFilter::Kind(MistakeKind::Carry),
            "borrow" => MistakeFilter::Kind(MistakeKind::Borrow),
            "basic" => MistakeFilter::Kind(MistakeKind::Basic),
            "mixed_error" => MistakeFilter::Kind(MistakeKind::MixedError),
            "addition_error" => MistakeFilter::Kind(MistakeKind::AdditionError),
            "subtraction_error" => MistakeFilter::Kind(MistakeKind::SubtractionError),
            other => return Err(GameError::UnknownFilter(other.to_string())),
        };
        Ok(filter)
    }
}

pub fn record_mistake<S: RecordStore>(
    store: &mut S,
    question: &Question,
    user_answer: i64,
    kind: MistakeKind,
) -> Result<Stored<MistakeNote>, StoreError> {
    store.create(MistakeNote::new(question, user_answer, kind))
}

pub fn list_mistakes<S: RecordStore>(
    store: &S,
    filter: MistakeFilter,
) -> Result<Vec<Stored<MistakeNote>>, StoreError> {
    let notes = store.list::<MistakeNote>(Some(&SortSpec::desc("created_date")), None)?;
    Ok(notes.into_iter().filter(|n| filter.matches(n)).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MistakeStats {
    pub total: usize,
    pub unpracticed: usize,
    pub carry: usize,
    pub borrow: usize,
    pub basic: usize,
}

pub fn mistake_stats<S: RecordStore>(store: &S) -> Result<MistakeStats, StoreError> {
    let notes = store.list::<MistakeNote>(None, None)?;
    let count = |kind: MistakeKind| notes.iter().filter(|n| n.mistake_type == kind).count();
    Ok(MistakeStats {
        total: notes.len(),
        unpracticed: notes.iter().filter(|n| !n.practiced).count(),
        carry: count(MistakeKind::Carry),
        borrow: count(MistakeKind::Borrow),
        basic: count(MistakeKind::Basic),
    })
}

pub fn delete_mistake<S: RecordStore>(store: &mut S, id: RecordId) -> Result<(), StoreError> {
    store.delete::<MistakeNote>(id)
}

/// Deletes every note one by one. Stops at the first failure; notes already
/// deleted stay deleted.
pub fn delete_all_mistakes<S: RecordStore>(store: &mut S) -> Result<usize, StoreError> {
    let notes = store.list::<MistakeNote>(None, None)?;
    for note in &notes {
        store.delete::<MistakeNote>(note.id)?;
    }
    info!(deleted = notes.len(), "cleared mistake notebook");
    Ok(notes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MistakeNotePatch;
    use crate::store::MemoryStore;

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        record_mistake(&mut store, &Question::add(8, 5), 12, MistakeKind::Carry).unwrap();
        record_mistake(&mut store, &Question::subtract(12, 5), 8, MistakeKind::Borrow).unwrap();
        let basic =
            record_mistake(&mut store, &Question::add(2, 3), 6, MistakeKind::Basic).unwrap();
        store
            .update::<MistakeNote>(
                basic.id,
                MistakeNotePatch {
                    practiced: Some(true),
                    practice_count: Some(1),
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn filters_parse_from_names() {
        assert_eq!("all".parse::<MistakeFilter>().unwrap(), MistakeFilter::All);
        assert_eq!(
            "borrow".parse::<MistakeFilter>().unwrap(),
            MistakeFilter::Kind(MistakeKind::Borrow)
        );
        assert!(matches!(
            "later".parse::<MistakeFilter>(),
            Err(GameError::UnknownFilter(name)) if name == "later"
        ));
    }

    #[test]
    fn listing_applies_the_filter() {
        let store = seeded();
        assert_eq!(list_mistakes(&store, MistakeFilter::All).unwrap().len(), 3);
        assert_eq!(list_mistakes(&store, MistakeFilter::Unpracticed).unwrap().len(), 2);

        let practiced = list_mistakes(&store, MistakeFilter::Practiced).unwrap();
        assert_eq!(practiced.len(), 1);
        assert_eq!(practiced[0].mistake_type, MistakeKind::Basic);

        let carry = list_mistakes(&store, MistakeFilter::Kind(MistakeKind::Carry)).unwrap();
        assert_eq!(carry.len(), 1);
        assert_eq!(carry[0].correct_answer, 13);
    }

    #[test]
    fn stats_count_by_kind() {
        let stats = mistake_stats(&seeded()).unwrap();
        assert_eq!(
            stats,
            MistakeStats {
                total: 3,
                unpracticed: 2,
                carry: 1,
                borrow: 1,
                basic: 1,
            }
        );
    }

    #[test]
    fn deleting_one_and_all() {
        let mut store = seeded();
        let newest = list_mistakes(&store, MistakeFilter::All).unwrap()[0].id;
        delete_mistake(&mut store, newest).unwrap();
        assert!(delete_mistake(&mut store, newest).is_err());
        assert_eq!(delete_all_mistakes(&mut store).unwrap(), 2);
        assert_eq!(mistake_stats(&store).unwrap(), MistakeStats::default());
    }
}
