use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::records::{Collection, Record};

pub type RecordId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<R> {
    pub id: RecordId,
    pub created_date: DateTime<Utc>,
    #[serde(flatten)]
    pub record: R,
}

impl<R> Deref for Stored<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

/// Sort order for `list`: `"score"` is ascending, `"-score"` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(spec),
        }
    }

    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }

    fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field))
            .then_with(|| compare_values(a.get("id"), b.get("id")));
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// CRUD over named record collections.
///
/// Each call stands alone: there are no transactions and no dedup keys, so
/// a retried `create` makes a second record.
pub trait RecordStore {
    fn list<R: Record>(
        &self,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Stored<R>>, StoreError>;

    fn create<R: Record>(&mut self, record: R) -> Result<Stored<R>, StoreError>;

    fn update<R: Record>(&mut self, id: RecordId, patch: R::Patch)
        -> Result<Stored<R>, StoreError>;

    fn delete<R: Record>(&mut self, id: RecordId) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: RecordId,
    collections: HashMap<Collection, Vec<Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections.get(&collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.collections.values().all(Vec::is_empty)
    }

    fn rows(&mut self, collection: Collection) -> &mut Vec<Map<String, Value>> {
        self.collections.entry(collection).or_default()
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn row_id(row: &Map<String, Value>) -> Option<RecordId> {
    row.get("id").and_then(Value::as_u64)
}

impl RecordStore for MemoryStore {
    fn list<R: Record>(
        &self,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Stored<R>>, StoreError> {
        let mut rows: Vec<&Map<String, Value>> = self
            .collections
            .get(&R::COLLECTION)
            .map(|rows| rows.iter().collect())
            .unwrap_or_default();

        if let Some(spec) = sort {
            rows.sort_by(|a, b| spec.compare(a, b));
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }

        rows.into_iter()
            .map(|row| Ok(serde_json::from_value(Value::Object(row.clone()))?))
            .collect()
    }

    fn create<R: Record>(&mut self, record: R) -> Result<Stored<R>, StoreError> {
        self.next_id += 1;
        let stored = Stored {
            id: self.next_id,
            created_date: Utc::now(),
            record,
        };
        let row = to_object(&stored)?;
        self.rows(R::COLLECTION).push(row);
        Ok(stored)
    }

    fn update<R: Record>(
        &mut self,
        id: RecordId,
        patch: R::Patch,
    ) -> Result<Stored<R>, StoreError> {
        let fields = to_object(&patch)?;
        let row = self
            .rows(R::COLLECTION)
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or(StoreError::NotFound {
                collection: R::COLLECTION,
                id,
            })?;

        let mut merged = row.clone();
        merged.extend(fields);
        let stored: Stored<R> = serde_json::from_value(Value::Object(merged.clone()))?;
        *row = merged;
        Ok(stored)
    }

    fn delete<R: Record>(&mut self, id: RecordId) -> Result<(), StoreError> {
        let rows = self.rows(R::COLLECTION);
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));
        if rows.len() == before {
            return Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Difficulty, TimeMode};
    use crate::question::Question;
    use crate::records::{MistakeKind, MistakeNote, MistakeNotePatch, TimeChallengeScore};

    fn score(score: u32) -> TimeChallengeScore {
        TimeChallengeScore {
            mode: TimeMode::OneMinute,
            score,
            total_attempted: score + 1,
            accuracy: 90,
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let mut store = MemoryStore::new();
        let a = store.create(score(3)).unwrap();
        let b = store.create(score(5)).unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.len(Collection::TimeChallengeScore), 2);
        assert_eq!(store.len(Collection::Progress), 0);
    }

    #[test]
    fn list_sorts_and_limits() {
        let mut store = MemoryStore::new();
        for s in [4, 12, 7, 12, 1] {
            store.create(score(s)).unwrap();
        }
        let top: Vec<Stored<TimeChallengeScore>> =
            store.list(Some(&SortSpec::parse("-score")), Some(3)).unwrap();
        let scores: Vec<u32> = top.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![12, 12, 7]);
        // Ties keep the later record first when descending.
        assert!(top[0].id > top[1].id);
    }

    #[test]
    fn newest_first_by_created_date() {
        let mut store = MemoryStore::new();
        let first = store
            .create(MistakeNote::new(&Question::add(8, 5), 12, MistakeKind::Carry))
            .unwrap();
        let second = store
            .create(MistakeNote::new(&Question::subtract(12, 5), 8, MistakeKind::Borrow))
            .unwrap();
        let notes: Vec<Stored<MistakeNote>> = store
            .list(Some(&SortSpec::parse("-created_date")), None)
            .unwrap();
        assert_eq!(notes[0].id, second.id);
        assert_eq!(notes[1].id, first.id);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut store = MemoryStore::new();
        let note = store
            .create(MistakeNote::new(&Question::add(8, 5), 12, MistakeKind::Carry))
            .unwrap();
        let updated: Stored<MistakeNote> = store
            .update(
                note.id,
                MistakeNotePatch {
                    practiced: Some(true),
                    practice_count: None,
                },
            )
            .unwrap();
        assert!(updated.practiced);
        assert_eq!(updated.practice_count, 0);
        assert_eq!(updated.user_answer, 12);
        assert_eq!(updated.created_date, note.created_date);
    }

    #[test]
    fn missing_ids_are_reported() {
        let mut store = MemoryStore::new();
        let err = store
            .update::<MistakeNote>(42, MistakeNotePatch::default())
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                collection: Collection::MistakeNote,
                id: 42
            }
        ));
        assert!(store.delete::<MistakeNote>(42).is_err());
    }

    #[test]
    fn delete_removes_one_record() {
        let mut store = MemoryStore::new();
        let a = store.create(score(1)).unwrap();
        store.create(score(2)).unwrap();
        store.delete::<TimeChallengeScore>(a.id).unwrap();
        let left: Vec<Stored<TimeChallengeScore>> = store.list(None, None).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].score, 2);
    }
}
