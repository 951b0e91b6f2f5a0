//! Race-safe lazy creation of records identified by a natural key.
//!
//! Two requests that first touch the same key concurrently both miss the
//! lookup and both try to insert. The store's unique constraint lets exactly
//! one insert through; the loser re-reads by key and converges on the
//! winner's record.

use crate::errors::PollError;
use std::future::Future;

/// How a keyed record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedRecord<T> {
    /// The record already existed.
    Existing(T),

    /// This call inserted the record.
    Created(T),

    /// A concurrent caller inserted the record between our lookup and our
    /// insert; this is the winner's record.
    RaceRecovered(T),
}

impl<T> KeyedRecord<T> {
    pub fn into_inner(self) -> T {
        match self {
            KeyedRecord::Existing(v) | KeyedRecord::Created(v) | KeyedRecord::RaceRecovered(v) => v,
        }
    }
}

/// Look up a record by `key`, creating it if absent.
///
/// - `find` returns `Ok(None)` when no record has the key. It may run twice.
/// - `create` returns `Ok(None)` when the insert lost a uniqueness conflict on
///   the key. Any error from `create` propagates unchanged, so guards that
///   must refuse creation return their error from there.
pub async fn get_or_create_by_key<T, Find, FindFut, Create, CreateFut>(
    key: &str,
    find: Find,
    create: Create,
) -> Result<KeyedRecord<T>, PollError>
where
    Find: Fn() -> FindFut,
    FindFut: Future<Output = Result<Option<T>, PollError>>,
    Create: FnOnce() -> CreateFut,
    CreateFut: Future<Output = Result<Option<T>, PollError>>,
{
    if let Some(existing) = find().await? {
        return Ok(KeyedRecord::Existing(existing));
    }

    if let Some(created) = create().await? {
        return Ok(KeyedRecord::Created(created));
    }

    tracing::debug!(
        target: "poll.repository.get_or_create",
        key = %key,
        "Insert lost uniqueness race, re-reading by key"
    );

    match find().await? {
        Some(winner) => Ok(KeyedRecord::RaceRecovered(winner)),
        None => {
            // Conflict reported but no row visible: the store is inconsistent
            tracing::error!(
                target: "poll.repository.get_or_create",
                key = %key,
                "Uniqueness conflict reported but no record found by key"
            );
            Err(PollError::Internal)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory keyed table with a unique key, standing in for the store.
    #[derive(Default)]
    struct Table {
        rows: Mutex<HashMap<String, i64>>,
        next_id: AtomicUsize,
        inserts: AtomicUsize,
    }

    impl Table {
        fn find(&self, key: &str) -> Option<i64> {
            self.rows.lock().unwrap().get(key).copied()
        }

        fn insert_if_absent(&self, key: &str) -> Option<i64> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(key) {
                return None;
            }
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            rows.insert(key.to_string(), id);
            Some(id)
        }
    }

    #[tokio::test]
    async fn test_returns_existing_without_insert() {
        let table = Table::default();
        table.insert_if_absent("room-a");
        let t = &table;

        let result = get_or_create_by_key(
            "room-a",
            move || async move { Ok(t.find("room-a")) },
            move || async move { Ok(t.insert_if_absent("room-a")) },
        )
        .await
        .unwrap();

        assert_eq!(result, KeyedRecord::Existing(1));
        assert_eq!(table.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_creates_when_absent() {
        let table = Table::default();
        let t = &table;

        let result = get_or_create_by_key(
            "room-b",
            move || async move { Ok(t.find("room-b")) },
            move || async move { Ok(t.insert_if_absent("room-b")) },
        )
        .await
        .unwrap();

        assert_eq!(result, KeyedRecord::Created(1));
        assert_eq!(table.find("room-b"), Some(1));
    }

    #[tokio::test]
    async fn test_lost_race_rereads_winner() {
        let table = Arc::new(Table::default());
        let finds = AtomicUsize::new(0);

        // First lookup misses; a competitor inserts before our insert runs.
        let result = get_or_create_by_key(
            "room-c",
            || {
                finds.fetch_add(1, Ordering::SeqCst);
                let found = table.find("room-c");
                async move { Ok(found) }
            },
            || {
                let winner = table.insert_if_absent("room-c");
                assert!(winner.is_some());
                let ours = table.insert_if_absent("room-c");
                async move { Ok(ours) }
            },
        )
        .await
        .unwrap();

        assert_eq!(result, KeyedRecord::RaceRecovered(1));
        assert_eq!(finds.load(Ordering::SeqCst), 2);
        assert_eq!(table.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_error_propagates_without_reread() {
        let finds = AtomicUsize::new(0);

        let result: Result<KeyedRecord<i64>, PollError> = get_or_create_by_key(
            "room-d",
            || {
                finds.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            },
            || async { Err(PollError::NotFound("no host".to_string())) },
        )
        .await;

        assert!(matches!(result, Err(PollError::NotFound(_))));
        assert_eq!(finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_conflict_without_visible_row_is_internal_error() {
        let result: Result<KeyedRecord<i64>, PollError> = get_or_create_by_key(
            "room-e",
            || async { Ok(None) },
            || async { Ok(None) },
        )
        .await;

        assert!(matches!(result, Err(PollError::Internal)));
    }

    #[tokio::test]
    async fn test_concurrent_callers_converge_on_one_record() {
        let table = Arc::new(Table::default());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                tokio::spawn(async move {
                    get_or_create_by_key(
                        "room-f",
                        || {
                            let found = table.find("room-f");
                            async move { Ok(found) }
                        },
                        || {
                            let created = table.insert_if_absent("room-f");
                            async move { Ok(created) }
                        },
                    )
                    .await
                    .unwrap()
                    .into_inner()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }

        assert!(ids.iter().all(|id| *id == 1));
        assert_eq!(table.inserts.load(Ordering::SeqCst), 1);
    }
}
