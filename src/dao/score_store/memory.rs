//! In-process leaderboard store.
//!
//! Used as the storage backend when no database is configured, and by the
//! service tests. Per-name atomicity comes from the map's entry API, which
//! holds the shard lock for the whole compare-and-write.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures::future::BoxFuture;

use super::ScoreStore;
use crate::dao::{models::ScoreEntity, storage::StorageResult};

#[derive(Debug, Clone, Copy)]
struct StoredScore {
    score: u32,
    /// Insertion sequence, the tie-break for equal scores.
    seq: u64,
}

/// Leaderboard store backed by a concurrent in-process map.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    entries: DashMap<String, StoredScore>,
    next_seq: AtomicU64,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn submit(&self, entry: ScoreEntity) {
        let ScoreEntity { name, score } = entry;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries
            .entry(name)
            .and_modify(|stored| {
                if score > stored.score {
                    stored.score = score;
                }
            })
            .or_insert(StoredScore { score, seq });
    }

    fn ranked(&self, limit: usize) -> Vec<ScoreEntity> {
        let mut rows: Vec<(String, StoredScore)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        rows.sort_by_key(|(_, stored)| (Reverse(stored.score), stored.seq));
        rows.truncate(limit);
        rows.into_iter()
            .map(|(name, stored)| ScoreEntity {
                name,
                score: stored.score,
            })
            .collect()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn submit_if_higher(&self, entry: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.submit(entry);
        Box::pin(async { Ok(()) })
    }

    fn top_scores(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let rows = self.ranked(limit);
        Box::pin(async move { Ok(rows) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u32) -> ScoreEntity {
        ScoreEntity {
            name: name.to_owned(),
            score,
        }
    }

    #[test]
    fn stored_score_is_the_maximum_of_the_sequence() {
        let store = MemoryScoreStore::new();
        for score in [3, 9, 1, 9, 4] {
            store.submit(entry("Ana", score));
        }

        let rows = store.ranked(10);
        assert_eq!(rows, vec![entry("Ana", 9)]);
    }

    #[test]
    fn lower_or_equal_submission_is_a_silent_no_op() {
        let store = MemoryScoreStore::new();
        store.submit(entry("Ana", 5));
        store.submit(entry("Ana", 5));
        store.submit(entry("Ana", 2));

        assert_eq!(store.ranked(10), vec![entry("Ana", 5)]);
    }

    #[test]
    fn one_record_per_name_case_sensitive() {
        let store = MemoryScoreStore::new();
        store.submit(entry("ana", 1));
        store.submit(entry("Ana", 2));

        assert_eq!(store.ranked(10).len(), 2);
    }

    #[test]
    fn ranking_is_descending_and_bounded() {
        let store = MemoryScoreStore::new();
        store.submit(entry("A", 5));
        store.submit(entry("B", 9));
        store.submit(entry("C", 7));

        assert_eq!(
            store.ranked(3),
            vec![entry("B", 9), entry("C", 7), entry("A", 5)]
        );
        assert_eq!(store.ranked(2), vec![entry("B", 9), entry("C", 7)]);
    }

    #[test]
    fn ties_rank_in_submission_order() {
        let store = MemoryScoreStore::new();
        store.submit(entry("late", 7));
        store.submit(entry("later", 7));
        store.submit(entry("first", 9));

        let rows = store.ranked(10);
        assert_eq!(
            rows,
            vec![entry("first", 9), entry("late", 7), entry("later", 7)]
        );
    }

    #[test]
    fn raising_a_score_does_not_change_its_tie_break_slot() {
        let store = MemoryScoreStore::new();
        store.submit(entry("one", 3));
        store.submit(entry("two", 5));
        store.submit(entry("one", 5));

        // "one" reached 5 after "two" did, but keeps its earlier insertion
        // slot, so it still ranks first among the tie.
        assert_eq!(store.ranked(10), vec![entry("one", 5), entry("two", 5)]);
    }

    #[test]
    fn empty_store_yields_empty_ranking() {
        let store = MemoryScoreStore::new();
        assert!(store.ranked(10).is_empty());
    }
}
