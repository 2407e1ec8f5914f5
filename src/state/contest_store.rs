use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::types::{Address, Contest};

/// Result of replacing the stored snapshot set with a fresh one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreDiff {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Last fetched contest snapshots, keyed by contest id.
///
/// Written by the refresher and by action flows after confirmation; read by
/// API handlers. Entries are whole snapshots and are never patched in place.
pub struct ContestStore {
    contests: DashMap<u64, Contest>,
}

impl ContestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the whole set with `fresh`, dropping contests no longer returned.
    pub fn replace_all(&self, fresh: Vec<Contest>) -> StoreDiff {
        let fresh_ids: HashSet<u64> = fresh.iter().map(|c| c.id).collect();
        let stale: Vec<u64> = self
            .contests
            .iter()
            .map(|e| *e.key())
            .filter(|id| !fresh_ids.contains(id))
            .collect();

        let mut diff = StoreDiff::default();
        for id in stale {
            self.contests.remove(&id);
            diff.removed += 1;
        }
        for contest in fresh {
            match self.upsert(contest) {
                Upsert::Added => diff.added += 1,
                Upsert::Updated => diff.updated += 1,
                Upsert::Unchanged => diff.unchanged += 1,
            }
        }
        diff
    }

    pub fn upsert(&self, contest: Contest) -> Upsert {
        match self.contests.insert(contest.id, contest.clone()) {
            None => Upsert::Added,
            Some(prev) if prev == contest => Upsert::Unchanged,
            Some(_) => Upsert::Updated,
        }
    }

    pub fn get(&self, id: u64) -> Option<Contest> {
        self.contests.get(&id).map(|c| c.clone())
    }

    /// All contests, newest first (`created_at` desc, then id desc).
    pub fn all(&self) -> Vec<Contest> {
        let mut all: Vec<Contest> = self.contests.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        all
    }

    pub fn for_user(&self, user: &Address) -> Vec<Contest> {
        let mut mine = self.all();
        mine.retain(|c| c.involves(user));
        mine
    }

    pub fn for_match(&self, match_id: &str) -> Vec<Contest> {
        let mut list = self.all();
        list.retain(|c| c.match_id == match_id);
        list
    }

    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
    Unchanged,
}

impl Default for ContestStore {
    fn default() -> Self {
        Self { contests: DashMap::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest(id: u64, created_at: u64, creator: &str, match_id: &str) -> Contest {
        Contest {
            id,
            creator: Address::parse(creator).unwrap(),
            opponent: Address::zero(),
            statement: format!("contest {id}"),
            match_id: match_id.to_string(),
            stake: 1_000_000,
            odds: 1_000_000,
            contest_expiry: 2_000,
            settle_time: 3_000,
            created_at,
            updated_at: created_at,
            opponent_stake: 0,
            settled: false,
            verdict: false,
            active: true,
            cancelled: false,
            day_number: 0,
        }
    }

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn replace_all_reports_diff() {
        let store = ContestStore::new();
        let first = store.replace_all(vec![contest(1, 10, A, "m"), contest(2, 20, A, "m")]);
        assert_eq!(first, StoreDiff { added: 2, removed: 0, updated: 0, unchanged: 0 });

        let mut changed = contest(2, 20, A, "m");
        changed.active = false;
        let second = store.replace_all(vec![changed, contest(3, 30, B, "m")]);
        assert_eq!(second, StoreDiff { added: 1, removed: 1, updated: 1, unchanged: 0 });
        assert!(store.get(1).is_none());
        assert!(!store.get(2).unwrap().active);

        let third = store.replace_all(store.all());
        assert_eq!(third.unchanged, 2);
    }

    #[test]
    fn all_is_newest_first() {
        let store = ContestStore::new();
        store.replace_all(vec![contest(1, 10, A, "m"), contest(2, 30, A, "m"), contest(3, 20, A, "m")]);
        let ids: Vec<u64> = store.all().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn user_and_match_views() {
        let store = ContestStore::new();
        let mut joined = contest(2, 20, A, "x");
        joined.opponent = Address::parse(B).unwrap();
        store.replace_all(vec![contest(1, 10, A, "m"), joined, contest(3, 30, B, "m")]);

        let b = Address::parse(B).unwrap();
        let ids: Vec<u64> = store.for_user(&b).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(store.for_match("x").len(), 1);
        assert_eq!(store.len(), 3);
    }
}
