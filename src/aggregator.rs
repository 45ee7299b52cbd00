use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::player::{PlayerRecord, ProfileStats};

/// The single keyed store of player records, shared by the index crawl and
/// every profile worker. All reads and writes go through one lock.
#[derive(Debug, Default)]
pub struct Aggregator {
    players: Mutex<BTreeMap<String, PlayerRecord>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged,
    NoMatchingStub,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by name. Returns the record that was replaced, if any.
    pub fn upsert_stub(&self, stub: PlayerRecord) -> Option<PlayerRecord> {
        let mut players = self.lock();
        players.insert(stub.name.clone(), stub)
    }

    /// Replace `teams` and `season_averages` of the record named `profile.name`.
    /// Both lists change under the same lock so readers never see half a merge.
    pub fn merge_profile(&self, profile: ProfileStats) -> MergeOutcome {
        let mut players = self.lock();
        let Some(record) = players.get_mut(&profile.name) else {
            return MergeOutcome::NoMatchingStub;
        };
        record.teams = profile.teams;
        record.season_averages = profile.season_averages;
        MergeOutcome::Merged
    }

    pub fn get(&self, name: &str) -> Option<PlayerRecord> {
        self.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, PlayerRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PlayerRecord>> {
        // Every mutation is a single insert or field swap, so a poisoned map is still whole.
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
