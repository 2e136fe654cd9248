//! Match storage. Each match sits behind its own mutex so concurrent actions
//! on one match serialize while different matches proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::engine::models::{MatchId, MatchState};

pub type MatchHandle = Arc<Mutex<MatchState>>;

pub trait MatchRepository: Send + Sync {
    fn get(&self, match_id: &str) -> Option<MatchHandle>;
    fn put(&self, state: MatchState) -> MatchHandle;
    fn delete(&self, match_id: &str) -> bool;
    fn ids(&self) -> Vec<MatchId>;
}

#[derive(Default)]
pub struct InMemoryMatchRepository {
    matches: DashMap<MatchId, MatchHandle>,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchRepository for InMemoryMatchRepository {
    fn get(&self, match_id: &str) -> Option<MatchHandle> {
        self.matches.get(match_id).map(|h| Arc::clone(&h))
    }

    fn put(&self, state: MatchState) -> MatchHandle {
        let id = state.id.clone();
        let handle = Arc::new(Mutex::new(state));
        self.matches.insert(id, Arc::clone(&handle));
        handle
    }

    fn delete(&self, match_id: &str) -> bool {
        self.matches.remove(match_id).is_some()
    }

    fn ids(&self) -> Vec<MatchId> {
        self.matches.iter().map(|e| e.key().clone()).collect()
    }
}
