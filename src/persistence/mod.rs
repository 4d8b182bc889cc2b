//! Storage backends
//!
//! - `read_json` / `write_json`: JSON values in LocalStorage (no-ops on native)
//! - `LocalRankingStore`: leaderboard through LocalStorage
//! - `MemoryRankingStore`: shared in-memory store for tests and demos

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::GameError;
use crate::highscores::{Leaderboard, Rank};

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, GameError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
        .ok_or_else(|| GameError::Storage("localStorage unavailable".into()))
}

/// Value stored under `key`, `None` when absent
#[cfg(target_arch = "wasm32")]
pub fn read_json<T: DeserializeOwned>(key: &str) -> Result<Option<T>, GameError> {
    let json = local_storage()?
        .get_item(key)
        .map_err(|_| GameError::Storage(format!("cannot read `{}`", key)))?;
    match json {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn write_json<T: Serialize>(key: &str, value: &T) -> Result<(), GameError> {
    let json = serde_json::to_string(value)?;
    local_storage()?
        .set_item(key, &json)
        .map_err(|_| GameError::Storage(format!("cannot write `{}`", key)))
}

/// Native builds keep nothing
#[cfg(not(target_arch = "wasm32"))]
pub fn read_json<T: DeserializeOwned>(_key: &str) -> Result<Option<T>, GameError> {
    Ok(None)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write_json<T: Serialize>(_key: &str, _value: &T) -> Result<(), GameError> {
    Ok(())
}

pub trait RankingStore {
    /// Current ranking, highest score first
    fn ranking(&mut self) -> Result<Vec<Rank>, GameError>;
    /// Append, re-sort and cap
    fn add_rank(&mut self, rank: Rank) -> Result<(), GameError>;
}

/// Reads and writes the leaderboard through [`Leaderboard::load`] and [`Leaderboard::save`]
#[derive(Debug, Default)]
pub struct LocalRankingStore {
    cache: Option<Leaderboard>,
}

impl LocalRankingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingStore for LocalRankingStore {
    fn ranking(&mut self) -> Result<Vec<Rank>, GameError> {
        let board = Leaderboard::load()?;
        let ranking = board.ranking.clone();
        self.cache = Some(board);
        Ok(ranking)
    }

    fn add_rank(&mut self, rank: Rank) -> Result<(), GameError> {
        // Reload so concurrent tabs do not lose each other's ranks
        let mut board = match Leaderboard::load() {
            Ok(board) => board,
            Err(e) => {
                log::warn!("Reloading ranking failed, using cache: {}", e);
                self.cache.take().unwrap_or_default()
            }
        };
        board.add(rank);
        board.save()?;
        self.cache = Some(board);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    board: Leaderboard,
    fail: bool,
}

/// In-memory store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRankingStore {
    inner: Rc<RefCell<MemoryState>>,
}

impl MemoryRankingStore {
    pub fn with_ranks(ranks: Vec<Rank>) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().board = Leaderboard::from_ranks(ranks);
        store
    }

    pub fn snapshot(&self) -> Leaderboard {
        self.inner.borrow().board.clone()
    }

    /// Make every following call fail with a storage error
    pub fn set_failing(&self, fail: bool) {
        self.inner.borrow_mut().fail = fail;
    }
}

impl RankingStore for MemoryRankingStore {
    fn ranking(&mut self) -> Result<Vec<Rank>, GameError> {
        let state = self.inner.borrow();
        if state.fail {
            return Err(GameError::Storage("ranking unavailable".into()));
        }
        Ok(state.board.ranking.clone())
    }

    fn add_rank(&mut self, rank: Rank) -> Result<(), GameError> {
        let mut state = self.inner.borrow_mut();
        if state.fail {
            return Err(GameError::Storage("ranking unavailable".into()));
        }
        state.board.add(rank);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_shares_state() {
        let store = MemoryRankingStore::default();
        let mut handle = store.clone();
        handle.add_rank(Rank::new("a", 10, "1", "d")).expect("add");
        handle.add_rank(Rank::new("b", 30, "2", "d")).expect("add");
        let names: Vec<String> = store.snapshot().ranking.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryRankingStore::default();
        store.set_failing(true);
        assert!(matches!(store.ranking(), Err(GameError::Storage(_))));
        assert!(store.add_rank(Rank::new("a", 1, "1", "d")).is_err());
    }

    #[test]
    fn test_local_store_native_round_trip() {
        let mut store = LocalRankingStore::new();
        assert!(store.ranking().expect("ranking").is_empty());
        store.add_rank(Rank::new("a", 1, "1", "d")).expect("add");
    }
}
