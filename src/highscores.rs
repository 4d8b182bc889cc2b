//! High score leaderboard
//!
//! Persisted to LocalStorage, keeps the best 100 runs and displays the top 10.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_NAME_LEN, RANKING_SIZE, RANKING_STORE_CAP};
use crate::error::GameError;
use crate::persistence;
use crate::platform::display::RankRow;

/// Name recorded when the player enters none
pub const DEFAULT_NAME: &str = "unknown";

/// A finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rank {
    pub name: String,
    pub score: u32,
    /// Level reached
    pub level_name: String,
    pub date: String,
}

impl Rank {
    pub fn new(name: &str, score: u32, level_name: &str, date: &str) -> Self {
        Self {
            name: normalize_name(name),
            score,
            level_name: level_name.to_string(),
            date: date.to_string(),
        }
    }
}

/// Trim to the allowed length; empty names become [`DEFAULT_NAME`]
pub fn normalize_name(name: &str) -> String {
    let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}

/// Ranking ordered by score, highest first
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Leaderboard {
    pub ranking: Vec<Rank>,
}

impl Leaderboard {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "_gameData";

    pub fn new() -> Self {
        Self {
            ranking: Vec::new(),
        }
    }

    pub fn from_ranks(mut ranking: Vec<Rank>) -> Self {
        sort_desc(&mut ranking);
        ranking.truncate(RANKING_STORE_CAP);
        Self { ranking }
    }

    /// Append, re-sort and cap
    pub fn add(&mut self, rank: Rank) {
        self.ranking.push(rank);
        sort_desc(&mut self.ranking);
        self.ranking.truncate(RANKING_STORE_CAP);
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }

    pub fn top(&self, n: usize) -> &[Rank] {
        &self.ranking[..n.min(self.ranking.len())]
    }

    /// (min, max) used to judge a new score. The minimum only counts once the
    /// displayed board is full; both are 0 when unknown.
    pub fn min_max(&self) -> (u32, u32) {
        let min = if self.ranking.len() >= RANKING_SIZE {
            self.ranking.iter().map(|r| r.score).min().unwrap_or(0)
        } else {
            0
        };
        let max = self.ranking.iter().map(|r| r.score).max().unwrap_or(0);
        (min, max)
    }

    /// Whether a score earns a place on the board
    pub fn qualifies(&self, score: u32) -> bool {
        score > self.min_max().0
    }

    /// Table rows for display: the top entries plus the current run, if any
    pub fn rows(&self, current: Option<&Rank>) -> Vec<RankRow> {
        let mut entries: Vec<(&Rank, bool)> =
            self.top(RANKING_SIZE).iter().map(|r| (r, false)).collect();
        if let Some(current) = current {
            entries.push((current, true));
        }
        entries.sort_by(|a, b| b.0.score.cmp(&a.0.score));
        entries
            .into_iter()
            .take(RANKING_SIZE)
            .enumerate()
            .map(|(i, (rank, current))| RankRow {
                position: i + 1,
                name: rank.name.chars().take(MAX_NAME_LEN).collect(),
                level_name: rank.level_name.clone(),
                score: rank.score,
                current,
            })
            .collect()
    }

    /// Stored leaderboard, empty when nothing was saved yet
    pub fn load() -> Result<Self, GameError> {
        match persistence::read_json::<Leaderboard>(Self::STORAGE_KEY)? {
            Some(board) => {
                log::info!("Loaded {} ranks", board.len());
                Ok(Self::from_ranks(board.ranking))
            }
            None => {
                log::info!("No ranking found, starting fresh");
                Ok(Self::new())
            }
        }
    }

    pub fn save(&self) -> Result<(), GameError> {
        persistence::write_json(Self::STORAGE_KEY, self)?;
        log::info!("Ranking saved ({} entries)", self.len());
        Ok(())
    }
}

fn sort_desc(ranking: &mut [Rank]) {
    ranking.sort_by(|a, b| b.score.cmp(&a.score));
}

/// Timestamp recorded with a new rank
#[cfg(target_arch = "wasm32")]
pub fn now_string() -> String {
    String::from(js_sys::Date::new_0().to_utc_string())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_string() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("unix {}", secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rank(name: &str, score: u32) -> Rank {
        Rank::new(name, score, "1", "today")
    }

    fn full_board(scores: impl IntoIterator<Item = u32>) -> Leaderboard {
        Leaderboard::from_ranks(scores.into_iter().map(|s| rank("p", s)).collect())
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(""), "unknown");
        assert_eq!(normalize_name("   "), "unknown");
        assert_eq!(normalize_name("ada"), "ada");
        assert_eq!(normalize_name("abcdefghijklmnop"), "abcdefghijkl");
    }

    #[test]
    fn test_min_max_short_board() {
        let board = full_board([30, 10, 20]);
        // Fewer than 10 entries: any positive score qualifies
        assert_eq!(board.min_max(), (0, 30));
        assert!(board.qualifies(1));
        assert!(!board.qualifies(0));
    }

    #[test]
    fn test_min_max_full_board() {
        let board = full_board((1..=10).map(|i| i * 10));
        assert_eq!(board.min_max(), (10, 100));
        assert!(!board.qualifies(10));
        assert!(board.qualifies(11));
    }

    #[test]
    fn test_rows_mark_current_run() {
        let board = full_board((1..=10).map(|i| i * 10));
        let current = rank("me", 55);
        let rows = board.rows(Some(&current));
        assert_eq!(rows.len(), RANKING_SIZE);
        let mine = rows.iter().find(|r| r.current).expect("current row");
        assert_eq!(mine.score, 55);
        assert_eq!(mine.position, 6);
        assert_eq!(rows[0].score, 100);
        assert!(rows.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_json_shape() {
        let mut board = Leaderboard::new();
        board.add(Rank::new("ada", 42, "3", "Mon, 01 Jan 2024 00:00:00 GMT"));
        let json = serde_json::to_string(&board).expect("json");
        assert!(json.contains(r#""ranking":[{"name":"ada","score":42,"levelName":"3""#));
        let back: Leaderboard = serde_json::from_str(&json).expect("json");
        assert_eq!(back, board);
    }

    proptest! {
        #[test]
        fn prop_add_keeps_sorted_and_capped(scores in proptest::collection::vec(0u32..10_000, 0..250)) {
            let mut board = Leaderboard::new();
            for score in scores {
                board.add(rank("p", score));
                prop_assert!(board.len() <= RANKING_STORE_CAP);
                prop_assert!(board.ranking.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }
}
