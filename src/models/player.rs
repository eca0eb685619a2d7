use serde::{Deserialize, Serialize};

/// A registered player, keyed by Steam id.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub alias: String,
    pub steamid: String,
    pub avatar: Option<String>,
}

/// One finished duel. Timestamps are unix seconds, as written by the
/// game-server plugin.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Duel {
    pub id: i64,
    pub winner: String,
    pub loser: String,
    pub winner_score: i32,
    pub loser_score: i32,
    pub arena: String,
    pub map_name: String,
    pub played_at: i64,
}

/// Aggregate rating row for the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerStats {
    pub steamid: String,
    pub name: String,
    pub rating: i32,
    pub wins: i32,
    pub losses: i32,
}
