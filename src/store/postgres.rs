use sqlx::PgPool;

use crate::models::player::{Duel, Player, PlayerStats};

/// Page size shared by the match-history and user-directory queries.
pub const PAGE_SIZE: i64 = 100;

/// Offset of a zero-based directory page.
pub fn page_offset(page: u32) -> i64 {
    i64::from(page) * PAGE_SIZE
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // -- Player Operations --

    pub async fn get_player(&self, steamid: &str) -> anyhow::Result<Option<Player>> {
        let row = sqlx::query_as::<_, Player>(
            "SELECT alias, steamid, avatar FROM players WHERE steamid = $1",
        )
        .bind(steamid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn upsert_player(
        &self,
        alias: &str,
        steamid: &str,
        avatar: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO players (alias, steamid, avatar)
               VALUES ($1, $2, $3)
               ON CONFLICT (steamid) DO UPDATE SET alias = $1, avatar = $3"#,
        )
        .bind(alias)
        .bind(steamid)
        .bind(avatar)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn users_page(&self, page: u32) -> anyhow::Result<Vec<Player>> {
        let rows = sqlx::query_as::<_, Player>(
            "SELECT alias, steamid, avatar FROM players ORDER BY alias ASC LIMIT $1 OFFSET $2",
        )
        .bind(PAGE_SIZE)
        .bind(page_offset(page))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn search_players(&self, query: &str) -> anyhow::Result<Vec<Player>> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query_as::<_, Player>(
            "SELECT alias, steamid, avatar FROM players WHERE alias ILIKE $1 ORDER BY alias ASC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- Duel Operations --

    pub async fn matches_for(&self, steamid: &str) -> anyhow::Result<Vec<Duel>> {
        let rows = sqlx::query_as::<_, Duel>(
            r#"SELECT id, winner, loser, winner_score, loser_score, arena, map_name, played_at
               FROM duels
               WHERE winner = $1 OR loser = $1
               ORDER BY id DESC
               LIMIT $2"#,
        )
        .bind(steamid)
        .bind(PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn latest_matches(&self) -> anyhow::Result<Vec<Duel>> {
        let rows = sqlx::query_as::<_, Duel>(
            r#"SELECT id, winner, loser, winner_score, loser_score, arena, map_name, played_at
               FROM duels
               ORDER BY id DESC
               LIMIT $1"#,
        )
        .bind(PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- Stats Operations --

    pub async fn top10(&self) -> anyhow::Result<Vec<PlayerStats>> {
        let rows = sqlx::query_as::<_, PlayerStats>(
            r#"SELECT steamid, name, rating, wins, losses
               FROM stats
               ORDER BY rating DESC
               LIMIT 10"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
