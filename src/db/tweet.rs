use sqlx::sqlite::SqlitePool;

use super::user::OwnerSummary;

#[derive(Clone)]
pub struct TweetStore {
    pool: SqlitePool,
}

/// A tweet record.
#[derive(Debug, Clone)]
pub struct Tweet {
    pub id: i64,
    pub uuid: String,
    pub owner_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct TweetRow {
    id: i64,
    uuid: String,
    owner_id: i64,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<TweetRow> for Tweet {
    fn from(row: TweetRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            owner_id: row.owner_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A tweet joined with owner and like metadata.
#[derive(Debug, Clone)]
pub struct TweetWithMeta {
    pub uuid: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerSummary,
    pub likes_count: i64,
    pub is_liked: bool,
}

#[derive(sqlx::FromRow)]
struct TweetWithMetaRow {
    uuid: String,
    content: String,
    created_at: String,
    updated_at: String,
    owner_uuid: String,
    owner_username: String,
    owner_fullname: String,
    owner_avatar_url: Option<String>,
    likes_count: i64,
    is_liked: i64,
}

impl From<TweetWithMetaRow> for TweetWithMeta {
    fn from(row: TweetWithMetaRow) -> Self {
        Self {
            uuid: row.uuid,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner: OwnerSummary {
                uuid: row.owner_uuid,
                username: row.owner_username,
                fullname: row.owner_fullname,
                avatar_url: row.owner_avatar_url,
            },
            likes_count: row.likes_count,
            is_liked: row.is_liked != 0,
        }
    }
}

impl TweetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a tweet. Returns the tweet UUID.
    pub async fn create(&self, owner_id: i64, content: &str) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO tweets (uuid, owner_id, content) VALUES (?, ?, ?)")
            .bind(&uuid)
            .bind(owner_id)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(uuid)
    }

    /// Get a tweet by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Tweet>, sqlx::Error> {
        let row: Option<TweetRow> = sqlx::query_as(
            "SELECT id, uuid, owner_id, content, created_at, updated_at FROM tweets WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Tweet::from))
    }

    /// Get a tweet with owner and like metadata.
    pub async fn get_with_meta(
        &self,
        uuid: &str,
        viewer_id: Option<i64>,
    ) -> Result<Option<TweetWithMeta>, sqlx::Error> {
        let row: Option<TweetWithMetaRow> = sqlx::query_as(
            "SELECT t.uuid, t.content, t.created_at, t.updated_at,
                    u.uuid AS owner_uuid, u.username AS owner_username,
                    u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'tweet' AND l.target_id = t.id) AS likes_count,
                    EXISTS(SELECT 1 FROM likes l WHERE l.target_kind = 'tweet' AND l.target_id = t.id AND l.user_id = ?) AS is_liked
             FROM tweets t JOIN users u ON u.id = t.owner_id
             WHERE t.uuid = ?",
        )
        .bind(viewer_id.unwrap_or(-1))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TweetWithMeta::from))
    }

    /// List a user's tweets, newest first. Returns the page and total.
    pub async fn list_for_user(
        &self,
        owner_id: i64,
        viewer_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<TweetWithMeta>, i64), sqlx::Error> {
        let rows: Vec<TweetWithMetaRow> = sqlx::query_as(
            "SELECT t.uuid, t.content, t.created_at, t.updated_at,
                    u.uuid AS owner_uuid, u.username AS owner_username,
                    u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'tweet' AND l.target_id = t.id) AS likes_count,
                    EXISTS(SELECT 1 FROM likes l WHERE l.target_kind = 'tweet' AND l.target_id = t.id AND l.user_id = ?) AS is_liked
             FROM tweets t JOIN users u ON u.id = t.owner_id
             WHERE t.owner_id = ?
             ORDER BY t.created_at DESC, t.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(viewer_id.unwrap_or(-1))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tweets WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(TweetWithMeta::from).collect(), total.0))
    }

    /// Update a tweet's content.
    pub async fn update_content(&self, id: i64, content: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tweets SET content = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(content)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a tweet and any likes referencing it.
    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
