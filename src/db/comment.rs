use sqlx::sqlite::SqlitePool;

use super::user::OwnerSummary;

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

/// A comment record.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub uuid: String,
    pub video_id: i64,
    pub owner_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    uuid: String,
    video_id: i64,
    owner_id: i64,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            video_id: row.video_id,
            owner_id: row.owner_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A comment joined with its owner summary.
#[derive(Debug, Clone)]
pub struct CommentWithOwner {
    pub uuid: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerSummary,
}

#[derive(sqlx::FromRow)]
struct CommentWithOwnerRow {
    uuid: String,
    content: String,
    created_at: String,
    updated_at: String,
    owner_uuid: String,
    owner_username: String,
    owner_fullname: String,
    owner_avatar_url: Option<String>,
}

impl From<CommentWithOwnerRow> for CommentWithOwner {
    fn from(row: CommentWithOwnerRow) -> Self {
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
        }
    }
}

const WITH_OWNER_SELECT: &str = "SELECT c.uuid, c.content, c.created_at, c.updated_at,
        u.uuid AS owner_uuid, u.username AS owner_username, u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url
     FROM comments c JOIN users u ON u.id = c.owner_id";

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a comment on a video. Returns the comment UUID.
    pub async fn create(
        &self,
        video_id: i64,
        owner_id: i64,
        content: &str,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO comments (uuid, video_id, owner_id, content) VALUES (?, ?, ?, ?)")
            .bind(&uuid)
            .bind(video_id)
            .bind(owner_id)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(uuid)
    }

    /// Get a comment by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Comment>, sqlx::Error> {
        let row: Option<CommentRow> = sqlx::query_as(
            "SELECT id, uuid, video_id, owner_id, content, created_at, updated_at
             FROM comments WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Comment::from))
    }

    /// Get a comment with its owner summary.
    pub async fn get_with_owner(&self, uuid: &str) -> Result<Option<CommentWithOwner>, sqlx::Error> {
        let sql = format!("{} WHERE c.uuid = ?", WITH_OWNER_SELECT);
        let row: Option<CommentWithOwnerRow> = sqlx::query_as(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CommentWithOwner::from))
    }

    /// List comments on a video, newest first. Returns the page and total.
    pub async fn list_for_video(
        &self,
        video_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CommentWithOwner>, i64), sqlx::Error> {
        let sql = format!(
            "{} WHERE c.video_id = ? ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?",
            WITH_OWNER_SELECT
        );
        let rows: Vec<CommentWithOwnerRow> = sqlx::query_as(&sql)
            .bind(video_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE video_id = ?")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(CommentWithOwner::from).collect(),
            total.0,
        ))
    }

    /// Update a comment's content.
    pub async fn update_content(&self, id: i64, content: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE comments SET content = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(content)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a comment and any likes referencing it.
    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'comment' AND target_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
