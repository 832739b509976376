//! Like storage. A like points at exactly one target: a video, a comment,
//! or a tweet; the sum type keeps that invariant out of the database's hands.

use sqlx::sqlite::SqlitePool;

use super::user::OwnerSummary;
use super::video::VideoListItem;

/// The single target of a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video(i64),
    Comment(i64),
    Tweet(i64),
}

impl LikeTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Tweet(_) => "tweet",
        }
    }

    pub fn target_id(&self) -> i64 {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => *id,
        }
    }
}

/// A liked video with the time it was liked.
#[derive(Debug, Clone)]
pub struct LikedVideo {
    pub liked_at: String,
    pub video: VideoListItem,
}

#[derive(Clone)]
pub struct LikeStore {
    pool: SqlitePool,
}

impl LikeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent flip: delete the like if present, create it otherwise.
    /// Returns true when the target is now liked.
    pub async fn toggle(&self, user_id: i64, target: LikeTarget) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM likes WHERE user_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(user_id)
        .bind(target.kind())
        .bind(target.target_id())
        .fetch_optional(&mut *tx)
        .await?;

        let liked = match existing {
            Some((id,)) => {
                sqlx::query("DELETE FROM likes WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                false
            }
            None => {
                sqlx::query("INSERT INTO likes (user_id, target_kind, target_id) VALUES (?, ?, ?)")
                    .bind(user_id)
                    .bind(target.kind())
                    .bind(target.target_id())
                    .execute(&mut *tx)
                    .await?;
                true
            }
        };

        tx.commit().await?;
        Ok(liked)
    }

    /// Whether the user currently likes the target.
    pub async fn is_liked(&self, user_id: i64, target: LikeTarget) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(user_id)
        .bind(target.kind())
        .bind(target.target_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }

    /// Number of likes on a target.
    pub async fn count_for(&self, target: LikeTarget) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM likes WHERE target_kind = ? AND target_id = ?")
                .bind(target.kind())
                .bind(target.target_id())
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    /// Videos the user has liked, most recently liked first.
    pub async fn liked_videos(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<LikedVideo>, i64), sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct LikedVideoRow {
            liked_at: String,
            uuid: String,
            title: String,
            description: String,
            video_url: String,
            thumbnail_url: String,
            duration: f64,
            views: i64,
            published: i64,
            created_at: String,
            owner_uuid: String,
            owner_username: String,
            owner_fullname: String,
            owner_avatar_url: Option<String>,
        }

        let rows: Vec<LikedVideoRow> = sqlx::query_as(
            "SELECT l.created_at AS liked_at, v.uuid, v.title, v.description, v.video_url,
                    v.thumbnail_url, v.duration, v.views, v.published, v.created_at,
                    u.uuid AS owner_uuid, u.username AS owner_username,
                    u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url
             FROM likes l
             JOIN videos v ON v.id = l.target_id
             JOIN users u ON u.id = v.owner_id
             WHERE l.user_id = ? AND l.target_kind = 'video'
             ORDER BY l.created_at DESC, l.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND target_kind = 'video'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|r| LikedVideo {
                liked_at: r.liked_at,
                video: VideoListItem {
                    uuid: r.uuid,
                    title: r.title,
                    description: r.description,
                    video_url: r.video_url,
                    thumbnail_url: r.thumbnail_url,
                    duration: r.duration,
                    views: r.views,
                    published: r.published != 0,
                    created_at: r.created_at,
                    owner: OwnerSummary {
                        uuid: r.owner_uuid,
                        username: r.owner_username,
                        fullname: r.owner_fullname,
                        avatar_url: r.owner_avatar_url,
                    },
                },
            })
            .collect();

        Ok((items, total.0))
    }
}
