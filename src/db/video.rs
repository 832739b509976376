//! Video storage: CRUD, filtered listing, view counting, watch history,
//! and channel analytics.

use sqlx::sqlite::SqlitePool;

use super::user::OwnerSummary;

#[derive(Clone)]
pub struct VideoStore {
    pool: SqlitePool,
}

/// A full video record.
#[derive(Debug, Clone)]
pub struct Video {
    pub id: i64,
    pub uuid: String,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub video_ref: String,
    pub thumbnail_url: String,
    pub thumbnail_ref: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: i64,
    uuid: String,
    owner_id: i64,
    title: String,
    description: String,
    video_url: String,
    video_ref: String,
    thumbnail_url: String,
    thumbnail_ref: String,
    duration: f64,
    views: i64,
    published: i64,
    created_at: String,
    updated_at: String,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            video_ref: row.video_ref,
            thumbnail_url: row.thumbnail_url,
            thumbnail_ref: row.thumbnail_ref,
            duration: row.duration,
            views: row.views,
            published: row.published != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A video joined with its owner summary, for listings.
#[derive(Debug, Clone)]
pub struct VideoListItem {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub published: bool,
    pub created_at: String,
    pub owner: OwnerSummary,
}

#[derive(sqlx::FromRow)]
struct VideoListRow {
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

impl From<VideoListRow> for VideoListItem {
    fn from(row: VideoListRow) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration: row.duration,
            views: row.views,
            published: row.published != 0,
            created_at: row.created_at,
            owner: OwnerSummary {
                uuid: row.owner_uuid,
                username: row.owner_username,
                fullname: row.owner_fullname,
                avatar_url: row.owner_avatar_url,
            },
        }
    }
}

/// A single video with owner and like metadata.
#[derive(Debug, Clone)]
pub struct VideoDetail {
    pub video: Video,
    pub owner: OwnerSummary,
    pub likes_count: i64,
    pub is_liked: bool,
}

/// Watch history entry.
#[derive(Debug, Clone)]
pub struct WatchEntry {
    pub watched_at: String,
    pub video: VideoListItem,
}

/// Sortable columns for video listings. Anything else is rejected at the
/// API boundary before reaching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSort {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    fn column(self) -> &'static str {
        match self {
            VideoSort::CreatedAt => "v.created_at",
            VideoSort::Views => "v.views",
            VideoSort::Duration => "v.duration",
            VideoSort::Title => "v.title",
        }
    }
}

/// Filter/sort/pagination parameters for the public listing.
#[derive(Debug, Clone)]
pub struct VideoQuery {
    /// Text search over title and description.
    pub q: Option<String>,
    /// Restrict to a single channel.
    pub owner_id: Option<i64>,
    /// Authenticated caller; their own drafts stay visible.
    pub viewer_id: Option<i64>,
    pub sort: VideoSort,
    pub descending: bool,
    pub limit: i64,
    pub offset: i64,
}

const LIST_SELECT: &str = "SELECT v.uuid, v.title, v.description, v.video_url, v.thumbnail_url, v.duration, v.views, v.published, v.created_at,
        u.uuid AS owner_uuid, u.username AS owner_username, u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url
     FROM videos v JOIN users u ON u.id = v.owner_id";

const VIDEO_COLUMNS: &str = "id, uuid, owner_id, title, description, video_url, video_ref, thumbnail_url, thumbnail_ref, duration, views, published, created_at, updated_at";

/// Aggregated channel statistics for the dashboard.
#[derive(Debug, Clone, Default)]
pub struct ChannelStats {
    pub total_videos: i64,
    pub published_videos: i64,
    pub draft_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_duration: f64,
    pub videos_last_30_days: i64,
    pub views_last_30_days: i64,
    pub top_video: Option<TopVideo>,
}

/// Best performing published video by views.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopVideo {
    pub uuid: String,
    pub title: String,
    pub views: i64,
    pub thumbnail_url: String,
}

/// A channel video row with engagement counts for the dashboard.
#[derive(Debug, Clone)]
pub struct ChannelVideo {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct ChannelVideoRow {
    uuid: String,
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    duration: f64,
    views: i64,
    likes_count: i64,
    comments_count: i64,
    published: i64,
    created_at: String,
    updated_at: String,
}

impl From<ChannelVideoRow> for ChannelVideo {
    fn from(row: ChannelVideoRow) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration: row.duration,
            views: row.views,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            published: row.published != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl VideoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new video (draft by default). Returns the video UUID.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        owner_id: i64,
        title: &str,
        description: &str,
        video_url: &str,
        video_ref: &str,
        thumbnail_url: &str,
        thumbnail_ref: &str,
        duration: f64,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO videos (uuid, owner_id, title, description, video_url, video_ref, thumbnail_url, thumbnail_ref, duration, published)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(&uuid)
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(video_url)
        .bind(video_ref)
        .bind(thumbnail_url)
        .bind(thumbnail_ref)
        .bind(duration)
        .execute(&self.pool)
        .await?;
        Ok(uuid)
    }

    /// Get a video by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Video>, sqlx::Error> {
        let row: Option<VideoRow> = sqlx::query_as(&format!(
            "SELECT {} FROM videos WHERE uuid = ?",
            VIDEO_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Video::from))
    }

    /// Get a video with owner summary and like metadata.
    pub async fn get_detail(
        &self,
        uuid: &str,
        viewer_id: Option<i64>,
    ) -> Result<Option<VideoDetail>, sqlx::Error> {
        let Some(video) = self.get_by_uuid(uuid).await? else {
            return Ok(None);
        };

        let owner: Option<(String, String, String, Option<String>)> =
            sqlx::query_as("SELECT uuid, username, fullname, avatar_url FROM users WHERE id = ?")
                .bind(video.owner_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((o_uuid, o_username, o_fullname, o_avatar)) = owner else {
            return Ok(None);
        };

        let likes_count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM likes WHERE target_kind = 'video' AND target_id = ?",
        )
        .bind(video.id)
        .fetch_one(&self.pool)
        .await?;

        let is_liked = match viewer_id {
            Some(viewer) => {
                let row: (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM likes WHERE target_kind = 'video' AND target_id = ? AND user_id = ?",
                )
                .bind(video.id)
                .bind(viewer)
                .fetch_one(&self.pool)
                .await?;
                row.0 > 0
            }
            None => false,
        };

        Ok(Some(VideoDetail {
            video,
            owner: OwnerSummary {
                uuid: o_uuid,
                username: o_username,
                fullname: o_fullname,
                avatar_url: o_avatar,
            },
            likes_count: likes_count.0,
            is_liked,
        }))
    }

    /// List videos with filters, sorting and pagination.
    /// Returns the page and the total matching count.
    pub async fn list(&self, query: &VideoQuery) -> Result<(Vec<VideoListItem>, i64), sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();

        match query.viewer_id {
            Some(_) => conditions.push("(v.published = 1 OR v.owner_id = ?)".to_string()),
            None => conditions.push("v.published = 1".to_string()),
        }
        if query.owner_id.is_some() {
            conditions.push("v.owner_id = ?".to_string());
        }
        if query.q.is_some() {
            conditions.push("(v.title LIKE ? OR v.description LIKE ?)".to_string());
        }

        let where_clause = format!(" WHERE {}", conditions.join(" AND "));
        let dir = if query.descending { "DESC" } else { "ASC" };
        let order = format!(
            " ORDER BY {} {}, v.id {} LIMIT ? OFFSET ?",
            query.sort.column(),
            dir,
            dir
        );

        let sql = format!("{}{}{}", LIST_SELECT, where_clause, order);
        let mut q = sqlx::query_as::<_, VideoListRow>(&sql);
        if let Some(viewer) = query.viewer_id {
            q = q.bind(viewer);
        }
        if let Some(owner) = query.owner_id {
            q = q.bind(owner);
        }
        let pattern = query.q.as_ref().map(|s| format!("%{}%", s));
        if let Some(ref p) = pattern {
            q = q.bind(p).bind(p);
        }
        let rows = q.bind(query.limit).bind(query.offset).fetch_all(&self.pool).await?;

        let count_sql = format!("SELECT COUNT(*) FROM videos v{}", where_clause);
        let mut c = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(viewer) = query.viewer_id {
            c = c.bind(viewer);
        }
        if let Some(owner) = query.owner_id {
            c = c.bind(owner);
        }
        if let Some(ref p) = pattern {
            c = c.bind(p).bind(p);
        }
        let total = c.fetch_one(&self.pool).await?.0;

        Ok((rows.into_iter().map(VideoListItem::from).collect(), total))
    }

    /// Record one read of a published video: bump the view counter and, for
    /// authenticated viewers, add a watch history entry (set semantics).
    pub async fn record_view(
        &self,
        video_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        if let Some(viewer) = viewer_id {
            sqlx::query("INSERT OR IGNORE INTO watch_history (user_id, video_id) VALUES (?, ?)")
                .bind(viewer)
                .bind(video_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Partial update of title/description/thumbnail. Returns the previous
    /// thumbnail_ref when the thumbnail was replaced.
    pub async fn update_details(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail: Option<(&str, &str)>,
    ) -> Result<Option<String>, sqlx::Error> {
        let old_ref = if thumbnail.is_some() {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT thumbnail_ref FROM videos WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            row.map(|r| r.0)
        } else {
            None
        };

        let (thumb_url, thumb_ref) = match thumbnail {
            Some((url, file_ref)) => (Some(url), Some(file_ref)),
            None => (None, None),
        };

        sqlx::query(
            "UPDATE videos SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                thumbnail_url = COALESCE(?, thumbnail_url),
                thumbnail_ref = COALESCE(?, thumbnail_ref),
                updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(thumb_url)
        .bind(thumb_ref)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(old_ref)
    }

    /// Flip the published flag. Returns the new state.
    pub async fn toggle_published(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query(
            "UPDATE videos SET published = 1 - published, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let row: (i64,) = sqlx::query_as("SELECT published FROM videos WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 != 0)
    }

    /// Delete a video and every record referencing it: likes on the video,
    /// its comments and their likes, playlist memberships, watch history.
    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM likes WHERE target_kind = 'comment'
             AND target_id IN (SELECT id FROM comments WHERE video_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM comments WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'video' AND target_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM playlist_videos WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM watch_history WHERE video_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Watch history for a user, most recent first.
    pub async fn watch_history(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<WatchEntry>, i64), sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct HistoryRow {
            watched_at: String,
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

        let rows: Vec<HistoryRow> = sqlx::query_as(
            "SELECT w.watched_at, v.uuid, v.title, v.description, v.video_url, v.thumbnail_url,
                    v.duration, v.views, v.published, v.created_at,
                    u.uuid AS owner_uuid, u.username AS owner_username,
                    u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url
             FROM watch_history w
             JOIN videos v ON v.id = w.video_id
             JOIN users u ON u.id = v.owner_id
             WHERE w.user_id = ?
             ORDER BY w.watched_at DESC, v.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM watch_history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let entries = rows
            .into_iter()
            .map(|r| WatchEntry {
                watched_at: r.watched_at,
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

        Ok((entries, total.0))
    }

    /// Aggregate channel statistics for a user's videos.
    pub async fn channel_stats(&self, owner_id: i64) -> Result<ChannelStats, sqlx::Error> {
        let totals: (i64, i64, i64, i64, f64) = sqlx::query_as(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN published = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN published = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(views), 0),
                    COALESCE(SUM(duration), 0.0)
             FROM videos WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let likes: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM likes WHERE target_kind = 'video'
             AND target_id IN (SELECT id FROM videos WHERE owner_id = ?)",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let comments: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments
             WHERE video_id IN (SELECT id FROM videos WHERE owner_id = ?)",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let recent: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(views), 0)
             FROM videos WHERE owner_id = ? AND created_at >= datetime('now', '-30 days')",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let top: Option<(String, String, i64, String)> = sqlx::query_as(
            "SELECT uuid, title, views, thumbnail_url FROM videos
             WHERE owner_id = ? AND published = 1
             ORDER BY views DESC, id DESC LIMIT 1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ChannelStats {
            total_videos: totals.0,
            published_videos: totals.1,
            draft_videos: totals.2,
            total_views: totals.3,
            total_duration: totals.4,
            total_likes: likes.0,
            total_comments: comments.0,
            videos_last_30_days: recent.0,
            views_last_30_days: recent.1,
            top_video: top.map(|(uuid, title, views, thumbnail_url)| TopVideo {
                uuid,
                title,
                views,
                thumbnail_url,
            }),
        })
    }

    /// The channel's own videos (drafts included) with engagement counts.
    pub async fn channel_videos(
        &self,
        owner_id: i64,
        published: Option<bool>,
        sort: VideoSort,
        descending: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ChannelVideo>, i64), sqlx::Error> {
        let mut where_clause = String::from(" WHERE v.owner_id = ?");
        if published.is_some() {
            where_clause.push_str(" AND v.published = ?");
        }
        let dir = if descending { "DESC" } else { "ASC" };

        let sql = format!(
            "SELECT v.uuid, v.title, v.description, v.video_url, v.thumbnail_url, v.duration,
                    v.views, v.published, v.created_at, v.updated_at,
                    (SELECT COUNT(*) FROM likes l WHERE l.target_kind = 'video' AND l.target_id = v.id) AS likes_count,
                    (SELECT COUNT(*) FROM comments c WHERE c.video_id = v.id) AS comments_count
             FROM videos v{} ORDER BY {} {}, v.id {} LIMIT ? OFFSET ?",
            where_clause,
            sort.column(),
            dir,
            dir
        );

        let mut q = sqlx::query_as::<_, ChannelVideoRow>(&sql).bind(owner_id);
        if let Some(p) = published {
            q = q.bind(p as i64);
        }
        let rows = q.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        let count_sql = format!("SELECT COUNT(*) FROM videos v{}", where_clause);
        let mut c = sqlx::query_as::<_, (i64,)>(&count_sql).bind(owner_id);
        if let Some(p) = published {
            c = c.bind(p as i64);
        }
        let total = c.fetch_one(&self.pool).await?.0;

        Ok((rows.into_iter().map(ChannelVideo::from).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::{VideoQuery, VideoSort};
    use crate::db::Database;

    async fn seed_user(db: &Database, name: &str) -> i64 {
        db.users()
            .create(
                &uuid::Uuid::new_v4().to_string(),
                name,
                &format!("{}@example.com", name),
                name,
                "digest",
            )
            .await
            .unwrap()
    }

    async fn seed_video(db: &Database, owner: i64, title: &str, published: bool) -> String {
        let uuid = db
            .videos()
            .create(
                owner,
                title,
                "about",
                "https://cdn/video.mp4",
                "videos/v",
                "https://cdn/thumb.jpg",
                "thumbs/t",
                120.0,
            )
            .await
            .unwrap();
        if published {
            let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();
            db.videos().toggle_published(video.id).await.unwrap();
        }
        uuid
    }

    fn default_query() -> VideoQuery {
        VideoQuery {
            q: None,
            owner_id: None,
            viewer_id: None,
            sort: VideoSort::CreatedAt,
            descending: true,
            limit: 10,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn test_create_starts_as_draft() {
        let db = Database::open(":memory:").await.unwrap();
        let owner = seed_user(&db, "alice").await;
        let uuid = seed_video(&db, owner, "First", false).await;

        let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();
        assert!(!video.published);
        assert_eq!(video.views, 0);
    }

    #[tokio::test]
    async fn test_list_hides_drafts_from_strangers() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        seed_video(&db, alice, "Draft", false).await;
        seed_video(&db, alice, "Published", true).await;

        let (items, total) = db.videos().list(&default_query()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "Published");

        // The owner sees their own draft
        let mut q = default_query();
        q.viewer_id = Some(alice);
        let (_, total) = db.videos().list(&q).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_list_text_search_and_sort() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        seed_video(&db, alice, "Rust tutorial", true).await;
        seed_video(&db, alice, "Cooking show", true).await;

        let mut q = default_query();
        q.q = Some("rust".to_string());
        let (items, total) = db.videos().list(&q).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "Rust tutorial");

        let mut q = default_query();
        q.sort = VideoSort::Title;
        q.descending = false;
        let (items, _) = db.videos().list(&q).await.unwrap();
        assert_eq!(items[0].title, "Cooking show");
    }

    #[tokio::test]
    async fn test_record_view_counts_every_read() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let uuid = seed_video(&db, alice, "Watched", true).await;
        let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();

        db.videos().record_view(video.id, Some(bob)).await.unwrap();
        db.videos().record_view(video.id, Some(bob)).await.unwrap();
        db.videos().record_view(video.id, None).await.unwrap();

        let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();
        assert_eq!(video.views, 3);

        // Watch history is a set: repeated views keep a single entry
        let (history, total) = db.videos().watch_history(bob, 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(history[0].video.uuid, uuid);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let uuid = seed_video(&db, alice, "Doomed", true).await;
        let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();

        let comment_uuid = db
            .comments()
            .create(video.id, bob, "nice video")
            .await
            .unwrap();
        let comment = db
            .comments()
            .get_by_uuid(&comment_uuid)
            .await
            .unwrap()
            .unwrap();

        db.likes()
            .toggle(bob, crate::db::LikeTarget::Video(video.id))
            .await
            .unwrap();
        db.likes()
            .toggle(alice, crate::db::LikeTarget::Comment(comment.id))
            .await
            .unwrap();
        db.videos().record_view(video.id, Some(bob)).await.unwrap();

        db.videos().delete(video.id).await.unwrap();

        assert!(db.videos().get_by_uuid(&uuid).await.unwrap().is_none());
        assert!(db
            .comments()
            .get_by_uuid(&comment_uuid)
            .await
            .unwrap()
            .is_none());
        let like_rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(like_rows.0, 0);
        let (_, history_total) = db.videos().watch_history(bob, 10, 0).await.unwrap();
        assert_eq!(history_total, 0);
    }

    #[tokio::test]
    async fn test_channel_stats() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let uuid = seed_video(&db, alice, "Hit", true).await;
        seed_video(&db, alice, "Draft", false).await;
        let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();

        db.videos().record_view(video.id, Some(bob)).await.unwrap();
        db.likes()
            .toggle(bob, crate::db::LikeTarget::Video(video.id))
            .await
            .unwrap();
        db.comments().create(video.id, bob, "first").await.unwrap();

        let stats = db.videos().channel_stats(alice).await.unwrap();
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.published_videos, 1);
        assert_eq!(stats.draft_videos, 1);
        assert_eq!(stats.total_views, 1);
        assert_eq!(stats.total_likes, 1);
        assert_eq!(stats.total_comments, 1);
        assert_eq!(stats.videos_last_30_days, 2);
        assert_eq!(stats.top_video.unwrap().uuid, uuid);
    }

    #[tokio::test]
    async fn test_channel_videos_status_filter() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        seed_video(&db, alice, "Live", true).await;
        seed_video(&db, alice, "Draft", false).await;

        let (all, total) = db
            .videos()
            .channel_videos(alice, None, VideoSort::CreatedAt, true, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let (drafts, total) = db
            .videos()
            .channel_videos(alice, Some(false), VideoSort::CreatedAt, true, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(drafts[0].title, "Draft");
    }
}
