use sqlx::sqlite::SqlitePool;

use super::user::OwnerSummary;

#[derive(Clone)]
pub struct PlaylistStore {
    pool: SqlitePool,
}

/// Playlist visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistPrivacy {
    Public,
    Private,
    Unlisted,
}

impl PlaylistPrivacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistPrivacy::Public => "public",
            PlaylistPrivacy::Private => "private",
            PlaylistPrivacy::Unlisted => "unlisted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(PlaylistPrivacy::Public),
            "private" => Some(PlaylistPrivacy::Private),
            "unlisted" => Some(PlaylistPrivacy::Unlisted),
            _ => None,
        }
    }

    fn from_db(s: &str) -> Self {
        Self::parse(s).unwrap_or(PlaylistPrivacy::Public)
    }
}

/// A playlist record.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: i64,
    pub uuid: String,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub privacy: PlaylistPrivacy,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct PlaylistRow {
    id: i64,
    uuid: String,
    owner_id: i64,
    title: String,
    description: String,
    privacy: String,
    views: i64,
    created_at: String,
    updated_at: String,
}

impl From<PlaylistRow> for Playlist {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            privacy: PlaylistPrivacy::from_db(&row.privacy),
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A playlist with owner summary and video count, for listings.
#[derive(Debug, Clone)]
pub struct PlaylistSummary {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub privacy: PlaylistPrivacy,
    pub views: i64,
    pub video_count: i64,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerSummary,
}

#[derive(sqlx::FromRow)]
struct PlaylistSummaryRow {
    uuid: String,
    title: String,
    description: String,
    privacy: String,
    views: i64,
    video_count: i64,
    created_at: String,
    updated_at: String,
    owner_uuid: String,
    owner_username: String,
    owner_fullname: String,
    owner_avatar_url: Option<String>,
}

impl From<PlaylistSummaryRow> for PlaylistSummary {
    fn from(row: PlaylistSummaryRow) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            description: row.description,
            privacy: PlaylistPrivacy::from_db(&row.privacy),
            views: row.views,
            video_count: row.video_count,
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

/// A member video inside a playlist detail view.
#[derive(Debug, Clone)]
pub struct PlaylistVideo {
    pub uuid: String,
    pub title: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: String,
    pub owner: OwnerSummary,
}

/// Full playlist detail: playlist + owner + published member videos.
#[derive(Debug, Clone)]
pub struct PlaylistDetail {
    pub playlist: Playlist,
    pub owner: OwnerSummary,
    pub videos: Vec<PlaylistVideo>,
    pub total_videos: i64,
    pub total_duration: f64,
}

const PLAYLIST_COLUMNS: &str =
    "id, uuid, owner_id, title, description, privacy, views, created_at, updated_at";

impl PlaylistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a playlist. Returns the playlist UUID.
    pub async fn create(
        &self,
        owner_id: i64,
        title: &str,
        description: &str,
        privacy: PlaylistPrivacy,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO playlists (uuid, owner_id, title, description, privacy) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&uuid)
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(privacy.as_str())
        .execute(&self.pool)
        .await?;
        Ok(uuid)
    }

    /// Get a playlist by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Playlist>, sqlx::Error> {
        let row: Option<PlaylistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM playlists WHERE uuid = ?",
            PLAYLIST_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Playlist::from))
    }

    /// List a user's playlists, most recently updated first.
    /// Non-owners only see public playlists.
    pub async fn list_for_owner(
        &self,
        owner_id: i64,
        include_non_public: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PlaylistSummary>, i64), sqlx::Error> {
        let privacy_clause = if include_non_public {
            ""
        } else {
            " AND p.privacy = 'public'"
        };

        let sql = format!(
            "SELECT p.uuid, p.title, p.description, p.privacy, p.views, p.created_at, p.updated_at,
                    (SELECT COUNT(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count,
                    u.uuid AS owner_uuid, u.username AS owner_username,
                    u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url
             FROM playlists p JOIN users u ON u.id = p.owner_id
             WHERE p.owner_id = ?{}
             ORDER BY p.updated_at DESC, p.id DESC
             LIMIT ? OFFSET ?",
            privacy_clause
        );
        let rows: Vec<PlaylistSummaryRow> = sqlx::query_as(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM playlists p WHERE p.owner_id = ?{}",
            privacy_clause
        );
        let total: (i64,) = sqlx::query_as(&count_sql)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(PlaylistSummary::from).collect(),
            total.0,
        ))
    }

    /// Full detail: playlist, owner, and its published member videos in
    /// playlist order (most recently added first).
    pub async fn detail(&self, uuid: &str) -> Result<Option<PlaylistDetail>, sqlx::Error> {
        let Some(playlist) = self.get_by_uuid(uuid).await? else {
            return Ok(None);
        };

        let owner: Option<(String, String, String, Option<String>)> =
            sqlx::query_as("SELECT uuid, username, fullname, avatar_url FROM users WHERE id = ?")
                .bind(playlist.owner_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some((o_uuid, o_username, o_fullname, o_avatar)) = owner else {
            return Ok(None);
        };

        #[derive(sqlx::FromRow)]
        struct MemberRow {
            uuid: String,
            title: String,
            thumbnail_url: String,
            duration: f64,
            views: i64,
            created_at: String,
            owner_uuid: String,
            owner_username: String,
            owner_fullname: String,
            owner_avatar_url: Option<String>,
        }

        let rows: Vec<MemberRow> = sqlx::query_as(
            "SELECT v.uuid, v.title, v.thumbnail_url, v.duration, v.views, v.created_at,
                    u.uuid AS owner_uuid, u.username AS owner_username,
                    u.fullname AS owner_fullname, u.avatar_url AS owner_avatar_url
             FROM playlist_videos pv
             JOIN videos v ON v.id = pv.video_id
             JOIN users u ON u.id = v.owner_id
             WHERE pv.playlist_id = ? AND v.published = 1
             ORDER BY pv.added_at DESC, v.id DESC",
        )
        .bind(playlist.id)
        .fetch_all(&self.pool)
        .await?;

        let videos: Vec<PlaylistVideo> = rows
            .into_iter()
            .map(|r| PlaylistVideo {
                uuid: r.uuid,
                title: r.title,
                thumbnail_url: r.thumbnail_url,
                duration: r.duration,
                views: r.views,
                created_at: r.created_at,
                owner: OwnerSummary {
                    uuid: r.owner_uuid,
                    username: r.owner_username,
                    fullname: r.owner_fullname,
                    avatar_url: r.owner_avatar_url,
                },
            })
            .collect();

        let total_videos = videos.len() as i64;
        let total_duration = videos.iter().map(|v| v.duration).sum();

        Ok(Some(PlaylistDetail {
            playlist,
            owner: OwnerSummary {
                uuid: o_uuid,
                username: o_username,
                fullname: o_fullname,
                avatar_url: o_avatar,
            },
            videos,
            total_videos,
            total_duration,
        }))
    }

    /// Whether a video is already in a playlist.
    pub async fn contains_video(
        &self,
        playlist_id: i64,
        video_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM playlist_videos WHERE playlist_id = ? AND video_id = ?",
        )
        .bind(playlist_id)
        .bind(video_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }

    /// Add a video to a playlist. Returns false if it was already present.
    pub async fn add_video(&self, playlist_id: i64, video_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id) VALUES (?, ?)",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            self.touch(playlist_id).await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Remove a video from a playlist. Returns false if it was not present.
    pub async fn remove_video(&self, playlist_id: i64, video_id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() > 0 {
            self.touch(playlist_id).await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn touch(&self, playlist_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE playlists SET updated_at = datetime('now') WHERE id = ?")
            .bind(playlist_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Partial update: only provided fields change.
    pub async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
        privacy: Option<PlaylistPrivacy>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE playlists SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                privacy = COALESCE(?, privacy),
                updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(title)
        .bind(description)
        .bind(privacy.map(|p| p.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump the view counter.
    pub async fn increment_views(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE playlists SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a playlist and its memberships.
    pub async fn delete(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Number of playlists owned by a user.
    pub async fn count_for_owner(&self, owner_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM playlists WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::PlaylistPrivacy;
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

    async fn seed_published_video(db: &Database, owner: i64, title: &str) -> i64 {
        let uuid = db
            .videos()
            .create(owner, title, "desc", "u", "r", "tu", "tr", 60.0)
            .await
            .unwrap();
        let video = db.videos().get_by_uuid(&uuid).await.unwrap().unwrap();
        db.videos().toggle_published(video.id).await.unwrap();
        video.id
    }

    #[tokio::test]
    async fn test_create_and_privacy_listing() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;

        db.playlists()
            .create(alice, "Favorites", "", PlaylistPrivacy::Public)
            .await
            .unwrap();
        db.playlists()
            .create(alice, "Secret", "", PlaylistPrivacy::Private)
            .await
            .unwrap();

        // Strangers see only the public playlist
        let (page, total) = db
            .playlists()
            .list_for_owner(alice, false, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].title, "Favorites");

        // The owner sees both
        let (_, total) = db
            .playlists()
            .list_for_owner(alice, true, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_membership_roundtrip() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let video_id = seed_published_video(&db, alice, "Clip").await;
        let uuid = db
            .playlists()
            .create(alice, "Mix", "", PlaylistPrivacy::Public)
            .await
            .unwrap();
        let playlist = db.playlists().get_by_uuid(&uuid).await.unwrap().unwrap();

        assert!(db.playlists().add_video(playlist.id, video_id).await.unwrap());
        // Duplicate add is rejected
        assert!(!db.playlists().add_video(playlist.id, video_id).await.unwrap());
        assert!(db
            .playlists()
            .contains_video(playlist.id, video_id)
            .await
            .unwrap());

        let detail = db.playlists().detail(&uuid).await.unwrap().unwrap();
        assert_eq!(detail.total_videos, 1);
        assert_eq!(detail.total_duration, 60.0);
        assert_eq!(detail.videos[0].title, "Clip");

        assert!(db
            .playlists()
            .remove_video(playlist.id, video_id)
            .await
            .unwrap());
        assert!(!db
            .playlists()
            .remove_video(playlist.id, video_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_detail_skips_unpublished_videos() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let uuid = db
            .playlists()
            .create(alice, "Mix", "", PlaylistPrivacy::Public)
            .await
            .unwrap();
        let playlist = db.playlists().get_by_uuid(&uuid).await.unwrap().unwrap();

        let draft_uuid = db
            .videos()
            .create(alice, "Draft", "desc", "u", "r", "tu", "tr", 30.0)
            .await
            .unwrap();
        let draft = db.videos().get_by_uuid(&draft_uuid).await.unwrap().unwrap();
        db.playlists().add_video(playlist.id, draft.id).await.unwrap();

        let detail = db.playlists().detail(&uuid).await.unwrap().unwrap();
        assert_eq!(detail.total_videos, 0);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let uuid = db
            .playlists()
            .create(alice, "Mix", "old", PlaylistPrivacy::Public)
            .await
            .unwrap();
        let playlist = db.playlists().get_by_uuid(&uuid).await.unwrap().unwrap();

        db.playlists()
            .update(playlist.id, None, None, Some(PlaylistPrivacy::Unlisted))
            .await
            .unwrap();

        let playlist = db.playlists().get_by_uuid(&uuid).await.unwrap().unwrap();
        assert_eq!(playlist.title, "Mix");
        assert_eq!(playlist.description, "old");
        assert_eq!(playlist.privacy, PlaylistPrivacy::Unlisted);
    }
}
