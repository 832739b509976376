mod comment;
mod like;
mod playlist;
mod subscription;
mod tweet;
mod user;
mod video;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use comment::{Comment, CommentStore, CommentWithOwner};
pub use like::{LikeStore, LikeTarget, LikedVideo};
pub use playlist::{
    Playlist, PlaylistDetail, PlaylistPrivacy, PlaylistStore, PlaylistSummary, PlaylistVideo,
};
pub use subscription::{SubscriptionEntry, SubscriptionStore};
pub use tweet::{Tweet, TweetStore, TweetWithMeta};
pub use user::{OwnerSummary, User, UserStore};
pub use video::{
    ChannelStats, ChannelVideo, TopVideo, Video, VideoDetail, VideoListItem, VideoQuery, VideoSort,
    VideoStore, WatchEntry,
};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        // Each pooled connection to :memory: would open its own database,
        // so the in-memory variant is capped at a single connection.
        let max_connections = if path == ":memory:" { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Users table. refresh_token holds the single active session
                // per user; rotation overwrites it, logout clears it.
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    username TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    fullname TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    avatar_url TEXT,
                    avatar_ref TEXT,
                    cover_url TEXT,
                    cover_ref TEXT,
                    refresh_token TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_uuid ON users(uuid)",
                "CREATE INDEX idx_users_username ON users(username)",
                "CREATE INDEX idx_users_email ON users(email)",
                // Videos table
                "CREATE TABLE videos (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    video_url TEXT NOT NULL,
                    video_ref TEXT NOT NULL,
                    thumbnail_url TEXT NOT NULL,
                    thumbnail_ref TEXT NOT NULL,
                    duration REAL NOT NULL DEFAULT 0,
                    views INTEGER NOT NULL DEFAULT 0,
                    published INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_videos_uuid ON videos(uuid)",
                "CREATE INDEX idx_videos_owner_id ON videos(owner_id)",
                "CREATE INDEX idx_videos_published ON videos(published)",
                // Comments table
                "CREATE TABLE comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_comments_uuid ON comments(uuid)",
                "CREATE INDEX idx_comments_video_id ON comments(video_id)",
                "CREATE INDEX idx_comments_owner_id ON comments(owner_id)",
                // Tweets table
                "CREATE TABLE tweets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_tweets_uuid ON tweets(uuid)",
                "CREATE INDEX idx_tweets_owner_id ON tweets(owner_id)",
                // Likes table. target_kind/target_id encode the tagged
                // target; the unique index is the one-like-per-target
                // invariant.
                "CREATE TABLE likes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    target_kind TEXT NOT NULL CHECK (target_kind IN ('video', 'comment', 'tweet')),
                    target_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE UNIQUE INDEX idx_likes_unique ON likes(user_id, target_kind, target_id)",
                "CREATE INDEX idx_likes_target ON likes(target_kind, target_id)",
                // Playlists table
                "CREATE TABLE playlists (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    privacy TEXT NOT NULL DEFAULT 'public' CHECK (privacy IN ('public', 'private', 'unlisted')),
                    views INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_playlists_uuid ON playlists(uuid)",
                "CREATE INDEX idx_playlists_owner_privacy ON playlists(owner_id, privacy)",
                // Playlist membership
                "CREATE TABLE playlist_videos (
                    playlist_id INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
                    video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                    added_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (playlist_id, video_id)
                )",
                "CREATE INDEX idx_playlist_videos_video ON playlist_videos(video_id)",
                // Subscriptions
                "CREATE TABLE subscriptions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    subscriber_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    channel_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE UNIQUE INDEX idx_subscriptions_unique ON subscriptions(subscriber_id, channel_id)",
                "CREATE INDEX idx_subscriptions_channel ON subscriptions(channel_id)",
                // Watch history, set semantics per (user, video)
                "CREATE TABLE watch_history (
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                    watched_at TEXT NOT NULL DEFAULT (datetime('now')),
                    PRIMARY KEY (user_id, video_id)
                )",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the video store.
    pub fn videos(&self) -> VideoStore {
        VideoStore::new(self.pool.clone())
    }

    /// Get the comment store.
    pub fn comments(&self) -> CommentStore {
        CommentStore::new(self.pool.clone())
    }

    /// Get the tweet store.
    pub fn tweets(&self) -> TweetStore {
        TweetStore::new(self.pool.clone())
    }

    /// Get the like store.
    pub fn likes(&self) -> LikeStore {
        LikeStore::new(self.pool.clone())
    }

    /// Get the playlist store.
    pub fn playlists(&self) -> PlaylistStore {
        PlaylistStore::new(self.pool.clone())
    }

    /// Get the subscription store.
    pub fn subscriptions(&self) -> SubscriptionStore {
        SubscriptionStore::new(self.pool.clone())
    }

    /// Ping the database (healthcheck).
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
