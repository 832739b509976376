use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// A full user record, including secret fields. Never serialized as-is;
/// API views are built from selected fields.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub avatar_ref: Option<String>,
    pub cover_url: Option<String>,
    pub cover_ref: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uuid: String,
    username: String,
    email: String,
    fullname: String,
    password_hash: String,
    avatar_url: Option<String>,
    avatar_ref: Option<String>,
    cover_url: Option<String>,
    cover_ref: Option<String>,
    refresh_token: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            username: row.username,
            email: row.email,
            fullname: row.fullname,
            password_hash: row.password_hash,
            avatar_url: row.avatar_url,
            avatar_ref: row.avatar_ref,
            cover_url: row.cover_url,
            cover_ref: row.cover_ref,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Minimal owner profile joined onto owned resources.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OwnerSummary {
    pub uuid: String,
    pub username: String,
    pub fullname: String,
    pub avatar_url: Option<String>,
}

const USER_COLUMNS: &str = "id, uuid, username, email, fullname, password_hash, avatar_url, avatar_ref, cover_url, cover_ref, refresh_token, created_at, updated_at";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Returns the user ID.
    /// username and email are expected pre-normalized (lowercased, trimmed).
    pub async fn create(
        &self,
        uuid: &str,
        username: &str,
        email: &str,
        fullname: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (uuid, username, email, fullname, password_hash) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(username)
        .bind(email)
        .bind(fullname)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE uuid = ?",
            USER_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    /// Check whether a username or email is already registered.
    pub async fn exists(&self, username: &str, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ? OR email = ?")
                .bind(username)
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Overwrite the stored refresh token (None clears it).
    /// A single document-level write: last writer wins.
    pub async fn set_refresh_token(
        &self,
        id: i64,
        token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the password hash.
    pub async fn set_password_hash(&self, id: i64, hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(hash)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Partial account update: only provided fields change.
    pub async fn update_account(
        &self,
        id: i64,
        fullname: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET
                fullname = COALESCE(?, fullname),
                email = COALESCE(?, email),
                updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(fullname)
        .bind(email)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the avatar reference. Returns the previous file_ref, if any,
    /// so the caller can clean up the old object.
    pub async fn set_avatar(
        &self,
        id: i64,
        url: &str,
        file_ref: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let old: Option<(Option<String>,)> =
            sqlx::query_as("SELECT avatar_ref FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        sqlx::query(
            "UPDATE users SET avatar_url = ?, avatar_ref = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(url)
        .bind(file_ref)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(old.and_then(|r| r.0))
    }

    /// Replace the cover image reference. Returns the previous file_ref.
    pub async fn set_cover(
        &self,
        id: i64,
        url: &str,
        file_ref: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let old: Option<(Option<String>,)> =
            sqlx::query_as("SELECT cover_ref FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        sqlx::query(
            "UPDATE users SET cover_url = ?, cover_ref = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(url)
        .bind(file_ref)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(old.and_then(|r| r.0))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .users()
            .create("uuid-1", "alice", "alice@example.com", "Alice A", "digest")
            .await
            .unwrap();

        let user = db.users().get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.uuid, "uuid-1");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.refresh_token.is_none());

        let user = db.users().get_by_uuid("uuid-1").await.unwrap().unwrap();
        assert_eq!(user.id, id);

        let user = db
            .users()
            .get_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_username_lookup_is_case_insensitive() {
        let db = Database::open(":memory:").await.unwrap();
        db.users()
            .create("uuid-1", "alice", "alice@example.com", "Alice A", "digest")
            .await
            .unwrap();

        assert!(db.users().get_by_username("ALICE").await.unwrap().is_some());
        assert!(db.users().exists("Alice", "nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users()
            .create("uuid-1", "alice", "alice@example.com", "Alice A", "digest")
            .await
            .unwrap();
        let result = db
            .users()
            .create("uuid-2", "alice", "other@example.com", "Other", "digest")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_refresh_token_overwrite_and_clear() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db
            .users()
            .create("uuid-1", "alice", "alice@example.com", "Alice A", "digest")
            .await
            .unwrap();

        db.users().set_refresh_token(id, Some("tok-1")).await.unwrap();
        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("tok-1"));

        // Overwrite replaces the single stored token
        db.users().set_refresh_token(id, Some("tok-2")).await.unwrap();
        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("tok-2"));

        // Clearing twice is fine
        db.users().set_refresh_token(id, None).await.unwrap();
        db.users().set_refresh_token(id, None).await.unwrap();
        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert!(user.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_partial_account_update() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db
            .users()
            .create("uuid-1", "alice", "alice@example.com", "Alice A", "digest")
            .await
            .unwrap();

        db.users()
            .update_account(id, Some("Alice B"), None)
            .await
            .unwrap();

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.fullname, "Alice B");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_set_avatar_returns_old_ref() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db
            .users()
            .create("uuid-1", "alice", "alice@example.com", "Alice A", "digest")
            .await
            .unwrap();

        let old = db
            .users()
            .set_avatar(id, "https://cdn/x.png", "avatars/x")
            .await
            .unwrap();
        assert!(old.is_none());

        let old = db
            .users()
            .set_avatar(id, "https://cdn/y.png", "avatars/y")
            .await
            .unwrap();
        assert_eq!(old.as_deref(), Some("avatars/x"));
    }
}
