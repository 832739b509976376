use sqlx::sqlite::SqlitePool;

use super::user::OwnerSummary;

#[derive(Clone)]
pub struct SubscriptionStore {
    pool: SqlitePool,
}

/// One side of a subscription edge (a subscriber or a subscribed channel).
#[derive(Debug, Clone)]
pub struct SubscriptionEntry {
    pub subscribed_at: String,
    pub user: OwnerSummary,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    subscribed_at: String,
    uuid: String,
    username: String,
    fullname: String,
    avatar_url: Option<String>,
}

impl From<EntryRow> for SubscriptionEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            subscribed_at: row.subscribed_at,
            user: OwnerSummary {
                uuid: row.uuid,
                username: row.username,
                fullname: row.fullname,
                avatar_url: row.avatar_url,
            },
        }
    }
}

impl SubscriptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent flip. Returns true when the subscription now exists.
    /// Self-subscription is rejected at the API layer before reaching here.
    pub async fn toggle(&self, subscriber_id: i64, channel_id: i64) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&mut *tx)
        .await?;

        let subscribed = match existing {
            Some((id,)) => {
                sqlx::query("DELETE FROM subscriptions WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                false
            }
            None => {
                sqlx::query(
                    "INSERT INTO subscriptions (subscriber_id, channel_id) VALUES (?, ?)",
                )
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&mut *tx)
                .await?;
                true
            }
        };

        tx.commit().await?;
        Ok(subscribed)
    }

    /// Whether the subscriber currently follows the channel.
    pub async fn is_subscribed(
        &self,
        subscriber_id: i64,
        channel_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }

    /// Number of subscribers a channel has.
    pub async fn count_subscribers(&self, channel_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    /// Number of channels a user follows.
    pub async fn count_subscriptions(&self, subscriber_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?")
                .bind(subscriber_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    /// Subscribers of a channel, newest first.
    pub async fn subscribers(
        &self,
        channel_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<SubscriptionEntry>, i64), sqlx::Error> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT s.created_at AS subscribed_at, u.uuid, u.username, u.fullname, u.avatar_url
             FROM subscriptions s JOIN users u ON u.id = s.subscriber_id
             WHERE s.channel_id = ?
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(channel_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_subscribers(channel_id).await?;
        Ok((rows.into_iter().map(SubscriptionEntry::from).collect(), total))
    }

    /// Channels a user follows, newest first.
    pub async fn subscriptions(
        &self,
        subscriber_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<SubscriptionEntry>, i64), sqlx::Error> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT s.created_at AS subscribed_at, u.uuid, u.username, u.fullname, u.avatar_url
             FROM subscriptions s JOIN users u ON u.id = s.channel_id
             WHERE s.subscriber_id = ?
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(subscriber_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_subscriptions(subscriber_id).await?;
        Ok((rows.into_iter().map(SubscriptionEntry::from).collect(), total))
    }
}

#[cfg(test)]
mod tests {
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

    #[tokio::test]
    async fn test_toggle_roundtrip() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        assert!(db.subscriptions().toggle(alice, bob).await.unwrap());
        assert!(db.subscriptions().is_subscribed(alice, bob).await.unwrap());
        assert_eq!(db.subscriptions().count_subscribers(bob).await.unwrap(), 1);

        assert!(!db.subscriptions().toggle(alice, bob).await.unwrap());
        assert!(!db.subscriptions().is_subscribed(alice, bob).await.unwrap());
        assert_eq!(db.subscriptions().count_subscribers(bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listings() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;

        db.subscriptions().toggle(alice, carol).await.unwrap();
        db.subscriptions().toggle(bob, carol).await.unwrap();

        let (subs, total) = db.subscriptions().subscribers(carol, 10, 0).await.unwrap();
        assert_eq!(total, 2);
        let names: Vec<_> = subs.iter().map(|s| s.user.username.as_str()).collect();
        assert!(names.contains(&"alice"));
        assert!(names.contains(&"bob"));

        let (channels, total) = db.subscriptions().subscriptions(alice, 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(channels[0].user.username, "carol");
    }
}
