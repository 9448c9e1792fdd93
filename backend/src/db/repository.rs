//! Database repository for blog posts, likes and donations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{BlogPost, CreateBlogPostRequest, DonationRecord, DonationType};

/// Result of toggling a visitor's like on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    /// Like count after the toggle
    pub likes: i64,
    /// `true` when the like was added, `false` when it was removed
    pub added: bool,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== BLOG OPERATIONS ====================

    /// List all posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<BlogPost>, AppError> {
        let rows = sqlx::query(
            "SELECT id, title, content, author, likes, created_at, updated_at FROM blog_posts ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Get a post by ID.
    pub async fn get_post(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let row = sqlx::query(
            "SELECT id, title, content, author, likes, created_at, updated_at FROM blog_posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Create a new post.
    pub async fn create_post(&self, request: &CreateBlogPostRequest) -> Result<BlogPost, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO blog_posts (id, title, content, author, likes, created_at, updated_at) VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&request.content)
        .bind(&request.author)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(BlogPost {
            id,
            title: request.title.clone(),
            content: request.content.clone(),
            author: request.author.clone(),
            likes: 0,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Toggle `liker`'s like on a post and return the authoritative count.
    pub async fn toggle_like(&self, post_id: &str, liker: &str) -> Result<LikeToggle, AppError> {
        let mut tx = self.pool.begin().await?;

        // The first statement must be a write: a deferred transaction that
        // starts with a read cannot take the write lock once another
        // connection has committed, and SQLite fails that with SQLITE_BUSY
        // without waiting.
        let removed = sqlx::query("DELETE FROM blog_likes WHERE post_id = ? AND liker = ?")
            .bind(post_id)
            .bind(liker)
            .execute(&mut *tx)
            .await?;

        let added = removed.rows_affected() == 0;
        if added {
            let exists = sqlx::query("SELECT 1 FROM blog_posts WHERE id = ?")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!("Blog post {} not found", post_id)));
            }

            sqlx::query("INSERT INTO blog_likes (post_id, liker, created_at) VALUES (?, ?, ?)")
                .bind(post_id)
                .bind(liker)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE blog_posts SET likes = (SELECT COUNT(*) FROM blog_likes WHERE post_id = ?) WHERE id = ?",
        )
        .bind(post_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

        let likes: i64 = sqlx::query("SELECT likes FROM blog_posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?
            .get("likes");

        tx.commit().await?;

        Ok(LikeToggle { likes, added })
    }

    // ==================== DONATION OPERATIONS ====================

    /// Record a donation attempt.
    pub async fn create_donation(&self, record: &DonationRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO donations (id, payment_intent_id, amount_cents, currency, donor_name, donor_email, donation_type, is_emergency, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.payment_intent_id)
        .bind(record.amount_cents)
        .bind(&record.currency)
        .bind(&record.donor_name)
        .bind(&record.donor_email)
        .bind(record.donation_type.as_str())
        .bind(record.is_emergency as i32)
        .bind(&record.status)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List recorded donations, newest first.
    pub async fn list_donations(&self) -> Result<Vec<DonationRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, payment_intent_id, amount_cents, currency, donor_name, donor_email, donation_type, is_emergency, status, created_at FROM donations ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(donation_from_row).collect())
    }
}

fn post_from_row(row: &SqliteRow) -> BlogPost {
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author: row.get("author"),
        likes: row.get("likes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn donation_from_row(row: &SqliteRow) -> DonationRecord {
    let donation_type: String = row.get("donation_type");
    let is_emergency: i32 = row.get("is_emergency");

    DonationRecord {
        id: row.get("id"),
        payment_intent_id: row.get("payment_intent_id"),
        amount_cents: row.get("amount_cents"),
        currency: row.get("currency"),
        donor_name: row.get("donor_name"),
        donor_email: row.get("donor_email"),
        donation_type: DonationType::parse(&donation_type).unwrap_or_default(),
        is_emergency: is_emergency != 0,
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn post_request(title: &str) -> CreateBlogPostRequest {
        CreateBlogPostRequest {
            title: title.to_string(),
            content: "Meet Biscuit, our newest resident.".to_string(),
            author: Some("Volunteer team".to_string()),
        }
    }

    #[tokio::test]
    async fn test_toggle_like_adds_then_removes() {
        let (repo, _dir) = repo().await;
        let post = repo.create_post(&post_request("Biscuit")).await.unwrap();

        let first = repo.toggle_like(&post.id, "10.0.0.1").await.unwrap();
        assert_eq!(first, LikeToggle { likes: 1, added: true });

        let other = repo.toggle_like(&post.id, "10.0.0.2").await.unwrap();
        assert_eq!(other, LikeToggle { likes: 2, added: true });

        let undo = repo.toggle_like(&post.id, "10.0.0.1").await.unwrap();
        assert_eq!(undo, LikeToggle { likes: 1, added: false });

        let stored = repo.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.likes, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_likes_are_all_counted() {
        let (repo, _dir) = repo().await;
        let post = repo.create_post(&post_request("Open house")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let repo = repo.clone();
            let post_id = post.id.clone();
            handles.push(tokio::spawn(async move {
                repo.toggle_like(&post_id, &format!("10.0.0.{}", i)).await
            }));
        }

        for handle in handles {
            let toggle = handle.await.unwrap().unwrap();
            assert!(toggle.added);
        }

        let stored = repo.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.likes, 50);
    }

    #[tokio::test]
    async fn test_toggle_like_unknown_post() {
        let (repo, _dir) = repo().await;
        let err = repo.toggle_like("missing", "10.0.0.1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_donation_round_trip() {
        let (repo, _dir) = repo().await;
        let record = DonationRecord {
            id: "don_1".into(),
            payment_intent_id: "pi_1".into(),
            amount_cents: 2500,
            currency: "usd".into(),
            donor_name: "Anonymous".into(),
            donor_email: Some("donor@example.org".into()),
            donation_type: DonationType::Monthly,
            is_emergency: true,
            status: "pending".into(),
            created_at: Utc::now().to_rfc3339(),
        };
        repo.create_donation(&record).await.unwrap();

        let listed = repo.list_donations().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount_cents, 2500);
        assert_eq!(listed[0].donation_type, DonationType::Monthly);
        assert!(listed[0].is_emergency);
    }
}
