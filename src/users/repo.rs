use axum::async_trait;
use sqlx::PgPool;

use super::repo_types::{ConflictCandidate, NewUser, PublicUser, UserChanges, UserRow};
use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access for the `users` table.
///
/// Writes must report unique-constraint rejections as
/// [`StoreError::UniqueViolation`]; the service relies on that signal when two
/// requests race past the conflict pre-check.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, newest id first.
    async fn list(&self) -> StoreResult<Vec<PublicUser>>;
    async fn find_public(&self, id: i64) -> StoreResult<Option<PublicUser>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRow>>;
    /// User whose email or username matches, ignoring `exclude_id`. An email
    /// match is returned ahead of a username match.
    async fn find_conflict(
        &self,
        email: &str,
        username: &str,
        exclude_id: Option<i64>,
    ) -> StoreResult<Option<ConflictCandidate>>;
    async fn insert(&self, user: NewUser) -> StoreResult<PublicUser>;
    /// `Ok(None)` when the row no longer exists.
    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<PublicUser>>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> StoreResult<Vec<PublicUser>> {
        let rows = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, username, email, created_at, updated_at
            FROM users
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_public(&self, id: i64) -> StoreResult<Option<PublicUser>> {
        let row = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, username, email, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_conflict(
        &self,
        email: &str,
        username: &str,
        exclude_id: Option<i64>,
    ) -> StoreResult<Option<ConflictCandidate>> {
        let row = sqlx::query_as::<_, ConflictCandidate>(
            r#"
            SELECT id, email, username
            FROM users
            WHERE (email = $1 OR username = $2)
              AND ($3::BIGINT IS NULL OR id <> $3)
            ORDER BY (email = $1) DESC, id
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(exclude_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<PublicUser> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            INSERT INTO users (name, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, username, email, created_at, updated_at
            "#,
        )
        .bind(user.name)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::classify)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            UPDATE users
               SET name = $2,
                   username = $3,
                   email = $4,
                   password_hash = COALESCE($5, password_hash),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, name, username, email, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(StoreError::classify)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}
