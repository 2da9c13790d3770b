use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, ProfileChanges, User};
use crate::db::{PgStore, StoreError};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Whether `username` belongs to a user other than `except`.
    async fn username_taken(
        &self,
        username: &str,
        except: Option<Uuid>,
    ) -> Result<bool, StoreError>;
    /// Whether `email` belongs to a user other than `except`.
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    // Each setter writes only its own columns, so concurrent writers never revert each other.
    async fn set_token(&self, id: Uuid, token: &str) -> Result<User, StoreError>;
    async fn set_reset_token(&self, id: Uuid, reset_token: &str) -> Result<User, StoreError>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<User, StoreError>;
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, StoreError>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, created_date, token, reset_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, created_date, token, reset_token
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, created_date, token, reset_token
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, username, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, username, email, password_hash, created_date, token, reset_token
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_token(&self, id: Uuid, token: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET token = $2
             WHERE id = $1
            RETURNING id, name, username, email, password_hash, created_date, token, reset_token
            "#,
        )
        .bind(id)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_reset_token(&self, id: Uuid, reset_token: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET reset_token = $2
             WHERE id = $1
            RETURNING id, name, username, email, password_hash, created_date, token, reset_token
            "#,
        )
        .bind(id)
        .bind(reset_token)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET password_hash = $2
             WHERE id = $1
            RETURNING id, name, username, email, password_hash, created_date, token, reset_token
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   username = COALESCE($3, username),
                   email = COALESCE($4, email)
             WHERE id = $1
            RETURNING id, name, username, email, password_hash, created_date, token, reset_token
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.username)
        .bind(changes.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}
