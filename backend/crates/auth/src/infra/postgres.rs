//! PostgreSQL Store Implementation

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{role::Role, user::User};
use crate::domain::repository::{RoleStore, UserStore};
use crate::domain::value_object::{
    lifecycle::Lifecycle, reset_token::ResetToken, totp_secret::TotpSecret, user_id::UserId,
};
use crate::error::{AuthError, AuthResult};
use platform::password::HashedPassword;

/// PostgreSQL-backed user/role store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_user(&self, row: UserRow) -> AuthResult<User> {
        let role_ids = sqlx::query_scalar::<_, i64>(
            "SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id",
        )
        .bind(row.user_id)
        .fetch_all(&self.pool)
        .await?;

        let account_ids = sqlx::query_scalar::<_, i64>(
            "SELECT account_id FROM user_accounts WHERE user_id = $1 ORDER BY account_id",
        )
        .bind(row.user_id)
        .fetch_all(&self.pool)
        .await?;

        row.into_user(role_ids, account_ids)
    }

    async fn fetch_user(&self, query: &str, bind: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }
}

const USER_COLUMNS: &str = r#"
    user_id,
    username,
    email,
    password_hash,
    enabled,
    totp_secret,
    reset_token,
    reset_expires_at,
    removed_at,
    created_at,
    updated_at
"#;

/// Row mapped from the users table
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    enabled: bool,
    totp_secret: Option<String>,
    reset_token: Option<String>,
    reset_expires_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, role_ids: Vec<i64>, account_ids: Vec<i64>) -> AuthResult<User> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let totp_secret = self
            .totp_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(AuthError::from)?;

        // A token without its expiry is treated as absent
        let reset_token = match (self.reset_token, self.reset_expires_at) {
            (Some(token), Some(expires_at)) => Some(ResetToken::from_parts(token, expires_at)),
            _ => None,
        };

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            username: self.username,
            email: self.email,
            password_hash,
            enabled: self.enabled,
            totp_secret,
            reset_token,
            lifecycle: Lifecycle::from_removed_at(self.removed_at),
            role_ids,
            account_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// ============================================================================
// User Store Implementation
// ============================================================================

impl UserStore for PgStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                username,
                email,
                password_hash,
                enabled,
                totp_secret,
                reset_token,
                reset_expires_at,
                removed_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_phc_string())
        .bind(user.enabled)
        .bind(user.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(user.reset_token.as_ref().map(|t| t.as_str()))
        .bind(user.reset_token.as_ref().map(|t| t.expires_at()))
        .bind(user.lifecycle.deleted_at())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        self.fetch_user(&query, username).await
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.fetch_user(&query, email).await
    }

    async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1");
        self.fetch_user(&query, token).await
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                username = $2,
                email = $3,
                password_hash = $4,
                enabled = $5,
                totp_secret = $6,
                reset_token = $7,
                reset_expires_at = $8,
                removed_at = $9,
                updated_at = $10
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_phc_string())
        .bind(user.enabled)
        .bind(user.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(user.reset_token.as_ref().map(|t| t.as_str()))
        .bind(user.reset_token.as_ref().map(|t| t.expires_at()))
        .bind(user.lifecycle.deleted_at())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn hard_delete(&self, user_id: &UserId) -> AuthResult<()> {
        // Link rows go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Role Store Implementation
// ============================================================================

const ROLE_QUERY: &str = r#"
    SELECT
        r.role_id,
        r.title,
        r.description,
        r.enabled,
        r.removed_at,
        r.created_at,
        r.updated_at,
        COALESCE(
            array_agg(ur.user_id ORDER BY ur.user_id) FILTER (WHERE ur.user_id IS NOT NULL),
            '{}'
        ) AS member_ids
    FROM roles r
    LEFT JOIN user_roles ur ON ur.role_id = r.role_id
"#;

/// Row mapped from the roles table with aggregated membership
#[derive(sqlx::FromRow)]
struct RoleRow {
    role_id: i64,
    title: String,
    description: String,
    enabled: bool,
    removed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    member_ids: Vec<Uuid>,
}

impl RoleRow {
    fn into_role(self) -> Role {
        Role {
            role_id: self.role_id,
            title: self.title,
            description: self.description,
            enabled: self.enabled,
            lifecycle: Lifecycle::from_removed_at(self.removed_at),
            member_ids: self.member_ids.into_iter().map(UserId::from_uuid).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl RoleStore for PgStore {
    async fn insert(&self, role: &Role) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (title, description, enabled, removed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&role.title)
        .bind(&role.description)
        .bind(role.enabled)
        .bind(role.lifecycle.deleted_at())
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, role_id: i64) -> AuthResult<Option<Role>> {
        let query = format!("{ROLE_QUERY} WHERE r.role_id = $1 GROUP BY r.role_id");
        let row = sqlx::query_as::<_, RoleRow>(&query)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(RoleRow::into_role))
    }

    async fn find_by_title(&self, title: &str) -> AuthResult<Option<Role>> {
        let query = format!("{ROLE_QUERY} WHERE r.title = $1 GROUP BY r.role_id");
        let row = sqlx::query_as::<_, RoleRow>(&query)
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(RoleRow::into_role))
    }

    async fn list(&self, enabled: Option<bool>) -> AuthResult<Vec<Role>> {
        let rows = match enabled {
            Some(enabled) => {
                let query = format!(
                    "{ROLE_QUERY} WHERE r.enabled = $1 GROUP BY r.role_id ORDER BY r.role_id"
                );
                sqlx::query_as::<_, RoleRow>(&query)
                    .bind(enabled)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!("{ROLE_QUERY} GROUP BY r.role_id ORDER BY r.role_id");
                sqlx::query_as::<_, RoleRow>(&query)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(RoleRow::into_role).collect())
    }

    async fn update_fields(&self, role: &Role) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE roles SET
                title = $2,
                description = $3,
                enabled = $4,
                removed_at = $5,
                updated_at = $6
            WHERE role_id = $1
            "#,
        )
        .bind(role.role_id)
        .bind(&role.title)
        .bind(&role.description)
        .bind(role.enabled)
        .bind(role.lifecycle.deleted_at())
        .bind(role.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_links(&self, role_id: i64) -> AuthResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_links(&self, role_id: i64, members: &[UserId]) -> AuthResult<()> {
        if members.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = members.iter().map(|m| *m.as_uuid()).collect();

        sqlx::query(
            "INSERT INTO user_roles (role_id, user_id) SELECT $1, unnest($2::uuid[])",
        )
        .bind(role_id)
        .bind(&ids)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn hard_delete(&self, role_id: i64) -> AuthResult<()> {
        sqlx::query("DELETE FROM roles WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
