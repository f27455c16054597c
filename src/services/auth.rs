use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::config::DefaultAdminConfig;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{normalize_email, Session, User, UserRole, UserStatus};

const MIN_PASSWORD_LEN: usize = 6;

/// Password hashing, bearer sessions and admin provisioning
pub struct AuthService;

impl AuthService {
    /// Hash a password into an Argon2 PHC string
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())?;
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC string
    pub fn verify_password(password: &str, password_hash: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn generate_token() -> String {
        use rand::Rng;
        let bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(bytes)
    }

    /// Storage key of a bearer token
    fn token_id(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Verify admin credentials and open a session. Returns the raw token.
    pub async fn login(
        db: &Database,
        email: &str,
        password: &str,
        session_hours: u64,
    ) -> AppResult<(String, User)> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(db.pool())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_admin() || !Self::verify_password(password, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active() {
            return Err(AppError::AccountDeactivated);
        }

        let token = Self::create_session(db, &user.id, session_hours).await?;
        tracing::info!(admin_id = %user.id, "Admin logged in");

        Ok((token, user))
    }

    pub async fn create_session(db: &Database, user_id: &str, session_hours: u64) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = i64::try_from(session_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::Internal(format!("session lifetime out of range: {}h", session_hours))
            })?;

        let purged = sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) < julianday(?)")
            .bind(now)
            .execute(db.pool())
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions removed");
        }

        let token = Self::generate_token();
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
            .bind(Self::token_id(&token))
            .bind(user_id)
            .bind(expires_at)
            .bind(now)
            .execute(db.pool())
            .await?;

        Ok(token)
    }

    /// Resolve a bearer token to its user; `None` for unknown or expired tokens
    pub async fn resolve_session(db: &Database, token: &str) -> AppResult<Option<User>> {
        let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = ?")
            .bind(Self::token_id(token))
            .fetch_optional(db.pool())
            .await?;

        let session = match session {
            Some(s) if !s.is_expired() => s,
            Some(s) => {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(&s.id)
                    .execute(db.pool())
                    .await?;
                return Ok(None);
            }
            None => return Ok(None),
        };

        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&session.user_id)
            .fetch_optional(db.pool())
            .await?;

        Ok(user)
    }

    pub async fn delete_session(db: &Database, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(Self::token_id(token))
            .execute(db.pool())
            .await?;
        Ok(())
    }

    /// Change a password after checking the current one
    pub async fn change_password(
        db: &Database,
        user: &User,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> AppResult<()> {
        let (Some(old_password), Some(new_password)) = (old_password, new_password) else {
            return Err(AppError::InvalidInput(
                "Please provide old and new password".to_string(),
            ));
        };

        if !Self::verify_password(old_password, &user.password_hash) {
            return Err(AppError::InvalidInput(
                "Old password is incorrect".to_string(),
            ));
        }

        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(Self::hash_password(new_password)?)
            .bind(Utc::now())
            .bind(&user.id)
            .execute(db.pool())
            .await?;

        tracing::info!(admin_id = %user.id, "Password changed");
        Ok(())
    }

    /// Create the configured admin account unless an admin already exists.
    /// Returns whether an account was created.
    pub async fn ensure_default_admin(db: &Database, admin: &DefaultAdminConfig) -> AppResult<bool> {
        let (admins,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(UserRole::Admin.as_str())
            .fetch_one(db.pool())
            .await?;

        if admins > 0 {
            return Ok(false);
        }

        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let email = normalize_email(&admin.email);

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone, role, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&admin.name)
        .bind(&email)
        .bind(Self::hash_password(&admin.password)?)
        .bind(UserRole::Admin.as_str())
        .bind(UserStatus::Active.as_str())
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await?;

        tracing::info!(email = %email, "Created default admin account");
        Ok(true)
    }
}
