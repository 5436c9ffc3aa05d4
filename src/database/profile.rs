use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::SessionState;
use crate::models::user::{Device, Profile};
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id, user_id, profile_id, full_name, bio, devices, is_active, is_private, is_logged_in, current_session_key";

/// Per-account session state, with compare-and-set claim semantics so two
/// concurrent logins cannot both win the slot.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn session_state(&self, user_id: &Uuid) -> Result<Option<SessionState>, AppError>;

    /// Claim the session slot; returns false when another session holds it.
    async fn begin_session(&self, user_id: &Uuid, session_key: &str) -> Result<bool, AppError>;

    /// Release the session slot; returns whether a live session was cleared.
    /// Releasing an already-released slot is a successful no-op.
    async fn end_session(&self, user_id: &Uuid) -> Result<bool, AppError>;

    /// Append the device fingerprint to the account's history unless an
    /// entry for the same client is already present.
    async fn record_device(&self, user_id: &Uuid, device: &Device) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl SessionStore for PostgresRepository {
    async fn session_state(&self, user_id: &Uuid) -> Result<Option<SessionState>, AppError> {
        let state = sqlx::query_as::<_, SessionState>("SELECT is_logged_in, current_session_key FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(state)
    }

    async fn begin_session(&self, user_id: &Uuid, session_key: &str) -> Result<bool, AppError> {
        // The WHERE clause is the compare half of the compare-and-set: a row
        // only matches while no other session holds the account.
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET is_logged_in = TRUE, current_session_key = $2
            WHERE user_id = $1 AND is_logged_in = FALSE
            "#,
        )
        .bind(user_id)
        .bind(session_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn end_session(&self, user_id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET is_logged_in = FALSE, current_session_key = NULL
            WHERE user_id = $1 AND is_logged_in = TRUE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_device(&self, user_id: &Uuid, device: &Device) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE profiles
            SET devices = devices || jsonb_build_array(
                jsonb_build_object('ip', $2::text, 'user_agent', $3::text, 'last_login', $4::text)
            )
            WHERE user_id = $1
              AND NOT EXISTS (
                  SELECT 1
                  FROM jsonb_array_elements(devices) AS d
                  WHERE d->>'ip' = $2 AND d->>'user_agent' = $3
              )
            "#,
        )
        .bind(user_id)
        .bind(&device.ip)
        .bind(&device.user_agent)
        .bind(device.last_login.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl PostgresRepository {
    pub async fn get_profile_by_user_id(&self, user_id: &Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    pub async fn get_profile_by_profile_id(&self, profile_id: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = $1"))
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Update the caller's own profile fields.
    pub async fn update_profile(&self, user_id: &Uuid, full_name: &str, bio: Option<&str>) -> Result<Profile, AppError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET full_name = $2, bio = $3
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(full_name)
        .bind(bio)
        .fetch_optional(&self.pool)
        .await?;

        profile.ok_or(AppError::UserNotFound)
    }
}
