use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::pagination::PaginationParams;
use crate::models::user::{AdminUserRow, User};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

/// A real Argon2 hash generated once at startup, used as a timing decoy
/// so that login requests for non-existent users take the same time as
/// requests for existing users.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-never-matches", Salt::from(&salt))
        .expect("failed to generate dummy hash")
        .to_string()
});

const USER_COLUMNS: &str = "id, email, user_name, password_hash, is_active, is_staff, is_superuser, created_at";

impl PostgresRepository {
    /// Create the account and its profile in one transaction.
    pub async fn create_user(&self, email: &str, full_name: &str, password: &str) -> Result<User, AppError> {
        let (salt, password_hash) = password_hash(password);
        let user_name = format!("user_{}", short_suffix());
        let profile_id = format!("profile_{}", short_suffix());

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, user_name, salt, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(email)
        .bind(&user_name)
        .bind(&salt)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (user_id, profile_id, full_name) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(&profile_id)
            .bind(full_name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// The account behind a public profile id.
    pub async fn get_user_by_profile_id(&self, profile_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {}
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE p.profile_id = $1
            "#,
            user_columns_qualified("u")
        ))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn verify_password(&self, user: &User, password: &str) -> Result<(), AppError> {
        let password_hash = PasswordHash::new(&user.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &password_hash)
            .map_err(|_| AppError::InvalidCredentials)?;

        Ok(())
    }

    /// Perform a throwaway Argon2 verification to equalize response timing
    /// regardless of whether the target account exists. This prevents attackers
    /// from distinguishing existing vs non-existing accounts by measuring
    /// response latency.
    pub fn dummy_verify(password: &str) {
        let hash = PasswordHash::new(&DUMMY_HASH).expect("invalid dummy hash");
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }

    /// Staff password reset; the target does not prove the old password.
    pub async fn admin_reset_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), AppError> {
        let (salt, new_hash) = password_hash(new_password);
        let result = sqlx::query("UPDATE users SET salt = $1, password_hash = $2 WHERE id = $3")
            .bind(&salt)
            .bind(&new_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub async fn update_permissions(&self, profile_id: &str, is_staff: bool, is_superuser: bool) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_staff = $2, is_superuser = $3
            FROM profiles p
            WHERE p.user_id = users.id AND p.profile_id = $1
            "#,
        )
        .bind(profile_id)
        .bind(is_staff)
        .bind(is_superuser)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    /// Delete the account behind a profile; the profile row follows by
    /// cascade.
    pub async fn delete_user_by_profile_id(&self, profile_id: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            USING profiles p
            WHERE p.user_id = users.id AND p.profile_id = $1
            "#,
        )
        .bind(profile_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    /// Non-private accounts for the staff listing.
    pub async fn list_users(&self, pagination: Option<&PaginationParams>) -> Result<(Vec<AdminUserRow>, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE p.is_private = FALSE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let mut query = String::from(
            r#"
            SELECT u.id, u.email, u.user_name, u.is_active, u.is_staff, u.is_superuser, u.created_at,
                   p.profile_id, p.full_name
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE p.is_private = FALSE
            ORDER BY u.created_at DESC
            "#,
        );

        if let Some(params) = pagination
            && let (Some(limit), Some(offset)) = (params.effective_limit(), params.offset())
        {
            query.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let rows = sqlx::query_as::<_, AdminUserRow>(&query).fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn search_users(&self, value: &str) -> Result<Vec<AdminUserRow>, AppError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            r#"
            SELECT u.id, u.email, u.user_name, u.is_active, u.is_staff, u.is_superuser, u.created_at,
                   p.profile_id, p.full_name
            FROM users u
            JOIN profiles p ON p.user_id = u.id
            WHERE p.is_private = FALSE
              AND (p.full_name ILIKE '%' || $1 || '%'
                   OR u.email ILIKE '%' || $1 || '%'
                   OR p.profile_id ILIKE '%' || $1 || '%')
            ORDER BY u.created_at DESC
            "#,
        )
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn delete_non_admin_users(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE is_staff = FALSE AND is_superuser = FALSE")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn deactivate_non_admin_profiles(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET is_active = FALSE
            FROM users u
            WHERE profiles.user_id = u.id
              AND u.is_staff = FALSE
              AND u.is_superuser = FALSE
              AND profiles.is_active = TRUE
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn user_columns_qualified(alias: &str) -> String {
    USER_COLUMNS
        .split(", ")
        .map(|column| format!("{alias}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub(crate) fn password_hash(password: &str) -> (String, String) {
    let salt_string = SaltString::generate(&mut OsRng);
    let salt = Salt::from(&salt_string);
    let password_hash = PasswordHash::generate(Argon2::default(), password.as_bytes(), salt).unwrap();

    (salt.to_string(), password_hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_suffixes_are_short_and_unique() {
        let a = short_suffix();
        let b = short_suffix();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn qualified_columns_prefix_every_column() {
        let columns = user_columns_qualified("u");
        assert!(columns.starts_with("u.id"));
        assert!(columns.contains("u.password_hash"));
        assert!(!columns.contains(", email"));
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let (_salt, hash) = password_hash("correct horse battery staple");
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse battery staple", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong password", &parsed).is_err());
    }
}
