use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_id: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub devices: Json<Vec<Device>>,
    pub is_active: bool,
    pub is_private: bool,
    pub is_logged_in: bool,
    pub current_session_key: Option<String>,
}

/// Device fingerprint recorded on every successful login. The history is
/// append-only; two entries are the same client when ip and user agent match,
/// regardless of when they last logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub ip: String,
    pub user_agent: String,
    pub last_login: DateTime<Utc>,
}

impl Device {
    pub fn same_client(&self, other: &Device) -> bool {
        self.ip == other.ip && self.user_agent == other.user_agent
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 500))]
    pub full_name: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            user_name: user.user_name.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ProfileResponse {
    pub profile_id: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub is_private: bool,
    pub devices: Vec<Device>,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            profile_id: profile.profile_id.clone(),
            full_name: profile.full_name.clone(),
            bio: profile.bio.clone(),
            is_private: profile.is_private,
            devices: profile.devices.0.clone(),
        }
    }
}

/// Compact author view nested in video and comment responses.
#[derive(Serialize, Debug, Clone)]
pub struct AuthorResponse {
    pub profile_id: String,
    pub full_name: String,
}

#[derive(Serialize, Debug)]
pub struct CheckAuthResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthenticatedUser>,
}

#[derive(Serialize, Debug)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub profile: ProfileResponse,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Deserialize, Debug, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 500))]
    pub full_name: String,
    pub bio: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PermissionsUpdateRequest {
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Deserialize, Debug, Validate)]
pub struct AdminResetPasswordRequest {
    #[validate(length(min = 8))]
    pub password: String,
}

/// Joined user + profile row for the staff user listing.
#[derive(Debug, sqlx::FromRow)]
pub struct AdminUserRow {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub profile_id: String,
    pub full_name: String,
}

#[derive(Serialize, Debug)]
pub struct AdminUserResponse {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub profile_id: String,
    pub full_name: String,
}

impl From<&AdminUserRow> for AdminUserResponse {
    fn from(row: &AdminUserRow) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
            user_name: row.user_name.clone(),
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
            profile_id: row.profile_id.clone(),
            full_name: row.full_name.clone(),
        }
    }
}

/// Profile option row offered when staff attach a subscription to a user.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProfileOption {
    pub profile_id: String,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_client_ignores_last_login() {
        let a = Device {
            ip: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            last_login: Utc::now(),
        };
        let b = Device {
            last_login: a.last_login + chrono::Duration::days(3),
            ..a.clone()
        };
        assert!(a.same_client(&b));
    }

    #[test]
    fn same_client_differs_on_user_agent() {
        let a = Device {
            ip: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            last_login: Utc::now(),
        };
        let b = Device {
            user_agent: "curl/8.0".to_string(),
            ..a.clone()
        };
        assert!(!a.same_client(&b));
    }

    #[test]
    fn device_round_trips_through_the_stored_json_shape() {
        // Must stay readable alongside entries written in SQL as
        // {"ip": ..., "user_agent": ..., "last_login": <rfc3339>}.
        let raw = serde_json::json!({
            "ip": "203.0.113.9",
            "user_agent": "Mozilla/5.0",
            "last_login": "2026-08-06T10:15:00Z",
        });
        let device: Device = serde_json::from_value(raw).unwrap();
        assert_eq!(device.ip, "203.0.113.9");

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["user_agent"], "Mozilla/5.0");
    }
}
