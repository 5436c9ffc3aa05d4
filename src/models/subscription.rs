use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff create a subscription by the subscriber's public profile id.
#[derive(Deserialize, Debug)]
pub struct SubscriptionRequest {
    pub profile_id: String,
    pub course_id: Uuid,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct SubscriptionActivationRequest {
    pub is_active: bool,
}

/// Subscription row joined with subscriber identity and course title.
#[derive(Debug, sqlx::FromRow)]
pub struct SubscriptionWithMeta {
    pub id: Uuid,
    pub profile_id: String,
    pub full_name: String,
    pub email: String,
    pub course_title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub profile_id: String,
    pub full_name: String,
    pub email: String,
    pub course_title: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&SubscriptionWithMeta> for SubscriptionResponse {
    fn from(row: &SubscriptionWithMeta) -> Self {
        Self {
            id: row.id,
            profile_id: row.profile_id.clone(),
            full_name: row.full_name.clone(),
            email: row.email.clone(),
            course_title: row.course_title.clone(),
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}
