use crate::models::user::AuthorResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Video {
    pub id: Uuid,
    pub course_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub embed_code: String,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing a video. The requested priority is a
/// hint: out-of-range values are clamped by the ordering rules, so the
/// persisted priority may differ.
#[derive(Deserialize, Debug, Validate)]
pub struct VideoRequest {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub embed_code: String,
    pub priority: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwapDirection {
    Up,
    Down,
}

#[derive(Deserialize, Debug)]
pub struct SwapRequest {
    pub direction: SwapDirection,
}

/// Video row joined with course title, author, and engagement counters.
#[derive(Debug, sqlx::FromRow)]
pub struct VideoWithMeta {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub title: String,
    pub description: Option<String>,
    pub embed_code: String,
    pub priority: i32,
    pub is_active: bool,
    pub author_profile_id: String,
    pub author_full_name: String,
    pub likes_count: i64,
    pub total_views: i64,
    pub is_liked_by_user: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct VideoResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub title: String,
    pub priority: i32,
    pub description: Option<String>,
    pub embed_code: String,
    pub is_active: bool,
    pub author: AuthorResponse,
    pub likes_count: i64,
    pub is_liked_by_user: bool,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&VideoWithMeta> for VideoResponse {
    fn from(row: &VideoWithMeta) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            course_title: row.course_title.clone(),
            title: row.title.clone(),
            priority: row.priority,
            description: row.description.clone(),
            embed_code: row.embed_code.clone(),
            is_active: row.is_active,
            author: AuthorResponse {
                profile_id: row.author_profile_id.clone(),
                full_name: row.author_full_name.clone(),
            },
            likes_count: row.likes_count,
            is_liked_by_user: row.is_liked_by_user,
            total_views: row.total_views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Same-course recommendation entry, ordered by priority.
#[derive(Serialize, Debug)]
pub struct RecommendedVideoResponse {
    pub id: Uuid,
    pub title: String,
    pub is_active: bool,
    pub priority: i32,
    pub description: Option<String>,
    pub course_title: String,
    pub author_name: String,
    pub likes_count: i64,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&VideoWithMeta> for RecommendedVideoResponse {
    fn from(row: &VideoWithMeta) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            is_active: row.is_active,
            priority: row.priority,
            description: row.description.clone(),
            course_title: row.course_title.clone(),
            author_name: row.author_full_name.clone(),
            likes_count: row.likes_count,
            total_views: row.total_views,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct LikeToggleResponse {
    pub message: String,
    pub likes_count: i64,
}

#[derive(Serialize, Debug)]
pub struct ViewCountResponse {
    pub message: String,
    pub total_views: i64,
}
