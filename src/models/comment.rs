use crate::models::user::AuthorResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub profile_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment row joined with its author, as fetched for thread assembly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub video_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub author_profile_id: String,
    pub author_full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1))]
    pub content: String,
}

/// One node of a comment thread; replies nest recursively in the payload,
/// newest first.
#[derive(Serialize, Debug)]
pub struct CommentResponse {
    pub id: Uuid,
    pub author: AuthorResponse,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentResponse>,
    pub total_replies: i64,
    pub likes_count: i64,
    pub is_liked_by_user: bool,
}
