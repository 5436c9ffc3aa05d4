use crate::models::subscription::SubscriptionResponse;
use crate::models::video::VideoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Course as seen by a subscribed learner: only active videos are nested.
#[derive(Serialize, Debug)]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub videos: Vec<VideoResponse>,
}

/// Slim course row for select/option lists.
#[derive(Serialize, Debug)]
pub struct CourseOptionResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Course> for CourseOptionResponse {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id,
            title: course.title.clone(),
            description: course.description.clone(),
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Staff view: includes inactive videos and the subscriber list.
#[derive(Serialize, Debug)]
pub struct CourseAdminResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub videos: Vec<VideoResponse>,
    pub subscribers: Vec<SubscriptionResponse>,
}
