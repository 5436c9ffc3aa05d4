use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::comment::{CommentRequest, CommentResponse};
use crate::models::user::AuthorResponse;
use crate::models::video::LikeToggleResponse;
use crate::service::comments::build_thread;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Response body for a comment that was just written: no replies or likes
/// yet, but the caller sees themselves as the author.
fn fresh_comment_response(comment_id: Uuid, content: String, created_at: chrono::DateTime<chrono::Utc>, author: &CurrentUser) -> CommentResponse {
    CommentResponse {
        id: comment_id,
        author: AuthorResponse {
            profile_id: author.profile_id.clone(),
            full_name: author.full_name.clone(),
        },
        content,
        created_at,
        replies: Vec::new(),
        total_replies: 0,
        likes_count: 0,
        is_liked_by_user: false,
    }
}

/// The video's comment thread: active top-level comments with their nested
/// active replies, newest first.
#[rocket::get("/video/<video_id>")]
pub async fn list_video_comments(pool: &State<PgPool>, current_user: CurrentUser, video_id: &str) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(video_id)?;

    if repo.get_video(&uuid).await?.is_none() {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    let comments = repo.list_active_comments(&uuid).await?;
    let like_counts = repo.comment_like_counts(&uuid).await?;
    let liked = repo.viewer_liked_comments(&uuid, &current_user.profile_pk).await?;

    Ok(Json(build_thread(&comments, &like_counts, &liked)))
}

#[rocket::post("/video/<video_id>", data = "<payload>")]
pub async fn create_comment(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    video_id: &str,
    payload: Json<CommentRequest>,
) -> Result<(Status, Json<CommentResponse>), AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(video_id)?;

    if repo.get_video(&uuid).await?.is_none() {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    let comment = repo.create_comment(&uuid, &current_user.profile_pk, &payload.content).await?;

    Ok((
        Status::Created,
        Json(fresh_comment_response(comment.id, comment.content, comment.created_at, &current_user)),
    ))
}

/// Reply to an active comment.
#[rocket::post("/<comment_id>/reply", data = "<payload>")]
pub async fn create_reply(
    pool: &State<PgPool>,
    current_user: CurrentUser,
    comment_id: &str,
    payload: Json<CommentRequest>,
) -> Result<(Status, Json<CommentResponse>), AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(comment_id)?;
    let comment = repo.create_reply(&uuid, &current_user.profile_pk, &payload.content).await?;

    Ok((
        Status::Created,
        Json(fresh_comment_response(comment.id, comment.content, comment.created_at, &current_user)),
    ))
}

/// Delete one of the caller's own comments; other people's comments read as
/// absent.
#[rocket::delete("/<comment_id>")]
pub async fn delete_comment(pool: &State<PgPool>, current_user: CurrentUser, comment_id: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(comment_id)?;
    repo.delete_own_comment(&uuid, &current_user.profile_pk).await?;

    Ok(Status::NoContent)
}

#[rocket::post("/<comment_id>/like")]
pub async fn toggle_comment_like(pool: &State<PgPool>, current_user: CurrentUser, comment_id: &str) -> Result<Json<LikeToggleResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(comment_id)?;

    let (added, likes_count) = repo.toggle_comment_like(&uuid, &current_user.profile_pk).await?;
    let message = if added { "Like added" } else { "Like removed" };

    Ok(Json(LikeToggleResponse {
        message: message.to_string(),
        likes_count,
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list_video_comments, create_comment, create_reply, delete_comment, toggle_comment_like]
}
