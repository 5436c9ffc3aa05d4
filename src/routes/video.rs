use crate::auth::{CurrentUser, StaffUser};
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::ClientIp;
use crate::models::video::{LikeToggleResponse, RecommendedVideoResponse, SwapRequest, VideoRequest, VideoResponse, ViewCountResponse};
use crate::models::MessageResponse;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, routes};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Videos of one course, addressed by course title or id.
///
/// Staff see every video of any course; learners see the active videos of
/// active courses they actively subscribe to. An unresolvable course yields
/// an empty list rather than an error.
#[rocket::get("/course/<ident>")]
pub async fn list_course_videos(pool: &State<PgPool>, current_user: CurrentUser, ident: &str) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let staff = current_user.is_staff_or_superuser();

    let viewer_filter = if staff { None } else { Some(&current_user.profile_pk) };
    let Some(course) = repo.resolve_course_for_viewer(ident, viewer_filter).await? else {
        return Ok(Json(Vec::new()));
    };

    let videos = repo
        .list_course_videos_with_meta(&course.id, Some(&current_user.profile_pk), !staff)
        .await?;

    Ok(Json(videos.iter().map(VideoResponse::from).collect()))
}

#[rocket::get("/<id>")]
pub async fn get_video(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<Json<VideoResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;

    let Some(video) = repo.get_video_with_meta(&uuid, Some(&current_user.profile_pk)).await? else {
        return Err(AppError::NotFound("Video not found".to_string()));
    };

    if !current_user.is_staff_or_superuser() {
        if !video.is_active {
            return Err(AppError::NotFound("Video not found".to_string()));
        }
        if !repo.is_subscribed(&current_user.profile_pk, &video.course_id).await? {
            return Err(AppError::PermissionDenied);
        }
    }

    Ok(Json(VideoResponse::from(&video)))
}

/// Same-course videos in priority order.
#[rocket::get("/<id>/recommended")]
pub async fn recommended_videos(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<Json<Vec<RecommendedVideoResponse>>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;

    let videos = repo
        .recommended_videos(&uuid, Some(&current_user.profile_pk), current_user.is_staff_or_superuser())
        .await?;

    Ok(Json(videos.iter().map(RecommendedVideoResponse::from).collect()))
}

#[rocket::post("/<id>/like")]
pub async fn toggle_video_like(pool: &State<PgPool>, current_user: CurrentUser, id: &str) -> Result<(Status, Json<LikeToggleResponse>), AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;

    let (added, likes_count) = repo.toggle_video_like(&uuid, &current_user.profile_pk).await?;
    let (status, message) = if added {
        (Status::Created, "Like added")
    } else {
        (Status::Ok, "Like removed")
    };

    Ok((
        status,
        Json(LikeToggleResponse {
            message: message.to_string(),
            likes_count,
        }),
    ))
}

/// Count one distinct view per client IP.
#[rocket::post("/<id>/view")]
pub async fn record_video_view(pool: &State<PgPool>, _current_user: CurrentUser, client_ip: ClientIp, id: &str) -> Result<Json<ViewCountResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;

    let ip = client_ip.0.unwrap_or_else(|| "0.0.0.0".to_string());
    let total_views = repo.record_video_view(&uuid, &ip).await?;

    Ok(Json(ViewCountResponse {
        message: "Views updated successfully".to_string(),
        total_views,
    }))
}

/// Add a video; the requested priority is clamped into the course's range
/// and an occupied slot pushes its occupant to the end.
#[rocket::post("/", data = "<payload>")]
pub async fn create_video(pool: &State<PgPool>, staff: StaffUser, payload: Json<VideoRequest>) -> Result<(Status, Json<VideoResponse>), AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let video = repo.create_video(&payload, &staff.0.profile_pk).await?;
    let response = repo
        .get_video_with_meta(&video.id, None)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok((Status::Created, Json(VideoResponse::from(&response))))
}

/// Update a video, including priority moves and course changes; a
/// conflicting slot occupant trades places with the moved video.
#[rocket::put("/<id>", data = "<payload>")]
pub async fn update_video(pool: &State<PgPool>, _staff: StaffUser, id: &str, payload: Json<VideoRequest>) -> Result<Json<VideoResponse>, AppError> {
    payload.validate()?;

    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    let video = repo.update_video(&uuid, &payload).await?;
    let response = repo
        .get_video_with_meta(&video.id, None)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(Json(VideoResponse::from(&response)))
}

/// Delete a video; the course's higher priorities shift down to close the
/// gap.
#[rocket::delete("/<id>")]
pub async fn delete_video(pool: &State<PgPool>, _staff: StaffUser, id: &str) -> Result<Status, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    repo.delete_video(&uuid).await?;

    Ok(Status::NoContent)
}

/// Exchange a video with its neighbour; at a boundary there is nothing to
/// swap with and the request fails.
#[rocket::post("/<id>/swap", data = "<payload>")]
pub async fn swap_video_priority(pool: &State<PgPool>, _staff: StaffUser, id: &str, payload: Json<SwapRequest>) -> Result<Json<MessageResponse>, AppError> {
    let repo = PostgresRepository::new(pool.inner().clone());
    let uuid = Uuid::parse_str(id)?;
    repo.swap_video_priority(&uuid, payload.direction).await?;

    Ok(Json(MessageResponse::new("Swapped successfully")))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_course_videos,
        get_video,
        recommended_videos,
        toggle_video_like,
        record_video_view,
        create_video,
        update_video,
        delete_video,
        swap_video_priority
    ]
}
