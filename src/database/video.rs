use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::video::{SwapDirection, Video, VideoRequest, VideoWithMeta};
use crate::service::ordering::{CourseOrder, Reassignment};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

const VIDEO_COLUMNS: &str = "id, course_id, author_id, title, description, embed_code, priority, is_active, created_at, updated_at";

/// Joined projection used for every read surface: course title, author, and
/// engagement counters. `$1` is the filter parameter of the enclosing query,
/// `$2` the viewing profile (NULL for staff contexts, which makes
/// `is_liked_by_user` false).
const VIDEO_META_SELECT: &str = r#"
    SELECT v.id, v.course_id, c.title AS course_title, v.title, v.description, v.embed_code,
           v.priority, v.is_active,
           p.profile_id AS author_profile_id, p.full_name AS author_full_name,
           (SELECT COUNT(*) FROM video_likes vl WHERE vl.video_id = v.id) AS likes_count,
           COALESCE(jsonb_array_length(vw.viewers), 0)::bigint AS total_views,
           EXISTS(SELECT 1 FROM video_likes vl WHERE vl.video_id = v.id AND vl.profile_id = $2) AS is_liked_by_user,
           v.created_at, v.updated_at
    FROM videos v
    JOIN courses c ON c.id = v.course_id
    JOIN profiles p ON p.id = v.author_id
    LEFT JOIN video_views vw ON vw.video_id = v.id
"#;

impl PostgresRepository {
    /// Create a video, fitting it into the course's priority sequence.
    ///
    /// The course's rows stay locked for the whole read-plan-write span, so
    /// concurrent ordering edits on one course serialize; the transaction
    /// guarantees the renumber is all-or-nothing.
    pub async fn create_video(&self, request: &VideoRequest, author_pk: &Uuid) -> Result<Video, AppError> {
        let mut tx = self.pool.begin().await?;

        let course: Option<i32> = sqlx::query_scalar("SELECT 1 FROM courses WHERE id = $1")
            .bind(request.course_id)
            .fetch_optional(&mut *tx)
            .await?;
        if course.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let rows = lock_course_rows(&mut tx, &request.course_id, None).await?;
        let mut order = CourseOrder::new(rows);

        let video_id = Uuid::new_v4();
        let placement = order.insert(video_id, request.priority);
        if let Some(displaced) = placement.displaced {
            apply_reassignment(&mut tx, &displaced).await?;
        }

        let video = sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (id, course_id, author_id, title, description, embed_code, priority, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(video_id)
        .bind(request.course_id)
        .bind(author_pk)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.embed_code)
        .bind(placement.assigned)
        .bind(request.is_active.unwrap_or(true))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO video_views (video_id) VALUES ($1)")
            .bind(video.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(video)
    }

    /// Update a video, including moves within or across courses.
    ///
    /// A conflicting occupant of the target slot trades places with the
    /// moving video (it receives the mover's old priority). On a cross-course
    /// move the source course is left as-is, without compaction.
    pub async fn update_video(&self, id: &Uuid, request: &VideoRequest) -> Result<Video, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        let rows = lock_course_rows(&mut tx, &request.course_id, Some(id)).await?;
        let mut order = CourseOrder::new(rows);

        let placement = order.place(*id, current.priority, request.priority);
        if let Some(displaced) = placement.displaced {
            apply_reassignment(&mut tx, &displaced).await?;
        }

        let video = sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET course_id = $2, title = $3, description = $4, embed_code = $5,
                priority = $6, is_active = $7, updated_at = now()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(request.course_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.embed_code)
        .bind(placement.assigned)
        .bind(request.is_active.unwrap_or(current.is_active))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(video)
    }

    /// Delete a video and close the gap it leaves in its course.
    pub async fn delete_video(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        let rows = lock_course_rows(&mut tx, &current.course_id, None).await?;
        let mut order = CourseOrder::new(rows);
        let shifted = order.remove(*id);

        sqlx::query("DELETE FROM videos WHERE id = $1").bind(id).execute(&mut *tx).await?;
        for reassignment in &shifted {
            apply_reassignment(&mut tx, reassignment).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Exchange a video with its neighbour above or below. Both rows are
    /// persisted in one transaction, or neither.
    pub async fn swap_video_priority(&self, id: &Uuid, direction: SwapDirection) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        let rows = lock_course_rows(&mut tx, &current.course_id, None).await?;
        let mut order = CourseOrder::new(rows);

        let (moved, neighbour) = order.swap_adjacent(*id, direction)?;
        apply_reassignment(&mut tx, &moved).await?;
        apply_reassignment(&mut tx, &neighbour).await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn get_video(&self, id: &Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    pub async fn get_video_with_meta(&self, id: &Uuid, viewer: Option<&Uuid>) -> Result<Option<VideoWithMeta>, AppError> {
        let video = sqlx::query_as::<_, VideoWithMeta>(&format!("{VIDEO_META_SELECT} WHERE v.id = $1"))
            .bind(id)
            .bind(viewer)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    pub async fn list_course_videos_with_meta(&self, course_id: &Uuid, viewer: Option<&Uuid>, only_active: bool) -> Result<Vec<VideoWithMeta>, AppError> {
        let mut query = format!("{VIDEO_META_SELECT} WHERE v.course_id = $1");
        if only_active {
            query.push_str(" AND v.is_active = TRUE");
        }
        query.push_str(" ORDER BY v.priority");

        let videos = sqlx::query_as::<_, VideoWithMeta>(&query)
            .bind(course_id)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    /// Same-course videos ordered by priority, the current video included.
    pub async fn recommended_videos(&self, video_id: &Uuid, viewer: Option<&Uuid>, staff: bool) -> Result<Vec<VideoWithMeta>, AppError> {
        let mut query = String::from("SELECT course_id FROM videos WHERE id = $1");
        if !staff {
            query.push_str(" AND is_active = TRUE");
        }
        let course_id: Option<Uuid> = sqlx::query_scalar(&query).bind(video_id).fetch_optional(&self.pool).await?;
        let course_id = course_id.ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        self.list_course_videos_with_meta(&course_id, viewer, !staff).await
    }

    /// Toggle the profile's like on a video; returns whether the like was
    /// added and the resulting count.
    pub async fn toggle_video_like(&self, video_id: &Uuid, profile_pk: &Uuid) -> Result<(bool, i64), AppError> {
        if self.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO video_likes (video_id, profile_id)
            VALUES ($1, $2)
            ON CONFLICT (video_id, profile_id) DO NOTHING
            "#,
        )
        .bind(video_id)
        .bind(profile_pk)
        .execute(&self.pool)
        .await?;

        let added = inserted.rows_affected() == 1;
        if !added {
            sqlx::query("DELETE FROM video_likes WHERE video_id = $1 AND profile_id = $2")
                .bind(video_id)
                .bind(profile_pk)
                .execute(&self.pool)
                .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_likes WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((added, count))
    }

    /// Record a distinct client IP against the video; returns the total
    /// number of distinct viewers.
    pub async fn record_video_view(&self, video_id: &Uuid, ip: &str) -> Result<i64, AppError> {
        if self.get_video(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        sqlx::query("INSERT INTO video_views (video_id) VALUES ($1) ON CONFLICT (video_id) DO NOTHING")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            UPDATE video_views
            SET viewers = viewers || to_jsonb($2::text)
            WHERE video_id = $1 AND NOT viewers ? $2
            "#,
        )
        .bind(video_id)
        .bind(ip)
        .execute(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT jsonb_array_length(viewers)::bigint FROM video_views WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }
}

/// Lock one course's `(video, priority)` rows for the rest of the
/// transaction, optionally leaving out the video being moved.
async fn lock_course_rows(tx: &mut Transaction<'_, Postgres>, course_id: &Uuid, exclude: Option<&Uuid>) -> Result<Vec<(Uuid, i32)>, AppError> {
    let rows = match exclude {
        None => {
            sqlx::query_as::<_, (Uuid, i32)>("SELECT id, priority FROM videos WHERE course_id = $1 ORDER BY priority FOR UPDATE")
                .bind(course_id)
                .fetch_all(&mut **tx)
                .await?
        }
        Some(excluded) => {
            sqlx::query_as::<_, (Uuid, i32)>("SELECT id, priority FROM videos WHERE course_id = $1 AND id <> $2 ORDER BY priority FOR UPDATE")
                .bind(course_id)
                .bind(excluded)
                .fetch_all(&mut **tx)
                .await?
        }
    };

    Ok(rows)
}

async fn apply_reassignment(tx: &mut Transaction<'_, Postgres>, reassignment: &Reassignment) -> Result<(), AppError> {
    sqlx::query("UPDATE videos SET priority = $2, updated_at = now() WHERE id = $1")
        .bind(reassignment.video_id)
        .bind(reassignment.priority)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
