use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::comment::{Comment, CommentWithAuthor};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const COMMENT_COLUMNS: &str = "id, video_id, profile_id, parent_id, content, is_active, created_at, updated_at";

const COMMENT_AUTHOR_SELECT: &str = r#"
    SELECT co.id, co.video_id, co.parent_id, co.content,
           p.profile_id AS author_profile_id, p.full_name AS author_full_name,
           co.created_at
    FROM comments co
    JOIN profiles p ON p.id = co.profile_id
"#;

impl PostgresRepository {
    /// All active comments of a video (roots and replies), newest first.
    pub async fn list_active_comments(&self, video_id: &Uuid) -> Result<Vec<CommentWithAuthor>, AppError> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(&format!(
            "{COMMENT_AUTHOR_SELECT} WHERE co.video_id = $1 AND co.is_active = TRUE ORDER BY co.created_at DESC"
        ))
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn comment_like_counts(&self, video_id: &Uuid) -> Result<HashMap<Uuid, i64>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT cl.comment_id, COUNT(*)
            FROM comment_likes cl
            JOIN comments co ON co.id = cl.comment_id
            WHERE co.video_id = $1
            GROUP BY cl.comment_id
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Comments of this video the viewer has liked.
    pub async fn viewer_liked_comments(&self, video_id: &Uuid, profile_pk: &Uuid) -> Result<HashSet<Uuid>, AppError> {
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT cl.comment_id
            FROM comment_likes cl
            JOIN comments co ON co.id = cl.comment_id
            WHERE co.video_id = $1 AND cl.profile_id = $2
            "#,
        )
        .bind(video_id)
        .bind(profile_pk)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    pub async fn create_comment(&self, video_id: &Uuid, profile_pk: &Uuid, content: &str) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (video_id, profile_id, content)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(video_id)
        .bind(profile_pk)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Reply to an active comment; the reply lands on the parent's video.
    pub async fn create_reply(&self, parent_id: &Uuid, profile_pk: &Uuid, content: &str) -> Result<Comment, AppError> {
        let video_id: Option<Uuid> = sqlx::query_scalar("SELECT video_id FROM comments WHERE id = $1 AND is_active = TRUE")
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await?;
        let video_id = video_id.ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (video_id, profile_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(video_id)
        .bind(profile_pk)
        .bind(parent_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Delete a comment the profile owns; anything else reads as absent.
    pub async fn delete_own_comment(&self, comment_id: &Uuid, profile_pk: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND profile_id = $2")
            .bind(comment_id)
            .bind(profile_pk)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }
        Ok(())
    }

    pub async fn toggle_comment_like(&self, comment_id: &Uuid, profile_pk: &Uuid) -> Result<(bool, i64), AppError> {
        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO comment_likes (comment_id, profile_id)
            VALUES ($1, $2)
            ON CONFLICT (comment_id, profile_id) DO NOTHING
            "#,
        )
        .bind(comment_id)
        .bind(profile_pk)
        .execute(&self.pool)
        .await?;

        let added = inserted.rows_affected() == 1;
        if !added {
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND profile_id = $2")
                .bind(comment_id)
                .bind(profile_pk)
                .execute(&self.pool)
                .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1")
            .bind(comment_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((added, count))
    }
}
