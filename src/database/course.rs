use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::course::{Course, CourseRequest};
use crate::models::pagination::PaginationParams;
use uuid::Uuid;

const COURSE_COLUMNS: &str = "id, title, description, is_active, created_at, updated_at";

impl PostgresRepository {
    pub async fn create_course(&self, request: &CourseRequest) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (title, description, is_active)
            VALUES ($1, $2, $3)
            RETURNING {COURSE_COLUMNS}
            "#,
        ))
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.is_active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn get_course_by_id(&self, id: &Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    pub async fn update_course(&self, id: &Uuid, request: &CourseRequest) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses
            SET title = $2, description = $3, is_active = $4, updated_at = now()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.is_active.unwrap_or(true))
        .fetch_optional(&self.pool)
        .await?;

        course.ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    pub async fn delete_course(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1").bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_courses(&self, pagination: Option<&PaginationParams>) -> Result<(Vec<Course>, i64), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses").fetch_one(&self.pool).await?;

        let mut query = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC");
        if let Some(params) = pagination
            && let (Some(limit), Some(offset)) = (params.effective_limit(), params.offset())
        {
            query.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let courses = sqlx::query_as::<_, Course>(&query).fetch_all(&self.pool).await?;

        Ok((courses, total))
    }

    pub async fn search_courses(&self, value: &str) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE title ILIKE '%' || $1 || '%'
            ORDER BY created_at DESC
            "#,
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Active courses the profile actively subscribes to.
    pub async fn list_subscribed_courses(&self, profile_pk: &Uuid) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            r#"
            SELECT {}
            FROM courses c
            JOIN subscriptions s ON s.course_id = c.id
            WHERE c.is_active = TRUE
              AND s.profile_id = $1
              AND s.is_active = TRUE
            ORDER BY c.created_at DESC
            "#,
            course_columns_qualified("c")
        ))
        .bind(profile_pk)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Resolve a course referenced by title or by id, the way catalog URLs
    /// present it. Staff see any course; learners only active courses they
    /// actively subscribe to.
    pub async fn resolve_course_for_viewer(&self, ident: &str, viewer: Option<&Uuid>) -> Result<Option<Course>, AppError> {
        let by_id = Uuid::parse_str(ident).ok();

        let course = match viewer {
            None => {
                sqlx::query_as::<_, Course>(&format!(
                    r#"
                    SELECT {COURSE_COLUMNS}
                    FROM courses
                    WHERE (title = $1 OR id = $2)
                    "#,
                ))
                .bind(ident)
                .bind(by_id)
                .fetch_optional(&self.pool)
                .await?
            }
            Some(profile_pk) => {
                sqlx::query_as::<_, Course>(&format!(
                    r#"
                    SELECT {}
                    FROM courses c
                    JOIN subscriptions s ON s.course_id = c.id
                    WHERE (c.title = $1 OR c.id = $2)
                      AND c.is_active = TRUE
                      AND s.profile_id = $3
                      AND s.is_active = TRUE
                    "#,
                    course_columns_qualified("c")
                ))
                .bind(ident)
                .bind(by_id)
                .bind(profile_pk)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(course)
    }
}

fn course_columns_qualified(alias: &str) -> String {
    COURSE_COLUMNS
        .split(", ")
        .map(|column| format!("{alias}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}
