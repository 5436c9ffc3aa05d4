use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::pagination::PaginationParams;
use crate::models::subscription::SubscriptionWithMeta;
use crate::models::user::ProfileOption;
use uuid::Uuid;

const SUBSCRIPTION_META_SELECT: &str = r#"
    SELECT s.id, p.profile_id, p.full_name, u.email, c.title AS course_title,
           s.is_active, s.created_at
    FROM subscriptions s
    JOIN profiles p ON p.id = s.profile_id
    JOIN users u ON u.id = p.user_id
    JOIN courses c ON c.id = s.course_id
"#;

impl PostgresRepository {
    pub async fn list_subscriptions(&self, pagination: Option<&PaginationParams>) -> Result<(Vec<SubscriptionWithMeta>, i64), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions").fetch_one(&self.pool).await?;

        let mut query = format!("{SUBSCRIPTION_META_SELECT} ORDER BY s.created_at DESC");
        if let Some(params) = pagination
            && let (Some(limit), Some(offset)) = (params.effective_limit(), params.offset())
        {
            query.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let subscriptions = sqlx::query_as::<_, SubscriptionWithMeta>(&query).fetch_all(&self.pool).await?;

        Ok((subscriptions, total))
    }

    pub async fn search_subscriptions(&self, value: &str) -> Result<Vec<SubscriptionWithMeta>, AppError> {
        let subscriptions = sqlx::query_as::<_, SubscriptionWithMeta>(&format!(
            r#"
            {SUBSCRIPTION_META_SELECT}
            WHERE p.full_name ILIKE '%' || $1 || '%'
               OR u.email ILIKE '%' || $1 || '%'
               OR p.profile_id ILIKE '%' || $1 || '%'
            ORDER BY s.created_at DESC
            "#,
        ))
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Subscribe a profile (by its public id) to a course.
    pub async fn create_subscription(&self, profile_id: &str, course_id: &Uuid, is_active: bool) -> Result<SubscriptionWithMeta, AppError> {
        let profile_pk: Option<Uuid> = sqlx::query_scalar("SELECT id FROM profiles WHERE profile_id = $1")
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;
        let profile_pk = profile_pk.ok_or_else(|| AppError::BadRequest("Profile does not exist".to_string()))?;

        if self.get_course_by_id(course_id).await?.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let already: Option<i32> = sqlx::query_scalar("SELECT 1 FROM subscriptions WHERE profile_id = $1 AND course_id = $2")
            .bind(profile_pk)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        if already.is_some() {
            return Err(AppError::BadRequest("User is already subscribed to this course".to_string()));
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO subscriptions (profile_id, course_id, is_active)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(profile_pk)
        .bind(course_id)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        self.get_subscription_with_meta(&id).await
    }

    pub async fn set_subscription_active(&self, id: &Uuid, is_active: bool) -> Result<SubscriptionWithMeta, AppError> {
        let result = sqlx::query("UPDATE subscriptions SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Subscription not found".to_string()));
        }
        self.get_subscription_with_meta(id).await
    }

    pub async fn delete_subscription(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1").bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Subscription not found".to_string()));
        }
        Ok(())
    }

    /// Whether the profile actively subscribes to the course.
    pub async fn is_subscribed(&self, profile_pk: &Uuid, course_id: &Uuid) -> Result<bool, AppError> {
        let row: Option<i32> = sqlx::query_scalar("SELECT 1 FROM subscriptions WHERE profile_id = $1 AND course_id = $2 AND is_active = TRUE")
            .bind(profile_pk)
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Subscriptions of one course, for the staff course detail view.
    pub async fn course_subscriptions(&self, course_id: &Uuid) -> Result<Vec<SubscriptionWithMeta>, AppError> {
        let subscriptions = sqlx::query_as::<_, SubscriptionWithMeta>(&format!(
            "{SUBSCRIPTION_META_SELECT} WHERE s.course_id = $1 ORDER BY s.created_at DESC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Non-staff profiles offered when attaching a new subscription.
    pub async fn subscription_profile_options(&self) -> Result<Vec<ProfileOption>, AppError> {
        let profiles = sqlx::query_as::<_, ProfileOption>(
            r#"
            SELECT p.profile_id, p.full_name
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            WHERE u.is_staff = FALSE AND u.is_superuser = FALSE
            ORDER BY p.full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    async fn get_subscription_with_meta(&self, id: &Uuid) -> Result<SubscriptionWithMeta, AppError> {
        let subscription = sqlx::query_as::<_, SubscriptionWithMeta>(&format!("{SUBSCRIPTION_META_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        subscription.ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))
    }
}
