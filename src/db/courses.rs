use crate::core::AppError;
use crate::models::courses::{Course, CreateCourseRequest};
use chrono::Utc;
use sqlx::MySqlPool;

pub async fn create_course(
    pool: &MySqlPool,
    owner_id: i32,
    request: &CreateCourseRequest,
) -> Result<Course, AppError> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_courses (user_id, title, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(owner_id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let course_id = i32::try_from(result.last_insert_id())
        .map_err(|_| AppError::internal_error("Inserted course id is out of range"))?;

    get_course_by_id(pool, course_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Created course could not be read back"))
}

pub async fn get_course_by_id(
    pool: &MySqlPool,
    course_id: i32,
) -> Result<Option<Course>, AppError> {
    let course = sqlx::query_as::<_, Course>(
        "SELECT id, user_id, title, description, created_at, updated_at FROM tbl_courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(course)
}

pub async fn get_courses_by_owner(
    pool: &MySqlPool,
    owner_id: i32,
) -> Result<Vec<Course>, AppError> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, user_id, title, description, created_at, updated_at
        FROM tbl_courses
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(courses)
}
