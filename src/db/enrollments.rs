use crate::core::AppError;
use crate::models::enrollments::Enrollment;
use chrono::Utc;
use sqlx::MySqlPool;

pub async fn enroll_user(
    pool: &MySqlPool,
    course_id: i32,
    user_id: i32,
) -> Result<Enrollment, AppError> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        "INSERT INTO tbl_enrollments (course_id, user_id, enrolled_at) VALUES (?, ?, ?)",
    )
    .bind(course_id)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => {
            let enrollment_id = i32::try_from(done.last_insert_id())
                .map_err(|_| AppError::internal_error("Inserted enrollment id is out of range"))?;

            get_enrollment_by_id(pool, enrollment_id)
                .await?
                .ok_or_else(|| AppError::internal_error("Created enrollment could not be read back"))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::conflict(
            "You are already enrolled in this course",
        )),
        Err(e) => Err(AppError::db_error(e)),
    }
}

pub async fn get_enrollment_by_id(
    pool: &MySqlPool,
    enrollment_id: i32,
) -> Result<Option<Enrollment>, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        "SELECT id, course_id, user_id, enrolled_at FROM tbl_enrollments WHERE id = ?",
    )
    .bind(enrollment_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(enrollment)
}

pub async fn get_course_enrollments(
    pool: &MySqlPool,
    course_id: i32,
) -> Result<Vec<Enrollment>, AppError> {
    let enrollments = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, course_id, user_id, enrolled_at
        FROM tbl_enrollments
        WHERE course_id = ?
        ORDER BY enrolled_at DESC
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(enrollments)
}
