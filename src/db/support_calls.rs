use crate::core::AppError;
use crate::models::support_calls::{CallStatus, CreateCallRequest, SupportCall};
use chrono::Utc;
use sqlx::MySqlPool;

const CALL_COLUMNS: &str =
    "id, course_id, created_by, stream_call_id, status, title, description, created_at, ended_at";

pub async fn create_call(
    pool: &MySqlPool,
    creator_id: i32,
    request: &CreateCallRequest,
) -> Result<SupportCall, AppError> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_support_calls
            (course_id, created_by, stream_call_id, status, title, description, created_at)
        VALUES (?, ?, ?, 'active', ?, ?, ?)
        "#,
    )
    .bind(request.course_id)
    .bind(creator_id)
    .bind(&request.stream_call_id)
    .bind(&request.title)
    .bind(&request.description)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => {
            let call_id = i32::try_from(done.last_insert_id())
                .map_err(|_| AppError::internal_error("Inserted call id is out of range"))?;

            get_call_by_id(pool, call_id)
                .await?
                .ok_or_else(|| AppError::internal_error("Created call could not be read back"))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::conflict(
            "A call with this stream call id already exists",
        )),
        Err(e) => Err(AppError::db_error(e)),
    }
}

pub async fn get_call_by_id(
    pool: &MySqlPool,
    call_id: i32,
) -> Result<Option<SupportCall>, AppError> {
    let call = sqlx::query_as::<_, SupportCall>(&format!(
        "SELECT {} FROM tbl_support_calls WHERE id = ?",
        CALL_COLUMNS
    ))
    .bind(call_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(call)
}

pub async fn get_call_by_stream_id(
    pool: &MySqlPool,
    stream_call_id: &str,
) -> Result<Option<SupportCall>, AppError> {
    let call = sqlx::query_as::<_, SupportCall>(&format!(
        "SELECT {} FROM tbl_support_calls WHERE stream_call_id = ?",
        CALL_COLUMNS
    ))
    .bind(stream_call_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(call)
}

pub async fn end_call(pool: &MySqlPool, call_id: i32) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();

    sqlx::query("UPDATE tbl_support_calls SET status = ?, ended_at = ? WHERE id = ?")
        .bind(CallStatus::Ended)
        .bind(now)
        .bind(call_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(())
}

pub async fn get_active_calls_for_course(
    pool: &MySqlPool,
    course_id: i32,
) -> Result<Vec<SupportCall>, AppError> {
    let calls = sqlx::query_as::<_, SupportCall>(&format!(
        r#"
        SELECT {}
        FROM tbl_support_calls
        WHERE course_id = ? AND status = ?
        ORDER BY created_at DESC
        "#,
        CALL_COLUMNS
    ))
    .bind(course_id)
    .bind(CallStatus::Active)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(calls)
}
