use crate::core::AppError;
use crate::models::support_calls::{RequestStatus, SupportCallRequest};
use chrono::Utc;
use sqlx::MySqlPool;

const REQUEST_COLUMNS: &str =
    "id, support_call_id, user_id, support_type, status, created_at, updated_at";

/// Insert a fresh pending request. The table carries a unique key over
/// (support_call_id, user_id) for open (pending/accepted) requests, so a
/// concurrent duplicate insert surfaces here as a unique violation and is
/// reported as a domain conflict rather than a server error.
pub async fn create_request(
    pool: &MySqlPool,
    support_call_id: i32,
    user_id: i32,
    support_type: &str,
) -> Result<SupportCallRequest, AppError> {
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_support_call_requests
            (support_call_id, user_id, support_type, status, created_at, updated_at)
        VALUES (?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(support_call_id)
    .bind(user_id)
    .bind(support_type)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => {
            let request_id = i32::try_from(done.last_insert_id())
                .map_err(|_| AppError::internal_error("Inserted request id is out of range"))?;

            get_request_by_id(pool, request_id)
                .await?
                .ok_or_else(|| AppError::internal_error("Created request could not be read back"))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::conflict(
            "You already have an open request for this call",
        )),
        Err(e) => Err(AppError::db_error(e)),
    }
}

pub async fn get_request_by_id(
    pool: &MySqlPool,
    request_id: i32,
) -> Result<Option<SupportCallRequest>, AppError> {
    let request = sqlx::query_as::<_, SupportCallRequest>(&format!(
        "SELECT {} FROM tbl_support_call_requests WHERE id = ?",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(request)
}

/// The caller's most recent request for a call. Rejected history rows are
/// retained, so "latest" is what the permission resolver cares about.
pub async fn get_latest_request(
    pool: &MySqlPool,
    support_call_id: i32,
    user_id: i32,
) -> Result<Option<SupportCallRequest>, AppError> {
    let request = sqlx::query_as::<_, SupportCallRequest>(&format!(
        r#"
        SELECT {}
        FROM tbl_support_call_requests
        WHERE support_call_id = ? AND user_id = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
        REQUEST_COLUMNS
    ))
    .bind(support_call_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(request)
}

pub async fn update_request_status(
    pool: &MySqlPool,
    request_id: i32,
    status: RequestStatus,
) -> Result<SupportCallRequest, AppError> {
    let now = Utc::now().naive_utc();

    sqlx::query("UPDATE tbl_support_call_requests SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(request_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    get_request_by_id(pool, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call request not found"))
}

pub async fn get_requests_for_call(
    pool: &MySqlPool,
    support_call_id: i32,
) -> Result<Vec<SupportCallRequest>, AppError> {
    let requests = sqlx::query_as::<_, SupportCallRequest>(&format!(
        r#"
        SELECT {}
        FROM tbl_support_call_requests
        WHERE support_call_id = ?
        ORDER BY created_at ASC
        "#,
        REQUEST_COLUMNS
    ))
    .bind(support_call_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(requests)
}
