use crate::core::AppError;
use crate::models::users::{RegisterRequest, User};
use chrono::Utc;
use sqlx::MySqlPool;

const USER_COLUMNS: &str = "id, name, email, password, role, is_banned, created_at, updated_at";

pub async fn email_exists(pool: &MySqlPool, email: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(count > 0)
}

pub async fn create_user(pool: &MySqlPool, request: &RegisterRequest) -> Result<User, AppError> {
    let now = Utc::now().naive_utc();
    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)?;

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_users (name, email, password, role, is_banned, created_at, updated_at)
        VALUES (?, ?, ?, 'user', FALSE, ?, ?)
        "#,
    )
    .bind(&request.name)
    .bind(&request.email)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    let user_id = i32::try_from(result.last_insert_id())
        .map_err(|_| AppError::internal_error("Inserted user id is out of range"))?;

    get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Created user could not be read back"))
}

pub async fn get_user_by_id(pool: &MySqlPool, user_id: i32) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM tbl_users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM tbl_users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(user)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(password, password_hash)?)
}
