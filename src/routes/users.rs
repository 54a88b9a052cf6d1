use crate::core::config::JwtAuthConfig;
use crate::core::jwt_auth::{generate_jwt_token, JwtClaims};
use crate::core::AppError;
use crate::core::{AppErrorResponse, AppSuccessResponse};
use crate::db::users;
use crate::models::users::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use actix_web::{get, post, web, HttpResponse, Result};
use chrono::{Duration, Utc};
use sqlx::MySqlPool;

#[tracing::instrument(name = "Register User", skip(pool, request))]
#[post("/register")]
pub async fn register(
    pool: web::Data<MySqlPool>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    if users::email_exists(&pool, &request.email).await? {
        return Ok(HttpResponse::BadRequest().json(AppErrorResponse {
            success: false,
            message: "A user with this email address already exists".to_string(),
        }));
    }

    if !is_valid_email(&request.email) {
        return Ok(HttpResponse::BadRequest().json(AppErrorResponse {
            success: false,
            message: "Please provide a valid email address".to_string(),
        }));
    }

    if request.password.len() < 6 {
        return Ok(HttpResponse::BadRequest().json(AppErrorResponse {
            success: false,
            message: "Password must be at least 6 characters long".to_string(),
        }));
    }

    let user = users::create_user(&pool, &request).await?;
    let user_profile = UserProfile::from(user);

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: user_profile,
        message: "User registered successfully".to_string(),
    }))
}

#[tracing::instrument(name = "User Login", skip(pool, jwt_config, request))]
#[post("/login")]
pub async fn login(
    pool: web::Data<MySqlPool>,
    jwt_config: web::Data<JwtAuthConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = match users::get_user_by_email(&pool, &request.email).await? {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized().json(AppErrorResponse {
                success: false,
                message: "Email or password is incorrect".to_string(),
            }));
        }
    };

    if !users::verify_password(&request.password, &user.password).await? {
        return Ok(HttpResponse::Unauthorized().json(AppErrorResponse {
            success: false,
            message: "Email or password is incorrect".to_string(),
        }));
    }

    if user.is_banned {
        return Ok(HttpResponse::Forbidden().json(AppErrorResponse {
            success: false,
            message: "This account has been suspended".to_string(),
        }));
    }

    let expires_at = Utc::now() + Duration::seconds(jwt_config.token_expiration_time);
    let claims = JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = generate_jwt_token(&claims, &jwt_config)?;
    let user_profile = UserProfile::from(user);

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: LoginResponse {
            token,
            expires_at: expires_at.timestamp(),
            user: user_profile,
        },
        message: "Login successful".to_string(),
    }))
}

#[tracing::instrument(name = "Get Profile", skip(pool, claims))]
#[get("/profile")]
pub async fn get_profile(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;

    let user = users::get_user_by_id(&pool, caller.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: UserProfile::from(user),
        message: "Profile retrieved successfully".to_string(),
    }))
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    parts.len() == 2 && !parts[0].is_empty() && parts[1].contains('.')
}

#[cfg(test)]
mod tests {
    use super::is_valid_email;

    #[test]
    fn accepts_ordinary_addresses_and_rejects_junk() {
        assert!(is_valid_email("student@example.com"));
        assert!(!is_valid_email("studentexample.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("student@localhost"));
    }
}
