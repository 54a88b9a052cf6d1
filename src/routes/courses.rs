use crate::core::jwt_auth::JwtClaims;
use crate::core::AppError;
use crate::core::AppSuccessResponse;
use crate::db::{courses, enrollments};
use crate::models::courses::CreateCourseRequest;
use actix_web::{get, post, web, HttpResponse, Result};
use sqlx::MySqlPool;

#[tracing::instrument(name = "Create Course", skip(pool, claims, request))]
#[post("")]
pub async fn create_course(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    request: web::Json<CreateCourseRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;

    if request.title.trim().is_empty() {
        return Err(AppError::bad_request("Course title cannot be empty"));
    }

    let course = courses::create_course(&pool, caller.user_id, &request).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: course,
        message: "Course created successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Get Course", skip(pool, _claims))]
#[get("/{course_id}")]
pub async fn get_course(
    pool: web::Data<MySqlPool>,
    _claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let course_id = path.into_inner();

    let course = courses::get_course_by_id(&pool, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: course,
        message: "Course retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Enroll In Course", skip(pool, claims))]
#[post("/{course_id}/enroll")]
pub async fn enroll_in_course(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;
    let course_id = path.into_inner();

    let course = courses::get_course_by_id(&pool, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if course.user_id == caller.user_id {
        return Err(AppError::bad_request("You cannot enroll in your own course"));
    }

    let enrollment = enrollments::enroll_user(&pool, course_id, caller.user_id).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: enrollment,
        message: "Enrolled successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Get Course Enrollments", skip(pool, claims))]
#[get("/{course_id}/enrollments")]
pub async fn get_course_enrollments(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;
    let course_id = path.into_inner();

    let course = courses::get_course_by_id(&pool, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if !caller.role.is_operator() && course.user_id != caller.user_id {
        return Err(AppError::forbidden_error(
            "You are not allowed to view enrollments for this course",
        ));
    }

    let enrollments = enrollments::get_course_enrollments(&pool, course_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: enrollments,
        message: "Enrollments retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Get My Courses", skip(pool, claims))]
#[get("/mine")]
pub async fn get_my_courses(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;

    let courses = courses::get_courses_by_owner(&pool, caller.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: courses,
        message: "Courses retrieved successfully".to_string(),
    }))
}
