use crate::core::call_access::{
    authorize_end_call, can_manage_call, resolve_permission, EndCallOutcome, JoinPermission,
};
use crate::core::jwt_auth::JwtClaims;
use crate::core::AppError;
use crate::core::AppSuccessResponse;
use crate::core::StreamVideoService;
use crate::db::{courses, support_call_requests, support_calls};
use crate::models::courses::Course;
use crate::models::support_calls::{
    CallStatus, CreateCallRequest, CreateSupportRequest, JoinTokenResponse, PermissionQuery,
    RequestStatus, SupportCall, TransitionSupportRequest,
};
use actix_web::{get, patch, post, web, HttpResponse, Result};
use sqlx::MySqlPool;

async fn owning_course(pool: &MySqlPool, call: &SupportCall) -> Result<Course, AppError> {
    courses::get_course_by_id(pool, call.course_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Support call references a missing course"))
}

#[tracing::instrument(name = "Get Call Permission", skip(pool, claims))]
#[get("/permission")]
pub async fn get_call_permission(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    query: web::Query<PermissionQuery>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;

    // An unknown call is a negative decision, not an error
    let call = match support_calls::get_call_by_stream_id(&pool, &query.stream_call_id).await? {
        Some(call) => call,
        None => {
            return Ok(HttpResponse::Ok().json(AppSuccessResponse {
                success: true,
                data: JoinPermission::call_not_found(),
                message: "Permission resolved".to_string(),
            }));
        }
    };

    let course = owning_course(&pool, &call).await?;
    let latest_request =
        support_call_requests::get_latest_request(&pool, call.id, caller.user_id).await?;

    let permission = resolve_permission(&caller, &call, course.user_id, latest_request.as_ref());

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: permission,
        message: "Permission resolved".to_string(),
    }))
}

#[tracing::instrument(name = "Create Support Call", skip(pool, stream, claims, request))]
#[post("")]
pub async fn create_call(
    pool: web::Data<MySqlPool>,
    stream: web::Data<StreamVideoService>,
    claims: JwtClaims,
    request: web::Json<CreateCallRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;

    let course = courses::get_course_by_id(&pool, request.course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;

    if !caller.role.is_operator() && course.user_id != caller.user_id {
        return Err(AppError::forbidden_error(
            "You are not allowed to start a support call for this course",
        ));
    }

    let call = support_calls::create_call(&pool, caller.user_id, &request).await?;

    // The provider creates rooms idempotently; if this round trip fails the
    // local row stays behind and the room is created on a later retry.
    stream.create_or_get_room(&call.stream_call_id).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: call,
        message: "Support call created successfully".to_string(),
    }))
}

#[tracing::instrument(name = "End Support Call", skip(pool, stream, claims))]
#[post("/{call_id}/end")]
pub async fn end_call(
    pool: web::Data<MySqlPool>,
    stream: web::Data<StreamVideoService>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;
    let call_id = path.into_inner();

    let call = support_calls::get_call_by_id(&pool, call_id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call not found"))?;

    let course = owning_course(&pool, &call).await?;

    // Authorization first; the already-ended no-op applies to managers only
    if let EndCallOutcome::AlreadyEnded = authorize_end_call(&caller, &call, course.user_id)? {
        return Ok(HttpResponse::Ok().json(AppSuccessResponse {
            success: true,
            data: call,
            message: "Support call already ended".to_string(),
        }));
    }

    stream.end_room(&call.stream_call_id).await?;
    support_calls::end_call(&pool, call.id).await?;

    let ended = support_calls::get_call_by_id(&pool, call.id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call not found"))?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: ended,
        message: "Support call ended successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Get Join Token", skip(pool, stream, claims))]
#[get("/{call_id}/token")]
pub async fn get_join_token(
    pool: web::Data<MySqlPool>,
    stream: web::Data<StreamVideoService>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;
    let call_id = path.into_inner();

    let call = support_calls::get_call_by_id(&pool, call_id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call not found"))?;

    if call.status != CallStatus::Active {
        return Err(AppError::bad_request("Call session is not active"));
    }

    let course = owning_course(&pool, &call).await?;
    let latest_request =
        support_call_requests::get_latest_request(&pool, call.id, caller.user_id).await?;

    let permission = resolve_permission(&caller, &call, course.user_id, latest_request.as_ref());
    if !permission.can_join {
        return Err(AppError::forbidden_error(
            "You are not allowed to join this call",
        ));
    }

    let token = stream.issue_join_token(caller.user_id)?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: JoinTokenResponse { token },
        message: "Join token issued successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Get Active Course Calls", skip(pool, _claims))]
#[get("/course/{course_id}")]
pub async fn get_course_calls(
    pool: web::Data<MySqlPool>,
    _claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let course_id = path.into_inner();

    let calls = support_calls::get_active_calls_for_course(&pool, course_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: calls,
        message: "Active calls retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "List Call Requests", skip(pool, claims))]
#[get("/{call_id}/requests")]
pub async fn list_call_requests(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;
    let call_id = path.into_inner();

    let call = support_calls::get_call_by_id(&pool, call_id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call not found"))?;

    let course = owning_course(&pool, &call).await?;

    if !can_manage_call(&caller, &call, course.user_id) {
        return Err(AppError::forbidden_error(
            "You are not allowed to view requests for this call",
        ));
    }

    let requests = support_call_requests::get_requests_for_call(&pool, call.id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: requests,
        message: "Requests retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Create Support Request", skip(pool, claims, request))]
#[post("/requests")]
pub async fn create_support_request(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    request: web::Json<CreateSupportRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;

    if request.support_type.trim().is_empty() {
        return Err(AppError::bad_request("Support type cannot be empty"));
    }

    let call = support_calls::get_call_by_id(&pool, request.support_call_id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call not found"))?;

    if call.status != CallStatus::Active {
        return Err(AppError::bad_request("Call session is not active"));
    }

    let course = owning_course(&pool, &call).await?;

    // Privileged callers join directly; keep them out of the request queue
    if can_manage_call(&caller, &call, course.user_id) {
        return Err(AppError::bad_request(
            "You can join this call directly, no request needed",
        ));
    }

    if let Some(existing) =
        support_call_requests::get_latest_request(&pool, call.id, caller.user_id).await?
    {
        match existing.status {
            RequestStatus::Pending => {
                return Err(AppError::conflict(
                    "You already have a pending request for this call",
                ));
            }
            RequestStatus::Accepted => {
                return Err(AppError::conflict(
                    "Your request for this call has already been accepted",
                ));
            }
            // Rejected or completed history does not block a fresh request
            RequestStatus::Rejected | RequestStatus::Completed => {}
        }
    }

    let created =
        support_call_requests::create_request(&pool, call.id, caller.user_id, &request.support_type)
            .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: created,
        message: "Support request submitted successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Transition Support Request", skip(pool, claims, request))]
#[patch("/requests/{request_id}")]
pub async fn transition_support_request(
    pool: web::Data<MySqlPool>,
    claims: JwtClaims,
    path: web::Path<i32>,
    request: web::Json<TransitionSupportRequest>,
) -> Result<HttpResponse, AppError> {
    let caller = claims.caller_context()?;
    let request_id = path.into_inner();

    let support_request = support_call_requests::get_request_by_id(&pool, request_id)
        .await?
        .ok_or_else(|| AppError::not_found("Support call request not found"))?;

    let call = support_calls::get_call_by_id(&pool, support_request.support_call_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Request references a missing call"))?;

    let course = owning_course(&pool, &call).await?;

    if !can_manage_call(&caller, &call, course.user_id) {
        return Err(AppError::forbidden_error(
            "You are not allowed to manage requests for this call",
        ));
    }

    if !support_request.status.can_transition_to(request.status) {
        return Err(AppError::bad_request(format!(
            "Invalid status transition from {} to {}",
            support_request.status, request.status
        )));
    }

    let updated =
        support_call_requests::update_request_status(&pool, support_request.id, request.status)
            .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: updated,
        message: "Request updated successfully".to_string(),
    }))
}
