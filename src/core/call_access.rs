use serde::Serialize;

use crate::core::AppError;
use crate::models::support_calls::{CallStatus, RequestStatus, SupportCall, SupportCallRequest};
use crate::models::users::Role;

/// Caller identity, decoded once from the session token at the HTTP edge.
/// Core decisions never re-derive identity from ambient request state.
#[derive(Debug, Clone, Copy)]
pub struct CallerContext {
    pub user_id: i32,
    pub role: Role,
}

/// The answer to "can this caller join this call right now?".
///
/// A denial always carries enough context for a client to pick the next
/// step: the caller's latest request status when one exists, or a prompt
/// to request access when none does.
#[derive(Debug, Serialize, PartialEq)]
pub struct JoinPermission {
    pub can_join: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_status: Option<RequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i32>,
}

impl JoinPermission {
    fn granted(reason: &str) -> Self {
        JoinPermission {
            can_join: true,
            reason: reason.to_string(),
            request_status: None,
            request_id: None,
        }
    }

    fn denied(reason: &str) -> Self {
        JoinPermission {
            can_join: false,
            reason: reason.to_string(),
            request_status: None,
            request_id: None,
        }
    }

    /// An unknown stream call id is a negative decision, not an error.
    pub fn call_not_found() -> Self {
        JoinPermission::denied("call not found")
    }
}

pub fn is_course_owner(caller: &CallerContext, course_owner_id: i32) -> bool {
    caller.user_id == course_owner_id
}

pub fn is_session_creator(caller: &CallerContext, call: &SupportCall) -> bool {
    caller.user_id == call.created_by
}

/// Whether the caller may manage a call: accept/reject its join requests
/// and end the session. Operators, the owning course's owner, and the
/// session creator qualify. Requesters never manage their own requests
/// because a requester is by definition none of the three.
pub fn can_manage_call(caller: &CallerContext, call: &SupportCall, course_owner_id: i32) -> bool {
    caller.role.is_operator()
        || is_course_owner(caller, course_owner_id)
        || is_session_creator(caller, call)
}

#[derive(Debug, PartialEq, Eq)]
pub enum EndCallOutcome {
    /// The call is already over; report success without touching anything.
    AlreadyEnded,
    EndNow,
}

/// Decide an end-call attempt. The manage check runs before the
/// already-ended short-circuit: an unrelated caller gets a denial, never
/// a success envelope, regardless of the call's state.
pub fn authorize_end_call(
    caller: &CallerContext,
    call: &SupportCall,
    course_owner_id: i32,
) -> Result<EndCallOutcome, AppError> {
    if !can_manage_call(caller, call, course_owner_id) {
        return Err(AppError::forbidden_error(
            "You are not allowed to end this support call",
        ));
    }

    if call.status == CallStatus::Ended {
        Ok(EndCallOutcome::AlreadyEnded)
    } else {
        Ok(EndCallOutcome::EndNow)
    }
}

/// Decide join eligibility for a caller against a call. Pure: reads only
/// the rows handed to it and never mutates, so clients may poll it freely.
///
/// Priority order, first match wins: operator, course owner, session
/// creator, then the caller's latest request for this call.
pub fn resolve_permission(
    caller: &CallerContext,
    call: &SupportCall,
    course_owner_id: i32,
    latest_request: Option<&SupportCallRequest>,
) -> JoinPermission {
    if caller.role.is_operator() {
        return JoinPermission::granted("operator");
    }

    if is_course_owner(caller, course_owner_id) {
        return JoinPermission::granted("course owner");
    }

    if is_session_creator(caller, call) {
        return JoinPermission::granted("session creator");
    }

    match latest_request {
        Some(request) => {
            let mut permission = match request.status {
                RequestStatus::Accepted => JoinPermission::granted("accepted request"),
                RequestStatus::Pending => JoinPermission::denied("request pending approval"),
                RequestStatus::Rejected => {
                    JoinPermission::denied("request rejected, you may request again")
                }
                RequestStatus::Completed => JoinPermission::denied("must request access"),
            };
            permission.request_status = Some(request.status);
            permission.request_id = Some(request.id);
            permission
        }
        None => JoinPermission::denied("must request access"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppErrorType;
    use chrono::NaiveDateTime;
    use claim::{assert_err, assert_ok};

    fn caller(user_id: i32, role: Role) -> CallerContext {
        CallerContext { user_id, role }
    }

    fn call(created_by: i32) -> SupportCall {
        SupportCall {
            id: 10,
            course_id: 5,
            created_by,
            stream_call_id: "room-abc".to_string(),
            status: CallStatus::Active,
            title: Some("Office hours".to_string()),
            description: None,
            created_at: NaiveDateTime::default(),
            ended_at: None,
        }
    }

    fn request(id: i32, user_id: i32, status: RequestStatus) -> SupportCallRequest {
        SupportCallRequest {
            id,
            support_call_id: 10,
            user_id,
            support_type: "General".to_string(),
            status,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    const OWNER: i32 = 1;
    const CREATOR: i32 = 2;
    const STUDENT: i32 = 3;

    #[test]
    fn operators_always_join() {
        let call = call(CREATOR);
        for role in [Role::Admin, Role::Superadmin] {
            let permission = resolve_permission(&caller(99, role), &call, OWNER, None);
            assert!(permission.can_join);
            assert_eq!(permission.reason, "operator");
        }
    }

    #[test]
    fn course_owner_joins_regardless_of_request_state() {
        let call = call(CREATOR);
        let rejected = request(7, OWNER, RequestStatus::Rejected);
        let permission =
            resolve_permission(&caller(OWNER, Role::User), &call, OWNER, Some(&rejected));
        assert!(permission.can_join);
        assert_eq!(permission.reason, "course owner");
    }

    #[test]
    fn session_creator_joins() {
        let call = call(CREATOR);
        let permission = resolve_permission(&caller(CREATOR, Role::User), &call, OWNER, None);
        assert!(permission.can_join);
        assert_eq!(permission.reason, "session creator");
    }

    #[test]
    fn student_joins_only_with_an_accepted_request() {
        let call = call(CREATOR);
        let me = caller(STUDENT, Role::User);

        let accepted = request(7, STUDENT, RequestStatus::Accepted);
        let permission = resolve_permission(&me, &call, OWNER, Some(&accepted));
        assert!(permission.can_join);
        assert_eq!(permission.reason, "accepted request");
        assert_eq!(permission.request_id, Some(7));

        for status in [
            RequestStatus::Pending,
            RequestStatus::Rejected,
            RequestStatus::Completed,
        ] {
            let req = request(8, STUDENT, status);
            let permission = resolve_permission(&me, &call, OWNER, Some(&req));
            assert!(!permission.can_join);
            assert_eq!(permission.request_status, Some(status));
            assert_eq!(permission.request_id, Some(8));
        }
    }

    #[test]
    fn student_without_a_request_must_request_access() {
        let call = call(CREATOR);
        let permission = resolve_permission(&caller(STUDENT, Role::User), &call, OWNER, None);
        assert!(!permission.can_join);
        assert_eq!(permission.reason, "must request access");
        assert_eq!(permission.request_status, None);
        assert_eq!(permission.request_id, None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let call = call(CREATOR);
        let me = caller(STUDENT, Role::User);
        let pending = request(7, STUDENT, RequestStatus::Pending);

        let first = resolve_permission(&me, &call, OWNER, Some(&pending));
        let second = resolve_permission(&me, &call, OWNER, Some(&pending));
        assert_eq!(first, second);
    }

    #[test]
    fn unrelated_callers_cannot_end_a_call_even_once_it_has_ended() {
        let mut ended = call(CREATOR);
        ended.status = CallStatus::Ended;

        let err = assert_err!(authorize_end_call(
            &caller(STUDENT, Role::User),
            &ended,
            OWNER
        ));
        assert_eq!(err.error_type, AppErrorType::ForbiddenError);
    }

    #[test]
    fn managers_ending_an_ended_call_is_a_noop_success() {
        let mut ended = call(CREATOR);
        ended.status = CallStatus::Ended;

        for manager in [
            caller(99, Role::Admin),
            caller(OWNER, Role::User),
            caller(CREATOR, Role::User),
        ] {
            let outcome = assert_ok!(authorize_end_call(&manager, &ended, OWNER));
            assert_eq!(outcome, EndCallOutcome::AlreadyEnded);
        }
    }

    #[test]
    fn managers_end_an_active_call() {
        let active = call(CREATOR);
        let outcome = assert_ok!(authorize_end_call(&caller(OWNER, Role::User), &active, OWNER));
        assert_eq!(outcome, EndCallOutcome::EndNow);
    }

    #[test]
    fn managers_are_operator_owner_or_creator() {
        let call = call(CREATOR);

        assert!(can_manage_call(&caller(99, Role::Admin), &call, OWNER));
        assert!(can_manage_call(&caller(OWNER, Role::User), &call, OWNER));
        assert!(can_manage_call(&caller(CREATOR, Role::User), &call, OWNER));
        assert!(!can_manage_call(&caller(STUDENT, Role::User), &call, OWNER));
    }
}
