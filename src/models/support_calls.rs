use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Active,
    Ended,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }

    /// A request moves Pending -> Accepted/Rejected by a manager decision,
    /// and a decided request may be closed out as Completed when the
    /// session wraps up. Nothing ever moves back to Pending; re-requesting
    /// after a rejection inserts a fresh row instead.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Accepted, RequestStatus::Completed)
                | (RequestStatus::Rejected, RequestStatus::Completed)
        )
    }

    /// Open requests block a duplicate attempt for the same call and user.
    pub fn is_open(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Accepted)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SupportCall {
    pub id: i32,
    pub course_id: i32,
    pub created_by: i32,
    pub stream_call_id: String,
    pub status: CallStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SupportCallRequest {
    pub id: i32,
    pub support_call_id: i32,
    pub user_id: i32,
    pub support_type: String,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateCallRequest {
    pub course_id: i32,
    pub stream_call_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupportRequest {
    pub support_call_id: i32,
    pub support_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionSupportRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize)]
pub struct PermissionQuery {
    pub stream_call_id: String,
}

#[derive(Debug, Serialize)]
pub struct JoinTokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_requests_can_only_be_decided() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Accepted));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn decided_requests_only_complete() {
        assert!(RequestStatus::Accepted.can_transition_to(RequestStatus::Completed));
        assert!(RequestStatus::Rejected.can_transition_to(RequestStatus::Completed));

        assert!(!RequestStatus::Accepted.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Accepted.can_transition_to(RequestStatus::Rejected));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Accepted));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn completed_is_terminal() {
        for next in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
            RequestStatus::Completed,
        ] {
            assert!(!RequestStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn only_pending_and_accepted_are_open() {
        assert!(RequestStatus::Pending.is_open());
        assert!(RequestStatus::Accepted.is_open());
        assert!(!RequestStatus::Rejected.is_open());
        assert!(!RequestStatus::Completed.is_open());
    }
}
