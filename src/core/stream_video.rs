use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::core::config::StreamVideoConfig;
use crate::core::{AppError, AppErrorType};

/// Client for the managed video-calling provider. The provider owns room
/// lifecycle and media transport; this service only creates/fetches rooms,
/// marks them ended, and signs short-lived join credentials.
pub struct StreamVideoService {
    http: reqwest::Client,
    config: StreamVideoConfig,
}

#[derive(Serialize)]
struct JoinTokenClaims {
    user_id: String,
    iat: i64,
    exp: i64,
}

impl StreamVideoService {
    pub fn new(config: StreamVideoConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create the room if it does not exist yet; fetching an existing room
    /// is a success. Idempotent on the provider side, so a failed attempt
    /// can simply be retried.
    pub async fn create_or_get_room(&self, stream_call_id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/video/call/default/{}",
            self.config.base_url, stream_call_id
        );

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .bearer_auth(self.server_token()?)
            .json(&serde_json::json!({ "data": { "created_by_id": "learnhub-service" } }))
            .send()
            .await?;

        self.check_provider_response(response, "create room")
    }

    /// Mark a room ended on the provider. Ending a room that is already
    /// over is treated as success by the provider.
    pub async fn end_room(&self, stream_call_id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/video/call/default/{}/mark_ended",
            self.config.base_url, stream_call_id
        );

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .bearer_auth(self.server_token()?)
            .send()
            .await?;

        self.check_provider_response(response, "end room")
    }

    /// Sign a short-lived join credential for a user. Issued locally with
    /// the provider secret, no network round trip.
    pub fn issue_join_token(&self, user_id: i32) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = JoinTokenClaims {
            user_id: user_id.to_string(),
            iat: now,
            exp: now + self.config.token_expiration_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.api_secret.expose_secret().as_ref()),
        )
        .map_err(|_| AppError::internal_error("Failed to sign video join token"))
    }

    fn server_token(&self) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = JoinTokenClaims {
            user_id: "learnhub-service".to_string(),
            iat: now,
            exp: now + self.config.token_expiration_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.api_secret.expose_secret().as_ref()),
        )
        .map_err(|_| AppError::internal_error("Failed to sign video server token"))
    }

    fn check_provider_response(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<(), AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        tracing::error!(
            "Video provider rejected {} request with status {}",
            operation,
            status
        );

        Err(AppError {
            error_type: AppErrorType::ApiError {
                code: status.as_u16().to_string(),
                message: format!("Video provider rejected {} request", operation),
            },
            message: Some("The video call service is currently unavailable".to_string()),
            cause: Some(format!("{} returned {}", operation, status)),
        })
    }
}
