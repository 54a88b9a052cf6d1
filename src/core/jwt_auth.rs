use actix_web::{dev::Payload, web, Error as ActixWebError};
use actix_web::{error::ErrorUnauthorized, http, FromRequest, HttpMessage, HttpRequest};
use core::fmt;
use jsonwebtoken::{decode, DecodingKey, Validation};
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::call_access::CallerContext;
use crate::core::config::JwtAuthConfig;
use crate::core::AppError;
use crate::models::users::Role;

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user ID
    pub email: String,
    pub role: String,
    pub exp: usize, // expiration time
}

impl JwtClaims {
    /// Turn session claims into the explicit caller identity the core
    /// operations take. Rejects tokens carrying ids or roles we do not
    /// recognize instead of letting them reach business logic.
    pub fn caller_context(&self) -> Result<CallerContext, AppError> {
        let user_id: i32 = self
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))?;

        let role: Role = self
            .role
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid role in token"))?;

        Ok(CallerContext { user_id, role })
    }
}

pub fn generate_jwt_token(claims: &JwtClaims, config: &JwtAuthConfig) -> Result<String, AppError> {
    let header = Header::default();
    let encoding_key = EncodingKey::from_secret(config.secret.expose_secret().as_ref());

    encode(&header, claims, &encoding_key)
        .map_err(|_| AppError::internal_error("Failed to generate JWT token"))
}

fn decode_claims_from_header(req: &HttpRequest) -> Result<JwtClaims, ErrorResponse> {
    let config = req
        .app_data::<web::Data<JwtAuthConfig>>()
        .ok_or_else(|| ErrorResponse {
            message: "Authentication is not configured".to_string(),
            success: false,
        })?;

    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ErrorResponse {
            message: "No authentication token found".to_string(),
            success: false,
        })?;

    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.secret.expose_secret().as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ErrorResponse {
        message: "Invalid token".to_string(),
        success: false,
    })
}

impl FromRequest for JwtClaims {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            return ready(Ok(claims.clone()));
        }

        match decode_claims_from_header(req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims.clone());
                ready(Ok(claims))
            }
            Err(error) => ready(Err(ErrorUnauthorized(error))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::Utc;
    use claim::{assert_err, assert_ok};
    use secrecy::Secret;

    fn test_config() -> JwtAuthConfig {
        JwtAuthConfig {
            secret: Secret::new("a-test-signing-secret".to_string()),
            token_expiration_time: 3600,
        }
    }

    fn test_claims() -> JwtClaims {
        JwtClaims {
            sub: "17".to_string(),
            email: "student@example.com".to_string(),
            role: "user".to_string(),
            exp: (Utc::now().timestamp() + 3600) as usize,
        }
    }

    #[test]
    fn tokens_round_trip_through_the_configured_secret() {
        let config = test_config();
        let token = assert_ok!(generate_jwt_token(&test_claims(), &config));

        let req = TestRequest::default()
            .insert_header((http::header::AUTHORIZATION, format!("Bearer {}", token)))
            .app_data(web::Data::new(config))
            .to_http_request();

        let decoded = assert_ok!(decode_claims_from_header(&req));
        assert_eq!(decoded.sub, "17");
        assert_eq!(decoded.role, "user");
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let other = JwtAuthConfig {
            secret: Secret::new("somebody-elses-secret".to_string()),
            token_expiration_time: 3600,
        };
        let token = assert_ok!(generate_jwt_token(&test_claims(), &other));

        let req = TestRequest::default()
            .insert_header((http::header::AUTHORIZATION, format!("Bearer {}", token)))
            .app_data(web::Data::new(test_config()))
            .to_http_request();

        assert_err!(decode_claims_from_header(&req));
    }

    #[test]
    fn claims_resolve_to_a_caller_context() {
        let caller = assert_ok!(test_claims().caller_context());
        assert_eq!(caller.user_id, 17);
        assert_eq!(caller.role, Role::User);

        let mut bad_role = test_claims();
        bad_role.role = "manager".to_string();
        assert_err!(bad_role.caller_context());
    }
}
