use claim::{assert_err, assert_ok};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use learnhub::core::config::StreamVideoConfig;
use learnhub::core::StreamVideoService;
use secrecy::Secret;
use serde::Deserialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_SECRET: &str = "test-video-secret";

fn service_for(server: &MockServer) -> StreamVideoService {
    StreamVideoService::new(StreamVideoConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        api_secret: Secret::new(API_SECRET.to_string()),
        token_expiration_secs: 3600,
    })
}

#[tokio::test]
async fn create_or_get_room_succeeds_when_provider_accepts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/video/call/default/room-42"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_ok!(service.create_or_get_room("room-42").await);
}

#[tokio::test]
async fn create_or_get_room_surfaces_provider_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/video/call/default/room-42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_err!(service.create_or_get_room("room-42").await);
}

#[tokio::test]
async fn end_room_marks_the_room_ended() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/video/call/default/room-42/mark_ended"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_ok!(service.end_room("room-42").await);
}

#[derive(Debug, Deserialize)]
struct DecodedJoinToken {
    user_id: String,
    exp: i64,
    iat: i64,
}

#[tokio::test]
async fn join_tokens_are_signed_with_the_provider_secret() {
    let server = MockServer::start().await;
    let service = service_for(&server);

    let token = service.issue_join_token(17).expect("token should be issued");

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let decoded = decode::<DecodedJoinToken>(
        &token,
        &DecodingKey::from_secret(API_SECRET.as_ref()),
        &validation,
    )
    .expect("token should verify against the provider secret");

    assert_eq!(decoded.claims.user_id, "17");
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
}
