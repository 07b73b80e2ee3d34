//! Router tests for the action endpoints.
//!
//! The range API is a wiremock server; the reputation client and notifier are
//! in-process doubles so each test controls the decision inputs.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use identity_actions::geo::StaticCountryTable;
use identity_actions::profile::{LogNotifier, ProfileUpdatePolicy};
use identity_actions::reputation::{ReputationClient, ReputationError};
use identity_actions::token::{TokenIssuancePolicy, TokenRules};
use identity_actions::{AppState, create_router};
use pwned_range::{HibpClient, RangeClientConfig};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

const PASSWORD_RANGE: &str = "003D68EB55068C33ACE09247EE4C639306B:0\r\n\
                              1E4C9B93F3F0682250B6CF8331B7EE68FD8:37854\r\n";

struct FixedScore(u32);

#[async_trait]
impl ReputationClient for FixedScore {
    async fn abuse_confidence_score(&self, _ip: IpAddr) -> Result<u32, ReputationError> {
        Ok(self.0)
    }
}

fn app(range_server: &MockServer, api_key: Option<&str>) -> Router {
    let range = HibpClient::new(
        RangeClientConfig::default().api_url(format!("{}/range/", range_server.uri())),
    )
    .unwrap();
    let countries = StaticCountryTable::new().with_entry("203.0.113.7".parse().unwrap(), "IR");
    let token =
        TokenIssuancePolicy::new(Arc::new(countries), Arc::new(FixedScore(10)), TokenRules::default());
    let profile = ProfileUpdatePolicy::new(
        vec!["Engineering".into(), "HR".into()],
        Arc::new(LogNotifier),
    )
    .with_api_key(api_key.map(str::to_string));

    create_router(AppState::new(Arc::new(range), token, profile))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("failed to make request");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = serde_json::from_slice(&body).expect("response should be JSON");
    (status, value)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn password_event(credential: Value) -> Value {
    json!({
        "actionType": "PRE_UPDATE_PASSWORD",
        "event": {"user": {"id": "user-1", "updatingCredential": credential}}
    })
}

async fn range_server(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/range/5BAA6"))
        .and(matchers::header("Add-Padding", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn health_check_reports_ok() {
    let server = MockServer::start().await;
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = send(app(&server, None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn compromised_password_fails_action() {
    let server = range_server(PASSWORD_RANGE).await;

    let (status, body) = send(
        app(&server, None),
        post_json(
            "/passwordcheck",
            password_event(json!({"type": "PASSWORD", "format": "PLAIN_TEXT", "value": "password"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "actionStatus": "FAILED",
            "failureReason": "password_compromised",
            "failureDescription": "The provided password is compromised."
        })
    );
}

#[tokio::test]
async fn base64_credential_is_decoded() {
    let server = range_server(PASSWORD_RANGE).await;

    let (status, body) = send(
        app(&server, None),
        post_json(
            "/passwordcheck",
            password_event(json!({"type": "PASSWORD", "format": "HASH", "value": "cGFzc3dvcmQ="})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actionStatus"], "FAILED");
}

#[tokio::test]
async fn clean_password_succeeds() {
    let server = range_server("1E4C9B93F3F0682250B6CF8331B7EE68FD8:0\r\n").await;

    let (status, body) = send(
        app(&server, None),
        post_json("/passwordcheck", password_event(json!({"type": "PASSWORD", "value": "password"}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"actionStatus": "SUCCESS", "message": "Password is not compromised."}));
}

#[tokio::test]
async fn non_password_credential_is_rejected() {
    let server = MockServer::start().await;

    let (status, body) = send(
        app(&server, None),
        post_json("/passwordcheck", password_event(json!({"type": "USERNAME", "value": "password"}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["actionStatus"], "ERROR");
    assert_eq!(body["error"], "invalid_credential");
    assert_eq!(body["errorDescription"], "No password credential found.");
}

#[tokio::test]
async fn bad_base64_is_rejected() {
    let server = MockServer::start().await;

    let (status, body) = send(
        app(&server, None),
        post_json(
            "/passwordcheck",
            password_event(json!({"type": "PASSWORD", "format": "HASH", "value": "***"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorDescription"], "Expects the encrypted credential.");
}

#[tokio::test]
async fn invalid_json_is_rejected() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/passwordcheck")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(&server, None), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let credential = "a".repeat(200 * 1024);

    let (status, body) = send(
        app(&server, None),
        post_json("/passwordcheck", password_event(json!({"type": "PASSWORD", "value": credential}))),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["actionStatus"], "ERROR");
    assert_eq!(body["error"], "request_too_large");
}

#[tokio::test]
async fn body_just_under_limit_is_accepted() {
    let server = range_server("1E4C9B93F3F0682250B6CF8331B7EE68FD8:0\r\n").await;
    let mut event = password_event(json!({"type": "PASSWORD", "value": "password"}));
    event["padding"] = json!("x".repeat(90 * 1024));

    let (status, body) = send(app(&server, None), post_json("/passwordcheck", event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actionStatus"], "SUCCESS");
}

#[tokio::test]
async fn upstream_rate_limit_is_propagated() {
    let server = MockServer::start().await;
    Mock::given(matchers::path("/range/5BAA6"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        app(&server, None),
        post_json("/passwordcheck", password_event(json!({"type": "PASSWORD", "value": "password"}))),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["actionStatus"], "ERROR");
    assert_eq!(body["error"], "rate_limited");
}

#[tokio::test]
async fn token_issuance_blocks_restricted_country() {
    let server = MockServer::start().await;
    let event = json!({
        "actionType": "PRE_ISSUE_ACCESS_TOKEN",
        "event": {"request": {"additionalHeaders": [
            {"name": "x-client-source-ip", "value": ["203.0.113.7"]}
        ]}}
    });

    let (status, body) = send(app(&server, None), post_json("/pre-issue-access-token", event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actionStatus"], "FAILED");
    assert_eq!(body["failureReason"], "access_denied");
    assert_eq!(
        body["failureDescription"],
        "Access token issuance is blocked from your region (IR)."
    );
}

#[tokio::test]
async fn token_issuance_low_risk_adds_country_claim() {
    let server = MockServer::start().await;
    let event = json!({
        "actionType": "PRE_ISSUE_ACCESS_TOKEN",
        "event": {"request": {"additionalHeaders": [
            {"name": "X-Client-Source-IP", "value": ["198.51.100.20"]}
        ]}}
    });

    let (status, body) = send(app(&server, None), post_json("/pre-issue-access-token", event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "actionStatus": "SUCCESS",
            "operations": [
                {"op": "add", "path": "/accessToken/claims/-", "value": {"name": "country", "value": "UNKNOWN"}}
            ]
        })
    );
}

#[tokio::test]
async fn profile_update_requires_api_key_when_configured() {
    let server = MockServer::start().await;
    let event = json!({"actionType": "PRE_UPDATE_PROFILE", "event": {}});

    let (status, body) =
        send(app(&server, Some("s3cret")), post_json("/validate-user-profile-update", event.clone()))
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["failureReason"], "unauthorized");

    let mut request = post_json("/validate-user-profile-update", event);
    request.headers_mut().insert("api-key", "s3cret".parse().unwrap());
    let (status, body) = send(app(&server, Some("s3cret")), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"actionStatus": "SUCCESS"}));
}

#[tokio::test]
async fn profile_update_rejects_unknown_department() {
    let server = MockServer::start().await;
    let event = json!({
        "actionType": "PRE_UPDATE_PROFILE",
        "event": {
            "user": {"id": "user-9"},
            "request": {"claims": [{"uri": "http://wso2.org/claims/department", "value": "Sales"}]}
        }
    });

    let (status, body) = send(app(&server, None), post_json("/validate-user-profile-update", event)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failureReason"], "invalid_department_input");
}
