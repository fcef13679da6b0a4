//! Integration tests for the send-notification function.

mod helpers;

use axum::http::{StatusCode, header};
use chrono::{Duration, Utc};
use serde_json::json;

use geliom_entity::notification::NotificationType;
use helpers::TestApp;

const SEND: &str = "/functions/v1/send-notification";

#[tokio::test]
async fn test_send_delivers_to_existing_receivers() {
    let app = TestApp::new();
    let sender = app.user();
    let known = app.user();
    let unknown = geliom_core::types::UserId::new();

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [known, unknown],
                "sender_id": sender,
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Durum",
                "message": "Deniz: Evde 🏠",
                "type": "status_update",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["result"]["recipients"], 1);
    assert_eq!(resp.body["result"]["id"], "push-1");

    let delivered = app.push.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].recipients, vec![known]);
    assert_eq!(delivered[0].notification_type, NotificationType::StatusUpdate);
}

#[tokio::test]
async fn test_missing_fields_are_listed() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({ "receiver_ids": [], "title": "Durum" })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let error = resp.body["error"].as_str().unwrap();
    assert!(error.starts_with("Missing required fields"));
    assert!(error.contains("receiver_ids"));
    assert!(error.contains("group_name"));
    assert!(app.push.delivered().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();

    let resp = app
        .request("POST", SEND, Some(json!({ "receiver_ids": "nobody" })), None)
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.body["error"].is_string());
}

#[tokio::test]
async fn test_no_existing_receivers() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [geliom_core::types::UserId::new()],
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Durum",
                "message": "Merhaba",
                "type": "event_reminder",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "No valid recipients found");
}

#[tokio::test]
async fn test_direct_send_to_limited_receiver_sets_retry_after() {
    let app = TestApp::new();
    let sender = app.user();
    let owner = app.membership.owner_id;
    app.limits.block(owner, Utc::now() + Duration::minutes(3));

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [owner],
                "sender_id": sender,
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Katılma isteği",
                "message": "Deniz gruba katılmak istiyor",
                "type": "join_request",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.body["error"], "rate_limit_exceeded");
    let wait = resp.body["wait_seconds"].as_i64().unwrap();
    assert!(wait > 0 && wait <= 180);
    assert_eq!(
        resp.headers[header::RETRY_AFTER].to_str().unwrap(),
        wait.to_string()
    );
    assert!(app.push.delivered().is_empty());
}

#[tokio::test]
async fn test_broadcast_skips_limited_receivers() {
    let app = TestApp::new();
    let sender = app.user();
    let limited = app.user();
    let open = app.user();
    app.limits.block(limited, Utc::now() + Duration::minutes(1));

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [limited, open],
                "sender_id": sender,
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Ruh hali",
                "message": "Deniz: 😊",
                "type": "mood_update",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["result"]["recipients"], 1);
    assert_eq!(app.push.delivered()[0].recipients, vec![open]);
}

#[tokio::test]
async fn test_broadcast_with_every_receiver_limited() {
    let app = TestApp::new();
    let sender = app.user();
    let receiver = app.user();
    app.limits.block(receiver, Utc::now() + Duration::minutes(1));

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [receiver],
                "sender_id": sender,
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Durum",
                "message": "Deniz: Evde",
                "type": "status_update",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers.get(header::RETRY_AFTER).is_none());
}

#[tokio::test]
async fn test_provider_rejection_is_reported() {
    let app = TestApp::new();
    let receiver = app.user();
    app.push.reject_with(400, r#"{"errors":["Invalid app_id"]}"#);

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [receiver],
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Hatırlatma",
                "message": "Yarın 10:00",
                "type": "event_reminder",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["status"], 400);
    assert!(resp.body["details"].as_str().unwrap().contains("Invalid app_id"));
}

#[tokio::test]
async fn test_unusable_push_key_is_server_error() {
    let app = TestApp::new();
    let receiver = app.user();
    app.push.break_credentials();

    let resp = app
        .request(
            "POST",
            SEND,
            Some(json!({
                "receiver_ids": [receiver],
                "group_id": app.membership.group_id,
                "group_name": "Aile",
                "title": "Hatırlatma",
                "message": "Yarın 10:00",
                "type": "event_reminder",
            })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.body["details"].is_string());
}

#[tokio::test]
async fn test_function_key_is_enforced_when_configured() {
    let app = TestApp::with_function_key("service-role-key");
    let receiver = app.user();
    let body = json!({
        "receiver_ids": [receiver],
        "group_id": app.membership.group_id,
        "group_name": "Aile",
        "title": "Hatırlatma",
        "message": "Yarın 10:00",
        "type": "event_reminder",
    });

    let missing = app.request("POST", SEND, Some(body.clone()), None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let wrong = app
        .request("POST", SEND, Some(body.clone()), Some("anon-key"))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let ok = app
        .request("POST", SEND, Some(body), Some("service-role-key"))
        .await;
    assert_eq!(ok.status, StatusCode::OK);
}
