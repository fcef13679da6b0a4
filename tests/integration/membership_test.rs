//! Integration tests for the membership routes and their notifications.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use geliom_entity::notification::NotificationType;
use helpers::TestApp;

#[tokio::test]
async fn test_join_request_requires_token() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            "/api/join-requests",
            Some(json!({ "invite_code": "AILE42" })),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let app = TestApp::new();

    let resp = app
        .request(
            "POST",
            "/api/join-requests",
            Some(json!({ "invite_code": "AILE42" })),
            Some("not.a.jwt"),
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_join_request_notifies_owner() {
    let app = TestApp::new();
    let requester = app.user();
    let token = app.token_for(requester);

    let resp = app
        .request(
            "POST",
            "/api/join-requests",
            Some(json!({ "invite_code": " AILE42 " })),
            Some(&token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["group_name"], "Aile");

    app.state.membership.drain().await;
    let pushes = app.push.delivered();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].recipients, vec![app.membership.owner_id]);
    assert_eq!(pushes[0].sender_id, Some(requester));
    assert_eq!(pushes[0].notification_type, NotificationType::JoinRequest);
}

#[tokio::test]
async fn test_unknown_invite_code_is_not_found() {
    let app = TestApp::new();
    let token = app.token_for(app.user());

    let resp = app
        .request(
            "POST",
            "/api/join-requests",
            Some(json!({ "invite_code": "NOPE" })),
            Some(&token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_owner_approval_notifies_requester() {
    let app = TestApp::new();
    let requester = app.user();

    let created = app
        .request(
            "POST",
            "/api/join-requests",
            Some(json!({ "invite_code": "AILE42" })),
            Some(&app.token_for(requester)),
        )
        .await;
    let request_id = created.body["request_id"].as_str().unwrap().to_string();

    let stranger = app
        .request(
            "POST",
            &format!("/api/join-requests/{request_id}/respond"),
            Some(json!({ "approve": true })),
            Some(&app.token_for(requester)),
        )
        .await;
    assert_eq!(stranger.status, StatusCode::FORBIDDEN);

    let resp = app
        .request(
            "POST",
            &format!("/api/join-requests/{request_id}/respond"),
            Some(json!({ "approve": true })),
            Some(&app.token_for(app.membership.owner_id)),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "approved");

    app.state.membership.drain().await;
    let status_push = app
        .push
        .delivered()
        .into_iter()
        .find(|p| p.notification_type == NotificationType::JoinRequestStatus)
        .expect("requester notified");
    assert_eq!(status_push.recipients, vec![requester]);
}

#[tokio::test]
async fn test_direct_invite_is_created() {
    let app = TestApp::new();
    let invitee = app.user();
    let token = app.token_for(app.membership.owner_id);

    let resp = app
        .request(
            "POST",
            &format!("/api/groups/{}/invites", app.membership.group_id),
            Some(json!({ "invitee_id": invitee })),
            Some(&token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["group_id"], json!(app.membership.group_id));

    app.state.membership.drain().await;
    let pushes = app.push.delivered();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].recipients, vec![invitee]);
    assert_eq!(pushes[0].notification_type, NotificationType::DirectInvite);
}
