//! Integration tests for the pending-notification sweep function.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};

use helpers::TestApp;

const SWEEP: &str = "/functions/v1/process-pending-notifications";

#[tokio::test]
async fn test_nothing_due() {
    let app = TestApp::new();

    let resp = app.request("POST", SWEEP, None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["processed"], 0);
    assert_eq!(resp.body["message"], "No pending notifications to process");
    assert!(resp.body.get("total").is_none());
}

#[tokio::test]
async fn test_due_rows_are_delivered_and_deleted() {
    let app = TestApp::new();
    let sender = app.user();
    let receiver = app.user();

    let delivered = app.pending_row(sender, vec![receiver]);
    let mut silent = app.pending_row(sender, vec![receiver]);
    silent.status_notifies = Some(false);
    let mut future = app.pending_row(sender, vec![receiver]);
    future.scheduled_at = Utc::now() + Duration::minutes(10);
    let future_id = future.id;

    app.pending.push(delivered);
    app.pending.push(silent);
    app.pending.push(future);

    let resp = app.request("POST", SWEEP, None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["processed"], 2);
    assert_eq!(resp.body["errors"], 0);
    assert_eq!(resp.body["total"], 2);
    assert_eq!(app.pending.remaining(), vec![future_id]);

    let pushes = app.push.delivered();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].recipients, vec![receiver]);
    assert_eq!(pushes[0].sender_id, Some(sender));
    assert_eq!(pushes[0].group_name, "Aile");
}

#[tokio::test]
async fn test_rate_limited_row_is_rescheduled() {
    let app = TestApp::new();
    let sender = app.user();
    let receiver = app.user();
    app.limits.block(receiver, Utc::now() + Duration::minutes(1));

    let row = app.pending_row(sender, vec![receiver]);
    let id = row.id;
    app.pending.push(row);

    let started = Utc::now();
    let resp = app.request("POST", SWEEP, None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["processed"], 1);
    assert_eq!(resp.body["errors"], 0);
    assert_eq!(app.pending.remaining(), vec![id]);

    let rescheduled = app.pending.rescheduled();
    assert_eq!(rescheduled.len(), 1);
    assert_eq!(rescheduled[0].0, id);
    assert!(rescheduled[0].1 > started);
    assert!(app.push.delivered().is_empty());
}

#[tokio::test]
async fn test_failed_send_drops_row_and_counts_error() {
    let app = TestApp::new();
    let sender = app.user();
    let receiver = app.user();
    app.push.reject_with(500, "upstream unavailable");
    app.pending.push(app.pending_row(sender, vec![receiver]));

    let resp = app.request("POST", SWEEP, None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["processed"], 0);
    assert_eq!(resp.body["errors"], 1);
    assert_eq!(resp.body["total"], 1);
    assert!(app.pending.remaining().is_empty());
}

#[tokio::test]
async fn test_rows_without_existing_receivers_are_discarded() {
    let app = TestApp::new();
    let sender = app.user();
    app.pending
        .push(app.pending_row(sender, vec![geliom_core::types::UserId::new()]));

    let resp = app.request("POST", SWEEP, None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["processed"], 1);
    assert!(app.pending.remaining().is_empty());
    assert!(app.push.delivered().is_empty());
}

#[tokio::test]
async fn test_store_outage_is_server_error() {
    let app = TestApp::new();
    app.pending.go_down();

    let resp = app.request("POST", SWEEP, None, None).await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.body["details"].is_string());
}
