//! Shared test helpers for integration tests.
//!
//! The router is wired exactly as in production, but every store and the
//! push provider are in-memory fakes that record what they were asked.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use geliom_api::AppState;
use geliom_api::router::build_router;
use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_core::types::{
    GroupId, InviteId, JoinRequestId, PendingNotificationId, StatusId, UserId,
};
use geliom_database::store::{
    MembershipStore, PendingNotificationStore, RateLimitDecision, RateLimitQuery,
    RateLimitStore, RateLimitStoreError, UserDirectory,
};
use geliom_entity::group::{
    DirectInviteCreated, JoinRequestCreated, JoinRequestResolution, JoinRequestStatus,
};
use geliom_entity::notification::DuePendingNotification;
use geliom_service::push::{PushError, PushMessage, PushProvider, PushReceipt};
use geliom_service::{
    MembershipService, NotificationDispatcher, PendingNotificationSweeper, RateLimitGate,
};

pub const JWT_SECRET: &str = "integration-test-secret";

/// Known users.
#[derive(Default)]
pub struct FakeUsers {
    known: Mutex<HashSet<UserId>>,
}

impl FakeUsers {
    pub fn add(&self, user: UserId) -> UserId {
        self.known.lock().unwrap().insert(user);
        user
    }
}

#[async_trait]
impl UserDirectory for FakeUsers {
    async fn existing_users(&self, ids: &[UserId]) -> Result<Vec<UserId>, AppError> {
        let known = self.known.lock().unwrap();
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| known.contains(id) && seen.insert(*id))
            .collect())
    }
}

/// Rate-limit windows keyed by receiver.
#[derive(Default)]
pub struct FakeRateLimits {
    blocked: Mutex<HashMap<UserId, DateTime<Utc>>>,
    checked: Mutex<Vec<RateLimitQuery>>,
}

impl FakeRateLimits {
    pub fn block(&self, receiver: UserId, until: DateTime<Utc>) {
        self.blocked.lock().unwrap().insert(receiver, until);
    }

    pub fn checked(&self) -> Vec<RateLimitQuery> {
        self.checked.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateLimitStore for FakeRateLimits {
    async fn check_rate_limit(
        &self,
        query: &RateLimitQuery,
    ) -> Result<RateLimitDecision, RateLimitStoreError> {
        self.checked.lock().unwrap().push(*query);
        let blocked = self.blocked.lock().unwrap().get(&query.receiver_id).copied();
        Ok(match blocked {
            Some(until) => RateLimitDecision {
                can_send: false,
                wait_until: Some(until),
            },
            None => RateLimitDecision {
                can_send: true,
                wait_until: None,
            },
        })
    }
}

/// Records delivered pushes; can be told to reject.
#[derive(Default)]
pub struct FakePush {
    delivered: Mutex<Vec<PushMessage>>,
    rejection: Mutex<Option<(u16, String)>>,
    bad_credentials: AtomicBool,
}

impl FakePush {
    pub fn reject_with(&self, status: u16, body: &str) {
        *self.rejection.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn break_credentials(&self) {
        self.bad_credentials.store(true, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<PushMessage> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushProvider for FakePush {
    fn check_credentials(&self) -> Result<(), AppError> {
        if self.bad_credentials.load(Ordering::SeqCst) {
            return Err(AppError::configuration("Push REST API key is not configured"));
        }
        Ok(())
    }

    async fn deliver(&self, message: &PushMessage) -> Result<PushReceipt, PushError> {
        if let Some((status, body)) = self.rejection.lock().unwrap().clone() {
            return Err(PushError::Rejected {
                status,
                body,
                diagnosis: None,
            });
        }
        let mut delivered = self.delivered.lock().unwrap();
        delivered.push(message.clone());
        Ok(PushReceipt {
            id: Some(format!("push-{}", delivered.len())),
            errors: None,
        })
    }
}

/// The pending_notifications table.
#[derive(Default)]
pub struct FakePending {
    rows: Mutex<Vec<DuePendingNotification>>,
    rescheduled: Mutex<Vec<(PendingNotificationId, DateTime<Utc>)>>,
    down: AtomicBool,
}

impl FakePending {
    pub fn push(&self, row: DuePendingNotification) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn remaining(&self) -> Vec<PendingNotificationId> {
        self.rows.lock().unwrap().iter().map(|r| r.id).collect()
    }

    pub fn rescheduled(&self) -> Vec<(PendingNotificationId, DateTime<Utc>)> {
        self.rescheduled.lock().unwrap().clone()
    }
}

#[async_trait]
impl PendingNotificationStore for FakePending {
    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<DuePendingNotification>, AppError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::database("connection refused"));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.scheduled_at <= now)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: PendingNotificationId) -> Result<(), AppError> {
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn reschedule(
        &self,
        id: PendingNotificationId,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        for row in self.rows.lock().unwrap().iter_mut().filter(|r| r.id == id) {
            row.scheduled_at = at;
        }
        self.rescheduled.lock().unwrap().push((id, at));
        Ok(())
    }
}

/// Membership procedures over a single group.
pub struct FakeMembership {
    pub group_id: GroupId,
    pub owner_id: UserId,
    pub invite_code: String,
    pub requests: Mutex<HashMap<JoinRequestId, UserId>>,
}

impl FakeMembership {
    fn new(owner_id: UserId) -> Self {
        Self {
            group_id: GroupId::new(),
            owner_id,
            invite_code: "AILE42".to_string(),
            requests: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MembershipStore for FakeMembership {
    async fn create_join_request(
        &self,
        actor: UserId,
        invite_code: &str,
    ) -> Result<JoinRequestCreated, AppError> {
        if invite_code != self.invite_code {
            return Err(AppError::not_found("Invalid invite code"));
        }
        let request_id = JoinRequestId::new();
        self.requests.lock().unwrap().insert(request_id, actor);
        Ok(JoinRequestCreated {
            request_id,
            group_id: self.group_id,
            group_name: "Aile".to_string(),
            owner_id: self.owner_id,
            requester_name: Some("Deniz".to_string()),
        })
    }

    async fn respond_to_join_request(
        &self,
        actor: UserId,
        request_id: JoinRequestId,
        approve: bool,
    ) -> Result<JoinRequestResolution, AppError> {
        if actor != self.owner_id {
            return Err(AppError::authorization("Only the group owner can respond"));
        }
        let requester_id = self
            .requests
            .lock()
            .unwrap()
            .remove(&request_id)
            .ok_or_else(|| AppError::not_found("Join request not found"))?;
        Ok(JoinRequestResolution {
            request_id,
            group_id: self.group_id,
            group_name: "Aile".to_string(),
            requester_id,
            status: if approve {
                JoinRequestStatus::Approved
            } else {
                JoinRequestStatus::Rejected
            },
        })
    }

    async fn create_direct_invite(
        &self,
        _actor: UserId,
        group_id: GroupId,
        _invitee: UserId,
    ) -> Result<DirectInviteCreated, AppError> {
        Ok(DirectInviteCreated {
            invite_id: InviteId::new(),
            group_id,
            group_name: "Aile".to_string(),
            inviter_name: None,
        })
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    pub state: AppState,
    pub users: Arc<FakeUsers>,
    pub limits: Arc<FakeRateLimits>,
    pub push: Arc<FakePush>,
    pub pending: Arc<FakePending>,
    pub membership: Arc<FakeMembership>,
}

impl TestApp {
    /// Open function endpoints, JWT-protected membership routes.
    pub fn new() -> Self {
        Self::with_function_key("")
    }

    pub fn with_function_key(function_key: &str) -> Self {
        let config = AppConfig::from_toml(&format!(
            r#"
            [database]
            url = "postgres://localhost/geliom_test"

            [auth]
            jwt_secret = "{JWT_SECRET}"
            function_key = "{function_key}"
            "#
        ))
        .expect("test config");

        let users = Arc::new(FakeUsers::default());
        let limits = Arc::new(FakeRateLimits::default());
        let push = Arc::new(FakePush::default());
        let pending = Arc::new(FakePending::default());
        let owner = users.add(UserId::new());
        let membership = Arc::new(FakeMembership::new(owner));

        let dispatcher =
            NotificationDispatcher::new(users.clone(), RateLimitGate::new(limits.clone()), push.clone());
        let sweeper = Arc::new(PendingNotificationSweeper::new(
            pending.clone(),
            users.clone(),
            dispatcher.clone(),
            &config.notifications,
        ));
        let membership_service = MembershipService::new(membership.clone(), dispatcher.clone());

        let state = AppState::new(config, None, dispatcher, sweeper, membership_service);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            users,
            limits,
            push,
            pending,
            membership,
        }
    }

    /// Register a new known user.
    pub fn user(&self) -> UserId {
        self.users.add(UserId::new())
    }

    /// Sign an access token for `user`.
    pub fn token_for(&self, user: UserId) -> String {
        encode(
            &Header::default(),
            &json!({ "sub": user, "exp": Utc::now().timestamp() + 3600 }),
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign token")
    }

    /// A due pending row from `sender` to `receivers` whose status notifies.
    pub fn pending_row(&self, sender: UserId, receivers: Vec<UserId>) -> DuePendingNotification {
        DuePendingNotification {
            id: PendingNotificationId::new(),
            sender_id: sender,
            receiver_ids: receivers,
            group_id: self.membership.group_id,
            status_id: StatusId::new(),
            scheduled_at: Utc::now() - chrono::Duration::seconds(5),
            sender_name: Some("Deniz".to_string()),
            group_name: Some("Aile".to_string()),
            status_text: Some("Evde".to_string()),
            status_emoji: Some("🏠".to_string()),
            status_notifies: Some(true),
            status_messages: None,
        }
    }

    /// Send a request with an optional JSON body and bearer token
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}
