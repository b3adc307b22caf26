#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use recruitflow_api::config::ServerConfig;
use recruitflow_api::router::build_app_router;
use recruitflow_api::state::AppState;
use recruitflow_core::pipeline::STATUS_QUALIFIED;
use recruitflow_core::types::DbId;
use recruitflow_db::models::applicant::CreateApplicant;
use recruitflow_db::models::automation::{Automation, CreateAutomation};
use recruitflow_db::models::client::{Client, CreateClient};
use recruitflow_db::models::email_template::{CreateEmailTemplate, EmailTemplate};
use recruitflow_db::repositories::{ApplicantRepo, AutomationRepo, ClientRepo, EmailTemplateRepo};
use recruitflow_events::{MessageTransport, OutboundMessage, RetryPolicy, TransportError};
use recruitflow_worker::store::PgRuleStore;
use recruitflow_worker::EngineConfig;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_body_bytes: 64 * 1024,
    }
}

pub fn engine_config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        },
        portal_base_url: "https://portal.test".to_string(),
        ..EngineConfig::default()
    }
}

/// Transport that keeps every message in memory, or refuses all of them.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failing: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        if self.failing {
            return Err(TransportError::Transient("421 service not available".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Build the full application router over `pool`, as `main.rs` does.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(RecordingTransport::default()))
}

pub fn build_test_app_with(pool: PgPool, transport: Arc<RecordingTransport>) -> Router {
    let store = Arc::new(PgRuleStore::new(pool.clone()));
    let state = AppState::new(pool, test_config(), engine_config(), store, transport);
    build_app_router(state)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn new_client(pool: &PgPool, slug: &str) -> Client {
    ClientRepo::create(
        pool,
        &CreateClient {
            name: format!("Client {slug}"),
            slug: slug.to_string(),
        },
    )
    .await
    .unwrap()
}

/// A qualified applicant with an email address.
pub async fn qualified_applicant(pool: &PgPool, client_id: DbId) -> DbId {
    let applicant = ApplicantRepo::create(
        pool,
        &CreateApplicant {
            client_id,
            first_name: Some("Anna".to_string()),
            last_name: Some("Berger".to_string()),
            email: Some("anna@example.test".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    ApplicantRepo::update_status(pool, applicant.id, STATUS_QUALIFIED)
        .await
        .unwrap();
    applicant.id
}

pub async fn template(pool: &PgPool, client_id: DbId, slug: &str, review: bool) -> EmailTemplate {
    EmailTemplateRepo::create(
        pool,
        &CreateEmailTemplate {
            client_id,
            slug: slug.to_string(),
            name: "Qualifiziert".to_string(),
            subject: "Hallo {{bewerber_vorname}}".to_string(),
            body: "Willkommen bei {{firmenname}}. {{unbekannt}}".to_string(),
            recipient_type: None,
            review_before_send: Some(review),
        },
    )
    .await
    .unwrap()
}

/// A status-change automation sending the `qualified` template.
pub async fn qualified_automation(pool: &PgPool, client_id: DbId, to_status: &str) -> Automation {
    AutomationRepo::create(
        pool,
        &CreateAutomation {
            client_id,
            name: "Qualifiziert-Mail".to_string(),
            description: None,
            trigger_type: "status_change".to_string(),
            trigger_config: Some(serde_json::json!({"to_status": to_status})),
            condition_config: None,
            action_type: "send_message".to_string(),
            action_config: Some(serde_json::json!({"template_slug": "qualified"})),
            is_active: None,
            is_system: None,
            only_once_per_subject: None,
            send_window_start: None,
            send_window_end: None,
        },
    )
    .await
    .unwrap()
}

pub fn status_changed(applicant_id: DbId) -> serde_json::Value {
    serde_json::json!({
        "subject_type": "applicant",
        "subject_id": applicant_id,
        "event_kind": "status_changed",
        "payload": {"from_status": "Neu", "to_status": STATUS_QUALIFIED},
    })
}
