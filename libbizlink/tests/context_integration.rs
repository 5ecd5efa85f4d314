//! Integration tests for AppContext
//!
//! Drives the context end to end against a mock backend: session handling,
//! profile, announcements, projects, news and snapshot persistence.

use std::sync::Arc;

use libbizlink::config::NewsConfig;
use libbizlink::context::{LOGIN_FAILED, NEWS_FETCH_FAILED};
use libbizlink::error::SecureStoreError;
use libbizlink::secure_store::{keys, SecureStore};
use libbizlink::service::Services;
use libbizlink::storage::{ROOT_STATE_KEY, StateStorage};
use libbizlink::validation::{INVALID_EMAIL, PASSWORD_MISMATCH, WEAK_PASSWORD};
use libbizlink::{
    AnnouncementDraft, AnnouncementKind, ApiClient, ApiError, AppContext, BizlinkError,
    CompanyInfo, Config, MemoryStateStorage, ProjectStage, SecureStorage, StorageBackend,
};
use secrecy::SecretString;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    ctx: AppContext,
    storage: Arc<MemoryStateStorage>,
    server: MockServer,
}

async fn setup() -> Harness {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStateStorage::new());
    let ctx = context_for(&server, Arc::clone(&storage), SecureStorage::in_memory()).await;

    Harness {
        ctx,
        storage,
        server,
    }
}

async fn context_for(
    server: &MockServer,
    storage: Arc<MemoryStateStorage>,
    secure: SecureStorage,
) -> AppContext {
    let client = Arc::new(ApiClient::new(server.uri(), None).unwrap());
    let news_config = NewsConfig {
        base_url: server.uri(),
        ..NewsConfig::default()
    };
    let mut services = Services::new(client, news_config, None).unwrap();
    services.set_news_api_key(SecretString::from("test-news-key"));

    AppContext::bootstrap(services, secure, storage).await
}

fn auth_response(token: &str) -> serde_json::Value {
    json!({
        "status": "success",
        "token": token,
        "data": {
            "company": {
                "id": 7,
                "name": "X",
                "email": "a@b.com",
                "industry": "Y",
                "description": "Z"
            }
        }
    })
}

async fn logged_in() -> Harness {
    let mut harness = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("t1")))
        .mount(&harness.server)
        .await;

    harness.ctx.login("a@b.com", "abc12345").await.unwrap();
    harness
}

fn announcement_json(id: i64, title: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "Looking for partners",
        "type": "search",
        "listOfRequirementsOrServices": ["Rust"],
        "companyId": 7,
        "createdAt": created_at
    })
}

fn project_json(id: i64, stage: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Portal",
        "status": "active",
        "description": "Customer portal",
        "stage": stage,
        "customerCompany": "Acme",
        "executorCompany": { "id": 7, "name": "X" },
        "functions": ["login"],
        "expectedResult": "Shipped",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-02T00:00:00Z"
    })
}

fn invalid_input(result: libbizlink::Result<()>) -> String {
    match result {
        Err(BizlinkError::InvalidInput(message)) => message,
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
}

// === Session ===

#[tokio::test]
async fn test_login_success_populates_session_and_profile() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"email": "a@b.com", "password": "abc12345"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("t1")))
        .expect(1)
        .mount(&harness.server)
        .await;

    ctx.login("a@b.com", "abc12345").await.unwrap();

    let session = &ctx.state().session;
    assert!(session.authenticated);
    assert!(!session.loading);
    assert_eq!(session.token.as_ref().map(|t| t.expose()), Some("t1"));
    assert_eq!(session.user_id.as_deref(), Some("7"));
    assert_eq!(session.email.as_deref(), Some("a@b.com"));
    assert_eq!(session.last_error, None);

    let company = &ctx.state().company;
    assert_eq!(company.name, "X");
    assert_eq!(company.industry, "Y");
    assert_eq!(company.description, "Z");

    let secure = ctx.secure_storage();
    assert_eq!(secure.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("t1"));
    assert_eq!(secure.get(keys::USER_ID).unwrap().as_deref(), Some("7"));
    assert_eq!(secure.get(keys::EMAIL).unwrap().as_deref(), Some("a@b.com"));
    assert_eq!(
        secure.get(keys::IS_AUTHENTICATED).unwrap().as_deref(),
        Some("true")
    );

    assert!(ctx.services().client().has_token());
}

#[tokio::test]
async fn test_login_with_weak_password_never_hits_network() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("t1")))
        .expect(0)
        .mount(&harness.server)
        .await;

    let message = invalid_input(ctx.login("a@b.com", "short").await);
    assert_eq!(message, WEAK_PASSWORD);
    assert_eq!(ctx.state().session.last_error.as_deref(), Some(WEAK_PASSWORD));
    assert!(!ctx.state().session.authenticated);
    assert!(!ctx.state().session.loading);
}

#[tokio::test]
async fn test_login_rejects_malformed_emails() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("t1")))
        .expect(0)
        .mount(&harness.server)
        .await;

    for email in ["plain", "a@b", "a b@c.com", "@b.com"] {
        let message = invalid_input(ctx.login(email, "abc12345").await);
        assert_eq!(message, INVALID_EMAIL, "email {:?}", email);
    }
}

#[tokio::test]
async fn test_login_surfaces_server_message() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"status": "error", "message": "Invalid credentials"})),
        )
        .mount(&harness.server)
        .await;

    let err = ctx.login("a@b.com", "abc12345").await.unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(
        ctx.state().session.last_error.as_deref(),
        Some("Invalid credentials")
    );
    assert!(!ctx.state().session.authenticated);
}

#[tokio::test]
async fn test_login_without_server_message_uses_fallback() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;

    ctx.login("a@b.com", "abc12345").await.unwrap_err();
    assert_eq!(ctx.state().session.last_error.as_deref(), Some(LOGIN_FAILED));
}

#[tokio::test]
async fn test_login_with_unexpected_shape_is_decode_error() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&harness.server)
        .await;

    let err = ctx.login("a@b.com", "abc12345").await.unwrap_err();
    assert!(matches!(err, BizlinkError::Api(ApiError::Decode(_))));
    assert_eq!(
        ctx.state().session.last_error.as_deref(),
        Some("Invalid response format")
    );
}

#[tokio::test]
async fn test_register_password_mismatch_is_local() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(auth_response("t2")))
        .expect(0)
        .mount(&harness.server)
        .await;

    let message = invalid_input(ctx.register("a@b.com", "abc12345", "abc12346", None).await);
    assert_eq!(message, PASSWORD_MISMATCH);
    assert_eq!(
        ctx.state().session.last_error.as_deref(),
        Some(PASSWORD_MISMATCH)
    );
}

#[tokio::test]
async fn test_register_sends_company_details() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_partial_json(json!({
            "email": "a@b.com",
            "name": "X",
            "industry": "Y",
            "foundedYear": 2015
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(auth_response("t2")))
        .expect(1)
        .mount(&harness.server)
        .await;

    let company = libbizlink::CompanyRegistration {
        name: "X".to_string(),
        description: "Z".to_string(),
        industry: "Y".to_string(),
        founded_year: Some(2015),
        services: vec!["Consulting".to_string()],
    };
    ctx.register("a@b.com", "abc12345", "abc12345", Some(company))
        .await
        .unwrap();

    assert!(ctx.state().session.authenticated);
    assert_eq!(
        ctx.state().session.token.as_ref().map(|t| t.expose()),
        Some("t2")
    );
}

#[tokio::test]
async fn test_logout_clears_session_and_all_keys() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    ctx.logout().await.unwrap();

    let session = &ctx.state().session;
    assert!(!session.authenticated);
    assert!(session.token.is_none());
    assert!(session.user_id.is_none());
    assert!(session.email.is_none());

    for key in keys::SESSION {
        assert!(!ctx.secure_storage().exists(key).unwrap(), "{} remains", key);
    }
    assert!(!ctx.services().client().has_token());

    // Logging out twice is harmless
    ctx.logout().await.unwrap();
}

#[tokio::test]
async fn test_restore_auth_state_requires_token_and_flag() {
    let server = MockServer::start().await;

    let cases: [(Option<&str>, Option<&str>, bool); 5] = [
        (Some("t1"), Some("true"), true),
        (Some("t1"), Some("false"), false),
        (Some("t1"), None, false),
        (None, Some("true"), false),
        (Some(""), Some("true"), false),
    ];

    for (token, flag, expected) in cases {
        let secure = SecureStorage::in_memory();
        if let Some(token) = token {
            secure.set(keys::AUTH_TOKEN, token).unwrap();
        }
        if let Some(flag) = flag {
            secure.set(keys::IS_AUTHENTICATED, flag).unwrap();
        }
        secure.set(keys::USER_ID, "7").unwrap();

        let mut ctx = context_for(&server, Arc::new(MemoryStateStorage::new()), secure).await;
        let restored = ctx.restore_auth_state().await;

        assert_eq!(restored, expected, "token={:?} flag={:?}", token, flag);
        assert_eq!(ctx.state().session.authenticated, expected);
        assert_eq!(ctx.services().client().has_token(), expected);
        if expected {
            assert_eq!(ctx.state().session.user_id.as_deref(), Some("7"));
        }
    }
}

/// Secure store whose reads always fail, like a locked keyring
struct LockedStore;

impl SecureStore for LockedStore {
    fn set(&self, _key: &str, _value: &str) -> libbizlink::Result<()> {
        Err(SecureStoreError::Keyring("keyring is locked".to_string()).into())
    }

    fn get(&self, _key: &str) -> libbizlink::Result<Option<String>> {
        Err(SecureStoreError::Keyring("keyring is locked".to_string()).into())
    }

    fn delete(&self, _key: &str) -> libbizlink::Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "locked"
    }
}

#[tokio::test]
async fn test_restore_auth_state_treats_store_failure_as_signed_out() {
    let server = MockServer::start().await;
    let secure = SecureStorage::from_stores(vec![Box::new(LockedStore)]).unwrap();
    let mut ctx = context_for(&server, Arc::new(MemoryStateStorage::new()), secure).await;

    assert!(!ctx.restore_auth_state().await);
    assert!(!ctx.state().session.authenticated);
    assert!(ctx.state().session.token.is_none());
    assert!(!ctx.services().client().has_token());
}

#[tokio::test]
async fn test_open_session_without_stored_session_is_unauthenticated() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default_config();
    config.storage.path = temp_dir
        .path()
        .join("state.db")
        .to_string_lossy()
        .to_string();
    config.credentials.storage = StorageBackend::Memory;

    let err = AppContext::open_session(&config).await.err().unwrap();
    assert!(matches!(err, BizlinkError::Api(ApiError::Unauthenticated)));
    assert_eq!(err.exit_code(), 2);

    // The same configuration opens fine without the session requirement
    let ctx = AppContext::from_config(&config).await.unwrap();
    assert!(!ctx.state().session.authenticated);
}

#[tokio::test]
async fn test_protected_calls_without_token_fail_locally() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/announcements"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    assert!(ctx.require_session().is_err());

    let err = ctx.fetch_announcements().await.unwrap_err();
    assert!(matches!(err, BizlinkError::Api(ApiError::Unauthenticated)));
    assert_eq!(err.exit_code(), 2);
    assert!(!ctx.state().announcements.loading);
    assert!(ctx.state().announcements.error.is_some());
}

// === Company profile ===

#[tokio::test]
async fn test_save_profile_replaces_company_fields() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("PUT"))
        .and(path("/api/companies/me"))
        .and(header("authorization", "Bearer t1"))
        .and(body_partial_json(json!({"name": "Acme"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "company": {
                    "id": 7,
                    "name": "Acme",
                    "email": "hello@acme.com",
                    "industry": "Tools",
                    "description": "Anvils"
                }
            }
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    let info = CompanyInfo {
        name: "Acme".to_string(),
        email: "hello@acme.com".to_string(),
        industry: "Tools".to_string(),
        description: "Anvils".to_string(),
    };
    ctx.save_profile(info.clone()).await.unwrap();

    assert_eq!(ctx.state().company.info(), info);
    assert!(!ctx.state().company.loading);
    assert!(ctx.state().company.error.is_none());
}

#[tokio::test]
async fn test_save_profile_with_blank_field_is_rejected_locally() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("PUT"))
        .and(path("/api/companies/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    let info = CompanyInfo {
        name: " ".to_string(),
        email: "hello@acme.com".to_string(),
        industry: "Tools".to_string(),
        description: "Anvils".to_string(),
    };

    let message = invalid_input(ctx.save_profile(info).await);
    assert_eq!(message, "Company name is required");
    assert_eq!(
        ctx.state().company.error.as_deref(),
        Some("Company name is required")
    );
    // The profile loaded at login is untouched
    assert_eq!(ctx.state().company.name, "X");
}

// === Announcements ===

#[tokio::test]
async fn test_fetch_and_create_announcements_newest_first() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/announcements"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "announcements": [
                    announcement_json(1, "Older", "2024-01-01T00:00:00Z"),
                    announcement_json(2, "Newer", "2024-02-01T00:00:00Z")
                ]
            }
        })))
        .mount(&harness.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/announcements"))
        .and(body_partial_json(json!({
            "title": "Hiring",
            "type": "offer",
            "listOfRequirementsOrServices": ["Backend developers"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": "success",
            "data": {
                "announcement": {
                    "id": 3,
                    "title": "Hiring",
                    "description": "We build things",
                    "type": "offer",
                    "listOfRequirementsOrServices": ["Backend developers"],
                    "companyId": 7,
                    "createdAt": "2024-03-01T00:00:00Z"
                }
            }
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    ctx.fetch_announcements().await.unwrap();
    let titles: Vec<_> = ctx
        .state()
        .announcements
        .items
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, ["Newer", "Older"]);

    let mut draft = AnnouncementDraft::new("Hiring", "We build things", AnnouncementKind::Offer);
    draft.add_requirement("Backend developers").unwrap();
    let created = ctx.create_announcement(draft).await.unwrap();

    assert_eq!(created.id, 3);
    assert_eq!(created.kind, AnnouncementKind::Offer);
    assert_eq!(ctx.state().announcements.items[0].id, 3);
    assert_eq!(ctx.state().announcements.len(), 3);
    assert!(!ctx.state().announcements.loading);
}

#[tokio::test]
async fn test_delete_announcement_removes_it() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/announcements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "announcements": [announcement_json(1, "Only", "2024-01-01T00:00:00Z")]
            }
        })))
        .mount(&harness.server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/announcements/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    ctx.fetch_announcements().await.unwrap();
    ctx.delete_announcement(1).await.unwrap();

    assert!(ctx.state().announcements.is_empty());
}

#[tokio::test]
async fn test_announcements_outside_requirement_bounds_are_rejected() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    let wordy = vec!["word"; 25].join(" ");
    let mut oversized = announcement_json(1, "Too many", "2024-01-01T00:00:00Z");
    oversized["listOfRequirementsOrServices"] = json!(["a", "b", "c", "d", "e", "f", wordy]);

    Mock::given(method("GET"))
        .and(path("/api/announcements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "announcements": [
                    announcement_json(2, "Fine", "2024-02-01T00:00:00Z"),
                    oversized
                ]
            }
        })))
        .mount(&harness.server)
        .await;

    let err = ctx.fetch_announcements().await.unwrap_err();
    assert!(matches!(err, BizlinkError::Api(ApiError::Decode(_))));
    assert!(ctx.state().announcements.is_empty());
    assert_eq!(
        ctx.state().announcements.error.as_deref(),
        Some("Invalid response format")
    );
}

#[tokio::test]
async fn test_single_announcement_with_wordy_requirement_is_rejected() {
    let harness = logged_in().await;
    let ctx = harness.ctx;

    let mut wordy = announcement_json(4, "Wordy", "2024-01-01T00:00:00Z");
    wordy["listOfRequirementsOrServices"] = json!([vec!["word"; 21].join(" ")]);

    Mock::given(method("GET"))
        .and(path("/api/announcements/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "announcement": wordy }
        })))
        .mount(&harness.server)
        .await;

    let err = ctx.services().announcements().get(4).await.unwrap_err();
    match err {
        ApiError::Decode(reason) => assert!(reason.contains("exceeds 20 words"), "{}", reason),
        other => panic!("Expected Decode, got {:?}", other),
    }
}

// === Projects ===

#[tokio::test]
async fn test_update_project_stage_saves_edit() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "projects": [project_json(5, "planning")] }
        })))
        .mount(&harness.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/5"))
        .and(body_partial_json(json!({"stage": "beta_test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "project": project_json(5, "beta_test") }
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    ctx.fetch_projects().await.unwrap();
    assert_eq!(ctx.state().projects.items[0].executor_company, "X");

    let saved = ctx
        .update_project_stage(5, ProjectStage::BetaTest)
        .await
        .unwrap();

    assert_eq!(saved.stage, ProjectStage::BetaTest);
    assert_eq!(ctx.state().projects.items[0].stage, ProjectStage::BetaTest);
    assert!(!ctx.state().projects.loading);
}

#[tokio::test]
async fn test_failed_project_edit_is_rolled_back() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "projects": [project_json(5, "planning")] }
        })))
        .mount(&harness.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/5"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"status": "error", "message": "Not your project"})),
        )
        .mount(&harness.server)
        .await;

    ctx.fetch_projects().await.unwrap();
    let before = ctx.state().projects.items[0].clone();

    let err = ctx
        .update_project_stage(5, ProjectStage::Production)
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);

    assert_eq!(ctx.state().projects.items[0], before);
    assert_eq!(
        ctx.state().projects.error.as_deref(),
        Some("Not your project")
    );
}

#[tokio::test]
async fn test_removing_missing_function_sends_nothing() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "projects": [project_json(5, "planning")] }
        })))
        .mount(&harness.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    ctx.fetch_projects().await.unwrap();
    let before = ctx.state().projects.items[0].clone();

    let unchanged = ctx.remove_project_function(5, "reporting").await.unwrap();
    assert_eq!(unchanged, before);
}

#[tokio::test]
async fn test_editing_unknown_project_records_lookup_failure() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/projects/9"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": "error", "message": "Project not found"})),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;

    let err = ctx
        .update_project_stage(9, ProjectStage::Development)
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);

    let projects = &ctx.state().projects;
    assert_eq!(projects.error.as_deref(), Some("Project not found"));
    assert!(!projects.loading);
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_editing_project_not_yet_listed_fetches_it_first() {
    let harness = logged_in().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/api/projects/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "project": project_json(5, "planning") }
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/5"))
        .and(body_partial_json(json!({"status": "paused"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "project": project_json(5, "planning") }
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    ctx.update_project_status(5, "paused").await.unwrap();

    assert_eq!(ctx.state().projects.len(), 1);
    assert!(!ctx.state().projects.loading);
    assert!(ctx.state().projects.error.is_none());
}

// === News ===

#[tokio::test]
async fn test_fetch_news_keeps_only_articles_with_images() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("apiKey", "test-news-key"))
        .and(query_param("sortBy", "publishedAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {
                    "source": { "id": null, "name": "Wire" },
                    "author": null,
                    "title": "With image",
                    "description": "d",
                    "url": "https://example.com/1",
                    "urlToImage": "https://example.com/1.png",
                    "publishedAt": "2024-05-01T10:00:00Z",
                    "content": null
                },
                {
                    "source": { "id": null, "name": "Wire" },
                    "author": null,
                    "title": "Without image",
                    "description": "d",
                    "url": "https://example.com/2",
                    "urlToImage": null,
                    "publishedAt": "2024-05-01T09:00:00Z",
                    "content": null
                }
            ]
        })))
        .mount(&harness.server)
        .await;

    ctx.fetch_news().await.unwrap();

    let news = &ctx.state().news;
    assert_eq!(news.len(), 1);
    assert_eq!(news.items[0].title, "With image");
    assert!(!news.loading);
}

#[tokio::test]
async fn test_fetch_news_failure_uses_fixed_message() {
    let harness = setup().await;
    let mut ctx = harness.ctx;

    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "message": "Your API key is invalid"
        })))
        .mount(&harness.server)
        .await;

    ctx.fetch_news().await.unwrap_err();
    assert_eq!(ctx.state().news.error.as_deref(), Some(NEWS_FETCH_FAILED));
}

#[tokio::test]
async fn test_news_transport_failure_does_not_expose_api_key() {
    let server = MockServer::start().await;
    let client = Arc::new(ApiClient::new(server.uri(), None).unwrap());
    let news_config = NewsConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..NewsConfig::default()
    };
    let mut services = Services::new(client, news_config, None).unwrap();
    services.set_news_api_key(SecretString::from("SECRETKEY123"));
    let mut ctx = AppContext::bootstrap(
        services,
        SecureStorage::in_memory(),
        Arc::new(MemoryStateStorage::new()),
    )
    .await;

    let err = ctx.fetch_news().await.unwrap_err();

    assert!(matches!(err, BizlinkError::Api(ApiError::Transport(_))));
    assert!(!err.to_string().contains("SECRETKEY123"), "{}", err);
    assert!(!format!("{:?}", err).contains("SECRETKEY123"));
    assert_eq!(ctx.state().news.error.as_deref(), Some(NEWS_FETCH_FAILED));
}

// === Snapshot persistence ===

#[tokio::test]
async fn test_snapshot_survives_restart_without_token() {
    let harness = logged_in().await;
    let Harness {
        ctx,
        storage,
        server,
    } = harness;

    let raw = storage.load(ROOT_STATE_KEY).await.unwrap().unwrap();
    assert!(!raw.contains("t1"), "token leaked into snapshot: {}", raw);
    drop(ctx);

    let restarted = context_for(&server, Arc::clone(&storage), SecureStorage::in_memory()).await;
    assert_eq!(restarted.state().company.name, "X");
    assert_eq!(restarted.state().session.user_id.as_deref(), Some("7"));
    // Without a token the session is not authenticated
    assert!(!restarted.state().session.authenticated);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStateStorage::new());
    storage.save(ROOT_STATE_KEY, "{\"session\": 42").await.unwrap();

    let ctx = context_for(&server, storage, SecureStorage::in_memory()).await;

    assert_eq!(*ctx.state(), libbizlink::AppState::default());
}

#[tokio::test]
async fn test_dispatch_notifies_subscribers() {
    let harness = setup().await;
    let mut ctx = harness.ctx;
    let mut receiver = ctx.subscribe();

    ctx.update_company_name("Renamed").await;

    let event = receiver.recv().await.unwrap();
    assert_eq!(
        event,
        libbizlink::service::events::Event::StateChanged(
            libbizlink::service::events::Slice::Company
        )
    );
    assert_eq!(ctx.state().company.name, "Renamed");
}
