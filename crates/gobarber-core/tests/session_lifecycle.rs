//! Session lifecycle against a mock backend and file-backed storage:
//! sign-in, restart, identity update, sign-out.

use gobarber_core::auth::{TOKEN_KEY, USER_KEY};
use gobarber_core::{
    ApiClient, FileStore, Identity, KeyValueStore, SessionError, SessionState, SessionStore,
};
use mockito::{Matcher, Server, ServerGuard};

const SESSION_BODY: &str = r#"{"token":"tok123","user":{"id":"u1","name":"Ana","email":"a@b.com","avatar_url":"http://x/a.png"}}"#;

fn ana() -> Identity {
    Identity::new("u1", "Ana", "a@b.com", "http://x/a.png")
}

async fn backend_accepting_ana() -> ServerGuard {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .match_body(Matcher::Json(serde_json::json!({
            "email": "a@b.com",
            "password": "secret1"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SESSION_BODY)
        .create_async()
        .await;
    server
}

fn persisted_identity(storage: &impl KeyValueStore) -> Identity {
    let raw = storage
        .get(USER_KEY)
        .expect("read identity key")
        .expect("identity key present");
    serde_json::from_str(&raw).expect("identity key holds JSON")
}

#[tokio::test]
async fn sign_in_from_empty_storage() {
    let server = backend_accepting_ana().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let api = ApiClient::new(server.url()).expect("client");

    let mut store = SessionStore::initialize(FileStore::open(dir.path()).expect("open"), api.clone());
    assert_eq!(store.state(), &SessionState::Unauthenticated);

    let identity = store.sign_in("a@b.com", "secret1").await.expect("sign in").clone();
    assert_eq!(identity, ana());
    assert_eq!(
        store.state(),
        &SessionState::Authenticated {
            token: "tok123".to_string(),
            identity: ana(),
        }
    );
    assert_eq!(api.token().as_deref(), Some("tok123"));
    assert_eq!(store.storage().get(TOKEN_KEY).expect("get").as_deref(), Some("tok123"));
    assert_eq!(persisted_identity(store.storage()), ana());
}

#[tokio::test]
async fn restart_after_sign_in_restores_same_state() {
    let server = backend_accepting_ana().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = SessionStore::initialize(
        FileStore::open(dir.path()).expect("open"),
        ApiClient::new(server.url()).expect("client"),
    );
    store.sign_in("a@b.com", "secret1").await.expect("sign in");
    let before = store.state().clone();
    drop(store);

    let api = ApiClient::new(server.url()).expect("client");
    let restored = SessionStore::initialize(FileStore::open(dir.path()).expect("reopen"), api.clone());
    assert_eq!(restored.state(), &before);
    assert_eq!(api.token().as_deref(), Some("tok123"));
}

#[tokio::test]
async fn sign_out_clears_everything() {
    let server = backend_accepting_ana().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let api = ApiClient::new(server.url()).expect("client");

    let mut store = SessionStore::initialize(FileStore::open(dir.path()).expect("open"), api.clone());
    store.sign_in("a@b.com", "secret1").await.expect("sign in");
    assert_eq!(store.token(), Some("tok123"));

    store.sign_out();
    assert_eq!(store.state(), &SessionState::Unauthenticated);
    assert_eq!(store.storage().get(TOKEN_KEY).expect("get"), None);
    assert_eq!(store.storage().get(USER_KEY).expect("get"), None);
    assert!(api.token().is_none());

    let storage = store.into_storage();
    let restored = SessionStore::initialize(storage, ApiClient::new(server.url()).expect("client"));
    assert!(!restored.is_authenticated());
}

#[tokio::test]
async fn update_identity_keeps_token() {
    let server = backend_accepting_ana().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = SessionStore::initialize(
        FileStore::open(dir.path()).expect("open"),
        ApiClient::new(server.url()).expect("client"),
    );
    store.sign_in("a@b.com", "secret1").await.expect("sign in");

    let updated = Identity::new("u1", "Ana Silva", "a@b.com", "http://x/a2.png");
    store.update_identity(updated.clone()).expect("update");

    assert_eq!(store.token(), Some("tok123"));
    let identity = store.identity().expect("identity");
    assert_eq!(identity.name, "Ana Silva");
    assert_eq!(identity.avatar_url, "http://x/a2.png");
    assert_eq!(persisted_identity(store.storage()), updated);
    assert_eq!(store.storage().get(TOKEN_KEY).expect("get").as_deref(), Some("tok123"));

    // Survives a restart too
    let restored = SessionStore::initialize(
        FileStore::open(dir.path()).expect("reopen"),
        ApiClient::new(server.url()).expect("client"),
    );
    assert_eq!(restored.identity(), Some(&updated));
}

#[tokio::test]
async fn rejected_credentials_surface_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(401)
        .with_body(r#"{"status":"error","message":"Incorrect email/password combination."}"#)
        .create_async()
        .await;
    let dir = tempfile::tempdir().expect("tempdir");

    let mut store = SessionStore::initialize(
        FileStore::open(dir.path()).expect("open"),
        ApiClient::new(server.url()).expect("client"),
    );
    let err = store.sign_in("a@b.com", "wrong1").await.expect_err("sign in should fail");

    assert!(matches!(err, SessionError::Api(gobarber_core::ApiError::Unauthorized)));
    assert!(!store.is_authenticated());
    assert!(!dir.path().join("storage.json").exists());
}
