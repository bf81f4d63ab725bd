//! End-to-end session flow against an in-memory backend: login, identity
//! check, list polling, and the generate-then-persist pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use quizr_console_core::{
    session_ttl, AdminApi, AdminUser, ApiError, ApiResult, AuthGate, AuthStatus, CredentialStore,
    FetchOptions, GenerationPhase, GenerationWorkflow, MemoryCredentialStore, NewUser, QuizGenerator,
    QuizRecord, ResourceKey, ResourcePool, SubmitOutcome, UserRecord,
};

/// A backend that accepts exactly one token, like the real admin API: every
/// authenticated call re-reads the credential store the console writes to.
struct FakeBackend {
    store: Arc<MemoryCredentialStore>,
    valid_token: String,
    quizzes: Mutex<Vec<QuizRecord>>,
    users: Mutex<Vec<UserRecord>>,
}

impl FakeBackend {
    fn new(store: Arc<MemoryCredentialStore>) -> Self {
        Self {
            store,
            valid_token: "issued-token".to_owned(),
            quizzes: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
        }
    }

    fn authorize(&self) -> ApiResult<()> {
        match self.store.get() {
            Some(cred) if cred.token == self.valid_token => Ok(()),
            _ => Err(ApiError::Auth),
        }
    }
}

#[async_trait]
impl AdminApi for FakeBackend {
    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        if username == "admin" && password == "secret" {
            Ok(self.valid_token.clone())
        } else {
            Err(ApiError::Server {
                status: 401,
                message: "Invalid credentials".to_owned(),
            })
        }
    }

    async fn current_user(&self) -> ApiResult<Option<AdminUser>> {
        self.authorize()?;
        Ok(Some(AdminUser {
            username: "admin".to_owned(),
        }))
    }

    async fn list_quizzes(&self) -> ApiResult<Vec<QuizRecord>> {
        self.authorize()?;
        Ok(self.quizzes.lock().expect("quizzes lock").clone())
    }

    async fn list_users(&self) -> ApiResult<Vec<UserRecord>> {
        self.authorize()?;
        Ok(self.users.lock().expect("users lock").clone())
    }

    async fn create_quiz(&self, topic: &str, completion_result: &str) -> ApiResult<()> {
        self.authorize()?;
        self.quizzes.lock().expect("quizzes lock").push(QuizRecord {
            username: "admin".to_owned(),
            topic: topic.to_owned(),
            content: completion_result.to_owned(),
            ..QuizRecord::default()
        });
        Ok(())
    }

    async fn add_user(&self, user: &NewUser) -> ApiResult<()> {
        self.authorize()?;
        self.users.lock().expect("users lock").push(UserRecord {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_type: user.user_type.clone(),
            email: user.email.clone(),
            ..UserRecord::default()
        });
        Ok(())
    }
}

struct CannedGenerator;

#[async_trait]
impl QuizGenerator for CannedGenerator {
    async fn generate(&self, topic: &str) -> ApiResult<String> {
        Ok(format!("1. A multiple choice question about {topic}."))
    }
}

#[tokio::test]
async fn login_poll_generate_persist_round_trip() {
    let store = Arc::new(MemoryCredentialStore::new());
    let api: Arc<FakeBackend> = Arc::new(FakeBackend::new(store.clone()));
    let admin_api: Arc<dyn AdminApi> = api.clone();

    // Login and store the token with the session window.
    let token = admin_api.login("admin", "secret").await.expect("login");
    store.set(&token, session_ttl());
    let cred = store.get().expect("credential stored");
    let window = cred.expires_at - cred.issued_at;
    assert_eq!(window.num_hours(), 8);
    assert!(cred.expires_at > Utc::now());

    // The gate admits the session.
    let gate = AuthGate::new(admin_api.clone(), store.clone(), "http://backend/admin/user");
    let status = gate.check().await;
    assert_eq!(
        status,
        AuthStatus::Authenticated(AdminUser {
            username: "admin".to_owned()
        })
    );

    // Both list views begin polling.
    let quiz_pool: ResourcePool<Vec<QuizRecord>> = ResourcePool::new();
    let list_api = admin_api.clone();
    let mut quizzes = quiz_pool.subscribe(
        ResourceKey::new("http://backend/admin/quizzes", &token),
        FetchOptions::every(Duration::from_millis(25)),
        move || {
            let api = list_api.clone();
            Box::pin(async move { api.list_quizzes().await })
        },
    );
    let user_pool: ResourcePool<Vec<UserRecord>> = ResourcePool::new();
    let list_api = admin_api.clone();
    let mut users = user_pool.subscribe(
        ResourceKey::new("http://backend/users/get", &token),
        FetchOptions::every(Duration::from_millis(25)),
        move || {
            let api = list_api.clone();
            Box::pin(async move { api.list_users().await })
        },
    );
    assert_eq!(quizzes.settled().await.value, Some(vec![]));
    assert_eq!(users.settled().await.value, Some(vec![]));

    // Generate and persist a quiz.
    let workflow = GenerationWorkflow::new(Arc::new(CannedGenerator), admin_api.clone());
    assert_eq!(workflow.submit("Algebra").await, SubmitOutcome::Settled);
    let snapshot = workflow.snapshot();
    assert_eq!(snapshot.phase, GenerationPhase::Succeeded);
    let content = snapshot.result.expect("generated text retained");

    // The quiz list picks the new record up on a later tick.
    let refreshed = loop {
        assert!(quizzes.changed().await, "quiz resource vanished");
        let snapshot = quizzes.snapshot();
        match &snapshot.value {
            Some(records) if !records.is_empty() => break snapshot,
            _ => continue,
        }
    };
    let records = refreshed.value.expect("records");
    assert_eq!(records[0].topic, "Algebra");
    assert_eq!(records[0].content, content);
}

#[tokio::test]
async fn rejected_token_clears_the_session_independently_of_other_views() {
    let store = Arc::new(MemoryCredentialStore::new());
    let api: Arc<FakeBackend> = Arc::new(FakeBackend::new(store.clone()));
    let admin_api: Arc<dyn AdminApi> = api.clone();

    // A token the backend no longer accepts.
    store.set("stale-token", session_ttl());

    // An unrelated view is already polling and failing quietly.
    let quiz_pool: ResourcePool<Vec<QuizRecord>> = ResourcePool::new();
    let list_api = admin_api.clone();
    let mut quizzes = quiz_pool.subscribe(
        ResourceKey::new("http://backend/admin/quizzes", "stale-token"),
        FetchOptions::every(Duration::from_millis(25)),
        move || {
            let api = list_api.clone();
            Box::pin(async move { api.list_quizzes().await })
        },
    );
    let snapshot = quizzes.settled().await;
    assert_eq!(snapshot.error, Some(ApiError::Auth));
    assert!(snapshot.value.is_none());

    let gate = AuthGate::new(admin_api, store.clone(), "http://backend/admin/user");
    assert_eq!(
        gate.check().await,
        AuthStatus::Unauthenticated {
            credential_rejected: true
        }
    );
    assert!(store.get().is_none(), "credential must be cleared");
    // The polling view keeps its own (failed) state; nothing panics or
    // cascades beyond the cleared credential.
    assert!(quizzes.snapshot().value.is_none());
}
