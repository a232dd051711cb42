use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignupRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
        repo::StoreError,
        repo_types::NewUser,
        validation::{normalize_email, validate_login, validate_signup},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!(error = %e, "rejected request body");
        ApiError::MalformedBody
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut payload = parse_body(payload)?;
    payload.email = normalize_email(&payload.email);

    let errors = validate_signup(&payload);
    if !errors.is_empty() {
        warn!(failed = errors.len(), "signup validation failed");
        return Err(ApiError::Validation(errors));
    }

    // Fast path only; the store's uniqueness guard decides under races.
    if state.store.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let hash = hash_password_blocking(payload.password.clone()).await?;

    let user = state
        .store
        .create(NewUser {
            username: &payload.username,
            email: &payload.email,
            password_hash: &hash,
        })
        .await
        .map_err(|e| {
            if matches!(e, StoreError::DuplicateEmail) {
                warn!(email = %payload.email, "email registered concurrently");
            }
            ApiError::from(e)
        })?;

    let authtoken = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            authtoken,
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let mut payload = parse_body(payload)?;
    payload.email = normalize_email(&payload.email);

    let errors = validate_login(&payload);
    if !errors.is_empty() {
        warn!(failed = errors.len(), "login validation failed");
        return Err(ApiError::Validation(errors));
    }

    let Some(user) = state.store.find_by_email(&payload.email).await? else {
        verify_dummy_blocking(payload.password).await;
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let authtoken = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            authtoken,
            message: "User login successfully".into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.store.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token for unknown user");
        ApiError::Unauthorized("User not found")
    })?;

    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::auth::repo::{StoreError, UserStore};
    use crate::auth::repo_types::{NewUser, User};
    use crate::error::BAD_CREDENTIALS_MSG;
    use crate::state::AppState;
    use crate::testing::{serve_state, spawn_app, test_config, TestApp};

    async fn post(app: &TestApp, path: &str, body: Value) -> (StatusCode, Value) {
        let res = app
            .http
            .post(format!("{}{}", app.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("request");
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    fn abc() -> Value {
        json!({ "username": "abc", "email": "a@b.com", "password": "secret" })
    }

    #[tokio::test]
    async fn signup_then_duplicate_then_login() {
        let app = spawn_app().await;

        let (status, body) = post(&app, "/api/auth/signup", abc()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["authtoken"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(app.store.len().await, 1);
        assert!(app.store.find_by_email("a@b.com").await.unwrap().is_some());

        let (status, body) = post(&app, "/api/auth/signup", abc()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["msg"], "Email already exists");
        assert_eq!(app.store.len().await, 1);

        let (status, body) = post(
            &app,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "wrong" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["msg"], BAD_CREDENTIALS_MSG);

        let (status, body) = post(
            &app,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "secret" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["authtoken"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["message"], "User login successfully");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let app = spawn_app().await;
        post(&app, "/api/auth/signup", abc()).await;

        let unknown = post(
            &app,
            "/api/auth/login",
            json!({ "email": "nobody@b.com", "password": "secret" }),
        )
        .await;
        let wrong = post(
            &app,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "secret!" }),
        )
        .await;
        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn invalid_signups_create_nothing() {
        let app = spawn_app().await;
        let cases = [
            json!({ "username": "ab", "email": "a@b.com", "password": "secret" }),
            json!({ "username": "abc", "email": "not-an-email", "password": "secret" }),
            json!({ "username": "abc", "email": "a@b.com", "password": "12345" }),
            json!({ "email": "a@b.com" }),
        ];
        for case in cases {
            let (status, body) = post(&app, "/api/auth/signup", case.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "case {case}");
            assert!(body["errors"].as_array().is_some_and(|e| !e.is_empty()));
        }
        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn validation_errors_never_echo_the_password() {
        let app = spawn_app().await;
        let (_, body) = post(
            &app,
            "/api/auth/signup",
            json!({ "username": "x", "email": "bad", "password": "pw123" }),
        )
        .await;
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(3));
        assert!(!body.to_string().contains("pw123"));
    }

    #[tokio::test]
    async fn malformed_login_is_bad_request() {
        let app = spawn_app().await;
        let (status, body) = post(
            &app,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["param"], "password");

        let res = app
            .http
            .post(format!("{}/api/auth/login", app.base_url))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn email_is_normalized_before_lookup() {
        let app = spawn_app().await;
        post(&app, "/api/auth/signup", abc()).await;
        let (status, _) = post(
            &app,
            "/api/auth/login",
            json!({ "email": "  A@B.COM ", "password": "secret" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn concurrent_signups_with_same_email_succeed_once() {
        let app = spawn_app().await;
        let (a, b) = tokio::join!(
            post(&app, "/api/auth/signup", abc()),
            post(&app, "/api/auth/signup", abc()),
        );
        let mut statuses = [a.0, b.0];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
        assert_eq!(app.store.len().await, 1);
    }

    #[tokio::test]
    async fn issued_token_authenticates_me() {
        let app = spawn_app().await;
        let (_, body) = post(&app, "/api/auth/signup", abc()).await;
        let token = body["authtoken"].as_str().unwrap().to_string();

        let res = app
            .http
            .get(format!("{}/api/auth/me", app.base_url))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let me: Value = res.json().await.unwrap();
        assert_eq!(me["username"], "abc");
        assert_eq!(me["email"], "a@b.com");
        assert!(me.get("password_hash").is_none());

        let res = app
            .http
            .get(format!("{}/api/auth/me", app.base_url))
            .bearer_auth(format!("{token}x"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .http
            .get(format!("{}/api/auth/me", app.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    /// Store whose backend is always unreachable.
    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }

        async fn create(&self, _new: NewUser<'_>) -> Result<User, StoreError> {
            Err(StoreError::Backend(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn store_failures_are_opaque_server_errors() {
        let state = AppState::from_parts(Arc::new(FailingStore), Arc::new(test_config()));
        let app = TestApp {
            base_url: serve_state(state).await,
            store: Default::default(),
            http: reqwest::Client::new(),
        };

        for (path, body) in [
            ("/api/auth/signup", abc()),
            ("/api/auth/login", json!({ "email": "a@b.com", "password": "secret" })),
        ] {
            let (status, body) = post(&app, path, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");
            assert_eq!(body, json!({ "error": "Internal server error" }), "{path}");
        }
    }

    #[tokio::test]
    async fn unparseable_stored_hash_is_a_server_error() {
        let app = spawn_app().await;
        app.store
            .create(NewUser {
                username: "abc",
                email: "a@b.com",
                password_hash: "not-a-phc-string",
            })
            .await
            .unwrap();

        let (status, body) = post(
            &app,
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "secret" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
