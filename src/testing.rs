//! Serves the real router over an in-memory store on an ephemeral port.

use std::sync::Arc;

use secrecy::SecretString;

use crate::app::build_app;
use crate::auth::repo::MemoryUserStore;
use crate::config::{AppConfig, JwtConfig, StoreBackend};
use crate::state::AppState;

pub struct TestApp {
    pub base_url: String,
    pub store: Arc<MemoryUserStore>,
    pub http: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        store: StoreBackend::Memory,
        database_url: None,
        db_max_connections: 1,
        host: "127.0.0.1".into(),
        port: 0,
        jwt: JwtConfig {
            secret: SecretString::from("test-secret".to_string()),
            ttl_minutes: None,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::from_parts(store.clone(), Arc::new(test_config()));

    TestApp {
        base_url: serve_state(state).await,
        store,
        http: reqwest::Client::new(),
    }
}

/// Serves `state` in the background and returns its base URL.
pub async fn serve_state(state: AppState) -> String {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    format!("http://{addr}")
}
