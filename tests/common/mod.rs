//! Common test utilities for E2E tests

use inkpost::data::Role;
use inkpost::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Configured owner identifier used by every test server
pub const OWNER_ID: &str = "01OWNER000000000000000000";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database and uploads
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            storage: config::StorageConfig {
                uploads: config::UploadStorageConfig {
                    dir: temp_dir.path().join("uploads"),
                    max_bytes: 5 * 1024 * 1024,
                },
            },
            owner: config::OwnerConfig {
                id: OWNER_ID.to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = inkpost::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return the issued token
    pub async fn register(&self, username: &str, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
                "confirmPassword": password,
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200, "registration must succeed");
        let json: serde_json::Value = response.json().await.unwrap();
        json["token"].as_str().unwrap().to_string()
    }

    /// Register a user and escalate them to the given role via the store
    pub async fn register_with_role(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> String {
        let token = self.register(username, email, password).await;
        let user = self
            .state
            .db
            .get_user_by_token(&token)
            .await
            .unwrap()
            .unwrap();
        self.state.db.update_user_role(&user.id, role).await.unwrap();
        token
    }

    /// Insert the configured-owner user directly into the store
    ///
    /// Registration assigns random ids, so the distinguished owner record
    /// has to be seeded for tests that exercise owner protection.
    pub async fn seed_configured_owner(&self) -> inkpost::data::User {
        let user = inkpost::data::User {
            id: OWNER_ID.to_string(),
            username: "the_owner".to_string(),
            email: "theowner@example.com".to_string(),
            password_hash: "unused".to_string(),
            token: "owner-test-token".to_string(),
            role: Role::Owner,
        };
        self.state.db.insert_user(&user).await.unwrap();
        user
    }

    /// Create a post through the API, returning the response
    pub async fn create_post(
        &self,
        token: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(self.url("/api/posts"))
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// Look up the user id behind a token
    pub async fn user_id_for_token(&self, token: &str) -> String {
        self.state
            .db
            .get_user_by_token(token)
            .await
            .unwrap()
            .unwrap()
            .id
    }
}
