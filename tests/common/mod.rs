//! Shared setup for the HTTP integration tests: every test gets its own
//! server, SQLite file and media directory.

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, time::Duration};

use classifieds::{get_random_free_port, init_db, make_router, serve, AppConfig, AppState};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use sqlx::SqlitePool;

/// A PNG signature followed by the start of an IHDR chunk.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub pool: SqlitePool,
    pub root: PathBuf,
}

pub async fn spawn_app() -> TestApp {
    let root = std::env::temp_dir().join(format!("classifieds-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();

    let database_url = format!("sqlite://{}", root.join("test.db").display());
    let mut config = AppConfig::new(database_url, "integration-secret");
    config.media_root = root.join("media");

    let pool = init_db(&config.database_url).await.unwrap();
    let (port, address) = get_random_free_port().unwrap();
    let state = Arc::new(AppState {
        pool: pool.clone(),
        config,
    });
    tokio::spawn(serve(make_router(state), address));

    let app = TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        pool,
        root,
    };
    app.wait_until_ready().await;
    app
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn wait_until_ready(&self) {
        for _ in 0..100 {
            if let Ok(response) = self.client.get(self.url("/check_health")).send().await {
                if response.status() == StatusCode::OK {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server at {} did not start", self.address);
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Registers a user with password `password123` and returns its id.
    pub async fn register(&self, username: &str, locations: &[&str]) -> i64 {
        let response = self
            .post("/user/create/")
            .json(&json!({
                "username": username,
                "password": "password123",
                "first_name": format!("{}-first", username),
                "locations": locations,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    /// Logs in and returns an `Authorization` header value.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .post("/user/login/")
            .json(&json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        format!("Token {}", body["token"].as_str().unwrap())
    }

    pub async fn register_and_login(&self, username: &str, locations: &[&str]) -> (i64, String) {
        let id = self.register(username, locations).await;
        let auth = self.login(username).await;
        (id, auth)
    }

    pub async fn create_category(&self, auth: &str, name: &str) -> i64 {
        let response = self
            .post("/cat/create/")
            .header("Authorization", auth)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn create_ad(&self, auth: &str, body: Value) -> i64 {
        let response = self
            .post("/ad/create/")
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    /// Names of the ads `GET /ad/` returns for the given query.
    pub async fn list_ad_names(&self, query: &[(&str, &str)]) -> Vec<String> {
        let response = self.get("/ad/").query(query).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Vec<Value> = response.json().await.unwrap();
        body.iter()
            .map(|ad| ad["name"].as_str().unwrap().to_string())
            .collect()
    }

    pub async fn upload_image(
        &self,
        auth: &str,
        ad: i64,
        file_name: &str,
        mime: &str,
        data: &[u8],
    ) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap();
        self.post(&format!("/ad/{}/upload_image/", ad))
            .header("Authorization", auth)
            .multipart(reqwest::multipart::Form::new().part("image", part))
            .send()
            .await
            .unwrap()
    }

    /// Uploads `PNG_BYTES` and returns the image URL from the response.
    pub async fn upload_png(&self, auth: &str, ad: i64) -> String {
        let response = self
            .upload_image(auth, ad, "photo.png", "image/png", PNG_BYTES)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["image"].as_str().unwrap().to_string()
    }

    /// Where a `/media/...` URL lives on disk.
    pub fn media_file(&self, url: &str) -> PathBuf {
        self.root
            .join("media")
            .join(url.trim_start_matches("/media/"))
    }

    /// Number of files in the ad image directory.
    pub fn stored_ad_images(&self) -> usize {
        match std::fs::read_dir(self.root.join("media").join("ads")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
