mod authentication;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod media;
mod models;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use config::AppConfig;
pub use data_formats::*;
pub use errors::{RequestErrorJson, RequestErrorJsonWrapper};
use handlers::*;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::{
    net::{SocketAddr, TcpListener},
    str::FromStr,
    sync::Arc,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Shared by every handler through an `Extension`.
pub struct AppState {
    pub pool: SqlitePool,
    pub config: AppConfig,
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let pool = init_db(&config.database_url).await?;
    let address = config.bind_address;
    let state = Arc::new(AppState { pool, config });
    serve(make_router(state), address).await
}

pub async fn serve(app: Router, address: SocketAddr) -> Result<()> {
    tracing::info!(%address, "server started");
    axum::Server::try_bind(&address)
        .with_context(|| format!("Failed to bind {}", address))?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    } else {
        tracing::debug!(db_url, "database already exists");
    }
    let options = SqliteConnectOptions::from_str(db_url)
        .context("Invalid DATABASE_URL")?
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(pool)
}

pub fn get_random_free_port() -> Result<(u16, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Could not get a free port")?;
    let addr = listener.local_addr()?;
    Ok((addr.port(), addr))
}

pub fn make_router(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(&state.config.media_root);
    Router::new()
        .route("/check_health", get(alive))
        .route("/cat/", get(list_categories))
        .route("/cat/create/", post(create_category))
        .route("/cat/:id/delete/", delete(delete_category))
        .route("/ad/", get(list_ads))
        .route("/ad/create/", post(create_ad))
        .route("/ad/:id/", get(get_ad))
        .route("/ad/:id/update/", put(replace_ad).patch(patch_ad))
        .route("/ad/:id/delete/", delete(delete_ad))
        .route("/ad/:id/upload_image/", post(upload_ad_image))
        .route("/like/create/", post(create_like))
        .route("/liked/", get(list_liked_ads))
        .route("/comment/create/", post(create_comment))
        .route("/user/create/", post(register_user))
        .route("/user/login/", post(login_user))
        .route("/user/logout/", post(logout_user))
        .route("/user/token/", post(obtain_token_pair))
        .route("/user/token/refresh/", post(refresh_token))
        .route("/user/:id/", get(get_user))
        .route("/user/:id/delete/", delete(delete_user))
        .nest_service("/media", media)
        .fallback(not_found)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
