use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use catalog_core::config::AppConfig;
use catalog_db::{connect_with_settings, migrations, DbPool, SqlProductRepository};
use thiserror::Error;
use tracing::info;

use crate::catalog::CatalogService;
use crate::health;
use crate::session::InMemorySessionStore;
use crate::views::Views;
use crate::web::{self, AppState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

impl Application {
    /// Catalog routes plus the health probe.
    pub fn router(&self) -> Router {
        web::router(self.state.clone()).merge(health::router(self.db_pool.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("template loading failed: {0}")]
    Templates(#[source] tera::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let views = Views::load(config.auth.enabled).map_err(BootstrapError::Templates)?;
    let state = AppState {
        catalog: CatalogService::new(Arc::new(SqlProductRepository::new(db_pool.clone()))),
        sessions: Arc::new(InMemorySessionStore::new(Duration::from_secs(
            config.auth.session_ttl_secs,
        ))),
        auth: Arc::new(config.auth.clone()),
        views,
    };
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        auth_enabled = config.auth.enabled,
        "catalog service wired"
    );

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use catalog_core::config::AppConfig;
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config(database_url: &str, auth_enabled: bool) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = database_url.to_string();
        config.database.max_connections = 1;
        config.auth.enabled = auth_enabled;
        config
    }

    #[tokio::test]
    async fn bootstrap_fails_when_database_cannot_be_opened() {
        let result =
            bootstrap_with_config(config("sqlite:///nonexistent-dir/catalog.db", true)).await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_serves_requests() {
        let app = bootstrap_with_config(config("sqlite::memory:", false)).await.expect("bootstrap");

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'product'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("table lookup");
        assert_eq!(tables, 1);

        let router = app.router();
        let health = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health");
        assert_eq!(health.status(), StatusCode::OK);

        let saved = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/admin/saveProduct")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("name=Widget&price=1&quantity=1"))
                    .expect("request"),
            )
            .await
            .expect("save");
        assert_eq!(saved.status(), StatusCode::SEE_OTHER);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product")
            .fetch_one(&app.db_pool)
            .await
            .expect("count");
        assert_eq!(count, 1);

        app.db_pool.close().await;
    }
}
