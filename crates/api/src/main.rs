use std::sync::Arc;

use anyhow::Context;

use tableside_api::app::{AppState, build_app};
use tableside_api::config::ApiConfig;
use tableside_identity::{InMemoryConnector, InMemoryIdentityBackend, InMemoryProfileStore, ProfileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tableside_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    tracing::warn!("using the in-memory identity provider; accounts are lost on restart");
    let connector = Arc::new(InMemoryConnector::new(Arc::new(InMemoryIdentityBackend::new())));
    let profiles = profile_store(&config).await?;

    let app = build_app(AppState::new(connector, profiles, &config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, site_url = %config.site_url, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn profile_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn ProfileStore>> {
    let Some(url) = config.database_url.as_deref() else {
        return Ok(Arc::new(InMemoryProfileStore::new()));
    };
    let pool = sqlx::PgPool::connect(url).await.context("failed to connect to DATABASE_URL")?;
    let store = tableside_identity::PostgresProfileStore::new(pool);
    store.ensure_schema().await.context("failed to create the users table")?;
    tracing::info!("profile store: postgres");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn profile_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn ProfileStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using the in-memory profile store");
    }
    Ok(Arc::new(InMemoryProfileStore::new()))
}
