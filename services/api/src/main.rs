use anyhow::{Context, Result};
use api::{
    AppState, ShoppingService,
    config::{AppConfig, SessionBackend, StoreBackend},
    create_router,
    repositories::{MemoryStore, PgStore, Store},
};
use auth::{MemorySessionStore, PasswordHasher, RedisSessionStore, SessionManager, SessionStore};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool, run_migrations},
};
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting API service");

    let config = AppConfig::from_env().context("failed to load configuration")?;

    match config.store_backend {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            if common::database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }
            run_migrations(&pool, &MIGRATOR).await?;

            with_sessions(config, PgStore::new(pool)).await
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on exit");
            with_sessions(config, MemoryStore::new()).await
        }
    }
}

async fn with_sessions<S: Store>(config: AppConfig, store: S) -> Result<()> {
    match config.session_backend {
        SessionBackend::Redis => {
            let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;
            if !redis_pool.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            serve(config, store, RedisSessionStore::new(redis_pool)).await
        }
        SessionBackend::Memory => {
            warn!("Using the in-memory session store; sessions are lost on exit");
            serve(config, store, MemorySessionStore::new()).await
        }
    }
}

async fn serve<S: Store, C: SessionStore>(config: AppConfig, store: S, sessions: C) -> Result<()> {
    let hasher = PasswordHasher::new(config.hash_config())?;
    let service = ShoppingService::new(
        store,
        SessionManager::new(sessions, config.session_ttl())
            .with_refresh_timeout(config.session_refresh_timeout()),
        hasher,
        config.share_validity(),
    )
    .with_deadline(config.request_timeout());
    let app = create_router(AppState::new(service));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
