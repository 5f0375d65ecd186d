use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use diesel::Connection;
use diesel_async::{
    async_connection_wrapper::AsyncConnectionWrapper,
    pooled_connection::{
        deadpool::{BuildError, Object, Pool},
        AsyncDieselConnectionManager,
    },
    AsyncPgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::{auth::SessionKeys, repository::RepoError};

mod auth;
mod forms;
mod models;
mod repository;
mod routes;
mod schema;

type State = axum::extract::State<Arc<AppState>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn default_max_connections() -> usize {
    16
}

fn default_max_upload() -> usize {
    16 * 1024 * 1024
}

fn default_session_lifetime() -> i64 {
    24 * 7
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct DatabaseConfig {
    url: String,
    #[serde(default = "default_max_connections")]
    max_connections: usize,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct ServerConfig {
    port: u16,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct UploadsConfig {
    dir: PathBuf,
    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload")]
    max_size: usize,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct SessionConfig {
    #[serde(default = "default_session_lifetime")]
    lifetime_hours: i64,
    /// Overridden by `COMICSHELF_SECRET_KEY`
    #[serde(default)]
    secret: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_hours: default_session_lifetime(),
            secret: None,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
struct Config {
    database: DatabaseConfig,
    server: ServerConfig,
    uploads: UploadsConfig,
    #[serde(default)]
    session: SessionConfig,
}

struct AppState {
    config: Config,
    db: Pool<AsyncPgConnection>,
    sessions: SessionKeys,
}

impl AppState {
    async fn connection(&self) -> Result<Object<AsyncPgConnection>, RepoError> {
        Ok(self.db.get().await?)
    }
}

/// Builds the pool lazily, no connection is opened until one is requested.
pub(crate) fn connection_pool(
    config: &DatabaseConfig,
) -> Result<Pool<AsyncPgConnection>, BuildError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    Pool::<AsyncPgConnection>::builder(manager)
        .max_size(config.max_connections)
        .build()
}

/// Must run outside of the async executor, the wrapper blocks on the runtime.
pub(crate) fn run_migrations(url: &str) -> anyhow::Result<()> {
    let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(url)
        .with_context(|| format!("While connecting to the database at {url}"))?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Could not apply the database migrations: {e}"))?;

    for version in applied {
        tracing::info!("Applied migration {version}");
    }

    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    toml::from_str(
        &std::fs::read_to_string(path)
            .with_context(|| format!("Could not load the configuration file '{path}'"))?,
    )
    .with_context(|| "Could not parse the configuration file")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args();
    args.next();

    let cfg: Config = if let Some(arg) = args.next() {
        load_config(&arg)?
    } else if let Ok(arg) = std::env::var("COMICSHELF_CONFIG") {
        load_config(&arg)?
    } else {
        anyhow::bail!("No configuration was supplied");
    };

    let url = cfg.database.url.clone();
    tokio::task::spawn_blocking(move || run_migrations(&url)).await??;

    let db = connection_pool(&cfg.database)
        .with_context(|| "Could not create the database connection pool")?;

    tokio::fs::create_dir_all(&cfg.uploads.dir)
        .await
        .with_context(|| format!("Could not create the cover directory {:?}", cfg.uploads.dir))?;

    let secret = match std::env::var("COMICSHELF_SECRET_KEY") {
        Ok(secret) => secret,
        Err(_) => match &cfg.session.secret {
            Some(secret) => secret.clone(),
            None => anyhow::bail!(
                "No session secret, set COMICSHELF_SECRET_KEY or session.secret in the configuration"
            ),
        },
    };
    let sessions = SessionKeys::new(
        secret.as_bytes(),
        chrono::Duration::hours(cfg.session.lifetime_hours),
    );

    let port = cfg.server.port;

    let state = Arc::new(AppState {
        config: cfg,
        db,
        sessions,
    });

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| "Could not create TCP Listener")?;

    tracing::info!("Listening on port {port}");
    axum::serve(listener, app).await?;

    Ok(())
}
