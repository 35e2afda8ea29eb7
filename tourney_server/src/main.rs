//! Tournament server: the HTTP/JSON front end of the tourney engine.
//!
//! Tournaments live in memory by default, or in PostgreSQL with
//! `--storage postgres`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use tourney::db::{
    Database, InMemoryTournamentRepository, PgTournamentRepository, TournamentRepository,
};
use tourney::tournament::TournamentManager;
use tourney_server::{
    api,
    config::{ServerConfig, StorageBackend},
    logging,
};

const HELP: &str = "\
Run the tournament server

USAGE:
  tourney_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND, PORT or 127.0.0.1:8080]
  --storage    BACKEND     memory or postgres          [default: env STORAGE_BACKEND or memory]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  PORT                     Port to listen on all interfaces when SERVER_BIND is unset
  STORAGE_BACKEND          memory or postgres
  DATABASE_URL             PostgreSQL connection string
  RUST_LOG                 Log filter [default: info,sqlx=warn]
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    storage: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        storage: pargs.opt_value_from_str("--storage")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.storage)?;
    config.validate()?;

    let (repository, database) = open_storage(&config).await?;
    let manager = TournamentManager::new(repository);

    let app = api::create_router(api::AppState { manager });

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    if let Some(database) = database {
        database.close().await;
    }

    Ok(())
}

/// Build the repository for the configured backend
async fn open_storage(
    config: &ServerConfig,
) -> Result<(Arc<dyn TournamentRepository>, Option<Database>), Error> {
    match (config.storage, &config.database) {
        (StorageBackend::Postgres, Some(db_config)) => {
            info!("Connecting to database...");
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database connected and migrated");

            let repository: Arc<dyn TournamentRepository> =
                Arc::new(PgTournamentRepository::new(db.pool().clone()));
            Ok((repository, Some(db)))
        }
        (StorageBackend::Postgres, None) => {
            Err(anyhow::anyhow!("Postgres storage selected without database settings"))
        }
        (StorageBackend::Memory, _) => {
            info!("Using in-memory storage; tournaments are lost on restart");
            let repository: Arc<dyn TournamentRepository> =
                Arc::new(InMemoryTournamentRepository::new());
            Ok((repository, None))
        }
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
