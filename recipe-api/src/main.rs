//! # Recipe API Server
//!
//! HTTP API for users to keep recipes, tags and ingredients, with token
//! authentication and recipe image uploads.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p recipe-api                   # serve (default)
//! cargo run -p recipe-api -- migrate        # create database, apply migrations
//! cargo run -p recipe-api -- create-superuser --email admin@example.com --password secret
//! cargo run -p recipe-api -- delete-user --email user@example.com
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use anyhow::Context;
use clap::{Parser, Subcommand};
use recipe_api::{
    app::{build_router, AppState},
    config::Config,
};
use recipe_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::User,
};
use sqlx::PgPool;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "recipe_api=debug,recipe_shared=info,tower_http=debug";

#[derive(Parser)]
#[command(name = "recipe-api", version, about = "Recipe API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,

    /// Create the database if needed and apply migrations
    Migrate,

    /// Create a staff superuser
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Delete a user and everything they own
    DeleteUser {
        #[arg(long)]
        email: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to database")?;

    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(config).await,
        Command::CreateSuperuser { email, password } => {
            let pool = connect(&config).await?;
            let user = User::create_superuser(&pool, &email, &password).await?;
            info!(user_id = user.id, email = %user.email, "Superuser created");
            close_pool(pool).await;
            Ok(())
        }
        Command::DeleteUser { email } => {
            let pool = connect(&config).await?;
            let user = User::find_by_email(&pool, &email)
                .await?
                .with_context(|| format!("No user with email {}", email))?;
            User::delete(&pool, user.id).await?;
            info!(user_id = user.id, "User deleted");
            close_pool(pool).await;
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Recipe API v{} starting...", env!("CARGO_PKG_VERSION"));

    let pool = connect(&config).await?;
    run_migrations(&pool).await.context("Failed to run migrations")?;

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media.root.display()))?;

    let address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    info!("Server stopped");
    Ok(())
}

async fn migrate(config: Config) -> anyhow::Result<()> {
    ensure_database_exists(&config.database.url).await?;

    let pool = connect(&config).await?;
    run_migrations(&pool).await?;
    close_pool(pool).await;

    info!("Migrations applied");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
