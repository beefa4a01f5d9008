use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mainframe_auth::api::axum::{AppState, app};
use mainframe_auth::cleanup::SessionCleanupJob;
use mainframe_auth::crypto::{Argon2Hasher, PasswordHasher, generate_server_key};
use mainframe_auth::events::listeners::TracingListener;
use mainframe_auth::{AuthConfig, EventDispatcher, Role, SecretString, User, sqlite};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mainframe", version, about = "Authentication and session service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations and serve the HTTP API
    Serve {
        /// Base64url server key used to MAC session verifiers
        #[arg(long, env = "SERVER_KEY", hide_env_values = true)]
        server_key: String,

        #[arg(long, env = "DB_PATH", default_value = "mainframe.db")]
        db_path: String,

        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind_addr: SocketAddr,

        /// `production` forces secure cookies
        #[arg(long, env = "APP_ENV", default_value = "production")]
        app_env: String,
    },

    /// Print an Argon2id digest of PASSWORD
    HashPassword { password: String },

    /// Insert a user, typically the first administrator
    CreateUser {
        #[arg(long, env = "DB_PATH", default_value = "mainframe.db")]
        db_path: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long, env = "MAINFRAME_PASSWORD", hide_env_values = true)]
        password: String,

        /// Repeatable, e.g. `--role Administrator --role "Basic User"`
        #[arg(long = "role", required = true)]
        roles: Vec<Role>,
    },

    /// Print a fresh server key
    GenerateKey,

    /// Print a random UUID
    GenerateId,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            server_key,
            db_path,
            bind_addr,
            app_env,
        } => {
            init_telemetry()?;
            serve(server_key, &db_path, bind_addr, &app_env).await
        }
        Command::HashPassword { password } => {
            let digest = Argon2Hasher::default().hash(&password)?;
            println!("{digest}");
            Ok(())
        }
        Command::CreateUser {
            db_path,
            username,
            email,
            first_name,
            last_name,
            password,
            roles,
        } => {
            init_telemetry()?;
            let pool = sqlite::connect(&database_url(&db_path)).await?;
            sqlite::migrations::run(&pool).await?;

            let digest = Argon2Hasher::default().hash(&password)?;
            let user = User::new(&username, &email, &first_name, &last_name, &digest, roles);
            let (users, _) = sqlite::create_repositories(pool);
            users.create_user(&user).await?;

            println!("{}", user.id);
            Ok(())
        }
        Command::GenerateKey => {
            let key = generate_server_key()?;
            println!("{}", key.expose_secret());
            Ok(())
        }
        Command::GenerateId => {
            println!("{}", uuid::Uuid::new_v4());
            Ok(())
        }
    }
}

fn init_telemetry() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn database_url(db_path: &str) -> String {
    format!("sqlite://{db_path}")
}

async fn serve(server_key: String, db_path: &str, bind_addr: SocketAddr, app_env: &str) -> Result<()> {
    let key = SecretString::new(server_key);
    let config = match app_env {
        "production" => AuthConfig::new(key),
        "development" => AuthConfig::development(key),
        other => bail!("APP_ENV must be `production` or `development`, got `{other}`"),
    };
    config.validate()?;

    let pool = sqlite::connect(&database_url(db_path))
        .await
        .with_context(|| format!("failed to open database at {db_path}"))?;
    sqlite::migrations::run(&pool).await?;
    let (users, sessions) = sqlite::create_repositories(pool.clone());

    let events = EventDispatcher::new().listen(TracingListener);

    let shutdown = CancellationToken::new();
    let cleanup = SessionCleanupJob::new(sessions.clone(), &config)?
        .with_events(events.clone())
        .spawn(shutdown.clone());

    let state = AppState::new(users, sessions, Argon2Hasher::default(), config).with_events(events);
    let router = app(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, environment = app_env, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    cleanup.await?;
    pool.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
        () = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}
