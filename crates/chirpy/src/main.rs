//! Chirpy - a small social network API

use anyhow::{Context, Result, bail};
use chirpy_api::{AppState, create_router};
use chirpy_auth::{JwtManager, PasswordManager, RefreshTokenManager};
use chirpy_db::{Database, PoolSettings};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, DEFAULT_JWT_SECRET};

/// Chirpy - a small social network API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "CHIRPY_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "CHIRPY_PORT")]
    port: Option<u16>,

    /// SQLite database URL
    #[arg(long, env = "DB_URL")]
    database_url: Option<String>,

    /// Secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Deployment platform (`dev` enables /admin/reset)
    #[arg(long, env = "PLATFORM")]
    platform: Option<String>,

    /// API key expected on Polka webhooks
    #[arg(long, env = "POLKA_KEY", hide_env_values = true)]
    polka_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables from .env feed the CLI fallbacks
    let dotenv = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration and apply overrides
    let mut config = Config::load(&args.config)?;
    apply_args(&mut config, args);

    // Initialize logging
    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Chirpy v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    if config.auth.jwt_secret.is_empty() {
        bail!("JWT secret must not be empty");
    }
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("Using the default JWT secret; set JWT_SECRET in production");
    }
    if config.polka.api_key.is_none() {
        warn!("No Polka API key configured; webhooks are accepted without authentication");
    }

    // Create the database directory
    if let Some(parent) = config.database_file().and_then(|p| p.parent())
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // Initialize database
    let db = Database::new(
        &config.database.url,
        PoolSettings {
            max_connections: config.database.max_connections,
            acquire_timeout: Duration::from_secs(config.database.acquire_timeout_secs),
        },
    )
    .await?;

    // Initialize credential managers
    let passwords = Arc::new(
        PasswordManager::new(config.auth.password).context("Invalid password hashing cost")?,
    );
    let jwt = Arc::new(JwtManager::new(
        config.auth.jwt_secret.as_bytes(),
        config.auth.access_token_ttl()?,
    ));
    let refresh_tokens = Arc::new(RefreshTokenManager::new(
        Arc::new(db.clone()),
        config.auth.refresh_token_ttl()?,
        Duration::from_secs(config.auth.store_timeout_secs),
    ));

    // Install the Prometheus recorder
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    info!("Platform: {:?}", config.platform);

    // Create application state
    let state = AppState::new(
        db,
        jwt,
        passwords,
        refresh_tokens,
        config.platform.clone(),
        config.polka.api_key.clone(),
    );

    // Create router
    let app = create_router(state, metrics_handle)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    // Determine bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Command line and environment values win over the config file
fn apply_args(config: &mut Config, args: Args) {
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = secret;
    }
    if let Some(platform) = args.platform {
        config.platform = platform;
    }
    if let Some(key) = args.polka_key {
        config.polka.api_key = Some(key);
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "chirpy",
            "--port",
            "9999",
            "--database-url",
            "sqlite::memory:",
            "--jwt-secret",
            "from-cli",
            "--platform",
            "dev",
            "--polka-key",
            "key",
        ]);

        let mut config = Config::default();
        apply_args(&mut config, args);

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.auth.jwt_secret, "from-cli");
        assert_eq!(config.platform, "dev");
        assert_eq!(config.polka.api_key.as_deref(), Some("key"));
    }
}
