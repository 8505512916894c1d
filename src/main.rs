use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use leadrelay_auth::PasswordGrantFetcher;
use leadrelay_config::Config;
use leadrelay_proxy::AppState;
use leadrelay_types::TokenFetcher as _;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "leadrelay", about = "leadrelay: authenticated lead relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay server.
    Serve {
        /// Path to a dotenv file (default: ./.env if present).
        #[arg(long, value_name = "FILE")]
        env_file: Option<PathBuf>,
        /// Override the listening port.
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address.
        #[arg(long)]
        host: Option<String>,
        /// Emit logs as JSON lines.
        #[arg(long)]
        log_json: bool,
    },
    /// Perform one token exchange and report the token lifetime.
    Check {
        /// Path to a dotenv file (default: ./.env if present).
        #[arg(long, value_name = "FILE")]
        env_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            env_file,
            port,
            host,
            log_json,
        } => {
            load_env(env_file.as_deref())?;
            init_tracing(log_json);
            cmd_serve(port, host).await
        }
        Commands::Check { env_file } => {
            load_env(env_file.as_deref())?;
            init_tracing(false);
            cmd_check().await
        }
    }
}

/// Variables already set in the process win over the file.
fn load_env(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => dotenv::from_path(path)
            .with_context(|| format!("cannot read env file {}", path.display()))?,
        None => {
            // A missing ./.env is fine.
            dotenv::dotenv().ok();
        }
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config() -> Result<Config> {
    config_from_vars(std::env::vars())
}

fn config_from_vars<I>(vars: I) -> Result<Config>
where
    I: IntoIterator<Item = (String, String)>,
{
    Config::from_vars(vars).context("config error")
}

async fn cmd_serve(port: Option<u16>, host: Option<String>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(p) = port {
        config.port = p;
    }
    if let Some(h) = host {
        config.host = h;
    }

    let addr = format!("{}:{}", config.host, config.port);
    let http = leadrelay_proxy::build_http_client(config.upstream_timeout)?;
    tracing::info!(
        token_url = %config.prospect.token_url,
        lead_url = %config.prospect.lead_url,
        refresh_margin_secs = config.token_refresh_margin,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        "relay configured"
    );

    let state = AppState::from_config(config, http);
    let app = leadrelay_proxy::make_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!(%addr, "leadrelay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("leadrelay stopped");
    Ok(())
}

async fn cmd_check() -> Result<()> {
    let config = load_config()?;
    let http = leadrelay_proxy::build_http_client(config.upstream_timeout)?;
    let fetcher = PasswordGrantFetcher::new(
        http,
        config.prospect.token_url,
        config.prospect.credentials,
    );

    let token = fetcher
        .fetch()
        .await
        .context("token exchange failed")?;
    println!("token exchange ok: expires in {}s", token.expires_in);
    if token.expires_in <= config.token_refresh_margin {
        eprintln!(
            "warning: lifetime is within TOKEN_REFRESH_MARGIN ({}s); every request will refetch",
            config.token_refresh_margin
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
