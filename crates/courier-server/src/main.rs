//! # Courier Server
//!
//! Main binary for the interaction bridge:
//! - verifies signed interaction callbacks from the platform
//! - answers handshakes and acknowledges everything else
//! - relays actionable interactions to the downstream automation webhook
//!
//! Startup fails fast on missing or malformed configuration, so a running
//! process always has a usable public key.

use anyhow::Context as _;
use clap::Parser;
use courier_api::{build_router, forwarder::Forwarder, AppState};
use courier_common::config::{AppConfig, LogConfig, LogFormat};
use courier_signing::InteractionVerifier;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

// How long in-flight forwards get to finish after the listener stops.
const FORWARD_DRAIN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Signed interaction webhook bridge")]
struct Cli {
    /// Config file (toml/yaml/json). Defaults to ./courier.* when present.
    #[arg(short, long, env = "COURIER_CONFIG")]
    config: Option<String>,

    /// Override `server.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Validate configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = courier_common::config::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Initialize tracing (structured logging)
    init_tracing(&config.log);

    tracing::info!("Starting Courier v{}", env!("CARGO_PKG_VERSION"));

    let (state, addr) = prepare(&config)?;
    if cli.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    let forwarder = Arc::clone(&state.forwarder);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Interaction bridge listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let pending = forwarder.inflight();
    if pending > 0 {
        tracing::info!("Waiting for {pending} in-flight forward(s)");
    }
    if !forwarder.drain(FORWARD_DRAIN_GRACE).await {
        tracing::warn!(
            "Abandoning {} forward(s) still running after {}s",
            forwarder.inflight(),
            FORWARD_DRAIN_GRACE.as_secs()
        );
    }

    tracing::info!("Server shut down.");
    Ok(())
}

/// Validate config and build everything the router needs.
fn prepare(config: &AppConfig) -> anyhow::Result<(AppState, SocketAddr)> {
    config.validate()?;

    // === Interaction public key ===
    let verifier = InteractionVerifier::from_hex(&config.discord.public_key)
        .context("discord.public_key is not a usable Ed25519 key")?;
    tracing::info!("Interaction public key loaded: {}", verifier.public_key_hex());

    // === Downstream relay ===
    let forwarder = Arc::new(Forwarder::new(&config.forward)?);
    match forwarder.target_host() {
        Some(host) => tracing::info!(
            "Forwarding actionable interactions to {host} (timeout {}s)",
            config.forward.timeout_secs
        ),
        None => tracing::warn!("No downstream URL configured; forwarding is disabled"),
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("server.host is not an IP address")?,
        config.server.port,
    );

    Ok((AppState::new(verifier, forwarder, config.server.max_body_bytes), addr))
}

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log.filter.as_str().into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down..."),
        _ = terminate => tracing::info!("SIGTERM received, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_common::config::{DiscordConfig, ForwardConfig, ServerConfig};
    use courier_signing::InteractionSigner;
    use std::collections::HashMap;

    fn config(url: Option<&str>, required: bool) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
                max_body_bytes: 4096,
            },
            discord: DiscordConfig {
                public_key: InteractionSigner::generate().public_key_hex(),
            },
            forward: ForwardConfig {
                url: url.map(str::to_owned),
                required,
                timeout_secs: 5,
                extra_headers: HashMap::new(),
            },
            log: LogConfig {
                format: LogFormat::Pretty,
                filter: "courier=debug".into(),
            },
        }
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["courier", "--port", "8080", "--check"]);
        assert_eq!(cli.port, Some(8080));
        assert!(cli.check);
    }

    #[test]
    fn prepare_builds_state() {
        let (state, addr) = prepare(&config(Some("https://n8n.example.com/webhook/x"), true)).unwrap();
        assert_eq!(addr.port(), 3000);
        assert!(state.forwarder.is_configured());
        assert_eq!(state.max_body_bytes, 4096);
    }

    #[test]
    fn missing_downstream_refuses_to_start_when_required() {
        assert!(prepare(&config(None, true)).is_err());
    }

    #[test]
    fn missing_downstream_allowed_when_optional() {
        let (state, _) = prepare(&config(None, false)).unwrap();
        assert!(!state.forwarder.is_configured());
    }

    #[test]
    fn bad_host_is_rejected() {
        let mut cfg = config(Some("https://n8n.example.com/webhook/x"), true);
        cfg.server.host = "not-an-ip".into();
        assert!(prepare(&cfg).is_err());
    }
}
