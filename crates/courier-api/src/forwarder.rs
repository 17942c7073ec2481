//! Downstream relay.
//!
//! The [`Forwarder`] posts each actionable interaction to the automation
//! endpoint exactly once. It runs on a detached task: the platform's reply is
//! never held back by it, and nothing it returns reaches the platform.
//!
//! Outcomes are logged and published on a broadcast channel for anyone who
//! wants to observe them (telemetry, tests).
//!
//! # Usage
//!
//! ```rust,no_run
//! use courier_api::forwarder::Forwarder;
//! use courier_common::config::ForwardConfig;
//! use std::sync::Arc;
//!
//! # fn demo(cfg: &ForwardConfig, interaction: courier_common::models::Interaction) {
//! let forwarder = Arc::new(Forwarder::new(cfg).unwrap());
//! let mut outcomes = forwarder.subscribe();
//! forwarder.spawn(interaction);
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use courier_common::{config::ForwardConfig, error::CourierError, models::Interaction};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::{Notify, broadcast};
use tracing::{debug, error, info, warn};
use url::Url;

// Maximum downstream response body kept for logs.
const MAX_LOGGED_BODY: usize = 512;

// Outcome reports buffered for slow subscribers before they start lagging.
const OUTCOME_CHANNEL_CAPACITY: usize = 1024;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What happened to one forward attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Downstream answered 2xx.
    Delivered { status: u16, body: String },
    /// Downstream answered, but not 2xx.
    Rejected { status: u16, body: String },
    /// Network error or timeout.
    Failed { reason: String },
    /// No downstream URL configured.
    Skipped,
}

impl ForwardOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// A forward outcome with the context needed to log or correlate it.
#[derive(Debug, Clone)]
pub struct ForwardReport {
    pub interaction_id: Option<String>,
    pub interaction_type: &'static str,
    pub outcome: ForwardOutcome,
    pub elapsed: Duration,
}

// ─── Forwarder ───────────────────────────────────────────────────────────────

/// Single-attempt HTTP relay to the downstream automation endpoint.
pub struct Forwarder {
    url: Option<Url>,
    http: Client,
    headers: HeaderMap,
    timeout: Duration,
    outcomes: broadcast::Sender<ForwardReport>,
    warned_unconfigured: AtomicBool,
    inflight: AtomicUsize,
    idle: Notify,
}

impl Forwarder {
    /// Build a forwarder from config. A blank or missing URL yields a forwarder
    /// that skips every attempt.
    pub fn new(config: &ForwardConfig) -> Result<Self, CourierError> {
        let url = config
            .target_url()
            .map(Url::parse)
            .transpose()
            .map_err(|e| CourierError::configuration(format!("forward.url: {e}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                CourierError::configuration(format!("forward.extra_headers: bad name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                CourierError::configuration(format!("forward.extra_headers: bad value for '{name}': {e}"))
            })?;
            headers.insert(name, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Courier/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build downstream HTTP client")?;

        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);

        Ok(Self {
            url,
            http,
            headers,
            timeout,
            outcomes,
            warned_unconfigured: AtomicBool::new(false),
            inflight: AtomicUsize::new(0),
            idle: Notify::new(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Downstream host for logs. Paths of automation webhooks often carry secrets.
    pub fn target_host(&self) -> Option<&str> {
        self.url.as_ref().and_then(Url::host_str)
    }

    /// Receive a [`ForwardReport`] for every completed attempt from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ForwardReport> {
        self.outcomes.subscribe()
    }

    /// Number of forwards currently running on detached tasks.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }

    // ── Relay ────────────────────────────────────────────────────────────────

    /// Relay on a detached task. The caller must not await the handle on the
    /// response path.
    pub fn spawn(self: &Arc<Self>, interaction: Interaction) -> tokio::task::JoinHandle<()> {
        self.inflight.fetch_add(1, Ordering::SeqCst);
        let guard = InflightGuard(Arc::clone(self));
        let this = Arc::clone(self);

        tokio::spawn(async move {
            let _guard = guard;
            let report = this.forward(&interaction).await;
            // No subscribers is fine.
            let _ = this.outcomes.send(report);
        })
    }

    /// One POST of the raw interaction bytes. Never retries.
    pub async fn forward(&self, interaction: &Interaction) -> ForwardReport {
        let started = Instant::now();
        let interaction_id = interaction.id().map(str::to_owned);
        let interaction_type = interaction.interaction_type().as_str();

        let outcome = match &self.url {
            None => {
                if !self.warned_unconfigured.swap(true, Ordering::SeqCst) {
                    error!("Downstream URL is not configured; interactions will not be forwarded");
                } else {
                    debug!(interaction_id = ?interaction_id, "Forward skipped, no downstream URL");
                }
                ForwardOutcome::Skipped
            }
            Some(url) => self.post(url, interaction).await,
        };

        let report = ForwardReport {
            interaction_id,
            interaction_type,
            outcome,
            elapsed: started.elapsed(),
        };
        log_report(&report);
        report
    }

    async fn post(&self, url: &Url, interaction: &Interaction) -> ForwardOutcome {
        debug!("Forwarding interaction to {}", url.host_str().unwrap_or("?"));
        let result = self
            .http
            .post(url.clone())
            .headers(self.headers.clone())
            .body(interaction.raw().clone())
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                return ForwardOutcome::Failed {
                    reason: format!("timed out after {}ms", self.timeout.as_millis()),
                };
            }
            Err(e) => return ForwardOutcome::Failed { reason: e.to_string() },
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) => truncate(text),
            Err(e) if e.is_timeout() => {
                return ForwardOutcome::Failed {
                    reason: format!("timed out reading response after {}ms", self.timeout.as_millis()),
                };
            }
            Err(e) => format!("<unreadable body: {e}>"),
        };

        if status.is_success() {
            ForwardOutcome::Delivered { status: status.as_u16(), body }
        } else {
            ForwardOutcome::Rejected { status: status.as_u16(), body }
        }
    }

    // ── Shutdown ─────────────────────────────────────────────────────────────

    /// Wait for in-flight forwards to finish, up to `timeout`.
    ///
    /// Returns `true` when everything drained.
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.inflight() == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

/// Decrements the in-flight count even if the forward task panics.
struct InflightGuard(Arc<Forwarder>);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.0.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn log_report(report: &ForwardReport) {
    let elapsed_ms = report.elapsed.as_millis() as u64;
    let id = report.interaction_id.as_deref().unwrap_or("-");
    match &report.outcome {
        ForwardOutcome::Delivered { status, .. } => info!(
            interaction_id = id,
            interaction_type = report.interaction_type,
            status,
            elapsed_ms,
            outcome = "delivered",
            "Interaction forwarded"
        ),
        ForwardOutcome::Rejected { status, body } => warn!(
            interaction_id = id,
            interaction_type = report.interaction_type,
            status,
            elapsed_ms,
            outcome = "rejected",
            body = %body,
            "Downstream rejected interaction"
        ),
        ForwardOutcome::Failed { reason } => warn!(
            interaction_id = id,
            interaction_type = report.interaction_type,
            elapsed_ms,
            outcome = "failed",
            reason = %reason,
            "Error forwarding interaction"
        ),
        ForwardOutcome::Skipped => {}
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_LOGGED_BODY {
        let mut cut = MAX_LOGGED_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}
