use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetcheckError {
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Outcome of the connectivity check.
///
/// Unreachable is a valid terminal result, not an error: the host may be
/// rebuilding behind a firewall and offline provisioning is still useful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Reachable,
    Unreachable,
}

impl Connectivity {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

/// A single bounded probe attempt against some target.
/// Abstracted as a trait so the attempt loop is testable without a network.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns true if the target answered within the probe's own timeout.
    async fn probe_once(&self) -> bool;
}

/// Real probe: one HEAD request per attempt, bounded by a client timeout.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, NetcheckError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn probe_once(&self) -> bool {
        // Any HTTP response counts as connectivity; the status code does not matter.
        self.client.head(&self.url).send().await.is_ok()
    }
}

/// Probes up to `attempts` times and returns on the first success.
/// Unreachable is reported only after the whole attempt budget is exhausted.
pub async fn check_connectivity<P: ConnectivityProbe + ?Sized>(
    probe: &P,
    attempts: u32,
) -> Connectivity {
    for _ in 0..attempts {
        if probe.probe_once().await {
            return Connectivity::Reachable;
        }
    }
    Connectivity::Unreachable
}
