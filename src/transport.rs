//! Delivery transports for flush payloads
//!
//! A flush hands its serialized batch to an ordered chain of transports.
//! Each transport either takes responsibility for the payload or rejects it
//! synchronously, in which case the next transport in the chain is tried:
//!
//! - [`BeaconTransport`] (primary): detached fire-and-forget POST. Rejects
//!   payloads over the beacon byte cap so the chain can fall back.
//! - [`KeepaliveTransport`] (fallback): tracked POST whose outcome is
//!   reported back to the buffer, enabling one retry on a later teardown
//!   signal after a failed attempt.

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::buffer::DeliveryReport;
use crate::config::CollectorConfig;
use crate::Result;

const USER_AGENT: &str = concat!("interlog/", env!("CARGO_PKG_VERSION"));

/// Delivery transport errors. Never propagated to the embedding
/// application; they only steer the fallback chain and the retry flag.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Collector returned status {0}")]
    Status(u16),

    #[error("Payload of {size} bytes exceeds beacon cap of {cap} bytes")]
    PayloadTooLarge { size: usize, cap: usize },

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of handing a payload to a transport.
pub enum Dispatch {
    /// Payload accepted fire-and-forget. The batch may be treated as sent;
    /// no completion report will arrive.
    Detached(JoinHandle<()>),
    /// Delivery started; the outcome will arrive through the
    /// [`DeliveryReport`] the transport was given.
    Tracked(JoinHandle<()>),
    /// Synchronous rejection. The caller should try the next transport.
    Rejected(TransportError),
}

/// A strategy for delivering one serialized batch to the collector.
pub trait DeliveryTransport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Capability check, evaluated once when the delivery chain is
    /// assembled.
    fn is_available(&self) -> bool;

    /// Attempt to take responsibility for `payload`.
    fn dispatch(&self, payload: Bytes, report: DeliveryReport) -> Dispatch;
}

/// Whether the collector URL is absolute enough for a native HTTP client.
/// (An empty `api_base` leaves a bare path, which only a same-origin,
/// browser-hosted client could resolve.)
fn has_absolute_base(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn build_client(config: &CollectorConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout)
        .build()?)
}

/// Primary transport: fire-and-forget delivery in the style of a
/// user-agent beacon. Once the send is queued, delivery is no longer the
/// session's responsibility and its outcome is intentionally unobserved.
pub struct BeaconTransport {
    client: reqwest::Client,
    url: String,
    max_bytes: usize,
}

impl BeaconTransport {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.collector_url(),
            max_bytes: config.beacon_max_bytes,
        })
    }
}

impl DeliveryTransport for BeaconTransport {
    fn name(&self) -> &'static str {
        "beacon"
    }

    fn is_available(&self) -> bool {
        has_absolute_base(&self.url)
    }

    fn dispatch(&self, payload: Bytes, _report: DeliveryReport) -> Dispatch {
        if payload.len() > self.max_bytes {
            return Dispatch::Rejected(TransportError::PayloadTooLarge {
                size: payload.len(),
                cap: self.max_bytes,
            });
        }

        let Ok(runtime) = Handle::try_current() else {
            return Dispatch::Rejected(TransportError::Unavailable(
                "no tokio runtime on the current thread".to_string(),
            ));
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let handle = runtime.spawn(async move {
            match client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .await
            {
                Ok(response) => {
                    debug!(status = %response.status(), "Beacon POST completed");
                }
                Err(e) => {
                    debug!(error = %e, "Beacon POST did not complete");
                }
            }
        });
        Dispatch::Detached(handle)
    }
}

/// Fallback transport: a tracked POST that keeps running after the flush
/// call has returned (the caller never awaits it) and reports its outcome
/// so a failed batch can be retried within the same session.
pub struct KeepaliveTransport {
    client: reqwest::Client,
    url: String,
}

impl KeepaliveTransport {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.collector_url(),
        })
    }
}

impl DeliveryTransport for KeepaliveTransport {
    fn name(&self) -> &'static str {
        "keepalive"
    }

    fn is_available(&self) -> bool {
        has_absolute_base(&self.url)
    }

    fn dispatch(&self, payload: Bytes, report: DeliveryReport) -> Dispatch {
        let Ok(runtime) = Handle::try_current() else {
            return Dispatch::Rejected(TransportError::Unavailable(
                "no tokio runtime on the current thread".to_string(),
            ));
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let handle = runtime.spawn(async move {
            let result = client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    debug!(status = %response.status(), "Keepalive POST delivered");
                    report.delivered();
                }
                Ok(response) => {
                    let error = TransportError::Status(response.status().as_u16());
                    warn!(%error, "Keepalive POST rejected by collector");
                    report.failed(&error);
                }
                Err(e) => {
                    let error = TransportError::Network(e.to_string());
                    warn!(%error, "Keepalive POST failed");
                    report.failed(&error);
                }
            }
        });
        Dispatch::Tracked(handle)
    }
}
