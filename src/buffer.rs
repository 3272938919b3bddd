//! The interaction log buffer
//!
//! [`InteractionLogBuffer`] accumulates interaction events in memory and
//! flushes them as one atomic batch when the session is torn down. Recording
//! is synchronous, infallible, and performs no I/O; delivery is best-effort
//! and fully absorbed, so telemetry can never break the embedding
//! application.
//!
//! Flush contract:
//! - At most one delivery attempt is outstanding per teardown; duplicate
//!   teardown signals are no-ops.
//! - The batch is serialized once and succeeds or fails as a unit, in
//!   record order.
//! - A failed tracked delivery re-arms the flush guard and leaves the
//!   buffer intact, so a later teardown signal within the same session may
//!   retry the identical batch. Synchronous rejections while walking the
//!   transport chain never re-arm the guard.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CollectorConfig;
use crate::events::{InteractionBatch, InteractionEvent};
use crate::transport::{
    BeaconTransport, DeliveryTransport, Dispatch, KeepaliveTransport, TransportError,
};
use crate::Result;

/// Mutable buffer state. Single logical writer; the mutex preserves that
/// property under real threads.
struct Inner {
    /// Append-ordered events, unbounded. A session's event count is small
    /// and the buffer drains at teardown.
    buffer: Vec<InteractionEvent>,
    /// Set before a delivery attempt starts; cleared only when a tracked
    /// attempt is confirmed failed.
    flush_attempted: bool,
    /// Handle of the detached delivery task, if one is outstanding.
    in_flight: Option<JoinHandle<()>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            flush_attempted: false,
            in_flight: None,
        }
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // Absorb lock poisoning; telemetry state stays usable after a panic
    // elsewhere and must never propagate one.
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Session-wide interaction buffer with teardown flush.
///
/// Construct once at application start (wrap in `Arc` to share with the
/// lifecycle wiring) and call [`record`](Self::record) from anywhere.
pub struct InteractionLogBuffer {
    inner: Arc<Mutex<Inner>>,
    transports: Vec<Arc<dyn DeliveryTransport>>,
}

impl InteractionLogBuffer {
    /// Build a buffer over an explicit transport chain, tried in order.
    /// Unavailable transports are excluded up front.
    pub fn new(transports: Vec<Arc<dyn DeliveryTransport>>) -> Self {
        let transports: Vec<_> = transports
            .into_iter()
            .filter(|t| {
                let available = t.is_available();
                if !available {
                    debug!(
                        transport = t.name(),
                        "Transport unavailable; excluded from delivery chain"
                    );
                }
                available
            })
            .collect();

        if transports.is_empty() {
            warn!("No delivery transport available; interactions will be dropped at teardown");
        }

        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            transports,
        }
    }

    /// Build a buffer with the standard chain for the given collector:
    /// beacon first, keepalive fallback.
    pub fn with_collector(config: &CollectorConfig) -> Result<Self> {
        let transports: Vec<Arc<dyn DeliveryTransport>> = vec![
            Arc::new(BeaconTransport::new(config)?),
            Arc::new(KeepaliveTransport::new(config)?),
        ];
        Ok(Self::new(transports))
    }

    /// Record an interaction. Fire-and-forget: never fails, never blocks on
    /// I/O, stamps the event with the current UTC time.
    pub fn record(&self, event_type: impl Into<String>, event_data: Map<String, Value>) {
        let event = InteractionEvent::new(event_type, event_data);
        lock_inner(&self.inner).buffer.push(event);
    }

    /// Number of currently buffered events.
    pub fn buffered_len(&self) -> usize {
        lock_inner(&self.inner).buffer.len()
    }

    /// Whether a delivery attempt has been made and not since re-armed.
    pub fn flush_attempted(&self) -> bool {
        lock_inner(&self.inner).flush_attempted
    }

    /// Attempt to deliver the entire current buffer, once per teardown.
    ///
    /// Invoked by lifecycle wiring on a teardown signal, not by application
    /// code. Dispatches the network send and returns without awaiting it.
    pub fn flush(&self) {
        let (payload, snapshot_len) = {
            let mut inner = lock_inner(&self.inner);
            if inner.flush_attempted {
                debug!("Flush already attempted this teardown; skipping");
                return;
            }
            if inner.buffer.is_empty() {
                debug!("Nothing buffered; skipping flush");
                return;
            }

            let batch = InteractionBatch {
                interactions: inner.buffer.clone(),
            };
            let body = match serde_json::to_vec(&batch) {
                Ok(body) => body,
                Err(e) => {
                    // Unreachable for Value-backed event data; keep the
                    // session usable rather than wedging the guard.
                    warn!(error = %e, "Failed to serialize interaction batch");
                    return;
                }
            };

            inner.flush_attempted = true;
            (Bytes::from(body), inner.buffer.len())
        };

        for transport in &self.transports {
            let report = DeliveryReport {
                inner: Arc::clone(&self.inner),
                snapshot_len,
            };
            match transport.dispatch(payload.clone(), report) {
                Dispatch::Detached(handle) => {
                    debug!(
                        transport = transport.name(),
                        events = snapshot_len,
                        "Batch queued"
                    );
                    let mut inner = lock_inner(&self.inner);
                    inner.buffer.drain(..snapshot_len);
                    inner.in_flight = Some(handle);
                    return;
                }
                Dispatch::Tracked(handle) => {
                    debug!(
                        transport = transport.name(),
                        events = snapshot_len,
                        "Batch in flight"
                    );
                    lock_inner(&self.inner).in_flight = Some(handle);
                    return;
                }
                Dispatch::Rejected(error) => {
                    debug!(transport = transport.name(), %error, "Transport rejected batch");
                }
            }
        }

        debug!(
            events = snapshot_len,
            "No transport accepted the batch; events dropped at teardown"
        );
    }

    /// Wait for an outstanding delivery to settle, bounded by `grace`.
    ///
    /// A browser hands beacon payloads to the user agent, which outlives
    /// the page; a native process has no such outliver, so teardown grants
    /// the detached send a bounded window instead. Tests use the same hook
    /// for determinism.
    pub async fn drain(&self, grace: Duration) {
        let handle = lock_inner(&self.inner).in_flight.take();
        let Some(handle) = handle else {
            return;
        };

        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Delivery task failed"),
            Err(_) => debug!("Delivery still in flight after grace period"),
        }
    }
}

/// Completion handle a tracked transport uses to report its outcome back
/// to the buffer.
pub struct DeliveryReport {
    inner: Arc<Mutex<Inner>>,
    snapshot_len: usize,
}

impl DeliveryReport {
    /// The batch reached the collector: remove the delivered snapshot
    /// prefix. Events recorded after the snapshot survive.
    pub fn delivered(self) {
        let mut inner = lock_inner(&self.inner);
        let n = self.snapshot_len.min(inner.buffer.len());
        inner.buffer.drain(..n);
        debug!(events = n, "Batch delivered");
    }

    /// The attempt failed: re-arm the flush guard and leave the buffer
    /// intact so a later teardown signal may retry.
    pub fn failed(self, error: &TransportError) {
        let mut inner = lock_inner(&self.inner);
        inner.flush_attempted = false;
        warn!(%error, "Batch delivery failed; will retry on next teardown signal");
    }

    /// A report wired to nothing, for exercising transports in isolation.
    #[cfg(test)]
    pub(crate) fn discarded() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            snapshot_len: 0,
        }
    }
}
