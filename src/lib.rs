//! # interlog
//!
//! Buffered, best-effort session interaction logging:
//! - Event record and batch payload types (`InteractionEvent`)
//! - The in-memory buffer with teardown flush (`InteractionLogBuffer`)
//! - Delivery transports with a beacon-to-keepalive fallback chain
//! - Teardown signal wiring for graceful shutdown
//! - Collector configuration loading
//!
//! Recording is infallible and performs no I/O; all delivery failure is
//! absorbed internally. Telemetry must never break the embedding
//! application.

pub mod buffer;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod transport;

pub use buffer::InteractionLogBuffer;
pub use config::CollectorConfig;
pub use error::{Error, Result};
pub use events::{InteractionBatch, InteractionEvent};
