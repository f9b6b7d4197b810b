//! Transmit queue driver components.
//!
//! - [`config`] - Queue configuration and builder
//! - [`hardware`] - The device callback contract
//! - [`queue`] - The transmit queue engine
//! - [`state`] - Per-packet lifecycle and completion results
//! - [`stats`] - Read-only counters
//!
//! # Example
//!
//! ```ignore
//! use sg_txdma::driver::{TxDmaConfig, TxDmaQueue};
//!
//! let config = TxDmaConfig::new(1514).with_bounce_buffers(32);
//! let queue = TxDmaQueue::new(config, hardware, adapter)?;
//! ```

// Submodules
pub mod config;
pub mod hardware;
pub mod queue;
pub mod state;
pub mod stats;

// Re-exports for convenience
pub use config::{AlignmentRequirement, TxDmaConfig};
pub use hardware::{TxHardware, TxStatus};
pub use queue::{AdvanceSummary, TxDmaQueue};
pub use state::{CompletedPacket, PacketState, TxCompletion, TxFailure};
pub use stats::TxStatistics;
