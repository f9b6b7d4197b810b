//! Scatter/Gather DMA Transmit Queue
//!
//! A `no_std` engine that sits between a fixed-capacity packet ring and a
//! handful of device callbacks, and moves packets from the caller to the
//! device and back in strict order.
//!
//! # Architecture
//!
//! 1. **Queue** ([`TxDmaQueue`]): the ring, per-slot state and the advance
//!    cycle (transmit phase, one flush, completion phase)
//! 2. **DMA** ([`dma`]): bounce analysis, the bounce buffer pool and the
//!    direct or delegated scatter/gather mapper
//! 3. **Device contract** ([`TxHardware`], [`DmaAdapter`]): supplied by the
//!    driver using the queue
//!
//! Everything is sized and allocated once, in [`TxDmaQueue::new`]. No call
//! blocks: resource exhaustion stops admission for the current cycle and the
//! packet is retried on the next one.
//!
//! # Features
//!
//! - `log`: debug/trace/warn logging through the `log` facade
//! - `defmt`: `defmt::Format` for public value types
//! - `critical-section`: ISR-safe [`sync::SharedTxQueue`] wrapper
//!
//! # Example
//!
//! ```ignore
//! use sg_txdma::{TxDmaConfig, TxDmaQueue, AlignmentRequirement};
//!
//! let config = TxDmaConfig::new(1514)
//!     .with_alignment(AlignmentRequirement::Mask(0x3))
//!     .with_address_width(32)
//!     .with_dma_bypass(true);
//!
//! let mut queue = TxDmaQueue::new(config, my_hardware, my_adapter)?;
//!
//! queue.try_post(packet).ok();
//!
//! // From the transmit-complete interrupt or a poll loop
//! queue.advance();
//! while let Some(done) = queue.pop_completed() {
//!     recycle(done.packet, done.completion);
//! }
//! ```

#![no_std]
#![deny(missing_docs)]
// Clippy lint levels live here and in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

extern crate alloc;

// Host test harness (proptest macros expand to std paths)
#[cfg(test)]
#[macro_use]
extern crate std;

// =============================================================================
// Modules
// =============================================================================

pub mod dma;
pub mod driver;
pub mod error;
pub mod packet;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use dma::{
    BounceDecision, BouncePool, CommonBuffer, DmaAdapter, MappingBackend, ScatterGatherElement,
    ScatterGatherList,
};
pub use driver::config::{AlignmentRequirement, TxDmaConfig};
pub use driver::hardware::{TxHardware, TxStatus};
pub use driver::queue::{AdvanceSummary, TxDmaQueue};
pub use driver::state::{CompletedPacket, PacketState, TxCompletion, TxFailure};
pub use driver::stats::TxStatistics;
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use packet::{Fragment, PhysAddr, TxPacket};

#[cfg(feature = "critical-section")]
pub use sync::SharedTxQueue;

/// Shared engine constants.
///
/// Grouped into a dedicated module to keep the top-level facade focused on
/// queue types.
pub mod constants {
    pub use crate::internal::constants::{
        // Scatter/gather
        DEFAULT_BOUNCE_BUFFERS,
        DEFAULT_MAX_SG_ELEMENTS,
        // Ring
        DEFAULT_RING_CAPACITY,
        // Timing
        DRAIN_POLL_INTERVAL_US,
        DRAIN_TIMEOUT_US,
        MAX_SG_ELEMENTS,
        // Page geometry
        PAGE_OFFSET_MASK,
        PAGE_SIZE,
    };
}
