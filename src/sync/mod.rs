//! Synchronization Support
//!
//! The queue itself is single-threaded. [`SharedTxQueue`] is a
//! `static`-friendly slot holding a [`TxDmaQueue`] for callers that post
//! from thread context and advance from an interrupt handler.
//!
//! Requires the `critical-section` feature.
//!
//! [`TxDmaQueue`]: crate::TxDmaQueue

mod shared;

pub use shared::SharedTxQueue;
