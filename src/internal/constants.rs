//! Centralized Constants
//!
//! Single source of truth for the sizes and defaults used by the transmit
//! engine.
//!
//! # Organization
//!
//! - **Page geometry**: used for descriptor counting and span splitting
//! - **Scatter/gather limits**: defaults and hard caps
//! - **Bounce pool**: default buffer count
//! - **Timing**: drain helper defaults

// =============================================================================
// Page Geometry
// =============================================================================

/// Page size assumed when counting and splitting physical spans
pub const PAGE_SIZE: usize = 4096;

/// Mask selecting the byte offset within a page
pub const PAGE_OFFSET_MASK: u64 = (PAGE_SIZE as u64) - 1;

// =============================================================================
// Scatter/Gather Limits
// =============================================================================

/// Scatter/gather element limit used when the configuration leaves it at 0
pub const DEFAULT_MAX_SG_ELEMENTS: usize = 16;

/// Largest scatter/gather element limit a configuration may request
pub const MAX_SG_ELEMENTS: usize = 255;

// =============================================================================
// Bounce Pool
// =============================================================================

/// Bounce buffer count used when the configuration leaves it at 0
pub const DEFAULT_BOUNCE_BUFFERS: usize = 16;

// =============================================================================
// Ring
// =============================================================================

/// Default packet ring capacity
pub const DEFAULT_RING_CAPACITY: usize = 64;

// =============================================================================
// Timing Constants
// =============================================================================

/// Default pause between drain cycles in microseconds
pub const DRAIN_POLL_INTERVAL_US: u32 = 100;

/// Default drain budget in microseconds
pub const DRAIN_TIMEOUT_US: u32 = 100_000;
