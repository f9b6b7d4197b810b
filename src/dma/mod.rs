//! DMA mapping building blocks
//!
//! Everything between "a packet is admitted" and "the hardware gets a
//! scatter/gather list":
//!
//! - [`analyzer`]: classifies a packet as in-place, bounce or unsendable
//! - [`BouncePool`]: circular pool of contiguous copy buffers
//! - [`ScatterGatherList`]: the descriptor list handed to the hardware
//! - [`DmaAdapter`]: the platform DMA subsystem the queue delegates to
//! - the mapper (crate-internal), which picks the direct or delegated backend

pub mod adapter;
pub mod analyzer;
mod arena;
pub mod bounce;
pub(crate) mod mapper;
pub mod sg;

pub use adapter::{CommonBuffer, DmaAdapter};
pub use analyzer::{BounceAnalysis, BounceDecision, BounceLimits, analyze, apply_override};
pub use bounce::BouncePool;
pub use mapper::MappingBackend;
pub use sg::{ScatterGatherElement, ScatterGatherList};
