//! Internal Implementation Details
//!
//! Not part of the public API; may change without notice.
//!
//! - [`constants`]: sizes and defaults
//! - [`ring`]: the packet ring and its cursors

pub(crate) mod constants;
pub(crate) mod ring;
