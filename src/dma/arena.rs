//! Per-slot transfer-context arena for the delegated mapping backend.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

/// One contiguous allocation carved into equal per-slot context blocks
#[derive(Debug)]
pub(crate) struct ContextArena {
    bytes: Vec<u8>,
    stride: usize,
    slots: usize,
}

impl ContextArena {
    /// Reserve `slots` blocks of `stride` bytes each
    pub(crate) fn new(slots: usize, stride: usize) -> Self {
        Self {
            bytes: vec![0u8; slots.saturating_mul(stride)],
            stride,
            slots,
        }
    }

    /// Byte range of `slot`'s block, or `None` if `slot` is out of range
    #[inline]
    pub(crate) fn slot_range(&self, slot: usize) -> Option<Range<usize>> {
        if slot >= self.slots {
            return None;
        }
        let start = slot * self.stride;
        Some(start..start + self.stride)
    }

    /// Mutable view of `slot`'s block
    #[inline]
    pub(crate) fn slot_mut(&mut self, slot: usize) -> Option<&mut [u8]> {
        let range = self.slot_range(slot)?;
        self.bytes.get_mut(range)
    }
}
