//! Bounce buffer pool.
//!
//! A fixed set of equally sized buffers carved from one common buffer and
//! handed out in strict circular order. Buffers are taken at admission and
//! given back at completion, and since completion is in ring order the
//! oldest buffer is always the one returned.
//!
//! `busy_index` counts allocations and `free_index` counts releases. Both
//! only grow; `busy_index - free_index` is the number of buffers in use and
//! never exceeds the pool size.

use core::ops::Range;

use super::adapter::{CommonBuffer, DmaAdapter};
use super::sg::ScatterGatherList;
use crate::driver::config::TxDmaConfig;
use crate::error::{ConfigError, ConfigResult, DmaError, DmaResult};
use crate::packet::TxPacket;

/// Circular allocator of physically contiguous scratch buffers
#[derive(Debug)]
pub struct BouncePool {
    memory: CommonBuffer,
    buffer_size: usize,
    count: usize,
    busy_index: u64,
    free_index: u64,
    /// Single-element list describing the most recent bounce
    list: ScatterGatherList,
}

impl BouncePool {
    /// Allocate the pool's backing memory from `adapter`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MaximumPacketSizeTooLarge`] if a buffer size
    ///   overflows
    /// - [`ConfigError::BounceAllocationFailed`] if the adapter cannot
    ///   provide the memory, or provides less than requested
    /// - [`ConfigError::BounceBufferUnreachable`] if any byte of the memory
    ///   lies above the device's highest address
    /// - [`ConfigError::BounceBufferMisaligned`] if the memory does not start
    ///   on the required alignment
    pub fn new<D: DmaAdapter>(config: &TxDmaConfig, adapter: &mut D) -> ConfigResult<Self> {
        let buffer_size = config
            .bounce_buffer_size()
            .ok_or(ConfigError::MaximumPacketSizeTooLarge)?;
        let count = config.bounce_buffers();
        let total = buffer_size
            .checked_mul(count)
            .ok_or(ConfigError::BounceAllocationFailed)?;

        let max_address = config.max_address();
        let memory = adapter
            .allocate_common_buffer(total, config.alignment.bytes(), max_address)
            .map_err(|_| ConfigError::BounceAllocationFailed)?;
        if memory.len() < total {
            return Err(ConfigError::BounceAllocationFailed);
        }

        let start = memory.address().as_u64();
        if let Some(max) = max_address {
            // Buffer sizes are multiples of the alignment, so every buffer
            // starts aligned when the first one does
            let last = start.checked_add(total.saturating_sub(1) as u64);
            if last.is_none_or(|last| last > max) {
                return Err(ConfigError::BounceBufferUnreachable);
            }
        }
        if !config.alignment.is_aligned(start) {
            return Err(ConfigError::BounceBufferMisaligned);
        }

        Ok(Self {
            memory,
            buffer_size,
            count,
            busy_index: 0,
            free_index: 0,
            list: ScatterGatherList::with_limit(1),
        })
    }

    /// Number of buffers in the pool
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.count
    }

    /// Size of each buffer in bytes
    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffers currently handed out
    #[inline]
    pub fn in_use(&self) -> usize {
        self.busy_index.wrapping_sub(self.free_index) as usize
    }

    /// Whether every buffer is handed out
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.in_use() >= self.count
    }

    /// Total allocations so far
    #[inline(always)]
    pub fn busy_index(&self) -> u64 {
        self.busy_index
    }

    /// Total releases so far
    #[inline(always)]
    pub fn free_index(&self) -> u64 {
        self.free_index
    }

    /// Byte range of buffer `index` within the backing memory
    #[inline]
    pub(crate) fn buffer_range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.count {
            return None;
        }
        let start = index * self.buffer_size;
        Some(start..start + self.buffer_size)
    }

    /// CPU view of buffer `index`
    pub fn buffer(&self, index: usize) -> Option<&[u8]> {
        let range = self.buffer_range(index)?;
        self.memory.as_slice().get(range)
    }

    /// Copy `packet` into the next free buffer and describe it.
    ///
    /// # Errors
    ///
    /// - [`DmaError::InsufficientResources`] if every buffer is in use
    /// - [`DmaError::ScatterGatherOverflow`] if the payload does not fit a
    ///   buffer (the analyzer rejects such packets first)
    pub fn bounce<P: TxPacket + ?Sized>(&mut self, packet: &P) -> DmaResult<&ScatterGatherList> {
        if self.is_exhausted() {
            return Err(DmaError::InsufficientResources);
        }

        let index = (self.busy_index % self.count as u64) as usize;
        let range = self
            .buffer_range(index)
            .ok_or(DmaError::InsufficientResources)?;
        let base = self.memory.address().offset(range.start);
        let buffer = self
            .memory
            .as_mut_slice()
            .get_mut(range)
            .ok_or(DmaError::InsufficientResources)?;

        let mut copied = 0usize;
        for fragment in packet.fragments() {
            let payload = fragment.payload();
            let dest = buffer
                .get_mut(copied..copied + payload.len())
                .ok_or(DmaError::ScatterGatherOverflow)?;
            dest.copy_from_slice(payload);
            copied += payload.len();
        }

        self.list.clear();
        self.list.push(base, copied)?;
        self.busy_index = self.busy_index.wrapping_add(1);
        Ok(&self.list)
    }

    /// Return the oldest outstanding buffer.
    ///
    /// Returns `false` (and changes nothing) if no buffer is outstanding.
    pub fn release(&mut self) -> bool {
        if self.in_use() == 0 {
            return false;
        }
        self.free_index = self.free_index.wrapping_add(1);
        true
    }
}
