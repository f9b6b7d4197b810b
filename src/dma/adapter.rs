//! DMA adapter contract.
//!
//! The adapter is the platform's DMA subsystem: it owns physical address
//! translation, common-buffer allocation and, when bypass is not possible,
//! scatter/gather list construction.

use alloc::boxed::Box;

use super::sg::ScatterGatherList;
use crate::error::DmaResult;
use crate::packet::{PhysAddr, TxPacket};

/// Physically contiguous memory shared with the device
#[derive(Debug)]
pub struct CommonBuffer {
    memory: Box<[u8]>,
    address: PhysAddr,
}

impl CommonBuffer {
    /// Wrap memory whose first byte the device sees at `address`
    #[must_use]
    pub fn new(memory: Box<[u8]>, address: PhysAddr) -> Self {
        Self { memory, address }
    }

    /// Physical address of the first byte
    #[inline(always)]
    pub fn address(&self) -> PhysAddr {
        self.address
    }

    /// Length in bytes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Whether the buffer is zero-sized
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// CPU view of the buffer
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable CPU view of the buffer
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.memory
    }
}

/// Platform DMA subsystem
///
/// All methods are called from [`TxDmaQueue`](crate::TxDmaQueue) only, never
/// concurrently, and none of them may block.
pub trait DmaAdapter {
    /// Whether the device may be handed physical addresses directly.
    ///
    /// Queried once at queue construction.
    fn bypass_capable(&self) -> bool;

    /// Allocate physically contiguous memory reachable by the device.
    ///
    /// The whole buffer must start on `alignment` bytes and, when
    /// `max_address` is set, end at or below it. The queue checks both and
    /// refuses to start on memory that breaks either.
    ///
    /// # Errors
    ///
    /// Any [`DmaError`](crate::DmaError); the queue treats it as fatal.
    fn allocate_common_buffer(
        &mut self,
        len: usize,
        alignment: usize,
        max_address: Option<u64>,
    ) -> DmaResult<CommonBuffer>;

    /// Bytes of transfer-context scratch one in-flight mapping needs.
    ///
    /// Queried once at queue construction, only for the delegated backend.
    fn transfer_context_size(&self) -> usize;

    /// Build the scatter/gather list for `packet` into `list`.
    ///
    /// `slot` identifies the ring slot; `context` is that slot's private
    /// scratch and stays untouched until the matching
    /// [`unmap_transfer`](Self::unmap_transfer).
    ///
    /// # Errors
    ///
    /// [`DmaError::InsufficientResources`](crate::DmaError::InsufficientResources)
    /// when mapping capacity is temporarily exhausted; any other error fails
    /// the packet.
    fn map_transfer<P: TxPacket + ?Sized>(
        &mut self,
        slot: usize,
        packet: &P,
        context: &mut [u8],
        list: &mut ScatterGatherList,
    ) -> DmaResult<()>;

    /// Return the mapping made for `slot` once the device is done with it.
    fn unmap_transfer(&mut self, slot: usize, context: &mut [u8], list: &ScatterGatherList);
}
