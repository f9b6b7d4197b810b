//! Packet ring with monotonic cursors.
//!
//! Four cursors partition the ring, all counted in packets since creation:
//!
//! ```text
//! reclaim <= begin <= next <= end,   end - reclaim <= capacity
//! [reclaim, begin)  released, waiting for the caller to take back
//! [begin, next)     admitted: on the device or failed before reaching it
//! [next, end)       posted, not yet admitted
//! ```
//!
//! A cursor maps to a slot with `index % capacity`.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::driver::state::{PacketState, TxCompletion};

/// One ring slot
#[derive(Debug)]
pub(crate) struct RingSlot<P> {
    pub(crate) packet: Option<P>,
    pub(crate) state: PacketState,
    /// Cancelled by [`PacketRing::cancel_unposted`]
    pub(crate) ignore: bool,
}

impl<P> RingSlot<P> {
    const fn empty() -> Self {
        Self {
            packet: None,
            state: PacketState::Unposted,
            ignore: false,
        }
    }
}

/// Fixed-capacity circular packet queue
#[derive(Debug)]
pub(crate) struct PacketRing<P> {
    slots: Box<[RingSlot<P>]>,
    reclaim: u64,
    begin: u64,
    next: u64,
    end: u64,
}

impl<P> PacketRing<P> {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, RingSlot::empty);
        Self {
            slots: slots.into_boxed_slice(),
            reclaim: 0,
            begin: 0,
            next: 0,
            end: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot position of cursor value `index`
    #[inline(always)]
    pub(crate) fn position(&self, index: u64) -> usize {
        (index % self.slots.len() as u64) as usize
    }

    #[inline(always)]
    pub(crate) fn is_full(&self) -> bool {
        self.end - self.reclaim >= self.slots.len() as u64
    }

    /// Packets posted and not yet released
    #[inline(always)]
    pub(crate) fn outstanding(&self) -> usize {
        (self.end - self.begin) as usize
    }

    /// Packets admitted and not yet released
    #[inline(always)]
    pub(crate) fn in_flight(&self) -> usize {
        (self.next - self.begin) as usize
    }

    /// Packets posted and not yet admitted
    #[inline(always)]
    pub(crate) fn unposted(&self) -> usize {
        (self.end - self.next) as usize
    }

    /// Packets released and not yet taken back
    #[inline(always)]
    pub(crate) fn reclaimable(&self) -> usize {
        (self.begin - self.reclaim) as usize
    }

    /// Append a packet, handing it back if every slot is occupied.
    pub(crate) fn push(&mut self, packet: P) -> Result<(), P> {
        if self.is_full() {
            return Err(packet);
        }
        let position = self.position(self.end);
        let slot = &mut self.slots[position];
        slot.packet = Some(packet);
        slot.state = PacketState::Unposted;
        slot.ignore = false;
        self.end += 1;
        Ok(())
    }

    /// Whether cursor `index` refers to a packet still held by the ring
    #[inline]
    pub(crate) fn is_live(&self, index: u64) -> bool {
        (self.reclaim..self.end).contains(&index)
    }

    /// Cursor of the oldest posted packet not yet admitted
    #[inline]
    pub(crate) fn next_unposted(&self) -> Option<u64> {
        (self.next < self.end).then_some(self.next)
    }

    /// Cursor of the oldest admitted packet not yet released
    #[inline]
    pub(crate) fn oldest_in_flight(&self) -> Option<u64> {
        (self.begin < self.next).then_some(self.begin)
    }

    /// Move the producer cursor past the packet at `next`.
    #[inline]
    pub(crate) fn advance_next(&mut self) {
        debug_assert!(self.next < self.end);
        self.next += 1;
    }

    /// Move the consumer cursor past the packet at `begin`.
    #[inline]
    pub(crate) fn advance_begin(&mut self) {
        debug_assert!(self.begin < self.next);
        self.begin += 1;
    }

    #[inline]
    pub(crate) fn slot(&self, index: u64) -> &RingSlot<P> {
        &self.slots[self.position(index)]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, index: u64) -> &mut RingSlot<P> {
        let position = self.position(index);
        &mut self.slots[position]
    }

    /// Mark every posted, not yet admitted packet as cancelled.
    ///
    /// Returns how many packets were marked.
    pub(crate) fn cancel_unposted(&mut self) -> usize {
        let mut marked = 0;
        for index in self.next..self.end {
            let slot = self.slot_mut(index);
            if !slot.ignore {
                slot.ignore = true;
                marked += 1;
            }
        }
        marked
    }

    /// Take back the oldest released packet with its completion.
    ///
    /// Every slot behind the consumer cursor is `Released`; a slot in any
    /// other state is left where it is.
    pub(crate) fn pop_released(&mut self) -> Option<(P, TxCompletion)> {
        if self.reclaim == self.begin {
            return None;
        }
        let index = self.reclaim;
        let slot = self.slot_mut(index);
        let PacketState::Released(completion) = slot.state else {
            debug_assert!(false, "slot {index} behind consumer cursor not released");
            return None;
        };
        let packet = slot.packet.take()?;
        slot.state = PacketState::Unposted;
        slot.ignore = false;
        self.reclaim += 1;
        Some((packet, completion))
    }
}

// =============================================================================
// Tests
// =============================================================================
