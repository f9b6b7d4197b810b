//! Testing utilities and mock implementations
//!
//! Mock packets, hardware callbacks, DMA adapter and delay for exercising
//! the queue on the host.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

use std::boxed::Box;
use std::collections::BTreeMap;
use std::vec;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::dma::{BounceDecision, CommonBuffer, DmaAdapter, ScatterGatherElement, ScatterGatherList};
use crate::driver::hardware::{TxHardware, TxStatus};
use crate::error::{DmaError, DmaResult};
use crate::packet::{Fragment, PhysAddr, TxPacket};

// =============================================================================
// Test Packet
// =============================================================================

#[derive(Debug, Clone)]
struct TestFragment {
    region: Vec<u8>,
    phys: PhysAddr,
    offset: usize,
    len: usize,
}

/// Packet made of owned fragment regions at fake physical addresses
///
/// Region bytes follow a pattern derived from the region's physical address,
/// so copied payloads can be checked byte for byte.
#[derive(Debug, Clone)]
pub struct TestPacket {
    id: u32,
    ignored: bool,
    fragments: Vec<TestFragment>,
}

impl TestPacket {
    pub fn builder() -> TestPacketBuilder {
        TestPacketBuilder::default()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The packet's valid bytes, concatenated
    pub fn payload_bytes(&self) -> Vec<u8> {
        self.fragments()
            .flat_map(|f| f.payload().iter().copied())
            .collect()
    }
}

impl TxPacket for TestPacket {
    fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    fn fragment(&self, index: usize) -> Option<Fragment<'_>> {
        let f = self.fragments.get(index)?;
        Fragment::new(&f.region, f.phys).window(f.offset, f.len)
    }

    fn is_ignored(&self) -> bool {
        self.ignored
    }
}

#[derive(Debug, Default)]
pub struct TestPacketBuilder {
    id: u32,
    ignored: bool,
    fragments: Vec<TestFragment>,
}

impl TestPacketBuilder {
    pub fn id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Mark the packet cancelled upstream
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Fragment covering a whole `len`-byte region at `phys`
    pub fn fragment(self, phys: u64, len: usize) -> Self {
        self.windowed_fragment(phys, len, 0, len)
    }

    /// Fragment of `len` bytes at `offset` inside a `region_len`-byte region
    /// starting at `phys`
    pub fn windowed_fragment(mut self, phys: u64, region_len: usize, offset: usize, len: usize) -> Self {
        assert!(offset + len <= region_len, "window outside region");
        let seed = (phys >> 4) as u8;
        let region = (0..region_len)
            .map(|i| seed.wrapping_add(i as u8).wrapping_mul(31))
            .collect();
        self.fragments.push(TestFragment {
            region,
            phys: PhysAddr(phys),
            offset,
            len,
        });
        self
    }

    pub fn build(self) -> TestPacket {
        TestPacket {
            id: self.id,
            ignored: self.ignored,
            fragments: self.fragments,
        }
    }
}

// =============================================================================
// Mock Hardware
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Scripted {
    Hold,
    HoldFor(usize),
    Status(TxStatus),
}

/// Mock transmit hardware
///
/// Packets report [`TxStatus::Success`] unless scripted otherwise.
#[derive(Debug, Default)]
pub struct MockHardware {
    statuses: BTreeMap<u32, Scripted>,
    /// Each programmed packet id with the list it was given
    pub programmed: Vec<(u32, Vec<ScatterGatherElement>)>,
    /// Number of flushes
    pub flushes: usize,
    /// Packet ids in the order their status was asked for
    pub status_queries: Vec<u32>,
    /// Bounce decisions to return per packet id
    pub overrides: Vec<(u32, BounceDecision)>,
    /// Packet ids the override was asked about
    pub override_queries: Vec<u32>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `id` pending until [`complete`](Self::complete) or [`fail`](Self::fail)
    pub fn hold(&mut self, id: u32) {
        self.statuses.insert(id, Scripted::Hold);
    }

    /// Report `id` pending for the next `queries` status queries
    pub fn hold_for(&mut self, id: u32, queries: usize) {
        self.statuses.insert(id, Scripted::HoldFor(queries));
    }

    pub fn complete(&mut self, id: u32) {
        self.statuses.insert(id, Scripted::Status(TxStatus::Success));
    }

    pub fn fail(&mut self, id: u32) {
        self.statuses.insert(id, Scripted::Status(TxStatus::Error));
    }
}

impl TxHardware<TestPacket> for MockHardware {
    fn program_descriptors(&mut self, packet: &TestPacket, list: &ScatterGatherList) {
        self.programmed.push((packet.id(), list.elements().to_vec()));
    }

    fn packet_status(&mut self, packet: &TestPacket) -> TxStatus {
        self.status_queries.push(packet.id());
        match self.statuses.get_mut(&packet.id()) {
            None => TxStatus::Success,
            Some(Scripted::Hold) => TxStatus::Pending,
            Some(Scripted::HoldFor(0)) => TxStatus::Success,
            Some(Scripted::HoldFor(remaining)) => {
                *remaining -= 1;
                TxStatus::Pending
            }
            Some(Scripted::Status(status)) => *status,
        }
    }

    fn flush_transaction(&mut self) {
        self.flushes += 1;
    }

    fn bounce_override(&mut self, packet: &TestPacket) -> Option<BounceDecision> {
        self.override_queries.push(packet.id());
        self.overrides
            .iter()
            .find(|(id, _)| *id == packet.id())
            .map(|&(_, decision)| decision)
    }
}

// =============================================================================
// Mock DMA Adapter
// =============================================================================

/// Mock DMA adapter with identity address translation
#[derive(Debug)]
pub struct MockDmaAdapter {
    bypass: bool,
    context_size: usize,
    map_capacity: usize,
    common_buffer_base: PhysAddr,
    /// Fail common buffer allocation
    pub fail_allocation: bool,
    /// Fail every mapping made for this ring slot with `TransferFailed`
    pub fail_mapping_of_slot: Option<usize>,
    /// Slots successfully mapped, in order
    pub mapped: Vec<usize>,
    /// Slots unmapped, in order
    pub unmapped: Vec<usize>,
    /// Length of the context block passed to the last mapping
    pub last_context_len: Option<usize>,
    /// Address limit passed to the last common buffer allocation
    pub last_allocation_limit: Option<Option<u64>>,
}

impl Default for MockDmaAdapter {
    fn default() -> Self {
        Self {
            bypass: false,
            context_size: 16,
            map_capacity: usize::MAX,
            common_buffer_base: Self::COMMON_BUFFER_BASE,
            fail_allocation: false,
            fail_mapping_of_slot: None,
            mapped: Vec::new(),
            unmapped: Vec::new(),
            last_context_len: None,
            last_allocation_limit: None,
        }
    }
}

impl MockDmaAdapter {
    /// Default physical address of every common buffer handed out
    pub const COMMON_BUFFER_BASE: PhysAddr = PhysAddr(0x8000_0000);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn with_context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }

    /// Hand out common buffers at `base` instead of the default.
    ///
    /// The allocation's address limit is recorded, not honored.
    pub fn with_common_buffer_base(mut self, base: PhysAddr) -> Self {
        self.common_buffer_base = base;
        self
    }

    /// Report exhaustion once `capacity` mappings are outstanding
    pub fn with_map_capacity(mut self, capacity: usize) -> Self {
        self.map_capacity = capacity;
        self
    }

    pub fn outstanding_maps(&self) -> usize {
        self.mapped.len() - self.unmapped.len()
    }
}

impl DmaAdapter for MockDmaAdapter {
    fn bypass_capable(&self) -> bool {
        self.bypass
    }

    fn allocate_common_buffer(
        &mut self,
        len: usize,
        _alignment: usize,
        max_address: Option<u64>,
    ) -> DmaResult<CommonBuffer> {
        self.last_allocation_limit = Some(max_address);
        if self.fail_allocation {
            return Err(DmaError::InsufficientResources);
        }
        let memory: Box<[u8]> = vec![0u8; len].into_boxed_slice();
        Ok(CommonBuffer::new(memory, self.common_buffer_base))
    }

    fn transfer_context_size(&self) -> usize {
        self.context_size
    }

    fn map_transfer<P: TxPacket + ?Sized>(
        &mut self,
        slot: usize,
        packet: &P,
        context: &mut [u8],
        list: &mut ScatterGatherList,
    ) -> DmaResult<()> {
        self.last_context_len = Some(context.len());
        if self.fail_mapping_of_slot == Some(slot) {
            return Err(DmaError::TransferFailed);
        }
        if self.outstanding_maps() >= self.map_capacity {
            return Err(DmaError::InsufficientResources);
        }
        for fragment in packet.fragments() {
            list.push_span(fragment.phys_start(), fragment.len())?;
        }
        context.fill(slot as u8 + 1);
        self.mapped.push(slot);
        Ok(())
    }

    fn unmap_transfer(&mut self, slot: usize, context: &mut [u8], _list: &ScatterGatherList) {
        context.fill(0);
        self.unmapped.push(slot);
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Delay that only records how long it was asked to wait
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_us: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_us += u64::from(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_us += u64::from(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_us += u64::from(ms) * 1_000;
    }
}
