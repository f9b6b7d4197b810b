//! Transmit queue engine.
//!
//! [`TxDmaQueue`] owns the packet ring, the per-slot mapping state, the
//! bounce pool and the mapper, and drives them from [`TxDmaQueue::advance`]:
//!
//! 1. **Transmit phase**: admit unposted packets in order. Each one is
//!    skipped, rejected, bounced or mapped in place, then programmed. The
//!    phase stops at the first packet that cannot get mapping resources;
//!    that packet stays unposted and is retried next cycle.
//! 2. **Flush**: one doorbell if anything was programmed.
//! 3. **Completion phase**: release packets in ring order, stopping at the
//!    first one the device still owns.

use alloc::boxed::Box;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use super::config::TxDmaConfig;
use super::hardware::{TxHardware, TxStatus};
use super::state::{CompletedPacket, PacketState, TxCompletion, TxFailure};
use super::stats::TxStatistics;
use crate::dma::mapper::ScatterGatherMapper;
use crate::dma::{
    BounceDecision, BounceLimits, BouncePool, DmaAdapter, MappingBackend, ScatterGatherList,
    analyze, apply_override,
};
use crate::error::{IoError, IoResult, Result};
use crate::internal::ring::PacketRing;
use crate::packet::TxPacket;

#[cfg(feature = "log")]
use log::{debug, trace, warn};

/// Mapping state of one ring slot
///
/// Reused every time the slot recycles.
#[derive(Debug)]
struct SlotContext {
    /// Delegated backend output for this slot
    list: ScatterGatherList,
    /// Holds a bounce buffer
    bounced: bool,
    /// Holds an adapter mapping
    dma_mapped: bool,
}

/// What one [`TxDmaQueue::advance`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvanceSummary {
    /// Packets handed to the device
    pub programmed: usize,
    /// Packets released
    pub completed: usize,
    /// Admission stopped on resource exhaustion
    pub stalled: bool,
}

enum Admission {
    Programmed,
    Failed(TxFailure),
    Stalled,
}

/// Scatter/gather DMA transmit queue
///
/// Single-threaded and non-reentrant: one `&mut self` call at a time. With
/// the `critical-section` feature, `sync::SharedTxQueue` shares a queue with
/// an interrupt handler.
pub struct TxDmaQueue<P, H, D>
where
    P: TxPacket,
    H: TxHardware<P>,
    D: DmaAdapter,
{
    config: TxDmaConfig,
    limits: BounceLimits,
    hardware: H,
    adapter: D,
    ring: PacketRing<P>,
    contexts: Box<[SlotContext]>,
    mapper: ScatterGatherMapper,
    bounce: BouncePool,
    stats: TxStatistics,
}

impl<P, H, D> TxDmaQueue<P, H, D>
where
    P: TxPacket,
    H: TxHardware<P>,
    D: DmaAdapter,
{
    /// Build a queue.
    ///
    /// Validates `config`, picks the mapping backend, and allocates the
    /// bounce pool and all per-slot state. Nothing is allocated afterwards.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`](crate::ConfigError); no queue is created.
    pub fn new(config: TxDmaConfig, hardware: H, mut adapter: D) -> Result<Self> {
        config.validate()?;

        let capacity = config.ring_capacity;
        let max_elements = config.max_sg_elements();
        let mapper =
            ScatterGatherMapper::new(config.allow_dma_bypass, max_elements, capacity, &adapter);
        let bounce = BouncePool::new(&config, &mut adapter)?;

        let list_limit = mapper.slot_list_limit(max_elements);
        let mut contexts = Vec::with_capacity(capacity);
        contexts.resize_with(capacity, || SlotContext {
            list: ScatterGatherList::with_limit(list_limit),
            bounced: false,
            dma_mapped: false,
        });

        #[cfg(feature = "log")]
        debug!(
            "txdma: {capacity} slots, {} bounce buffers of {} bytes",
            bounce.capacity(),
            bounce.buffer_size()
        );

        Ok(Self {
            limits: BounceLimits::from_config(&config),
            config,
            hardware,
            adapter,
            ring: PacketRing::new(capacity),
            contexts: contexts.into_boxed_slice(),
            mapper,
            bounce,
            stats: TxStatistics::default(),
        })
    }

    // =========================================================================
    // Ring Producer / Consumer
    // =========================================================================

    /// Post a packet for transmission.
    ///
    /// Hands the packet back if the ring is full. Released packets occupy
    /// their slot until taken back with [`pop_completed`](Self::pop_completed).
    pub fn try_post(&mut self, packet: P) -> core::result::Result<(), P> {
        self.ring.push(packet)
    }

    /// Take back the oldest released packet, in ring order.
    pub fn pop_completed(&mut self) -> Option<CompletedPacket<P>> {
        let (packet, completion) = self.ring.pop_released()?;
        Some(CompletedPacket { packet, completion })
    }

    /// Cancel every packet not yet admitted.
    ///
    /// They complete as [`TxFailure::Skipped`] on the next
    /// [`advance`](Self::advance). Packets already on the device finish
    /// normally. Returns the number of packets cancelled.
    pub fn cancel(&mut self) -> usize {
        self.ring.cancel_unposted()
    }

    // =========================================================================
    // Advance Cycle
    // =========================================================================

    /// Run one transmit phase, at most one flush, and one completion phase.
    pub fn advance(&mut self) -> AdvanceSummary {
        let mut summary = AdvanceSummary::default();

        self.transmit_phase(&mut summary);
        if summary.programmed > 0 {
            self.hardware.flush_transaction();
            self.stats.flushes += 1;
        }
        self.completion_phase(&mut summary);

        summary
    }

    fn transmit_phase(&mut self, summary: &mut AdvanceSummary) {
        while let Some(index) = self.ring.next_unposted() {
            let state = match self.admit(index) {
                Admission::Programmed => {
                    summary.programmed += 1;
                    self.stats.programmed += 1;
                    PacketState::Programmed
                }
                Admission::Failed(failure) => {
                    PacketState::Completed(TxCompletion::Failed(failure))
                }
                Admission::Stalled => {
                    summary.stalled = true;
                    self.ring.slot_mut(index).state = PacketState::Unposted;
                    return;
                }
            };
            self.ring.slot_mut(index).state = state;
            self.ring.advance_next();
        }
    }

    /// Analyze, map and program the packet at ring cursor `index`.
    fn admit(&mut self, index: u64) -> Admission {
        let position = self.ring.position(index);
        let Self {
            limits,
            hardware,
            adapter,
            ring,
            contexts,
            mapper,
            bounce,
            stats,
            ..
        } = self;

        let slot = ring.slot_mut(index);
        slot.state = PacketState::Admitted;
        let ignore = slot.ignore;
        let Some(packet) = slot.packet.as_ref() else {
            return Admission::Failed(TxFailure::Skipped);
        };
        let Some(context) = contexts.get_mut(position) else {
            return Admission::Stalled;
        };

        if ignore || packet.is_ignored() {
            stats.skipped += 1;
            return Admission::Failed(TxFailure::Skipped);
        }

        let analysis = analyze(packet, limits);
        let decision = apply_override(analysis.decision, || hardware.bounce_override(packet));

        match decision {
            BounceDecision::CannotTransmit => {
                #[cfg(feature = "log")]
                warn!(
                    "txdma: cannot transmit {} byte packet in {} descriptors",
                    analysis.total_len, analysis.descriptor_count
                );
                stats.cannot_transmit += 1;
                Admission::Failed(TxFailure::CannotTransmit)
            }
            BounceDecision::TransmitAfterBouncing => match bounce.bounce(packet) {
                Ok(list) => {
                    context.bounced = true;
                    stats.bounce_success += 1;
                    hardware.program_descriptors(packet, list);
                    Admission::Programmed
                }
                Err(e) if e.is_exhaustion() => {
                    #[cfg(feature = "log")]
                    trace!("txdma: bounce pool exhausted, stalling");
                    stats.bounce_failure += 1;
                    Admission::Stalled
                }
                Err(e) => {
                    #[cfg(feature = "log")]
                    warn!("txdma: bounce failed: {e}");
                    stats.other_dma_errors += 1;
                    Admission::Failed(TxFailure::Mapping(e))
                }
            },
            BounceDecision::TransmitInPlace => {
                let delegated = mapper.backend() == MappingBackend::Delegated;
                match mapper.map(position, packet, &mut context.list, adapter) {
                    Ok(list) => {
                        hardware.program_descriptors(packet, list);
                        context.dma_mapped = delegated;
                        Admission::Programmed
                    }
                    Err(e) if e.is_exhaustion() => {
                        #[cfg(feature = "log")]
                        trace!("txdma: adapter out of mapping resources, stalling");
                        stats.dma_insufficient_resources += 1;
                        Admission::Stalled
                    }
                    Err(e) => {
                        #[cfg(feature = "log")]
                        warn!("txdma: mapping failed: {e}");
                        stats.other_dma_errors += 1;
                        Admission::Failed(TxFailure::Mapping(e))
                    }
                }
            }
        }
    }

    fn completion_phase(&mut self, summary: &mut AdvanceSummary) {
        while let Some(index) = self.ring.oldest_in_flight() {
            let state = self.ring.slot(index).state;
            let completion = match state {
                PacketState::Completed(completion) => completion,
                _ => {
                    let Some(packet) = self.ring.slot(index).packet.as_ref() else {
                        break;
                    };
                    match self.hardware.packet_status(packet) {
                        TxStatus::Pending => {
                            self.ring.slot_mut(index).state = PacketState::CompletionPending;
                            break;
                        }
                        TxStatus::Success => TxCompletion::Success,
                        TxStatus::Error => {
                            #[cfg(feature = "log")]
                            warn!("txdma: device reported transmit error");
                            self.stats.completed_with_error += 1;
                            TxCompletion::Failed(TxFailure::Hardware)
                        }
                    }
                }
            };

            let position = self.ring.position(index);
            self.release_slot(position);
            self.ring.slot_mut(index).state = PacketState::Released(completion);
            self.ring.advance_begin();
            self.stats.completed += 1;
            summary.completed += 1;
        }
    }

    /// Return the mapping resources held by slot `position`.
    fn release_slot(&mut self, position: usize) {
        let Some(context) = self.contexts.get_mut(position) else {
            return;
        };
        if context.dma_mapped {
            self.mapper
                .unmap(position, &mut context.list, &mut self.adapter);
            context.dma_mapped = false;
        }
        if context.bounced {
            self.bounce.release();
            context.bounced = false;
        }
    }

    /// Advance until no packet is outstanding.
    ///
    /// Waits `poll_interval_us` between cycles and gives up after roughly
    /// `timeout_us`. Released packets still need
    /// [`pop_completed`](Self::pop_completed) afterwards.
    ///
    /// # Errors
    ///
    /// [`IoError::Timeout`] if packets are still outstanding at the deadline.
    pub fn drain<DL: DelayNs>(
        &mut self,
        delay: &mut DL,
        poll_interval_us: u32,
        timeout_us: u32,
    ) -> IoResult<()> {
        let step = poll_interval_us.max(1);
        let mut waited = 0u32;
        loop {
            self.advance();
            if self.ring.outstanding() == 0 {
                return Ok(());
            }
            if waited >= timeout_us {
                #[cfg(feature = "log")]
                warn!("txdma: drain timed out, {} outstanding", self.ring.outstanding());
                return Err(IoError::Timeout);
            }
            delay.delay_us(step);
            waited = waited.saturating_add(step);
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Configuration the queue was built with
    #[inline(always)]
    pub fn config(&self) -> &TxDmaConfig {
        &self.config
    }

    /// Ring capacity
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Packets posted and not yet released
    #[inline(always)]
    pub fn outstanding(&self) -> usize {
        self.ring.outstanding()
    }

    /// Packets admitted and not yet released
    #[inline(always)]
    pub fn in_flight(&self) -> usize {
        self.ring.in_flight()
    }

    /// Packets posted and not yet admitted
    #[inline(always)]
    pub fn unposted(&self) -> usize {
        self.ring.unposted()
    }

    /// Released packets waiting for [`pop_completed`](Self::pop_completed)
    #[inline(always)]
    pub fn completed(&self) -> usize {
        self.ring.reclaimable()
    }

    /// Whether nothing is outstanding
    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.ring.outstanding() == 0
    }

    /// Mapping backend picked at construction
    #[inline(always)]
    pub fn backend(&self) -> MappingBackend {
        self.mapper.backend()
    }

    /// Bounce buffers currently held by in-flight packets
    #[inline(always)]
    pub fn bounce_buffers_in_use(&self) -> usize {
        self.bounce.in_use()
    }

    /// The bounce pool, for inspection
    #[inline(always)]
    pub fn bounce_pool(&self) -> &BouncePool {
        &self.bounce
    }

    /// Snapshot of the counters
    #[inline(always)]
    pub fn statistics(&self) -> TxStatistics {
        self.stats
    }

    /// Zero the counters
    pub fn reset_statistics(&mut self) {
        self.stats = TxStatistics::default();
    }

    /// Lifecycle state of the packet at ring cursor `index`
    ///
    /// `index` counts packets posted since the queue was built.
    pub fn packet_state(&self, index: u64) -> Option<PacketState> {
        self.ring
            .is_live(index)
            .then(|| self.ring.slot(index).state)
    }

    /// The hardware callbacks
    #[inline(always)]
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Mutable access to the hardware callbacks
    #[inline(always)]
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// The DMA adapter
    #[inline(always)]
    pub fn adapter(&self) -> &D {
        &self.adapter
    }

    /// Mutable access to the DMA adapter
    #[inline(always)]
    pub fn adapter_mut(&mut self) -> &mut D {
        &mut self.adapter
    }
}

impl<P, H, D> core::fmt::Debug for TxDmaQueue<P, H, D>
where
    P: TxPacket,
    H: TxHardware<P>,
    D: DmaAdapter,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TxDmaQueue")
            .field("capacity", &self.ring.capacity())
            .field("outstanding", &self.ring.outstanding())
            .field("in_flight", &self.ring.in_flight())
            .field("backend", &self.mapper.backend())
            .field("bounce_in_use", &self.bounce.in_use())
            .field("stats", &self.stats)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
