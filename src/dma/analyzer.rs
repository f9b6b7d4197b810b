//! Bounce analysis: decides whether a packet can be mapped in place.
//!
//! The analysis is a pure function of the packet's fragment layout and the
//! device limits. It runs once per packet, before any mapping resources are
//! touched.

use super::sg::pages_spanned;
use crate::driver::config::{AlignmentRequirement, TxDmaConfig};
use crate::packet::TxPacket;

/// How a packet will be transmitted
///
/// Variants are ordered from least to most restrictive, so `max` picks the
/// stricter of two decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BounceDecision {
    /// Map the fragments where they are
    TransmitInPlace,
    /// Copy the payload into a bounce buffer first
    TransmitAfterBouncing,
    /// The packet can never be sent
    CannotTransmit,
}

/// Device limits the analysis checks against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BounceLimits {
    /// Largest packet the device accepts
    pub maximum_packet_size: usize,
    /// Descriptor budget per packet
    pub maximum_sg_elements: usize,
    /// Buffer start alignment
    pub alignment: AlignmentRequirement,
    /// Highest reachable physical address, if constrained
    pub max_address: Option<u64>,
}

impl BounceLimits {
    /// Resolve limits from a queue configuration
    #[must_use]
    pub const fn from_config(config: &TxDmaConfig) -> Self {
        Self {
            maximum_packet_size: config.maximum_packet_size,
            maximum_sg_elements: config.max_sg_elements(),
            alignment: config.alignment,
            max_address: config.max_address(),
        }
    }
}

/// Result of walking a packet's fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BounceAnalysis {
    /// Sum of fragment lengths
    pub total_len: usize,
    /// Pessimistic descriptor count (pages spanned, never merged)
    pub descriptor_count: usize,
    /// A layout rule forces a copy
    pub needs_bounce: bool,
    /// Final framework decision
    pub decision: BounceDecision,
}

/// Analyze one packet.
///
/// A packet needs bouncing when a fragment other than the first starts at a
/// non-zero offset, a non-last fragment leaves part of its region unused, a
/// fragment start violates the alignment, or a fragment reaches beyond the
/// device's address width. Size overrides everything: an oversize packet is
/// [`BounceDecision::CannotTransmit`]. So is a packet with no payload.
pub fn analyze<P: TxPacket + ?Sized>(packet: &P, limits: &BounceLimits) -> BounceAnalysis {
    let count = packet.fragment_count();
    let mut total_len = 0usize;
    let mut descriptor_count = 0usize;
    let mut needs_bounce = false;

    for (index, fragment) in packet.fragments().enumerate() {
        let is_first = index == 0;
        let is_last = index + 1 == count;
        let start = fragment.phys_start();

        total_len = total_len.saturating_add(fragment.len());
        descriptor_count += pages_spanned(start, fragment.len());

        if !is_first && fragment.offset() != 0 {
            needs_bounce = true;
        }
        if !is_last && !fragment.consumes_region() {
            needs_bounce = true;
        }
        if !limits.alignment.is_aligned(start.as_u64()) {
            needs_bounce = true;
        }
        if let Some(max) = limits.max_address {
            let end = start
                .as_u64()
                .saturating_add(fragment.len().saturating_sub(1) as u64);
            if end > max {
                needs_bounce = true;
            }
        }
    }

    let decision = if total_len > limits.maximum_packet_size || total_len == 0 {
        BounceDecision::CannotTransmit
    } else if needs_bounce || descriptor_count > limits.maximum_sg_elements {
        BounceDecision::TransmitAfterBouncing
    } else {
        BounceDecision::TransmitInPlace
    };

    BounceAnalysis {
        total_len,
        descriptor_count,
        needs_bounce,
        decision,
    }
}

/// Combine the framework decision with a hardware-specific override.
///
/// The override is only consulted for [`BounceDecision::TransmitInPlace`]
/// and can only make the decision stricter.
#[inline]
pub fn apply_override(
    framework: BounceDecision,
    override_fn: impl FnOnce() -> Option<BounceDecision>,
) -> BounceDecision {
    match framework {
        BounceDecision::TransmitInPlace => override_fn().map_or(framework, |o| o.max(framework)),
        stricter => stricter,
    }
}
