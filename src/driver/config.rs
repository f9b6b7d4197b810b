//! Configuration types for the transmit DMA queue

use crate::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_BOUNCE_BUFFERS, DEFAULT_MAX_SG_ELEMENTS, DEFAULT_RING_CAPACITY, MAX_SG_ELEMENTS,
};

/// Buffer start alignment the device requires
///
/// Expressed as a mask: an address is aligned when `addr & mask == 0`.
/// The mask must be of the form 2^k - 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignmentRequirement {
    /// Any byte address is acceptable
    #[default]
    Unconstrained,
    /// Addresses must have all mask bits clear
    Mask(usize),
}

impl AlignmentRequirement {
    /// Alignment in bytes (1 when unconstrained)
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            AlignmentRequirement::Unconstrained => 1,
            AlignmentRequirement::Mask(mask) => mask.wrapping_add(1),
        }
    }

    /// Check whether `address` satisfies the requirement
    #[inline]
    #[must_use]
    pub const fn is_aligned(self, address: u64) -> bool {
        match self {
            AlignmentRequirement::Unconstrained => true,
            AlignmentRequirement::Mask(mask) => address & (mask as u64) == 0,
        }
    }

    /// Round `len` up to the next aligned size, `None` on overflow
    #[must_use]
    pub const fn round_up(self, len: usize) -> Option<usize> {
        match self {
            AlignmentRequirement::Unconstrained => Some(len),
            AlignmentRequirement::Mask(mask) => match len.checked_add(mask) {
                Some(padded) => Some(padded & !mask),
                None => None,
            },
        }
    }

    const fn is_valid(self) -> bool {
        match self {
            AlignmentRequirement::Unconstrained => true,
            // 2^k - 1 has no bit set above its highest run of ones
            AlignmentRequirement::Mask(mask) => mask != usize::MAX && mask & (mask + 1) == 0,
        }
    }
}

/// Complete transmit queue configuration
///
/// Only `maximum_packet_size` is mandatory. Zero-valued sizing fields select
/// built-in defaults (see [`constants`](crate::constants)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxDmaConfig {
    /// Largest packet (sum of fragment lengths) the device accepts
    pub maximum_packet_size: usize,
    /// Descriptor budget per packet (0 selects the default)
    pub maximum_scatter_gather_elements: usize,
    /// Buffer start alignment required by the device
    pub alignment: AlignmentRequirement,
    /// Number of address bits the device can drive (0 means unconstrained)
    pub address_width: u8,
    /// Use physical addresses directly when the DMA adapter allows it
    pub allow_dma_bypass: bool,
    /// Number of bounce buffers in the pool (0 selects the default)
    pub bounce_buffer_count: usize,
    /// Number of packet slots in the ring
    pub ring_capacity: usize,
}

impl TxDmaConfig {
    /// Create a configuration with defaults for everything but the packet size
    #[must_use]
    pub const fn new(maximum_packet_size: usize) -> Self {
        Self {
            maximum_packet_size,
            maximum_scatter_gather_elements: 0,
            alignment: AlignmentRequirement::Unconstrained,
            address_width: 0,
            allow_dma_bypass: false,
            bounce_buffer_count: 0,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the per-packet descriptor budget
    #[must_use]
    pub const fn with_max_sg_elements(mut self, elements: usize) -> Self {
        self.maximum_scatter_gather_elements = elements;
        self
    }

    /// Set the buffer alignment requirement
    #[must_use]
    pub const fn with_alignment(mut self, alignment: AlignmentRequirement) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the device address width in bits
    #[must_use]
    pub const fn with_address_width(mut self, bits: u8) -> Self {
        self.address_width = bits;
        self
    }

    /// Allow or forbid the direct (bypass) mapping backend
    #[must_use]
    pub const fn with_dma_bypass(mut self, allow: bool) -> Self {
        self.allow_dma_bypass = allow;
        self
    }

    /// Set the number of bounce buffers
    #[must_use]
    pub const fn with_bounce_buffers(mut self, count: usize) -> Self {
        self.bounce_buffer_count = count;
        self
    }

    /// Set the ring capacity
    #[must_use]
    pub const fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    // =========================================================================
    // Resolved Values
    // =========================================================================

    /// Descriptor budget with the default applied
    #[must_use]
    pub const fn max_sg_elements(&self) -> usize {
        if self.maximum_scatter_gather_elements == 0 {
            DEFAULT_MAX_SG_ELEMENTS
        } else {
            self.maximum_scatter_gather_elements
        }
    }

    /// Bounce pool size with the default applied
    #[must_use]
    pub const fn bounce_buffers(&self) -> usize {
        if self.bounce_buffer_count == 0 {
            DEFAULT_BOUNCE_BUFFERS
        } else {
            self.bounce_buffer_count
        }
    }

    /// Size of each bounce buffer: the packet limit rounded to the alignment.
    ///
    /// `None` if the rounded size does not fit a `usize`.
    #[must_use]
    pub const fn bounce_buffer_size(&self) -> Option<usize> {
        self.alignment.round_up(self.maximum_packet_size)
    }

    /// Highest physical address the device can reach, if constrained
    #[must_use]
    pub const fn max_address(&self) -> Option<u64> {
        match self.address_width {
            0 | 64.. => None,
            bits => Some((1u64 << bits) - 1),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.maximum_packet_size == 0 {
            return Err(ConfigError::ZeroMaximumPacketSize);
        }
        if !self.alignment.is_valid() {
            return Err(ConfigError::InvalidAlignment);
        }
        if self.bounce_buffer_size().is_none() {
            return Err(ConfigError::MaximumPacketSizeTooLarge);
        }
        if self.address_width > 64 {
            return Err(ConfigError::InvalidAddressWidth);
        }
        if self.ring_capacity == 0 {
            return Err(ConfigError::ZeroRingCapacity);
        }
        if self.max_sg_elements() > MAX_SG_ELEMENTS {
            return Err(ConfigError::ScatterGatherLimitTooLarge);
        }
        Ok(())
    }
}
