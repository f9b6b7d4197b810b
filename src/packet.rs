//! Packet and fragment model
//!
//! Packets are owned by the caller and lent to the queue while they sit in
//! the ring. The engine only needs to walk a packet's fragments: each one is
//! a window (`offset`, `len`) into a backing memory region whose virtual
//! bytes and physical base address are both known.

/// Physical (bus) address as seen by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysAddr(pub u64);

impl PhysAddr {
    /// Raw address value
    #[inline(always)]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Address `bytes` further on
    #[inline(always)]
    #[must_use]
    pub const fn offset(self, bytes: usize) -> Self {
        Self(self.0.wrapping_add(bytes as u64))
    }
}

impl core::fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One contiguous piece of a packet's payload
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    region: &'a [u8],
    region_phys: PhysAddr,
    offset: usize,
    len: usize,
}

impl<'a> Fragment<'a> {
    /// Fragment covering the whole of `region`, which starts at `phys`
    #[must_use]
    pub const fn new(region: &'a [u8], phys: PhysAddr) -> Self {
        Self {
            region,
            region_phys: phys,
            offset: 0,
            len: region.len(),
        }
    }

    /// Restrict the fragment to `len` valid bytes starting at `offset`.
    ///
    /// Returns `None` if the window does not fit inside the region.
    #[must_use]
    pub fn window(self, offset: usize, len: usize) -> Option<Self> {
        let end = offset.checked_add(len)?;
        (end <= self.region.len()).then_some(Self {
            offset,
            len,
            ..self
        })
    }

    /// Offset of the first valid byte within the region
    #[inline(always)]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of valid bytes
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the fragment carries no payload
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity of the backing region
    #[inline(always)]
    pub const fn region_len(&self) -> usize {
        self.region.len()
    }

    /// Whether the valid bytes run to the end of the backing region
    #[inline]
    pub const fn consumes_region(&self) -> bool {
        self.offset + self.len == self.region.len()
    }

    /// Physical address of the first valid byte
    #[inline]
    pub const fn phys_start(&self) -> PhysAddr {
        self.region_phys.offset(self.offset)
    }

    /// Valid payload bytes
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.region[self.offset..self.offset + self.len]
    }
}

/// A packet the queue can transmit
///
/// Implemented by the caller's packet type. Fragment order is payload order;
/// the last fragment is the one at `fragment_count() - 1`.
pub trait TxPacket {
    /// Number of fragments
    fn fragment_count(&self) -> usize;

    /// Fragment at `index`, or `None` past the end
    fn fragment(&self, index: usize) -> Option<Fragment<'_>>;

    /// Upstream cancellation flag. Ignored packets complete with an error
    /// without being mapped.
    fn is_ignored(&self) -> bool {
        false
    }

    /// Iterate over all fragments in order
    fn fragments(&self) -> impl Iterator<Item = Fragment<'_>> {
        (0..self.fragment_count()).filter_map(move |i| self.fragment(i))
    }

    /// Sum of all fragment lengths
    fn total_len(&self) -> usize {
        self.fragments().map(|f| f.len()).sum()
    }
}
