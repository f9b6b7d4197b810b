//! Scatter/gather list handed to the hardware programming callback.

use alloc::vec::Vec;

use crate::error::{DmaError, DmaResult};
use crate::internal::constants::{PAGE_OFFSET_MASK, PAGE_SIZE};
use crate::packet::PhysAddr;

/// One (physical address, length) descriptor pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScatterGatherElement {
    /// Physical address of the first byte
    pub address: PhysAddr,
    /// Length in bytes
    pub length: usize,
}

/// Bounded, ordered list of scatter/gather elements
///
/// Storage is reserved once at construction; pushing past the limit fails
/// instead of growing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatterGatherList {
    elements: Vec<ScatterGatherElement>,
    limit: usize,
}

impl ScatterGatherList {
    /// Create an empty list holding at most `limit` elements
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            elements: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Maximum number of elements
    #[inline(always)]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of elements
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the list has no elements
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Remove all elements, keeping the storage
    #[inline]
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Elements in transfer order
    #[inline]
    pub fn elements(&self) -> &[ScatterGatherElement] {
        &self.elements
    }

    /// Sum of element lengths
    pub fn total_len(&self) -> usize {
        self.elements.iter().map(|e| e.length).sum()
    }

    /// Append one element.
    ///
    /// # Errors
    ///
    /// [`DmaError::ScatterGatherOverflow`] if the list is at its limit.
    pub fn push(&mut self, address: PhysAddr, length: usize) -> DmaResult<()> {
        if self.elements.len() >= self.limit {
            return Err(DmaError::ScatterGatherOverflow);
        }
        self.elements.push(ScatterGatherElement { address, length });
        Ok(())
    }

    /// Append a physical span, splitting it at every page boundary.
    ///
    /// Adjacent pages are never merged, so the element count matches the
    /// pessimistic count from bounce analysis.
    ///
    /// # Errors
    ///
    /// [`DmaError::ScatterGatherOverflow`] if the span needs more elements
    /// than remain.
    pub fn push_span(&mut self, start: PhysAddr, len: usize) -> DmaResult<()> {
        let mut address = start;
        let mut remaining = len;

        while remaining > 0 {
            let to_boundary = PAGE_SIZE - (address.as_u64() & PAGE_OFFSET_MASK) as usize;
            let chunk = remaining.min(to_boundary);
            self.push(address, chunk)?;
            address = address.offset(chunk);
            remaining -= chunk;
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a ScatterGatherList {
    type Item = &'a ScatterGatherElement;
    type IntoIter = core::slice::Iter<'a, ScatterGatherElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Number of pages the span `[start, start + len)` touches
#[inline]
pub(crate) fn pages_spanned(start: PhysAddr, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let in_page = (start.as_u64() & PAGE_OFFSET_MASK) as usize;
    (in_page + len).div_ceil(PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_limit() {
        let mut list = ScatterGatherList::with_limit(2);
        assert!(list.push(PhysAddr(0x1000), 10).is_ok());
        assert!(list.push(PhysAddr(0x2000), 20).is_ok());
        assert_eq!(
            list.push(PhysAddr(0x3000), 30),
            Err(DmaError::ScatterGatherOverflow)
        );
        assert_eq!(list.len(), 2);
        assert_eq!(list.total_len(), 30);
    }

    #[test]
    fn push_span_within_one_page() {
        let mut list = ScatterGatherList::with_limit(4);
        list.push_span(PhysAddr(0x1010), 100).unwrap();
        assert_eq!(
            list.elements(),
            &[ScatterGatherElement {
                address: PhysAddr(0x1010),
                length: 100
            }]
        );
    }

    #[test]
    fn push_span_splits_at_page_boundaries() {
        let mut list = ScatterGatherList::with_limit(4);
        // 0xF00 into the page: 0x100 bytes to the boundary, then a full page, then 0x100
        list.push_span(PhysAddr(0x1F00), 0x100 + PAGE_SIZE + 0x100)
            .unwrap();

        let lens: [usize; 3] = [0x100, PAGE_SIZE, 0x100];
        assert_eq!(list.len(), 3);
        for (element, expected) in list.elements().iter().zip(lens) {
            assert_eq!(element.length, expected);
        }
        assert_eq!(list.elements()[1].address, PhysAddr(0x2000));
        assert_eq!(list.elements()[2].address, PhysAddr(0x3000));
    }

    #[test]
    fn push_span_overflow_reports_error() {
        let mut list = ScatterGatherList::with_limit(1);
        assert_eq!(
            list.push_span(PhysAddr(0xFF0), 0x20),
            Err(DmaError::ScatterGatherOverflow)
        );
    }

    #[test]
    fn clear_keeps_limit() {
        let mut list = ScatterGatherList::with_limit(3);
        list.push(PhysAddr(0), 1).unwrap();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.limit(), 3);
    }

    #[test]
    fn pages_spanned_counts() {
        assert_eq!(pages_spanned(PhysAddr(0x1000), 0), 0);
        assert_eq!(pages_spanned(PhysAddr(0x1000), 1), 1);
        assert_eq!(pages_spanned(PhysAddr(0x1000), PAGE_SIZE), 1);
        assert_eq!(pages_spanned(PhysAddr(0x1001), PAGE_SIZE), 2);
        assert_eq!(pages_spanned(PhysAddr(0x1FFF), 2), 2);
        assert_eq!(pages_spanned(PhysAddr(0x1800), 3 * PAGE_SIZE), 4);
    }

    #[test]
    fn push_span_matches_pages_spanned() {
        for (start, len) in [(0x1000u64, 10usize), (0x1FFE, 4), (0x1234, 3 * PAGE_SIZE)] {
            let mut list = ScatterGatherList::with_limit(16);
            list.push_span(PhysAddr(start), len).unwrap();
            assert_eq!(list.len(), pages_spanned(PhysAddr(start), len));
            assert_eq!(list.total_len(), len);
        }
    }
}
