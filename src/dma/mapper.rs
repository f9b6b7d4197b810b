//! Scatter/gather mapper with its two backends.
//!
//! The backend is picked once, when the queue is built, and never changes:
//!
//! - [`MappingBackend::Direct`]: the adapter allows bypass, so fragment
//!   physical addresses go straight into a list. Only one direct mapping is
//!   ever being built at a time (the queue is single-threaded and the list
//!   is consumed by the programming callback before the next packet), so a
//!   single scratch list is shared by all slots.
//! - [`MappingBackend::Delegated`]: the adapter builds the list. Each ring
//!   slot owns its list and a transfer-context block in a
//!   [`ContextArena`], so in-flight mappings never alias.

use super::adapter::DmaAdapter;
use super::arena::ContextArena;
use super::sg::ScatterGatherList;
use crate::error::{DmaError, DmaResult};
use crate::packet::TxPacket;

#[cfg(feature = "log")]
use log::debug;

/// Which mapping strategy a queue uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingBackend {
    /// Physical addresses used directly
    Direct,
    /// Lists built by the DMA adapter
    Delegated,
}

pub(crate) enum ScatterGatherMapper {
    Direct { scratch: ScatterGatherList },
    Delegated { contexts: ContextArena },
}

impl ScatterGatherMapper {
    /// Pick the backend for a queue with `slots` ring slots.
    pub(crate) fn new<D: DmaAdapter>(
        allow_bypass: bool,
        max_elements: usize,
        slots: usize,
        adapter: &D,
    ) -> Self {
        if allow_bypass && adapter.bypass_capable() {
            #[cfg(feature = "log")]
            debug!("txdma: direct mapping, {max_elements} elements");
            ScatterGatherMapper::Direct {
                scratch: ScatterGatherList::with_limit(max_elements),
            }
        } else {
            let stride = adapter.transfer_context_size();
            #[cfg(feature = "log")]
            debug!("txdma: delegated mapping, {slots} slots x {stride} context bytes");
            ScatterGatherMapper::Delegated {
                contexts: ContextArena::new(slots, stride),
            }
        }
    }

    pub(crate) fn backend(&self) -> MappingBackend {
        match self {
            ScatterGatherMapper::Direct { .. } => MappingBackend::Direct,
            ScatterGatherMapper::Delegated { .. } => MappingBackend::Delegated,
        }
    }

    /// Limit for the per-slot lists the queue allocates.
    ///
    /// The direct backend never writes to them, so they get no storage.
    pub(crate) fn slot_list_limit(&self, max_elements: usize) -> usize {
        match self {
            ScatterGatherMapper::Direct { .. } => 0,
            ScatterGatherMapper::Delegated { .. } => max_elements,
        }
    }

    /// Map `packet` for ring slot `slot`.
    ///
    /// The direct backend fills its shared scratch list; the delegated one
    /// fills `slot_list`. The returned list is valid until the next call.
    pub(crate) fn map<'a, P, D>(
        &'a mut self,
        slot: usize,
        packet: &P,
        slot_list: &'a mut ScatterGatherList,
        adapter: &mut D,
    ) -> DmaResult<&'a ScatterGatherList>
    where
        P: TxPacket + ?Sized,
        D: DmaAdapter,
    {
        match self {
            ScatterGatherMapper::Direct { scratch } => {
                scratch.clear();
                for fragment in packet.fragments() {
                    scratch.push_span(fragment.phys_start(), fragment.len())?;
                }
                Ok(scratch)
            }
            ScatterGatherMapper::Delegated { contexts } => {
                let context = contexts.slot_mut(slot).ok_or(DmaError::TransferFailed)?;
                slot_list.clear();
                adapter.map_transfer(slot, packet, context, slot_list)?;
                Ok(slot_list)
            }
        }
    }

    /// Release the mapping held by `slot`. No-op for the direct backend.
    pub(crate) fn unmap<D: DmaAdapter>(
        &mut self,
        slot: usize,
        slot_list: &mut ScatterGatherList,
        adapter: &mut D,
    ) {
        if let ScatterGatherMapper::Delegated { contexts } = self {
            if let Some(context) = contexts.slot_mut(slot) {
                adapter.unmap_transfer(slot, context, slot_list);
            }
            slot_list.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::constants::PAGE_SIZE;
    use crate::packet::PhysAddr;
    use crate::testing::{MockDmaAdapter, TestPacket};

    #[test]
    fn backend_selection() {
        let bypass = MockDmaAdapter::new().with_bypass(true);
        let no_bypass = MockDmaAdapter::new();

        assert_eq!(
            ScatterGatherMapper::new(true, 8, 4, &bypass).backend(),
            MappingBackend::Direct
        );
        assert_eq!(
            ScatterGatherMapper::new(false, 8, 4, &bypass).backend(),
            MappingBackend::Delegated
        );
        assert_eq!(
            ScatterGatherMapper::new(true, 8, 4, &no_bypass).backend(),
            MappingBackend::Delegated
        );
    }

    #[test]
    fn direct_splits_fragments_at_pages() {
        let mut adapter = MockDmaAdapter::new().with_bypass(true);
        let mut mapper = ScatterGatherMapper::new(true, 8, 4, &adapter);
        let mut unused = ScatterGatherList::with_limit(mapper.slot_list_limit(8));
        let packet = TestPacket::builder()
            .fragment(0x1_0F80, 0x100)
            .fragment(0x5_0000, 64)
            .build();

        let list = mapper.map(0, &packet, &mut unused, &mut adapter).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.elements()[0].address, PhysAddr(0x1_0F80));
        assert_eq!(list.elements()[0].length, 0x80);
        assert_eq!(list.elements()[1].address, PhysAddr(0x1_1000));
        assert_eq!(list.elements()[1].length, 0x80);
        assert_eq!(list.elements()[2].address, PhysAddr(0x5_0000));
        assert_eq!(list.total_len(), 0x100 + 64);
        assert!(adapter.mapped.is_empty());
    }

    #[test]
    fn direct_overflow_is_mapping_failure() {
        let mut adapter = MockDmaAdapter::new().with_bypass(true);
        let mut mapper = ScatterGatherMapper::new(true, 1, 4, &adapter);
        let mut unused = ScatterGatherList::with_limit(0);
        let packet = TestPacket::builder()
            .fragment(0x1_0000, 2 * PAGE_SIZE)
            .build();

        assert_eq!(
            mapper.map(0, &packet, &mut unused, &mut adapter).err(),
            Some(DmaError::ScatterGatherOverflow)
        );
    }

    #[test]
    fn delegated_uses_slot_list_and_context() {
        let mut adapter = MockDmaAdapter::new().with_context_size(32);
        let mut mapper = ScatterGatherMapper::new(false, 8, 4, &adapter);
        let mut slot_list = ScatterGatherList::with_limit(mapper.slot_list_limit(8));
        let packet = TestPacket::builder().fragment(0x1_0000, 128).build();

        let list = mapper.map(2, &packet, &mut slot_list, &mut adapter).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(adapter.mapped, [2]);
        assert_eq!(adapter.last_context_len, Some(32));
        assert_eq!(slot_list.len(), 1);

        mapper.unmap(2, &mut slot_list, &mut adapter);
        assert_eq!(adapter.unmapped, [2]);
        assert!(slot_list.is_empty());
    }

    #[test]
    fn delegated_contexts_do_not_alias() {
        let mut adapter = MockDmaAdapter::new().with_context_size(8);
        let mut mapper = ScatterGatherMapper::new(false, 8, 3, &adapter);
        let packet = TestPacket::builder().fragment(0x1_0000, 64).build();

        for slot in 0..3 {
            let mut slot_list = ScatterGatherList::with_limit(8);
            mapper.map(slot, &packet, &mut slot_list, &mut adapter).unwrap();
        }

        // The mock stamps each context with its slot number
        let ScatterGatherMapper::Delegated { contexts } = &mut mapper else {
            panic!("expected delegated backend");
        };
        for slot in 0..3 {
            assert!(contexts.slot_mut(slot).unwrap().iter().all(|&b| b == slot as u8 + 1));
        }
    }

    #[test]
    fn delegated_exhaustion_propagates() {
        let mut adapter = MockDmaAdapter::new().with_map_capacity(1);
        let mut mapper = ScatterGatherMapper::new(false, 8, 2, &adapter);
        let packet = TestPacket::builder().fragment(0x1_0000, 64).build();
        let mut first = ScatterGatherList::with_limit(8);
        let mut second = ScatterGatherList::with_limit(8);

        assert!(mapper.map(0, &packet, &mut first, &mut adapter).is_ok());
        assert_eq!(
            mapper.map(1, &packet, &mut second, &mut adapter).err(),
            Some(DmaError::InsufficientResources)
        );
    }

    #[test]
    fn unmap_direct_is_noop() {
        let mut adapter = MockDmaAdapter::new().with_bypass(true);
        let mut mapper = ScatterGatherMapper::new(true, 8, 2, &adapter);
        let mut slot_list = ScatterGatherList::with_limit(0);
        mapper.unmap(0, &mut slot_list, &mut adapter);
        assert!(adapter.unmapped.is_empty());
    }
}
