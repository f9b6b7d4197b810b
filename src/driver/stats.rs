//! Queue statistics.

/// Read-only counters, snapshotted by
/// [`TxDmaQueue::statistics`](crate::TxDmaQueue::statistics)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxStatistics {
    /// Packets completed without mapping because they were cancelled
    pub skipped: u64,
    /// Packets copied into a bounce buffer
    pub bounce_success: u64,
    /// Admission stalls because the bounce pool was empty
    pub bounce_failure: u64,
    /// Packets rejected by bounce analysis
    pub cannot_transmit: u64,
    /// Packets the device reported as failed
    pub completed_with_error: u64,
    /// Admission stalls because the DMA adapter was out of resources
    pub dma_insufficient_resources: u64,
    /// Packets failed by a non-exhaustion mapping error
    pub other_dma_errors: u64,
    /// Packets handed to the device
    pub programmed: u64,
    /// Packets released, whatever their outcome
    pub completed: u64,
    /// Doorbell flushes issued
    pub flushes: u64,
}

impl TxStatistics {
    /// Packets that ended in any kind of failure
    pub const fn total_failures(&self) -> u64 {
        self.skipped + self.cannot_transmit + self.completed_with_error + self.other_dma_errors
    }
}
