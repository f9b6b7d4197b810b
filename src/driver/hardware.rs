//! Hardware callback contract.

use crate::dma::{BounceDecision, ScatterGatherList};
use crate::packet::TxPacket;

/// Transmit status reported by the device for one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStatus {
    /// Device has not finished with the packet
    Pending,
    /// Packet sent
    Success,
    /// Device reported a transmit error
    Error,
}

/// Device-specific half of the transmit queue
///
/// None of these methods may block.
pub trait TxHardware<P: TxPacket> {
    /// Write descriptors for `packet` described by `list`.
    ///
    /// Called exactly once per packet that reaches the device. `list` is
    /// only valid for the duration of the call.
    fn program_descriptors(&mut self, packet: &P, list: &ScatterGatherList);

    /// Report whether the device is done with `packet`.
    fn packet_status(&mut self, packet: &P) -> TxStatus;

    /// Ring the doorbell for everything programmed this cycle.
    fn flush_transaction(&mut self);

    /// Device-specific bounce policy.
    ///
    /// Only asked when the framework decided
    /// [`BounceDecision::TransmitInPlace`], and may only make the decision
    /// stricter; a less strict answer is ignored.
    fn bounce_override(&mut self, packet: &P) -> Option<BounceDecision> {
        let _ = packet;
        None
    }
}
