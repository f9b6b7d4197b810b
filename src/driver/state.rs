//! Per-packet lifecycle and completion results.

use crate::error::DmaError;

/// Why a packet completed without being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxFailure {
    /// Cancelled upstream before admission
    Skipped,
    /// Oversize, empty, or rejected by the bounce policy
    CannotTransmit,
    /// The mapper failed for a reason other than exhaustion
    Mapping(DmaError),
    /// The device reported an error
    Hardware,
}

/// Final outcome of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxCompletion {
    /// Sent successfully
    Success,
    /// Not sent
    Failed(TxFailure),
}

impl TxCompletion {
    /// Whether the packet was sent
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, TxCompletion::Success)
    }
}

/// Where a packet is in the queue
///
/// `Unposted -> Admitted -> Programmed -> CompletionPending* -> Completed
/// -> Released`. Failures before the device skip straight to `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketState {
    /// Posted by the caller, not yet looked at
    #[default]
    Unposted,
    /// Being analyzed and mapped
    Admitted,
    /// Handed to the device
    Programmed,
    /// Device reported it still busy at the last scan
    CompletionPending,
    /// Outcome known, resources not yet released
    Completed(TxCompletion),
    /// Resources released; waiting for the caller to take it back
    Released(TxCompletion),
}

/// A packet handed back to the caller
#[derive(Debug)]
pub struct CompletedPacket<P> {
    /// The packet as originally posted
    pub packet: P,
    /// How it ended
    pub completion: TxCompletion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_success_flag() {
        assert!(TxCompletion::Success.is_success());
        assert!(!TxCompletion::Failed(TxFailure::Hardware).is_success());
        assert!(!TxCompletion::Failed(TxFailure::Mapping(DmaError::TransferFailed)).is_success());
    }

    #[test]
    fn default_state_is_unposted() {
        assert_eq!(PacketState::default(), PacketState::Unposted);
    }
}
