//! Error types for the transmit DMA engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Queue construction failures (fatal, queue not created)
//! - [`DmaError`]: Scatter/gather mapping and bounce buffer failures
//! - [`IoError`]: Runtime ring and teardown failures
//!
//! The unified [`Error`] enum wraps all domain errors.
//!
//! Note that per-packet failures never surface as `Err` from
//! [`TxDmaQueue::advance`](crate::TxDmaQueue::advance). They complete the
//! packet with a [`TxCompletion`](crate::TxCompletion) failure instead.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// Detected once, when the queue is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Maximum packet size must be non-zero
    ZeroMaximumPacketSize,
    /// Alignment mask is not of the form 2^k - 1
    InvalidAlignment,
    /// Address width must be between 1 and 64 bits (or 0 for unconstrained)
    InvalidAddressWidth,
    /// Ring capacity must be non-zero
    ZeroRingCapacity,
    /// Scatter/gather element limit exceeds what a list can hold
    ScatterGatherLimitTooLarge,
    /// Maximum packet size cannot be rounded up to the alignment
    MaximumPacketSizeTooLarge,
    /// DMA adapter could not provide the bounce buffer backing memory
    BounceAllocationFailed,
    /// Bounce buffer memory extends beyond the device's address width
    BounceBufferUnreachable,
    /// Bounce buffer memory does not start on the required alignment
    BounceBufferMisaligned,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::ZeroMaximumPacketSize => "maximum packet size is zero",
            ConfigError::InvalidAlignment => "invalid alignment mask",
            ConfigError::InvalidAddressWidth => "invalid address width",
            ConfigError::ZeroRingCapacity => "ring capacity is zero",
            ConfigError::ScatterGatherLimitTooLarge => "scatter/gather limit too large",
            ConfigError::MaximumPacketSizeTooLarge => "maximum packet size too large",
            ConfigError::BounceAllocationFailed => "bounce buffer allocation failed",
            ConfigError::BounceBufferUnreachable => "bounce buffer beyond device reach",
            ConfigError::BounceBufferMisaligned => "bounce buffer misaligned",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Scatter/gather mapping errors
///
/// [`DmaError::InsufficientResources`] is the only recoverable variant: it
/// halts admission for the current cycle and the packet is retried on the
/// next one. Every other variant fails the packet it was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// Mapping resources (adapter map registers, bounce buffers) exhausted
    InsufficientResources,
    /// Mapping needed more elements than the scatter/gather list holds
    ScatterGatherOverflow,
    /// A physical address is outside the device's addressable range
    AddressUnreachable,
    /// The DMA adapter rejected the transfer
    TransferFailed,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::InsufficientResources => "insufficient mapping resources",
            DmaError::ScatterGatherOverflow => "scatter/gather list overflow",
            DmaError::AddressUnreachable => "address beyond device reach",
            DmaError::TransferFailed => "DMA transfer rejected",
        }
    }

    /// Whether this error signals resource exhaustion (retry next cycle).
    #[must_use]
    pub const fn is_exhaustion(&self) -> bool {
        matches!(self, DmaError::InsufficientResources)
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Drain did not finish within its time budget
    Timeout,
    /// Operation not valid in the current queue state
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Timeout => "operation timed out",
            IoError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match TxDmaQueue::new(config, hardware, adapter) {
///     Err(Error::Config(ConfigError::InvalidAlignment)) => { /* ... */ }
///     Err(e) => { /* ... */ }
///     Ok(queue) => { /* ... */ }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for queue operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
