//! ISR-safe transmit queue wrapper using critical sections.

use core::cell::RefCell;
use critical_section::Mutex;

use crate::driver::hardware::TxHardware;
use crate::driver::queue::{AdvanceSummary, TxDmaQueue};
use crate::dma::DmaAdapter;
use crate::error::{IoError, IoResult};
use crate::packet::TxPacket;

/// ISR-safe [`TxDmaQueue`] slot.
///
/// Starts empty so it can live in a `static`; the queue is built at runtime
/// and moved in with [`install`](Self::install). All access goes through
/// `critical_section::with()`, which serializes thread-context posting
/// against `advance` calls from the transmit-complete interrupt. `Sync`
/// whenever the queue is `Send`.
///
/// # Example
///
/// ```ignore
/// static TX: SharedTxQueue<MyPacket, MyHw, MyAdapter> = SharedTxQueue::empty();
///
/// TX.install(TxDmaQueue::new(config, hw, adapter)?);
/// TX.with(|q| q.try_post(packet)).ok();
///
/// #[interrupt]
/// fn TX_DONE() {
///     let _ = TX.advance();
/// }
/// ```
pub struct SharedTxQueue<P, H, D>
where
    P: TxPacket,
    H: TxHardware<P>,
    D: DmaAdapter,
{
    inner: Mutex<RefCell<Option<TxDmaQueue<P, H, D>>>>,
}

impl<P, H, D> SharedTxQueue<P, H, D>
where
    P: TxPacket,
    H: TxHardware<P>,
    D: DmaAdapter,
{
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn empty() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Move a queue in, returning any queue previously installed.
    pub fn install(&self, queue: TxDmaQueue<P, H, D>) -> Option<TxDmaQueue<P, H, D>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(queue))
    }

    /// Move the queue out, leaving the slot empty.
    ///
    /// Drain the queue first; mappings still held by the device are not
    /// returned on drop.
    pub fn take(&self) -> Option<TxDmaQueue<P, H, D>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Whether a queue is installed
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Execute a closure with exclusive access to the queue.
    ///
    /// Interrupts are disabled for the duration of the closure.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidState`] if no queue is installed.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> IoResult<R>
    where
        F: FnOnce(&mut TxDmaQueue<P, H, D>) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref_mut(cs)
                .as_mut()
                .map(f)
                .ok_or(IoError::InvalidState)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed (from
    /// inside [`with`](Self::with)) or nothing is installed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut TxDmaQueue<P, H, D>) -> R,
    {
        critical_section::with(|cs| {
            let mut slot = self.inner.borrow(cs).try_borrow_mut().ok()?;
            slot.as_mut().map(f)
        })
    }

    /// Run one advance cycle.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidState`] if no queue is installed.
    #[inline]
    pub fn advance(&self) -> IoResult<AdvanceSummary> {
        self.with(TxDmaQueue::advance)
    }
}

impl<P, H, D> Default for SharedTxQueue<P, H, D>
where
    P: TxPacket,
    H: TxHardware<P>,
    D: DmaAdapter,
{
    fn default() -> Self {
        Self::empty()
    }
}
