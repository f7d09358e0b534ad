//! DMA fast path
//!
//! Alternate transport for ports in a DMA subset. Bytes move directly
//! between the USART data register and caller memory; the driver keeps no
//! copy.
//!
//! # Transmit
//!
//! [`DmaChannel::try_send`] starts a one-shot transfer from a `'static`
//! buffer and returns. Completion is observed by polling
//! [`DmaChannel::tx_busy`].
//!
//! # Receive ("arm, then poll")
//!
//! Reception is one-shot, not circular:
//!
//! 1. The first [`DmaChannel::recv`] arms a transfer of `buf.len()` bytes
//!    and returns 0.
//! 2. Later calls return 0 while the stream is busy.
//! 3. Once the stream stops (buffer full, or [`DmaChannel::abort_recv`]),
//!    the next call returns `armed_len - remaining` and disarms.
//! 4. The call after that arms again.

use core::sync::atomic::{AtomicBool, Ordering, fence};

#[cfg(feature = "log")]
use log::warn;

use crate::driver::error::{PortError, PortResult};
use crate::hal::{DmaStream, DmaTransfer, UsartPeripheral};
use crate::internal::constants::DMA_MAX_TRANSFER;
use crate::sync::CriticalSectionCell;

// =============================================================================
// DMA State
// =============================================================================

/// Armed receive transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RxArm {
    in_progress: bool,
    addr: usize,
    len: usize,
}

/// Per-port DMA bookkeeping. Holds no data buffer.
pub struct DmaState {
    tx_busy: AtomicBool,
    rx: CriticalSectionCell<RxArm>,
}

impl DmaState {
    /// Create an idle state.
    pub const fn new() -> Self {
        Self {
            tx_busy: AtomicBool::new(false),
            rx: CriticalSectionCell::new(RxArm {
                in_progress: false,
                addr: 0,
                len: 0,
            }),
        }
    }

    /// Check if a receive transfer is armed and not yet harvested
    pub fn rx_in_progress(&self) -> bool {
        self.rx.with(|arm| arm.in_progress)
    }

    /// Last observed transmit busy state
    pub fn tx_busy(&self) -> bool {
        self.tx_busy.load(Ordering::Relaxed)
    }

    /// Forget any armed transfer. The streams must already be stopped.
    pub(crate) fn reset(&self) {
        self.tx_busy.store(false, Ordering::Relaxed);
        self.rx.with(|arm| *arm = RxArm::default());
    }
}

impl Default for DmaState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DMA Channel
// =============================================================================

/// One direction-capable DMA view of a port.
///
/// Borrowed from the registry for the duration of a call; either stream may
/// be absent, in which case that direction reports [`PortError::DmaUnavailable`].
pub struct DmaChannel<'a, U, D> {
    usart: &'a U,
    tx_stream: Option<&'a D>,
    rx_stream: Option<&'a D>,
    state: &'a DmaState,
}

impl<'a, U, D> DmaChannel<'a, U, D>
where
    U: UsartPeripheral,
    D: DmaStream,
{
    /// Bind a port's peripheral, streams and state.
    pub fn new(
        usart: &'a U,
        tx_stream: Option<&'a D>,
        rx_stream: Option<&'a D>,
        state: &'a DmaState,
    ) -> Self {
        Self {
            usart,
            tx_stream,
            rx_stream,
            state,
        }
    }

    /// Start transmitting `data` directly from caller memory.
    ///
    /// Payloads longer than one DMA transfer (65535 bytes) are truncated.
    /// An empty payload is accepted without touching the stream.
    ///
    /// # Errors
    ///
    /// - [`PortError::DmaUnavailable`] if the port has no transmit stream
    /// - [`PortError::Busy`] if the previous transfer has not finished
    pub fn try_send(&self, data: &'static [u8]) -> PortResult<()> {
        let stream = self.tx_stream.ok_or(PortError::DmaUnavailable)?;
        if stream.is_busy() {
            self.state.tx_busy.store(true, Ordering::Relaxed);
            return Err(PortError::Busy);
        }
        if data.is_empty() {
            return Ok(());
        }

        let len = data.len().min(DMA_MAX_TRANSFER);
        fence(Ordering::Release);
        stream.start(DmaTransfer::transmit(
            self.usart.tx_data_addr(),
            data.as_ptr() as usize,
            len,
        ));
        self.state.tx_busy.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Poll the transmit stream. `false` once the last transfer is done.
    pub fn tx_busy(&self) -> bool {
        let busy = self.tx_stream.is_some_and(|stream| stream.is_busy());
        self.state.tx_busy.store(busy, Ordering::Relaxed);
        busy
    }

    /// Arm or poll a receive transfer into `buf`.
    ///
    /// Returns 0 when arming and while the transfer is running, then the
    /// number of bytes received once it has stopped. An empty `buf` is
    /// never armed.
    ///
    /// # Errors
    ///
    /// - [`PortError::DmaUnavailable`] if the port has no receive stream
    /// - [`PortError::InvalidBuffer`] if a different buffer than the armed
    ///   one (another address or another length) is passed while a
    ///   transfer is in progress
    ///
    /// # Safety
    ///
    /// From arming until the call that returns the byte count, the caller
    /// must not access `buf` and must keep it alive, and must pass the same
    /// buffer on every poll. The engine writes to it in the background.
    pub unsafe fn recv(&self, buf: &mut [u8]) -> PortResult<usize> {
        let stream = self.rx_stream.ok_or(PortError::DmaUnavailable)?;
        let addr = buf.as_mut_ptr() as usize;

        let result = self.state.rx.with(|arm| {
            if !arm.in_progress {
                if buf.is_empty() {
                    return Ok(0);
                }
                let len = buf.len().min(DMA_MAX_TRANSFER);
                stream.start(DmaTransfer::receive(self.usart.rx_data_addr(), addr, len));
                *arm = RxArm {
                    in_progress: true,
                    addr,
                    len,
                };
                return Ok(0);
            }

            if arm.addr != addr || arm.len != buf.len().min(DMA_MAX_TRANSFER) {
                return Err(PortError::InvalidBuffer);
            }
            if stream.is_busy() {
                return Ok(0);
            }

            arm.in_progress = false;
            Ok(arm.len.saturating_sub(stream.remaining()))
        });

        match result {
            Ok(n) if n > 0 => fence(Ordering::Acquire),
            #[cfg(feature = "log")]
            Err(PortError::InvalidBuffer) => warn!("usart: DMA receive polled with a different buffer"),
            _ => {}
        }
        result
    }

    /// Stop an armed receive transfer early.
    ///
    /// The bytes received so far are returned by the next [`Self::recv`]
    /// poll. Returns `false` if nothing was armed or the port has no
    /// receive stream.
    pub fn abort_recv(&self) -> bool {
        let Some(stream) = self.rx_stream else {
            return false;
        };
        self.state.rx.with(|arm| {
            if arm.in_progress {
                stream.stop();
                true
            } else {
                false
            }
        })
    }
}
