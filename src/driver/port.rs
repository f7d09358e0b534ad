//! Per-port state and the resolved port handle.

use crate::dma::{DmaChannel, DmaState};
use crate::driver::config::{PortId, TxState};
use crate::driver::error::{PortError, PortResult};
use crate::driver::interrupt::service;
use crate::driver::rx::RxChannel;
use crate::driver::stats::{PortCounters, PortStats};
use crate::driver::tx::TxChannel;
use crate::hal::{DmaStream, UsartPeripheral};

// =============================================================================
// Port Binding
// =============================================================================

/// Hardware behind one enabled port: the USART and its optional DMA streams.
///
/// # Example
///
/// ```ignore
/// use ph_stm32_usart::hal::stm32h7::{DmaController, Stm32DmaStream, Stm32Usart};
/// use ph_stm32_usart::PortBinding;
///
/// const USART6: PortBinding<Stm32Usart, Stm32DmaStream> = PortBinding::with_dma(
///     Stm32Usart::for_port(6),
///     Some(Stm32DmaStream::tx_for_port(6, DmaController::Dma1, 1)),
///     Some(Stm32DmaStream::rx_for_port(6, DmaController::Dma1, 0)),
/// );
/// ```
#[derive(Debug)]
pub struct PortBinding<U, D> {
    /// The USART instance
    pub usart: U,
    /// Stream for the DMA transmit path, if the port is in the DMA TX subset
    pub dma_tx: Option<D>,
    /// Stream for the DMA receive path, if the port is in the DMA RX subset
    pub dma_rx: Option<D>,
}

impl<U, D> PortBinding<U, D> {
    /// Bind a USART without DMA
    pub const fn new(usart: U) -> Self {
        Self {
            usart,
            dma_tx: None,
            dma_rx: None,
        }
    }

    /// Bind a USART together with its DMA streams
    pub const fn with_dma(usart: U, dma_tx: Option<D>, dma_rx: Option<D>) -> Self {
        Self {
            usart,
            dma_tx,
            dma_rx,
        }
    }
}

// =============================================================================
// Port State
// =============================================================================

/// Everything the driver keeps for one enabled port.
pub(crate) struct PortState<const RX_N: usize, const TX_N: usize> {
    pub(crate) rx: RxChannel<RX_N>,
    pub(crate) tx: TxChannel<TX_N>,
    pub(crate) dma: DmaState,
    pub(crate) counters: PortCounters,
}

impl<const RX_N: usize, const TX_N: usize> PortState<RX_N, TX_N> {
    pub(crate) const fn new() -> Self {
        Self {
            rx: RxChannel::new(),
            tx: TxChannel::new(),
            dma: DmaState::new(),
            counters: PortCounters::new(),
        }
    }

    /// Return to the power-on state. Interrupts for the port must be off.
    pub(crate) fn reset(&self) {
        self.rx.reset();
        self.tx.reset();
        self.dma.reset();
        self.counters.reset();
    }
}

// =============================================================================
// Port Handle
// =============================================================================

/// A resolved, enabled port.
///
/// Obtained from [`PortRegistry::dispatch`](crate::PortRegistry::dispatch).
/// Every method acts on this port only and never blocks.
pub struct Port<'a, U, D, const RX_N: usize, const TX_N: usize> {
    id: PortId,
    binding: &'a PortBinding<U, D>,
    state: &'a PortState<RX_N, TX_N>,
}

impl<'a, U, D, const RX_N: usize, const TX_N: usize> Port<'a, U, D, RX_N, TX_N>
where
    U: UsartPeripheral,
    D: DmaStream,
{
    pub(crate) fn new(
        id: PortId,
        binding: &'a PortBinding<U, D>,
        state: &'a PortState<RX_N, TX_N>,
    ) -> Self {
        Self { id, binding, state }
    }

    /// Logical port id
    #[inline]
    pub fn id(&self) -> PortId {
        self.id
    }

    // -------------------------------------------------------------------------
    // Interrupt-driven path
    // -------------------------------------------------------------------------

    /// Start of the receive ring storage.
    ///
    /// The pointer is not position-aware and not synchronized with the
    /// interrupt handler; any ordering it implies is the caller's problem.
    pub fn rx_ptr(&self) -> *const u8 {
        self.state.rx.as_ptr()
    }

    /// Queue `data` for transmission (truncated to `TX_N` bytes).
    ///
    /// # Errors
    ///
    /// [`PortError::Busy`] if a transmission is already in flight.
    pub fn try_send(&self, data: &[u8]) -> PortResult<()> {
        if self.state.tx.try_send(&self.binding.usart, data) {
            Ok(())
        } else {
            Err(PortError::Busy)
        }
    }

    /// Queue `data` for transmission. `false` if busy.
    pub fn send(&self, data: &[u8]) -> bool {
        self.try_send(data).is_ok()
    }

    /// Queue one byte. `false` if busy.
    pub fn putc(&self, byte: u8) -> bool {
        self.state.tx.put_one(&self.binding.usart, byte)
    }

    /// Copy received bytes into `buf`, returning how many were copied.
    pub fn recv(&self, buf: &mut [u8]) -> usize {
        self.state.rx.drain(&self.binding.usart, buf)
    }

    /// Take one received byte. `false` if nothing is buffered.
    pub fn getc(&self, byte: &mut u8) -> bool {
        self.state.rx.get_one(&self.binding.usart, byte)
    }

    /// Number of received bytes waiting
    pub fn available(&self) -> usize {
        self.state.rx.available(&self.binding.usart)
    }

    /// Transmit slot state
    pub fn tx_state(&self) -> TxState {
        self.state.tx.state()
    }

    /// Fault counters
    pub fn stats(&self) -> PortStats {
        self.state.counters.snapshot()
    }

    /// Service this port's pending interrupt conditions.
    #[inline]
    pub fn on_interrupt(&self) {
        service(
            &self.binding.usart,
            &self.state.rx,
            &self.state.tx,
            &self.state.counters,
        );
    }

    // -------------------------------------------------------------------------
    // DMA path
    // -------------------------------------------------------------------------

    /// DMA view of this port
    pub fn dma(&self) -> DmaChannel<'a, U, D> {
        DmaChannel::new(
            &self.binding.usart,
            self.binding.dma_tx.as_ref(),
            self.binding.dma_rx.as_ref(),
            &self.state.dma,
        )
    }

    /// Start a DMA transmission of `data`. See [`DmaChannel::try_send`].
    ///
    /// # Errors
    ///
    /// [`PortError::DmaUnavailable`] or [`PortError::Busy`].
    pub fn try_send_dma(&self, data: &'static [u8]) -> PortResult<()> {
        self.dma().try_send(data)
    }

    /// Arm or poll DMA reception. See [`DmaChannel::recv`].
    ///
    /// # Errors
    ///
    /// [`PortError::DmaUnavailable`] or [`PortError::InvalidBuffer`].
    ///
    /// # Safety
    ///
    /// Same contract as [`DmaChannel::recv`].
    pub unsafe fn try_recv_dma(&self, buf: &mut [u8]) -> PortResult<usize> {
        // SAFETY: forwarded caller contract.
        unsafe { self.dma().recv(buf) }
    }

    /// Stop an armed DMA reception early
    pub fn abort_recv_dma(&self) -> bool {
        self.dma().abort_recv()
    }

    /// Check if a DMA transmission is still running
    pub fn dma_tx_busy(&self) -> bool {
        self.dma().tx_busy()
    }
}

// =============================================================================
// embedded-io
// =============================================================================

impl<U, D, const RX_N: usize, const TX_N: usize> embedded_io::ErrorType
    for Port<'_, U, D, RX_N, TX_N>
{
    type Error = PortError;
}

impl<U, D, const RX_N: usize, const TX_N: usize> embedded_io::ReadReady
    for Port<'_, U, D, RX_N, TX_N>
where
    U: UsartPeripheral,
    D: DmaStream,
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available() > 0)
    }
}

impl<U, D, const RX_N: usize, const TX_N: usize> embedded_io::WriteReady
    for Port<'_, U, D, RX_N, TX_N>
where
    U: UsartPeripheral,
    D: DmaStream,
{
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.tx_state() == TxState::Idle)
    }
}
