//! Interrupt status handling and the per-port interrupt service routine.
//!
//! [`UsartStatus`] parses the USART interrupt-and-status register.
//! [`service`] is the body of every per-port interrupt entry point: it
//! recovers from errors, feeds the receive ring and drains the transmit slot.

use crate::driver::rx::RxChannel;
use crate::driver::stats::PortCounters;
use crate::driver::tx::TxChannel;
use crate::hal::UsartPeripheral;
use crate::internal::register::usart::{
    USART_ISR_FE, USART_ISR_IDLE, USART_ISR_NE, USART_ISR_ORE, USART_ISR_PE, USART_ISR_RXNE,
    USART_ISR_TC, USART_ISR_TXE,
};

// =============================================================================
// USART Status
// =============================================================================

/// Status flags parsed from the USART interrupt-and-status register.
///
/// # Example
///
/// ```ignore
/// let status = usart.status();
/// if status.overrun {
///     usart.clear_errors(status);
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartStatus {
    /// Parity error
    pub parity_error: bool,
    /// Framing error (stop bit missing)
    pub framing_error: bool,
    /// Noise detected on the line
    pub noise: bool,
    /// Overrun - a byte arrived before the previous one was read
    pub overrun: bool,
    /// Idle line detected
    pub idle: bool,
    /// Receive data register not empty
    pub rx_not_empty: bool,
    /// Transmission complete (shift register drained)
    pub tx_complete: bool,
    /// Transmit data register empty
    pub tx_empty: bool,
}

impl UsartStatus {
    /// Every error flag set; used to clear stale errors at startup.
    pub const ALL_ERRORS: Self = Self {
        parity_error: true,
        framing_error: true,
        noise: true,
        overrun: true,
        idle: false,
        rx_not_empty: false,
        tx_complete: false,
        tx_empty: false,
    };

    /// Create from raw ISR register value
    #[inline]
    pub fn from_raw(isr: u32) -> Self {
        Self {
            parity_error: (isr & USART_ISR_PE) != 0,
            framing_error: (isr & USART_ISR_FE) != 0,
            noise: (isr & USART_ISR_NE) != 0,
            overrun: (isr & USART_ISR_ORE) != 0,
            idle: (isr & USART_ISR_IDLE) != 0,
            rx_not_empty: (isr & USART_ISR_RXNE) != 0,
            tx_complete: (isr & USART_ISR_TC) != 0,
            tx_empty: (isr & USART_ISR_TXE) != 0,
        }
    }

    /// Convert to raw ISR layout
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.parity_error {
            val |= USART_ISR_PE;
        }
        if self.framing_error {
            val |= USART_ISR_FE;
        }
        if self.noise {
            val |= USART_ISR_NE;
        }
        if self.overrun {
            val |= USART_ISR_ORE;
        }
        if self.idle {
            val |= USART_ISR_IDLE;
        }
        if self.rx_not_empty {
            val |= USART_ISR_RXNE;
        }
        if self.tx_complete {
            val |= USART_ISR_TC;
        }
        if self.tx_empty {
            val |= USART_ISR_TXE;
        }
        val
    }

    /// Error bits in ICR layout (ICR clear bits share the ISR positions)
    #[inline]
    pub fn error_clear_mask(&self) -> u32 {
        self.to_raw() & (USART_ISR_PE | USART_ISR_FE | USART_ISR_NE | USART_ISR_ORE)
    }

    /// Check for a framing, noise or parity error
    #[inline]
    pub fn has_line_error(&self) -> bool {
        self.parity_error || self.framing_error || self.noise
    }

    /// Check if any error occurred
    #[inline]
    pub fn has_error(&self) -> bool {
        self.overrun || self.has_line_error()
    }
}

// =============================================================================
// Interrupt Service
// =============================================================================

/// Service every pending condition of one port.
///
/// Each condition is checked on every call, with no early return:
///
/// 1. Errors: flags are cleared. On overrun the receive register is read once
///    and the byte discarded, which unblocks further receive interrupts.
/// 2. Receive-not-empty (with its interrupt enabled): the byte is pushed
///    into the ring, or counted as dropped if the ring is full.
/// 3. Transmit-empty (with its interrupt enabled): one drain step.
///
/// The status is sampled again after an overrun dummy read, since that read
/// consumes the pending byte.
pub(crate) fn service<U, const RX_N: usize, const TX_N: usize>(
    usart: &U,
    rx: &RxChannel<RX_N>,
    tx: &TxChannel<TX_N>,
    counters: &PortCounters,
) where
    U: UsartPeripheral,
{
    let mut status = usart.status();

    if status.has_error() {
        usart.clear_errors(status);
        if status.has_line_error() {
            counters.record_line_error();
        }
        if status.overrun {
            counters.record_overrun();
            let _discard = usart.read_byte();
            status = usart.status();
        }
    }

    if status.rx_not_empty && usart.rx_interrupt_enabled() {
        let byte = usart.read_byte();
        if !rx.push(byte) {
            counters.record_rx_dropped();
        }
    }

    if status.tx_empty && usart.tx_interrupt_enabled() {
        tx.drain_step(usart);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
