//! Testing utilities and mock implementations
//!
//! Mock peripherals for exercising the driver on the host without
//! hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use crate::driver::interrupt::UsartStatus;
use crate::hal::{DmaStream, DmaTransfer, UsartPeripheral};

/// Fake receive data register address
pub const MOCK_RDR_ADDR: usize = 0x4001_1024;
/// Fake transmit data register address
pub const MOCK_TDR_ADDR: usize = 0x4001_1028;

// =============================================================================
// Mock USART
// =============================================================================

/// Mock USART for testing the channels and the interrupt service
///
/// Incoming bytes queue in a FIFO; the head of the FIFO is what the receive
/// data register holds. The transmit register always reports empty and
/// every written byte is logged.
///
/// # Example
///
/// ```ignore
/// let usart = MockUsart::new();
/// usart.set_rx_interrupt(true);
/// usart.feed(b"AT\r");
/// service(&usart, &rx, &tx, &counters);
/// ```
#[derive(Debug, Default)]
pub struct MockUsart {
    rx_fifo: RefCell<VecDeque<u8>>,
    tx_log: RefCell<Vec<u8>>,
    overrun: Cell<bool>,
    line_error: Cell<bool>,
    rx_irq: Cell<bool>,
    tx_irq: Cell<bool>,
    dma_tx: Cell<bool>,
    dma_rx: Cell<bool>,
    /// Number of receive data register reads
    reads: Cell<usize>,
    /// Number of times the receive interrupt was masked
    rx_masks: Cell<usize>,
    /// Number of error clear requests
    clears: Cell<usize>,
}

impl MockUsart {
    /// Create an idle mock with every interrupt disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if they arrived on the line
    pub fn feed(&self, bytes: &[u8]) {
        self.rx_fifo.borrow_mut().extend(bytes.iter().copied());
    }

    /// Raise the overrun flag
    pub fn inject_overrun(&self) {
        self.overrun.set(true);
    }

    /// Raise the framing error flag
    pub fn inject_line_error(&self) {
        self.line_error.set(true);
    }

    /// Check if the overrun flag is still set
    pub fn overrun_pending(&self) -> bool {
        self.overrun.get()
    }

    /// Bytes still waiting in the receive FIFO
    pub fn pending_rx(&self) -> usize {
        self.rx_fifo.borrow().len()
    }

    /// Every byte written to the transmit register so far
    pub fn transmitted(&self) -> Vec<u8> {
        self.tx_log.borrow().clone()
    }

    /// Number of receive register reads
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Number of times the receive interrupt was masked
    pub fn rx_mask_count(&self) -> usize {
        self.rx_masks.get()
    }

    /// Number of error clear requests
    pub fn clear_count(&self) -> usize {
        self.clears.get()
    }

    /// DMA request enables as `(tx, rx)`
    pub fn dma_requests(&self) -> (bool, bool) {
        (self.dma_tx.get(), self.dma_rx.get())
    }
}

impl UsartPeripheral for MockUsart {
    fn status(&self) -> UsartStatus {
        UsartStatus {
            framing_error: self.line_error.get(),
            overrun: self.overrun.get(),
            rx_not_empty: !self.rx_fifo.borrow().is_empty(),
            tx_empty: true,
            tx_complete: true,
            ..UsartStatus::default()
        }
    }

    fn read_byte(&self) -> u8 {
        self.reads.set(self.reads.get() + 1);
        self.rx_fifo.borrow_mut().pop_front().unwrap_or(0)
    }

    fn write_byte(&self, byte: u8) {
        self.tx_log.borrow_mut().push(byte);
    }

    fn clear_errors(&self, status: UsartStatus) {
        self.clears.set(self.clears.get() + 1);
        if status.overrun {
            self.overrun.set(false);
        }
        if status.has_line_error() {
            self.line_error.set(false);
        }
    }

    fn set_rx_interrupt(&self, enabled: bool) {
        if !enabled {
            self.rx_masks.set(self.rx_masks.get() + 1);
        }
        self.rx_irq.set(enabled);
    }

    fn rx_interrupt_enabled(&self) -> bool {
        self.rx_irq.get()
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        self.tx_irq.set(enabled);
    }

    fn tx_interrupt_enabled(&self) -> bool {
        self.tx_irq.get()
    }

    fn set_dma_requests(&self, tx: bool, rx: bool) {
        self.dma_tx.set(tx);
        self.dma_rx.set(rx);
    }

    fn rx_data_addr(&self) -> usize {
        MOCK_RDR_ADDR
    }

    fn tx_data_addr(&self) -> usize {
        MOCK_TDR_ADDR
    }
}

// =============================================================================
// Mock DMA Stream
// =============================================================================

/// Mock DMA stream
///
/// `start` marks the stream busy with the full length remaining. Tests
/// then move it along with [`MockDma::set_remaining`] and finish it with
/// [`MockDma::complete`].
#[derive(Debug, Default)]
pub struct MockDma {
    busy: Cell<bool>,
    remaining: Cell<usize>,
    transfers: RefCell<Vec<DmaTransfer>>,
    stops: Cell<usize>,
}

impl MockDma {
    /// Create an idle stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the remaining count of the running transfer
    pub fn set_remaining(&self, remaining: usize) {
        self.remaining.set(remaining);
    }

    /// Finish the running transfer
    pub fn complete(&self) {
        self.complete_with_remaining(0);
    }

    /// Stop the running transfer with `remaining` bytes left
    pub fn complete_with_remaining(&self, remaining: usize) {
        self.remaining.set(remaining);
        self.busy.set(false);
    }

    /// Most recently started transfer
    pub fn last_transfer(&self) -> Option<DmaTransfer> {
        self.transfers.borrow().last().copied()
    }

    /// Number of transfers started
    pub fn start_count(&self) -> usize {
        self.transfers.borrow().len()
    }

    /// Number of stop requests
    pub fn stop_count(&self) -> usize {
        self.stops.get()
    }
}

impl DmaStream for MockDma {
    fn start(&self, transfer: DmaTransfer) {
        self.transfers.borrow_mut().push(transfer);
        self.remaining.set(transfer.len);
        self.busy.set(true);
    }

    fn stop(&self) {
        self.stops.set(self.stops.get() + 1);
        self.busy.set(false);
    }

    fn remaining(&self) -> usize {
        self.remaining.get()
    }

    fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_usart_fifo_order() {
        let usart = MockUsart::new();
        usart.feed(&[1, 2]);
        assert!(usart.status().rx_not_empty);
        assert_eq!(usart.read_byte(), 1);
        assert_eq!(usart.read_byte(), 2);
        assert!(!usart.status().rx_not_empty);
        assert_eq!(usart.reads(), 2);
    }

    #[test]
    fn mock_usart_clear_errors() {
        let usart = MockUsart::new();
        usart.inject_overrun();
        usart.inject_line_error();
        usart.clear_errors(usart.status());
        assert!(!usart.status().has_error());
        assert_eq!(usart.clear_count(), 1);
    }

    #[test]
    fn mock_dma_lifecycle() {
        let dma = MockDma::new();
        dma.start(DmaTransfer::receive(MOCK_RDR_ADDR, 0x2000_0000, 8));
        assert!(dma.is_busy());
        assert_eq!(dma.remaining(), 8);
        dma.stop();
        assert!(!dma.is_busy());
        assert_eq!(dma.stop_count(), 1);
    }
}
