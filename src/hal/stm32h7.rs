//! STM32H7 implementations of the peripheral traits.
//!
//! Clocks, pins and baud rate are left to the board support code. These
//! types only drive the interrupt-enable, status and DMA-request bits the
//! driver core needs.
//!
//! # DMA buffers and the data cache
//!
//! DMA1/DMA2 cannot reach DTCM. Buffers handed to a DMA stream must live in
//! AXI SRAM or SRAM1-3, in a region the MPU marks non-cacheable (or with the
//! data cache disabled).

use crate::driver::interrupt::UsartStatus;
use crate::hal::{DmaDirection, DmaStream, DmaTransfer, UsartPeripheral};
use crate::internal::register::dma::{
    DMA_SXCR_DIR_M2P, DMA_SXCR_DIR_P2M, DMA_SXCR_MINC, DMA_SXCR_MSIZE_BYTE, DMA_SXCR_PL_HIGH,
    DMA_SXCR_PSIZE_BYTE, DmaStreamRegs, dmamux_requests,
};
use crate::internal::register::usart::UsartRegs;
use crate::internal::register::{DMA1_BASE, DMA2_BASE, usart_base};

// =============================================================================
// USART
// =============================================================================

/// One STM32H7 USART/LPUART instance, addressed by logical port id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stm32Usart {
    regs: UsartRegs,
}

impl Stm32Usart {
    /// Bind the peripheral behind logical port `port` (0 = LPUART1,
    /// 1..=10 = USART1..USART10).
    ///
    /// # Panics
    ///
    /// Panics (a build error in a `static` initializer) if `port` has no
    /// peripheral.
    pub const fn for_port(port: u8) -> Self {
        match usart_base(port) {
            Some(base) => Self {
                regs: UsartRegs::new(base),
            },
            None => panic!("no USART peripheral mapped to this port id"),
        }
    }

    /// Base address of the register block
    pub const fn base(&self) -> usize {
        self.regs.base()
    }
}

impl UsartPeripheral for Stm32Usart {
    #[inline]
    fn status(&self) -> UsartStatus {
        UsartStatus::from_raw(self.regs.isr())
    }

    #[inline]
    fn read_byte(&self) -> u8 {
        (self.regs.rdr() & 0xFF) as u8
    }

    #[inline]
    fn write_byte(&self, byte: u8) {
        self.regs.set_tdr(u32::from(byte));
    }

    #[inline]
    fn clear_errors(&self, status: UsartStatus) {
        let mask = status.error_clear_mask();
        if mask != 0 {
            self.regs.set_icr(mask);
        }
    }

    #[inline]
    fn set_rx_interrupt(&self, enabled: bool) {
        if enabled {
            self.regs.enable_rxne_irq();
        } else {
            self.regs.disable_rxne_irq();
        }
    }

    #[inline]
    fn rx_interrupt_enabled(&self) -> bool {
        self.regs.is_rxne_irq_enabled()
    }

    #[inline]
    fn set_tx_interrupt(&self, enabled: bool) {
        if enabled {
            self.regs.enable_txe_irq();
        } else {
            self.regs.disable_txe_irq();
        }
    }

    #[inline]
    fn tx_interrupt_enabled(&self) -> bool {
        self.regs.is_txe_irq_enabled()
    }

    fn set_dma_requests(&self, tx: bool, rx: bool) {
        if tx {
            self.regs.enable_dma_tx();
        } else {
            self.regs.disable_dma_tx();
        }
        if rx {
            self.regs.enable_dma_rx();
        } else {
            self.regs.disable_dma_rx();
        }
    }

    #[inline]
    fn rx_data_addr(&self) -> usize {
        self.regs.rdr_addr()
    }

    #[inline]
    fn tx_data_addr(&self) -> usize {
        self.regs.tdr_addr()
    }
}

// =============================================================================
// DMA
// =============================================================================

/// DMA controller owning a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaController {
    /// DMA1 (DMAMUX1 channels 0-7)
    Dma1,
    /// DMA2 (DMAMUX1 channels 8-15)
    Dma2,
}

impl DmaController {
    /// Controller base address
    pub const fn base(self) -> usize {
        match self {
            DmaController::Dma1 => DMA1_BASE,
            DmaController::Dma2 => DMA2_BASE,
        }
    }

    /// DMAMUX1 channel wired to `stream` of this controller
    pub const fn mux_channel(self, stream: u8) -> u8 {
        match self {
            DmaController::Dma1 => stream,
            DmaController::Dma2 => stream + 8,
        }
    }
}

/// One DMA1/DMA2 stream routed to a USART request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stm32DmaStream {
    regs: DmaStreamRegs,
    request: u8,
}

impl Stm32DmaStream {
    /// Bind `stream` (0-7) of `controller` to DMAMUX1 request id `request`.
    pub const fn new(controller: DmaController, stream: u8, request: u8) -> Self {
        Self {
            regs: DmaStreamRegs::new(controller.base(), stream, controller.mux_channel(stream)),
            request,
        }
    }

    /// Stream serving the receive direction of logical port `port`.
    ///
    /// # Panics
    ///
    /// Panics if the port has no DMAMUX1 receive request (LPUART1).
    pub const fn rx_for_port(port: u8, controller: DmaController, stream: u8) -> Self {
        match dmamux_requests(port) {
            Some((rx, _)) => Self::new(controller, stream, rx),
            None => panic!("port has no DMAMUX1 request line"),
        }
    }

    /// Stream serving the transmit direction of logical port `port`.
    ///
    /// # Panics
    ///
    /// Panics if the port has no DMAMUX1 transmit request (LPUART1).
    pub const fn tx_for_port(port: u8, controller: DmaController, stream: u8) -> Self {
        match dmamux_requests(port) {
            Some((_, tx)) => Self::new(controller, stream, tx),
            None => panic!("port has no DMAMUX1 request line"),
        }
    }

    /// DMAMUX1 request id this stream is routed to
    pub const fn request(&self) -> u8 {
        self.request
    }
}

impl DmaStream for Stm32DmaStream {
    fn start(&self, transfer: DmaTransfer) {
        let direction = match transfer.direction {
            DmaDirection::PeripheralToMemory => DMA_SXCR_DIR_P2M,
            DmaDirection::MemoryToPeripheral => DMA_SXCR_DIR_M2P,
        };

        self.regs.clear_flags();
        self.regs.set_request(self.request);
        self.regs.set_peripheral_addr(transfer.peripheral_addr as u32);
        self.regs.set_memory_addr(transfer.memory_addr as u32);
        self.regs.set_ndtr(transfer.len as u32);
        self.regs.set_config(
            direction | DMA_SXCR_MINC | DMA_SXCR_PSIZE_BYTE | DMA_SXCR_MSIZE_BYTE | DMA_SXCR_PL_HIGH,
        );
        self.regs.enable();
    }

    fn stop(&self) {
        self.regs.disable();
    }

    #[inline]
    fn remaining(&self) -> usize {
        (self.regs.ndtr() & 0xFFFF) as usize
    }

    #[inline]
    fn is_busy(&self) -> bool {
        self.regs.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::register::USART1_BASE;

    #[test]
    fn usart_for_port_resolves_base() {
        assert_eq!(Stm32Usart::for_port(1).base(), USART1_BASE);
    }

    #[test]
    #[should_panic]
    fn usart_for_unmapped_port_panics() {
        let _ = Stm32Usart::for_port(11);
    }

    #[test]
    fn dma2_streams_use_upper_mux_channels() {
        assert_eq!(DmaController::Dma1.mux_channel(3), 3);
        assert_eq!(DmaController::Dma2.mux_channel(3), 11);
    }

    #[test]
    fn stream_for_port_picks_request_line() {
        let rx = Stm32DmaStream::rx_for_port(6, DmaController::Dma1, 0);
        let tx = Stm32DmaStream::tx_for_port(6, DmaController::Dma1, 1);
        assert_eq!(rx.request(), 71);
        assert_eq!(tx.request(), 72);
    }

    #[test]
    #[should_panic]
    fn lpuart_has_no_dma_stream() {
        let _ = Stm32DmaStream::rx_for_port(0, DmaController::Dma1, 0);
    }
}
