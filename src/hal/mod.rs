//! Hardware Abstraction Layer
//!
//! The driver core never touches registers directly. It talks to the
//! hardware through two traits:
//!
//! - [`UsartPeripheral`]: one USART/LPUART instance
//! - [`DmaStream`]: one DMA stream wired to a USART request line
//!
//! [`stm32h7`] implements both for the STM32H7 register blocks. The
//! `testing` module implements them with in-memory mocks.

#[cfg(feature = "stm32h7")]
pub mod stm32h7;

use crate::driver::interrupt::UsartStatus;

// =============================================================================
// USART Peripheral Trait
// =============================================================================

/// Operations the driver needs from one USART instance.
///
/// Implementations are shared between the application and the interrupt
/// handler, so every method takes `&self`. Register writes must be single
/// volatile accesses. A read-modify-write of a register both contexts
/// update (the interrupt enables share CR1) must not be interruptible
/// between its read and its write.
pub trait UsartPeripheral {
    /// Sample the interrupt-and-status register.
    fn status(&self) -> UsartStatus;

    /// Read the receive data register. Clears the receive-not-empty flag.
    fn read_byte(&self) -> u8;

    /// Write the transmit data register.
    fn write_byte(&self, byte: u8);

    /// Clear the error flags set in `status`.
    fn clear_errors(&self, status: UsartStatus);

    /// Enable or disable the receive-not-empty interrupt.
    fn set_rx_interrupt(&self, enabled: bool);

    /// Check if the receive-not-empty interrupt is enabled.
    fn rx_interrupt_enabled(&self) -> bool;

    /// Enable or disable the transmit-empty interrupt.
    fn set_tx_interrupt(&self, enabled: bool);

    /// Check if the transmit-empty interrupt is enabled.
    fn tx_interrupt_enabled(&self) -> bool;

    /// Enable or disable DMA requests for each direction.
    fn set_dma_requests(&self, tx: bool, rx: bool);

    /// Address of the receive data register, used as DMA source.
    fn rx_data_addr(&self) -> usize;

    /// Address of the transmit data register, used as DMA destination.
    fn tx_data_addr(&self) -> usize;
}

// =============================================================================
// DMA Stream Trait
// =============================================================================

/// Direction of a DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaDirection {
    /// Receive: USART data register into memory
    PeripheralToMemory,
    /// Transmit: memory into USART data register
    MemoryToPeripheral,
}

/// One-shot byte transfer between a USART data register and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaTransfer {
    /// Transfer direction
    pub direction: DmaDirection,
    /// USART data register address (not incremented)
    pub peripheral_addr: usize,
    /// Memory start address (incremented per byte)
    pub memory_addr: usize,
    /// Number of bytes
    pub len: usize,
}

impl DmaTransfer {
    /// Transfer from USART receive register into `len` bytes at `memory_addr`.
    pub const fn receive(peripheral_addr: usize, memory_addr: usize, len: usize) -> Self {
        Self {
            direction: DmaDirection::PeripheralToMemory,
            peripheral_addr,
            memory_addr,
            len,
        }
    }

    /// Transfer `len` bytes at `memory_addr` into the USART transmit register.
    pub const fn transmit(peripheral_addr: usize, memory_addr: usize, len: usize) -> Self {
        Self {
            direction: DmaDirection::MemoryToPeripheral,
            peripheral_addr,
            memory_addr,
            len,
        }
    }
}

/// Operations the driver needs from one DMA stream.
pub trait DmaStream {
    /// Program and enable a one-shot transfer.
    ///
    /// The stream must be idle.
    fn start(&self, transfer: DmaTransfer);

    /// Disable the stream. Any transfer in progress stops early.
    fn stop(&self);

    /// Bytes not yet transferred.
    fn remaining(&self) -> usize;

    /// Check if a transfer is in progress.
    fn is_busy(&self) -> bool;
}

/// Placeholder stream type for registries without any DMA port.
///
/// Uninhabited: a binding can only ever hold `None` of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDma {}

impl DmaStream for NoDma {
    fn start(&self, _transfer: DmaTransfer) {
        match *self {}
    }

    fn stop(&self) {
        match *self {}
    }

    fn remaining(&self) -> usize {
        match *self {}
    }

    fn is_busy(&self) -> bool {
        match *self {}
    }
}
