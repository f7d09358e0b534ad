//! USART / LPUART Register Definitions
//!
//! Register layout of the STM32H7 USART IP (shared by LPUART1 for the
//! registers used here). FIFO mode is left disabled, so the RXNE/TXE names
//! apply rather than RXFNE/TXFNF.

// Full register map; not every bit is driven by the core.
#![allow(dead_code)]

use super::{reg_bit_check, reg_bit_ops, reg_ro, reg_rw};

// =============================================================================
// Register Offsets
// =============================================================================

/// Control Register 1 offset
pub const USART_CR1_OFFSET: usize = 0x00;
/// Control Register 2 offset
pub const USART_CR2_OFFSET: usize = 0x04;
/// Control Register 3 offset
pub const USART_CR3_OFFSET: usize = 0x08;
/// Baud Rate Register offset
pub const USART_BRR_OFFSET: usize = 0x0C;
/// Request Register offset
pub const USART_RQR_OFFSET: usize = 0x18;
/// Interrupt and Status Register offset
pub const USART_ISR_OFFSET: usize = 0x1C;
/// Interrupt Flag Clear Register offset
pub const USART_ICR_OFFSET: usize = 0x20;
/// Receive Data Register offset
pub const USART_RDR_OFFSET: usize = 0x24;
/// Transmit Data Register offset
pub const USART_TDR_OFFSET: usize = 0x28;

// =============================================================================
// Control Register 1 (CR1) Bits
// =============================================================================

/// USART enable
pub const USART_CR1_UE: u32 = 1 << 0;
/// Receiver enable
pub const USART_CR1_RE: u32 = 1 << 2;
/// Transmitter enable
pub const USART_CR1_TE: u32 = 1 << 3;
/// IDLE interrupt enable
pub const USART_CR1_IDLEIE: u32 = 1 << 4;
/// Receive-not-empty interrupt enable
pub const USART_CR1_RXNEIE: u32 = 1 << 5;
/// Transmission-complete interrupt enable
pub const USART_CR1_TCIE: u32 = 1 << 6;
/// Transmit-empty interrupt enable
pub const USART_CR1_TXEIE: u32 = 1 << 7;
/// Parity error interrupt enable
pub const USART_CR1_PEIE: u32 = 1 << 8;

// =============================================================================
// Control Register 3 (CR3) Bits
// =============================================================================

/// Error interrupt enable (framing, overrun, noise in DMA mode)
pub const USART_CR3_EIE: u32 = 1 << 0;
/// DMA enable receiver
pub const USART_CR3_DMAR: u32 = 1 << 6;
/// DMA enable transmitter
pub const USART_CR3_DMAT: u32 = 1 << 7;
/// Overrun disable
pub const USART_CR3_OVRDIS: u32 = 1 << 12;

// =============================================================================
// Interrupt and Status Register (ISR) Bits
// =============================================================================

/// Parity error
pub const USART_ISR_PE: u32 = 1 << 0;
/// Framing error
pub const USART_ISR_FE: u32 = 1 << 1;
/// Noise detected
pub const USART_ISR_NE: u32 = 1 << 2;
/// Overrun error
pub const USART_ISR_ORE: u32 = 1 << 3;
/// Idle line detected
pub const USART_ISR_IDLE: u32 = 1 << 4;
/// Read data register not empty
pub const USART_ISR_RXNE: u32 = 1 << 5;
/// Transmission complete
pub const USART_ISR_TC: u32 = 1 << 6;
/// Transmit data register empty
pub const USART_ISR_TXE: u32 = 1 << 7;
/// Line errors that are cleared alongside the data byte
pub const USART_ISR_LINE_ERRORS: u32 = USART_ISR_PE | USART_ISR_FE | USART_ISR_NE;

// =============================================================================
// Interrupt Flag Clear Register (ICR) Bits
// =============================================================================

/// Parity error clear flag
pub const USART_ICR_PECF: u32 = 1 << 0;
/// Framing error clear flag
pub const USART_ICR_FECF: u32 = 1 << 1;
/// Noise detected clear flag
pub const USART_ICR_NECF: u32 = 1 << 2;
/// Overrun error clear flag
pub const USART_ICR_ORECF: u32 = 1 << 3;
/// Idle line detected clear flag
pub const USART_ICR_IDLECF: u32 = 1 << 4;

// =============================================================================
// USART Register Block
// =============================================================================

/// Register block of one USART/LPUART instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsartRegs {
    base: usize,
}

impl UsartRegs {
    /// Create an accessor for the block at `base`.
    pub const fn new(base: usize) -> Self {
        Self { base }
    }

    /// Get the base address
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Address of the receive data register (DMA peripheral address)
    #[inline(always)]
    pub const fn rdr_addr(&self) -> usize {
        self.base + USART_RDR_OFFSET
    }

    /// Address of the transmit data register (DMA peripheral address)
    #[inline(always)]
    pub const fn tdr_addr(&self) -> usize {
        self.base + USART_TDR_OFFSET
    }

    // -------------------------------------------------------------------------
    // Register accessors (generated by macros)
    // -------------------------------------------------------------------------

    reg_rw!(cr1, set_cr1, USART_CR1_OFFSET, "Control register 1");
    reg_rw!(cr3, set_cr3, USART_CR3_OFFSET, "Control register 3");
    reg_rw!(icr, set_icr, USART_ICR_OFFSET, "Interrupt flag clear register");
    reg_rw!(tdr, set_tdr, USART_TDR_OFFSET, "Transmit data register");

    reg_ro!(isr, USART_ISR_OFFSET, "Interrupt and status register");
    reg_ro!(rdr, USART_RDR_OFFSET, "Receive data register");

    // -------------------------------------------------------------------------
    // Bit operations (generated by macros)
    // -------------------------------------------------------------------------

    reg_bit_ops!(enable_rxne_irq, disable_rxne_irq, USART_CR1_OFFSET, USART_CR1_RXNEIE,
                 "receive-not-empty interrupt", "Enable", "Disable");
    reg_bit_ops!(enable_txe_irq, disable_txe_irq, USART_CR1_OFFSET, USART_CR1_TXEIE,
                 "transmit-empty interrupt", "Enable", "Disable");
    reg_bit_ops!(enable_dma_tx, disable_dma_tx, USART_CR3_OFFSET, USART_CR3_DMAT,
                 "transmit DMA requests", "Enable", "Disable");
    reg_bit_ops!(enable_dma_rx, disable_dma_rx, USART_CR3_OFFSET, USART_CR3_DMAR,
                 "receive DMA requests", "Enable", "Disable");

    reg_bit_check!(is_txe_irq_enabled, USART_CR1_OFFSET, USART_CR1_TXEIE,
                   "Check if the transmit-empty interrupt is enabled");
    reg_bit_check!(is_rxne_irq_enabled, USART_CR1_OFFSET, USART_CR1_RXNEIE,
                   "Check if the receive-not-empty interrupt is enabled");
}
