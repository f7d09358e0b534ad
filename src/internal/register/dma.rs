//! DMA Stream Register Definitions
//!
//! The STM32H7 DMA1/DMA2 controllers each carry eight streams. A stream is
//! routed to a USART request line through DMAMUX1. The driver only uses
//! normal (one-shot) byte transfers, so the double-buffer and FIFO
//! registers are not modelled.

// Full register map; not every bit is driven by the core.
#![allow(dead_code)]

use super::{DMAMUX1_BASE, read_reg, reg_bit_check, reg_bit_ops, reg_ro, reg_rw, write_reg};

// =============================================================================
// Register Offsets
// =============================================================================

/// Low Interrupt Status Register offset (streams 0-3)
pub const DMA_LISR_OFFSET: usize = 0x00;
/// High Interrupt Status Register offset (streams 4-7)
pub const DMA_HISR_OFFSET: usize = 0x04;
/// Low Interrupt Flag Clear Register offset (streams 0-3)
pub const DMA_LIFCR_OFFSET: usize = 0x08;
/// High Interrupt Flag Clear Register offset (streams 4-7)
pub const DMA_HIFCR_OFFSET: usize = 0x0C;

/// Offset of stream 0's register block from the controller base
pub const DMA_STREAM0_OFFSET: usize = 0x10;
/// Size of one stream register block
pub const DMA_STREAM_STRIDE: usize = 0x18;

/// Stream configuration register offset (within a stream block)
pub const DMA_SXCR_OFFSET: usize = 0x00;
/// Stream number-of-data register offset
pub const DMA_SXNDTR_OFFSET: usize = 0x04;
/// Stream peripheral address register offset
pub const DMA_SXPAR_OFFSET: usize = 0x08;
/// Stream memory 0 address register offset
pub const DMA_SXM0AR_OFFSET: usize = 0x0C;

/// Number of streams per controller
pub const DMA_STREAMS: u8 = 8;

// =============================================================================
// Stream Configuration Register (SxCR) Bits
// =============================================================================

/// Stream enable (hardware clears it when a normal-mode transfer completes)
pub const DMA_SXCR_EN: u32 = 1 << 0;
/// Transfer-complete interrupt enable
pub const DMA_SXCR_TCIE: u32 = 1 << 4;
/// Direction shift
pub const DMA_SXCR_DIR_SHIFT: u32 = 6;
/// Direction: peripheral to memory
pub const DMA_SXCR_DIR_P2M: u32 = 0b00 << 6;
/// Direction: memory to peripheral
pub const DMA_SXCR_DIR_M2P: u32 = 0b01 << 6;
/// Circular mode
pub const DMA_SXCR_CIRC: u32 = 1 << 8;
/// Peripheral increment mode
pub const DMA_SXCR_PINC: u32 = 1 << 9;
/// Memory increment mode
pub const DMA_SXCR_MINC: u32 = 1 << 10;
/// Peripheral data size: byte
pub const DMA_SXCR_PSIZE_BYTE: u32 = 0b00 << 11;
/// Memory data size: byte
pub const DMA_SXCR_MSIZE_BYTE: u32 = 0b00 << 13;
/// Priority level: high
pub const DMA_SXCR_PL_HIGH: u32 = 0b10 << 16;

// =============================================================================
// Interrupt Flags (per stream group in LISR/HISR, LIFCR/HIFCR)
// =============================================================================

/// FIFO error flag (within a stream group)
pub const DMA_FLAG_FE: u32 = 1 << 0;
/// Direct mode error flag
pub const DMA_FLAG_DME: u32 = 1 << 2;
/// Transfer error flag
pub const DMA_FLAG_TE: u32 = 1 << 3;
/// Half transfer flag
pub const DMA_FLAG_HT: u32 = 1 << 4;
/// Transfer complete flag
pub const DMA_FLAG_TC: u32 = 1 << 5;
/// All flags of one stream group
pub const DMA_FLAG_ALL: u32 = DMA_FLAG_FE | DMA_FLAG_DME | DMA_FLAG_TE | DMA_FLAG_HT | DMA_FLAG_TC;

/// Bit offset of each stream's flag group inside its (L/H)ISR register
const STREAM_FLAG_SHIFT: [u32; 4] = [0, 6, 16, 22];

// =============================================================================
// DMAMUX
// =============================================================================

/// DMAMUX channel configuration register stride
pub const DMAMUX_CXCR_STRIDE: usize = 0x04;
/// DMAMUX request id mask
pub const DMAMUX_CXCR_DMAREQ_ID_MASK: u32 = 0xFF;

/// DMAMUX1 request ids for a logical port, as `(rx, tx)`.
///
/// LPUART1 (port 0) is served by BDMA through DMAMUX2 and has no entry.
pub const fn dmamux_requests(port: u8) -> Option<(u8, u8)> {
    match port {
        1 => Some((41, 42)),
        2 => Some((43, 44)),
        3 => Some((45, 46)),
        4 => Some((63, 64)),
        5 => Some((65, 66)),
        6 => Some((71, 72)),
        7 => Some((79, 80)),
        8 => Some((81, 82)),
        9 => Some((116, 117)),
        10 => Some((118, 119)),
        _ => None,
    }
}

// =============================================================================
// DMA Stream Register Block
// =============================================================================

/// Register block of one DMA1/DMA2 stream plus its DMAMUX1 channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaStreamRegs {
    /// Base of the stream's own register block
    base: usize,
    /// Base of the owning controller (for the flag registers)
    controller: usize,
    /// Stream number within the controller (0-7)
    stream: u8,
    /// DMAMUX1 channel feeding this stream
    mux_channel: u8,
}

impl DmaStreamRegs {
    /// Create an accessor for `stream` (0-7) of the controller at `controller`.
    ///
    /// `mux_channel` is the DMAMUX1 channel wired to this stream: stream
    /// number for DMA1, stream number + 8 for DMA2.
    pub const fn new(controller: usize, stream: u8, mux_channel: u8) -> Self {
        assert!(stream < DMA_STREAMS, "DMA stream out of range");
        Self {
            base: controller + DMA_STREAM0_OFFSET + DMA_STREAM_STRIDE * stream as usize,
            controller,
            stream,
            mux_channel,
        }
    }

    /// Get the stream register block base address
    #[inline(always)]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// Stream number within its controller
    #[inline(always)]
    pub const fn stream(&self) -> u8 {
        self.stream
    }

    // -------------------------------------------------------------------------
    // Register accessors (generated by macros)
    // -------------------------------------------------------------------------

    reg_rw!(config, set_config, DMA_SXCR_OFFSET, "Stream configuration register");
    reg_rw!(ndtr, set_ndtr, DMA_SXNDTR_OFFSET, "Stream number-of-data register");
    reg_rw!(peripheral_addr, set_peripheral_addr, DMA_SXPAR_OFFSET, "Stream peripheral address");
    reg_rw!(memory_addr, set_memory_addr, DMA_SXM0AR_OFFSET, "Stream memory 0 address");

    reg_ro!(raw_config, DMA_SXCR_OFFSET, "Stream configuration register (raw)");

    // -------------------------------------------------------------------------
    // Bit operations (generated by macros)
    // -------------------------------------------------------------------------

    reg_bit_ops!(enable, disable, DMA_SXCR_OFFSET, DMA_SXCR_EN, "stream", "Enable", "Disable");

    reg_bit_check!(is_enabled, DMA_SXCR_OFFSET, DMA_SXCR_EN,
                   "Check if the stream is enabled (transfer in progress)");

    // -------------------------------------------------------------------------
    // Special operations (cannot be generated by simple macros)
    // -------------------------------------------------------------------------

    /// Shift of this stream's flag group within LISR/HISR.
    #[inline(always)]
    const fn flag_shift(&self) -> u32 {
        STREAM_FLAG_SHIFT[(self.stream % 4) as usize]
    }

    /// Read this stream's interrupt flags, normalised to the group layout.
    #[inline(always)]
    pub fn flags(&self) -> u32 {
        let offset = if self.stream < 4 { DMA_LISR_OFFSET } else { DMA_HISR_OFFSET };
        let raw = unsafe { read_reg(self.controller + offset) };
        (raw >> self.flag_shift()) & DMA_FLAG_ALL
    }

    /// Clear all of this stream's interrupt flags.
    #[inline(always)]
    pub fn clear_flags(&self) {
        let offset = if self.stream < 4 { DMA_LIFCR_OFFSET } else { DMA_HIFCR_OFFSET };
        unsafe { write_reg(self.controller + offset, DMA_FLAG_ALL << self.flag_shift()) }
    }

    /// Route a DMAMUX1 request id to this stream.
    #[inline(always)]
    pub fn set_request(&self, request: u8) {
        let addr = DMAMUX1_BASE + DMAMUX_CXCR_STRIDE * self.mux_channel as usize;
        unsafe { write_reg(addr, request as u32 & DMAMUX_CXCR_DMAREQ_ID_MASK) }
    }
}
