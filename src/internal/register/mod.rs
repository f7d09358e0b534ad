//! Memory-mapped register definitions for the STM32H7 USART and DMA blocks
//!
//! This module provides typed access to the USART/LPUART and DMA stream
//! registers. All register access is volatile to ensure proper hardware
//! interaction.

pub mod dma;
pub mod usart;

// =============================================================================
// Peripheral Base Addresses (STM32H7)
// =============================================================================

/// LPUART1 base address (logical port 0, SRD/D3 domain)
pub const LPUART1_BASE: usize = 0x5800_0C00;
/// USART1 base address (logical port 1)
pub const USART1_BASE: usize = 0x4001_1000;
/// USART2 base address (logical port 2)
pub const USART2_BASE: usize = 0x4000_4400;
/// USART3 base address (logical port 3)
pub const USART3_BASE: usize = 0x4000_4800;
/// UART4 base address (logical port 4)
pub const UART4_BASE: usize = 0x4000_4C00;
/// UART5 base address (logical port 5)
pub const UART5_BASE: usize = 0x4000_5000;
/// USART6 base address (logical port 6)
pub const USART6_BASE: usize = 0x4001_1400;
/// UART7 base address (logical port 7)
pub const UART7_BASE: usize = 0x4000_7800;
/// UART8 base address (logical port 8)
pub const UART8_BASE: usize = 0x4000_7C00;
/// UART9 base address (logical port 9)
pub const UART9_BASE: usize = 0x4001_1800;
/// USART10 base address (logical port 10)
pub const USART10_BASE: usize = 0x4001_1C00;

/// DMA1 controller base address
pub const DMA1_BASE: usize = 0x4002_0000;
/// DMA2 controller base address
pub const DMA2_BASE: usize = 0x4002_0400;
/// DMAMUX1 base address (channels 0-7 feed DMA1, 8-15 feed DMA2)
pub const DMAMUX1_BASE: usize = 0x4002_0800;

/// Map a logical port id to its peripheral base address.
///
/// Returns `None` for ids with no peripheral behind them. Used by the
/// configuration check, so an unmapped enabled port fails the build.
pub const fn usart_base(port: u8) -> Option<usize> {
    match port {
        0 => Some(LPUART1_BASE),
        1 => Some(USART1_BASE),
        2 => Some(USART2_BASE),
        3 => Some(USART3_BASE),
        4 => Some(UART4_BASE),
        5 => Some(UART5_BASE),
        6 => Some(USART6_BASE),
        7 => Some(UART7_BASE),
        8 => Some(UART8_BASE),
        9 => Some(UART9_BASE),
        10 => Some(USART10_BASE),
        _ => None,
    }
}

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u32) {
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

/// Modify a register using a read-modify-write operation
///
/// The read and the write happen inside one critical section, so an
/// interrupt handler touching other bits of the same register cannot have
/// its update overwritten with a stale value.
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn modify_reg<F>(addr: usize, f: F)
where
    F: FnOnce(u32) -> u32,
{
    critical_section::with(|_| {
        // SAFETY: caller guarantees address validity
        let value = unsafe { read_reg(addr) };
        unsafe { write_reg(addr, f(value)) }
    });
}

/// Set bits in a register (read-modify-write)
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn set_bits(addr: usize, bits: u32) {
    // SAFETY: caller guarantees address validity
    unsafe { modify_reg(addr, |v| v | bits) }
}

/// Clear bits in a register (read-modify-write)
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn clear_bits(addr: usize, bits: u32) {
    // SAFETY: caller guarantees address validity
    unsafe { modify_reg(addr, |v| v & !bits) }
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods for a register of an instance block.
///
/// The surrounding type must carry a `base: usize` field.
///
/// # Example
/// ```ignore
/// impl UsartRegs {
///     reg_rw!(cr1, set_cr1, USART_CR1_OFFSET, "Control register 1");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            unsafe { $crate::internal::register::read_reg(self.base + $offset) }
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            unsafe { $crate::internal::register::write_reg(self.base + $offset, value) }
        }
    };
}

/// Generate a read-only accessor method for a register of an instance block.
macro_rules! reg_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            unsafe { $crate::internal::register::read_reg(self.base + $offset) }
        }
    };
}

/// Generate set/clear bit operation methods for a register of an instance block.
///
/// # Example
/// ```ignore
/// impl UsartRegs {
///     reg_bit_ops!(enable_txe_irq, disable_txe_irq, USART_CR1_OFFSET, USART_CR1_TXEIE,
///                  "transmit-empty interrupt", "Enable", "Disable");
/// }
/// ```
macro_rules! reg_bit_ops {
    ($set_fn:ident, $clear_fn:ident, $offset:expr, $bit:expr, $what:expr, $set_verb:expr, $clear_verb:expr) => {
        #[doc = concat!($set_verb, " ", $what)]
        #[inline(always)]
        pub fn $set_fn(&self) {
            unsafe { $crate::internal::register::set_bits(self.base + $offset, $bit) }
        }

        #[doc = concat!($clear_verb, " ", $what)]
        #[inline(always)]
        pub fn $clear_fn(&self) {
            unsafe { $crate::internal::register::clear_bits(self.base + $offset, $bit) }
        }
    };
}

/// Generate a bit check method (true when the bit is set).
macro_rules! reg_bit_check {
    ($fn:ident, $offset:expr, $bit:expr, $doc:expr) => {
        #[doc = $doc]
        #[inline(always)]
        pub fn $fn(&self) -> bool {
            unsafe { ($crate::internal::register::read_reg(self.base + $offset) & $bit) != 0 }
        }
    };
}

// Export macros for use in submodules
pub(crate) use reg_bit_check;
pub(crate) use reg_bit_ops;
pub(crate) use reg_ro;
pub(crate) use reg_rw;
