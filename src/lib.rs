//! STM32H7 USART Driver Core
//!
//! A `no_std`, `no_alloc` interrupt and DMA driven serial-port driver for up to
//! eleven USART/LPUART ports.
//!
//! The crate owns the part that is easy to get wrong: the handoff between
//! interrupt context and application code. Clocks, pins and baud rate are
//! configured by the board support code before [`PortRegistry::start`].
//!
//! # Architecture
//!
//! 1. **Driver Layer** ([`driver`]): receive rings, transmit slots, the
//!    interrupt service routine and the [`PortRegistry`] dispatch table
//! 2. **DMA Layer** ([`dma`]): one-shot DMA transmit and "arm, then poll"
//!    DMA receive directly on caller memory
//! 3. **HAL Layer** ([`hal`]): the [`UsartPeripheral`](hal::UsartPeripheral)
//!    and [`DmaStream`](hal::DmaStream) traits and their STM32H7 implementations
//!
//! ## Concurrency Model
//!
//! - Receive: the interrupt handler pushes, the application drains with that
//!   port's receive interrupt masked for a few instructions.
//! - Transmit: one payload in flight per port. `send` takes an atomic
//!   try-lock, copies, and enables the transmit-empty interrupt; the handler
//!   releases the lock when the slot is empty.
//! - Nothing blocks. Every call returns at once with success, `false`, or a
//!   partial count.
//!
//! # Port Ids
//!
//! | Id | Peripheral | Id | Peripheral |
//! |---|---|---|---|
//! | 0 | LPUART1 | 6 | USART6 |
//! | 1 | USART1 | 7 | UART7 |
//! | 2 | USART2 | 8 | UART8 |
//! | 3 | USART3 | 9 | UART9 |
//! | 4 | UART4 | 10 | USART10 |
//! | 5 | UART5 | | |
//!
//! # Features
//!
//! - `stm32h7` (default): Register-backed STM32H7 peripheral implementations
//! - `defmt`: Enable defmt formatting and startup logging
//! - `log`: Enable `log` facade messages
//!
//! # Example
//!
//! ```ignore
//! use ph_stm32_usart::{PortBinding, PortConfig, PortRegistry, usart_isr};
//! use ph_stm32_usart::hal::stm32h7::{DmaController, Stm32DmaStream, Stm32Usart};
//!
//! static PORTS: PortRegistry<Stm32Usart, Stm32DmaStream, 3> = PortRegistry::new(
//!     PortConfig::new(&[1, 2, 6]).with_dma_tx(&[6]),
//!     [
//!         PortBinding::new(Stm32Usart::for_port(1)),
//!         PortBinding::new(Stm32Usart::for_port(2)),
//!         PortBinding::with_dma(
//!             Stm32Usart::for_port(6),
//!             Some(Stm32DmaStream::tx_for_port(6, DmaController::Dma1, 0)),
//!             None,
//!         ),
//!     ],
//! );
//!
//! usart_isr!(USART1, PORTS, 1);
//! usart_isr!(USART2, PORTS, 2);
//! usart_isr!(USART6, PORTS, 6);
//!
//! static BANNER: [u8; 6] = *b"hello\n";
//!
//! fn main() {
//!     // clocks, pins, baud rate, UE/TE/RE ...
//!     PORTS.start();
//!     // unmask the NVIC lines ...
//!
//!     PORTS.send(1, b"ready\r\n");
//!     PORTS.send_dma(6, &BANNER);
//!
//!     let mut buf = [0u8; 32];
//!     loop {
//!         let n = PORTS.recv(2, &mut buf);
//!         if n > 0 {
//!             while !PORTS.send(1, &buf[..n]) {}
//!         }
//!     }
//! }
//! ```
//!
//! # Memory Requirements
//!
//! Per enabled port: `RX_N + TX_N` bytes of buffer plus a few words of
//! indices and counters. With the defaults (64 + 64) three ports use
//! under 500 bytes.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod dma;
pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use dma::{DmaChannel, DmaState};
pub use driver::config::{PortConfig, PortId, TxState};
pub use driver::error::{ConfigError, ConfigResult, Error, PortError, PortResult, Result};
pub use driver::interrupt::UsartStatus;
pub use driver::port::{Port, PortBinding};
pub use driver::registry::PortRegistry;
pub use driver::stats::PortStats;
pub use hal::{DmaStream, NoDma, UsartPeripheral};

/// Registry backed by the STM32H7 register blocks.
#[cfg(feature = "stm32h7")]
pub type Stm32Registry<
    const PORTS: usize,
    const RX_N: usize = { constants::DEFAULT_RX_CAPACITY },
    const TX_N: usize = { constants::DEFAULT_TX_CAPACITY },
> = PortRegistry<hal::stm32h7::Stm32Usart, hal::stm32h7::Stm32DmaStream, PORTS, RX_N, TX_N>;

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer the driver APIs instead of touching registers directly.
///
/// # Safety
///
/// Direct register access bypasses driver invariants. Writing the interrupt
/// enable bits of a port the registry owns will desynchronize it from its
/// transmit lock.
#[cfg(feature = "stm32h7")]
pub mod unsafe_registers {
    pub use crate::internal::register::dma::DmaStreamRegs;
    pub use crate::internal::register::usart::UsartRegs;
}

/// Shared driver constants.
pub mod constants {
    pub use crate::internal::constants::{
        DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY, DMA_MAX_TRANSFER, MAX_PORT_ID, MAX_PORTS,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Define the interrupt entry point of one port.
///
/// Expands to a parameterless `extern "C"` function named `$name` that
/// services `$port` on `$registry`. Wire it into the vector table the way
/// your runtime does (for `cortex-m-rt`, name it after the interrupt).
///
/// # Examples
///
/// ```ignore
/// ph_stm32_usart::usart_isr!(USART1, PORTS, 1);
/// ph_stm32_usart::usart_isr!(LPUART1, PORTS, 0);
/// ```
#[macro_export]
macro_rules! usart_isr {
    ($name:ident, $registry:path, $port:expr) => {
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn $name() {
            $registry.on_interrupt($port);
        }
    };
}
