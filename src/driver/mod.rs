//! Core driver components for the USART ports.
//!
//! This module contains the building blocks shared between application code
//! and the per-port interrupt handlers:
//!
//! - [`config`] - Port ids, enabled-port configuration and transmit state
//! - [`error`] - Error types and result aliases
//! - [`rx`] - Interrupt-fed receive ring
//! - [`tx`] - Interrupt-drained transmit slot
//! - [`interrupt`] - Status parsing and the interrupt service routine
//! - [`stats`] - Per-port fault counters
//! - [`port`] - Per-port bindings, state and the resolved [`Port`] handle
//! - [`registry`] - The [`PortRegistry`] and its numeric-id API
//!
//! # Example
//!
//! ```ignore
//! use ph_stm32_usart::driver::{PortConfig, ConfigError};
//!
//! const CONFIG: PortConfig = PortConfig::new(&[1, 2, 6]).with_dma_tx(&[6]);
//! assert_eq!(CONFIG.validate(), Ok(()));
//! ```

// Submodules
pub mod config;
pub mod error;
pub mod interrupt;
pub mod port;
pub mod registry;
pub mod rx;
pub mod stats;
pub mod tx;

// Re-exports for convenience
pub use config::{PortConfig, PortId, TxState};
pub use error::{ConfigError, ConfigResult, Error, PortError, PortResult, Result};
pub use interrupt::UsartStatus;
pub use port::{Port, PortBinding};
pub use registry::PortRegistry;
pub use rx::RxChannel;
pub use stats::PortStats;
pub use tx::TxChannel;
