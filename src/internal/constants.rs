//! Centralized Constants
//!
//! This module provides a single source of truth for the capacities, limits and
//! sentinel values used throughout the USART driver.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Port ids**: Logical port range and lookup-table sentinels
//! - **Buffer sizes**: Default ring and slot capacities
//!
//! # Note
//!
//! Hardware register bit definitions remain in their respective modules
//! (`register/usart.rs`, `register/dma.rs`) as they are specific to those
//! hardware blocks.

// =============================================================================
// Port Ids
// =============================================================================

/// Number of logical port ids (LPUART1 plus USART/UART 1..=10)
pub const MAX_PORTS: usize = 11;

/// Highest valid logical port id
pub const MAX_PORT_ID: u8 = (MAX_PORTS - 1) as u8;

/// Lookup-table entry for an id that is not in the enabled set
pub const NO_SLOT: u8 = u8::MAX;

// =============================================================================
// Buffer Sizes
// =============================================================================

/// Default receive ring capacity in bytes (one slot stays reserved)
pub const DEFAULT_RX_CAPACITY: usize = 64;

/// Default transmit slot capacity in bytes
pub const DEFAULT_TX_CAPACITY: usize = 64;

/// Largest transfer the DMA stream counter can describe (NDTR is 16 bits)
pub const DMA_MAX_TRANSFER: usize = 0xFFFF;
