//! Synchronization and Concurrency Support
//!
//! Primitives shared between application code and interrupt handlers:
//!
//! - [`CriticalSectionCell`] - ISR-safe interior mutability
//! - [`ExclusiveFlag`] - non-blocking single-owner lock
//! - [`RxMaskGuard`] - per-port receive interrupt mask (RAII)
//!
//! # Example
//!
//! ```ignore
//! use ph_stm32_usart::sync::RxMaskGuard;
//!
//! {
//!     let _guard = RxMaskGuard::new(&usart);
//!     // receive interrupt of this port is masked here
//! }
//! // and restored here
//! ```

mod primitives;

pub use primitives::{CriticalSectionCell, ExclusiveFlag, RxMaskGuard};
