//! Synchronization primitives for ISR-safe access.
//!
//! Low-level primitives shared by the interrupt-driven channels and the DMA
//! bookkeeping.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};
use critical_section::Mutex;

use crate::hal::UsartPeripheral;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

/// Single-owner flag with a non-blocking acquire.
///
/// Used as the transmit lock: the application acquires it when a send is
/// accepted, the interrupt handler releases it when the slot has drained.
/// Relaxed ordering is enough for the flag itself; the payload handoff is
/// ordered separately by the channel's byte count.
#[derive(Debug)]
pub struct ExclusiveFlag {
    held: AtomicBool,
}

impl ExclusiveFlag {
    /// Create a released flag.
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Try to take ownership. Returns `false` if someone already holds it.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        !self.held.swap(true, Ordering::Relaxed)
    }

    /// Give up ownership.
    #[inline]
    pub fn release(&self) {
        self.held.store(false, Ordering::Relaxed);
    }

    /// Check whether the flag is currently held.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

impl Default for ExclusiveFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Masks one port's receive interrupt for as long as it lives.
///
/// Narrower than a global critical section: other ports and the transmit
/// path of this port keep running. The previous mask state is restored on
/// drop, so a port whose receive interrupt was already off (DMA receive)
/// stays off.
pub struct RxMaskGuard<'a, U: UsartPeripheral> {
    usart: &'a U,
    was_enabled: bool,
}

impl<'a, U: UsartPeripheral> RxMaskGuard<'a, U> {
    /// Mask the receive interrupt of `usart`.
    #[inline]
    pub fn new(usart: &'a U) -> Self {
        let was_enabled = usart.rx_interrupt_enabled();
        if was_enabled {
            usart.set_rx_interrupt(false);
        }
        Self { usart, was_enabled }
    }
}

impl<U: UsartPeripheral> Drop for RxMaskGuard<'_, U> {
    #[inline]
    fn drop(&mut self) {
        if self.was_enabled {
            self.usart.set_rx_interrupt(true);
        }
    }
}
