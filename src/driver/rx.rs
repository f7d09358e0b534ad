//! Interrupt-fed receive ring.
//!
//! Single producer (the port's interrupt handler) and single consumer
//! (application code). One slot is always left empty, so a ring of `N`
//! bytes holds at most `N - 1`. When full, the newest byte is dropped and
//! the caller counts it.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::hal::UsartPeripheral;
use crate::sync::RxMaskGuard;

/// Receive ring of `N` bytes (`N` a power of two).
///
/// Any other `N` is rejected at compile time:
///
/// ```compile_fail
/// use ph_stm32_usart::driver::RxChannel;
///
/// static RING: RxChannel<48> = RxChannel::new();
/// ```
pub struct RxChannel<const N: usize> {
    buffer: UnsafeCell<[u8; N]>,
    /// Next write position, owned by the producer
    head: AtomicUsize,
    /// Next read position, owned by the consumer
    tail: AtomicUsize,
}

// SAFETY: `head` is only advanced by the producer and `tail` only by the
// consumer. The producer writes a slot before publishing it with a Release
// store of `head`; the consumer only reads slots in `[tail, head)` after an
// Acquire load, and the producer never writes inside that range.
unsafe impl<const N: usize> Sync for RxChannel<N> {}

impl<const N: usize> RxChannel<N> {
    const MASK: usize = N - 1;

    /// Create an empty ring.
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two(), "capacity must be a power of two") };
        Self {
            buffer: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Ring size in bytes
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append one byte (interrupt context).
    ///
    /// Returns `false` and leaves the ring untouched when it is full.
    #[inline]
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & Self::MASK;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        // SAFETY: `head` is outside the consumer's readable range.
        unsafe { self.buffer.get().cast::<u8>().add(head).write(byte) };
        self.head.store(next, Ordering::Release);
        true
    }

    /// Copy up to `dst.len()` buffered bytes into `dst`, oldest first.
    ///
    /// Runs with the port's receive interrupt masked. Handles wraparound in
    /// at most two contiguous copies.
    pub fn drain<U: UsartPeripheral>(&self, usart: &U, dst: &mut [u8]) -> usize {
        let _guard = RxMaskGuard::new(usart);

        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        let count = dst.len().min(Self::distance(head, tail));
        if count == 0 {
            return 0;
        }

        let first = count.min(N - tail);
        let base = self.buffer.get().cast::<u8>().cast_const();
        // SAFETY: `[tail, tail + count)` (mod N) lies inside `[tail, head)`,
        // which the producer does not write.
        unsafe {
            core::ptr::copy_nonoverlapping(base.add(tail), dst.as_mut_ptr(), first);
            if count > first {
                core::ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), count - first);
            }
        }

        self.tail.store((tail + count) & Self::MASK, Ordering::Release);
        count
    }

    /// Take the oldest buffered byte. Returns `false` if the ring is empty.
    #[inline]
    pub fn get_one<U: UsartPeripheral>(&self, usart: &U, byte: &mut u8) -> bool {
        self.drain(usart, core::slice::from_mut(byte)) == 1
    }

    /// Number of buffered bytes, sampled with the receive interrupt masked.
    pub fn available<U: UsartPeripheral>(&self, usart: &U) -> usize {
        let _guard = RxMaskGuard::new(usart);
        Self::distance(self.head.load(Ordering::Acquire), self.tail.load(Ordering::Relaxed))
    }

    /// Start address of the ring storage.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.get().cast::<u8>().cast_const()
    }

    /// Discard all buffered bytes.
    ///
    /// Only call while the port's interrupt cannot run.
    pub(crate) fn reset(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
    }

    #[inline]
    const fn distance(head: usize, tail: usize) -> usize {
        head.wrapping_sub(tail) & Self::MASK
    }
}

impl<const N: usize> Default for RxChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}
