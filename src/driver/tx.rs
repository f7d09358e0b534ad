//! Interrupt-drained transmit slot.
//!
//! One transmission at a time. [`TxChannel::try_send`] copies the payload
//! into the slot and enables the transmit-empty interrupt; the handler then
//! moves one byte per interrupt until the slot is empty, masks the
//! interrupt and releases the lock.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::driver::config::TxState;
use crate::hal::UsartPeripheral;
use crate::sync::ExclusiveFlag;

/// Transmit slot of `N` bytes (`N` a power of two).
///
/// Any other `N` is rejected at compile time:
///
/// ```compile_fail
/// use ph_stm32_usart::driver::TxChannel;
///
/// static SLOT: TxChannel<48> = TxChannel::new();
/// ```
pub struct TxChannel<const N: usize> {
    buffer: UnsafeCell<[u8; N]>,
    lock: ExclusiveFlag,
    /// Next byte to send
    cursor: AtomicUsize,
    /// Bytes left to send
    count: AtomicUsize,
}

// SAFETY: the application writes the buffer only after acquiring `lock`,
// which is held until the handler has sent every byte. The handler reads
// the buffer only after observing a non-zero `count` (Acquire), which the
// application publishes after the copy (Release).
unsafe impl<const N: usize> Sync for TxChannel<N> {}

impl<const N: usize> TxChannel<N> {
    const MASK: usize = N - 1;

    /// Create an idle slot.
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two(), "capacity must be a power of two") };
        Self {
            buffer: UnsafeCell::new([0; N]),
            lock: ExclusiveFlag::new(),
            cursor: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
        }
    }

    /// Slot size in bytes; longer payloads are truncated to this.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Start transmitting `data` (truncated to `N` bytes).
    ///
    /// Returns `false` without touching the slot if a transmission is
    /// already in flight. Never blocks.
    pub fn try_send<U: UsartPeripheral>(&self, usart: &U, data: &[u8]) -> bool {
        if !self.lock.try_acquire() {
            return false;
        }

        let len = data.len().min(N);
        // SAFETY: the lock is ours and the handler only reads while
        // `count > 0`, which is still zero here.
        unsafe {
            core::ptr::copy_nonoverlapping(data.as_ptr(), self.buffer.get().cast::<u8>(), len);
        }
        self.cursor.store(0, Ordering::Relaxed);
        self.count.store(len, Ordering::Release);
        usart.set_tx_interrupt(true);
        true
    }

    /// Start transmitting a single byte.
    #[inline]
    pub fn put_one<U: UsartPeripheral>(&self, usart: &U, byte: u8) -> bool {
        self.try_send(usart, &[byte])
    }

    /// One transmit-empty interrupt step (interrupt context).
    ///
    /// Writes the next byte, or, when nothing is left, masks the interrupt
    /// and returns the slot to idle.
    pub fn drain_step<U: UsartPeripheral>(&self, usart: &U) {
        let count = self.count.load(Ordering::Acquire);
        if count > 0 {
            let cursor = self.cursor.load(Ordering::Relaxed);
            // SAFETY: `cursor < N`; the application does not write while
            // the lock is held.
            let byte = unsafe { self.buffer.get().cast::<u8>().add(cursor).read() };
            usart.write_byte(byte);
            self.cursor.store((cursor + 1) & Self::MASK, Ordering::Relaxed);
            self.count.store(count - 1, Ordering::Relaxed);
        } else {
            usart.set_tx_interrupt(false);
            self.lock.release();
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> TxState {
        if self.lock.is_held() {
            TxState::Sending
        } else {
            TxState::Idle
        }
    }

    /// Check if a send would currently be accepted
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state() == TxState::Idle
    }

    /// Bytes still waiting to be written
    #[inline]
    pub fn pending(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Abandon any transmission and return to idle.
    ///
    /// Only call while the port's interrupt cannot run.
    pub(crate) fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.cursor.store(0, Ordering::Relaxed);
        self.lock.release();
    }
}

impl<const N: usize> Default for TxChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockUsart;

    /// Run drain steps the way the interrupt would, until the slot is idle.
    fn run_to_idle<const N: usize>(tx: &TxChannel<N>, usart: &MockUsart) -> usize {
        let mut steps = 0;
        while usart.tx_interrupt_enabled() {
            tx.drain_step(usart);
            steps += 1;
        }
        steps
    }

    #[test]
    fn new_slot_is_idle() {
        let tx: TxChannel<64> = TxChannel::new();
        assert!(tx.is_idle());
        assert_eq!(tx.pending(), 0);
        assert_eq!(tx.capacity(), 64);
    }

    #[test]
    fn send_enables_interrupt_and_drains_in_order() {
        let usart = MockUsart::new();
        let tx: TxChannel<64> = TxChannel::new();

        assert!(tx.try_send(&usart, b"hello"));
        assert_eq!(tx.state(), TxState::Sending);
        assert!(usart.tx_interrupt_enabled());

        // Five bytes plus the final step that masks the interrupt.
        assert_eq!(run_to_idle(&tx, &usart), 6);
        assert_eq!(usart.transmitted(), b"hello");
        assert!(tx.is_idle());
    }

    #[test]
    fn second_send_while_busy_is_rejected() {
        let usart = MockUsart::new();
        let tx: TxChannel<64> = TxChannel::new();

        assert!(tx.try_send(&usart, b"abc"));
        tx.drain_step(&usart);

        assert!(!tx.try_send(&usart, b"xyz"));
        assert_eq!(tx.pending(), 2);
        assert_eq!(tx.cursor.load(Ordering::Relaxed), 1);

        run_to_idle(&tx, &usart);
        assert_eq!(usart.transmitted(), b"abc");
    }

    #[test]
    fn oversize_payload_is_truncated() {
        let usart = MockUsart::new();
        let tx: TxChannel<64> = TxChannel::new();
        let data: [u8; 100] = core::array::from_fn(|i| i as u8);

        assert!(tx.try_send(&usart, &data));
        assert_eq!(tx.pending(), 64);

        run_to_idle(&tx, &usart);
        assert_eq!(usart.transmitted(), &data[..64]);
    }

    #[test]
    fn send_accepted_again_after_drain() {
        let usart = MockUsart::new();
        let tx: TxChannel<8> = TxChannel::new();

        assert!(tx.try_send(&usart, b"a"));
        run_to_idle(&tx, &usart);
        assert!(tx.try_send(&usart, b"b"));
        run_to_idle(&tx, &usart);

        assert_eq!(usart.transmitted(), b"ab");
    }

    #[test]
    fn put_one_sends_single_byte() {
        let usart = MockUsart::new();
        let tx: TxChannel<8> = TxChannel::new();

        assert!(tx.put_one(&usart, b'!'));
        assert!(!tx.put_one(&usart, b'?'));
        run_to_idle(&tx, &usart);
        assert_eq!(usart.transmitted(), b"!");
    }

    #[test]
    fn empty_send_completes_in_one_step() {
        let usart = MockUsart::new();
        let tx: TxChannel<8> = TxChannel::new();

        assert!(tx.try_send(&usart, &[]));
        assert_eq!(run_to_idle(&tx, &usart), 1);
        assert!(usart.transmitted().is_empty());
    }

    #[test]
    fn reset_releases_lock() {
        let usart = MockUsart::new();
        let tx: TxChannel<8> = TxChannel::new();
        tx.try_send(&usart, b"data");
        tx.reset();
        assert!(tx.is_idle());
        assert_eq!(tx.pending(), 0);
    }
}
