//! Per-port event counters.
//!
//! Written from the interrupt handler, read from application code. Counters
//! wrap on overflow.

use core::sync::atomic::{AtomicU32, Ordering};

/// Snapshot of one port's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortStats {
    /// Hardware overruns (a byte arrived before the previous one was read)
    pub overruns: u32,
    /// Bytes dropped because the receive ring was full
    pub rx_dropped: u32,
    /// Framing, noise and parity errors
    pub line_errors: u32,
}

impl PortStats {
    /// Total number of bytes lost to overrun or a full ring
    #[inline]
    pub const fn lost_bytes(&self) -> u32 {
        self.overruns.wrapping_add(self.rx_dropped)
    }
}

/// Live counters backing [`PortStats`].
#[derive(Debug)]
pub(crate) struct PortCounters {
    overruns: AtomicU32,
    rx_dropped: AtomicU32,
    line_errors: AtomicU32,
}

impl PortCounters {
    pub(crate) const fn new() -> Self {
        Self {
            overruns: AtomicU32::new(0),
            rx_dropped: AtomicU32::new(0),
            line_errors: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rx_dropped(&self) {
        self.rx_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_line_error(&self) {
        self.line_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PortStats {
        PortStats {
            overruns: self.overruns.load(Ordering::Relaxed),
            rx_dropped: self.rx_dropped.load(Ordering::Relaxed),
            line_errors: self.line_errors.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        self.overruns.store(0, Ordering::Relaxed);
        self.rx_dropped.store(0, Ordering::Relaxed);
        self.line_errors.store(0, Ordering::Relaxed);
    }
}
