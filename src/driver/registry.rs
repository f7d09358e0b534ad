//! Port registry and the numeric-id public API.
//!
//! [`PortRegistry`] owns every enabled port's bindings and state in fixed
//! arrays, built by a `const fn` so the whole registry can be a `static`.
//! Calls keyed by a raw port id are resolved through [`PortRegistry::dispatch`];
//! ids outside the enabled set get the documented sentinel instead:
//!
//! | Operation | Disabled-port result |
//! |---|---|
//! | `rx_ptr` | null |
//! | `send`, `putc`, `getc`, `send_dma`, `abort_recv_dma`, `dma_tx_busy` | `false` |
//! | `recv`, `available`, `recv_dma` | `0` |
//! | `stats` | `None` |
//! | `on_interrupt` | no-op |

#[cfg(feature = "log")]
use log::info;

use crate::driver::config::{PortConfig, PortId};
use crate::driver::error::{ConfigError, ConfigResult, PortError, PortResult};
use crate::driver::interrupt::UsartStatus;
use crate::driver::port::{Port, PortBinding, PortState};
use crate::driver::stats::PortStats;
use crate::hal::{DmaStream, UsartPeripheral};
use crate::internal::constants::{DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY, MAX_PORTS, NO_SLOT};

/// Compile-time table of enabled ports.
///
/// - `U`: USART peripheral type
/// - `D`: DMA stream type ([`NoDma`](crate::hal::NoDma) when no port uses DMA)
/// - `PORTS`: number of enabled ports
/// - `RX_N` / `TX_N`: receive ring and transmit slot capacity (powers of two)
///
/// # Example
///
/// ```ignore
/// use ph_stm32_usart::{PortBinding, PortConfig, PortRegistry};
/// use ph_stm32_usart::hal::{stm32h7::Stm32Usart, NoDma};
///
/// static PORTS: PortRegistry<Stm32Usart, NoDma, 3> = PortRegistry::new(
///     PortConfig::new(&[1, 2, 6]),
///     [
///         PortBinding::new(Stm32Usart::for_port(1)),
///         PortBinding::new(Stm32Usart::for_port(2)),
///         PortBinding::new(Stm32Usart::for_port(6)),
///     ],
/// );
///
/// fn main() {
///     PORTS.start();
///     // unmask USART1/USART2/USART6 in the NVIC here
///     PORTS.send(1, b"hello");
/// }
/// ```
pub struct PortRegistry<
    U,
    D,
    const PORTS: usize,
    const RX_N: usize = DEFAULT_RX_CAPACITY,
    const TX_N: usize = DEFAULT_TX_CAPACITY,
> {
    config: PortConfig,
    /// Logical id to slot index, [`NO_SLOT`] when disabled
    slots: [u8; MAX_PORTS],
    bindings: [PortBinding<U, D>; PORTS],
    ports: [PortState<RX_N, TX_N>; PORTS],
}

impl<U, D, const PORTS: usize, const RX_N: usize, const TX_N: usize>
    PortRegistry<U, D, PORTS, RX_N, TX_N>
{
    /// Build the registry. `bindings[i]` serves `config.enabled[i]`.
    ///
    /// # Panics
    ///
    /// Panics with the [`ConfigError`] message if the configuration, the
    /// capacities or the bindings are inconsistent. In a `static`
    /// initializer this is a compile error.
    pub const fn new(config: PortConfig, bindings: [PortBinding<U, D>; PORTS]) -> Self {
        let slots = match Self::check(&config, &bindings) {
            Ok(slots) => slots,
            Err(err) => panic!("{}", err.as_str()),
        };
        Self {
            config,
            slots,
            bindings,
            ports: [const { PortState::new() }; PORTS],
        }
    }

    /// Validate everything `new` relies on and build the slot table.
    pub const fn check(
        config: &PortConfig,
        bindings: &[PortBinding<U, D>; PORTS],
    ) -> ConfigResult<[u8; MAX_PORTS]> {
        if let Err(err) = config.validate() {
            return Err(err);
        }
        if config.port_count() != PORTS {
            return Err(ConfigError::PortCountMismatch);
        }
        if !RX_N.is_power_of_two() || !TX_N.is_power_of_two() {
            return Err(ConfigError::CapacityNotPowerOfTwo);
        }

        let mut slots = [NO_SLOT; MAX_PORTS];
        let mut i = 0;
        while i < PORTS {
            let port = config.enabled[i];
            if bindings[i].dma_tx.is_some() != config.uses_dma_tx(port)
                || bindings[i].dma_rx.is_some() != config.uses_dma_rx(port)
            {
                return Err(ConfigError::DmaBindingMismatch);
            }
            slots[port as usize] = i as u8;
            i += 1;
        }
        Ok(slots)
    }

    /// The configuration this registry was built from
    pub const fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Check if `port` is enabled
    pub fn is_enabled(&self, port: u8) -> bool {
        self.slot(port).is_some()
    }

    fn slot(&self, port: u8) -> Option<usize> {
        match self.slots.get(usize::from(port)) {
            Some(&slot) if slot != NO_SLOT => Some(usize::from(slot)),
            _ => None,
        }
    }
}

impl<U, D, const PORTS: usize, const RX_N: usize, const TX_N: usize>
    PortRegistry<U, D, PORTS, RX_N, TX_N>
where
    U: UsartPeripheral,
    D: DmaStream,
{
    /// Resolve a raw id to its port, or `None` if it is not enabled.
    pub fn dispatch(&self, port: u8) -> Option<Port<'_, U, D, RX_N, TX_N>> {
        let slot = self.slot(port)?;
        let id = PortId::new(port)?;
        Some(Port::new(id, self.bindings.get(slot)?, self.ports.get(slot)?))
    }

    /// Bring every enabled port to its initial state.
    ///
    /// Resets rings, slots, DMA bookkeeping and counters; stops the DMA
    /// streams; clears stale error flags; programs the DMA requests; and
    /// enables the receive interrupt on ports that receive without DMA.
    /// Call once, before unmasking the USART lines in the NVIC.
    pub fn start(&self) {
        critical_section::with(|_cs| {
            for (binding, state) in self.bindings.iter().zip(self.ports.iter()) {
                let usart = &binding.usart;
                usart.set_tx_interrupt(false);
                usart.set_rx_interrupt(false);
                if let Some(stream) = &binding.dma_tx {
                    stream.stop();
                }
                if let Some(stream) = &binding.dma_rx {
                    stream.stop();
                }
                state.reset();
                usart.clear_errors(UsartStatus::ALL_ERRORS);
                usart.set_dma_requests(binding.dma_tx.is_some(), binding.dma_rx.is_some());
                usart.set_rx_interrupt(binding.dma_rx.is_none());
            }
        });

        #[cfg(feature = "defmt")]
        defmt::info!(
            "usart: {} ports started (rx {}B, tx {}B)",
            PORTS,
            RX_N,
            TX_N
        );
        #[cfg(feature = "log")]
        info!(
            "usart: ports {:?} started (dma tx {:?}, dma rx {:?})",
            self.config.enabled, self.config.dma_tx, self.config.dma_rx
        );
    }

    /// Service `port`'s interrupt. Call from the port's vector.
    #[inline]
    pub fn on_interrupt(&self, port: u8) {
        if let Some(p) = self.dispatch(port) {
            p.on_interrupt();
        }
    }

    // -------------------------------------------------------------------------
    // Interrupt-driven path
    // -------------------------------------------------------------------------

    /// Start of `port`'s receive ring storage, or null if disabled.
    ///
    /// Not position-aware and not synchronized with the interrupt handler.
    pub fn rx_ptr(&self, port: u8) -> *const u8 {
        self.dispatch(port).map_or(core::ptr::null(), |p| p.rx_ptr())
    }

    /// Queue `data` on `port` (truncated to `TX_N` bytes).
    ///
    /// `false` if the port is disabled or already sending.
    pub fn send(&self, port: u8, data: &[u8]) -> bool {
        self.dispatch(port).is_some_and(|p| p.send(data))
    }

    /// Queue `data` on `port`, reporting why it was refused.
    ///
    /// # Errors
    ///
    /// [`PortError::DisabledPort`] or [`PortError::Busy`].
    pub fn try_send(&self, port: u8, data: &[u8]) -> PortResult<()> {
        self.dispatch(port).ok_or(PortError::DisabledPort)?.try_send(data)
    }

    /// Copy up to `buf.len()` received bytes. `0` if disabled.
    pub fn recv(&self, port: u8, buf: &mut [u8]) -> usize {
        self.dispatch(port).map_or(0, |p| p.recv(buf))
    }

    /// Received bytes waiting on `port`. `0` if disabled.
    pub fn available(&self, port: u8) -> usize {
        self.dispatch(port).map_or(0, |p| p.available())
    }

    /// Queue one byte. `false` if disabled or busy.
    pub fn putc(&self, port: u8, byte: u8) -> bool {
        self.dispatch(port).is_some_and(|p| p.putc(byte))
    }

    /// Take one received byte into `byte`. `false` if disabled or empty.
    pub fn getc(&self, port: u8, byte: &mut u8) -> bool {
        self.dispatch(port).is_some_and(|p| p.getc(byte))
    }

    /// Fault counters of `port`, `None` if disabled.
    pub fn stats(&self, port: u8) -> Option<PortStats> {
        self.dispatch(port).map(|p| p.stats())
    }

    // -------------------------------------------------------------------------
    // DMA path
    // -------------------------------------------------------------------------

    /// Start a DMA transmission of `data` on `port`.
    ///
    /// `data` is read in the background until [`Self::dma_tx_busy`]
    /// returns `false`. `false` if disabled, not in the DMA TX subset, or
    /// still busy.
    pub fn send_dma(&self, port: u8, data: &'static [u8]) -> bool {
        self.try_send_dma(port, data).is_ok()
    }

    /// Start a DMA transmission, reporting why it was refused.
    ///
    /// # Errors
    ///
    /// [`PortError::DisabledPort`], [`PortError::DmaUnavailable`] or
    /// [`PortError::Busy`].
    pub fn try_send_dma(&self, port: u8, data: &'static [u8]) -> PortResult<()> {
        self.dispatch(port).ok_or(PortError::DisabledPort)?.try_send_dma(data)
    }

    /// Arm or poll DMA reception on `port` ("arm, then poll").
    ///
    /// Returns 0 on arming, while running, on a disabled or non-DMA port,
    /// and when polled with a different buffer than the armed one.
    ///
    /// # Safety
    ///
    /// From arming until the call that returns the byte count, `buf` must
    /// stay alive and untouched, and every poll must pass the same buffer.
    pub unsafe fn recv_dma(&self, port: u8, buf: &mut [u8]) -> usize {
        // SAFETY: forwarded caller contract.
        unsafe { self.try_recv_dma(port, buf) }.unwrap_or(0)
    }

    /// Arm or poll DMA reception, reporting why a call was refused.
    ///
    /// # Errors
    ///
    /// [`PortError::DisabledPort`], [`PortError::DmaUnavailable`] or
    /// [`PortError::InvalidBuffer`].
    ///
    /// # Safety
    ///
    /// Same contract as [`Self::recv_dma`].
    pub unsafe fn try_recv_dma(&self, port: u8, buf: &mut [u8]) -> PortResult<usize> {
        let p = self.dispatch(port).ok_or(PortError::DisabledPort)?;
        // SAFETY: forwarded caller contract.
        unsafe { p.try_recv_dma(buf) }
    }

    /// Stop an armed DMA reception early; the next poll returns what
    /// arrived. `false` if nothing was armed.
    pub fn abort_recv_dma(&self, port: u8) -> bool {
        self.dispatch(port).is_some_and(|p| p.abort_recv_dma())
    }

    /// Check if a DMA transmission is still running on `port`.
    pub fn dma_tx_busy(&self, port: u8) -> bool {
        self.dispatch(port).is_some_and(|p| p.dma_tx_busy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::TxState;
    use crate::hal::NoDma;
    use crate::testing::{MockDma, MockUsart};

    static FRAME: [u8; 4] = *b"DMA!";

    type Registry = PortRegistry<MockUsart, NoDma, 3>;
    type DmaRegistry = PortRegistry<MockUsart, MockDma, 2, 16, 16>;

    fn registry() -> Registry {
        let registry = PortRegistry::new(
            PortConfig::new(&[1, 2, 6]),
            [
                PortBinding::new(MockUsart::new()),
                PortBinding::new(MockUsart::new()),
                PortBinding::new(MockUsart::new()),
            ],
        );
        registry.start();
        registry
    }

    fn dma_registry() -> DmaRegistry {
        let registry = PortRegistry::new(
            PortConfig::new(&[1, 6]).with_dma_tx(&[6]).with_dma_rx(&[6]),
            [
                PortBinding::new(MockUsart::new()),
                PortBinding::with_dma(MockUsart::new(), Some(MockDma::new()), Some(MockDma::new())),
            ],
        );
        registry.start();
        registry
    }

    fn usart(registry: &Registry, port: u8) -> &MockUsart {
        let slot = registry.slot(port).unwrap();
        &registry.bindings[slot].usart
    }

    fn drain_tx(registry: &Registry, port: u8) {
        while usart(registry, port).tx_interrupt_enabled() {
            registry.on_interrupt(port);
        }
    }

    #[test]
    fn dispatch_resolves_enabled_ports_only() {
        let registry = registry();
        for port in [1, 2, 6] {
            assert_eq!(registry.dispatch(port).unwrap().id().raw(), port);
            assert!(registry.is_enabled(port));
        }
        for port in [0, 3, 4, 5, 7, 8, 9, 10, 11, 255] {
            assert!(registry.dispatch(port).is_none());
        }
    }

    #[test]
    fn start_enables_receive_interrupts() {
        let registry = registry();
        for port in [1, 2, 6] {
            let usart = usart(&registry, port);
            assert!(usart.rx_interrupt_enabled());
            assert!(!usart.tx_interrupt_enabled());
            assert_eq!(usart.dma_requests(), (false, false));
        }
    }

    #[test]
    fn disabled_port_returns_sentinels() {
        let registry = registry();
        let mut buf = [0u8; 8];
        let mut byte = 0xEE;

        for port in [0, 3, 11] {
            assert!(registry.rx_ptr(port).is_null());
            assert!(!registry.send(port, b"x"));
            assert_eq!(registry.recv(port, &mut buf), 0);
            assert_eq!(registry.available(port), 0);
            assert!(!registry.putc(port, b'x'));
            assert!(!registry.getc(port, &mut byte));
            assert!(!registry.send_dma(port, &FRAME));
            assert_eq!(unsafe { registry.recv_dma(port, &mut buf) }, 0);
            assert!(!registry.abort_recv_dma(port));
            assert!(!registry.dma_tx_busy(port));
            assert_eq!(registry.stats(port), None);
            registry.on_interrupt(port);
        }

        assert_eq!(byte, 0xEE);
        assert_eq!(buf, [0u8; 8]);
        assert_eq!(registry.try_send(3, b"x"), Err(PortError::DisabledPort));
    }

    #[test]
    fn send_and_drain_through_interrupts() {
        let registry = registry();

        assert!(registry.send(2, b"hello"));
        assert!(!registry.send(2, b"again"));
        assert_eq!(registry.try_send(2, b"again"), Err(PortError::Busy));

        drain_tx(&registry, 2);
        assert_eq!(usart(&registry, 2).transmitted(), b"hello");
        assert_eq!(registry.dispatch(2).unwrap().tx_state(), TxState::Idle);
        assert!(registry.send(2, b"again"));
    }

    #[test]
    fn ports_are_independent() {
        let registry = registry();

        assert!(registry.send(1, b"one"));
        assert!(registry.send(6, b"six"));
        usart(&registry, 6).feed(b"z");
        registry.on_interrupt(6);

        drain_tx(&registry, 1);
        assert_eq!(usart(&registry, 1).transmitted(), b"one");
        // Port 6 got one transmit-empty step alongside its receive event.
        assert_eq!(usart(&registry, 6).transmitted(), b"s");
        assert_eq!(registry.available(1), 0);
        assert_eq!(registry.available(6), 1);
    }

    #[test]
    fn receive_through_interrupts() {
        let registry = registry();
        for b in b"AT\r" {
            usart(&registry, 1).feed(&[*b]);
            registry.on_interrupt(1);
        }

        assert_eq!(registry.available(1), 3);
        let mut byte = 0;
        assert!(registry.getc(1, &mut byte));
        assert_eq!(byte, b'A');

        let mut buf = [0u8; 4];
        assert_eq!(registry.recv(1, &mut buf), 2);
        assert_eq!(&buf[..2], b"T\r");
    }

    #[test]
    fn putc_sends_one_byte() {
        let registry = registry();
        assert!(registry.putc(6, b'#'));
        assert!(!registry.putc(6, b'#'));
        drain_tx(&registry, 6);
        assert_eq!(usart(&registry, 6).transmitted(), b"#");
    }

    #[test]
    fn overrun_is_counted() {
        let registry = registry();
        let usart = usart(&registry, 1);
        usart.feed(&[0x55]);
        usart.inject_overrun();
        registry.on_interrupt(1);

        assert_eq!(registry.available(1), 0);
        assert_eq!(registry.stats(1).unwrap().overruns, 1);
    }

    #[test]
    fn start_resets_state() {
        let registry = registry();
        usart(&registry, 1).feed(&[1, 2]);
        registry.on_interrupt(1);
        registry.send(1, b"pending");

        registry.start();
        assert_eq!(registry.available(1), 0);
        assert!(registry.send(1, b"fresh"));
    }

    #[test]
    fn start_programs_dma_requests() {
        let registry = dma_registry();
        let plain = &registry.bindings[0].usart;
        let dma = &registry.bindings[1].usart;

        assert_eq!(plain.dma_requests(), (false, false));
        assert!(plain.rx_interrupt_enabled());
        assert_eq!(dma.dma_requests(), (true, true));
        assert!(!dma.rx_interrupt_enabled());
    }

    #[test]
    fn dma_send_on_dma_port() {
        let registry = dma_registry();

        assert!(registry.send_dma(6, &FRAME));
        assert!(registry.dma_tx_busy(6));
        assert!(!registry.send_dma(6, &FRAME));

        let stream = registry.bindings[1].dma_tx.as_ref().unwrap();
        stream.complete();
        assert!(!registry.dma_tx_busy(6));
        assert!(registry.send_dma(6, &FRAME));
    }

    #[test]
    fn dma_calls_on_non_dma_port_return_sentinels() {
        let registry = dma_registry();
        let mut buf = [0u8; 4];

        assert!(!registry.send_dma(1, &FRAME));
        assert_eq!(registry.try_send_dma(1, &FRAME), Err(PortError::DmaUnavailable));
        assert_eq!(unsafe { registry.recv_dma(1, &mut buf) }, 0);
        assert!(!registry.abort_recv_dma(1));
        assert!(!registry.dma_tx_busy(1));
    }

    #[test]
    fn dma_receive_arm_poll_complete() {
        let registry = dma_registry();
        let stream = registry.bindings[1].dma_rx.as_ref().unwrap();
        let mut buf = [0u8; 12];

        assert_eq!(unsafe { registry.recv_dma(6, &mut buf) }, 0);
        assert_eq!(unsafe { registry.recv_dma(6, &mut buf) }, 0);

        stream.complete_with_remaining(4);
        assert_eq!(unsafe { registry.recv_dma(6, &mut buf) }, 8);

        assert_eq!(unsafe { registry.recv_dma(6, &mut buf) }, 0);
        assert_eq!(stream.start_count(), 2);
    }

    #[test]
    fn dma_receive_abort() {
        let registry = dma_registry();
        let stream = registry.bindings[1].dma_rx.as_ref().unwrap();
        let mut buf = [0u8; 12];

        assert_eq!(unsafe { registry.recv_dma(6, &mut buf) }, 0);
        stream.set_remaining(9);
        assert!(registry.abort_recv_dma(6));
        assert_eq!(unsafe { registry.recv_dma(6, &mut buf) }, 3);
    }

    #[test]
    fn check_rejects_port_count_mismatch() {
        let bindings = [PortBinding::<MockUsart, NoDma>::new(MockUsart::new())];
        let result = PortRegistry::<MockUsart, NoDma, 1>::check(&PortConfig::new(&[1, 2]), &bindings);
        assert_eq!(result, Err(ConfigError::PortCountMismatch));
    }

    #[test]
    fn check_rejects_bad_capacity() {
        let bindings = [PortBinding::<MockUsart, NoDma>::new(MockUsart::new())];
        let result =
            PortRegistry::<MockUsart, NoDma, 1, 48, 64>::check(&PortConfig::new(&[1]), &bindings);
        assert_eq!(result, Err(ConfigError::CapacityNotPowerOfTwo));
    }

    #[test]
    fn check_rejects_missing_dma_stream() {
        let bindings = [PortBinding::<MockUsart, MockDma>::new(MockUsart::new())];
        let config = PortConfig::new(&[6]).with_dma_tx(&[6]);
        let result = PortRegistry::<MockUsart, MockDma, 1>::check(&config, &bindings);
        assert_eq!(result, Err(ConfigError::DmaBindingMismatch));
    }

    #[test]
    fn check_forwards_config_errors() {
        let bindings = [
            PortBinding::<MockUsart, NoDma>::new(MockUsart::new()),
            PortBinding::new(MockUsart::new()),
        ];
        let result = PortRegistry::<MockUsart, NoDma, 2>::check(&PortConfig::new(&[1, 1]), &bindings);
        assert_eq!(result, Err(ConfigError::DuplicatePort));
    }

    #[test]
    #[should_panic(expected = "DMA TX port not in enabled set")]
    fn new_panics_on_invalid_config() {
        let _ = PortRegistry::<MockUsart, NoDma, 1>::new(
            PortConfig::new(&[1]).with_dma_tx(&[2]),
            [PortBinding::new(MockUsart::new())],
        );
    }

    #[test]
    fn slot_table_maps_ids_in_order() {
        let registry = registry();
        assert_eq!(registry.slot(1), Some(0));
        assert_eq!(registry.slot(2), Some(1));
        assert_eq!(registry.slot(6), Some(2));
        assert_eq!(registry.slot(0), None);
    }
}
