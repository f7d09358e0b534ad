//! Configuration types for the USART driver

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{MAX_PORT_ID, MAX_PORTS};
use crate::internal::register::usart_base;

// =============================================================================
// Port Id
// =============================================================================

/// Logical port id.
///
/// Port 0 is LPUART1, ports 1 to 10 are USART1..USART10 (including the
/// UART-only instances 4, 5, 7, 8 and 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortId(u8);

impl PortId {
    /// LPUART1
    pub const LPUART1: Self = Self(0);
    /// USART1
    pub const USART1: Self = Self(1);
    /// USART2
    pub const USART2: Self = Self(2);
    /// USART3
    pub const USART3: Self = Self(3);
    /// UART4
    pub const UART4: Self = Self(4);
    /// UART5
    pub const UART5: Self = Self(5);
    /// USART6
    pub const USART6: Self = Self(6);
    /// UART7
    pub const UART7: Self = Self(7);
    /// UART8
    pub const UART8: Self = Self(8);
    /// UART9
    pub const UART9: Self = Self(9);
    /// USART10
    pub const USART10: Self = Self(10);

    /// Wrap a raw id, or `None` if no peripheral sits behind it.
    #[must_use]
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= MAX_PORT_ID {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Raw numeric id
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl From<PortId> for u8 {
    fn from(id: PortId) -> u8 {
        id.0
    }
}

// =============================================================================
// Transmit State
// =============================================================================

/// Interrupt-driven transmit slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// No transmission in flight; a send will be accepted
    #[default]
    Idle,
    /// The interrupt handler is draining the slot
    Sending,
}

// =============================================================================
// Port Configuration
// =============================================================================

/// Which ports are enabled, and which of them use DMA.
///
/// Built once as a constant and validated at compile time by the registry.
///
/// # Example
///
/// ```ignore
/// use ph_stm32_usart::PortConfig;
///
/// const CONFIG: PortConfig = PortConfig::new(&[1, 2, 6])
///     .with_dma_tx(&[6])
///     .with_dma_rx(&[6]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    /// Enabled port ids, in registry slot order
    pub enabled: &'static [u8],
    /// Ports whose transmit direction may use DMA
    pub dma_tx: &'static [u8],
    /// Ports whose receive direction may use DMA
    pub dma_rx: &'static [u8],
}

impl PortConfig {
    /// Enable `ports`, none of them using DMA
    #[must_use]
    pub const fn new(enabled: &'static [u8]) -> Self {
        Self {
            enabled,
            dma_tx: &[],
            dma_rx: &[],
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the DMA transmit subset
    #[must_use]
    pub const fn with_dma_tx(mut self, ports: &'static [u8]) -> Self {
        self.dma_tx = ports;
        self
    }

    /// Set the DMA receive subset
    #[must_use]
    pub const fn with_dma_rx(mut self, ports: &'static [u8]) -> Self {
        self.dma_rx = ports;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of enabled ports
    #[inline]
    pub const fn port_count(&self) -> usize {
        self.enabled.len()
    }

    /// Check if `port` is in the enabled set
    #[inline]
    pub const fn is_enabled(&self, port: u8) -> bool {
        contains(self.enabled, port)
    }

    /// Check if `port` transmits through DMA
    #[inline]
    pub const fn uses_dma_tx(&self, port: u8) -> bool {
        contains(self.dma_tx, port)
    }

    /// Check if `port` receives through DMA
    #[inline]
    pub const fn uses_dma_rx(&self, port: u8) -> bool {
        contains(self.dma_rx, port)
    }

    /// Validate the configuration.
    ///
    /// Checks, in order: the enabled set fits the hardware, every enabled
    /// id has a peripheral, no id is listed twice, and both DMA lists are
    /// subsets of the enabled set.
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.enabled.len() > MAX_PORTS {
            return Err(ConfigError::TooManyPorts);
        }

        let mut i = 0;
        while i < self.enabled.len() {
            let port = self.enabled[i];
            if usart_base(port).is_none() {
                return Err(ConfigError::UnmappedPort);
            }
            let mut j = i + 1;
            while j < self.enabled.len() {
                if self.enabled[j] == port {
                    return Err(ConfigError::DuplicatePort);
                }
                j += 1;
            }
            i += 1;
        }

        if !is_subset(self.dma_tx, self.enabled) {
            return Err(ConfigError::DmaTxNotSubset);
        }
        if !is_subset(self.dma_rx, self.enabled) {
            return Err(ConfigError::DmaRxNotSubset);
        }
        Ok(())
    }
}

const fn contains(list: &[u8], port: u8) -> bool {
    let mut i = 0;
    while i < list.len() {
        if list[i] == port {
            return true;
        }
        i += 1;
    }
    false
}

const fn is_subset(sub: &[u8], set: &[u8]) -> bool {
    let mut i = 0;
    while i < sub.len() {
        if !contains(set, sub[i]) {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_id_bounds() {
        assert_eq!(PortId::new(0), Some(PortId::LPUART1));
        assert_eq!(PortId::new(10), Some(PortId::USART10));
        assert_eq!(PortId::new(11), None);
        assert_eq!(u8::from(PortId::USART6), 6);
    }

    #[test]
    fn tx_state_default_is_idle() {
        assert_eq!(TxState::default(), TxState::Idle);
    }

    #[test]
    fn new_config_has_no_dma() {
        let config = PortConfig::new(&[1, 2, 6]);
        assert_eq!(config.port_count(), 3);
        assert!(config.is_enabled(2));
        assert!(!config.is_enabled(3));
        assert!(!config.uses_dma_tx(1));
        assert!(!config.uses_dma_rx(1));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn builders_set_dma_subsets() {
        let config = PortConfig::new(&[1, 6]).with_dma_tx(&[6]).with_dma_rx(&[1, 6]);
        assert!(config.uses_dma_tx(6));
        assert!(!config.uses_dma_tx(1));
        assert!(config.uses_dma_rx(1));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn unmapped_port_rejected() {
        assert_eq!(PortConfig::new(&[1, 11]).validate(), Err(ConfigError::UnmappedPort));
    }

    #[test]
    fn duplicate_port_rejected() {
        assert_eq!(PortConfig::new(&[2, 1, 2]).validate(), Err(ConfigError::DuplicatePort));
    }

    #[test]
    fn too_many_ports_rejected() {
        let config = PortConfig::new(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 1]);
        assert_eq!(config.validate(), Err(ConfigError::TooManyPorts));
    }

    #[test]
    fn all_eleven_ports_accepted() {
        let config = PortConfig::new(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn dma_tx_outside_enabled_set_rejected() {
        let config = PortConfig::new(&[1, 2]).with_dma_tx(&[3]);
        assert_eq!(config.validate(), Err(ConfigError::DmaTxNotSubset));
    }

    #[test]
    fn dma_rx_outside_enabled_set_rejected() {
        let config = PortConfig::new(&[1, 2]).with_dma_rx(&[2, 6]);
        assert_eq!(config.validate(), Err(ConfigError::DmaRxNotSubset));
    }

    #[test]
    fn empty_config_is_valid() {
        assert_eq!(PortConfig::new(&[]).validate(), Ok(()));
    }

    #[test]
    fn validate_runs_in_const_context() {
        const OK: bool = PortConfig::new(&[1, 2, 6]).validate().is_ok();
        assert!(OK);
    }
}
