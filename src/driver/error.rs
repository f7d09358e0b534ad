//! Error types for the USART driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Build-time configuration failures
//! - [`PortError`]: Runtime per-port conditions
//!
//! The unified [`Error`] enum wraps both domains.
//!
//! None of these are fatal. The plain port API (`send`, `recv`, ...)
//! collapses every runtime error into its documented sentinel (`false`,
//! `0`, null). The `try_*` variants on the registry surface them as
//! [`PortResult`] for callers that want to tell the cases apart.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// These are detected by `const fn` validation. When the registry is built
/// in a `static` initializer they fail the build and never reach runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// An enabled port id has no peripheral mapping
    UnmappedPort,
    /// A port id is listed twice in the enabled set
    DuplicatePort,
    /// More ports enabled than the hardware provides
    TooManyPorts,
    /// Enabled set length does not match the registry's port count
    PortCountMismatch,
    /// A DMA transmit port is not in the enabled set
    DmaTxNotSubset,
    /// A DMA receive port is not in the enabled set
    DmaRxNotSubset,
    /// Ring or slot capacity is not a power of two
    CapacityNotPowerOfTwo,
    /// DMA stream bindings disagree with the configured DMA subsets
    DmaBindingMismatch,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::UnmappedPort => "enabled port has no peripheral mapping",
            ConfigError::DuplicatePort => "port listed twice in enabled set",
            ConfigError::TooManyPorts => "more ports enabled than available",
            ConfigError::PortCountMismatch => "enabled set does not match port count",
            ConfigError::DmaTxNotSubset => "DMA TX port not in enabled set",
            ConfigError::DmaRxNotSubset => "DMA RX port not in enabled set",
            ConfigError::CapacityNotPowerOfTwo => "capacity must be a power of two",
            ConfigError::DmaBindingMismatch => "DMA bindings do not match DMA subsets",
        }
    }
}

// =============================================================================
// Port Errors
// =============================================================================

/// Runtime per-port conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// Port id is outside the enabled set
    DisabledPort,
    /// A transmission is already in flight
    Busy,
    /// The port is not in the DMA subset for this direction
    DmaUnavailable,
    /// A DMA poll passed a different buffer than the one armed
    InvalidBuffer,
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PortError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PortError::DisabledPort => "port not enabled",
            PortError::Busy => "transmission in flight",
            PortError::DmaUnavailable => "DMA not configured for port",
            PortError::InvalidBuffer => "buffer differs from armed DMA buffer",
        }
    }
}

impl embedded_io::Error for PortError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            PortError::DisabledPort => embedded_io::ErrorKind::NotConnected,
            PortError::Busy => embedded_io::ErrorKind::Other,
            PortError::DmaUnavailable => embedded_io::ErrorKind::Unsupported,
            PortError::InvalidBuffer => embedded_io::ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match result {
///     Err(Error::Port(PortError::Busy)) => { /* retry later */ }
///     Err(Error::Config(e)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Port error
    Port(PortError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Port(e) => write!(f, "port: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PortError> for Error {
    fn from(e: PortError) -> Self {
        Error::Port(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration checks
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for per-port operations
pub type PortResult<T> = core::result::Result<T, PortError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn port_error_maps_to_io_error_kind() {
        use embedded_io::{Error as _, ErrorKind};

        assert_eq!(PortError::DisabledPort.kind(), ErrorKind::NotConnected);
        assert_eq!(PortError::Busy.kind(), ErrorKind::Other);
        assert_eq!(PortError::DmaUnavailable.kind(), ErrorKind::Unsupported);
        assert_eq!(PortError::InvalidBuffer.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn config_error_as_str_non_empty() {
        let variants = [
            ConfigError::UnmappedPort,
            ConfigError::DuplicatePort,
            ConfigError::TooManyPorts,
            ConfigError::PortCountMismatch,
            ConfigError::DmaTxNotSubset,
            ConfigError::DmaRxNotSubset,
            ConfigError::CapacityNotPowerOfTwo,
            ConfigError::DmaBindingMismatch,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "ConfigError::{:?} has empty string", variant);
        }
    }

    #[test]
    fn config_error_display() {
        let display = format!("{}", ConfigError::CapacityNotPowerOfTwo);
        assert_eq!(display, "capacity must be a power of two");
    }

    #[test]
    fn port_error_as_str_non_empty() {
        let variants = [
            PortError::DisabledPort,
            PortError::Busy,
            PortError::DmaUnavailable,
            PortError::InvalidBuffer,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "PortError::{:?} has empty string", variant);
        }
    }

    #[test]
    fn port_error_display() {
        assert_eq!(format!("{}", PortError::Busy), "transmission in flight");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::DmaTxNotSubset.into();
        assert_eq!(err, Error::Config(ConfigError::DmaTxNotSubset));
    }

    #[test]
    fn error_from_port_error() {
        let err: Error = PortError::DisabledPort.into();
        assert_eq!(err, Error::Port(PortError::DisabledPort));
    }

    #[test]
    fn error_display_is_prefixed_by_domain() {
        let config = format!("{}", Error::Config(ConfigError::UnmappedPort));
        assert!(config.starts_with("config: "));
        assert!(config.contains("mapping"));

        let port = format!("{}", Error::Port(PortError::DmaUnavailable));
        assert!(port.starts_with("port: "));
        assert!(port.contains("DMA"));
    }

    #[test]
    fn question_mark_converts_domain_errors() {
        fn busy() -> PortResult<()> {
            Err(PortError::Busy)
        }

        fn unified() -> Result<()> {
            busy()?;
            Ok(())
        }

        assert_eq!(unified(), Err(Error::Port(PortError::Busy)));
    }
}
