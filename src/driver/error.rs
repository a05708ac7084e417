//! Error types for the MAC-PHY SPI engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`FramingError`]: protocol framing violations (echo, parity, complement)
//! - [`Error`]: the unified enum returned by most driver methods
//!
//! Recoverable conditions (receive buffer overflow on the transceiver,
//! sink resource exhaustion, device-requested frame drops) never surface
//! as errors; they are absorbed by the engine and reported through
//! [`Tc6Stats`](crate::driver::tc6::Tc6Stats) counters and the
//! [`State`](crate::driver::config::State) machine instead.

use embedded_hal::spi::ErrorKind;

// =============================================================================
// Framing Errors
// =============================================================================

/// Protocol framing violations.
///
/// Any of these means the host and transceiver disagree about the byte
/// stream; the link is desynchronized and the owner should re-run the
/// reset sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingError {
    /// The echoed control header did not match the one sent.
    HeaderMismatch,
    /// A protected-mode value and its one's-complement copy disagreed.
    ProtectedMismatch,
    /// A received word failed its parity check.
    ParityError,
    /// The transceiver flagged a header we sent as bad.
    HeaderBad,
}

impl core::fmt::Display for FramingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FramingError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FramingError::HeaderMismatch => "control header echo mismatch",
            FramingError::ProtectedMismatch => "protected-mode complement mismatch",
            FramingError::ParityError => "word parity check failed",
            FramingError::HeaderBad => "transceiver rejected header",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all fatal error domains for unified error handling.
///
/// Match on the variant for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Transport(_)) => { /* bus fault, retry after reset */ }
///     Err(Error::Framing(FramingError::HeaderMismatch)) => { /* ... */ }
///     Err(Error::ConfigurationLost) => { /* re-enable sync */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI transport failure; the exchange was aborted.
    Transport(ErrorKind),
    /// Protocol framing violation; the link is desynchronized.
    Framing(FramingError),
    /// The transceiver reported its configuration sync as lost.
    ConfigurationLost,
    /// The reset handshake exceeded its polling bound.
    ResetTimeout,
    /// The reset line driver failed.
    Gpio,
    /// Clause-45 access to an MMD the control plane does not map.
    UnsupportedMmd,
    /// Operation not permitted in the current state (e.g. the engine is
    /// faulted and must be reset first).
    InvalidState,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transport(kind) => write!(f, "transport: {kind:?}"),
            Error::Framing(e) => write!(f, "framing: {}", e.as_str()),
            Error::ConfigurationLost => f.write_str("configuration sync lost"),
            Error::ResetTimeout => f.write_str("reset handshake timed out"),
            Error::Gpio => f.write_str("reset line failure"),
            Error::UnsupportedMmd => f.write_str("MMD not mapped by the control plane"),
            Error::InvalidState => f.write_str("invalid state for operation"),
        }
    }
}

// From impls for automatic conversion
impl From<FramingError> for Error {
    fn from(e: FramingError) -> Self {
        Error::Framing(e)
    }
}

impl Error {
    /// Build a transport error from any embedded-hal SPI error.
    pub fn transport<E: embedded_hal::spi::Error>(e: E) -> Self {
        Error::Transport(e.kind())
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Unit Tests
// =============================================================================
