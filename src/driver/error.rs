//! Error types for the TC6 protocol engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ProtocolError`]: Link and framing faults reported through the handler
//! - [`QueueError`]: Synchronous enqueue and reset failures
//! - [`CodecError`]: Control transaction encoding failures
//! - [`ConfigError`]: Configuration validation failures
//!
//! The unified [`Error`] enum wraps all domain errors.

// =============================================================================
// Protocol Errors
// =============================================================================

/// Faults detected while exchanging chunks with the MAC-PHY
///
/// These never abort the engine. Each one is reported once through
/// [`Tc6Handler::on_error`](crate::Tc6Handler::on_error) and at most aborts the
/// frame or register operation in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Footer read as all zeros or all ones; nothing drives MISO
    NoHardware,
    /// Start of frame while a frame was already in progress
    UnexpectedStartValid,
    /// Frame data or end of frame without a preceding start
    UnexpectedDataValid,
    /// Footer parity check failed
    BadChecksum,
    /// Control reply where data was expected
    UnexpectedControl,
    /// MAC-PHY rejected the transmitted header
    BadTxData,
    /// MAC-PHY lost configuration synchronization
    SyncLost,
    /// SPI transaction reported failure
    SpiError,
    /// Control transaction could not be encoded
    ControlTxFail,
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProtocolError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProtocolError::NoHardware => "no hardware",
            ProtocolError::UnexpectedStartValid => "unexpected start valid",
            ProtocolError::UnexpectedDataValid => "unexpected data valid",
            ProtocolError::BadChecksum => "bad footer checksum",
            ProtocolError::UnexpectedControl => "unexpected control packet",
            ProtocolError::BadTxData => "bad transmit header",
            ProtocolError::SyncLost => "sync lost",
            ProtocolError::SpiError => "SPI transaction failed",
            ProtocolError::ControlTxFail => "control encoding failed",
        }
    }

    /// Link-level errors suppress frame errors until the next clean start.
    pub const fn is_link_error(&self) -> bool {
        matches!(self, ProtocolError::NoHardware | ProtocolError::SyncLost)
    }
}

// =============================================================================
// Queue Errors
// =============================================================================

/// Enqueue and reset failures
///
/// All of these are synchronous back-pressure; the caller retries later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// No free slot in the queue
    Full,
    /// Data traffic disabled or bring-up not finished
    NotReady,
    /// Frame is empty or longer than the 16-bit length field
    InvalidLength,
    /// More segments than a frame can carry
    TooManySegments,
    /// An SPI transaction is still outstanding
    TransactionInFlight,
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueueError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueError::Full => "queue full",
            QueueError::NotReady => "data path not ready",
            QueueError::InvalidLength => "invalid frame length",
            QueueError::TooManySegments => "too many frame segments",
            QueueError::TransactionInFlight => "SPI transaction in flight",
        }
    }
}

// =============================================================================
// Codec Errors
// =============================================================================

/// Control transaction encoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Register count outside 1..=128
    InvalidRegisterCount,
    /// Destination buffer cannot hold the encoded transaction
    BufferTooSmall,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CodecError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CodecError::InvalidRegisterCount => "invalid register count",
            CodecError::BufferTooSmall => "buffer too small",
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Initial TX credit does not fit the 5-bit footer field
    InvalidChunkCredit,
    /// Idle chunk count is zero or does not fit the 5-bit field
    InvalidIdleChunks,
    /// Invalid configuration parameter
    InvalidConfig,
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
            ConfigError::InvalidChunkCredit => "invalid chunk credit",
            ConfigError::InvalidIdleChunks => "invalid idle chunk count",
            ConfigError::InvalidConfig => "invalid configuration",
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
///     Err(Error::Queue(QueueError::Full)) => { /* retry later */ }
///     Err(Error::Config(e)) => { /* fix configuration */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Protocol fault
    Protocol(ProtocolError),
    /// Queue back-pressure
    Queue(QueueError),
    /// Encoding failure
    Codec(CodecError),
    /// Configuration error
    Config(ConfigError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Protocol(e) => write!(f, "protocol: {}", e.as_str()),
            Error::Queue(e) => write!(f, "queue: {}", e.as_str()),
            Error::Codec(e) => write!(f, "codec: {}", e.as_str()),
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for enqueue operations
pub type QueueResult<T> = core::result::Result<T, QueueError>;

/// Result type alias for control encoding
pub type CodecResult<T> = core::result::Result<T, CodecError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

// =============================================================================
// Unit Tests
// =============================================================================
