use core::error::Error as CoreError;
use core::fmt;
use std::path::PathBuf;

use crate::config::{DriverAddress, Position};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while building or driving an LED array session.
///
/// `MalformedConfig`, `DuplicateBinding`, `DuplicatePosition`, `InvalidDriverConfig`, and `Io`
/// happen at construction and prevent the session from starting. The rest are call-time errors:
/// the caller may handle them and keep using the controller.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    /// The configuration file could not be read.
    #[display("cannot read configuration {}: {source}", path.display())]
    Io {
        /// File that failed to open or read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A configuration line broke one of the format rules.
    #[display("configuration line {line}: {reason}")]
    MalformedConfig {
        /// 1-based line number.
        line: usize,
        /// Which rule the line broke.
        reason: MalformedReason,
    },

    /// Two lines bind the same physical output.
    #[display(
        "configuration line {line}: pin/channel {pin_or_channel} at address {driver_address} is already bound on line {first_line}"
    )]
    DuplicateBinding {
        /// Line of the second binding.
        line: usize,
        /// Line that first bound the output.
        first_line: usize,
        /// Driver address shared by both bindings.
        driver_address: DriverAddress,
        /// Pin or channel shared by both bindings.
        pin_or_channel: u16,
    },

    /// Two entries bind the same logical position.
    #[display("position {position} is bound more than once")]
    DuplicatePosition {
        /// Position declared twice.
        position: Position,
    },

    /// The driver configuration is outside what the PCA9685 supports.
    #[display("PWM frequency {pwm_frequency_hz} Hz is outside 24..=1526 Hz")]
    InvalidDriverConfig {
        /// Requested frequency.
        pwm_frequency_hz: u16,
    },

    /// A level was requested that cannot be expressed as a 12-bit PWM window.
    #[display("invalid level: {reason}")]
    InvalidLevel {
        /// Why the level was rejected.
        reason: &'static str,
    },

    /// The position is not part of the configuration.
    #[display("position {position} is not configured")]
    UnknownPosition {
        /// Position that was requested.
        position: Position,
    },

    /// A PWM write targeted a driver chip that was never initialized.
    #[display("driver at address {address} has not been initialized")]
    UninitializedDriver {
        /// Address of the chip.
        address: DriverAddress,
    },

    /// The controller was closed.
    #[display("session is closed")]
    SessionClosed,

    /// The transport reported a failure; it is passed through unchanged.
    #[display("transport failure: {source}")]
    #[from]
    Transport {
        /// Error produced by the transport.
        source: TransportError,
    },
}

/// Which configuration rule a line broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MalformedReason {
    /// The line did not have exactly three tokens.
    #[display("expected 3 tokens, found {_0}")]
    TokenCount(usize),
    /// A token was not an integer.
    #[display("token {_0} is not an integer")]
    NotInteger(usize),
    /// Position was zero or negative.
    #[display("position must be 1 or greater")]
    PositionNotPositive,
    /// Pin or channel was negative.
    #[display("pin/channel must not be negative")]
    NegativePinOrChannel,
    /// Driver address was outside the 7-bit I2C range.
    #[display("driver address must be within 0..=127")]
    AddressOutOfRange,
    /// A value did not fit the integer type used to store it.
    #[display("value too large")]
    ValueTooLarge,
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
///
/// The original error is kept as-is; use [`downcast_ref`](Self::downcast_ref) to recover it.
pub struct TransportError(Box<dyn CoreError + Send + Sync + 'static>);

impl TransportError {
    /// Wrap a transport's error without changing it.
    pub fn new<E>(error: E) -> Self
    where
        E: CoreError + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    /// Borrow the original error as `E`, if that is its type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: CoreError + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Return the boxed original error.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn CoreError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl CoreError for TransportError {
    fn source(&self) -> Option<&(dyn CoreError + 'static)> {
        self.0.source()
    }
}

impl Error {
    /// True for errors that can only happen while a session is being built.
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::MalformedConfig { .. }
                | Self::DuplicateBinding { .. }
                | Self::DuplicatePosition { .. }
                | Self::InvalidDriverConfig { .. }
        )
    }
}
