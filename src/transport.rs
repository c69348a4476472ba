//! The link to the board: pins on the microcontroller and PCA9685 drivers behind it.
//!
//! [`Transport`] is the capability the controller consumes. Each method corresponds to exactly
//! one message over the physical link; the implementation owns framing, handshakes, and
//! timeouts. Any type implementing it can drive an [`ArrayController`](crate::ArrayController).

#[cfg(feature = "host")]
pub mod recording;

pub use embedded_hal::digital::PinState;

use crate::config::DriverAddress;
use crate::level::PwmWindow;
use crate::{Error, Result};

/// Lowest PWM frequency the PCA9685 prescaler can produce.
pub const MIN_PWM_FREQUENCY_HZ: u16 = 24;

/// Highest PWM frequency the PCA9685 prescaler can produce.
pub const MAX_PWM_FREQUENCY_HZ: u16 = 1526;

/// Electrical mode of a microcontroller pin.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// High-impedance input.
    Input,
    /// Push-pull digital output.
    Output,
}

/// Which voltage lights the LEDs behind a direct pin.
///
/// Row pins usually sink current from LED cathodes, so a row is lit by driving it low.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinPolarity {
    /// Lit when high.
    ActiveHigh,
    /// Lit when low (pin wired to cathodes).
    #[default]
    ActiveLow,
}

impl PinPolarity {
    /// State that makes the pin lit (`true`) or dark (`false`).
    #[must_use]
    pub const fn state(self, lit: bool) -> PinState {
        match (self, lit) {
            (Self::ActiveHigh, true) | (Self::ActiveLow, false) => PinState::High,
            (Self::ActiveHigh, false) | (Self::ActiveLow, true) => PinState::Low,
        }
    }
}

/// How a PCA9685 drives its outputs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// Outputs sink and source current (chip default).
    #[default]
    TotemPole,
    /// Outputs only sink current.
    OpenDrain,
}

/// Settings sent once to every driver chip when a session starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    /// PWM frequency in hertz.
    pub pwm_frequency_hz: u16,
    /// Output stage configuration.
    pub output_mode: OutputMode,
}

impl DriverConfig {
    /// Check the settings against what the chip supports.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDriverConfig`] if the frequency is outside
    /// [`MIN_PWM_FREQUENCY_HZ`]..=[`MAX_PWM_FREQUENCY_HZ`].
    pub fn validate(&self) -> Result<()> {
        if self.pwm_frequency_hz < MIN_PWM_FREQUENCY_HZ
            || self.pwm_frequency_hz > MAX_PWM_FREQUENCY_HZ
        {
            return Err(Error::InvalidDriverConfig {
                pwm_frequency_hz: self.pwm_frequency_hz,
            });
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    // 200 Hz matches the PCA9685 power-on prescaler.
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 200,
            output_mode: OutputMode::TotemPole,
        }
    }
}

/// Synchronous, half-duplex link to the board.
///
/// Implementations must not batch calls: each method is one request/response round trip.
pub trait Transport {
    /// Error reported by the link. The controller passes it through unchanged inside
    /// [`Error::Transport`].
    type Error: core::error::Error + Send + Sync + 'static;

    /// Open the link.
    ///
    /// # Errors
    ///
    /// Whatever the link reports.
    fn open(&mut self) -> core::result::Result<(), Self::Error>;

    /// Close the link.
    ///
    /// # Errors
    ///
    /// Whatever the link reports.
    fn close(&mut self) -> core::result::Result<(), Self::Error>;

    /// Set the mode of a microcontroller pin. Links whose firmware configures pins on first
    /// write can keep the default, which sends nothing.
    ///
    /// # Errors
    ///
    /// Whatever the link reports.
    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> core::result::Result<(), Self::Error> {
        let _ = (pin, mode);
        Ok(())
    }

    /// Drive a microcontroller pin high or low.
    ///
    /// # Errors
    ///
    /// Whatever the link reports.
    fn digital_write(&mut self, pin: u16, state: PinState) -> core::result::Result<(), Self::Error>;

    /// Configure the driver chip at `address`.
    ///
    /// # Errors
    ///
    /// Whatever the link reports.
    fn init_driver(
        &mut self,
        address: DriverAddress,
        config: &DriverConfig,
    ) -> core::result::Result<(), Self::Error>;

    /// Write one PWM channel on the driver chip at `address`.
    ///
    /// # Errors
    ///
    /// Whatever the link reports.
    fn pwm_write(
        &mut self,
        address: DriverAddress,
        channel: u16,
        window: PwmWindow,
    ) -> core::result::Result<(), Self::Error>;
}

/// Convert a transport result into the crate's error without altering the payload.
pub(crate) fn passthrough<T, E>(result: core::result::Result<T, E>) -> Result<T>
where
    E: core::error::Error + Send + Sync + 'static,
{
    result.map_err(|error| Error::from(crate::error::TransportError::new(error)))
}
