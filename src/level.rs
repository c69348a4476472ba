//! Illumination levels.
//!
//! A [`Level`] is a 12-bit PWM window in the PCA9685 sense: within each 4096-tick cycle the
//! output goes high at tick `on` and low at tick `off`. Driver channels receive the window as is.
//! Direct pins can only be on or off, so any window that is lit at all drives them to their
//! active state (see [`PinPolarity`]).

use embedded_hal::digital::PinState;

use crate::transport::PinPolarity;
use crate::{Error, Result};

/// Highest tick in a PCA9685 PWM cycle.
pub const MAX_TICK: u16 = 4095;

/// `(on, off)` tick pair inside a 4096-tick PWM cycle.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmWindow {
    on: u16,
    off: u16,
}

impl PwmWindow {
    /// Create a window; both ticks must be at most [`MAX_TICK`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLevel`] if either tick is out of range.
    pub fn new(on: u16, off: u16) -> Result<Self> {
        if on > MAX_TICK || off > MAX_TICK {
            return Err(Error::InvalidLevel {
                reason: "PWM ticks must be within 0..=4095",
            });
        }
        Ok(Self { on, off })
    }

    /// Tick at which the output goes high.
    #[must_use]
    pub const fn on(self) -> u16 {
        self.on
    }

    /// Tick at which the output goes low.
    #[must_use]
    pub const fn off(self) -> u16 {
        self.off
    }
}

/// Brightness requested for one position.
///
/// ```rust
/// use led_array_controller::Level;
///
/// let half = Level::from_fraction(0.5)?;
/// assert_eq!(half.window().off(), 2047);
/// assert!(half.is_on());
/// assert!(!Level::OFF.is_on());
/// # Ok::<(), led_array_controller::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Level(PwmWindow);

impl Level {
    /// Dark: the output never goes high.
    pub const OFF: Self = Self(PwmWindow { on: 0, off: 0 });

    /// Full brightness.
    pub const ON: Self = Self(PwmWindow {
        on: 0,
        off: MAX_TICK,
    });

    /// Brightness as a fraction of full scale; `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLevel`] for values outside `0.0..=1.0` or NaN.
    pub fn from_fraction(fraction: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidLevel {
                reason: "brightness must be within 0.0..=1.0",
            });
        }
        // Truncates like the board firmware's integer duty cycle.
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "fraction is checked to be within 0..=1"
        )]
        let off = (f32::from(MAX_TICK) * fraction) as u16;
        Ok(Self(PwmWindow { on: 0, off }))
    }

    /// Use an explicit PWM window.
    #[must_use]
    pub const fn from_window(window: PwmWindow) -> Self {
        Self(window)
    }

    /// The PWM window sent to driver channels.
    #[must_use]
    pub const fn window(self) -> PwmWindow {
        self.0
    }

    /// True unless the window never drives the output high.
    #[must_use]
    pub const fn is_on(self) -> bool {
        self.0.on != self.0.off
    }

    /// State written to a direct pin wired with `polarity`.
    #[must_use]
    pub const fn pin_state(self, polarity: PinPolarity) -> PinState {
        polarity.state(self.is_on())
    }
}

impl From<bool> for Level {
    fn from(on: bool) -> Self {
        if on { Self::ON } else { Self::OFF }
    }
}
