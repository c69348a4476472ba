//! Configuration text describing how logical positions are wired.
//!
//! Each line binds one logical position to one physical output:
//!
//! ```text
//! <position> <pin_or_channel> <driver_address>
//! ```
//!
//! A `driver_address` of `0` means the output is a pin on the microcontroller itself. Any other
//! value is the 7-bit I2C address of a PCA9685 driver board (`64`, `0x40`, when no address
//! jumpers are soldered), and `pin_or_channel` is then the channel on that board.
//!
//! Text after `#` is a comment. Blank lines are ignored.
//!
//! Positions are unique across the whole file, rows and columns alike. Files that number rows
//! and columns independently (`1 2 0` next to `1 0 64`) are rejected with
//! [`Error::DuplicatePosition`](crate::Error::DuplicatePosition); renumber the columns after the
//! last row instead.
//!
//! See [`parse_str`] for an example.

use std::collections::HashMap;
use std::fs;
use std::num::IntErrorKind;
use std::path::Path;

use itertools::Itertools;

use crate::error::MalformedReason;
use crate::{Error, Result};

/// Largest 7-bit I2C address.
const MAX_DRIVER_ADDRESS: i64 = 127;

/// 1-indexed row or column of the LED array, independent of wiring.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display, derive_more::From,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position(pub u16);

impl Position {
    /// The raw position number.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// I2C address of a driver board, or [`DriverAddress::DIRECT`] for a microcontroller pin.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverAddress(u8);

impl DriverAddress {
    /// Sentinel for outputs wired straight to the microcontroller.
    pub const DIRECT: Self = Self(0);

    /// Address of a PCA9685 board with no address jumpers set.
    pub const DEFAULT_PCA9685: Self = Self(0x40);

    /// Returns `None` for values outside the 7-bit range.
    #[must_use]
    pub fn new(address: u8) -> Option<Self> {
        if i64::from(address) <= MAX_DRIVER_ADDRESS {
            Some(Self(address))
        } else {
            None
        }
    }

    /// The raw address.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// True for the direct-pin sentinel.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        self.0 == 0
    }
}

/// Physical output an entry drives.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    /// Digital output pin on the microcontroller.
    DirectPin {
        /// Pin number on the board.
        pin: u16,
    },
    /// PWM channel on a driver chip.
    DriverChannel {
        /// I2C address of the chip.
        address: DriverAddress,
        /// Channel on the chip.
        channel: u16,
    },
}

/// One line of the configuration: a logical position bound to a physical output.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigEntry {
    /// Logical position (row or column).
    pub position: Position,
    /// Pin number for direct entries, channel number for driver entries.
    pub pin_or_channel: u16,
    /// Driver address, or [`DriverAddress::DIRECT`].
    pub driver_address: DriverAddress,
}

impl ConfigEntry {
    /// Which physical output this entry drives.
    #[must_use]
    pub const fn target(&self) -> Target {
        if self.driver_address.is_direct() {
            Target::DirectPin {
                pin: self.pin_or_channel,
            }
        } else {
            Target::DriverChannel {
                address: self.driver_address,
                channel: self.pin_or_channel,
            }
        }
    }
}

/// Read and validate a configuration file.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, otherwise the same errors as [`parse_str`].
pub fn parse(path: impl AsRef<Path>) -> Result<Vec<ConfigEntry>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("parsing configuration {}", path.display());
    parse_str(&text)
}

/// Validate configuration text, returning entries in line order.
///
/// ```rust
/// use led_array_controller::config::{parse_str, Target, DriverAddress};
///
/// let entries = parse_str("1 3 0\n2 0 64\n3 1 64")?;
/// assert_eq!(entries[0].target(), Target::DirectPin { pin: 3 });
/// assert_eq!(
///     entries[2].target(),
///     Target::DriverChannel { address: DriverAddress::DEFAULT_PCA9685, channel: 1 }
/// );
/// # Ok::<(), led_array_controller::Error>(())
/// ```
///
/// # Errors
///
/// [`Error::MalformedConfig`] for a line that breaks the format, and
/// [`Error::DuplicateBinding`] when two lines bind the same `(driver_address, pin_or_channel)`.
pub fn parse_str(text: &str) -> Result<Vec<ConfigEntry>> {
    let mut entries = Vec::new();
    // (address, pin/channel) -> line that bound it
    let mut bound: HashMap<(DriverAddress, u16), usize> = HashMap::new();

    for (line, content) in (1_usize..).zip(text.lines()) {
        let content = content.split_once('#').map_or(content, |(data, _)| data);
        if content.trim().is_empty() {
            continue;
        }
        let entry = parse_line(line, content)?;

        let key = (entry.driver_address, entry.pin_or_channel);
        if let Some(&first_line) = bound.get(&key) {
            return Err(Error::DuplicateBinding {
                line,
                first_line,
                driver_address: entry.driver_address,
                pin_or_channel: entry.pin_or_channel,
            });
        }
        bound.insert(key, line);
        entries.push(entry);
    }

    Ok(entries)
}

fn parse_line(line: usize, content: &str) -> Result<ConfigEntry> {
    let malformed = |reason| Error::MalformedConfig { line, reason };

    let tokens = content.split_whitespace();
    let Some((position, pin_or_channel, driver_address)) = tokens.clone().collect_tuple() else {
        return Err(malformed(MalformedReason::TokenCount(tokens.count())));
    };

    let position = parse_integer(position, 1).map_err(malformed)?;
    let pin_or_channel = parse_integer(pin_or_channel, 2).map_err(malformed)?;
    let driver_address = parse_integer(driver_address, 3).map_err(malformed)?;

    if position <= 0 {
        return Err(malformed(MalformedReason::PositionNotPositive));
    }
    if pin_or_channel < 0 {
        return Err(malformed(MalformedReason::NegativePinOrChannel));
    }
    if !(0..=MAX_DRIVER_ADDRESS).contains(&driver_address) {
        return Err(malformed(MalformedReason::AddressOutOfRange));
    }

    let too_large = || malformed(MalformedReason::ValueTooLarge);
    Ok(ConfigEntry {
        position: Position(u16::try_from(position).map_err(|_| too_large())?),
        pin_or_channel: u16::try_from(pin_or_channel).map_err(|_| too_large())?,
        driver_address: DriverAddress(u8::try_from(driver_address).map_err(|_| too_large())?),
    })
}

fn parse_integer(token: &str, column: usize) -> Result<i64, MalformedReason> {
    token.parse::<i64>().map_err(|error| match error.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => MalformedReason::ValueTooLarge,
        _ => MalformedReason::NotInteger(column),
    })
}
