//! The public session object for one LED array.
//!
//! See [`ArrayController`] for usage examples.

use core::time::Duration;
use std::collections::BTreeMap;
use std::path::Path;
use std::thread;

use crate::address_map::AddressMap;
use crate::config::{ConfigEntry, DriverAddress, Position, parse, parse_str};
use crate::dispatch::DriverDispatcher;
use crate::level::Level;
use crate::transport::{DriverConfig, PinPolarity, Transport};
use crate::{Error, Result};

/// Runtime settings for a session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Settings sent to every driver chip at session start.
    pub driver: DriverConfig,
    /// Which level lights the LEDs behind direct pins. Rows wired to cathodes are active low.
    pub pin_polarity: PinPolarity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Session {
    Ready,
    Closed,
}

/// Drives an LED array through one exclusively owned [`Transport`].
///
/// Construction parses the configuration, opens the transport, initializes every driver chip
/// once, and switches every position off. Callers then address LEDs by logical
/// [`Position`] and never see whether a position is a bare pin or a driver channel.
///
/// A single LED of the matrix sits where a row (direct pin) crosses a column (driver channel);
/// [`set_led`](Self::set_led) and [`led_off`](Self::led_off) drive both sides together.
///
/// The session moves from ready to closed exactly once. After [`close`](Self::close) every
/// operation fails with [`Error::SessionClosed`]; closing again is a no-op. Dropping a ready
/// controller closes the transport.
///
/// # Example
///
/// ```rust
/// use led_array_controller::config::Position;
/// use led_array_controller::{ArrayController, Level};
/// # use core::convert::Infallible;
/// # use led_array_controller::config::DriverAddress;
/// # use led_array_controller::level::PwmWindow;
/// # use led_array_controller::transport::{DriverConfig, PinState, Transport};
/// # struct SerialBoard;
/// # impl Transport for SerialBoard {
/// #     type Error = Infallible;
/// #     fn open(&mut self) -> Result<(), Infallible> { Ok(()) }
/// #     fn close(&mut self) -> Result<(), Infallible> { Ok(()) }
/// #     fn digital_write(&mut self, _: u16, _: PinState) -> Result<(), Infallible> { Ok(()) }
/// #     fn init_driver(&mut self, _: DriverAddress, _: &DriverConfig) -> Result<(), Infallible> { Ok(()) }
/// #     fn pwm_write(&mut self, _: DriverAddress, _: u16, _: PwmWindow) -> Result<(), Infallible> { Ok(()) }
/// # }
///
/// // Row 1 on pin 3 of the microcontroller, columns 2 and 3 on channels 0 and 1 of the
/// // driver board at 0x40.
/// let mut controller = ArrayController::from_config_str("1 3 0\n2 0 64\n3 1 64", SerialBoard)?;
///
/// controller.set_position(Position(2), Level::ON)?;
/// controller.set_position(Position(3), Level::from_fraction(0.25)?)?;
/// assert!(controller.is_on(Position(2))?);
///
/// controller.clear_all()?;
/// assert!(!controller.is_on(Position(2))?);
///
/// // The LED where row 1 crosses column 3.
/// controller.set_led(Position(1), Position(3), Level::ON)?;
/// controller.led_off(Position(1), Position(3))?;
///
/// controller.close()?;
/// controller.close()?; // no-op
/// # Ok::<(), led_array_controller::Error>(())
/// ```
#[derive(Debug)]
pub struct ArrayController<T: Transport> {
    address_map: AddressMap,
    dispatcher: DriverDispatcher<T>,
    levels: BTreeMap<Position, Level>,
    session: Session,
}

impl<T: Transport> ArrayController<T> {
    /// Start a session from a configuration file with default settings.
    ///
    /// # Errors
    ///
    /// Configuration errors ([`Error::Io`], [`Error::MalformedConfig`],
    /// [`Error::DuplicateBinding`], [`Error::DuplicatePosition`]) are returned before the
    /// transport is opened. Transport errors during start-up are returned after the transport
    /// has been closed again.
    pub fn new(config_path: impl AsRef<Path>, transport: T) -> Result<Self> {
        Self::with_config(config_path, transport, &ControllerConfig::default())
    }

    /// Start a session from a configuration file.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`Error::InvalidDriverConfig`].
    pub fn with_config(
        config_path: impl AsRef<Path>,
        transport: T,
        config: &ControllerConfig,
    ) -> Result<Self> {
        Self::from_entries(parse(config_path)?, transport, config)
    }

    /// Start a session from configuration text with default settings.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), without [`Error::Io`].
    pub fn from_config_str(text: &str, transport: T) -> Result<Self> {
        Self::from_entries(parse_str(text)?, transport, &ControllerConfig::default())
    }

    /// Start a session from already parsed entries.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicatePosition`] or [`Error::InvalidDriverConfig`] before the transport is
    /// opened, or [`Error::Transport`] from start-up.
    pub fn from_entries(
        entries: impl IntoIterator<Item = ConfigEntry>,
        transport: T,
        config: &ControllerConfig,
    ) -> Result<Self> {
        let address_map = AddressMap::build(entries)?;
        config.driver.validate()?;

        let mut dispatcher = DriverDispatcher::with_polarity(transport, config.pin_polarity);
        dispatcher.open()?;

        let mut controller = Self {
            address_map,
            dispatcher,
            levels: BTreeMap::new(),
            session: Session::Ready,
        };
        if let Err(error) = controller.start(&config.driver) {
            controller.release();
            return Err(error);
        }
        log::info!(
            "session ready: {} positions, {} driver(s)",
            controller.address_map.len(),
            controller.address_map.driver_addresses().count()
        );
        Ok(controller)
    }

    fn start(&mut self, driver_config: &DriverConfig) -> Result<()> {
        for entry in self.address_map.direct_entries() {
            self.dispatcher.prepare_pin(entry.pin_or_channel)?;
        }
        for address in self.address_map.driver_addresses() {
            self.dispatcher.initialize(address, driver_config)?;
        }
        // Hardware state is unknown until every output has been written once.
        self.switch_off(true)
    }

    /// Drive one position to `level`.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`], [`Error::UnknownPosition`], or [`Error::Transport`]. On error
    /// the tracked level of the position is unchanged.
    pub fn set_position(&mut self, position: Position, level: Level) -> Result<()> {
        self.ensure_ready()?;
        let entry = self.address_map.resolve(position)?;
        self.write(&entry, level)
    }

    // Dispatch, then record the level only once the write went through.
    fn write(&mut self, entry: &ConfigEntry, level: Level) -> Result<()> {
        self.dispatcher.set(entry, level)?;
        self.levels.insert(entry.position, level);
        Ok(())
    }

    /// Drive each position in order to `level`.
    ///
    /// Not atomic: on error, positions before the failing one keep their new level.
    ///
    /// # Errors
    ///
    /// The first error from [`set_position`](Self::set_position).
    pub fn set_many(
        &mut self,
        positions: impl IntoIterator<Item = Position>,
        level: Level,
    ) -> Result<()> {
        positions
            .into_iter()
            .try_for_each(|position| self.set_position(position, level))
    }

    /// Switch every configured position off. Positions already known to be off are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`] or the first [`Error::Transport`].
    pub fn clear_all(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.switch_off(false)
    }

    fn switch_off(&mut self, force: bool) -> Result<()> {
        for entry in self.address_map.entries() {
            if !force && self.levels.get(&entry.position) == Some(&Level::OFF) {
                continue;
            }
            self.dispatcher.set(entry, Level::OFF)?;
            self.levels.insert(entry.position, Level::OFF);
        }
        Ok(())
    }

    /// Light the LED where `row` crosses `column`: the row pin is driven active, then the
    /// column channel is set to `level`.
    ///
    /// Other lit rows or columns stay lit, so LEDs sharing them light too.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`], [`Error::UnknownPosition`] if `row` is not a direct pin or
    /// `column` is not a driver channel (checked before anything is sent), or
    /// [`Error::Transport`].
    pub fn set_led(&mut self, row: Position, column: Position, level: Level) -> Result<()> {
        self.ensure_ready()?;
        let (row, column) = self.resolve_led(row, column)?;
        self.write(&row, Level::ON)?;
        self.write(&column, level)
    }

    /// Switch off the LED where `row` crosses `column`: the column channel first, then the
    /// row pin.
    ///
    /// # Errors
    ///
    /// As [`set_led`](Self::set_led).
    pub fn led_off(&mut self, row: Position, column: Position) -> Result<()> {
        self.ensure_ready()?;
        let (row, column) = self.resolve_led(row, column)?;
        self.write(&column, Level::OFF)?;
        self.write(&row, Level::OFF)
    }

    /// [`blink`](Self::blink) for the LED where `row` crosses `column`.
    ///
    /// # Errors
    ///
    /// As [`set_led`](Self::set_led).
    pub fn blink_led(
        &mut self,
        row: Position,
        column: Position,
        cycles: u32,
        period: Duration,
        level: Level,
    ) -> Result<()> {
        self.ensure_ready()?;
        self.resolve_led(row, column)?;
        let half_period = period / 2;
        for _ in 0..cycles {
            self.set_led(row, column, level)?;
            thread::sleep(half_period);
            self.led_off(row, column)?;
            thread::sleep(half_period);
        }
        Ok(())
    }

    fn resolve_led(&self, row: Position, column: Position) -> Result<(ConfigEntry, ConfigEntry)> {
        Ok((
            self.address_map.resolve_row(row)?,
            self.address_map.resolve_column(column)?,
        ))
    }

    /// Turn a position on for `period / 2`, then off for `period / 2`, `cycles` times.
    ///
    /// Blocks the calling thread for `cycles * period`.
    ///
    /// # Errors
    ///
    /// As [`set_position`](Self::set_position); an unknown position fails before anything is
    /// sent.
    pub fn blink(
        &mut self,
        position: Position,
        cycles: u32,
        period: Duration,
        level: Level,
    ) -> Result<()> {
        self.ensure_ready()?;
        self.address_map.resolve(position)?;
        let half_period = period / 2;
        for _ in 0..cycles {
            self.set_position(position, level)?;
            thread::sleep(half_period);
            self.set_position(position, Level::OFF)?;
            thread::sleep(half_period);
        }
        Ok(())
    }

    /// Last level written to `position`.
    ///
    /// # Errors
    ///
    /// [`Error::SessionClosed`] or [`Error::UnknownPosition`].
    pub fn state(&self, position: Position) -> Result<Level> {
        self.ensure_ready()?;
        self.address_map.resolve(position)?;
        Ok(self.levels.get(&position).copied().unwrap_or(Level::OFF))
    }

    /// True if the last level written to `position` is lit.
    ///
    /// # Errors
    ///
    /// As [`state`](Self::state).
    pub fn is_on(&self, position: Position) -> Result<bool> {
        self.state(position).map(Level::is_on)
    }

    /// Release the transport. Calling again does nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] if the link fails to close; the session is closed regardless.
    pub fn close(&mut self) -> Result<()> {
        if self.session == Session::Closed {
            return Ok(());
        }
        self.session = Session::Closed;
        log::info!("closing session");
        self.dispatcher.close()
    }

    // Close after a failure that already has an error to report.
    fn release(&mut self) {
        if let Err(error) = self.close() {
            log::warn!("transport close failed: {error}");
        }
    }

    /// True after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.session == Session::Closed
    }

    /// Configured positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.address_map.positions()
    }

    /// The position index built at start-up.
    #[must_use]
    pub const fn address_map(&self) -> &AddressMap {
        &self.address_map
    }

    /// Driver chips initialized in this session.
    pub fn driver_addresses(&self) -> impl Iterator<Item = DriverAddress> + '_ {
        self.dispatcher.initialized()
    }

    /// Borrow the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.session {
            Session::Ready => Ok(()),
            Session::Closed => Err(Error::SessionClosed),
        }
    }
}

impl<T: Transport> Drop for ArrayController<T> {
    fn drop(&mut self) {
        if self.session == Session::Ready {
            log::warn!("controller dropped while open; closing transport");
            self.release();
        }
    }
}
