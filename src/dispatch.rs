//! The single seam between logical entries and the two physical addressing domains.
//!
//! See [`DriverDispatcher`].

use std::collections::BTreeSet;

use crate::config::{ConfigEntry, DriverAddress, Target};
use crate::level::Level;
use crate::transport::{DriverConfig, PinMode, PinPolarity, Transport, passthrough};
use crate::{Error, Result};

/// Owns the transport and turns `(entry, level)` into exactly one write.
///
/// Direct-pin entries become a [`Transport::digital_write`] at the dispatcher's
/// [`PinPolarity`]; driver entries become a [`Transport::pwm_write`] on a chip that must already
/// have been [initialized](Self::initialize). Nothing is batched or coalesced.
#[derive(Debug)]
pub struct DriverDispatcher<T: Transport> {
    transport: T,
    polarity: PinPolarity,
    initialized: BTreeSet<DriverAddress>,
}

impl<T: Transport> DriverDispatcher<T> {
    /// Wrap a transport with active-low direct pins. No message is sent.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self::with_polarity(transport, PinPolarity::ActiveLow)
    }

    /// Wrap a transport whose direct pins are lit at `polarity`. No message is sent.
    #[must_use]
    pub const fn with_polarity(transport: T, polarity: PinPolarity) -> Self {
        Self {
            transport,
            polarity,
            initialized: BTreeSet::new(),
        }
    }

    /// Polarity used for direct-pin writes.
    #[must_use]
    pub const fn polarity(&self) -> PinPolarity {
        self.polarity
    }

    /// Open the link.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] with the link's own error.
    pub fn open(&mut self) -> Result<()> {
        passthrough(self.transport.open())
    }

    /// Close the link and forget which chips were initialized.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] with the link's own error.
    pub fn close(&mut self) -> Result<()> {
        self.initialized.clear();
        passthrough(self.transport.close())
    }

    /// Configure the chip at `address` once. Later calls for the same address send nothing.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] with the link's own error; the address then stays uninitialized.
    pub fn initialize(&mut self, address: DriverAddress, config: &DriverConfig) -> Result<()> {
        if address.is_direct() || self.initialized.contains(&address) {
            return Ok(());
        }
        passthrough(self.transport.init_driver(address, config))?;
        log::info!("initialized driver at address {address:#04x}", address = address.get());
        self.initialized.insert(address);
        Ok(())
    }

    /// Put a direct pin into output mode.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] with the link's own error.
    pub fn prepare_pin(&mut self, pin: u16) -> Result<()> {
        passthrough(self.transport.set_pin_mode(pin, PinMode::Output))
    }

    /// True once [`initialize`](Self::initialize) has succeeded for `address`.
    #[must_use]
    pub fn is_initialized(&self, address: DriverAddress) -> bool {
        self.initialized.contains(&address)
    }

    /// Initialized chip addresses in ascending order.
    pub fn initialized(&self) -> impl Iterator<Item = DriverAddress> + '_ {
        self.initialized.iter().copied()
    }

    /// Drive the output behind `entry` to `level` with one transport message.
    ///
    /// # Errors
    ///
    /// [`Error::UninitializedDriver`] before any message is sent if the entry's chip was never
    /// initialized, otherwise [`Error::Transport`] with the link's own error.
    pub fn set(&mut self, entry: &ConfigEntry, level: Level) -> Result<()> {
        match entry.target() {
            Target::DirectPin { pin } => {
                let state = level.pin_state(self.polarity);
                log::debug!("position {}: pin {pin} -> {state:?}", entry.position);
                passthrough(self.transport.digital_write(pin, state))
            }
            Target::DriverChannel { address, channel } => {
                if !self.initialized.contains(&address) {
                    return Err(Error::UninitializedDriver { address });
                }
                let window = level.window();
                log::debug!(
                    "position {}: driver {:#04x} channel {channel} -> {}..{}",
                    entry.position,
                    address.get(),
                    window.on(),
                    window.off()
                );
                passthrough(self.transport.pwm_write(address, channel, window))
            }
        }
    }

    /// Borrow the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Give the transport back without closing it.
    #[must_use]
    pub fn into_transport(self) -> T {
        self.transport
    }
}
