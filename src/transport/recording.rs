#![cfg(feature = "host")]
//! In-memory [`Transport`] that records every message instead of sending it.
//!
//! Used for host-side tests and dry runs. The [`CallLog`] handle stays with the caller after the
//! transport has moved into a controller.

use core::cell::RefCell;
use std::rc::Rc;

use crate::config::DriverAddress;
use crate::level::PwmWindow;
use crate::transport::{DriverConfig, PinMode, PinState, Transport};

/// One message sent through a [`RecordingTransport`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportCall {
    /// [`Transport::open`].
    Open,
    /// [`Transport::close`].
    Close,
    /// [`Transport::set_pin_mode`].
    SetPinMode {
        /// Pin.
        pin: u16,
        /// Mode.
        mode: PinMode,
    },
    /// [`Transport::digital_write`].
    DigitalWrite {
        /// Pin.
        pin: u16,
        /// State written.
        state: PinState,
    },
    /// [`Transport::init_driver`].
    InitDriver {
        /// Chip address.
        address: DriverAddress,
        /// Settings sent.
        config: DriverConfig,
    },
    /// [`Transport::pwm_write`].
    PwmWrite {
        /// Chip address.
        address: DriverAddress,
        /// Channel.
        channel: u16,
        /// Window written.
        window: PwmWindow,
    },
}

impl TransportCall {
    /// True for pin and PWM writes.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::DigitalWrite { .. } | Self::PwmWrite { .. })
    }
}

/// Failure injected into a [`RecordingTransport`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
#[display("injected transport failure")]
pub struct InjectedFailure;

#[derive(Debug, Default)]
struct LogState {
    calls: Vec<TransportCall>,
    fail_next_write: bool,
    fail_open: bool,
}

/// Shared view of the messages a [`RecordingTransport`] has received.
#[derive(Clone, Debug, Default)]
pub struct CallLog(Rc<RefCell<LogState>>);

impl CallLog {
    /// Snapshot of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.0.borrow().calls.clone()
    }

    /// Remove and return all recorded calls.
    #[must_use]
    pub fn take(&self) -> Vec<TransportCall> {
        core::mem::take(&mut self.0.borrow_mut().calls)
    }

    /// Number of recorded calls matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&TransportCall) -> bool) -> usize {
        self.0.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Make the next pin or PWM write fail without being recorded.
    pub fn fail_next_write(&self) {
        self.0.borrow_mut().fail_next_write = true;
    }

    /// Make every later `open` fail.
    pub fn fail_open(&self) {
        self.0.borrow_mut().fail_open = true;
    }
}

/// [`Transport`] that only records.
///
/// ```rust
/// use led_array_controller::transport::recording::RecordingTransport;
/// use led_array_controller::config::Position;
/// use led_array_controller::{ArrayController, Level};
///
/// let transport = RecordingTransport::new();
/// let log = transport.log();
/// let mut controller = ArrayController::from_config_str("1 3 0\n2 0 64", transport)?;
/// let _ = log.take();
///
/// controller.set_position(Position(1), Level::ON)?;
/// assert_eq!(log.take().len(), 1);
/// # Ok::<(), led_array_controller::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct RecordingTransport {
    log: CallLog,
}

impl RecordingTransport {
    /// Create a transport with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the call log.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn record(&self, call: TransportCall) -> Result<(), InjectedFailure> {
        let mut state = self.log.0.borrow_mut();
        if call.is_write() && state.fail_next_write {
            state.fail_next_write = false;
            return Err(InjectedFailure);
        }
        if call == TransportCall::Open && state.fail_open {
            return Err(InjectedFailure);
        }
        state.calls.push(call);
        Ok(())
    }
}

impl Transport for RecordingTransport {
    type Error = InjectedFailure;

    fn open(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Open)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.record(TransportCall::Close)
    }

    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> Result<(), Self::Error> {
        self.record(TransportCall::SetPinMode { pin, mode })
    }

    fn digital_write(&mut self, pin: u16, state: PinState) -> Result<(), Self::Error> {
        self.record(TransportCall::DigitalWrite { pin, state })
    }

    fn init_driver(
        &mut self,
        address: DriverAddress,
        config: &DriverConfig,
    ) -> Result<(), Self::Error> {
        self.record(TransportCall::InitDriver {
            address,
            config: *config,
        })
    }

    fn pwm_write(
        &mut self,
        address: DriverAddress,
        channel: u16,
        window: PwmWindow,
    ) -> Result<(), Self::Error> {
        self.record(TransportCall::PwmWrite {
            address,
            channel,
            window,
        })
    }
}
