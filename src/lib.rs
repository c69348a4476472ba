//! Address and illuminate a 2-D LED array from a host computer.
//!
//! The array's rows and columns are wired either to digital pins on a microcontroller or to PWM
//! channels on daisy-chained PCA9685 driver boards. A plain-text [configuration](config) binds
//! each logical position to its physical output; [`ArrayController`] then lets callers light
//! positions without caring which kind of output sits behind them.
//!
//! The link to the board is supplied by the caller as a [`Transport`].
//!
//! # Glossary
//!
//! - **Logical position:** a 1-indexed row or column of the array, independent of wiring.
//! - **Direct pin:** a microcontroller output, written in the configuration with driver
//!   address `0`.
//! - **Driver chip:** an I2C-addressed PCA9685 PWM controller with 16 channels. The address is set
//!   with solder jumpers; an unjumpered board answers at `64` (`0x40`).
//! - **Daisy-chaining:** several driver boards on one I2C bus, told apart by their addresses.
//! - **PWM window:** the `(on, off)` tick pair within a 4096-tick PCA9685 cycle.

pub mod address_map;
pub mod config;
pub mod controller;
pub mod dispatch;
mod error;
pub mod level;
pub mod transport;

pub use crate::address_map::AddressMap;
pub use crate::controller::{ArrayController, ControllerConfig};
pub use crate::dispatch::DriverDispatcher;
pub use crate::level::Level;
pub use crate::transport::Transport;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, MalformedReason, Result, TransportError};
