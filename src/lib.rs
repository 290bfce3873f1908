//! Interrupt-driven DHT11 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 temperature
//! and humidity sensor. Instead of bit-banging the frame, the driver lets the
//! data line interrupt timestamp every level change and decodes the recorded
//! edges afterwards, so the read survives a busy or preemptive scheduler.
//!
//! # Usage
//! - Keep an [`EdgeRecorder`] in a `static` and call [`EdgeRecorder::on_edge`]
//!   from the data line interrupt with the new [`Level`] and a timestamp.
//! - Create a [`Dht`] with the data line, a delay, the same clock and a
//!   [`Completion`] signal, then call [`Dht::read`], or
//!   [`Dht::start_read`] and poll [`Dht::status`] / [`Dht::data`].
//!
//! # Features
//! - Designed for `no_std` environments
//! - Shared state guarded by [`critical-section`]
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`OutputPin`] for the start signal, [`InputPin`] for sampling in the interrupt
//! - [`DelayNs`] for the start signal duration
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support and emits driver logs
//!
//! [`critical-section`]: https://docs.rs/critical-section
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod decode;
pub mod dht;
pub mod edge;
pub mod error;
pub mod port;
pub mod status;
pub mod timing;

pub use decode::{DecodeError, Measurement, Reading};
pub use dht::Dht;
pub use edge::{Capture, EDGE_CAPACITY, Edge, EdgeRecorder, Level, Recorded};
pub use error::DhtError;
pub use port::{Clock, Completion, DataLine, Direction, NoopCompletion};
pub use status::Status;
pub use timing::Timing;
