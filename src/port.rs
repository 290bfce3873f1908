//! Platform ports required by the driver.
//!
//! Levels and delays go through [`embedded-hal`]; the rest of the platform
//! (line direction, edge interrupts, clock, task notification) is expressed
//! by the small traits below.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal

use embedded_hal::digital::OutputPin;

/// Direction of the shared data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// The single data line of the sensor.
///
/// Open-drain pins that are always readable may implement
/// [`set_direction`](DataLine::set_direction) as a no-op.
pub trait DataLine: OutputPin {
    /// Configures the line as input or output.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Enables or disables the edge interrupt that feeds the
    /// [`EdgeRecorder`](crate::EdgeRecorder).
    fn set_edge_events(&mut self, enabled: bool) -> Result<(), Self::Error>;
}

/// Monotonic microsecond counter.
///
/// Wraparound is tolerated by the wrapping arithmetic of the driver as long
/// as a single frame does not span it.
pub trait Clock {
    fn now_us(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

/// Wakes the reading task once a frame is complete.
///
/// [`notify`](Completion::notify) is called from the line interrupt,
/// [`wait`](Completion::wait) from the task. Either may block or return
/// immediately; [`NoopCompletion`] is enough when the task polls the status.
pub trait Completion {
    fn notify(&self);

    fn wait(&self);
}

impl<T: Completion + ?Sized> Completion for &T {
    fn notify(&self) {
        (**self).notify()
    }

    fn wait(&self) {
        (**self).wait()
    }
}

/// [`Completion`] that neither signals nor blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCompletion;

impl Completion for NoopCompletion {
    fn notify(&self) {}

    fn wait(&self) {}
}
