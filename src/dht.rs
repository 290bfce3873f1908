use embedded_hal::delay::DelayNs;

use crate::decode::{self, Reading};
use crate::edge::EdgeRecorder;
use crate::error::DhtError;
use crate::port::{Clock, Completion, DataLine, Direction};
use crate::status::Status;
use crate::timing::Timing;

/// Driver for the DHT11 temperature and humidity sensor.
///
/// The driver only drives the start signal. The frame itself is captured by
/// the [`EdgeRecorder`] from the data line interrupt, and decoded once all
/// edges have arrived.
pub struct Dht<'r, LINE, DELAY, CLOCK, SIGNAL> {
    recorder: &'r EdgeRecorder,
    line: LINE,
    delay: DELAY,
    clock: CLOCK,
    completion: SIGNAL,
    timing: Timing,
}

impl<'r, LINE, DELAY, CLOCK, SIGNAL, E> Dht<'r, LINE, DELAY, CLOCK, SIGNAL>
where
    LINE: DataLine<Error = E>,
    DELAY: DelayNs,
    CLOCK: Clock,
    SIGNAL: Completion,
{
    /// Creates a new instance of the DHT11 driver with datasheet timing.
    ///
    /// # Arguments
    ///
    /// * `recorder` - Edge recorder fed by the data line interrupt.
    /// * `line` - The data line; must be readable from the interrupt.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `clock` - Microsecond clock, the same the interrupt timestamps with.
    /// * `completion` - Signal notified by the recorder on a complete frame.
    pub fn new(
        recorder: &'r EdgeRecorder,
        line: LINE,
        delay: DELAY,
        clock: CLOCK,
        completion: SIGNAL,
    ) -> Self {
        Self::with_timing(recorder, line, delay, clock, completion, Timing::default())
    }

    /// Creates a new instance of the DHT11 driver with custom timing.
    pub fn with_timing(
        recorder: &'r EdgeRecorder,
        line: LINE,
        delay: DELAY,
        clock: CLOCK,
        completion: SIGNAL,
        timing: Timing,
    ) -> Self {
        let dht = Dht {
            recorder,
            line,
            delay,
            clock,
            completion,
            timing,
        };
        dht.reset();
        dht
    }

    /// Forgets any transaction, leaving the driver in [`Status::NoData`].
    ///
    /// Unlike [`abort`](Self::abort) the line is not touched.
    pub fn reset(&self) {
        self.recorder.disarm();
    }

    /// Timing in use.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Reads a temperature and humidity measurement from the DHT11 sensor.
    ///
    /// Sends the start signal, blocks on the completion signal and decodes
    /// the captured frame.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the read is successful and the checksum is valid.
    /// * `Err(DhtError)` if a communication or checksum error occurs.
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        self.start_read()?;
        self.wait_for_completion();
        self.data()
    }

    /// Starts a read transaction.
    ///
    /// Aborts any transaction in progress, sends the start signal and waits
    /// for the first acknowledge edge. The rest of the frame is captured
    /// from the interrupt; call [`wait_for_completion`](Self::wait_for_completion)
    /// or poll [`status`](Self::status) afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::Timeout` if the sensor does not acknowledge.
    pub fn start_read(&mut self) -> Result<(), DhtError<E>> {
        self.abort()?;

        // MCU sends start request
        self.line.set_direction(Direction::Output)?;
        self.line.set_low()?;
        self.delay.delay_ms(self.timing.start_signal_min_ms);
        self.line.set_high()?;

        self.recorder.arm(self.clock.now_us());
        self.line.set_direction(Direction::Input)?;
        self.line.set_edge_events(true)?;

        if let Err(err) = self.wait_for_ack() {
            warn!("dht: no acknowledge from sensor");
            self.abort()?;
            return Err(err);
        }

        trace!("dht: sensor acknowledged");
        Ok(())
    }

    /// Blocks on the completion signal until the frame is complete.
    ///
    /// Depending on the [`Completion`] implementation this may return
    /// immediately; check [`status`](Self::status) afterwards.
    pub fn wait_for_completion(&self) {
        self.completion.wait();
    }

    /// State of the current transaction.
    ///
    /// Returns `Status::NoData`, `Status::Busy`, `Status::DataReady` or
    /// `Status::Timeout`.
    pub fn status(&self) -> Status {
        self.recorder
            .status(self.clock.now_us(), self.timing.edge_timeout_us)
    }

    /// Decodes the captured frame.
    ///
    /// # Errors
    ///
    /// Returns the current status as an error while no complete frame is
    /// available, or the reason the frame is invalid.
    pub fn data(&self) -> Result<Reading, DhtError<E>> {
        let now = self.clock.now_us();
        let timing = &self.timing;

        self.recorder.with(|capture| {
            let Some(frame) = capture.frame() else {
                return Err(match capture.status(now, timing.edge_timeout_us) {
                    Status::Busy => DhtError::Busy,
                    Status::Timeout => DhtError::Timeout,
                    _ => DhtError::NoData,
                });
            };

            let reading = decode::decode(frame, timing).map_err(DhtError::from_decode)?;
            debug!(
                "dht: humidity {}%, temperature {}C",
                reading.humidity.integral,
                reading.temperature.integral
            );
            Ok(reading)
        })
    }

    /// Aborts the transaction in progress.
    ///
    /// Edge events are disabled and the driver returns to `Status::NoData`.
    /// Safe to call at any time.
    pub fn abort(&mut self) -> Result<(), DhtError<E>> {
        self.recorder.disarm();
        self.line.set_edge_events(false)?;
        Ok(())
    }

    /// Number of edges captured in the current transaction.
    pub fn edge_count(&self) -> usize {
        self.recorder.count()
    }

    /// Logs the width of every captured pulse.
    pub fn log_edges(&self) {
        let capture = self.recorder.snapshot();
        for (index, width_us, level) in capture.pulse_widths() {
            trace!("dht: edge {}: {} us {}", index, width_us, level);
        }
    }

    /// Releases the underlying resources.
    pub fn release(self) -> (LINE, DELAY, CLOCK, SIGNAL) {
        (self.line, self.delay, self.clock, self.completion)
    }

    /// Spins until the first edge arrives or the acknowledge timeout expires.
    fn wait_for_ack(&self) -> Result<(), DhtError<E>> {
        let start = self.clock.now_us();

        while self.recorder.with(|capture| capture.is_armed() && capture.count() == 0) {
            if self.clock.now_us().wrapping_sub(start) > self.timing.ack_timeout_us {
                return Err(DhtError::Timeout);
            }
        }

        Ok(())
    }
}
