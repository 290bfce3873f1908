//! Edge capture.
//!
//! The interrupt handler of the data line feeds every level change into an
//! [`EdgeRecorder`]. The recorder keeps a fixed array of [`Edge`]s and a
//! cursor; the controller arms and aborts it, the interrupt handler is the
//! only one appending to it.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::{InputPin, PinState};

use crate::port::Completion;
use crate::status::Status;

/// Number of edges in a complete frame.
///
/// 2 acknowledge edges + 40 data bits * 2 + 2 end of frame edges.
pub const EDGE_CAPACITY: usize = 84;

/// Logic level of the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Reads the current level of `pin`.
    pub fn sample<P: InputPin>(pin: &mut P) -> Result<Self, P::Error> {
        Ok(if pin.is_high()? { Level::High } else { Level::Low })
    }
}

impl From<PinState> for Level {
    fn from(value: PinState) -> Self {
        match value {
            PinState::Low => Level::Low,
            PinState::High => Level::High,
        }
    }
}

impl From<Level> for PinState {
    fn from(value: Level) -> Self {
        match value {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

/// A recorded level change.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Microsecond timestamp of the change.
    pub timestamp: u32,
    /// Level of the line after the change.
    pub level: Level,
}

impl Edge {
    const EMPTY: Edge = Edge {
        timestamp: 0,
        level: Level::High,
    };

    pub const fn new(timestamp: u32, level: Level) -> Self {
        Self { timestamp, level }
    }
}

/// What [`Capture::record`] did with an edge.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// The edge was dropped (no transaction, frame full, or rising first edge).
    Ignored,
    /// The edge was appended.
    Accepted,
    /// The edge was appended and completed the frame.
    Completed,
}

/// Edges of one transaction.
///
/// `cursor` is `None` while no transaction is running, otherwise the number
/// of edges recorded so far.
#[derive(Clone, Debug)]
pub struct Capture {
    edges: [Edge; EDGE_CAPACITY],
    cursor: Option<usize>,
    armed_at: u32,
}

impl Capture {
    pub const fn new() -> Self {
        Self {
            edges: [Edge::EMPTY; EDGE_CAPACITY],
            cursor: None,
            armed_at: 0,
        }
    }

    /// Starts a new transaction at `now`, discarding previous edges.
    pub fn arm(&mut self, now: u32) {
        self.cursor = Some(0);
        self.armed_at = now;
    }

    /// Ends the transaction; further edges are ignored.
    pub fn disarm(&mut self) {
        self.cursor = None;
    }

    /// Appends an edge if the transaction accepts it.
    ///
    /// The first edge of a frame must be falling.
    pub fn record(&mut self, level: Level, timestamp: u32) -> Recorded {
        let index = match self.cursor {
            Some(0) if level == Level::Low => 0,
            Some(n) if n > 0 && n < EDGE_CAPACITY => n,
            _ => return Recorded::Ignored,
        };

        self.edges[index] = Edge::new(timestamp, level);
        self.cursor = Some(index + 1);

        if index + 1 == EDGE_CAPACITY {
            Recorded::Completed
        } else {
            Recorded::Accepted
        }
    }

    /// Number of edges recorded, `0` when no transaction is running.
    pub fn count(&self) -> usize {
        self.cursor.unwrap_or(0)
    }

    /// Returns `true` while a transaction is running or holds a full frame.
    pub fn is_armed(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns `true` once all [`EDGE_CAPACITY`] edges were recorded.
    pub fn is_complete(&self) -> bool {
        self.cursor == Some(EDGE_CAPACITY)
    }

    /// The edges recorded so far.
    pub fn edges(&self) -> &[Edge] {
        &self.edges[..self.count()]
    }

    /// The full frame, once complete.
    pub fn frame(&self) -> Option<&[Edge; EDGE_CAPACITY]> {
        self.is_complete().then_some(&self.edges)
    }

    /// Evaluates the transaction state at `now`.
    ///
    /// A running transaction times out once more than `edge_timeout_us`
    /// elapsed since the last edge, or since arming if no edge arrived yet.
    /// Callers must poll promptly after being woken: a late poll of a frame
    /// that stalled just before completion reads as a timeout.
    pub fn status(&self, now: u32, edge_timeout_us: u32) -> Status {
        match self.cursor {
            None => Status::NoData,
            Some(EDGE_CAPACITY) => Status::DataReady,
            Some(n) => {
                let last = match n {
                    0 => self.armed_at,
                    _ => self.edges[n - 1].timestamp,
                };
                if now.wrapping_sub(last) > edge_timeout_us {
                    Status::Timeout
                } else {
                    Status::Busy
                }
            }
        }
    }

    /// Iterates over `(index, width_us, level)` for every recorded edge,
    /// where `width_us` is the time until the following edge.
    ///
    /// The last recorded edge has no successor and is not yielded.
    pub fn pulse_widths(&self) -> impl Iterator<Item = (usize, u32, Level)> + '_ {
        self.edges()
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let width = pair[1].timestamp.wrapping_sub(pair[0].timestamp);
                (i, width, pair[0].level)
            })
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Capture`] shared between the data line interrupt and the reading task.
///
/// Every access runs inside a critical section, so a `static` recorder can be
/// used from the interrupt handler and the task alike.
///
/// ```ignore
/// static RECORDER: EdgeRecorder = EdgeRecorder::new();
///
/// #[interrupt]
/// fn IO_IRQ_BANK0() {
///     let level = Level::sample(&mut pin).unwrap();
///     RECORDER.on_edge(level, clock.now_us(), &SIGNAL);
/// }
/// ```
pub struct EdgeRecorder {
    capture: Mutex<RefCell<Capture>>,
}

impl EdgeRecorder {
    pub const fn new() -> Self {
        Self {
            capture: Mutex::new(RefCell::new(Capture::new())),
        }
    }

    /// Records a level change reported by the line interrupt.
    ///
    /// Signals `completion` when the edge completes the frame.
    pub fn on_edge<C>(&self, level: Level, timestamp: u32, completion: &C) -> Recorded
    where
        C: Completion + ?Sized,
    {
        let recorded = self.with_mut(|capture| capture.record(level, timestamp));
        if recorded == Recorded::Completed {
            completion.notify();
        }
        recorded
    }

    pub(crate) fn arm(&self, now: u32) {
        self.with_mut(|capture| capture.arm(now));
    }

    pub(crate) fn disarm(&self) {
        self.with_mut(Capture::disarm);
    }

    /// Number of edges recorded in the current transaction.
    pub fn count(&self) -> usize {
        self.with(Capture::count)
    }

    /// See [`Capture::status`].
    pub fn status(&self, now: u32, edge_timeout_us: u32) -> Status {
        self.with(|capture| capture.status(now, edge_timeout_us))
    }

    /// Copies the current capture.
    pub fn snapshot(&self) -> Capture {
        self.with(Capture::clone)
    }

    /// Runs `f` with shared access to the capture.
    pub fn with<R>(&self, f: impl FnOnce(&Capture) -> R) -> R {
        critical_section::with(|cs| f(&*self.capture.borrow_ref(cs)))
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut Capture) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.capture.borrow_ref_mut(cs)))
    }
}

impl Default for EdgeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::NoopCompletion;
    use core::cell::Cell;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as MockState, Transaction as PinTx,
    };

    struct CountingCompletion {
        notified: Cell<u32>,
    }

    impl Completion for CountingCompletion {
        fn notify(&self) {
            self.notified.set(self.notified.get() + 1);
        }

        fn wait(&self) {}
    }

    fn fill(capture: &mut Capture, edges: usize) {
        for i in 0..edges {
            let level = if i % 2 == 0 { Level::Low } else { Level::High };
            capture.record(level, i as u32 * 10);
        }
    }

    #[test]
    fn test_ignores_edges_before_arming() {
        let mut capture = Capture::new();
        assert_eq!(capture.record(Level::Low, 5), Recorded::Ignored);
        assert_eq!(capture.count(), 0);
        assert!(!capture.is_armed());
    }

    #[test]
    fn test_first_edge_must_be_falling() {
        let mut capture = Capture::new();
        capture.arm(0);

        assert_eq!(capture.record(Level::High, 5), Recorded::Ignored);
        assert_eq!(capture.count(), 0);

        assert_eq!(capture.record(Level::Low, 10), Recorded::Accepted);
        assert_eq!(capture.record(Level::Low, 20), Recorded::Accepted);
        assert_eq!(
            capture.edges(),
            &[Edge::new(10, Level::Low), Edge::new(20, Level::Low)]
        );
    }

    #[test]
    fn test_stops_at_capacity() {
        let mut capture = Capture::new();
        capture.arm(0);
        fill(&mut capture, EDGE_CAPACITY - 1);
        assert!(!capture.is_complete());

        assert_eq!(capture.record(Level::High, 5000), Recorded::Completed);
        assert!(capture.is_complete());
        assert!(capture.frame().is_some());

        assert_eq!(capture.record(Level::Low, 6000), Recorded::Ignored);
        assert_eq!(capture.count(), EDGE_CAPACITY);
        assert_eq!(capture.edges()[EDGE_CAPACITY - 1].timestamp, 5000);
    }

    #[test]
    fn test_status_regimes() {
        let mut capture = Capture::new();
        assert_eq!(capture.status(0, 100), Status::NoData);

        capture.arm(1000);
        assert_eq!(capture.status(1100, 100), Status::Busy);
        assert_eq!(capture.status(1101, 100), Status::Timeout);

        capture.record(Level::Low, 1050);
        assert_eq!(capture.status(1150, 100), Status::Busy);
        assert_eq!(capture.status(1151, 100), Status::Timeout);

        capture.arm(0);
        fill(&mut capture, EDGE_CAPACITY);
        assert_eq!(capture.status(u32::MAX, 100), Status::DataReady);

        capture.disarm();
        assert_eq!(capture.status(0, 100), Status::NoData);
        assert_eq!(capture.count(), 0);
    }

    #[test]
    fn test_busy_until_edge_timeout_for_partial_frames() {
        for edges in 1..EDGE_CAPACITY {
            let mut capture = Capture::new();
            capture.arm(0);
            fill(&mut capture, edges);
            let last = (edges as u32 - 1) * 10;
            assert_eq!(capture.status(last + 100, 100), Status::Busy);
            assert_eq!(capture.status(last + 101, 100), Status::Timeout);
        }
    }

    #[test]
    fn test_arm_discards_previous_frame() {
        let mut capture = Capture::new();
        capture.arm(0);
        fill(&mut capture, EDGE_CAPACITY);

        capture.arm(0);
        assert_eq!(capture.count(), 0);
        assert!(capture.frame().is_none());
    }

    #[test]
    fn test_pulse_widths() {
        let mut capture = Capture::new();
        capture.arm(0);
        capture.record(Level::Low, 100);
        capture.record(Level::High, 180);
        capture.record(Level::Low, 260);

        let widths: Vec<_> = capture.pulse_widths().collect();
        assert_eq!(widths, vec![(0, 80, Level::Low), (1, 80, Level::High)]);
    }

    #[test]
    fn test_recorder_notifies_once_on_completion() {
        let recorder = EdgeRecorder::new();
        let completion = CountingCompletion {
            notified: Cell::new(0),
        };
        recorder.arm(0);

        for i in 0..EDGE_CAPACITY + 4 {
            let level = if i % 2 == 0 { Level::Low } else { Level::High };
            recorder.on_edge(level, i as u32, &completion);
        }

        assert_eq!(completion.notified.get(), 1);
        assert_eq!(recorder.count(), EDGE_CAPACITY);
        assert_eq!(recorder.status(1_000_000, 100), Status::DataReady);
    }

    #[test]
    fn test_recorder_disarm_drops_edges() {
        let recorder = EdgeRecorder::new();
        recorder.arm(0);
        recorder.on_edge(Level::Low, 1, &NoopCompletion);
        recorder.disarm();

        assert_eq!(
            recorder.on_edge(Level::High, 2, &NoopCompletion),
            Recorded::Ignored
        );
        assert_eq!(recorder.count(), 0);
        assert!(!recorder.snapshot().is_armed());
    }

    #[test]
    fn test_recorder_wakes_waiting_thread() {
        use std::sync::{Arc, Condvar, Mutex as StdMutex};

        #[derive(Default)]
        struct ThreadCompletion {
            done: StdMutex<bool>,
            cond: Condvar,
        }

        impl Completion for ThreadCompletion {
            fn notify(&self) {
                *self.done.lock().unwrap() = true;
                self.cond.notify_all();
            }

            fn wait(&self) {
                let mut done = self.done.lock().unwrap();
                while !*done {
                    done = self.cond.wait(done).unwrap();
                }
                *done = false;
            }
        }

        static RECORDER: EdgeRecorder = EdgeRecorder::new();
        let completion = Arc::new(ThreadCompletion::default());
        RECORDER.arm(0);

        let producer = {
            let completion = Arc::clone(&completion);
            std::thread::spawn(move || {
                for i in 0..EDGE_CAPACITY {
                    let level = if i % 2 == 0 { Level::Low } else { Level::High };
                    RECORDER.on_edge(level, i as u32 * 50, &*completion);
                }
            })
        };

        completion.wait();
        producer.join().unwrap();

        assert_eq!(RECORDER.count(), EDGE_CAPACITY);
        assert!(RECORDER.snapshot().frame().is_some());
    }

    #[test]
    fn test_sample_level() {
        let mut pin = PinMock::new(&[
            PinTx::get(MockState::High),
            PinTx::get(MockState::Low),
        ]);

        assert_eq!(Level::sample(&mut pin).unwrap(), Level::High);
        assert_eq!(Level::sample(&mut pin).unwrap(), Level::Low);

        pin.done();
    }

    #[test]
    fn test_level_pin_state_conversion() {
        assert_eq!(Level::from(PinState::Low), Level::Low);
        assert_eq!(PinState::from(Level::High), PinState::High);
    }
}
