//! DHT11 protocol timing.
//!
//! ```txt
//!      START          ACK    READY   SOT   0 BIT   SOT   1 BIT        END
//!  ──┐          ┌──┐      ┌──────┐      ┌────┐      ┌────────┐      ┌──
//!    │          │  │      │      │      │    │      │        │      │
//!    └──────────┘  └──────┘      └──────┘    └──────┘        └──────┘
//!      18-20ms    20-40us  80us    80us  50us  26-28us 50us    70us   50us
//! ```
//!
//! The host holds the line low for the start window and releases it. The
//! sensor acknowledges with 80us low and 80us high, then sends 40 bits. Each
//! bit starts with 50us low; the length of the following high level encodes
//! the value. A final 50us low ends the frame.

/// Minimum duration of the start signal (line held low by the host).
pub const START_SIGNAL_MIN_MS: u32 = 18;
/// Maximum duration of the start signal.
pub const START_SIGNAL_MAX_MS: u32 = 20;

/// Time allowed for the first (falling) acknowledge edge after release.
pub const ACK_TIMEOUT_US: u32 = 60; // 40us + reserve

/// Maximum gap between two consecutive edges of a frame.
pub const EDGE_TIMEOUT_US: u32 = 100;

/// Longest high level still decoded as a `0` bit.
pub const BIT_0_MAX_US: u32 = 35; // 28us + reserve
/// Longest high level accepted at all; anything above is a timeout.
pub const BIT_1_MAX_US: u32 = 80; // 70us + reserve

/// Timing thresholds used while reading and decoding a frame.
///
/// [`Timing::default`] returns the DHT11 datasheet values. Tweak individual
/// fields for slow interrupt latencies or clones that drift from the datasheet.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Lower bound of the start signal window, in milliseconds.
    pub start_signal_min_ms: u32,
    /// Upper bound of the start signal window, in milliseconds.
    pub start_signal_max_ms: u32,
    /// Maximum wait for the first acknowledge edge, in microseconds.
    pub ack_timeout_us: u32,
    /// Maximum gap between edges before the frame is considered stalled.
    pub edge_timeout_us: u32,
    /// Longest high level decoded as a `0` bit.
    pub bit_0_max_us: u32,
    /// Longest high level accepted for a `1` bit.
    pub bit_1_max_us: u32,
}

impl Timing {
    /// Datasheet timing.
    pub const fn dht11() -> Self {
        Self {
            start_signal_min_ms: START_SIGNAL_MIN_MS,
            start_signal_max_ms: START_SIGNAL_MAX_MS,
            ack_timeout_us: ACK_TIMEOUT_US,
            edge_timeout_us: EDGE_TIMEOUT_US,
            bit_0_max_us: BIT_0_MAX_US,
            bit_1_max_us: BIT_1_MAX_US,
        }
    }

    /// Classifies the high level duration of a single data bit.
    ///
    /// Returns `None` when the duration exceeds the `1` bit maximum.
    pub const fn classify_bit(&self, high_us: u32) -> Option<bool> {
        if high_us > self.bit_1_max_us {
            None
        } else {
            Some(high_us > self.bit_0_max_us)
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::dht11()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_datasheet() {
        let timing = Timing::default();
        assert_eq!(timing.start_signal_min_ms, 18);
        assert_eq!(timing.start_signal_max_ms, 20);
        assert_eq!(timing.ack_timeout_us, 60);
        assert_eq!(timing.edge_timeout_us, 100);
    }

    #[test]
    fn test_classify_bit_thresholds() {
        let timing = Timing::default();
        assert_eq!(timing.classify_bit(0), Some(false));
        assert_eq!(timing.classify_bit(BIT_0_MAX_US), Some(false));
        assert_eq!(timing.classify_bit(BIT_0_MAX_US + 1), Some(true));
        assert_eq!(timing.classify_bit(BIT_1_MAX_US), Some(true));
        assert_eq!(timing.classify_bit(BIT_1_MAX_US + 1), None);
    }
}
