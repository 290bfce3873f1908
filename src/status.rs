use core::fmt;

/// Outcome of a read attempt, or the state of the transaction in progress.
///
/// The discriminants are stable bit flags so that statuses can be reported
/// over a wire or combined into a mask.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// The reading was decoded and validated.
    Ok = 0b0000_0000,
    /// No transaction has been started, or the last one was aborted.
    NoData = 0b0000_0001,
    /// A transaction is in progress.
    Busy = 0b0000_0010,
    /// All edges of a frame have been recorded.
    DataReady = 0b0000_0100,
    /// An expected edge did not arrive in time, or a bit was too long.
    Timeout = 0b0000_1000,
    /// The recorded levels do not follow the low/high bit pattern.
    SequenceInvalid = 0b0001_0000,
    /// The checksum byte does not match the data bytes.
    Crc = 0b0010_0000,
}

impl Status {
    /// Numeric status code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Human readable name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "DHT_OK",
            Status::NoData => "DHT_NO_DATA",
            Status::Busy => "DHT_BUSY",
            Status::DataReady => "DHT_DATA_READY",
            Status::Timeout => "DHT_ERR_TIMEOUT",
            Status::SequenceInvalid => "DHT_ERR_SEQUENCE_INVALID",
            Status::Crc => "DHT_ERR_CRC",
        }
    }

    /// Returns `true` for the statuses that end a transaction unsuccessfully.
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Status::Timeout | Status::SequenceInvalid | Status::Crc
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
