use crate::decode::DecodeError;
use crate::status::Status;

/// Possible errors from the DHT11 driver.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DhtError<E> {
    /// No transaction has been started, or it was aborted.
    #[error("no data: read not started")]
    NoData,
    /// The transaction is still collecting edges.
    #[error("read in progress")]
    Busy,
    /// The sensor did not answer in time, or a bit was too long.
    #[error("timed out waiting for the sensor")]
    Timeout,
    /// Recorded levels do not form a valid bit sequence.
    #[error("invalid edge sequence")]
    SequenceInvalid,
    /// Checksum did not match the received data.
    #[error("checksum mismatch: received {received:#04x}, calculated {calculated:#04x}")]
    ChecksumMismatch { received: u8, calculated: u8 },
    /// Error from the data line (direction, level or edge events).
    #[error("data line error: {0:?}")]
    Line(E),
}

impl<E> DhtError<E> {
    /// Maps the error onto the read status taxonomy.
    ///
    /// Line errors have no status counterpart and return `None`.
    pub fn status(&self) -> Option<Status> {
        match self {
            DhtError::NoData => Some(Status::NoData),
            DhtError::Busy => Some(Status::Busy),
            DhtError::Timeout => Some(Status::Timeout),
            DhtError::SequenceInvalid => Some(Status::SequenceInvalid),
            DhtError::ChecksumMismatch { .. } => Some(Status::Crc),
            DhtError::Line(_) => None,
        }
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::Line(value)
    }
}

impl<E> DhtError<E> {
    /// Converts a frame decoding failure into the driver error.
    ///
    /// A bit whose high level is too long is reported as a timeout.
    pub fn from_decode(value: DecodeError) -> Self {
        match value {
            DecodeError::SequenceInvalid { .. } => Self::SequenceInvalid,
            DecodeError::BitTooLong { .. } => Self::Timeout,
            DecodeError::ChecksumMismatch {
                received,
                calculated,
            } => Self::ChecksumMismatch {
                received,
                calculated,
            },
        }
    }
}
