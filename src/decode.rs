//! Frame decoding.
//!
//! A complete frame holds 84 edges. After the two acknowledge edges every
//! data bit occupies two edges (falling, rising) and the bit value is the
//! time until the next falling edge. The 5 bytes of the frame are
//!
//! | byte | first edge |
//! |------|-----------:|
//! | integral RH | 2 |
//! | decimal RH | 18 |
//! | integral T | 34 |
//! | decimal T | 50 |
//! | checksum | 66 |

use crate::edge::{EDGE_CAPACITY, Edge, Level};
use crate::timing::Timing;

/// Edges used by one byte: 8 bits of 2 edges each.
pub const EDGES_PER_BYTE: usize = 16;

pub const HUMIDITY_INTEGRAL_INDEX: usize = 2;
pub const HUMIDITY_DECIMAL_INDEX: usize = 18;
pub const TEMPERATURE_INTEGRAL_INDEX: usize = 34;
pub const TEMPERATURE_DECIMAL_INDEX: usize = 50;
pub const CHECKSUM_INDEX: usize = 66;

/// Integral and decimal part of a measured value.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measurement {
    pub integral: u8,
    pub decimal: u8,
}

impl Measurement {
    pub const fn new(integral: u8, decimal: u8) -> Self {
        Self { integral, decimal }
    }

    /// The value as a float, reading `decimal` as tenths.
    pub fn as_f32(&self) -> f32 {
        self.integral as f32 + self.decimal as f32 / 10.0
    }
}

/// Reading returned by the DHT11 sensor.
///
/// The DHT11 always transmits `0` in the decimal bytes, so `decimal` is never
/// decoded and stays `0`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reading {
    /// Relative humidity in percent.
    pub humidity: Measurement,
    /// Temperature in degrees Celsius.
    pub temperature: Measurement,
    /// Checksum byte as transmitted.
    pub checksum: u8,
}

impl Reading {
    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f32 {
        self.humidity.as_f32()
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> f32 {
        self.temperature.as_f32()
    }

    /// Last 8 bits of the sum of the four data bytes.
    pub fn calculate_checksum(&self) -> u8 {
        [
            self.humidity.integral,
            self.humidity.decimal,
            self.temperature.integral,
            self.temperature.decimal,
        ]
        .iter()
        .fold(0u8, |sum, v| sum.wrapping_add(*v))
    }
}

/// Why a complete frame could not be decoded.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The edge at `index` does not have the level a data bit requires.
    SequenceInvalid { index: usize },
    /// The bit starting at `index` stayed high longer than a `1` bit may.
    BitTooLong { index: usize, duration_us: u32 },
    /// Checksum did not match the received data.
    ChecksumMismatch { received: u8, calculated: u8 },
}

/// Decodes and validates a complete frame.
pub fn decode(edges: &[Edge; EDGE_CAPACITY], timing: &Timing) -> Result<Reading, DecodeError> {
    let humidity = decode_byte(edges, HUMIDITY_INTEGRAL_INDEX, timing)?;
    let temperature = decode_byte(edges, TEMPERATURE_INTEGRAL_INDEX, timing)?;
    let checksum = decode_byte(edges, CHECKSUM_INDEX, timing)?;

    let reading = Reading {
        humidity: Measurement::new(humidity, 0),
        temperature: Measurement::new(temperature, 0),
        checksum,
    };

    let calculated = reading.calculate_checksum();
    if calculated != checksum {
        return Err(DecodeError::ChecksumMismatch {
            received: checksum,
            calculated,
        });
    }

    Ok(reading)
}

/// Decodes the byte whose first edge is `edges[start]`, MSB first.
///
/// Needs `EDGES_PER_BYTE + 1` edges from `start`: the edge after the last
/// bit ends its high level.
pub fn decode_byte(edges: &[Edge], start: usize, timing: &Timing) -> Result<u8, DecodeError> {
    let mut byte: u8 = 0;

    for i in (start..start + EDGES_PER_BYTE).step_by(2) {
        // edges[i]: line low, start of bit
        // edges[i + 1]: line high, bit value
        // edges[i + 2]: start of next bit or end of frame
        let (low, high, next) = match edges.get(i..i + 3) {
            Some([low, high, next]) => (low, high, next),
            _ => return Err(DecodeError::SequenceInvalid { index: i }),
        };

        if low.level != Level::Low {
            return Err(DecodeError::SequenceInvalid { index: i });
        }
        if high.level != Level::High {
            return Err(DecodeError::SequenceInvalid { index: i + 1 });
        }

        let duration_us = next.timestamp.wrapping_sub(high.timestamp);
        let bit = timing
            .classify_bit(duration_us)
            .ok_or(DecodeError::BitTooLong {
                index: i,
                duration_us,
            })?;

        byte = (byte << 1) | bit as u8;
    }

    Ok(byte)
}
