//! JSON numbers with exact 64-bit integers and IEEE doubles.

use crate::error::{Error, Result};
use core::fmt;

const NUMBER_INT64: u8 = 0;
const NUMBER_UINT64: u8 = 1;
const NUMBER_FLOAT64: u8 = 2;

/// Encoded size of a number payload: subtype byte plus 8 value bytes.
pub(crate) const NUMBER_PAYLOAD_LEN: usize = 9;

/// A JSON number.
///
/// Integers that fit `i64` are `Int64`, larger non-negative integers `UInt64`,
/// everything else `Float64`. Equality compares mathematical values, so
/// `Int64(1) == Float64(1.0)`.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    Int64(i64),
    UInt64(u64),
    Float64(f64),
}

impl Number {
    /// Returns the value as `i128` when it is an integer, including integral floats.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Number::Int64(v) => Some(v as i128),
            Number::UInt64(v) => Some(v as i128),
            Number::Float64(v) => {
                // saturating cast; a round trip means the float was integral and in range
                let i = v as i128;
                if i as f64 == v && v.is_finite() {
                    Some(i)
                } else {
                    None
                }
            }
        }
    }

    /// Returns the value as the nearest `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int64(v) => v as f64,
            Number::UInt64(v) => v as f64,
            Number::Float64(v) => v,
        }
    }

    /// Returns true for integer representations and integral floats.
    pub fn is_integral(&self) -> bool {
        self.as_i128().is_some()
    }

    /// Returns true unless this is a NaN or infinite float.
    pub fn is_finite(&self) -> bool {
        match *self {
            Number::Float64(v) => v.is_finite(),
            _ => true,
        }
    }

    pub(crate) fn encode(&self, out: &mut alloc::vec::Vec<u8>) {
        match *self {
            Number::Int64(v) => {
                out.push(NUMBER_INT64);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Number::UInt64(v) => {
                out.push(NUMBER_UINT64);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Number::Float64(v) => {
                out.push(NUMBER_FLOAT64);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() != NUMBER_PAYLOAD_LEN {
            return Err(Error::format(alloc::format!(
                "number payload is {} bytes, expected {}",
                payload.len(),
                NUMBER_PAYLOAD_LEN
            )));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&payload[1..]);
        match payload[0] {
            NUMBER_INT64 => Ok(Number::Int64(i64::from_le_bytes(bytes))),
            NUMBER_UINT64 => Ok(Number::UInt64(u64::from_le_bytes(bytes))),
            NUMBER_FLOAT64 => Ok(Number::Float64(f64::from_le_bytes(bytes))),
            other => Err(Error::format(alloc::format!(
                "unknown number subtype {}",
                other
            ))),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::Float64(a), Number::Float64(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Number::Float64(_), _) | (_, Number::Float64(_)) => {
                match (self.as_i128(), other.as_i128()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => self.as_i128() == other.as_i128(),
        }
    }
}

impl fmt::Display for Number {
    /// Canonical JSON form: integers as digits, floats in shortest
    /// round-trip form with a `.` or exponent, non-finite floats as `null`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int64(v) => write!(f, "{}", v),
            Number::UInt64(v) => write!(f, "{}", v),
            Number::Float64(v) if v.is_finite() => write!(f, "{:?}", v),
            Number::Float64(_) => f.write_str("null"),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int64(v)
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Number::Int64(i),
            Err(_) => Number::UInt64(v),
        }
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float64(v)
    }
}
