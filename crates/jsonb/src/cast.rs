//! Typed extraction of scalars from JSON sub-values.
//!
//! `cast_strict` reports a mismatch or overflow as an error; `try_cast`
//! turns both into SQL NULL. Both report corrupt buffers.

use crate::error::{Error, Result};
use crate::navigator::JsonbRef;
use crate::number::Number;
use crate::path::{evaluate, JsonPath};
use alloc::string::{String, ToString};
use vellum_core::{DataType, Value};

/// Smallest magnitude from which every finite double is an integer.
const F64_INTEGRAL_THRESHOLD: f64 = 9_007_199_254_740_992.0;

/// How a cast reports a value that does not fit its target type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CastMode {
    /// Return `TypeMismatch` or `Overflow`.
    #[default]
    Strict,
    /// Return SQL NULL.
    Lenient,
}

/// Casts a sub-value to `target`.
///
/// JSON null becomes SQL NULL for every target except `Jsonb`, which keeps
/// a JSON null document.
pub fn cast(value: JsonbRef<'_>, target: DataType, mode: CastMode) -> Result<Value> {
    match cast_value(value, target) {
        Err(e) if mode == CastMode::Lenient && e.is_cast_failure() => Ok(Value::Null),
        result => result,
    }
}

/// Casts in strict mode.
pub fn cast_strict(value: JsonbRef<'_>, target: DataType) -> Result<Value> {
    cast(value, target, CastMode::Strict)
}

/// Casts in lenient mode: mismatches become SQL NULL.
pub fn try_cast(value: JsonbRef<'_>, target: DataType) -> Result<Value> {
    cast(value, target, CastMode::Lenient)
}

/// Evaluates `path` on `buf` and casts the result. An absent path is NULL.
pub fn cast_path(buf: &[u8], path: &JsonPath, target: DataType, mode: CastMode) -> Result<Value> {
    match evaluate(buf, path)? {
        Some(value) => cast(value, target, mode),
        None => Ok(Value::Null),
    }
}

fn cast_value(value: JsonbRef<'_>, target: DataType) -> Result<Value> {
    if target == DataType::Jsonb {
        return Ok(Value::from(value.to_binary()));
    }
    if value.is_null() {
        return Ok(Value::Null);
    }
    match target {
        DataType::Boolean => cast_boolean(value),
        DataType::Float64 => cast_float(value),
        DataType::String => Ok(Value::String(match value {
            JsonbRef::String(s) => s.to_string(),
            other => other.to_text()?,
        })),
        _ => cast_integer(value, target),
    }
}

fn mismatch(value: &JsonbRef<'_>, target: DataType) -> Error {
    Error::type_mismatch(value.kind(), target)
}

fn cast_integer(value: JsonbRef<'_>, target: DataType) -> Result<Value> {
    let n = match value {
        JsonbRef::Bool(b) => b as i128,
        JsonbRef::Number(n) => match n.as_i128() {
            Some(i) => i,
            None => return Err(non_integral_number(&value, n, target)),
        },
        JsonbRef::String(s) => parse_integer(s, &value, target)?,
        _ => return Err(mismatch(&value, target)),
    };
    Value::integer(target, n).ok_or_else(|| Error::overflow(n.to_string(), target))
}

/// Fractional numbers do not fit an integer type; integral ones beyond
/// `i128` overflow it.
fn non_integral_number(value: &JsonbRef<'_>, n: Number, target: DataType) -> Error {
    let f = n.as_f64();
    if n.is_finite() && (f >= F64_INTEGRAL_THRESHOLD || f <= -F64_INTEGRAL_THRESHOLD) {
        Error::overflow(n.to_string(), target)
    } else {
        mismatch(value, target)
    }
}

fn parse_integer(s: &str, value: &JsonbRef<'_>, target: DataType) -> Result<i128> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i128>() {
        return Ok(n);
    }
    let digits = trimmed.strip_prefix(|c| c == '+' || c == '-').unwrap_or(trimmed);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Err(Error::overflow(String::from(trimmed), target))
    } else {
        Err(mismatch(value, target))
    }
}

fn cast_float(value: JsonbRef<'_>) -> Result<Value> {
    let f = match value {
        JsonbRef::Number(n) => n.as_f64(),
        JsonbRef::Bool(b) => {
            if b {
                1.0
            } else {
                0.0
            }
        }
        JsonbRef::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => f,
            _ => return Err(mismatch(&value, DataType::Float64)),
        },
        _ => return Err(mismatch(&value, DataType::Float64)),
    };
    if !f.is_finite() {
        return Err(mismatch(&value, DataType::Float64));
    }
    Ok(Value::Float64(f))
}

fn cast_boolean(value: JsonbRef<'_>) -> Result<Value> {
    match value {
        JsonbRef::Bool(b) => Ok(Value::Boolean(b)),
        JsonbRef::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
        JsonbRef::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
        _ => Err(mismatch(&value, DataType::Boolean)),
    }
}
