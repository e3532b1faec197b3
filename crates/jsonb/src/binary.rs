//! Binary encoding for JSONB values.
//!
//! The encoder makes a single bottom-up pass into one output buffer. Each
//! container reserves its header and entry directory, appends every child's
//! payload (recursing in place for nested containers) and patches the child's
//! end offset once the payload is written.

use crate::error::{Error, Result};
use crate::format::{
    write_u32, ContainerKind, EntryTag, JEntry, MAX_CONTAINER_SIZE, MAX_DEPTH, WORD,
};
use crate::navigator::{validate, JsonbRef};
use crate::value::JsonbValue;
use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use tracing::trace;
use vellum_core::{JsonbBytes, Value};

/// How the encoder treats NaN and infinite floats, which JSON cannot represent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NonFinitePolicy {
    /// Fail with `MalformedInput`.
    #[default]
    Reject,
    /// Encode as JSON null.
    Null,
}

/// Encoder configuration.
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    non_finite: NonFinitePolicy,
}

impl EncodeOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy for NaN and infinite floats.
    pub fn non_finite(mut self, policy: NonFinitePolicy) -> Self {
        self.non_finite = policy;
        self
    }

    /// Returns the policy for NaN and infinite floats.
    pub fn non_finite_policy(&self) -> NonFinitePolicy {
        self.non_finite
    }
}

/// Encodes value trees into the binary format.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    /// Encodes `value` into a fresh buffer.
    pub fn encode(&self, value: &JsonbValue) -> Result<JsonbBinary> {
        let mut out = Vec::new();
        match value {
            JsonbValue::Array(_) | JsonbValue::Object(_) => {
                self.write_container(value, &mut out, 0)?
            }
            scalar => {
                out.resize(2 * WORD, 0);
                write_u32(&mut out, 0, ContainerKind::Scalar.header(1));
                let tag = self.write_payload(scalar, &mut out, 0)?;
                let end = check_offset(out.len() - 2 * WORD, MAX_CONTAINER_SIZE)?;
                write_u32(&mut out, WORD, JEntry::new(tag, end).encode());
            }
        }
        Ok(JsonbBinary { data: out })
    }

    fn write_container(&self, value: &JsonbValue, out: &mut Vec<u8>, depth: usize) -> Result<()> {
        if depth >= MAX_DEPTH {
            return Err(Error::malformed(format!(
                "nesting exceeds {} levels",
                MAX_DEPTH
            )));
        }
        let (kind, count) = match value {
            JsonbValue::Array(items) => (ContainerKind::Array, items.len()),
            JsonbValue::Object(obj) => (ContainerKind::Object, obj.len()),
            _ => return Err(Error::malformed("expected a container")),
        };
        if count > MAX_CONTAINER_SIZE {
            return Err(Error::TooLarge {
                size: count,
                limit: MAX_CONTAINER_SIZE,
            });
        }

        let start = out.len();
        let entries = kind.entry_count(count);
        let data_start = start + WORD + entries * WORD;
        out.resize(data_start, 0);
        write_u32(out, start, kind.header(count));

        let mut slot = 0;
        let finish = |out: &mut Vec<u8>, tag: EntryTag, slot: &mut usize| -> Result<()> {
            let end = check_offset(out.len() - data_start, MAX_CONTAINER_SIZE)?;
            write_u32(out, start + WORD + *slot * WORD, JEntry::new(tag, end).encode());
            *slot += 1;
            Ok(())
        };

        match value {
            JsonbValue::Array(items) => {
                for item in items {
                    let tag = self.write_payload(item, out, depth)?;
                    finish(out, tag, &mut slot)?;
                }
            }
            JsonbValue::Object(obj) => {
                for key in obj.keys() {
                    out.extend_from_slice(key.as_bytes());
                    finish(out, EntryTag::String, &mut slot)?;
                }
                for item in obj.values() {
                    let tag = self.write_payload(item, out, depth)?;
                    finish(out, tag, &mut slot)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Appends the payload of a child of a container at `depth`.
    fn write_payload(&self, value: &JsonbValue, out: &mut Vec<u8>, depth: usize) -> Result<EntryTag> {
        Ok(match value {
            JsonbValue::Null => EntryTag::Null,
            JsonbValue::Bool(false) => EntryTag::False,
            JsonbValue::Bool(true) => EntryTag::True,
            JsonbValue::Number(n) if !n.is_finite() => match self.options.non_finite {
                NonFinitePolicy::Reject => {
                    return Err(Error::malformed(format!(
                        "non-finite number {:?} cannot be encoded",
                        n.as_f64()
                    )))
                }
                NonFinitePolicy::Null => {
                    trace!(value = n.as_f64(), "encoded non-finite number as null");
                    EntryTag::Null
                }
            },
            JsonbValue::Number(n) => {
                n.encode(out);
                EntryTag::Number
            }
            JsonbValue::String(s) => {
                out.extend_from_slice(s.as_bytes());
                EntryTag::String
            }
            JsonbValue::Array(_) | JsonbValue::Object(_) => {
                self.write_container(value, out, depth + 1)?;
                EntryTag::Container
            }
        })
    }
}

/// Rejects an entry end offset that does not fit the JEntry offset bits.
fn check_offset(end: usize, limit: usize) -> Result<usize> {
    if end > limit {
        return Err(Error::TooLarge { size: end, limit });
    }
    Ok(end)
}

/// An owned, encoded JSON document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JsonbBinary {
    data: Vec<u8>,
}

impl JsonbBinary {
    /// Wraps bytes after validating the whole buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        validate(&data)?;
        Ok(Self { data })
    }

    /// Wraps bytes without validation. Navigation still bounds-checks.
    pub fn from_bytes_unchecked(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Encodes a JSON null.
    pub fn null() -> Self {
        let mut data = vec![0u8; 2 * WORD];
        write_u32(&mut data, 0, ContainerKind::Scalar.header(1));
        write_u32(&mut data, WORD, JEntry::new(EntryTag::Null, 0).encode());
        Self { data }
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes self and returns the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes a JsonbValue with default options.
    pub fn encode(value: &JsonbValue) -> Result<Self> {
        Encoder::default().encode(value)
    }

    /// Encodes a JsonbValue with the given options.
    pub fn encode_with(value: &JsonbValue, options: &EncodeOptions) -> Result<Self> {
        Encoder::new(options.clone()).encode(value)
    }

    /// Decodes the whole buffer into a value tree.
    pub fn decode(&self) -> Result<JsonbValue> {
        self.root()?.to_value()
    }

    /// Returns a borrowed view of the root value.
    pub fn root(&self) -> Result<JsonbRef<'_>> {
        JsonbRef::from_slice(&self.data)
    }

    /// Copies a borrowed sub-value into a standalone buffer. Containers are
    /// copied verbatim, scalars get a wrapper.
    pub(crate) fn from_ref(value: &JsonbRef<'_>) -> Self {
        let mut data = vec![0u8; 2 * WORD];
        write_u32(&mut data, 0, ContainerKind::Scalar.header(1));
        let tag = match value {
            JsonbRef::Array(c) | JsonbRef::Object(c) => {
                return Self {
                    data: c.as_bytes().to_vec(),
                }
            }
            JsonbRef::Null => EntryTag::Null,
            JsonbRef::Bool(false) => EntryTag::False,
            JsonbRef::Bool(true) => EntryTag::True,
            JsonbRef::Number(n) => {
                n.encode(&mut data);
                EntryTag::Number
            }
            JsonbRef::String(s) => {
                data.extend_from_slice(s.as_bytes());
                EntryTag::String
            }
        };
        let end = data.len() - 2 * WORD;
        write_u32(&mut data, WORD, JEntry::new(tag, end).encode());
        Self { data }
    }
}

impl AsRef<[u8]> for JsonbBinary {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<JsonbBinary> for JsonbBytes {
    fn from(binary: JsonbBinary) -> Self {
        JsonbBytes::new(binary.data)
    }
}

impl From<JsonbBinary> for Value {
    fn from(binary: JsonbBinary) -> Self {
        Value::Jsonb(binary.into())
    }
}

impl TryFrom<&JsonbValue> for JsonbBinary {
    type Error = Error;

    fn try_from(value: &JsonbValue) -> Result<Self> {
        JsonbBinary::encode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;
    use crate::value::JsonbObject;

    fn sample() -> JsonbValue {
        let mut inner = JsonbObject::new();
        inner.insert("b".into(), 1i64.into());
        inner.insert(
            "c".into(),
            JsonbValue::Array(vec![1i64.into(), 2i64.into()]),
        );
        let mut root = JsonbObject::new();
        root.insert("a".into(), JsonbValue::Object(inner));
        JsonbValue::Object(root)
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let value = sample();
        let binary = JsonbBinary::encode(&value).unwrap();
        assert_eq!(binary.decode().unwrap(), value);
    }

    #[test]
    fn test_scalar_root_uses_wrapper() {
        let binary = JsonbBinary::encode(&JsonbValue::from("hi")).unwrap();
        assert_eq!(
            binary.as_bytes(),
            &[1, 0, 0, 0x20, 2, 0, 0, 0x10, b'h', b'i']
        );
        assert_eq!(binary.decode().unwrap(), JsonbValue::from("hi"));
    }

    #[test]
    fn test_entry_offset_limit() {
        assert_eq!(check_offset(16, 16).unwrap(), 16);
        assert!(matches!(
            check_offset(17, 16),
            Err(Error::TooLarge { size: 17, limit: 16 })
        ));

        // the largest accepted offset survives the entry codec unmasked
        let end = check_offset(MAX_CONTAINER_SIZE, MAX_CONTAINER_SIZE).unwrap();
        let entry = JEntry::decode(JEntry::new(EntryTag::String, end).encode()).unwrap();
        assert_eq!(entry.end, MAX_CONTAINER_SIZE);
        assert!(matches!(
            check_offset(MAX_CONTAINER_SIZE + 1, MAX_CONTAINER_SIZE),
            Err(Error::TooLarge { .. })
        ));
    }

    #[test]
    fn test_array_layout() {
        let value = JsonbValue::Array(vec![JsonbValue::Null, true.into(), "ab".into()]);
        let binary = JsonbBinary::encode(&value).unwrap();
        let bytes = binary.as_bytes();
        // header, three entries, two bytes of data
        assert_eq!(bytes.len(), 4 + 12 + 2);
        assert_eq!(&bytes[0..4], &0x8000_0003u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x0000_0000u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0x4000_0000u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &0x1000_0002u32.to_le_bytes());
    }

    #[test]
    fn test_object_keys_sorted_in_encoding() {
        let mut obj = JsonbObject::new();
        obj.insert("zeta".into(), 1i64.into());
        obj.insert("alpha".into(), 2i64.into());
        let binary = JsonbBinary::encode(&JsonbValue::Object(obj)).unwrap();
        let keys: Vec<_> = match binary.root().unwrap() {
            JsonbRef::Object(c) => (0..c.len()).map(|i| c.key_at(i).unwrap().unwrap()).collect(),
            _ => panic!("expected object"),
        };
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_integers_exact() {
        let value = JsonbValue::Array(vec![
            i64::MIN.into(),
            u64::MAX.into(),
            0.1.into(),
        ]);
        let decoded = JsonbBinary::encode(&value).unwrap().decode().unwrap();
        assert!(matches!(decoded.get_index(0), Some(JsonbValue::Number(Number::Int64(i64::MIN)))));
        assert!(matches!(decoded.get_index(1), Some(JsonbValue::Number(Number::UInt64(u64::MAX)))));
        assert_eq!(decoded.get_index(2).and_then(|v| v.as_f64()), Some(0.1));
    }

    #[test]
    fn test_non_finite_policy() {
        let value = JsonbValue::Array(vec![f64::NAN.into()]);
        assert!(matches!(
            JsonbBinary::encode(&value),
            Err(Error::MalformedInput { .. })
        ));
        assert!(matches!(
            JsonbBinary::encode(&JsonbValue::from(f64::INFINITY)),
            Err(Error::MalformedInput { .. })
        ));

        let options = EncodeOptions::new().non_finite(NonFinitePolicy::Null);
        let binary = JsonbBinary::encode_with(&value, &options).unwrap();
        assert_eq!(
            binary.decode().unwrap(),
            JsonbValue::Array(vec![JsonbValue::Null])
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut value = JsonbValue::Array(vec![]);
        for _ in 0..MAX_DEPTH {
            value = JsonbValue::Array(vec![value]);
        }
        assert!(matches!(
            JsonbBinary::encode(&value),
            Err(Error::MalformedInput { .. })
        ));

        let mut value = JsonbValue::Array(vec![]);
        for _ in 0..MAX_DEPTH - 1 {
            value = JsonbValue::Array(vec![value]);
        }
        let binary = JsonbBinary::encode(&value).unwrap();
        assert_eq!(binary.decode().unwrap(), value);
    }

    #[test]
    fn test_null_buffer() {
        assert_eq!(JsonbBinary::null().decode().unwrap(), JsonbValue::Null);
        assert_eq!(
            JsonbBinary::null(),
            JsonbBinary::encode(&JsonbValue::Null).unwrap()
        );
    }

    #[test]
    fn test_from_bytes_validates() {
        assert!(JsonbBinary::from_bytes(vec![1, 2, 3]).is_err());
        let good = JsonbBinary::encode(&sample()).unwrap().into_bytes();
        assert!(JsonbBinary::from_bytes(good).is_ok());
    }
}
