//! Zero-copy navigation over encoded buffers.
//!
//! `JsonbRef` and `ContainerRef` borrow the buffer and decode nothing up
//! front. Object keys are located by binary search over the raw key bytes,
//! array elements by direct entry access.

use crate::binary::JsonbBinary;
use crate::error::{Error, Result};
use crate::format::{read_u32, ContainerKind, EntryTag, JEntry, MAX_DEPTH, WORD};
use crate::number::Number;
use crate::path::PathStep;
use crate::value::{JsonbKind, JsonbObject, JsonbValue};
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Range;

/// A borrowed view of one value inside an encoded buffer.
#[derive(Clone, Copy, Debug)]
pub enum JsonbRef<'a> {
    Null,
    Bool(bool),
    Number(Number),
    String(&'a str),
    Array(ContainerRef<'a>),
    Object(ContainerRef<'a>),
}

/// The outcome of applying one path step.
#[derive(Clone, Copy, Debug)]
pub enum Lookup<'a> {
    /// The step selected a child.
    Found(JsonbRef<'a>),
    /// The key or index does not exist.
    NotFound,
    /// The step does not apply to this kind of value.
    TypeMismatch,
}

impl<'a> Lookup<'a> {
    /// Collapses `NotFound` and `TypeMismatch` to `None`.
    pub fn into_option(self) -> Option<JsonbRef<'a>> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// A borrowed array or object: the complete container encoding.
#[derive(Clone, Copy, Debug)]
pub struct ContainerRef<'a> {
    buf: &'a [u8],
    kind: ContainerKind,
    len: usize,
}

impl<'a> ContainerRef<'a> {
    /// Reads the header and checks that the entry directory fits.
    fn parse(buf: &'a [u8]) -> Result<Self> {
        let (kind, len) = ContainerKind::decode_header(read_u32(buf, 0)?)?;
        if kind == ContainerKind::Scalar && len != 1 {
            return Err(Error::format(format!(
                "scalar wrapper declares {} entries",
                len
            )));
        }
        let needed = WORD + kind.entry_count(len) * WORD;
        if buf.len() < needed {
            return Err(Error::format(format!(
                "buffer of {} bytes cannot hold {} entries",
                buf.len(),
                kind.entry_count(len)
            )));
        }
        Ok(Self { buf, kind, len })
    }

    /// Returns the number of elements (arrays) or key-value pairs (objects).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the container has no children.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.kind == ContainerKind::Array
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        self.kind == ContainerKind::Object
    }

    /// Returns the raw encoding of this container.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    fn data_start(&self) -> usize {
        WORD + self.kind.entry_count(self.len) * WORD
    }

    fn entry(&self, slot: usize) -> Result<JEntry> {
        JEntry::decode(read_u32(self.buf, WORD + slot * WORD)?)
    }

    /// Returns the entry and absolute byte range of the child in `slot`.
    fn slot_range(&self, slot: usize) -> Result<(JEntry, Range<usize>)> {
        let entry = self.entry(slot)?;
        let start = if slot == 0 { 0 } else { self.entry(slot - 1)?.end };
        let data_start = self.data_start();
        if start > entry.end || data_start + entry.end > self.buf.len() {
            return Err(Error::format(format!(
                "entry {} spans {}..{} outside data region of {} bytes",
                slot,
                start,
                entry.end,
                self.buf.len() - data_start
            )));
        }
        Ok((entry, data_start + start..data_start + entry.end))
    }

    fn slot_value(&self, slot: usize) -> Result<JsonbRef<'a>> {
        let (entry, range) = self.slot_range(slot)?;
        decode_child(entry.tag, &self.buf[range])
    }

    fn key_bytes(&self, i: usize) -> Result<&'a [u8]> {
        let (entry, range) = self.slot_range(i)?;
        if entry.tag != EntryTag::String {
            return Err(Error::format(format!("object key {} is not a string", i)));
        }
        Ok(&self.buf[range])
    }

    /// Returns element `i` of an array, or value `i` of an object.
    pub fn get(&self, i: usize) -> Result<Option<JsonbRef<'a>>> {
        match self.kind {
            ContainerKind::Object => self.value_at(i),
            _ if i < self.len => self.slot_value(i).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns the `i`-th key of an object in ascending order.
    pub fn key_at(&self, i: usize) -> Result<Option<&'a str>> {
        if !self.is_object() || i >= self.len {
            return Ok(None);
        }
        let bytes = self.key_bytes(i)?;
        core::str::from_utf8(bytes)
            .map(Some)
            .map_err(|_| Error::format("object key is not valid UTF-8"))
    }

    /// Returns the value paired with the `i`-th key of an object.
    pub fn value_at(&self, i: usize) -> Result<Option<JsonbRef<'a>>> {
        if !self.is_object() || i >= self.len {
            return Ok(None);
        }
        self.slot_value(self.len + i).map(Some)
    }

    /// Looks up `key` in an object by binary search over the raw key bytes.
    pub fn find_key(&self, key: &str) -> Result<Option<JsonbRef<'a>>> {
        if !self.is_object() {
            return Ok(None);
        }
        let needle = key.as_bytes();
        let (mut lo, mut hi) = (0, self.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key_bytes(mid)?.cmp(needle) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return self.slot_value(self.len + mid).map(Some),
            }
        }
        Ok(None)
    }

    /// Applies one path step to this container.
    pub fn step(&self, step: &PathStep) -> Result<Lookup<'a>> {
        match (step, self.kind) {
            (PathStep::Key(key), ContainerKind::Object) => Ok(match self.find_key(key)? {
                Some(v) => Lookup::Found(v),
                None => Lookup::NotFound,
            }),
            (PathStep::Index(i), ContainerKind::Array) => {
                match usize::try_from(*i) {
                    Ok(i) if i < self.len => self.slot_value(i).map(Lookup::Found),
                    _ => Ok(Lookup::NotFound),
                }
            }
            _ => Ok(Lookup::TypeMismatch),
        }
    }

    /// Iterates array elements. Empty for objects.
    pub fn array_iter(&self) -> ArrayIter<'a> {
        ArrayIter {
            container: *self,
            next: 0,
            end: if self.is_array() { self.len } else { 0 },
        }
    }

    /// Iterates object entries in ascending key order. Empty for arrays.
    pub fn object_iter(&self) -> ObjectIter<'a> {
        ObjectIter {
            container: *self,
            next: 0,
            end: if self.is_object() { self.len } else { 0 },
        }
    }
}

/// Iterator over the elements of an array.
pub struct ArrayIter<'a> {
    container: ContainerRef<'a>,
    next: usize,
    end: usize,
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Result<JsonbRef<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(self.container.slot_value(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

/// Iterator over the key-value pairs of an object.
pub struct ObjectIter<'a> {
    container: ContainerRef<'a>,
    next: usize,
    end: usize,
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = Result<(&'a str, JsonbRef<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let i = self.next;
        self.next += 1;
        let pair = self.container.key_at(i).and_then(|key| {
            let value = self.container.slot_value(self.container.len + i)?;
            match key {
                Some(key) => Ok((key, value)),
                None => Err(Error::format("object key out of range")),
            }
        });
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

/// Interprets a child payload according to its entry tag.
fn decode_child(tag: EntryTag, payload: &[u8]) -> Result<JsonbRef<'_>> {
    match tag {
        EntryTag::Null => Ok(JsonbRef::Null),
        EntryTag::False => Ok(JsonbRef::Bool(false)),
        EntryTag::True => Ok(JsonbRef::Bool(true)),
        EntryTag::Number => Number::decode(payload).map(JsonbRef::Number),
        EntryTag::String => core::str::from_utf8(payload)
            .map(JsonbRef::String)
            .map_err(|_| Error::format("string is not valid UTF-8")),
        EntryTag::Container => {
            let container = ContainerRef::parse(payload)?;
            match container.kind {
                ContainerKind::Array => Ok(JsonbRef::Array(container)),
                ContainerKind::Object => Ok(JsonbRef::Object(container)),
                ContainerKind::Scalar => Err(Error::format("nested container uses the scalar wrapper")),
            }
        }
    }
}

impl<'a> JsonbRef<'a> {
    /// Opens the root value of an encoded buffer.
    pub fn from_slice(buf: &'a [u8]) -> Result<Self> {
        let root = ContainerRef::parse(buf)?;
        match root.kind {
            ContainerKind::Scalar => {
                let value = root.slot_value(0)?;
                if matches!(value, JsonbRef::Array(_) | JsonbRef::Object(_)) {
                    return Err(Error::format("scalar wrapper holds a container"));
                }
                Ok(value)
            }
            ContainerKind::Array => Ok(JsonbRef::Array(root)),
            ContainerKind::Object => Ok(JsonbRef::Object(root)),
        }
    }

    /// Returns the kind of this value.
    pub fn kind(&self) -> JsonbKind {
        match self {
            JsonbRef::Null => JsonbKind::Null,
            JsonbRef::Bool(_) => JsonbKind::Boolean,
            JsonbRef::Number(_) => JsonbKind::Number,
            JsonbRef::String(_) => JsonbKind::String,
            JsonbRef::Array(_) => JsonbKind::Array,
            JsonbRef::Object(_) => JsonbKind::Object,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, JsonbRef::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonbRef::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            JsonbRef::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            JsonbRef::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the container if this is an array or object.
    pub fn as_container(&self) -> Option<ContainerRef<'a>> {
        match self {
            JsonbRef::Array(c) | JsonbRef::Object(c) => Some(*c),
            _ => None,
        }
    }

    /// Applies one path step. Scalars report `TypeMismatch`.
    pub fn step(&self, step: &PathStep) -> Result<Lookup<'a>> {
        match self.as_container() {
            Some(c) => c.step(step),
            None => Ok(Lookup::TypeMismatch),
        }
    }

    /// Decodes this value and everything below it into a tree.
    pub fn to_value(&self) -> Result<JsonbValue> {
        self.to_value_at(0)
    }

    fn to_value_at(&self, depth: usize) -> Result<JsonbValue> {
        Ok(match self {
            JsonbRef::Null => JsonbValue::Null,
            JsonbRef::Bool(b) => JsonbValue::Bool(*b),
            JsonbRef::Number(n) => JsonbValue::Number(*n),
            JsonbRef::String(s) => JsonbValue::String(s.to_string()),
            JsonbRef::Array(c) => {
                check_depth(depth)?;
                let mut items = Vec::with_capacity(c.len());
                for item in c.array_iter() {
                    items.push(item?.to_value_at(depth + 1)?);
                }
                JsonbValue::Array(items)
            }
            JsonbRef::Object(c) => {
                check_depth(depth)?;
                let mut obj = JsonbObject::with_capacity(c.len());
                for pair in c.object_iter() {
                    let (key, value) = pair?;
                    obj.insert(key.to_string(), value.to_value_at(depth + 1)?);
                }
                JsonbValue::Object(obj)
            }
        })
    }

    /// Copies this value into a standalone buffer.
    pub fn to_binary(&self) -> JsonbBinary {
        JsonbBinary::from_ref(self)
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(Error::format(format!(
            "nesting exceeds {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

/// Fully validates an encoded buffer.
///
/// On top of the bounds checks navigation performs, this requires offsets to
/// be monotonic and to cover the data region exactly, empty payloads for
/// null and booleans, UTF-8 strings, strictly ascending object keys, and at
/// most `MAX_DEPTH` levels of nesting.
pub fn validate(buf: &[u8]) -> Result<()> {
    let root = ContainerRef::parse(buf)?;
    if root.kind == ContainerKind::Scalar {
        let (entry, _) = root.slot_range(0)?;
        if entry.tag == EntryTag::Container {
            return Err(Error::format("scalar wrapper holds a container"));
        }
    }
    validate_container(&root, 0)
}

fn validate_container(container: &ContainerRef<'_>, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let data_len = container.buf.len() - container.data_start();
    let entries = container.kind.entry_count(container.len);
    let mut prev_end = 0;
    for slot in 0..entries {
        let (entry, range) = container.slot_range(slot)?;
        let payload = &container.buf[range];
        match entry.tag {
            EntryTag::Null | EntryTag::False | EntryTag::True if !payload.is_empty() => {
                return Err(Error::format(format!(
                    "entry {} has a payload but its type has none",
                    slot
                )));
            }
            EntryTag::Container => match decode_child(entry.tag, payload)? {
                JsonbRef::Array(c) | JsonbRef::Object(c) => validate_container(&c, depth + 1)?,
                _ => return Err(Error::format("container entry holds a scalar")),
            },
            tag => {
                decode_child(tag, payload)?;
            }
        }
        prev_end = entry.end;
    }
    if prev_end != data_len {
        return Err(Error::format(format!(
            "data region is {} bytes but entries cover {}",
            data_len, prev_end
        )));
    }
    if container.is_object() {
        for i in 1..container.len {
            if container.key_bytes(i - 1)? >= container.key_bytes(i)? {
                return Err(Error::format(format!(
                    "object keys not strictly ascending at {}",
                    i
                )));
            }
        }
        for i in 0..container.len {
            container.key_at(i)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::write_u32;
    use alloc::vec;
    use alloc::vec::Vec;

    fn encode(value: &JsonbValue) -> Vec<u8> {
        JsonbBinary::encode(value).unwrap().into_bytes()
    }

    fn object(pairs: &[(&str, JsonbValue)]) -> JsonbValue {
        JsonbValue::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_find_key_binary_search() {
        let keys = ["a", "b", "c", "d", "e", "f", "g"];
        let pairs: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, JsonbValue::from(i as i64)))
            .collect();
        let buf = encode(&object(&pairs));
        let root = JsonbRef::from_slice(&buf).unwrap().as_container().unwrap();
        for (i, k) in keys.iter().enumerate() {
            let found = root.find_key(k).unwrap().unwrap();
            assert_eq!(found.as_number(), Some(Number::Int64(i as i64)));
        }
        assert!(root.find_key("zz").unwrap().is_none());
        assert!(root.find_key("").unwrap().is_none());
    }

    #[test]
    fn test_step_outcomes() {
        let buf = encode(&JsonbValue::Array(vec![1i64.into(), "x".into()]));
        let root = JsonbRef::from_slice(&buf).unwrap();

        assert!(matches!(
            root.step(&PathStep::Index(1)).unwrap(),
            Lookup::Found(JsonbRef::String("x"))
        ));
        assert!(matches!(root.step(&PathStep::Index(2)).unwrap(), Lookup::NotFound));
        assert!(matches!(root.step(&PathStep::Index(-1)).unwrap(), Lookup::NotFound));
        assert!(matches!(
            root.step(&PathStep::Key("a".into())).unwrap(),
            Lookup::TypeMismatch
        ));

        let scalar = encode(&JsonbValue::from(5i64));
        let scalar = JsonbRef::from_slice(&scalar).unwrap();
        assert!(matches!(scalar.step(&PathStep::Index(0)).unwrap(), Lookup::TypeMismatch));
    }

    #[test]
    fn test_iterators() {
        let value = object(&[
            ("b", JsonbValue::Array(vec![true.into(), JsonbValue::Null])),
            ("a", 2.5.into()),
        ]);
        let buf = encode(&value);
        let root = JsonbRef::from_slice(&buf).unwrap().as_container().unwrap();

        let pairs: Vec<_> = root.object_iter().map(|p| p.unwrap()).collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "a");
        assert_eq!(pairs[1].0, "b");
        assert_eq!(root.array_iter().count(), 0);

        let inner = pairs[1].1.as_container().unwrap();
        let items: Vec<_> = inner.array_iter().map(|v| v.unwrap().kind()).collect();
        assert_eq!(items, vec![JsonbKind::Boolean, JsonbKind::Null]);
        assert!(inner.get(1).unwrap().unwrap().is_null());
        assert!(inner.get(2).unwrap().is_none());
    }

    #[test]
    fn test_to_binary_sub_value() {
        let value = object(&[("a", JsonbValue::Array(vec![1i64.into()])), ("s", "v".into())]);
        let buf = encode(&value);
        let root = JsonbRef::from_slice(&buf).unwrap();

        let arr = root.step(&PathStep::Key("a".into())).unwrap().into_option().unwrap();
        let standalone = arr.to_binary();
        assert!(validate(standalone.as_bytes()).is_ok());
        assert_eq!(standalone.decode().unwrap(), JsonbValue::Array(vec![1i64.into()]));

        let s = root.step(&PathStep::Key("s".into())).unwrap().into_option().unwrap();
        assert_eq!(s.to_binary().decode().unwrap(), JsonbValue::from("v"));
    }

    #[test]
    fn test_truncated_buffer() {
        let buf = encode(&object(&[("key", "value".into())]));
        for cut in 0..buf.len() {
            assert!(validate(&buf[..cut]).is_err(), "cut at {}", cut);
        }
        assert!(validate(&buf).is_ok());
    }

    #[test]
    fn test_navigation_rejects_out_of_range_offsets() {
        let mut buf = encode(&JsonbValue::Array(vec!["abc".into()]));
        write_u32(&mut buf, 4, JEntry::new(EntryTag::String, 100).encode());
        let root = JsonbRef::from_slice(&buf).unwrap();
        assert!(matches!(root.step(&PathStep::Index(0)), Err(Error::Format { .. })));
    }

    #[test]
    fn test_validate_rejects_unsorted_keys() {
        let mut buf = encode(&object(&[("a", 1i64.into()), ("b", 2i64.into())]));
        // swap the single-byte keys in the data region
        let data_start = 4 + 4 * 4;
        buf.swap(data_start, data_start + 1);
        assert!(validate(&buf).is_err());
        // navigation does not re-check ordering
        assert!(JsonbRef::from_slice(&buf).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_payloads() {
        let mut buf = encode(&JsonbValue::Array(vec![JsonbValue::Null]));
        buf.push(0);
        assert!(validate(&buf).is_err());

        let mut buf = encode(&JsonbValue::from("ab"));
        buf[8] = 0xFF;
        assert!(validate(&buf).is_err());

        let mut buf = encode(&JsonbValue::Array(vec![]));
        write_u32(&mut buf, 0, 0x6000_0000);
        assert!(validate(&buf).is_err());
    }

    #[test]
    fn test_nested_scalar_wrapper_rejected() {
        let inner = encode(&JsonbValue::from(1i64));
        let mut buf = vec![0u8; 8];
        write_u32(&mut buf, 0, ContainerKind::Array.header(1));
        write_u32(&mut buf, 4, JEntry::new(EntryTag::Container, inner.len()).encode());
        buf.extend_from_slice(&inner);
        assert!(validate(&buf).is_err());
        let root = JsonbRef::from_slice(&buf).unwrap();
        assert!(root.step(&PathStep::Index(0)).is_err());
    }

    #[test]
    fn test_decode_depth_limit() {
        // MAX_DEPTH + 1 nested empty arrays, assembled by hand
        let mut buf = encode(&JsonbValue::Array(vec![]));
        for _ in 0..MAX_DEPTH {
            let mut outer = vec![0u8; 8];
            write_u32(&mut outer, 0, ContainerKind::Array.header(1));
            write_u32(&mut outer, 4, JEntry::new(EntryTag::Container, buf.len()).encode());
            outer.extend_from_slice(&buf);
            buf = outer;
        }
        assert!(validate(&buf).is_err());
        assert!(JsonbRef::from_slice(&buf).unwrap().to_value().is_err());
    }
}
