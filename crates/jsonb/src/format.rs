//! Binary layout constants and word-level codecs.
//!
//! ## Encoding Format
//!
//! Every buffer is a container: `[header: u32] [entries: u32 * n] [data...]`,
//! all words little-endian.
//!
//! Header bits 31..29 hold the container kind, bits 27..0 the count:
//! - `0x2000_0000`: scalar wrapper (one entry, used for a root scalar)
//! - `0x4000_0000`: object (`2n` entries, all keys then all values)
//! - `0x8000_0000`: array (`n` entries)
//!
//! Entry bits 31..28 hold the type tag, bits 27..0 the end offset of the
//! child's payload relative to the start of the data region. A child starts
//! where the previous one ended.
//!
//! Payloads: null and booleans are empty, strings are raw UTF-8, numbers are
//! a subtype byte followed by 8 bytes, containers are a nested encoding.

use crate::error::{Error, Result};
use alloc::format;

pub(crate) const CONTAINER_KIND_MASK: u32 = 0xE000_0000;
pub(crate) const CONTAINER_RESERVED_BIT: u32 = 0x1000_0000;
pub(crate) const SCALAR_CONTAINER: u32 = 0x2000_0000;
pub(crate) const OBJECT_CONTAINER: u32 = 0x4000_0000;
pub(crate) const ARRAY_CONTAINER: u32 = 0x8000_0000;
pub(crate) const COUNT_MASK: u32 = 0x0FFF_FFFF;

pub(crate) const ENTRY_TAG_SHIFT: u32 = 28;
pub(crate) const ENTRY_OFFSET_MASK: u32 = 0x0FFF_FFFF;

/// Size of a header or entry word.
pub(crate) const WORD: usize = 4;

/// Largest data region, and largest child count, of a single container.
pub const MAX_CONTAINER_SIZE: usize = 0x0FFF_FFFF;

/// Deepest container nesting accepted by the encoder and decoder.
pub const MAX_DEPTH: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Scalar,
    Object,
    Array,
}

impl ContainerKind {
    pub(crate) fn header(self, count: usize) -> u32 {
        let tag = match self {
            ContainerKind::Scalar => SCALAR_CONTAINER,
            ContainerKind::Object => OBJECT_CONTAINER,
            ContainerKind::Array => ARRAY_CONTAINER,
        };
        tag | (count as u32 & COUNT_MASK)
    }

    /// Splits a header word into kind and count.
    pub(crate) fn decode_header(header: u32) -> Result<(Self, usize)> {
        if header & CONTAINER_RESERVED_BIT != 0 {
            return Err(Error::format(format!(
                "reserved header bit set in {:#010x}",
                header
            )));
        }
        let count = (header & COUNT_MASK) as usize;
        match header & CONTAINER_KIND_MASK {
            SCALAR_CONTAINER => Ok((ContainerKind::Scalar, count)),
            OBJECT_CONTAINER => Ok((ContainerKind::Object, count)),
            ARRAY_CONTAINER => Ok((ContainerKind::Array, count)),
            other => Err(Error::format(format!(
                "unknown container kind {:#010x}",
                other
            ))),
        }
    }

    /// Number of entry words for `count` children.
    pub(crate) fn entry_count(self, count: usize) -> usize {
        match self {
            ContainerKind::Object => count * 2,
            _ => count,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntryTag {
    Null = 0,
    String = 1,
    Number = 2,
    False = 3,
    True = 4,
    Container = 5,
}

/// One directory entry: type tag plus end offset into the data region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct JEntry {
    pub(crate) tag: EntryTag,
    pub(crate) end: usize,
}

impl JEntry {
    pub(crate) fn new(tag: EntryTag, end: usize) -> Self {
        Self { tag, end }
    }

    pub(crate) fn encode(self) -> u32 {
        ((self.tag as u32) << ENTRY_TAG_SHIFT) | (self.end as u32 & ENTRY_OFFSET_MASK)
    }

    pub(crate) fn decode(word: u32) -> Result<Self> {
        let tag = match word >> ENTRY_TAG_SHIFT {
            0 => EntryTag::Null,
            1 => EntryTag::String,
            2 => EntryTag::Number,
            3 => EntryTag::False,
            4 => EntryTag::True,
            5 => EntryTag::Container,
            other => return Err(Error::format(format!("unknown entry tag {}", other))),
        };
        Ok(Self {
            tag,
            end: (word & ENTRY_OFFSET_MASK) as usize,
        })
    }
}

pub(crate) fn read_u32(buf: &[u8], pos: usize) -> Result<u32> {
    match pos.checked_add(WORD).and_then(|end| buf.get(pos..end)) {
        Some(bytes) => {
            let mut word = [0u8; WORD];
            word.copy_from_slice(bytes);
            Ok(u32::from_le_bytes(word))
        }
        None => Err(Error::format(format!(
            "truncated buffer: need {} bytes at offset {}, have {}",
            WORD,
            pos,
            buf.len()
        ))),
    }
}

pub(crate) fn write_u32(buf: &mut [u8], pos: usize, value: u32) {
    buf[pos..pos + WORD].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let header = ContainerKind::Object.header(3);
        assert_eq!(header, 0x4000_0003);
        assert_eq!(
            ContainerKind::decode_header(header).unwrap(),
            (ContainerKind::Object, 3)
        );
        assert_eq!(ContainerKind::Object.entry_count(3), 6);
        assert_eq!(ContainerKind::Array.entry_count(3), 3);
    }

    #[test]
    fn test_bad_headers() {
        assert!(ContainerKind::decode_header(0x6000_0001).is_err());
        assert!(ContainerKind::decode_header(0x0000_0001).is_err());
        assert!(ContainerKind::decode_header(0x9000_0001).is_err());
    }

    #[test]
    fn test_jentry_round_trip() {
        let entry = JEntry::new(EntryTag::Container, 1234);
        assert_eq!(entry.encode(), 0x5000_04D2);
        assert_eq!(JEntry::decode(entry.encode()).unwrap(), entry);
        assert!(JEntry::decode(0x6000_0000).is_err());
    }

    #[test]
    fn test_read_u32_bounds() {
        let buf = [1u8, 0, 0, 0, 2];
        assert_eq!(read_u32(&buf, 0).unwrap(), 1);
        assert!(read_u32(&buf, 2).is_err());
        assert!(read_u32(&buf, usize::MAX - 1).is_err());
    }
}
