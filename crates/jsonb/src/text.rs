//! JSON text input and canonical JSON text output.
//!
//! Text is parsed with `serde_json` straight into `JsonbValue`, so duplicate
//! keys resolve to the last occurrence and integers keep their exact value.
//! Output is canonical: keys in ascending order, no whitespace, integers as
//! digits and floats in shortest round-trip form.

use crate::binary::{EncodeOptions, Encoder, JsonbBinary};
use crate::error::{Error, Result};
use crate::navigator::JsonbRef;
use crate::number::Number;
use crate::value::{JsonbObject, JsonbValue};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Write};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

struct JsonbValueVisitor;

impl<'de> Visitor<'de> for JsonbValueVisitor {
    type Value = JsonbValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::Number(Number::Int64(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::Number(Number::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::Number(Number::Float64(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> core::result::Result<JsonbValue, E> {
        Ok(JsonbValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> core::result::Result<JsonbValue, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> core::result::Result<JsonbValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(JsonbValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> core::result::Result<JsonbValue, A::Error> {
        let mut obj = JsonbObject::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, JsonbValue>()? {
            obj.insert(key, value);
        }
        Ok(JsonbValue::Object(obj))
    }
}

impl<'de> Deserialize<'de> for JsonbValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        deserializer.deserialize_any(JsonbValueVisitor)
    }
}

impl JsonbValue {
    /// Parses JSON text into a value tree.
    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::malformed(e.to_string()))
    }
}

impl JsonbBinary {
    /// Parses JSON text and encodes it with default options.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &EncodeOptions::default())
    }

    /// Parses JSON text and encodes it with the given options.
    pub fn parse_with(text: &str, options: &EncodeOptions) -> Result<Self> {
        let value = JsonbValue::from_text(text)?;
        Encoder::new(options.clone()).encode(&value)
    }

    /// Parses JSON text, returning `None` on malformed input.
    pub fn try_parse(text: &str) -> Option<Self> {
        Self::parse(text).ok()
    }

    /// Renders the buffer as canonical JSON text.
    pub fn to_text(&self) -> Result<String> {
        self.root()?.to_text()
    }
}

impl JsonbRef<'_> {
    /// Renders this sub-value as canonical JSON text.
    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        write_ref(&mut out, self)?;
        Ok(out)
    }
}

fn write_escaped<W: Write>(out: &mut W, s: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            '\u{8}' => out.write_str("\\b")?,
            '\u{c}' => out.write_str("\\f")?,
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\t' => out.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

fn write_value<W: Write>(out: &mut W, value: &JsonbValue) -> fmt::Result {
    match value {
        JsonbValue::Null => out.write_str("null"),
        JsonbValue::Bool(b) => out.write_str(if *b { "true" } else { "false" }),
        JsonbValue::Number(n) => write!(out, "{}", n),
        JsonbValue::String(s) => write_escaped(out, s),
        JsonbValue::Array(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_value(out, item)?;
            }
            out.write_char(']')
        }
        JsonbValue::Object(obj) => {
            out.write_char('{')?;
            for (i, (key, item)) in obj.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_escaped(out, key)?;
                out.write_char(':')?;
                write_value(out, item)?;
            }
            out.write_char('}')
        }
    }
}

// Writing into a String cannot fail, so only decoding errors surface here.
fn write_ref(out: &mut String, value: &JsonbRef<'_>) -> Result<()> {
    match value {
        JsonbRef::Null => out.push_str("null"),
        JsonbRef::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        JsonbRef::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        JsonbRef::String(s) => {
            let _ = write_escaped(out, s);
        }
        JsonbRef::Array(c) => {
            out.push('[');
            for (i, item) in c.array_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_ref(out, &item?)?;
            }
            out.push(']');
        }
        JsonbRef::Object(c) => {
            out.push('{');
            for (i, pair) in c.object_iter().enumerate() {
                let (key, item) = pair?;
                if i > 0 {
                    out.push(',');
                }
                let _ = write_escaped(out, key);
                out.push(':');
                write_ref(out, &item)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

impl fmt::Display for JsonbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self)
    }
}
