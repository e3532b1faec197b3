//! Path expressions over JSON documents.
//!
//! A path is a chain of key and index steps written with the colon, dot and
//! bracket accessors: `:repo.name`, `payload['commits'][0]`, `[1].k`.

mod eval;
mod parser;

pub use eval::{evaluate, evaluate_to_binary};
pub use parser::ParseError;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

/// One accessor step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    /// Object member access by key.
    Key(String),
    /// Array element access by position. Negative positions never match.
    Index(i64),
}

/// A parsed path expression: an ordered list of steps applied left to right.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPath {
    steps: Vec<PathStep>,
}

impl JsonPath {
    /// Creates a path from its steps.
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Returns the steps of this path.
    #[inline]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns this path extended by a key step.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(PathStep::Key(key.into()));
        self
    }

    /// Returns this path extended by an index step.
    pub fn index(mut self, index: i64) -> Self {
        self.steps.push(PathStep::Index(index));
        self
    }
}

impl FromStr for JsonPath {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonPath::parse(s)
    }
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_identifier_char)
}

fn write_quoted_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    f.write_str("['")?;
    for c in key.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("']")
}

impl fmt::Display for JsonPath {
    /// Canonical form: `:key` for a leading key, `.key` afterwards, `['k']`
    /// for keys that are not identifiers and `[n]` for indices.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) if is_identifier(key) => {
                    f.write_str(if i == 0 { ":" } else { "." })?;
                    f.write_str(key)?;
                }
                PathStep::Key(key) => write_quoted_key(f, key)?,
                PathStep::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_canonical_display() {
        let path = JsonPath::default().key("repo").key("name");
        assert_eq!(path.to_string(), ":repo.name");

        let path = JsonPath::default().index(0).key("k").index(-1);
        assert_eq!(path.to_string(), "[0].k[-1]");

        let path = JsonPath::default().key("a b").key("it's");
        assert_eq!(path.to_string(), "['a b']['it\\'s']");

        let path = JsonPath::default().key("");
        assert_eq!(path.to_string(), "['']");
    }

    #[test]
    fn test_display_reparses() {
        let path = JsonPath::default()
            .key("naïve")
            .key("line\nbreak")
            .key("back\\slash")
            .key("\u{1}")
            .index(3);
        let reparsed = JsonPath::parse(&path.to_string()).unwrap();
        assert_eq!(reparsed, path);
    }

    #[test]
    fn test_equivalent_spellings() {
        let a = JsonPath::parse(":a.b").unwrap();
        let b = JsonPath::parse("a['b']").unwrap();
        let c = JsonPath::parse("a[\"b\"]").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!("a:b".parse::<JsonPath>().unwrap(), a);
    }
}
