//! Path expression parser.
//!
//! Grammar:
//! - first step: `:ident`, a bare `ident`, or a bracket
//! - later steps: `.ident`, `:ident`, or a bracket
//! - brackets: `[integer]`, `['string']`, `["string"]`
//!
//! Identifiers are Unicode alphanumerics, `_` and `$`. Whitespace between
//! tokens is ignored.

use super::{is_identifier_char, JsonPath, PathStep};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Error type for path parsing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Parser state.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(ParseError::new(
                format!("Expected '{}', found '{}'", expected, c),
                self.pos,
            )),
            None => Err(ParseError::new(
                format!("Expected '{}', found end of input", expected),
                self.pos,
            )),
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(ParseError::new("Expected identifier", self.pos));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_integer(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| ParseError::new("Invalid array index", start))
    }

    fn parse_hex4(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        let digits = self
            .input
            .get(start..start + 4)
            .ok_or_else(|| ParseError::new("Truncated unicode escape", start))?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseError::new("Invalid unicode escape", start));
        }
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| ParseError::new("Invalid unicode escape", start))?;
        self.pos += 4;
        Ok(code)
    }

    fn parse_unicode_escape(&mut self) -> Result<char, ParseError> {
        let start = self.pos;
        let high = self.parse_hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if !self.input[self.pos..].starts_with("\\u") {
                return Err(ParseError::new("Unpaired surrogate in unicode escape", start));
            }
            self.pos += 2;
            let low = self.parse_hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(ParseError::new("Unpaired surrogate in unicode escape", start));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| ParseError::new("Invalid unicode escape", start))
    }

    fn parse_string_literal(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(ParseError::new("Expected string literal", self.pos)),
        };
        self.advance();

        let mut result = String::new();
        while let Some(c) = self.peek() {
            self.advance();
            if c == quote {
                return Ok(result);
            }
            if c != '\\' {
                result.push(c);
                continue;
            }
            let escape_pos = self.pos;
            let escaped = self
                .peek()
                .ok_or_else(|| ParseError::new("Unterminated string", start))?;
            self.advance();
            match escaped {
                '\\' | '\'' | '"' | '/' => result.push(escaped),
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                'b' => result.push('\u{8}'),
                'f' => result.push('\u{c}'),
                'u' => result.push(self.parse_unicode_escape()?),
                other => {
                    return Err(ParseError::new(
                        format!("Invalid escape '\\{}'", other),
                        escape_pos,
                    ))
                }
            }
        }
        Err(ParseError::new("Unterminated string", start))
    }

    fn parse_bracket(&mut self) -> Result<PathStep, ParseError> {
        let open = self.pos;
        self.expect('[')?;
        self.skip_whitespace();
        let step = match self.peek() {
            Some('\'') | Some('"') => PathStep::Key(self.parse_string_literal()?),
            Some(c) if c.is_ascii_digit() || c == '-' => PathStep::Index(self.parse_integer()?),
            None => return Err(ParseError::new("Unterminated bracket", open)),
            _ => return Err(ParseError::new("Invalid bracket expression", self.pos)),
        };
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(ParseError::new("Unterminated bracket", open));
        }
        self.expect(']')?;
        Ok(step)
    }
}

impl JsonPath {
    /// Parses a path expression from a string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut parser = Parser::new(input);
        let mut steps = Vec::new();

        parser.skip_whitespace();
        match parser.peek() {
            None => return Err(ParseError::new("Empty path expression", parser.pos)),
            Some(':') => {
                parser.advance();
                steps.push(PathStep::Key(parser.parse_identifier()?));
            }
            Some('[') => steps.push(parser.parse_bracket()?),
            Some('.') => {
                return Err(ParseError::new(
                    "Path cannot start with '.'",
                    parser.pos,
                ))
            }
            Some(c) if is_identifier_char(c) => {
                steps.push(PathStep::Key(parser.parse_identifier()?));
            }
            Some(c) => {
                return Err(ParseError::new(
                    format!("Unexpected character '{}'", c),
                    parser.pos,
                ))
            }
        }

        loop {
            parser.skip_whitespace();
            match parser.peek() {
                None => break,
                Some('.') | Some(':') => {
                    parser.advance();
                    steps.push(PathStep::Key(parser.parse_identifier()?));
                }
                Some('[') => steps.push(parser.parse_bracket()?),
                Some(c) => {
                    return Err(ParseError::new(
                        format!("Unexpected character '{}'", c),
                        parser.pos,
                    ))
                }
            }
        }

        Ok(JsonPath::new(steps))
    }
}
