//! Newline-delimited JSON ingestion.

use crate::error::Result;
use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;
use tracing::{trace, warn};
use vellum_jsonb::{EncodeOptions, Error as JsonbError, JsonbBinary};

/// Longest slice of an offending line quoted in an error.
const ERROR_SNIPPET_LEN: usize = 64;

/// Parses NDJSON text into blocks of encoded documents.
///
/// Blank lines are skipped. In strict mode a malformed line fails the load;
/// otherwise it yields `None`.
#[derive(Clone, Debug)]
pub struct NdJsonLoader {
    block_size: usize,
    size_limit: Option<usize>,
    strict: bool,
    options: EncodeOptions,
}

impl Default for NdJsonLoader {
    fn default() -> Self {
        Self {
            block_size: 10_000,
            size_limit: None,
            strict: true,
            options: EncodeOptions::default(),
        }
    }
}

impl NdJsonLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents per block. Clamped to at least one.
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Stops after this many documents.
    pub fn size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = Some(size_limit);
        self
    }

    /// Whether a malformed line fails the load.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Encoder options applied to every document.
    pub fn encode_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn get_block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn get_size_limit(&self) -> Option<usize> {
        self.size_limit
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Loads every document in `text`.
    pub fn load(&self, text: &str) -> Result<Vec<Vec<Option<JsonbBinary>>>> {
        let limit = self.size_limit.unwrap_or(usize::MAX);
        let mut blocks = Vec::new();
        let mut block = Vec::with_capacity(self.block_size.min(limit));
        let mut loaded = 0usize;

        for (idx, line) in text.lines().enumerate() {
            if loaded >= limit {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            block.push(self.parse_line(idx + 1, line)?);
            loaded += 1;

            if block.len() == self.block_size {
                trace!(documents = block.len(), "ndjson block");
                blocks.push(core::mem::take(&mut block));
            }
        }
        if !block.is_empty() {
            trace!(documents = block.len(), "ndjson block");
            blocks.push(block);
        }
        Ok(blocks)
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<Option<JsonbBinary>> {
        match JsonbBinary::parse_with(line, &self.options) {
            Ok(doc) => Ok(Some(doc)),
            Err(JsonbError::MalformedInput { message }) => {
                if self.strict {
                    return Err(JsonbError::malformed(format!(
                        "line {}: {} in {}",
                        line_no,
                        message,
                        snippet(line)
                    ))
                    .into());
                }
                warn!(line = line_no, error = %message, "skipped malformed ndjson line");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn snippet(line: &str) -> Cow<'_, str> {
    if line.len() <= ERROR_SNIPPET_LEN {
        return Cow::Borrowed(line);
    }
    let mut end = ERROR_SNIPPET_LEN;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!(
        "(first {}B of {}B): {}",
        end,
        line.len(),
        &line[..end]
    ))
}
