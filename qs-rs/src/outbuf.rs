//! Append-only output buffer.
//!
//! Every evaluation owns one of these; literal text and call results are
//! appended to it and it is finalized exactly once into an owned [`String`].
//!
//! Two growth strategies are provided.  [`Growth::Geometric`] keeps a single
//! contiguous `String` and lets it reallocate by doubling; [`Growth::Chunked`]
//! fills a list of fixed-size chunks and concatenates them on finalize,
//! trading one final copy for never moving already-written bytes.  The
//! finalized text is identical either way.

use crate::error::{Error, Result};

/// Nominal chunk size for [`Growth::Chunked`], in bytes.
pub const CHUNK_SIZE: usize = 256;

/// How an [`OutBuf`] grows its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Growth {
    /// One contiguous allocation, reallocated geometrically.
    #[default]
    Geometric,
    /// A sequence of fixed-size chunks joined on finalize.
    Chunked,
}

#[derive(Debug)]
enum Storage {
    Geometric(String),
    Chunked(Vec<String>),
    Finalized,
}

/// An append-only character sequence, materialized once.
#[derive(Debug)]
pub struct OutBuf {
    storage: Storage,
    len: usize,
    appends: usize,
}

impl Default for OutBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl OutBuf {
    /// Create an empty buffer using the default growth strategy.
    pub fn new() -> Self {
        Self::with_growth(Growth::default())
    }

    pub fn with_growth(growth: Growth) -> Self {
        let storage = match growth {
            Growth::Geometric => Storage::Geometric(String::new()),
            Growth::Chunked => Storage::Chunked(Vec::new()),
        };
        Self { storage, len: 0, appends: 0 }
    }

    /// Length in bytes of everything appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of append calls that carried data.
    ///
    /// Empty appends are not counted.
    pub fn append_count(&self) -> usize {
        self.appends
    }

    /// `true` once [`finalize`](Self::finalize) has been called.
    pub fn is_finalized(&self) -> bool {
        matches!(self.storage, Storage::Finalized)
    }

    /// Append a single character.
    pub fn push(&mut self, ch: char) {
        let mut tmp = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut tmp));
    }

    /// Append a string slice.
    ///
    /// Appending to a finalized buffer is ignored.
    pub fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        match &mut self.storage {
            Storage::Geometric(data) => data.push_str(s),
            Storage::Chunked(chunks) => push_chunked(chunks, s),
            Storage::Finalized => {
                tracing::warn!(bytes = s.len(), "append to finalized output buffer ignored");
                return;
            }
        }
        self.len += s.len();
        self.appends += 1;
    }

    /// Consume the contents, returning them as a single string.
    ///
    /// The buffer accepts no further appends afterwards.  A second call
    /// fails with [`Error::InvalidState`].
    pub fn finalize(&mut self) -> Result<String> {
        match std::mem::replace(&mut self.storage, Storage::Finalized) {
            Storage::Geometric(data) => Ok(data),
            Storage::Chunked(chunks) => Ok(chunks.concat()),
            Storage::Finalized => Err(Error::InvalidState),
        }
    }
}

/// Fill the tail chunk, opening new ones as each fills up.
///
/// Splits only on `char` boundaries, so a chunk may overrun [`CHUNK_SIZE`]
/// by up to three bytes.
fn push_chunked(chunks: &mut Vec<String>, s: &str) {
    let mut rest = s;
    while !rest.is_empty() {
        if chunks.last().map_or(true, |c| c.len() >= CHUNK_SIZE) {
            chunks.push(String::with_capacity(CHUNK_SIZE));
        }
        let last = chunks.len() - 1;
        let tail = &mut chunks[last];
        let mut cut = (CHUNK_SIZE - tail.len()).min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut += 1;
        }
        tail.push_str(&rest[..cut]);
        rest = &rest[cut..];
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_finalizes_to_empty_string() {
        let mut b = OutBuf::new();
        assert!(b.is_empty());
        assert_eq!(b.finalize().unwrap(), "");
    }

    #[test]
    fn appends_in_order() {
        let mut b = OutBuf::new();
        b.push_str("ab");
        b.push('c');
        b.push_str("def");
        assert_eq!(b.len(), 6);
        assert_eq!(b.finalize().unwrap(), "abcdef");
    }

    #[test]
    fn second_finalize_is_invalid_state() {
        let mut b = OutBuf::new();
        b.push_str("x");
        assert_eq!(b.finalize().unwrap(), "x");
        assert!(b.is_finalized());
        assert!(matches!(b.finalize(), Err(Error::InvalidState)));
    }

    #[test]
    fn append_after_finalize_is_dropped() {
        let mut b = OutBuf::new();
        b.finalize().unwrap();
        b.push_str("late");
        assert_eq!(b.len(), 0);
        assert_eq!(b.append_count(), 0);
    }

    #[test]
    fn empty_appends_are_not_counted() {
        let mut b = OutBuf::new();
        b.push_str("");
        b.push_str("a");
        b.push_str("");
        assert_eq!(b.append_count(), 1);
    }

    #[test]
    fn chunked_spans_many_chunks() {
        let mut b = OutBuf::with_growth(Growth::Chunked);
        let piece = "0123456789";
        for _ in 0..100 {
            b.push_str(piece);
        }
        assert_eq!(b.len(), 1000);
        assert_eq!(b.finalize().unwrap(), piece.repeat(100));
    }

    #[test]
    fn chunked_keeps_multibyte_chars_whole() {
        // 255 ASCII bytes leave one byte of room, too small for '€'.
        let mut b = OutBuf::with_growth(Growth::Chunked);
        b.push_str(&"a".repeat(CHUNK_SIZE - 1));
        b.push_str("€€");
        let s = b.finalize().unwrap();
        assert!(s.ends_with("€€"));
        assert_eq!(s.len(), CHUNK_SIZE - 1 + 6);
    }

    #[test]
    fn chars_and_bulk_produce_identical_output() {
        let text = "héllo {wörld}: ünïcode";
        for growth in [Growth::Geometric, Growth::Chunked] {
            let mut by_char = OutBuf::with_growth(growth);
            text.chars().for_each(|c| by_char.push(c));
            let mut bulk = OutBuf::with_growth(growth);
            bulk.push_str(text);
            assert_eq!(by_char.finalize().unwrap(), bulk.finalize().unwrap());
        }
    }
}
