//! Forward-only cursor over an immutable byte sequence.

use memchr::{memchr, memchr2};

/// A scan position over borrowed input. The position never moves backwards.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Byte at an absolute index, if it exists.
    pub fn byte_at(&self, idx: usize) -> Option<u8> {
        self.input.get(idx).copied()
    }

    /// Move the cursor to `pos`, clamped to the input length.
    ///
    /// Requests to move backwards are ignored.
    pub fn advance_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.pos, "cursor rewind {} -> {}", self.pos, pos);
        self.pos = pos.max(self.pos).min(self.input.len());
    }

    /// Absolute index of the next `byte` at or after the cursor.
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        self.find_byte_from(self.pos, byte)
    }

    /// Absolute index of the next `byte` at or after `from`.
    pub fn find_byte_from(&self, from: usize, byte: u8) -> Option<usize> {
        let hay = self.input.get(from..)?;
        memchr(byte, hay).map(|i| from + i)
    }

    /// Absolute index of the first ASCII case-insensitive occurrence of
    /// `needle` at or after `from`.
    ///
    /// ```
    /// use tagsift_scan::cursor::Cursor;
    ///
    /// let cur = Cursor::new(b"<p>a</P> <p>b</p>");
    /// assert_eq!(cur.find_ascii_ci_from(0, b"</p>"), Some(4));
    /// assert_eq!(cur.find_ascii_ci_from(5, b"</p>"), Some(13));
    /// assert_eq!(cur.find_ascii_ci_from(14, b"</p>"), None);
    /// ```
    pub fn find_ascii_ci_from(&self, from: usize, needle: &[u8]) -> Option<usize> {
        let Some(&first) = needle.first() else {
            return (from <= self.input.len()).then_some(from);
        };
        let (lower, upper) = (first.to_ascii_lowercase(), first.to_ascii_uppercase());

        let mut at = from;
        while let Some(i) = memchr2(lower, upper, self.input.get(at..)?) {
            let start = at + i;
            let candidate = self.input.get(start..start + needle.len())?;
            if candidate.eq_ignore_ascii_case(needle) {
                return Some(start);
            }
            at = start + 1;
        }
        None
    }
}
