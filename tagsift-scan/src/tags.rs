//! Target tag names and start-tag name extraction.

/// Ordered set of tag names matched ASCII case-insensitively.
///
/// Order is kept for display only; it has no effect on scan output order.
///
/// ```
/// use tagsift_scan::TagSet;
///
/// let set = TagSet::new(["h1", "H1", " p ", ""]);
/// assert_eq!(set.iter().collect::<Vec<_>>(), vec!["h1", "p"]);
/// assert!(set.contains(b"P"));
/// assert!(!set.contains(b"div"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    names: Vec<String>,
}

impl TagSet {
    /// Build a set, trimming names and dropping empties and case-insensitive
    /// duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    fn insert(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.contains(name.as_bytes()) {
            return;
        }
        self.names.push(name.to_string());
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &[u8]) -> bool {
        self.names
            .iter()
            .any(|n| n.as_bytes().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Byte length of the longest name in the set.
    pub fn max_name_len(&self) -> usize {
        self.names.iter().map(String::len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

fn ends_tag_name(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'>' || byte == b'/'
}

/// Read the tag name of the start tag whose `<` sits at `lt`.
///
/// Returns the exclusive end index of the name; the name itself is
/// `input[lt + 1..end]`. `None` when the input runs out before a terminator,
/// the name is empty, or the name is longer than `max_len`. At most
/// `max_len + 1` bytes are examined.
pub fn read_tag_name(input: &[u8], lt: usize, max_len: usize) -> Option<usize> {
    let start = lt + 1;
    let rest = input.get(start..)?;
    let window = &rest[..rest.len().min(max_len.saturating_add(1))];
    let len = window.iter().position(|&b| ends_tag_name(b))?;
    (len > 0).then_some(start + len)
}
