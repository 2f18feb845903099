//! Single-pass scan loop.
//!
//! The scanner walks the input once with a forward-only [`Cursor`]:
//!
//! - `SeekingTag`: find the next `<`, or finish.
//! - `Classifying`: skip close tags (`</`), comments and doctypes (`<!`),
//!   unreadable names and names outside the target set, by resyncing one
//!   byte past the `<`.
//! - `Extracting`: find the end of the open tag and the first
//!   case-insensitive `</name>` after it. A missing `>` halts the scan; a
//!   missing close tag resyncs one byte past the `<`.
//!
//! Nested same-name elements close at the first `</name>`, so
//! `<p>a<p>b</p>c</p>` yields `a<p>b`.

use std::borrow::Cow;

use crate::cursor::Cursor;
use crate::sink::ElementSink;
use crate::tags::{TagSet, read_tag_name};

/// A matched element, borrowed from the scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    name: &'a [u8],
    content: &'a [u8],
    offset: usize,
}

impl<'a> Element<'a> {
    /// Tag name exactly as written in the source.
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Raw bytes between the end of the open tag and the close tag.
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Byte offset of the open tag's `<` in the input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn name_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    pub fn content_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.content)
    }
}

/// Why a scan stopped before the end of its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// A target start tag at `offset` has no `>` before end of input.
    UnterminatedOpenTag { offset: usize },
}

/// Counters reported once a scan finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub emitted: usize,
    /// Target start tags skipped because no close tag followed them.
    pub unclosed: usize,
    pub halted: Option<Halt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingTag,
    Classifying { lt: usize },
    Extracting { lt: usize, name_end: usize },
    Done,
}

/// Remembers the last close-tag search per tag name.
///
/// The cursor only moves forward, so a search that came up empty from `p`
/// stays empty from any later point, and a hit at `c` found from `p` is
/// still the first hit from any point in `p..=c`. Reusing those answers keeps
/// runs of unclosed targets from rescanning the tail of the input.
#[derive(Debug, Default)]
struct CloseTagMemo {
    entries: Vec<MemoEntry>,
}

#[derive(Debug)]
struct MemoEntry {
    token: Vec<u8>,
    searched_from: usize,
    found: Option<usize>,
}

impl CloseTagMemo {
    /// First `</name>` at or after `from`, with the token length.
    fn find(&mut self, cursor: &Cursor<'_>, name: &[u8], from: usize) -> Option<(usize, usize)> {
        let idx = match self
            .entries
            .iter()
            .position(|e| e.token[2..e.token.len() - 1].eq_ignore_ascii_case(name))
        {
            Some(idx) => idx,
            None => {
                let mut token = Vec::with_capacity(name.len() + 3);
                token.extend_from_slice(b"</");
                token.extend_from_slice(name);
                token.push(b'>');
                self.entries.push(MemoEntry {
                    token,
                    searched_from: usize::MAX,
                    found: None,
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[idx];

        if from >= entry.searched_from {
            match entry.found {
                None => return None,
                Some(at) if at >= from => return Some((at, entry.token.len())),
                Some(_) => {}
            }
        }

        entry.searched_from = from;
        entry.found = cursor.find_ascii_ci_from(from, &entry.token);
        entry.found.map(|at| (at, entry.token.len()))
    }
}

/// Iterator over target elements in document order.
///
/// ```
/// use tagsift_scan::{Halt, TagScanner, TagSet};
///
/// let targets = TagSet::new(["h1"]);
/// let mut scanner = TagScanner::new(b"<h1>a</h1><h1 class='x'", &targets);
/// assert_eq!(scanner.next().map(|e| e.content()), Some(&b"a"[..]));
/// assert_eq!(scanner.next(), None);
/// assert_eq!(
///     scanner.summary().halted,
///     Some(Halt::UnterminatedOpenTag { offset: 10 })
/// );
/// ```
#[derive(Debug)]
pub struct TagScanner<'a, 't> {
    cursor: Cursor<'a>,
    targets: &'t TagSet,
    max_name_len: usize,
    state: State,
    memo: CloseTagMemo,
    /// Last `>` found while extracting. Open tags are visited in order, so
    /// it stays the first `>` for any later `<` that precedes it.
    last_gt: Option<usize>,
    summary: ScanSummary,
}

impl<'a, 't> TagScanner<'a, 't> {
    pub fn new(input: &'a [u8], targets: &'t TagSet) -> Self {
        Self {
            cursor: Cursor::new(input),
            targets,
            max_name_len: targets.max_name_len(),
            state: State::SeekingTag,
            memo: CloseTagMemo::default(),
            last_gt: None,
            summary: ScanSummary::default(),
        }
    }

    /// Counters so far; final once the iterator has returned `None`.
    pub fn summary(&self) -> ScanSummary {
        self.summary
    }

    /// Current cursor position in the input.
    pub fn position(&self) -> usize {
        self.cursor.pos()
    }

    /// First `>` at or after `lt`.
    fn find_gt(&mut self, lt: usize) -> Option<usize> {
        if let Some(gt) = self.last_gt.filter(|&gt| gt >= lt) {
            return Some(gt);
        }
        let gt = self.cursor.find_byte_from(lt, b'>')?;
        self.last_gt = Some(gt);
        Some(gt)
    }

    fn resync(&mut self, lt: usize) {
        self.cursor.advance_to(lt + 1);
        self.state = State::SeekingTag;
    }

    /// Run a single state transition, returning an element when one closes.
    fn step(&mut self) -> Option<Element<'a>> {
        let input = self.cursor.input();
        match self.state {
            State::SeekingTag => {
                self.state = match self.cursor.find_byte(b'<') {
                    Some(lt) => State::Classifying { lt },
                    None => {
                        self.cursor.advance_to(input.len());
                        State::Done
                    }
                };
                None
            }
            State::Classifying { lt } => {
                match self.cursor.byte_at(lt + 1) {
                    Some(b'/') | Some(b'!') => self.resync(lt),
                    _ => match read_tag_name(input, lt, self.max_name_len) {
                        Some(name_end) if self.targets.contains(&input[lt + 1..name_end]) => {
                            self.state = State::Extracting { lt, name_end };
                        }
                        _ => self.resync(lt),
                    },
                }
                None
            }
            State::Extracting { lt, name_end } => {
                let Some(gt) = self.find_gt(lt) else {
                    tracing::debug!(offset = lt, "scan.halt.unterminated_open_tag");
                    self.summary.halted = Some(Halt::UnterminatedOpenTag { offset: lt });
                    self.state = State::Done;
                    return None;
                };

                let name = &input[lt + 1..name_end];
                match self.memo.find(&self.cursor, name, gt + 1) {
                    Some((close, token_len)) => {
                        self.cursor.advance_to(close + token_len);
                        self.state = State::SeekingTag;
                        self.summary.emitted += 1;
                        Some(Element {
                            name,
                            content: &input[gt + 1..close],
                            offset: lt,
                        })
                    }
                    None => {
                        tracing::debug!(
                            offset = lt,
                            tag = %String::from_utf8_lossy(name),
                            "scan.skip.unclosed_tag"
                        );
                        self.summary.unclosed += 1;
                        self.resync(lt);
                        None
                    }
                }
            }
            State::Done => None,
        }
    }
}

impl<'a> Iterator for TagScanner<'a, '_> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state != State::Done {
            if let Some(element) = self.step() {
                return Some(element);
            }
        }
        None
    }
}

/// Start a scan of `input` for the tags in `targets`.
pub fn scan<'a, 't>(input: &'a [u8], targets: &'t TagSet) -> TagScanner<'a, 't> {
    TagScanner::new(input, targets)
}

/// Scan `input` and stream every element into `sink`.
///
/// A sink error stops the scan and is returned as-is.
pub fn scan_into<S: ElementSink>(
    input: &[u8],
    targets: &TagSet,
    sink: &mut S,
) -> Result<ScanSummary, S::Error> {
    sink.begin()?;
    let mut scanner = scan(input, targets);
    for element in scanner.by_ref() {
        sink.element(&element)?;
    }
    sink.finish()?;

    let summary = scanner.summary();
    tracing::debug!(
        input_len = input.len(),
        emitted = summary.emitted,
        unclosed = summary.unclosed,
        halted = ?summary.halted,
        "scan.summary"
    );
    Ok(summary)
}
