//! Streaming tag extraction over raw markup.
//!
//! - [`cursor`]: forward-only cursor with byte and case-insensitive search
//! - [`tags`]: the case-insensitive target tag set
//! - [`scanner`]: the single-pass scan loop yielding borrowed [`Element`]s
//! - [`sink`]: where extracted elements go (plain text, or collected)
//!
//! This is a best-effort scanner, not an HTML parser: no DOM, no entity
//! decoding, no attribute parsing. Same-name nesting closes at the first
//! matching close tag.
//!
//! ```rust
//! use tagsift_scan::{scan, TagSet};
//!
//! let targets = TagSet::new(["h1", "p"]);
//! let found: Vec<_> = scan(b"<h1>Title</h1><div>x</div><P>Body</P>", &targets)
//!     .map(|el| (el.name_lossy().into_owned(), el.content_lossy().into_owned()))
//!     .collect();
//! assert_eq!(
//!     found,
//!     vec![("h1".into(), "Title".into()), ("P".into(), "Body".into())]
//! );
//! ```

pub mod cursor;
pub mod scanner;
pub mod sink;
pub mod tags;

pub use scanner::{Element, Halt, ScanSummary, TagScanner, scan, scan_into};
pub use sink::{CollectSink, ElementSink, OwnedElement, TextSink};
pub use tags::TagSet;
