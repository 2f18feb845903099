//! Output sinks for extracted elements.

use std::convert::Infallible;
use std::io::{self, Write};

use crate::scanner::Element;

/// Banner written before the first element of each document.
pub const BANNER: &str = "\n========== Extracted Content ==========\n\n";

/// Receives elements in document order as the scanner closes them.
pub trait ElementSink {
    type Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn element(&mut self, element: &Element<'_>) -> Result<(), Self::Error>;

    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Writes the banner, then `<name>content</name>` and a blank line per
/// element. Content bytes are copied through untouched.
///
/// ```
/// use tagsift_scan::{scan_into, TagSet, TextSink};
///
/// let mut sink = TextSink::new(Vec::new());
/// scan_into(b"<H2>y</H2>", &TagSet::new(["h2"]), &mut sink).unwrap();
/// let out = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(out.ends_with("<H2>y</H2>\n\n"));
/// ```
#[derive(Debug)]
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer, for lines outside the element stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ElementSink for TextSink<W> {
    type Error = io::Error;

    fn begin(&mut self) -> io::Result<()> {
        self.out.write_all(BANNER.as_bytes())
    }

    fn element(&mut self, element: &Element<'_>) -> io::Result<()> {
        let name = element.name();
        self.out.write_all(b"<")?;
        self.out.write_all(name)?;
        self.out.write_all(b">")?;
        self.out.write_all(element.content())?;
        self.out.write_all(b"</")?;
        self.out.write_all(name)?;
        self.out.write_all(b">\n\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// An element copied out of the input, lossily decoded as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedElement {
    pub name: String,
    pub content: String,
}

impl OwnedElement {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl From<&Element<'_>> for OwnedElement {
    fn from(element: &Element<'_>) -> Self {
        Self::new(element.name_lossy(), element.content_lossy())
    }
}

/// Collects elements in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub elements: Vec<OwnedElement>,
}

impl ElementSink for CollectSink {
    type Error = Infallible;

    fn element(&mut self, element: &Element<'_>) -> Result<(), Infallible> {
        self.elements.push(element.into());
        Ok(())
    }
}
