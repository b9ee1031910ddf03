//! Shared quick-xml plumbing for the URDF and SRDF readers.

use crate::error::{OverlayError, Result, SourceLocation};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Which description a cursor is reading; selects the error variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DescriptionKind {
    Robot,
    Semantic,
}

/// A pull reader over one description text that reports errors with line and
/// column.
pub(crate) struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
    text: &'a str,
    kind: DescriptionKind,
}

impl<'a> XmlCursor<'a> {
    pub(crate) fn new(text: &'a str, kind: DescriptionKind) -> Self {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);
        Self { reader, text, kind }
    }

    /// Reads the next event into `buf`.
    pub(crate) fn next<'b>(&mut self, buf: &'b mut Vec<u8>) -> Result<Event<'b>> {
        buf.clear();
        match self.reader.read_event_into(buf) {
            Ok(event) => Ok(event),
            Err(e) => {
                let offset = offset_of(self.reader.error_position());
                Err(self.error_at(e.to_string(), offset))
            }
        }
    }

    /// An error located at the reader's current position.
    pub(crate) fn error(&self, message: impl Into<String>) -> OverlayError {
        self.error_at(message, offset_of(self.reader.buffer_position()))
    }

    fn error_at(&self, message: impl Into<String>, offset: usize) -> OverlayError {
        let location = Some(SourceLocation::from_offset(self.text, offset));
        match self.kind {
            DescriptionKind::Robot => OverlayError::malformed_robot(message, location),
            DescriptionKind::Semantic => OverlayError::malformed_semantic(message, location),
        }
    }

    /// An error without a location, for checks made after reading.
    pub(crate) fn error_unlocated(&self, message: impl Into<String>) -> OverlayError {
        match self.kind {
            DescriptionKind::Robot => OverlayError::malformed_robot(message, None),
            DescriptionKind::Semantic => OverlayError::malformed_semantic(message, None),
        }
    }

    pub(crate) fn unterminated(&self, element: &str) -> OverlayError {
        self.error(format!("unexpected end of input inside <{element}>"))
    }

    /// Gets a required attribute value.
    pub(crate) fn attribute(&self, e: &BytesStart, name: &'static str) -> Result<String> {
        self.attribute_opt(e, name)?.ok_or_else(|| {
            self.error(format!(
                "missing required attribute '{name}' on <{}>",
                element_name(e)
            ))
        })
    }

    /// Gets an optional attribute value. Malformed attributes are errors.
    pub(crate) fn attribute_opt(&self, e: &BytesStart, name: &str) -> Result<Option<String>> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(err.to_string()))?;
            if attr.key.as_ref() == name.as_bytes() {
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.error(err.to_string()))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Skips an element and all its children. The start tag must already have
    /// been consumed.
    pub(crate) fn skip(&mut self, name: &[u8]) -> Result<()> {
        let mut buf = Vec::new();
        let mut depth = 1usize;
        loop {
            match self.next(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == name => depth += 1,
                Event::End(ref e) if e.name().as_ref() == name => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => {
                    return Err(self.unterminated(&String::from_utf8_lossy(name)));
                }
                _ => {}
            }
        }
    }

    /// Parses whitespace-separated floats.
    pub(crate) fn floats(&self, value: &str, what: &str) -> Result<Vec<f32>> {
        value
            .split_whitespace()
            .map(|part| part.parse::<f32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| self.error(format!("invalid number list for {what}: '{value}'")))
    }
}

/// Element name as a string, for messages.
pub(crate) fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn offset_of<T: TryInto<usize>>(position: T) -> usize {
    position.try_into().unwrap_or(usize::MAX)
}
