//! Small layer over `quick-xml` shared by the map and hierarchy codecs.
//!
//! Reading tracks the byte position of each event so parse errors can carry
//! a line number. Writing always produces UTF-8 with one-space indentation.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use tracing::trace;

use crate::assets::map::Properties;
use crate::error::CodecError;

/// Pull parser over a whole file held in memory.
pub(crate) struct XmlParser<'a> {
    reader: Reader<&'a [u8]>,
    content: &'a str,
    path: &'a Path,
    /// Byte offset where the last returned event started
    event_start: usize,
}

impl<'a> XmlParser<'a> {
    pub(crate) fn new(content: &'a str, path: &'a Path) -> Self {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            content,
            path,
            event_start: 0,
        }
    }

    pub(crate) fn path(&self) -> &'a Path {
        self.path
    }

    /// 1-based line of the most recent event.
    pub(crate) fn line(&self) -> usize {
        line_at(self.content, self.event_start)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> CodecError {
        CodecError::parse(self.path, Some(self.line()), message)
    }

    /// Next event that carries meaning, skipping declarations, comments and
    /// processing instructions.
    pub(crate) fn next(&mut self) -> Result<Event<'a>, CodecError> {
        loop {
            self.event_start = self.skip_whitespace(self.reader.buffer_position() as usize);
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let pos = self.reader.buffer_position() as usize;
                    return Err(CodecError::parse(
                        self.path,
                        Some(line_at(self.content, pos)),
                        e.to_string(),
                    ));
                }
            };
            match event {
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                other => return Ok(other),
            }
        }
    }

    /// Text is trimmed, so an event really starts at the first non-blank byte.
    fn skip_whitespace(&self, mut offset: usize) -> usize {
        let bytes = self.content.as_bytes();
        while offset < bytes.len() && bytes[offset].is_ascii_whitespace() {
            offset += 1;
        }
        offset
    }

    /// Consume events up to and including the end of an element whose start
    /// tag was just read.
    pub(crate) fn skip_element(&mut self, name: &[u8]) -> Result<(), CodecError> {
        trace!(
            "Skipping <{}> at {}:{}",
            String::from_utf8_lossy(name),
            self.path.display(),
            self.line()
        );
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(self.error(unclosed(name))),
                _ => {}
            }
        }
        Ok(())
    }

    /// Concatenated text up to the end of an element whose start tag was just read.
    pub(crate) fn read_text(&mut self, name: &[u8]) -> Result<String, CodecError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => {
                    let chunk = t.unescape().map_err(|e| self.error(e.to_string()))?;
                    text.push_str(&chunk);
                }
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::End(e) if e.name().as_ref() == name => return Ok(text),
                Event::Start(e) => {
                    let inner = e.name().as_ref().to_vec();
                    self.skip_element(&inner)?;
                }
                Event::Eof => return Err(self.error(unclosed(name))),
                _ => {}
            }
        }
    }

    /// Read a `<properties>` block whose start tag was just consumed.
    pub(crate) fn read_properties(&mut self) -> Result<Properties, CodecError> {
        let mut properties = Properties::new();
        loop {
            match self.next()? {
                Event::Empty(e) if e.name().as_ref() == b"property" => {
                    let attrs = self.attributes(&e)?;
                    let name = attrs.required("name")?.to_string();
                    let value = attrs.get("value").unwrap_or_default().to_string();
                    properties.insert(name, value);
                }
                Event::Start(e) if e.name().as_ref() == b"property" => {
                    // Multi-line values are stored as element text
                    let attrs = self.attributes(&e)?;
                    let name = attrs.required("name")?.to_string();
                    let text = self.read_text(b"property")?;
                    let value = match attrs.get("value") {
                        Some(v) if text.is_empty() => v.to_string(),
                        _ => text,
                    };
                    properties.insert(name, value);
                }
                Event::Start(e) => {
                    let inner = e.name().as_ref().to_vec();
                    self.skip_element(&inner)?;
                }
                Event::End(e) if e.name().as_ref() == b"properties" => return Ok(properties),
                Event::Eof => return Err(self.error(unclosed(b"properties"))),
                _ => {}
            }
        }
    }

    pub(crate) fn attributes(&self, element: &BytesStart<'_>) -> Result<Attributes<'a>, CodecError> {
        let mut values = HashMap::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| self.error(format!("Failed to parse attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| self.error(format!("Failed to parse attribute '{key}': {e}")))?
                .into_owned();
            values.insert(key, value);
        }
        Ok(Attributes {
            element: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
            values,
            path: self.path,
            line: self.line(),
        })
    }
}

/// Attributes of one element, with typed accessors that report the element's line.
pub(crate) struct Attributes<'a> {
    element: String,
    values: HashMap<String, String>,
    path: &'a Path,
    line: usize,
}

impl Attributes<'_> {
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub(crate) fn required(&self, key: &str) -> Result<&str, CodecError> {
        self.get(key).ok_or_else(|| {
            CodecError::parse(
                self.path,
                Some(self.line),
                format!("<{}> is missing the '{key}' attribute", self.element),
            )
        })
    }

    pub(crate) fn required_u32(&self, key: &str) -> Result<u32, CodecError> {
        let raw = self.required(key)?;
        self.parse_number(key, raw)
    }

    pub(crate) fn u32_or(&self, key: &str, default: u32) -> Result<u32, CodecError> {
        match self.get(key) {
            Some(raw) => self.parse_number(key, raw),
            None => Ok(default),
        }
    }

    pub(crate) fn optional_u32(&self, key: &str) -> Result<Option<u32>, CodecError> {
        self.get(key).map(|raw| self.parse_number(key, raw)).transpose()
    }

    pub(crate) fn f32_or(&self, key: &str, default: f32) -> Result<f32, CodecError> {
        match self.get(key) {
            Some(raw) => self.parse_number(key, raw),
            None => Ok(default),
        }
    }

    fn parse_number<T>(&self, key: &str, raw: &str) -> Result<T, CodecError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        raw.trim().parse::<T>().map_err(|e| {
            CodecError::parse(
                self.path,
                Some(self.line),
                format!("<{}> attribute '{key}'='{raw}': {e}", self.element),
            )
        })
    }
}

/// Indented writer producing an in-memory document.
pub(crate) struct XmlWriter<'a> {
    writer: Writer<Vec<u8>>,
    path: &'a Path,
}

impl<'a> XmlWriter<'a> {
    pub(crate) fn new(path: &'a Path) -> Result<Self, CodecError> {
        let mut out = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 1),
            path,
        };
        out.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(out)
    }

    pub(crate) fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), CodecError> {
        self.write(Event::Start(element(name, attributes)))
    }

    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), CodecError> {
        self.write(Event::Empty(element(name, attributes)))
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<(), CodecError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    pub(crate) fn text(&mut self, text: &str) -> Result<(), CodecError> {
        self.write(Event::Text(BytesText::new(text)))
    }

    /// Write a `<properties>` block; nothing at all when `properties` is empty.
    pub(crate) fn properties(&mut self, properties: &Properties) -> Result<(), CodecError> {
        if properties.is_empty() {
            return Ok(());
        }
        self.start("properties", &[])?;
        for (name, value) in properties {
            let mut property = BytesStart::new("property");
            push_verbatim(&mut property, "name", name);
            push_verbatim(&mut property, "value", value);
            self.write(Event::Empty(property))?;
        }
        self.end("properties")
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        bytes
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), CodecError> {
        self.writer
            .write_event(event)
            .map_err(|e| CodecError::io(self.path, std::io::Error::other(e.to_string())))
    }
}

fn element<'n>(name: &'n str, attributes: &[(&str, &str)]) -> BytesStart<'n> {
    let mut start = BytesStart::new(name);
    for &(key, value) in attributes {
        start.push_attribute((key, value));
    }
    start
}

/// Add an attribute whose line breaks and tabs are written as character
/// references, so readers that normalize attribute whitespace keep them.
fn push_verbatim(element: &mut BytesStart<'_>, key: &str, value: &str) {
    let mut escaped = String::with_capacity(value.len());
    for ch in escape(value).chars() {
        match ch {
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    element.push_attribute(Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    });
}

fn unclosed(name: &[u8]) -> String {
    format!("<{}> is never closed", String::from_utf8_lossy(name))
}

/// 1-based line number of a byte offset.
pub(crate) fn line_at(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
