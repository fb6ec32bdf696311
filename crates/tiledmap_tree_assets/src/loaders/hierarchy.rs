use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace};

use crate::assets::hierarchy::HierarchyNode;
use crate::error::CodecError;
use crate::loaders::xml::{XmlParser, XmlWriter};
use crate::paths::require_file;

/// Read the hierarchy descriptor at `path` into its top-level records.
///
/// # Errors
/// * [`CodecError::InvalidPath`] if `path` is not an existing file
/// * [`CodecError::Parse`] with a line number for any structural problem
pub fn read_hierarchy(path: &Path) -> Result<Vec<HierarchyNode>, CodecError> {
    require_file(path)?;
    let content = fs::read_to_string(path).map_err(|e| CodecError::io(path, e))?;
    parse_hierarchy(&content, path)
}

/// Parse a hierarchy descriptor already held in memory.
pub fn parse_hierarchy(content: &str, path: &Path) -> Result<Vec<HierarchyNode>, CodecError> {
    let mut parser = XmlParser::new(content, path);

    let roots = loop {
        match parser.next()? {
            Event::Start(e) => {
                expect_root(&parser, &e)?;
                break read_records(&mut parser, b"maps")?;
            }
            Event::Empty(e) => {
                expect_root(&parser, &e)?;
                break Vec::new();
            }
            Event::Eof => return Err(parser.error("no <maps> root element")),
            _ => {}
        }
    };

    debug!(
        "Read hierarchy {} ({} root maps, {} total)",
        path.display(),
        roots.len(),
        roots.iter().map(HierarchyNode::subtree_size).sum::<usize>()
    );

    Ok(roots)
}

fn expect_root(parser: &XmlParser<'_>, element: &BytesStart<'_>) -> Result<(), CodecError> {
    if element.name().as_ref() == b"maps" {
        Ok(())
    } else {
        Err(parser.error(format!(
            "root element is <{}>, expected <maps>",
            String::from_utf8_lossy(element.name().as_ref())
        )))
    }
}

/// Records nested in the element `closing` whose start tag was just read.
fn read_records(
    parser: &mut XmlParser<'_>,
    closing: &[u8],
) -> Result<Vec<HierarchyNode>, CodecError> {
    let mut records = Vec::new();
    loop {
        match parser.next()? {
            Event::Start(e) if e.name().as_ref() == b"map" => {
                let id = read_id(parser, &e)?;
                let children = read_records(parser, b"map")?;
                records.push(HierarchyNode::with_children(id, children));
            }
            Event::Empty(e) if e.name().as_ref() == b"map" => {
                records.push(HierarchyNode::leaf(read_id(parser, &e)?));
            }
            Event::Start(e) => {
                let other = e.name().as_ref().to_vec();
                parser.skip_element(&other)?;
            }
            Event::Empty(e) => {
                trace!("Ignoring <{}/>", String::from_utf8_lossy(e.name().as_ref()));
            }
            Event::End(e) if e.name().as_ref() == closing => return Ok(records),
            Event::End(e) => {
                return Err(parser.error(format!(
                    "unexpected </{}>, expected </{}>",
                    String::from_utf8_lossy(e.name().as_ref()),
                    String::from_utf8_lossy(closing)
                )));
            }
            Event::Eof => {
                return Err(parser.error(format!(
                    "<{}> is never closed",
                    String::from_utf8_lossy(closing)
                )));
            }
            Event::Text(_) | Event::CData(_) => {
                return Err(parser.error("unexpected text in hierarchy"));
            }
            _ => {}
        }
    }
}

fn read_id(parser: &XmlParser<'_>, element: &BytesStart<'_>) -> Result<u32, CodecError> {
    let id = parser.attributes(element)?.required_u32("id")?;
    if id == 0 {
        return Err(parser.error("map id must be positive"));
    }
    Ok(id)
}

/// Serialize records to descriptor bytes, children nested in their parent.
pub fn render_hierarchy(roots: &[HierarchyNode], path: &Path) -> Result<Vec<u8>, CodecError> {
    let mut out = XmlWriter::new(path)?;
    if roots.is_empty() {
        out.empty("maps", &[])?;
        return Ok(out.finish());
    }

    out.start("maps", &[])?;
    for root in roots {
        write_record(&mut out, root)?;
    }
    out.end("maps")?;
    Ok(out.finish())
}

fn write_record(out: &mut XmlWriter<'_>, node: &HierarchyNode) -> Result<(), CodecError> {
    let id = node.id.to_string();
    if node.children.is_empty() {
        return out.empty("map", &[("id", id.as_str())]);
    }
    out.start("map", &[("id", id.as_str())])?;
    for child in &node.children {
        write_record(out, child)?;
    }
    out.end("map")
}

/// Write the hierarchy descriptor to `path`, replacing any existing file.
pub fn write_hierarchy(roots: &[HierarchyNode], path: &Path) -> Result<(), CodecError> {
    let bytes = render_hierarchy(roots, path)?;
    fs::write(path, bytes).map_err(|e| CodecError::io(path, e))?;
    debug!("Wrote hierarchy {}", path.display());
    Ok(())
}
