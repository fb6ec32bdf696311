use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace};

use crate::assets::map::{LayerDocument, MapDocument, ObjectDocument, Properties, TilesetBinding};
use crate::error::CodecError;
use crate::loaders::tileset::load_tileset_summary;
use crate::loaders::xml::{XmlParser, XmlWriter};
use crate::paths::{require_file, resolve_relative};
use crate::tile_data::{LayerFormat, TileCompression, TileDataCodec, TileEncoding};

/// TMX format version written into every map file.
pub const TMX_VERSION: &str = "1.10";

/// Read a map file (.tmx) into a [`MapDocument`].
///
/// Tilesets written without a `tilecount` attribute have their `.tsx` loaded
/// (relative to the map file) so GID ranges can still be rebuilt.
///
/// # Errors
/// * [`CodecError::InvalidPath`] if `path` is not an existing file
/// * [`CodecError::MalformedMapFile`] if the file is empty or its root is not `<map>`
/// * [`CodecError::Parse`] for XML syntax errors and missing or invalid attributes
pub fn read_map_document(
    path: &Path,
    codec: &dyn TileDataCodec,
) -> Result<MapDocument, CodecError> {
    require_file(path)?;
    let content = fs::read_to_string(path).map_err(|e| CodecError::io(path, e))?;
    parse_map_document(&content, path, codec)
}

/// Parse map XML already held in memory. `path` is used for error messages
/// and for resolving tileset sources.
pub fn parse_map_document(
    content: &str,
    path: &Path,
    codec: &dyn TileDataCodec,
) -> Result<MapDocument, CodecError> {
    if content.trim().is_empty() {
        return Err(CodecError::MalformedMapFile {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }

    let mut parser = XmlParser::new(content, path);

    let (root, is_empty) = loop {
        match parser.next()? {
            Event::Start(e) => break (e, false),
            Event::Empty(e) => break (e, true),
            Event::Eof => {
                return Err(CodecError::MalformedMapFile {
                    path: path.to_path_buf(),
                    reason: "no root element".to_string(),
                });
            }
            _ => {}
        }
    };

    if root.name().as_ref() != b"map" {
        return Err(CodecError::MalformedMapFile {
            path: path.to_path_buf(),
            reason: format!(
                "root element is <{}>, expected <map>",
                String::from_utf8_lossy(root.name().as_ref())
            ),
        });
    }

    let attrs = parser.attributes(&root)?;
    let mut document = MapDocument {
        width: attrs.required_u32("width")?,
        height: attrs.required_u32("height")?,
        tile_width: attrs.required_u32("tilewidth")?,
        tile_height: attrs.required_u32("tileheight")?,
        properties: Properties::new(),
        tilesets: Vec::new(),
        layers: Vec::new(),
    };

    if is_empty {
        return Ok(document);
    }

    loop {
        match parser.next()? {
            Event::Start(e) => match e.name().as_ref() {
                b"properties" => document.properties = parser.read_properties()?,
                b"tileset" => {
                    let binding = read_tileset_binding(&parser, &e)?;
                    // Embedded tileset content (image, tiles) is not kept
                    parser.skip_element(b"tileset")?;
                    document.tilesets.push(binding);
                }
                b"layer" => document.layers.push(read_tile_layer(&mut parser, &e, codec, false)?),
                b"objectgroup" => document.layers.push(read_object_layer(&mut parser, &e, false)?),
                other => {
                    let other = other.to_vec();
                    parser.skip_element(&other)?;
                }
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"tileset" => document.tilesets.push(read_tileset_binding(&parser, &e)?),
                b"layer" => document.layers.push(read_tile_layer(&mut parser, &e, codec, true)?),
                b"objectgroup" => document.layers.push(read_object_layer(&mut parser, &e, true)?),
                other => trace!("Ignoring <{}/>", String::from_utf8_lossy(other)),
            },
            Event::End(e) if e.name().as_ref() == b"map" => break,
            Event::Eof => return Err(parser.error("<map> is never closed")),
            _ => {}
        }
    }

    debug!(
        "Read map document {} ({} layers, {} tilesets)",
        path.display(),
        document.layers.len(),
        document.tilesets.len()
    );

    Ok(document)
}

fn read_tileset_binding(
    parser: &XmlParser<'_>,
    element: &BytesStart<'_>,
) -> Result<TilesetBinding, CodecError> {
    let attrs = parser.attributes(element)?;
    let first_gid = attrs.required_u32("firstgid")?;
    let source = attrs.get("source").unwrap_or_default().to_string();
    let mut name = attrs.get("name").unwrap_or_default().to_string();
    let mut tile_count = attrs.optional_u32("tilecount")?;

    if tile_count.is_none() && !source.is_empty() {
        let tsx_path = resolve_relative(parser.path(), &source);
        debug!(
            "Tileset {} has no tilecount, reading {}",
            source,
            tsx_path.display()
        );
        let summary = load_tileset_summary(&tsx_path)?;
        tile_count = Some(summary.tile_count);
        if name.is_empty() {
            name = summary.name;
        }
    }

    Ok(TilesetBinding {
        first_gid,
        source,
        name,
        tile_count,
    })
}

/// Name and size of a `<layer>`.
fn tile_layer_header(
    parser: &XmlParser<'_>,
    element: &BytesStart<'_>,
) -> Result<(String, u32, u32), CodecError> {
    let attrs = parser.attributes(element)?;
    Ok((
        attrs.get("name").unwrap_or_default().to_string(),
        attrs.required_u32("width")?,
        attrs.required_u32("height")?,
    ))
}

fn read_tile_layer(
    parser: &mut XmlParser<'_>,
    element: &BytesStart<'_>,
    codec: &dyn TileDataCodec,
    is_empty: bool,
) -> Result<LayerDocument, CodecError> {
    let (name, width, height) = tile_layer_header(parser, element)?;
    let mut format = LayerFormat::default();
    let mut tiles = Vec::new();
    let mut properties = Properties::new();

    while !is_empty {
        match parser.next()? {
            Event::Start(e) if e.name().as_ref() == b"properties" => {
                properties = parser.read_properties()?;
            }
            Event::Start(e) if e.name().as_ref() == b"data" => {
                format = read_layer_format(parser, &e)?;
                let line = parser.line();
                let text = parser.read_text(b"data")?;
                tiles = codec.decode(format, &text).map_err(|err| match err {
                    CodecError::UnsupportedEncoding(message) => {
                        CodecError::parse(parser.path(), Some(line), message)
                    }
                    other => other,
                })?;
            }
            Event::Empty(e) if e.name().as_ref() == b"data" => {
                format = read_layer_format(parser, &e)?;
            }
            Event::Start(e) => {
                let other = e.name().as_ref().to_vec();
                parser.skip_element(&other)?;
            }
            Event::End(e) if e.name().as_ref() == b"layer" => break,
            Event::Eof => return Err(parser.error("<layer> is never closed")),
            _ => {}
        }
    }

    Ok(LayerDocument::Tiles {
        name,
        width,
        height,
        format,
        tiles,
        properties,
    })
}

fn read_layer_format(
    parser: &XmlParser<'_>,
    element: &BytesStart<'_>,
) -> Result<LayerFormat, CodecError> {
    let attrs = parser.attributes(element)?;
    let encoding = attrs
        .get("encoding")
        .ok_or_else(|| parser.error("<data> without encoding (XML tile elements) is not supported"))?
        .parse::<TileEncoding>()?;
    let compression = attrs
        .get("compression")
        .unwrap_or_default()
        .parse::<TileCompression>()?;
    Ok(LayerFormat {
        encoding,
        compression,
    })
}

fn read_object_layer(
    parser: &mut XmlParser<'_>,
    element: &BytesStart<'_>,
    is_empty: bool,
) -> Result<LayerDocument, CodecError> {
    let attrs = parser.attributes(element)?;
    let name = attrs.get("name").unwrap_or_default().to_string();
    let mut objects = Vec::new();
    let mut properties = Properties::new();

    if !is_empty {
        loop {
            match parser.next()? {
                Event::Start(e) if e.name().as_ref() == b"properties" => {
                    properties = parser.read_properties()?;
                }
                Event::Start(e) if e.name().as_ref() == b"object" => {
                    let mut object = read_object_header(parser, &e)?;
                    read_object_body(parser, &mut object)?;
                    objects.push(object);
                }
                Event::Empty(e) if e.name().as_ref() == b"object" => {
                    objects.push(read_object_header(parser, &e)?);
                }
                Event::Start(e) => {
                    let other = e.name().as_ref().to_vec();
                    parser.skip_element(&other)?;
                }
                Event::End(e) if e.name().as_ref() == b"objectgroup" => break,
                Event::Eof => return Err(parser.error("<objectgroup> is never closed")),
                _ => {}
            }
        }
    }

    Ok(LayerDocument::Objects {
        name,
        objects,
        properties,
    })
}

fn read_object_header(
    parser: &XmlParser<'_>,
    element: &BytesStart<'_>,
) -> Result<ObjectDocument, CodecError> {
    let attrs = parser.attributes(element)?;
    Ok(ObjectDocument {
        id: attrs.u32_or("id", 0)?,
        name: attrs.get("name").unwrap_or_default().to_string(),
        x: attrs.f32_or("x", 0.0)?,
        y: attrs.f32_or("y", 0.0)?,
        width: attrs.f32_or("width", 0.0)?,
        height: attrs.f32_or("height", 0.0)?,
        gid: attrs.u32_or("gid", 0)?,
        properties: Properties::new(),
    })
}

fn read_object_body(
    parser: &mut XmlParser<'_>,
    object: &mut ObjectDocument,
) -> Result<(), CodecError> {
    loop {
        match parser.next()? {
            Event::Start(e) if e.name().as_ref() == b"properties" => {
                object.properties = parser.read_properties()?;
            }
            Event::Start(e) => {
                // Shapes (polygon, text, ...) are not modelled
                let other = e.name().as_ref().to_vec();
                parser.skip_element(&other)?;
            }
            Event::End(e) if e.name().as_ref() == b"object" => return Ok(()),
            Event::Eof => return Err(parser.error("<object> is never closed")),
            _ => {}
        }
    }
}

/// Serialize a [`MapDocument`] to TMX bytes.
pub fn render_map_document(
    document: &MapDocument,
    path: &Path,
    codec: &dyn TileDataCodec,
) -> Result<Vec<u8>, CodecError> {
    let width = document.width.to_string();
    let height = document.height.to_string();
    let tile_width = document.tile_width.to_string();
    let tile_height = document.tile_height.to_string();
    let next_object_id = document.max_object_id().saturating_add(1).to_string();

    let mut out = XmlWriter::new(path)?;
    out.start(
        "map",
        &[
            ("version", TMX_VERSION),
            ("orientation", "orthogonal"),
            ("renderorder", "right-down"),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("tilewidth", tile_width.as_str()),
            ("tileheight", tile_height.as_str()),
            ("infinite", "0"),
            ("nextobjectid", next_object_id.as_str()),
        ],
    )?;
    out.properties(&document.properties)?;

    for tileset in &document.tilesets {
        let first_gid = tileset.first_gid.to_string();
        let tile_count = tileset.tile_count.map(|c| c.to_string());
        let mut attrs = vec![("firstgid", first_gid.as_str())];
        if !tileset.source.is_empty() {
            attrs.push(("source", tileset.source.as_str()));
        }
        if !tileset.name.is_empty() {
            attrs.push(("name", tileset.name.as_str()));
        }
        if let Some(count) = &tile_count {
            attrs.push(("tilecount", count.as_str()));
        }
        out.empty("tileset", &attrs)?;
    }

    for layer in &document.layers {
        match layer {
            LayerDocument::Tiles {
                name,
                width,
                height,
                format,
                tiles,
                properties,
            } => {
                let width = width.to_string();
                let height = height.to_string();
                out.start(
                    "layer",
                    &[
                        ("name", name.as_str()),
                        ("width", width.as_str()),
                        ("height", height.as_str()),
                    ],
                )?;
                out.properties(properties)?;

                let mut data_attrs = vec![("encoding", format.encoding.as_str())];
                if let Some(compression) = format.compression.as_attribute() {
                    data_attrs.push(("compression", compression));
                }
                let text = codec.encode(*format, tiles)?;
                if text.is_empty() {
                    out.empty("data", &data_attrs)?;
                } else {
                    out.start("data", &data_attrs)?;
                    out.text(&text)?;
                    out.end("data")?;
                }
                out.end("layer")?;
            }
            LayerDocument::Objects {
                name,
                objects,
                properties,
            } => {
                if objects.is_empty() && properties.is_empty() {
                    out.empty("objectgroup", &[("name", name.as_str())])?;
                    continue;
                }
                out.start("objectgroup", &[("name", name.as_str())])?;
                out.properties(properties)?;
                for object in objects {
                    write_object(&mut out, object)?;
                }
                out.end("objectgroup")?;
            }
        }
    }

    out.end("map")?;
    Ok(out.finish())
}

fn write_object(out: &mut XmlWriter<'_>, object: &ObjectDocument) -> Result<(), CodecError> {
    let id = object.id.to_string();
    let x = object.x.to_string();
    let y = object.y.to_string();
    let width = object.width.to_string();
    let height = object.height.to_string();
    let gid = object.gid.to_string();

    let mut attrs = vec![("id", id.as_str())];
    if !object.name.is_empty() {
        attrs.push(("name", object.name.as_str()));
    }
    if object.gid != 0 {
        attrs.push(("gid", gid.as_str()));
    }
    attrs.extend([("x", x.as_str()), ("y", y.as_str())]);
    attrs.extend([("width", width.as_str()), ("height", height.as_str())]);

    if object.properties.is_empty() {
        out.empty("object", &attrs)
    } else {
        out.start("object", &attrs)?;
        out.properties(&object.properties)?;
        out.end("object")
    }
}

/// Write a [`MapDocument`] to `path`, replacing any existing file.
pub fn write_map_document(
    document: &MapDocument,
    path: &Path,
    codec: &dyn TileDataCodec,
) -> Result<(), CodecError> {
    let bytes = render_map_document(document, path, codec)?;
    fs::write(path, bytes).map_err(|e| CodecError::io(path, e))?;
    debug!("Wrote map document {}", path.display());
    Ok(())
}
