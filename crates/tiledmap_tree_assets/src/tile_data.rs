//! Tile layer payload encoding.
//!
//! Tile layers store their raw GIDs inside a `<data>` element. How those GIDs
//! are turned into text is decided by a [`LayerFormat`] (encoding plus optional
//! compression) and carried out by a [`TileDataCodec`].
//!
//! The built-in [`DefaultTileDataCodec`] handles CSV and uncompressed base64.
//! Compressed payloads belong to an external codec: plug one in by implementing
//! [`TileDataCodec`] and handing it to the map file codec.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Text encoding of a `<data>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileEncoding {
    Csv,
    Base64,
}

impl TileEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TileEncoding::Csv => "csv",
            TileEncoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for TileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileEncoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(TileEncoding::Csv),
            "base64" => Ok(TileEncoding::Base64),
            other => Err(CodecError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// Compression applied to base64 payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileCompression {
    #[default]
    None,
    Zlib,
    Gzip,
    Zstd,
}

impl TileCompression {
    /// The attribute value, or `None` when no `compression` attribute is written.
    pub fn as_attribute(self) -> Option<&'static str> {
        match self {
            TileCompression::None => None,
            TileCompression::Zlib => Some("zlib"),
            TileCompression::Gzip => Some("gzip"),
            TileCompression::Zstd => Some("zstd"),
        }
    }
}

impl FromStr for TileCompression {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(TileCompression::None),
            "zlib" => Ok(TileCompression::Zlib),
            "gzip" => Ok(TileCompression::Gzip),
            "zstd" => Ok(TileCompression::Zstd),
            other => Err(CodecError::UnsupportedCompression(other.to_string())),
        }
    }
}

/// Encoding policy of one tile layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerFormat {
    pub encoding: TileEncoding,
    #[serde(default)]
    pub compression: TileCompression,
}

impl Default for LayerFormat {
    fn default() -> Self {
        Self {
            encoding: TileEncoding::Base64,
            compression: TileCompression::None,
        }
    }
}

impl LayerFormat {
    pub const CSV: LayerFormat = LayerFormat {
        encoding: TileEncoding::Csv,
        compression: TileCompression::None,
    };
}

/// Converts raw tile GIDs to and from the text stored in a `<data>` element.
pub trait TileDataCodec {
    fn encode(&self, format: LayerFormat, tiles: &[u32]) -> Result<String, CodecError>;

    fn decode(&self, format: LayerFormat, text: &str) -> Result<Vec<u32>, CodecError>;
}

/// CSV and uncompressed base64 (little-endian `u32` per tile).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTileDataCodec;

impl TileDataCodec for DefaultTileDataCodec {
    fn encode(&self, format: LayerFormat, tiles: &[u32]) -> Result<String, CodecError> {
        reject_compression(format)?;

        match format.encoding {
            TileEncoding::Csv => Ok(tiles
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")),
            TileEncoding::Base64 => {
                let bytes: Vec<u8> = tiles.iter().flat_map(|gid| gid.to_le_bytes()).collect();
                Ok(STANDARD.encode(bytes))
            }
        }
    }

    fn decode(&self, format: LayerFormat, text: &str) -> Result<Vec<u32>, CodecError> {
        reject_compression(format)?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        match format.encoding {
            TileEncoding::Csv => text
                .split(',')
                .map(|cell| {
                    cell.trim().parse::<u32>().map_err(|e| {
                        CodecError::UnsupportedEncoding(format!("csv cell '{}': {e}", cell.trim()))
                    })
                })
                .collect(),
            TileEncoding::Base64 => {
                let bytes = STANDARD
                    .decode(text)
                    .map_err(|e| CodecError::UnsupportedEncoding(format!("base64: {e}")))?;
                if bytes.len() % 4 != 0 {
                    return Err(CodecError::UnsupportedEncoding(format!(
                        "base64 payload of {} bytes is not a whole number of tiles",
                        bytes.len()
                    )));
                }
                Ok(bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect())
            }
        }
    }
}

fn reject_compression(format: LayerFormat) -> Result<(), CodecError> {
    match format.compression.as_attribute() {
        None => Ok(()),
        Some(name) => Err(CodecError::UnsupportedCompression(name.to_string())),
    }
}
