//! Error types for the file layer.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A path that cannot be used for the requested operation.
///
/// The two `Nonexistent*` variants cover the common case of an expected
/// filesystem entry being missing or having the wrong type.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("No such file: {}", .0.display())]
    NonexistentFile(PathBuf),

    #[error("No such directory: {}", .0.display())]
    NonexistentDirectory(PathBuf),

    #[error("File name does not encode a map id: {}", .0.display())]
    InvalidMapFileName(PathBuf),

    #[error("Invalid UTF-8 in path: {}", .0.display())]
    NotUtf8(PathBuf),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Parse error in {}{}: {message}", path.display(), line_suffix(*line))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("Malformed map file {}: {reason}", path.display())]
    MalformedMapFile { path: PathBuf, reason: String },

    #[error("Unsupported tile data encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("Tile data compression '{0}' requires an external codec")]
    UnsupportedCompression(String),

    #[error("Failed to load tileset: {0}")]
    Tileset(#[from] tiled::Error),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn parse(path: &Path, line: Option<usize>, message: impl Into<String>) -> Self {
        CodecError::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CodecError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Line number of a parse error, when one could be determined.
    pub fn line(&self) -> Option<usize> {
        match self {
            CodecError::Parse { line, .. } => *line,
            _ => None,
        }
    }
}

fn line_suffix(line: Option<usize>) -> String {
    line.map(|l| format!(":{l}")).unwrap_or_default()
}
