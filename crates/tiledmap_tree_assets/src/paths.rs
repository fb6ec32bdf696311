//! Naming rules tying map ids to file names, and path checks shared by the codecs.

use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;

use crate::error::PathError;

/// Extension used for map files unless configured otherwise.
pub const DEFAULT_MAP_EXTENSION: &str = "tmx";

/// Minimum number of digits in a map file name.
pub const MAP_ID_WIDTH: usize = 4;

/// Render a map id as its file name: zero-padded to four digits, growing
/// for larger ids rather than truncating.
///
/// ```
/// use tiledmap_tree_assets::paths::map_file_name;
///
/// assert_eq!(map_file_name(1, "tmx"), "0001.tmx");
/// assert_eq!(map_file_name(10000, "tmx"), "10000.tmx");
/// ```
pub fn map_file_name(id: u32, extension: &str) -> String {
    format!("{}.{}", format_map_id(id), extension)
}

/// The zero-padded id without extension, also used for default object names.
pub fn format_map_id(id: u32) -> String {
    format!("{id:0width$}", width = MAP_ID_WIDTH)
}

/// Extract the map id from a map file path.
///
/// The id is the file stem interpreted as an unsigned integer. Stems that are
/// empty, contain anything but ASCII digits, overflow, or are zero are rejected.
pub fn map_id_from_path(path: &Path) -> Result<u32, PathError> {
    let stem = path
        .file_stem()
        .ok_or_else(|| PathError::InvalidMapFileName(path.to_path_buf()))?
        .to_str()
        .ok_or_else(|| PathError::NotUtf8(path.to_path_buf()))?;

    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidMapFileName(path.to_path_buf()));
    }

    match stem.parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(PathError::InvalidMapFileName(path.to_path_buf())),
    }
}

/// Fail with [`PathError::NonexistentFile`] unless `path` is an existing regular file.
pub fn require_file(path: &Path) -> Result<(), PathError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PathError::NonexistentFile(path.to_path_buf()))
    }
}

/// Fail with [`PathError::NonexistentDirectory`] unless `path` is an existing directory.
pub fn require_directory(path: &Path) -> Result<(), PathError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PathError::NonexistentDirectory(path.to_path_buf()))
    }
}

/// Resolve a path written inside a file (like a tileset `source`) against the
/// directory of that file.
///
/// Absolute references are returned unchanged. Relative ones are joined to the
/// parent directory and normalized so `..` and `.` components disappear.
pub fn resolve_relative(referencing_file: &Path, reference: &str) -> PathBuf {
    // Tiled always writes forward slashes
    let reference = reference.replace('\\', "/");
    let reference = Path::new(&reference);

    if reference.is_absolute() {
        return reference.to_path_buf();
    }

    let parent = referencing_file.parent().unwrap_or_else(|| Path::new(""));
    parent.join(reference).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_padding() {
        assert_eq!(map_file_name(1, "tmx"), "0001.tmx");
        assert_eq!(map_file_name(42, "tmx"), "0042.tmx");
        assert_eq!(map_file_name(1000, "tmx"), "1000.tmx");
        assert_eq!(map_file_name(9999, "tmx"), "9999.tmx");
        assert_eq!(map_file_name(10000, "tmx"), "10000.tmx");
    }

    #[test]
    fn test_id_from_path() {
        assert_eq!(map_id_from_path(Path::new("maps/0001.tmx")).unwrap(), 1);
        assert_eq!(map_id_from_path(Path::new("0420.tmx")).unwrap(), 420);
        assert_eq!(map_id_from_path(Path::new("/tmp/x/10000.tmx")).unwrap(), 10000);
    }

    #[test]
    fn test_id_from_path_rejects_garbage() {
        for name in ["abc.tmx", "12a.tmx", ".tmx", "0000.tmx", "-1.tmx", "99999999999.tmx"] {
            assert!(
                matches!(
                    map_id_from_path(Path::new(name)),
                    Err(PathError::InvalidMapFileName(_))
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_relative() {
        let resolved = resolve_relative(Path::new("project/maps/0001.tmx"), "../tilesets/grass.tsx");
        assert_eq!(resolved, PathBuf::from("project/tilesets/grass.tsx"));

        let resolved = resolve_relative(Path::new("0001.tmx"), "grass.tsx");
        assert_eq!(resolved, PathBuf::from("grass.tsx"));
    }

    #[test]
    fn test_require_missing_entries() {
        let missing = Path::new("definitely/not/here");
        assert!(matches!(
            require_file(missing),
            Err(PathError::NonexistentFile(_))
        ));
        assert!(matches!(
            require_directory(missing),
            Err(PathError::NonexistentDirectory(_))
        ));
    }
}
