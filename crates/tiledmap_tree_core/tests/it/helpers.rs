use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Once;

use tempfile::TempDir;
use tiledmap_tree_core::prelude::*;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive("tiledmap_tree_core=debug".parse().unwrap()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A temporary maps directory and the descriptor path inside it.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn maps(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn hierarchy(&self) -> PathBuf {
        self.dir.path().join("maps.xml")
    }

    /// Names and contents of every file, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<_> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (
                    entry.file_name().to_string_lossy().into_owned(),
                    std::fs::read(entry.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }
}

/// Record the kinds of every event a map emits.
pub fn record(map: &Map) -> Rc<RefCell<Vec<MapEventKind>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    map.subscribe(move |event| l.borrow_mut().push(event.kind()));
    log
}

pub fn ids(maps: impl IntoIterator<Item = Map>) -> Vec<u32> {
    maps.into_iter().map(|map| map.id()).collect()
}
