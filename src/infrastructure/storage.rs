//! Storage implementations: JSON snapshot file and in-memory.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::{NodeStore, Snapshot};
use crate::infrastructure::traits::{Storage, StorageLock};

/// File name of the registry snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "registry.json";
/// Lock file guarding writers of the snapshot, next to it.
pub const LOCK_FILE: &str = "registry.lock";

/// Registry persisted as one JSON document.
///
/// Saves go to a temporary file in the same directory which is then renamed
/// over the snapshot, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the default file name inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SNAPSHOT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }
}

fn invalid_data(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

impl Storage for JsonFileStorage {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> io::Result<NodeStore> {
        if !self.path.exists() {
            debug!("load: no snapshot yet, starting empty");
            return Ok(NodeStore::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(invalid_data)?;
        NodeStore::from_snapshot(snapshot).map_err(invalid_data)
    }

    #[instrument(level = "debug", skip(self, store), fields(path = %self.path.display()))]
    fn save(&self, store: &NodeStore) -> io::Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(dir)?;

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &store.to_snapshot())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("save: {} node(s)", store.node_count());
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn lock(&self) -> io::Result<StorageLock<'_>> {
        let dir = self.dir();
        std::fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        FileExt::lock_exclusive(&file)?;
        debug!("lock: acquired");
        Ok(StorageLock::File(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Storage that keeps the committed snapshot in memory.
///
/// `fail_next_save` makes the next save fail once, to exercise rollback.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    committed: Mutex<Option<Snapshot>>,
    writer: Mutex<()>,
    fail_next: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_save(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> io::Result<NodeStore> {
        let committed = self.committed.lock().unwrap_or_else(|e| e.into_inner());
        match committed.as_ref() {
            Some(snapshot) => NodeStore::from_snapshot(snapshot.clone()).map_err(invalid_data),
            None => Ok(NodeStore::new()),
        }
    }

    fn save(&self, store: &NodeStore) -> io::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(io::Error::other("injected save failure"));
        }
        let mut committed = self.committed.lock().unwrap_or_else(|e| e.into_inner());
        *committed = Some(store.to_snapshot());
        Ok(())
    }

    fn lock(&self) -> io::Result<StorageLock<'_>> {
        Ok(StorageLock::Local(
            self.writer.lock().unwrap_or_else(|e| e.into_inner()),
        ))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
