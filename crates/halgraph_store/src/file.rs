//! File-backed store for persistent offline sessions.

use crate::cache::{CacheStore, QueuedRequest, StoreOp};
use crate::error::StoreResult;
use crate::memory::Tables;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Out-of-band store notifications.
///
/// Logged via `tracing` by default; hosts that surface storage trouble in
/// their UI install a hook with [`FileStore::set_event_hook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A snapshot write failed. The failing operation also returns the
    /// error; the event exists for observers away from the call site.
    Error(String),
    /// Evidence of an interrupted writer was found while opening.
    Blocked,
}

type EventHook = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// On-disk snapshot layout. Versioned so future layouts can migrate.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    resources: BTreeMap<String, Value>,
    requests: Vec<QueuedRequest>,
    next_id: u64,
}

const SNAPSHOT_VERSION: u32 = 1;

/// A file-backed cache store.
///
/// Both tables are held in memory and written to a single JSON snapshot
/// file after every mutation. The snapshot is written to a sibling temp
/// file and renamed into place, so a crash mid-write leaves the previous
/// snapshot intact.
///
/// Suited to the scale this crate targets: one client's working set of
/// resources plus a short queue of pending writes. Not a database.
///
/// # Thread Safety
///
/// The store is thread-safe; the table lock is held across the snapshot
/// write, so concurrent mutations serialize.
pub struct FileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
    hook: RwLock<Option<EventHook>>,
}

impl FileStore {
    /// Opens a store at `path`, loading the existing snapshot if present.
    ///
    /// A leftover temp file from an interrupted writer is removed and
    /// reported as [`StoreEvent::Blocked`].
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file exists but cannot be read or
    /// parsed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let stale = path.with_extension("tmp");
        let interrupted = stale.exists();
        if interrupted {
            fs::remove_file(&stale)?;
        }

        let tables = if path.exists() {
            let contents = fs::read_to_string(path)?;
            let snapshot: Snapshot = serde_json::from_str(&contents)?;
            tracing::debug!(
                path = %path.display(),
                resources = snapshot.resources.len(),
                queued = snapshot.requests.len(),
                "loaded store snapshot"
            );
            Tables {
                resources: snapshot.resources,
                requests: VecDeque::from(snapshot.requests),
                next_id: snapshot.next_id,
            }
        } else {
            Tables::default()
        };

        let store = Self {
            path: path.to_path_buf(),
            tables: Mutex::new(tables),
            hook: RwLock::new(None),
        };
        if interrupted {
            store.emit(&StoreEvent::Blocked);
        }
        Ok(store)
    }

    /// Opens a store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the snapshot
    /// cannot be loaded.
    pub fn open_with_create_dirs(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Installs an observer for [`StoreEvent`]s, replacing any previous one.
    pub fn set_event_hook(&self, hook: impl Fn(&StoreEvent) + Send + Sync + 'static) {
        *self.hook.write() = Some(Box::new(hook));
    }

    fn emit(&self, event: &StoreEvent) {
        match event {
            StoreEvent::Error(message) => {
                tracing::warn!(path = %self.path.display(), "store error: {message}");
            }
            StoreEvent::Blocked => {
                tracing::warn!(path = %self.path.display(), "interrupted snapshot write detected");
            }
        }
        if let Some(hook) = &*self.hook.read() {
            hook(event);
        }
    }

    fn checkpoint(&self, tables: &Tables) -> StoreResult<()> {
        self.persist(tables).inspect_err(|err| {
            self.emit(&StoreEvent::Error(err.to_string()));
        })
    }

    fn persist(&self, tables: &Tables) -> StoreResult<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            resources: tables.resources.clone(),
            requests: tables.requests.iter().cloned().collect(),
            next_id: tables.next_id,
        };
        let contents = serde_json::to_vec(&snapshot)?;

        let temp = self.path.with_extension("tmp");
        {
            let mut file = File::create(&temp)?;
            file.write_all(&contents)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

impl CacheStore for FileStore {
    fn get_resource(&self, uri: &str) -> StoreResult<Option<Value>> {
        Ok(self.tables.lock().resources.get(uri).cloned())
    }

    fn put_resource(&self, uri: &str, value: Value) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.resources.insert(uri.to_string(), value);
        self.checkpoint(&tables)
    }

    fn delete_resource(&self, uri: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.resources.remove(uri);
        self.checkpoint(&tables)
    }

    fn enqueue_request(&self, request: Value) -> StoreResult<u64> {
        let mut tables = self.tables.lock();
        let id = tables.enqueue(request);
        self.checkpoint(&tables)?;
        Ok(id)
    }

    fn queued_requests(&self) -> StoreResult<Vec<QueuedRequest>> {
        Ok(self.tables.lock().requests.iter().cloned().collect())
    }

    fn remove_request(&self, id: u64) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.remove(id)?;
        self.checkpoint(&tables)
    }

    fn apply(&self, ops: Vec<StoreOp>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        for op in ops {
            tables.apply_op(op);
        }
        // One snapshot write for the whole batch.
        self.checkpoint(&tables)
    }
}
