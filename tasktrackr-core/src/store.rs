//! TaskStore: the ordered task list and the JSON file that backs it.
//!
//! - Insertion order is preserved; tasks are addressed by index.
//! - Every mutation rewrites the whole file before returning.
//! - Loading never fails hard: a missing file is an empty store, an unreadable
//!   file degrades to an empty store (left in place, plus a timestamped
//!   `.malformed-*` copy of its bytes), and bad records are skipped one by one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::task::Task;
use crate::time;

pub const DEFAULT_DATA_FILE: &str = "tasks.json";

/// Store handle shared by the command loop and the reminder poller.
pub type SharedStore = Arc<Mutex<TaskStore>>;

#[derive(Debug)]
pub enum LoadOutcome {
    /// No file yet; the store starts empty.
    Missing,
    Loaded,
    /// The file could not be read or parsed. The store is empty and the file untouched.
    Malformed {
        error: StoreError,
        backup: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the file's array.
    pub position: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl LoadReport {
    fn empty(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            loaded: 0,
            skipped: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// An empty store bound to `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tasks: Vec::new(),
        }
    }

    /// Bind to `path` and load it.
    pub fn open(path: impl Into<PathBuf>) -> (Self, LoadReport) {
        let mut store = Self::new(path);
        let report = store.load();
        (store, report)
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    /// Replace the in-memory list with the file's contents.
    pub fn load(&mut self) -> LoadReport {
        self.tasks.clear();

        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no task file yet");
                return LoadReport::empty(LoadOutcome::Missing);
            }
            Err(source) => {
                let error = StoreError::Io {
                    path: self.path.clone(),
                    source,
                };
                warn!(%error, "could not read task file; starting empty");
                return LoadReport::empty(LoadOutcome::Malformed { error, backup: None });
            }
        };

        // Bytes, not a String: invalid UTF-8 is just another malformed file.
        let records: Vec<serde_json::Value> = match serde_json::from_slice(&raw) {
            Ok(records) => records,
            Err(source) => {
                let error = StoreError::Malformed {
                    path: self.path.clone(),
                    source,
                };
                warn!(%error, "task file is malformed; starting empty");
                let backup = self.write_backup(&raw);
                return LoadReport::empty(LoadOutcome::Malformed { error, backup });
            }
        };

        let mut skipped = Vec::new();
        for (position, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<Task>(value) {
                Ok(task) => self.tasks.push(task),
                Err(e) => {
                    warn!(position, error = %e, "skipping unreadable task record");
                    skipped.push(SkippedRecord {
                        position,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            path = %self.path.display(),
            loaded = self.tasks.len(),
            skipped = skipped.len(),
            "loaded tasks"
        );

        LoadReport {
            outcome: LoadOutcome::Loaded,
            loaded: self.tasks.len(),
            skipped,
        }
    }

    /// Rewrite the file with the full list.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.tasks)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    /// Append and persist. On a write error the task stays in memory.
    pub fn add(&mut self, task: Task) -> Result<(), StoreError> {
        debug!(title = task.title(), "adding task");
        self.tasks.push(task);
        self.save()
    }

    /// Remove the task at `index` and persist. Out of range is a no-op error.
    pub fn remove(&mut self, index: usize) -> Result<Task, StoreError> {
        self.check_index(index)?;
        let task = self.tasks.remove(index);
        self.save()?;
        Ok(task)
    }

    /// Flip completion at `index` and persist, returning the new state.
    pub fn toggle_completion(&mut self, index: usize) -> Result<bool, StoreError> {
        self.check_index(index)?;
        let completed = self.tasks[index].toggle_completed();
        self.save()?;
        Ok(completed)
    }

    /// All tasks, or only the incomplete ones, in insertion order.
    pub fn list(&self, include_completed: bool) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| include_completed || !t.is_completed())
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            })
        }
    }

    /// `<file>.malformed-<local time to the microsecond>`, so repeated corruption never
    /// overwrites an earlier copy.
    fn backup_path(&self) -> PathBuf {
        let mut base = self.path.as_os_str().to_owned();
        base.push(format!(".malformed-{}", time::now().format("%Y%m%dT%H%M%S%6f")));

        let mut candidate = PathBuf::from(&base);
        let mut n = 1;
        while candidate.exists() {
            let mut name = base.clone();
            name.push(format!("-{n}"));
            candidate = PathBuf::from(name);
            n += 1;
        }
        candidate
    }

    fn write_backup(&self, raw: &[u8]) -> Option<PathBuf> {
        let backup = self.backup_path();
        match fs::write(&backup, raw) {
            Ok(()) => {
                info!(backup = %backup.display(), "kept a copy of the malformed task file");
                Some(backup)
            }
            Err(e) => {
                warn!(backup = %backup.display(), error = %e, "could not back up malformed task file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(titles: &[&str]) -> (TempDir, TaskStore) {
        let dir = TempDir::new().unwrap();
        let mut store = TaskStore::new(dir.path().join("tasks.json"));
        for t in titles {
            store.add(Task::new(t, "").unwrap()).unwrap();
        }
        (dir, store)
    }

    fn titles(store: &TaskStore) -> Vec<&str> {
        store.list(true).into_iter().map(Task::title).collect()
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let (store, report) = TaskStore::open(dir.path().join("nope.json"));
        assert!(store.is_empty());
        assert!(matches!(report.outcome, LoadOutcome::Missing));
    }

    #[test]
    fn add_persists_immediately() {
        let (_dir, store) = store_with(&["a", "b"]);
        let (reloaded, report) = TaskStore::open(store.path());
        assert_eq!(report.loaded, 2);
        assert_eq!(titles(&reloaded), vec!["a", "b"]);
    }

    #[test]
    fn remove_in_range_drops_one_entry() {
        let (_dir, mut store) = store_with(&["a", "b", "c"]);
        let removed = store.remove(1).unwrap();
        assert_eq!(removed.title(), "b");
        assert_eq!(titles(&store), vec!["a", "c"]);

        let (reloaded, _) = TaskStore::open(store.path());
        assert_eq!(titles(&reloaded), vec!["a", "c"]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let (_dir, mut store) = store_with(&["a", "b"]);
        let err = store.remove(2).unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(titles(&store), vec!["a", "b"]);
    }

    #[test]
    fn toggle_twice_restores_state() {
        let (_dir, mut store) = store_with(&["a"]);
        assert!(store.toggle_completion(0).unwrap());
        assert!(store.get(0).unwrap().is_completed());
        assert!(!store.toggle_completion(0).unwrap());
        assert!(!store.get(0).unwrap().is_completed());
        assert!(store.toggle_completion(5).is_err());
    }

    #[test]
    fn list_can_hide_completed() {
        let (_dir, mut store) = store_with(&["a", "b", "c"]);
        store.toggle_completion(1).unwrap();
        let pending: Vec<&str> = store.list(false).into_iter().map(Task::title).collect();
        assert_eq!(pending, vec!["a", "c"]);
        assert_eq!(store.list(true).len(), 3);
    }

    #[test]
    fn malformed_file_is_kept_and_backed_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();

        let (store, report) = TaskStore::open(&path);
        assert!(store.is_empty());
        let LoadOutcome::Malformed { error, backup } = report.outcome else {
            panic!("expected a malformed load");
        };
        assert!(matches!(error, StoreError::Malformed { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
        assert_eq!(fs::read_to_string(backup.unwrap()).unwrap(), "{ not json");
    }

    #[test]
    fn repeated_corruption_keeps_every_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        fs::write(&path, "first garbage").unwrap();
        let (_, first) = TaskStore::open(&path);
        fs::write(&path, "second garbage").unwrap();
        let (_, second) = TaskStore::open(&path);

        let backup_of = |report: LoadReport| match report.outcome {
            LoadOutcome::Malformed { backup, .. } => backup.unwrap(),
            other => panic!("expected a malformed load, got {other:?}"),
        };
        let (first, second) = (backup_of(first), backup_of(second));
        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(first).unwrap(), "first garbage");
        assert_eq!(fs::read_to_string(second).unwrap(), "second garbage");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let mut store = TaskStore::new(dir.path().join("nested/deeper/tasks.json"));
        store.add(Task::new("a", "").unwrap()).unwrap();
        assert!(store.path().exists());
    }
}
