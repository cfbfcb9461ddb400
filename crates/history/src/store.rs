use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use {
    serde_json::Value,
    tracing::{debug, warn},
};

use tabula_common::json_file;

/// Maximum number of entries kept on disk.
pub const MAX_HISTORY_ENTRIES: usize = 15;

/// JSON file-backed history list, newest first.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries. Missing, unreadable or non-array files yield `[]`.
    pub fn load(&self) -> Vec<Value> {
        match json_file::read_value(&self.path) {
            Ok(Some(Value::Array(entries))) => entries,
            Ok(Some(_)) => {
                warn!(path = %self.path.display(), "history file is not a JSON array, ignoring");
                Vec::new()
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to load history");
                Vec::new()
            },
        }
    }

    /// Persist at most [`MAX_HISTORY_ENTRIES`] entries. Failures are logged.
    pub fn save(&self, entries: &[Value]) {
        let kept = &entries[..entries.len().min(MAX_HISTORY_ENTRIES)];
        if let Err(e) = json_file::write_pretty(&self.path, kept) {
            warn!(path = %self.path.display(), error = %e, "failed to save history");
        }
    }

    /// Record a new result at the front of the list.
    pub fn append(&self, entry: Value) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load();
        entries.insert(0, entry);
        entries.truncate(MAX_HISTORY_ENTRIES);
        self.save(&entries);
        debug!(count = entries.len(), "history appended");
    }

    pub fn clear(&self) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.save(&[]);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("data").join("history.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn append_is_newest_first() {
        let (_dir, store) = store();
        store.append(json!({ "query": "first" }));
        store.append(json!({ "query": "second" }));

        let entries = store.load();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["query"], "second");
        assert_eq!(entries[1]["query"], "first");
    }

    #[test]
    fn never_exceeds_cap() {
        let (_dir, store) = store();
        for i in 0..40 {
            store.append(json!({ "n": i }));
            assert!(store.load().len() <= MAX_HISTORY_ENTRIES);
        }
        let entries = store.load();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0]["n"], 39);
        assert_eq!(entries[MAX_HISTORY_ENTRIES - 1]["n"], 25);
    }

    #[test]
    fn save_truncates_long_lists() {
        let (_dir, store) = store();
        let entries: Vec<Value> = (0..20).map(|i| json!(i)).collect();
        store.save(&entries);
        let loaded = store.load();
        assert_eq!(loaded.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(loaded[0], 0);
    }

    #[test]
    fn clear_empties() {
        let (_dir, store) = store();
        store.append(json!({ "a": 1 }));
        store.clear();
        assert!(store.load().is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap().trim(), "[]");
    }

    #[test]
    fn corrupt_file_is_empty_and_recovers() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{\"oops\":").unwrap();
        assert!(store.load().is_empty());

        store.append(json!({ "ok": true }));
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn non_array_is_empty() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"entries":[]}"#).unwrap();
        assert!(store.load().is_empty());
    }
}
