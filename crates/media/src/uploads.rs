use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {
    anyhow::{Context, Result},
    tracing::{debug, warn},
};

/// Per-request storage for uploaded input files.
///
/// Every stored file gets a unique name, so concurrent uploads never collide.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an uploaded payload under a unique name derived from `original_name`.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<UploadedFile> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.unique_path(original_name);
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok(UploadedFile::new(path, original_name))
    }

    /// Copy an existing file into upload storage. The source is left untouched.
    pub fn import(&self, source: &Path) -> Result<UploadedFile> {
        let original_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.unique_path(original_name);
        fs::copy(source, &path)
            .with_context(|| format!("failed to copy {}", source.display()))?;
        Ok(UploadedFile::new(path, original_name))
    }

    fn unique_path(&self, original_name: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_file_name(original_name)
        ))
    }
}

/// Reduce a client-supplied name to a safe single path component, keeping the
/// extension the generator uses to pick a reader.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// An uploaded file owned by one request. The file is deleted when this
/// handle is dropped, whichever way the request ends.
#[derive(Debug)]
pub struct UploadedFile {
    path: PathBuf,
    original_name: String,
    removed: bool,
}

impl UploadedFile {
    fn new(path: PathBuf, original_name: &str) -> Self {
        Self {
            path,
            original_name: original_name.to_string(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Delete the file now.
    pub fn remove(mut self) {
        self.remove_inner();
    }

    fn remove_inner(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {},
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove upload"),
        }
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        self.remove_inner();
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("sales.csv", "sales.csv")]
    #[case("../../etc/passwd", "passwd")]
    #[case("C:\\data\\q1 report.xlsx", "q1_report.xlsx")]
    #[case("销售.csv", "__.csv")]
    #[case(".hidden", "hidden")]
    #[case("", "upload")]
    fn sanitizes_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_file_name(input), expected);
    }

    #[test]
    fn stored_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));
        let a = store.store("data.csv", b"a,b\n1,2\n").unwrap();
        let b = store.store("data.csv", b"a,b\n3,4\n").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with("-data.csv"));
        assert_eq!(fs::read(a.path()).unwrap(), b"a,b\n1,2\n");
        assert_eq!(a.original_name(), "data.csv");
    }

    #[test]
    fn dropping_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());
        let file = store.store("x.csv", b"1").unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());
        let file = store.store("x.csv", b"1").unwrap();
        fs::remove_file(file.path()).unwrap();
        file.remove();
    }

    #[test]
    fn import_copies_without_touching_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("input.json");
        fs::write(&source, "[]").unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let file = store.import(&source).unwrap();
        assert_eq!(file.original_name(), "input.json");
        let copied = file.path().to_path_buf();
        file.remove();
        assert!(!copied.exists());
        assert!(source.exists());
    }
}
