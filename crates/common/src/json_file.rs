use std::{fs, io::ErrorKind, path::Path};

use {
    anyhow::{Context, Result},
    serde::Serialize,
    tracing::debug,
};

/// Read and parse a JSON document.
///
/// Returns `Ok(None)` when the file does not exist. Read and parse failures
/// are errors so callers can decide how loudly to degrade.
pub fn read_value(path: &Path) -> Result<Option<serde_json::Value>> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    let value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

/// Serialize `value` as pretty JSON and write it, creating parent directories.
pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote json document");
    Ok(())
}

/// Like [`write_pretty`], but restricts the file to its owner (`0600` on
/// Unix). Used for documents that hold credentials.
pub fn write_private<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_pretty(path, value)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_value(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_pretty(&path, &serde_json::json!({ "a": 1 })).unwrap();
        let value = read_value(&path).unwrap().unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{not json").unwrap();
        assert!(read_value(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn private_write_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        write_private(&path, &serde_json::json!({ "apiKey": "sk" })).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(read_value(&path).unwrap().unwrap()["apiKey"], "sk");
    }
}
