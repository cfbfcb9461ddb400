use std::{
    fs,
    path::Path,
    time::SystemTime,
};

use tracing::{debug, warn};

/// File extensions recognised as chart images (compared case-insensitively).
pub const CHART_EXTENSIONS: &[&str] = &["png", "jpg"];

/// A chart image discovered in the charts directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    pub file_name: String,
    pub created: SystemTime,
}

/// Whether `path` names a chart image by extension.
pub fn is_chart(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            CHART_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Scan `dir` and return the most recently created chart image.
///
/// Re-scans on every call. A missing or unreadable directory yields `None`.
/// Creation time falls back to modification time where the filesystem does
/// not record birth time; equal timestamps resolve to the greater file name.
pub fn find_latest(dir: &Path) -> Option<ChartFile> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read charts directory");
            return None;
        },
    };

    let mut latest: Option<ChartFile> = None;
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !is_chart(&path) {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable chart");
                continue;
            },
        };
        let Ok(created) = meta.created().or_else(|_| meta.modified()) else {
            continue;
        };
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };

        let newer = latest
            .as_ref()
            .is_none_or(|best| (created, &file_name) > (best.created, &best.file_name));
        if newer {
            latest = Some(ChartFile { file_name, created });
        }
    }

    if latest.is_none() {
        debug!(dir = %dir.display(), "no chart images found");
    }
    latest
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, std::time::Duration};

    fn write_after_pause(dir: &Path, name: &str) {
        std::thread::sleep(Duration::from_millis(30));
        fs::write(dir.join(name), b"img").unwrap();
    }

    #[rstest]
    #[case("chart_20240101.png", true)]
    #[case("CHART.JPG", true)]
    #[case("photo.Jpg", true)]
    #[case("chart.jpeg", false)]
    #[case("chart.gif", false)]
    #[case("png", false)]
    #[case("notes.txt", false)]
    fn recognises_chart_extensions(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_chart(Path::new(name)), expected);
    }

    #[test]
    fn returns_most_recent_image() {
        let dir = tempfile::tempdir().unwrap();
        write_after_pause(dir.path(), "zzz_old.png");
        write_after_pause(dir.path(), "middle.jpg");
        write_after_pause(dir.path(), "aaa_new.png");
        write_after_pause(dir.path(), "later.txt");

        let latest = find_latest(dir.path()).unwrap();
        assert_eq!(latest.file_name, "aaa_new.png");
    }

    #[test]
    fn no_images_is_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "x").unwrap();
        fs::create_dir(dir.path().join("folder.png")).unwrap();
        assert!(find_latest(dir.path()).is_none());
    }

    #[test]
    fn missing_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_latest(&dir.path().join("nope")).is_none());
    }

    #[test]
    fn rescans_on_each_call() {
        let dir = tempfile::tempdir().unwrap();
        write_after_pause(dir.path(), "first.png");
        assert_eq!(find_latest(dir.path()).unwrap().file_name, "first.png");
        write_after_pause(dir.path(), "second.png");
        assert_eq!(find_latest(dir.path()).unwrap().file_name, "second.png");
    }
}
