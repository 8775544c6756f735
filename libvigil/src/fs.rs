// libvigil/src/fs.rs

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// The slice of file metadata this crate cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub is_dir: bool,
    pub size: u64,
    pub mtime: SystemTime,
}

/// Stats `path`. Returns a plain [`io::Result`] so callers can tell the
/// benign vanished-before-we-looked case apart from real failures.
pub fn stat(path: &Path) -> io::Result<FileInfo> {
    let meta = std::fs::metadata(path)?;
    Ok(FileInfo {
        is_dir: meta.is_dir(),
        size: meta.len(),
        mtime: meta.modified()?,
    })
}

/// Child names of `path`, sorted for deterministic processing. Entries
/// that disappear mid-listing are skipped.
pub fn list_dir(path: &Path) -> io::Result<Vec<OsString>> {
    let mut names: Vec<OsString> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.file_name()))
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn stat_distinguishes_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, b"hello").unwrap();

        let dir_info = stat(dir.path()).unwrap();
        assert!(dir_info.is_dir);

        let file_info = stat(&file).unwrap();
        assert!(!file_info.is_dir);
        assert_eq!(file_info.size, 5);
    }

    #[test]
    fn stat_missing_path_is_not_found() {
        let err = stat(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn list_dir_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b"), b"").unwrap();
        fs::write(dir.path().join("a"), b"").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();

        let names = list_dir(dir.path()).unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
