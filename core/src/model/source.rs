use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identity of a loaded source: where it lives and which version of it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceId {
    /// Stats the file. The path is canonicalized when possible so that
    /// `./data.csv` and `data.csv` share a cache entry.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path,
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}
