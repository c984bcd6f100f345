use std::path::{Path, PathBuf};

/// A local file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub path: PathBuf,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        FileHandle {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build a handle named after the last component of the path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        FileHandle::new(name, path)
    }

    /// Extension of the file name, without the dot
    pub fn extension(&self) -> Option<&str> {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Name under which the file is stored: `<id>.<ext>`, or just `<id>` without extension
    pub fn stored_name(&self, id: &str) -> String {
        match self.extension() {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        }
    }
}
