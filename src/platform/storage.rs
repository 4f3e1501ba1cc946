use super::FileStore;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const NAME_FORMAT: &str = "%d%m%Y-%H%M%S";

/// Recordings directory on the local filesystem
pub struct RecordingsDir {
    root: PathBuf,
}

impl RecordingsDir {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileStore for RecordingsDir {
    fn unique_location(&self, now: DateTime<Local>) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;

        let stem = now.format(NAME_FORMAT).to_string();
        let mut location = self.root.join(format!("{}.wav", stem));
        let mut suffix = 1;
        while location.exists() {
            location = self.root.join(format!("{}-{}.wav", stem, suffix));
            suffix += 1;
        }
        Ok(location)
    }

    fn delete(&self, location: &Path) -> std::io::Result<()> {
        std::fs::remove_file(location)?;
        tracing::info!("Deleted recording {:?}", location);
        Ok(())
    }
}
