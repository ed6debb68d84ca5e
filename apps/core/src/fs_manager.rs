use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::storage::Bucket;

/// Lays out the on-disk data directory:
///
/// ```text
/// <data>/db/healthdesk.sqlite
/// <data>/storage/<bucket>/...
/// <data>/exports/...
/// ```
#[derive(Debug, Clone)]
pub struct PortablePathManager {
    data_dir: PathBuf,
}

impl PortablePathManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Default data directory: `./data` next to the executable.
    pub fn default_data_dir() -> PathBuf {
        match std::env::current_exe() {
            Ok(mut path) => {
                path.pop();
                path.join("data")
            }
            Err(e) => {
                error!(
                    "Failed to get current exe path: {}. Falling back to ./data.",
                    e
                );
                PathBuf::from("data")
            }
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_dir(&self) -> PathBuf {
        self.data_dir.join("db")
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir().join("healthdesk.sqlite")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("storage")
    }

    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.storage_dir().join(bucket.as_str())
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    /// Creates the directory tree if missing.
    pub fn init(&self) -> Result<(), std::io::Error> {
        let mut dirs = vec![self.db_dir(), self.exports_dir()];
        dirs.extend(Bucket::ALL.iter().map(|b| self.bucket_dir(*b)));

        for dir in dirs {
            if !dir.exists() {
                info!("Creating directory: {:?}", dir);
                fs::create_dir_all(&dir)?;
            }
        }

        Ok(())
    }
}
