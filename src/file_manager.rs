// src/file_manager.rs - Path file loading
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use crate::path::{parse_path_file, ParsedJob};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub modified: std::time::SystemTime,
}

#[derive(Debug, Clone)]
pub struct FileManager {
    directory: PathBuf,
}

impl FileManager {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    /// Resolve `name` against the managed directory unless it is absolute.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }

    pub async fn read_path_file(&self, name: &str) -> Result<String, FileError> {
        let path = self.resolve(name);
        tracing::info!("Reading path file: {}", path.display());
        fs::read_to_string(&path)
            .await
            .map_err(|source| FileError::Read { path, source })
    }

    /// Read and parse a path file.
    pub async fn load_job(&self, name: &str) -> Result<ParsedJob, FileError> {
        let content = self.read_path_file(name).await?;
        let job = parse_path_file(&content);
        tracing::info!(
            "Loaded {} strokes ({} points) from {}",
            job.strokes.len(),
            job.point_count(),
            name
        );
        if !job.skipped.is_empty() {
            tracing::warn!("{} malformed points were skipped", job.skipped.len());
        }
        Ok(job)
    }

    /// Path files (`*.csv`) in the managed directory, sorted by name.
    pub async fn list_path_files(&self) -> Result<Vec<FileInfo>, FileError> {
        let read_err = |source| FileError::Read { path: self.directory.clone(), source };
        let mut entries = fs::read_dir(&self.directory).await.map_err(read_err)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(name_str) = path.file_name().and_then(|n| n.to_str()) {
                let metadata = entry.metadata().await.map_err(read_err)?;
                if metadata.is_dir() {
                    continue;
                }
                files.push(FileInfo {
                    name: name_str.to_string(),
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                });
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new(".")
    }
}
