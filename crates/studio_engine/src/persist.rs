use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("download folder {0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("could not save result: {0}")]
    Io(#[from] io::Error),
}

/// Saves downloaded results into one folder. Each file is staged next to
/// its final name and renamed into place, so a half-written video is never
/// visible under the result name.
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Writes `bytes` as `filename`, replacing an earlier save of the same result.
    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, SaveError> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(SaveError::NotADirectory(self.dir.clone()));
        }
        fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(filename);
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.as_file_mut().sync_all()?;
        staged.persist(&target).map_err(|err| SaveError::Io(err.error))?;
        Ok(target)
    }
}
