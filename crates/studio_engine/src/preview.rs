use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use studio_logging::{studio_debug, studio_warn};
use tempfile::{Builder, TempPath};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("preview {0} already exists")]
    Duplicate(u64),
    #[error("preview {0} was revoked before its copy finished")]
    Revoked(u64),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewStats {
    pub created: usize,
    pub revoked: usize,
}

/// A claimed preview id whose copy has not been made yet. The copy runs
/// without access to the store; hand the outcome to [`PreviewStore::finish`].
#[derive(Debug)]
pub struct PreviewCopy {
    preview_id: u64,
    dir: Option<PathBuf>,
}

impl PreviewCopy {
    pub fn preview_id(&self) -> u64 {
        self.preview_id
    }

    pub fn copy_from(&self, source: &Path) -> Result<TempPath, PreviewError> {
        let mut input = File::open(source)?;
        let suffix = source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut builder = Builder::new();
        builder.prefix("studio-preview-").suffix(&suffix);
        let mut tmp = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        io::copy(&mut input, tmp.as_file_mut())?;
        Ok(tmp.into_temp_path())
    }
}

/// Private temporary copies of selected videos, playable while the original
/// is still being uploaded. A copy is deleted when its id is revoked or when
/// the store is dropped. Revoking an id whose copy is still running deletes
/// the copy as soon as it finishes.
pub struct PreviewStore {
    dir: Option<PathBuf>,
    previews: HashMap<u64, TempPath>,
    copying: HashSet<u64>,
    cancelled: HashSet<u64>,
    created: usize,
    revoked: usize,
}

impl PreviewStore {
    /// Stores previews in `dir`, or in the system temp directory when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            previews: HashMap::new(),
            copying: HashSet::new(),
            cancelled: HashSet::new(),
            created: 0,
            revoked: 0,
        }
    }

    pub fn reserve(&mut self, preview_id: u64) -> Result<PreviewCopy, PreviewError> {
        if self.previews.contains_key(&preview_id) || !self.copying.insert(preview_id) {
            return Err(PreviewError::Duplicate(preview_id));
        }
        Ok(PreviewCopy {
            preview_id,
            dir: self.dir.clone(),
        })
    }

    /// Takes the outcome of a reserved copy. Returns where the preview lives.
    pub fn finish(
        &mut self,
        preview_id: u64,
        copied: Result<TempPath, PreviewError>,
    ) -> Result<PathBuf, PreviewError> {
        self.copying.remove(&preview_id);
        let cancelled = self.cancelled.remove(&preview_id);
        let path = copied?;

        self.created += 1;
        if cancelled {
            self.revoked += 1;
            if let Err(err) = path.close() {
                studio_warn!("Failed to delete preview {}: {}", preview_id, err);
            }
            studio_debug!("Preview {} revoked while copying", preview_id);
            return Err(PreviewError::Revoked(preview_id));
        }

        let location = path.to_path_buf();
        self.previews.insert(preview_id, path);
        studio_debug!("Preview {} created at {:?}", preview_id, location);
        Ok(location)
    }

    /// Deletes the preview. Unknown or already revoked ids are a no-op.
    pub fn revoke(&mut self, preview_id: u64) -> bool {
        if let Some(path) = self.previews.remove(&preview_id) {
            self.revoked += 1;
            if let Err(err) = path.close() {
                studio_warn!("Failed to delete preview {}: {}", preview_id, err);
            }
            studio_debug!("Preview {} revoked", preview_id);
            return true;
        }
        if self.copying.contains(&preview_id) && self.cancelled.insert(preview_id) {
            studio_debug!("Preview {} will be deleted once its copy finishes", preview_id);
            return true;
        }
        studio_debug!("Preview {} not held; nothing to revoke", preview_id);
        false
    }

    pub fn revoke_all(&mut self) -> usize {
        let ids: Vec<u64> = self
            .previews
            .keys()
            .chain(self.copying.iter())
            .copied()
            .collect();
        ids.into_iter().filter(|id| self.revoke(*id)).count()
    }

    pub fn stats(&self) -> PreviewStats {
        PreviewStats {
            created: self.created,
            revoked: self.revoked,
        }
    }
}

impl Drop for PreviewStore {
    fn drop(&mut self) {
        self.revoke_all();
    }
}
