//! Atomic writes into the download directory.
//!
//! Content is staged in a temporary file inside the target directory and
//! renamed into place, so readers never observe a partially written file.
//! A staged file that is dropped without being persisted is deleted.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::ResolveError;

/// A temporary file in the directory it will be renamed into.
#[derive(Debug)]
pub struct StagedFile {
    dir: PathBuf,
    tmp: NamedTempFile,
}

impl StagedFile {
    /// Create an empty staged file in `dir`, creating `dir` if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if the directory or the file cannot be
    /// created.
    pub fn new(dir: &Path) -> Result<Self, ResolveError> {
        std::fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            tmp,
        })
    }

    /// Stage `bytes` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if the file cannot be created or written.
    pub fn with_contents(dir: &Path, bytes: &[u8]) -> Result<Self, ResolveError> {
        let mut staged = Self::new(dir)?;
        staged.file_mut().write_all(bytes)?;
        Ok(staged)
    }

    /// Current location of the staged content.
    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    /// Handle for writing the staged content.
    pub fn file_mut(&mut self) -> &mut File {
        self.tmp.as_file_mut()
    }

    /// Flush to disk and rename to `dir/filename`, replacing any file there.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Io`] if syncing or the rename fails; the
    /// staged file is removed in that case.
    pub fn persist(self, filename: &str) -> Result<PathBuf, ResolveError> {
        self.tmp.as_file().sync_all()?;

        let path = self.dir.join(filename);
        self.tmp
            .persist(&path)
            .map_err(|e| ResolveError::Io(e.error))?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
