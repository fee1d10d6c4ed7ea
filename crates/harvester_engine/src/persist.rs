use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0:?} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("{0:?} is read-only")]
    ReadOnly(PathBuf),
    #[error("cannot create {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Makes sure a run can write images into `dir`, creating it if needed.
///
/// Checked once per run; individual writes only report their own failure.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => Err(PersistError::NotADirectory(dir.to_path_buf())),
        Ok(meta) if meta.permissions().readonly() => {
            Err(PersistError::ReadOnly(dir.to_path_buf()))
        }
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|source| PersistError::Create {
                path: dir.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(PersistError::Create {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Writes `{dir}/{filename}` through a temp file and a rename, so a reader
/// never observes a half-written image.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, image: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(image)?;
        staged.as_file_mut().sync_all()?;

        // Re-running into the same directory replaces `<tag>_<n>.jpg` from last time.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        staged.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
