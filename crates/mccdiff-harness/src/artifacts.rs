use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Scratch directory for everything the toolchains leave behind.
///
/// Wiped and recreated on `prepare`, so a run never observes stale
/// executables or assembly files from a previous run.
#[derive(Debug)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    /// Delete whatever currently sits at `path` (regular file or directory)
    /// and recreate it as an empty directory. Safe on a nonexistent path.
    pub fn prepare(path: &Path) -> Result<Self> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(path)
                    .with_context(|| format!("clear artifact directory: {}", path.display()))?;
            }
            Ok(_) => {
                fs::remove_file(path)
                    .with_context(|| format!("remove stale artifact file: {}", path.display()))?;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("stat artifact directory: {}", path.display()));
            }
        }
        fs::create_dir_all(path)
            .with_context(|| format!("create artifact directory: {}", path.display()))?;
        Ok(ArtifactDir {
            root: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Move `file` into the artifact directory, keeping its file name.
    /// Rename first; copy-and-delete when the corpus and the artifact
    /// directory sit on different filesystems.
    pub fn stash(&self, file: &Path) -> Result<PathBuf> {
        let name = file
            .file_name()
            .with_context(|| format!("artifact has no file name: {}", file.display()))?;
        let dest = self.root.join(name);
        if fs::rename(file, &dest).is_err() {
            fs::copy(file, &dest).with_context(|| {
                format!("copy artifact {} -> {}", file.display(), dest.display())
            })?;
            fs::remove_file(file)
                .with_context(|| format!("remove artifact after copy: {}", file.display()))?;
        }
        Ok(dest)
    }

    /// `stash` for paths a failed phase may or may not have produced.
    pub fn stash_if_exists(&self, file: &Path) -> Result<Option<PathBuf>> {
        if file.exists() {
            Ok(Some(self.stash(file)?))
        } else {
            Ok(None)
        }
    }
}
