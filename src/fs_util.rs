use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::ProvisionError;

/// True when `dir` is an existing directory with at least one entry.
pub fn has_entries(dir: &Path) -> Result<bool, ProvisionError> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(dir)
        .map_err(|err| ProvisionError::Filesystem(format!("read {}: {err}", dir.display())))?;
    Ok(entries.next().is_some())
}

pub fn count_entries(dir: &Path) -> Result<usize, ProvisionError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let entries = fs::read_dir(dir)
        .map_err(|err| ProvisionError::Filesystem(format!("read {}: {err}", dir.display())))?;
    Ok(entries.count())
}

pub fn remove_if_exists(path: &Path) -> Result<(), ProvisionError> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ProvisionError::Filesystem(format!(
            "remove {}: {err}",
            path.display()
        ))),
    }
}

/// Paths that extraction created and that did not exist beforehand.
#[derive(Debug, Default)]
pub struct ExtractJournal {
    created: Vec<PathBuf>,
}

impl ExtractJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    fn record(&mut self, path: &Path, target_dir: &Path) {
        let mut topmost_missing = None;
        for ancestor in path.ancestors() {
            if ancestor == target_dir || ancestor.exists() {
                break;
            }
            topmost_missing = Some(ancestor);
        }
        if let Some(missing) = topmost_missing {
            self.created.push(missing.to_path_buf());
        }
    }

    /// Removes everything recorded, newest first. Failures are logged and skipped.
    pub fn rollback(self) {
        for path in self.created.into_iter().rev() {
            if let Err(err) = remove_if_exists(&path) {
                warn!("failed to remove partially extracted {}: {err}", path.display());
            }
        }
    }
}

/// Extracts every entry of `zip_path` below `target_dir`, returning the number
/// of entries written.
pub fn extract_zip(
    zip_path: &Path,
    target_dir: &Path,
    journal: &mut ExtractJournal,
) -> Result<usize, ProvisionError> {
    let file = fs::File::open(zip_path).map_err(|err| {
        ProvisionError::Filesystem(format!("open zip {}: {err}", zip_path.display()))
    })?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ProvisionError::ArchiveFormat(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| ProvisionError::ArchiveFormat(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                return Err(ProvisionError::ArchiveFormat(format!(
                    "entry {} escapes the extraction directory",
                    entry.name()
                )));
            }
        };
        debug!("extracting {}", entry_path.display());

        if entry.is_dir() {
            journal.record(&entry_path, target_dir);
            fs::create_dir_all(&entry_path)
                .map_err(|err| ProvisionError::Filesystem(err.to_string()))?;
            continue;
        }

        journal.record(&entry_path, target_dir);
        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| ProvisionError::Filesystem(err.to_string()))?;
        }
        let mut outfile = fs::File::create(&entry_path)
            .map_err(|err| ProvisionError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile).map_err(copy_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&entry_path, fs::Permissions::from_mode(mode))
                    .map_err(|err| ProvisionError::Filesystem(err.to_string()))?;
            }
        }
    }
    Ok(archive.len())
}

fn copy_error(err: io::Error) -> ProvisionError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            ProvisionError::ArchiveFormat(err.to_string())
        }
        _ => ProvisionError::Filesystem(err.to_string()),
    }
}
