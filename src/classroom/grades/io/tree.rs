use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::classroom::grades::error::{GradeError, Result};

/// Recursively copies `source` into `dest`. `dest` must not exist yet.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        return Err(GradeError::DestinationConflict(dest.to_path_buf()));
    }
    copy_dir_contents(source, dest)
}

/// Moves the directory `source` to `dest`, falling back to copy and delete
/// when the two live on different filesystems.
pub fn move_tree(source: &Path, dest: &Path) -> Result<()> {
    if source == dest {
        return Err(GradeError::SameLocation(dest.to_path_buf()));
    }
    if dest.exists() {
        return Err(GradeError::DestinationConflict(dest.to_path_buf()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), dest = %dest.display(), "rename crosses devices, copying");
            copy_dir_contents(source, dest)?;
            fs::remove_dir_all(source)?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn copy_dir_contents(source: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_contents(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
