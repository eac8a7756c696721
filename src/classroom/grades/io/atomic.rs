use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::classroom::grades::error::Result;

/// Writes `path` by filling a temporary sibling file and renaming it over the
/// target, so readers never observe a half-written file.
pub fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replaces_existing_file() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("gradebook.csv");
        fs::write(&path, "old").expect("seed file");

        write_atomically(&path, |out| Ok(out.write_all(b"new")?)).expect("atomic write");

        assert_eq!(fs::read_to_string(&path).expect("read back"), "new");
        assert_eq!(fs::read_dir(dir.path()).expect("list dir").count(), 1);
    }

    #[test]
    fn failed_fill_keeps_original() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("gradebook.csv");
        fs::write(&path, "old").expect("seed file");

        let result = write_atomically(&path, |_| {
            Err(crate::classroom::grades::error::GradeError::Logging("boom".into()))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).expect("read back"), "old");
    }
}
