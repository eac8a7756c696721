use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::classroom::grades::config::ExportProfile;
use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::io::tree;
use crate::classroom::grades::store::{GRADEBOOK_FILE, RosterStore};

/// A school year: a folder whose subfolders are class periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingYear {
    name: String,
    path: PathBuf,
}

/// Per-period result of a broadcast ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastReport {
    pub period: String,
    pub assignment: String,
    pub merged: Vec<String>,
}

impl GradingYear {
    /// Creates `<root>/<name>`, reusing the folder if it already exists.
    #[instrument(level = "info", skip_all, fields(root = %root.display(), name = %name))]
    pub fn create(root: &Path, name: &str) -> Result<Self> {
        let path = root.join(name);
        fs::create_dir_all(&path)?;
        info!("grading year ready");
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Opens an existing grading year folder.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(GradeError::MissingInput(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            path: path.to_path_buf(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Periods of this year, sorted by name. Subfolders without a gradebook
    /// are ignored.
    pub fn periods(&self) -> Result<Vec<RosterStore>> {
        let mut periods = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            if path.join(GRADEBOOK_FILE).is_file() {
                periods.push(RosterStore::open(&path)?);
            }
        }
        periods.sort_by(|lhs, rhs| lhs.name().cmp(rhs.name()));
        Ok(periods)
    }

    /// Looks up a period by name.
    pub fn period(&self, name: &str) -> Result<Option<RosterStore>> {
        Ok(self
            .periods()?
            .into_iter()
            .find(|period| period.name() == name))
    }

    /// Creates a new period inside this year.
    pub fn create_period(&self, name: &str) -> Result<RosterStore> {
        let path = self.path.join(name);
        if path.exists() {
            return Err(GradeError::DestinationConflict(path));
        }
        RosterStore::create(&path)
    }

    /// Moves a period folder created elsewhere into this year.
    #[instrument(level = "info", skip_all, fields(year = %self.name, period = %period.name()))]
    pub fn adopt_period(&self, period: &RosterStore) -> Result<RosterStore> {
        let dest = self.path.join(period.name());
        tree::move_tree(period.path(), &dest)?;
        info!(dest = %dest.display(), "moved period into year");
        RosterStore::open(&dest)
    }

    /// Ingests one export into every period and merges whatever each period
    /// has pending. Stops at the first failing period.
    #[instrument(level = "info", skip_all, fields(year = %self.name, export = %export.display()))]
    pub fn broadcast_ingest(
        &self,
        export: &Path,
        profile: &ExportProfile,
    ) -> Result<Vec<BroadcastReport>> {
        let mut reports = Vec::new();
        for period in self.periods()? {
            let assignment = period.ingest_export(export, profile, None)?;
            let merged = period.merge_pending()?;
            reports.push(BroadcastReport {
                period: period.name().to_string(),
                assignment,
                merged,
            });
        }
        info!(periods = reports.len(), "broadcast complete");
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn periods_are_listed_by_name() {
        let dir = tempdir().expect("temporary directory");
        let year = GradingYear::create(dir.path(), "2024").expect("year created");
        year.create_period("P3").expect("P3");
        year.create_period("P1").expect("P1");
        fs::create_dir(year.path().join("scratch")).expect("scratch dir");

        let names: Vec<String> = year
            .periods()
            .expect("periods listed")
            .iter()
            .map(|period| period.name().to_string())
            .collect();

        assert_eq!(names, ["P1", "P3"]);
        assert!(year.period("P3").expect("lookup").is_some());
        assert!(year.period("scratch").expect("lookup").is_none());
    }

    #[test]
    fn create_period_refuses_existing_folder() {
        let dir = tempdir().expect("temporary directory");
        let year = GradingYear::create(dir.path(), "2024").expect("year created");
        year.create_period("P1").expect("P1");
        assert!(matches!(
            year.create_period("P1"),
            Err(GradeError::DestinationConflict(_))
        ));
    }

    #[test]
    fn open_requires_existing_folder() {
        let dir = tempdir().expect("temporary directory");
        assert!(matches!(
            GradingYear::open(&dir.path().join("missing")),
            Err(GradeError::MissingInput(_))
        ));
    }
}
