use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::classroom::grades::config::ExportProfile;
use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::gradebook::MergeOutcome;
use crate::classroom::grades::io::{self, csv_table, excel_write, tree};
use crate::classroom::grades::model::{Roster, USERNAME_COLUMN, same_student, sort_by_score_desc};
use crate::classroom::grades::normalize::extract_scores;

/// File holding the period's wide-format gradebook.
pub const GRADEBOOK_FILE: &str = "gradebook.csv";
/// Folder of verbatim export copies.
pub const ORIGINAL_DATA_DIR: &str = "original_data";
/// Folder of normalized `Username,Score` tables, one per assignment.
pub const GRADED_DIR: &str = "Graded Assignments";

/// The folder of one class period: its gradebook, the raw exports it was
/// built from, and the normalized assignment tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterStore {
    name: String,
    path: PathBuf,
}

impl RosterStore {
    /// Creates the period folder layout with an empty gradebook. An existing
    /// gradebook is kept as is.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn create(path: &Path) -> Result<Self> {
        let store = Self::at(path);
        fs::create_dir_all(store.original_data_dir())?;
        fs::create_dir_all(store.graded_dir())?;
        if !store.gradebook_path().exists() {
            csv_table::write_roster(&store.gradebook_path(), &Roster::new())?;
            info!("created empty gradebook");
        }
        Ok(store)
    }

    /// Opens an existing period folder.
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self::at(path);
        if !store.gradebook_path().is_file() {
            return Err(GradeError::MissingInput(store.gradebook_path()));
        }
        Ok(store)
    }

    fn at(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path: path.to_path_buf(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn gradebook_path(&self) -> PathBuf {
        self.path.join(GRADEBOOK_FILE)
    }

    pub fn original_data_dir(&self) -> PathBuf {
        self.path.join(ORIGINAL_DATA_DIR)
    }

    pub fn graded_dir(&self) -> PathBuf {
        self.path.join(GRADED_DIR)
    }

    /// Path of the normalized table for `assignment`.
    pub fn graded_path(&self, assignment: &str) -> PathBuf {
        self.graded_dir().join(format!("{assignment}.csv"))
    }

    pub fn roster(&self) -> Result<Roster> {
        csv_table::read_roster(&self.gradebook_path())
    }

    pub fn assignments(&self) -> Result<Vec<String>> {
        Ok(self.roster()?.assignments().to_vec())
    }

    fn save(&self, roster: &Roster) -> Result<()> {
        csv_table::write_roster(&self.gradebook_path(), roster)
    }

    /// Ingests a raw export: keeps a verbatim copy under `original_data/` and
    /// writes the normalized table for the assignment, sorted by score from
    /// highest to lowest. The assignment is named after the export's file stem
    /// unless `assignment` is given. Returns the assignment name.
    ///
    /// The gradebook is not touched; see [`RosterStore::merge_pending`].
    #[instrument(
        level = "info",
        skip_all,
        fields(period = %self.name, export = %export.display())
    )]
    pub fn ingest_export(
        &self,
        export: &Path,
        profile: &ExportProfile,
        assignment: Option<&str>,
    ) -> Result<String> {
        let assignment = match assignment {
            Some(name) => name.to_string(),
            None => file_stem(export)?,
        };
        check_assignment_name(&assignment)?;

        if self.graded_path(&assignment).exists() || self.roster()?.has_assignment(&assignment) {
            return Err(GradeError::AssignmentAlreadyExists(assignment));
        }

        let table = io::read_export(export)?;
        self.archive_original(export)?;

        let mut entries = extract_scores(&table, export, profile)?;
        sort_by_score_desc(&mut entries);
        csv_table::write_score_entries(&self.graded_path(&assignment), &entries)?;

        info!(
            assignment = %assignment,
            scored = entries.len(),
            skipped = table.rows.len() - entries.len(),
            "normalized export"
        );
        Ok(assignment)
    }

    fn archive_original(&self, export: &Path) -> Result<()> {
        let stem = file_stem(export)?;
        let ext = io::extension(export).unwrap_or_else(|| "csv".to_string());
        let copy = self.original_data_dir().join(format!("original_{stem}.{ext}"));
        fs::create_dir_all(self.original_data_dir())?;
        fs::copy(export, &copy)?;
        debug!(copy = %copy.display(), "archived original export");
        Ok(())
    }

    /// Adds every username in `table_path`'s identifier column to the
    /// gradebook. Returns how many students were new.
    #[instrument(
        level = "info",
        skip_all,
        fields(period = %self.name, source = %table_path.display())
    )]
    pub fn seed_usernames(&self, table_path: &Path, username_column: &str) -> Result<usize> {
        let table = io::read_export(table_path)?;
        let mut roster = self.roster()?;
        let added = roster.seed_usernames(&table, username_column)?;
        self.save(&roster)?;
        info!(added, total = roster.len(), "seeded usernames");
        Ok(added)
    }

    /// Merges the normalized table of `assignment` into the gradebook.
    #[instrument(level = "info", skip(self), fields(period = %self.name))]
    pub fn merge_assignment(&self, assignment: &str) -> Result<MergeOutcome> {
        check_assignment_name(assignment)?;
        let mut roster = self.roster()?;
        if roster.has_assignment(assignment) {
            return Err(GradeError::AssignmentAlreadyExists(assignment.to_string()));
        }
        let path = self.graded_path(assignment);
        if !path.is_file() {
            return Err(GradeError::MissingInput(path));
        }
        let entries = csv_table::read_score_entries(&path)?;
        let outcome = roster.merge_assignment(assignment, &entries)?;
        self.save(&roster)?;
        if outcome.unmatched > 0 {
            warn!(
                unmatched = outcome.unmatched,
                "scores for students missing from the gradebook were dropped"
            );
        }
        info!(matched = outcome.matched, "merged assignment");
        Ok(outcome)
    }

    /// Merges every normalized table that is not yet a gradebook column, in
    /// filename order. Returns the names merged; an empty list means there
    /// was nothing to do.
    #[instrument(level = "info", skip(self), fields(period = %self.name))]
    pub fn merge_pending(&self) -> Result<Vec<String>> {
        let mut roster = self.roster()?;
        let mut merged = Vec::new();

        for (assignment, path) in self.graded_tables()? {
            if roster.has_assignment(&assignment) {
                continue;
            }
            if same_student(&assignment, USERNAME_COLUMN) {
                warn!(path = %path.display(), "skipping table named after the username column");
                continue;
            }
            let entries = csv_table::read_score_entries(&path)?;
            let outcome = roster.merge_assignment(&assignment, &entries)?;
            debug!(assignment = %assignment, matched = outcome.matched, unmatched = outcome.unmatched, "merged");
            merged.push(assignment);
        }

        if !merged.is_empty() {
            self.save(&roster)?;
        }
        info!(merged = merged.len(), "merged pending assignments");
        Ok(merged)
    }

    /// Assignment names of the normalized tables, sorted.
    pub fn graded_assignments(&self) -> Result<Vec<String>> {
        Ok(self
            .graded_tables()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Normalized tables keyed by assignment name, sorted by name. Entries
    /// that cannot be inspected are skipped.
    fn graded_tables(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut tables: Vec<(String, PathBuf)> = fs::read_dir(self.graded_dir())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && io::extension(path).as_deref() == Some("csv"))
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some((name, path))
            })
            .collect();
        tables.sort();
        Ok(tables)
    }

    /// Curves `assignment` so its top score is 100. Returns the shift.
    #[instrument(level = "info", skip(self), fields(period = %self.name))]
    pub fn bump_to_hundred(&self, assignment: &str) -> Result<f64> {
        let mut roster = self.roster()?;
        let delta = roster.bump_to_hundred(assignment)?;
        self.save(&roster)?;
        info!(delta, "curved assignment");
        Ok(delta)
    }

    /// Replaces every student's lowest score with their rounded-up average.
    #[instrument(level = "info", skip(self), fields(period = %self.name))]
    pub fn drop_lowest(&self) -> Result<usize> {
        let mut roster = self.roster()?;
        let changed = roster.drop_lowest();
        self.save(&roster)?;
        info!(changed, "dropped lowest scores");
        Ok(changed)
    }

    /// Copies the whole period folder to `dest` and opens the copy.
    #[instrument(level = "info", skip_all, fields(period = %self.name, dest = %dest.display()))]
    pub fn copy_tree(&self, dest: &Path) -> Result<RosterStore> {
        tree::copy_tree(&self.path, dest)?;
        RosterStore::open(dest)
    }

    /// Writes the gradebook to an Excel workbook.
    #[instrument(level = "info", skip_all, fields(period = %self.name, output = %output.display()))]
    pub fn export_workbook(&self, output: &Path) -> Result<()> {
        let roster = self.roster()?;
        excel_write::write_roster(output, &roster)?;
        info!(students = roster.len(), "exported gradebook");
        Ok(())
    }
}

/// Rejects names that would collide with the username column or escape the
/// graded folder once used as a file name.
fn check_assignment_name(assignment: &str) -> Result<()> {
    if same_student(assignment, USERNAME_COLUMN) {
        return Err(GradeError::AssignmentAlreadyExists(assignment.to_string()));
    }
    let trimmed = assignment.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || assignment.contains(['/', '\\'])
    {
        return Err(GradeError::InvalidAssignmentName(assignment.to_string()));
    }
    Ok(())
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| GradeError::MissingInput(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_lays_out_period_folder() {
        let dir = tempdir().expect("temporary directory");
        let store = RosterStore::create(&dir.path().join("P1")).expect("store created");

        assert_eq!(store.name(), "P1");
        assert!(store.original_data_dir().is_dir());
        assert!(store.graded_dir().is_dir());
        assert_eq!(
            fs::read_to_string(store.gradebook_path()).expect("gradebook read"),
            "USERNAME\n"
        );
    }

    #[test]
    fn open_requires_gradebook() {
        let dir = tempdir().expect("temporary directory");
        assert!(matches!(
            RosterStore::open(dir.path()),
            Err(GradeError::MissingInput(_))
        ));
    }

    #[test]
    fn graded_assignments_ignores_other_files() {
        let dir = tempdir().expect("temporary directory");
        let store = RosterStore::create(&dir.path().join("P1")).expect("store created");
        fs::write(store.graded_dir().join("b.csv"), "Username,Score\n").expect("b");
        fs::write(store.graded_dir().join("a.CSV"), "Username,Score\n").expect("a");
        fs::write(store.graded_dir().join("notes.txt"), "").expect("notes");
        fs::create_dir(store.graded_dir().join("old.csv")).expect("dir");

        assert_eq!(store.graded_assignments().expect("listed"), ["a", "b"]);
    }
}
