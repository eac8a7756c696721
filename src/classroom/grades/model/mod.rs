use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::classroom::grades::error::{GradeError, Result};

/// Header of the identifier column every gradebook starts with.
pub const USERNAME_COLUMN: &str = "USERNAME";

/// Student identifier as it was first seen in an export.
pub type Username = String;

/// A table read from a provider export. Cells are kept as text and an empty
/// cell stands for a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Creates a table from a header row and its data rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Returns the cell at `column` in `row`, treating ragged rows and
    /// whitespace-only cells as missing.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    /// Resolves `name` against the header row.
    pub fn column(&self, name: &str) -> Result<usize> {
        resolve_column(&self.headers, name)
    }
}

/// Returns the index of the first header equal to `target`, ignoring case,
/// surrounding whitespace and a leading byte-order mark.
pub fn resolve_column<S: AsRef<str>>(headers: &[S], target: &str) -> Result<usize> {
    let wanted = normalize_header(target);
    headers
        .iter()
        .position(|header| normalize_header(header.as_ref()) == wanted)
        .ok_or_else(|| GradeError::ColumnNotFound(target.to_string()))
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_uppercase()
}

/// Compares two identifiers the way the gradebook matches students.
pub fn same_student(lhs: &str, rhs: &str) -> bool {
    lhs.to_lowercase() == rhs.to_lowercase()
}

/// One row of a normalized assignment table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(rename = "Username")]
    pub username: Username,
    #[serde(rename = "Score")]
    pub score: f64,
}

impl ScoreEntry {
    pub fn new(username: impl Into<Username>, score: f64) -> Self {
        Self {
            username: username.into(),
            score,
        }
    }
}

/// Orders entries from the highest score to the lowest, keeping source order
/// between equal scores.
pub fn sort_by_score_desc(entries: &mut [ScoreEntry]) {
    entries.sort_by(|lhs, rhs| rhs.score.total_cmp(&lhs.score));
}

/// A student row of the gradebook. `scores` lines up with
/// [`Roster::assignments`].
#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub username: Username,
    pub scores: Vec<Option<f64>>,
}

impl RosterRow {
    /// Creates a row with every assignment ungraded.
    pub fn ungraded(username: impl Into<Username>, width: usize) -> Self {
        Self {
            username: username.into(),
            scores: vec![None; width],
        }
    }
}

/// The wide-format gradebook of one period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    assignments: Vec<String>,
    rows: Vec<RosterRow>,
}

impl Roster {
    /// Creates an empty roster with only the identifier column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a roster from already-parsed parts. Rows narrower than the
    /// assignment list are padded with missing scores.
    pub fn from_parts(assignments: Vec<String>, rows: Vec<RosterRow>) -> Self {
        let width = assignments.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.scores.resize(width, None);
                row
            })
            .collect();
        Self { assignments, rows }
    }

    /// Assignment columns in insertion order.
    pub fn assignments(&self) -> &[String] {
        &self.assignments
    }

    pub fn rows(&self) -> &[RosterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the column index of `assignment`, matched exactly.
    pub fn assignment_index(&self, assignment: &str) -> Option<usize> {
        self.assignments.iter().position(|name| name == assignment)
    }

    pub fn has_assignment(&self, assignment: &str) -> bool {
        self.assignment_index(assignment).is_some()
    }

    /// Looks up a student by identifier, ignoring case.
    pub fn row(&self, username: &str) -> Option<&RosterRow> {
        self.rows
            .iter()
            .find(|row| same_student(&row.username, username))
    }

    /// Returns the score a student holds for `assignment`.
    pub fn score(&self, username: &str, assignment: &str) -> Option<f64> {
        let column = self.assignment_index(assignment)?;
        self.row(username).and_then(|row| row.scores[column])
    }

    pub(crate) fn row_mut(&mut self, username: &str) -> Option<&mut RosterRow> {
        self.rows
            .iter_mut()
            .find(|row| same_student(&row.username, username))
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [RosterRow] {
        &mut self.rows
    }

    pub(crate) fn push_row(&mut self, row: RosterRow) {
        self.rows.push(row);
    }

    /// Appends an ungraded column and returns its index.
    pub(crate) fn push_assignment(&mut self, assignment: String) -> usize {
        self.assignments.push(assignment);
        for row in &mut self.rows {
            row.scores.push(None);
        }
        self.assignments.len() - 1
    }

    /// Sorts rows by identifier ascending, case-insensitively with the raw
    /// identifier breaking ties.
    pub fn sort_by_username(&mut self) {
        self.rows.sort_by(|lhs, rhs| compare_usernames(&lhs.username, &rhs.username));
    }
}

fn compare_usernames(lhs: &str, rhs: &str) -> Ordering {
    lhs.to_lowercase()
        .cmp(&rhs.to_lowercase())
        .then_with(|| lhs.cmp(rhs))
}
