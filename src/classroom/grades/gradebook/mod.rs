//! In-memory gradebook mutations. Each operation leaves the roster sorted by
//! username; persisting the result is left to the caller.

use std::collections::HashSet;

use tracing::debug;

use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::model::{
    RawTable, Roster, RosterRow, ScoreEntry, USERNAME_COLUMN, same_student,
};

/// Summary of a merge, mostly useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub matched: usize,
    pub unmatched: usize,
}

impl Roster {
    /// Adds `assignment` as a new column and fills it from `entries`.
    ///
    /// Entries whose username is not already on the roster are dropped, so
    /// usernames must be seeded first with [`Roster::seed_usernames`]. The
    /// roster is left untouched when the column already exists.
    pub fn merge_assignment(
        &mut self,
        assignment: &str,
        entries: &[ScoreEntry],
    ) -> Result<MergeOutcome> {
        if self.has_assignment(assignment) || same_student(assignment, USERNAME_COLUMN) {
            return Err(GradeError::AssignmentAlreadyExists(assignment.to_string()));
        }

        let column = self.push_assignment(assignment.to_string());
        let mut outcome = MergeOutcome {
            matched: 0,
            unmatched: 0,
        };

        for entry in entries {
            match self.row_mut(&entry.username) {
                Some(row) => {
                    row.scores[column] = Some(entry.score);
                    outcome.matched += 1;
                }
                None => {
                    debug!(username = %entry.username, assignment, "dropping score for unknown student");
                    outcome.unmatched += 1;
                }
            }
        }

        self.sort_by_username();
        Ok(outcome)
    }

    /// Adds every distinct username found in `table`'s `username_column` that
    /// the roster does not hold yet. Returns the number of students added.
    pub fn seed_usernames(&mut self, table: &RawTable, username_column: &str) -> Result<usize> {
        let column = table.column(username_column)?;
        let width = self.assignments().len();
        let mut seen: HashSet<String> = self
            .rows()
            .iter()
            .map(|row| row.username.to_lowercase())
            .collect();

        let mut added = 0;
        for index in 0..table.rows.len() {
            let Some(username) = table.cell(index, column) else {
                continue;
            };
            if seen.insert(username.to_lowercase()) {
                self.push_row(RosterRow::ungraded(username, width));
                added += 1;
            }
        }

        self.sort_by_username();
        Ok(added)
    }

    /// Curves `assignment` so the top score becomes 100, shifting every graded
    /// score by the same amount. Returns the shift applied.
    pub fn bump_to_hundred(&mut self, assignment: &str) -> Result<f64> {
        let column = self
            .assignment_index(assignment)
            .ok_or_else(|| GradeError::AssignmentNotFound(assignment.to_string()))?;

        let max = self
            .rows()
            .iter()
            .filter_map(|row| row.scores[column])
            .reduce(f64::max)
            .ok_or_else(|| GradeError::NoGradedScores(assignment.to_string()))?;

        let delta = 100.0 - max;
        for row in self.rows_mut() {
            if let Some(score) = row.scores[column].as_mut() {
                *score += delta;
            }
        }

        self.sort_by_username();
        Ok(delta)
    }

    /// Replaces each student's lowest score with the ceiling of their average.
    ///
    /// Every entry tied for the minimum is replaced. Students with fewer than
    /// two graded assignments are left alone. Returns the number of students
    /// whose row changed.
    pub fn drop_lowest(&mut self) -> usize {
        let mut changed = 0;
        for row in self.rows_mut() {
            if drop_lowest_in_row(&mut row.scores) {
                changed += 1;
            }
        }
        self.sort_by_username();
        changed
    }
}

fn drop_lowest_in_row(scores: &mut [Option<f64>]) -> bool {
    let graded: Vec<f64> = scores.iter().flatten().copied().collect();
    if graded.len() < 2 {
        return false;
    }

    let average = graded.iter().sum::<f64>() / graded.len() as f64;
    let lowest = graded.iter().copied().fold(f64::INFINITY, f64::min);
    let replacement = average.ceil();

    let mut changed = false;
    for score in scores.iter_mut().flatten() {
        if *score == lowest {
            changed |= *score != replacement;
            *score = replacement;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(names: &[&str]) -> Roster {
        let table = RawTable::new(
            vec!["USERNAME".into()],
            names.iter().map(|name| vec![name.to_string()]).collect(),
        );
        let mut roster = Roster::new();
        roster.seed_usernames(&table, "USERNAME").unwrap();
        roster
    }

    fn with_scores(assignments: &[&str], rows: Vec<(&str, Vec<Option<f64>>)>) -> Roster {
        Roster::from_parts(
            assignments.iter().map(|name| name.to_string()).collect(),
            rows.into_iter()
                .map(|(name, scores)| RosterRow {
                    username: name.to_string(),
                    scores,
                })
                .collect(),
        )
    }

    fn column(roster: &Roster, assignment: &str) -> Vec<Option<f64>> {
        let index = roster.assignment_index(assignment).unwrap();
        roster.rows().iter().map(|row| row.scores[index]).collect()
    }

    #[test]
    fn merge_leaves_unscored_students_missing() {
        let mut roster = seeded(&["C", "A", "B"]);
        let entries = [ScoreEntry::new("A", 90.0), ScoreEntry::new("C", 75.0)];

        let outcome = roster.merge_assignment("Quiz1", &entries).unwrap();

        assert_eq!(outcome, MergeOutcome { matched: 2, unmatched: 0 });
        let names: Vec<&str> = roster.rows().iter().map(|row| row.username.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(column(&roster, "Quiz1"), [Some(90.0), None, Some(75.0)]);
    }

    #[test]
    fn merge_matches_usernames_case_insensitively() {
        let mut roster = seeded(&["Amy"]);
        roster
            .merge_assignment("HW1", &[ScoreEntry::new("AMY", 88.0)])
            .unwrap();
        assert_eq!(roster.score("amy", "HW1"), Some(88.0));
        assert_eq!(roster.rows()[0].username, "Amy");
    }

    #[test]
    fn merge_drops_unknown_students() {
        let mut roster = seeded(&["amy"]);
        let outcome = roster
            .merge_assignment("HW1", &[ScoreEntry::new("zed", 50.0)])
            .unwrap();
        assert_eq!(outcome.unmatched, 1);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.score("amy", "HW1"), None);
    }

    #[test]
    fn merge_rejects_duplicate_assignment() {
        let mut roster = seeded(&["amy", "bo"]);
        roster
            .merge_assignment("Quiz1", &[ScoreEntry::new("amy", 80.0)])
            .unwrap();
        let before = roster.clone();

        let error = roster
            .merge_assignment("Quiz1", &[ScoreEntry::new("bo", 60.0)])
            .unwrap_err();

        assert!(matches!(error, GradeError::AssignmentAlreadyExists(name) if name == "Quiz1"));
        assert_eq!(roster, before);
    }

    #[test]
    fn merge_rejects_username_as_assignment() {
        let mut roster = seeded(&["amy"]);
        assert!(matches!(
            roster.merge_assignment("username", &[]),
            Err(GradeError::AssignmentAlreadyExists(_))
        ));
    }

    #[test]
    fn seed_skips_known_and_blank_usernames() {
        let mut roster = seeded(&["amy"]);
        let table = RawTable::new(
            vec!["Name".into(), "Username".into()],
            vec![
                vec!["Amy A".into(), "AMY".into()],
                vec!["Bo B".into(), "bo".into()],
                vec!["Blank".into(), "".into()],
                vec!["Bo again".into(), "bo".into()],
            ],
        );

        let added = roster.seed_usernames(&table, "USERNAME").unwrap();

        assert_eq!(added, 1);
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn seed_pads_new_students_for_existing_columns() {
        let mut roster = with_scores(&["HW1"], vec![("amy", vec![Some(90.0)])]);
        let table = RawTable::new(vec!["username".into()], vec![vec!["bo".into()]]);
        roster.seed_usernames(&table, "USERNAME").unwrap();
        assert_eq!(column(&roster, "HW1"), [Some(90.0), None]);
    }

    #[test]
    fn seed_requires_username_column() {
        let mut roster = Roster::new();
        let table = RawTable::new(vec!["Name".into()], Vec::new());
        assert!(matches!(
            roster.seed_usernames(&table, "USERNAME"),
            Err(GradeError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn bump_leaves_column_with_perfect_score() {
        let mut roster = with_scores(
            &["Test"],
            vec![("a", vec![Some(70.0)]), ("b", vec![Some(85.0)]), ("c", vec![Some(100.0)])],
        );
        assert_eq!(roster.bump_to_hundred("Test").unwrap(), 0.0);
        assert_eq!(column(&roster, "Test"), [Some(70.0), Some(85.0), Some(100.0)]);
    }

    #[test]
    fn bump_shifts_graded_scores_only() {
        let mut roster = with_scores(
            &["Test"],
            vec![("a", vec![Some(60.0)]), ("b", vec![None]), ("c", vec![Some(80.0)])],
        );
        assert_eq!(roster.bump_to_hundred("Test").unwrap(), 20.0);
        assert_eq!(column(&roster, "Test"), [Some(80.0), None, Some(100.0)]);
    }

    #[test]
    fn bump_rejects_unknown_and_empty_columns() {
        let mut roster = with_scores(&["Test"], vec![("a", vec![None])]);
        assert!(matches!(
            roster.bump_to_hundred("Quiz"),
            Err(GradeError::AssignmentNotFound(_))
        ));
        assert!(matches!(
            roster.bump_to_hundred("Test"),
            Err(GradeError::NoGradedScores(_))
        ));
        assert_eq!(column(&roster, "Test"), [None]);
    }

    #[test]
    fn drop_lowest_backfills_with_rounded_up_average() {
        let mut roster = with_scores(
            &["HW1", "HW2", "HW3"],
            vec![("a", vec![Some(100.0), Some(50.0), Some(100.0)])],
        );
        assert_eq!(roster.drop_lowest(), 1);
        assert_eq!(roster.rows()[0].scores, [Some(100.0), Some(84.0), Some(100.0)]);
    }

    #[test]
    fn drop_lowest_replaces_every_tied_minimum() {
        let mut roster = with_scores(
            &["HW1", "HW2", "HW3"],
            vec![("a", vec![Some(60.0), Some(60.0), Some(90.0)])],
        );
        roster.drop_lowest();
        assert_eq!(roster.rows()[0].scores, [Some(70.0), Some(70.0), Some(90.0)]);
    }

    #[test]
    fn drop_lowest_ignores_missing_scores_and_sparse_rows() {
        let mut roster = with_scores(
            &["HW1", "HW2", "HW3"],
            vec![
                ("a", vec![Some(40.0), None, Some(80.0)]),
                ("b", vec![None, Some(55.5), None]),
                ("c", vec![None, None, None]),
            ],
        );
        assert_eq!(roster.drop_lowest(), 1);
        assert_eq!(roster.rows()[0].scores, [Some(60.0), None, Some(80.0)]);
        assert_eq!(roster.rows()[1].scores, [None, Some(55.5), None]);
        assert_eq!(roster.rows()[2].scores, [None, None, None]);
    }
}
