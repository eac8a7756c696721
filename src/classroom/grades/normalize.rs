use std::path::Path;

use crate::classroom::grades::config::ExportProfile;
use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::io::csv_table::parse_score;
use crate::classroom::grades::model::{RawTable, ScoreEntry};

/// Extracts `(username, score)` pairs from a raw export. Rows missing either
/// value are skipped and the rest keep their source order.
pub fn extract_scores(
    table: &RawTable,
    source: &Path,
    profile: &ExportProfile,
) -> Result<Vec<ScoreEntry>> {
    let username_column = required_column(table, source, &profile.username_column)?;
    let score_column = required_column(table, source, &profile.score_column)?;

    let mut entries = Vec::new();
    for row in 0..table.rows.len() {
        let (Some(username), Some(score)) =
            (table.cell(row, username_column), table.cell(row, score_column))
        else {
            continue;
        };
        let score = parse_score(&table.headers[score_column], username, score)?;
        entries.push(ScoreEntry::new(username, score));
    }
    Ok(entries)
}

fn required_column(table: &RawTable, source: &Path, name: &str) -> Result<usize> {
    table.column(name).map_err(|_| GradeError::RequiredColumnMissing {
        column: name.to_string(),
        path: source.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export() -> RawTable {
        RawTable::new(
            vec![
                "First".into(),
                "Username".into(),
                "Grade (out of 100)".into(),
            ],
            vec![
                vec!["Amy".into(), "amy".into(), "64".into()],
                vec!["Bo".into(), "".into(), "90".into()],
                vec!["Cy".into(), "cy".into(), "".into()],
                vec!["Di".into(), "di".into(), "88.5".into()],
            ],
        )
    }

    #[test]
    fn keeps_rows_with_both_values_in_order() {
        let entries = extract_scores(&export(), Path::new("quiz.csv"), &ExportProfile::edpuzzle())
            .expect("scores extracted");
        assert_eq!(
            entries,
            [ScoreEntry::new("amy", 64.0), ScoreEntry::new("di", 88.5)]
        );
    }

    #[test]
    fn missing_score_header_is_reported_with_source() {
        let error = extract_scores(
            &export(),
            Path::new("quiz.csv"),
            &ExportProfile::scored_sheet(),
        )
        .unwrap_err();
        match error {
            GradeError::RequiredColumnMissing { column, path } => {
                assert_eq!(column, "Score");
                assert_eq!(path, Path::new("quiz.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_score_is_rejected() {
        let table = RawTable::new(
            vec!["Username".into(), "Score".into()],
            vec![vec!["amy".into(), "n/a".into()]],
        );
        assert!(matches!(
            extract_scores(&table, Path::new("x.csv"), &ExportProfile::scored_sheet()),
            Err(GradeError::InvalidScore { .. })
        ));
    }
}
