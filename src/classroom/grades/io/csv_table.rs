use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::classroom::grades::error::{GradeError, Result};
use crate::classroom::grades::io::atomic::write_atomically;
use crate::classroom::grades::model::{
    RawTable, Roster, RosterRow, ScoreEntry, USERNAME_COLUMN, resolve_column,
};

/// Reads any delimited export into a [`RawTable`]. Ragged rows are accepted.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record_to_cells(&record?));
    }
    Ok(RawTable::new(headers, rows))
}

/// Loads a gradebook. The identifier column is located by name; every other
/// column is treated as an assignment.
pub fn read_roster(path: &Path) -> Result<Roster> {
    let table = read_raw_table(path)?;
    let username_column = resolve_column(&table.headers, USERNAME_COLUMN)?;

    let assignment_columns: Vec<usize> = (0..table.headers.len())
        .filter(|index| *index != username_column)
        .collect();
    let assignments = assignment_columns
        .iter()
        .map(|index| table.headers[*index].clone())
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for row_index in 0..table.rows.len() {
        let Some(username) = table.cell(row_index, username_column) else {
            continue;
        };
        let mut scores = Vec::with_capacity(assignment_columns.len());
        for column in &assignment_columns {
            let score = match table.cell(row_index, *column) {
                Some(value) => Some(parse_score(&table.headers[*column], username, value)?),
                None => None,
            };
            scores.push(score);
        }
        rows.push(RosterRow {
            username: username.to_string(),
            scores,
        });
    }

    Ok(Roster::from_parts(assignments, rows))
}

/// Rewrites the whole gradebook file. Missing scores become empty cells.
pub fn write_roster(path: &Path, roster: &Roster) -> Result<()> {
    write_atomically(path, |out| {
        let mut writer = WriterBuilder::new().from_writer(out);

        let mut header = vec![USERNAME_COLUMN.to_string()];
        header.extend(roster.assignments().iter().cloned());
        writer.write_record(&header)?;

        for row in roster.rows() {
            let mut record = Vec::with_capacity(row.scores.len() + 1);
            record.push(row.username.clone());
            record.extend(row.scores.iter().map(|score| match score {
                Some(value) => value.to_string(),
                None => String::new(),
            }));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    })
}

/// Reads a normalized `Username,Score` table.
pub fn read_score_entries(path: &Path) -> Result<Vec<ScoreEntry>> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut entries = Vec::new();
    for entry in reader.deserialize() {
        entries.push(entry?);
    }
    Ok(entries)
}

/// Writes a normalized `Username,Score` table, keeping the header even when
/// there are no entries.
pub fn write_score_entries(path: &Path, entries: &[ScoreEntry]) -> Result<()> {
    write_atomically(path, |out| {
        let mut writer = WriterBuilder::new().from_writer(out);
        writer.write_record(["Username", "Score"])?;
        for entry in entries {
            let score = entry.score.to_string();
            writer.write_record([entry.username.as_str(), score.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Parses a score cell, reporting the column and student on failure.
pub fn parse_score(column: &str, username: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
        .ok_or_else(|| GradeError::InvalidScore {
            column: column.to_string(),
            username: username.to_string(),
            value: value.to_string(),
        })
}

fn record_to_cells(record: &StringRecord) -> Vec<String> {
    record.iter().map(str::to_string).collect()
}
