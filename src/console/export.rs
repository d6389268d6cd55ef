//! CSV export of a course's custom report.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::models::ReportRow;

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_record<I, S>(style: QuoteStyle, record: I) -> Result<String, ApiError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut wtr = WriterBuilder::new()
        .quote_style(style)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(record)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| ApiError::Io(std::io::Error::other(e.to_string())))?;
    let line = String::from_utf8(bytes)
        .map_err(|e| ApiError::Decode(format!("CSV output is not UTF-8: {}", e)))?;
    Ok(line.trim_end_matches('\n').to_string())
}

/// Header from the first row's keys; every data cell quoted with inner
/// quotes doubled; lines joined with `\n`. `None` for no rows.
pub fn render_csv(rows: &[ReportRow]) -> Result<Option<String>, ApiError> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(write_record(
        QuoteStyle::Necessary,
        headers.iter().map(|h| h.as_str()),
    )?);
    for row in rows {
        let cells = headers.iter().map(|h| cell_text(row.get(h.as_str())));
        lines.push(write_record(QuoteStyle::Always, cells)?);
    }

    Ok(Some(lines.join("\n")))
}

pub fn export_filename(course_shortname: &str, date: NaiveDate) -> String {
    let safe: String = course_shortname
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("report_{}_{}.csv", safe, date.format("%Y-%m-%d"))
}

/// Writes the report into `dir`. Empty input writes nothing.
pub fn export_csv(
    rows: &[ReportRow],
    course_shortname: &str,
    dir: &Path,
) -> Result<Option<PathBuf>, ApiError> {
    let Some(csv) = render_csv(rows)? else {
        return Ok(None);
    };

    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(course_shortname, Local::now().date_naive()));
    fs::write(&path, csv)?;

    info!(path = %path.display(), rows = rows.len(), "report exported");
    Ok(Some(path))
}
