//! Flat tabular export of a reconciliation result.
//!
//! Layout: an unquoted header `type,id,name,qty`, then one row per entry
//! (matched, then missing, then extra) with every field double-quoted and
//! embedded quotes doubled. Any RFC 4180 reader recovers the rows exactly.

use std::io::Write;

use crate::error::ReconError;
use crate::model::{EntryKind, ReconResult, ReportRow};

pub const REPORT_HEADER: [&str; 4] = ["type", "id", "name", "qty"];

/// Default file name offered for downloads.
pub const REPORT_FILE_NAME: &str = "basket-scan-report.csv";

/// Flatten a result into rows: matched, missing, extra, each in result order.
pub fn to_rows(result: &ReconResult) -> Vec<ReportRow> {
    [EntryKind::Matched, EntryKind::Missing, EntryKind::Extra]
        .into_iter()
        .flat_map(|kind| {
            result.entries(kind).iter().map(move |e| ReportRow {
                kind,
                id: e.id.clone(),
                name: e.name.clone(),
                qty: e.qty,
            })
        })
        .collect()
}

/// Write rows as CSV to any writer.
pub fn write_report_csv(rows: &[ReportRow], mut writer: impl Write) -> Result<(), ReconError> {
    writer
        .write_all(REPORT_HEADER.join(",").as_bytes())
        .and_then(|_| writer.write_all(b"\n"))
        .map_err(|e| ReconError::Io(e.to_string()))?;

    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for row in rows {
        let qty = row.qty.to_string();
        csv.write_record([row.kind.as_str(), row.id.as_str(), row.name.as_str(), qty.as_str()])?;
    }

    csv.flush().map_err(|e| ReconError::Io(e.to_string()))?;
    Ok(())
}

/// Serialize rows to an in-memory CSV string.
pub fn serialize_rows(rows: &[ReportRow]) -> Result<String, ReconError> {
    let mut buf = Vec::new();
    write_report_csv(rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReconError::Csv(e.to_string()))
}

/// Parse text produced by [`serialize_rows`] back into rows.
pub fn parse_report_csv(csv_data: &str) -> Result<Vec<ReportRow>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REPORT_HEADER {
        if !headers.iter().any(|h| h == column) {
            return Err(ReconError::MissingColumn {
                input: "report".into(),
                column: column.into(),
            });
        }
    }

    let mut rows = Vec::new();
    for row in reader.deserialize::<ReportRow>() {
        rows.push(row?);
    }
    Ok(rows)
}
