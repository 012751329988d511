//! CSV output with the locked-file retry the analysts rely on: if the
//! destination is open in a spreadsheet, keep retrying until they close it.

use std::fs::{self, File};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::record::ProjectRecord;

const LOCK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Write one source's table: the common columns plus that source's fixed
/// extra columns.
pub fn write_source_csv(
    path: &Path,
    extra_columns: &[&str],
    records: &[ProjectRecord],
) -> Result<()> {
    let headers: Vec<String> = crate::record::COLUMNS
        .iter()
        .chain(extra_columns.iter())
        .map(|s| s.to_string())
        .collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|rec| {
            let mut row = rec.common_row();
            row.extend(extra_columns.iter().map(|c| rec.extra(c).to_string()));
            row
        })
        .collect();
    write_rows(path, &headers, &rows)
}

/// Write a header row and data rows, retrying indefinitely while the
/// destination file is locked by another process.
pub fn write_rows(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    loop {
        match try_write(path, headers, rows) {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "could not write output file; close it if it is open in another program"
                );
                thread::sleep(LOCK_RETRY_DELAY);
            }
        }
    }
}

fn try_write(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
