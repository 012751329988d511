//! Cross-source merge: concatenate the project-level tables in a fixed
//! order, add the Climate Flag, and write the merged dataset with a stable
//! row index. No cross-source dedup — a project co-financed by two
//! institutions legitimately appears once per source. WDI is indicator
//! data, not project data, and never enters.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::{info, warn};

use crate::output;
use crate::record::COLUMNS;

/// Per-source file stems, in merge order.
const SOURCE_ORDER: &[&str] = &["ifad", "wbp", "afdb"];

pub const MERGED_FILE: &str = "merged_data.csv";

static CLIMATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)climate|carbon|sequester").unwrap());

/// True when any of the textual fields shows evidence of climate relevance.
/// Missing fields count as empty.
pub fn climate_flag(fields: [&str; 4]) -> bool {
    fields.iter().any(|f| CLIMATE_RE.is_match(f))
}

/// Concatenate the per-source tables under `data_dir` and write the merged
/// dataset. A missing source file is skipped with a warning — partial
/// datasets are acceptable output.
pub fn run(data_dir: &Path) -> Result<usize> {
    let mut merged: Vec<Vec<String>> = Vec::new();

    for stem in SOURCE_ORDER {
        let path = data_dir.join(format!("{stem}_data.csv"));
        if !path.exists() {
            warn!(path = %path.display(), "source table not found, skipping");
            continue;
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut count = 0usize;
        for result in reader.records() {
            let rec = result?;
            let get = |name: &str| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .and_then(|i| rec.get(i))
                    .unwrap_or("")
            };
            let mut row: Vec<String> = COLUMNS.iter().map(|c| get(c).to_string()).collect();
            row.push(
                climate_flag([
                    get("Project Title"),
                    get("Description"),
                    get("Primary Sector"),
                    get("Additional Sectors"),
                ])
                .to_string(),
            );
            merged.push(row);
            count += 1;
        }
        info!(source = stem, rows = count, "merged");
    }

    // The leading index keeps merged row order stable for downstream joins.
    let rows: Vec<Vec<String>> = merged
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.insert(0, i.to_string());
            row
        })
        .collect();

    let mut headers = vec![String::new()];
    headers.extend(COLUMNS.iter().map(|c| c.to_string()));
    headers.push("Climate Flag".to_string());

    output::write_rows(&data_dir.join(MERGED_FILE), &headers, &rows)?;
    Ok(rows.len())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_climate_evidence_case_insensitively() {
        assert!(climate_flag(["", "A carbon sequestration project.", "", ""]));
        assert!(climate_flag(["CLIMATE resilience fund", "", "", ""]));
        assert!(climate_flag(["", "", "", "Climate change adaptation"]));
        assert!(!climate_flag([
            "Rural roads",
            "Improve market access.",
            "Transport",
            ""
        ]));
    }

    #[test]
    fn missing_fields_count_as_empty() {
        assert!(!climate_flag(["", "", "", ""]));
    }

    #[test]
    fn merge_concatenates_in_source_order_with_flags() {
        use crate::record::ProjectRecord;

        let dir = std::env::temp_dir().join("ifi_scraper_merge_test");
        let _ = std::fs::remove_dir_all(&dir);

        let ifad_record = ProjectRecord {
            ifi: "International Fund for Agricultural Development",
            project_id: "2000003813".into(),
            title: "Inclusive Rural Finance Programme".into(),
            country: "Kenya".into(),
            description: "A carbon sequestration project.".into(),
            ..Default::default()
        };
        let afdb_record = ProjectRecord {
            ifi: "African Development Bank",
            project_id: "P-KE-AAC-007".into(),
            title: "Rural Roads Upgrade".into(),
            country: "Kenya".into(),
            description: "Improve market access.".into(),
            ..Default::default()
        };
        crate::output::write_source_csv(&dir.join("ifad_data.csv"), &[], &[ifad_record]).unwrap();
        crate::output::write_source_csv(&dir.join("afdb_data.csv"), &[], &[afdb_record]).unwrap();

        // wbp_data.csv is absent; the merge warns and continues.
        let count = run(&dir).unwrap();
        assert_eq!(count, 2);

        let merged = std::fs::read_to_string(dir.join(MERGED_FILE)).unwrap();
        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Climate Flag"));
        assert!(lines[1].starts_with("0,"));
        assert!(lines[1].contains("2000003813"));
        assert!(lines[1].ends_with(",true"));
        assert!(lines[2].starts_with("1,"));
        assert!(lines[2].contains("P-KE-AAC-007"));
        assert!(lines[2].ends_with(",false"));
    }
}
