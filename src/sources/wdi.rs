//! World Development Indicators.
//!
//! Indicator-level data, not project-level: one row per country, one column
//! per indicator/year pair. This table never enters the project merge.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use itertools::Itertools;
use tracing::warn;

use crate::countries::CountryMap;
use crate::error::ScrapeError;
use crate::fetch::{Fetch, Pacer};

const API_BASE: &str = "http://api.worldbank.org/v2/country";
const YEARS: &[&str] = &["2009", "2010"];

pub const MIN_DELAY: Duration = Duration::from_secs(1);

/// Accumulates indicator values per country, keeping indicator columns in
/// first-seen order.
pub struct IndicatorTable {
    columns: Vec<String>,
    rows: BTreeMap<String, CountryRow>,
}

struct CountryRow {
    country: String,
    values: BTreeMap<String, f64>,
}

impl IndicatorTable {
    /// One row per allow-listed country, keyed by ISO code.
    pub fn new(countries: &CountryMap) -> Self {
        IndicatorTable {
            columns: Vec::new(),
            rows: countries
                .iter()
                .map(|(iso, name)| {
                    (
                        iso.to_string(),
                        CountryRow {
                            country: name.to_string(),
                            values: BTreeMap::new(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn set(&mut self, iso: &str, column: &str, value: Option<f64>) {
        let Some(row) = self.rows.get_mut(iso) else {
            return; // API echoes aggregates we never asked for
        };
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        if let Some(v) = value {
            row.values.insert(column.to_string(), v);
        }
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["iso".to_string(), "country".to_string()];
        headers.extend(self.columns.iter().cloned());
        headers
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(iso, row)| {
                let mut cells = vec![iso.clone(), row.country.clone()];
                cells.extend(self.columns.iter().map(|c| {
                    row.values
                        .get(c)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                }));
                cells
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Read the indicator list: (code, name) rows from a local CSV.
pub fn load_indicators(path: &Path) -> Result<Vec<(String, String)>, ScrapeError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| ScrapeError::Listing(e.to_string()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ScrapeError::Listing(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ScrapeError::Listing(format!("indicator list is missing {name:?}")))
    };
    let (code_col, name_col) = (col("code")?, col("name")?);

    let mut indicators = Vec::new();
    for result in reader.records() {
        let rec = result.map_err(|e| ScrapeError::Listing(e.to_string()))?;
        let code = rec.get(code_col).unwrap_or("").trim().to_string();
        let name = rec.get(name_col).unwrap_or("").trim().to_string();
        if !code.is_empty() {
            indicators.push((code, name));
        }
    }
    Ok(indicators)
}

/// Sweep every indicator over every year for all allow-listed countries.
/// One failed call skips that indicator/year pair, never the whole sweep.
pub fn collect(
    fetch: &mut dyn Fetch,
    pacer: &mut Pacer,
    indicators: &[(String, String)],
    countries: &CountryMap,
) -> IndicatorTable {
    let joined = countries.iter().map(|(iso, _)| iso).join(";");
    let mut table = IndicatorTable::new(countries);

    for (code, name) in indicators {
        for &year in YEARS {
            pacer.pace();
            let url = format!(
                "{API_BASE}/{joined}/indicator/{code}?date={year}&format=json&per_page=100"
            );
            let value = match fetch.get_json(&url) {
                Ok(v) => v,
                Err(e) => {
                    warn!(indicator = code.as_str(), year, error = %e, "indicator call failed");
                    continue;
                }
            };
            let Some(entries) = value.get(1).and_then(|v| v.as_array()) else {
                warn!(indicator = code.as_str(), year, "unexpected response shape");
                continue;
            };
            ingest_entries(&mut table, name, entries);
        }
    }
    table
}

/// Fold one API page of entries into the table as `name_year` columns.
fn ingest_entries(table: &mut IndicatorTable, name: &str, entries: &[serde_json::Value]) {
    for entry in entries {
        let Some(iso) = entry.get("countryiso3code").and_then(|v| v.as_str()) else {
            continue;
        };
        let Some(date) = entry.get("date").and_then(|v| v.as_str()) else {
            continue;
        };
        let column = format!("{name}_{date}");
        let value = entry.get("value").and_then(|v| v.as_f64());
        table.set(iso, &column, value);
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::countries;

    #[test]
    fn columns_keep_first_seen_order() {
        let mut table = IndicatorTable::new(&countries::wdi());
        table.set("AGO", "GDP_2010", Some(1.5));
        table.set("KEN", "Population_2009", Some(2.0));
        table.set("AGO", "Population_2009", None);
        assert_eq!(
            table.headers(),
            vec!["iso", "country", "GDP_2010", "Population_2009"]
        );
    }

    #[test]
    fn entries_land_on_the_right_row() {
        let mut table = IndicatorTable::new(&countries::wdi());
        let entries = vec![
            json!({"countryiso3code": "KEN", "date": "2009", "value": 39.0}),
            json!({"countryiso3code": "KEN", "date": "2010", "value": null}),
            json!({"countryiso3code": "FRA", "date": "2009", "value": 65.0}),
        ];
        ingest_entries(&mut table, "Population", &entries);

        let rows = table.rows();
        let kenya = rows.iter().find(|r| r[0] == "KEN").unwrap();
        assert_eq!(kenya[1], "Kenya");
        let headers = table.headers();
        let pop_2009 = headers.iter().position(|h| h == "Population_2009").unwrap();
        let pop_2010 = headers.iter().position(|h| h == "Population_2010").unwrap();
        assert_eq!(kenya[pop_2009], "39");
        assert_eq!(kenya[pop_2010], "");
        // France is not in the allow-list; no row appears for it.
        assert!(rows.iter().all(|r| r[0] != "FRA"));
    }
}
