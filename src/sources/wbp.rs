//! World Bank Projects.
//!
//! No per-field scraping here: the bulk listing export already carries the
//! fields, so this source is a row-wise transform plus one JSON API call
//! per kept project for the team-lead contact.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::countries::CountryMap;
use crate::error::ScrapeError;
use crate::fetch::{Fetch, Pacer};
use crate::record::ProjectRecord;
use crate::text;

pub const IFI_NAME: &str = "World Bank";
pub const STATUSES: &[&str] = &["Active", "Pipeline"];
pub const EXTRA_COLUMNS: &[&str] = &[];

const CONTACT_API: &str =
    "http://search.worldbank.org/api/v2/projects?format=json&fl=id,teamleadname&id=";

pub const MIN_DELAY: Duration = Duration::from_secs(1);

/// Listing rows for 'World' are allowed through alongside the country map
/// and re-checked against the description like the other multi-region rows.
const WORLD: &str = "World";
const MULTI_REGION: &[&str] = &["World", "Multinational"];

#[derive(Debug, Deserialize)]
struct ContactResponse {
    #[serde(default)]
    projects: HashMap<String, ContactEntry>,
}

#[derive(Debug, Deserialize)]
struct ContactEntry {
    #[serde(default)]
    teamleadname: Option<String>,
}

/// Read the bulk export with headers trimmed (the upstream file has
/// trailing spaces on some column names).
pub fn load_listing(path: &Path) -> Result<Vec<HashMap<String, String>>, ScrapeError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| ScrapeError::Listing(e.to_string()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ScrapeError::Listing(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    for required in ["Project ID", "Country", "Project Status"] {
        if !headers.iter().any(|h| h == required) {
            return Err(ScrapeError::Listing(format!(
                "listing is missing the {required:?} column"
            )));
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let rec = result.map_err(|e| ScrapeError::Listing(e.to_string()))?;
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(rec.iter().map(|v| v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

pub fn collect(
    fetch: &mut dyn Fetch,
    pacer: &mut Pacer,
    rows: &[HashMap<String, String>],
    countries: &CountryMap,
    limit: Option<usize>,
) -> Vec<ProjectRecord> {
    let mut records = Vec::new();
    for row in rows {
        match transform_row(row, countries) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "row dropped"),
        }
    }
    if let Some(n) = limit {
        records.truncate(n);
    }

    for record in &mut records {
        pacer.pace();
        if let Some(contact) = fetch_contact(fetch, &record.project_id) {
            record.contact = contact;
        }
    }

    records.into_iter().map(ProjectRecord::fold_ascii).collect()
}

/// Transform one listing row. `Ok(None)` means the row was filtered out
/// (country, status, or the multi-region description check); `Err` means it
/// was malformed and dropped.
pub fn transform_row(
    row: &HashMap<String, String>,
    countries: &CountryMap,
) -> Result<Option<ProjectRecord>, ScrapeError> {
    let get = |name: &str| row.get(name).map(|v| v.trim()).unwrap_or("");

    let raw_country = get("Country");
    let country = match countries.normalize(raw_country) {
        Some(c) => c,
        None if raw_country == WORLD => WORLD,
        None => return Ok(None),
    };
    let status = get("Project Status");
    if !STATUSES.iter().any(|s| *s == status) {
        return Ok(None);
    }
    let id = get("Project ID");
    if id.is_empty() {
        return Err(ScrapeError::MissingRequired("Project ID"));
    }

    let description = get("Project Development Objective");
    if MULTI_REGION.contains(&country) && !mentions_allowed_country(description, countries) {
        return Ok(None);
    }

    // Commitment = concessional (IDA + IBRD) plus grant financing. As in
    // the upstream export, a blank component makes the total unknown.
    let commitment = sum_amounts(
        "Total IDA and IBRD Commitment",
        &[get("Total IDA and IBRD Commitment"), get("Grant Amount")],
    )?;

    let approval = text::parse_date("Board Approval Date", get("Board Approval Date"))?;
    let closing = text::parse_date("Project Closing Date", get("Project Closing Date"))?;
    let duration = match (approval, closing) {
        (Some(a), Some(c)) => Some(text::duration_years(a, c)),
        _ => None,
    };

    let additional = text::join_sectors([
        non_empty(get("Sector 2")),
        non_empty(get("Sector 3")),
        non_empty(get("Theme 1")),
        non_empty(get("Theme 2")),
    ]);

    Ok(Some(ProjectRecord {
        ifi: IFI_NAME,
        project_id: id.to_string(),
        title: get("Project Name").to_string(),
        country: country.to_string(),
        status: status.to_string(),
        commitment_usd: commitment,
        approval_date: approval.map(|d| d.to_string()),
        closing_date: closing.map(|d| d.to_string()),
        duration_years: duration,
        primary_sector: get("Sector 1").to_string(),
        additional_sectors: additional,
        description: description.to_string(),
        contact: String::new(),
        contact_details: String::new(),
        extras: Vec::new(),
    }))
}

fn non_empty(v: &str) -> Option<&str> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Does the description mention any allowed country or region name? Used to
/// keep only the multi-region projects that are actually about allow-list
/// countries. Case-sensitive, as the names are proper nouns.
fn mentions_allowed_country(description: &str, countries: &CountryMap) -> bool {
    countries
        .canonical_values()
        .iter()
        .any(|name| description.contains(name))
}

fn sum_amounts(field: &'static str, parts: &[&str]) -> Result<Option<f64>, ScrapeError> {
    let mut total = 0.0;
    for part in parts {
        if part.is_empty() {
            return Ok(None);
        }
        total += text::parse_grouped_number(field, part)?;
    }
    Ok(Some(total))
}

fn fetch_contact(fetch: &mut dyn Fetch, id: &str) -> Option<String> {
    let url = format!("{CONTACT_API}{id}");
    let value = match fetch.get_json(&url) {
        Ok(v) => v,
        Err(e) => {
            warn!(id, error = %e, "contact lookup failed; leaving contact empty");
            return None;
        }
    };
    let response: ContactResponse = serde_json::from_value(value).ok()?;
    let name = response.projects.get(id)?.teamleadname.clone()?;
    let name = name.replace(',', ", ").replace("NIL", "");
    let name = name.trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

// ── Tests ──
