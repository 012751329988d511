//! Per-source collection: candidate pre-filtering and the shared
//! fetch-extract-transform loop.

pub mod afdb;
pub mod ifad;
pub mod wbp;
pub mod wdi;

use indicatif::{ProgressBar, ProgressStyle};
use scraper::Html;
use tracing::{debug, warn};

use crate::countries::CountryMap;
use crate::error::ScrapeError;
use crate::fetch::{Fetch, Pacer};
use crate::record::ProjectRecord;

/// One listing row — the minimum the listing collaborator must expose.
/// `country` is already canonical; pre-filtering happens before a
/// `Candidate` exists so no rejected country is ever fetched.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub country: String,
    pub status: String,
}

/// Filter raw listing rows (id, raw country, status) down to candidates:
/// country must be in the source's map, status in the source's
/// approved/in-progress set (empty set = the listing carries no status).
pub fn prefilter(
    rows: impl IntoIterator<Item = (String, String, String)>,
    countries: &CountryMap,
    statuses: &[&str],
) -> Vec<Candidate> {
    let mut kept = Vec::new();
    let mut rejected = 0usize;
    for (id, raw_country, status) in rows {
        let id = id.trim().to_string();
        if id.is_empty() {
            continue;
        }
        let Some(canonical) = countries.normalize(&raw_country) else {
            rejected += 1;
            debug!(id, country = raw_country.as_str(), "country rejected");
            continue;
        };
        let status = status.trim().to_string();
        if !statuses.is_empty() && !statuses.iter().any(|s| *s == status) {
            continue;
        }
        kept.push(Candidate {
            id,
            country: canonical.to_string(),
            status,
        });
    }
    if rejected > 0 {
        debug!(rejected, "candidates outside the country allow-list");
    }
    kept
}

/// The shared detail loop: pace, fetch, transform, accumulate. A candidate
/// whose fetch is exhausted or whose record is dropped is skipped, never
/// fatal. Restart means re-running from the full candidate list.
pub fn collect_details<F>(
    fetch: &mut dyn Fetch,
    pacer: &mut Pacer,
    candidates: &[Candidate],
    url_for: impl Fn(&Candidate) -> String,
    transform: F,
) -> Vec<ProjectRecord>
where
    F: Fn(&Html, &Candidate) -> Result<ProjectRecord, ScrapeError>,
{
    let pb = ProgressBar::new(candidates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut records = Vec::new();
    for candidate in candidates {
        pacer.pace();
        let url = url_for(candidate);
        match fetch.get_html(&url) {
            Ok(doc) => match transform(&doc, candidate) {
                Ok(record) => records.push(record.fold_ascii()),
                Err(e) => warn!(id = candidate.id.as_str(), error = %e, "record dropped"),
            },
            Err(e) => warn!(id = candidate.id.as_str(), error = %e, "skipping identifier"),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    records
}

// ── Tests ──

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::countries;
    use crate::extract::{extract, FieldSpec, Strategy};

    /// Canned-response fetch for collector tests.
    pub(crate) struct StubFetch {
        pub pages: HashMap<String, String>,
    }

    impl Fetch for StubFetch {
        fn get_html(&mut self, url: &str) -> Result<Html, ScrapeError> {
            match self.pages.get(url) {
                Some(body) => Ok(Html::parse_document(body)),
                None => Err(ScrapeError::FetchExhausted {
                    url: url.to_string(),
                    attempts: 20,
                }),
            }
        }

        fn get_json(&mut self, url: &str) -> Result<serde_json::Value, ScrapeError> {
            match self.pages.get(url) {
                Some(body) => serde_json::from_str(body)
                    .map_err(|_| ScrapeError::malformed("response body", url)),
                None => Err(ScrapeError::FetchExhausted {
                    url: url.to_string(),
                    attempts: 20,
                }),
            }
        }
    }

    #[test]
    fn prefilter_drops_unknown_countries_and_statuses() {
        let rows = vec![
            ("P1".to_string(), "Kenya".to_string(), "Approved".to_string()),
            ("P2".to_string(), "Atlantis".to_string(), "Approved".to_string()),
            ("P3".to_string(), "Kenya".to_string(), "Closed".to_string()),
            ("".to_string(), "Kenya".to_string(), "Approved".to_string()),
        ];
        let kept = prefilter(rows, &countries::afdb(), &["Approved", "Implementation"]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "P1");
        assert_eq!(kept[0].country, "Kenya");
    }

    #[test]
    fn one_rejected_one_failed_one_good_yields_one_record() {
        // Listing of three: one country is rejected before any fetch, one
        // fetch permanently fails, one succeeds.
        let rows = vec![
            ("A1".to_string(), "Kenya".to_string(), String::new()),
            ("A2".to_string(), "Atlantis".to_string(), String::new()),
            ("A3".to_string(), "Malawi".to_string(), String::new()),
        ];
        let candidates = prefilter(rows, &countries::afdb(), &[]);
        assert_eq!(candidates.len(), 2);

        let mut pages = HashMap::new();
        pages.insert(
            "page/A1".to_string(),
            "<table><tr><th>Sector</th><td>Water</td></tr></table>".to_string(),
        );
        let mut fetch = StubFetch { pages };

        const SECTOR: FieldSpec = FieldSpec {
            label: "Sector",
            strategy: Strategy::TableRow,
        };
        let records = collect_details(
            &mut fetch,
            &mut Pacer::new(Duration::ZERO),
            &candidates,
            |c| format!("page/{}", c.id),
            |doc, c| {
                Ok(ProjectRecord {
                    project_id: c.id.clone(),
                    country: c.country.clone(),
                    primary_sector: extract(doc, &SECTOR).unwrap_or_default(),
                    ..Default::default()
                })
            },
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_id, "A1");
        assert_eq!(records[0].primary_sector, "Water");
    }
}
