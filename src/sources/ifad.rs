//! International Fund for Agricultural Development.
//!
//! The listing page carries tabbed columns of project ids and countries;
//! detail pages are definition lists (`dt`/`dd`), with co-financier blocks
//! as a repeated-sibling run under a shared class.

use std::sync::LazyLock;
use std::time::Duration;

use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::warn;

use crate::countries::CountryMap;
use crate::error::ScrapeError;
use crate::extract::{
    anchor_href_for_text, element_text, extract, FieldSpec, FieldValue, Strategy,
};
use crate::fetch::{Fetch, Pacer};
use crate::record::ProjectRecord;
use crate::sources::{collect_details, Candidate};
use crate::text;

pub const IFI_NAME: &str = "International Fund for Agricultural Development";
pub const EXTRA_COLUMNS: &[&str] = &["Co-financiers (International)", "Co-financiers (Domestic)"];

pub const LISTING_URL: &str =
    "https://www.ifad.org/en/web/operations/projects-and-programmes?mode=search";
const PROJECT_URL: &str = "https://www.ifad.org/en/web/operations/-/project/";
const LISTING_TABS: std::ops::RangeInclusive<u32> = 1..=3;

pub const MIN_DELAY: Duration = Duration::from_secs(5);

/// `dd.project-status` wraps its text in a span with a fixed "Status: "
/// prefix of this many characters.
const STATUS_PREFIX_LEN: usize = 8;
/// "mailto:" scheme prefix on contact anchors.
const MAILTO_PREFIX_LEN: usize = 7;

const APPROVAL_DATE: FieldSpec = FieldSpec {
    label: "Approval Date",
    strategy: Strategy::TableRow,
};
const SECTOR: FieldSpec = FieldSpec {
    label: "Sector",
    strategy: Strategy::TableRow,
};
const FINANCING: FieldSpec = FieldSpec {
    label: "IFAD Financing",
    strategy: Strategy::TableRow,
};
const DURATION: FieldSpec = FieldSpec {
    label: "Duration",
    strategy: Strategy::TableRow,
};
const CONTACT: FieldSpec = FieldSpec {
    label: "Project Contact",
    strategy: Strategy::TableRow,
};
const COFINANCIERS_INTL: FieldSpec = FieldSpec {
    label: "Co-financiers (International)",
    strategy: Strategy::RepeatedSibling {
        class: "project-row-text",
    },
};
const COFINANCIERS_DOMESTIC: FieldSpec = FieldSpec {
    label: "Co-financiers (Domestic)",
    strategy: Strategy::RepeatedSibling {
        class: "project-row-text",
    },
};

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static STATUS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dd.project-status > span").unwrap());

/// Parse the tabbed listing page into candidates, dropping countries
/// outside the allow-list before anything is fetched. In each tab the id
/// column doubles as the date column — every other cell is a date.
pub fn parse_listing(doc: &Html, countries: &CountryMap) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for tab in LISTING_TABS {
        let id_sel =
            Selector::parse(&format!("div.tab{tab} div.project-info-container div.col-md-2"))
                .unwrap();
        let country_sel =
            Selector::parse(&format!("div.tab{tab} div.project-info-container div.col-md-3"))
                .unwrap();

        let ids: Vec<String> = doc
            .select(&id_sel)
            .map(element_text)
            .step_by(2) // odd cells are project dates, not ids
            .collect();
        let raw_countries: Vec<String> = doc.select(&country_sel).map(element_text).collect();
        if ids.len() != raw_countries.len() {
            warn!(
                tab,
                ids = ids.len(),
                countries = raw_countries.len(),
                "listing tab has unpaired id/country columns"
            );
        }

        for (id, raw) in ids.into_iter().zip(raw_countries) {
            if let Some(canonical) = countries.normalize(&raw) {
                candidates.push(Candidate {
                    id,
                    country: canonical.to_string(),
                    status: String::new(),
                });
            }
        }
    }
    candidates
}

pub fn collect(fetch: &mut dyn Fetch, pacer: &mut Pacer, candidates: &[Candidate]) -> Vec<ProjectRecord> {
    collect_details(
        fetch,
        pacer,
        candidates,
        |c| format!("{PROJECT_URL}{}", c.id),
        transform,
    )
}

pub fn transform(doc: &Html, candidate: &Candidate) -> Result<ProjectRecord, ScrapeError> {
    // The portal's project ids are numeric; anything else is listing noise.
    if candidate.id.parse::<u64>().is_err() {
        return Err(ScrapeError::malformed("Project ID", &candidate.id));
    }

    let title = doc
        .select(&TITLE_SEL)
        .find(|h1| !h1.value().classes().any(|c| c == "hide-accessible"))
        .map(element_text)
        .ok_or(ScrapeError::MissingRequired("Project Title"))?;

    let status = doc
        .select(&STATUS_SEL)
        .next()
        .map(element_text)
        .map(|s| s.get(STATUS_PREFIX_LEN..).unwrap_or("").trim().to_string())
        .unwrap_or_default();

    let commitment = match extract(doc, &FINANCING) {
        FieldValue::Present(v) if !v.trim().is_empty() => {
            Some(text::parse_usd_millions("IFAD Financing", &v)?)
        }
        _ => None,
    };

    let approval = text::parse_date(
        "Approval Date",
        &extract(doc, &APPROVAL_DATE).unwrap_or_default(),
    )?;

    // Duration is a "YYYY - YYYY" range; the closing date is its end year.
    let (duration, closing) = match extract(doc, &DURATION) {
        FieldValue::Present(v) if !v.trim().is_empty() => {
            let (start, end) = text::parse_year_range("Duration", &v)?;
            (Some((end - start) as f64), Some(end.to_string()))
        }
        _ => (None, None),
    };

    let contact = extract(doc, &CONTACT).unwrap_or_default();
    let contact_details = if contact.is_empty() {
        String::new()
    } else {
        anchor_href_for_text(doc, &contact)
            .map(|href| href.get(MAILTO_PREFIX_LEN..).unwrap_or("").to_string())
            .unwrap_or_default()
    };

    Ok(ProjectRecord {
        ifi: IFI_NAME,
        project_id: candidate.id.clone(),
        title,
        country: candidate.country.clone(),
        status,
        commitment_usd: commitment,
        approval_date: approval.map(|d| d.to_string()),
        closing_date: closing,
        duration_years: duration,
        primary_sector: extract(doc, &SECTOR).unwrap_or_default(),
        additional_sectors: None,
        description: String::new(),
        contact,
        contact_details,
        extras: vec![
            (
                "Co-financiers (International)",
                cofinanciers(doc, &COFINANCIERS_INTL),
            ),
            (
                "Co-financiers (Domestic)",
                cofinanciers(doc, &COFINANCIERS_DOMESTIC),
            ),
        ],
    })
}

/// Each funder block reads "Name US$ X million"; render it as
/// "Name (US$ X million)" and join the blocks.
fn cofinanciers(doc: &Html, spec: &FieldSpec) -> String {
    match extract(doc, spec) {
        FieldValue::Present(v) => v
            .split("; ")
            .map(|part| format!("{})", part.replacen("US$", "(US$", 1)))
            .join("; "),
        FieldValue::Missing => String::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::countries;
    use crate::sources::tests::StubFetch;

    fn fixture(name: &str) -> Html {
        let html = std::fs::read_to_string(format!("tests/fixtures/{name}.html")).unwrap();
        Html::parse_document(&html)
    }

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.into(),
            country: "Kenya".into(),
            status: String::new(),
        }
    }

    #[test]
    fn listing_pairs_ids_with_countries() {
        let candidates = parse_listing(&fixture("ifad_listing"), &countries::ifad());
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        // France is rejected; date cells never become ids.
        assert_eq!(ids, vec!["2000003813", "2000001630"]);
        assert_eq!(candidates[1].country, "Tanzania");
    }

    #[test]
    fn full_page_transform() {
        let rec = transform(&fixture("ifad_project"), &candidate("2000003813")).unwrap();
        assert_eq!(rec.ifi, IFI_NAME);
        assert_eq!(rec.title, "Inclusive Rural Finance Programme");
        assert_eq!(rec.status, "Ongoing");
        assert_eq!(rec.commitment_usd, Some(52_490_000.0));
        assert_eq!(rec.approval_date.as_deref(), Some("2021-12-14"));
        assert_eq!(rec.closing_date.as_deref(), Some("2024"));
        assert_eq!(rec.duration_years, Some(3.0));
        assert_eq!(rec.primary_sector, "Rural Finance");
        assert_eq!(rec.contact, "Maria Nyota");
        assert_eq!(rec.contact_details, "m.nyota@ifad.org");
        assert_eq!(
            rec.extra("Co-financiers (International)"),
            "European Union (US$ 5.00 million); World Food Programme (US$ 2.10 million)"
        );
        assert_eq!(rec.extra("Co-financiers (Domestic)"), "");
    }

    #[test]
    fn non_numeric_id_is_dropped() {
        let err = transform(&fixture("ifad_project"), &candidate("see website")).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedValue { .. }));
    }

    #[test]
    fn unparseable_duration_drops_the_record() {
        let doc = Html::parse_document(
            "<html><body><h1>Stalled Project</h1>\
             <dl><dt>Duration</dt><dd>ongoing</dd></dl></body></html>",
        );
        let err = transform(&doc, &candidate("2000009999")).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedValue { .. }));
    }

    #[test]
    fn listing_to_records_end_to_end() {
        // Three listed projects: one rejected country, one dead fetch, one
        // good page -> exactly one record.
        let listing = fixture("ifad_listing");
        let candidates = parse_listing(&listing, &countries::ifad());
        assert_eq!(candidates.len(), 2);

        let mut pages = HashMap::new();
        pages.insert(
            format!("{PROJECT_URL}2000003813"),
            std::fs::read_to_string("tests/fixtures/ifad_project.html").unwrap(),
        );
        let mut fetch = StubFetch { pages };

        let records = collect(&mut fetch, &mut Pacer::new(Duration::ZERO), &candidates);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_id, "2000003813");
    }
}
