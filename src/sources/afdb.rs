//! African Development Bank project portal.
//!
//! Candidates come from the portal's exported project list; each detail
//! page is a mix of label/value table rows, one Bootstrap-grid row
//! (Funding), and heading-paragraph description sections.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use scraper::{Html, Selector};

use crate::error::ScrapeError;
use crate::extract::{element_text, extract, FieldSpec, FieldValue, Strategy};
use crate::fetch::{Fetch, Pacer};
use crate::record::ProjectRecord;
use crate::sources::{collect_details, Candidate};
use crate::text;

pub const IFI_NAME: &str = "African Development Bank";
pub const STATUSES: &[&str] = &["Approved", "Implementation"];
pub const EXTRA_COLUMNS: &[&str] = &["Source of Financing", "Sovereign", "DAC Sector Code"];

const BASE_URL: &str = "https://projectsportal.afdb.org/dataportal/VProject/show/";

/// The portal's robots.txt asks for 10 seconds between requests.
pub const MIN_DELAY: Duration = Duration::from_secs(10);

/// The portal quotes commitments in its SDR-pegged Unit of Account; this is
/// the 2021 average USD rate used to express them in dollars.
const UA_TO_USD: f64 = 1.42;

const STATUS: FieldSpec = FieldSpec {
    label: "Status",
    strategy: Strategy::TableRow,
};
const COMMITMENT: FieldSpec = FieldSpec {
    label: "Commitment",
    strategy: Strategy::TableRow,
};
const FUNDING: FieldSpec = FieldSpec {
    label: "Funding",
    strategy: Strategy::TableRow,
};
const SOVEREIGN: FieldSpec = FieldSpec {
    label: "Sovereign / Non-Sovereign",
    strategy: Strategy::TableRow,
};
const APPROVAL_DATE: FieldSpec = FieldSpec {
    label: "Approval Date",
    strategy: Strategy::TableRow,
};
const COMPLETION_DATE: FieldSpec = FieldSpec {
    label: "Planned Completion Date",
    strategy: Strategy::TableRow,
};
const DESCRIPTION: FieldSpec = FieldSpec {
    label: "Project General Description",
    strategy: Strategy::HeadingParagraph,
};
const OBJECTIVES: FieldSpec = FieldSpec {
    label: "Project Objectives",
    strategy: Strategy::HeadingParagraph,
};
const CONTACT_NAME: FieldSpec = FieldSpec {
    label: "Name",
    strategy: Strategy::TableRow,
};
const CONTACT_EMAIL: FieldSpec = FieldSpec {
    label: "Email",
    strategy: Strategy::TableRow,
};
const SECTOR: FieldSpec = FieldSpec {
    label: "Sector",
    strategy: Strategy::TableRow,
};
const DAC_CODE: FieldSpec = FieldSpec {
    label: "DAC Sector Code",
    strategy: Strategy::TableRow,
};

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2.title").unwrap());

/// Read the exported project list: (Project Code, Country, Status) rows.
pub fn load_listing(path: &Path) -> Result<Vec<(String, String, String)>, ScrapeError> {
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
            .ok_or_else(|| ScrapeError::Listing(format!("listing is missing the {name:?} column")))
    };
    let (id_col, country_col, status_col) = (col("Project Code")?, col("Country")?, col("Status")?);

    let mut rows = Vec::new();
    for result in reader.records() {
        let rec = result.map_err(|e| ScrapeError::Listing(e.to_string()))?;
        let cell = |i: usize| rec.get(i).unwrap_or("").to_string();
        rows.push((cell(id_col), cell(country_col), cell(status_col)));
    }
    Ok(rows)
}

pub fn collect(fetch: &mut dyn Fetch, pacer: &mut Pacer, candidates: &[Candidate]) -> Vec<ProjectRecord> {
    collect_details(
        fetch,
        pacer,
        candidates,
        |c| format!("{BASE_URL}{}", c.id),
        transform,
    )
}

pub fn transform(doc: &Html, candidate: &Candidate) -> Result<ProjectRecord, ScrapeError> {
    let title = page_title(doc)?;
    let status = extract(doc, &STATUS).unwrap_or_default();

    let commitment = match extract(doc, &COMMITMENT) {
        FieldValue::Present(v) if !v.trim().is_empty() => {
            // Cell reads "U.A. 12,500,000"; the first token is the currency tag.
            let amount = v
                .trim()
                .split_once(' ')
                .map(|(_, rest)| rest)
                .unwrap_or(v.trim());
            Some(text::parse_grouped_number("Commitment", amount)? * UA_TO_USD)
        }
        _ => None,
    };

    let approval = text::parse_date(
        "Approval Date",
        &extract(doc, &APPROVAL_DATE).unwrap_or_default(),
    )?;
    let closing = text::parse_date(
        "Planned Completion Date",
        &extract(doc, &COMPLETION_DATE).unwrap_or_default(),
    )?;
    let duration = match (approval, closing) {
        (Some(a), Some(c)) => Some(text::duration_years(a, c)),
        _ => None,
    };

    let mut description = extract(doc, &DESCRIPTION).unwrap_or_default();
    if let Some(objectives) = extract(doc, &OBJECTIVES).into_option() {
        if !objectives.is_empty() {
            if description.is_empty() {
                description = objectives;
            } else {
                description = format!("{description}\n{objectives}");
            }
        }
    }

    let funding = extract(doc, &FUNDING).unwrap_or_default();
    let sovereign = extract(doc, &SOVEREIGN).unwrap_or_default();
    let dac_code = extract(doc, &DAC_CODE).unwrap_or_default();

    Ok(ProjectRecord {
        ifi: IFI_NAME,
        project_id: candidate.id.clone(),
        title,
        country: candidate.country.clone(),
        status,
        commitment_usd: commitment,
        approval_date: approval.map(|d| d.to_string()),
        closing_date: closing.map(|d| d.to_string()),
        duration_years: duration,
        primary_sector: extract(doc, &SECTOR).unwrap_or_default(),
        additional_sectors: None,
        description,
        contact: text::title_case(&extract(doc, &CONTACT_NAME).unwrap_or_default()),
        contact_details: extract(doc, &CONTACT_EMAIL).unwrap_or_default(),
        extras: vec![
            ("Source of Financing", funding),
            ("Sovereign", sovereign),
            ("DAC Sector Code", dac_code),
        ],
    })
}

/// The page header reads "Country - Project Title"; the title is the part
/// after the first "- ".
fn page_title(doc: &Html) -> Result<String, ScrapeError> {
    let header = doc
        .select(&TITLE_SEL)
        .next()
        .ok_or(ScrapeError::MissingRequired("Project Title"))?;
    let full = element_text(header);
    let title = match full.split_once("- ") {
        Some((_, title)) => title.trim().to_string(),
        None => full,
    };
    Ok(title)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Html {
        let html = std::fs::read_to_string("tests/fixtures/afdb_project.html").unwrap();
        Html::parse_document(&html)
    }

    fn candidate() -> Candidate {
        Candidate {
            id: "P-KE-AAC-007".into(),
            country: "Kenya".into(),
            status: "Implementation".into(),
        }
    }

    #[test]
    fn full_page_transform() {
        let rec = transform(&fixture(), &candidate()).unwrap();
        assert_eq!(rec.ifi, IFI_NAME);
        assert_eq!(rec.title, "Smallholder Irrigation Modernization Project");
        assert_eq!(rec.status, "Implementation");
        assert_eq!(rec.commitment_usd, Some(12_500_000.0 * UA_TO_USD));
        assert_eq!(rec.approval_date.as_deref(), Some("2019-05-12"));
        assert_eq!(rec.closing_date.as_deref(), Some("2024-06-30"));
        assert_eq!(rec.duration_years, Some(5.14));
        assert_eq!(rec.primary_sector, "Agriculture");
        assert_eq!(rec.contact, "Jane Achieng");
        assert_eq!(rec.contact_details, "j.achieng@afdb.org");
        assert!(rec.description.starts_with("Modernize smallholder irrigation"));
        assert!(rec.description.contains('\n'));
        assert_eq!(rec.extra("Source of Financing"), "African Development Fund");
        assert_eq!(rec.extra("Sovereign"), "Sovereign");
        assert_eq!(rec.extra("DAC Sector Code"), "31140");
    }

    #[test]
    fn malformed_commitment_drops_the_record() {
        let doc = Html::parse_document(
            "<html><body><h2 class=\"title\">Kenya - Broken Project</h2>\
             <table><tr><th>Commitment</th><td>U.A. twelve million</td></tr></table>\
             </body></html>",
        );
        let err = transform(&doc, &candidate()).unwrap_err();
        assert!(matches!(err, ScrapeError::MalformedValue { .. }));
    }

    #[test]
    fn missing_closing_date_means_null_duration() {
        let doc = Html::parse_document(
            "<html><body><h2 class=\"title\">Kenya - Open-Ended Project</h2>\
             <table><tr><th>Approval Date</th><td>12/05/2019</td></tr></table>\
             </body></html>",
        );
        let rec = transform(&doc, &candidate()).unwrap();
        assert_eq!(rec.approval_date.as_deref(), Some("2019-05-12"));
        assert_eq!(rec.closing_date, None);
        assert_eq!(rec.duration_years, None);
    }
}
