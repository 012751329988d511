//! Value derivations shared by the per-source transformers.

use std::sync::LazyLock;

use chrono::NaiveDate;
use deunicode::deunicode;
use itertools::Itertools;
use regex::Regex;

use crate::error::ScrapeError;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+\.?[0-9]*").unwrap());

/// Date formats the portals emit. The World Bank export appends a time
/// suffix to ISO dates; that is handled separately.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%b-%Y", "%B %d, %Y", "%d %B %Y"];

/// Fold a string to a plain-ASCII representation, trimmed. Every free-text
/// field gets this except Country, whose canonical spellings keep their
/// diacritics.
pub fn ascii_fold(s: &str) -> String {
    deunicode(s.trim()).trim().to_string()
}

/// Parse a free-text amount like "US$ 52.49 million" into dollars.
pub fn parse_usd_millions(field: &'static str, raw: &str) -> Result<f64, ScrapeError> {
    let m = NUMBER_RE
        .find(raw)
        .ok_or_else(|| ScrapeError::malformed(field, raw))?;
    let n: f64 = m
        .as_str()
        .parse()
        .map_err(|_| ScrapeError::malformed(field, raw))?;
    Ok(n * 1_000_000.0)
}

/// Parse a digit-grouped amount like "12,500,000".
pub fn parse_grouped_number(field: &'static str, raw: &str) -> Result<f64, ScrapeError> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    digits
        .parse()
        .map_err(|_| ScrapeError::malformed(field, raw))
}

/// Parse a "2021 - 2024" duration range into (start, end) years.
pub fn parse_year_range(field: &'static str, raw: &str) -> Result<(i32, i32), ScrapeError> {
    let (a, b) = raw
        .split_once('-')
        .ok_or_else(|| ScrapeError::malformed(field, raw))?;
    let start = a
        .trim()
        .parse()
        .map_err(|_| ScrapeError::malformed(field, raw))?;
    let end = b
        .trim()
        .parse()
        .map_err(|_| ScrapeError::malformed(field, raw))?;
    Ok((start, end))
}

/// Parse a date in any of the known portal formats. Empty input is a
/// legitimately unknown date; non-empty unparseable input is malformed.
pub fn parse_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, ScrapeError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "N/A" {
        return Ok(None);
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(Some(d));
        }
    }
    if let Some((head, _)) = raw.split_once('T') {
        if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
            return Ok(Some(d));
        }
    }
    Err(ScrapeError::malformed(field, raw))
}

/// Project duration in years, rounded to 2 decimals.
pub fn duration_years(approval: NaiveDate, closing: NaiveDate) -> f64 {
    let days = (closing - approval).num_days() as f64;
    (days / 365.25 * 100.0).round() / 100.0
}

/// Join secondary sector/theme fields with "; ", dropping blanks. All-blank
/// input yields None, not an empty string.
pub fn join_sectors<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let joined = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .join("; ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Title-case a name: first letter of each word upper, rest lower.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .join(" ")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_millions() {
        let v = parse_usd_millions("IFAD Financing", "US$ 52.49 million").unwrap();
        assert_eq!(v, 52_490_000.0);
        let v = parse_usd_millions("IFAD Financing", "US$ 7 million").unwrap();
        assert_eq!(v, 7_000_000.0);
        assert!(parse_usd_millions("IFAD Financing", "to be determined").is_err());
    }

    #[test]
    fn grouped_number() {
        assert_eq!(parse_grouped_number("Commitment", "12,500,000").unwrap(), 12_500_000.0);
        assert_eq!(parse_grouped_number("Commitment", "900000").unwrap(), 900_000.0);
        assert!(parse_grouped_number("Commitment", "n/a").is_err());
    }

    #[test]
    fn year_range() {
        assert_eq!(parse_year_range("Duration", "2021 - 2024").unwrap(), (2021, 2024));
        assert!(parse_year_range("Duration", "ongoing").is_err());
    }

    #[test]
    fn dates() {
        let d = parse_date("Approval Date", "14/12/2021").unwrap().unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 12, 14).unwrap());
        let d = parse_date("Closing Date", "2024-06-30T00:00:00Z").unwrap().unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(parse_date("Closing Date", "").unwrap(), None);
        assert_eq!(parse_date("Closing Date", "N/A").unwrap(), None);
        assert!(parse_date("Closing Date", "sometime soon").is_err());
    }

    #[test]
    fn duration_three_years() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let c = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(duration_years(a, c), 3.0);
    }

    #[test]
    fn sector_consolidation() {
        let joined = join_sectors([None, Some("Health"), None, Some("Education")]);
        assert_eq!(joined.as_deref(), Some("Health; Education"));
        assert_eq!(join_sectors([None, None]), None);
        assert_eq!(join_sectors([Some("  "), Some("")]), None);
    }

    #[test]
    fn fold_is_idempotent() {
        let once = ascii_fold("Côte d'Ivoire  ");
        assert_eq!(once, "Cote d'Ivoire");
        assert_eq!(ascii_fold(&once), once);
    }

    #[test]
    fn title_cases_names() {
        assert_eq!(title_case("JANE ACHIENG"), "Jane Achieng");
        assert_eq!(title_case("jean-pierre kouassi"), "Jean-pierre Kouassi");
    }
}
