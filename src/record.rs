//! The common project schema every source normalizes into.

use crate::text;

/// Common-schema column headers, in output order.
pub const COLUMNS: &[&str] = &[
    "IFI",
    "Project ID",
    "Project Title",
    "Country",
    "Status",
    "Commitment Amount (USD)",
    "Approval Date",
    "Closing Date",
    "Project Duration (years)",
    "Primary Sector",
    "Additional Sectors",
    "Description",
    "Project Contact",
    "Contact Details",
];

/// One normalized project. Dates are ISO-8601 strings validated during
/// transformation; IFAD's closing date is the bare year its duration range
/// ends on. `extras` carries the source's fixed extra columns in order.
#[derive(Debug, Clone, Default)]
pub struct ProjectRecord {
    pub ifi: &'static str,
    pub project_id: String,
    pub title: String,
    pub country: String,
    pub status: String,
    pub commitment_usd: Option<f64>,
    pub approval_date: Option<String>,
    pub closing_date: Option<String>,
    pub duration_years: Option<f64>,
    pub primary_sector: String,
    pub additional_sectors: Option<String>,
    pub description: String,
    pub contact: String,
    pub contact_details: String,
    pub extras: Vec<(&'static str, String)>,
}

impl ProjectRecord {
    /// Cells in `COLUMNS` order; unknown values are empty strings.
    pub fn common_row(&self) -> Vec<String> {
        vec![
            self.ifi.to_string(),
            self.project_id.clone(),
            self.title.clone(),
            self.country.clone(),
            self.status.clone(),
            format_amount(self.commitment_usd),
            self.approval_date.clone().unwrap_or_default(),
            self.closing_date.clone().unwrap_or_default(),
            format_duration(self.duration_years),
            self.primary_sector.clone(),
            self.additional_sectors.clone().unwrap_or_default(),
            self.description.clone(),
            self.contact.clone(),
            self.contact_details.clone(),
        ]
    }

    /// The value of one of this source's extra columns.
    pub fn extra(&self, column: &str) -> &str {
        self.extras
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// Fold every free-text field to plain ASCII. Country is exempt so the
    /// canonical names keep their diacritics.
    pub fn fold_ascii(mut self) -> Self {
        self.project_id = text::ascii_fold(&self.project_id);
        self.title = text::ascii_fold(&self.title);
        self.status = text::ascii_fold(&self.status);
        self.primary_sector = text::ascii_fold(&self.primary_sector);
        self.additional_sectors = self.additional_sectors.map(|s| text::ascii_fold(&s));
        self.description = text::ascii_fold(&self.description);
        self.contact = text::ascii_fold(&self.contact);
        self.contact_details = text::ascii_fold(&self.contact_details);
        self.extras = self
            .extras
            .into_iter()
            .map(|(name, value)| (name, text::ascii_fold(&value)))
            .collect();
        self
    }
}

pub fn format_amount(v: Option<f64>) -> String {
    match v {
        Some(x) if x.fract() == 0.0 => format!("{:.0}", x),
        Some(x) => format!("{:.2}", x),
        None => String::new(),
    }
}

pub fn format_duration(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{:.2}", x),
        None => String::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_leaves_country_alone() {
        let rec = ProjectRecord {
            country: "Côte d'Ivoire".into(),
            title: "Coopérative café-cacao".into(),
            ..Default::default()
        }
        .fold_ascii();
        assert_eq!(rec.country, "Côte d'Ivoire");
        assert_eq!(rec.title, "Cooperative cafe-cacao");
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(Some(52_490_000.0)), "52490000");
        assert_eq!(format_amount(Some(1_234.5)), "1234.50");
        assert_eq!(format_amount(None), "");
    }

    #[test]
    fn row_shape_matches_columns() {
        let rec = ProjectRecord::default();
        assert_eq!(rec.common_row().len(), COLUMNS.len());
    }
}
