//! Per-source country allow-lists.
//!
//! Each source spells country names its own way; the maps here translate
//! every known spelling to the one canonical name used across the merged
//! output. Lookup is exact-match — a spelling outside the map rejects the
//! record before any detail fetch.

use std::collections::BTreeMap;

/// Immutable raw-spelling -> canonical-name mapping for one source. Built
/// once at startup and passed explicitly to whoever filters or normalizes.
pub struct CountryMap {
    entries: BTreeMap<&'static str, &'static str>,
}

impl CountryMap {
    fn new(table: &[(&'static str, &'static str)]) -> Self {
        CountryMap {
            entries: table.iter().copied().collect(),
        }
    }

    /// Exact-match lookup of a raw source spelling. No fuzzy matching.
    pub fn normalize(&self, raw: &str) -> Option<&'static str> {
        self.entries.get(raw.trim()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// The canonical (value-side) names, deduplicated.
    pub fn canonical_values(&self) -> Vec<&'static str> {
        let mut values: Vec<&'static str> = self.entries.values().copied().collect();
        values.sort_unstable();
        values.dedup();
        values
    }
}

/// The canonical name set shared by the project-level sources.
const CANONICAL: &[&str] = &[
    "Angola",
    "Benin",
    "Botswana",
    "Burkina Faso",
    "Burundi",
    "Cameroon",
    "Cabo Verde",
    "Central African Republic",
    "Chad",
    "Comoros",
    "Côte d'Ivoire",
    "Democratic Republic of the Congo",
    "Equatorial Guinea",
    "Eritrea",
    "Eswatini",
    "Ethiopia",
    "Gabon",
    "Gambia",
    "Ghana",
    "Guinea",
    "Guinea-Bissau",
    "Kenya",
    "Lesotho",
    "Liberia",
    "Madagascar",
    "Malawi",
    "Mali",
    "Mauritania",
    "Mauritius",
    "Mozambique",
    "Namibia",
    "Niger",
    "Nigeria",
    "Republic of the Congo",
    "Rwanda",
    "Sao Tome and Principe",
    "Senegal",
    "Seychelles",
    "Sierra Leone",
    "South Africa",
    "South Sudan",
    "Tanzania",
    "Togo",
    "Uganda",
    "Zambia",
    "Zimbabwe",
];

/// AfDB's portal already uses the canonical spellings.
pub fn afdb() -> CountryMap {
    CountryMap::new(
        &CANONICAL
            .iter()
            .map(|c| (*c, *c))
            .collect::<Vec<_>>(),
    )
}

/// IFAD spellings, including the portal's variant forms.
pub fn ifad() -> CountryMap {
    let mut table: Vec<(&'static str, &'static str)> =
        CANONICAL.iter().map(|c| (*c, *c)).collect();
    table.extend_from_slice(&[
        ("Gambia (The)", "Gambia"),
        ("United Republic of Tanzania", "Tanzania"),
        ("Republic of Congo", "Republic of the Congo"),
    ]);
    CountryMap::new(&table)
}

/// World Bank long-form state names, plus the region entries its listing
/// uses for multi-country projects.
pub fn wbp() -> CountryMap {
    CountryMap::new(&[
        ("Republic of Angola", "Angola"),
        ("Republic of Benin", "Benin"),
        ("Republic of Botswana", "Botswana"),
        ("Burkina Faso", "Burkina Faso"),
        ("Republic of Burundi", "Burundi"),
        ("Republic of Cameroon", "Cameroon"),
        ("Republic of Cabo Verde", "Cabo Verde"),
        ("Central African Republic", "Central African Republic"),
        ("Republic of Chad", "Chad"),
        ("Union of the Comoros", "Comoros"),
        ("Republic of Cote d'Ivoire", "Côte d'Ivoire"),
        ("Democratic Republic of the Congo", "Democratic Republic of the Congo"),
        ("Republic of Equatorial Guinea", "Equatorial Guinea"),
        ("State of Eritrea", "Eritrea"),
        ("Kingdom of Eswatini", "Eswatini"),
        ("Federal Democratic Republic of Ethiopia", "Ethiopia"),
        ("Gabonese Republic", "Gabon"),
        ("Republic of The Gambia", "Gambia"),
        ("Republic of Ghana", "Ghana"),
        ("Republic of Guinea", "Guinea"),
        ("Republic of Guinea-Bissau", "Guinea-Bissau"),
        ("Republic of Kenya", "Kenya"),
        ("Kingdom of Lesotho", "Lesotho"),
        ("Republic of Liberia", "Liberia"),
        ("Republic of Madagascar", "Madagascar"),
        ("Republic of Malawi", "Malawi"),
        ("Republic of Mali", "Mali"),
        ("Islamic Republic of Mauritania", "Mauritania"),
        ("Republic of Mauritius", "Mauritius"),
        ("Republic of Mozambique", "Mozambique"),
        ("Republic of Namibia", "Namibia"),
        ("Republic of Niger", "Niger"),
        ("Federal Republic of Nigeria", "Nigeria"),
        ("Republic of Congo", "Republic of the Congo"),
        ("Republic of Rwanda", "Rwanda"),
        ("Democratic Republic of Sao Tome and Pricipe", "Sao Tome and Principe"),
        ("Republic of Senegal", "Senegal"),
        ("Republic of Seychelles", "Seychelles"),
        ("Republic of Sierra Leone", "Sierra Leone"),
        ("Republic of South Africa", "South Africa"),
        ("Republic of South Sudan", "South Sudan"),
        ("United Republic of Tanzania", "Tanzania"),
        ("Republic of Togo", "Togo"),
        ("Republic of Uganda", "Uganda"),
        ("Republic of Zambia", "Zambia"),
        ("Republic of Zimbabwe", "Zimbabwe"),
        // Region entries; multi-region rows are re-checked against the
        // project description before they are kept.
        ("Eastern Africa", "Eastern Africa"),
        ("Western Africa", "Western Africa"),
        ("Central Africa", "Central Africa"),
        ("Southern Africa", "Southern Africa"),
        ("Multi-Region", "Multinational"),
    ])
}

/// WDI keys by ISO-3166 alpha-3 code; its name set is its own and never
/// enters the project-level merge.
pub fn wdi() -> CountryMap {
    CountryMap::new(&[
        ("AGO", "Angola"),
        ("BEN", "Benin"),
        ("BWA", "Botswana"),
        ("BFA", "Burkina Faso"),
        ("BDI", "Burundi"),
        ("CMR", "Cameroon"),
        ("CPV", "Cape Verde"),
        ("CAF", "Central African Republic"),
        ("TCD", "Chad"),
        ("COM", "Comoros"),
        ("COD", "DRC"),
        ("COG", "Republic of Congo"),
        ("CIV", "Cote d'Ivoire"),
        ("GNQ", "Equatorial Guinea"),
        ("ERI", "Eritrea"),
        ("SWZ", "Eswatini"),
        ("ETH", "Ethiopia"),
        ("GAB", "Gabon"),
        ("GMB", "Gambia"),
        ("GHA", "Ghana"),
        ("GIN", "Guinea"),
        ("GNB", "Guinea-Bissau"),
        ("KEN", "Kenya"),
        ("LSO", "Lesotho"),
        ("LBR", "Liberia"),
        ("MDG", "Madagascar"),
        ("MWI", "Malawi"),
        ("MLI", "Mali"),
        ("MRT", "Mauritania"),
        ("MUS", "Mauritius"),
        ("MOZ", "Mozambique"),
        ("NAM", "Namibia"),
        ("NER", "Niger"),
        ("NGA", "Nigeria"),
        ("RWA", "Rwanda"),
        ("STP", "Sao Tome and Principe"),
        ("SEN", "Senegal"),
        ("SYC", "Seychelles"),
        ("SLE", "Sierra Leone"),
        ("ZAF", "South Africa"),
        ("SSD", "South Sudan"),
        ("TZA", "Tanzania"),
        ("TGO", "Togo"),
        ("UGA", "Uganda"),
        ("ZMB", "Zambia"),
        ("ZWE", "Zimbabwe"),
    ])
}

// ── Tests ──
