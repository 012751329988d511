use thiserror::Error;

/// Failures scoped to one record or identifier. None of these abort a
/// collection run: malformed values drop the record, exhausted fetches skip
/// the identifier, listing errors surface before any fetching starts.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A value was found but does not parse as expected. Numeric and date
    /// derivations are all-or-nothing per record, so this drops the record.
    #[error("malformed {field}: {value:?}")]
    MalformedValue { field: &'static str, value: String },

    /// A required identifying field could not be obtained.
    #[error("required field {0:?} missing")]
    MissingRequired(&'static str),

    /// The fetch collaborator gave up after its retry budget.
    #[error("fetch exhausted after {attempts} attempts: {url}")]
    FetchExhausted { url: String, attempts: u32 },

    /// A listing input could not be read or lacks an expected column.
    #[error("listing error: {0}")]
    Listing(String),
}

impl ScrapeError {
    pub fn malformed(field: &'static str, value: impl Into<String>) -> Self {
        ScrapeError::MalformedValue {
            field,
            value: value.into(),
        }
    }
}
