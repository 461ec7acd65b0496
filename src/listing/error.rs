use thiserror::Error;

/// Errors raised while turning a listing page into gallery records.
///
/// None of these are retried here. A login page or an error page from the
/// site shows up as [`ListingError::UnknownLayout`], since it has no
/// display-mode selector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// The display-mode selector is missing, has no single selected option,
    /// or the selected label is not a known mode.
    #[error("Unknown listing layout{}", label_suffix(.0))]
    UnknownLayout(Option<String>),

    /// A required element is absent from a row.
    #[error("Missing {field} in row {row}")]
    MissingField { field: &'static str, row: usize },

    /// A required element matched more than once, so there is no single
    /// value to take.
    #[error("Ambiguous {field} in row {row}: matched more than one element")]
    AmbiguousField { field: &'static str, row: usize },

    /// The page holds more than one listing container.
    #[error("Ambiguous listing: {selector} matched more than one element")]
    AmbiguousListing { selector: &'static str },

    /// Posted date is not in `YYYY-MM-DD HH:MM` form, or does not exist in
    /// the configured zone.
    #[error("Unparseable posted date {text:?} in row {row}")]
    DateParse { text: String, row: usize },

    /// Link or thumbnail does not resolve to an http(s) URL.
    #[error("Invalid URL {value:?} in row {row}")]
    InvalidUrl { value: String, row: usize },
}

fn label_suffix(label: &Option<String>) -> String {
    match label {
        Some(label) => format!(": {label:?}"),
        None => String::new(),
    }
}

impl ListingError {
    /// Row the error was raised for, if it is row-scoped.
    pub fn row(&self) -> Option<usize> {
        match self {
            ListingError::UnknownLayout(_) | ListingError::AmbiguousListing { .. } => None,
            ListingError::MissingField { row, .. }
            | ListingError::AmbiguousField { row, .. }
            | ListingError::DateParse { row, .. }
            | ListingError::InvalidUrl { row, .. } => Some(*row),
        }
    }
}
