use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::{DisplayMode, ListingError};

static MODE_OPTIONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#dms option").expect("static selector"));

/// Reads the display mode from the page's mode selector (`#dms`).
///
/// The selected option is the one carrying a `selected` attribute. Anything
/// short of exactly one selected option with a known label is an
/// [`ListingError::UnknownLayout`]: rendering under a guessed mode would
/// silently produce wrong or empty output.
pub fn detect_mode(document: &Html) -> Result<DisplayMode, ListingError> {
    let mut selected = document
        .select(&MODE_OPTIONS)
        .filter(|option| option.value().attr("selected").is_some());

    let option = selected.next().ok_or(ListingError::UnknownLayout(None))?;
    if selected.next().is_some() {
        tracing::debug!("Mode selector has more than one selected option");
        return Err(ListingError::UnknownLayout(None));
    }

    let label: String = option.text().collect();
    DisplayMode::from_label(&label)
        .ok_or_else(|| ListingError::UnknownLayout(Some(label.trim().to_string())))
}
