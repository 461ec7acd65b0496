use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use std::str::FromStr;

use super::ListingError;

/// Format of the posted column. The site renders it without any zone.
pub const POSTED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Zone attached to posted dates.
///
/// The site renders times in the account's configured zone without saying
/// which one, so the caller decides. `Local` reads the process zone at parse
/// time; `Fixed` pins an offset and keeps results reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostedZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl PostedZone {
    /// Attaches this zone to a wall-clock time.
    ///
    /// A time that occurs twice (DST fold) resolves to the earlier instant;
    /// a time skipped by a DST gap has no instant and yields `None`.
    pub fn localize(self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            PostedZone::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            PostedZone::Fixed(offset) => offset.from_local_datetime(naive).earliest(),
        }
    }
}

impl FromStr for PostedZone {
    type Err = chrono::ParseError;

    /// Accepts `local` (any case) or an offset such as `+09:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") {
            return Ok(PostedZone::Local);
        }
        s.parse::<FixedOffset>().map(PostedZone::Fixed)
    }
}

/// Parses a posted-date cell (`YYYY-MM-DD HH:MM`) and attaches `zone`.
pub fn parse_posted(
    text: &str,
    zone: PostedZone,
    row: usize,
) -> Result<DateTime<FixedOffset>, ListingError> {
    let fail = || ListingError::DateParse {
        text: text.to_string(),
        row,
    };
    let naive = NaiveDateTime::parse_from_str(text.trim(), POSTED_FORMAT).map_err(|_| fail())?;
    zone.localize(&naive).ok_or_else(fail)
}
