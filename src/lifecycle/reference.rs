//! Human-readable incident references: `INC-<year>-<sequence>`.
//!
//! The sequence restarts at 1 every calendar year and is one more than the
//! highest sequence already used for the year of the incident's creation time.

pub const PREFIX: &str = "INC";

pub fn year_prefix(year: i32) -> String {
    format!("{}-{}-", PREFIX, year)
}

pub fn format_reference(year: i32, sequence: u32) -> String {
    format!("{}{:04}", year_prefix(year), sequence)
}

/// Sequence number of `reference` if it belongs to `year`.
pub fn parse_sequence(reference: &str, year: i32) -> Option<u32> {
    reference
        .strip_prefix(&year_prefix(year))
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
}

pub fn next_sequence<'a, I>(existing: I, year: i32) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|reference| parse_sequence(reference, year))
        .max()
        .map_or(1, |highest| highest + 1)
}
