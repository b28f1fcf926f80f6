use std::fmt;

/// Minimum digit count for a number to be considered usable stock.
pub const MIN_DIGITS: usize = 10;

/// A normalized phone number: digits only, at least [`MIN_DIGITS`] long.
///
/// Source pools store raw, messy strings; normalization strips every
/// non-digit character on read. Anything shorter than ten digits after
/// stripping is not a phone number and is excluded from stock entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Normalize a raw cell value. Returns `None` for entries that do not
    /// survive normalization; callers count only surviving numbers as stock.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() >= MIN_DIGITS {
            Some(Number(digits))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a whole raw pool read, dropping malformed rows.
pub fn normalize_pool<I, S>(raw: I) -> Vec<Number>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|s| Number::parse(s.as_ref()))
        .collect()
}
