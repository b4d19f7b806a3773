use crate::error::{Error, Result};
use chrono::{DateTime, Locale, NaiveDate, Utc};

const DISPLAY_FORMAT: &str = "%d %b %Y";

/// A publication timestamp exactly as the content API returned it.
///
/// Only this type can be formatted, so a display string never goes through
/// the formatter twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTimestamp(String);

impl RawTimestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// This timestamp in UTC.
    ///
    /// Accepts RFC 3339, the `+0000` offset form the API emits, and a bare
    /// date (taken as midnight UTC).
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        let s = self.0.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| Error::Date {
                input: self.0.clone(),
            })
    }
}

/// Renders timestamps as `dd MMM yyyy` in a fixed locale.
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    locale: Locale,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            locale: Locale::pt_BR,
        }
    }
}

impl DateFormatter {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Build a formatter from a POSIX-style locale name such as `pt_BR`.
    pub fn from_locale_name(name: &str) -> Result<Self> {
        let locale =
            Locale::try_from(name).map_err(|_| Error::UnknownLocale(name.to_string()))?;
        Ok(Self::new(locale))
    }

    pub fn format(&self, timestamp: &RawTimestamp) -> Result<String> {
        let date = timestamp.to_utc()?;
        Ok(date
            .format_localized(DISPLAY_FORMAT, self.locale)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pt_br() {
        let formatter = DateFormatter::default();
        let out = formatter
            .format(&RawTimestamp::new("2021-01-15T00:00:00Z"))
            .unwrap();
        assert_eq!(out, "15 jan 2021");
    }

    #[test]
    fn test_format_prismic_offset() {
        let formatter = DateFormatter::default();
        let out = formatter
            .format(&RawTimestamp::new("2021-03-25T19:25:28+0000"))
            .unwrap();
        assert_eq!(out, "25 mar 2021");
    }

    #[test]
    fn test_format_bare_date() {
        let formatter = DateFormatter::default();
        let out = formatter.format(&RawTimestamp::new("2021-12-05")).unwrap();
        assert_eq!(out, "05 dez 2021");
    }

    #[test]
    fn test_format_uses_utc_calendar_date() {
        let formatter = DateFormatter::default();
        let out = formatter
            .format(&RawTimestamp::new("2021-01-15T23:30:00-03:00"))
            .unwrap();
        assert_eq!(out, "16 jan 2021");
    }

    #[test]
    fn test_format_other_locale() {
        let formatter = DateFormatter::from_locale_name("en_US").unwrap();
        let out = formatter
            .format(&RawTimestamp::new("2021-01-15T00:00:00Z"))
            .unwrap();
        assert_eq!(out, "15 Jan 2021");
    }

    #[test]
    fn test_format_invalid() {
        let formatter = DateFormatter::default();
        let err = formatter
            .format(&RawTimestamp::new("15 jan 2021"))
            .unwrap_err();
        assert!(matches!(err, Error::Date { .. }));
    }

    #[test]
    fn test_unknown_locale() {
        assert!(matches!(
            DateFormatter::from_locale_name("xx_YY"),
            Err(Error::UnknownLocale(_))
        ));
    }
}
