//! Calendar payload for Date, Time and TimeStamp attributes.

use std::fmt;

use crate::model::AttributeKind;
use crate::util::datetime::{self, DateTimeParts};

/// Smallest astronomical year the wire can carry (32767 BC).
pub const MIN_YEAR: i32 = 1 - i16::MAX as i32;

/// Largest year the wire can carry.
pub const MAX_YEAR: i32 = i16::MAX as i32;

/// A proleptic Gregorian date and time with millisecond resolution.
///
/// Which fields are meaningful depends on the attribute kind: Date keeps
/// only the date, Time keeps only the clock on 1970-01-01, TimeStamp keeps
/// both. [`Timestamp::normalized_for`] applies that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    parts: DateTimeParts,
    zone_id: Option<i16>,
}

impl Timestamp {
    /// Builds a timestamp from calendar fields. Returns `None` when a field
    /// is out of range or the year cannot be written.
    pub fn from_parts(parts: DateTimeParts) -> Option<Timestamp> {
        (parts.is_valid() && (MIN_YEAR..=MAX_YEAR).contains(&parts.year)).then_some(Timestamp {
            parts,
            zone_id: None,
        })
    }

    /// Builds a timestamp from a date and a clock time.
    pub fn new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millis: u16,
    ) -> Option<Timestamp> {
        Timestamp::from_parts(DateTimeParts {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millis,
        })
    }

    /// A date at midnight.
    pub fn date(year: i32, month: u8, day: u8) -> Option<Timestamp> {
        Timestamp::new(year, month, day, 0, 0, 0, 0)
    }

    /// A clock time on 1970-01-01.
    pub fn time(hour: u8, minute: u8, second: u8, millis: u16) -> Option<Timestamp> {
        Timestamp::new(1970, 1, 1, hour, minute, second, millis)
    }

    /// Interprets `seconds` as seconds since the Unix epoch, in UTC.
    pub fn from_epoch_seconds(seconds: i64) -> Option<Timestamp> {
        let millis = seconds.checked_mul(1000)?;
        Timestamp::from_parts(DateTimeParts::from_epoch_millis(millis))
    }

    /// Parses `text` with a date-time pattern, falling back to RFC 3339.
    pub fn parse(text: &str, pattern: &str) -> Option<Timestamp> {
        datetime::parse_datetime(text, pattern)
            .ok()
            .and_then(Timestamp::from_parts)
    }

    /// Attaches a server time-zone id.
    pub fn with_zone_id(mut self, zone_id: Option<i16>) -> Timestamp {
        self.zone_id = zone_id;
        self
    }

    /// Drops the fields `kind` does not carry.
    pub fn normalized_for(self, kind: AttributeKind) -> Timestamp {
        let p = self.parts;
        let parts = match kind {
            AttributeKind::Date => DateTimeParts {
                year: p.year,
                month: p.month,
                day: p.day,
                ..DateTimeParts::EPOCH
            },
            AttributeKind::Time => DateTimeParts {
                hour: p.hour,
                minute: p.minute,
                second: p.second,
                millis: p.millis,
                ..DateTimeParts::EPOCH
            },
            _ => p,
        };
        Timestamp { parts, ..self }
    }

    pub fn parts(&self) -> &DateTimeParts {
        &self.parts
    }

    pub fn year(&self) -> i32 {
        self.parts.year
    }

    pub fn month(&self) -> u8 {
        self.parts.month
    }

    pub fn day(&self) -> u8 {
        self.parts.day
    }

    pub fn hour(&self) -> u8 {
        self.parts.hour
    }

    pub fn minute(&self) -> u8 {
        self.parts.minute
    }

    pub fn second(&self) -> u8 {
        self.parts.second
    }

    pub fn millis(&self) -> u16 {
        self.parts.millis
    }

    pub fn zone_id(&self) -> Option<i16> {
        self.zone_id
    }

    /// Returns `(is_ad, year_of_era)` as written on the wire.
    pub fn era_year(&self) -> (bool, i16) {
        let year = self.parts.year;
        if year >= 1 {
            (true, year as i16)
        } else {
            (false, (1 - year) as i16)
        }
    }

    /// Milliseconds since the Unix epoch, treating the fields as UTC.
    pub fn epoch_millis(&self) -> i64 {
        self.parts.to_epoch_millis()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&datetime::format_datetime_rfc3339(&self.parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let ts = Timestamp::new(2021, 7, 4, 13, 5, 9, 250).unwrap();

        let date = ts.normalized_for(AttributeKind::Date);
        assert_eq!(date, Timestamp::date(2021, 7, 4).unwrap());

        let time = ts.normalized_for(AttributeKind::Time);
        assert_eq!(time, Timestamp::time(13, 5, 9, 250).unwrap());

        assert_eq!(ts.normalized_for(AttributeKind::TimeStamp), ts);
    }

    #[test]
    fn test_era_year() {
        assert_eq!(Timestamp::date(2021, 1, 1).unwrap().era_year(), (true, 2021));
        // Astronomical year 0 is 1 BC.
        assert_eq!(Timestamp::date(0, 1, 1).unwrap().era_year(), (false, 1));
        assert_eq!(Timestamp::date(-43, 3, 15).unwrap().era_year(), (false, 44));
    }

    #[test]
    fn test_range_checks() {
        assert!(Timestamp::date(2021, 2, 29).is_none());
        assert!(Timestamp::new(2021, 1, 1, 24, 0, 0, 0).is_none());
        assert!(Timestamp::date(MAX_YEAR + 1, 1, 1).is_none());
        assert!(Timestamp::date(MIN_YEAR, 1, 1).is_some());
        assert!(Timestamp::from_epoch_seconds(i64::MAX).is_none());
    }

    #[test]
    fn test_epoch_seconds() {
        let ts = Timestamp::from_epoch_seconds(86_400 + 61).unwrap();
        assert_eq!(ts, Timestamp::new(1970, 1, 2, 0, 1, 1, 0).unwrap());
        assert_eq!(ts.epoch_millis(), 86_461_000);
    }

    #[test]
    fn test_parse_and_display() {
        let ts = Timestamp::parse("12-25-2020 08:30:00", "%m-%d-%Y %H:%M:%S").unwrap();
        assert_eq!(ts.to_string(), "2020-12-25T08:30:00Z");
        assert!(Timestamp::parse("not a date", "%m-%d-%Y %H:%M:%S").is_none());
    }
}
