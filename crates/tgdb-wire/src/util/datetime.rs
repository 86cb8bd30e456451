//! Calendar arithmetic and date/time text parsing.
//!
//! Values are handled as broken-down proleptic Gregorian fields
//! ([`DateTimeParts`]) because that is what the wire carries. Text is parsed
//! with a small strftime-like pattern first and falls back to RFC 3339.

const MILLIS_PER_SECOND: i64 = 1000;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const MILLIS_PER_DAY: i64 = SECONDS_PER_DAY * MILLIS_PER_SECOND;

/// Error type for date/time parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl DateTimeParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

/// Broken-down calendar fields. `year` is astronomical (1 BC is year 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTimeParts {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millis: u16,
}

impl DateTimeParts {
    /// 1970-01-01T00:00:00.000
    pub const EPOCH: DateTimeParts = DateTimeParts {
        year: 1970,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        millis: 0,
    };

    /// Returns true if every field is within its calendar range.
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && self.day >= 1
            && u32::from(self.day) <= days_in_month(self.year, u32::from(self.month))
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
            && self.millis < 1000
    }

    /// Milliseconds since the Unix epoch, treating the fields as UTC.
    pub fn to_epoch_millis(&self) -> i64 {
        let days = date_to_days(self.year, u32::from(self.month), u32::from(self.day));
        let seconds = i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        days * MILLIS_PER_DAY + seconds * MILLIS_PER_SECOND + i64::from(self.millis)
    }

    /// Breaks milliseconds since the Unix epoch into UTC fields.
    pub fn from_epoch_millis(epoch_millis: i64) -> DateTimeParts {
        let days = epoch_millis.div_euclid(MILLIS_PER_DAY);
        let ms_of_day = epoch_millis.rem_euclid(MILLIS_PER_DAY);
        let (year, month, day) = days_to_date(days);
        let seconds = ms_of_day / MILLIS_PER_SECOND;
        DateTimeParts {
            year,
            month: month as u8,
            day: day as u8,
            hour: (seconds / 3600) as u8,
            minute: ((seconds / 60) % 60) as u8,
            second: (seconds % 60) as u8,
            millis: (ms_of_day % MILLIS_PER_SECOND) as u16,
        }
    }
}

/// Returns true if the given year is a leap year.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date (Howard Hinnant's
/// `days_from_civil`).
pub fn date_to_days(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let m = i64::from(month);
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`date_to_days`].
pub fn days_to_date(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}

// =====================
// Pattern parsing
// =====================

/// Consumes exactly `width` ASCII digits from the front of `input`.
fn take_digits(input: &mut &str, width: usize, what: &str) -> Result<u32, DateTimeParseError> {
    let digits = input
        .get(..width)
        .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| DateTimeParseError::new(format!("expected {width}-digit {what}")))?;
    *input = &input[width..];
    digits
        .parse()
        .map_err(|_| DateTimeParseError::new(format!("invalid {what}")))
}

/// Consumes an optionally signed year of one to four digits.
fn take_year(input: &mut &str) -> Result<i32, DateTimeParseError> {
    let negative = input.starts_with('-');
    if negative {
        *input = &input[1..];
    }
    let len = input
        .bytes()
        .take(4)
        .take_while(u8::is_ascii_digit)
        .count();
    if len == 0 {
        return Err(DateTimeParseError::new("expected year"));
    }
    let year = take_digits(input, len, "year")? as i32;
    Ok(if negative { -year } else { year })
}

/// Parses `text` against a strftime-like `pattern`.
///
/// Tokens: `%Y` year, `%m` month, `%d` day, `%H` hour, `%M` minute, `%S`
/// second (all two digits except the year), `%L` three-digit milliseconds and
/// `%%`. Other pattern characters must match literally. Fields the pattern
/// does not mention default to 1970-01-01T00:00:00.000.
pub fn parse_with_pattern(text: &str, pattern: &str) -> Result<DateTimeParts, DateTimeParseError> {
    let mut parts = DateTimeParts::EPOCH;
    let mut input = text;
    let mut tokens = pattern.chars();

    while let Some(c) = tokens.next() {
        if c != '%' {
            input = input
                .strip_prefix(c)
                .ok_or_else(|| DateTimeParseError::new(format!("expected {c:?} in {text:?}")))?;
            continue;
        }
        match tokens.next() {
            Some('Y') => parts.year = take_year(&mut input)?,
            Some('m') => parts.month = take_digits(&mut input, 2, "month")? as u8,
            Some('d') => parts.day = take_digits(&mut input, 2, "day")? as u8,
            Some('H') => parts.hour = take_digits(&mut input, 2, "hour")? as u8,
            Some('M') => parts.minute = take_digits(&mut input, 2, "minute")? as u8,
            Some('S') => parts.second = take_digits(&mut input, 2, "second")? as u8,
            Some('L') => parts.millis = take_digits(&mut input, 3, "milliseconds")? as u16,
            Some('%') => {
                input = input
                    .strip_prefix('%')
                    .ok_or_else(|| DateTimeParseError::new("expected '%'"))?;
            }
            other => {
                return Err(DateTimeParseError::new(format!(
                    "unsupported pattern token %{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }

    if !input.is_empty() {
        return Err(DateTimeParseError::new(format!(
            "trailing characters {input:?} in {text:?}"
        )));
    }
    if !parts.is_valid() {
        return Err(DateTimeParseError::new(format!("{text:?} is not a calendar date")));
    }
    Ok(parts)
}

/// Formats `parts` with the same pattern language as [`parse_with_pattern`].
pub fn format_with_pattern(parts: &DateTimeParts, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut tokens = pattern.chars();
    while let Some(c) = tokens.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match tokens.next() {
            Some('Y') if parts.year < 0 => out.push_str(&format!("-{:04}", -parts.year)),
            Some('Y') => out.push_str(&format!("{:04}", parts.year)),
            Some('m') => out.push_str(&format!("{:02}", parts.month)),
            Some('d') => out.push_str(&format!("{:02}", parts.day)),
            Some('H') => out.push_str(&format!("{:02}", parts.hour)),
            Some('M') => out.push_str(&format!("{:02}", parts.minute)),
            Some('S') => out.push_str(&format!("{:02}", parts.second)),
            Some('L') => out.push_str(&format!("{:03}", parts.millis)),
            Some(other) => out.push(other),
            None => out.push('%'),
        }
    }
    out
}

// =====================
// RFC 3339 fallback
// =====================

/// Parses a timezone offset (Z, +HH:MM, -HH:MM) into minutes east of UTC.
fn parse_timezone_offset(offset: &str) -> Result<i64, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }
    let invalid = || DateTimeParseError::new(format!("invalid timezone offset: {offset}"));

    let sign = match offset.as_bytes().first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Err(invalid()),
    };
    let mut rest = &offset[1..];
    let hours = take_digits(&mut rest, 2, "offset hours").map_err(|_| invalid())?;
    rest = rest.strip_prefix(':').ok_or_else(invalid)?;
    let minutes = take_digits(&mut rest, 2, "offset minutes").map_err(|_| invalid())?;
    if !rest.is_empty() || hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(sign * i64::from(hours * 60 + minutes))
}

/// Parses `HH:MM:SS[.fff...]`, returning the time fields and the unparsed
/// remainder.
fn parse_clock(text: &str) -> Result<(u8, u8, u8, u16, &str), DateTimeParseError> {
    let mut input = text;
    let hour = take_digits(&mut input, 2, "hour")?;
    input = input
        .strip_prefix(':')
        .ok_or_else(|| DateTimeParseError::new(format!("invalid time: {text}")))?;
    let minute = take_digits(&mut input, 2, "minute")?;
    input = input
        .strip_prefix(':')
        .ok_or_else(|| DateTimeParseError::new(format!("invalid time: {text}")))?;
    let second = take_digits(&mut input, 2, "second")?;

    let mut millis = 0u16;
    if let Some(frac) = input.strip_prefix('.') {
        let len = frac.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return Err(DateTimeParseError::new(format!("invalid fraction in: {text}")));
        }
        // Keep milliseconds, drop finer digits.
        let digits = &frac[..len];
        let padded = format!("{:0<3}", &digits[..len.min(3)]);
        millis = padded
            .parse()
            .map_err(|_| DateTimeParseError::new(format!("invalid fraction in: {text}")))?;
        input = &frac[len..];
    }

    if hour > 23 || minute > 59 || second > 59 {
        return Err(DateTimeParseError::new(format!("invalid time: {text}")));
    }
    Ok((hour as u8, minute as u8, second as u8, millis, input))
}

/// Parses `YYYY-MM-DD`, returning the date fields and the unparsed remainder.
fn parse_calendar_date(text: &str) -> Result<(i32, u8, u8, &str), DateTimeParseError> {
    let mut input = text;
    let year = take_digits(&mut input, 4, "year")? as i32;
    input = input
        .strip_prefix('-')
        .ok_or_else(|| DateTimeParseError::new(format!("invalid date: {text}")))?;
    let month = take_digits(&mut input, 2, "month")?;
    input = input
        .strip_prefix('-')
        .ok_or_else(|| DateTimeParseError::new(format!("invalid date: {text}")))?;
    let day = take_digits(&mut input, 2, "day")?;
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError::new(format!("invalid date: {text}")));
    }
    Ok((year, month as u8, day as u8, input))
}

/// Parses an RFC 3339 date-time. A non-zero offset is folded into the
/// fields, which are returned in UTC.
pub fn parse_datetime_rfc3339(text: &str) -> Result<DateTimeParts, DateTimeParseError> {
    let (year, month, day, rest) = parse_calendar_date(text)?;
    let rest = rest
        .strip_prefix(['T', 't', ' '])
        .ok_or_else(|| DateTimeParseError::new(format!("invalid date-time: {text}")))?;
    let (hour, minute, second, millis, offset) = parse_clock(rest)?;
    let offset_min = if offset.is_empty() {
        0
    } else {
        parse_timezone_offset(offset)?
    };

    let local = DateTimeParts {
        year,
        month,
        day,
        hour,
        minute,
        second,
        millis,
    };
    if offset_min == 0 {
        return Ok(local);
    }
    Ok(DateTimeParts::from_epoch_millis(
        local.to_epoch_millis() - offset_min * 60 * MILLIS_PER_SECOND,
    ))
}

/// Parses an RFC 3339 full-date (`YYYY-MM-DD`).
pub fn parse_date_rfc3339(text: &str) -> Result<DateTimeParts, DateTimeParseError> {
    let (year, month, day, rest) = parse_calendar_date(text)?;
    if !rest.is_empty() {
        return Err(DateTimeParseError::new(format!("invalid date: {text}")));
    }
    Ok(DateTimeParts {
        year,
        month,
        day,
        ..DateTimeParts::EPOCH
    })
}

/// Parses an RFC 3339 partial-time (`HH:MM:SS[.fff]`) onto 1970-01-01.
pub fn parse_time_rfc3339(text: &str) -> Result<DateTimeParts, DateTimeParseError> {
    let (hour, minute, second, millis, rest) = parse_clock(text)?;
    if !rest.is_empty() {
        return Err(DateTimeParseError::new(format!("invalid time: {text}")));
    }
    Ok(DateTimeParts {
        hour,
        minute,
        second,
        millis,
        ..DateTimeParts::EPOCH
    })
}

/// Parses `text` with `pattern`, falling back to the RFC 3339 date-time,
/// date and time forms in that order.
pub fn parse_datetime(text: &str, pattern: &str) -> Result<DateTimeParts, DateTimeParseError> {
    let text = text.trim();
    parse_with_pattern(text, pattern)
        .or_else(|first| {
            parse_datetime_rfc3339(text)
                .or_else(|_| parse_date_rfc3339(text))
                .or_else(|_| parse_time_rfc3339(text))
                .map_err(|_| first)
        })
}

/// Formats `parts` as an RFC 3339 date-time in UTC.
pub fn format_datetime_rfc3339(parts: &DateTimeParts) -> String {
    let fraction = if parts.millis == 0 {
        String::new()
    } else {
        format!(".{:03}", parts.millis)
    };
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}Z",
        parts.year, parts.month, parts.day, parts.hour, parts.minute, parts.second, fraction
    )
}
