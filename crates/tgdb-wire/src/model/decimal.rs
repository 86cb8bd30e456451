//! Decimal values carried as text.
//!
//! The server stores Number attributes as decimal strings together with a
//! precision and scale. Those two figures are derived from the text: the
//! scale is the number of digits after the point and the precision is the
//! total number of digits. The sign is not a digit.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when text is not a plain decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal {text:?}")]
pub struct ParseDecimalError {
    pub text: String,
}

/// A decimal number in plain (non-exponent) notation.
///
/// Equality is textual: `1.50` and `1.5` are different values because they
/// produce different precision and scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    text: String,
}

impl Decimal {
    /// Parses `[+-]digits[.digits]` or `[+-].digits`, optionally followed
    /// by an exponent (`e-3`), which is expanded into plain notation.
    pub fn parse(text: &str) -> Result<Decimal, ParseDecimalError> {
        let invalid = || ParseDecimalError {
            text: text.to_string(),
        };
        let trimmed = text.trim();

        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => {
                let exp: i32 = unsigned[pos + 1..].parse().map_err(|_| invalid())?;
                (&unsigned[..pos], exp)
            }
            None => (unsigned, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.len() + frac_part.len() == 0 || !all_digits(int_part) || !all_digits(frac_part)
        {
            return Err(invalid());
        }
        if exponent.unsigned_abs() > 4096 {
            return Err(invalid());
        }

        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let body = if exponent == 0 {
            if frac_part.is_empty() && !mantissa.ends_with('.') {
                int_part.to_string()
            } else {
                format!("{int_part}.{frac_part}")
            }
        } else {
            shift_point(int_part, frac_part, exponent)
        };

        let text = if negative { format!("-{body}") } else { body };
        Ok(Decimal { text })
    }

    /// Formats a float with six fractional digits. Returns `None` for NaN
    /// and the infinities.
    pub fn from_f64(value: f64) -> Option<Decimal> {
        value.is_finite().then(|| Decimal {
            text: format!("{value:.6}"),
        })
    }

    /// Returns the decimal text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of digits after the decimal point.
    pub fn scale(&self) -> i16 {
        match self.text.split_once('.') {
            Some((_, frac)) => count_digits(frac),
            None => 0,
        }
    }

    /// Total number of digits.
    pub fn precision(&self) -> i16 {
        count_digits(&self.text)
    }

    /// Approximate value as a float.
    pub fn to_f64(&self) -> f64 {
        self.text.parse().unwrap_or(f64::NAN)
    }
}

fn count_digits(s: &str) -> i16 {
    let n = s.bytes().filter(u8::is_ascii_digit).count();
    i16::try_from(n).unwrap_or(i16::MAX)
}

/// Moves the decimal point of `int_part.frac_part` by `exponent` places.
fn shift_point(int_part: &str, frac_part: &str, exponent: i32) -> String {
    let digits: String = [int_part, frac_part].concat();
    let point = int_part.len() as i64 + i64::from(exponent);

    let (int_digits, frac_digits) = if point <= 0 {
        (
            "0".to_string(),
            format!("{}{}", "0".repeat(point.unsigned_abs() as usize), digits),
        )
    } else if point as usize >= digits.len() {
        (
            format!("{}{}", digits, "0".repeat(point as usize - digits.len())),
            String::new(),
        )
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    };

    let int_digits = int_digits.trim_start_matches('0');
    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    if frac_digits.is_empty() {
        int_digits.to_string()
    } else {
        format!("{int_digits}.{frac_digits}")
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::parse(s)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal {
            text: value.to_string(),
        }
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Decimal::from(i64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_from_text() {
        let d = Decimal::parse("123.45").unwrap();
        assert_eq!((d.precision(), d.scale()), (5, 2));

        let d = Decimal::parse("1.5").unwrap();
        assert_eq!((d.precision(), d.scale()), (2, 1));

        let d = Decimal::parse("-42").unwrap();
        assert_eq!((d.precision(), d.scale()), (2, 0));
        assert_eq!(d.as_str(), "-42");
    }

    #[test]
    fn test_parse_normalizes_sign_and_leading_point() {
        assert_eq!(Decimal::parse("+7.25").unwrap().as_str(), "7.25");
        assert_eq!(Decimal::parse(".5").unwrap().as_str(), "0.5");
        assert_eq!(Decimal::parse("3.").unwrap().as_str(), "3.");
        assert_eq!(Decimal::parse("3.").unwrap().scale(), 0);
    }

    #[test]
    fn test_exponent_expansion() {
        assert_eq!(Decimal::parse("1.5e3").unwrap().as_str(), "1500");
        assert_eq!(Decimal::parse("1.5E-3").unwrap().as_str(), "0.0015");
        assert_eq!(Decimal::parse("-25e-1").unwrap().as_str(), "-2.5");
        assert_eq!(Decimal::parse("12.345e1").unwrap().as_str(), "123.45");
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in ["", "-", ".", "1.2.3", "abc", "1e", "1e99999", "١٢٣"] {
            assert!(Decimal::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_from_numbers() {
        assert_eq!(Decimal::from(-17i64).as_str(), "-17");
        assert_eq!(Decimal::from_f64(2.5).unwrap().as_str(), "2.500000");
        assert_eq!(Decimal::from_f64(2.5).unwrap().scale(), 6);
        assert!(Decimal::from_f64(f64::NAN).is_none());
        assert!(Decimal::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_textual_equality() {
        assert_ne!(Decimal::parse("1.50").unwrap(), Decimal::parse("1.5").unwrap());
        assert_eq!(Decimal::parse("1.5").unwrap(), "1.5".parse().unwrap());
    }
}
