//! Fixed-format validation of two-line element sets
//!
//! Lines are checked column by column before they reach the SGP4 model so a
//! bad record is rejected with a precise reason instead of an opaque model
//! error.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::InvalidRecordError;

/// Every element line is exactly this many columns
pub const LINE_LENGTH: usize = 69;

/// Parsed orbital parameters of one element set
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSet {
    /// Catalog number as written (may be Alpha-5)
    pub catalog_number: String,
    pub epoch: DateTime<Utc>,
    /// First derivative of mean motion / 2 (rev/day²)
    pub mean_motion_dot: f64,
    /// Drag term (1 / Earth radii)
    pub bstar: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Revolutions per day
    pub mean_motion: f64,
}

impl ElementSet {
    /// Validate and parse both lines.
    ///
    /// Trailing whitespace (including `\r` from files with CRLF endings) is
    /// ignored; everything else must match the fixed layout.
    pub fn parse(line1: &str, line2: &str) -> Result<Self, InvalidRecordError> {
        let l1 = check_line(line1, 1)?;
        let l2 = check_line(line2, 2)?;

        let catalog1 = l1[2..7].trim();
        let catalog2 = l2[2..7].trim();
        if catalog1 != catalog2 {
            return Err(InvalidRecordError::CatalogMismatch {
                line1: catalog1.to_string(),
                line2: catalog2.to_string(),
            });
        }

        let epoch_year = parse_field(l1, 1, 18..20, "epoch year")? as i32;
        let epoch_day = parse_field(l1, 1, 20..32, "epoch day")?;
        let epoch = epoch_from_year_day(epoch_year, epoch_day).ok_or_else(|| {
            InvalidRecordError::Field {
                line: 1,
                field: "epoch day",
                value: l1[20..32].to_string(),
            }
        })?;

        let mean_motion_dot = parse_field(l1, 1, 33..43, "mean motion derivative")?;
        let bstar = parse_implied_decimal(l1, 1, 53..61, "bstar")?;

        let inclination_deg = parse_field(l2, 2, 8..16, "inclination")?;
        let raan_deg = parse_field(l2, 2, 17..25, "right ascension")?;
        let eccentricity = parse_eccentricity(l2)?;
        let arg_perigee_deg = parse_field(l2, 2, 34..42, "argument of perigee")?;
        let mean_anomaly_deg = parse_field(l2, 2, 43..51, "mean anomaly")?;
        let mean_motion = parse_field(l2, 2, 52..63, "mean motion")?;

        if !(0.0..1.0).contains(&eccentricity) {
            return Err(InvalidRecordError::Eccentricity(eccentricity));
        }
        if mean_motion <= 0.0 {
            return Err(InvalidRecordError::MeanMotion(mean_motion));
        }

        Ok(Self {
            catalog_number: catalog1.to_string(),
            epoch,
            mean_motion_dot,
            bstar,
            inclination_deg,
            raan_deg,
            eccentricity,
            arg_perigee_deg,
            mean_anomaly_deg,
            mean_motion,
        })
    }

    /// Age of the element set at `at`, in days (negative before epoch)
    pub fn age_days(&self, at: DateTime<Utc>) -> f64 {
        (at - self.epoch).num_milliseconds() as f64 / 86_400_000.0
    }
}

/// Modulo-10 checksum over the first 68 columns: digits count at face value,
/// minus signs count as one, everything else is ignored.
pub fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

fn check_line(raw: &str, number: u8) -> Result<&str, InvalidRecordError> {
    let line = raw.trim_end();

    if !line.is_ascii() {
        return Err(InvalidRecordError::NonAscii { line: number });
    }
    if line.len() != LINE_LENGTH {
        return Err(InvalidRecordError::LineLength {
            line: number,
            actual: line.len(),
            expected: LINE_LENGTH,
        });
    }

    let first = line.as_bytes()[0] as char;
    if first != char::from(b'0' + number) {
        return Err(InvalidRecordError::LineNumber {
            line: number,
            found: first,
        });
    }

    let check = line.as_bytes()[LINE_LENGTH - 1] as char;
    let found = check
        .to_digit(10)
        .ok_or(InvalidRecordError::ChecksumNotNumeric {
            line: number,
            found: check,
        })?;

    let expected = checksum(line);
    if expected != found {
        return Err(InvalidRecordError::ChecksumMismatch {
            line: number,
            expected,
            found,
        });
    }

    Ok(line)
}

fn parse_field(
    line: &str,
    number: u8,
    cols: std::ops::Range<usize>,
    field: &'static str,
) -> Result<f64, InvalidRecordError> {
    let raw = &line[cols];
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InvalidRecordError::Field {
            line: number,
            field,
            value: raw.to_string(),
        })
}

/// Eccentricity is written without its leading `0.`
fn parse_eccentricity(line: &str) -> Result<f64, InvalidRecordError> {
    let raw = &line[26..33];
    let invalid = || InvalidRecordError::Field {
        line: 2,
        field: "eccentricity",
        value: raw.to_string(),
    };

    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    format!("0.{}", digits).parse::<f64>().map_err(|_| invalid())
}

/// Fields like ` 11606-4` mean `0.11606e-4`
fn parse_implied_decimal(
    line: &str,
    number: u8,
    cols: std::ops::Range<usize>,
    field: &'static str,
) -> Result<f64, InvalidRecordError> {
    let raw = &line[cols];
    let invalid = || InvalidRecordError::Field {
        line: number,
        field,
        value: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    let (sign, body) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };

    let split = body.rfind(['-', '+']).filter(|&i| i > 0);
    let (mantissa, exponent) = match split {
        Some(i) => (&body[..i], &body[i..]),
        None => (body, "0"),
    };

    if mantissa.is_empty() || !mantissa.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let mantissa: f64 = format!("0.{}", mantissa).parse().map_err(|_| invalid())?;
    let exponent: i32 = exponent.parse().map_err(|_| invalid())?;

    Ok(sign * mantissa * 10f64.powi(exponent))
}

fn epoch_from_year_day(two_digit_year: i32, day_of_year: f64) -> Option<DateTime<Utc>> {
    if !(1.0..367.0).contains(&day_of_year) {
        return None;
    }
    let year = if two_digit_year < 57 {
        2000 + two_digit_year
    } else {
        1900 + two_digit_year
    };
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let micros = ((day_of_year - 1.0) * 86_400_000_000.0).round() as i64;
    Some(start + Duration::microseconds(micros))
}
