//! ---
//! ems_section: "02-messaging-ipc-data-model"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "OpenADR 3.0 data model and wire codecs."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! ISO-8601 timestamps and durations as they appear on the wire.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::{ModelError, ModelResult};

/// Parse an RFC 3339 / ISO-8601 timestamp with offset, normalised to UTC.
pub fn parse_timestamp(text: &str) -> ModelResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| ModelError::InvalidValue {
            kind: "timestamp",
            detail: format!("{text:?}: {err}"),
        })
}

/// Format a timestamp the way the encoder emits it: UTC with a `Z` suffix and
/// millisecond precision, widening to micro/nanoseconds only when needed.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    let precision = if value.timestamp_subsec_nanos() % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else if value.timestamp_subsec_nanos() % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    };
    value.to_rfc3339_opts(precision, true)
}

/// ISO-8601 duration (`PnYnMnWnDTnHnMnS`), kept component-wise.
///
/// Calendar components have no fixed length, so `P1D` and `PT24H` are distinct
/// values; use [`IsoDuration::to_chrono`] for arithmetic on fixed-length ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IsoDuration {
    negative: bool,
    years: u32,
    months: u32,
    weeks: u32,
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: u64,
    nanos: u32,
}

impl IsoDuration {
    /// `PT0S`: instantaneous or unbounded, depending on the field it sits in.
    pub const ZERO: IsoDuration = IsoDuration {
        negative: false,
        years: 0,
        months: 0,
        weeks: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        nanos: 0,
    };

    /// Duration of whole hours.
    pub fn hours(hours: u32) -> Self {
        Self {
            hours,
            ..Self::ZERO
        }
    }

    /// Duration of whole minutes.
    pub fn minutes(minutes: u32) -> Self {
        Self {
            minutes,
            ..Self::ZERO
        }
    }

    /// Duration of whole seconds.
    pub fn seconds(seconds: u64) -> Self {
        Self {
            seconds,
            ..Self::ZERO
        }
    }

    /// Duration of whole days.
    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::ZERO
        }
    }

    /// Same duration with the sign flipped.
    pub fn negated(self) -> Self {
        Self {
            negative: !self.negative && !self.is_zero(),
            ..self
        }
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.weeks == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
            && self.nanos == 0
    }

    /// Whether the duration carries a leading minus sign.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Fixed-length equivalent; `None` when years or months are present or
    /// the total exceeds the range of [`chrono::Duration`].
    pub fn to_chrono(&self) -> Option<chrono::Duration> {
        use chrono::Duration;

        if self.years != 0 || self.months != 0 {
            return None;
        }
        let days = i64::from(self.weeks) * 7 + i64::from(self.days);
        let total = Duration::try_days(days)?
            .checked_add(&Duration::try_hours(i64::from(self.hours))?)?
            .checked_add(&Duration::try_minutes(i64::from(self.minutes))?)?
            .checked_add(&Duration::try_seconds(i64::try_from(self.seconds).ok()?)?)?
            .checked_add(&Duration::nanoseconds(i64::from(self.nanos)))?;
        Some(if self.is_negative() { -total } else { total })
    }

    /// Parse ISO-8601 duration text.
    pub fn parse(text: &str) -> ModelResult<Self> {
        DurationParser::new(text.trim()).parse().map_err(|detail| ModelError::InvalidValue {
            kind: "duration",
            detail: format!("{text:?}: {detail}"),
        })
    }
}

impl FromStr for IsoDuration {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        if self.is_negative() {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value != 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        if self.hours == 0 && self.minutes == 0 && self.seconds == 0 && self.nanos == 0 {
            return Ok(());
        }
        f.write_str("T")?;
        if self.hours != 0 {
            write!(f, "{}H", self.hours)?;
        }
        if self.minutes != 0 {
            write!(f, "{}M", self.minutes)?;
        }
        if self.seconds != 0 || self.nanos != 0 {
            write!(f, "{}", self.seconds)?;
            if self.nanos != 0 {
                let fraction = format!("{:09}", self.nanos);
                write!(f, ".{}", fraction.trim_end_matches('0'))?;
            }
            f.write_str("S")?;
        }
        Ok(())
    }
}

struct DurationParser<'a> {
    rest: &'a str,
}

impl<'a> DurationParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn parse(mut self) -> Result<IsoDuration, String> {
        let mut out = IsoDuration::ZERO;
        if let Some(stripped) = self.rest.strip_prefix('-') {
            out.negative = true;
            self.rest = stripped;
        } else if let Some(stripped) = self.rest.strip_prefix('+') {
            self.rest = stripped;
        }
        self.rest = self
            .rest
            .strip_prefix(|c: char| c == 'P' || c == 'p')
            .ok_or_else(|| "missing 'P' designator".to_owned())?;

        let mut components = 0;
        let mut in_time = false;
        let mut last_rank = 0u8;
        while !self.rest.is_empty() {
            if let Some(stripped) = self.rest.strip_prefix(|c: char| c == 'T' || c == 't') {
                if in_time {
                    return Err("repeated 'T' designator".into());
                }
                in_time = true;
                self.rest = stripped;
                if self.rest.is_empty() {
                    return Err("'T' designator without time components".into());
                }
                continue;
            }
            let (whole, fraction) = self.number()?;
            let unit = self
                .rest
                .chars()
                .next()
                .ok_or_else(|| "number without unit designator".to_owned())?;
            self.rest = &self.rest[unit.len_utf8()..];
            let rank = match (in_time, unit.to_ascii_uppercase()) {
                (false, 'Y') => 1,
                (false, 'M') => 2,
                (false, 'W') => 3,
                (false, 'D') => 4,
                (true, 'H') => 5,
                (true, 'M') => 6,
                (true, 'S') => 7,
                _ => return Err(format!("unexpected designator '{unit}'")),
            };
            if rank <= last_rank {
                return Err(format!("designator '{unit}' out of order"));
            }
            if fraction.is_some() && rank != 7 {
                return Err("fractions are only supported on seconds".into());
            }
            last_rank = rank;
            components += 1;
            let small = || u32::try_from(whole).map_err(|_| "component overflow".to_owned());
            match rank {
                1 => out.years = small()?,
                2 => out.months = small()?,
                3 => out.weeks = small()?,
                4 => out.days = small()?,
                5 => out.hours = small()?,
                6 => out.minutes = small()?,
                _ => {
                    out.seconds = whole;
                    out.nanos = fraction.unwrap_or(0);
                }
            }
        }
        if components == 0 {
            return Err("no duration components".into());
        }
        // Signed zero is still zero.
        out.negative &= !out.is_zero();
        Ok(out)
    }

    /// Digits with an optional `.`/`,` fraction; the fraction is returned in nanoseconds.
    fn number(&mut self) -> Result<(u64, Option<u32>), String> {
        let digits = self.rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(format!("expected digits at {:?}", self.rest));
        }
        let whole = self.rest[..digits]
            .parse::<u64>()
            .map_err(|_| "component overflow".to_owned())?;
        self.rest = &self.rest[digits..];

        let Some(after_dot) = self.rest.strip_prefix(|c: char| c == '.' || c == ',') else {
            return Ok((whole, None));
        };
        let frac_digits = after_dot.bytes().take_while(u8::is_ascii_digit).count();
        if frac_digits == 0 || frac_digits > 9 {
            return Err("fraction must have 1 to 9 digits".into());
        }
        let mut nanos = after_dot[..frac_digits]
            .parse::<u32>()
            .map_err(|_| "invalid fraction".to_owned())?;
        for _ in frac_digits..9 {
            nanos *= 10;
        }
        self.rest = &after_dot[frac_digits..];
        Ok((whole, Some(nanos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_normalise_to_utc_millis() {
        let parsed = parse_timestamp("2023-06-15T14:58:08+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 6, 15, 12, 58, 8).unwrap());
        assert_eq!(format_timestamp(&parsed), "2023-06-15T12:58:08.000Z");
    }

    #[test]
    fn sub_millisecond_precision_survives_formatting() {
        let parsed = parse_timestamp("2023-06-15T12:58:08.123456Z").unwrap();
        let text = format_timestamp(&parsed);
        assert_eq!(text, "2023-06-15T12:58:08.123456Z");
        assert_eq!(parse_timestamp(&text).unwrap(), parsed);
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        assert!(matches!(
            parse_timestamp("15/06/2023"),
            Err(ModelError::InvalidValue { kind: "timestamp", .. })
        ));
    }

    #[test]
    fn durations_round_trip_through_text() {
        for text in ["PT1H", "PT0S", "P1Y2M3DT4H5M6S", "P2W", "-PT15M", "PT0.5S", "P1DT0.000001S"] {
            let parsed = IsoDuration::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text, "{text}");
        }
    }

    #[test]
    fn zero_spellings_normalise() {
        assert_eq!(IsoDuration::parse("P0D").unwrap().to_string(), "PT0S");
        assert!(IsoDuration::parse("-PT0S").unwrap().is_zero());
    }

    #[test]
    fn invalid_durations_are_rejected() {
        for text in ["", "P", "PT", "1H", "PT1.5H", "P1H", "PT1S2M", "P1D1D", "PTXS"] {
            assert!(IsoDuration::parse(text).is_err(), "{text}");
        }
    }

    #[test]
    fn chrono_conversion_excludes_calendar_units() {
        assert_eq!(
            IsoDuration::parse("P1DT1H").unwrap().to_chrono(),
            Some(chrono::Duration::hours(25))
        );
        assert_eq!(IsoDuration::parse("P1M").unwrap().to_chrono(), None);
        assert_eq!(
            IsoDuration::minutes(15).negated().to_chrono(),
            Some(chrono::Duration::minutes(-15))
        );
    }

    #[test]
    fn chrono_conversion_out_of_range_is_none() {
        let huge = IsoDuration::parse("PT9999999999999999S").unwrap();
        assert_eq!(huge.to_chrono(), None);
        assert_eq!(huge.negated().to_chrono(), None);
        assert_eq!(IsoDuration::seconds(u64::MAX).to_chrono(), None);

        let summed = IsoDuration::parse("P4294967295WT9000000000000000S").unwrap();
        assert_eq!(summed.to_chrono(), None);

        let widest = IsoDuration::parse("P4294967295W4294967295D").unwrap();
        assert_eq!(
            widest.to_chrono(),
            chrono::Duration::try_days(4_294_967_295 * 8)
        );
    }
}
