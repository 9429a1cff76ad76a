//! Calendar arithmetic, duration scale factors, and time-zone lookups.
//!
//! Grounds spec.md §4.5's "Date/time" cluster and the original's
//! `DateFromParts`/`DateTimeFromParts`/`DateTimeOffsetFromParts`/`UtcOffset`
//! lambdas in `systemCall.cpp`. Instants are signed milliseconds since the
//! Unix epoch, computed with `chrono::NaiveDate`/`NaiveDateTime` (proleptic
//! Gregorian); time zones are `chrono_tz::Tz` (the IANA database), per
//! SPEC_FULL.md §4.

use std::rc::Rc;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Offset, TimeZone as ChronoTimeZone};
use chrono_tz::Tz;
use im::Vector;

use crate::vm::builtins_common::{decimal_value, expect_decimal, expect_time_zone};
use crate::vm::builtins_string::AVAILABLE_LOCALES;
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::error::Error;
use crate::vm::object::{string_object, string_to_rust, Object, RecordField};
use crate::vm::value::Value;

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    result.unwrap_or_else(SystemCallResult::from_error)
}

fn int_arg(input: &SystemCallInput, offset_from_top: i32) -> Result<i64, Error> {
    Ok(expect_decimal(input.get_value(offset_from_top))?.to_i64())
}

fn ymd_to_instant_ms(y: i32, m: u32, d: u32) -> Result<i64, Error> {
    let date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| Error::invalid_argument("Invalid calendar date."))?;
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight always exists for a valid date");
    Ok(midnight.and_utc().timestamp_millis())
}

fn instant_ms_to_naive(ms: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp_millis(ms).expect("instant out of representable range").naive_utc()
}

/// `DateFromParts(y, m, d)`: midnight UTC of the given proleptic Gregorian
/// date, as milliseconds since the epoch.
pub fn date_from_parts(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let y = int_arg(input, -3)? as i32;
        let m = int_arg(input, -2)? as u32;
        let d = int_arg(input, -1)? as u32;
        Ok(SystemCallResult::value(decimal_value(ymd_to_instant_ms(y, m, d)?)))
    })())
}

/// `DateTimeFromParts(y, m, d, h, mi, s, ms)`.
pub fn date_time_from_parts(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let y = int_arg(input, -7)? as i32;
        let m = int_arg(input, -6)? as u32;
        let d = int_arg(input, -5)? as u32;
        let h = int_arg(input, -4)? as u32;
        let mi = int_arg(input, -3)? as u32;
        let s = int_arg(input, -2)? as u32;
        let ms = int_arg(input, -1)?;
        let date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| Error::invalid_argument("Invalid calendar date."))?;
        let time = date.and_hms_milli_opt(h, mi, s, 0).ok_or_else(|| Error::invalid_argument("Invalid time of day."))?;
        Ok(SystemCallResult::value(decimal_value(time.and_utc().timestamp_millis() + ms)))
    })())
}

/// `DateTimeOffsetFromParts(y, m, d, h, mi, s, ms, tz)`: a [`Object::Record`]
/// composite pairing the UTC instant with the zone's offset at that instant
/// — the original's internal representation for a `DateTimeOffset` value.
pub fn date_time_offset_from_parts(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let y = int_arg(input, -7)? as i32;
        let m = int_arg(input, -6)? as u32;
        let d = int_arg(input, -5)? as u32;
        let h = int_arg(input, -4)? as u32;
        let mi = int_arg(input, -3)? as u32;
        let s = int_arg(input, -2)? as u32;
        let ms = int_arg(input, -1)?;
        let tz = *expect_time_zone(input.get_object(-1))?;
        let date = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| Error::invalid_argument("Invalid calendar date."))?;
        let naive = date.and_hms_milli_opt(h, mi, s, 0).ok_or_else(|| Error::invalid_argument("Invalid time of day."))?;
        let instant = naive.and_utc().timestamp_millis() + ms;
        let offset_ms = tz.offset_from_utc_datetime(&instant_ms_to_naive(instant)).fix().local_minus_utc() as i64 * 1000;
        let record = Object::Record(vec![
            ("instant".to_string(), RecordField::Value(Value::from_i64(instant))),
            ("offsetMs".to_string(), RecordField::Value(Value::from_i64(offset_ms))),
        ]);
        Ok(SystemCallResult::object(Rc::new(record)))
    })())
}

fn record_field(record: &[(String, RecordField)], name: &str) -> Result<i64, Error> {
    record
        .iter()
        .find(|(field_name, _)| field_name == name)
        .and_then(|(_, field)| match field {
            RecordField::Value(Value::Integer(i)) => Some(*i),
            _ => None,
        })
        .ok_or_else(|| Error::internal_type_confusion("expected a DateTimeOffset record"))
}

pub fn date_to_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let ms = int_arg(input, -1)?;
        let naive = instant_ms_to_naive(ms);
        Ok(SystemCallResult::object(Rc::new(string_object(&naive.format("%Y-%m-%d").to_string()))))
    })())
}

pub fn date_time_to_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let ms = int_arg(input, -1)?;
        let naive = instant_ms_to_naive(ms);
        Ok(SystemCallResult::object(Rc::new(string_object(&naive.format("%Y-%m-%d %H:%M:%S%.3f").to_string()))))
    })())
}

pub fn date_time_offset_to_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let object = input.get_object(-1);
        let record = match object.as_ref() {
            Object::Record(fields) => fields,
            _ => return Err(Error::internal_type_confusion("expected a DateTimeOffset record")),
        };
        let instant = record_field(record, "instant")?;
        let offset_ms = record_field(record, "offsetMs")?;
        let naive = instant_ms_to_naive(instant + offset_ms);
        let sign = if offset_ms < 0 { '-' } else { '+' };
        let offset_minutes = (offset_ms.abs() / 60_000) as i64;
        let formatted = format!(
            "{} {}{:02}:{:02}",
            naive.format("%Y-%m-%d %H:%M:%S%.3f"),
            sign,
            offset_minutes / 60,
            offset_minutes % 60
        );
        Ok(SystemCallResult::object(Rc::new(string_object(&formatted))))
    })())
}

/// Canonical `D.HH:MM:SS.fff` duration formatting.
pub fn time_span_to_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let total_ms = int_arg(input, -1)?;
        let negative = total_ms < 0;
        let mut remaining = total_ms.abs();
        let millis = remaining % 1000;
        remaining /= 1000;
        let secs = remaining % 60;
        remaining /= 60;
        let mins = remaining % 60;
        remaining /= 60;
        let hours = remaining % 24;
        let days = remaining / 24;
        let sign = if negative { "-" } else { "" };
        let formatted = if days > 0 {
            format!("{sign}{days}.{hours:02}:{mins:02}:{secs:02}.{millis:03}")
        } else {
            format!("{sign}{hours:02}:{mins:02}:{secs:02}.{millis:03}")
        };
        Ok(SystemCallResult::object(Rc::new(string_object(&formatted))))
    })())
}

fn scale(input: &mut SystemCallInput, factor: i64) -> SystemCallResult {
    ok_or_fault((|| Ok(SystemCallResult::value(decimal_value(int_arg(input, -1)? * factor))))())
}

fn inverse_scale(input: &mut SystemCallInput, factor: i64) -> SystemCallResult {
    ok_or_fault((|| Ok(SystemCallResult::value(decimal_value(int_arg(input, -1)? / factor))))())
}

pub fn hours(input: &mut SystemCallInput) -> SystemCallResult {
    scale(input, 3_600_000)
}

pub fn minutes(input: &mut SystemCallInput) -> SystemCallResult {
    scale(input, 60_000)
}

pub fn seconds(input: &mut SystemCallInput) -> SystemCallResult {
    scale(input, 1_000)
}

pub fn days(input: &mut SystemCallInput) -> SystemCallResult {
    scale(input, 86_400_000)
}

pub fn milliseconds(input: &mut SystemCallInput) -> SystemCallResult {
    scale(input, 1)
}

pub fn total_days(input: &mut SystemCallInput) -> SystemCallResult {
    inverse_scale(input, 86_400_000)
}

pub fn total_hours(input: &mut SystemCallInput) -> SystemCallResult {
    inverse_scale(input, 3_600_000)
}

pub fn total_minutes(input: &mut SystemCallInput) -> SystemCallResult {
    inverse_scale(input, 60_000)
}

pub fn total_seconds(input: &mut SystemCallInput) -> SystemCallResult {
    inverse_scale(input, 1_000)
}

pub fn total_milliseconds(input: &mut SystemCallInput) -> SystemCallResult {
    inverse_scale(input, 1)
}

/// Faults [`ErrorCode::InvalidTimeZone`] if `name` isn't a recognized IANA
/// zone, matching the original's `UCAL_UNKNOWN_ZONE_ID` rejection.
pub fn time_zone_from_name(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let name_units = input.get_object(-1).as_string().ok_or_else(|| Error::internal_type_confusion("expected a String object"))?;
        let name = string_to_rust(name_units);
        log::trace!("TimeZoneFromName {name}");
        let tz = Tz::from_str(&name).map_err(|_| Error::invalid_time_zone())?;
        Ok(SystemCallResult::object(Rc::new(Object::TimeZone(tz))))
    })())
}

pub fn time_zone_to_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let tz = expect_time_zone(input.get_object(-1))?;
        Ok(SystemCallResult::object(Rc::new(string_object(tz.name()))))
    })())
}

/// `UtcOffset(tz, instant)`: total offset in milliseconds at `instant`.
pub fn utc_offset(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let tz = *expect_time_zone(input.get_object(-1))?;
        let instant = int_arg(input, -1)?;
        let naive = instant_ms_to_naive(instant);
        let offset_seconds = tz.offset_from_utc_datetime(&naive).fix().local_minus_utc();
        Ok(SystemCallResult::value(decimal_value(offset_seconds as i64 * 1000)))
    })())
}

pub fn available_locales(_input: &mut SystemCallInput) -> SystemCallResult {
    let list: Vector<Rc<Object>> = AVAILABLE_LOCALES.iter().map(|s| Rc::new(string_object(s)) as Rc<Object>).collect();
    SystemCallResult::object(Rc::new(Object::ObjectList(list)))
}

pub fn available_time_zones(_input: &mut SystemCallInput) -> SystemCallResult {
    let list: Vector<Rc<Object>> = chrono_tz::TZ_VARIANTS.iter().map(|tz| Rc::new(string_object(tz.name())) as Rc<Object>).collect();
    SystemCallResult::object(Rc::new(Object::ObjectList(list)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(which: fn(&mut SystemCallInput) -> SystemCallResult, values: Vec<Value>) -> SystemCallResult {
        let objects: Vec<Rc<Object>> = Vec::new();
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let n = values.len();
        let mut input = SystemCallInput::new(&values, &objects, n, 0, &mut input_stream, &mut output_stream, None);
        which(&mut input)
    }

    #[test]
    fn test_date_from_parts_and_to_string_scenario() {
        let ms = call(
            date_from_parts,
            vec![decimal_value(2024), decimal_value(2), decimal_value(29)],
        )
        .returned_value
        .unwrap();
        let formatted = call(date_to_string, vec![ms]).returned_object.unwrap();
        assert_eq!(string_to_rust(formatted.as_string().unwrap()), "2024-02-29");
    }

    #[test]
    fn test_invalid_date_is_invalid_argument() {
        let result = call(date_from_parts, vec![decimal_value(2023), decimal_value(2), decimal_value(29)]);
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_total_hours_truncates() {
        let result = call(total_hours, vec![decimal_value(3_600_000 * 2 + 1)]);
        assert_eq!(result.returned_value, Some(decimal_value(2)));
    }

    #[test]
    fn test_time_zone_from_name_rejects_unknown() {
        let objects = vec![Rc::new(string_object("Not/AZone"))];
        let values: Vec<Value> = Vec::new();
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let mut input = SystemCallInput::new(&values, &objects, 0, 1, &mut input_stream, &mut output_stream, None);
        let result = time_zone_from_name(&mut input);
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::InvalidTimeZone);
    }
}
