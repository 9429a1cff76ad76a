//! String and Unicode intrinsics: concatenation, code unit/code point
//! access, grapheme segmentation, and the inverse string constructors.
//!
//! Grounds spec.md §4.5's "Strings" cluster and the original's
//! `systemCallCharactersCore`/`Characters1`/`Characters2`/`Chr` in
//! `systemCall.cpp`. Grapheme segmentation uses
//! `unicode_segmentation::UnicodeSegmentation::graphemes`, the idiomatic
//! substitute for the ICU `BreakIterator` the original calls — see
//! SPEC_FULL.md §4.

use std::rc::Rc;

use im::Vector;
use unicode_segmentation::UnicodeSegmentation;

use crate::vm::builtins_common::{decimal_value, expect_decimal, expect_string, expect_value_list};
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::error::Error;
use crate::vm::object::{string_object, string_to_rust, Object};
use crate::vm::value::Value;

/// BCP-47 tags this runtime recognizes, in lieu of ICU's installed locale
/// database (see SPEC_FULL.md §4). `Characters2`'s locale argument is
/// validated against this list even though segmentation itself does not
/// vary by locale here.
pub const AVAILABLE_LOCALES: &[&str] = &["en-US", "en-GB", "fr-FR", "de-DE", "es-ES", "ja-JP", "zh-CN", "pt-BR"];

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    result.unwrap_or_else(SystemCallResult::from_error)
}

pub fn string_concat(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let a = expect_string(input.get_object(-2))?;
        let b = expect_string(input.get_object(-1))?;
        let mut combined = a.clone();
        combined.extend_from_slice(b);
        Ok(SystemCallResult::object(Rc::new(Object::String(combined))))
    })())
}

pub fn string_equals(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let a = expect_string(input.get_object(-2))?;
        let b = expect_string(input.get_object(-1))?;
        Ok(SystemCallResult::value(Value::from_bool(a == b)))
    })())
}

pub fn string_len(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let s = expect_string(input.get_object(-1))?;
        Ok(SystemCallResult::value(decimal_value(s.len() as i64)))
    })())
}

/// `n <= 0` returns the empty string, matching the original's guard in
/// `systemCallChr`.
pub fn chr(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let n = expect_decimal(input.get_value(-1))?.to_i64();
        if n <= 0 {
            return Ok(SystemCallResult::object(Rc::new(Object::String(Vec::new()))));
        }
        let code_point = char::from_u32(n as u32).unwrap_or('\u{FFFD}');
        Ok(SystemCallResult::object(Rc::new(string_object(&code_point.to_string()))))
    })())
}

pub fn code_points(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-1))?;
        let text = string_to_rust(units);
        let list: Vector<Value> = text.chars().map(|c| decimal_value(c as i64)).collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

pub fn code_units(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-1))?;
        let list: Vector<Value> = units.iter().map(|&u| decimal_value(u as i64)).collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

/// Sentinel `0` for the empty string, matching the original's documented
/// `CodeUnit1` behavior ("0xFFFF" refers to the *missing surrogate pair*
/// sentinel, not this zero-length case).
pub fn code_unit1(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-1))?;
        let unit = units.first().copied().unwrap_or(0);
        Ok(SystemCallResult::value(decimal_value(unit as i64)))
    })())
}

pub fn code_unit2(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-1))?;
        let index = expect_decimal(input.get_value(-1))?.to_i64();
        if index < 0 || index as usize >= units.len() {
            return Err(Error::list_index_out_of_range("Index out of range."));
        }
        Ok(SystemCallResult::value(decimal_value(units[index as usize] as i64)))
    })())
}

pub fn string_from_code_points(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_value_list(input.get_object(-1))?;
        let mut text = String::new();
        for v in list.iter() {
            let cp = expect_decimal(v)?.to_i64();
            text.push(char::from_u32(cp as u32).unwrap_or('\u{FFFD}'));
        }
        Ok(SystemCallResult::object(Rc::new(string_object(&text))))
    })())
}

pub fn string_from_code_units(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_value_list(input.get_object(-1))?;
        let mut units = std::vec::Vec::with_capacity(list.len());
        for v in list.iter() {
            units.push(expect_decimal(v)?.to_i64() as u16);
        }
        Ok(SystemCallResult::object(Rc::new(Object::String(units))))
    })())
}

fn graphemes_of(units: &[u16]) -> Vector<Rc<Object>> {
    let text = string_to_rust(units);
    text.graphemes(true).map(|g| Rc::new(string_object(g))).collect()
}

pub fn characters1(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-1))?;
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(graphemes_of(units)))))
    })())
}

pub fn characters2(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-2))?;
        let locale_units = expect_string(input.get_object(-1))?;
        let locale = string_to_rust(locale_units);
        if !AVAILABLE_LOCALES.contains(&locale.as_str()) {
            return Err(Error::invalid_locale_name());
        }
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(graphemes_of(units)))))
    })())
}

/// Joins a list of strings with no separator.
pub fn concat1(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_object_string_list(input.get_object(-1))?;
        Ok(SystemCallResult::object(Rc::new(string_object(&list.join("")))))
    })())
}

/// Joins a list of strings, inserting `separator` between every pair — not
/// before the first element nor after the last (the original's
/// `stringConcat` helper in `systemCall.cpp`).
pub fn concat2(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_object_string_list(input.get_object(-2))?;
        let separator_units = expect_string(input.get_object(-1))?;
        let separator = string_to_rust(separator_units);
        Ok(SystemCallResult::object(Rc::new(string_object(&list.join(&separator)))))
    })())
}

fn expect_object_string_list(o: &Rc<Object>) -> Result<std::vec::Vec<String>, Error> {
    let list = o.as_object_list().ok_or_else(|| Error::internal_type_confusion("expected an ObjectList of strings"))?;
    list.iter()
        .map(|item| expect_string(item).map(|units| string_to_rust(units)))
        .collect()
}
