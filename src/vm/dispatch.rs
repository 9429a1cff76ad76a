//! The dispatch table: a dense array indexed by the stable [`SystemCall`]
//! enumerator, mapping each intrinsic ID to its implementation.
//!
//! Grounds spec.md §4.4/§5/§9: the original's process-wide mutable array
//! guarded by a one-shot init flag becomes a lazily-built, read-only table
//! behind [`std::sync::OnceLock`] — the "functional translation" the design
//! notes call for. [`call`] is the single point where a panic inside an
//! intrinsic (an indexing bug, an `.unwrap()` on `None`) is caught and
//! converted to the generic `code = -1` fault, mirroring the original's
//! catch-all `std::exception` handler in `systemCall()`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::{builtins_arithmetic as arith, builtins_datetime as dt, builtins_io as io, builtins_list as list, builtins_map as map, builtins_optional as opt, builtins_string as string};

/// Stable identifier for every intrinsic. Order is the dispatch table's
/// index space; new intrinsics must be appended, never inserted, to keep
/// existing bytecode's IDs valid (spec.md §6, "Enumerator stability").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum SystemCall {
    // Arithmetic on Decimal
    Abs,
    Ceil,
    Floor,
    Trunc,
    Round,
    Exp,
    Log,
    Log10,
    Sqr,
    Pow,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    // Transcendental on double
    Acos,
    Asin,
    Atan,
    Atan2,
    Cos,
    Sin,
    Tan,
    // Numeric comparison
    NumberEquals,
    NumberNotEquals,
    NumberLessThan,
    NumberLessThanEquals,
    NumberGreaterThan,
    NumberGreaterThanEquals,
    // Loop predicate
    CounterIsPastLimit,
    // Strings
    StringConcat,
    StringEquals,
    StringLen,
    Chr,
    CodePoints,
    CodeUnits,
    CodeUnit1,
    CodeUnit2,
    StringFromCodePoints,
    StringFromCodeUnits,
    Characters1,
    Characters2,
    Concat1,
    Concat2,
    // Date/time
    DateFromParts,
    DateTimeFromParts,
    DateTimeOffsetFromParts,
    DateToString,
    DateTimeToString,
    DateTimeOffsetToString,
    TimeSpanToString,
    Hours,
    Minutes,
    Seconds,
    Days,
    Milliseconds,
    TotalDays,
    TotalHours,
    TotalMinutes,
    TotalSeconds,
    TotalMilliseconds,
    TimeZoneFromName,
    TimeZoneToString,
    UtcOffset,
    AvailableLocales,
    AvailableTimeZones,
    // Lists
    ListLen,
    ListFirst,
    ListLast,
    ListMid,
    ListSkip,
    ListTake,
    ListFillV,
    ListFillO,
    ValueListBuilderNew,
    ValueListBuilderAdd,
    ValueListBuilderEnd,
    ObjectListBuilderNew,
    ObjectListBuilderAdd,
    ObjectListBuilderEnd,
    ValueListAdd,
    ValueListSet,
    ValueListConcat,
    ValueListGet,
    ObjectListAdd,
    ObjectListSet,
    ObjectListConcat,
    ObjectListGet,
    // Maps
    ValueToValueMapNew,
    ValueToValueMapGet,
    ValueToValueMapSet,
    ValueToValueMapRemove,
    ValueToValueMapContainsKey,
    ValueToValueMapLen,
    ValueToValueMapKeys,
    ValueToValueMapValues,
    ValueToObjectMapNew,
    ValueToObjectMapGet,
    ValueToObjectMapSet,
    ValueToObjectMapRemove,
    ValueToObjectMapContainsKey,
    ValueToObjectMapLen,
    ValueToObjectMapKeys,
    ValueToObjectMapValues,
    ObjectToValueMapNew,
    ObjectToValueMapGet,
    ObjectToValueMapSet,
    ObjectToValueMapRemove,
    ObjectToValueMapContainsKey,
    ObjectToValueMapLen,
    ObjectToValueMapKeys,
    ObjectToValueMapValues,
    ObjectToObjectMapNew,
    ObjectToObjectMapGet,
    ObjectToObjectMapSet,
    ObjectToObjectMapRemove,
    ObjectToObjectMapContainsKey,
    ObjectToObjectMapLen,
    ObjectToObjectMapKeys,
    ObjectToObjectMapValues,
    // Optionals
    ValueOptionalNewMissing,
    ValueOptionalNewPresent,
    ObjectOptionalNewMissing,
    ObjectOptionalNewPresent,
    HasValueV,
    HasValueO,
    ValueV,
    ValueO,
    // I/O
    InputString,
    PrintString,
    FlushConsoleOutput,
    ReadFileText,
    ReadFileLines,
    WriteFileText,
    WriteFileLines,
    DeleteFile,
    // Error introspection
    ErrorCode,
    ErrorMessage,
}

/// Number of entries in the dispatch table; must track the last variant.
const SYSTEM_CALL_COUNT: usize = SystemCall::ErrorMessage as usize + 1;

type IntrinsicFn = fn(&mut SystemCallInput) -> SystemCallResult;

fn dispatch_table() -> &'static Vec<IntrinsicFn> {
    static TABLE: OnceLock<Vec<IntrinsicFn>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

fn build_table() -> Vec<IntrinsicFn> {
    let mut table: Vec<IntrinsicFn> = vec![unimplemented_intrinsic; SYSTEM_CALL_COUNT];
    let mut set = |which: SystemCall, f: IntrinsicFn| table[which as usize] = f;

    set(SystemCall::Abs, arith::abs);
    set(SystemCall::Ceil, arith::ceil);
    set(SystemCall::Floor, arith::floor);
    set(SystemCall::Trunc, arith::trunc);
    set(SystemCall::Round, arith::round);
    set(SystemCall::Exp, arith::exp);
    set(SystemCall::Log, arith::log);
    set(SystemCall::Log10, arith::log10);
    set(SystemCall::Sqr, arith::sqr);
    set(SystemCall::Pow, arith::pow);
    set(SystemCall::Add, arith::add);
    set(SystemCall::Subtract, arith::subtract);
    set(SystemCall::Multiply, arith::multiply);
    set(SystemCall::Divide, arith::divide);
    set(SystemCall::Modulus, arith::modulus);

    set(SystemCall::Acos, arith::acos);
    set(SystemCall::Asin, arith::asin);
    set(SystemCall::Atan, arith::atan);
    set(SystemCall::Atan2, arith::atan2);
    set(SystemCall::Cos, arith::cos);
    set(SystemCall::Sin, arith::sin);
    set(SystemCall::Tan, arith::tan);

    set(SystemCall::NumberEquals, arith::number_equals);
    set(SystemCall::NumberNotEquals, arith::number_not_equals);
    set(SystemCall::NumberLessThan, arith::number_less_than);
    set(SystemCall::NumberLessThanEquals, arith::number_less_than_equals);
    set(SystemCall::NumberGreaterThan, arith::number_greater_than);
    set(SystemCall::NumberGreaterThanEquals, arith::number_greater_than_equals);

    set(SystemCall::CounterIsPastLimit, arith::counter_is_past_limit);

    set(SystemCall::StringConcat, string::string_concat);
    set(SystemCall::StringEquals, string::string_equals);
    set(SystemCall::StringLen, string::string_len);
    set(SystemCall::Chr, string::chr);
    set(SystemCall::CodePoints, string::code_points);
    set(SystemCall::CodeUnits, string::code_units);
    set(SystemCall::CodeUnit1, string::code_unit1);
    set(SystemCall::CodeUnit2, string::code_unit2);
    set(SystemCall::StringFromCodePoints, string::string_from_code_points);
    set(SystemCall::StringFromCodeUnits, string::string_from_code_units);
    set(SystemCall::Characters1, string::characters1);
    set(SystemCall::Characters2, string::characters2);
    set(SystemCall::Concat1, string::concat1);
    set(SystemCall::Concat2, string::concat2);

    set(SystemCall::DateFromParts, dt::date_from_parts);
    set(SystemCall::DateTimeFromParts, dt::date_time_from_parts);
    set(SystemCall::DateTimeOffsetFromParts, dt::date_time_offset_from_parts);
    set(SystemCall::DateToString, dt::date_to_string);
    set(SystemCall::DateTimeToString, dt::date_time_to_string);
    set(SystemCall::DateTimeOffsetToString, dt::date_time_offset_to_string);
    set(SystemCall::TimeSpanToString, dt::time_span_to_string);
    set(SystemCall::Hours, dt::hours);
    set(SystemCall::Minutes, dt::minutes);
    set(SystemCall::Seconds, dt::seconds);
    set(SystemCall::Days, dt::days);
    set(SystemCall::Milliseconds, dt::milliseconds);
    set(SystemCall::TotalDays, dt::total_days);
    set(SystemCall::TotalHours, dt::total_hours);
    set(SystemCall::TotalMinutes, dt::total_minutes);
    set(SystemCall::TotalSeconds, dt::total_seconds);
    set(SystemCall::TotalMilliseconds, dt::total_milliseconds);
    set(SystemCall::TimeZoneFromName, dt::time_zone_from_name);
    set(SystemCall::TimeZoneToString, dt::time_zone_to_string);
    set(SystemCall::UtcOffset, dt::utc_offset);
    set(SystemCall::AvailableLocales, dt::available_locales);
    set(SystemCall::AvailableTimeZones, dt::available_time_zones);

    set(SystemCall::ListLen, list::list_len);
    set(SystemCall::ListFirst, list::list_first);
    set(SystemCall::ListLast, list::list_last);
    set(SystemCall::ListMid, list::list_mid);
    set(SystemCall::ListSkip, list::list_skip);
    set(SystemCall::ListTake, list::list_take);
    set(SystemCall::ListFillV, list::list_fill_v);
    set(SystemCall::ListFillO, list::list_fill_o);
    set(SystemCall::ValueListBuilderNew, list::value_list_builder_new);
    set(SystemCall::ValueListBuilderAdd, list::value_list_builder_add);
    set(SystemCall::ValueListBuilderEnd, list::value_list_builder_end);
    set(SystemCall::ObjectListBuilderNew, list::object_list_builder_new);
    set(SystemCall::ObjectListBuilderAdd, list::object_list_builder_add);
    set(SystemCall::ObjectListBuilderEnd, list::object_list_builder_end);
    set(SystemCall::ValueListAdd, list::value_list_add);
    set(SystemCall::ValueListSet, list::value_list_set);
    set(SystemCall::ValueListConcat, list::value_list_concat);
    set(SystemCall::ValueListGet, list::value_list_get);
    set(SystemCall::ObjectListAdd, list::object_list_add);
    set(SystemCall::ObjectListSet, list::object_list_set);
    set(SystemCall::ObjectListConcat, list::object_list_concat);
    set(SystemCall::ObjectListGet, list::object_list_get);

    set(SystemCall::ValueToValueMapNew, map::value_to_value_map_new);
    set(SystemCall::ValueToValueMapGet, map::value_to_value_map_get);
    set(SystemCall::ValueToValueMapSet, map::value_to_value_map_set);
    set(SystemCall::ValueToValueMapRemove, map::value_to_value_map_remove);
    set(SystemCall::ValueToValueMapContainsKey, map::value_to_value_map_contains_key);
    set(SystemCall::ValueToValueMapLen, map::value_to_value_map_len);
    set(SystemCall::ValueToValueMapKeys, map::value_to_value_map_keys);
    set(SystemCall::ValueToValueMapValues, map::value_to_value_map_values);

    set(SystemCall::ValueToObjectMapNew, map::value_to_object_map_new);
    set(SystemCall::ValueToObjectMapGet, map::value_to_object_map_get);
    set(SystemCall::ValueToObjectMapSet, map::value_to_object_map_set);
    set(SystemCall::ValueToObjectMapRemove, map::value_to_object_map_remove);
    set(SystemCall::ValueToObjectMapContainsKey, map::value_to_object_map_contains_key);
    set(SystemCall::ValueToObjectMapLen, map::value_to_object_map_len);
    set(SystemCall::ValueToObjectMapKeys, map::value_to_object_map_keys);
    set(SystemCall::ValueToObjectMapValues, map::value_to_object_map_values);

    set(SystemCall::ObjectToValueMapNew, map::object_to_value_map_new);
    set(SystemCall::ObjectToValueMapGet, map::object_to_value_map_get);
    set(SystemCall::ObjectToValueMapSet, map::object_to_value_map_set);
    set(SystemCall::ObjectToValueMapRemove, map::object_to_value_map_remove);
    set(SystemCall::ObjectToValueMapContainsKey, map::object_to_value_map_contains_key);
    set(SystemCall::ObjectToValueMapLen, map::object_to_value_map_len);
    set(SystemCall::ObjectToValueMapKeys, map::object_to_value_map_keys);
    set(SystemCall::ObjectToValueMapValues, map::object_to_value_map_values);

    set(SystemCall::ObjectToObjectMapNew, map::object_to_object_map_new);
    set(SystemCall::ObjectToObjectMapGet, map::object_to_object_map_get);
    set(SystemCall::ObjectToObjectMapSet, map::object_to_object_map_set);
    set(SystemCall::ObjectToObjectMapRemove, map::object_to_object_map_remove);
    set(SystemCall::ObjectToObjectMapContainsKey, map::object_to_object_map_contains_key);
    set(SystemCall::ObjectToObjectMapLen, map::object_to_object_map_len);
    set(SystemCall::ObjectToObjectMapKeys, map::object_to_object_map_keys);
    set(SystemCall::ObjectToObjectMapValues, map::object_to_object_map_values);

    set(SystemCall::ValueOptionalNewMissing, opt::value_optional_new_missing);
    set(SystemCall::ValueOptionalNewPresent, opt::value_optional_new_present);
    set(SystemCall::ObjectOptionalNewMissing, opt::object_optional_new_missing);
    set(SystemCall::ObjectOptionalNewPresent, opt::object_optional_new_present);
    set(SystemCall::HasValueV, opt::has_value_v);
    set(SystemCall::HasValueO, opt::has_value_o);
    set(SystemCall::ValueV, opt::value_v);
    set(SystemCall::ValueO, opt::value_o);

    set(SystemCall::InputString, io::input_string);
    set(SystemCall::PrintString, io::print_string);
    set(SystemCall::FlushConsoleOutput, io::flush_console_output);
    set(SystemCall::ReadFileText, io::read_file_text);
    set(SystemCall::ReadFileLines, io::read_file_lines);
    set(SystemCall::WriteFileText, io::write_file_text);
    set(SystemCall::WriteFileLines, io::write_file_lines);
    set(SystemCall::DeleteFile, io::delete_file);

    set(SystemCall::ErrorCode, io::error_code);
    set(SystemCall::ErrorMessage, io::error_message);

    table
}

/// Unknown/unregistered IDs are a fatal programming error per spec.md §4.4;
/// reaching this indicates a dispatch table construction bug, not user
/// input, so it is the one place in this module that panics deliberately.
fn unimplemented_intrinsic(_input: &mut SystemCallInput) -> SystemCallResult {
    unreachable!("system call not registered in dispatch table")
}

/// Looks up and invokes the intrinsic for `which`, catching any panic that
/// escapes its body and converting it to `code = -1` — the direct analogue
/// of the original's catch-all `std::exception` handler in `systemCall()`.
/// No native fault ever crosses this boundary (spec.md §7/§8).
pub fn call(which: SystemCall, input: &mut SystemCallInput) -> SystemCallResult {
    let f = dispatch_table()[which as usize];
    let result = panic::catch_unwind(AssertUnwindSafe(|| f(input)));
    match result {
        Ok(r) => r,
        Err(payload) => {
            let message = panic_message(&payload);
            log::debug!("intrinsic {which:?} panicked: {message}");
            SystemCallResult::from_fault(message)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "intrinsic panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::value::Value;

    #[test]
    fn test_dispatch_table_has_entry_for_every_system_call() {
        assert_eq!(dispatch_table().len(), SYSTEM_CALL_COUNT);
    }

    #[test]
    fn test_call_abs_through_dispatch() {
        let values = vec![Value::from_decimal("-3".parse().unwrap())];
        let objects = vec![];
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let mut input = SystemCallInput::new(&values, &objects, 1, 0, &mut input_stream, &mut output_stream, None);
        let result = call(SystemCall::Abs, &mut input);
        assert!(!result.has_error());
        assert_eq!(result.returned_value, Some(Value::from_decimal("3".parse().unwrap())));
    }
}
