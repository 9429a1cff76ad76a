//! Optional-value and optional-object intrinsics.
//!
//! Grounds spec.md §4.5's "Optionals" cluster and the original's
//! `ValueOptionalNew`/`HasValue`/`Value` lambdas in `systemCall.cpp`.
//! `ValueOptional`/`ObjectOptional` wrap a plain `Option<Value>` /
//! `Option<Rc<Object>>` — reading an empty optional faults
//! [`crate::vm::error::ErrorCode::ValueNotPresent`] rather than panicking,
//! since an empty optional is a routine program state, not a
//! code-generator bug.

use std::rc::Rc;

use crate::vm::builtins_common::{decimal_value, expect_object_optional};
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::error::Error;
use crate::vm::object::Object;
use crate::vm::value::Value;

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    result.unwrap_or_else(SystemCallResult::from_error)
}

fn expect_value_optional(o: &Rc<Object>) -> Result<&Option<Value>, Error> {
    match o.as_ref() {
        Object::ValueOptional(v) => Ok(v),
        _ => Err(Error::internal_type_confusion("expected a ValueOptional")),
    }
}

pub fn value_optional_new_missing(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ValueOptional(None)))
}

pub fn value_optional_new_present(input: &mut SystemCallInput) -> SystemCallResult {
    let value = input.get_value(-1).clone();
    SystemCallResult::object(Rc::new(Object::ValueOptional(Some(value))))
}

pub fn object_optional_new_missing(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ObjectOptional(None)))
}

pub fn object_optional_new_present(input: &mut SystemCallInput) -> SystemCallResult {
    let object = input.get_object_ptr(-1);
    SystemCallResult::object(Rc::new(Object::ObjectOptional(Some(object))))
}

pub fn has_value_v(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let optional = expect_value_optional(input.get_object(-1))?;
        Ok(SystemCallResult::value(Value::from_bool(optional.is_some())))
    })())
}

pub fn has_value_o(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let optional = expect_object_optional(input.get_object(-1))?;
        Ok(SystemCallResult::value(Value::from_bool(optional.is_some())))
    })())
}

pub fn value_v(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let optional = expect_value_optional(input.get_object(-1))?;
        optional.clone().map(SystemCallResult::value).ok_or_else(Error::value_not_present)
    })())
}

pub fn value_o(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let optional = expect_object_optional(input.get_object(-1))?;
        optional.clone().map(SystemCallResult::object).ok_or_else(Error::value_not_present)
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::object::string_object;

    fn call(which: fn(&mut SystemCallInput) -> SystemCallResult, values: Vec<Value>, objects: Vec<Rc<Object>>) -> SystemCallResult {
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let vn = values.len();
        let on = objects.len();
        let mut input = SystemCallInput::new(&values, &objects, vn, on, &mut input_stream, &mut output_stream, None);
        which(&mut input)
    }

    #[test]
    fn test_value_on_missing_faults_value_not_present() {
        let optional = Rc::new(Object::ValueOptional(None));
        let result = call(value_v, vec![], vec![optional]);
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::ValueNotPresent);
    }

    #[test]
    fn test_has_value_true_for_present() {
        let optional = Rc::new(Object::ValueOptional(Some(decimal_value(7))));
        let result = call(has_value_v, vec![], vec![optional]);
        assert_eq!(result.returned_value, Some(Value::from_bool(true)));
    }

    #[test]
    fn test_object_optional_roundtrip() {
        let inner = Rc::new(string_object("hi"));
        let optional = Rc::new(Object::ObjectOptional(Some(inner)));
        let result = call(value_o, vec![], vec![optional]);
        assert_eq!(result.returned_object.unwrap().as_string().unwrap(), &"hi".encode_utf16().collect::<Vec<_>>());
    }
}
