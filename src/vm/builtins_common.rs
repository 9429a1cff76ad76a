//! Shared downcast helpers used by every intrinsic cluster.
//!
//! Per spec.md §4.6(b), a stack slot whose kind doesn't match an
//! intrinsic's declared signature indicates a code-generator bug, not user
//! input, and is reported as [`ErrorCode::InternalTypeConfusion`] rather
//! than allowed to panic — these helpers are the one place that coercion
//! happens, so every intrinsic gets that behavior for free.

use std::rc::Rc;

use crate::vm::decimal::Decimal;
use crate::vm::error::Error;
use crate::vm::object::Object;
use crate::vm::value::Value;

pub fn expect_decimal(v: &Value) -> Result<&Decimal, Error> {
    v.as_decimal().ok_or_else(|| Error::internal_type_confusion("expected a Decimal value"))
}

/// Widens a Rust integer to the `Decimal`-typed `Value` every BASIC-visible
/// number travels as — lengths, indices, code points, and comparison
/// results are never the VM-internal `Integer` variant.
pub fn decimal_value(i: i64) -> Value {
    Value::from_decimal(Decimal::from_i64(i))
}

pub fn expect_string(o: &Rc<Object>) -> Result<&Vec<u16>, Error> {
    o.as_string().ok_or_else(|| Error::internal_type_confusion("expected a String object"))
}

pub fn expect_value_list(o: &Rc<Object>) -> Result<&im::Vector<Value>, Error> {
    o.as_value_list().ok_or_else(|| Error::internal_type_confusion("expected a ValueList object"))
}

pub fn expect_object_list(o: &Rc<Object>) -> Result<&im::Vector<Rc<Object>>, Error> {
    o.as_object_list().ok_or_else(|| Error::internal_type_confusion("expected an ObjectList object"))
}

pub fn expect_value_list_builder(o: &Rc<Object>) -> Result<&std::cell::RefCell<Vec<Value>>, Error> {
    o.as_value_list_builder().ok_or_else(|| Error::internal_type_confusion("expected a ValueListBuilder object"))
}

pub fn expect_object_list_builder(o: &Rc<Object>) -> Result<&std::cell::RefCell<Vec<Rc<Object>>>, Error> {
    o.as_object_list_builder().ok_or_else(|| Error::internal_type_confusion("expected an ObjectListBuilder object"))
}

pub fn expect_time_zone(o: &Rc<Object>) -> Result<&chrono_tz::Tz, Error> {
    o.as_time_zone().ok_or_else(|| Error::internal_type_confusion("expected a TimeZone object"))
}

pub fn expect_object_optional(o: &Rc<Object>) -> Result<&Option<Rc<Object>>, Error> {
    match o.as_ref() {
        Object::ObjectOptional(opt) => Ok(opt),
        _ => Err(Error::internal_type_confusion("expected an ObjectOptional")),
    }
}
