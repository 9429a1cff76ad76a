//! Decimal arithmetic, double-widened transcendentals, numeric comparison,
//! and the `for`-loop counter predicate.
//!
//! Grounds spec.md §4.5's "Arithmetic on Decimal" / "Transcendental on
//! double" / "Numeric comparison" / "Loop predicate" clusters, and the
//! original's `NumberAdd`/`NumberDivide`/... lambdas and
//! `systemCallCounterIsPastLimit` in `systemCall.cpp`.
//!
//! A stack slot of the wrong shape faults [`ErrorCode::InternalTypeConfusion`]
//! per spec.md §4.6(b) (see [`expect_decimal`]). The two clusters disagree on
//! what a non-finite `f64` result means. Domain errors within the decimal
//! layer itself (division by zero, `ln(0)`) are deliberately left to panic
//! and are caught at the dispatch boundary as the generic `code = -1` fault,
//! per spec.md §4.5's "propagate as ... generic faults" — [`finite_decimal`]
//! is this cluster's guard. The double-widened transcendentals are the
//! opposite: `NaN`/`±Infinity` are valid, representable results for
//! out-of-domain input (`Asin(2)`), not errors, so that path goes through
//! `Decimal::from_f64` directly with no finiteness check.

use crate::vm::builtins_common::{decimal_value, expect_decimal};
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::decimal::Decimal;
use crate::vm::error::Error;
use crate::vm::value::Value;

fn unary(input: &mut SystemCallInput, f: impl Fn(&Decimal) -> Decimal) -> Result<SystemCallResult, Error> {
    let d = expect_decimal(input.get_value(-1))?;
    Ok(SystemCallResult::value(Value::from_decimal(f(d))))
}

fn binary(input: &mut SystemCallInput, f: impl Fn(&Decimal, &Decimal) -> Decimal) -> Result<SystemCallResult, Error> {
    let a = expect_decimal(input.get_value(-2))?.clone();
    let b = expect_decimal(input.get_value(-1))?;
    Ok(SystemCallResult::value(Value::from_decimal(f(&a, b))))
}

fn finite_decimal(v: f64) -> Decimal {
    assert!(v.is_finite(), "transcendental function result is not a finite number");
    Decimal::from_f64(v)
}

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    match result {
        Ok(r) => r,
        Err(e) => SystemCallResult::from_error(e),
    }
}

pub fn abs(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(unary(input, Decimal::abs))
}

pub fn ceil(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(unary(input, Decimal::ceil))
}

pub fn floor(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(unary(input, Decimal::floor))
}

pub fn trunc(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(unary(input, Decimal::trunc))
}

pub fn round(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(unary(input, Decimal::round))
}

pub fn exp(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let d = expect_decimal(input.get_value(-1))?;
        Ok(SystemCallResult::value(Value::from_decimal(finite_decimal(d.to_f64().exp()))))
    })())
}

pub fn log(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let d = expect_decimal(input.get_value(-1))?;
        Ok(SystemCallResult::value(Value::from_decimal(finite_decimal(d.to_f64().ln()))))
    })())
}

pub fn log10(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let d = expect_decimal(input.get_value(-1))?;
        Ok(SystemCallResult::value(Value::from_decimal(finite_decimal(d.to_f64().log10()))))
    })())
}

pub fn sqr(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let d = expect_decimal(input.get_value(-1))?;
        Ok(SystemCallResult::value(Value::from_decimal(finite_decimal(d.to_f64().sqrt()))))
    })())
}

pub fn pow(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let base = expect_decimal(input.get_value(-2))?.to_f64();
        let exponent = expect_decimal(input.get_value(-1))?.to_f64();
        Ok(SystemCallResult::value(Value::from_decimal(finite_decimal(base.powf(exponent)))))
    })())
}

pub fn add(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(binary(input, Decimal::add))
}

pub fn subtract(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(binary(input, Decimal::sub))
}

pub fn multiply(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(binary(input, Decimal::mul))
}

pub fn divide(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(binary(input, Decimal::div))
}

pub fn modulus(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(binary(input, Decimal::modulus))
}

fn transcendental_unary(input: &mut SystemCallInput, f: impl Fn(f64) -> f64) -> Result<SystemCallResult, Error> {
    let d = expect_decimal(input.get_value(-1))?;
    Ok(SystemCallResult::value(Value::from_decimal(Decimal::from_f64(f(d.to_f64())))))
}

pub fn acos(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(transcendental_unary(input, f64::acos))
}

pub fn asin(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(transcendental_unary(input, f64::asin))
}

pub fn atan(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(transcendental_unary(input, f64::atan))
}

pub fn cos(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(transcendental_unary(input, f64::cos))
}

pub fn sin(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(transcendental_unary(input, f64::sin))
}

pub fn tan(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(transcendental_unary(input, f64::tan))
}

pub fn atan2(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let y = expect_decimal(input.get_value(-2))?.to_f64();
        let x = expect_decimal(input.get_value(-1))?.to_f64();
        Ok(SystemCallResult::value(Value::from_decimal(Decimal::from_f64(y.atan2(x)))))
    })())
}

fn comparison(input: &mut SystemCallInput, f: impl Fn(&Decimal, &Decimal) -> bool) -> Result<SystemCallResult, Error> {
    let a = expect_decimal(input.get_value(-2))?.clone();
    let b = expect_decimal(input.get_value(-1))?;
    Ok(SystemCallResult::value(decimal_value(f(&a, b) as i64)))
}

pub fn number_equals(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(comparison(input, |a, b| a == b))
}

pub fn number_not_equals(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(comparison(input, |a, b| a != b))
}

pub fn number_less_than(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(comparison(input, |a, b| a < b))
}

pub fn number_less_than_equals(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(comparison(input, |a, b| a <= b))
}

pub fn number_greater_than(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(comparison(input, |a, b| a > b))
}

pub fn number_greater_than_equals(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault(comparison(input, |a, b| a >= b))
}

/// Reads `(counter, limit, step)` from the top three value-stack slots;
/// true iff the counter has moved past the limit in the step's direction —
/// `step >= 0 => counter > limit`, else `counter < limit`. Matches
/// `for ... to ... step ...` loop-continuation semantics.
pub fn counter_is_past_limit(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let counter = expect_decimal(input.get_value(-3))?.clone();
        let limit = expect_decimal(input.get_value(-2))?.clone();
        let step = expect_decimal(input.get_value(-1))?;
        let past = if !step.is_negative() { counter > limit } else { counter < limit };
        Ok(SystemCallResult::value(Value::from_bool(past)))
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::object::Object;
    use std::rc::Rc;

    fn call(which: fn(&mut SystemCallInput) -> SystemCallResult, values: Vec<Value>) -> SystemCallResult {
        let objects: Vec<Rc<Object>> = Vec::new();
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let n = values.len();
        let mut input = SystemCallInput::new(&values, &objects, n, 0, &mut input_stream, &mut output_stream, None);
        which(&mut input)
    }

    #[test]
    fn test_modulus_scenario() {
        let result = call(modulus, vec![Value::from_decimal(Decimal::from_i64(7)), Value::from_decimal(Decimal::from_i64(3))]);
        assert_eq!(result.returned_value, Some(Value::from_decimal(Decimal::from_i64(1))));
    }

    #[test]
    fn test_number_comparisons_are_mutually_exclusive() {
        let a = Value::from_decimal(Decimal::from_i64(2));
        let b = Value::from_decimal(Decimal::from_i64(5));
        let lt = call(number_less_than, vec![a.clone(), b.clone()]).returned_value.unwrap().get_int64();
        let eq = call(number_equals, vec![a.clone(), b.clone()]).returned_value.unwrap().get_int64();
        let gt = call(number_greater_than, vec![a, b]).returned_value.unwrap().get_int64();
        assert_eq!(lt + eq + gt, 1);
    }

    #[test]
    fn test_counter_is_past_limit_ascending() {
        let counter = Value::from_decimal(Decimal::from_i64(11));
        let limit = Value::from_decimal(Decimal::from_i64(10));
        let step = Value::from_decimal(Decimal::from_i64(1));
        let result = call(counter_is_past_limit, vec![counter, limit, step]);
        assert_eq!(result.returned_value, Some(Value::from_bool(true)));
    }

    #[test]
    fn test_counter_is_past_limit_descending() {
        let counter = Value::from_decimal(Decimal::from_i64(9));
        let limit = Value::from_decimal(Decimal::from_i64(10));
        let step = Value::from_decimal(Decimal::from_i64(-1));
        let result = call(counter_is_past_limit, vec![counter, limit, step]);
        assert_eq!(result.returned_value, Some(Value::from_bool(true)));
    }

    #[test]
    fn test_pow_widens_through_f64() {
        let result = call(pow, vec![Value::from_decimal(Decimal::from_i64(2)), Value::from_decimal(Decimal::from_i64(10))]);
        assert_eq!(result.returned_value, Some(Value::from_decimal(Decimal::from_i64(1024))));
    }

    #[test]
    fn test_asin_out_of_domain_is_not_an_error() {
        let result = call(asin, vec![Value::from_decimal(Decimal::from_i64(2))]);
        assert!(!result.has_error());
        assert!(result.returned_value.is_some());
    }

    #[test]
    fn test_acos_out_of_domain_is_not_an_error() {
        let result = call(acos, vec![Value::from_decimal(Decimal::from_i64(2))]);
        assert!(!result.has_error());
        assert!(result.returned_value.is_some());
    }

    #[test]
    fn test_type_mismatch_faults_internal_type_confusion() {
        let result = call(abs, vec![Value::from_bool(true)]);
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::InternalTypeConfusion);
    }
}
