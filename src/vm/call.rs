//! The ABI between the interpreter and every intrinsic:
//! [`SystemCallInput`] (read-only view of the stacks and console streams)
//! and [`SystemCallResult`] (what the intrinsic hands back).
//!
//! Grounds spec.md §4.3 directly in the original's `SystemCallInput`
//! constructor in `systemCall.cpp`: two parallel operand stacks, one-past-top
//! indices, abstract console streams, and the currently-active error (only
//! meaningful inside a `catch` body).

use std::io::{Read, Write};
use std::rc::Rc;

use crate::vm::error::Error;
use crate::vm::object::Object;
use crate::vm::value::Value;

/// Capacities of the two operand stacks. The interpreter enforces overflow;
/// an intrinsic never observes more than it declared arity for.
///
/// Mirrors the original's `kValueStackSize`/`kObjectStackSize` constants,
/// made an explicit, host-constructible configuration surface rather than
/// process-wide globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLimits {
    pub value_stack_size: usize,
    pub object_stack_size: usize,
}

pub const DEFAULT_VALUE_STACK_SIZE: usize = 2048;
pub const DEFAULT_OBJECT_STACK_SIZE: usize = 2048;

impl Default for StackLimits {
    fn default() -> Self {
        StackLimits {
            value_stack_size: DEFAULT_VALUE_STACK_SIZE,
            object_stack_size: DEFAULT_OBJECT_STACK_SIZE,
        }
    }
}

/// Read-only view an intrinsic receives: both operand stacks, their
/// one-past-top indices, the console streams, and the currently-handled
/// error (populated only while a `catch` body is executing).
///
/// An intrinsic must never pop its own arguments — the interpreter owns
/// stack-frame adjustment after `call` returns — and must not retain a
/// reference to `self` beyond its own activation; both are enforced by
/// the borrow checker via the lifetime parameter.
pub struct SystemCallInput<'a> {
    value_stack: &'a [Value],
    object_stack: &'a [Rc<Object>],
    value_stack_index: usize,
    object_stack_index: usize,
    console_input: &'a mut dyn Read,
    console_output: &'a mut dyn Write,
    pub active_error: Option<&'a Error>,
}

impl<'a> SystemCallInput<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        value_stack: &'a [Value],
        object_stack: &'a [Rc<Object>],
        value_stack_index: usize,
        object_stack_index: usize,
        console_input: &'a mut dyn Read,
        console_output: &'a mut dyn Write,
        active_error: Option<&'a Error>,
    ) -> Self {
        SystemCallInput {
            value_stack,
            object_stack,
            value_stack_index,
            object_stack_index,
            console_input,
            console_output,
            active_error,
        }
    }

    /// Indexes the value stack from the top; `-1` is the top element.
    pub fn get_value(&self, offset_from_top: i32) -> &Value {
        &self.value_stack[self.index(self.value_stack_index, offset_from_top)]
    }

    /// Indexes the object stack from the top; `-1` is the top element.
    pub fn get_object(&self, offset_from_top: i32) -> &Rc<Object> {
        &self.object_stack[self.index(self.object_stack_index, offset_from_top)]
    }

    /// Clones the shared handle at the given depth, for results that need to
    /// outlive this activation.
    pub fn get_object_ptr(&self, offset_from_top: i32) -> Rc<Object> {
        Rc::clone(self.get_object(offset_from_top))
    }

    pub fn console_input(&mut self) -> &mut dyn Read {
        self.console_input
    }

    pub fn console_output(&mut self) -> &mut dyn Write {
        self.console_output
    }

    fn index(&self, stack_index: usize, offset_from_top: i32) -> usize {
        (stack_index as i64 + offset_from_top as i64) as usize
    }
}

/// What an intrinsic hands back: at most one of a returned value or a
/// returned object (per its declared shape), or an error.
///
/// `errorCode`/`errorMessage` in spec.md §4.3 are plain integers and
/// strings, not necessarily one of the closed [`ErrorCode`] variants: a
/// native fault caught at the dispatch boundary (see [`crate::vm::dispatch::call`])
/// reports `code = -1` with no corresponding `ErrorCode`, so the raw
/// "fault" path is kept separate from `error` and `error_code`/`error_message`
/// read through whichever is set.
#[derive(Debug, Default)]
pub struct SystemCallResult {
    pub returned_value: Option<Value>,
    pub returned_object: Option<Rc<Object>>,
    pub error: Option<Error>,
    pub native_fault: Option<String>,
}

impl SystemCallResult {
    pub fn value(v: Value) -> Self {
        SystemCallResult { returned_value: Some(v), returned_object: None, error: None, native_fault: None }
    }

    pub fn object(o: Rc<Object>) -> Self {
        SystemCallResult { returned_value: None, returned_object: Some(o), error: None, native_fault: None }
    }

    pub fn empty() -> Self {
        SystemCallResult::default()
    }

    pub fn from_error(error: Error) -> Self {
        SystemCallResult { returned_value: None, returned_object: None, error: Some(error), native_fault: None }
    }

    /// Records a native fault (a panic caught at the dispatch boundary) as
    /// `code = -1` with the panic's message.
    pub fn from_fault(message: impl Into<String>) -> Self {
        SystemCallResult { returned_value: None, returned_object: None, error: None, native_fault: Some(message.into()) }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some() || self.native_fault.is_some()
    }

    pub fn error_code(&self) -> Option<i32> {
        if self.native_fault.is_some() {
            return Some(-1);
        }
        self.error.as_ref().map(|e| e.code.as_i32())
    }

    pub fn error_message(&self) -> Option<&str> {
        if let Some(m) = &self.native_fault {
            return Some(m);
        }
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

impl From<Result<Value, Error>> for SystemCallResult {
    fn from(result: Result<Value, Error>) -> Self {
        match result {
            Ok(v) => SystemCallResult::value(v),
            Err(e) => SystemCallResult::from_error(e),
        }
    }
}

impl From<Result<Rc<Object>, Error>> for SystemCallResult {
    fn from(result: Result<Rc<Object>, Error>) -> Self {
        match result {
            Ok(o) => SystemCallResult::object(o),
            Err(e) => SystemCallResult::from_error(e),
        }
    }
}

impl From<Result<(), Error>> for SystemCallResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => SystemCallResult::empty(),
            Err(e) => SystemCallResult::from_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_value_indexes_from_top() {
        let values = vec![Value::from_i64(10), Value::from_i64(20), Value::from_i64(30)];
        let objects: Vec<Rc<Object>> = Vec::new();
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let input = SystemCallInput::new(&values, &objects, 3, 0, &mut input_stream, &mut output_stream, None);
        assert_eq!(*input.get_value(-1), Value::from_i64(30));
        assert_eq!(*input.get_value(-3), Value::from_i64(10));
    }

    #[test]
    fn test_result_from_ok_value() {
        let result: SystemCallResult = Ok(Value::from_i64(1)).into();
        assert!(!result.has_error());
        assert_eq!(result.returned_value, Some(Value::from_i64(1)));
    }

    #[test]
    fn test_result_from_err() {
        let result: SystemCallResult = Err::<Value, _>(Error::list_is_empty()).into();
        assert!(result.has_error());
    }
}
