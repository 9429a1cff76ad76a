//! tmbasic VM runtime
//!
//! This crate provides the system-call runtime for a BASIC-dialect virtual
//! machine. It includes:
//!
//! - `Value`/`Object` for the VM's tagged-union data model
//! - `SystemCallInput`/`SystemCallResult` for the operand-stack calling
//!   convention
//! - `Error`/`ErrorCode` for the closed error taxonomy
//! - the dispatch table and full intrinsic library (arithmetic, strings,
//!   date/time, lists, maps, optionals, I/O)

pub mod vm;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use tmbasic_vm_runtime::prelude::*;
/// ```
pub mod prelude {
    pub use super::vm::{
        call, Decimal, Error, ErrorCode, Object, ObjectKind, Result, StackLimits, SystemCall, SystemCallInput,
        SystemCallResult, Value, DEFAULT_OBJECT_STACK_SIZE, DEFAULT_VALUE_STACK_SIZE,
    };
}

pub use prelude::*;
