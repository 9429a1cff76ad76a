//! The system-call runtime: value/object data model, operand-stack ABI,
//! error taxonomy, dispatch table, and the full intrinsic library.

pub mod builtins_arithmetic;
pub mod builtins_common;
pub mod builtins_datetime;
pub mod builtins_io;
pub mod builtins_list;
pub mod builtins_map;
pub mod builtins_optional;
pub mod builtins_string;
pub mod call;
pub mod decimal;
pub mod dispatch;
pub mod error;
pub mod object;
pub mod value;

pub use call::{StackLimits, SystemCallInput, SystemCallResult, DEFAULT_OBJECT_STACK_SIZE, DEFAULT_VALUE_STACK_SIZE};
pub use decimal::Decimal;
pub use dispatch::{call, SystemCall};
pub use error::{Error, ErrorCode, Result};
pub use object::{Object, ObjectKind};
pub use value::Value;
