//! The closed error taxonomy every intrinsic raises into.
//!
//! Mirrors `vm::ErrorCode`/`vm::Error` in the original tmbasic `systemCall.cpp`:
//! a fixed set of recoverable fault kinds plus a free-form message, captured by
//! the dispatcher and handed back to the interpreter as part of a
//! [`crate::vm::call::SystemCallResult`] rather than unwound as a native panic.

use thiserror::Error;

/// A recoverable fault an intrinsic can raise.
///
/// The numeric discriminant is part of the embedding interpreter's ABI
/// (surfaced to BASIC code via the `ErrorCode` intrinsic), so variant order
/// must not change; new codes are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    InvalidArgument = 0,
    ListIndexOutOfRange = 1,
    ListIsEmpty = 2,
    MapKeyNotFound = 3,
    ValueNotPresent = 4,
    InvalidLocaleName = 5,
    InvalidTimeZone = 6,
    InternalIcuError = 7,
    InternalTypeConfusion = 8,
    FileNotFound = 9,
    AccessDenied = 10,
    PathTooLong = 11,
    DiskFull = 12,
    PathIsDirectory = 13,
    IoFailure = 14,
}

impl ErrorCode {
    /// The raw integer surfaced to BASIC code through the `ErrorCode` intrinsic.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// An error raised by an intrinsic: a closed [`ErrorCode`] plus a
/// human-readable message.
///
/// Any other panic or fault that escapes an intrinsic body is caught at the
/// dispatch boundary (see [`crate::vm::dispatch::call`]) and reported with
/// code `-1`, so `Error` is the only fault type any intrinsic needs to raise
/// deliberately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn list_index_out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ListIndexOutOfRange, message)
    }

    pub fn list_is_empty() -> Self {
        Self::new(ErrorCode::ListIsEmpty, "List is empty.")
    }

    pub fn map_key_not_found() -> Self {
        Self::new(ErrorCode::MapKeyNotFound, "The given key was not present in the map.")
    }

    pub fn value_not_present() -> Self {
        Self::new(ErrorCode::ValueNotPresent, "Optional value is not present.")
    }

    pub fn invalid_locale_name() -> Self {
        Self::new(ErrorCode::InvalidLocaleName, "The locale name is invalid or unsupported.")
    }

    pub fn invalid_time_zone() -> Self {
        Self::new(ErrorCode::InvalidTimeZone, "The specified time zone was not found.")
    }

    pub fn internal_type_confusion(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalTypeConfusion, message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Translates a POSIX `errno` into an [`ErrorCode`], following the fixed
/// table in spec.md §4.2.
pub fn file_error(errno: i32, path: &str) -> Error {
    match errno {
        ENOENT => Error::new(ErrorCode::FileNotFound, format!("The file \"{path}\" does not exist.")),
        EACCES => Error::new(ErrorCode::AccessDenied, format!("Access to the file \"{path}\" was denied.")),
        ENAMETOOLONG => Error::new(ErrorCode::PathTooLong, format!("The path \"{path}\" is too long.")),
        ENOSPC => Error::new(ErrorCode::DiskFull, format!("The disk containing the file \"{path}\" is out of space.")),
        EISDIR => Error::new(ErrorCode::PathIsDirectory, format!("The path \"{path}\" is a directory.")),
        other => Error::new(
            ErrorCode::IoFailure,
            format!("Failed to access the file \"{path}\". {}", errno_strerror(other)),
        ),
    }
}

/// Translates an [`std::io::Error`] raised while touching `path` into an
/// [`Error`], using the `raw_os_error` when available and falling back to
/// `IoFailure` with the formatted error otherwise.
pub fn io_error(err: &std::io::Error, path: &str) -> Error {
    match err.raw_os_error() {
        Some(errno) => file_error(errno, path),
        None => Error::new(ErrorCode::IoFailure, format!("Failed to access the file \"{path}\". {err}")),
    }
}

// Minimal POSIX errno constants so this module has no libc dependency; values
// match every mainstream POSIX platform (Linux, macOS, BSD).
const ENOENT: i32 = 2;
const EACCES: i32 = 13;
const ENOSPC: i32 = 28;
const EISDIR: i32 = 21;
#[cfg(target_os = "linux")]
const ENAMETOOLONG: i32 = 36;
#[cfg(not(target_os = "linux"))]
const ENAMETOOLONG: i32 = 63;

fn errno_strerror(errno: i32) -> String {
    std::io::Error::from_raw_os_error(errno).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_message() {
        let err = Error::new(ErrorCode::ListIsEmpty, "List is empty.");
        assert_eq!(format!("{err}"), "List is empty.");
    }

    #[test]
    fn test_error_code_as_i32_is_stable() {
        assert_eq!(ErrorCode::InvalidArgument.as_i32(), 0);
        assert_eq!(ErrorCode::IoFailure.as_i32(), 14);
    }

    #[test]
    fn test_file_error_translates_enoent() {
        let err = file_error(ENOENT, "/tmp/missing.txt");
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.message.contains("/tmp/missing.txt"));
    }

    #[test]
    fn test_file_error_translates_eacces() {
        let err = file_error(EACCES, "/root/secret.txt");
        assert_eq!(err.code, ErrorCode::AccessDenied);
    }

    #[test]
    fn test_file_error_unknown_errno_is_io_failure() {
        let err = file_error(9999, "/tmp/x.txt");
        assert_eq!(err.code, ErrorCode::IoFailure);
    }

    #[test]
    fn test_constructors_set_expected_codes() {
        assert_eq!(Error::list_is_empty().code, ErrorCode::ListIsEmpty);
        assert_eq!(Error::value_not_present().code, ErrorCode::ValueNotPresent);
        assert_eq!(Error::invalid_time_zone().code, ErrorCode::InvalidTimeZone);
    }
}
