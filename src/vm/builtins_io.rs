//! Console and file-system intrinsics, plus error introspection.
//!
//! Grounds spec.md §4.5's "I/O" cluster and "Error introspection", and the
//! original's `InputString`/`PrintString`/`ReadFileText`/`WriteFileLines`
//! lambdas in `systemCall.cpp`. File text I/O is UTF-8. Reading splits on any
//! of `\r\n`, `\n`, or a lone `\r` (see [`split_lines`]; a missing trailing
//! terminator produces no trailing empty line). Writing joins with
//! [`LINE_TERMINATOR`], the platform-appropriate newline. Every file
//! intrinsic routes its `std::io::Error` through [`crate::vm::error::io_error`]
//! for the fixed POSIX-to-`ErrorCode` translation in spec.md §4.2.

use std::io::{BufRead, Write};
use std::rc::Rc;

use crate::vm::builtins_common::{decimal_value, expect_string};
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::error::{io_error, Error};
use crate::vm::object::{string_object, string_to_rust, Object};
use crate::vm::value::Value;

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    result.unwrap_or_else(SystemCallResult::from_error)
}

fn path_from(o: &Rc<Object>) -> Result<String, Error> {
    expect_string(o).map(|units| string_to_rust(units))
}

/// The newline [`write_file_lines`] joins lines with.
const LINE_TERMINATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Splits `text` on `\r\n`, `\n`, or a lone `\r`, stripping the terminator —
/// unlike `str::lines`, which never treats a lone `\r` as a boundary.
fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Reads one line from the console input stream, stripping the trailing
/// delimiter. Returns an empty string at end of stream.
pub fn input_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let mut line = String::new();
        let mut reader = std::io::BufReader::new(input.console_input());
        reader.read_line(&mut line).map_err(|e| io_error(&e, "<console>"))?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(SystemCallResult::object(Rc::new(string_object(&line))))
    })())
}

/// Writes a string to the console output stream with no implicit newline.
pub fn print_string(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let units = expect_string(input.get_object(-1))?.clone();
        let text = string_to_rust(&units);
        input.console_output().write_all(text.as_bytes()).map_err(|e| io_error(&e, "<console>"))?;
        Ok(SystemCallResult::empty())
    })())
}

pub fn flush_console_output(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        input.console_output().flush().map_err(|e| io_error(&e, "<console>"))?;
        Ok(SystemCallResult::empty())
    })())
}

pub fn read_file_text(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let path = path_from(input.get_object(-1))?;
        log::trace!("ReadFileText {path}");
        let text = std::fs::read_to_string(&path).map_err(|e| io_error(&e, &path))?;
        Ok(SystemCallResult::object(Rc::new(string_object(&text))))
    })())
}

pub fn read_file_lines(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let path = path_from(input.get_object(-1))?;
        log::trace!("ReadFileLines {path}");
        let text = std::fs::read_to_string(&path).map_err(|e| io_error(&e, &path))?;
        let list: im::Vector<Rc<Object>> = split_lines(&text).into_iter().map(|line| Rc::new(string_object(line))).collect();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(list))))
    })())
}

pub fn write_file_text(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let path = path_from(input.get_object(-2))?;
        let units = expect_string(input.get_object(-1))?.clone();
        let text = string_to_rust(&units);
        log::trace!("WriteFileText {path} ({} bytes)", text.len());
        std::fs::write(&path, text).map_err(|e| io_error(&e, &path))?;
        Ok(SystemCallResult::empty())
    })())
}

pub fn write_file_lines(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let path = path_from(input.get_object(-2))?;
        let list = expect_object_list_of_strings(input.get_object(-1))?;
        let mut text = list.join(LINE_TERMINATOR);
        if !list.is_empty() {
            text.push_str(LINE_TERMINATOR);
        }
        log::trace!("WriteFileLines {path} ({} lines)", list.len());
        std::fs::write(&path, text).map_err(|e| io_error(&e, &path))?;
        Ok(SystemCallResult::empty())
    })())
}

/// A missing file is not an error, matching the original's
/// `std::filesystem::remove(path, ec)` with `ec` ignored for "not found".
pub fn delete_file(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let path = path_from(input.get_object(-1))?;
        log::trace!("DeleteFile {path}");
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(SystemCallResult::empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SystemCallResult::empty()),
            Err(e) => Err(io_error(&e, &path)),
        }
    })())
}

/// Valid only inside a `catch` body; reads the dispatcher-populated
/// `active_error`. Outside a `catch`, returns `0`/empty like a no-op read.
pub fn error_code(input: &mut SystemCallInput) -> SystemCallResult {
    let code = input.active_error.map(|e| e.code.as_i32()).unwrap_or(0);
    SystemCallResult::value(decimal_value(code as i64))
}

pub fn error_message(input: &mut SystemCallInput) -> SystemCallResult {
    let message = input.active_error.map(|e| e.message.clone()).unwrap_or_default();
    SystemCallResult::object(Rc::new(string_object(&message)))
}

fn expect_object_list_of_strings(o: &Rc<Object>) -> Result<Vec<String>, Error> {
    let list = o.as_object_list().ok_or_else(|| Error::internal_type_confusion("expected an ObjectList of strings"))?;
    list.iter().map(|item| expect_string(item).map(|units| string_to_rust(units))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(which: fn(&mut SystemCallInput) -> SystemCallResult, values: Vec<Value>, objects: Vec<Rc<Object>>, input_bytes: &[u8]) -> (SystemCallResult, Vec<u8>) {
        let mut input_stream: &[u8] = input_bytes;
        let mut output_stream = Vec::new();
        let vn = values.len();
        let on = objects.len();
        let mut input = SystemCallInput::new(&values, &objects, vn, on, &mut input_stream, &mut output_stream, None);
        let result = which(&mut input);
        (result, output_stream)
    }

    #[test]
    fn test_input_string_strips_newline() {
        let (result, _) = call(input_string, vec![], vec![], b"hello\n");
        assert_eq!(string_to_rust(result.returned_object.unwrap().as_string().unwrap()), "hello");
    }

    #[test]
    fn test_print_string_writes_without_newline() {
        let text = Rc::new(string_object("hi"));
        let (_, output) = call(print_string, vec![], vec![text], b"");
        assert_eq!(output, b"hi");
    }

    #[test]
    fn test_read_file_text_missing_path_faults_file_not_found() {
        let path = Rc::new(string_object("/nonexistent/path/for/tmbasic/test.txt"));
        let (result, _) = call(read_file_text, vec![], vec![path], b"");
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::FileNotFound);
    }

    #[test]
    fn test_delete_file_missing_is_not_an_error() {
        let path = Rc::new(string_object("/nonexistent/path/for/tmbasic/delete-test.txt"));
        let (result, _) = call(delete_file, vec![], vec![path], b"");
        assert!(!result.has_error());
    }

    #[test]
    fn test_write_then_read_file_text_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("tmbasic_vm_runtime_test_{:p}.txt", &dir));
        let path_str = path.to_string_lossy().to_string();
        let path_obj = Rc::new(string_object(&path_str));
        let text_obj = Rc::new(string_object("roundtrip"));
        let (write_result, _) = call(write_file_text, vec![], vec![Rc::clone(&path_obj), text_obj], b"");
        assert!(!write_result.has_error());
        let (read_result, _) = call(read_file_text, vec![], vec![path_obj], b"");
        assert_eq!(string_to_rust(read_result.returned_object.unwrap().as_string().unwrap()), "roundtrip");
        let _ = std::fs::remove_file(&path_str);
    }

    #[test]
    fn test_split_lines_accepts_mixed_terminators() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\r\n"), vec!["a"]);
        assert_eq!(split_lines(""), Vec::<&str>::new());
    }

    #[test]
    fn test_read_file_lines_splits_on_lone_cr() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("tmbasic_vm_runtime_test_cr_{:p}.txt", &dir));
        let path_str = path.to_string_lossy().to_string();
        std::fs::write(&path_str, "first\rsecond\rthird").unwrap();
        let path_obj = Rc::new(string_object(&path_str));
        let (result, _) = call(read_file_lines, vec![], vec![path_obj], b"");
        let items = result.returned_object.unwrap();
        let texts: Vec<String> = items.as_object_list().unwrap().iter().map(|o| string_to_rust(o.as_string().unwrap())).collect();
        assert_eq!(texts, vec!["first".to_string(), "second".to_string(), "third".to_string()]);
        let _ = std::fs::remove_file(&path_str);
    }

    #[test]
    fn test_error_code_and_message_read_active_error() {
        let err = Error::list_is_empty();
        let values: Vec<Value> = Vec::new();
        let objects: Vec<Rc<Object>> = Vec::new();
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let mut input = SystemCallInput::new(&values, &objects, 0, 0, &mut input_stream, &mut output_stream, Some(&err));
        let code_result = error_code(&mut input);
        assert_eq!(code_result.returned_value, Some(decimal_value(2)));
        let message_result = error_message(&mut input);
        assert_eq!(string_to_rust(message_result.returned_object.unwrap().as_string().unwrap()), "List is empty.");
    }
}
