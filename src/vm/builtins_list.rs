//! Persistent list inspection, slicing, builders, and structural edits.
//!
//! Grounds spec.md §4.5's "Lists" cluster and the original's
//! `systemCallListFirstOrLast`/`ListMid`/`ListSkipOrTake` in
//! `systemCalls.lists.cpp`. `ValueList`/`ObjectList` are `im::Vector`s, so
//! every structural edit (`Add`, `Set`, `Concat`) shares storage with its
//! source per spec.md §3's persistent-collection requirement; builders are
//! a plain `Vec` behind a `RefCell`, matching the original's
//! single-producer `…BuilderAdd`/`…BuilderEnd` pattern.

use std::rc::Rc;

use im::Vector;

use crate::vm::builtins_common::{decimal_value, expect_decimal, expect_object_list, expect_object_list_builder, expect_value_list, expect_value_list_builder};
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::error::Error;
use crate::vm::object::Object;
use crate::vm::value::Value;

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    result.unwrap_or_else(SystemCallResult::from_error)
}

/// Dispatches on whichever of `ValueList`/`ObjectList` is actually on the
/// stack, matching the original's `valueOrObjectList` helper — `ListLen`,
/// `ListFirst`, `ListMid`, etc. are declared once and accept either kind.
enum AnyList<'a> {
    Value(&'a Vector<Value>),
    Object(&'a Vector<Rc<Object>>),
}

impl<'a> AnyList<'a> {
    fn of(object: &'a Rc<Object>) -> Result<Self, Error> {
        match object.as_ref() {
            Object::ValueList(l) => Ok(AnyList::Value(l)),
            Object::ObjectList(l) => Ok(AnyList::Object(l)),
            _ => Err(Error::internal_type_confusion("expected a ValueList or ObjectList")),
        }
    }

    fn len(&self) -> usize {
        match self {
            AnyList::Value(l) => l.len(),
            AnyList::Object(l) => l.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn first(&self) -> SystemCallResult {
        match self {
            AnyList::Value(l) => SystemCallResult::value(l.front().expect("checked non-empty").clone()),
            AnyList::Object(l) => SystemCallResult::object(Rc::clone(l.front().expect("checked non-empty"))),
        }
    }

    fn last(&self) -> SystemCallResult {
        match self {
            AnyList::Value(l) => SystemCallResult::value(l.back().expect("checked non-empty").clone()),
            AnyList::Object(l) => SystemCallResult::object(Rc::clone(l.back().expect("checked non-empty"))),
        }
    }

    fn mid(&self, start: usize, count: usize) -> Rc<Object> {
        match self {
            AnyList::Value(l) => Rc::new(Object::ValueList(l.clone().slice(start..(start + count).min(l.len())))),
            AnyList::Object(l) => Rc::new(Object::ObjectList(l.clone().slice(start..(start + count).min(l.len())))),
        }
    }

    fn skip(&self, n: usize) -> Rc<Object> {
        match self {
            AnyList::Value(l) => {
                let mut rest = l.clone();
                rest.slice(..n.min(l.len()));
                Rc::new(Object::ValueList(rest))
            }
            AnyList::Object(l) => {
                let mut rest = l.clone();
                rest.slice(..n.min(l.len()));
                Rc::new(Object::ObjectList(rest))
            }
        }
    }

    fn take(&self, n: usize) -> Rc<Object> {
        self.mid(0, n)
    }
}

pub fn list_len(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = AnyList::of(input.get_object(-1))?;
        Ok(SystemCallResult::value(decimal_value(list.len() as i64)))
    })())
}

pub fn list_first(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = AnyList::of(input.get_object(-1))?;
        if list.is_empty() {
            return Err(Error::list_is_empty());
        }
        Ok(list.first())
    })())
}

pub fn list_last(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = AnyList::of(input.get_object(-1))?;
        if list.is_empty() {
            return Err(Error::list_is_empty());
        }
        Ok(list.last())
    })())
}

/// `start < 0` / `start >= size` fault `ListIndexOutOfRange`; `count < 0`
/// faults `InvalidArgument`; an overshooting `start + count` silently
/// clamps to the available tail.
pub fn list_mid(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = AnyList::of(input.get_object(-1))?;
        let start = expect_decimal(input.get_value(-2))?.to_i64();
        let count = expect_decimal(input.get_value(-1))?.to_i64();
        if count < 0 {
            return Err(Error::invalid_argument("Count must be non-negative."));
        }
        if start < 0 {
            return Err(Error::list_index_out_of_range("Start must be non-negative."));
        }
        if start as usize >= list.len() {
            return Err(Error::list_index_out_of_range("Index out of range."));
        }
        Ok(SystemCallResult::object(list.mid(start as usize, count as usize)))
    })())
}

pub fn list_skip(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = AnyList::of(input.get_object(-1))?;
        let n = expect_decimal(input.get_value(-1))?.to_i64();
        if n < 0 {
            return Err(Error::invalid_argument("Count must be non-negative."));
        }
        Ok(SystemCallResult::object(list.skip(n as usize)))
    })())
}

pub fn list_take(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = AnyList::of(input.get_object(-1))?;
        let n = expect_decimal(input.get_value(-1))?.to_i64();
        if n < 0 {
            return Err(Error::invalid_argument("Count must be non-negative."));
        }
        Ok(SystemCallResult::object(list.take(n as usize)))
    })())
}

pub fn list_fill_v(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let value = input.get_value(-2).clone();
        let n = expect_decimal(input.get_value(-1))?.to_i64();
        if n < 0 {
            return Err(Error::invalid_argument("Count must be non-negative."));
        }
        let list: Vector<Value> = std::iter::repeat(value).take(n as usize).collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

pub fn list_fill_o(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let object = input.get_object_ptr(-2);
        let n = expect_decimal(input.get_value(-1))?.to_i64();
        if n < 0 {
            return Err(Error::invalid_argument("Count must be non-negative."));
        }
        let list: Vector<Rc<Object>> = std::iter::repeat(object).take(n as usize).collect();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(list))))
    })())
}

pub fn value_list_builder_new(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ValueListBuilder(std::cell::RefCell::new(Vec::new()))))
}

pub fn object_list_builder_new(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ObjectListBuilder(std::cell::RefCell::new(Vec::new()))))
}

pub fn value_list_builder_add(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let builder = expect_value_list_builder(input.get_object(-1))?;
        let value = input.get_value(-1).clone();
        builder.borrow_mut().push(value);
        Ok(SystemCallResult::empty())
    })())
}

/// Rejects adding a builder as an element — the original's
/// `assert(obj->getObjectType() != ObjectType::kObjectListBuilder)`.
pub fn object_list_builder_add(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let builder = expect_object_list_builder(input.get_object(-2))?;
        let element = input.get_object_ptr(-1);
        if element.is_builder() {
            return Err(Error::internal_type_confusion("cannot add a builder as a list element"));
        }
        builder.borrow_mut().push(element);
        Ok(SystemCallResult::empty())
    })())
}

pub fn value_list_builder_end(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let builder = expect_value_list_builder(input.get_object(-1))?;
        let items = builder.borrow().clone();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(Vector::from(items)))))
    })())
}

pub fn object_list_builder_end(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let builder = expect_object_list_builder(input.get_object(-1))?;
        let items = builder.borrow().clone();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(Vector::from(items)))))
    })())
}

pub fn value_list_add(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_value_list(input.get_object(-1))?;
        let mut updated = list.clone();
        updated.push_back(input.get_value(-1).clone());
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(updated))))
    })())
}

pub fn object_list_add(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_object_list(input.get_object(-2))?;
        let mut updated = list.clone();
        updated.push_back(input.get_object_ptr(-1));
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(updated))))
    })())
}

pub fn value_list_set(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_value_list(input.get_object(-1))?;
        let index = expect_decimal(input.get_value(-2))?.to_i64();
        if index < 0 || index as usize >= list.len() {
            return Err(Error::list_index_out_of_range("Index out of range."));
        }
        let mut updated = list.clone();
        updated.set(index as usize, input.get_value(-1).clone());
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(updated))))
    })())
}

pub fn object_list_set(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_object_list(input.get_object(-2))?;
        let index = expect_decimal(input.get_value(-1))?.to_i64();
        if index < 0 || index as usize >= list.len() {
            return Err(Error::list_index_out_of_range("Index out of range."));
        }
        let element = input.get_object_ptr(-1);
        let mut updated = list.clone();
        updated.set(index as usize, element);
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(updated))))
    })())
}

pub fn value_list_concat(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let a = expect_value_list(input.get_object(-2))?;
        let b = expect_value_list(input.get_object(-1))?;
        let mut combined = a.clone();
        combined.append(b.clone());
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(combined))))
    })())
}

pub fn object_list_concat(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let a = expect_object_list(input.get_object(-2))?;
        let b = expect_object_list(input.get_object(-1))?;
        let mut combined = a.clone();
        combined.append(b.clone());
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(combined))))
    })())
}

pub fn value_list_get(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_value_list(input.get_object(-1))?;
        let index = expect_decimal(input.get_value(-1))?.to_i64();
        if index < 0 || index as usize >= list.len() {
            return Err(Error::list_index_out_of_range("Index out of range."));
        }
        Ok(SystemCallResult::value(list[index as usize].clone()))
    })())
}

pub fn object_list_get(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let list = expect_object_list(input.get_object(-1))?;
        let index = expect_decimal(input.get_value(-1))?.to_i64();
        if index < 0 || index as usize >= list.len() {
            return Err(Error::list_index_out_of_range("Index out of range."));
        }
        Ok(SystemCallResult::object(Rc::clone(&list[index as usize])))
    })())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(which: fn(&mut SystemCallInput) -> SystemCallResult, values: Vec<Value>, objects: Vec<Rc<Object>>) -> SystemCallResult {
        let mut input_stream = std::io::empty();
        let mut output_stream = std::io::sink();
        let vn = values.len();
        let on = objects.len();
        let mut input = SystemCallInput::new(&values, &objects, vn, on, &mut input_stream, &mut output_stream, None);
        which(&mut input)
    }

    #[test]
    fn test_builder_then_mid_scenario() {
        let builder = Rc::new(Object::ValueListBuilder(std::cell::RefCell::new(vec![
            decimal_value(10),
            decimal_value(20),
            decimal_value(30),
        ])));
        let list = call(value_list_builder_end, vec![], vec![builder]).returned_object.unwrap();
        let result = call(
            list_mid,
            vec![decimal_value(1), decimal_value(10)],
            vec![list],
        );
        let mid = result.returned_object.unwrap();
        let items = mid.as_value_list().unwrap();
        assert_eq!(items.iter().cloned().collect::<Vec<_>>(), vec![decimal_value(20), decimal_value(30)]);
    }

    #[test]
    fn test_list_first_on_empty_faults_list_is_empty() {
        let empty = Rc::new(Object::ValueList(Vector::new()));
        let result = call(list_first, vec![], vec![empty]);
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::ListIsEmpty);
    }

    #[test]
    fn test_set_and_add_share_prefix_with_source() {
        let original = Vector::from(vec![decimal_value(1), decimal_value(2), decimal_value(3)]);
        let list = Rc::new(Object::ValueList(original.clone()));
        let result = call(value_list_set, vec![decimal_value(1), decimal_value(99)], vec![list]);
        let updated = result.returned_object.unwrap();
        let updated_list = updated.as_value_list().unwrap();
        assert_eq!(updated_list[0], original[0]);
        assert_eq!(updated_list[2], original[2]);
        assert_eq!(updated_list[1], decimal_value(99));
    }

    #[test]
    fn test_list_mid_overshoot_clamps() {
        let list = Rc::new(Object::ValueList(Vector::from(vec![decimal_value(1), decimal_value(2)])));
        let result = call(list_mid, vec![decimal_value(0), decimal_value(100)], vec![list]);
        let items = result.returned_object.unwrap();
        assert_eq!(items.as_value_list().unwrap().len(), 2);
    }

    #[test]
    fn test_list_take_idempotent_at_full_length() {
        let list = Rc::new(Object::ValueList(Vector::from(vec![decimal_value(1), decimal_value(2)])));
        let result = call(list_take, vec![decimal_value(2)], vec![Rc::clone(&list)]);
        let items = result.returned_object.unwrap();
        assert_eq!(items.as_value_list().unwrap(), list.as_value_list().unwrap());
    }
}
