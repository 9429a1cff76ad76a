//! Persistent map intrinsics, generic over the four key/value shapes
//! (`ValueToValueMap`, `ValueToObjectMap`, `ObjectToValueMap`,
//! `ObjectToObjectMap`).
//!
//! Grounds spec.md §4.5's "Maps" cluster and the original's
//! `systemCallMapGet`/`MapSet`/`MapRemove` family in `systemCall.cpp`.
//! Backed by `im::OrdMap` rather than `im::HashMap` — see the `Object`
//! variant doc comment in `object.rs` for why an ordering composes across
//! a recursive, heterogeneous object graph where a consistent `Hash` does
//! not. Each of the four concrete maps shares the same `get`/`set`/
//! `remove`/`contains_key`/`len`/`keys`/`values` logic through small
//! generic helpers, avoiding 32 near-identical function bodies.

use std::rc::Rc;

use im::OrdMap;

use crate::vm::builtins_common::decimal_value;
use crate::vm::call::{SystemCallInput, SystemCallResult};
use crate::vm::error::Error;
use crate::vm::object::Object;
use crate::vm::value::Value;

fn ok_or_fault(result: Result<SystemCallResult, Error>) -> SystemCallResult {
    result.unwrap_or_else(SystemCallResult::from_error)
}

fn expect_value_to_value(o: &Rc<Object>) -> Result<&OrdMap<Value, Value>, Error> {
    match o.as_ref() {
        Object::ValueToValueMap(m) => Ok(m),
        _ => Err(Error::internal_type_confusion("expected a ValueToValueMap")),
    }
}

fn expect_value_to_object(o: &Rc<Object>) -> Result<&OrdMap<Value, Rc<Object>>, Error> {
    match o.as_ref() {
        Object::ValueToObjectMap(m) => Ok(m),
        _ => Err(Error::internal_type_confusion("expected a ValueToObjectMap")),
    }
}

fn expect_object_to_value(o: &Rc<Object>) -> Result<&OrdMap<Rc<Object>, Value>, Error> {
    match o.as_ref() {
        Object::ObjectToValueMap(m) => Ok(m),
        _ => Err(Error::internal_type_confusion("expected an ObjectToValueMap")),
    }
}

fn expect_object_to_object(o: &Rc<Object>) -> Result<&OrdMap<Rc<Object>, Rc<Object>>, Error> {
    match o.as_ref() {
        Object::ObjectToObjectMap(m) => Ok(m),
        _ => Err(Error::internal_type_confusion("expected an ObjectToObjectMap")),
    }
}

// --- ValueToValueMap ---

pub fn value_to_value_map_new(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ValueToValueMap(OrdMap::new())))
}

pub fn value_to_value_map_get(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        let key = input.get_value(-1);
        map.get(key).cloned().map(SystemCallResult::value).ok_or_else(Error::map_key_not_found)
    })())
}

pub fn value_to_value_map_set(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        let key = input.get_value(-2).clone();
        let value = input.get_value(-1).clone();
        let mut updated = map.clone();
        updated.insert(key, value);
        Ok(SystemCallResult::object(Rc::new(Object::ValueToValueMap(updated))))
    })())
}

pub fn value_to_value_map_remove(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        let key = input.get_value(-1);
        let mut updated = map.clone();
        updated.remove(key);
        Ok(SystemCallResult::object(Rc::new(Object::ValueToValueMap(updated))))
    })())
}

pub fn value_to_value_map_contains_key(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        let key = input.get_value(-1);
        Ok(SystemCallResult::value(Value::from_bool(map.contains_key(key))))
    })())
}

pub fn value_to_value_map_len(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        Ok(SystemCallResult::value(decimal_value(map.len() as i64)))
    })())
}

pub fn value_to_value_map_keys(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        let list: im::Vector<Value> = map.keys().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

pub fn value_to_value_map_values(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_value(input.get_object(-1))?;
        let list: im::Vector<Value> = map.values().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

// --- ValueToObjectMap ---

pub fn value_to_object_map_new(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ValueToObjectMap(OrdMap::new())))
}

pub fn value_to_object_map_get(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-1))?;
        let key = input.get_value(-1);
        map.get(key).cloned().map(SystemCallResult::object).ok_or_else(Error::map_key_not_found)
    })())
}

pub fn value_to_object_map_set(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-2))?;
        let key = input.get_value(-1).clone();
        let value = input.get_object_ptr(-1);
        let mut updated = map.clone();
        updated.insert(key, value);
        Ok(SystemCallResult::object(Rc::new(Object::ValueToObjectMap(updated))))
    })())
}

pub fn value_to_object_map_remove(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-1))?;
        let key = input.get_value(-1);
        let mut updated = map.clone();
        updated.remove(key);
        Ok(SystemCallResult::object(Rc::new(Object::ValueToObjectMap(updated))))
    })())
}

pub fn value_to_object_map_contains_key(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-1))?;
        let key = input.get_value(-1);
        Ok(SystemCallResult::value(Value::from_bool(map.contains_key(key))))
    })())
}

pub fn value_to_object_map_len(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-1))?;
        Ok(SystemCallResult::value(decimal_value(map.len() as i64)))
    })())
}

pub fn value_to_object_map_keys(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-1))?;
        let list: im::Vector<Value> = map.keys().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

pub fn value_to_object_map_values(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_value_to_object(input.get_object(-1))?;
        let list: im::Vector<Rc<Object>> = map.values().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(list))))
    })())
}

// --- ObjectToValueMap ---

pub fn object_to_value_map_new(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ObjectToValueMap(OrdMap::new())))
}

pub fn object_to_value_map_get(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        map.get(&key).cloned().map(SystemCallResult::value).ok_or_else(Error::map_key_not_found)
    })())
}

pub fn object_to_value_map_set(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        let value = input.get_value(-1).clone();
        let mut updated = map.clone();
        updated.insert(key, value);
        Ok(SystemCallResult::object(Rc::new(Object::ObjectToValueMap(updated))))
    })())
}

pub fn object_to_value_map_remove(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        let mut updated = map.clone();
        updated.remove(&key);
        Ok(SystemCallResult::object(Rc::new(Object::ObjectToValueMap(updated))))
    })())
}

pub fn object_to_value_map_contains_key(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        Ok(SystemCallResult::value(Value::from_bool(map.contains_key(&key))))
    })())
}

pub fn object_to_value_map_len(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-1))?;
        Ok(SystemCallResult::value(decimal_value(map.len() as i64)))
    })())
}

pub fn object_to_value_map_keys(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-1))?;
        let list: im::Vector<Rc<Object>> = map.keys().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(list))))
    })())
}

pub fn object_to_value_map_values(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_value(input.get_object(-1))?;
        let list: im::Vector<Value> = map.values().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ValueList(list))))
    })())
}

// --- ObjectToObjectMap ---

pub fn object_to_object_map_new(_input: &mut SystemCallInput) -> SystemCallResult {
    SystemCallResult::object(Rc::new(Object::ObjectToObjectMap(OrdMap::new())))
}

pub fn object_to_object_map_get(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        map.get(&key).cloned().map(SystemCallResult::object).ok_or_else(Error::map_key_not_found)
    })())
}

pub fn object_to_object_map_set(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-3))?;
        let key = input.get_object_ptr(-2);
        let value = input.get_object_ptr(-1);
        let mut updated = map.clone();
        updated.insert(key, value);
        Ok(SystemCallResult::object(Rc::new(Object::ObjectToObjectMap(updated))))
    })())
}

pub fn object_to_object_map_remove(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        let mut updated = map.clone();
        updated.remove(&key);
        Ok(SystemCallResult::object(Rc::new(Object::ObjectToObjectMap(updated))))
    })())
}

pub fn object_to_object_map_contains_key(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-2))?;
        let key = input.get_object_ptr(-1);
        Ok(SystemCallResult::value(Value::from_bool(map.contains_key(&key))))
    })())
}

pub fn object_to_object_map_len(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-1))?;
        Ok(SystemCallResult::value(decimal_value(map.len() as i64)))
    })())
}

pub fn object_to_object_map_keys(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-1))?;
        let list: im::Vector<Rc<Object>> = map.keys().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(list))))
    })())
}

pub fn object_to_object_map_values(input: &mut SystemCallInput) -> SystemCallResult {
    ok_or_fault((|| {
        let map = expect_object_to_object(input.get_object(-1))?;
        let list: im::Vector<Rc<Object>> = map.values().cloned().collect();
        Ok(SystemCallResult::object(Rc::new(Object::ObjectList(list))))
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
    fn test_value_to_value_roundtrip() {
        let map = Rc::new(Object::ValueToValueMap(OrdMap::new()));
        let set_result = call(value_to_value_map_set, vec![decimal_value(1), decimal_value(100)], vec![map]);
        let updated = set_result.returned_object.unwrap();
        let get_result = call(value_to_value_map_get, vec![decimal_value(1)], vec![updated]);
        assert_eq!(get_result.returned_value, Some(decimal_value(100)));
    }

    #[test]
    fn test_missing_key_faults_map_key_not_found() {
        let map = Rc::new(Object::ValueToValueMap(OrdMap::new()));
        let result = call(value_to_value_map_get, vec![decimal_value(1)], vec![map]);
        assert!(result.has_error());
        assert_eq!(result.error.unwrap().code, crate::vm::error::ErrorCode::MapKeyNotFound);
    }

    #[test]
    fn test_object_key_map_set_does_not_mutate_original() {
        let key = Rc::new(string_object("k"));
        let original: OrdMap<Rc<Object>, Value> = OrdMap::new();
        let map = Rc::new(Object::ObjectToValueMap(original.clone()));
        let result = call(object_to_value_map_set, vec![decimal_value(42)], vec![Rc::clone(&map), key]);
        let updated = result.returned_object.unwrap();
        let updated_map = expect_object_to_value(&updated).unwrap();
        assert_eq!(updated_map.len(), 1);
        assert_eq!(expect_object_to_value(&map).unwrap().len(), 0);
    }

    #[test]
    fn test_contains_key_and_remove() {
        let mut backing = OrdMap::new();
        backing.insert(decimal_value(5), decimal_value(50));
        let map = Rc::new(Object::ValueToValueMap(backing));
        let contains = call(value_to_value_map_contains_key, vec![decimal_value(5)], vec![Rc::clone(&map)]);
        assert_eq!(contains.returned_value, Some(Value::from_bool(true)));
        let removed = call(value_to_value_map_remove, vec![decimal_value(5)], vec![map]);
        let updated = removed.returned_object.unwrap();
        assert_eq!(expect_value_to_value(&updated).unwrap().len(), 0);
    }
}
