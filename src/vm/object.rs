//! The heap-allocated object hierarchy carried on the object stack.
//!
//! The original models objects as a class hierarchy with runtime downcasts
//! (`Object` base, `ObjectType` discriminant, `dynamic_cast`/`assert`-guarded
//! narrowing — see `Value.h` and the `systemCall.cpp` list intrinsics for the
//! `getObjectType()` assertions). Per spec.md §9's "tagged unions over class
//! hierarchies" redesign note, this is a single tagged enum instead: the
//! discriminant *is* the variant, so `InternalTypeConfusion` is structurally
//! unreachable at this layer (it can still be raised defensively where a
//! caller's declared arity doesn't match the actual stack contents).
//!
//! Every durable (non-builder) variant is immutable and reference-counted
//! (`Rc`) rather than garbage-collected: per spec.md §5/§9, no intrinsic ever
//! constructs a cycle, so refcounting alone is sufficient.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use chrono_tz::Tz;
use im::{OrdMap, Vector};

use crate::vm::value::Value;

/// A named field inside a [`Record`](Object::Record): value-typed or
/// object-typed payload, matching the VM's value/object stack split.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordField {
    Value(Value),
    Object(Rc<Object>),
}

/// The discriminant every object carries, independent of payload — the
/// direct analogue of the original's `ObjectType` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    String,
    TimeZone,
    Record,
    ValueList,
    ObjectList,
    ValueListBuilder,
    ObjectListBuilder,
    ValueToValueMap,
    ValueToObjectMap,
    ObjectToValueMap,
    ObjectToObjectMap,
    ValueOptional,
    ObjectOptional,
}

/// A heap-allocated, reference-counted runtime object.
///
/// List/map variants use `im`'s persistent vector and ordered map, giving
/// structural sharing on every "mutator" (`Add`, `Set`, `Concat`, ...)
/// without a hand-rolled HAMT/RRB-tree. The four map variants are realized
/// over `im::OrdMap` rather than a hash map: `Object` itself can be a map
/// key (`ObjectToValueMap`/`ObjectToObjectMap`), and deriving a `Hash` that
/// stays consistent across an arbitrarily nested object graph is exactly the
/// kind of hand-rolled machinery the persistent-collection crate should
/// supply — `Ord` composes through nested `im` containers for free, so the
/// map family is built on total order instead (see DESIGN.md).
#[derive(Debug, Clone)]
pub enum Object {
    String(Vec<u16>),
    TimeZone(Tz),
    Record(Vec<(String, RecordField)>),
    ValueList(Vector<Value>),
    ObjectList(Vector<Rc<Object>>),
    /// Transient accumulator; exists only between `…BuilderNew` and
    /// `…BuilderEnd`. Single-producer by construction (owned, not shared).
    ValueListBuilder(RefCell<Vec<Value>>),
    ObjectListBuilder(RefCell<Vec<Rc<Object>>>),
    ValueToValueMap(OrdMap<Value, Value>),
    ValueToObjectMap(OrdMap<Value, Rc<Object>>),
    ObjectToValueMap(OrdMap<Rc<Object>, Value>),
    ObjectToObjectMap(OrdMap<Rc<Object>, Rc<Object>>),
    ValueOptional(Option<Value>),
    ObjectOptional(Option<Rc<Object>>),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::String(_) => ObjectKind::String,
            Object::TimeZone(_) => ObjectKind::TimeZone,
            Object::Record(_) => ObjectKind::Record,
            Object::ValueList(_) => ObjectKind::ValueList,
            Object::ObjectList(_) => ObjectKind::ObjectList,
            Object::ValueListBuilder(_) => ObjectKind::ValueListBuilder,
            Object::ObjectListBuilder(_) => ObjectKind::ObjectListBuilder,
            Object::ValueToValueMap(_) => ObjectKind::ValueToValueMap,
            Object::ValueToObjectMap(_) => ObjectKind::ValueToObjectMap,
            Object::ObjectToValueMap(_) => ObjectKind::ObjectToValueMap,
            Object::ObjectToObjectMap(_) => ObjectKind::ObjectToObjectMap,
            Object::ValueOptional(_) => ObjectKind::ValueOptional,
            Object::ObjectOptional(_) => ObjectKind::ObjectOptional,
        }
    }

    pub fn is_builder(&self) -> bool {
        matches!(self.kind(), ObjectKind::ValueListBuilder | ObjectKind::ObjectListBuilder)
    }

    pub fn as_string(&self) -> Option<&Vec<u16>> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time_zone(&self) -> Option<&Tz> {
        match self {
            Object::TimeZone(tz) => Some(tz),
            _ => None,
        }
    }

    pub fn as_value_list(&self) -> Option<&Vector<Value>> {
        match self {
            Object::ValueList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object_list(&self) -> Option<&Vector<Rc<Object>>> {
        match self {
            Object::ObjectList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_value_list_builder(&self) -> Option<&RefCell<Vec<Value>>> {
        match self {
            Object::ValueListBuilder(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object_list_builder(&self) -> Option<&RefCell<Vec<Rc<Object>>>> {
        match self {
            Object::ObjectListBuilder(b) => Some(b),
            _ => None,
        }
    }
}

/// Structural equality over the variant and its payload. Builders compare by
/// identity of the underlying buffer's address: they are transient,
/// single-producer, and are never placed in a durable container, so two
/// distinct builders are never equal and a builder is only ever compared
/// against itself in practice.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Object {}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Object {
    fn cmp(&self, other: &Self) -> Ordering {
        use Object::*;
        match (self, other) {
            (String(a), String(b)) => a.cmp(b),
            (TimeZone(a), TimeZone(b)) => format!("{a:?}").cmp(&format!("{b:?}")),
            (Record(a), Record(b)) => a.cmp(b),
            (ValueList(a), ValueList(b)) => a.iter().cmp(b.iter()),
            (ObjectList(a), ObjectList(b)) => a.iter().cmp(b.iter()),
            (ValueListBuilder(a), ValueListBuilder(b)) => (a.as_ptr() as usize).cmp(&(b.as_ptr() as usize)),
            (ObjectListBuilder(a), ObjectListBuilder(b)) => (a.as_ptr() as usize).cmp(&(b.as_ptr() as usize)),
            (ValueToValueMap(a), ValueToValueMap(b)) => a.iter().cmp(b.iter()),
            (ValueToObjectMap(a), ValueToObjectMap(b)) => a.iter().cmp(b.iter()),
            (ObjectToValueMap(a), ObjectToValueMap(b)) => a.iter().cmp(b.iter()),
            (ObjectToObjectMap(a), ObjectToObjectMap(b)) => a.iter().cmp(b.iter()),
            (ValueOptional(a), ValueOptional(b)) => a.cmp(b),
            (ObjectOptional(a), ObjectOptional(b)) => a.cmp(b),
            _ => kind_rank(self.kind()).cmp(&kind_rank(other.kind())),
        }
    }
}

fn kind_rank(kind: ObjectKind) -> u8 {
    match kind {
        ObjectKind::String => 0,
        ObjectKind::TimeZone => 1,
        ObjectKind::Record => 2,
        ObjectKind::ValueList => 3,
        ObjectKind::ObjectList => 4,
        ObjectKind::ValueListBuilder => 5,
        ObjectKind::ObjectListBuilder => 6,
        ObjectKind::ValueToValueMap => 7,
        ObjectKind::ValueToObjectMap => 8,
        ObjectKind::ObjectToValueMap => 9,
        ObjectKind::ObjectToObjectMap => 10,
        ObjectKind::ValueOptional => 11,
        ObjectKind::ObjectOptional => 12,
    }
}

/// Builds a [`Object::String`] from a Rust `&str`.
pub fn string_object(s: &str) -> Object {
    Object::String(s.encode_utf16().collect())
}

/// Renders a [`Object::String`]'s UTF-16 payload back to a Rust `String`,
/// replacing unpaired surrogates with the replacement character.
pub fn string_to_rust(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let obj = string_object("hi");
        assert_eq!(obj.kind(), ObjectKind::String);
    }

    #[test]
    fn test_builder_is_flagged() {
        let builder = Object::ValueListBuilder(RefCell::new(Vec::new()));
        assert!(builder.is_builder());
        assert!(!string_object("x").is_builder());
    }

    #[test]
    fn test_string_roundtrip() {
        let obj = string_object("café");
        let units = obj.as_string().unwrap();
        assert_eq!(string_to_rust(units), "café");
    }

    #[test]
    fn test_value_list_equality_is_structural() {
        let a = Object::ValueList(Vector::unit(Value::from_i64(1)));
        let b = Object::ValueList(Vector::unit(Value::from_i64(1)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_builders_are_unequal() {
        let a = Object::ValueListBuilder(RefCell::new(Vec::new()));
        let b = Object::ValueListBuilder(RefCell::new(Vec::new()));
        assert_ne!(a, b);
    }
}
