//! Dynamic values stored in replicated fields

use crate::identity::EntityId;
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A replicated field value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// No value / unset
    #[default]
    Null,
    /// Boolean value (guards, toggles)
    Bool(bool),
    /// Integer value (indices, counts, mode codes)
    Int(i64),
    /// Floating point value (timers)
    Float(f64),
    /// World-space position
    Vec3(Vec3),
    /// World-space rotation
    Quat(Quat),
    /// Reference to another entity (carry links)
    EntityRef(EntityId),
}

/// A map of field names to values, kept in insertion order
pub type ValueMap = IndexMap<String, Value>;

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a position
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get this value as a rotation
    pub fn as_quat(&self) -> Option<Quat> {
        match self {
            Value::Quat(q) => Some(*q),
            _ => None,
        }
    }

    /// Try to get this value as an entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            Value::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Vec3(_) => "vec3",
            Value::Quat(_) => "quat",
            Value::EntityRef(_) => "entity_ref",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Value::Quat(q) => write!(f, "quat({}, {}, {}, {})", q.x, q.y, q.z, q.w),
            Value::EntityRef(id) => write!(f, "{}", id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f as f64)
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Value::Vec3(v)
    }
}

impl From<Quat> for Value {
    fn from(q: Quat) -> Self {
        Value::Quat(q)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::EntityRef(id)
    }
}

impl From<Option<EntityId>> for Value {
    fn from(id: Option<EntityId>) -> Self {
        id.map(Value::EntityRef).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(-1).as_int(), Some(-1));
        assert_eq!(Value::Int(42).as_float(), Some(42.0));
        assert_eq!(Value::Vec3(Vec3::Y).as_vec3(), Some(Vec3::Y));
        assert_eq!(Value::Bool(true).as_int(), None);
    }

    #[test]
    fn test_value_from() {
        let v: Value = Some(EntityId::new(3)).into();
        assert_eq!(v.as_entity_ref(), Some(EntityId::new(3)));
        let none: Value = Option::<EntityId>::None.into();
        assert!(none.is_null());
        assert_eq!(Value::from(Vec3::ZERO).type_name(), "vec3");
    }

    #[test]
    fn test_value_ron_roundtrip() {
        let value = Value::Vec3(Vec3::new(1.0, 2.0, 3.0));
        let text = ron::to_string(&value).unwrap();
        let back: Value = ron::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
