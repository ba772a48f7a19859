//! Shared object handles.
//!
//! An [`Object`] is the state half of an instance: a type name, an opaque tag
//! identifying the type that created it, and a field table. Method dispatch
//! lives with the type (see `pactum-check`), which recovers itself from the
//! tag.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::value::Value;

/// Opaque type tag stored on every object.
pub type TypeTag = Arc<dyn Any + Send + Sync>;

/// Reference-counted handle to an object's state. Clones share state.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    type_name: String,
    tag: TypeTag,
    fields: RwLock<IndexMap<String, Value>>,
}

impl Object {
    /// Creates an object with no fields.
    pub fn new(type_name: impl Into<String>, tag: TypeTag) -> Self {
        Object {
            inner: Arc::new(ObjectInner {
                type_name: type_name.into(),
                tag,
                fields: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Creates an object whose tag carries no type information.
    pub fn untyped(type_name: impl Into<String>) -> Self {
        Object::new(type_name, Arc::new(()))
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn tag(&self) -> TypeTag {
        Arc::clone(&self.inner.tag)
    }

    /// Reads a field. The lock is released before returning.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner
            .fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field)
            .cloned()
    }

    /// Writes a field, returning the previous value if there was one.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner
            .fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.into(), value.into())
    }

    /// Copies the current field table.
    pub fn fields(&self) -> IndexMap<String, Value> {
        self.inner
            .fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    // Field values are left out: objects may reference themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .inner
            .fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Object")
            .field("type", &self.inner.type_name)
            .field("fields", &names)
            .finish()
    }
}

thread_local! {
    static SERIALIZING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the outermost object being serialized on this thread.
struct Outermost;

impl Outermost {
    fn enter() -> Option<Outermost> {
        SERIALIZING.with(|active| (!active.replace(true)).then_some(Outermost))
    }
}

impl Drop for Outermost {
    fn drop(&mut self) {
        SERIALIZING.with(|active| active.set(false));
    }
}

/// Serializes as `{"type", "fields"}`. Objects reached through those fields
/// serialize as `{"type"}` only, so cycles terminate.
impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match Outermost::enter() {
            Some(_outermost) => {
                let mut state = serializer.serialize_struct("Object", 2)?;
                state.serialize_field("type", self.type_name())?;
                state.serialize_field("fields", &self.fields())?;
                state.end()
            }
            None => {
                let mut state = serializer.serialize_struct("Object", 1)?;
                state.serialize_field("type", self.type_name())?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_fields() {
        let account = Object::untyped("Account");
        let alias = account.clone();
        account.set("balance", 100);

        assert_eq!(alias.get("balance"), Some(Value::Int(100)));
        assert!(alias.ptr_eq(&account));
        assert_eq!(account.set("balance", 50), Some(Value::Int(100)));
    }

    #[test]
    fn missing_field_is_none() {
        let object = Object::untyped("Empty");
        assert_eq!(object.get("anything"), None);
        assert!(object.fields().is_empty());
    }

    #[test]
    fn tag_recovers_concrete_type() {
        let object = Object::new("Tagged", Arc::new(42u32));
        let tag = object.tag();
        assert_eq!(tag.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn serializes_type_and_fields() {
        let object = Object::untyped("Point");
        object.set("x", 1);
        object.set("y", 2);
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Point", "fields": {"x": {"Int": 1}, "y": {"Int": 2}}}));
    }

    #[test]
    fn self_reference_serializes_shallow() {
        let node = Object::untyped("Node");
        node.set("id", 1);
        node.set("next", node.clone());
        node.set("peers", vec![Value::Object(node.clone())]);

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Node",
                "fields": {
                    "id": {"Int": 1},
                    "next": {"Object": {"type": "Node"}},
                    "peers": {"List": [{"Object": {"type": "Node"}}]}
                }
            })
        );

        // The marker is released, so the next top-level object is full again.
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("fields").is_some());

        // Break the cycle.
        node.set("next", Value::Unit);
        node.set("peers", Value::Unit);
    }
}
