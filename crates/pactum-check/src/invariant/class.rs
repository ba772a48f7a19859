//! Type values, method tables and instances.
//!
//! A [`Class`] is built explicitly: a name, an optional base it delegates to,
//! and a method table of [`Callable`]s. Instance methods take the receiver as
//! their first positional parameter; [`Instance::call`] supplies it.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use pactum_core::{ArgumentRecord, CallArgs, ContractError, Object, Value, ValueKind};

use crate::contracts::chain::Callable;
use crate::invariant::CONSTRUCTOR;

/// What a method operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// The initializer. Runs on a fresh instance that is not yet valid.
    Constructor,
    /// Operates on an instance passed as the receiver.
    Instance,
    /// Type-level operation with no receiver.
    Static,
}

/// A method table entry.
#[derive(Debug, Clone)]
pub struct Method {
    kind: MethodKind,
    callable: Callable,
}

impl Method {
    pub fn new(kind: MethodKind, callable: Callable) -> Self {
        Method { kind, callable }
    }

    pub fn constructor(callable: Callable) -> Self {
        Method::new(MethodKind::Constructor, callable)
    }

    pub fn instance(callable: Callable) -> Self {
        Method::new(MethodKind::Instance, callable)
    }

    pub fn type_level(callable: Callable) -> Self {
        Method::new(MethodKind::Static, callable)
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub(crate) fn with_callable(&self, callable: Callable) -> Method {
        Method {
            kind: self.kind,
            callable,
        }
    }
}

/// A type: name, optional base, and method table. Clones share the table.
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

struct ClassInner {
    name: String,
    base: Option<Class>,
    methods: RwLock<IndexMap<String, Method>>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Class::with_base(name, None)
    }

    /// A type with an empty table of its own that delegates to `base`.
    pub fn subclass(name: impl Into<String>, base: &Class) -> Self {
        Class::with_base(name, Some(base.clone()))
    }

    fn with_base(name: impl Into<String>, base: Option<Class>) -> Self {
        Class {
            inner: Arc::new(ClassInner {
                name: name.into(),
                base,
                methods: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Builder form of [`attach`](Self::attach).
    pub fn method(self, name: impl Into<String>, method: Method) -> Self {
        self.attach(name, method);
        self
    }

    /// Builder shorthand for attaching the constructor.
    pub fn constructor(self, callable: Callable) -> Self {
        self.method(CONSTRUCTOR, Method::constructor(callable))
    }

    /// Adds or replaces a method in this type's own table.
    ///
    /// Methods attached after an invariant type was derived are never
    /// wrapped.
    pub fn attach(&self, name: impl Into<String>, method: Method) {
        self.inner
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), method);
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn base(&self) -> Option<&Class> {
        self.inner.base.as_ref()
    }

    /// Resolves a method through this type and then its bases.
    pub fn lookup(&self, name: &str) -> Option<Method> {
        let own = self
            .inner
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        own.or_else(|| self.base().and_then(|base| base.lookup(name)))
    }

    /// Every method visible on this type, base methods first, overrides
    /// replacing them in place.
    pub fn resolved_methods(&self) -> IndexMap<String, Method> {
        let mut methods = self
            .base()
            .map(Class::resolved_methods)
            .unwrap_or_default();
        let own = self
            .inner
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for (name, method) in own.iter() {
            methods.insert(name.clone(), method.clone());
        }
        methods
    }

    /// Creates an instance and runs the constructor, if one resolves.
    pub fn instantiate(&self, args: CallArgs) -> Result<Instance, ContractError> {
        let object = Object::new(self.name(), self.inner.clone());
        let instance = Instance {
            object,
            class: self.clone(),
        };
        if let Some(constructor) = self.lookup(CONSTRUCTOR) {
            constructor
                .callable()
                .call(args.with_receiver(instance.to_value()))?;
        }
        Ok(instance)
    }

    /// Calls a method without a receiver.
    pub fn call_static(&self, name: &str, args: CallArgs) -> Result<Value, ContractError> {
        let method = self.lookup(name).ok_or_else(|| self.not_found(name))?;
        method.callable().call(args)
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn not_found(&self, method: &str) -> ContractError {
        ContractError::MethodNotFound {
            type_name: self.name().to_string(),
            method: method.to_string(),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<String> = self
            .inner
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("base", &self.inner.base)
            .field("methods", &methods)
            .finish()
    }
}

/// An object together with the type that dispatches its methods.
#[derive(Debug, Clone)]
pub struct Instance {
    object: Object,
    class: Class,
}

impl Instance {
    /// Recovers an instance from a receiver value.
    ///
    /// Fails unless the value is an object created by [`Class::instantiate`].
    pub fn from_value(value: &Value) -> Result<Instance, ContractError> {
        let object = value.as_object().ok_or_else(|| ContractError::ArgumentType {
            callable: "Instance::from_value".to_string(),
            name: "receiver".to_string(),
            expected: ValueKind::Object,
            got: value.kind(),
        })?;
        let inner = object.tag().downcast::<ClassInner>().map_err(|_| {
            ContractError::raised(format!("'{}' object has no method table", object.type_name()))
        })?;
        Ok(Instance {
            object: object.clone(),
            class: Class { inner },
        })
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.object.get(field)
    }

    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.object.set(field, value)
    }

    /// The fields by name at this instant, as invariant predicates see them.
    pub fn snapshot(&self) -> ArgumentRecord {
        crate::invariant::snapshot(&self.object)
    }

    /// Calls a method, passing this instance as the receiver.
    pub fn call(&self, method: &str, args: CallArgs) -> Result<Value, ContractError> {
        let resolved = self
            .class
            .lookup(method)
            .ok_or_else(|| self.class.not_found(method))?;
        match resolved.kind() {
            MethodKind::Static => resolved.callable().call(args),
            MethodKind::Constructor | MethodKind::Instance => {
                resolved.callable().call(args.with_receiver(self.to_value()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pactum_core::ParameterShape;

    use super::*;

    fn counter() -> Class {
        let init = ParameterShape::builder("__init__")
            .param("self")
            .param_default("start", 0)
            .build()
            .unwrap();
        let bump = ParameterShape::builder("bump").param("self").build().unwrap();
        let zero = ParameterShape::builder("zero").build().unwrap();

        Class::new("Counter")
            .constructor(Callable::new(init, |args| {
                args.object("self")?.set("count", args.get("start")?.clone());
                Ok(Value::Unit)
            }))
            .method(
                "bump",
                Method::instance(Callable::new(bump, |args| {
                    let this = args.object("self")?;
                    let count = this.get("count").and_then(|v| v.as_int()).unwrap_or(0) + 1;
                    this.set("count", count);
                    Ok(Value::Int(count))
                })),
            )
            .method("zero", Method::type_level(Callable::new(zero, |_| Ok(Value::Int(0)))))
    }

    #[test]
    fn instantiate_runs_constructor() {
        let counter = counter().instantiate(CallArgs::new().kwarg("start", 5)).unwrap();
        assert_eq!(counter.get("count"), Some(Value::Int(5)));
        assert_eq!(counter.call("bump", CallArgs::new()).unwrap(), Value::Int(6));
        assert_eq!(counter.snapshot().int("count").unwrap(), 6);
        assert_eq!(counter.object().type_name(), "Counter");
    }

    #[test]
    fn static_methods_take_no_receiver() {
        let class = counter();
        assert_eq!(class.call_static("zero", CallArgs::new()).unwrap(), Value::Int(0));
        let counter = class.instantiate(CallArgs::new()).unwrap();
        assert_eq!(counter.call("zero", CallArgs::new()).unwrap(), Value::Int(0));
    }

    #[test]
    fn unknown_method() {
        let counter = counter().instantiate(CallArgs::new()).unwrap();
        let err = counter.call("missing", CallArgs::new()).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"type 'Counter' has no method 'missing'");
    }

    #[test]
    fn subclass_delegates_and_overrides() {
        let base = counter();
        let shape = ParameterShape::builder("bump").param("self").build().unwrap();
        let derived = Class::subclass("Counter", &base).method(
            "bump",
            Method::instance(Callable::new(shape, |_| Ok(Value::Int(-1)))),
        );

        let names: Vec<String> = derived.resolved_methods().keys().cloned().collect();
        assert_eq!(names, vec!["__init__", "bump", "zero"]);
        assert!(derived.base().unwrap().ptr_eq(&base));

        let instance = derived.instantiate(CallArgs::new()).unwrap();
        assert_eq!(instance.call("bump", CallArgs::new()).unwrap(), Value::Int(-1));
    }

    #[test]
    fn instance_roundtrips_through_value() {
        let class = counter();
        let counter = class.instantiate(CallArgs::new()).unwrap();
        let recovered = Instance::from_value(&counter.to_value()).unwrap();
        assert!(recovered.class().ptr_eq(&class));
        assert!(recovered.object().ptr_eq(counter.object()));

        assert!(Instance::from_value(&Value::Object(Object::untyped("Loose"))).is_err());
        assert!(Instance::from_value(&Value::Int(1)).is_err());
    }
}
