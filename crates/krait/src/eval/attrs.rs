//! Attribute access: instance lookup order, descriptors, bound methods,
//! `super`, and the builtin method tables.
//!
//! Instance lookup order (`obj.name`):
//! 1. a *data descriptor* (a property with a setter) found on the MRO wins
//!    over the instance dict;
//! 2. otherwise the instance attribute map;
//! 3. otherwise the MRO attribute, unwrapped: properties call their getter,
//!    classmethods bind the class, staticmethods unwrap, plain functions
//!    bind the receiver (recording the defining class for `super`);
//! 4. otherwise `__getattr__` (MRO-searched) with the bare name;
//! 5. otherwise `AttributeError`.
//!
//! Implicit dunder dispatch (`call_dunder`) goes straight to the MRO and
//! never consults `__getattr__` or the instance dict, which is what keeps
//! `__eq__`-style lookups from recursing.

use crate::{
    args::ArgValues,
    builtins::Builtins,
    exception_private::{ExcType, RunResult},
    heap::{HeapData, HeapId},
    types::{BoundMethod, SuperProxy, mro_lookup, mro_lookup_after},
    value::Value,
};

use super::{Evaluator, methods};

impl Evaluator<'_> {
    pub(crate) fn get_attr(&mut self, obj: Value, name: &str) -> RunResult<Value> {
        if let Value::Ref(id) = obj {
            match self.heap.get(id) {
                HeapData::Instance(_) => return self.instance_get_attr(obj, id, name),
                HeapData::ClassObject(_) => return self.class_get_attr(id, name),
                HeapData::Super(proxy) => {
                    let SuperProxy { pivot, instance } = *proxy;
                    return self.super_get_attr(pivot, instance, name);
                }
                HeapData::Exception(exc) => {
                    if name == "args" {
                        let message = exc.message.clone();
                        let stored = exc.args.to_vec();
                        let args = if stored.is_empty() {
                            match message {
                                Some(message) => vec![self.heap.alloc_str(message)],
                                None => Vec::new(),
                            }
                        } else {
                            stored
                        };
                        return Ok(self.heap.alloc_tuple(args));
                    }
                }
                HeapData::Function(func) => {
                    if name == "__name__" {
                        let func_name = func.name.clone();
                        return Ok(self.heap.alloc_str(func_name));
                    }
                    if let Some(value) = func.attrs.get(name) {
                        return Ok(*value);
                    }
                }
                HeapData::Property(_) => match name {
                    // property.setter / property.deleter decorator surface.
                    "setter" | "deleter" | "getter" => {
                        return Ok(self.heap.alloc_value(HeapData::BoundMethod(BoundMethod {
                            func: Value::Builtin(Builtins::TypeMethod {
                                ty: crate::types::Type::Property,
                                method: methods::canonical_method_name(name),
                            }),
                            receiver: obj,
                            defining_class: None,
                        })));
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Builtin values expose their method surface through per-type tables.
        let ty = obj.py_type(self.heap);
        if let Some(method) = methods::lookup_type_method(ty, name) {
            return Ok(self.heap.alloc_value(HeapData::BoundMethod(BoundMethod {
                func: Value::Builtin(Builtins::TypeMethod { ty, method }),
                receiver: obj,
                defining_class: None,
            })));
        }

        Err(ExcType::attribute_error(&obj.type_name(self.heap), name))
    }

    fn instance_get_attr(&mut self, obj: Value, id: HeapId, name: &str) -> RunResult<Value> {
        let HeapData::Instance(instance) = self.heap.get(id) else {
            unreachable!("caller checked");
        };
        let class_id = instance.class_id;
        let instance_value = instance.attrs.get(name).copied();
        let class_attr = mro_lookup(self.heap, class_id, name);

        // A property with a setter is a data descriptor and shadows the
        // instance dict.
        let is_data_descriptor = class_attr.is_some_and(|(attr, _)| {
            matches!(
                attr,
                Value::Ref(attr_id)
                    if matches!(self.heap.get(attr_id), HeapData::Property(p) if p.fset.is_some())
            )
        });

        if !is_data_descriptor && let Some(value) = instance_value {
            return Ok(value);
        }

        if let Some((attr, defining_class)) = class_attr {
            return self.bind_class_attribute(attr, defining_class, obj, Value::Ref(class_id));
        }

        if let Some(value) = instance_value {
            return Ok(value);
        }

        // __getattr__ fallback, with the bare name.
        if mro_lookup(self.heap, class_id, "__getattr__").is_some() {
            let name_value = self.heap.alloc_str(name);
            if let Some(result) = self.call_dunder(obj, "__getattr__", ArgValues::One(name_value))? {
                return Ok(result);
            }
        }

        Err(ExcType::attribute_error(&obj.type_name(self.heap), name))
    }

    /// Unwraps a class-level attribute fetched through an instance.
    fn bind_class_attribute(
        &mut self,
        attr: Value,
        defining_class: HeapId,
        receiver: Value,
        class_value: Value,
    ) -> RunResult<Value> {
        if let Value::Ref(attr_id) = attr {
            match self.heap.get(attr_id) {
                HeapData::Property(property) => {
                    let fget = property.fget;
                    return match fget {
                        Some(fget) => self.call_value(fget, ArgValues::One(receiver)),
                        None => Err(ExcType::AttributeError.msg("unreadable attribute")),
                    };
                }
                HeapData::ClassMethod(inner) => {
                    let inner = *inner;
                    return Ok(self.heap.alloc_value(HeapData::BoundMethod(BoundMethod {
                        func: inner,
                        receiver: class_value,
                        defining_class: Some(defining_class),
                    })));
                }
                HeapData::StaticMethod(inner) => return Ok(*inner),
                HeapData::Function(_) => {
                    return Ok(self.heap.alloc_value(HeapData::BoundMethod(BoundMethod {
                        func: attr,
                        receiver,
                        defining_class: Some(defining_class),
                    })));
                }
                _ => {}
            }
        }
        Ok(attr)
    }

    /// Attribute access on a class object itself (`C.attr`).
    fn class_get_attr(&mut self, class_id: HeapId, name: &str) -> RunResult<Value> {
        if name == "__name__" {
            let HeapData::ClassObject(cls) = self.heap.get(class_id) else {
                unreachable!("caller checked");
            };
            let class_name = cls.name.clone();
            return Ok(self.heap.alloc_str(class_name));
        }
        if name == "__mro__" {
            let HeapData::ClassObject(cls) = self.heap.get(class_id) else {
                unreachable!("caller checked");
            };
            let mro: Vec<Value> = cls.mro.iter().map(|&id| Value::Ref(id)).collect();
            return Ok(self.heap.alloc_tuple(mro));
        }
        let Some((attr, defining_class)) = mro_lookup(self.heap, class_id, name) else {
            let HeapData::ClassObject(cls) = self.heap.get(class_id) else {
                unreachable!("caller checked");
            };
            return Err(ExcType::AttributeError.msg(format!(
                "type object '{}' has no attribute '{name}'",
                cls.name
            )));
        };
        if let Value::Ref(attr_id) = attr {
            match self.heap.get(attr_id) {
                // Fetched through the class, a classmethod binds the class;
                // staticmethods unwrap; plain functions stay unbound.
                HeapData::ClassMethod(inner) => {
                    let inner = *inner;
                    return Ok(self.heap.alloc_value(HeapData::BoundMethod(BoundMethod {
                        func: inner,
                        receiver: Value::Ref(class_id),
                        defining_class: Some(defining_class),
                    })));
                }
                HeapData::StaticMethod(inner) => return Ok(*inner),
                _ => {}
            }
        }
        Ok(attr)
    }

    /// Attribute access through `super()`: search starts *after* the pivot
    /// class in the instance's MRO, and the bound method records the class
    /// the resolution landed on so chained supers keep walking.
    fn super_get_attr(&mut self, pivot: HeapId, instance: Value, name: &str) -> RunResult<Value> {
        let search_class = match instance {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Instance(inst) => inst.class_id,
                HeapData::ClassObject(_) => id,
                _ => pivot,
            },
            _ => pivot,
        };
        let Some((attr, defining_class)) = mro_lookup_after(self.heap, search_class, pivot, name) else {
            return Err(ExcType::AttributeError.msg(format!(
                "'super' object has no attribute '{name}'"
            )));
        };
        self.bind_class_attribute(attr, defining_class, instance, Value::Ref(search_class))
    }

    // --- attribute assignment / deletion ---

    pub(crate) fn set_attr(&mut self, obj: Value, name: &str, value: Value) -> RunResult<()> {
        if let Value::Ref(id) = obj {
            match self.heap.get(id) {
                HeapData::Instance(instance) => {
                    let class_id = instance.class_id;

                    // User __setattr__ intercepts every assignment.
                    if mro_lookup(self.heap, class_id, "__setattr__").is_some() {
                        let name_value = self.heap.alloc_str(name);
                        self.call_dunder(obj, "__setattr__", ArgValues::Two(name_value, value))?;
                        return Ok(());
                    }

                    // A property setter wins over the instance dict.
                    if let Some((attr, _)) = mro_lookup(self.heap, class_id, name)
                        && let Value::Ref(attr_id) = attr
                        && let HeapData::Property(property) = self.heap.get(attr_id)
                    {
                        let fset = property.fset;
                        return match fset {
                            Some(fset) => {
                                self.call_value(fset, ArgValues::Two(obj, value))?;
                                Ok(())
                            }
                            None => Err(ExcType::AttributeError.msg("can't set attribute")),
                        };
                    }

                    if let HeapData::Instance(instance) = self.heap.get_mut(id) {
                        instance.attrs.insert(name.to_string(), value);
                    }
                    return Ok(());
                }
                HeapData::ClassObject(_) => {
                    if let HeapData::ClassObject(cls) = self.heap.get_mut(id) {
                        cls.namespace.insert(name.to_string(), value);
                    }
                    // New methods defined after class creation pick up the
                    // class as their super pivot.
                    self.set_defining_class(value, id);
                    return Ok(());
                }
                HeapData::Function(_) => {
                    if let HeapData::Function(func) = self.heap.get_mut(id) {
                        func.attrs.insert(name.to_string(), value);
                    }
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(ExcType::attribute_error(&obj.type_name(self.heap), name))
    }

    pub(crate) fn del_attr(&mut self, obj: Value, name: &str) -> RunResult<()> {
        if let Value::Ref(id) = obj {
            match self.heap.get(id) {
                HeapData::Instance(instance) => {
                    let class_id = instance.class_id;

                    // del through a property routes to its deleter.
                    if let Some((attr, _)) = mro_lookup(self.heap, class_id, name)
                        && let Value::Ref(attr_id) = attr
                        && let HeapData::Property(property) = self.heap.get(attr_id)
                    {
                        let fdel = property.fdel;
                        return match fdel {
                            Some(fdel) => {
                                self.call_value(fdel, ArgValues::One(obj))?;
                                Ok(())
                            }
                            None => Err(ExcType::AttributeError.msg("can't delete attribute")),
                        };
                    }

                    let removed = match self.heap.get_mut(id) {
                        HeapData::Instance(instance) => instance.attrs.shift_remove(name).is_some(),
                        _ => unreachable!("checked above"),
                    };
                    if removed {
                        return Ok(());
                    }
                    return Err(ExcType::attribute_error(&obj.type_name(self.heap), name));
                }
                HeapData::ClassObject(_) => {
                    let removed = match self.heap.get_mut(id) {
                        HeapData::ClassObject(cls) => cls.namespace.shift_remove(name).is_some(),
                        _ => unreachable!("checked above"),
                    };
                    if removed {
                        return Ok(());
                    }
                    return Err(ExcType::attribute_error("type", name));
                }
                _ => {}
            }
        }
        Err(ExcType::attribute_error(&obj.type_name(self.heap), name))
    }

    // --- implicit dunder dispatch ---

    /// Calls a dunder on an instance, searching only the class MRO: the
    /// instance dict and `__getattr__` are intentionally bypassed.
    ///
    /// Returns `None` when the class does not define the method.
    pub(crate) fn call_dunder(
        &mut self,
        obj: Value,
        name: &str,
        args: ArgValues,
    ) -> RunResult<Option<Value>> {
        let Value::Ref(id) = obj else { return Ok(None) };
        let class_id = match self.heap.get(id) {
            HeapData::Instance(instance) => instance.class_id,
            _ => return Ok(None),
        };
        let Some((attr, _defining_class)) = mro_lookup(self.heap, class_id, name) else {
            return Ok(None);
        };
        if let Value::Ref(attr_id) = attr {
            match self.heap.get(attr_id) {
                HeapData::Function(_) => {
                    return self.call_value(attr, args.prepend(obj)).map(Some);
                }
                HeapData::ClassMethod(inner) => {
                    let inner = *inner;
                    return self
                        .call_value(inner, args.prepend(Value::Ref(class_id)))
                        .map(Some);
                }
                HeapData::StaticMethod(inner) => {
                    let inner = *inner;
                    return self.call_value(inner, args).map(Some);
                }
                _ => {}
            }
        }
        // A non-function class attribute used as a protocol slot.
        self.call_value(attr, args.prepend(obj)).map(Some)
    }

    /// Builds the object `super()` evaluates to.
    pub(crate) fn make_super(&mut self, args: ArgValues) -> RunResult<Value> {
        match args {
            ArgValues::Empty => {
                let Some((pivot, instance)) = self.current_super_context() else {
                    return Err(ExcType::runtime_error(
                        "super(): no arguments and no enclosing method",
                    ));
                };
                Ok(self.heap.alloc_value(HeapData::Super(SuperProxy { pivot, instance })))
            }
            ArgValues::Two(class_value, instance) => {
                let Value::Ref(pivot) = class_value else {
                    return Err(ExcType::type_error("super() argument 1 must be a type"));
                };
                if !matches!(self.heap.get(pivot), HeapData::ClassObject(_)) {
                    return Err(ExcType::type_error("super() argument 1 must be a type"));
                }
                Ok(self.heap.alloc_value(HeapData::Super(SuperProxy { pivot, instance })))
            }
            other => Err(ExcType::type_error(format!(
                "super() takes 0 or 2 arguments ({} given)",
                other.pos_len()
            ))),
        }
    }
}
