//! Scope chain and name resolution.
//!
//! Scopes live in a central arena addressed by `ScopeId`, so closures can
//! keep their defining scope alive with a plain index instead of a shared
//! pointer. Resolution order (the single hardest testable part of scoping):
//!
//! 1. a name declared `global` targets the root scope's bindings;
//! 2. a name declared `nonlocal` targets the nearest enclosing non-root
//!    scope that already contains it (validated when the scope is created);
//! 3. a name in the statically pre-declared local set that has no binding
//!    yet fails with `UnboundLocalError`;
//! 4. otherwise reads walk the parent chain; writes land in the current
//!    scope.

use ahash::{AHashMap, AHashSet};

use crate::{
    exception_private::{ExcType, RunResult},
    prepare::LocalInfo,
    value::Value,
};

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ScopeId(u32);

/// The root (module-level) scope is always index 0.
pub(crate) const GLOBAL_SCOPE: ScopeId = ScopeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Global,
    Local,
    /// Class bodies: assignments build the class namespace, and functions
    /// defined inside skip this scope when capturing their closure.
    Class,
}

#[derive(Debug)]
pub(crate) struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    bindings: AHashMap<String, Value>,
    globals_decl: AHashSet<String>,
    nonlocals_decl: AHashSet<String>,
    /// Names the static pre-pass proved local to this scope.
    locals: AHashSet<String>,
}

/// Central storage for every scope created during execution.
///
/// Scopes are never destroyed individually; like heap objects they live
/// until the interpreter is dropped, which is what lets closures outlive the
/// call that created them.
#[derive(Debug)]
pub(crate) struct Scopes {
    arena: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            arena: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                bindings: AHashMap::new(),
                globals_decl: AHashSet::new(),
                nonlocals_decl: AHashSet::new(),
                locals: AHashSet::new(),
            }],
        }
    }

    /// Creates a scope and applies the static name classification.
    ///
    /// `nonlocal` declarations are validated here — at declaration time —
    /// against the enclosing chain.
    pub fn new_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        info: &LocalInfo,
    ) -> RunResult<ScopeId> {
        for name in &info.nonlocals {
            if !self.nonlocal_target(parent, name) {
                return Err(ExcType::SyntaxError.msg(format!("no binding for nonlocal '{name}' found")));
            }
        }
        let id = ScopeId(u32::try_from(self.arena.len()).expect("scope arena exhausted"));
        self.arena.push(Scope {
            kind,
            parent: Some(parent),
            bindings: AHashMap::new(),
            globals_decl: info.globals.iter().cloned().collect(),
            nonlocals_decl: info.nonlocals.iter().cloned().collect(),
            locals: info.locals.iter().cloned().collect(),
        });
        Ok(id)
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.arena[id.0 as usize]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.arena[id.0 as usize]
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.scope(id).kind
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scope(id).parent
    }

    /// Whether `name` resolves in `scope` or anywhere up its chain.
    pub fn has(&self, id: ScopeId, name: &str) -> bool {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            if self.scope(scope_id).bindings.contains_key(name) {
                return true;
            }
            current = self.scope(scope_id).parent;
        }
        false
    }

    /// Finds the enclosing non-root scope that holds `name` — the binding
    /// target of a `nonlocal` declaration.
    fn nonlocal_target(&self, from: ScopeId, name: &str) -> bool {
        self.find_nonlocal_scope(from, name).is_some()
    }

    fn find_nonlocal_scope(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id);
            if scope.kind == ScopeKind::Global {
                return None;
            }
            if scope.kind == ScopeKind::Local
                && (scope.bindings.contains_key(name) || scope.locals.contains(name))
            {
                return Some(scope_id);
            }
            current = scope.parent;
        }
        None
    }

    pub fn get(&self, id: ScopeId, name: &str) -> RunResult<Value> {
        let scope = self.scope(id);

        if scope.globals_decl.contains(name) {
            return self
                .scope(GLOBAL_SCOPE)
                .bindings
                .get(name)
                .copied()
                .ok_or_else(|| ExcType::name_error(name));
        }

        if scope.nonlocals_decl.contains(name) {
            let target = self
                .find_nonlocal_scope(scope.parent.unwrap_or(GLOBAL_SCOPE), name)
                .ok_or_else(|| ExcType::name_error(name))?;
            return self
                .scope(target)
                .bindings
                .get(name)
                .copied()
                .ok_or_else(|| ExcType::unbound_local(name));
        }

        if let Some(value) = scope.bindings.get(name) {
            return Ok(*value);
        }

        // Known-local without a binding: assigned somewhere in this scope
        // but not yet on this execution path.
        if scope.locals.contains(name) {
            return Err(ExcType::unbound_local(name));
        }

        let mut current = scope.parent;
        while let Some(scope_id) = current {
            let parent = self.scope(scope_id);
            if let Some(value) = parent.bindings.get(name) {
                return Ok(*value);
            }
            current = parent.parent;
        }
        Err(ExcType::name_error(name))
    }

    pub fn set(&mut self, id: ScopeId, name: &str, value: Value) {
        let scope = self.scope(id);
        if scope.globals_decl.contains(name) {
            self.scope_mut(GLOBAL_SCOPE).bindings.insert(name.to_string(), value);
            return;
        }
        if scope.nonlocals_decl.contains(name) {
            if let Some(target) = self.find_nonlocal_scope(scope.parent.unwrap_or(GLOBAL_SCOPE), name)
            {
                self.scope_mut(target).bindings.insert(name.to_string(), value);
                return;
            }
        }
        self.scope_mut(id).bindings.insert(name.to_string(), value);
    }

    pub fn del(&mut self, id: ScopeId, name: &str) -> RunResult<()> {
        let scope = self.scope(id);
        if scope.globals_decl.contains(name) {
            return match self.scope_mut(GLOBAL_SCOPE).bindings.remove(name) {
                Some(_) => Ok(()),
                None => Err(ExcType::name_error(name)),
            };
        }
        if scope.nonlocals_decl.contains(name) {
            let target = self
                .find_nonlocal_scope(scope.parent.unwrap_or(GLOBAL_SCOPE), name)
                .ok_or_else(|| ExcType::name_error(name))?;
            return match self.scope_mut(target).bindings.remove(name) {
                Some(_) => Ok(()),
                None => Err(ExcType::unbound_local(name)),
            };
        }
        match self.scope_mut(id).bindings.remove(name) {
            Some(_) => Ok(()),
            None => {
                if scope_has_local(self.scope(id), name) {
                    Err(ExcType::unbound_local(name))
                } else {
                    Err(ExcType::name_error(name))
                }
            }
        }
    }

    /// Reads directly from one scope without chain walking (class namespace
    /// collection, interpreter global inspection).
    pub fn get_local(&self, id: ScopeId, name: &str) -> Option<Value> {
        self.scope(id).bindings.get(name).copied()
    }

    /// The bindings of one scope in arbitrary order (class body collection
    /// re-sorts via the statement order it recorded).
    pub fn bindings(&self, id: ScopeId) -> impl Iterator<Item = (&String, Value)> {
        self.scope(id).bindings.iter().map(|(k, v)| (k, *v))
    }

    /// Binding names in the global scope (for `dir()`).
    pub fn global_names(&self) -> Vec<String> {
        self.scope(GLOBAL_SCOPE).bindings.keys().cloned().collect()
    }
}

fn scope_has_local(scope: &Scope, name: &str) -> bool {
    scope.locals.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_info(locals: &[&str], globals: &[&str], nonlocals: &[&str]) -> LocalInfo {
        LocalInfo {
            locals: locals.iter().map(|s| (*s).to_string()).collect(),
            globals: globals.iter().map(|s| (*s).to_string()).collect(),
            nonlocals: nonlocals.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn local_shadows_parent() {
        let mut scopes = Scopes::new();
        scopes.set(GLOBAL_SCOPE, "x", Value::Int(1));
        let inner = scopes
            .new_scope(GLOBAL_SCOPE, ScopeKind::Local, &local_info(&["x"], &[], &[]))
            .unwrap();
        scopes.set(inner, "x", Value::Int(2));
        assert_eq!(scopes.get(inner, "x").unwrap(), Value::Int(2));
        assert_eq!(scopes.get(GLOBAL_SCOPE, "x").unwrap(), Value::Int(1));
    }

    #[test]
    fn known_local_before_assignment_is_unbound() {
        let mut scopes = Scopes::new();
        scopes.set(GLOBAL_SCOPE, "x", Value::Int(1));
        let inner = scopes
            .new_scope(GLOBAL_SCOPE, ScopeKind::Local, &local_info(&["x"], &[], &[]))
            .unwrap();
        let err = scopes.get(inner, "x").unwrap_err();
        let crate::exception_private::ExcPayload::Simple(exc) = &err.payload else {
            panic!();
        };
        assert_eq!(exc.exc_type, ExcType::UnboundLocalError);
    }

    #[test]
    fn global_declaration_targets_root() {
        let mut scopes = Scopes::new();
        scopes.set(GLOBAL_SCOPE, "x", Value::Int(1));
        let inner = scopes
            .new_scope(GLOBAL_SCOPE, ScopeKind::Local, &local_info(&[], &["x"], &[]))
            .unwrap();
        scopes.set(inner, "x", Value::Int(9));
        assert_eq!(scopes.get(GLOBAL_SCOPE, "x").unwrap(), Value::Int(9));
    }

    #[test]
    fn nonlocal_without_binding_fails_at_declaration() {
        let mut scopes = Scopes::new();
        let err = scopes
            .new_scope(GLOBAL_SCOPE, ScopeKind::Local, &local_info(&[], &[], &["q"]))
            .unwrap_err();
        let crate::exception_private::ExcPayload::Simple(exc) = &err.payload else {
            panic!();
        };
        assert!(exc.message.as_deref().unwrap().contains("no binding for nonlocal"));
    }

    #[test]
    fn nonlocal_writes_into_enclosing_scope() {
        let mut scopes = Scopes::new();
        let outer = scopes
            .new_scope(GLOBAL_SCOPE, ScopeKind::Local, &local_info(&["x"], &[], &[]))
            .unwrap();
        scopes.set(outer, "x", Value::Int(1));
        let inner = scopes
            .new_scope(outer, ScopeKind::Local, &local_info(&[], &[], &["x"]))
            .unwrap();
        scopes.set(inner, "x", Value::Int(2));
        assert_eq!(scopes.get(outer, "x").unwrap(), Value::Int(2));
        assert_eq!(scopes.get(inner, "x").unwrap(), Value::Int(2));
    }
}
