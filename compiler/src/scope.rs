//! Lexical scopes for the reducer.
//!
//! Scopes live in an arena and point at their parent by index. Every call
//! and every block gets its own scope; retired slots go on a free list and
//! are handed out again by `push`. A block that some function was defined
//! in is pinned instead, so the function keeps its parent chain.

use ercs_parser::{FunctionDef, Span};
use rustc_hash::FxHashMap;

use crate::error::ScopeError;
use crate::factor::FactorList;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Function,
    Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Value(FactorList),
    Function(FunctionId),
    /// Marker for an array whose elements are bound as `name[i]`.
    Array { len: usize },
}

pub type Bindings = FxHashMap<String, Binding>;

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    bindings: Bindings,
    pinned: bool,
}

/// A callable function and the scope it was defined in. Each call runs in a
/// fresh function scope whose parent is `parent`.
#[derive(Clone, Copy, Debug)]
pub struct FunctionRecord<'p> {
    pub def: &'p FunctionDef,
    pub parent: ScopeId,
}

#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    free: Vec<ScopeId>,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Root,
                parent: None,
                bindings: Bindings::default(),
                pinned: false,
            }],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let scope = Scope {
            kind,
            parent: Some(parent),
            bindings: Bindings::default(),
            pinned: false,
        };
        match self.free.pop() {
            Some(id) => {
                self.scopes[id.0] = scope;
                id
            }
            None => {
                self.scopes.push(scope);
                ScopeId(self.scopes.len() - 1)
            }
        }
    }

    /// Drop every binding of a finished scope and free its slot unless it
    /// is pinned.
    pub fn retire(&mut self, id: ScopeId) {
        let scope = &mut self.scopes[id.0];
        scope.bindings = Bindings::default();
        if !scope.pinned {
            self.free.push(id);
        }
    }

    /// Keep `id` and its enclosing blocks out of the free list. Called when
    /// a function is defined in `id`: its value may outlive the block through
    /// an assignment in the enclosing function.
    pub fn pin(&mut self, id: ScopeId) {
        let mut cursor = Some(id);
        while let Some(id) = cursor {
            let scope = &mut self.scopes[id.0];
            if scope.kind != ScopeKind::Block || scope.pinned {
                break;
            }
            scope.pinned = true;
            cursor = scope.parent;
        }
    }

    /// Number of slots, live or free.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.scopes[id.0].kind
    }

    /// Nearest binding of `name`, walking outwards.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Binding> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.0];
            if let Some(binding) = scope.bindings.get(name) {
                return Some(binding);
            }
            cursor = scope.parent;
        }
        None
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        binding: Binding,
        span: Span,
    ) -> Result<(), ScopeError> {
        let bindings = &mut self.scopes[scope.0].bindings;
        if bindings.contains_key(name) {
            return Err(ScopeError::RedeclaredIdentifier {
                name: name.to_string(),
                span,
            });
        }
        bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Overwrite the nearest binding of `name` owned by the current
    /// function. Bindings further out than the innermost function scope
    /// are read-only.
    pub fn assign(
        &mut self,
        from: ScopeId,
        name: &str,
        binding: Binding,
        span: Span,
    ) -> Result<(), ScopeError> {
        let mut cursor = Some(from);
        let mut crossed = false;
        while let Some(id) = cursor {
            let scope = &mut self.scopes[id.0];
            if let Some(slot) = scope.bindings.get_mut(name) {
                if crossed {
                    return Err(ScopeError::CapturedAssignment {
                        name: name.to_string(),
                        span,
                    });
                }
                *slot = binding;
                return Ok(());
            }
            if scope.kind != ScopeKind::Block {
                crossed = true;
            }
            cursor = scope.parent;
        }
        Err(ScopeError::UndeclaredIdentifier {
            name: name.to_string(),
            span,
        })
    }

}
