//! Two-scope symbol table: class scope (`static`/`field`) and subroutine
//! scope (`arg`/`var`), each with its own dense per-kind index counters.

use std::collections::HashMap;

/// The storage class of a declared name. Determines both the VM segment
/// used to address it and which scope it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

impl Kind {
    fn is_class_scope(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    ty: String,
    kind: Kind,
    index: u16,
}

/// Tracks identifier declarations across a class's two scopes and answers
/// lookups, preferring subroutine scope over class scope (shadowing).
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Entry>,
    subroutine_scope: HashMap<String, Entry>,
    static_count: u16,
    field_count: u16,
    arg_count: u16,
    var_count: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears subroutine scope and resets the `arg`/`var` counters. Call at
    /// the start of each subroutine; class-scope entries and counters are
    /// untouched.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.arg_count = 0;
        self.var_count = 0;
    }

    /// Defines a new identifier, assigning it the next dense index for its
    /// kind. Redefining an existing name in the same scope silently
    /// overwrites the previous entry (undefined by the grammar; the parser
    /// never actually does this).
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) {
        let index = self.counter_mut(kind);
        let assigned = *index;
        *index += 1;

        let entry = Entry {
            ty: ty.to_string(),
            kind,
            index: assigned,
        };

        if kind.is_class_scope() {
            self.class_scope.insert(name.to_string(), entry);
        } else {
            self.subroutine_scope.insert(name.to_string(), entry);
        }
    }

    fn counter_mut(&mut self, kind: Kind) -> &mut u16 {
        match kind {
            Kind::Static => &mut self.static_count,
            Kind::Field => &mut self.field_count,
            Kind::Arg => &mut self.arg_count,
            Kind::Var => &mut self.var_count,
        }
    }

    /// The number of entries ever defined for `kind` in the current class
    /// (`static`/`field`) or subroutine (`arg`/`var`).
    pub fn var_count(&self, kind: Kind) -> u16 {
        match kind {
            Kind::Static => self.static_count,
            Kind::Field => self.field_count,
            Kind::Arg => self.arg_count,
            Kind::Var => self.var_count,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Entry> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|e| e.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|e| e.ty.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|e| e.index)
    }
}
