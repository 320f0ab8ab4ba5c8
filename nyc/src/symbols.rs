use indexmap::IndexMap;

use crate::grammar::ast::{Expr, StructDef, Visibility};
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub usize);

/// Stable handle to a symbol: the scope it lives in plus its slot within
/// that scope. Valid for the life of the table, since scopes are archived
/// and never shrunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolId {
    pub scope: ScopeId,
    pub slot: usize,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// Local, parameter or global. Offset is relative to the frame base:
    /// negative for locals, >= 16 for parameters.
    Var { ty: Type, offset: i64, size: i64 },
    Func {
        ret: Type,
        params: Vec<Type>,
        is_extern: bool,
    },
    /// Struct definition; the full definition lives in the struct registry.
    Struct { name: String },
    /// Field of a struct; offset is relative to the struct base.
    Member {
        vis: Visibility,
        ty: Type,
        offset: i64,
        size: i64,
    },
    /// Named constant; the value expression is inlined at reference sites.
    Const { ty: Type, value: Expr },
    EnumType { name: String },
    EnumMember { value: i64 },
}

#[derive(Debug)]
pub struct Scope {
    pub symbols: IndexMap<String, Symbol>,
    /// Running (negative) offset used to place locals declared in this scope.
    pub current_offset: i64,
    pub parent: Option<ScopeId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Scope {
            symbols: IndexMap::new(),
            current_offset: 0,
            parent,
        }
    }
}

/// Append-only archive of every scope ever entered, plus a movable current
/// head. `exit_scope` moves the head to the parent and never deletes, so
/// `SymbolId`s held by AST nodes stay valid until the pipeline exits.
/// A process-wide struct registry lives alongside, independent of scoping.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
    structs: IndexMap<String, StructDef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(None)],
            current: ScopeId(0),
            structs: IndexMap::new(),
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// A child scope continues the parent's running offset, so locals in
    /// nested block scopes land below the enclosing ones.
    pub fn enter_scope(&mut self) -> ScopeId {
        let parent = self.current;
        let id = ScopeId(self.scopes.len());
        let mut scope = Scope::new(Some(parent));
        scope.current_offset = self.scopes[parent.0].current_offset;
        self.scopes.push(scope);
        self.current = id;
        id
    }

    /// Move the head back to the parent, folding the child's low-water mark
    /// into it so enclosing frames account for nested locals. The scope
    /// itself stays archived.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            let child_offset = self.scopes[self.current.0].current_offset;
            let parent_scope = &mut self.scopes[parent.0];
            parent_scope.current_offset = parent_scope.current_offset.min(child_offset);
            self.current = parent;
        }
    }

    /// Archive a scope without moving the head; used for struct member
    /// tables, which are not part of name lookup.
    pub fn push_detached_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(None));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn all_scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Insert into the current scope. `None` means a symbol with that name
    /// already exists there.
    pub fn add_symbol(&mut self, symbol: Symbol) -> Option<SymbolId> {
        self.insert_into(self.current, symbol)
    }

    pub fn insert_into(&mut self, scope: ScopeId, symbol: Symbol) -> Option<SymbolId> {
        let symbols = &mut self.scopes[scope.0].symbols;
        if symbols.contains_key(&symbol.name) {
            return None;
        }
        let (slot, _) = symbols.insert_full(symbol.name.clone(), symbol);
        Some(SymbolId { scope, slot })
    }

    /// Scan from the current scope upward; first hit wins.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(slot) = self.scopes[id.0].symbols.get_index_of(name) {
                return Some(SymbolId { scope: id, slot });
            }
            scope = self.scopes[id.0].parent;
        }
        None
    }

    pub fn lookup_current(&self, name: &str) -> Option<SymbolId> {
        self.scopes[self.current.0]
            .symbols
            .get_index_of(name)
            .map(|slot| SymbolId {
                scope: self.current,
                slot,
            })
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        let (_, symbol) = self.scopes[id.scope.0]
            .symbols
            .get_index(id.slot)
            .expect("archived symbol slot");
        symbol
    }

    pub fn define_struct(&mut self, def: StructDef) {
        self.structs.insert(def.name.clone(), def);
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    pub fn is_struct_defined(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn structs(&self) -> &IndexMap<String, StructDef> {
        &self.structs
    }

    /// Byte size of a type; `None` when it involves an unregistered struct.
    pub fn type_size(&self, ty: &Type) -> Option<i64> {
        match ty {
            Type::Primitive(p) => Some(p.size()),
            Type::Pointer(_) => Some(8),
            Type::Array(base, n) => self.type_size(base).map(|s| s * (*n).max(0)),
            Type::Struct(name) => self.struct_def(name).map(|def| def.size),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
