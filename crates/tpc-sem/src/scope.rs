//! Lexically-scoped symbol table with overload buckets.
//!
//! Scopes form a tree of frames with parent links; `enter_scope` pushes
//! a child of the current frame and `exit_scope` moves back to the
//! parent. Frames are never re-entered after exit, but they stay alive
//! for the duration of the compilation.
//!
//! Names are Pascal identifiers and therefore case-insensitive: every
//! key is folded to lowercase on insert and lookup.

use tpc_util::{define_idx, FxHashMap, IndexVec};

use tpc_par::ParamMode;

use crate::types::{DataType, Ty, TypeDef};

define_idx!(ScopeId);

/// What a symbol names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Constant,
    Variable,
    Parameter,
    Type,
    Procedure,
    Function,
}

/// One declared parameter of a routine.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
    pub mode: ParamMode,
}

/// A named entity in the symbol table.
#[derive(Clone, Debug)]
pub struct Symbol {
    /// Declaration-cased name.
    pub name: String,
    pub kind: SymbolKind,
    /// Type of values of this symbol. For routines this is `Void`; the
    /// callable signature lives in `params`/`ret`.
    pub ty: Ty,
    /// Return type for functions.
    pub ret: Option<Ty>,
    /// Ordered parameter list for routines.
    pub params: Vec<Param>,
    /// Scope nesting level at the definition site (0 = global).
    pub scope_level: u32,
}

impl Symbol {
    /// A variable of the given type.
    pub fn variable(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Variable,
            ty,
            ret: None,
            params: Vec::new(),
            scope_level: 0,
        }
    }

    /// A constant of the given type.
    pub fn constant(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Constant,
            ty,
            ret: None,
            params: Vec::new(),
            scope_level: 0,
        }
    }

    /// A parameter of the given type.
    pub fn parameter(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Parameter,
            ty,
            ret: None,
            params: Vec::new(),
            scope_level: 0,
        }
    }

    /// A named type with its descriptor. `ty` is the type of *values*
    /// of the type (e.g. `Custom` for records, the base ordinal for
    /// subranges).
    pub fn type_symbol(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Type,
            ty,
            ret: None,
            params: Vec::new(),
            scope_level: 0,
        }
    }

    /// A procedure or function.
    pub fn routine(name: impl Into<String>, params: Vec<Param>, ret: Option<Ty>) -> Self {
        let kind = if ret.is_some() {
            SymbolKind::Function
        } else {
            SymbolKind::Procedure
        };
        Self {
            name: name.into(),
            kind,
            ty: Ty::simple(DataType::Void),
            ret,
            params,
            scope_level: 0,
        }
    }

    /// Returns true for procedures and functions.
    pub fn is_routine(&self) -> bool {
        matches!(self.kind, SymbolKind::Procedure | SymbolKind::Function)
    }
}

/// One lexical frame.
#[derive(Debug)]
struct Scope {
    /// Bindings in this frame. Routines share a bucket per name; every
    /// other kind occupies a one-element bucket.
    bindings: FxHashMap<String, Vec<Symbol>>,
    /// Parent frame.
    parent: Option<ScopeId>,
    /// Nesting depth (root = 0).
    level: u32,
}

/// The symbol table: a tree of scope frames with a cursor.
pub struct SymbolTable {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
}

impl SymbolTable {
    /// Creates a table with one global frame.
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let root = scopes.push(Scope {
            bindings: FxHashMap::default(),
            parent: None,
            level: 0,
        });
        Self {
            scopes,
            current: root,
        }
    }

    /// Pushes a new frame under the current one.
    pub fn enter_scope(&mut self) -> ScopeId {
        let level = self.scopes[self.current].level + 1;
        let child = self.scopes.push(Scope {
            bindings: FxHashMap::default(),
            parent: Some(self.current),
            level,
        });
        self.current = child;
        child
    }

    /// Pops back to the parent frame. The popped frame is never
    /// re-entered.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    /// Current nesting level (0 = global).
    pub fn current_level(&self) -> u32 {
        self.scopes[self.current].level
    }

    /// Defines a unique symbol in the current frame.
    ///
    /// Returns `false` (and leaves the table unchanged) if the name is
    /// already bound in this frame.
    pub fn define(&mut self, mut symbol: Symbol) -> bool {
        let key = symbol.name.to_ascii_lowercase();
        let scope = &mut self.scopes[self.current];
        if scope.bindings.contains_key(&key) {
            return false;
        }
        symbol.scope_level = scope.level;
        scope.bindings.insert(key, vec![symbol]);
        true
    }

    /// Appends a routine symbol to the per-name overload bucket of the
    /// current frame.
    pub fn define_overloaded(&mut self, mut symbol: Symbol) {
        let key = symbol.name.to_ascii_lowercase();
        let scope = &mut self.scopes[self.current];
        symbol.scope_level = scope.level;
        scope.bindings.entry(key).or_default().push(symbol);
    }

    /// Finds a name, walking frames innermost-first. For an overloaded
    /// name this returns the first entry of the bucket.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let key = name.to_ascii_lowercase();
        let mut scope_id = self.current;
        loop {
            let scope = &self.scopes[scope_id];
            if let Some(bucket) = scope.bindings.get(&key) {
                return bucket.first();
            }
            match scope.parent {
                Some(parent) => scope_id = parent,
                None => return None,
            }
        }
    }

    /// All overloads of a name visible from the current scope. Buckets
    /// are not merged across frames: the innermost frame that binds the
    /// name wins.
    pub fn lookup_all_overloads(&self, name: &str) -> Vec<&Symbol> {
        let key = name.to_ascii_lowercase();
        let mut scope_id = self.current;
        loop {
            let scope = &self.scopes[scope_id];
            if let Some(bucket) = scope.bindings.get(&key) {
                return bucket.iter().collect();
            }
            match scope.parent {
                Some(parent) => scope_id = parent,
                None => return Vec::new(),
            }
        }
    }

    /// Finds the single overload whose declared parameter types match
    /// `arg_types` element-wise: identity, plus the implicit widenings
    /// Integer↔Byte, Integer→Real, Char→String and
    /// bounded-string↔String.
    pub fn lookup_function(&self, name: &str, arg_types: &[DataType]) -> Option<&Symbol> {
        self.lookup_all_overloads(name)
            .into_iter()
            .find(|symbol| {
                symbol.is_routine()
                    && symbol.params.len() == arg_types.len()
                    && symbol
                        .params
                        .iter()
                        .zip(arg_types)
                        .all(|(param, arg)| signature_match(&param.ty, arg))
            })
    }

    /// Overload bucket of a name in the current frame only.
    pub fn current_scope_overloads(&self, name: &str) -> &[Symbol] {
        self.scopes[self.current]
            .bindings
            .get(&name.to_ascii_lowercase())
            .map(|bucket| bucket.as_slice())
            .unwrap_or(&[])
    }

    /// Resolves a plain type name to the `DataType` of its values.
    /// Built-in names resolve directly; user names go through the
    /// table; anything else is `Unknown`.
    pub fn resolve_data_type(&self, name: &str) -> Ty {
        if let Some(rest) = name.strip_prefix('^') {
            return Ty::pointer_to(rest.trim());
        }
        match name.to_ascii_lowercase().as_str() {
            "integer" | "longint" | "word" | "shortint" => Ty::simple(DataType::Integer),
            "real" | "double" | "single" | "extended" => Ty::simple(DataType::Real),
            "boolean" => Ty::simple(DataType::Boolean),
            "char" => Ty::simple(DataType::Char),
            "byte" => Ty::simple(DataType::Byte),
            "string" => Ty::simple(DataType::String),
            "text" => Ty::simple(DataType::Text),
            "file" => Ty::simple(DataType::File),
            _ => match self.lookup(name) {
                Some(symbol) if symbol.kind == SymbolKind::Type => symbol.ty.clone(),
                _ => Ty::unknown(),
            },
        }
    }

    /// The structured descriptor of a named user type, if any.
    pub fn lookup_type_def(&self, name: &str) -> Option<&TypeDef> {
        match self.lookup(name) {
            Some(symbol) if symbol.kind == SymbolKind::Type => symbol.ty.def.as_ref(),
            _ => None,
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Signature matching for `lookup_function`: identity plus the implicit
/// widenings.
fn signature_match(param: &Ty, arg: &DataType) -> bool {
    match (&param.data, arg) {
        (a, b) if a == b => true,
        (DataType::Integer, DataType::Byte) | (DataType::Byte, DataType::Integer) => true,
        (DataType::Real, DataType::Integer) => true,
        (DataType::String, DataType::Char) => true,
        (DataType::String, DataType::Custom(_)) => true, // bounded-string → string
        (DataType::Custom(_), DataType::String) if param.is_bounded_string() => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordField;

    fn int_ty() -> Ty {
        Ty::simple(DataType::Integer)
    }

    fn real_ty() -> Ty {
        Ty::simple(DataType::Real)
    }

    #[test]
    fn test_define_and_lookup() {
        let mut table = SymbolTable::new();
        assert!(table.define(Symbol::variable("Count", int_ty())));
        let found = table.lookup("count").expect("case-insensitive lookup");
        assert_eq!(found.name, "Count");
        assert_eq!(found.kind, SymbolKind::Variable);
    }

    #[test]
    fn test_duplicate_define_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        assert!(table.define(Symbol::variable("x", int_ty())));
        assert!(!table.define(Symbol::variable("X", real_ty())));
    }

    #[test]
    fn test_shadowing_in_inner_scope() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", int_ty()));
        table.enter_scope();
        assert!(table.define(Symbol::variable("x", real_ty())));
        assert_eq!(table.lookup("x").unwrap().ty.data, DataType::Real);
        table.exit_scope();
        assert_eq!(table.lookup("x").unwrap().ty.data, DataType::Integer);
    }

    #[test]
    fn test_scope_levels() {
        let mut table = SymbolTable::new();
        assert_eq!(table.current_level(), 0);
        table.enter_scope();
        assert_eq!(table.current_level(), 1);
        table.define(Symbol::variable("local", int_ty()));
        assert_eq!(table.lookup("local").unwrap().scope_level, 1);
        table.exit_scope();
        assert_eq!(table.current_level(), 0);
        assert!(table.lookup("local").is_none());
    }

    #[test]
    fn test_overload_bucket() {
        let mut table = SymbolTable::new();
        table.define_overloaded(Symbol::routine(
            "Max",
            vec![
                Param { name: "a".into(), ty: int_ty(), mode: ParamMode::Value },
                Param { name: "b".into(), ty: int_ty(), mode: ParamMode::Value },
            ],
            Some(int_ty()),
        ));
        table.define_overloaded(Symbol::routine(
            "Max",
            vec![
                Param { name: "a".into(), ty: real_ty(), mode: ParamMode::Value },
                Param { name: "b".into(), ty: real_ty(), mode: ParamMode::Value },
            ],
            Some(real_ty()),
        ));

        assert_eq!(table.lookup_all_overloads("max").len(), 2);
        // Non-callable use resolves to the first entry.
        assert_eq!(
            table.lookup("MAX").unwrap().ret.as_ref().unwrap().data,
            DataType::Integer
        );

        let int_match = table
            .lookup_function("Max", &[DataType::Integer, DataType::Integer])
            .expect("integer overload");
        assert_eq!(int_match.ret.as_ref().unwrap().data, DataType::Integer);

        let real_match = table
            .lookup_function("Max", &[DataType::Real, DataType::Real])
            .expect("real overload");
        assert_eq!(real_match.ret.as_ref().unwrap().data, DataType::Real);
    }

    #[test]
    fn test_lookup_function_widens_integer_to_real() {
        let mut table = SymbolTable::new();
        table.define_overloaded(Symbol::routine(
            "Half",
            vec![Param { name: "x".into(), ty: real_ty(), mode: ParamMode::Value }],
            Some(real_ty()),
        ));
        assert!(table.lookup_function("Half", &[DataType::Integer]).is_some());
        assert!(table.lookup_function("Half", &[DataType::String]).is_none());
    }

    #[test]
    fn test_resolve_builtin_type_names() {
        let table = SymbolTable::new();
        assert_eq!(table.resolve_data_type("Integer").data, DataType::Integer);
        assert_eq!(table.resolve_data_type("REAL").data, DataType::Real);
        assert_eq!(table.resolve_data_type("text").data, DataType::Text);
        assert_eq!(table.resolve_data_type("nothing").data, DataType::Unknown);
    }

    #[test]
    fn test_resolve_pointer_prefix() {
        let table = SymbolTable::new();
        let ty = table.resolve_data_type("^TNode");
        assert_eq!(ty.data, DataType::Pointer);
        assert_eq!(ty.pointee.as_deref(), Some("TNode"));
    }

    #[test]
    fn test_resolve_user_type() {
        let mut table = SymbolTable::new();
        let def = TypeDef::Record {
            fields: vec![RecordField {
                name: "x".into(),
                ty: TypeDef::Builtin(DataType::Integer),
            }],
        };
        table.define(Symbol::type_symbol("TPoint", Ty::custom("TPoint", def)));
        let ty = table.resolve_data_type("tpoint");
        assert!(matches!(ty.data, DataType::Custom(ref n) if n == "TPoint"));
        assert!(table.lookup_type_def("TPOINT").is_some());
    }
}
