//! The C++ emitter.
//!
//! Walks the AST a second time and prints C++17 text. The emitter owns
//! nothing but its output buffer: the AST, the analysis side tables and
//! the type descriptors are borrowed. Output layout:
//!
//! 1. includes and the runtime prologue (plus CRT colour constants when
//!    the program uses CRT);
//! 2. struct forward declarations for every record type;
//! 3. declarations of loaded units, then of the program, in source
//!    order - forward-marked routines emit one prototype at their
//!    position and one body where the implementation appears;
//! 4. the entry function, which captures argc/argv into the
//!    Pascal-visible globals, runs unit initialization blocks, then the
//!    program body.
//!
//! - `expr.rs` - expression lowering
//! - `stmt.rs` - statement lowering
//! - `builtins.rs` - the built-in call surface

mod builtins;
mod expr;
mod stmt;

use tpc_par::{
    ArrayDim, Decl, Expr, Module, Program, RoutineDecl, Stmt, StmtKind, TypeExpr, TypeExprKind,
    Unit,
};
use tpc_sem::{eval_const_expr, Analysis, ConstValue, Dimension, Ty, TypeDef};

use crate::error::{CodeGenError, Result};
use crate::runtime;

/// Context for the routine currently being emitted.
struct RoutineFrame {
    name_lower: String,
    /// Name of the `<name>_result` local, for functions.
    result_var: Option<String>,
}

/// AST-walking C++ printer.
pub struct CppEmitter<'a> {
    analysis: &'a Analysis,
    out: String,
    indent: usize,
    routines: Vec<RoutineFrame>,
}

/// Emits a whole module (plus its loaded units) as one translation
/// unit.
pub fn emit_module(module: &Module, analysis: &Analysis) -> Result<String> {
    CppEmitter::new(analysis).emit(module)
}

impl<'a> CppEmitter<'a> {
    fn new(analysis: &'a Analysis) -> Self {
        Self {
            analysis,
            out: String::new(),
            indent: 0,
            routines: Vec::new(),
        }
    }

    fn emit(mut self, module: &Module) -> Result<String> {
        self.out.push_str(runtime::INCLUDES);
        self.out.push_str(runtime::RUNTIME_PRELUDE);

        if self.uses_crt(module) {
            self.out.push('\n');
            self.out.push_str(runtime::CRT_COLORS);
        }
        self.out.push('\n');

        self.emit_struct_forwards(module);

        let units: Vec<_> = self.analysis.units.clone();
        for unit in &units {
            self.emit_unit(unit)?;
        }

        match module {
            Module::Program(program) => {
                self.emit_decls(&program.decls)?;
                self.emit_entry(program, &units)?;
            }
            Module::Unit(unit) => {
                self.emit_unit(unit)?;
            }
        }

        Ok(self.out)
    }

    fn uses_crt(&self, module: &Module) -> bool {
        let direct = match module {
            Module::Program(p) => p.uses.iter().any(|u| u.eq_ignore_ascii_case("crt")),
            Module::Unit(u) => u
                .interface_uses
                .iter()
                .chain(&u.implementation_uses)
                .any(|n| n.eq_ignore_ascii_case("crt")),
        };
        direct
            || self.analysis.units.iter().any(|u| {
                u.interface_uses
                    .iter()
                    .chain(&u.implementation_uses)
                    .any(|n| n.eq_ignore_ascii_case("crt"))
            })
    }

    /// `struct X;` for every record type, so pointer aliases that
    /// precede their record in source still compile.
    fn emit_struct_forwards(&mut self, module: &Module) {
        fn collect(decls: &[Decl], names: &mut Vec<String>) {
            for decl in decls {
                if let Decl::TypeDef(t) = decl {
                    if matches!(t.ty.kind, TypeExprKind::Record { .. }) {
                        names.push(t.name.clone());
                    }
                }
            }
        }

        let mut names = Vec::new();
        for unit in &self.analysis.units {
            collect(&unit.interface, &mut names);
            collect(&unit.implementation, &mut names);
        }
        match module {
            Module::Program(p) => collect(&p.decls, &mut names),
            Module::Unit(u) => {
                collect(&u.interface, &mut names);
                collect(&u.implementation, &mut names);
            }
        }

        for name in names {
            let line = format!("struct {};", cpp_ident(&name));
            self.line(line);
        }
        self.blank();
    }

    fn emit_unit(&mut self, unit: &Unit) -> Result<()> {
        self.emit_decls(&unit.interface)?;
        self.emit_decls(&unit.implementation)?;
        Ok(())
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn emit_decls(&mut self, decls: &[Decl]) -> Result<()> {
        for decl in decls {
            match decl {
                Decl::Const(c) => self.emit_const_decl(c)?,
                Decl::TypeDef(t) => self.emit_type_decl(&t.name, &t.ty)?,
                Decl::Var(v) => self.emit_var_decl(v)?,
                Decl::Labels(_, _) => {}
                Decl::Routine(r) => {
                    if r.is_forward() {
                        let proto = self.routine_signature(r)?;
                        self.line(format!("{};", proto));
                        self.blank();
                    } else {
                        self.emit_routine(r)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_const_decl(&mut self, c: &tpc_par::ConstDecl) -> Result<()> {
        let name = cpp_ident(&c.name);
        let value = self.expr(&c.value)?;
        let line = match self.ty_of(&c.value).map(|t| t.data.clone()) {
            Some(tpc_sem::DataType::Integer) | Some(tpc_sem::DataType::Byte) => {
                format!("constexpr int {} = {};", name, value)
            }
            Some(tpc_sem::DataType::Real) => format!("constexpr double {} = {};", name, value),
            Some(tpc_sem::DataType::Char) => format!("constexpr char {} = {};", name, value),
            Some(tpc_sem::DataType::Boolean) => format!("constexpr bool {} = {};", name, value),
            Some(tpc_sem::DataType::String) => {
                format!("const std::string {} = {};", name, value)
            }
            _ => format!("const auto {} = {};", name, value),
        };
        self.line(line);
        Ok(())
    }

    fn emit_type_decl(&mut self, name: &str, te: &TypeExpr) -> Result<()> {
        let cpp_name = cpp_ident(name);
        match &te.kind {
            TypeExprKind::Record { .. } => {
                let def = self
                    .analysis
                    .type_defs
                    .get(&name.to_ascii_lowercase())
                    .cloned()
                    .ok_or_else(|| {
                        CodeGenError::Internal(format!("no descriptor for record '{}'", name))
                    })?;
                let TypeDef::Record { fields } = def else {
                    return Err(CodeGenError::Internal(format!(
                        "'{}' is not a record descriptor",
                        name
                    )));
                };
                self.line(format!("struct {} {{", cpp_name));
                self.indent += 1;
                for field in &fields {
                    let line = format!(
                        "{} {}{{}};",
                        self.cpp_type_of_def(&field.ty),
                        cpp_ident(&field.name)
                    );
                    self.line(line);
                }
                self.indent -= 1;
                self.line("};");
                self.blank();
            }
            TypeExprKind::Enum(values) => {
                self.line(format!("enum class {} : int {{", cpp_name));
                self.indent += 1;
                for (ordinal, value) in values.iter().enumerate() {
                    self.line(format!("{} = {},", cpp_ident(value), ordinal));
                }
                self.indent -= 1;
                self.line("};");
                // Pascal spells enum values bare, so each gets a
                // top-level alias.
                for value in values {
                    self.line(format!(
                        "constexpr {} {} = {}::{};",
                        cpp_name,
                        cpp_ident(value),
                        cpp_name,
                        cpp_ident(value)
                    ));
                }
                self.blank();
            }
            _ => {
                let target = self.cpp_type(te)?;
                self.line(format!("using {} = {};", cpp_name, target));
            }
        }
        Ok(())
    }

    fn emit_var_decl(&mut self, v: &tpc_par::VarDecl) -> Result<()> {
        let cpp_ty = self.cpp_type(&v.ty)?;
        let init = match &v.init {
            Some(expr) => format!(" = {}", self.expr(expr)?),
            None => String::new(),
        };
        for name in &v.names {
            let line = format!("{} {}{};", cpp_ty, cpp_ident(name), init);
            self.line(line);
        }
        Ok(())
    }

    // =========================================================================
    // Routines
    // =========================================================================

    fn routine_signature(&self, r: &RoutineDecl) -> Result<String> {
        let ret = match &r.ret {
            Some(te) => self.cpp_type(te)?,
            None => "void".to_string(),
        };
        let mut params = Vec::new();
        for group in &r.params {
            let base = self.cpp_type(&group.ty)?;
            for name in &group.names {
                params.push(format!(
                    "{} {}",
                    param_type(&base, group.mode),
                    cpp_ident(name)
                ));
            }
        }
        Ok(format!("{} {}({})", ret, cpp_ident(&r.name), params.join(", ")))
    }

    fn emit_routine(&mut self, r: &RoutineDecl) -> Result<()> {
        let signature = self.routine_signature(r)?;
        self.line(format!("{} {{", signature));
        self.indent += 1;
        self.emit_routine_innards(r)?;
        self.indent -= 1;
        self.line("}");
        self.blank();
        Ok(())
    }

    /// Result variable, nested declarations, body and return.
    fn emit_routine_innards(&mut self, r: &RoutineDecl) -> Result<()> {
        let result_var = if let Some(ret) = &r.ret {
            let var = format!("{}_result", cpp_ident(&r.name));
            let ret_ty = self.cpp_type(ret)?;
            self.line(format!("{} {}{{}};", ret_ty, var));
            Some(var)
        } else {
            None
        };

        self.routines.push(RoutineFrame {
            name_lower: r.name.to_ascii_lowercase(),
            result_var: result_var.clone(),
        });

        for decl in &r.decls {
            match decl {
                Decl::Routine(nested) => self.emit_nested_routine(nested)?,
                Decl::Labels(_, _) => {}
                Decl::Const(c) => self.emit_const_decl(c)?,
                Decl::TypeDef(t) => self.emit_type_decl(&t.name, &t.ty)?,
                Decl::Var(v) => self.emit_var_decl(v)?,
            }
        }

        if let Some(body) = &r.body {
            self.stmt_in_block(body)?;
        }

        if let Some(var) = result_var {
            self.line(format!("return {};", var));
        }

        self.routines.pop();
        Ok(())
    }

    /// Nested routines become `std::function` lambdas capturing the
    /// enclosing locals by reference; this also makes recursion work.
    fn emit_nested_routine(&mut self, r: &RoutineDecl) -> Result<()> {
        if r.is_forward() {
            // A nested forward declaration only makes sense with its
            // body in the same list, which is the one we emit.
            return Ok(());
        }

        let ret = match &r.ret {
            Some(te) => self.cpp_type(te)?,
            None => "void".to_string(),
        };
        let mut param_decls = Vec::new();
        let mut param_types = Vec::new();
        for group in &r.params {
            let base = self.cpp_type(&group.ty)?;
            for name in &group.names {
                let ty = param_type(&base, group.mode);
                param_types.push(ty.clone());
                param_decls.push(format!("{} {}", ty, cpp_ident(name)));
            }
        }

        self.line(format!(
            "std::function<{}({})> {} = [&]({}) -> {} {{",
            ret,
            param_types.join(", "),
            cpp_ident(&r.name),
            param_decls.join(", "),
            ret
        ));
        self.indent += 1;
        self.emit_routine_innards(r)?;
        self.indent -= 1;
        self.line("};");
        Ok(())
    }

    // =========================================================================
    // Entry point
    // =========================================================================

    fn emit_entry(&mut self, program: &Program, units: &[std::rc::Rc<Unit>]) -> Result<()> {
        self.line("int main(int argc, char* argv[]) {");
        self.indent += 1;
        self.line("pascal_argc = argc;");
        self.line("pascal_argv = argv;");

        for unit in units {
            if let Some(init) = &unit.initialization {
                for stmt in init {
                    self.stmt(stmt)?;
                }
            }
        }

        for stmt in &program.body {
            self.stmt(stmt)?;
        }

        self.line("return 0;");
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    // =========================================================================
    // Type lowering
    // =========================================================================

    /// C++ type for a source type expression.
    pub(crate) fn cpp_type(&self, te: &TypeExpr) -> Result<String> {
        Ok(match &te.kind {
            TypeExprKind::Named(name) => cpp_name_for_type_name(name),
            TypeExprKind::Pointer(inner) => format!("{}*", self.cpp_type(inner)?),
            TypeExprKind::Array { dims, elem } => {
                let mut total: i64 = 1;
                for dim in dims {
                    total *= self.dim_extent_from_ast(dim)?;
                }
                format!("std::array<{}, {}>", self.cpp_type(elem)?, total)
            }
            TypeExprKind::SetOf(inner) => format!("std::set<{}>", self.cpp_type(inner)?),
            TypeExprKind::Record { fields, .. } => {
                // Anonymous record in a var declaration: inline struct.
                let mut body = String::new();
                for group in fields {
                    let ty = self.cpp_type(&group.ty)?;
                    for name in &group.names {
                        body.push_str(&format!("{} {}{{}}; ", ty, cpp_ident(name)));
                    }
                }
                format!("struct {{ {}}}", body)
            }
            TypeExprKind::BoundedString(len) => {
                let n = match self.eval(len) {
                    Some(ConstValue::Int(n)) => n,
                    _ => 255,
                };
                format!("PascalString<{}>", n)
            }
            TypeExprKind::Subrange(lo, _) => match self.eval(lo) {
                Some(ConstValue::Char(_)) => "char".to_string(),
                _ => "int".to_string(),
            },
            TypeExprKind::Enum(_) => "int".to_string(),
            TypeExprKind::FileOf(_) => "PascalFile".to_string(),
        })
    }

    /// C++ type for a structural descriptor (record fields).
    pub(crate) fn cpp_type_of_def(&self, def: &TypeDef) -> String {
        match def {
            TypeDef::Builtin(data) => cpp_name_for_data(data),
            TypeDef::Named(name) => cpp_ident(name),
            TypeDef::Pointer(inner) => format!("{}*", self.cpp_type_of_def(inner)),
            TypeDef::Array { dims, elem } => {
                let total: i64 = dims.iter().map(|d| self.dim_extent(d)).product();
                format!("std::array<{}, {}>", self.cpp_type_of_def(elem), total)
            }
            TypeDef::Set(elem) => format!("std::set<{}>", self.cpp_type_of_def(elem)),
            TypeDef::Record { fields } => {
                let mut body = String::new();
                for field in fields {
                    body.push_str(&format!(
                        "{} {}{{}}; ",
                        self.cpp_type_of_def(&field.ty),
                        cpp_ident(&field.name)
                    ));
                }
                format!("struct {{ {}}}", body)
            }
            TypeDef::BoundedString(n) => format!("PascalString<{}>", n),
            TypeDef::Subrange { base, .. } => cpp_name_for_data(base),
            TypeDef::Enum(_) => "int".to_string(),
            TypeDef::FileOf(_) => "PascalFile".to_string(),
        }
    }

    /// Extent of a resolved dimension.
    pub(crate) fn dim_extent(&self, dim: &Dimension) -> i64 {
        match dim {
            Dimension::IntRange(lo, hi) => hi - lo + 1,
            Dimension::CharRange(lo, hi) => (*hi as i64) - (*lo as i64) + 1,
            Dimension::EnumRange(name) => match self.resolve_named_def(name) {
                Some(TypeDef::Enum(values)) => values.len() as i64,
                _ => 1,
            },
        }
    }

    fn dim_extent_from_ast(&self, dim: &ArrayDim) -> Result<i64> {
        match dim {
            ArrayDim::Range(lo, hi) => {
                let lo_v = self.eval(lo);
                let hi_v = self.eval(hi);
                match (lo_v, hi_v) {
                    (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => Ok(b - a + 1),
                    (Some(ConstValue::Char(a)), Some(ConstValue::Char(b))) => {
                        Ok((b as i64) - (a as i64) + 1)
                    }
                    _ => Err(CodeGenError::Internal(
                        "array bounds are not constant".to_string(),
                    )),
                }
            }
            ArrayDim::Named(name) => {
                let lower = name.to_ascii_lowercase();
                match lower.as_str() {
                    "boolean" => Ok(2),
                    "char" => Ok(256),
                    _ => match self.resolve_named_def(&lower) {
                        Some(TypeDef::Enum(values)) => Ok(values.len() as i64),
                        _ => Err(CodeGenError::Internal(format!(
                            "'{}' is not an ordinal index domain",
                            name
                        ))),
                    },
                }
            }
        }
    }

    /// Chases named references through the recorded descriptors.
    pub(crate) fn resolve_named_def(&self, name: &str) -> Option<TypeDef> {
        let mut def = self.analysis.type_defs.get(&name.to_ascii_lowercase())?.clone();
        loop {
            match def {
                TypeDef::Named(next) => {
                    def = self.analysis.type_defs.get(&next)?.clone();
                }
                other => return Some(other),
            }
        }
    }

    /// Resolves a value type down to a concrete descriptor.
    pub(crate) fn resolve_def(&self, ty: &Ty) -> Option<TypeDef> {
        match ty.def.as_ref()? {
            TypeDef::Named(name) => self.resolve_named_def(name),
            other => Some(other.clone()),
        }
    }

    // =========================================================================
    // Small helpers
    // =========================================================================

    pub(crate) fn ty_of(&self, e: &Expr) -> Option<&Ty> {
        self.analysis.expr_types.get(&e.id)
    }

    pub(crate) fn eval(&self, e: &Expr) -> Option<ConstValue> {
        eval_const_expr(e, &self.analysis.const_values, &self.analysis.enum_ordinals)
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Emits the statements of `stmt`, flattening one compound level.
    pub(crate) fn stmt_in_block(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Compound(stmts) => {
                for s in stmts {
                    self.stmt(s)?;
                }
                Ok(())
            }
            _ => self.stmt(stmt),
        }
    }

    pub(crate) fn current_result_var(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.routines
            .iter()
            .rev()
            .find(|frame| frame.name_lower == lower)
            .and_then(|frame| frame.result_var.as_deref())
    }

    pub(crate) fn current_exit_return(&self) -> String {
        match self.routines.last() {
            Some(frame) => match &frame.result_var {
                Some(var) => format!("return {};", var),
                None => "return;".to_string(),
            },
            None => "return 0;".to_string(),
        }
    }
}

/// Parameter spelling for a passing mode: by value, by reference, or by
/// const reference.
fn param_type(base: &str, mode: tpc_par::ParamMode) -> String {
    match mode {
        tpc_par::ParamMode::Value => base.to_string(),
        tpc_par::ParamMode::Var => format!("{}&", base),
        tpc_par::ParamMode::Const => format!("const {}&", base),
    }
}

/// C++ names that a lowercased Pascal identifier must not collide with.
const CPP_RESERVED: &[&str] = &[
    "auto", "bool", "break", "case", "catch", "char", "class", "const", "constexpr", "continue",
    "decltype", "default", "delete", "do", "double", "else", "enum", "explicit", "extern", "false",
    "float", "for", "friend", "goto", "if", "inline", "int", "long", "main", "mutable",
    "namespace", "new", "noexcept", "nullptr", "operator", "private", "protected", "public",
    "register", "return", "short", "signed", "sizeof", "static", "static_assert", "std", "struct",
    "switch", "template", "this", "throw", "true", "try", "typedef", "typename", "union",
    "unsigned", "using", "virtual", "void", "volatile", "wchar_t", "while",
];

/// Projects a Pascal identifier into C++: lowercased (Pascal names are
/// case-insensitive, C++ names are not) and kept clear of C++ keywords.
pub(crate) fn cpp_ident(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if CPP_RESERVED.contains(&lower.as_str()) {
        format!("{}_", lower)
    } else {
        lower
    }
}

/// C++ spelling of a named Pascal type.
pub(crate) fn cpp_name_for_type_name(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "integer" | "longint" | "word" | "shortint" => "int".to_string(),
        "real" | "double" | "single" | "extended" => "double".to_string(),
        "boolean" => "bool".to_string(),
        "char" => "char".to_string(),
        "byte" => "unsigned char".to_string(),
        "string" => "std::string".to_string(),
        "text" | "file" => "PascalFile".to_string(),
        _ => cpp_ident(name),
    }
}

/// C++ spelling of a builtin data type.
fn cpp_name_for_data(data: &tpc_sem::DataType) -> String {
    use tpc_sem::DataType;
    match data {
        DataType::Integer => "int".to_string(),
        DataType::Real => "double".to_string(),
        DataType::Boolean => "bool".to_string(),
        DataType::Char => "char".to_string(),
        DataType::Byte => "unsigned char".to_string(),
        DataType::String => "std::string".to_string(),
        DataType::Pointer => "void*".to_string(),
        DataType::Text | DataType::File => "PascalFile".to_string(),
        DataType::Custom(name) => cpp_ident(name),
        DataType::Void => "void".to_string(),
        DataType::Unknown => "int".to_string(),
    }
}
