//! Semantic analysis: declaration processing and statement checking.
//!
//! The analyser walks the AST once, populating the symbol table and
//! recording everything later phases need into [`Analysis`] side tables
//! keyed by expression [`NodeId`]. The AST itself is never mutated.
//! After a typing error the offending expression is annotated `Unknown`
//! and analysis continues, so downstream checks don't cascade.
//!
//! Expression typing lives in `infer.rs`.

use std::path::Path;
use std::rc::Rc;

use tpc_par::{
    ArrayDim, Decl, Expr, ExprKind, Module, NodeId, Program, RoutineDecl, Stmt, StmtKind,
    TypeExpr, TypeExprKind, Unit,
};
use tpc_util::{FxHashMap, FxHashSet, Handler, SourceMap, Span, Stage};

use crate::scope::{Param, Symbol, SymbolKind, SymbolTable};
use crate::types::{DataType, Dimension, RecordField, Ty, TypeDef};
use crate::units::UnitLoader;

/// A compile-time constant value.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Real(f64),
    Char(char),
    Str(String),
    Bool(bool),
}

/// Everything the analyser records for later phases, keyed by node
/// identity rather than written into the tree.
#[derive(Debug, Default)]
pub struct Analysis {
    /// Resolved type of every typed expression.
    pub expr_types: FxHashMap<NodeId, Ty>,
    /// Bare identifiers resolved as fields of an enclosing `with`
    /// target, mapped to that target's lvalue expression.
    pub with_bindings: FxHashMap<NodeId, Expr>,
    /// Identifier expressions that denote parameterless routine calls.
    pub implicit_calls: FxHashSet<NodeId>,
    /// Structured descriptor of every named user type (lowercased key).
    pub type_defs: FxHashMap<String, TypeDef>,
    /// Values of integer/char/real constants (lowercased key).
    pub const_values: FxHashMap<String, ConstValue>,
    /// Ordinal of every enumeration value (lowercased key).
    pub enum_ordinals: FxHashMap<String, i64>,
    /// Units loaded through `uses`, in load order.
    pub units: Vec<Rc<Unit>>,
}

/// One entry of the with-scope stack.
pub(crate) struct WithFrame {
    /// The target's lvalue expression, cloned into bindings on a hit.
    pub target: Expr,
    /// The target's record descriptor.
    pub def: TypeDef,
}

/// The enclosing routine, for function-name assignment and `exit`.
struct RoutineCtx {
    name_lower: String,
    ret: Option<Ty>,
}

/// The built-in units that are part of the fixed surface.
const BUILTIN_UNITS: [&str; 3] = ["system", "crt", "dos"];

/// Walks the AST, fills the symbol table, and checks the rules.
pub struct SemanticAnalyzer<'a> {
    pub(crate) handler: &'a Handler,
    pub(crate) table: SymbolTable,
    pub(crate) analysis: Analysis,
    pub(crate) with_stack: Vec<WithFrame>,
    routine_stack: Vec<RoutineCtx>,
    /// Declared labels, one set per routine (innermost last).
    label_sets: Vec<FxHashSet<String>>,
    loader: UnitLoader,
    sources: &'a mut SourceMap,
    /// Names of units already analysed, to make cycles harmless.
    analyzed_units: FxHashSet<String>,
    next_node_id: u32,
}

impl<'a> SemanticAnalyzer<'a> {
    /// Creates an analyser with a fresh symbol table.
    ///
    /// `next_node_id` continues the program parser's id space so that
    /// unit sources parsed on demand don't collide.
    pub fn new(
        handler: &'a Handler,
        loader: UnitLoader,
        sources: &'a mut SourceMap,
        next_node_id: u32,
    ) -> Self {
        let mut analyzer = Self {
            handler,
            table: SymbolTable::new(),
            analysis: Analysis::default(),
            with_stack: Vec::new(),
            routine_stack: Vec::new(),
            label_sets: Vec::new(),
            loader,
            sources,
            analyzed_units: FxHashSet::default(),
            next_node_id,
        };
        analyzer.define_system_constants();
        analyzer
    }

    /// The System unit's constant surface, always present.
    fn define_system_constants(&mut self) {
        self.define_int_constant("MaxInt", 32767);
        self.table.define(Symbol::constant(
            "Pi".to_string(),
            Ty::simple(DataType::Real),
        ));
        self.analysis
            .const_values
            .insert("pi".to_string(), ConstValue::Real(std::f64::consts::PI));
    }

    /// The CRT unit's colour constants, defined only on `uses crt`.
    fn define_crt_constants(&mut self) {
        const COLORS: [(&str, i64); 17] = [
            ("Black", 0),
            ("Blue", 1),
            ("Green", 2),
            ("Cyan", 3),
            ("Red", 4),
            ("Magenta", 5),
            ("Brown", 6),
            ("LightGray", 7),
            ("DarkGray", 8),
            ("LightBlue", 9),
            ("LightGreen", 10),
            ("LightCyan", 11),
            ("LightRed", 12),
            ("LightMagenta", 13),
            ("Yellow", 14),
            ("White", 15),
            ("Blink", 128),
        ];
        for (name, value) in COLORS {
            self.define_int_constant(name, value);
        }
    }

    fn define_int_constant(&mut self, name: &str, value: i64) {
        self.table.define(Symbol::constant(
            name.to_string(),
            Ty::simple(DataType::Integer),
        ));
        self.analysis
            .const_values
            .insert(name.to_ascii_lowercase(), ConstValue::Int(value));
    }

    /// Convenience constructor for analysing a module with no unit
    /// search path (tests, single-file programs).
    pub fn without_units(handler: &'a Handler, sources: &'a mut SourceMap, next_node_id: u32) -> Self {
        Self::new(handler, UnitLoader::new(Vec::new()), sources, next_node_id)
    }

    /// Analyses a parsed module.
    pub fn analyze_module(&mut self, module: &Module) {
        match module {
            Module::Program(program) => self.analyze_program(program),
            Module::Unit(unit) => {
                // Compiling a unit directly: analyse it at global scope.
                self.analyze_unit_decls(unit);
            }
        }
    }

    /// Consumes the analyser, returning the side tables and the symbol
    /// table for the emitter to borrow.
    pub fn finish(self) -> (Analysis, SymbolTable) {
        (self.analysis, self.table)
    }

    fn analyze_program(&mut self, program: &Program) {
        self.process_uses(&program.uses, program.span);

        self.label_sets.push(FxHashSet::default());
        self.analyze_decls(&program.decls);
        for stmt in &program.body {
            self.analyze_stmt(stmt);
        }
        self.label_sets.pop();
    }

    // =========================================================================
    // Uses / units
    // =========================================================================

    fn process_uses(&mut self, names: &[String], span: Span) {
        for name in names {
            let lower = name.to_ascii_lowercase();
            if BUILTIN_UNITS.contains(&lower.as_str()) {
                if lower == "crt" && !self.analysis.const_values.contains_key("white") {
                    self.define_crt_constants();
                }
                continue;
            }
            if self.analyzed_units.contains(&lower) {
                continue;
            }

            let loaded = self.loader.load(
                name,
                span,
                self.sources,
                self.handler,
                &mut self.next_node_id,
            );
            let Some(unit) = loaded else { continue };

            // Mark before descending so that unit cycles terminate.
            self.analyzed_units.insert(lower);
            self.analyze_unit_decls(&unit);
            self.analysis.units.push(unit);
        }
    }

    fn analyze_unit_decls(&mut self, unit: &Unit) {
        self.process_uses(&unit.interface_uses, unit.span);
        self.process_uses(&unit.implementation_uses, unit.span);

        self.label_sets.push(FxHashSet::default());
        self.analyze_decls(&unit.interface);
        self.analyze_decls(&unit.implementation);
        if let Some(init) = &unit.initialization {
            for stmt in init {
                self.analyze_stmt(stmt);
            }
        }
        self.label_sets.pop();
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub(crate) fn analyze_decls(&mut self, decls: &[Decl]) {
        for decl in decls {
            match decl {
                Decl::Labels(labels, span) => self.declare_labels(labels, *span),
                Decl::Const(c) => {
                    let ty = self.type_expr(&c.value);
                    if let Some(value) = self.eval_const(&c.value) {
                        self.analysis
                            .const_values
                            .insert(c.name.to_ascii_lowercase(), value);
                    }
                    if !self.table.define(Symbol::constant(c.name.clone(), ty)) {
                        self.error(c.span, format!("'{}' is already declared in this scope", c.name));
                    }
                }
                Decl::TypeDef(t) => self.analyze_type_decl(&t.name, &t.ty, t.span),
                Decl::Var(v) => {
                    let ty = self.lower_type_expr(&v.ty, None);
                    if let Some(init) = &v.init {
                        let init_ty = self.type_expr(init);
                        if !self.compatible(&ty, &init_ty) {
                            self.error(
                                init.span,
                                format!(
                                    "cannot initialise {} with {}",
                                    ty.data, init_ty.data
                                ),
                            );
                        }
                    }
                    for name in &v.names {
                        if !self.table.define(Symbol::variable(name.clone(), ty.clone())) {
                            self.error(
                                v.span,
                                format!("'{}' is already declared in this scope", name),
                            );
                        }
                    }
                }
                Decl::Routine(r) => self.analyze_routine(r),
            }
        }
    }

    fn declare_labels(&mut self, labels: &[String], span: Span) {
        let set = self
            .label_sets
            .last_mut()
            .expect("label declaration outside any routine");
        for label in labels {
            if !set.insert(label.clone()) {
                self.handler.error(
                    Stage::Semantic,
                    format!("label '{}' is already declared", label),
                    span,
                );
            }
        }
    }

    fn analyze_type_decl(&mut self, name: &str, te: &TypeExpr, span: Span) {
        let ty = self.lower_type_expr(te, Some(name));
        let def = ty.def.clone().unwrap_or(TypeDef::Builtin(ty.data.clone()));

        self.analysis
            .type_defs
            .insert(name.to_ascii_lowercase(), def.clone());

        if !self
            .table
            .define(Symbol::type_symbol(name.to_string(), ty.clone()))
        {
            self.error(span, format!("'{}' is already declared in this scope", name));
            return;
        }

        // Enumeration values become constants of the enum type, with
        // their ordinals recorded for array flattening and case labels.
        if let TypeDef::Enum(values) = &def {
            for (ordinal, value) in values.iter().enumerate() {
                let value_ty = Ty::custom(name.to_string(), def.clone());
                if !self.table.define(Symbol::constant(value.clone(), value_ty)) {
                    self.error(
                        span,
                        format!("'{}' is already declared in this scope", value),
                    );
                }
                self.analysis
                    .enum_ordinals
                    .insert(value.to_ascii_lowercase(), ordinal as i64);
            }
        }
    }

    fn analyze_routine(&mut self, routine: &RoutineDecl) {
        let params = self.lower_params(routine);
        let ret = routine.ret.as_ref().map(|te| self.lower_type_expr(te, None));

        let param_data: Vec<DataType> = params.iter().map(|p| p.ty.data.clone()).collect();
        let already_declared = self
            .table
            .current_scope_overloads(&routine.name)
            .iter()
            .any(|existing| {
                existing.is_routine()
                    && existing.params.len() == param_data.len()
                    && existing
                        .params
                        .iter()
                        .zip(&param_data)
                        .all(|(p, a)| p.ty.data == *a)
            });

        if already_declared {
            if routine.body.is_none() {
                self.error(
                    routine.span,
                    format!("'{}' is already declared with this signature", routine.name),
                );
            }
            // A body following a forward declaration (or an interface
            // header) implements the existing symbol.
        } else {
            self.table
                .define_overloaded(Symbol::routine(routine.name.clone(), params.clone(), ret.clone()));
        }

        let Some(body) = &routine.body else { return };

        self.table.enter_scope();
        for param in &params {
            if !self
                .table
                .define(Symbol::parameter(param.name.clone(), param.ty.clone()))
            {
                self.error(
                    routine.span,
                    format!("parameter '{}' is declared twice", param.name),
                );
            }
        }

        self.routine_stack.push(RoutineCtx {
            name_lower: routine.name.to_ascii_lowercase(),
            ret: ret.clone(),
        });
        self.label_sets.push(FxHashSet::default());

        self.analyze_decls(&routine.decls);
        self.analyze_stmt(body);

        self.label_sets.pop();
        self.routine_stack.pop();
        self.table.exit_scope();
    }

    fn lower_params(&mut self, routine: &RoutineDecl) -> Vec<Param> {
        let mut params = Vec::new();
        for group in &routine.params {
            let ty = self.lower_type_expr(&group.ty, None);
            for name in &group.names {
                params.push(Param {
                    name: name.clone(),
                    ty: ty.clone(),
                    mode: group.mode,
                });
            }
        }
        params
    }

    // =========================================================================
    // Type expressions → structured descriptors
    // =========================================================================

    /// Lowers a source type expression to the type of its values, with
    /// the structural descriptor attached. `name_hint` is the declared
    /// type name when lowering a `type` block entry.
    pub(crate) fn lower_type_expr(&mut self, te: &TypeExpr, name_hint: Option<&str>) -> Ty {
        match &te.kind {
            TypeExprKind::Named(name) => {
                let ty = self.table.resolve_data_type(name);
                if ty.is_unknown() {
                    self.error(te.span, format!("unknown type '{}'", name));
                }
                ty
            }
            TypeExprKind::Pointer(inner) => match &inner.kind {
                TypeExprKind::Named(pointee) => Ty::pointer_to(pointee.clone()),
                _ => {
                    self.error(inner.span, "a pointer type requires a named pointee");
                    Ty::unknown()
                }
            },
            TypeExprKind::Array { dims, elem } => {
                let dimensions: Vec<Dimension> = dims
                    .iter()
                    .filter_map(|dim| self.lower_dimension(dim, te.span))
                    .collect();
                let elem_ty = self.lower_type_expr(elem, None);
                let def = TypeDef::Array {
                    dims: dimensions,
                    elem: Box::new(self.descriptor_of(&elem_ty, elem)),
                };
                Ty::custom(name_hint.unwrap_or("array").to_string(), def)
            }
            TypeExprKind::SetOf(inner) => {
                let elem_ty = self.lower_type_expr(inner, None);
                if !elem_ty.is_ordinal() && !elem_ty.is_unknown() {
                    self.error(inner.span, "set elements must be an ordinal type");
                }
                let def = TypeDef::Set(Box::new(self.descriptor_of(&elem_ty, inner)));
                let name = name_hint
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("set of {}", elem_ty.data.name()));
                Ty::custom(name, def)
            }
            TypeExprKind::Record { fields, variant } => {
                let mut record_fields: Vec<RecordField> = Vec::new();

                for group in fields {
                    let field_ty = self.lower_type_expr(&group.ty, None);
                    let field_def = self.descriptor_of(&field_ty, &group.ty);
                    for name in &group.names {
                        if record_fields
                            .iter()
                            .any(|f| f.name.eq_ignore_ascii_case(name))
                        {
                            self.error(group.ty.span, format!("duplicate field '{}'", name));
                        } else {
                            record_fields.push(RecordField {
                                name: name.clone(),
                                ty: field_def.clone(),
                            });
                        }
                    }
                }

                // The variant part flattens into the same field list: the
                // tag (when named) and every branch's fields are plain
                // fields, accessible at all times.
                if let Some(variant) = variant {
                    if let Some(tag) = &variant.tag_name {
                        let tag_def = self.descriptor_for_name(&variant.tag_type, te.span);
                        record_fields.push(RecordField {
                            name: tag.clone(),
                            ty: tag_def,
                        });
                    }
                    for branch in &variant.branches {
                        for group in &branch.fields {
                            let field_ty = self.lower_type_expr(&group.ty, None);
                            let field_def = self.descriptor_of(&field_ty, &group.ty);
                            for name in &group.names {
                                if record_fields
                                    .iter()
                                    .any(|f| f.name.eq_ignore_ascii_case(name))
                                {
                                    self.error(
                                        group.ty.span,
                                        format!("duplicate field '{}'", name),
                                    );
                                } else {
                                    record_fields.push(RecordField {
                                        name: name.clone(),
                                        ty: field_def.clone(),
                                    });
                                }
                            }
                        }
                    }
                }

                let def = TypeDef::Record {
                    fields: record_fields,
                };
                Ty::custom(name_hint.unwrap_or("record").to_string(), def)
            }
            TypeExprKind::BoundedString(len) => {
                let n = match self.eval_const(len) {
                    Some(ConstValue::Int(n)) if n > 0 && n <= 255 => n as u32,
                    _ => {
                        self.error(len.span, "string length must be a constant in 1..255");
                        255
                    }
                };
                let name = name_hint
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("string[{}]", n));
                Ty::custom(name, TypeDef::BoundedString(n))
            }
            TypeExprKind::Subrange(lo, hi) => {
                let lo_v = self.eval_const(lo);
                let hi_v = self.eval_const(hi);
                match (lo_v, hi_v) {
                    (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => Ty {
                        data: DataType::Integer,
                        pointee: None,
                        def: Some(TypeDef::Subrange {
                            base: DataType::Integer,
                            lo: a,
                            hi: b,
                        }),
                    },
                    (Some(ConstValue::Char(a)), Some(ConstValue::Char(b))) => Ty {
                        data: DataType::Char,
                        pointee: None,
                        def: Some(TypeDef::Subrange {
                            base: DataType::Char,
                            lo: a as i64,
                            hi: b as i64,
                        }),
                    },
                    _ => {
                        self.error(te.span, "subrange bounds must be ordinal constants of one type");
                        Ty::unknown()
                    }
                }
            }
            TypeExprKind::Enum(values) => {
                let Some(name) = name_hint else {
                    self.error(
                        te.span,
                        "anonymous enumerations are not supported; declare a named type",
                    );
                    return Ty::unknown();
                };
                Ty::custom(name.to_string(), TypeDef::Enum(values.clone()))
            }
            TypeExprKind::FileOf(inner) => {
                let elem_ty = self.lower_type_expr(inner, None);
                Ty {
                    data: DataType::File,
                    pointee: None,
                    def: Some(TypeDef::FileOf(Box::new(self.descriptor_of(&elem_ty, inner)))),
                }
            }
        }
    }

    /// The descriptor to embed for a sub-type: named references stay
    /// symbolic, anonymous composites embed their structure.
    fn descriptor_of(&self, ty: &Ty, te: &TypeExpr) -> TypeDef {
        match &te.kind {
            TypeExprKind::Named(name) => self.descriptor_for_name(name, te.span),
            _ => ty
                .def
                .clone()
                .unwrap_or_else(|| TypeDef::Builtin(ty.data.clone())),
        }
    }

    fn descriptor_for_name(&self, name: &str, _span: Span) -> TypeDef {
        // Any user type stays a named reference so pointees and nested
        // descriptors resolve at the use site; only builtin names lower
        // directly.
        if let Some(symbol) = self.table.lookup(name) {
            if symbol.kind == SymbolKind::Type {
                return TypeDef::Named(name.to_ascii_lowercase());
            }
        }
        TypeDef::Builtin(self.table.resolve_data_type(name).data)
    }

    fn lower_dimension(&mut self, dim: &ArrayDim, span: Span) -> Option<Dimension> {
        match dim {
            ArrayDim::Range(lo, hi) => {
                let lo_v = self.eval_const(lo);
                let hi_v = self.eval_const(hi);
                match (lo_v, hi_v) {
                    (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => {
                        if b < a {
                            self.error(span, "array upper bound is below the lower bound");
                            return None;
                        }
                        Some(Dimension::IntRange(a, b))
                    }
                    (Some(ConstValue::Char(a)), Some(ConstValue::Char(b))) => {
                        Some(Dimension::CharRange(a, b))
                    }
                    _ => {
                        self.error(span, "array bounds must be ordinal constants of one type");
                        None
                    }
                }
            }
            ArrayDim::Named(name) => {
                let ty = self.table.resolve_data_type(name);
                if ty.is_enum() {
                    Some(Dimension::EnumRange(name.to_ascii_lowercase()))
                } else if ty.data == DataType::Boolean {
                    Some(Dimension::IntRange(0, 1))
                } else if ty.data == DataType::Char {
                    Some(Dimension::CharRange('\u{0}', '\u{ff}'))
                } else {
                    self.error(span, format!("'{}' is not an ordinal index domain", name));
                    None
                }
            }
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn analyze_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let target_ty = self.type_assign_target(target);
                let value_ty = self.type_expr(value);
                if !self.compatible(&target_ty, &value_ty) {
                    self.error(
                        stmt.span,
                        format!("cannot assign {} to {}", value_ty.data, target_ty.data),
                    );
                }
            }
            StmtKind::Compound(stmts) => {
                for s in stmts {
                    self.analyze_stmt(s);
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond);
                self.analyze_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond);
                self.analyze_stmt(body);
            }
            StmtKind::Repeat { body, until } => {
                for s in body {
                    self.analyze_stmt(s);
                }
                self.check_condition(until);
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
                ..
            } => {
                let var_ty = self.type_expr(var);
                if !var_ty.is_unknown() && !var_ty.is_ordinal() {
                    self.error(
                        var.span,
                        format!("loop variable must be ordinal, not {}", var_ty.data),
                    );
                }
                let start_ty = self.type_expr(start);
                let end_ty = self.type_expr(end);
                if !self.compatible(&var_ty, &start_ty) {
                    self.error(start.span, "loop start is not compatible with the loop variable");
                }
                if !self.compatible(&var_ty, &end_ty) {
                    self.error(end.span, "loop limit is not compatible with the loop variable");
                }
                self.analyze_stmt(body);
            }
            StmtKind::Case {
                selector,
                arms,
                else_branch,
            } => {
                let selector_ty = self.type_expr(selector);
                if !selector_ty.is_unknown() && !selector_ty.is_ordinal() {
                    self.error(
                        selector.span,
                        format!("case selector must be ordinal, not {}", selector_ty.data),
                    );
                }
                for arm in arms {
                    for label in &arm.labels {
                        let label_ty = self.type_expr(label);
                        if !self.compatible(&selector_ty, &label_ty) {
                            self.error(
                                label.span,
                                "case label is not compatible with the selector",
                            );
                        }
                    }
                    self.analyze_stmt(&arm.body);
                }
                if let Some(stmts) = else_branch {
                    for s in stmts {
                        self.analyze_stmt(s);
                    }
                }
            }
            StmtKind::With { targets, body } => {
                let mut pushed = 0;
                for target in targets {
                    let ty = self.type_expr(target);
                    match resolved_record_def(&self.table, &ty) {
                        Some(def) => {
                            self.with_stack.push(WithFrame {
                                target: target.clone(),
                                def,
                            });
                            pushed += 1;
                        }
                        None if ty.is_unknown() => {}
                        None => {
                            self.error(
                                target.span,
                                format!("with target must be a record, not {}", ty.data),
                            );
                        }
                    }
                }
                self.analyze_stmt(body);
                for _ in 0..pushed {
                    self.with_stack.pop();
                }
            }
            StmtKind::Labeled { label, stmt: inner } => {
                let declared = self
                    .label_sets
                    .last()
                    .map(|set| set.contains(label))
                    .unwrap_or(false);
                if !declared {
                    self.error(stmt.span, format!("label '{}' is not declared", label));
                }
                self.analyze_stmt(inner);
            }
            StmtKind::Goto(label) => {
                let declared = self
                    .label_sets
                    .last()
                    .map(|set| set.contains(label))
                    .unwrap_or(false);
                if !declared {
                    self.error(stmt.span, format!("goto to undeclared label '{}'", label));
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
            StmtKind::Call(expr) => {
                self.type_call_statement(expr);
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr) {
        let ty = self.type_expr(cond);
        if !ty.is_unknown() && ty.data != DataType::Boolean {
            self.error(
                cond.span,
                format!("condition must be boolean, not {}", ty.data),
            );
        }
    }

    /// A call in statement position: an explicit call, or a bare routine
    /// identifier which is uniformly treated as a call.
    fn type_call_statement(&mut self, expr: &Expr) -> Ty {
        if let ExprKind::Ident(name) = &expr.kind {
            if crate::builtins::lookup(name).is_none() {
                match self.table.lookup(name) {
                    Some(symbol) if symbol.is_routine() => {}
                    Some(_) => {
                        self.error(expr.span, format!("'{}' is not a procedure", name));
                        let ty = Ty::unknown();
                        self.analysis.expr_types.insert(expr.id, ty.clone());
                        return ty;
                    }
                    None => {}
                }
            }
        }
        self.type_expr(expr)
    }

    /// Types an assignment target. Assigning to the enclosing function's
    /// own name targets its result.
    fn type_assign_target(&mut self, target: &Expr) -> Ty {
        if let ExprKind::Ident(name) = &target.kind {
            let lower = name.to_ascii_lowercase();
            if let Some(ctx) = self.routine_stack.iter().rev().find(|c| c.name_lower == lower) {
                match &ctx.ret {
                    Some(ret) => {
                        let ty = ret.clone();
                        self.analysis.expr_types.insert(target.id, ty.clone());
                        return ty;
                    }
                    None => {
                        self.error(target.span, "cannot assign to a procedure name");
                        let ty = Ty::unknown();
                        self.analysis.expr_types.insert(target.id, ty.clone());
                        return ty;
                    }
                }
            }
            // Assigning to a function name outside of it is an error.
            if let Some(symbol) = self.table.lookup(name) {
                if symbol.kind == SymbolKind::Function {
                    self.error(
                        target.span,
                        format!("cannot assign to function '{}' outside its body", name),
                    );
                    let ty = Ty::unknown();
                    self.analysis.expr_types.insert(target.id, ty.clone());
                    return ty;
                }
            }
        }
        self.type_expr(target)
    }

    pub(crate) fn error(&self, span: Span, message: impl Into<String>) {
        self.handler.error(Stage::Semantic, message, span);
    }
}

/// Resolves a value type to its record descriptor, following named
/// references through the table.
pub(crate) fn resolved_record_def(table: &SymbolTable, ty: &Ty) -> Option<TypeDef> {
    let def = ty.def.as_ref()?;
    resolve_def(table, def)
}

fn resolve_def(table: &SymbolTable, def: &TypeDef) -> Option<TypeDef> {
    match def {
        TypeDef::Record { .. } => Some(def.clone()),
        TypeDef::Named(name) => {
            let inner = table.lookup_type_def(name)?;
            resolve_def(table, &inner.clone())
        }
        _ => None,
    }
}

/// Default unit search directories for an input path.
pub fn default_search_dirs(input: &Path) -> Vec<std::path::PathBuf> {
    UnitLoader::default_search_dirs(input)
}

/// Evaluates a constant expression: literals, declared constants, enum
/// values, unary sign and integer arithmetic. Shared by the analyser
/// (array bounds, bounded-string lengths) and the emitter (declaration
/// extents, case-range expansion).
pub fn eval_const_expr(
    expr: &Expr,
    const_values: &FxHashMap<String, ConstValue>,
    enum_ordinals: &FxHashMap<String, i64>,
) -> Option<ConstValue> {
    use tpc_par::{BinOp, UnOp};

    match &expr.kind {
        ExprKind::IntLiteral(n) => Some(ConstValue::Int(*n)),
        ExprKind::RealLiteral(f) => Some(ConstValue::Real(*f)),
        ExprKind::CharLiteral(c) => Some(ConstValue::Char(*c)),
        ExprKind::StringLiteral(s) => Some(ConstValue::Str(s.clone())),
        ExprKind::BoolLiteral(b) => Some(ConstValue::Bool(*b)),
        ExprKind::Ident(name) => {
            let key = name.to_ascii_lowercase();
            if let Some(value) = const_values.get(&key) {
                return Some(value.clone());
            }
            enum_ordinals.get(&key).map(|ordinal| ConstValue::Int(*ordinal))
        }
        ExprKind::Unary { op, operand } => {
            let value = eval_const_expr(operand, const_values, enum_ordinals)?;
            match (op, value) {
                (UnOp::Neg, ConstValue::Int(n)) => Some(ConstValue::Int(-n)),
                (UnOp::Neg, ConstValue::Real(f)) => Some(ConstValue::Real(-f)),
                (UnOp::Plus, v) => Some(v),
                _ => None,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let (ConstValue::Int(a), ConstValue::Int(b)) = (
                eval_const_expr(lhs, const_values, enum_ordinals)?,
                eval_const_expr(rhs, const_values, enum_ordinals)?,
            ) else {
                return None;
            };
            match op {
                BinOp::Add => Some(ConstValue::Int(a + b)),
                BinOp::Sub => Some(ConstValue::Int(a - b)),
                BinOp::Mul => Some(ConstValue::Int(a * b)),
                BinOp::IntDiv if b != 0 => Some(ConstValue::Int(a / b)),
                BinOp::Mod if b != 0 => Some(ConstValue::Int(a % b)),
                _ => None,
            }
        }
        _ => None,
    }
}
