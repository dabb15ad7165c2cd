//! Expression typing.
//!
//! Every expression node gets a [`Ty`] annotation recorded in the
//! analysis side table. The binary-operator result rules and the
//! assignment/argument compatibility rules live here, as does constant
//! evaluation for array bounds and case-range expansion.

use tpc_par::{BinOp, Expr, ExprKind, UnOp};

use crate::analysis::{resolved_record_def, ConstValue, SemanticAnalyzer};
use crate::builtins::{self, Builtin};
use crate::scope::SymbolKind;
use crate::types::{DataType, Ty, TypeDef};

impl<'a> SemanticAnalyzer<'a> {
    /// Types an expression, records the annotation, and returns it.
    pub(crate) fn type_expr(&mut self, expr: &Expr) -> Ty {
        let ty = self.infer(expr);
        self.analysis.expr_types.insert(expr.id, ty.clone());
        ty
    }

    fn infer(&mut self, expr: &Expr) -> Ty {
        match &expr.kind {
            ExprKind::IntLiteral(_) => Ty::simple(DataType::Integer),
            ExprKind::RealLiteral(_) => Ty::simple(DataType::Real),
            ExprKind::StringLiteral(_) => Ty::simple(DataType::String),
            ExprKind::CharLiteral(_) => Ty::simple(DataType::Char),
            ExprKind::BoolLiteral(_) => Ty::simple(DataType::Boolean),
            ExprKind::Nil => Ty {
                data: DataType::Pointer,
                pointee: None,
                def: None,
            },

            ExprKind::Ident(name) => self.infer_ident(expr, name),

            ExprKind::Binary { op, lhs, rhs } => {
                let lt = self.type_expr(lhs);
                let rt = self.type_expr(rhs);
                self.type_binary(expr, *op, &lt, &rt)
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.type_expr(operand);
                if ty.is_unknown() {
                    return Ty::unknown();
                }
                match op {
                    UnOp::Neg | UnOp::Plus => {
                        if ty.data.is_numeric() {
                            ty
                        } else {
                            self.error(
                                expr.span,
                                format!("unary sign needs a numeric operand, not {}", ty.data),
                            );
                            Ty::unknown()
                        }
                    }
                    UnOp::Not => {
                        if ty.data == DataType::Boolean {
                            ty
                        } else {
                            self.error(
                                expr.span,
                                format!("'not' needs a boolean operand, not {}", ty.data),
                            );
                            Ty::unknown()
                        }
                    }
                }
            }

            ExprKind::AddressOf(operand) => {
                let inner = self.type_expr(operand);
                Ty {
                    data: DataType::Pointer,
                    pointee: Some(inner.data.name()),
                    def: None,
                }
            }

            ExprKind::Deref(operand) => {
                let inner = self.type_expr(operand);
                if inner.is_unknown() {
                    return Ty::unknown();
                }
                if inner.data != DataType::Pointer {
                    self.error(
                        expr.span,
                        format!("cannot dereference {}", inner.data),
                    );
                    return Ty::unknown();
                }
                match &inner.pointee {
                    Some(name) => {
                        let ty = self.table.resolve_data_type(name);
                        if ty.is_unknown() {
                            self.error(expr.span, format!("unknown pointee type '{}'", name));
                        }
                        ty
                    }
                    None => {
                        self.error(expr.span, "cannot dereference an untyped pointer");
                        Ty::unknown()
                    }
                }
            }

            ExprKind::Call { name, args } => self.type_call(expr, name, args),

            ExprKind::Field { base, field } => {
                let base_ty = self.type_expr(base);
                if base_ty.is_unknown() {
                    return Ty::unknown();
                }
                match resolved_record_def(&self.table, &base_ty) {
                    Some(def) => match def.field(field) {
                        Some(record_field) => self.type_of_field(&record_field.ty),
                        None => {
                            self.error(
                                expr.span,
                                format!("no field '{}' in {}", field, base_ty.data),
                            );
                            Ty::unknown()
                        }
                    },
                    None => {
                        self.error(
                            expr.span,
                            format!("{} has no fields", base_ty.data),
                        );
                        Ty::unknown()
                    }
                }
            }

            ExprKind::Index { base, indices } => {
                let base_ty = self.type_expr(base);
                let index_tys: Vec<Ty> = indices.iter().map(|i| self.type_expr(i)).collect();
                for (index, ty) in indices.iter().zip(&index_tys) {
                    if !ty.is_unknown() && !ty.is_ordinal() {
                        self.error(index.span, format!("index must be ordinal, not {}", ty.data));
                    }
                }
                if base_ty.is_unknown() {
                    return Ty::unknown();
                }

                if base_ty.is_string_like() {
                    if indices.len() != 1 {
                        self.error(expr.span, "strings take exactly one index");
                    }
                    return Ty::simple(DataType::Char);
                }

                match self.resolved_array_def(&base_ty) {
                    Some(TypeDef::Array { dims, elem }) => {
                        if indices.len() != dims.len() {
                            self.error(
                                expr.span,
                                format!(
                                    "expected {} indices, found {}",
                                    dims.len(),
                                    indices.len()
                                ),
                            );
                        }
                        self.type_of_field(&elem)
                    }
                    _ => {
                        self.error(
                            expr.span,
                            format!("{} cannot be indexed", base_ty.data),
                        );
                        Ty::unknown()
                    }
                }
            }

            ExprKind::SetLiteral(elements) => {
                let mut elem_ty: Option<Ty> = None;
                for element in elements {
                    let ty = self.type_expr(element);
                    if ty.is_unknown() {
                        continue;
                    }
                    if let Some(first) = &elem_ty {
                        if !self.compatible(first, &ty) {
                            self.error(element.span, "set elements must share one ordinal type");
                        }
                    } else {
                        elem_ty = Some(ty);
                    }
                }

                // Element type comes from the first element; an empty
                // constructor stays compatible with every set type.
                match elem_ty {
                    Some(elem) => {
                        let def = TypeDef::Set(Box::new(
                            elem.def
                                .clone()
                                .unwrap_or(TypeDef::Builtin(elem.data.clone())),
                        ));
                        Ty::custom(format!("set of {}", elem.data.name()), def)
                    }
                    None => Ty::custom(
                        "set of unknown".to_string(),
                        TypeDef::Set(Box::new(TypeDef::Builtin(DataType::Unknown))),
                    ),
                }
            }

            ExprKind::Range { lo, hi } => {
                let lt = self.type_expr(lo);
                let rt = self.type_expr(hi);
                if lt.is_unknown() || rt.is_unknown() {
                    return Ty::unknown();
                }
                if !lt.is_ordinal() {
                    self.error(lo.span, format!("range bounds must be ordinal, not {}", lt.data));
                    return Ty::unknown();
                }
                if !self.compatible(&lt, &rt) {
                    self.error(expr.span, "range endpoints must have one ordinal type");
                    return Ty::unknown();
                }
                // Preserve the element type (and an enum's type name) so
                // set compatibility keeps working.
                lt
            }

            ExprKind::Formatted {
                value,
                width,
                precision,
            } => {
                let value_ty = self.type_expr(value);
                let width_ty = self.type_expr(width);
                if !width_ty.is_unknown() && !width_ty.data.is_integral() {
                    self.error(width.span, "field width must be an integer");
                }
                if let Some(precision) = precision {
                    let p_ty = self.type_expr(precision);
                    if !p_ty.is_unknown() && !p_ty.data.is_integral() {
                        self.error(precision.span, "precision must be an integer");
                    }
                }
                value_ty
            }
        }
    }

    /// Identifier resolution: symbol table first, then the with-scope
    /// stack for unknown names.
    fn infer_ident(&mut self, expr: &Expr, name: &str) -> Ty {
        if let Some(symbol) = self.table.lookup(name) {
            match symbol.kind {
                SymbolKind::Constant | SymbolKind::Variable | SymbolKind::Parameter => {
                    return symbol.ty.clone();
                }
                SymbolKind::Function => {
                    // A function mentioned without a call has its return
                    // type; a parameterless one is an implicit call.
                    let ret = symbol.ret.clone().unwrap_or_else(Ty::unknown);
                    if symbol.params.is_empty() {
                        self.analysis.implicit_calls.insert(expr.id);
                    }
                    return ret;
                }
                SymbolKind::Procedure => {
                    return Ty::simple(DataType::Void);
                }
                SymbolKind::Type => {
                    self.error(expr.span, format!("type '{}' used as a value", name));
                    return Ty::unknown();
                }
            }
        }

        // Parameterless builtins can appear as bare identifiers.
        if let Some(builtin) = builtins::lookup(name) {
            let result = builtin.result_type(&[]);
            if result != DataType::Void {
                self.analysis.implicit_calls.insert(expr.id);
            }
            return Ty::simple(result);
        }

        // Unknown name: search the enclosing with-targets, innermost
        // first. A hit binds this identifier to that target.
        for index in (0..self.with_stack.len()).rev() {
            let field = self.with_stack[index].def.field(name).cloned();
            if let Some(field) = field {
                let target = self.with_stack[index].target.clone();
                self.analysis.with_bindings.insert(expr.id, target);
                return self.type_of_field(&field.ty);
            }
        }

        self.error(expr.span, format!("undefined identifier '{}'", name));
        Ty::unknown()
    }

    /// The type of values described by a field/element descriptor.
    pub(crate) fn type_of_field(&self, def: &TypeDef) -> Ty {
        match def {
            TypeDef::Builtin(data) => Ty::simple(data.clone()),
            TypeDef::Named(name) => self.table.resolve_data_type(name),
            TypeDef::Pointer(inner) => Ty::pointer_to(descriptor_name(inner)),
            TypeDef::Subrange { base, .. } => Ty {
                data: base.clone(),
                pointee: None,
                def: Some(def.clone()),
            },
            TypeDef::FileOf(_) => Ty {
                data: DataType::File,
                pointee: None,
                def: Some(def.clone()),
            },
            TypeDef::Set(elem) => Ty::custom(
                format!("set of {}", descriptor_name(elem)),
                def.clone(),
            ),
            TypeDef::BoundedString(n) => Ty::custom(format!("string[{}]", n), def.clone()),
            TypeDef::Array { .. } => Ty::custom("array", def.clone()),
            TypeDef::Record { .. } => Ty::custom("record", def.clone()),
            TypeDef::Enum(_) => Ty::custom("enum", def.clone()),
        }
    }

    /// Follows named references down to an array descriptor.
    fn resolved_array_def(&self, ty: &Ty) -> Option<TypeDef> {
        let mut def = ty.def.clone()?;
        loop {
            match def {
                TypeDef::Array { .. } => return Some(def),
                TypeDef::Named(name) => {
                    def = self.table.lookup_type_def(&name)?.clone();
                }
                _ => return None,
            }
        }
    }

    // =========================================================================
    // Binary operators
    // =========================================================================

    fn type_binary(&mut self, expr: &Expr, op: BinOp, lt: &Ty, rt: &Ty) -> Ty {
        if lt.is_unknown() || rt.is_unknown() {
            return Ty::unknown();
        }

        match op {
            BinOp::Add => {
                if lt.data.is_numeric() && rt.data.is_numeric() {
                    return numeric_result(lt, rt);
                }
                if is_string_operand(lt) && is_string_operand(rt) {
                    // A bounded-string operand keeps its bounded type.
                    if lt.is_bounded_string() {
                        return lt.clone();
                    }
                    if rt.is_bounded_string() {
                        return rt.clone();
                    }
                    return Ty::simple(DataType::String);
                }
                if lt.is_set() && rt.is_set() {
                    return set_result(lt, rt);
                }
                if let Some(ptr) = pointer_int_pair(lt, rt) {
                    return ptr;
                }
                self.binary_error(expr, "+", lt, rt)
            }
            BinOp::Sub => {
                if lt.data.is_numeric() && rt.data.is_numeric() {
                    return numeric_result(lt, rt);
                }
                if lt.is_set() && rt.is_set() {
                    return set_result(lt, rt);
                }
                if lt.data == DataType::Pointer && rt.data == DataType::Pointer {
                    return Ty::simple(DataType::Integer);
                }
                if let Some(ptr) = pointer_int_pair(lt, rt) {
                    return ptr;
                }
                self.binary_error(expr, "-", lt, rt)
            }
            BinOp::Mul => {
                if lt.data.is_numeric() && rt.data.is_numeric() {
                    return numeric_result(lt, rt);
                }
                if lt.is_set() && rt.is_set() {
                    return set_result(lt, rt);
                }
                self.binary_error(expr, "*", lt, rt)
            }
            BinOp::Div => {
                if lt.data.is_numeric() && rt.data.is_numeric() {
                    return numeric_result(lt, rt);
                }
                self.binary_error(expr, "/", lt, rt)
            }
            BinOp::IntDiv | BinOp::Mod => {
                if lt.data.is_integral() && rt.data.is_integral() {
                    return Ty::simple(DataType::Integer);
                }
                self.binary_error(expr, if op == BinOp::Mod { "mod" } else { "div" }, lt, rt)
            }
            BinOp::Shl | BinOp::Shr => {
                if lt.data.is_integral() && rt.data.is_integral() {
                    return Ty::simple(DataType::Integer);
                }
                self.binary_error(expr, if op == BinOp::Shl { "shl" } else { "shr" }, lt, rt)
            }
            BinOp::And | BinOp::Or | BinOp::Xor => {
                if lt.data == DataType::Boolean && rt.data == DataType::Boolean {
                    return Ty::simple(DataType::Boolean);
                }
                self.binary_error(expr, "a logical operator", lt, rt)
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if self.compatible(lt, rt) || self.compatible(rt, lt) {
                    return Ty::simple(DataType::Boolean);
                }
                self.binary_error(expr, "a comparison", lt, rt)
            }
            BinOp::In => {
                if lt.is_ordinal() && rt.is_set() {
                    return Ty::simple(DataType::Boolean);
                }
                self.binary_error(expr, "'in'", lt, rt)
            }
        }
    }

    fn binary_error(&mut self, expr: &Expr, what: &str, lt: &Ty, rt: &Ty) -> Ty {
        self.error(
            expr.span,
            format!("invalid operands to {}: {} and {}", what, lt.data, rt.data),
        );
        Ty::unknown()
    }

    // =========================================================================
    // Compatibility
    // =========================================================================

    /// Assignment/argument compatibility of `value` into `target`.
    pub(crate) fn compatible(&self, target: &Ty, value: &Ty) -> bool {
        if target.is_unknown() || value.is_unknown() {
            return true;
        }

        match (&target.data, &value.data) {
            (a, b) if a == b => true,
            (DataType::Custom(a), DataType::Custom(b)) if a.eq_ignore_ascii_case(b) => true,

            // Numeric widenings.
            (DataType::Integer, DataType::Real) | (DataType::Real, DataType::Integer) => true,
            (DataType::Integer, DataType::Byte) | (DataType::Byte, DataType::Integer) => true,
            (DataType::Real, DataType::Byte) => true,

            // Char widens into the string family.
            (DataType::String, DataType::Char) => true,

            // Bounded strings interchange with strings and chars.
            (DataType::Custom(_), DataType::String | DataType::Char)
                if target.is_bounded_string() =>
            {
                true
            }
            (DataType::String, DataType::Custom(_)) if value.is_bounded_string() => true,
            (DataType::Custom(_), DataType::Custom(_))
                if target.is_bounded_string() && value.is_bounded_string() =>
            {
                true
            }

            // An anonymous set constructor fits any declared set type.
            (DataType::Custom(_), DataType::Custom(_)) if target.is_set() && value.is_set() => {
                is_anonymous_set(target) || is_anonymous_set(value)
            }

            // Pointers: nil fits anything; typed pointers must agree.
            (DataType::Pointer, DataType::Pointer) => {
                match (&target.pointee, &value.pointee) {
                    (_, None) | (None, _) => true,
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                }
            }

            _ => false,
        }
    }

    // =========================================================================
    // Calls and overloads
    // =========================================================================

    fn type_call(&mut self, expr: &Expr, name: &str, args: &[Expr]) -> Ty {
        // Built-ins first: variadic ones bypass arity and type checks.
        if let Some(builtin) = builtins::lookup(name) {
            let arg_tys: Vec<Ty> = args.iter().map(|a| self.type_expr(a)).collect();
            self.check_builtin_args(expr, builtin, args, &arg_tys);
            let arg_data: Vec<DataType> = arg_tys.iter().map(|t| t.data.clone()).collect();
            return Ty::simple(builtin.result_type(&arg_data));
        }

        let arg_tys: Vec<Ty> = args.iter().map(|a| self.type_expr(a)).collect();
        if arg_tys.iter().any(|t| t.is_unknown()) {
            return Ty::unknown();
        }
        let arg_data: Vec<DataType> = arg_tys.iter().map(|t| t.data.clone()).collect();

        // Exact signature match first.
        if let Some(symbol) = self.table.lookup_function(name, &arg_data) {
            return symbol
                .ret
                .clone()
                .unwrap_or_else(|| Ty::simple(DataType::Void));
        }

        // Then the unique overload whose parameters accept the
        // arguments under the compatibility rules.
        let overloads = self.table.lookup_all_overloads(name);
        if overloads.is_empty() {
            self.error(expr.span, format!("undefined procedure or function '{}'", name));
            return Ty::unknown();
        }

        let matching: Vec<&&crate::scope::Symbol> = overloads
            .iter()
            .filter(|symbol| {
                symbol.is_routine()
                    && symbol.params.len() == arg_tys.len()
                    && symbol
                        .params
                        .iter()
                        .zip(&arg_tys)
                        .all(|(param, arg)| self.compatible(&param.ty, arg))
            })
            .collect();

        match matching.len() {
            1 => matching[0]
                .ret
                .clone()
                .unwrap_or_else(|| Ty::simple(DataType::Void)),
            0 => {
                self.error(
                    expr.span,
                    format!("no overload of '{}' matches these arguments", name),
                );
                Ty::unknown()
            }
            _ => {
                self.error(expr.span, format!("ambiguous call to '{}'", name));
                Ty::unknown()
            }
        }
    }

    /// Spot checks for the non-variadic builtins that constrain their
    /// arguments.
    fn check_builtin_args(&mut self, expr: &Expr, builtin: Builtin, args: &[Expr], arg_tys: &[Ty]) {
        match builtin {
            Builtin::New | Builtin::Dispose => {
                match arg_tys.first() {
                    Some(ty) if ty.data == DataType::Pointer || ty.is_unknown() => {}
                    Some(ty) => {
                        self.error(
                            expr.span,
                            format!("{:?} needs a pointer variable, not {}", builtin, ty.data)
                                .to_lowercase(),
                        );
                    }
                    None => self.error(expr.span, "expected a pointer argument"),
                }
            }
            Builtin::Inc | Builtin::Dec => {
                match arg_tys.first() {
                    Some(ty)
                        if ty.is_ordinal()
                            || ty.data == DataType::Pointer
                            || ty.is_unknown() => {}
                    Some(ty) => {
                        self.error(
                            args[0].span,
                            format!("cannot step a value of type {}", ty.data),
                        );
                    }
                    None => self.error(expr.span, "expected an argument"),
                }
                if let Some(step) = arg_tys.get(1) {
                    if !step.is_unknown() && !step.data.is_integral() {
                        self.error(args[1].span, "step must be an integer");
                    }
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Constant evaluation
    // =========================================================================

    /// Evaluates a constant expression against the recorded constants
    /// and enum ordinals.
    pub(crate) fn eval_const(&self, expr: &Expr) -> Option<ConstValue> {
        crate::analysis::eval_const_expr(
            expr,
            &self.analysis.const_values,
            &self.analysis.enum_ordinals,
        )
    }
}

/// Numeric result rule: Real if either side is Real, else Integer.
fn numeric_result(lt: &Ty, rt: &Ty) -> Ty {
    if lt.data == DataType::Real || rt.data == DataType::Real {
        Ty::simple(DataType::Real)
    } else {
        Ty::simple(DataType::Integer)
    }
}

/// String-family operand: string, char or bounded string.
fn is_string_operand(ty: &Ty) -> bool {
    ty.data == DataType::Char || ty.is_string_like()
}

/// Result of a set operation: prefer the declared side over an
/// anonymous constructor.
fn set_result(lt: &Ty, rt: &Ty) -> Ty {
    if is_anonymous_set(lt) {
        rt.clone()
    } else {
        lt.clone()
    }
}

fn is_anonymous_set(ty: &Ty) -> bool {
    matches!(&ty.data, DataType::Custom(name) if name.starts_with("set of"))
}

/// `pointer ± integer` (either order for `+`) stays a pointer.
fn pointer_int_pair(lt: &Ty, rt: &Ty) -> Option<Ty> {
    if lt.data == DataType::Pointer && rt.data.is_integral() {
        return Some(lt.clone());
    }
    if rt.data == DataType::Pointer && lt.data.is_integral() {
        return Some(rt.clone());
    }
    None
}

/// Display name of a descriptor, for synthesised set/pointer names.
fn descriptor_name(def: &TypeDef) -> String {
    match def {
        TypeDef::Builtin(data) => data.name(),
        TypeDef::Named(name) => name.clone(),
        _ => "?".to_string(),
    }
}
