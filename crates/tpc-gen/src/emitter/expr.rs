//! Expression lowering.

use tpc_par::{BinOp, Expr, ExprKind, UnOp};
use tpc_sem::{builtins, ConstValue, DataType, Dimension, Ty, TypeDef};

use crate::error::{CodeGenError, Result};

use super::{cpp_ident, CppEmitter};

impl<'a> CppEmitter<'a> {
    /// Renders an expression as C++ text.
    pub(crate) fn expr(&self, e: &Expr) -> Result<String> {
        Ok(match &e.kind {
            ExprKind::IntLiteral(n) => n.to_string(),
            ExprKind::RealLiteral(f) => fmt_real(*f),
            ExprKind::StringLiteral(s) => format!("std::string(\"{}\")", escape_string(s)),
            ExprKind::CharLiteral(c) => char_literal(*c),
            ExprKind::BoolLiteral(b) => b.to_string(),
            ExprKind::Nil => "nullptr".to_string(),

            ExprKind::Ident(name) => self.ident(e, name)?,

            ExprKind::Binary { op, lhs, rhs } => self.binary(e, *op, lhs, rhs)?,

            ExprKind::Unary { op, operand } => {
                let inner = self.expr(operand)?;
                match op {
                    UnOp::Neg => format!("(-{})", inner),
                    UnOp::Plus => format!("(+{})", inner),
                    UnOp::Not => format!("(!{})", inner),
                }
            }

            ExprKind::AddressOf(operand) => format!("(&{})", self.expr(operand)?),
            ExprKind::Deref(operand) => format!("(*{})", self.expr(operand)?),

            ExprKind::Call { name, args } => match builtins::lookup(name) {
                Some(builtin) => self.builtin_expr(builtin, args)?,
                None => {
                    let rendered: Vec<String> =
                        args.iter().map(|a| self.expr(a)).collect::<Result<_>>()?;
                    format!("{}({})", cpp_ident(name), rendered.join(", "))
                }
            },

            ExprKind::Field { base, field } => {
                format!("{}.{}", self.expr(base)?, cpp_ident(field))
            }

            ExprKind::Index { base, indices } => self.index(base, indices)?,

            ExprKind::SetLiteral(elements) => self.set_literal(e, elements)?,

            // Ranges only appear inside set constructors and case
            // labels, which expand them; a stray one degrades to its
            // lower bound.
            ExprKind::Range { lo, .. } => self.expr(lo)?,

            ExprKind::Formatted { value, .. } => self.expr(value)?,
        })
    }

    /// A bare identifier: with-bound field, implicit routine call, or a
    /// plain name.
    fn ident(&self, e: &Expr, name: &str) -> Result<String> {
        if let Some(target) = self.analysis.with_bindings.get(&e.id) {
            return Ok(format!("{}.{}", self.expr(target)?, cpp_ident(name)));
        }
        if self.analysis.implicit_calls.contains(&e.id) {
            if let Some(builtin) = builtins::lookup(name) {
                return self.builtin_expr(builtin, &[]);
            }
            return Ok(format!("{}()", cpp_ident(name)));
        }
        Ok(cpp_ident(name))
    }

    fn binary(&self, e: &Expr, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<String> {
        let lt = self.ty_of(lhs).cloned();
        let rt = self.ty_of(rhs).cloned();
        let result = self.ty_of(e).cloned();

        // `x in s` binds the set once and performs a membership test.
        if op == BinOp::In {
            return Ok(format!(
                "([&](const auto& pascal_set) {{ return pascal_set.count({}) != 0; }})({})",
                self.expr(lhs)?,
                self.expr(rhs)?
            ));
        }

        let both_sets = is_set(&lt) && is_set(&rt);
        if both_sets {
            let helper = match op {
                BinOp::Add => "pascal_set_union",
                BinOp::Sub => "pascal_set_diff",
                BinOp::Mul => "pascal_set_intersect",
                BinOp::Eq => {
                    return Ok(format!("({} == {})", self.expr(lhs)?, self.expr(rhs)?));
                }
                BinOp::Ne => {
                    return Ok(format!("({} != {})", self.expr(lhs)?, self.expr(rhs)?));
                }
                _ => {
                    return Err(CodeGenError::Internal(format!(
                        "unsupported set operator {:?}",
                        op
                    )))
                }
            };
            return Ok(format!(
                "{}({}, {})",
                helper,
                self.expr(lhs)?,
                self.expr(rhs)?
            ));
        }

        // String concatenation wraps both sides so at least one operand
        // is std::string regardless of char/bounded operands.
        if op == BinOp::Add && result.as_ref().map(is_string_like_ty).unwrap_or(false) {
            return Ok(format!(
                "(pascal_str({}) + pascal_str({}))",
                self.expr(lhs)?,
                self.expr(rhs)?
            ));
        }

        // Pointer difference is an integer.
        if op == BinOp::Sub
            && matches!(&lt, Some(t) if t.data == DataType::Pointer)
            && matches!(&rt, Some(t) if t.data == DataType::Pointer)
        {
            return Ok(format!(
                "(int)({} - {})",
                self.expr(lhs)?,
                self.expr(rhs)?
            ));
        }

        // Comparisons involving strings normalise both sides.
        if op.is_relational() {
            let stringish = |t: &Option<Ty>| t.as_ref().map(is_string_like_ty).unwrap_or(false);
            let charish = |t: &Option<Ty>| {
                matches!(t, Some(t) if t.data == DataType::Char)
            };
            if (stringish(&lt) && (stringish(&rt) || charish(&rt)))
                || (stringish(&rt) && charish(&lt))
            {
                return Ok(format!(
                    "(pascal_str({}) {} pascal_str({}))",
                    self.expr(lhs)?,
                    cpp_operator(op),
                    self.expr(rhs)?
                ));
            }
        }

        Ok(format!(
            "({} {} {})",
            self.expr(lhs)?,
            cpp_operator(op),
            self.expr(rhs)?
        ))
    }

    /// Array/string indexing. Strings shift from Pascal's 1-based view;
    /// arrays flatten N-D indices row-major against the recorded
    /// dimensions.
    fn index(&self, base: &Expr, indices: &[Expr]) -> Result<String> {
        let base_ty = self
            .ty_of(base)
            .cloned()
            .ok_or_else(|| CodeGenError::Internal("untyped index base".to_string()))?;

        if base_ty.is_string_like() {
            return Ok(format!(
                "{}[({}) - 1]",
                self.expr(base)?,
                self.expr(&indices[0])?
            ));
        }

        let Some(TypeDef::Array { dims, .. }) = self.resolve_def(&base_ty) else {
            return Err(CodeGenError::Internal(format!(
                "indexing a non-array value of type {}",
                base_ty.data
            )));
        };

        let extents: Vec<i64> = dims.iter().map(|d| self.dim_extent(d)).collect();
        let mut terms = Vec::new();
        for (k, index) in indices.iter().enumerate() {
            let rendered = self.expr(index)?;
            let normalised = match dims.get(k) {
                Some(Dimension::IntRange(lo, _)) => {
                    if *lo == 0 {
                        format!("({})", rendered)
                    } else {
                        format!("(({}) - ({}))", rendered, lo)
                    }
                }
                Some(Dimension::CharRange(lo, _)) => {
                    format!("(({}) - {})", rendered, char_literal(*lo))
                }
                Some(Dimension::EnumRange(_)) => {
                    format!("static_cast<int>({})", rendered)
                }
                None => format!("({})", rendered),
            };
            let stride: i64 = extents.iter().skip(k + 1).product();
            if stride == 1 {
                terms.push(normalised);
            } else {
                terms.push(format!("{} * {}", normalised, stride));
            }
        }

        Ok(format!("{}[{}]", self.expr(base)?, terms.join(" + ")))
    }

    /// Set constructors expand contained ranges into their members.
    fn set_literal(&self, e: &Expr, elements: &[Expr]) -> Result<String> {
        // `[]` list-initialises whatever set it lands in.
        if elements.is_empty() {
            return Ok("{}".to_string());
        }

        let (elem_cpp, enum_elem) = match self.ty_of(e).and_then(|t| self.resolve_def(t)) {
            Some(TypeDef::Set(elem)) => {
                let resolved = match elem.as_ref() {
                    TypeDef::Named(n) => self.resolve_named_def(n),
                    other => Some(other.clone()),
                };
                let is_enum = matches!(resolved, Some(TypeDef::Enum(_)));
                (self.cpp_type_of_def(&elem), is_enum)
            }
            _ => ("int".to_string(), false),
        };

        let mut members = Vec::new();
        for element in elements {
            match &element.kind {
                ExprKind::Range { lo, hi } => {
                    let lo_v = self.eval(lo);
                    let hi_v = self.eval(hi);
                    match (lo_v, hi_v) {
                        (Some(ConstValue::Char(a)), Some(ConstValue::Char(b))) => {
                            let mut c = a;
                            while c <= b {
                                members.push(char_literal(c));
                                if c as u32 + 1 > b as u32 {
                                    break;
                                }
                                c = char::from_u32(c as u32 + 1).unwrap_or(b);
                            }
                        }
                        (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => {
                            for v in a..=b {
                                if enum_elem {
                                    members.push(format!("static_cast<{}>({})", elem_cpp, v));
                                } else {
                                    members.push(v.to_string());
                                }
                            }
                        }
                        _ => {
                            return Err(CodeGenError::Internal(
                                "set range bounds are not constant".to_string(),
                            ))
                        }
                    }
                }
                _ => members.push(self.expr(element)?),
            }
        }

        Ok(format!("std::set<{}>{{{}}}", elem_cpp, members.join(", ")))
    }
}

/// C++ spelling of the straightforward operators.
fn cpp_operator(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::IntDiv => "/",
        BinOp::Mod => "%",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::Xor => "!=",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::In => "/*in*/",
    }
}

fn is_set(ty: &Option<Ty>) -> bool {
    matches!(ty, Some(t) if t.is_set())
}

fn is_string_like_ty(ty: &Ty) -> bool {
    ty.is_string_like()
}

/// Formats a real literal so C++ reads it as a double.
pub(crate) fn fmt_real(f: f64) -> String {
    let s = format!("{}", f);
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// A C++ char literal with escaping.
pub(crate) fn char_literal(c: char) -> String {
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\0' => "'\\0'".to_string(),
        c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
            format!("'\\x{:02x}'", c as u32)
        }
        c => format!("'{}'", c),
    }
}

/// Escapes a string literal body.
pub(crate) fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
