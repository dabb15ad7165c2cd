//! Statement lowering.

use tpc_par::{Expr, ExprKind, Stmt, StmtKind};
use tpc_sem::{builtins, ConstValue, DataType};

use crate::error::{CodeGenError, Result};

use super::expr::char_literal;
use super::{cpp_ident, CppEmitter};

impl<'a> CppEmitter<'a> {
    /// Emits one statement.
    pub(crate) fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                // Assignments to the enclosing function's name target
                // its result local.
                let target_s = match &target.kind {
                    ExprKind::Ident(name) => match self.current_result_var(name) {
                        Some(var) => var.to_string(),
                        None => self.expr(target)?,
                    },
                    _ => self.expr(target)?,
                };
                let value_s = self.expr(value)?;
                self.line(format!("{} = {};", target_s, value_s));
            }

            StmtKind::Compound(stmts) => {
                self.line("{");
                self.indent += 1;
                for s in stmts {
                    self.stmt(s)?;
                }
                self.indent -= 1;
                self.line("}");
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_s = self.expr(cond)?;
                self.line(format!("if ({}) {{", cond_s));
                self.indent += 1;
                self.stmt_in_block(then_branch)?;
                self.indent -= 1;
                match else_branch {
                    Some(else_branch) => {
                        self.line("} else {");
                        self.indent += 1;
                        self.stmt_in_block(else_branch)?;
                        self.indent -= 1;
                        self.line("}");
                    }
                    None => self.line("}"),
                }
            }

            StmtKind::While { cond, body } => {
                let cond_s = self.expr(cond)?;
                self.line(format!("while ({}) {{", cond_s));
                self.indent += 1;
                self.stmt_in_block(body)?;
                self.indent -= 1;
                self.line("}");
            }

            StmtKind::Repeat { body, until } => {
                self.line("do {");
                self.indent += 1;
                for s in body {
                    self.stmt(s)?;
                }
                self.indent -= 1;
                let cond_s = self.expr(until)?;
                self.line(format!("}} while (!({}));", cond_s));
            }

            StmtKind::For {
                var,
                start,
                end,
                downto,
                body,
            } => {
                self.emit_for(var, start, end, *downto, body)?;
            }

            StmtKind::Case {
                selector,
                arms,
                else_branch,
            } => {
                self.emit_case(selector, arms, else_branch.as_deref())?;
            }

            StmtKind::With { targets, body } => {
                // One scoped block per target; bound identifiers are
                // already prefixed with their target expression.
                for _ in targets {
                    self.line("{");
                    self.indent += 1;
                }
                self.stmt_in_block(body)?;
                for _ in targets {
                    self.indent -= 1;
                    self.line("}");
                }
            }

            StmtKind::Labeled { label, stmt: inner } => {
                self.line(format!("label_{}:;", label.to_ascii_lowercase()));
                self.stmt(inner)?;
            }

            StmtKind::Goto(label) => {
                self.line(format!("goto label_{};", label.to_ascii_lowercase()));
            }

            StmtKind::Break => self.line("break;"),
            StmtKind::Continue => self.line("continue;"),
            StmtKind::Empty => {}

            StmtKind::Call(expr) => self.emit_call_statement(expr)?,
        }
        Ok(())
    }

    fn emit_call_statement(&mut self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Call { name, args } => {
                if let Some(builtin) = builtins::lookup(name) {
                    return self.builtin_stmt(builtin, args);
                }
                let rendered = self.expr(expr)?;
                self.line(format!("{};", rendered));
            }
            // A bare identifier in statement position is a call.
            ExprKind::Ident(name) => {
                if let Some(builtin) = builtins::lookup(name) {
                    return self.builtin_stmt(builtin, &[]);
                }
                self.line(format!("{}();", cpp_ident(name)));
            }
            _ => {
                let rendered = self.expr(expr)?;
                self.line(format!("{};", rendered));
            }
        }
        Ok(())
    }

    /// `for v := a to b do S` as a native counted loop. Enum loop
    /// variables step through their ordinals.
    fn emit_for(
        &mut self,
        var: &Expr,
        start: &Expr,
        end: &Expr,
        downto: bool,
        body: &Stmt,
    ) -> Result<()> {
        let v = self.expr(var)?;
        let a = self.expr(start)?;
        let b = self.expr(end)?;

        let enum_ty = self
            .ty_of(var)
            .filter(|t| t.is_enum())
            .map(|t| t.data.name());

        let header = match enum_ty {
            Some(name) => {
                let cpp = cpp_ident(&name);
                let (cmp, step) = if downto { (">=", "- 1") } else { ("<=", "+ 1") };
                format!(
                    "for ({v} = {a}; static_cast<int>({v}) {cmp} static_cast<int>({b}); \
                     {v} = static_cast<{cpp}>(static_cast<int>({v}) {step})) {{",
                    v = v,
                    a = a,
                    b = b,
                    cmp = cmp,
                    step = step,
                    cpp = cpp
                )
            }
            None => {
                if downto {
                    format!("for ({v} = {a}; {v} >= {b}; --{v}) {{", v = v, a = a, b = b)
                } else {
                    format!("for ({v} = {a}; {v} <= {b}; ++{v}) {{", v = v, a = a, b = b)
                }
            }
        };

        self.line(header);
        self.indent += 1;
        self.stmt_in_block(body)?;
        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    /// `case` lowers to a switch; list labels become multiple case
    /// labels and range labels are expanded.
    fn emit_case(
        &mut self,
        selector: &Expr,
        arms: &[tpc_par::CaseArm],
        else_branch: Option<&[Stmt]>,
    ) -> Result<()> {
        let selector_is_enum = self.ty_of(selector).map(|t| t.is_enum()).unwrap_or(false);
        let selector_s = if selector_is_enum {
            format!("static_cast<int>({})", self.expr(selector)?)
        } else {
            self.expr(selector)?
        };

        self.line(format!("switch ({}) {{", selector_s));
        self.indent += 1;

        for arm in arms {
            let mut labels = Vec::new();
            for label in &arm.labels {
                self.case_label_values(label, selector_is_enum, &mut labels)?;
            }
            for label in labels {
                self.line(format!("case {}:", label));
            }
            self.line("{");
            self.indent += 1;
            self.stmt_in_block(&arm.body)?;
            self.line("break;");
            self.indent -= 1;
            self.line("}");
        }

        if let Some(stmts) = else_branch {
            self.line("default:");
            self.line("{");
            self.indent += 1;
            for s in stmts {
                self.stmt(s)?;
            }
            self.line("break;");
            self.indent -= 1;
            self.line("}");
        }

        self.indent -= 1;
        self.line("}");
        Ok(())
    }

    /// Constant label values of one case label (a single constant or a
    /// range to expand).
    fn case_label_values(
        &self,
        label: &Expr,
        as_int: bool,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if let ExprKind::Range { lo, hi } = &label.kind {
            match (self.eval(lo), self.eval(hi)) {
                (Some(ConstValue::Int(a)), Some(ConstValue::Int(b))) => {
                    for v in a..=b {
                        out.push(v.to_string());
                    }
                    return Ok(());
                }
                (Some(ConstValue::Char(a)), Some(ConstValue::Char(b))) => {
                    let (a, b) = (a as u32, b as u32);
                    for v in a..=b {
                        let c = char::from_u32(v).ok_or_else(|| {
                            CodeGenError::Internal("invalid char in case range".to_string())
                        })?;
                        out.push(char_literal(c));
                    }
                    return Ok(());
                }
                _ => {
                    return Err(CodeGenError::Internal(
                        "case range bounds are not constant".to_string(),
                    ))
                }
            }
        }

        match self.eval(label) {
            Some(ConstValue::Int(v)) => out.push(v.to_string()),
            Some(ConstValue::Char(c)) => out.push(char_literal(c)),
            Some(ConstValue::Bool(b)) => out.push(if b { "1" } else { "0" }.to_string()),
            _ if as_int => {
                return Err(CodeGenError::Internal(
                    "case label is not a constant".to_string(),
                ))
            }
            _ => out.push(self.expr(label)?),
        }
        Ok(())
    }

    /// True when the first argument of an I/O builtin is a file handle.
    pub(crate) fn first_arg_is_file(&self, args: &[Expr]) -> bool {
        args.first()
            .and_then(|a| self.ty_of(a))
            .map(|t| t.is_file())
            .unwrap_or(false)
    }

    /// Wraps an argument for stream output; enums print as ordinals.
    pub(crate) fn write_value(&self, arg: &Expr) -> Result<String> {
        let rendered = self.expr(arg)?;
        if self.ty_of(arg).map(|t| t.is_enum()).unwrap_or(false) {
            Ok(format!("static_cast<int>({})", rendered))
        } else {
            Ok(rendered)
        }
    }

    /// C++ type name of the pointee of a pointer-typed argument, for
    /// `new`.
    pub(crate) fn pointee_cpp(&self, arg: &Expr) -> Result<String> {
        let ty = self
            .ty_of(arg)
            .ok_or_else(|| CodeGenError::Internal("untyped pointer argument".to_string()))?;
        match (&ty.data, &ty.pointee) {
            (DataType::Pointer, Some(name)) => Ok(super::cpp_name_for_type_name(name)),
            _ => Err(CodeGenError::Internal(
                "new/dispose needs a typed pointer".to_string(),
            )),
        }
    }

}
