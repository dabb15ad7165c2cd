//! Analyzer tests over whole programs.

use tpc_par::{Expr, ExprKind, Module, Parser, Stmt, StmtKind};
use tpc_util::{FileId, Handler, SourceMap};

use crate::analysis::{Analysis, SemanticAnalyzer};
use crate::types::DataType;

fn analyze(source: &str) -> (Module, Analysis, Handler) {
    let handler = Handler::new();
    let tokens = tpc_lex::tokenize(source, &handler, FileId::DUMMY);
    let mut parser = Parser::new(tokens, &handler);
    let module = parser.parse_module();
    assert!(
        !handler.has_errors(),
        "parse errors: {:?}",
        handler.diagnostics()
    );

    let mut sources = SourceMap::new();
    let mut analyzer = SemanticAnalyzer::without_units(&handler, &mut sources, parser.node_count());
    analyzer.analyze_module(&module);
    let (analysis, _table) = analyzer.finish();
    (module, analysis, handler)
}

fn analyze_ok(source: &str) -> (Module, Analysis) {
    let (module, analysis, handler) = analyze(source);
    assert!(
        !handler.has_errors(),
        "semantic errors: {:?}",
        handler.diagnostics()
    );
    (module, analysis)
}

/// Walks all expressions of a statement tree.
fn walk_exprs<'m>(stmt: &'m Stmt, out: &mut Vec<&'m Expr>) {
    fn expr<'m>(e: &'m Expr, out: &mut Vec<&'m Expr>) {
        out.push(e);
        match &e.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                expr(lhs, out);
                expr(rhs, out);
            }
            ExprKind::Unary { operand, .. }
            | ExprKind::AddressOf(operand)
            | ExprKind::Deref(operand) => expr(operand, out),
            ExprKind::Call { args, .. } => args.iter().for_each(|a| expr(a, out)),
            ExprKind::Field { base, .. } => expr(base, out),
            ExprKind::Index { base, indices } => {
                expr(base, out);
                indices.iter().for_each(|i| expr(i, out));
            }
            ExprKind::SetLiteral(elements) => elements.iter().for_each(|e| expr(e, out)),
            ExprKind::Range { lo, hi } => {
                expr(lo, out);
                expr(hi, out);
            }
            ExprKind::Formatted {
                value,
                width,
                precision,
            } => {
                expr(value, out);
                expr(width, out);
                if let Some(p) = precision {
                    expr(p, out);
                }
            }
            _ => {}
        }
    }

    match &stmt.kind {
        StmtKind::Assign { target, value } => {
            expr(target, out);
            expr(value, out);
        }
        StmtKind::Compound(stmts) => stmts.iter().for_each(|s| walk_exprs(s, out)),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            expr(cond, out);
            walk_exprs(then_branch, out);
            if let Some(e) = else_branch {
                walk_exprs(e, out);
            }
        }
        StmtKind::While { cond, body } => {
            expr(cond, out);
            walk_exprs(body, out);
        }
        StmtKind::Repeat { body, until } => {
            body.iter().for_each(|s| walk_exprs(s, out));
            expr(until, out);
        }
        StmtKind::For {
            var, start, end, body, ..
        } => {
            expr(var, out);
            expr(start, out);
            expr(end, out);
            walk_exprs(body, out);
        }
        StmtKind::Case {
            selector,
            arms,
            else_branch,
        } => {
            expr(selector, out);
            for arm in arms {
                arm.labels.iter().for_each(|l| expr(l, out));
                walk_exprs(&arm.body, out);
            }
            if let Some(stmts) = else_branch {
                stmts.iter().for_each(|s| walk_exprs(s, out));
            }
        }
        StmtKind::With { targets, body } => {
            targets.iter().for_each(|t| expr(t, out));
            walk_exprs(body, out);
        }
        StmtKind::Labeled { stmt, .. } => walk_exprs(stmt, out),
        StmtKind::Call(e) => expr(e, out),
        _ => {}
    }
}

#[test]
fn every_typed_expression_has_a_known_type_in_a_clean_program() {
    let (module, analysis) = analyze_ok(
        "program P;\nvar i: integer; s: string;\nbegin\n  for i := 1 to 3 do\n    s := s + 'x';\n  writeln(s, i * 2)\nend.",
    );
    let Module::Program(p) = module else {
        panic!("expected program")
    };

    let mut exprs = Vec::new();
    for stmt in &p.body {
        walk_exprs(stmt, &mut exprs);
    }
    assert!(!exprs.is_empty());
    for e in exprs {
        let ty = analysis
            .expr_types
            .get(&e.id)
            .unwrap_or_else(|| panic!("untyped expression {:?}", e));
        assert_ne!(ty.data, DataType::Unknown, "unknown type for {:?}", e);
    }
}

#[test]
fn undefined_identifier_is_unknown_and_reported() {
    let (module, analysis, handler) = analyze("program P; begin writeln(mystery) end.");
    assert!(handler.has_errors());

    let Module::Program(p) = module else {
        panic!("expected program")
    };
    let mut exprs = Vec::new();
    walk_exprs(&p.body[0], &mut exprs);
    let ident = exprs
        .iter()
        .find(|e| matches!(&e.kind, ExprKind::Ident(n) if n == "mystery"))
        .unwrap();
    assert_eq!(analysis.expr_types[&ident.id].data, DataType::Unknown);
}

#[test]
fn with_binds_bare_fields_to_their_target() {
    let (module, analysis) = analyze_ok(
        "program P;\ntype T = record x, y: integer end;\nvar p: T;\nbegin\n  with p do begin x := 3; y := 4 end;\n  writeln(p.x + p.y)\nend.",
    );
    let Module::Program(prog) = module else {
        panic!("expected program")
    };

    let mut exprs = Vec::new();
    walk_exprs(&prog.body[0], &mut exprs);
    let bound: Vec<_> = exprs
        .iter()
        .filter(|e| analysis.with_bindings.contains_key(&e.id))
        .collect();
    assert_eq!(bound.len(), 2, "x and y should both bind to p");
    for e in bound {
        let target = &analysis.with_bindings[&e.id];
        assert!(matches!(&target.kind, ExprKind::Ident(n) if n == "p"));
    }
}

#[test]
fn overload_resolution_picks_by_signature() {
    let (module, analysis) = analyze_ok(
        "program P;\n\
         function Max(a, b: integer): integer;\nbegin\n  if a > b then Max := a else Max := b\nend;\n\
         function Max(a, b: real): real;\nbegin\n  if a > b then Max := a else Max := b\nend;\n\
         var i: integer; r: real;\nbegin\n  i := Max(1, 2);\n  r := Max(1.5, 2.5)\nend.",
    );
    let Module::Program(p) = module else {
        panic!("expected program")
    };

    let mut exprs = Vec::new();
    for stmt in &p.body {
        walk_exprs(stmt, &mut exprs);
    }
    let calls: Vec<_> = exprs
        .iter()
        .filter(|e| matches!(&e.kind, ExprKind::Call { name, .. } if name == "Max"))
        .collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(analysis.expr_types[&calls[0].id].data, DataType::Integer);
    assert_eq!(analysis.expr_types[&calls[1].id].data, DataType::Real);
}

#[test]
fn ambiguous_and_unmatched_overloads_are_errors() {
    let (_, _, handler) = analyze(
        "program P;\nfunction F(a: integer): integer;\nbegin\n  F := a\nend;\nbegin\n  writeln(F('x'))\nend.",
    );
    assert!(handler.has_errors());
}

#[test]
fn enum_ordinals_follow_declaration_order() {
    let (_, analysis) = analyze_ok(
        "program P;\ntype TColor = (Red, Green, Blue);\nvar c: TColor;\nbegin\n  c := Green\nend.",
    );
    assert_eq!(analysis.enum_ordinals["red"], 0);
    assert_eq!(analysis.enum_ordinals["green"], 1);
    assert_eq!(analysis.enum_ordinals["blue"], 2);
}

#[test]
fn set_literal_is_compatible_with_declared_set() {
    let (_, _) = analyze_ok(
        "program P;\nvar v: set of char;\nbegin\n  v := ['a'..'c', 'x'];\n  writeln('b' in v)\nend.",
    );
}

#[test]
fn set_operations_keep_the_declared_type() {
    analyze_ok(
        "program P;\ntype TDigits = set of byte;\nvar a, b: TDigits;\nbegin\n  a := [1, 2];\n  b := a + [3];\n  b := a * b;\n  b := b - a\nend.",
    );
}

#[test]
fn variant_record_fields_are_all_accessible() {
    analyze_ok(
        "program P;\ntype TShape = record\n  id: integer;\n  case kind: integer of\n    1: (radius: real);\n    2: (width, height: real)\nend;\nvar s: TShape;\nbegin\n  s.kind := 1;\n  s.radius := 2.5;\n  s.width := 4.0;\n  writeln(s.radius, s.width)\nend.",
    );
}

#[test]
fn assignment_type_mismatch_is_reported() {
    let (_, _, handler) =
        analyze("program P; var i: integer; begin i := 'hello' end.");
    assert!(handler.has_errors());
}

#[test]
fn condition_must_be_boolean() {
    let (_, _, handler) = analyze("program P; var i: integer; begin if i then writeln('x') end.");
    assert!(handler.has_errors());
}

#[test]
fn goto_to_undeclared_label_is_an_error() {
    let (_, _, handler) = analyze("program P; begin goto 42 end.");
    assert!(handler.has_errors());
}

#[test]
fn declared_labels_are_fine() {
    analyze_ok(
        "program P;\nlabel 42;\nvar i: integer;\nbegin\n  i := 0;\n  42: i := i + 1;\n  if i < 3 then goto 42\nend.",
    );
}

#[test]
fn duplicate_declaration_in_scope_is_an_error() {
    let (_, _, handler) = analyze("program P; var x: integer; var x: real; begin end.");
    assert!(handler.has_errors());
}

#[test]
fn function_result_assignment_types_against_return_type() {
    let (_, _, handler) = analyze(
        "program P;\nfunction F: integer;\nbegin\n  F := 'nope'\nend;\nbegin\n  writeln(F)\nend.",
    );
    assert!(handler.has_errors());
}

#[test]
fn parameterless_function_reference_is_an_implicit_call() {
    let (module, analysis) = analyze_ok(
        "program P;\nfunction Five: integer;\nbegin\n  Five := 5\nend;\nvar x: integer;\nbegin\n  x := Five\nend.",
    );
    let Module::Program(p) = module else {
        panic!("expected program")
    };
    let mut exprs = Vec::new();
    for stmt in &p.body {
        walk_exprs(stmt, &mut exprs);
    }
    let five = exprs
        .iter()
        .find(|e| matches!(&e.kind, ExprKind::Ident(n) if n == "Five"))
        .unwrap();
    assert!(analysis.implicit_calls.contains(&five.id));
    assert_eq!(analysis.expr_types[&five.id].data, DataType::Integer);
}

#[test]
fn pointer_list_program_types_cleanly() {
    analyze_ok(
        "program List;\ntype\n  PNode = ^TNode;\n  TNode = record\n    value: integer;\n    next: PNode\n  end;\nvar head, node: PNode; i: integer;\nbegin\n  head := nil;\n  for i := 1 to 3 do\n  begin\n    new(node);\n    node^.value := i;\n    node^.next := head;\n    head := node\n  end;\n  while head <> nil do\n  begin\n    writeln(head^.value);\n    head := head^.next\n  end\nend.",
    );
}

#[test]
fn array_metadata_is_recorded_in_type_defs() {
    use crate::types::{Dimension, TypeDef};

    let (_, analysis) = analyze_ok(
        "program P;\ntype TGrid = array[1..3, 'a'..'c'] of integer;\nvar g: TGrid;\nbegin\n  g[2, 'b'] := 7;\n  writeln(g[2, 'b'])\nend.",
    );
    match &analysis.type_defs["tgrid"] {
        TypeDef::Array { dims, .. } => {
            assert_eq!(dims.len(), 2);
            assert_eq!(dims[0], Dimension::IntRange(1, 3));
            assert_eq!(dims[1], Dimension::CharRange('a', 'c'));
        }
        other => panic!("expected array descriptor, got {:?}", other),
    }
}

#[test]
fn bounded_string_accepts_chars_and_strings() {
    analyze_ok(
        "program P;\ntype TName = string[10];\nvar n: TName; s: string;\nbegin\n  n := 'abc';\n  n := n + 'x';\n  s := n;\n  writeln(s)\nend.",
    );
}

#[test]
fn for_loop_variable_must_be_ordinal() {
    let (_, _, handler) =
        analyze("program P; var r: real; begin for r := 1 to 3 do writeln(r) end.");
    assert!(handler.has_errors());
}

#[test]
fn case_over_chars_with_ranges() {
    analyze_ok(
        "program P;\nvar c: char;\nbegin\n  c := 'q';\n  case c of\n    'a'..'m': writeln('low');\n    'n'..'z': writeln('high')\n  else\n    writeln('other')\n  end\nend.",
    );
}

#[test]
fn forward_declaration_is_not_a_duplicate() {
    analyze_ok(
        "program P;\nprocedure Later(x: integer); forward;\nprocedure Later(x: integer);\nbegin\n  writeln(x)\nend;\nbegin\n  Later(1)\nend.",
    );
}

#[test]
fn const_values_are_recorded() {
    let (_, analysis) = analyze_ok(
        "program P;\nconst Max = 10; Min = -2;\nvar a: array[Min..Max] of integer;\nbegin\n  a[0] := 1\nend.",
    );
    assert_eq!(analysis.const_values["max"], crate::ConstValue::Int(10));
    assert_eq!(analysis.const_values["min"], crate::ConstValue::Int(-2));
}
