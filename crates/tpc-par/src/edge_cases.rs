//! Edge-case tests exercising the parser on whole programs.

use tpc_util::{FileId, Handler};

use crate::ast::*;
use crate::Parser;

fn parse(source: &str) -> (Module, Handler) {
    let handler = Handler::new();
    let tokens = tpc_lex::tokenize(source, &handler, FileId::DUMMY);
    let mut parser = Parser::new(tokens, &handler);
    let module = parser.parse_module();
    (module, handler)
}

#[test]
fn linked_list_program() {
    let source = "\
program List;
type
  PNode = ^TNode;
  TNode = record
    value: integer;
    next: PNode
  end;
var
  head, node: PNode;
  i: integer;
begin
  head := nil;
  for i := 1 to 3 do
  begin
    new(node);
    node^.value := i;
    node^.next := head;
    head := node
  end;
  while head <> nil do
  begin
    writeln(head^.value);
    head := head^.next
  end
end.
";
    let (module, handler) = parse(source);
    assert!(!handler.has_errors(), "diagnostics: {:?}", handler.diagnostics());
    let Module::Program(p) = module else {
        panic!("expected a program")
    };
    assert_eq!(p.decls.len(), 3);
    assert!(matches!(&p.decls[0], Decl::TypeDef(t) if t.name == "PNode"));
}

#[test]
fn overloaded_functions() {
    let source = "\
program Over;
function Max(a, b: integer): integer;
begin
  if a > b then Max := a else Max := b
end;
function Max(a, b: real): real;
begin
  if a > b then Max := a else Max := b
end;
begin
  writeln(Max(1, 2), ' ', Max(1.5, 2.5))
end.
";
    let (module, handler) = parse(source);
    assert!(!handler.has_errors());
    let Module::Program(p) = module else {
        panic!("expected a program")
    };
    let routines: Vec<_> = p
        .decls
        .iter()
        .filter_map(|d| match d {
            Decl::Routine(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(routines.len(), 2);
    assert_eq!(routines[0].name, "Max");
    assert_eq!(routines[1].name, "Max");
}

#[test]
fn with_statement_over_record() {
    let source = "\
program W;
type T = record x, y: integer end;
var p: T;
begin
  with p do
  begin
    x := 3;
    y := 4
  end;
  writeln(p.x + p.y)
end.
";
    let (module, handler) = parse(source);
    assert!(!handler.has_errors());
    let Module::Program(p) = module else {
        panic!("expected a program")
    };
    assert!(matches!(&p.body[0].kind, StmtKind::With { targets, .. } if targets.len() == 1));
}

#[test]
fn comments_in_every_style() {
    let source = "\
program C; { brace }
(* paren (* nested *) still *)
// line
var x: integer; // trailing
begin
  x := 1 { mid } + 2
end.
";
    let (_, handler) = parse(source);
    assert!(!handler.has_errors(), "diagnostics: {:?}", handler.diagnostics());
}

#[test]
fn recovery_produces_multiple_diagnostics() {
    let source = "\
program Bad;
var x integer;
var y: ;
begin
  x := ;
  y := 2
end.
";
    let (_, handler) = parse(source);
    assert!(handler.error_count() >= 2, "got {:?}", handler.diagnostics());
}

#[test]
fn recovery_never_wedges_on_misplaced_tokens() {
    // Tokens that recovery stops at (else, declaration keywords) must
    // not stall the statement loop.
    let (_, handler) = parse("program P; begin else var until + end.");
    assert!(handler.has_errors());

    // Termination is the point here; stray semicolons stay harmless.
    let (_, handler) = parse("program P; begin ; ; x := 1 ; end.");
    assert!(!handler.has_errors());
}

#[test]
fn case_insensitive_keywords_parse() {
    let source = "PROGRAM Up; VAR I: INTEGER; BEGIN FOR I := 1 TO 3 DO WriteLn(I) END.";
    let (module, handler) = parse(source);
    assert!(!handler.has_errors());
    assert_eq!(module.name(), "Up");
}

#[test]
fn goto_with_label_declaration() {
    let source = "\
program G;
label 99;
var i: integer;
begin
  i := 0;
  99: i := i + 1;
  if i < 3 then goto 99;
  writeln(i)
end.
";
    let (module, handler) = parse(source);
    assert!(!handler.has_errors(), "diagnostics: {:?}", handler.diagnostics());
    let Module::Program(p) = module else {
        panic!("expected a program")
    };
    assert!(matches!(&p.decls[0], Decl::Labels(labels, _) if labels == &vec!["99"]));
}
