//! Emitter tests: run the whole front end over a source string and
//! assert on the generated C++.

use tpc_par::Parser;
use tpc_util::{FileId, Handler, SourceMap};

use crate::emit_module;

fn compile(source: &str) -> String {
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
    let mut analyzer =
        tpc_sem::SemanticAnalyzer::without_units(&handler, &mut sources, parser.node_count());
    analyzer.analyze_module(&module);
    assert!(
        !handler.has_errors(),
        "semantic errors: {:?}",
        handler.diagnostics()
    );

    let (analysis, _table) = analyzer.finish();
    emit_module(&module, &analysis).expect("emission failed")
}

#[test]
fn counted_loop_and_entry() {
    let cpp = compile("program P; var i: integer; begin for i := 1 to 3 do writeln(i * i) end.");
    assert!(cpp.contains("int main(int argc, char* argv[])"));
    assert!(cpp.contains("pascal_argc = argc;"));
    assert!(cpp.contains("pascal_argv = argv;"));
    assert!(cpp.contains("for (i = 1; i <= 3; ++i) {"));
    assert!(cpp.contains("pascal_write((i * i));"));
    assert!(cpp.contains("pascal_newline();"));
    assert!(cpp.contains("return 0;"));
}

#[test]
fn downto_loop_decrements() {
    let cpp = compile("program P; var i: integer; begin for i := 3 downto 1 do writeln(i) end.");
    assert!(cpp.contains("for (i = 3; i >= 1; --i) {"));
}

#[test]
fn record_and_with_prefixing() {
    let cpp = compile(
        "program P; type T = record x, y: integer end; var p: T;\nbegin\n  with p do begin x := 3; y := 4 end;\n  writeln(p.x + p.y)\nend.",
    );
    assert!(cpp.contains("struct t {"));
    assert!(cpp.contains("int x{};"));
    assert!(cpp.contains("int y{};"));
    // Bare field uses inside `with p` emit p.<field>.
    assert!(cpp.contains("p.x = 3;"));
    assert!(cpp.contains("p.y = 4;"));
    assert!(cpp.contains("pascal_write((p.x + p.y));"));
}

#[test]
fn pointer_list_lowering() {
    let cpp = compile(
        "program List;\ntype\n  PNode = ^TNode;\n  TNode = record\n    value: integer;\n    next: PNode\n  end;\nvar head, node: PNode; i: integer;\nbegin\n  head := nil;\n  for i := 1 to 3 do\n  begin\n    new(node);\n    node^.value := i;\n    node^.next := head;\n    head := node\n  end;\n  while head <> nil do\n  begin\n    writeln(head^.value);\n    head := head^.next\n  end\nend.",
    );
    // Forward declaration lets the pointer alias precede the struct.
    assert!(cpp.contains("struct tnode;"));
    assert!(cpp.contains("using pnode = tnode*;"));
    assert!(cpp.contains("node = new tnode();"));
    assert!(cpp.contains("(*node).value = i;"));
    assert!(cpp.contains("head = nullptr;"));
    assert!(cpp.contains("while ((head != nullptr)) {"));
}

#[test]
fn set_literal_expands_ranges() {
    let cpp = compile(
        "program P; var v: set of char;\nbegin\n  v := ['a'..'c', 'x'];\n  writeln('b' in v, ' ', 'd' in v)\nend.",
    );
    assert!(cpp.contains("std::set<char>{'a', 'b', 'c', 'x'}"));
    assert!(cpp.contains(".count('b') != 0"));
    assert!(cpp.contains("pascal_write(' ');"));
}

#[test]
fn set_algebra_uses_runtime_helpers() {
    let cpp = compile(
        "program P; var a, b: set of byte;\nbegin\n  a := [1, 2];\n  b := a + [3];\n  b := a * b;\n  b := b - a\nend.",
    );
    assert!(cpp.contains("pascal_set_union("));
    assert!(cpp.contains("pascal_set_intersect("));
    assert!(cpp.contains("pascal_set_diff("));
}

#[test]
fn overloads_map_to_cpp_overloads() {
    let cpp = compile(
        "program P;\nfunction Max(a, b: integer): integer;\nbegin\n  if a > b then Max := a else Max := b\nend;\nfunction Max(a, b: real): real;\nbegin\n  if a > b then Max := a else Max := b\nend;\nbegin\n  writeln(Max(1, 2), ' ', Max(1.5, 2.5))\nend.",
    );
    assert!(cpp.contains("int max(int a, int b) {"));
    assert!(cpp.contains("double max(double a, double b) {"));
    assert!(cpp.contains("max(1, 2)"));
    assert!(cpp.contains("max(1.5, 2.5)"));
}

#[test]
fn function_result_local() {
    let cpp = compile(
        "program P;\nfunction Square(x: integer): integer;\nbegin\n  Square := x * x\nend;\nbegin\n  writeln(Square(4))\nend.",
    );
    assert!(cpp.contains("int square(int x) {"));
    assert!(cpp.contains("int square_result{};"));
    assert!(cpp.contains("square_result = (x * x);"));
    assert!(cpp.contains("return square_result;"));
}

#[test]
fn forward_declaration_emits_one_prototype_and_one_body() {
    let cpp = compile(
        "program P;\nprocedure Later(x: integer); forward;\nprocedure First;\nbegin\n  Later(1)\nend;\nprocedure Later(x: integer);\nbegin\n  writeln(x)\nend;\nbegin\n  First\nend.",
    );
    assert_eq!(cpp.matches("void later(int x);").count(), 1);
    assert_eq!(cpp.matches("void later(int x) {").count(), 1);
    // Prototype precedes the body, source order preserved.
    let proto = cpp.find("void later(int x);").unwrap();
    let body = cpp.find("void later(int x) {").unwrap();
    assert!(proto < body);
}

#[test]
fn enum_lowering_with_ordinals_and_aliases() {
    let cpp = compile(
        "program P;\ntype TColor = (Red, Green, Blue);\nvar c: TColor;\nbegin\n  c := Green;\n  writeln(ord(c))\nend.",
    );
    assert!(cpp.contains("enum class tcolor : int {"));
    assert!(cpp.contains("red = 0,"));
    assert!(cpp.contains("green = 1,"));
    assert!(cpp.contains("blue = 2,"));
    assert!(cpp.contains("constexpr tcolor green = tcolor::green;"));
    assert!(cpp.contains("static_cast<int>(c)"));
}

#[test]
fn multi_dimensional_index_flattens_row_major() {
    let cpp = compile(
        "program P;\ntype TGrid = array[1..3, 'a'..'c'] of integer;\nvar g: TGrid;\nbegin\n  g[2, 'b'] := 7;\n  writeln(g[2, 'b'])\nend.",
    );
    assert!(cpp.contains("using tgrid = std::array<int, 9>;"));
    assert!(cpp.contains("tgrid g;"));
    // Row-major: (i - lo1) * extent2 + (j - lo2).
    assert!(cpp.contains("g[((2) - (1)) * 3 + (('b') - 'a')] = 7;"));
}

#[test]
fn string_indexing_is_one_based() {
    let cpp = compile(
        "program P; var s: string; i: integer;\nbegin\n  s := 'hello';\n  i := 2;\n  writeln(s[i])\nend.",
    );
    assert!(cpp.contains("s[(i) - 1]"));
}

#[test]
fn string_concat_wraps_operands() {
    let cpp = compile(
        "program P; var s: string;\nbegin\n  s := 'ab' + 'c';\n  s := s + 'x';\n  writeln(s)\nend.",
    );
    assert!(cpp.contains("(pascal_str(std::string(\"ab\")) + pascal_str('c'))"));
    assert!(cpp.contains("(pascal_str(s) + pascal_str('x'))"));
}

#[test]
fn bounded_string_type() {
    let cpp = compile(
        "program P;\ntype TName = string[10];\nvar n: TName;\nbegin\n  n := 'very long name indeed';\n  writeln(n)\nend.",
    );
    assert!(cpp.contains("using tname = PascalString<10>;"));
}

#[test]
fn repeat_becomes_do_while() {
    let cpp = compile(
        "program P; var i: integer;\nbegin\n  i := 0;\n  repeat\n    i := i + 1\n  until i = 3\nend.",
    );
    assert!(cpp.contains("do {"));
    assert!(cpp.contains("} while (!((i == 3)));"));
}

#[test]
fn case_with_ranges_and_else() {
    let cpp = compile(
        "program P; var c: char;\nbegin\n  c := 'q';\n  case c of\n    'a', 'b': writeln('ab');\n    'x'..'z': writeln('xyz')\n  else\n    writeln('other')\n  end\nend.",
    );
    assert!(cpp.contains("switch (c) {"));
    assert!(cpp.contains("case 'a':"));
    assert!(cpp.contains("case 'b':"));
    // The range expands into individual labels.
    assert!(cpp.contains("case 'x':"));
    assert!(cpp.contains("case 'y':"));
    assert!(cpp.contains("case 'z':"));
    assert!(cpp.contains("default:"));
}

#[test]
fn goto_and_labels() {
    let cpp = compile(
        "program P;\nlabel 99;\nvar i: integer;\nbegin\n  i := 0;\n  99: i := i + 1;\n  if i < 3 then goto 99\nend.",
    );
    assert!(cpp.contains("label_99:;"));
    assert!(cpp.contains("goto label_99;"));
}

#[test]
fn variant_record_flattens_all_fields() {
    let cpp = compile(
        "program P;\ntype TShape = record\n  id: integer;\n  case kind: integer of\n    1: (radius: real);\n    2: (width, height: real)\nend;\nvar s: TShape;\nbegin\n  s.kind := 2;\n  s.width := 3.0;\n  s.radius := 1.5;\n  writeln(s.width, ' ', s.radius)\nend.",
    );
    assert!(cpp.contains("struct tshape {"));
    assert!(cpp.contains("int id{};"));
    assert!(cpp.contains("int kind{};"));
    assert!(cpp.contains("double radius{};"));
    assert!(cpp.contains("double width{};"));
    assert!(cpp.contains("double height{};"));
}

#[test]
fn var_parameters_become_references() {
    let cpp = compile(
        "program P;\nprocedure Bump(var n: integer; const tag: string);\nbegin\n  n := n + 1\nend;\nvar x: integer;\nbegin\n  x := 0;\n  Bump(x, 'go')\nend.",
    );
    assert!(cpp.contains("void bump(int& n, const std::string& tag) {"));
}

#[test]
fn nested_routines_become_lambdas() {
    let cpp = compile(
        "program P;\nprocedure Outer;\n  procedure Inner;\n  begin\n    writeln('inner')\n  end;\nbegin\n  Inner\nend;\nbegin\n  Outer\nend.",
    );
    assert!(cpp.contains("std::function<void()> inner = [&]() -> void {"));
    assert!(cpp.contains("inner();"));
    assert!(cpp.contains("outer();"));
}

#[test]
fn implicit_call_of_parameterless_function() {
    let cpp = compile(
        "program P;\nfunction Five: integer;\nbegin\n  Five := 5\nend;\nvar x: integer;\nbegin\n  x := Five\nend.",
    );
    assert!(cpp.contains("x = five();"));
}

#[test]
fn inc_dec_with_stride() {
    let cpp = compile(
        "program P; var i: integer;\nbegin\n  i := 0;\n  inc(i);\n  inc(i, 4);\n  dec(i)\nend.",
    );
    assert!(cpp.contains("i += 1;"));
    assert!(cpp.contains("i += 4;"));
    assert!(cpp.contains("i -= 1;"));
}

#[test]
fn file_operations_route_to_the_handle() {
    let cpp = compile(
        "program P; var f: text; line: string;\nbegin\n  assign(f, 'data.txt');\n  reset(f);\n  while not eof(f) do\n  begin\n    readln(f, line);\n    writeln(line)\n  end;\n  close(f);\n  writeln(ioresult)\nend.",
    );
    assert!(cpp.contains("PascalFile f;"));
    assert!(cpp.contains("f.assign(pascal_str(std::string(\"data.txt\")));"));
    assert!(cpp.contains("f.reset();"));
    assert!(cpp.contains("f.eof()"));
    assert!(cpp.contains("f.read(line);"));
    assert!(cpp.contains("f.close();"));
    assert!(cpp.contains("pascal_ioresult_take()"));
}

#[test]
fn formatted_write_arguments() {
    let cpp = compile("program P; var r: real;\nbegin\n  r := 2.5;\n  writeln(r:8:2, r:8)\nend.",);
    assert!(cpp.contains("pascal_write(r, 8, 2);"));
    assert!(cpp.contains("pascal_write(r, 8);"));
}

#[test]
fn crt_colours_only_when_used() {
    let without = compile("program P; begin writeln('x') end.");
    assert!(!without.contains("constexpr int lightgray"));

    let with = compile("program P; uses crt; begin clrscr; textcolor(White); writeln('x') end.");
    assert!(with.contains("constexpr int lightgray = 7;"));
    assert!(with.contains("pascal_clrscr();"));
    assert!(with.contains("pascal_textcolor(white);"));
}

#[test]
fn halt_and_exit() {
    let cpp = compile(
        "program P;\nprocedure Stop;\nbegin\n  exit\nend;\nbegin\n  Stop;\n  halt(2)\nend.",
    );
    assert!(cpp.contains("return;"));
    assert!(cpp.contains("std::exit(2);"));
}
