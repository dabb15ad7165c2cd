//! AST node definitions.
//!
//! The tree is plainly owned: each node owns its children, the module
//! root owns everything. Expression nodes additionally carry a [`NodeId`]
//! assigned by the parser; the semantic analyser keys its side tables
//! (expression types, with-bindings) by that id, so no later phase ever
//! mutates the tree.

use tpc_util::{define_idx, Span};

define_idx!(NodeId);

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// `/` - real division.
    Div,
    /// `div` - integer division.
    IntDiv,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl BinOp {
    /// Returns true for `=`, `<>`, `<`, `<=`, `>`, `>=`.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Neg,
    Not,
}

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// Identity for analyser side tables.
    pub id: NodeId,
    /// Expression variant.
    pub kind: ExprKind,
    /// Source location.
    pub span: Span,
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    IntLiteral(i64),
    RealLiteral(f64),
    StringLiteral(String),
    CharLiteral(char),
    BoolLiteral(bool),
    Nil,

    /// Bare identifier: variable, constant, enum value, or a
    /// parameterless routine reference.
    Ident(String),

    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },

    /// `@e` - address of an lvalue.
    AddressOf(Box<Expr>),
    /// `e^` - pointer dereference.
    Deref(Box<Expr>),

    /// `name(args)` - routine or builtin call.
    Call {
        name: String,
        args: Vec<Expr>,
    },

    /// `base.field`.
    Field {
        base: Box<Expr>,
        field: String,
    },

    /// `base[i1, ..., iN]` - N-dimensional array or string indexing.
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },

    /// `[e1, e2..e3, ...]` - set constructor; elements may be ranges.
    SetLiteral(Vec<Expr>),

    /// `lo..hi` - inside set constructors and case labels.
    Range {
        lo: Box<Expr>,
        hi: Box<Expr>,
    },

    /// `e:width[:precision]` - output formatting in write/writeln.
    Formatted {
        value: Box<Expr>,
        width: Box<Expr>,
        precision: Option<Box<Expr>>,
    },
}

/// A statement node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement variants.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Assign {
        target: Expr,
        value: Expr,
    },
    Compound(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Repeat {
        body: Vec<Stmt>,
        until: Expr,
    },
    For {
        /// Loop variable as an identifier expression.
        var: Expr,
        start: Expr,
        end: Expr,
        downto: bool,
        body: Box<Stmt>,
    },
    Case {
        selector: Expr,
        arms: Vec<CaseArm>,
        else_branch: Option<Vec<Stmt>>,
    },
    With {
        targets: Vec<Expr>,
        body: Box<Stmt>,
    },
    /// `label: stmt`.
    Labeled {
        label: String,
        stmt: Box<Stmt>,
    },
    Goto(String),
    Break,
    Continue,
    /// A call (or bare routine identifier) in statement position.
    Call(Expr),
    /// Stray `;`.
    Empty,
}

/// One branch of a `case` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseArm {
    /// Constant labels; each may be a single value or a range.
    pub labels: Vec<Expr>,
    pub body: Box<Stmt>,
}

/// Parameter passing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamMode {
    /// By value (copy).
    Value,
    /// `var` - by reference.
    Var,
    /// `const` - by const reference.
    Const,
}

/// A group of parameters sharing one type: `a, b: integer`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamGroup {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub mode: ParamMode,
}

/// A type expression as written in source.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

/// Type expression variants.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeExprKind {
    /// Built-in or user type name.
    Named(String),
    /// `^T`.
    Pointer(Box<TypeExpr>),
    /// `array[d1, ..., dN] of T`.
    Array {
        dims: Vec<ArrayDim>,
        elem: Box<TypeExpr>,
    },
    /// `set of T`.
    SetOf(Box<TypeExpr>),
    /// `record ... end`, optionally with a variant part.
    Record {
        fields: Vec<FieldGroup>,
        variant: Option<VariantPart>,
    },
    /// `string[N]`.
    BoundedString(Expr),
    /// `lo..hi` subrange.
    Subrange(Expr, Expr),
    /// `(a, b, c)` enumeration.
    Enum(Vec<String>),
    /// `file of T`.
    FileOf(Box<TypeExpr>),
}

/// One dimension of an array type.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayDim {
    /// `lo..hi` - bounds may be integer, char or enum constants.
    Range(Expr, Expr),
    /// A bare ordinal domain name, e.g. `array[TColor]`.
    Named(String),
}

/// A group of record fields sharing one type: `x, y: integer`.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldGroup {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

/// The variant part of a record: `case tag: T of ...`.
///
/// All variant fields are accessible at all times; the tag does not gate
/// access.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantPart {
    /// Tag field name, if the tag is named (`case kind: T of` vs `case T of`).
    pub tag_name: Option<String>,
    /// Tag type name.
    pub tag_type: String,
    pub branches: Vec<VariantBranch>,
}

/// One branch of a variant part: `labels: (fields)`.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantBranch {
    pub labels: Vec<Expr>,
    pub fields: Vec<FieldGroup>,
}

/// Declarations.
#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Const(ConstDecl),
    TypeDef(TypeDecl),
    Var(VarDecl),
    /// `label 1, 2;`
    Labels(Vec<String>, Span),
    Routine(RoutineDecl),
}

/// `const name = value;`
#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// `type name = ...;`
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `var a, b: T;` with an optional initializer.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub init: Option<Expr>,
    pub span: Span,
}

/// A procedure or function declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutineDecl {
    pub name: String,
    pub params: Vec<ParamGroup>,
    /// Return type; `None` for procedures.
    pub ret: Option<TypeExpr>,
    /// Nested declarations.
    pub decls: Vec<Decl>,
    /// Body; `None` for `forward` declarations and interface headers.
    pub body: Option<Stmt>,
    pub span: Span,
}

impl RoutineDecl {
    /// Returns true for a declaration without a body.
    pub fn is_forward(&self) -> bool {
        self.body.is_none()
    }

    /// Returns true for functions (has a return type).
    pub fn is_function(&self) -> bool {
        self.ret.is_some()
    }
}

/// A whole program.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub name: String,
    pub uses: Vec<String>,
    pub decls: Vec<Decl>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A unit: interface, implementation, optional initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub name: String,
    pub interface_uses: Vec<String>,
    pub interface: Vec<Decl>,
    pub implementation_uses: Vec<String>,
    pub implementation: Vec<Decl>,
    pub initialization: Option<Vec<Stmt>>,
    pub span: Span,
}

/// Parse result: a program or a unit.
#[derive(Clone, Debug, PartialEq)]
pub enum Module {
    Program(Program),
    Unit(Unit),
}

impl Module {
    /// The module's declared name.
    pub fn name(&self) -> &str {
        match self {
            Module::Program(p) => &p.name,
            Module::Unit(u) => &u.name,
        }
    }
}
