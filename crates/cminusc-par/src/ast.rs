//! Abstract syntax tree.
//!
//! Each grammar production gets its own variant with named fields, rather
//! than a single node type carrying a tag and an untyped attribute map.

use cminusc_util::Span;

/// A declared scalar type (`int` or `float`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
}

/// A function's return type, which additionally allows `void`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnType {
    Int,
    Float,
    Void,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    IntLiteral(String),
    FloatLiteral(String),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// An expression node. `parenthesised` is set on an expression that was
/// wrapped in `( ... )` in the source, so a downstream consumer could
/// recover precedence intent even though this grammar does not encode
/// operator precedence itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub parenthesised: bool,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            parenthesised: false,
        }
    }

    pub fn parenthesise(mut self) -> Self {
        self.parenthesised = true;
        self
    }
}

/// The argument to a `write(...)` call: either a bare string literal or an
/// expression (`write '(' ( STRING_LIT | expr ) ')'`).
#[derive(Clone, Debug, PartialEq)]
pub enum WriteArg {
    Str(String),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Read {
        name: String,
        span: Span,
    },
    Write {
        arg: WriteArg,
        span: Span,
    },
    CallStmt {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Assignment {
        name: String,
        value: Expr,
        span: Span,
    },
    Block(Vec<Stmt>),
    Empty,
}

/// One `type IDENT { ',' IDENT }` group, shared by global declarations and
/// a function's local-variable block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDeclGroup {
    pub ty: Type,
    pub names: Vec<String>,
    pub span: Span,
}

/// One `IDENT '(' param_types ')'` signature inside a (possibly
/// comma-chained) function declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Param>,
    pub span: Span,
}

/// `function_decl ::= (type|'void') IDENT '(' param_types ')' { ',' IDENT '(' param_types ')' }`
///
/// All signatures in the comma-chain share the leading return type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDeclGroup {
    pub return_type: ReturnType,
    pub sigs: Vec<FunctionSig>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: ReturnType,
    pub params: Vec<Param>,
    pub locals: Vec<VarDeclGroup>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    VarDecl(VarDeclGroup),
    FunctionDecl(FunctionDeclGroup),
    FunctionDef(FunctionDef),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    /// Recursive indented dump of the tree, one node per line.
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        out.push_str("PROGRAM\n");
        for item in &self.items {
            fmt_item(item, 1, &mut out);
        }
        out
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn fmt_item(item: &Item, depth: usize, out: &mut String) {
    indent(out, depth);
    match item {
        Item::VarDecl(g) => {
            out.push_str(&format!("VARIABLE_DECLARATION type={:?} names={:?}\n", g.ty, g.names));
        }
        Item::FunctionDecl(g) => {
            out.push_str(&format!("FUNCTION_DECLARATION return_type={:?}\n", g.return_type));
            for sig in &g.sigs {
                indent(out, depth + 1);
                out.push_str(&format!("name={} params={:?}\n", sig.name, sig.params));
            }
        }
        Item::FunctionDef(f) => {
            out.push_str(&format!(
                "FUNCTION_DEFINITION name={} return_type={:?}\n",
                f.name, f.return_type
            ));
            for stmt in &f.body {
                fmt_stmt(stmt, depth + 1, out);
            }
        }
    }
}

fn fmt_stmt(stmt: &Stmt, depth: usize, out: &mut String) {
    indent(out, depth);
    match stmt {
        Stmt::If { .. } => out.push_str("STATEMENT_IF\n"),
        Stmt::While { .. } => out.push_str("STATEMENT_WHILE\n"),
        Stmt::Return { .. } => out.push_str("STATEMENT_RETURN\n"),
        Stmt::Read { name, .. } => out.push_str(&format!("STATEMENT_READ name={name}\n")),
        Stmt::Write { .. } => out.push_str("STATEMENT_WRITE\n"),
        Stmt::CallStmt { name, .. } => out.push_str(&format!("STATEMENT_FUNCTION_CALL name={name}\n")),
        Stmt::Assignment { name, .. } => out.push_str(&format!("STATEMENT_ASSIGNMENT name={name}\n")),
        Stmt::Block(stmts) => {
            out.push_str("STATEMENT_LIST\n");
            for s in stmts {
                fmt_stmt(s, depth + 1, out);
            }
        }
        Stmt::Empty => out.push_str("STATEMENT_EMPTY\n"),
    }
}
