//! Syntax tree for the component subset the sandbox evaluates

use std::sync::Arc;

/// A parsed script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `const` / `let` / `var`, possibly with several declarators
    Declare {
        decls: Vec<(Pattern, Option<Expr>)>,
        line: usize,
    },
    /// `function Name(...) { ... }`, hoisted
    Function {
        name: String,
        func: Arc<Function>,
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    Throw {
        value: Expr,
        line: usize,
    },
    Expr {
        expr: Expr,
        line: usize,
    },
    /// Only parsed inside function bodies
    If {
        test: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
        line: usize,
    },
    /// A skipped statement with a `return` inside a function body
    Unsupported {
        keyword: String,
        line: usize,
    },
}

/// Binding target of a declaration or parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(String),
    /// `[a, , b]`; holes are `None`
    Array(Vec<Option<String>>),
    /// `{ a, b: c = 1, ...rest }`
    Object {
        props: Vec<PropBinding>,
        rest: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropBinding {
    pub key: String,
    pub binding: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub params: Vec<Param>,
    pub body: FunctionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Undefined,
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `new Name(args)`
    New {
        callee: String,
        args: Vec<Expr>,
    },
    Arrow(Arc<Function>),
    Object(Vec<ObjectEntry>),
    Array(Vec<Expr>),
    Jsx(Box<JsxNode>),
    /// Anything outside the subset, kept as source text
    Opaque(String),
}

impl Expr {
    /// Dotted path for identifiers and member chains (`React.useState`)
    pub fn path(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member { object, property } => {
                object.path().map(|base| format!("{}.{}", base, property))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    Prop(String, Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxNode {
    Element(JsxElement),
    Fragment(Vec<JsxChild>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsxElement {
    pub name: String,
    pub attrs: Vec<JsxAttr>,
    pub children: Vec<JsxChild>,
    pub line: usize,
}

impl JsxElement {
    /// Lowercase single-word tags are host elements; everything else names
    /// a component binding
    pub fn is_intrinsic(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_lowercase()) && !self.name.contains('.')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttr {
    /// `name="x"`, `name={expr}`, or bare `name` (value `None`)
    Named { name: String, value: Option<Expr> },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxChild {
    Text(String),
    Expr(Expr),
    Node(JsxNode),
}
