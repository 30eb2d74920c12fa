//! Expression nodes - what the parser produces and the compiler consumes
//!
//! The node set is closed. Operators are kept as the source tokens
//! (`==`, `&&`, `!`) so operators the protocol has no word for can pass
//! through unchanged.

use super::Value;

/// `name: right`, the member form of object literals
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub name: String,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value: `1`, `"a"`, `true`, `null`
    Literal(Value),

    /// Identifier: `c`, `Math`, `threshold`
    Variable(String),

    /// Prefix operation: `!x`, `-x`
    Unary { operator: String, target: Box<Expr> },

    /// Infix operation: `a == b`, `a && b`
    Binary {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Parenthesised list: `(a)`, `(a, b)`
    Group(Vec<Expr>),

    /// Standalone assignment `name: right`
    Assign(Assign),

    /// Object literal: `{ name: c.name, total: c.price * c.count }`
    Object(Vec<Assign>),

    /// Array literal: `[1, 2, 3]`
    Array(Vec<Expr>),

    /// Member access: `owner.name`
    Member { owner: Box<Expr>, name: String },

    /// Indexed access: `owner[key]`
    Indexer { owner: Box<Expr>, key: Box<Expr> },

    /// Lambda: `c => body`, `(a, b) => body`
    Func { parameters: Vec<String>, body: Box<Expr> },

    /// Function/method call: `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Conditional: `predicate ? when_true : when_false`
    Ternary {
        predicate: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn lambda<S: Into<String>>(parameters: impl IntoIterator<Item = S>, body: Expr) -> Self {
        Expr::Func {
            parameters: parameters.into_iter().map(Into::into).collect(),
            body: Box::new(body),
        }
    }

    pub fn binary(self, operator: impl Into<String>, rhs: Expr) -> Self {
        Expr::Binary {
            operator: operator.into(),
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    pub fn unary(operator: impl Into<String>, target: Expr) -> Self {
        Expr::Unary {
            operator: operator.into(),
            target: Box::new(target),
        }
    }

    pub fn member(self, name: impl Into<String>) -> Self {
        Expr::Member {
            owner: Box::new(self),
            name: name.into(),
        }
    }

    pub fn index(self, key: Expr) -> Self {
        Expr::Indexer {
            owner: Box::new(self),
            key: Box::new(key),
        }
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(self),
            args,
        }
    }

    pub fn ternary(self, when_true: Expr, when_false: Expr) -> Self {
        Expr::Ternary {
            predicate: Box::new(self),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        }
    }
}

impl Assign {
    pub fn new(name: impl Into<String>, right: Expr) -> Self {
        Assign {
            name: name.into(),
            right: Box::new(right),
        }
    }
}
