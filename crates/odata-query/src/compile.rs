//! Expression compiler: renders a lambda expression as protocol text
//!
//! One `ExpressionCompiler` is created per query operation. It owns the two
//! flags that live for a single pass (`pascalize`, root lambda) so nothing
//! leaks between operations or between concurrent compilations.

use thiserror::Error;

use crate::ast::{Assign, Expr};
use crate::literal::render_literal;
use crate::scope::{Scope, lookup};
use crate::tables::{
    MATH_OWNER, binary_operator, is_lambda_method, is_math_function, method_name, unary_operator,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("{0} is not supported.")]
    UnsupportedOperation(String),

    #[error("Invalid function call {0}")]
    InvalidCallTarget(String),
}

type Result<T> = std::result::Result<T, CompileError>;

/// Render `expr` with pascalization off and a fresh root-lambda flag.
///
/// Names in `bound` are lambda parameters already in scope; they render as
/// empty text.
pub fn render<'e>(expr: &'e Expr, scopes: &[Scope], bound: &[&'e str]) -> Result<String> {
    ExpressionCompiler::new(scopes, false).render(expr, bound)
}

/// Single-pass renderer for one operation's expression
pub struct ExpressionCompiler<'s> {
    scopes: &'s [Scope],
    /// Upper-case the first letter of member names
    pascalize: bool,
    /// The next lambda entered is the clause's outermost one
    root_lambda: bool,
}

impl<'s> ExpressionCompiler<'s> {
    pub fn new(scopes: &'s [Scope], pascalize: bool) -> Self {
        Self {
            scopes,
            pascalize,
            root_lambda: true,
        }
    }

    /// Compile one expression. Consumes the compiler: flags are per pass.
    pub fn compile(mut self, expr: &Expr) -> Result<String> {
        self.render(expr, &[])
    }

    fn render<'e>(&mut self, expr: &'e Expr, bound: &[&'e str]) -> Result<String> {
        match expr {
            Expr::Literal(value) => Ok(render_literal(value)),
            Expr::Variable(name) => Ok(self.variable(name, bound)),
            Expr::Unary { operator, target } => {
                let target = self.render(target, bound)?;
                Ok(format!("{}{}", unary_operator(operator), target))
            }
            Expr::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.render(left, bound)?;
                let right = self.render(right, bound)?;
                Ok(format!("{} {} {}", left, binary_operator(operator), right))
            }
            Expr::Group(items) => Ok(format!("({})", self.render_all(items, bound)?.join(", "))),
            Expr::Assign(assign) => self.render(&assign.right, bound),
            Expr::Object(members) => self.object(members, bound),
            Expr::Array(items) => Ok(format!("[{}]", self.render_all(items, bound)?.join(", "))),
            Expr::Member { owner, name } => self.member(owner, name, bound),
            Expr::Indexer { owner, key } => {
                let owner = self.render(owner, bound)?;
                let key = self.render(key, bound)?;
                Ok(format!("{}[{}]", owner, key))
            }
            Expr::Func { parameters, body } => self.func(parameters, body, bound),
            Expr::Call { callee, args } => self.call(callee, args, bound),
            Expr::Ternary {
                predicate,
                when_true,
                when_false,
            } => {
                let predicate = self.render(predicate, bound)?;
                let when_true = self.render(when_true, bound)?;
                let when_false = self.render(when_false, bound)?;
                Ok(format!("{} ? {} : {}", predicate, when_true, when_false))
            }
        }
    }

    fn render_all<'e>(&mut self, exprs: &'e [Expr], bound: &[&'e str]) -> Result<Vec<String>> {
        exprs.iter().map(|e| self.render(e, bound)).collect()
    }

    fn variable(&self, name: &str, bound: &[&str]) -> String {
        if bound.contains(&name) {
            return String::new();
        }
        match lookup(self.scopes, name) {
            Some(value) => render_literal(value),
            // Free global, e.g. `Math`
            None => name.to_string(),
        }
    }

    fn member<'e>(&mut self, owner: &'e Expr, name: &str, bound: &[&'e str]) -> Result<String> {
        let owner = self.render(owner, bound)?;
        if name == "length" {
            return Ok(format!("length({})", owner));
        }

        let member = if self.pascalize {
            pascal_case(name)
        } else {
            name.to_string()
        };
        if owner.is_empty() {
            Ok(member)
        } else {
            Ok(format!("{}/{}", owner, member))
        }
    }

    fn object<'e>(&mut self, members: &'e [Assign], bound: &[&'e str]) -> Result<String> {
        let rendered = members
            .iter()
            .map(|m| -> Result<String> {
                Ok(format!("{} as {}", m.name, self.render(&m.right, bound)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }

    fn func<'e>(
        &mut self,
        parameters: &'e [String],
        body: &'e Expr,
        bound: &[&'e str],
    ) -> Result<String> {
        if self.root_lambda {
            // The clause itself is the outermost lambda: no parameter prefix,
            // and its parameters render as nothing.
            self.root_lambda = false;
            let bound: Vec<&str> = bound
                .iter()
                .copied()
                .chain(parameters.iter().map(String::as_str))
                .collect();
            return self.render(body, &bound);
        }

        // Nested lambda parameters are range variables and keep their names
        let bound: Vec<&str> = bound
            .iter()
            .copied()
            .filter(|b| !parameters.iter().any(|p| p == b))
            .collect();
        let body = self.render(body, &bound)?;
        Ok(format!("{}: {}", parameters.join(", "), body))
    }

    fn call<'e>(&mut self, callee: &'e Expr, args: &'e [Expr], bound: &[&'e str]) -> Result<String> {
        match callee {
            Expr::Member { owner, name } => {
                let args = self.render_all(args, bound)?;
                let owner = self.render(owner, bound)?;
                Ok(self.method_call(owner, name, args))
            }
            Expr::Variable(name) => {
                let args = self.render_all(args, bound)?;
                Ok(format!("{}({})", name, args.join(", ")))
            }
            other => Err(CompileError::InvalidCallTarget(other.to_string())),
        }
    }

    fn method_call(&self, owner: String, name: &str, args: Vec<String>) -> String {
        if owner == MATH_OWNER && is_math_function(name) {
            return format!("{}({})", name, args.join(", "));
        }

        if name == "includes" {
            let mut all = args;
            if !owner.is_empty() {
                all.push(owner);
            }
            return format!("substringof({})", all.join(", "));
        }

        if is_lambda_method(name) {
            return if owner.is_empty() {
                format!("{}({})", name, args.join(", "))
            } else {
                format!("{}/{}({})", owner, name, args.join(", "))
            };
        }

        let mut all = Vec::with_capacity(args.len() + 1);
        if !owner.is_empty() {
            all.push(owner);
        }
        all.extend(args);
        format!("{}({})", method_name(name), all.join(", "))
    }
}

fn pascal_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
