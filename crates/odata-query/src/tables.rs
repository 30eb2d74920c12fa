//! Source-to-protocol token tables

/// Infix operators and their protocol keywords
pub const BINARY_OPERATORS: &[(&str, &str)] = &[
    ("==", "eq"),
    ("===", "eq"),
    ("!=", "ne"),
    ("!==", "ne"),
    (">", "gt"),
    (">=", "ge"),
    ("<", "lt"),
    ("<=", "le"),
    ("+", "add"),
    ("-", "sub"),
    ("*", "mul"),
    ("/", "div"),
    ("%", "mod"),
    ("&&", "and"),
    ("||", "or"),
];

pub const UNARY_OPERATORS: &[(&str, &str)] = &[("!", "not")];

/// Instance methods and the protocol functions they become.
/// The owner is passed as the first argument.
pub const METHODS: &[(&str, &str)] = &[
    ("endsWith", "endswith"),
    ("startsWith", "startswith"),
    ("indexOf", "indexof"),
    ("replace", "replace"),
    ("substr", "substring"),
    ("toLowerCase", "tolower"),
    ("toUpperCase", "toupper"),
    ("trim", "trim"),
    ("concat", "concat"),
    ("getDate", "day"),
    ("getHours", "hour"),
    ("getMinutes", "minute"),
    ("getMonth", "month"),
    ("getSeconds", "second"),
    ("getFullYear", "year"),
];

/// `Math.<name>(x)` calls rendered as bare protocol functions
pub const MATH_FUNCTIONS: &[&str] = &["round", "floor", "ceiling"];

/// Collection methods taking a nested lambda: `owner/any(x: ...)`
pub const LAMBDA_METHODS: &[&str] = &["any", "all"];

pub const MATH_OWNER: &str = "Math";

fn find<'a>(table: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Protocol keyword for an infix operator, or the operator itself
pub fn binary_operator(op: &str) -> &str {
    find(BINARY_OPERATORS, op).unwrap_or(op)
}

/// Protocol keyword for a prefix operator, or the operator itself
pub fn unary_operator(op: &str) -> &str {
    find(UNARY_OPERATORS, op).unwrap_or(op)
}

/// Protocol function name for an instance method, or the method name itself
pub fn method_name(name: &str) -> &str {
    find(METHODS, name).unwrap_or(name)
}

pub fn is_math_function(name: &str) -> bool {
    MATH_FUNCTIONS.contains(&name)
}

pub fn is_lambda_method(name: &str) -> bool {
    LAMBDA_METHODS.contains(&name)
}
