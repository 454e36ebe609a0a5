// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for condition expressions

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::ConditionError;

/// A condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Comparison of a payload field against a literal
    Compare {
        field: String,
        op: CompareOp,
        right: Literal,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    /// Bare field reference, true when the field is truthy
    Field(String),
    True,
    False,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring or array membership
    Contains,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Contains => "contains",
        }
    }

    /// Compare two JSON values
    ///
    /// Numbers and numeric strings compare numerically. Otherwise only
    /// `==`/`!=` (by string form) and `contains` are meaningful; ordering
    /// operators on non-numeric values are false.
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        let numeric = as_number(left).zip(as_number(right));
        match self {
            CompareOp::Eq => match numeric {
                Some((a, b)) => (a - b).abs() < f64::EPSILON,
                None => loose_eq(left, right),
            },
            CompareOp::NotEq => !CompareOp::Eq.apply(left, right),
            CompareOp::Gt => numeric.is_some_and(|(a, b)| a > b),
            CompareOp::Gte => numeric.is_some_and(|(a, b)| a >= b),
            CompareOp::Lt => numeric.is_some_and(|(a, b)| a < b),
            CompareOp::Lte => numeric.is_some_and(|(a, b)| a <= b),
            CompareOp::Contains => contains(left, right),
        }
    }
}

impl FromStr for CompareOp {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" | "===" => Ok(CompareOp::Eq),
            "!=" | "!==" => Ok(CompareOp::NotEq),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            "contains" => Ok(CompareOp::Contains),
            other => Err(ConditionError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }
}

/// Numeric view of a value; numeric strings count
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Truthiness in the sense a strategy author expects
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::String(a), Value::Bool(b)) | (Value::Bool(b), Value::String(a)) => {
            a == &b.to_string()
        }
        _ => left == right,
    }
}

fn contains(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
        (Value::Array(items), needle) => items.iter().any(|item| CompareOp::Eq.apply(item, needle)),
        _ => false,
    }
}
