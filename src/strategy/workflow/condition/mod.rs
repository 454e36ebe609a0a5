// SPDX-License-Identifier: MIT

//! Condition expressions for branching nodes
//!
//! The `if` node evaluates a small expression language against its input
//! payload, for example:
//! - `price > 100`
//! - `signal == 'oversold'`
//! - `rsi < 30 and volume >= 1000`

mod ast;
mod evaluator;
mod parser;

pub use ast::{as_number, is_truthy, CompareOp, Expression, Literal};
pub use evaluator::{evaluate, lookup_path};
pub use parser::parse;

use thiserror::Error;

/// Errors produced while parsing a condition
#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
    #[error("Empty condition")]
    Empty,

    #[error("Could not parse condition: {0}")]
    Syntax(String),

    #[error("Could not parse literal: {0}")]
    InvalidLiteral(String),

    #[error("Unknown comparison operator: {0}")]
    UnknownOperator(String),
}
