// SPDX-License-Identifier: MIT

//! Condition expression parser
//!
//! Parses expressions like:
//! - `price > 100`
//! - `signal == 'oversold'`
//! - `rsi < 30 and volume >= 1000`
//! - `not (triggered or passed)`

use super::ast::{CompareOp, Expression, Literal};
use super::ConditionError;

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ConditionError> {
    let input = strip_outer_parens(input.trim());

    if input.is_empty() {
        return Err(ConditionError::Empty);
    }
    if input == "true" {
        return Ok(Expression::True);
    }
    if input == "false" {
        return Ok(Expression::False);
    }

    // `or` binds loosest, so split on it first
    if let Some(pos) = find_top_level(input, " or ") {
        let left = parse(&input[..pos])?;
        let right = parse(&input[pos + 4..])?;
        return Ok(Expression::Or(Box::new(left), Box::new(right)));
    }
    if let Some(pos) = find_top_level(input, " and ") {
        let left = parse(&input[..pos])?;
        let right = parse(&input[pos + 5..])?;
        return Ok(Expression::And(Box::new(left), Box::new(right)));
    }

    if let Some(rest) = input.strip_prefix("not ") {
        return Ok(Expression::Not(Box::new(parse(rest)?)));
    }
    if let Some(rest) = input.strip_prefix('!') {
        if !rest.starts_with('=') {
            return Ok(Expression::Not(Box::new(parse(rest)?)));
        }
    }

    parse_comparison(input)
}

fn parse_comparison(input: &str) -> Result<Expression, ConditionError> {
    // Longest operators first so `>=` is not read as `>`
    let operators = [
        ("!=", CompareOp::NotEq),
        (">=", CompareOp::Gte),
        ("<=", CompareOp::Lte),
        ("==", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
        (" contains ", CompareOp::Contains),
    ];

    for (symbol, op) in operators {
        if let Some(pos) = find_top_level(input, symbol) {
            let field = input[..pos].trim();
            if !is_field_path(field) {
                return Err(ConditionError::Syntax(input.to_string()));
            }
            let right = parse_literal(&input[pos + symbol.len()..])?;
            return Ok(Expression::Compare {
                field: field.to_string(),
                op,
                right,
            });
        }
    }

    if is_field_path(input) {
        return Ok(Expression::Field(input.to_string()));
    }

    Err(ConditionError::Syntax(input.to_string()))
}

fn parse_literal(input: &str) -> Result<Literal, ConditionError> {
    let input = input.trim();

    match input {
        "null" => return Ok(Literal::Null),
        "true" => return Ok(Literal::Boolean(true)),
        "false" => return Ok(Literal::Boolean(false)),
        _ => {}
    }

    let quoted = input.len() >= 2
        && ((input.starts_with('\'') && input.ends_with('\''))
            || (input.starts_with('"') && input.ends_with('"')));
    if quoted {
        return Ok(Literal::String(input[1..input.len() - 1].to_string()));
    }

    input
        .parse::<f64>()
        .map(Literal::Number)
        .map_err(|_| ConditionError::InvalidLiteral(input.to_string()))
}

/// Byte offset of `needle` outside quotes and parentheses
fn find_top_level(input: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth -= 1,
                _ if depth == 0 && input[i..].starts_with(needle) => return Some(i),
                _ => {}
            },
        }
    }
    None
}

fn strip_outer_parens(mut input: &str) -> &str {
    while input.starts_with('(') && input.ends_with(')') && closes_at_end(input) {
        input = input[1..input.len() - 1].trim();
    }
    input
}

/// True when the opening paren at index 0 is matched by the final char
fn closes_at_end(input: &str) -> bool {
    let mut depth = 0i32;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == input.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_field_path(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
}
