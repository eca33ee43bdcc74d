//! Expression reduction over two flat buffers.
//!
//! An expression such as `2+3*4!` is scanned once into an operand list and an
//! operator list. The buffers are then collapsed one operator at a time,
//! always picking the rightmost occurrence of the strongest operator left.
//! There is no tree and no recursion; parentheses are not part of the grammar.

use std::f64::consts::{E, PI};

use tracing::debug;

use crate::arith::{Calculator, MathError};

/// Operator characters understood by [`calculate`]. `r` is the n-th root.
pub const OPERATORS: [char; 8] = ['+', '-', '*', '/', '%', '^', 'r', '!'];

/// Strongest first. Each character is its own tier.
const PRECEDENCE: [char; 8] = ['!', 'r', '^', '%', '/', '*', '-', '+'];

pub fn is_operator(c: char) -> bool {
    OPERATORS.contains(&c)
}

/// Evaluates a flat arithmetic expression.
///
/// `a r b` is the `b`-th root of `a`, so `9r2` is 3. `!` is postfix. A `-`
/// directly after another operator (or at the very start) is a sign, so
/// `3*-2` is -6. Operands containing `pi` or `e` stand for those constants.
pub fn calculate(expr: &str) -> Result<f64, MathError> {
    if expr.trim().is_empty() {
        return Ok(0.0);
    }
    let buffer = ExpressionBuffer::scan(expr)?;
    debug!(
        operands = ?buffer.operands,
        operators = ?buffer.operators,
        "scanned expression"
    );
    buffer.reduce()
}

#[derive(Debug, Default)]
struct ExpressionBuffer {
    operands: Vec<f64>,
    operators: Vec<char>,
}

impl ExpressionBuffer {
    fn scan(expr: &str) -> Result<Self, MathError> {
        let mut buffer = Self::default();
        let mut literal = String::new();
        let mut previous: Option<char> = None;

        for c in expr.chars().filter(|c| !c.is_whitespace()) {
            if !is_operator(c) {
                literal.push(c);
                previous = Some(c);
                continue;
            }

            let after_operator = previous.map_or(true, |p| is_operator(p) && p != '!');
            if c == '-' && literal.is_empty() && after_operator {
                literal.push(c);
            } else if !literal.is_empty() {
                buffer.operands.push(parse_literal(&literal)?);
                literal.clear();
                buffer.operators.push(c);
            } else if after_operator {
                return Err(malformed(expr, "operator without a left operand"));
            } else {
                // Only reachable straight after a factorial.
                buffer.operators.push(c);
            }
            previous = Some(c);
        }

        if !literal.is_empty() {
            buffer.operands.push(parse_literal(&literal)?);
        } else if previous != Some('!') {
            return Err(malformed(expr, "dangling operator"));
        }

        let binary = buffer.operators.iter().filter(|&&op| op != '!').count();
        if buffer.operands.len() != binary + 1 {
            return Err(malformed(expr, "operands and operators do not pair up"));
        }
        Ok(buffer)
    }

    /// Index of the operand an operator at `position` applies to (its left side).
    fn operand_index(&self, position: usize) -> usize {
        let factorials = self.operators[..position]
            .iter()
            .filter(|&&op| op == '!')
            .count();
        position - factorials
    }

    fn reduce(mut self) -> Result<f64, MathError> {
        for &tier in PRECEDENCE.iter() {
            while let Some(position) = self.operators.iter().rposition(|&op| op == tier) {
                let at = self.operand_index(position);
                if tier == '!' {
                    self.operands[at] = Calculator::fact(self.operands[at])?;
                } else {
                    let rhs = self.operands.remove(at + 1);
                    self.operands[at] = apply(tier, self.operands[at], rhs)?;
                }
                self.operators.remove(position);
            }
        }

        match self.operands.as_slice() {
            [value] => Ok(*value),
            _ => Err(MathError::InvalidArgument(
                "expression did not reduce to a single value".to_owned(),
            )),
        }
    }
}

fn apply(op: char, lhs: f64, rhs: f64) -> Result<f64, MathError> {
    match op {
        'r' => Calculator::root(lhs, rhs),
        '^' => Calculator::power(lhs, rhs),
        '%' => Calculator::modulo(lhs, rhs),
        '/' => Calculator::div(lhs, rhs),
        '*' => Ok(Calculator::mul(lhs, rhs)),
        '-' => Ok(Calculator::sub(lhs, rhs)),
        '+' => Ok(Calculator::add(lhs, rhs)),
        _ => Err(MathError::InvalidArgument(format!("unknown operator '{}'", op))),
    }
}

fn parse_literal(literal: &str) -> Result<f64, MathError> {
    let sign = if literal.starts_with('-') { -1.0 } else { 1.0 };
    if literal.contains("pi") {
        return Ok(sign * PI);
    }
    if literal.contains('e') {
        return Ok(sign * E);
    }
    literal
        .parse::<f64>()
        .map_err(|_| MathError::InvalidArgument(format!("malformed number '{}'", literal)))
}

fn malformed(expr: &str, reason: &str) -> MathError {
    MathError::InvalidArgument(format!("{} in '{}'", reason, expr))
}
