use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::arith::{Calculator, MathError};

pub const DIGIT_LABELS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Every label the state machine accepts.
pub const LABELS: [&str; 25] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "+", "-", "*", "/", "%", "=", ".", "pi",
    "e", "sqrt", "a^n", "!", "C", "CE", "^",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown input '{0}'")]
    UnknownToken(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Sub => '-',
            BinaryOperator::Mul => '*',
            BinaryOperator::Div => '/',
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> Result<f64, MathError> {
        match self {
            BinaryOperator::Add => Ok(Calculator::add(lhs, rhs)),
            BinaryOperator::Sub => Ok(Calculator::sub(lhs, rhs)),
            BinaryOperator::Mul => Ok(Calculator::mul(lhs, rhs)),
            BinaryOperator::Div => Calculator::div(lhs, rhs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn label(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
        }
    }

    /// Decimal text substituted for the constant before an operand is parsed.
    pub fn expansion(self) -> &'static str {
        match self {
            Constant::Pi => "3.1415926535",
            Constant::E => "2.7182818284",
        }
    }
}

/// One keypress or button hit, decoded once at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Digit(u8),
    Decimal,
    Operator(BinaryOperator),
    Modulo,
    Power,
    Factorial,
    Root,
    Constant(Constant),
    Equals,
    Clear,
    ClearEntry,
}

impl Token {
    pub fn label(self) -> &'static str {
        match self {
            Token::Digit(d) => DIGIT_LABELS[usize::from(d.min(9))],
            Token::Decimal => ".",
            Token::Operator(BinaryOperator::Add) => "+",
            Token::Operator(BinaryOperator::Sub) => "-",
            Token::Operator(BinaryOperator::Mul) => "*",
            Token::Operator(BinaryOperator::Div) => "/",
            Token::Modulo => "%",
            Token::Power => "^",
            Token::Factorial => "!",
            Token::Root => "sqrt",
            Token::Constant(c) => c.label(),
            Token::Equals => "=",
            Token::Clear => "C",
            Token::ClearEntry => "CE",
        }
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let token = match label {
            "+" => Token::Operator(BinaryOperator::Add),
            "-" => Token::Operator(BinaryOperator::Sub),
            "*" => Token::Operator(BinaryOperator::Mul),
            "/" => Token::Operator(BinaryOperator::Div),
            "%" => Token::Modulo,
            "^" | "a^n" => Token::Power,
            "!" => Token::Factorial,
            "sqrt" => Token::Root,
            "pi" => Token::Constant(Constant::Pi),
            "e" => Token::Constant(Constant::E),
            "=" => Token::Equals,
            "." => Token::Decimal,
            "C" => Token::Clear,
            "CE" => Token::ClearEntry,
            _ => match label.as_bytes() {
                [d @ b'0'..=b'9'] => Token::Digit(d - b'0'),
                _ => return Err(TokenError::UnknownToken(label.to_owned())),
            },
        };
        Ok(token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
