//! Keypad calculator core.
//!
//! [`CalculatorSession`] turns keypresses into an editable expression and a
//! value line, [`calculate`] reduces a flat expression by fixed precedence,
//! and [`Calculator`] holds the checked arithmetic both of them use.

pub mod arith;
pub mod config;
pub mod eval;
pub mod format;
pub mod keymap;
pub mod selftest;
pub mod session;
pub mod stats;
pub mod token;

pub use arith::{Calculator, MathError};
pub use eval::calculate;
pub use format::format_number;
pub use session::{CalculatorSession, InputState};
pub use token::{BinaryOperator, Constant, Token, TokenError};
