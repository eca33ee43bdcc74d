//! The keypad state machine.
//!
//! A [`CalculatorSession`] consumes one [`Token`] at a time and keeps two
//! display lines up to date: the running expression and the current value.
//! Plain `+ - * /` chains are folded into a stored value as soon as the next
//! operator arrives. Power, modulo, factorial and root stay inside the operand
//! text and are handed to [`calculate`] when that operand is resolved.

use tracing::{debug, warn};

use crate::arith::MathError;
use crate::eval::calculate;
use crate::format::{format_number, DEFAULT_DIGITS, MAX_DIGITS};
use crate::token::{BinaryOperator, Constant, Token};

/// Shown in place of the value when an operand or operation fails.
pub const ERROR_TEXT: &str = "ERR";
/// Results closer to zero than this are shown as exactly zero after `=`.
pub const ZERO_SNAP: f64 = 1e-8;

/// Characters that keep an operand unevaluated until it is resolved.
const MARKERS: [char; 4] = ['^', '%', '!', 'r'];
/// Markers that still need a right-hand operand.
const INFIX_MARKERS: [char; 3] = ['^', '%', 'r'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Normal,
    /// Radicand known, the next digit is the degree.
    AwaitingRootDegreeFromNumber,
    /// `root(` pressed first, the next digit is the radicand.
    AwaitingRootDegreeBeforeValue,
}

#[derive(Debug, Clone)]
pub struct CalculatorSession {
    stored_value: f64,
    current_input: String,
    pending_operator: Option<BinaryOperator>,
    just_evaluated: bool,
    full_expression: String,
    current_value: String,
    state: InputState,
    // Where the operand being typed starts inside `full_expression`.
    operand_start: usize,
    root_operand: String,
    root_display: String,
    digits: usize,
}

impl Default for CalculatorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorSession {
    pub fn new() -> Self {
        Self::with_digits(DEFAULT_DIGITS)
    }

    /// A fresh session showing `digits` decimal places.
    pub fn with_digits(digits: usize) -> Self {
        CalculatorSession {
            stored_value: 0.0,
            current_input: String::new(),
            pending_operator: None,
            just_evaluated: false,
            full_expression: "0".to_owned(),
            current_value: "0".to_owned(),
            state: InputState::Normal,
            operand_start: 0,
            root_operand: String::new(),
            root_display: String::new(),
            digits: digits.min(MAX_DIGITS),
        }
    }

    pub fn full_expression(&self) -> &str {
        &self.full_expression
    }

    pub fn current_value(&self) -> &str {
        &self.current_value
    }

    pub fn stored_value(&self) -> f64 {
        self.stored_value
    }

    pub fn current_input(&self) -> &str {
        &self.current_input
    }

    pub fn pending_operator(&self) -> Option<BinaryOperator> {
        self.pending_operator
    }

    pub fn just_evaluated(&self) -> bool {
        self.just_evaluated
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    /// Changes the display precision. Already formatted text is left alone.
    pub fn set_digits(&mut self, digits: usize) {
        self.digits = digits.min(MAX_DIGITS);
    }

    /// Decodes a label and applies it. Labels outside the allow-list are
    /// logged and change nothing.
    pub fn process_input(&mut self, label: &str) {
        match label.parse::<Token>() {
            Ok(token) => self.apply(token),
            Err(err) => warn!(%err, "ignored invalid input"),
        }
    }

    pub fn apply(&mut self, token: Token) {
        debug!(%token, state = ?self.state, "input received");
        match token {
            Token::Clear => self.clear(),
            _ if self.state != InputState::Normal => self.root_step(token),
            Token::ClearEntry => self.clear_entry(),
            Token::Constant(constant) => self.push_constant(constant),
            Token::Operator(BinaryOperator::Sub) if self.starts_negative_operand() => {
                self.push_sign()
            }
            Token::Operator(op) => self.push_operator(op),
            Token::Equals => self.evaluate(),
            Token::Digit(d) => self.push_numeral(char::from(b'0' + d.min(9))),
            Token::Decimal => self.push_numeral('.'),
            Token::Power => self.push_marker('^'),
            Token::Modulo => self.push_marker('%'),
            Token::Factorial => self.push_marker('!'),
            Token::Root => self.begin_root(),
        }
        debug!(
            expression = %self.full_expression,
            value = %self.current_value,
            stored = self.stored_value,
            "display updated"
        );
    }

    fn clear(&mut self) {
        *self = Self::with_digits(self.digits);
    }

    fn clear_entry(&mut self) {
        if self.current_value.is_empty() {
            self.current_value = "0".to_owned();
        }
        self.full_expression = self.current_value.clone();
        self.current_input.clear();
        self.pending_operator = None;
        self.just_evaluated = true;
    }

    fn push_constant(&mut self, constant: Constant) {
        if self.just_evaluated {
            self.clear();
        }
        if self.full_expression == "0" {
            self.full_expression.clear();
        }
        if self.current_input.is_empty() {
            self.operand_start = self.full_expression.len();
        }
        self.current_input.push_str(constant.label());
        self.full_expression.push_str(constant.label());
        self.current_value = self.current_input.clone();
    }

    fn starts_negative_operand(&self) -> bool {
        if self.current_input.ends_with(INFIX_MARKERS) {
            return true;
        }
        self.current_input.is_empty()
            && (self.full_expression.is_empty()
                || self.full_expression == "0"
                || self.pending_operator.is_some())
    }

    fn push_sign(&mut self) {
        if self.full_expression == "0" {
            self.full_expression.clear();
        }
        if self.current_input.is_empty() {
            self.operand_start = self.full_expression.len();
        }
        self.current_input.push('-');
        self.full_expression.push('-');
        self.current_value = self.current_input.clone();
        self.just_evaluated = false;
    }

    fn push_operator(&mut self, op: BinaryOperator) {
        // A sign is the only way the input can end in `-`.
        if self.current_input.ends_with('-') {
            debug!("operator after a bare sign ignored");
            return;
        }
        if !self.current_input.is_empty() {
            let value = match self.combine() {
                Ok(value) => value,
                Err(err) => return self.fail(err),
            };
            self.stored_value = value;
            self.current_value = format_number(value, self.digits);
            self.current_input.clear();
        }

        if self.full_expression.ends_with(['+', '-', '*', '/']) {
            debug!("repeated operator ignored");
            return;
        }
        self.full_expression.push(op.symbol());
        self.pending_operator = Some(op);
        self.just_evaluated = false;
    }

    fn evaluate(&mut self) {
        if self.current_input.is_empty() || self.current_input.ends_with('-') {
            debug!("nothing to evaluate");
            return;
        }
        let value = match self.combine() {
            Ok(value) => value,
            Err(err) => return self.fail(err),
        };
        self.pending_operator = None;
        self.current_input.clear();

        self.stored_value = if value.abs() < ZERO_SNAP { 0.0 } else { value };
        self.current_value = format_number(self.stored_value, self.digits);
        self.full_expression = self.current_value.clone();
        self.just_evaluated = true;
    }

    fn push_numeral(&mut self, c: char) {
        if self.just_evaluated {
            self.clear();
        }
        if c == '.' && self.current_segment().contains('.') {
            debug!("second decimal point ignored");
            return;
        }

        let negative = self.current_input.starts_with('-');
        let placeholder = matches!(self.full_expression.as_str(), "0" | "-0");
        if c == '.' && (self.full_expression.is_empty() || placeholder) {
            self.full_expression = if negative { "-0." } else { "0." }.to_owned();
            self.operand_start = 0;
        } else if placeholder {
            self.full_expression = if negative {
                format!("-{}", c)
            } else {
                c.to_string()
            };
            self.operand_start = 0;
        } else {
            if self.current_input.is_empty() {
                self.operand_start = self.full_expression.len();
            }
            self.full_expression.push(c);
        }

        self.current_input.push(c);
        self.current_value = match resolve_constants(&self.current_input).parse::<f64>() {
            Ok(value) => format_number(value, self.digits),
            Err(_) => self.current_input.clone(),
        };
    }

    fn push_marker(&mut self, marker: char) {
        if self.just_evaluated {
            self.resume_from_result();
        }
        if !operand_complete(&self.current_input) {
            debug!(%marker, "operator needs an operand first");
            return;
        }
        self.current_input.push(marker);
        self.full_expression.push(marker);
        self.current_value = self.current_input.clone();
    }

    fn begin_root(&mut self) {
        if self.just_evaluated {
            self.resume_from_result();
        }

        if operand_complete(&self.current_input)
            && !self.current_input.contains(INFIX_MARKERS)
        {
            let start = self.operand_start.min(self.full_expression.len());
            self.root_display = self.full_expression.split_off(start);
            self.root_operand = std::mem::take(&mut self.current_input);
            self.full_expression.push_str("root(");
            self.current_value = self.root_display.clone();
            self.state = InputState::AwaitingRootDegreeFromNumber;
        } else if self.current_input.is_empty()
            || self.current_input.ends_with('-')
            || self.current_input.ends_with(INFIX_MARKERS)
        {
            if self.full_expression == "0" {
                self.full_expression.clear();
            }
            if self.current_input.is_empty() {
                self.operand_start = self.full_expression.len();
            }
            self.full_expression.push_str("root(");
            self.state = InputState::AwaitingRootDegreeBeforeValue;
        } else {
            debug!(input = %self.current_input, "root ignored");
        }
    }

    fn root_step(&mut self, token: Token) {
        let Token::Digit(d) = token else {
            debug!(%token, "ignored while awaiting a root operand");
            return;
        };
        let digit = char::from(b'0' + d.min(9));

        match self.state {
            InputState::AwaitingRootDegreeBeforeValue => {
                self.root_operand = digit.to_string();
                self.root_display = self.root_operand.clone();
                self.current_value = self.root_display.clone();
                self.state = InputState::AwaitingRootDegreeFromNumber;
            }
            InputState::AwaitingRootDegreeFromNumber => {
                let radicand = std::mem::take(&mut self.root_operand);
                let display = std::mem::take(&mut self.root_display);
                self.full_expression
                    .push_str(&format!("{},{})", digit, display));
                self.current_input
                    .push_str(&format!("{}r{}", radicand, digit));
                self.state = InputState::Normal;
                self.current_value = match resolve_operand(&self.current_input) {
                    Ok(value) => format_number(value, self.digits),
                    Err(_) => self.current_input.clone(),
                };
            }
            InputState::Normal => {}
        }
    }

    /// Continues editing from the displayed result instead of starting over.
    fn resume_from_result(&mut self) {
        if self.current_value == ERROR_TEXT {
            self.clear();
            return;
        }
        self.current_input = self.current_value.clone();
        self.full_expression = self.current_value.clone();
        self.operand_start = 0;
        self.pending_operator = None;
        self.just_evaluated = false;
    }

    /// Resolves the typed operand and folds it into the stored value.
    fn combine(&self) -> Result<f64, MathError> {
        let rhs = resolve_operand(&self.current_input)?;
        match self.pending_operator {
            None => Ok(rhs),
            Some(op) => op.apply(self.stored_value, rhs),
        }
    }

    fn fail(&mut self, err: MathError) {
        debug!(%err, input = %self.current_input, "evaluation failed");
        self.current_value = ERROR_TEXT.to_owned();
    }

    /// The numeric part of the operand after its last marker.
    fn current_segment(&self) -> &str {
        match self.current_input.rfind(MARKERS) {
            Some(i) => &self.current_input[i + 1..],
            None => &self.current_input,
        }
    }
}

/// Replaces `pi` and `e` with their decimal expansions.
pub fn resolve_constants(input: &str) -> String {
    input
        .replace(Constant::Pi.label(), Constant::Pi.expansion())
        .replace(Constant::E.label(), Constant::E.expansion())
}

/// Turns operand text into a number, evaluating embedded markers if present.
pub fn resolve_operand(input: &str) -> Result<f64, MathError> {
    let resolved = resolve_constants(input);
    match resolved.parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) if resolved.contains(MARKERS) => calculate(&resolved),
        Err(_) => Err(MathError::InvalidArgument(format!(
            "malformed number '{}'",
            input
        ))),
    }
}

fn operand_complete(input: &str) -> bool {
    input
        .chars()
        .last()
        .map_or(false, |c| c.is_ascii_digit() || matches!(c, '.' | 'i' | 'e' | '!'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(session: &mut CalculatorSession, labels: &[&str]) {
        for label in labels {
            session.process_input(label);
        }
    }

    fn run(labels: &[&str]) -> CalculatorSession {
        let mut session = CalculatorSession::new();
        feed(&mut session, labels);
        session
    }

    #[test]
    fn test_fresh_session_shows_zero() {
        let session = CalculatorSession::new();
        assert_eq!(session.full_expression(), "0");
        assert_eq!(session.current_value(), "0");
        assert_eq!(session.state(), InputState::Normal);
    }

    #[test]
    fn test_simple_addition() {
        let session = run(&["6", "+", "3", "="]);
        assert_eq!(session.current_value(), "9");
        assert_eq!(session.full_expression(), "9");
        assert!(session.just_evaluated());
        assert_eq!(session.pending_operator(), None);
        assert_eq!(session.current_input(), "");
    }

    #[test]
    fn test_history_line_while_typing() {
        let session = run(&["1", "2", "+", "3", "4"]);
        assert_eq!(session.full_expression(), "12+34");
        assert_eq!(session.current_value(), "34");
        assert_eq!(session.stored_value(), 12.0);
    }

    #[test]
    fn test_chain_folds_left_to_right() {
        let session = run(&["8", "-", "3", "-", "2", "="]);
        assert_eq!(session.current_value(), "3");
        let session = run(&["2", "+", "3", "*", "4", "="]);
        assert_eq!(session.current_value(), "20");
    }

    #[test]
    fn test_operator_shows_running_total() {
        let session = run(&["2", "+", "3", "*"]);
        assert_eq!(session.current_value(), "5");
        assert_eq!(session.full_expression(), "2+3*");
    }

    #[test]
    fn test_repeated_operator_blocked() {
        let session = run(&["5", "+", "+", "*"]);
        assert_eq!(session.full_expression(), "5+");
        assert_eq!(session.pending_operator(), Some(BinaryOperator::Add));
    }

    #[test]
    fn test_division_by_zero() {
        let session = run(&["5", "/", "0", "="]);
        assert_eq!(session.current_value(), ERROR_TEXT);
        assert_eq!(session.stored_value(), 5.0);
        assert_eq!(session.full_expression(), "5/0");
    }

    #[test]
    fn test_division_by_zero_on_operator() {
        let session = run(&["5", "/", "0", "+"]);
        assert_eq!(session.current_value(), ERROR_TEXT);
        assert_eq!(session.stored_value(), 5.0);
        assert_eq!(session.full_expression(), "5/0");
    }

    #[test]
    fn test_equals_twice_is_noop() {
        let mut session = run(&["7", "*", "6", "="]);
        assert_eq!(session.current_value(), "42");
        session.process_input("=");
        assert_eq!(session.current_value(), "42");
        assert_eq!(session.full_expression(), "42");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = run(&["7", "*", "6", "=", "+", "1"]);
        session.process_input("C");
        assert_eq!(session.full_expression(), "0");
        assert_eq!(session.current_value(), "0");
        assert_eq!(session.stored_value(), 0.0);
        assert_eq!(session.pending_operator(), None);
        assert!(!session.just_evaluated());
    }

    #[test]
    fn test_clear_entry_keeps_stored_value() {
        let session = run(&["5", "+", "3", "CE"]);
        assert_eq!(session.full_expression(), "3");
        assert_eq!(session.current_value(), "3");
        assert_eq!(session.stored_value(), 5.0);
        assert_eq!(session.pending_operator(), None);
        assert!(session.just_evaluated());
    }

    #[test]
    fn test_digit_after_result_starts_fresh() {
        let session = run(&["2", "+", "2", "=", "7"]);
        assert_eq!(session.full_expression(), "7");
        assert_eq!(session.current_value(), "7");
        assert_eq!(session.stored_value(), 0.0);
    }

    #[test]
    fn test_operator_after_result_continues() {
        let session = run(&["2", "+", "2", "=", "*", "3", "="]);
        assert_eq!(session.current_value(), "12");
    }

    #[test]
    fn test_leading_decimal_point() {
        let session = run(&[".", "5"]);
        assert_eq!(session.full_expression(), "0.5");
        assert_eq!(session.current_value(), "0.5");
        let session = run(&["-", ".", "5"]);
        assert_eq!(session.full_expression(), "-.5");
        assert_eq!(session.current_value(), "-0.5");
    }

    #[test]
    fn test_negative_zero_placeholder() {
        let session = run(&["-", "0", ".", "5"]);
        assert_eq!(session.full_expression(), "-0.5");
        assert_eq!(session.current_value(), "-0.5");
    }

    #[test]
    fn test_leading_zero_replaced() {
        let session = run(&["0", "7"]);
        assert_eq!(session.full_expression(), "7");
        assert_eq!(session.current_value(), "7");
    }

    #[test]
    fn test_second_decimal_point_ignored() {
        let session = run(&["1", ".", "2", ".", "3"]);
        assert_eq!(session.current_input(), "1.23");
        assert_eq!(session.current_value(), "1.23");
    }

    #[test]
    fn test_unary_minus_at_start() {
        let session = run(&["-", "5", "*", "2", "="]);
        assert_eq!(session.current_value(), "-10");
    }

    #[test]
    fn test_unary_minus_after_pending_operator() {
        let session = run(&["5", "+", "-", "3"]);
        assert_eq!(session.full_expression(), "5+-3");
        assert_eq!(session.current_value(), "-3");
        let session = run(&["5", "+", "-", "3", "="]);
        assert_eq!(session.current_value(), "2");
    }

    #[test]
    fn test_operator_after_bare_sign_ignored() {
        let session = run(&["5", "+", "-", "-", "*"]);
        assert_eq!(session.full_expression(), "5+-");
        assert_eq!(session.current_input(), "-");
        assert_eq!(session.current_value(), "-");
    }

    #[test]
    fn test_minus_after_result_is_binary() {
        let session = run(&["9", "=", "-", "4", "="]);
        assert_eq!(session.current_value(), "5");
    }

    #[test]
    fn test_pi_display_and_value() {
        let session = run(&["pi"]);
        assert_eq!(session.full_expression(), "pi");
        assert_eq!(session.current_value(), "pi");
        let session = run(&["pi", "*", "2", "="]);
        assert_eq!(session.current_value(), "6.283185");
    }

    #[test]
    fn test_constant_after_result_starts_fresh() {
        let session = run(&["2", "+", "2", "=", "e"]);
        assert_eq!(session.full_expression(), "e");
        assert_eq!(session.stored_value(), 0.0);
        let session = run(&["2", "+", "2", "=", "e", "+", "1", "="]);
        assert_eq!(session.current_value(), "3.718282");
    }

    #[test]
    fn test_negative_constant() {
        let session = run(&["-", "pi", "="]);
        assert_eq!(session.current_value(), "-3.141593");
    }

    #[test]
    fn test_power_and_factorial_markers() {
        let session = run(&["2", "^", "1", "0", "="]);
        assert_eq!(session.current_value(), "1024");
        let session = run(&["5", "!", "="]);
        assert_eq!(session.current_value(), "120");
        let session = run(&["1", "+", "3", "a^n", "2", "="]);
        assert_eq!(session.current_value(), "10");
    }

    #[test]
    fn test_modulo_marker() {
        let session = run(&["1", "0", "%", "3", "="]);
        assert_eq!(session.current_value(), "1");
        assert_eq!(session.full_expression(), "1");
    }

    #[test]
    fn test_negative_operand_after_marker() {
        let session = run(&["1", "0", "%", "-"]);
        assert_eq!(session.full_expression(), "10%-");
        assert_eq!(session.current_value(), "10%-");
        let session = run(&["1", "0", "%", "-", "3", "="]);
        assert_eq!(session.current_value(), "1");
        let session = run(&["2", "^", "-", "+", "="]);
        assert_eq!(session.full_expression(), "2^-");
        assert_ne!(session.current_value(), ERROR_TEXT);
    }

    #[test]
    fn test_marker_needs_operand() {
        let session = run(&["^"]);
        assert_eq!(session.full_expression(), "0");
        let session = run(&["2", "^", "^"]);
        assert_eq!(session.full_expression(), "2^");
    }

    #[test]
    fn test_marker_after_result_continues() {
        let session = run(&["3", "=", "!", "="]);
        assert_eq!(session.current_value(), "6");
    }

    #[test]
    fn test_invalid_factorial_shows_error() {
        let session = run(&["2", ".", "5", "!", "="]);
        assert_eq!(session.current_value(), ERROR_TEXT);
        assert_eq!(session.full_expression(), "2.5!");
    }

    #[test]
    fn test_root_after_number() {
        let mut session = run(&["9", "sqrt"]);
        assert_eq!(session.state(), InputState::AwaitingRootDegreeFromNumber);
        assert_eq!(session.full_expression(), "root(");
        session.process_input("2");
        assert_eq!(session.state(), InputState::Normal);
        assert_eq!(session.full_expression(), "root(2,9)");
        assert_eq!(session.current_value(), "3");
        session.process_input("=");
        assert_eq!(session.current_value(), "3");
    }

    #[test]
    fn test_root_before_value() {
        let mut session = run(&["1", "+", "sqrt"]);
        assert_eq!(session.state(), InputState::AwaitingRootDegreeBeforeValue);
        assert_eq!(session.full_expression(), "1+root(");
        feed(&mut session, &["8", "3"]);
        assert_eq!(session.full_expression(), "1+root(3,8)");
        session.process_input("=");
        assert_eq!(session.current_value(), "3");
    }

    #[test]
    fn test_root_ignores_non_digits_until_complete() {
        let mut session = run(&["1", "6", "sqrt", "+", "pi", "="]);
        assert_eq!(session.state(), InputState::AwaitingRootDegreeFromNumber);
        session.process_input("4");
        assert_eq!(session.full_expression(), "root(4,16)");
        assert_eq!(session.current_value(), "2");
    }

    #[test]
    fn test_root_of_factorial() {
        let session = run(&["3", "!", "sqrt", "2"]);
        assert_eq!(session.full_expression(), "root(2,3!)");
        assert_eq!(session.current_input(), "3!r2");
        let session = run(&["3", "!", "sqrt", "2", "="]);
        assert_eq!(session.current_value(), "2.44949");
    }

    #[test]
    fn test_root_of_tiny_radicand() {
        let session = run(&[
            "0", ".", "0", "0", "0", "0", "0", "0", "0", "0", "0", "1", "sqrt", "9", "=",
        ]);
        assert_eq!(session.current_value(), "0.077426");
    }

    #[test]
    fn test_clear_leaves_root_state() {
        let session = run(&["sqrt", "C"]);
        assert_eq!(session.state(), InputState::Normal);
        assert_eq!(session.full_expression(), "0");
    }

    #[test]
    fn test_even_root_of_negative_is_error() {
        let session = run(&["-", "4", "sqrt", "2", "="]);
        assert_eq!(session.current_value(), ERROR_TEXT);
    }

    #[test]
    fn test_unknown_input_changes_nothing() {
        let mut session = run(&["4", "+"]);
        let before = session.clone();
        for label in ["x", "", "sin", "10", "ce"] {
            session.process_input(label);
        }
        assert_eq!(session.full_expression(), before.full_expression());
        assert_eq!(session.current_value(), before.current_value());
        assert_eq!(session.current_input(), before.current_input());
        assert_eq!(session.stored_value(), before.stored_value());
    }

    #[test]
    fn test_tiny_result_snaps_to_zero() {
        let session = run(&["0", ".", "1", "+", "0", ".", "2", "-", "0", ".", "3", "="]);
        assert_eq!(session.current_value(), "0");
        assert_eq!(session.stored_value(), 0.0);
    }

    #[test]
    fn test_digits_setting() {
        let mut session = CalculatorSession::with_digits(2);
        feed(&mut session, &["2", "/", "3", "="]);
        assert_eq!(session.current_value(), "0.67");
        session.set_digits(99);
        assert_eq!(session.digits(), MAX_DIGITS);
    }

    #[test]
    fn test_resolve_operand() {
        assert_eq!(resolve_operand("12.5"), Ok(12.5));
        assert_eq!(resolve_operand("-pi"), Ok(-3.1415926535));
        assert_eq!(resolve_operand("3!"), Ok(6.0));
        assert!(matches!(
            resolve_operand("pipi"),
            Err(MathError::InvalidArgument(_))
        ));
    }
}
