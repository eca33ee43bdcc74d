use colored::Colorize;

use crate::config::{paint, Colours};
use crate::keymap::split_line;
use crate::session::CalculatorSession;

/// (keys typed, expected value line). Each row starts from a cleared session.
pub const CASES: [(&str, &str); 24] = [
    ("6+3=", "9"),
    ("5/0=", "ERR"),
    ("7*6==", "42"),
    ("8-3-2=", "3"),
    ("2+3*4=", "20"),
    ("-5*-2=", "10"),
    ("5+-3=", "2"),
    ("0.1+0.2=", "0.3"),
    (".5", "0.5"),
    ("1.2.3", "1.23"),
    ("2/3=", "0.666667"),
    ("p*2=", "6.283185"),
    ("-e=", "-2.718282"),
    ("2^10=", "1024"),
    ("3[3=", "27"),
    ("5!=", "120"),
    ("5]+1=", "121"),
    ("10%3=", "1"),
    ("9r2", "3"),
    ("r83=", "2"),
    ("-4r2=", "ERR"),
    ("2.5!=", "ERR"),
    ("4+5 CE", "5"),
    ("12+34 C", "0"),
];

/// Runs every case, printing each result, and returns `(passed, total)`.
pub fn run_tests(colours: &Colours, digits: usize) -> (usize, usize) {
    let mut passed = 0;
    let total = CASES.len();

    for (keys, expected) in CASES {
        println!("> {}", keys);

        let mut session = CalculatorSession::with_digits(digits);
        for label in split_line(keys) {
            session.process_input(&label);
        }
        let result = session.current_value();
        println!("{}", paint(session.full_expression(), colours.expression));
        println!("{}", paint(result, colours.value));

        if result == expected {
            println!("{}", "Pass!".truecolor(colours.pass.0, colours.pass.1, colours.pass.2));
            passed += 1;
        } else {
            println!("{}", "fail!".truecolor(colours.fail.0, colours.fail.1, colours.fail.2));
            println!("Expected: '{}'", expected);
            println!("Got     : '{}'", result);
        }

        println!();
    }

    (passed, total)
}
