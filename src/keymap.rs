//! Keyboard to token-label mapping for the terminal front ends.

use termion::event::Key;

use crate::token::DIGIT_LABELS;

/// Labels longer than one character, matched greedily before single keys.
const WORDS: [&str; 4] = ["sqrt", "a^n", "CE", "pi"];

/// Maps a typed character to its label, the way the keypad shortcuts work.
pub fn label_for_char(c: char) -> Option<&'static str> {
    let label = match c {
        '0'..='9' => DIGIT_LABELS[c as usize - '0' as usize],
        '+' => "+",
        '-' => "-",
        '*' => "*",
        '/' => "/",
        '%' => "%",
        '^' => "^",
        '!' | ']' => "!",
        '=' | '\n' | '\r' => "=",
        '.' | ',' => ".",
        '[' => "a^n",
        'r' | 'R' => "sqrt",
        'p' | 'P' => "pi",
        'e' | 'E' => "e",
        'c' | 'C' => "C",
        _ => return None,
    };
    Some(label)
}

/// Keypad mode: Backspace clears the entry, Delete clears everything.
pub fn label_for_key(key: Key) -> Option<&'static str> {
    match key {
        Key::Backspace => Some("CE"),
        Key::Delete => Some("C"),
        Key::Char(c) => label_for_char(c),
        _ => None,
    }
}

/// Splits a typed line into labels. Unmapped characters are passed through
/// as-is so the session can log and reject them.
pub fn split_line(line: &str) -> Vec<String> {
    let mut labels = Vec::new();
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if let Some(word) = WORDS.iter().find(|word| rest.starts_with(**word)) {
            labels.push((*word).to_owned());
            rest = &rest[word.len()..];
            continue;
        }
        match label_for_char(c) {
            Some(label) => labels.push(label.to_owned()),
            None => labels.push(c.to_string()),
        }
        rest = &rest[c.len_utf8()..];
    }

    labels
}
