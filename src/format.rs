/// Decimal places shown unless configured otherwise.
pub const DEFAULT_DIGITS: usize = 6;
pub const MAX_DIGITS: usize = 15;

/// Fixed-point rendering with trailing zeros (and a bare trailing point) removed.
pub fn format_number(value: f64, digits: usize) -> String {
    let number = trim_zeros(format!("{:.*}", digits, value));
    if number == "-0" {
        "0".to_owned()
    } else {
        number
    }
}

pub fn trim_zeros(mut number: String) -> String {
    if !number.contains('.') {
        return number;
    }
    let mut index = number.len();
    while index > 0 && number.as_bytes()[index - 1] == b'0' {
        index -= 1;
    }
    if index > 0 && number.as_bytes()[index - 1] == b'.' {
        index -= 1;
    }
    number.truncate(index);
    number
}
