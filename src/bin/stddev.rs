//! Reads numbers from stdin and prints their sample standard deviation.
//!
//! Input ends at EOF or at a lone `e` / `end` token.

use std::io::{self, Read};

use keycalc::format::format_number;
use keycalc::stats::sample_stddev;
use tracing::warn;

/// Decimal places in the printed result.
const STDDEV_DIGITS: usize = 4;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let values = read_values(&input);
    let stddev = sample_stddev(&values)?;
    println!("{}", format_number(stddev, STDDEV_DIGITS));
    Ok(())
}

fn read_values(input: &str) -> Vec<f64> {
    input
        .split_whitespace()
        .take_while(|token| !matches!(*token, "e" | "end"))
        .filter_map(|token| match token.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%token, "invalid input skipped");
                None
            }
        })
        .collect()
}
