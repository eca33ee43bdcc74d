use crate::arith::{Calculator, MathError};

/// Sample standard deviation using only the checked primitives.
///
/// Fewer than two values give 0.
pub fn sample_stddev(values: &[f64]) -> Result<f64, MathError> {
    let n = values.len();
    if n < 2 {
        return Ok(0.0);
    }

    let (sum, sum_squares) = values.iter().fold((0.0, 0.0), |(sum, squares), &x| {
        (
            Calculator::add(sum, x),
            Calculator::add(squares, Calculator::mul(x, x)),
        )
    });

    let count = n as f64;
    let mean = Calculator::div(sum, count)?;
    let variance = Calculator::div(
        Calculator::sub(sum_squares, Calculator::mul(count, Calculator::mul(mean, mean))),
        count - 1.0,
    )?;

    // Cancellation can leave a tiny negative variance for identical inputs.
    Calculator::root(variance.max(0.0), 2.0)
}
