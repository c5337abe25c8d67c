//! Approximate float comparisons

/// `a` and `b` differ by at most `epsilon`
pub fn compare_abs(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// `a` and `b` differ by at most `epsilon` times the larger magnitude
pub fn compare_rel(a: f64, b: f64, epsilon: f64) -> bool {
    let diff = (a - b).abs();
    let largest = a.abs().max(b.abs());
    diff <= largest * epsilon
}
