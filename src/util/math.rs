//! Scalar helpers shared by decoding and mask projection.

/// Logistic function.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Returns `Some(side)` when `n == side * side`.
pub(crate) fn exact_sqrt(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let mut side = (n as f64).sqrt() as usize;
    // Float rounding can land one off for large inputs.
    while side * side > n {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= n {
        side += 1;
    }
    (side * side == n).then_some(side)
}

/// Index and value of the first maximum; NaN entries never win.
pub(crate) fn argmax<I>(values: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = f32>,
{
    let mut best: Option<(usize, f32)> = None;
    for (idx, value) in values.into_iter().enumerate() {
        match best {
            Some((_, best_value)) if !(value > best_value) => {}
            None if value.is_nan() => {}
            _ => best = Some((idx, value)),
        }
    }
    best
}
