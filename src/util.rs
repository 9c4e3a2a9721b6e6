use std::cmp::Ordering;

// Linear remap of val from [in_low, in_high] onto [out_low, out_high], clamped on both ends.
// A zero-width input range has no meaningful position, so it lands on the middle of the output range.
pub fn remap_value_clamped(val: f64, in_low: f64, in_high: f64, out_low: f64, out_high: f64) -> f64 {
    if in_high <= in_low {
        return (out_low + out_high) / 2.0;
    }

    let clamped_val = val.clamp(in_low, in_high);

    let interpolated = (clamped_val - in_low) / (in_high - in_low);
    let clamped = interpolated.clamp(0.0, 1.0);

    clamped * out_high + (1.0 - clamped) * out_low
}

// Sorts descending and sums the first `bucket_size` entries.
pub fn sum_of_nth_best(mut vec: Vec<f64>, bucket_size: usize) -> f64 {
    vec.sort_by(descending);
    vec.iter().take(bucket_size).sum()
}

// The nth highest value (1-based). With fewer than n values we fall back to the lowest one.
pub fn nth_highest<T, F>(items: &[T], n: usize, var: F) -> f64
where
    F: Fn(&T) -> f64,
{
    let mut var_vec: Vec<f64> = items.iter().map(var).collect();
    if var_vec.is_empty() {
        return 0.0;
    }

    var_vec.sort_by(descending);
    var_vec[n.clamp(1, var_vec.len()) - 1]
}

// x / reference capped at 1. A non-positive reference saturates any positive value.
pub fn normalize_to_reference(x: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        f64::min(x / reference, 1.0)
    } else if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

// Expects an input between 0.0 and 1.0 inclusive. Curves the results out, simply meaning worse results become less worse
// 0.1 => 0.5 | 0.2 => 0.6 | 0.5 => 0.75 | 0.8 => 0.9
pub fn curve_function(x: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&x));
    1.0 / (1.0 + f64::abs(f64::log10(x)))
}

// Two distinct mutable borrows into the same slice.
pub fn pair_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b, "pair_mut needs two distinct indices");

    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn descending(a: &f64, b: &f64) -> Ordering {
    b.partial_cmp(a).unwrap_or(Ordering::Equal)
}
