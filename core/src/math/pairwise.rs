use crate::math::stats::StatsHelper;

/// Median of the slopes between every pair of points whose x values differ.
///
/// `days` and `values` are parallel slices sorted by `days`. Pairs sharing a
/// day are skipped. `scratch` is cleared and reused for the pairwise slopes so
/// callers can keep one allocation across windows. Returns `None` when no
/// usable pair exists.
pub fn median_pairwise_slope(days: &[i64], values: &[f64], scratch: &mut Vec<f64>) -> Option<f64> {
    scratch.clear();
    let n = days.len().min(values.len());
    for j in 0..n {
        for k in (j + 1)..n {
            let dt = days[k] - days[j];
            if dt > 0 {
                scratch.push((values[k] - values[j]) / dt as f64);
            }
        }
    }
    StatsHelper::median_in_place(scratch)
}

/// Index range of the points within `half_window` days of `days[center]`,
/// boundary inclusive. `days` must be ascending.
pub fn window_bounds(days: &[i64], center: usize, half_window: f64) -> (usize, usize) {
    let origin = days[center];
    let start = days.partition_point(|&d| ((origin - d) as f64) > half_window);
    let end = days.partition_point(|&d| ((d - origin) as f64) <= half_window);
    (start, end)
}
