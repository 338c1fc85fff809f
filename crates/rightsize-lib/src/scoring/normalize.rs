//! Range normalization shared by every score

/// Map `value` onto `[0, 1]` between `floor` and `ceiling`
///
/// Returns 0 for a degenerate range (`ceiling <= floor`) or at/below the floor,
/// 1 at/above the ceiling, and the linear interpolation in between. Never
/// fails and is non-decreasing in `value`.
pub fn normalize(value: f64, floor: f64, ceiling: f64) -> f64 {
    if ceiling <= floor || value <= floor {
        return 0.0;
    }
    if value >= ceiling {
        return 1.0;
    }
    (value - floor) / (ceiling - floor)
}
