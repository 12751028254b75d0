//! Value scaling helpers for adapters

/// Linearly map `x` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// `x` is clamped to the input range first, so the result never leaves the
/// output range. An empty input range (`in_min == in_max`) maps to `out_min`.
pub fn map(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max == in_min {
        return out_min;
    }
    let x = x.min(in_max).max(in_min);
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_clamps_and_scales() {
        assert_eq!(map(150.0, 0.0, 100.0, 0.0, 1.0), 1.0);
        assert_eq!(map(-10.0, 0.0, 100.0, 0.0, 10.0), 0.0);
        assert_eq!(map(50.0, 0.0, 100.0, 0.0, 10.0), 5.0);
    }

    #[test]
    fn test_map_inverted_output() {
        assert_eq!(map(0.0, 0.0, 1023.0, 255.0, 0.0), 255.0);
        assert_eq!(map(1023.0, 0.0, 1023.0, 255.0, 0.0), 0.0);
    }

    #[test]
    fn test_map_empty_input_range() {
        assert_eq!(map(3.0, 5.0, 5.0, 0.0, 10.0), 0.0);
        assert!(!map(5.0, 5.0, 5.0, 2.0, 10.0).is_nan());
    }
}
