pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max<T: PartialOrd + Copy>(values: &[T]) -> Option<(T, T)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }

    /// Rounds half away from zero to `decimals` places.
    pub fn round_to(value: f64, decimals: i32) -> f64 {
        let scale = 10f64.powi(decimals);
        (value * scale).round() / scale
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;

    #[test]
    fn mean_works() {
        let m = Statistics::mean(&[1.0, 2.0, 3.0]).unwrap();
        assert!((m - 2.0).abs() < 1e-9);
        assert!(Statistics::mean(&[]).is_none());
    }

    #[test]
    fn min_max_over_integers() {
        assert_eq!(Statistics::min_max(&[2019, 2004, 2023]), Some((2004, 2023)));
    }

    #[test]
    fn rounding() {
        assert_eq!(Statistics::round_to(12.345, 1), 12.3);
        assert_eq!(Statistics::round_to(1234.5, 0), 1235.0);
    }
}
