use ndarray::ArrayView2;

/// Summary of the finite cells of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub finite: usize,
    pub non_finite: usize,
}

impl FieldStats {
    /// `None` when the field has no finite cell.
    pub fn of(field: ArrayView2<f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut finite = 0usize;
        for &value in field.iter().filter(|v| v.is_finite()) {
            min = min.min(value);
            max = max.max(value);
            sum += value;
            finite += 1;
        }
        if finite == 0 {
            return None;
        }
        Some(Self {
            min,
            max,
            mean: sum / finite as f64,
            finite,
            non_finite: field.len() - finite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn ignores_non_finite_cells() {
        let field = array![[1.0, f64::NAN], [3.0, f64::INFINITY]];
        let stats = FieldStats::of(field.view()).unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.finite, 2);
        assert_eq!(stats.non_finite, 2);
    }

    #[test]
    fn empty_or_all_nan_has_no_stats() {
        assert!(FieldStats::of(array![[f64::NAN]].view()).is_none());
        assert!(FieldStats::of(ndarray::Array2::<f64>::zeros((0, 3)).view()).is_none());
    }
}
