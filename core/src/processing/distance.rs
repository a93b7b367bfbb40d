use ndarray::{Array1, Array2, ArrayView2};

use crate::geo::Grid;

/// Per-pixel `10 * ln(x² + y²)` of the distance from the grid centre.
///
/// `x`/`y` are pixel-centre offsets in the grid's unit (kilometres for the
/// signal processor). Grids with an odd column and row count have a pixel
/// exactly at the centre, where the value is `-inf`; nothing is clamped.
#[derive(Debug, Clone)]
pub struct DistanceField {
    values: Array2<f64>,
}

impl DistanceField {
    pub fn compute(grid: &Grid) -> Self {
        let x = centred_axis(grid.cols, grid.pixel_width);
        let y = centred_axis(grid.rows, grid.pixel_height);
        let values = Array2::from_shape_fn(grid.shape(), |(row, col)| {
            10.0 * (x[col] * x[col] + y[row] * y[row]).ln()
        });
        Self { values }
    }

    pub fn values(&self) -> ArrayView2<f64> {
        self.values.view()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }
}

fn centred_axis(len: usize, pixel: f64) -> Array1<f64> {
    let half = len as f64 / 2.0;
    Array1::from_shape_fn(len, |i| pixel * (i as f64 - half + 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(cols: usize, rows: usize, pixel_km: f64) -> Grid {
        Grid {
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_width: pixel_km,
            pixel_height: -pixel_km,
            cols,
            rows,
        }
    }

    #[test]
    fn even_grid_is_finite_and_symmetric() {
        let field = DistanceField::compute(&grid(4, 2, 1.0));
        let values = field.values();
        assert_eq!(field.shape(), (2, 4));
        assert!(values.iter().all(|v| v.is_finite()));
        assert_relative_eq!(values[[0, 1]], 10.0 * 0.5f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(values[[0, 0]], 10.0 * 2.5f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(values[[0, 0]], values[[1, 3]], epsilon = 1e-12);
    }

    #[test]
    fn odd_grid_centre_is_negative_infinity() {
        let field = DistanceField::compute(&grid(3, 3, 2.0));
        let values = field.values();
        assert_eq!(values[[1, 1]], f64::NEG_INFINITY);
        assert_eq!(values.iter().filter(|v| !v.is_finite()).count(), 1);
        assert_relative_eq!(values[[1, 0]], 10.0 * 4.0f64.ln(), epsilon = 1e-12);
    }
}
