//! Streaming two-dimensional binning.
//!
//! [`Binning2D`] routes scattered `(x, y, z)` samples into the cells of a
//! rectangular grid and keeps one [`Accumulators`] per cell. Two routing
//! schemes are available: nearest-cell ("simple") binning, and linear
//! binning, which spreads each sample over the four surrounding cells with
//! bilinear weights. When the instance carries a geodetic [`System`], the
//! latitude share of the linear weights uses spherical sub-cell areas
//! instead of planar fractions.

use crate::axis::{Axis, Coordinate};
use crate::descriptive::Accumulators;
use crate::error::{Error, Result};
use crate::geodetic::System;
use crate::parallel;
use ndarray::Array2;

/// Streaming 2-D aggregation of scattered samples.
#[derive(Clone, Debug)]
pub struct Binning2D {
    x: Axis,
    y: Axis,
    acc: Array2<Accumulators>,
    system: Option<System>,
}

impl Binning2D {
    /// Creates an empty binning over the cells of the given axes. With a
    /// geodetic `system`, linear binning weighs the latitude split by
    /// spherical areas.
    #[must_use]
    pub fn new(x: Axis, y: Axis, system: Option<System>) -> Self {
        let acc = Array2::from_elem((x.len(), y.len()), Accumulators::new());
        Self { x, y, acc, system }
    }

    /// X axis.
    #[must_use]
    pub fn x(&self) -> &Axis {
        &self.x
    }

    /// Y axis.
    #[must_use]
    pub fn y(&self) -> &Axis {
        &self.y
    }

    /// Resets every cell.
    pub fn clear(&mut self) {
        self.acc.fill(Accumulators::new());
    }

    /// Pushes a batch of samples. NaN values are skipped and samples
    /// outside the axes' domains are dropped. With `simple` set each sample
    /// goes to its nearest cell; otherwise it is spread over the four
    /// surrounding cells with (geodetically weighted) bilinear fractions.
    ///
    /// Workers aggregate into private cell matrices which are merged after
    /// the join, in worker order; for a bit-reproducible result across runs
    /// keep `num_threads` fixed (or 1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] when the coordinate and value vectors
    /// have mismatched lengths.
    pub fn push(
        &mut self,
        x: &[f64],
        y: &[f64],
        z: &[f64],
        simple: bool,
        num_threads: usize,
    ) -> Result<()> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(Error::InvalidShape(format!(
                "coordinate vectors have mismatched lengths [{}, {}, {}]",
                x.len(),
                y.len(),
                z.len()
            )));
        }

        let shape = self.acc.dim();
        let states = parallel::fold(x.len(), num_threads, |range| {
            let mut local = Array2::from_elem(shape, Accumulators::new());
            for idx in range {
                if z[idx].is_nan() {
                    continue;
                }
                if simple {
                    self.push_simple(&mut local, x[idx], y[idx], z[idx]);
                } else {
                    self.push_linear(&mut local, x[idx], y[idx], z[idx]);
                }
            }
            Ok(local)
        })?;

        for state in states {
            for (acc, local) in self.acc.iter_mut().zip(state.iter()) {
                acc.merge(local);
            }
        }
        Ok(())
    }

    fn push_simple(&self, local: &mut Array2<Accumulators>, x: f64, y: f64, z: f64) {
        let (Some(i), Some(j)) = (self.x.find_index(x, false), self.y.find_index(y, false))
        else {
            return;
        };
        local[[i, j]].push(z);
    }

    fn push_linear(&self, local: &mut Array2<Accumulators>, x: f64, y: f64, z: f64) {
        let (Some((i0, i1)), Some((j0, j1))) = (self.x.find_indexes(x), self.y.find_indexes(y))
        else {
            return;
        };
        let tx = Coordinate::lerp_fraction(&self.x, x, i0, i1);
        let ty = self.latitude_fraction(y, j0, j1);

        // cells with no share of the sample are left untouched, so node
        // hits do not inflate the neighbor counts
        let mut deposit = |i: usize, j: usize, weight: f64| {
            if weight > 0.0 {
                local[[i, j]].push_weighted(z, weight);
            }
        };
        deposit(i0, j0, (1.0 - tx) * (1.0 - ty));
        deposit(i1, j0, tx * (1.0 - ty));
        deposit(i0, j1, (1.0 - tx) * ty);
        deposit(i1, j1, tx * ty);
    }

    /// Position of `y` within its bracket as a weight fraction: planar by
    /// default, spherical-area based when a geodetic system is attached.
    fn latitude_fraction(&self, y: f64, j0: usize, j1: usize) -> f64 {
        if j0 == j1 {
            return 0.0;
        }
        if self.system.is_some() {
            let sin0 = self.y.coordinate_value(j0).to_radians().sin();
            let sin1 = self.y.coordinate_value(j1).to_radians().sin();
            if sin1 != sin0 {
                return (y.to_radians().sin() - sin0) / (sin1 - sin0);
            }
        }
        Coordinate::lerp_fraction(&self.y, y, j0, j1)
    }

    /// Merges the cells of `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the axes differ.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.x != other.x || self.y != other.y {
            return Err(Error::InvalidArgument(
                "cannot merge binnings defined on different axes".to_string(),
            ));
        }
        for (acc, rhs) in self.acc.iter_mut().zip(other.acc.iter()) {
            acc.merge(rhs);
        }
        Ok(())
    }

    fn statistic(&self, f: impl Fn(&Accumulators) -> f64) -> Array2<f64> {
        self.acc.map(|acc| f(acc))
    }

    /// Number of samples per cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn count(&self) -> Array2<f64> {
        self.statistic(|acc| acc.count() as f64)
    }

    /// Sum of the sample weights per cell.
    #[must_use]
    pub fn sum_of_weights(&self) -> Array2<f64> {
        self.statistic(Accumulators::sum_of_weights)
    }

    /// Weighted sum per cell.
    #[must_use]
    pub fn sum(&self) -> Array2<f64> {
        self.statistic(Accumulators::sum)
    }

    /// Weighted mean per cell.
    #[must_use]
    pub fn mean(&self) -> Array2<f64> {
        self.statistic(Accumulators::mean)
    }

    /// Smallest sample per cell.
    #[must_use]
    pub fn min(&self) -> Array2<f64> {
        self.statistic(Accumulators::min)
    }

    /// Largest sample per cell.
    #[must_use]
    pub fn max(&self) -> Array2<f64> {
        self.statistic(Accumulators::max)
    }

    /// Weighted variance per cell with `ddof` delta degrees of freedom.
    #[must_use]
    pub fn variance(&self, ddof: f64) -> Array2<f64> {
        self.statistic(|acc| acc.variance(ddof))
    }

    /// Weighted skewness per cell.
    #[must_use]
    pub fn skewness(&self) -> Array2<f64> {
        self.statistic(Accumulators::skewness)
    }

    /// Weighted excess kurtosis per cell.
    #[must_use]
    pub fn kurtosis(&self) -> Array2<f64> {
        self.statistic(Accumulators::kurtosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn axes() -> (Axis, Axis) {
        (
            Axis::new(&[0.0, 1.0, 2.0, 3.0], false).unwrap(),
            Axis::new(&[0.0, 1.0, 2.0], false).unwrap(),
        )
    }

    #[test]
    fn simple_binning_routes_to_the_nearest_cell() {
        let (x, y) = axes();
        let mut binning = Binning2D::new(x, y, None);

        binning
            .push(
                &[0.1, 0.4, 2.9, 5.0, 1.0],
                &[0.1, 0.2, 1.8, 1.0, f64::NAN],
                &[10.0, 20.0, 30.0, 40.0, 50.0],
                true,
                1,
            )
            .unwrap();

        let count = binning.count();
        // the out-of-domain x = 5.0 sample is dropped; a NaN y has no cell
        assert_eq!(count[[0, 0]], 2.0);
        assert_eq!(count[[3, 2]], 1.0);
        assert_eq!(count.sum(), 3.0);

        let mean = binning.mean();
        assert_approx_eq!(f64, mean[[0, 0]], 15.0, epsilon = 1e-12);
        assert_approx_eq!(f64, mean[[3, 2]], 30.0, epsilon = 1e-12);
    }

    #[test]
    fn nan_values_are_skipped() {
        let (x, y) = axes();
        let mut binning = Binning2D::new(x, y, None);

        binning
            .push(&[1.0], &[1.0], &[f64::NAN], true, 1)
            .unwrap();
        assert_eq!(binning.count().sum(), 0.0);
    }

    #[test]
    fn linear_binning_spreads_the_weight() {
        let (x, y) = axes();
        let mut binning = Binning2D::new(x, y, None);

        binning.push(&[0.5], &[0.5], &[8.0], false, 1).unwrap();

        let weights = binning.sum_of_weights();
        assert_approx_eq!(f64, weights[[0, 0]], 0.25, epsilon = 1e-12);
        assert_approx_eq!(f64, weights[[1, 0]], 0.25, epsilon = 1e-12);
        assert_approx_eq!(f64, weights[[0, 1]], 0.25, epsilon = 1e-12);
        assert_approx_eq!(f64, weights[[1, 1]], 0.25, epsilon = 1e-12);
        assert_approx_eq!(f64, weights.sum(), 1.0, epsilon = 1e-12);

        // every touched cell sees the sample value
        let mean = binning.mean();
        assert_approx_eq!(f64, mean[[0, 0]], 8.0, epsilon = 1e-12);
        assert_approx_eq!(f64, mean[[1, 1]], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_binning_on_a_node_is_exact() {
        let (x, y) = axes();
        let mut binning = Binning2D::new(x, y, None);

        binning.push(&[1.0], &[1.0], &[3.0], false, 1).unwrap();

        let weights = binning.sum_of_weights();
        assert_approx_eq!(f64, weights[[1, 1]], 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, weights.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn circular_x_axis_wraps_samples() {
        let lon_values: Vec<f64> = (0..360).map(f64::from).collect();
        let lon = Axis::new(&lon_values, true).unwrap();
        let lat = Axis::new(&[-1.0, 0.0, 1.0], false).unwrap();
        let mut binning = Binning2D::new(lon, lat, None);

        binning.push(&[-180.0], &[0.0], &[1.0], true, 1).unwrap();
        assert_eq!(binning.count()[[180, 1]], 1.0);
    }

    #[test]
    fn geodetic_weights_follow_spherical_areas() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[60.0, 70.0], false).unwrap();
        let mut planar = Binning2D::new(x.clone(), y.clone(), None);
        let mut geodetic = Binning2D::new(x, y, Some(System::default()));

        planar.push(&[0.5], &[65.0], &[1.0], false, 1).unwrap();
        geodetic.push(&[0.5], &[65.0], &[1.0], false, 1).unwrap();

        let planar_weights = planar.sum_of_weights();
        let geodetic_weights = geodetic.sum_of_weights();
        assert_approx_eq!(f64, planar_weights[[0, 0]], 0.25, epsilon = 1e-12);
        // the southern half of the cell covers more area, so in area terms
        // the midpoint sample sits closer to the northern nodes
        assert!(geodetic_weights[[0, 0]] < 0.25);
        assert!(geodetic_weights[[0, 1]] > 0.25);
        assert_approx_eq!(f64, geodetic_weights.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn merge_is_associative_for_the_exact_statistics() {
        let samples: Vec<(f64, f64, f64)> = (0..60)
            .map(|i| {
                let t = f64::from(i);
                (t % 3.0, (t * 0.7) % 2.0, (t * 1.3).sin() * 10.0)
            })
            .collect();

        let fill = |range: std::ops::Range<usize>| {
            let (x, y) = axes();
            let mut binning = Binning2D::new(x, y, None);
            let xs: Vec<f64> = samples[range.clone()].iter().map(|s| s.0).collect();
            let ys: Vec<f64> = samples[range.clone()].iter().map(|s| s.1).collect();
            let zs: Vec<f64> = samples[range].iter().map(|s| s.2).collect();
            binning.push(&xs, &ys, &zs, false, 1).unwrap();
            binning
        };

        let mut left = fill(0..20);
        left.merge(&fill(20..40)).unwrap();
        left.merge(&fill(40..60)).unwrap();

        let mut inner = fill(20..40);
        inner.merge(&fill(40..60)).unwrap();
        let mut right = fill(0..20);
        right.merge(&inner).unwrap();

        assert_eq!(left.count(), right.count());
        assert_eq!(left.min(), right.min());
        assert_eq!(left.max(), right.max());

        for (lhs, rhs) in [
            (left.sum(), right.sum()),
            (left.sum_of_weights(), right.sum_of_weights()),
            (left.mean(), right.mean()),
        ] {
            for (a, b) in lhs.iter().zip(rhs.iter()) {
                if a.is_nan() {
                    assert!(b.is_nan());
                } else {
                    assert_approx_eq!(f64, *a, *b, ulps = 16);
                }
            }
        }
    }

    #[test]
    fn merge_requires_identical_axes() {
        let (x, y) = axes();
        let mut binning = Binning2D::new(x.clone(), y, None);
        let other = Binning2D::new(x.clone(), x, None);

        assert!(binning.merge(&other).is_err());
    }

    #[test]
    fn worker_count_keeps_the_totals() {
        let xs: Vec<f64> = (0..500).map(|i| f64::from(i % 30) * 0.1).collect();
        let ys: Vec<f64> = (0..500).map(|i| f64::from(i % 20) * 0.1).collect();
        let zs: Vec<f64> = (0..500).map(|i| f64::from(i) * 0.01).collect();

        let (x, y) = axes();
        let mut sequential = Binning2D::new(x.clone(), y.clone(), None);
        sequential.push(&xs, &ys, &zs, false, 1).unwrap();
        let mut parallel = Binning2D::new(x, y, None);
        parallel.push(&xs, &ys, &zs, false, 4).unwrap();

        assert_eq!(sequential.count(), parallel.count());
        let (lhs, rhs) = (sequential.sum(), parallel.sum());
        for (a, b) in lhs.iter().zip(rhs.iter()) {
            assert_approx_eq!(f64, *a, *b, ulps = 16);
        }
    }

    #[test]
    fn clear_resets_every_cell() {
        let (x, y) = axes();
        let mut binning = Binning2D::new(x, y, None);
        binning.push(&[1.0], &[1.0], &[2.0], true, 1).unwrap();

        binning.clear();
        assert_eq!(binning.count().sum(), 0.0);
    }
}
