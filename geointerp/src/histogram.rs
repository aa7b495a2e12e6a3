//! Streaming histograms and histogram-backed 2-D binning.
//!
//! [`StreamingHistogram`] is the bounded-size histogram of Ben-Haim and
//! Tom-Tov: an ordered list of weighted centroids that merges the two
//! closest neighbors whenever an insertion would exceed the configured
//! size. It trades exactness for a fixed memory footprint and supports
//! approximate quantile queries; with fewer distinct values than bins the
//! answers are exact.

use crate::axis::Axis;
use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Default number of centroids kept per histogram.
pub const DEFAULT_BIN_COUNT: usize = 100;

/// A bounded-size histogram of weighted centroids.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StreamingHistogram {
    /// Ordered by center.
    centroids: Vec<(f64, f64)>,
    max_bins: usize,
    count: u64,
    min: f64,
    max: f64,
}

impl Default for StreamingHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_BIN_COUNT)
    }
}

impl StreamingHistogram {
    /// Creates an empty histogram bounded to `max_bins` centroids (at least
    /// two).
    #[must_use]
    pub fn new(max_bins: usize) -> Self {
        Self {
            centroids: Vec::new(),
            max_bins: max_bins.max(2),
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Number of pushed samples.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Number of centroids currently held.
    #[must_use]
    pub fn size(&self) -> usize {
        self.centroids.len()
    }

    /// Sum of the pushed weights.
    #[must_use]
    pub fn sum_of_weights(&self) -> f64 {
        self.centroids.iter().map(|(_, weight)| weight).sum()
    }

    /// Smallest pushed sample, NaN when empty.
    #[must_use]
    pub fn min(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.min
        }
    }

    /// Largest pushed sample, NaN when empty.
    #[must_use]
    pub fn max(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.max
        }
    }

    /// Weighted mean, NaN when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        let (sum, weight) = self
            .centroids
            .iter()
            .fold((0.0, 0.0), |(sum, total), (center, weight)| {
                (center.mul_add(*weight, sum), total + weight)
            });
        sum / weight
    }

    /// Adds a sample with unit weight. The caller must filter NaN samples.
    pub fn push(&mut self, value: f64) {
        self.push_weighted(value, 1.0);
    }

    /// Adds a weighted sample. The caller must filter NaN samples.
    pub fn push_weighted(&mut self, value: f64, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        match self
            .centroids
            .binary_search_by(|(center, _)| center.partial_cmp(&value).unwrap())
        {
            Ok(found) => self.centroids[found].1 += weight,
            Err(position) => {
                self.centroids.insert(position, (value, weight));
                self.compress();
            }
        }
    }

    /// Merges the centroids of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        for &(center, weight) in &other.centroids {
            match self
                .centroids
                .binary_search_by(|(existing, _)| existing.partial_cmp(&center).unwrap())
            {
                Ok(found) => self.centroids[found].1 += weight,
                Err(position) => self.centroids.insert(position, (center, weight)),
            }
        }
        self.compress();
    }

    /// Merges the two closest centroids until the histogram fits its bound.
    fn compress(&mut self) {
        while self.centroids.len() > self.max_bins {
            let closest = self
                .centroids
                .windows(2)
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    (a[1].0 - a[0].0).partial_cmp(&(b[1].0 - b[0].0)).unwrap()
                })
                .map(|(i, _)| i)
                .unwrap();

            let (right_center, right_weight) = self.centroids.remove(closest + 1);
            let (center, weight) = &mut self.centroids[closest];
            let total = *weight + right_weight;
            *center = (*center).mul_add(*weight, right_center * right_weight) / total;
            *weight = total;
        }
    }

    /// Approximate `q`-quantile (`0 <= q <= 1`), NaN when empty.
    ///
    /// The cumulative weight is interpolated linearly between neighboring
    /// centroids, with half of each centroid's weight lying on either side
    /// of its center.
    #[must_use]
    pub fn quantile(&self, q: f64) -> f64 {
        if self.count == 0 || !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }

        let total = self.sum_of_weights();
        let target = q * total;

        let mut below = 0.0;
        for (i, &(center, weight)) in self.centroids.iter().enumerate() {
            let at_center = below + 0.5 * weight;
            if target <= at_center {
                // between the previous centroid (or the minimum) and this one
                let (left_value, left_rank) = if i == 0 {
                    (self.min, 0.0)
                } else {
                    let (previous_center, previous_weight) = self.centroids[i - 1];
                    (previous_center, below - 0.5 * previous_weight)
                };
                let span = at_center - left_rank;
                if span <= 0.0 {
                    return center;
                }
                let fraction = ((target - left_rank) / span).clamp(0.0, 1.0);
                return (center - left_value).mul_add(fraction, left_value);
            }
            below += weight;
        }

        self.max
    }

    /// Approximate median.
    #[must_use]
    pub fn median(&self) -> f64 {
        self.quantile(0.5)
    }
}

/// Streaming 2-D aggregation with one compressed histogram per cell,
/// answering the order statistics that the moment-based
/// [`crate::binning::Binning2D`] cannot.
#[derive(Clone, Debug)]
pub struct Histogram2D {
    x: Axis,
    y: Axis,
    cells: Array2<StreamingHistogram>,
}

impl Histogram2D {
    /// Creates an empty histogram grid with `max_bins` centroids per cell.
    #[must_use]
    pub fn new(x: Axis, y: Axis, max_bins: usize) -> Self {
        let cells = Array2::from_elem((x.len(), y.len()), StreamingHistogram::new(max_bins));
        Self { x, y, cells }
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
        for cell in &mut self.cells {
            *cell = StreamingHistogram::new(cell.max_bins);
        }
    }

    /// Pushes a batch of samples into their nearest cells. NaN values are
    /// skipped; samples outside the axes are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] when the coordinate and value vectors
    /// have mismatched lengths.
    pub fn push(&mut self, x: &[f64], y: &[f64], z: &[f64]) -> Result<()> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(Error::InvalidShape(format!(
                "coordinate vectors have mismatched lengths [{}, {}, {}]",
                x.len(),
                y.len(),
                z.len()
            )));
        }

        for ((&xi, &yi), &zi) in x.iter().zip(y).zip(z) {
            if zi.is_nan() {
                continue;
            }
            let (Some(i), Some(j)) = (self.x.find_index(xi, false), self.y.find_index(yi, false))
            else {
                continue;
            };
            self.cells[[i, j]].push(zi);
        }
        Ok(())
    }

    /// Merges the cells of `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the axes differ.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.x != other.x || self.y != other.y {
            return Err(Error::InvalidArgument(
                "cannot merge histograms defined on different axes".to_string(),
            ));
        }
        for (cell, rhs) in self.cells.iter_mut().zip(other.cells.iter()) {
            cell.merge(rhs);
        }
        Ok(())
    }

    /// Number of samples per cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn count(&self) -> Array2<f64> {
        self.cells.map(|cell| cell.count() as f64)
    }

    /// Sum of the sample weights per cell.
    #[must_use]
    pub fn sum_of_weights(&self) -> Array2<f64> {
        self.cells.map(StreamingHistogram::sum_of_weights)
    }

    /// Weighted mean per cell.
    #[must_use]
    pub fn mean(&self) -> Array2<f64> {
        self.cells.map(StreamingHistogram::mean)
    }

    /// Approximate `q`-quantile per cell.
    #[must_use]
    pub fn quantile(&self, q: f64) -> Array2<f64> {
        self.cells.map(|cell| cell.quantile(q))
    }

    /// Approximate median per cell.
    #[must_use]
    pub fn median(&self) -> Array2<f64> {
        self.cells.map(StreamingHistogram::median)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn exact_below_the_compression_threshold() {
        let mut histogram = StreamingHistogram::new(16);
        for value in [5.0, 1.0, 3.0, 2.0, 4.0] {
            histogram.push(value);
        }

        assert_eq!(histogram.count(), 5);
        assert_eq!(histogram.size(), 5);
        assert_eq!(histogram.min(), 1.0);
        assert_eq!(histogram.max(), 5.0);
        assert_approx_eq!(f64, histogram.mean(), 3.0, epsilon = 1e-12);
        assert_approx_eq!(f64, histogram.median(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn compression_bounds_the_size() {
        let mut histogram = StreamingHistogram::new(8);
        for i in 0..1000 {
            histogram.push(f64::from(i) * 0.01);
        }

        assert_eq!(histogram.size(), 8);
        assert_eq!(histogram.count(), 1000);
        assert_approx_eq!(f64, histogram.sum_of_weights(), 1000.0, epsilon = 1e-9);
        // the mean survives compression exactly in exact arithmetic
        assert_approx_eq!(f64, histogram.mean(), 999.0 * 0.01 / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn quantiles_of_a_uniform_stream() {
        let mut histogram = StreamingHistogram::new(64);
        for i in 0..10_000 {
            histogram.push(f64::from(i % 1000) / 1000.0);
        }

        for (q, expected) in [(0.1, 0.1), (0.25, 0.25), (0.5, 0.5), (0.9, 0.9)] {
            let estimate = histogram.quantile(q);
            assert!(
                (estimate - expected).abs() < 0.02,
                "quantile({q}) = {estimate}"
            );
        }
        assert_eq!(histogram.quantile(0.0), 0.0);
        assert_eq!(histogram.quantile(1.0), histogram.max());
    }

    #[test]
    fn merge_preserves_the_weight_budget() {
        let mut left = StreamingHistogram::new(32);
        let mut right = StreamingHistogram::new(32);
        for i in 0..500 {
            left.push(f64::from(i) * 0.1);
            right.push(f64::from(i).mul_add(0.1, 25.0));
        }

        let weight = left.sum_of_weights() + right.sum_of_weights();
        left.merge(&right);

        assert_eq!(left.count(), 1000);
        assert_approx_eq!(f64, left.sum_of_weights(), weight, epsilon = 1e-9);
        assert!(left.size() <= 32);
    }

    #[test]
    fn invalid_quantile_is_nan() {
        let mut histogram = StreamingHistogram::new(8);
        histogram.push(1.0);

        assert!(histogram.quantile(-0.1).is_nan());
        assert!(histogram.quantile(1.1).is_nan());
        assert!(StreamingHistogram::new(8).quantile(0.5).is_nan());
    }

    #[test]
    fn histogram2d_medians_per_cell() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let mut grid = Histogram2D::new(x, y, 32);

        // five samples in cell (0, 0), one in cell (1, 1)
        grid.push(
            &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            &[1.0, 2.0, 3.0, 4.0, 5.0, 9.0],
        )
        .unwrap();

        let median = grid.median();
        assert_approx_eq!(f64, median[[0, 0]], 3.0, epsilon = 1e-12);
        assert_approx_eq!(f64, median[[1, 1]], 9.0, epsilon = 1e-12);
        assert!(median[[0, 1]].is_nan());

        let count = grid.count();
        assert_eq!(count[[0, 0]], 5.0);
    }

    #[test]
    fn histogram2d_merge() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let mut left = Histogram2D::new(x.clone(), y.clone(), 32);
        let mut right = Histogram2D::new(x, y, 32);

        left.push(&[0.0], &[0.0], &[1.0]).unwrap();
        right.push(&[0.0], &[0.0], &[3.0]).unwrap();

        left.merge(&right).unwrap();
        assert_eq!(left.count()[[0, 0]], 2.0);
        assert_approx_eq!(f64, left.mean()[[0, 0]], 2.0, epsilon = 1e-12);
    }
}
