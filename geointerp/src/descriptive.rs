//! Streaming univariate descriptive statistics.
//!
//! [`Accumulators`] maintains weighted central moments up to order four in
//! the pairwise update form given by Pébay, so that two accumulators can be
//! merged without revisiting the samples and without the catastrophic
//! cancellation of naive moment sums. Pushing a sample is merging with a
//! singleton.

use serde::{Deserialize, Serialize};

/// Streaming state of the weighted central moments of one variable.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Accumulators {
    count: u64,
    sum_of_weights: f64,
    sum: f64,
    mean: f64,
    min: f64,
    max: f64,
    mom2: f64,
    mom3: f64,
    mom4: f64,
}

impl Default for Accumulators {
    fn default() -> Self {
        Self {
            count: 0,
            sum_of_weights: 0.0,
            sum: 0.0,
            mean: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mom2: 0.0,
            mom3: 0.0,
            mom4: 0.0,
        }
    }
}

impl Accumulators {
    /// An empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample with unit weight. The caller must filter NaN samples.
    pub fn push(&mut self, value: f64) {
        self.push_weighted(value, 1.0);
    }

    /// Adds a weighted sample. The caller must filter NaN samples.
    pub fn push_weighted(&mut self, value: f64, weight: f64) {
        self.merge(&Self {
            count: 1,
            sum_of_weights: weight,
            sum: weight * value,
            mean: value,
            min: value,
            max: value,
            mom2: 0.0,
            mom3: 0.0,
            mom4: 0.0,
        });
    }

    /// Merges the state of `other` into `self` (Pébay's pairwise update).
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }

        let sw_a = self.sum_of_weights;
        let sw_b = other.sum_of_weights;
        let sw = sw_a + sw_b;
        let delta = other.mean - self.mean;
        let delta2 = delta * delta;

        let mom4 = self.mom4
            + other.mom4
            + sw_a * sw_b * (sw_a * sw_a - sw_a * sw_b + sw_b * sw_b) * delta2 * delta2
                / (sw * sw * sw)
            + 6.0 * (sw_a * sw_a * other.mom2 + sw_b * sw_b * self.mom2) * delta2 / (sw * sw)
            + 4.0 * (sw_a * other.mom3 - sw_b * self.mom3) * delta / sw;
        let mom3 = self.mom3
            + other.mom3
            + sw_a * sw_b * (sw_a - sw_b) * delta2 * delta / (sw * sw)
            + 3.0 * (sw_a * other.mom2 - sw_b * self.mom2) * delta / sw;
        let mom2 = self.mom2 + other.mom2 + sw_a * sw_b * delta2 / sw;

        self.mom4 = mom4;
        self.mom3 = mom3;
        self.mom2 = mom2;
        self.mean += delta * sw_b / sw;
        self.sum += other.sum;
        self.sum_of_weights = sw;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Number of pushed samples.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of the sample weights.
    #[must_use]
    pub fn sum_of_weights(&self) -> f64 {
        self.sum_of_weights
    }

    /// Weighted sum of the samples.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Weighted mean, NaN when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Smallest sample, NaN when empty.
    #[must_use]
    pub fn min(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.min
        }
    }

    /// Largest sample, NaN when empty.
    #[must_use]
    pub fn max(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.max
        }
    }

    /// Weighted variance with `ddof` delta degrees of freedom, NaN when the
    /// weight budget does not cover `ddof`.
    #[must_use]
    pub fn variance(&self, ddof: f64) -> f64 {
        let denominator = self.sum_of_weights - ddof;
        if self.count == 0 || denominator <= 0.0 {
            f64::NAN
        } else {
            self.mom2 / denominator
        }
    }

    /// Weighted skewness, NaN for degenerate distributions.
    #[must_use]
    pub fn skewness(&self) -> f64 {
        if self.count == 0 || self.mom2 == 0.0 {
            f64::NAN
        } else {
            self.sum_of_weights.sqrt() * self.mom3 / self.mom2.powf(1.5)
        }
    }

    /// Weighted excess kurtosis, NaN for degenerate distributions.
    #[must_use]
    pub fn kurtosis(&self) -> f64 {
        if self.count == 0 || self.mom2 == 0.0 {
            f64::NAN
        } else {
            self.sum_of_weights * self.mom4 / (self.mom2 * self.mom2) - 3.0
        }
    }
}
