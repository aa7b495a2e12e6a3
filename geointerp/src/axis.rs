//! Coordinate axes.
//!
//! An [`Axis`] is a monotonic 1-D coordinate vector. Evenly spaced axes are
//! detected at construction and answer lookups with direct arithmetic;
//! irregular axes fall back to bisection. Axes flagged as circular interpret
//! their coordinates modulo a period (360° for longitudes), so queries wrap
//! around the seam instead of falling out of the domain.
//!
//! [`TemporalAxis`] is the integer twin of [`Axis`]: coordinates are `i64`
//! instants at a declared [`Resolution`], and every lookup is carried out in
//! exact integer arithmetic so nanosecond axes never lose precision.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Spacing tolerance, relative to the mean step, under which an axis is
/// considered evenly spaced.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Period of an angular axis, in degrees.
pub const DEFAULT_PERIOD: f64 = 360.0;

/// Rule applied when a window of indices runs past an axis endpoint.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Boundary {
    /// Clamp to the first or last index, extending the edge value.
    Expand,
    /// Wrap modulo the axis length. Only meaningful on circular axes.
    Wrap,
    /// Mirror the indices about the axis edges.
    Sym,
    /// Out-of-range indices invalidate the whole window.
    Undef,
}

/// Reduces `x` into `[min, min + period)`.
pub(crate) fn normalize_angle(x: f64, min: f64, period: f64) -> f64 {
    min + (x - min).rem_euclid(period)
}

/// Rounds `t` to the nearest integer, choosing the lower one on exact
/// midpoints.
fn round_half_down(t: f64) -> isize {
    ((t + 0.5).ceil() - 1.0) as isize
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
enum Representation {
    /// Evenly spaced coordinates, fully described by the first value, the
    /// signed step and the number of points.
    Regular { front: f64, step: f64, num: usize },
    /// Anything else; lookups bisect the stored values.
    Irregular { values: Vec<f64> },
}

impl Representation {
    fn new(values: &[f64], epsilon: f64) -> Self {
        if values.len() < 2 {
            return Self::Irregular {
                values: values.to_vec(),
            };
        }

        let front = values[0];
        let back = values[values.len() - 1];
        let step = (back - front) / (values.len() - 1) as f64;
        let regular = values
            .windows(2)
            .all(|pair| ((pair[1] - pair[0]) - step).abs() <= epsilon * step.abs());

        if regular {
            Self::Regular {
                front,
                step,
                num: values.len(),
            }
        } else {
            Self::Irregular {
                values: values.to_vec(),
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Regular { num, .. } => *num,
            Self::Irregular { values } => values.len(),
        }
    }

    fn value(&self, index: usize) -> f64 {
        match self {
            Self::Regular { front, step, .. } => (index as f64).mul_add(*step, *front),
            Self::Irregular { values } => values[index],
        }
    }

    fn flip(&mut self) {
        match self {
            Self::Regular { front, step, num } => {
                *front = ((*num - 1) as f64).mul_add(*step, *front);
                *step = -*step;
            }
            Self::Irregular { values } => values.reverse(),
        }
    }
}

/// A monotonic 1-D coordinate vector.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Axis {
    repr: Representation,
    is_circle: bool,
    period: f64,
    epsilon: f64,
}

impl Axis {
    /// Constructs an axis from its coordinates with the default spacing
    /// tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `values` is empty or not
    /// strictly monotonic.
    pub fn new(values: &[f64], is_circle: bool) -> Result<Self> {
        Self::with_epsilon(values, DEFAULT_EPSILON, is_circle)
    }

    /// Constructs an axis with an explicit spacing tolerance `epsilon`.
    ///
    /// Circular axes are normalized so that all coordinates fall within one
    /// period of the first value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `values` is empty, not strictly
    /// monotonic, or spans more than one period while `is_circle` is set.
    pub fn with_epsilon(values: &[f64], epsilon: f64, is_circle: bool) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidArgument(
                "an axis requires at least one coordinate".to_string(),
            ));
        }
        if values.iter().any(|value| !value.is_finite()) {
            return Err(Error::InvalidArgument(
                "axis coordinates must be finite".to_string(),
            ));
        }

        let period = DEFAULT_PERIOD;
        let values = if is_circle && values.len() > 1 {
            // unwrap the sequence around the first value, keeping direction
            let mut normalized = Vec::with_capacity(values.len());
            normalized.push(values[0]);
            let ascending = normalize_angle(values[1], values[0], period)
                <= normalize_angle(values[values.len() - 1], values[0], period);
            for &value in &values[1..] {
                let wrapped = normalize_angle(value, values[0], period);
                normalized.push(if ascending { wrapped } else { wrapped - period });
            }
            normalized
        } else {
            values.to_vec()
        };

        let ascending = values.len() < 2 || values[0] < values[1];
        let monotonic = values.windows(2).all(|pair| {
            if ascending {
                pair[0] < pair[1]
            } else {
                pair[0] > pair[1]
            }
        });
        if !monotonic {
            return Err(Error::InvalidArgument(
                "axis coordinates must be strictly monotonic".to_string(),
            ));
        }
        if is_circle && (values[values.len() - 1] - values[0]).abs() >= period {
            return Err(Error::InvalidArgument(format!(
                "a circular axis must cover at most one period of {period} degrees"
            )));
        }

        Ok(Self {
            repr: Representation::new(&values, epsilon),
            is_circle,
            period,
            epsilon,
        })
    }

    /// Number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repr.len()
    }

    /// Returns `true` if the axis holds no coordinate. Construction forbids
    /// this, so it only returns `false`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repr.len() == 0
    }

    /// First stored coordinate.
    #[must_use]
    pub fn front(&self) -> f64 {
        self.repr.value(0)
    }

    /// Last stored coordinate.
    #[must_use]
    pub fn back(&self) -> f64 {
        self.repr.value(self.len() - 1)
    }

    /// Smallest coordinate.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.front().min(self.back())
    }

    /// Largest coordinate.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.front().max(self.back())
    }

    /// Returns `true` if the coordinates are evenly spaced.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        matches!(self.repr, Representation::Regular { .. })
    }

    /// Returns `true` if the coordinates increase with the index.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.len() < 2 || self.repr.value(0) < self.repr.value(1)
    }

    /// Returns `true` if the coordinates wrap around a period.
    #[must_use]
    pub fn is_circle(&self) -> bool {
        self.is_circle
    }

    /// Period of a circular axis, in the coordinate unit.
    #[must_use]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Spacing tolerance used to classify the axis as regular.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Step between two consecutive coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegular`] if the axis is not evenly spaced.
    pub fn increment(&self) -> Result<f64> {
        match &self.repr {
            Representation::Regular { step, .. } => Ok(*step),
            Representation::Irregular { .. } => Err(Error::NotRegular),
        }
    }

    /// Coordinate at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn coordinate_value(&self, index: usize) -> f64 {
        assert!(index < self.len());
        self.repr.value(index)
    }

    /// All coordinates, in storage order.
    #[must_use]
    pub fn coordinate_values(&self) -> Vec<f64> {
        (0..self.len()).map(|index| self.repr.value(index)).collect()
    }

    /// Reverses the axis in place.
    pub fn flip(&mut self) {
        self.repr.flip();
    }

    /// Reduces `x` onto the stored coordinate range of a circular axis;
    /// returns `x` unchanged otherwise.
    #[must_use]
    pub fn normalize_coordinate(&self, x: f64) -> f64 {
        if self.is_circle {
            normalize_angle(x, self.min_value(), self.period)
        } else {
            x
        }
    }

    /// Returns `true` if `x` falls inside the closed coordinate range (after
    /// reduction modulo the period for circular axes).
    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        self.is_circle || (self.min_value() <= x && x <= self.max_value())
    }

    /// Returns the index of the coordinate closest to `x`.
    ///
    /// With `bounded` set, out-of-range queries clamp to the nearest
    /// endpoint; otherwise they return `None`. Exact midpoints on regular
    /// axes resolve to the lower index.
    #[must_use]
    pub fn find_index(&self, x: f64, bounded: bool) -> Option<usize> {
        if !x.is_finite() {
            return None;
        }
        let x = self.normalize_coordinate(x);
        if !bounded && !self.is_circle && (x < self.min_value() || x > self.max_value()) {
            return None;
        }

        let len = self.len();
        if len == 1 {
            return Some(0);
        }

        match &self.repr {
            Representation::Regular { front, step, num } => {
                let t = (x - front) / step;
                let index = round_half_down(t);
                if self.is_circle {
                    Some(index.rem_euclid(*num as isize) as usize)
                } else {
                    Some(index.clamp(0, *num as isize - 1) as usize)
                }
            }
            Representation::Irregular { values } => {
                let index = if self.is_ascending() {
                    values.partition_point(|value| *value < x)
                } else {
                    values.partition_point(|value| *value > x)
                };
                // `index` is the first element past `x`; compare with its
                // predecessor to find the closest of the two.
                let candidates = [index.saturating_sub(1), index.min(len - 1)];
                let closest = if self.circular_distance(values[candidates[0]], x)
                    <= self.circular_distance(values[candidates[1]], x)
                {
                    candidates[0]
                } else {
                    candidates[1]
                };
                // on a circular axis the seam may be closer than either
                if self.is_circle {
                    let seam = [0, len - 1]
                        .into_iter()
                        .min_by(|&a, &b| {
                            self.circular_distance(values[a], x)
                                .partial_cmp(&self.circular_distance(values[b], x))
                                .unwrap()
                        })
                        .unwrap();
                    if self.circular_distance(values[seam], x)
                        < self.circular_distance(values[closest], x)
                    {
                        return Some(seam);
                    }
                }
                Some(closest)
            }
        }
    }

    fn circular_distance(&self, a: f64, b: f64) -> f64 {
        let distance = (a - b).abs();
        if self.is_circle {
            distance.min(self.period - distance)
        } else {
            distance
        }
    }

    /// Returns the pair of adjacent indices whose coordinate interval
    /// contains `x`. On circular axes the bracket wraps across the seam
    /// (`(len - 1, 0)`); out-of-range queries on non-circular axes return
    /// `None`.
    #[must_use]
    pub fn find_indexes(&self, x: f64) -> Option<(usize, usize)> {
        if !x.is_finite() {
            return None;
        }
        let len = self.len();
        if len < 2 {
            let x = self.normalize_coordinate(x);
            return (len == 1 && x == self.front()).then_some((0, 0));
        }

        let x = self.normalize_coordinate(x);
        if !self.is_circle && (x < self.min_value() || x > self.max_value()) {
            return None;
        }

        let i0 = match &self.repr {
            Representation::Regular { front, step, .. } => {
                let t = (x - front) / step;
                t.floor() as isize
            }
            Representation::Irregular { values } => {
                let index = if self.is_ascending() {
                    values.partition_point(|value| *value <= x)
                } else {
                    values.partition_point(|value| *value >= x)
                };
                index as isize - 1
            }
        };

        if self.is_circle {
            // a coordinate between the last node and the first node plus one
            // period brackets across the seam
            if i0 < 0 || i0 >= len as isize - 1 {
                return Some((len - 1, 0));
            }
            let i0 = i0 as usize;
            return Some((i0, i0 + 1));
        }

        let i0 = i0.clamp(0, len as isize - 2) as usize;
        Some((i0, i0 + 1))
    }

    /// Returns the window of `2 * size` indices around `x`, honoring the
    /// boundary policy. `None` is returned under [`Boundary::Undef`] when the
    /// window would leave the axis, or when `x` has no bracket on a
    /// non-circular axis.
    #[must_use]
    pub fn find_indexes_around(
        &self,
        x: f64,
        size: usize,
        boundary: Boundary,
    ) -> Option<Vec<usize>> {
        debug_assert!(size >= 1);
        let len = self.len() as isize;
        let (i0, _) = self.find_indexes(x).or_else(|| {
            // no bracket: every policy except Undef falls back to the
            // nearest endpoint
            if boundary == Boundary::Undef {
                None
            } else {
                self.find_index(x, true).map(|index| (index, index))
            }
        })?;

        let first = i0 as isize - size as isize + 1;
        let mut window = Vec::with_capacity(2 * size);
        for raw in first..first + 2 * size as isize {
            let index = match boundary {
                Boundary::Expand => raw.clamp(0, len - 1),
                Boundary::Wrap => raw.rem_euclid(len),
                Boundary::Sym if len == 1 => 0,
                Boundary::Sym => {
                    // whole-sample mirror about the edge nodes
                    let mut index = raw;
                    while index < 0 || index >= len {
                        if index < 0 {
                            index = -index;
                        }
                        if index >= len {
                            index = 2 * len - index - 2;
                        }
                    }
                    index
                }
                Boundary::Undef => {
                    if raw < 0 || raw >= len {
                        return None;
                    }
                    raw
                }
            };
            window.push(index as usize);
        }

        Some(window)
    }
}

/// Time resolution of a [`TemporalAxis`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Resolution {
    /// Calendar years.
    Year,
    /// Calendar months.
    Month,
    /// Weeks of 7 days.
    Week,
    /// Days of 24 hours.
    Day,
    /// Hours.
    Hour,
    /// Minutes.
    Minute,
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
}

impl Resolution {
    /// Number of months per unit for calendar resolutions.
    fn months(self) -> Option<i128> {
        match self {
            Self::Year => Some(12),
            Self::Month => Some(1),
            _ => None,
        }
    }

    /// Number of nanoseconds per unit for fixed-duration resolutions.
    fn nanoseconds(self) -> Option<i128> {
        match self {
            Self::Week => Some(604_800_000_000_000),
            Self::Day => Some(86_400_000_000_000),
            Self::Hour => Some(3_600_000_000_000),
            Self::Minute => Some(60_000_000_000),
            Self::Second => Some(1_000_000_000),
            Self::Millisecond => Some(1_000_000),
            Self::Microsecond => Some(1_000),
            Self::Nanosecond => Some(1),
            Self::Year | Self::Month => None,
        }
    }
}

/// A monotonic axis of `i64` instants at a declared resolution.
///
/// All lookups run in exact integer arithmetic; a nanosecond axis spanning
/// decades keeps its full resolution.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TemporalAxis {
    values: Vec<i64>,
    step: Option<i64>,
    resolution: Resolution,
}

impl TemporalAxis {
    /// Constructs a temporal axis from instants expressed at `resolution`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `values` is empty or not
    /// strictly monotonic.
    pub fn new(values: &[i64], resolution: Resolution) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidArgument(
                "an axis requires at least one coordinate".to_string(),
            ));
        }
        let ascending = values.len() < 2 || values[0] < values[1];
        let monotonic = values.windows(2).all(|pair| {
            if ascending {
                pair[0] < pair[1]
            } else {
                pair[0] > pair[1]
            }
        });
        if !monotonic {
            return Err(Error::InvalidArgument(
                "axis coordinates must be strictly monotonic".to_string(),
            ));
        }

        let step = (values.len() > 1
            && values
                .windows(2)
                .all(|pair| pair[1] - pair[0] == values[1] - values[0]))
        .then(|| values[1] - values[0]);

        Ok(Self {
            values: values.to_vec(),
            step,
            resolution,
        })
    }

    /// Resolution of the stored instants.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of instants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the axis holds no instant. Construction forbids
    /// this, so it only returns `false`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First stored instant.
    #[must_use]
    pub fn front(&self) -> i64 {
        self.values[0]
    }

    /// Last stored instant.
    #[must_use]
    pub fn back(&self) -> i64 {
        self.values[self.values.len() - 1]
    }

    /// Smallest instant.
    #[must_use]
    pub fn min_value(&self) -> i64 {
        self.front().min(self.back())
    }

    /// Largest instant.
    #[must_use]
    pub fn max_value(&self) -> i64 {
        self.front().max(self.back())
    }

    /// Returns `true` if the instants are evenly spaced.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.step.is_some() || self.values.len() == 1
    }

    /// Returns `true` if the instants increase with the index.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.values.len() < 2 || self.values[0] < self.values[1]
    }

    /// Step between two consecutive instants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegular`] if the axis is not evenly spaced.
    pub fn increment(&self) -> Result<i64> {
        self.step.ok_or(Error::NotRegular)
    }

    /// Instant at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn coordinate_value(&self, index: usize) -> i64 {
        self.values[index]
    }

    /// All instants, in storage order.
    #[must_use]
    pub fn coordinate_values(&self) -> Vec<i64> {
        self.values.clone()
    }

    /// Reverses the axis in place.
    pub fn flip(&mut self) {
        self.values.reverse();
        self.step = self.step.map(|step| -step);
    }

    /// Returns `true` if `x` falls inside the closed instant range.
    #[must_use]
    pub fn contains(&self, x: i64) -> bool {
        self.min_value() <= x && x <= self.max_value()
    }

    /// Returns the index of the instant closest to `x`; ties resolve to the
    /// lower index. See [`Axis::find_index`].
    #[must_use]
    pub fn find_index(&self, x: i64, bounded: bool) -> Option<usize> {
        if !bounded && !self.contains(x) {
            return None;
        }
        let len = self.values.len();
        if len == 1 {
            return Some(0);
        }

        let index = if self.is_ascending() {
            self.values.partition_point(|value| *value < x)
        } else {
            self.values.partition_point(|value| *value > x)
        };
        let low = index.saturating_sub(1);
        let high = index.min(len - 1);
        let closest = if (self.values[low] - x).abs() <= (self.values[high] - x).abs() {
            low
        } else {
            high
        };
        Some(closest)
    }

    /// Returns the pair of adjacent indices whose instant interval contains
    /// `x`, or `None` when `x` is out of range. See [`Axis::find_indexes`].
    #[must_use]
    pub fn find_indexes(&self, x: i64) -> Option<(usize, usize)> {
        let len = self.values.len();
        if len < 2 {
            return (len == 1 && x == self.values[0]).then_some((0, 0));
        }
        if !self.contains(x) {
            return None;
        }

        let index = if self.is_ascending() {
            self.values.partition_point(|value| *value <= x)
        } else {
            self.values.partition_point(|value| *value >= x)
        };
        let i0 = (index as isize - 1).clamp(0, len as isize - 2) as usize;
        Some((i0, i0 + 1))
    }

    /// Converts instants expressed at `resolution` to the resolution of this
    /// axis. Conversions that lose sub-unit precision truncate towards
    /// negative infinity and emit a warning through the [`log`] sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when converting between calendar
    /// resolutions (year, month) and fixed-duration resolutions (week down
    /// to nanosecond), which have no exact ratio.
    pub fn safe_cast(&self, values: &[i64], resolution: Resolution) -> Result<Vec<i64>> {
        let (from, to) = match (
            resolution.months(),
            self.resolution.months(),
            resolution.nanoseconds(),
            self.resolution.nanoseconds(),
        ) {
            (Some(from), Some(to), _, _) | (_, _, Some(from), Some(to)) => (from, to),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "no exact conversion from {resolution:?} to {:?}",
                    self.resolution
                )))
            }
        };

        let mut truncated = false;
        let cast = values
            .iter()
            .map(|&value| {
                let scaled = i128::from(value) * from;
                if scaled.rem_euclid(to) != 0 {
                    truncated = true;
                }
                scaled.div_euclid(to) as i64
            })
            .collect();

        if truncated {
            log::warn!(
                "instants converted from {resolution:?} to {:?} lost sub-unit precision",
                self.resolution
            );
        }

        Ok(cast)
    }
}

/// Capability set shared by [`Axis`] and [`TemporalAxis`], letting grids and
/// interpolators work with either coordinate kind.
pub trait Coordinate: Clone + Send + Sync {
    /// Scalar coordinate type.
    type Scalar: Copy + PartialEq + Send + Sync + std::fmt::Debug;

    /// Number of coordinates.
    fn len(&self) -> usize;

    /// Returns `true` if the axis holds no coordinate.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate at `index`.
    fn coordinate_value(&self, index: usize) -> Self::Scalar;

    /// Returns `true` if the coordinates increase with the index.
    fn is_ascending(&self) -> bool;

    /// Reverses the axis in place.
    fn flip(&mut self);

    /// Bracketing index pair for `x`. See [`Axis::find_indexes`].
    fn find_indexes(&self, x: Self::Scalar) -> Option<(usize, usize)>;

    /// Returns `true` if `x` falls inside the axis domain.
    fn contains(&self, x: Self::Scalar) -> bool;

    /// Position of `x` within the bracket `(i0, i1)`, as a fraction in
    /// `[0, 1]`.
    fn lerp_fraction(&self, x: Self::Scalar, i0: usize, i1: usize) -> f64;

    /// Lossy view of a scalar, for diagnostics.
    fn scalar_to_f64(x: Self::Scalar) -> f64;
}

impl Coordinate for Axis {
    type Scalar = f64;

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn coordinate_value(&self, index: usize) -> f64 {
        Self::coordinate_value(self, index)
    }

    fn is_ascending(&self) -> bool {
        Self::is_ascending(self)
    }

    fn flip(&mut self) {
        Self::flip(self);
    }

    fn find_indexes(&self, x: f64) -> Option<(usize, usize)> {
        Self::find_indexes(self, x)
    }

    fn contains(&self, x: f64) -> bool {
        Self::contains(self, x)
    }

    fn lerp_fraction(&self, x: f64, i0: usize, i1: usize) -> f64 {
        if i0 == i1 {
            return 0.0;
        }
        let x0 = self.coordinate_value(i0);
        let x1 = self.coordinate_value(i1);
        if self.is_circle() {
            let delta = (x1 - x0).rem_euclid(self.period());
            let delta = if delta == 0.0 { self.period() } else { delta };
            (self.normalize_coordinate(x) - x0).rem_euclid(self.period()) / delta
        } else {
            (x - x0) / (x1 - x0)
        }
    }

    fn scalar_to_f64(x: f64) -> f64 {
        x
    }
}

impl Coordinate for TemporalAxis {
    type Scalar = i64;

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn coordinate_value(&self, index: usize) -> i64 {
        Self::coordinate_value(self, index)
    }

    fn is_ascending(&self) -> bool {
        Self::is_ascending(self)
    }

    fn flip(&mut self) {
        Self::flip(self);
    }

    fn find_indexes(&self, x: i64) -> Option<(usize, usize)> {
        Self::find_indexes(self, x)
    }

    fn contains(&self, x: i64) -> bool {
        Self::contains(self, x)
    }

    fn lerp_fraction(&self, x: i64, i0: usize, i1: usize) -> f64 {
        if i0 == i1 {
            return 0.0;
        }
        let x0 = self.coordinate_value(i0);
        let x1 = self.coordinate_value(i1);
        (x - x0) as f64 / (x1 - x0) as f64
    }

    fn scalar_to_f64(x: i64) -> f64 {
        x as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latitude_axis() -> Axis {
        let values: Vec<f64> = (0..720).map(|i| (i as f64).mul_add(0.25, -90.0)).collect();
        Axis::new(&values, false).unwrap()
    }

    #[test]
    fn regular_lookup() {
        let axis = latitude_axis();

        assert!(axis.is_regular());
        assert!(axis.is_ascending());
        assert_eq!(axis.len(), 720);
        assert_eq!(axis.front(), -90.0);
        assert_eq!(axis.back(), 89.75);
        assert_eq!(axis.find_index(0.0, false), Some(360));
        assert_eq!(axis.find_index(90.25, false), None);
        assert_eq!(axis.find_index(90.25, true), Some(719));
        assert_eq!(axis.increment().unwrap(), 0.25);
    }

    #[test]
    fn lookup_roundtrips_every_node() {
        let axis = latitude_axis();

        for index in 0..axis.len() {
            let value = axis.coordinate_value(index);
            assert_eq!(axis.find_index(value, true), Some(index));
        }
    }

    #[test]
    fn midpoint_resolves_to_the_lower_index() {
        let axis = Axis::new(&[0.0, 1.0, 2.0, 3.0], false).unwrap();

        assert_eq!(axis.find_index(0.5, false), Some(0));
        assert_eq!(axis.find_index(1.5, false), Some(1));
        assert_eq!(axis.find_index(1.6, false), Some(2));
    }

    #[test]
    fn longitude_circle() {
        let values: Vec<f64> = (0..360).map(f64::from).collect();
        let axis = Axis::new(&values, true).unwrap();

        assert!(axis.is_circle());
        assert_eq!(axis.find_index(-180.0, false), Some(180));
        assert_eq!(axis.find_index(180.0, false), Some(180));
        assert_eq!(axis.find_index(359.9, false), Some(0));
        // a full period away lands on the same index
        for x in [-123.0, 0.0, 42.5] {
            assert_eq!(
                axis.find_index(x, false),
                axis.find_index(x + DEFAULT_PERIOD, false)
            );
        }
    }

    #[test]
    fn circular_bracket_wraps_at_the_seam() {
        let values: Vec<f64> = (0..360).map(f64::from).collect();
        let axis = Axis::new(&values, true).unwrap();

        assert_eq!(axis.find_indexes(359.5), Some((359, 0)));
        assert_eq!(axis.find_indexes(-0.5), Some((359, 0)));
        assert_eq!(axis.find_indexes(12.25), Some((12, 13)));

        let fraction = Coordinate::lerp_fraction(&axis, 359.5, 359, 0);
        assert!((fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn irregular_mercator_latitudes() {
        // non-uniformly spaced latitudes of a Mercator grid
        let values: Vec<f64> = (0..107)
            .map(|i| {
                let phi = (i as f64).mul_add(178.0 / 106.0, -89.0);
                phi + 1.2 * (phi.to_radians()).sin().powi(3)
            })
            .collect();
        let axis = Axis::new(&values, false).unwrap();

        assert!(!axis.is_regular());
        assert!(axis.increment().is_err());

        let index = axis.find_index(0.0, false).unwrap();
        let closest = values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.abs().partial_cmp(&b.abs()).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(index, closest);
    }

    #[test]
    fn descending_axis() {
        let values: Vec<f64> = (0..90).map(|i| 89.0 - f64::from(i)).collect();
        let axis = Axis::new(&values, false).unwrap();

        assert!(!axis.is_ascending());
        assert!(axis.is_regular());
        assert_eq!(axis.increment().unwrap(), -1.0);
        assert_eq!(axis.find_index(89.0, false), Some(0));
        assert_eq!(axis.find_index(0.0, false), Some(89));

        let (i0, i1) = axis.find_indexes(42.5).unwrap();
        assert_eq!((i0, i1), (46, 47));
        assert_eq!(axis.coordinate_value(i0), 43.0);
        assert_eq!(axis.coordinate_value(i1), 42.0);
        let fraction = Coordinate::lerp_fraction(&axis, 42.5, i0, i1);
        assert!((fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn flip_is_an_involution() {
        let mut axis = latitude_axis();
        let original = axis.clone();

        axis.flip();
        assert!(!axis.is_ascending());
        assert_eq!(axis.front(), 89.75);
        axis.flip();
        assert_eq!(axis, original);

        let mut irregular = Axis::new(&[0.0, 1.0, 3.0, 7.0], false).unwrap();
        let original = irregular.clone();
        irregular.flip();
        irregular.flip();
        assert_eq!(irregular, original);
    }

    #[test]
    fn window_boundary_policies() {
        let axis = Axis::new(&[0.0, 1.0, 2.0, 3.0, 4.0], false).unwrap();

        assert_eq!(
            axis.find_indexes_around(0.5, 2, Boundary::Expand),
            Some(vec![0, 0, 1, 2])
        );
        assert_eq!(
            axis.find_indexes_around(0.5, 2, Boundary::Sym),
            Some(vec![1, 0, 1, 2])
        );
        assert_eq!(axis.find_indexes_around(0.5, 2, Boundary::Undef), None);
        assert_eq!(
            axis.find_indexes_around(2.5, 2, Boundary::Undef),
            Some(vec![1, 2, 3, 4])
        );

        let values: Vec<f64> = (0..8).map(|i| f64::from(i) * 45.0).collect();
        let circle = Axis::new(&values, true).unwrap();
        assert_eq!(
            circle.find_indexes_around(350.0, 2, Boundary::Wrap),
            Some(vec![6, 7, 0, 1])
        );
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(Axis::new(&[], false).is_err());
        assert!(Axis::new(&[0.0, 2.0, 1.0], false).is_err());
        assert!(Axis::new(&[0.0, 0.0, 1.0], false).is_err());
        assert!(Axis::new(&[0.0, f64::NAN], false).is_err());
    }

    #[test]
    fn temporal_axis_exact_lookup() {
        // hourly instants in nanoseconds since the epoch; the magnitude
        // exceeds the 2^53 mantissa of f64
        let start = 1_600_000_000_000_000_000_i64;
        let step = 3_600_000_000_000_i64;
        let values: Vec<i64> = (0..48).map(|i| start + i * step).collect();
        let axis = TemporalAxis::new(&values, Resolution::Nanosecond).unwrap();

        assert!(axis.is_regular());
        assert_eq!(axis.increment().unwrap(), step);
        assert_eq!(axis.find_index(start + 3 * step + 1, false), Some(3));
        assert_eq!(axis.find_indexes(start + step / 2), Some((0, 1)));
        assert_eq!(axis.find_index(start - 1, false), None);

        let fraction = Coordinate::lerp_fraction(&axis, start + step / 2, 0, 1);
        assert!((fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn temporal_safe_cast() {
        let axis = TemporalAxis::new(&[0, 3600, 7200], Resolution::Second).unwrap();

        // milliseconds to seconds, truncating
        let cast = axis
            .safe_cast(&[1_000, 1_500, 3_600_000], Resolution::Millisecond)
            .unwrap();
        assert_eq!(cast, vec![1, 1, 3600]);

        // seconds to seconds is the identity
        let cast = axis.safe_cast(&[42], Resolution::Second).unwrap();
        assert_eq!(cast, vec![42]);

        // calendar to fixed-duration has no exact ratio
        assert!(axis.safe_cast(&[1], Resolution::Month).is_err());

        let months = TemporalAxis::new(&[0, 12, 24], Resolution::Month).unwrap();
        let cast = months.safe_cast(&[2], Resolution::Year).unwrap();
        assert_eq!(cast, vec![24]);
    }

    #[test]
    fn temporal_flip() {
        let mut axis = TemporalAxis::new(&[0, 10, 20], Resolution::Second).unwrap();
        let original = axis.clone();

        axis.flip();
        assert!(!axis.is_ascending());
        assert_eq!(axis.front(), 20);
        assert_eq!(axis.increment().unwrap(), -10);
        axis.flip();
        assert_eq!(axis, original);
    }
}
