//! Geodetic spatial index and scattered-data interpolation.
//!
//! Positions are stored as ECEF cartesian points inside an R\*-tree, which
//! keeps the index geometry cheap and well balanced, while every distance
//! handed back to callers is geodesic, computed on the geographic
//! coordinates kept alongside each point. The split is deliberate: storage
//! geometry is chosen for index performance, the result metric for
//! correctness.

use crate::error::{Error, Result};
use crate::geodetic::{DistanceStrategy, System};
use crate::grid::GridValue;
use crate::parallel;
use ndarray::{Array1, Array2};
use rstar::primitives::GeomWithData;
use rstar::RTree as RStar;
use serde::{Deserialize, Serialize};

/// Payload stored with each indexed point.
#[derive(Clone, Copy, Debug)]
struct Sample<T> {
    lon: f64,
    lat: f64,
    value: T,
}

type Node<T> = GeomWithData<[f64; 3], Sample<T>>;

/// Radial basis function applied to the geodesic distance between a target
/// and its neighbors.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum RadialBasisFunction {
    /// `φ(r) = r`.
    Linear,
    /// `φ(r) = r³`.
    Cubic,
    /// `φ(r) = r² ln r`.
    ThinPlate,
    /// `φ(r) = exp(-(r/ε)²)`.
    Gaussian,
    /// `φ(r) = sqrt((r/ε)² + 1)`.
    #[default]
    Multiquadric,
    /// `φ(r) = 1 / sqrt((r/ε)² + 1)`.
    InverseMultiquadric,
}

impl RadialBasisFunction {
    fn evaluate(self, r: f64, epsilon: f64) -> f64 {
        match self {
            Self::Linear => r,
            Self::Cubic => r * r * r,
            Self::ThinPlate => {
                if r == 0.0 {
                    0.0
                } else {
                    r * r * r.ln()
                }
            }
            Self::Gaussian => (-(r / epsilon).powi(2)).exp(),
            Self::Multiquadric => (r / epsilon).hypot(1.0),
            Self::InverseMultiquadric => (r / epsilon).hypot(1.0).recip(),
        }
    }
}

/// Weighting window applied to the normalized geodesic distance `d / R`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum WindowFunction {
    /// Blackman window.
    Blackman,
    /// Four-term Blackman-Harris window.
    BlackmanHarris,
    /// Constant weight.
    Boxcar,
    /// Flat-top window; carries negative lobes.
    FlatTop,
    /// Normalized sinc.
    Lanczos,
    /// Gaussian taper with standard deviation `arg`.
    Gaussian,
    /// Hamming window.
    #[default]
    Hamming,
    /// Hann window.
    Hann,
    /// Four-term Nuttall window.
    Nuttall,
    /// Parzen (de la Vallée Poussin) window.
    Parzen,
    /// Welch (parabolic) window.
    Welch,
}

impl WindowFunction {
    /// Evaluates the window at `r` in `[0, 1]`; `arg` parameterizes the
    /// Gaussian taper.
    fn evaluate(self, r: f64, arg: f64) -> f64 {
        use std::f64::consts::PI;
        let r = r.clamp(0.0, 1.0);
        match self {
            Self::Blackman => {
                0.08_f64.mul_add((2.0 * PI * r).cos(), 0.5_f64.mul_add((PI * r).cos(), 0.42))
            }
            Self::BlackmanHarris => 0.011_68_f64.mul_add(
                (3.0 * PI * r).cos(),
                0.141_28_f64.mul_add(
                    (2.0 * PI * r).cos(),
                    0.488_29_f64.mul_add((PI * r).cos(), 0.358_75),
                ),
            ),
            Self::Boxcar => 1.0,
            Self::FlatTop => 0.006_947_368_f64.mul_add(
                (4.0 * PI * r).cos(),
                0.083_578_947_f64.mul_add(
                    (3.0 * PI * r).cos(),
                    0.277_263_158_f64.mul_add(
                        (2.0 * PI * r).cos(),
                        0.416_631_58_f64.mul_add((PI * r).cos(), 0.215_578_95),
                    ),
                ),
            ),
            Self::Lanczos => {
                if r == 0.0 {
                    1.0
                } else {
                    (PI * r).sin() / (PI * r)
                }
            }
            Self::Gaussian => (-0.5 * (r / arg).powi(2)).exp(),
            Self::Hamming => 0.46_f64.mul_add((PI * r).cos(), 0.54),
            Self::Hann => 0.5 * (1.0 + (PI * r).cos()),
            Self::Nuttall => 0.012_604_f64.mul_add(
                (3.0 * PI * r).cos(),
                0.144_232_f64.mul_add(
                    (2.0 * PI * r).cos(),
                    0.487_396_f64.mul_add((PI * r).cos(), 0.355_768),
                ),
            ),
            Self::Parzen => {
                if r <= 0.5 {
                    6.0 * r * r * (r - 1.0) + 1.0
                } else {
                    2.0 * (1.0 - r).powi(3)
                }
            }
            Self::Welch => (1.0 - r) * (1.0 + r),
        }
    }
}

/// A geodetic R\*-tree over scattered samples.
#[derive(Clone, Debug)]
pub struct RTree<T = f64> {
    tree: RStar<Node<T>>,
    system: System,
    strategy: DistanceStrategy,
}

impl<T: GridValue> Default for RTree<T> {
    fn default() -> Self {
        Self::new(System::default())
    }
}

impl<T: GridValue> RTree<T> {
    /// Creates an empty index over the given geodetic system; query
    /// distances use the haversine strategy.
    #[must_use]
    pub fn new(system: System) -> Self {
        Self {
            tree: RStar::new(),
            system,
            strategy: DistanceStrategy::Haversine,
        }
    }

    /// Number of stored samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` when no sample is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Removes every stored sample.
    pub fn clear(&mut self) {
        self.tree = RStar::new();
    }

    /// Geodetic system used for coordinate conversions and distances.
    #[must_use]
    pub fn system(&self) -> &System {
        &self.system
    }

    fn nodes(
        &self,
        lon: &[f64],
        lat: &[f64],
        alt: Option<&[f64]>,
        values: &[T],
    ) -> Result<Vec<Node<T>>> {
        if lon.len() != lat.len()
            || lon.len() != values.len()
            || alt.is_some_and(|alt| alt.len() != lon.len())
        {
            return Err(Error::InvalidShape(format!(
                "coordinate and value vectors have mismatched lengths [{}, {}, {}]",
                lon.len(),
                lat.len(),
                values.len()
            )));
        }

        Ok((0..lon.len())
            .map(|i| {
                let altitude = alt.map_or(0.0, |alt| alt[i]);
                let ecef = self.system.to_ecef(lon[i], lat[i], altitude);
                Node::new(
                    ecef,
                    Sample {
                        lon: lon[i],
                        lat: lat[i],
                        value: values[i],
                    },
                )
            })
            .collect())
    }

    /// Bulk-loads the index, replacing any previous contents. The packing
    /// pass builds a balanced, query-optimal tree and is much faster than
    /// repeated insertion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] on mismatched input lengths.
    pub fn packing(
        &mut self,
        lon: &[f64],
        lat: &[f64],
        alt: Option<&[f64]>,
        values: &[T],
    ) -> Result<()> {
        self.tree = RStar::bulk_load(self.nodes(lon, lat, alt, values)?);
        Ok(())
    }

    /// Inserts samples one by one, keeping the existing contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] on mismatched input lengths.
    pub fn insert(
        &mut self,
        lon: &[f64],
        lat: &[f64],
        alt: Option<&[f64]>,
        values: &[T],
    ) -> Result<()> {
        for node in self.nodes(lon, lat, alt, values)? {
            self.tree.insert(node);
        }
        Ok(())
    }

    fn geodesic(&self, lon: f64, lat: f64, sample: &Sample<T>) -> f64 {
        self.system
            .distance((lon, lat), (sample.lon, sample.lat), self.strategy)
    }

    /// Returns up to `k` neighbors of the target as `(geodesic distance,
    /// value)` pairs, closest first. With `within` set, an empty result is
    /// returned when the target is not covered by the axis-aligned ECEF
    /// bounding box of those neighbors, which forbids extrapolation.
    #[must_use]
    pub fn query(&self, lon: f64, lat: f64, k: usize, within: bool) -> Vec<(f64, T)> {
        let target = self.system.to_ecef(lon, lat, 0.0);
        let neighbors: Vec<&Node<T>> = self.tree.nearest_neighbor_iter(&target).take(k).collect();

        if within && !envelope_contains(&neighbors, target) {
            return Vec::new();
        }

        neighbors
            .into_iter()
            .map(|node| (self.geodesic(lon, lat, &node.data), node.data.value))
            .collect()
    }

    /// Returns every neighbor within a geodesic `radius` (meters) of the
    /// target, closest first.
    #[must_use]
    pub fn query_ball(&self, lon: f64, lat: f64, radius: f64) -> Vec<(f64, T)> {
        let target = self.system.to_ecef(lon, lat, 0.0);
        // the cartesian chord never exceeds the geodesic arc, so a chord
        // search with the same radius is a superset of the wanted ball
        let mut found: Vec<(f64, T)> = self
            .tree
            .locate_within_distance(target, radius * radius)
            .map(|node| (self.geodesic(lon, lat, &node.data), node.data.value))
            .filter(|(distance, _)| *distance <= radius)
            .collect();
        found.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        found
    }

    /// Inverse-distance weighting of the `k` nearest neighbors within
    /// `radius` (meters; infinite when `None`), vectorized over the
    /// targets. Returns the interpolated values and the number of neighbors
    /// that contributed to each.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] on mismatched input lengths and
    /// [`Error::InvalidArgument`] when `k` is zero.
    pub fn inverse_distance_weighting(
        &self,
        lon: &[f64],
        lat: &[f64],
        k: usize,
        radius: Option<f64>,
        exponent: i32,
        within: bool,
        num_threads: usize,
    ) -> Result<(Array1<f64>, Array1<u32>)> {
        self.check_query(lon, lat, k)?;
        let radius = radius.unwrap_or(f64::INFINITY);

        let mut out = vec![(f64::NAN, 0_u32); lon.len()];
        parallel::dispatch(&mut out, num_threads, |offset, slice| {
            for (i, result) in slice.iter_mut().enumerate() {
                let idx = offset + i;
                let neighbors = self.query(lon[idx], lat[idx], k, within);

                let mut numerator = 0.0;
                let mut denominator = 0.0;
                let mut count = 0_u32;
                let mut exact = None;
                for (distance, value) in neighbors {
                    if distance > radius {
                        continue;
                    }
                    if distance == 0.0 {
                        exact = Some(value.as_f64());
                    }
                    let weight = distance.powi(exponent).recip();
                    numerator = weight.mul_add(value.as_f64(), numerator);
                    denominator += weight;
                    count += 1;
                }
                *result = match exact {
                    Some(value) => (value, count),
                    None if count > 0 => (numerator / denominator, count),
                    None => (f64::NAN, 0),
                };
            }
            Ok(())
        })?;

        Ok(split_results(&out))
    }

    /// Radial-basis-function interpolation over the `k` nearest neighbors,
    /// vectorized over the targets. The kernel argument is the geodesic
    /// distance, like every distance handed back by queries. The linear
    /// system is solved per target; singular systems and `within`
    /// rejections yield NaN. `epsilon` defaults to the mean pairwise
    /// geodesic distance of the neighbors; `smooth` relaxes the
    /// interpolation constraint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] on mismatched input lengths and
    /// [`Error::InvalidArgument`] when `k` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn radial_basis_function(
        &self,
        lon: &[f64],
        lat: &[f64],
        k: usize,
        rbf: RadialBasisFunction,
        epsilon: Option<f64>,
        smooth: f64,
        within: bool,
        num_threads: usize,
    ) -> Result<(Array1<f64>, Array1<u32>)> {
        self.check_query(lon, lat, k)?;

        let mut out = vec![(f64::NAN, 0_u32); lon.len()];
        parallel::dispatch(&mut out, num_threads, |offset, slice| {
            for (i, result) in slice.iter_mut().enumerate() {
                let idx = offset + i;
                let target = self.system.to_ecef(lon[idx], lat[idx], 0.0);
                let neighbors: Vec<&Node<T>> =
                    self.tree.nearest_neighbor_iter(&target).take(k).collect();
                if neighbors.is_empty() || (within && !envelope_contains(&neighbors, target)) {
                    *result = (f64::NAN, 0);
                    continue;
                }

                *result = (
                    self.rbf_at(&neighbors, (lon[idx], lat[idx]), rbf, epsilon, smooth),
                    neighbors.len() as u32,
                );
            }
            Ok(())
        })?;

        Ok(split_results(&out))
    }

    /// Weighted average of the neighbors within `radius` (meters) using a
    /// taper window over the normalized geodesic distance, vectorized over
    /// the targets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] on mismatched input lengths and
    /// [`Error::InvalidArgument`] when `k` is zero or `radius` is not
    /// positive.
    #[allow(clippy::too_many_arguments)]
    pub fn window_function(
        &self,
        lon: &[f64],
        lat: &[f64],
        k: usize,
        radius: f64,
        window: WindowFunction,
        arg: Option<f64>,
        within: bool,
        num_threads: usize,
    ) -> Result<(Array1<f64>, Array1<u32>)> {
        self.check_query(lon, lat, k)?;
        if !(radius > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "the window radius must be positive, got {radius}"
            )));
        }
        let arg = arg.unwrap_or(0.5);

        let mut out = vec![(f64::NAN, 0_u32); lon.len()];
        parallel::dispatch(&mut out, num_threads, |offset, slice| {
            for (i, result) in slice.iter_mut().enumerate() {
                let idx = offset + i;
                let neighbors = self.query(lon[idx], lat[idx], k, within);

                let mut numerator = 0.0;
                let mut denominator = 0.0;
                let mut count = 0_u32;
                for (distance, value) in neighbors {
                    if distance > radius {
                        continue;
                    }
                    let weight = window.evaluate(distance / radius, arg);
                    numerator = weight.mul_add(value.as_f64(), numerator);
                    denominator += weight;
                    count += 1;
                }
                *result = if count > 0 && denominator != 0.0 {
                    (numerator / denominator, count)
                } else {
                    (f64::NAN, 0)
                };
            }
            Ok(())
        })?;

        Ok(split_results(&out))
    }

    /// Solves the dense RBF system on the neighbors and evaluates the
    /// resulting interpolant at the target. Every kernel argument is a
    /// geodesic distance; the cartesian positions only ever serve the index
    /// lookups. NaN when the system is singular.
    fn rbf_at(
        &self,
        neighbors: &[&Node<T>],
        target: (f64, f64),
        rbf: RadialBasisFunction,
        epsilon: Option<f64>,
        smooth: f64,
    ) -> f64 {
        let n = neighbors.len();

        let mut distances = Array2::zeros((n, n));
        for i in 0..n {
            for j in i + 1..n {
                let d = self.system.distance(
                    (neighbors[i].data.lon, neighbors[i].data.lat),
                    (neighbors[j].data.lon, neighbors[j].data.lat),
                    self.strategy,
                );
                distances[[i, j]] = d;
                distances[[j, i]] = d;
            }
        }

        let epsilon = epsilon.unwrap_or_else(|| {
            // mean pairwise geodesic distance between the neighbors
            let pairs = n * (n - 1) / 2;
            let sum: f64 = (0..n)
                .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
                .map(|(i, j)| distances[[i, j]])
                .sum();
            if pairs == 0 || sum == 0.0 {
                1.0
            } else {
                sum / pairs as f64
            }
        });

        let mut matrix = Array2::zeros((n, n));
        for i in 0..n {
            for j in 0..n {
                matrix[[i, j]] =
                    rbf.evaluate(distances[[i, j]], epsilon) + if i == j { smooth } else { 0.0 };
            }
        }
        let rhs: Vec<f64> = neighbors
            .iter()
            .map(|node| node.data.value.as_f64())
            .collect();

        let Some(weights) = solve(matrix, rhs) else {
            return f64::NAN;
        };

        neighbors
            .iter()
            .zip(&weights)
            .map(|(node, weight)| {
                weight * rbf.evaluate(self.geodesic(target.0, target.1, &node.data), epsilon)
            })
            .sum()
    }

    fn check_query(&self, lon: &[f64], lat: &[f64], k: usize) -> Result<()> {
        if lon.len() != lat.len() {
            return Err(Error::InvalidShape(format!(
                "coordinate vectors have mismatched lengths [{}, {}]",
                lon.len(),
                lat.len()
            )));
        }
        if k == 0 {
            return Err(Error::InvalidArgument(
                "at least one neighbor is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns `true` when `target` lies inside the axis-aligned bounding box
/// of the neighbor positions. This envelope is deliberately not the convex
/// hull: it is the cheap cartesian cover used to veto extrapolation.
fn envelope_contains<T>(neighbors: &[&Node<T>], target: [f64; 3]) -> bool {
    if neighbors.is_empty() {
        return false;
    }
    for axis in 0..3 {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for node in neighbors {
            min = min.min(node.geom()[axis]);
            max = max.max(node.geom()[axis]);
        }
        if target[axis] < min || target[axis] > max {
            return false;
        }
    }
    true
}

/// Gaussian elimination with partial pivoting; `None` when the matrix has
/// no usable pivot.
fn solve(mut matrix: Array2<f64>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    let scale = matrix.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 {
        return None;
    }

    for column in 0..n {
        let pivot = (column..n)
            .max_by(|&a, &b| {
                matrix[[a, column]]
                    .abs()
                    .partial_cmp(&matrix[[b, column]].abs())
                    .unwrap()
            })
            .unwrap();
        if matrix[[pivot, column]].abs() <= scale * 1e-13 {
            return None;
        }
        if pivot != column {
            for j in 0..n {
                let tmp = matrix[[pivot, j]];
                matrix[[pivot, j]] = matrix[[column, j]];
                matrix[[column, j]] = tmp;
            }
            rhs.swap(pivot, column);
        }

        for row in column + 1..n {
            let factor = matrix[[row, column]] / matrix[[column, column]];
            if factor == 0.0 {
                continue;
            }
            for j in column..n {
                matrix[[row, j]] -= factor * matrix[[column, j]];
            }
            rhs[row] -= factor * rhs[column];
        }
    }

    for row in (0..n).rev() {
        let mut sum = rhs[row];
        for j in row + 1..n {
            sum -= matrix[[row, j]] * rhs[j];
        }
        rhs[row] = sum / matrix[[row, row]];
    }
    Some(rhs)
}

fn split_results(out: &[(f64, u32)]) -> (Array1<f64>, Array1<u32>) {
    (
        out.iter().map(|(value, _)| *value).collect(),
        out.iter().map(|(_, count)| *count).collect(),
    )
}
