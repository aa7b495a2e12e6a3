//! Grid interpolators.
//!
//! All entry points share the same contract: coordinate vectors of equal
//! length, a `bounds_error` switch deciding whether an out-of-domain target
//! fails the call or yields NaN, and a `num_threads` knob (0 = all logical
//! CPUs, 1 = sequential). Inputs are validated before any parallel region,
//! so a call either fails up front or runs to completion.

use crate::axis::{Axis, Boundary, Coordinate};
use crate::error::{Error, Result};
use crate::frame::Frame2;
use crate::grid::{Grid2, Grid3, Grid4, GridValue};
use crate::parallel;
use crate::spline::{FittingModel, Interpolator1D, Spline1D};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Point-location method of the bivariate family.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum BivariateMethod {
    /// Value of the closest of the four enclosing nodes.
    Nearest,
    /// Bilinear weights over the four enclosing nodes. NaN corners
    /// propagate.
    #[default]
    Bilinear,
    /// Inverse-distance weighting over the four enclosing nodes. NaN
    /// corners are skipped and the weights renormalized.
    InverseDistanceWeighting {
        /// Power applied to the distances, usually 1 or 2.
        exponent: i32,
    },
}

/// Window configuration of the bicubic family.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct BicubicConfig {
    /// Half-width of the window along x; the frame spans `2 * nx` nodes.
    pub nx: usize,
    /// Half-width of the window along y.
    pub ny: usize,
    /// Fitting model evaluated along each direction.
    pub fitting_model: FittingModel,
    /// Policy applied when the window leaves the grid.
    pub boundary: Boundary,
}

impl Default for BicubicConfig {
    fn default() -> Self {
        Self {
            nx: 2,
            ny: 2,
            fitting_model: FittingModel::CSpline,
            boundary: Boundary::Undef,
        }
    }
}

/// Textbook linear interpolation between `v0` and `v1`.
fn linear(t: f64, v0: f64, v1: f64) -> f64 {
    (1.0 - t).mul_add(v0, t * v1)
}

/// Bracket of `x`, or the `bounds_error` outcome: an `OutOfDomain` error or
/// `None` standing for a NaN result.
fn bracket_or<C: Coordinate>(
    axis: &C,
    x: C::Scalar,
    bounds_error: bool,
) -> Result<Option<(usize, usize)>> {
    match axis.find_indexes(x) {
        Some(bracket) => Ok(Some(bracket)),
        None if bounds_error => {
            let front = C::scalar_to_f64(axis.coordinate_value(0));
            let back = C::scalar_to_f64(axis.coordinate_value(axis.len() - 1));
            Err(Error::OutOfDomain {
                coordinate: C::scalar_to_f64(x),
                min: front.min(back),
                max: front.max(back),
            })
        }
        None => Ok(None),
    }
}

/// Coordinate distance between two bracketing nodes, measured the short way
/// around on circular axes.
fn axis_gap(axis: &Axis, i0: usize, i1: usize) -> f64 {
    if i0 == i1 {
        return 0.0;
    }
    let gap = axis.coordinate_value(i1) - axis.coordinate_value(i0);
    if axis.is_circle() {
        let gap = gap.rem_euclid(axis.period());
        if gap == 0.0 {
            axis.period()
        } else {
            gap
        }
    } else {
        gap.abs()
    }
}

/// Evaluates one target from the four corners of its enclosing cell.
fn kernel2(
    xaxis: &Axis,
    yaxis: &Axis,
    value: &impl Fn(usize, usize) -> f64,
    x: f64,
    y: f64,
    (i0, i1): (usize, usize),
    (j0, j1): (usize, usize),
    method: BivariateMethod,
) -> f64 {
    let tx = Coordinate::lerp_fraction(xaxis, x, i0, i1);
    let ty = Coordinate::lerp_fraction(yaxis, y, j0, j1);

    match method {
        BivariateMethod::Nearest => {
            let i = if tx <= 0.5 { i0 } else { i1 };
            let j = if ty <= 0.5 { j0 } else { j1 };
            value(i, j)
        }
        BivariateMethod::Bilinear => {
            let row0 = linear(tx, value(i0, j0), value(i1, j0));
            let row1 = linear(tx, value(i0, j1), value(i1, j1));
            linear(ty, row0, row1)
        }
        BivariateMethod::InverseDistanceWeighting { exponent } => {
            let gx = axis_gap(xaxis, i0, i1);
            let gy = axis_gap(yaxis, j0, j1);
            let corners = [
                (value(i0, j0), tx * gx, ty * gy),
                (value(i1, j0), (1.0 - tx) * gx, ty * gy),
                (value(i0, j1), tx * gx, (1.0 - ty) * gy),
                (value(i1, j1), (1.0 - tx) * gx, (1.0 - ty) * gy),
            ];

            let mut numerator = 0.0;
            let mut denominator = 0.0;
            for (corner, dx, dy) in corners {
                if corner.is_nan() {
                    continue;
                }
                let distance = dx.hypot(dy);
                if distance == 0.0 {
                    return corner;
                }
                let weight = distance.powi(exponent).recip();
                numerator = weight.mul_add(corner, numerator);
                denominator += weight;
            }
            if denominator == 0.0 {
                f64::NAN
            } else {
                numerator / denominator
            }
        }
    }
}

fn check_lengths(lengths: &[usize]) -> Result<()> {
    if lengths.windows(2).all(|pair| pair[0] == pair[1]) {
        Ok(())
    } else {
        Err(Error::InvalidShape(format!(
            "coordinate vectors have mismatched lengths {lengths:?}"
        )))
    }
}

/// Interpolates a two-dimensional grid at the given targets.
///
/// # Errors
///
/// Returns [`Error::InvalidShape`] on mismatched coordinate vectors and
/// [`Error::OutOfDomain`] when `bounds_error` is set and a target falls
/// outside a non-circular axis.
pub fn bivariate<T: GridValue>(
    grid: &Grid2<'_, T>,
    x: &[f64],
    y: &[f64],
    method: BivariateMethod,
    bounds_error: bool,
    num_threads: usize,
) -> Result<Array1<f64>> {
    check_lengths(&[x.len(), y.len()])?;

    let mut out = vec![0.0; x.len()];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (Some(bx), Some(by)) = (
                bracket_or(grid.x(), x[idx], bounds_error)?,
                bracket_or(grid.y(), y[idx], bounds_error)?,
            ) else {
                *result = f64::NAN;
                continue;
            };
            *result = kernel2(
                grid.x(),
                grid.y(),
                &|i, j| grid.value(i, j),
                x[idx],
                y[idx],
                bx,
                by,
                method,
            );
        }
        Ok(())
    })?;

    Ok(Array1::from_vec(out))
}

/// Interpolates a three-dimensional grid: bivariate in `(x, y)` on the two
/// bracketing z-planes, then linear in z.
///
/// # Errors
///
/// See [`bivariate`].
pub fn trivariate<T: GridValue, Z: Coordinate>(
    grid: &Grid3<'_, T, Z>,
    x: &[f64],
    y: &[f64],
    z: &[Z::Scalar],
    method: BivariateMethod,
    bounds_error: bool,
    num_threads: usize,
) -> Result<Array1<f64>> {
    check_lengths(&[x.len(), y.len(), z.len()])?;

    let mut out = vec![0.0; x.len()];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (Some(bx), Some(by), Some((k0, k1))) = (
                bracket_or(grid.x(), x[idx], bounds_error)?,
                bracket_or(grid.y(), y[idx], bounds_error)?,
                bracket_or(grid.z(), z[idx], bounds_error)?,
            ) else {
                *result = f64::NAN;
                continue;
            };
            let tz = grid.z().lerp_fraction(z[idx], k0, k1);
            let v0 = kernel2(
                grid.x(),
                grid.y(),
                &|i, j| grid.value(i, j, k0),
                x[idx],
                y[idx],
                bx,
                by,
                method,
            );
            let v1 = kernel2(
                grid.x(),
                grid.y(),
                &|i, j| grid.value(i, j, k1),
                x[idx],
                y[idx],
                bx,
                by,
                method,
            );
            *result = linear(tz, v0, v1);
        }
        Ok(())
    })?;

    Ok(Array1::from_vec(out))
}

/// Interpolates a four-dimensional grid: trivariate in `(x, y, z)` on the
/// two bracketing u-hyperplanes, then linear in u.
///
/// # Errors
///
/// See [`bivariate`].
pub fn quadrivariate<T: GridValue, Z: Coordinate>(
    grid: &Grid4<'_, T, Z>,
    x: &[f64],
    y: &[f64],
    z: &[Z::Scalar],
    u: &[f64],
    method: BivariateMethod,
    bounds_error: bool,
    num_threads: usize,
) -> Result<Array1<f64>> {
    check_lengths(&[x.len(), y.len(), z.len(), u.len()])?;

    let mut out = vec![0.0; x.len()];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (Some(bx), Some(by), Some((k0, k1)), Some((l0, l1))) = (
                bracket_or(grid.x(), x[idx], bounds_error)?,
                bracket_or(grid.y(), y[idx], bounds_error)?,
                bracket_or(grid.z(), z[idx], bounds_error)?,
                bracket_or(grid.u(), u[idx], bounds_error)?,
            ) else {
                *result = f64::NAN;
                continue;
            };
            let tz = grid.z().lerp_fraction(z[idx], k0, k1);
            let tu = grid.u().lerp_fraction(u[idx], l0, l1);

            let mut planes = [0.0; 2];
            for (plane, l) in planes.iter_mut().zip([l0, l1]) {
                let v0 = kernel2(
                    grid.x(),
                    grid.y(),
                    &|i, j| grid.value(i, j, k0, l),
                    x[idx],
                    y[idx],
                    bx,
                    by,
                    method,
                );
                let v1 = kernel2(
                    grid.x(),
                    grid.y(),
                    &|i, j| grid.value(i, j, k1, l),
                    x[idx],
                    y[idx],
                    bx,
                    by,
                    method,
                );
                *plane = linear(tz, v0, v1);
            }
            *result = linear(tu, planes[0], planes[1]);
        }
        Ok(())
    })?;

    Ok(Array1::from_vec(out))
}

/// Validates the frame geometry of a bicubic call against the two horizontal
/// axes.
fn validate_frame(xaxis: &Axis, yaxis: &Axis, config: BicubicConfig) -> Result<()> {
    for (name, axis, half) in [("x", xaxis, config.nx), ("y", yaxis, config.ny)] {
        if half < 1 {
            return Err(Error::InvalidArgument(format!(
                "the {name} window half-width must be at least 1"
            )));
        }
        if 2 * half < config.fitting_model.min_size() {
            return Err(Error::InvalidArgument(format!(
                "a {:?} fit requires at least {} points, but the {name} window only spans {}",
                config.fitting_model,
                config.fitting_model.min_size(),
                2 * half,
            )));
        }
        if !axis.is_circle() && axis.len() < 2 * half {
            return Err(Error::InvalidArgument(format!(
                "the {name} axis has {} coordinates, fewer than the window span {}",
                axis.len(),
                2 * half,
            )));
        }
        if !axis.is_ascending() {
            return Err(Error::InvalidArgument(format!(
                "the {name} axis must be ascending; normalize the grid first"
            )));
        }
    }
    if config.boundary == Boundary::Wrap && !xaxis.is_circle() {
        return Err(Error::InvalidArgument(
            "the Wrap boundary requires a circular x axis".to_string(),
        ));
    }
    Ok(())
}

/// Per-worker state of the bicubic family: one fitting workspace and the
/// two evaluation buffers, reused across targets.
struct FrameEvaluator {
    spline: Spline1D,
    row: Vec<f64>,
    column: Vec<f64>,
}

impl FrameEvaluator {
    fn new(config: BicubicConfig) -> Result<Self> {
        Ok(Self {
            spline: Spline1D::new(config.fitting_model, 2 * config.nx.min(config.ny))?,
            row: Vec::new(),
            column: Vec::new(),
        })
    }

    /// Fits the 1-D model along x for every frame row, then across the row
    /// results along y.
    fn evaluate(&mut self, frame: &Frame2) -> f64 {
        self.column.clear();
        for j in 0..frame.y.indices.len() {
            self.row.clear();
            for i in 0..frame.x.indices.len() {
                self.row.push(frame.q[[i, j]]);
            }
            self.column
                .push(self.spline.interpolate(&frame.x.coordinates, &self.row, frame.x.target));
        }
        self.spline
            .interpolate(&frame.y.coordinates, &self.column, frame.y.target)
    }
}

/// Bicubic (windowed spline) interpolation of a two-dimensional grid.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] on an unusable window configuration,
/// and otherwise behaves like [`bivariate`].
pub fn bicubic<T: GridValue>(
    grid: &Grid2<'_, T>,
    x: &[f64],
    y: &[f64],
    config: BicubicConfig,
    bounds_error: bool,
    num_threads: usize,
) -> Result<Array1<f64>> {
    check_lengths(&[x.len(), y.len()])?;
    validate_frame(grid.x(), grid.y(), config)?;

    let mut out = vec![0.0; x.len()];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        let mut evaluator = FrameEvaluator::new(config)?;
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (Some(_), Some(_)) = (
                bracket_or(grid.x(), x[idx], bounds_error)?,
                bracket_or(grid.y(), y[idx], bounds_error)?,
            ) else {
                *result = f64::NAN;
                continue;
            };
            *result = Frame2::load(grid, x[idx], y[idx], config.nx, config.ny, config.boundary)
                .map_or(f64::NAN, |frame| evaluator.evaluate(&frame));
        }
        Ok(())
    })?;

    Ok(Array1::from_vec(out))
}

/// Bicubic interpolation of a three-dimensional grid: the 2-D spline on the
/// two bracketing z-planes, closed with linear interpolation in z.
///
/// # Errors
///
/// See [`bicubic`].
pub fn bicubic3<T: GridValue, Z: Coordinate>(
    grid: &Grid3<'_, T, Z>,
    x: &[f64],
    y: &[f64],
    z: &[Z::Scalar],
    config: BicubicConfig,
    bounds_error: bool,
    num_threads: usize,
) -> Result<Array1<f64>> {
    check_lengths(&[x.len(), y.len(), z.len()])?;
    validate_frame(grid.x(), grid.y(), config)?;

    let mut out = vec![0.0; x.len()];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        let mut evaluator = FrameEvaluator::new(config)?;
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (Some(_), Some(_), Some((k0, k1))) = (
                bracket_or(grid.x(), x[idx], bounds_error)?,
                bracket_or(grid.y(), y[idx], bounds_error)?,
                bracket_or(grid.z(), z[idx], bounds_error)?,
            ) else {
                *result = f64::NAN;
                continue;
            };
            let tz = grid.z().lerp_fraction(z[idx], k0, k1);
            let mut planes = [f64::NAN; 2];
            for (plane, level) in planes.iter_mut().zip([k0, k1]) {
                *plane = Frame2::load_with(
                    grid.x(),
                    grid.y(),
                    |i, j| grid.value(i, j, level),
                    x[idx],
                    y[idx],
                    config.nx,
                    config.ny,
                    config.boundary,
                )
                .map_or(f64::NAN, |frame| evaluator.evaluate(&frame));
            }
            *result = linear(tz, planes[0], planes[1]);
        }
        Ok(())
    })?;

    Ok(Array1::from_vec(out))
}

/// Bicubic interpolation of a four-dimensional grid: [`bicubic3`] on the two
/// bracketing u-hyperplanes, closed with linear interpolation in u.
///
/// # Errors
///
/// See [`bicubic`].
pub fn bicubic4<T: GridValue, Z: Coordinate>(
    grid: &Grid4<'_, T, Z>,
    x: &[f64],
    y: &[f64],
    z: &[Z::Scalar],
    u: &[f64],
    config: BicubicConfig,
    bounds_error: bool,
    num_threads: usize,
) -> Result<Array1<f64>> {
    check_lengths(&[x.len(), y.len(), z.len(), u.len()])?;
    validate_frame(grid.x(), grid.y(), config)?;

    let mut out = vec![0.0; x.len()];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        let mut evaluator = FrameEvaluator::new(config)?;
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (Some(_), Some(_), Some((k0, k1)), Some((l0, l1))) = (
                bracket_or(grid.x(), x[idx], bounds_error)?,
                bracket_or(grid.y(), y[idx], bounds_error)?,
                bracket_or(grid.z(), z[idx], bounds_error)?,
                bracket_or(grid.u(), u[idx], bounds_error)?,
            ) else {
                *result = f64::NAN;
                continue;
            };
            let tz = grid.z().lerp_fraction(z[idx], k0, k1);
            let tu = grid.u().lerp_fraction(u[idx], l0, l1);

            let mut hyperplanes = [f64::NAN; 2];
            for (hyperplane, outer) in hyperplanes.iter_mut().zip([l0, l1]) {
                let mut planes = [f64::NAN; 2];
                for (plane, level) in planes.iter_mut().zip([k0, k1]) {
                    *plane = Frame2::load_with(
                        grid.x(),
                        grid.y(),
                        |i, j| grid.value(i, j, level, outer),
                        x[idx],
                        y[idx],
                        config.nx,
                        config.ny,
                        config.boundary,
                    )
                    .map_or(f64::NAN, |frame| evaluator.evaluate(&frame));
                }
                *hyperplane = linear(tz, planes[0], planes[1]);
            }
            *result = linear(tu, hyperplanes[0], hyperplanes[1]);
        }
        Ok(())
    })?;

    Ok(Array1::from_vec(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Resolution;
    use crate::axis::TemporalAxis;
    use float_cmp::assert_approx_eq;
    use ndarray::{Array2, Array3, Array4};

    fn plane_grid() -> (Axis, Axis, Array2<f64>) {
        let x = Axis::new(&[-1.0, 0.0, 1.0, 2.0], false).unwrap();
        let y = Axis::new(&[-2.0, -1.0, 0.0, 1.0], false).unwrap();
        let values = Array2::from_shape_fn((4, 4), |(i, j)| {
            let xv = -1.0 + i as f64;
            let yv = -2.0 + j as f64;
            2.0 * xv - 3.0 * yv + 1.0
        });
        (x, y, values)
    }

    #[test]
    fn bilinear_and_bicubic_agree_on_a_plane() {
        let (x, y, values) = plane_grid();
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let expected = 2.0_f64 * 0.37 - 3.0 * (-0.12) + 1.0;
        let result = bivariate(
            &grid,
            &[0.37],
            &[-0.12],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        assert_approx_eq!(f64, result[0], expected, epsilon = 1e-12);
        assert_approx_eq!(f64, result[0], 2.10, epsilon = 1e-12);

        let result = bicubic(
            &grid,
            &[0.37],
            &[-0.12],
            BicubicConfig::default(),
            true,
            1,
        )
        .unwrap();
        assert_approx_eq!(f64, result[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn node_targets_return_the_node_value() {
        let (x, y, values) = plane_grid();
        let expected = values[[1, 1]];
        let grid = Grid2::new(x, y, values.view()).unwrap();

        for method in [
            BivariateMethod::Nearest,
            BivariateMethod::Bilinear,
            BivariateMethod::InverseDistanceWeighting { exponent: 2 },
        ] {
            let result = bivariate(&grid, &[0.0], &[-1.0], method, true, 1).unwrap();
            assert_eq!(result[0], expected);
        }

        let result = bicubic(&grid, &[0.0], &[-1.0], BicubicConfig::default(), true, 1).unwrap();
        assert_approx_eq!(f64, result[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn nan_corner_handling() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let mut values = Array2::from_elem((2, 2), 1.0);
        values[[1, 1]] = f64::NAN;
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let bilinear = bivariate(
            &grid,
            &[0.5],
            &[0.5],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        assert!(bilinear[0].is_nan());

        let idw = bivariate(
            &grid,
            &[0.5],
            &[0.5],
            BivariateMethod::InverseDistanceWeighting { exponent: 2 },
            true,
            1,
        )
        .unwrap();
        assert_approx_eq!(f64, idw[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn nearest_ties_resolve_to_the_lower_node() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let values = ndarray::array![[10.0, 20.0], [30.0, 40.0]];
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let result = bivariate(&grid, &[0.5], &[0.5], BivariateMethod::Nearest, true, 1).unwrap();
        assert_eq!(result[0], 10.0);
    }

    #[test]
    fn bounds_error_switch() {
        let (x, y, values) = plane_grid();
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let result = bivariate(
            &grid,
            &[5.0],
            &[0.0],
            BivariateMethod::Bilinear,
            false,
            1,
        )
        .unwrap();
        assert!(result[0].is_nan());

        let error = bivariate(&grid, &[5.0], &[0.0], BivariateMethod::Bilinear, true, 1);
        assert!(matches!(error, Err(Error::OutOfDomain { .. })));
    }

    #[test]
    fn seam_labeling_does_not_change_the_result() {
        let lon_values: Vec<f64> = (0..360).map(f64::from).collect();
        let lon = Axis::new(&lon_values, true).unwrap();
        let lat = Axis::new(&[-1.0, 0.0, 1.0, 2.0], false).unwrap();
        let values = Array2::from_shape_fn((360, 4), |(i, j)| {
            (i as f64).to_radians().cos() + 0.1 * j as f64
        });
        let grid = Grid2::new(lon, lat, values.view()).unwrap();

        let east = bivariate(
            &grid,
            &[359.5],
            &[0.5],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        let west = bivariate(
            &grid,
            &[-0.5],
            &[0.5],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        assert_eq!(east[0], west[0]);

        let config = BicubicConfig {
            boundary: Boundary::Wrap,
            ..BicubicConfig::default()
        };
        let east = bicubic(&grid, &[359.5], &[0.5], config, true, 1).unwrap();
        let west = bicubic(&grid, &[-0.5], &[0.5], config, true, 1).unwrap();
        assert_eq!(east[0], west[0]);
        // the target sits at longitude 359.5 and latitude 0.5
        assert_approx_eq!(f64, east[0], 0.5_f64.to_radians().cos() + 0.15, epsilon = 1e-4);
    }

    #[test]
    fn trivariate_linear_field() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let z = Axis::new(&[0.0, 1.0], false).unwrap();
        let values = Array3::from_shape_fn((2, 2, 2), |(i, j, k)| {
            i as f64 + 2.0 * j as f64 + 3.0 * k as f64
        });
        let grid = Grid3::new(x, y, z, values.view()).unwrap();

        let result = trivariate(
            &grid,
            &[0.5],
            &[0.5],
            &[0.5],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        assert_approx_eq!(f64, result[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn trivariate_temporal_axis() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let z = TemporalAxis::new(&[0, 10], Resolution::Second).unwrap();
        let values = Array3::from_shape_fn((2, 2, 2), |(_, _, k)| 10.0 * k as f64);
        let grid = Grid3::new(x, y, z, values.view()).unwrap();

        let result = trivariate(
            &grid,
            &[0.5],
            &[0.5],
            &[5_i64],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        assert_approx_eq!(f64, result[0], 5.0, epsilon = 1e-12);

        assert!(matches!(
            trivariate(
                &grid,
                &[0.5],
                &[0.5],
                &[11_i64],
                BivariateMethod::Bilinear,
                true,
                1,
            ),
            Err(Error::OutOfDomain { .. })
        ));
    }

    #[test]
    fn quadrivariate_linear_field() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let z = Axis::new(&[0.0, 1.0], false).unwrap();
        let u = Axis::new(&[0.0, 1.0], false).unwrap();
        let values = Array4::from_shape_fn((2, 2, 2, 2), |(i, j, k, l)| {
            i as f64 + j as f64 + k as f64 + l as f64
        });
        let grid = Grid4::new(x, y, z, u, values.view()).unwrap();

        let result = quadrivariate(
            &grid,
            &[0.5],
            &[0.5],
            &[0.5],
            &[0.5],
            BivariateMethod::Bilinear,
            true,
            1,
        )
        .unwrap();
        assert_approx_eq!(f64, result[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let x_values: Vec<f64> = (0..24).map(f64::from).collect();
        let y_values: Vec<f64> = (0..16).map(f64::from).collect();
        let x = Axis::new(&x_values, false).unwrap();
        let y = Axis::new(&y_values, false).unwrap();
        let values = Array2::from_shape_fn((24, 16), |(i, j)| {
            (i as f64 * 0.3).sin() + (j as f64 * 0.7).cos()
        });
        let grid = Grid2::new(x, y, values.view()).unwrap();

        // keep every target far enough from the edges for the 4x4 frame
        let tx: Vec<f64> = (0..200).map(|i| f64::from(i).mul_add(0.1, 1.3)).collect();
        let ty: Vec<f64> = (0..200).map(|i| f64::from(i).mul_add(0.06, 1.4)).collect();

        for method in [
            BivariateMethod::Bilinear,
            BivariateMethod::InverseDistanceWeighting { exponent: 2 },
        ] {
            let sequential = bivariate(&grid, &tx, &ty, method, true, 1).unwrap();
            let parallel = bivariate(&grid, &tx, &ty, method, true, 4).unwrap();
            assert_eq!(sequential, parallel);
        }

        let sequential = bicubic(&grid, &tx, &ty, BicubicConfig::default(), true, 1).unwrap();
        let parallel = bicubic(&grid, &tx, &ty, BicubicConfig::default(), true, 4).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn window_configuration_is_validated() {
        let (x, y, values) = plane_grid();
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let config = BicubicConfig {
            fitting_model: FittingModel::Akima,
            ..BicubicConfig::default()
        };
        assert!(matches!(
            bicubic(&grid, &[0.0], &[0.0], config, true, 1),
            Err(Error::InvalidArgument(_))
        ));

        let config = BicubicConfig {
            boundary: Boundary::Wrap,
            ..BicubicConfig::default()
        };
        assert!(matches!(
            bicubic(&grid, &[0.0], &[0.0], config, true, 1),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn undef_boundary_yields_nan_near_the_edge() {
        let (x, y, values) = plane_grid();
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let result = bicubic(
            &grid,
            &[-0.9],
            &[0.0],
            BicubicConfig::default(),
            false,
            1,
        )
        .unwrap();
        assert!(result[0].is_nan());

        let config = BicubicConfig {
            boundary: Boundary::Expand,
            ..BicubicConfig::default()
        };
        let result = bicubic(&grid, &[-0.9], &[0.0], config, false, 1).unwrap();
        assert!(result[0].is_finite());
    }
}
