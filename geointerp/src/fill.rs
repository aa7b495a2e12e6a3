//! Gap filling of gridded fields.
//!
//! Two strategies fill the NaN cells of a two-dimensional field: an
//! iterative Poisson relaxation that extends the surrounding field
//! harmonically into the gaps, and a LOESS pass that replaces each gap with
//! a tri-cube weighted average of its defined neighbors.

use crate::error::{Error, Result};
use crate::grid::{Grid2, GridValue};
use crate::parallel;
use ndarray::{Array2, ArrayViewMut2};
use serde::{Deserialize, Serialize};

/// Value assigned to the undefined cells before the first relaxation sweep.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum FirstGuess {
    /// Start from zero.
    Zero,
    /// Start from the average of the defined values sharing the same y row,
    /// falling back to the global average.
    #[default]
    ZonalAverage,
}

/// Mirror or wrap a neighbor offset of `i` on an axis of length `len`.
fn neighbor(i: usize, offset: isize, len: usize, circular: bool) -> usize {
    let len = len as isize;
    let mut raw = i as isize + offset;
    if circular {
        return raw.rem_euclid(len) as usize;
    }
    if len == 1 {
        return 0;
    }
    while raw < 0 || raw >= len {
        if raw < 0 {
            raw = -raw;
        }
        if raw >= len {
            raw = 2 * (len - 1) - raw;
        }
    }
    raw as usize
}

/// Fills the NaN cells of `values` by relaxing the discrete Poisson
/// equation, in place. The first grid dimension is x (wrapping when
/// `is_circle` is set), the second is y (mirrored at the edges).
///
/// Returns the number of sweeps performed and the largest absolute update of
/// the last sweep. A call that stops on `max_iterations` without reaching
/// `epsilon` logs a warning.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `relaxation` is outside `(0, 2)`,
/// if `max_iterations` is zero, or if the field has no defined value at all.
pub fn poisson<T: GridValue>(
    mut values: ArrayViewMut2<'_, T>,
    is_circle: bool,
    first_guess: FirstGuess,
    max_iterations: usize,
    epsilon: f64,
    relaxation: f64,
    num_threads: usize,
) -> Result<(usize, f64)> {
    if !(0.0..2.0).contains(&relaxation) || relaxation == 0.0 {
        return Err(Error::InvalidArgument(format!(
            "the relaxation factor must lie in (0, 2), got {relaxation}"
        )));
    }
    if max_iterations == 0 {
        return Err(Error::InvalidArgument(
            "max_iterations must be at least one sweep".to_string(),
        ));
    }

    let (len_x, len_y) = values.dim();
    let mut work = Array2::<f64>::zeros((len_x, len_y));
    let mut masked = Vec::new();
    for ((i, j), value) in values.indexed_iter() {
        let value = value.as_f64();
        work[[i, j]] = value;
        if value.is_nan() {
            masked.push((i, j));
        }
    }

    if masked.is_empty() {
        return Ok((0, 0.0));
    }
    if masked.len() == len_x * len_y {
        return Err(Error::InvalidArgument(
            "cannot fill a field with no defined value".to_string(),
        ));
    }

    // first guess over the masked cells
    let defined_mean = |slice: ndarray::ArrayView1<'_, f64>| {
        let mut sum = 0.0;
        let mut count = 0_usize;
        for &value in slice {
            if !value.is_nan() {
                sum += value;
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f64)
    };
    let global_mean = {
        let mut sum = 0.0;
        let mut count = 0_usize;
        for &value in &work {
            if !value.is_nan() {
                sum += value;
                count += 1;
            }
        }
        sum / count as f64
    };
    for &(i, j) in &masked {
        work[[i, j]] = match first_guess {
            FirstGuess::Zero => 0.0,
            FirstGuess::ZonalAverage => {
                defined_mean(work.column(j)).unwrap_or(global_mean)
            }
        };
    }

    let mut iteration = 0;
    let mut max_residual = f64::INFINITY;
    while iteration < max_iterations && max_residual > epsilon {
        iteration += 1;

        // Jacobi sweep: every update reads the state of the previous sweep,
        // so workers share `work` read-only and the updates are applied
        // after the join
        let states = parallel::fold(masked.len(), num_threads, |range| {
            let mut updates = Vec::with_capacity(range.len());
            let mut residual = 0.0_f64;
            for &(i, j) in &masked[range] {
                let stencil = work[[neighbor(i, -1, len_x, is_circle), j]]
                    + work[[neighbor(i, 1, len_x, is_circle), j]]
                    + work[[i, neighbor(j, -1, len_y, false)]]
                    + work[[i, neighbor(j, 1, len_y, false)]];
                let delta = relaxation * (0.25 * stencil - work[[i, j]]);
                residual = residual.max(delta.abs());
                updates.push(work[[i, j]] + delta);
            }
            Ok((updates, residual))
        })?;

        max_residual = 0.0;
        let mut cells = masked.iter();
        for (updates, residual) in states {
            max_residual = max_residual.max(residual);
            for update in updates {
                let &(i, j) = cells.next().expect("one update per masked cell");
                work[[i, j]] = update;
            }
        }
    }

    if max_residual > epsilon {
        log::warn!(
            "poisson relaxation stopped after {iteration} sweeps with residual {max_residual:e}"
        );
    }

    for &(i, j) in &masked {
        values[[i, j]] = T::from_f64(work[[i, j]]);
    }

    Ok((iteration, max_residual))
}

/// Fills the NaN cells of `grid` with a tri-cube weighted average of the
/// defined samples in the `(2nx + 1) × (2ny + 1)` window around each gap,
/// and returns the filled field. Cells whose window holds no defined sample
/// stay NaN; defined cells are passed through unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if a window half-width is zero.
pub fn loess<T: GridValue>(
    grid: &Grid2<'_, T>,
    nx: usize,
    ny: usize,
    num_threads: usize,
) -> Result<Array2<f64>> {
    if nx == 0 || ny == 0 {
        return Err(Error::InvalidArgument(
            "the loess window half-widths must be at least 1".to_string(),
        ));
    }

    let len_x = grid.x().len();
    let len_y = grid.y().len();
    let circular = grid.x().is_circle();

    let mut out = vec![0.0_f64; len_x * len_y];
    parallel::dispatch(&mut out, num_threads, |offset, slice| {
        for (k, result) in slice.iter_mut().enumerate() {
            let idx = offset + k;
            let (i, j) = (idx / len_y, idx % len_y);
            let value = grid.value(i, j);
            if !value.is_nan() {
                *result = value;
                continue;
            }

            let mut numerator = 0.0;
            let mut denominator = 0.0;
            for di in -(nx as isize)..=nx as isize {
                for dj in -(ny as isize)..=ny as isize {
                    let sample = grid.value(
                        neighbor(i, di, len_x, circular),
                        neighbor(j, dj, len_y, false),
                    );
                    if sample.is_nan() {
                        continue;
                    }
                    let distance = (di as f64 / nx as f64)
                        .hypot(dj as f64 / ny as f64);
                    if distance < 1.0 {
                        let weight = (1.0 - distance.powi(3)).powi(3);
                        numerator = weight.mul_add(sample, numerator);
                        denominator += weight;
                    }
                }
            }
            *result = if denominator > 0.0 {
                numerator / denominator
            } else {
                f64::NAN
            };
        }
        Ok(())
    })?;

    Array2::from_shape_vec((len_x, len_y), out)
        .map_err(|err| Error::InvalidShape(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use float_cmp::assert_approx_eq;
    use ndarray::array;

    #[test]
    fn poisson_fills_a_single_hole() {
        let mut values = Array2::from_elem((3, 3), 1.0_f64);
        values[[1, 1]] = f64::NAN;

        let (iterations, residual) = poisson(
            values.view_mut(),
            false,
            FirstGuess::Zero,
            500,
            1e-9,
            1.0,
            1,
        )
        .unwrap();

        assert!(iterations < 500);
        assert!(residual <= 1e-9);
        assert_approx_eq!(f64, values[[1, 1]], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn poisson_residuals_decrease_monotonically() {
        let build = || {
            let mut values = Array2::from_shape_fn((8, 8), |(i, j)| {
                (i as f64 * 0.8).sin() + (j as f64 * 0.5).cos()
            });
            for (i, j) in [(2, 2), (2, 3), (3, 2), (3, 3), (5, 6), (6, 1)] {
                values[[i, j]] = f64::NAN;
            }
            values
        };

        let mut residuals = Vec::new();
        for sweeps in 1..8 {
            let mut values = build();
            let (_, residual) = poisson(
                values.view_mut(),
                false,
                FirstGuess::Zero,
                sweeps,
                f64::MIN_POSITIVE,
                1.0,
                1,
            )
            .unwrap();
            residuals.push(residual);
        }

        for pair in residuals.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-15, "{residuals:?}");
        }
    }

    #[test]
    fn poisson_zonal_average_first_guess() {
        let mut values = array![[1.0, f64::NAN], [3.0, f64::NAN], [5.0, 4.0]];

        // one sweep with a tiny relaxation keeps the guess almost unchanged
        poisson(
            values.view_mut(),
            false,
            FirstGuess::ZonalAverage,
            1,
            1e-12,
            1e-9,
            1,
        )
        .unwrap();

        // column 1 only has 4.0 defined
        assert_approx_eq!(f64, values[[0, 1]], 4.0, epsilon = 1e-6);
        assert_approx_eq!(f64, values[[1, 1]], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn poisson_rejects_bad_arguments() {
        let mut values = Array2::from_elem((2, 2), 1.0_f64);
        assert!(poisson(
            values.view_mut(),
            false,
            FirstGuess::Zero,
            10,
            1e-6,
            2.5,
            1
        )
        .is_err());

        let mut undefined = Array2::from_elem((2, 2), f64::NAN);
        assert!(poisson(
            undefined.view_mut(),
            false,
            FirstGuess::Zero,
            10,
            1e-6,
            1.0,
            1
        )
        .is_err());
    }

    #[test]
    fn poisson_without_gaps_is_a_no_op() {
        let mut values = Array2::from_elem((4, 4), 2.5_f64);
        let copy = values.clone();

        let (iterations, residual) =
            poisson(values.view_mut(), false, FirstGuess::Zero, 10, 1e-6, 1.0, 1).unwrap();

        assert_eq!(iterations, 0);
        assert_eq!(residual, 0.0);
        assert_eq!(values, copy);
    }

    #[test]
    fn loess_fills_a_constant_field() {
        let x = Axis::new(&[0.0, 1.0, 2.0, 3.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0, 2.0, 3.0], false).unwrap();
        let mut values = Array2::from_elem((4, 4), 7.0_f64);
        values[[1, 2]] = f64::NAN;
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let filled = loess(&grid, 2, 2, 1).unwrap();
        assert_approx_eq!(f64, filled[[1, 2]], 7.0, epsilon = 1e-12);
        assert_eq!(filled[[0, 0]], 7.0);
    }

    #[test]
    fn loess_leaves_isolated_regions_undefined() {
        let x = Axis::new(&[0.0, 1.0, 2.0, 3.0, 4.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0, 2.0, 3.0, 4.0], false).unwrap();
        let values = Array2::from_elem((5, 5), f64::NAN);
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let filled = loess(&grid, 1, 1, 1).unwrap();
        assert!(filled.iter().all(|value| value.is_nan()));
    }

    #[test]
    fn loess_parallel_matches_sequential() {
        let x_values: Vec<f64> = (0..12).map(f64::from).collect();
        let x = Axis::new(&x_values, false).unwrap();
        let y = Axis::new(&x_values, false).unwrap();
        let mut values = Array2::from_shape_fn((12, 12), |(i, j)| (i + j) as f64);
        values[[4, 4]] = f64::NAN;
        values[[9, 2]] = f64::NAN;
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let sequential = loess(&grid, 2, 2, 1).unwrap();
        let parallel = loess(&grid, 2, 2, 4).unwrap();
        assert_eq!(sequential, parallel);
    }
}
