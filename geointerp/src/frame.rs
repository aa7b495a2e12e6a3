//! Local window ("frame") assembly for the windowed interpolators.
//!
//! A frame is a dense `2nx × 2ny` excerpt of a grid around a target,
//! together with strictly increasing coordinate vectors, so that the 1-D
//! fitting models can be applied along each direction without caring about
//! grid edges or the longitude seam. Circular axes wrap; straight axes are
//! extended under the boundary policy with mirrored node spacing.

use crate::axis::{Axis, Boundary};
use crate::grid::{Grid2, GridValue};
use ndarray::Array2;

/// One axis of a frame: the value indices to read and the matching strictly
/// increasing coordinates, plus the target coordinate expressed in the
/// frame's unwrapped system.
#[derive(Clone, Debug)]
pub(crate) struct Window {
    pub indices: Vec<usize>,
    pub coordinates: Vec<f64>,
    pub target: f64,
}

impl Window {
    /// Builds the window of `2 * half` nodes around `x`, which must lie
    /// inside the axis domain. Returns `None` when the window leaves the
    /// axis under [`Boundary::Undef`].
    pub(crate) fn new(axis: &Axis, x: f64, half: usize, boundary: Boundary) -> Option<Self> {
        let len = axis.len() as isize;
        let (i0, _) = axis.find_indexes(x)?;
        let first = i0 as isize - half as isize + 1;
        let count = 2 * half as isize;

        let mut indices = Vec::with_capacity(2 * half);
        let mut coordinates = Vec::with_capacity(2 * half);

        if axis.is_circle() {
            // wrap the indices and unwrap the coordinates by whole periods
            for raw in first..first + count {
                let index = raw.rem_euclid(len) as usize;
                indices.push(index);
                coordinates.push(
                    (raw.div_euclid(len) as f64)
                        .mul_add(axis.period(), axis.coordinate_value(index)),
                );
            }
            let base = coordinates[half - 1];
            let offset = (axis.normalize_coordinate(x)
                - axis.coordinate_value(indices[half - 1]))
            .rem_euclid(axis.period());
            return Some(Self {
                indices,
                coordinates,
                target: base + offset,
            });
        }

        for raw in first..first + count {
            let (index, coordinate) = if raw < 0 {
                let mirror = (-raw).min(len - 1) as usize;
                let index = match boundary {
                    Boundary::Expand => 0,
                    Boundary::Sym | Boundary::Wrap => mirror,
                    Boundary::Undef => return None,
                };
                (
                    index,
                    2.0_f64.mul_add(axis.front(), -axis.coordinate_value(mirror)),
                )
            } else if raw >= len {
                let mirror = (2 * (len - 1) - raw).max(0) as usize;
                let index = match boundary {
                    Boundary::Expand => len as usize - 1,
                    Boundary::Sym | Boundary::Wrap => mirror,
                    Boundary::Undef => return None,
                };
                (
                    index,
                    2.0_f64.mul_add(axis.back(), -axis.coordinate_value(mirror)),
                )
            } else {
                let index = raw as usize;
                (index, axis.coordinate_value(index))
            };
            indices.push(index);
            coordinates.push(coordinate);
        }

        Some(Self {
            indices,
            coordinates,
            target: x,
        })
    }
}

/// A dense `2nx × 2ny` window of grid samples.
#[derive(Clone, Debug)]
pub(crate) struct Frame2 {
    pub x: Window,
    pub y: Window,
    pub q: Array2<f64>,
}

impl Frame2 {
    /// Assembles the frame around `(x, y)` from the sample accessor `value`;
    /// both coordinates must lie inside their axis domain. Returns `None`
    /// when a window cannot be built under the boundary policy.
    pub(crate) fn load_with(
        xaxis: &Axis,
        yaxis: &Axis,
        value: impl Fn(usize, usize) -> f64,
        x: f64,
        y: f64,
        nx: usize,
        ny: usize,
        boundary: Boundary,
    ) -> Option<Self> {
        let wx = Window::new(xaxis, x, nx, boundary)?;
        let wy = Window::new(yaxis, y, ny, boundary)?;

        let mut q = Array2::zeros((2 * nx, 2 * ny));
        for (i, &ix) in wx.indices.iter().enumerate() {
            for (j, &jy) in wy.indices.iter().enumerate() {
                q[[i, j]] = value(ix, jy);
            }
        }

        Some(Self { x: wx, y: wy, q })
    }

    /// Assembles the frame around `(x, y)` on a two-dimensional grid.
    pub(crate) fn load<T: GridValue>(
        grid: &Grid2<'_, T>,
        x: f64,
        y: f64,
        nx: usize,
        ny: usize,
        boundary: Boundary,
    ) -> Option<Self> {
        Self::load_with(
            grid.x(),
            grid.y(),
            |i, j| grid.value(i, j),
            x,
            y,
            nx,
            ny,
            boundary,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use ndarray::Array2;

    fn axis() -> Axis {
        Axis::new(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], false).unwrap()
    }

    #[test]
    fn interior_window() {
        let window = Window::new(&axis(), 2.5, 2, Boundary::Undef).unwrap();

        assert_eq!(window.indices, vec![1, 2, 3, 4]);
        assert_eq!(window.coordinates, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(window.target, 2.5);
    }

    #[test]
    fn edge_window_policies() {
        let axis = axis();

        assert!(Window::new(&axis, 0.5, 2, Boundary::Undef).is_none());

        let expand = Window::new(&axis, 0.5, 2, Boundary::Expand).unwrap();
        assert_eq!(expand.indices, vec![0, 0, 1, 2]);
        assert_eq!(expand.coordinates, vec![-1.0, 0.0, 1.0, 2.0]);

        let sym = Window::new(&axis, 0.5, 2, Boundary::Sym).unwrap();
        assert_eq!(sym.indices, vec![1, 0, 1, 2]);
        assert_eq!(sym.coordinates, vec![-1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn circular_window_crosses_the_seam() {
        let values: Vec<f64> = (0..360).map(f64::from).collect();
        let axis = Axis::new(&values, true).unwrap();

        let window = Window::new(&axis, 359.5, 2, Boundary::Wrap).unwrap();
        assert_eq!(window.indices, vec![358, 359, 0, 1]);
        assert_eq!(window.coordinates, vec![358.0, 359.0, 360.0, 361.0]);
        assert_eq!(window.target, 359.5);

        // the same physical target labeled negatively gives the same window
        let window = Window::new(&axis, -0.5, 2, Boundary::Wrap).unwrap();
        assert_eq!(window.indices, vec![358, 359, 0, 1]);
        assert_eq!(window.target, 359.5);
    }

    #[test]
    fn frame_reads_the_grid_excerpt() {
        let x = axis();
        let y = Axis::new(&[10.0, 11.0, 12.0, 13.0], false).unwrap();
        let values =
            Array2::from_shape_fn((6, 4), |(i, j)| (i as f64).mul_add(10.0, j as f64));
        let grid = Grid2::new(x, y, values.view()).unwrap();

        let frame = Frame2::load(&grid, 2.5, 11.5, 2, 2, Boundary::Undef).unwrap();
        assert_eq!(frame.q[[0, 0]], 10.0);
        assert_eq!(frame.q[[3, 3]], 43.0);
        assert_eq!(frame.x.coordinates, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(frame.y.coordinates, vec![10.0, 11.0, 12.0, 13.0]);
    }
}
