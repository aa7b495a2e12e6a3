//! Regular grids: a tuple of axes plus a borrowed value buffer.
//!
//! A grid never copies the caller's values; it borrows a row-major
//! [`ndarray`] view whose outermost dimension matches the first axis.
//! Missing samples are encoded as NaN. Grids are immutable; the only
//! normalization offered is [`Grid2::with_increasing_axes`], which flips
//! descending axes together with the matching view dimension.

use crate::axis::{Axis, Coordinate, TemporalAxis};
use crate::error::{Error, Result};
use ndarray::{ArrayView2, ArrayView3, ArrayView4};

/// Element type of a grid payload.
pub trait GridValue: Copy + Send + Sync + 'static {
    /// Widens the sample to `f64`, in which all arithmetic is carried out.
    fn as_f64(self) -> f64;

    /// Narrows an `f64` result back to the payload type.
    fn from_f64(value: f64) -> Self;
}

impl GridValue for f64 {
    fn as_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl GridValue for f32 {
    fn as_f64(self) -> f64 {
        f64::from(self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as Self
    }
}

fn check_axis(name: &str, len: usize, dim: usize) -> Result<()> {
    if len == dim {
        Ok(())
    } else {
        Err(Error::InvalidShape(format!(
            "the {name} axis has {len} coordinates but the values have {dim} along that dimension"
        )))
    }
}

/// A two-dimensional grid.
#[derive(Clone, Debug)]
pub struct Grid2<'a, T> {
    x: Axis,
    y: Axis,
    values: ArrayView2<'a, T>,
}

impl<'a, T: GridValue> Grid2<'a, T> {
    /// Binds two axes to a `(x, y)`-shaped value view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] if an axis length does not match the
    /// corresponding dimension of `values`.
    pub fn new(x: Axis, y: Axis, values: ArrayView2<'a, T>) -> Result<Self> {
        check_axis("x", x.len(), values.shape()[0])?;
        check_axis("y", y.len(), values.shape()[1])?;
        Ok(Self { x, y, values })
    }

    /// Returns an equivalent grid whose axes are all ascending, flipping
    /// the value view along every descending dimension.
    #[must_use]
    pub fn with_increasing_axes(mut self) -> Self {
        if !self.x.is_ascending() {
            self.x.flip();
            self.values.invert_axis(ndarray::Axis(0));
        }
        if !self.y.is_ascending() {
            self.y.flip();
            self.values.invert_axis(ndarray::Axis(1));
        }
        self
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

    /// Sample at the given node, widened to `f64`.
    #[must_use]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]].as_f64()
    }

    /// The underlying value view.
    #[must_use]
    pub fn values(&self) -> ArrayView2<'a, T> {
        self.values.clone()
    }
}

/// A three-dimensional grid; the third axis is either an [`Axis`] or a
/// [`TemporalAxis`].
#[derive(Clone, Debug)]
pub struct Grid3<'a, T, Z = Axis> {
    x: Axis,
    y: Axis,
    z: Z,
    values: ArrayView3<'a, T>,
}

/// A three-dimensional grid with a temporal third axis.
pub type TemporalGrid3<'a, T> = Grid3<'a, T, TemporalAxis>;

impl<'a, T: GridValue, Z: Coordinate> Grid3<'a, T, Z> {
    /// Binds three axes to a `(x, y, z)`-shaped value view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] if an axis length does not match the
    /// corresponding dimension of `values`.
    pub fn new(x: Axis, y: Axis, z: Z, values: ArrayView3<'a, T>) -> Result<Self> {
        check_axis("x", x.len(), values.shape()[0])?;
        check_axis("y", y.len(), values.shape()[1])?;
        check_axis("z", z.len(), values.shape()[2])?;
        Ok(Self { x, y, z, values })
    }

    /// Returns an equivalent grid whose axes are all ascending, flipping
    /// the value view along every descending dimension.
    #[must_use]
    pub fn with_increasing_axes(mut self) -> Self {
        if !self.x.is_ascending() {
            self.x.flip();
            self.values.invert_axis(ndarray::Axis(0));
        }
        if !self.y.is_ascending() {
            self.y.flip();
            self.values.invert_axis(ndarray::Axis(1));
        }
        if !self.z.is_ascending() {
            self.z.flip();
            self.values.invert_axis(ndarray::Axis(2));
        }
        self
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

    /// Z axis.
    #[must_use]
    pub fn z(&self) -> &Z {
        &self.z
    }

    /// Sample at the given node, widened to `f64`.
    #[must_use]
    pub fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[[i, j, k]].as_f64()
    }
}

/// A four-dimensional grid; the third axis is either an [`Axis`] or a
/// [`TemporalAxis`].
#[derive(Clone, Debug)]
pub struct Grid4<'a, T, Z = Axis> {
    x: Axis,
    y: Axis,
    z: Z,
    u: Axis,
    values: ArrayView4<'a, T>,
}

/// A four-dimensional grid with a temporal third axis.
pub type TemporalGrid4<'a, T> = Grid4<'a, T, TemporalAxis>;

impl<'a, T: GridValue, Z: Coordinate> Grid4<'a, T, Z> {
    /// Binds four axes to a `(x, y, z, u)`-shaped value view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] if an axis length does not match the
    /// corresponding dimension of `values`.
    pub fn new(x: Axis, y: Axis, z: Z, u: Axis, values: ArrayView4<'a, T>) -> Result<Self> {
        check_axis("x", x.len(), values.shape()[0])?;
        check_axis("y", y.len(), values.shape()[1])?;
        check_axis("z", z.len(), values.shape()[2])?;
        check_axis("u", u.len(), values.shape()[3])?;
        Ok(Self { x, y, z, u, values })
    }

    /// Returns an equivalent grid whose axes are all ascending, flipping
    /// the value view along every descending dimension.
    #[must_use]
    pub fn with_increasing_axes(mut self) -> Self {
        if !self.x.is_ascending() {
            self.x.flip();
            self.values.invert_axis(ndarray::Axis(0));
        }
        if !self.y.is_ascending() {
            self.y.flip();
            self.values.invert_axis(ndarray::Axis(1));
        }
        if !self.z.is_ascending() {
            self.z.flip();
            self.values.invert_axis(ndarray::Axis(2));
        }
        if !self.u.is_ascending() {
            self.u.flip();
            self.values.invert_axis(ndarray::Axis(3));
        }
        self
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

    /// Z axis.
    #[must_use]
    pub fn z(&self) -> &Z {
        &self.z
    }

    /// U axis.
    #[must_use]
    pub fn u(&self) -> &Axis {
        &self.u
    }

    /// Sample at the given node, widened to `f64`.
    #[must_use]
    pub fn value(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.values[[i, j, k, l]].as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn shape_validation() {
        let x = Axis::new(&[0.0, 1.0, 2.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let values = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];

        assert!(Grid2::new(x.clone(), y.clone(), values.view()).is_ok());
        assert!(Grid2::new(y.clone(), x.clone(), values.view()).is_err());

        let grid = Grid2::new(x, y, values.view()).unwrap();
        assert_eq!(grid.value(2, 1), 6.0);
    }

    #[test]
    fn increasing_axes_reorders_the_view() {
        let x = Axis::new(&[2.0, 1.0, 0.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let values = array![[5.0_f64, 6.0], [3.0, 4.0], [1.0, 2.0]];

        let grid = Grid2::new(x, y, values.view())
            .unwrap()
            .with_increasing_axes();

        assert!(grid.x().is_ascending());
        assert_eq!(grid.x().front(), 0.0);
        // the value at x = 0 moved to the front
        assert_eq!(grid.value(0, 0), 1.0);
        assert_eq!(grid.value(2, 1), 6.0);
    }

    #[test]
    fn temporal_grid() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let z = TemporalAxis::new(&[0, 3600], crate::axis::Resolution::Second).unwrap();
        let values = ndarray::Array3::<f64>::zeros((2, 2, 2));

        let grid = Grid3::new(x, y, z, values.view()).unwrap();
        assert_eq!(grid.z().len(), 2);
        assert_eq!(grid.value(0, 0, 1), 0.0);
    }

    #[test]
    fn increasing_axes_in_three_dimensions() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let z = TemporalAxis::new(&[20, 10, 0], crate::axis::Resolution::Second).unwrap();
        let values =
            ndarray::Array3::from_shape_fn((2, 2, 3), |(_, _, k)| 20.0 - 10.0 * k as f64);

        let grid = Grid3::new(x, y, z, values.view())
            .unwrap()
            .with_increasing_axes();

        assert!(grid.z().is_ascending());
        assert_eq!(grid.z().front(), 0);
        // the sample at z = 0 moved to the front
        assert_eq!(grid.value(0, 0, 0), 0.0);
        assert_eq!(grid.value(0, 0, 2), 20.0);
    }

    #[test]
    fn f32_payload_widens() {
        let x = Axis::new(&[0.0, 1.0], false).unwrap();
        let y = Axis::new(&[0.0, 1.0], false).unwrap();
        let values = array![[1.5_f32, 2.5], [3.5, f32::NAN]];

        let grid = Grid2::new(x, y, values.view()).unwrap();
        assert_eq!(grid.value(0, 1), 2.5);
        assert!(grid.value(1, 1).is_nan());
    }
}
