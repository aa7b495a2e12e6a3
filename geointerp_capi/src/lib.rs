//! C-language interface for `geointerp`.
//!
//! Every fallible function returns a [`ResultCode`]; `Success` is zero.
//! Input and output buffers are caller-owned contiguous arrays, value
//! buffers are row-major with the x axis outermost. Objects handed out by
//! the `*_new` constructors are deleted with the matching `*_delete`
//! function; passing a foreign pointer anywhere is undefined behavior.

use geointerp::axis::{Axis, Boundary};
use geointerp::binning::Binning2D;
use geointerp::error::Error;
use geointerp::fill::{self, FirstGuess};
use geointerp::grid::{Grid2, Grid3};
use geointerp::histogram::Histogram2D;
use geointerp::interpolation::{self, BicubicConfig, BivariateMethod};
use geointerp::rtree::{RTree, RadialBasisFunction, WindowFunction};
use geointerp::spline::FittingModel;
use itertools::izip;
use ndarray::{ArrayView2, ArrayView3, ArrayViewMut2};
use std::slice;

/// Outcome of a call.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultCode {
    /// The call completed.
    Success = 0,
    /// Mismatched array shapes.
    InvalidShape,
    /// An argument is outside the accepted set.
    InvalidArgument,
    /// A target lies outside a non-circular axis and `bounds_error` was
    /// requested.
    OutOfDomain,
    /// The operation requires an evenly spaced axis.
    NotRegular,
    /// A dense linear system has no unique solution.
    SingularSystem,
    /// The worker pool could not be created.
    ThreadPool,
}

impl From<&Error> for ResultCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::InvalidShape(_) => Self::InvalidShape,
            Error::InvalidArgument(_) => Self::InvalidArgument,
            Error::OutOfDomain { .. } => Self::OutOfDomain,
            Error::NotRegular => Self::NotRegular,
            Error::SingularSystem => Self::SingularSystem,
            Error::ThreadPool(_) => Self::ThreadPool,
        }
    }
}

fn code_of<T>(result: &geointerp::Result<T>) -> ResultCode {
    match result {
        Ok(_) => ResultCode::Success,
        Err(error) => error.into(),
    }
}

/// Interpolation method of the bivariate family.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// Value of the closest enclosing node.
    Nearest,
    /// Bilinear weights over the enclosing nodes.
    Bilinear,
    /// Inverse-distance weighting with the `exponent` argument.
    InverseDistanceWeighting,
}

impl Method {
    fn with_exponent(self, exponent: i32) -> BivariateMethod {
        match self {
            Self::Nearest => BivariateMethod::Nearest,
            Self::Bilinear => BivariateMethod::Bilinear,
            Self::InverseDistanceWeighting => {
                BivariateMethod::InverseDistanceWeighting { exponent }
            }
        }
    }
}

/// Univariate fitting model of the bicubic family.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fitting {
    /// Piecewise linear.
    Linear,
    /// Newton polynomial over the window.
    Polynomial,
    /// Natural cubic spline.
    CSpline,
    /// Periodic cubic spline.
    CSplinePeriodic,
    /// Akima's piecewise cubic.
    Akima,
    /// Periodic Akima.
    AkimaPeriodic,
    /// Steffen's monotone cubic.
    Steffen,
}

impl From<Fitting> for FittingModel {
    fn from(fitting: Fitting) -> Self {
        match fitting {
            Fitting::Linear => Self::Linear,
            Fitting::Polynomial => Self::Polynomial,
            Fitting::CSpline => Self::CSpline,
            Fitting::CSplinePeriodic => Self::CSplinePeriodic,
            Fitting::Akima => Self::Akima,
            Fitting::AkimaPeriodic => Self::AkimaPeriodic,
            Fitting::Steffen => Self::Steffen,
        }
    }
}

/// Boundary policy of windowed operations.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoundaryPolicy {
    /// Clamp to the edge value.
    Expand,
    /// Wrap around (circular x axis only).
    Wrap,
    /// Mirror about the edge.
    Sym,
    /// Windows leaving the grid give NaN.
    Undef,
}

impl From<BoundaryPolicy> for Boundary {
    fn from(policy: BoundaryPolicy) -> Self {
        match policy {
            BoundaryPolicy::Expand => Self::Expand,
            BoundaryPolicy::Wrap => Self::Wrap,
            BoundaryPolicy::Sym => Self::Sym,
            BoundaryPolicy::Undef => Self::Undef,
        }
    }
}

/// Radial basis function selector.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rbf {
    /// `r`.
    Linear,
    /// `r³`.
    Cubic,
    /// `r² ln r`.
    ThinPlate,
    /// Gaussian.
    Gaussian,
    /// Multiquadric.
    Multiquadric,
    /// Inverse multiquadric.
    InverseMultiquadric,
}

impl From<Rbf> for RadialBasisFunction {
    fn from(rbf: Rbf) -> Self {
        match rbf {
            Rbf::Linear => Self::Linear,
            Rbf::Cubic => Self::Cubic,
            Rbf::ThinPlate => Self::ThinPlate,
            Rbf::Gaussian => Self::Gaussian,
            Rbf::Multiquadric => Self::Multiquadric,
            Rbf::InverseMultiquadric => Self::InverseMultiquadric,
        }
    }
}

/// Window function selector.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Window {
    /// Blackman window.
    Blackman,
    /// Blackman-Harris window.
    BlackmanHarris,
    /// Constant weight.
    Boxcar,
    /// Flat-top window.
    FlatTop,
    /// Normalized sinc.
    Lanczos,
    /// Gaussian taper.
    Gaussian,
    /// Hamming window.
    Hamming,
    /// Hann window.
    Hann,
    /// Nuttall window.
    Nuttall,
    /// Parzen window.
    Parzen,
    /// Welch window.
    Welch,
}

impl From<Window> for WindowFunction {
    fn from(window: Window) -> Self {
        match window {
            Window::Blackman => Self::Blackman,
            Window::BlackmanHarris => Self::BlackmanHarris,
            Window::Boxcar => Self::Boxcar,
            Window::FlatTop => Self::FlatTop,
            Window::Lanczos => Self::Lanczos,
            Window::Gaussian => Self::Gaussian,
            Window::Hamming => Self::Hamming,
            Window::Hann => Self::Hann,
            Window::Nuttall => Self::Nuttall,
            Window::Parzen => Self::Parzen,
            Window::Welch => Self::Welch,
        }
    }
}

/// Per-cell statistic of a binning.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Statistic {
    /// Number of samples.
    Count,
    /// Sum of the sample weights.
    SumOfWeights,
    /// Weighted sum.
    Sum,
    /// Weighted mean.
    Mean,
    /// Smallest sample.
    Min,
    /// Largest sample.
    Max,
    /// Weighted variance (uses the `ddof` argument).
    Variance,
    /// Weighted skewness.
    Skewness,
    /// Weighted excess kurtosis.
    Kurtosis,
}

// ---------------------------------------------------------------------------
// axis
// ---------------------------------------------------------------------------

/// Creates an axis from `len` coordinates and returns a pointer to it. If
/// no longer needed, the object should be deleted using
/// [`geointerp_axis_delete`]. The `NULL` pointer is returned when the
/// coordinates are empty or not strictly monotonic.
///
/// # Safety
///
/// `values` must point to `len` readable doubles.
#[no_mangle]
#[must_use]
pub unsafe extern "C" fn geointerp_axis_new(
    values: *const f64,
    len: usize,
    is_circle: bool,
) -> Option<Box<Axis>> {
    let values = unsafe { slice::from_raw_parts(values, len) };
    Axis::new(values, is_circle).map(Box::new).ok()
}

/// Delete an axis previously created with [`geointerp_axis_new`].
///
/// # Safety
///
/// If `axis` does not point to a valid `Axis` object, this function is not
/// safe to call. If `axis` is a `NULL` pointer, this function does not do
/// anything.
#[no_mangle]
#[allow(unused_variables)]
pub unsafe extern "C" fn geointerp_axis_delete(axis: Option<Box<Axis>>) {}

/// Number of coordinates of `axis`.
///
/// # Safety
///
/// `axis` must point to a valid axis.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_len(axis: *const Axis) -> usize {
    unsafe { &*axis }.len()
}

/// Returns `true` when the coordinates of `axis` are evenly spaced.
///
/// # Safety
///
/// `axis` must point to a valid axis.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_is_regular(axis: *const Axis) -> bool {
    unsafe { &*axis }.is_regular()
}

/// Returns `true` when the coordinates of `axis` increase with the index.
///
/// # Safety
///
/// `axis` must point to a valid axis.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_is_ascending(axis: *const Axis) -> bool {
    unsafe { &*axis }.is_ascending()
}

/// Returns `true` when `axis` wraps around a period.
///
/// # Safety
///
/// `axis` must point to a valid axis.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_is_circle(axis: *const Axis) -> bool {
    unsafe { &*axis }.is_circle()
}

/// Writes the step of an evenly spaced axis into `increment`.
///
/// # Safety
///
/// `axis` must point to a valid axis and `increment` to a writable double.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_increment(
    axis: *const Axis,
    increment: *mut f64,
) -> ResultCode {
    let result = unsafe { &*axis }.increment();
    if let Ok(value) = result {
        unsafe { *increment = value };
    }
    code_of(&result)
}

/// Reverses `axis` in place.
///
/// # Safety
///
/// `axis` must point to a valid axis.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_flip(axis: *mut Axis) {
    unsafe { &mut *axis }.flip();
}

/// For each of the `len` coordinates in `x`, writes the index of the closest
/// axis node into `indexes`, or `-1` when the coordinate is out of range and
/// `bounded` is `false`.
///
/// # Safety
///
/// `axis` must point to a valid axis, `x` to `len` readable doubles and
/// `indexes` to `len` writable 64-bit integers.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_find_index(
    axis: *const Axis,
    x: *const f64,
    len: usize,
    bounded: bool,
    indexes: *mut i64,
) {
    let axis = unsafe { &*axis };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let indexes = unsafe { slice::from_raw_parts_mut(indexes, len) };
    for (value, index) in izip!(x, indexes) {
        *index = axis
            .find_index(*value, bounded)
            .map_or(-1, |found| found as i64);
    }
}

/// For each of the `len` coordinates in `x`, writes the bracketing index
/// pair into `indexes` (two entries per coordinate), or `-1, -1` when the
/// coordinate has no bracket.
///
/// # Safety
///
/// `axis` must point to a valid axis, `x` to `len` readable doubles and
/// `indexes` to `2 * len` writable 64-bit integers.
#[no_mangle]
pub unsafe extern "C" fn geointerp_axis_find_indexes(
    axis: *const Axis,
    x: *const f64,
    len: usize,
    indexes: *mut i64,
) {
    let axis = unsafe { &*axis };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let indexes = unsafe { slice::from_raw_parts_mut(indexes, 2 * len) };
    for (value, pair) in izip!(x, indexes.chunks_exact_mut(2)) {
        let (i0, i1) = axis
            .find_indexes(*value)
            .map_or((-1, -1), |(i0, i1)| (i0 as i64, i1 as i64));
        pair[0] = i0;
        pair[1] = i1;
    }
}

// ---------------------------------------------------------------------------
// grid interpolation
// ---------------------------------------------------------------------------

/// Interpolates a 2-D field at `len` targets. `values` is the row-major
/// `x_axis.len() × y_axis.len()` sample buffer; results are written into
/// `results`.
///
/// # Safety
///
/// The axes must be valid, `values` must hold the full grid, `x`, `y` and
/// `results` must each point to `len` doubles.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_bivariate(
    x_axis: *const Axis,
    y_axis: *const Axis,
    values: *const f64,
    x: *const f64,
    y: *const f64,
    len: usize,
    method: Method,
    exponent: i32,
    bounds_error: bool,
    num_threads: usize,
    results: *mut f64,
) -> ResultCode {
    let x_axis = unsafe { &*x_axis };
    let y_axis = unsafe { &*y_axis };
    let values =
        unsafe { slice::from_raw_parts(values, x_axis.len() * y_axis.len()) };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let y = unsafe { slice::from_raw_parts(y, len) };
    let results = unsafe { slice::from_raw_parts_mut(results, len) };

    let Ok(view) = ArrayView2::from_shape((x_axis.len(), y_axis.len()), values) else {
        return ResultCode::InvalidShape;
    };
    let grid = match Grid2::new(x_axis.clone(), y_axis.clone(), view) {
        Ok(grid) => grid,
        Err(error) => return (&error).into(),
    };

    let outcome = interpolation::bivariate(
        &grid,
        x,
        y,
        method.with_exponent(exponent),
        bounds_error,
        num_threads,
    );
    if let Ok(ref computed) = outcome {
        results.copy_from_slice(computed.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

/// Interpolates a 3-D field at `len` targets: bivariate on the bracketing
/// z-planes, linear in z. `values` is row-major
/// `x_axis.len() × y_axis.len() × z_axis.len()`.
///
/// # Safety
///
/// See [`geointerp_bivariate`]; `z` must also point to `len` doubles.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_trivariate(
    x_axis: *const Axis,
    y_axis: *const Axis,
    z_axis: *const Axis,
    values: *const f64,
    x: *const f64,
    y: *const f64,
    z: *const f64,
    len: usize,
    method: Method,
    exponent: i32,
    bounds_error: bool,
    num_threads: usize,
    results: *mut f64,
) -> ResultCode {
    let x_axis = unsafe { &*x_axis };
    let y_axis = unsafe { &*y_axis };
    let z_axis = unsafe { &*z_axis };
    let values = unsafe {
        slice::from_raw_parts(values, x_axis.len() * y_axis.len() * z_axis.len())
    };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let y = unsafe { slice::from_raw_parts(y, len) };
    let z = unsafe { slice::from_raw_parts(z, len) };
    let results = unsafe { slice::from_raw_parts_mut(results, len) };

    let Ok(view) =
        ArrayView3::from_shape((x_axis.len(), y_axis.len(), z_axis.len()), values)
    else {
        return ResultCode::InvalidShape;
    };
    let grid = match Grid3::new(x_axis.clone(), y_axis.clone(), z_axis.clone(), view) {
        Ok(grid) => grid,
        Err(error) => return (&error).into(),
    };

    let outcome = interpolation::trivariate(
        &grid,
        x,
        y,
        z,
        method.with_exponent(exponent),
        bounds_error,
        num_threads,
    );
    if let Ok(ref computed) = outcome {
        results.copy_from_slice(computed.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

/// Bicubic interpolation of a 2-D field at `len` targets over a
/// `2 nx × 2 ny` window.
///
/// # Safety
///
/// See [`geointerp_bivariate`].
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_bicubic(
    x_axis: *const Axis,
    y_axis: *const Axis,
    values: *const f64,
    x: *const f64,
    y: *const f64,
    len: usize,
    nx: usize,
    ny: usize,
    fitting: Fitting,
    boundary: BoundaryPolicy,
    bounds_error: bool,
    num_threads: usize,
    results: *mut f64,
) -> ResultCode {
    let x_axis = unsafe { &*x_axis };
    let y_axis = unsafe { &*y_axis };
    let values =
        unsafe { slice::from_raw_parts(values, x_axis.len() * y_axis.len()) };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let y = unsafe { slice::from_raw_parts(y, len) };
    let results = unsafe { slice::from_raw_parts_mut(results, len) };

    let Ok(view) = ArrayView2::from_shape((x_axis.len(), y_axis.len()), values) else {
        return ResultCode::InvalidShape;
    };
    let grid = match Grid2::new(x_axis.clone(), y_axis.clone(), view) {
        Ok(grid) => grid,
        Err(error) => return (&error).into(),
    };

    let config = BicubicConfig {
        nx,
        ny,
        fitting_model: fitting.into(),
        boundary: boundary.into(),
    };
    let outcome = interpolation::bicubic(&grid, x, y, config, bounds_error, num_threads);
    if let Ok(ref computed) = outcome {
        results.copy_from_slice(computed.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

// ---------------------------------------------------------------------------
// gap filling
// ---------------------------------------------------------------------------

/// Fills the NaN cells of the row-major `len_x × len_y` buffer `values` in
/// place by Poisson relaxation. Writes the number of sweeps into
/// `iterations` and the final residual into `residual`.
///
/// # Safety
///
/// `values` must point to `len_x * len_y` writable doubles; `iterations`
/// and `residual` must be writable.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_poisson(
    values: *mut f64,
    len_x: usize,
    len_y: usize,
    is_circle: bool,
    zonal_average_first_guess: bool,
    max_iterations: usize,
    epsilon: f64,
    relaxation: f64,
    num_threads: usize,
    iterations: *mut usize,
    residual: *mut f64,
) -> ResultCode {
    let values = unsafe { slice::from_raw_parts_mut(values, len_x * len_y) };
    let Ok(view) = ArrayViewMut2::from_shape((len_x, len_y), values) else {
        return ResultCode::InvalidShape;
    };

    let first_guess = if zonal_average_first_guess {
        FirstGuess::ZonalAverage
    } else {
        FirstGuess::Zero
    };
    let outcome = fill::poisson(
        view,
        is_circle,
        first_guess,
        max_iterations,
        epsilon,
        relaxation,
        num_threads,
    );
    if let Ok((sweeps, largest)) = outcome {
        unsafe {
            *iterations = sweeps;
            *residual = largest;
        }
    }
    code_of(&outcome)
}

/// Fills the NaN cells of a 2-D field with a tri-cube weighted average of
/// the surrounding `(2 nx + 1) × (2 ny + 1)` window and writes the filled
/// field into `results`.
///
/// # Safety
///
/// The axes must be valid; `values` and `results` must each hold the full
/// row-major grid.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_loess(
    x_axis: *const Axis,
    y_axis: *const Axis,
    values: *const f64,
    nx: usize,
    ny: usize,
    num_threads: usize,
    results: *mut f64,
) -> ResultCode {
    let x_axis = unsafe { &*x_axis };
    let y_axis = unsafe { &*y_axis };
    let values =
        unsafe { slice::from_raw_parts(values, x_axis.len() * y_axis.len()) };
    let results =
        unsafe { slice::from_raw_parts_mut(results, x_axis.len() * y_axis.len()) };

    let Ok(view) = ArrayView2::from_shape((x_axis.len(), y_axis.len()), values) else {
        return ResultCode::InvalidShape;
    };
    let grid = match Grid2::new(x_axis.clone(), y_axis.clone(), view) {
        Ok(grid) => grid,
        Err(error) => return (&error).into(),
    };

    let outcome = fill::loess(&grid, nx, ny, num_threads);
    if let Ok(ref filled) = outcome {
        results.copy_from_slice(filled.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

// ---------------------------------------------------------------------------
// spatial index
// ---------------------------------------------------------------------------

/// Creates an empty spatial index over the WGS-84 ellipsoid and returns a
/// pointer to it. If no longer needed, the object should be deleted using
/// [`geointerp_rtree_delete`].
#[no_mangle]
#[must_use]
pub extern "C" fn geointerp_rtree_new() -> Box<RTree<f64>> {
    Box::new(RTree::default())
}

/// Delete a spatial index previously created with [`geointerp_rtree_new`].
///
/// # Safety
///
/// If `tree` does not point to a valid index, this function is not safe to
/// call. If `tree` is a `NULL` pointer, this function does not do anything.
#[no_mangle]
#[allow(unused_variables)]
pub unsafe extern "C" fn geointerp_rtree_delete(tree: Option<Box<RTree<f64>>>) {}

/// Number of samples stored in the index.
///
/// # Safety
///
/// `tree` must point to a valid index.
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_len(tree: *const RTree<f64>) -> usize {
    unsafe { &*tree }.len()
}

/// Removes every sample from the index.
///
/// # Safety
///
/// `tree` must point to a valid index.
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_clear(tree: *mut RTree<f64>) {
    unsafe { &mut *tree }.clear();
}

unsafe fn rtree_load(
    tree: *mut RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    alt: *const f64,
    values: *const f64,
    len: usize,
    packing: bool,
) -> ResultCode {
    let tree = unsafe { &mut *tree };
    let lon = unsafe { slice::from_raw_parts(lon, len) };
    let lat = unsafe { slice::from_raw_parts(lat, len) };
    let alt = if alt.is_null() {
        None
    } else {
        Some(unsafe { slice::from_raw_parts(alt, len) })
    };
    let values = unsafe { slice::from_raw_parts(values, len) };

    let outcome = if packing {
        tree.packing(lon, lat, alt, values)
    } else {
        tree.insert(lon, lat, alt, values)
    };
    code_of(&outcome)
}

/// Bulk-loads `len` samples, replacing the index contents. `alt` may be the
/// null pointer for samples on the ellipsoid surface.
///
/// # Safety
///
/// `tree` must point to a valid index; `lon`, `lat`, `values` (and `alt`
/// when non-null) must each point to `len` readable doubles.
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_packing(
    tree: *mut RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    alt: *const f64,
    values: *const f64,
    len: usize,
) -> ResultCode {
    unsafe { rtree_load(tree, lon, lat, alt, values, len, true) }
}

/// Inserts `len` samples, keeping the index contents.
///
/// # Safety
///
/// See [`geointerp_rtree_packing`].
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_insert(
    tree: *mut RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    alt: *const f64,
    values: *const f64,
    len: usize,
) -> ResultCode {
    unsafe { rtree_load(tree, lon, lat, alt, values, len, false) }
}

/// Writes the `k` nearest neighbors of each of the `len` targets into the
/// `len × k` row-major buffers `distances` (geodesic meters) and `values`,
/// padding missing neighbors with NaN, and the number found into `counts`.
///
/// # Safety
///
/// `tree` must point to a valid index; `lon` and `lat` must point to `len`
/// doubles, `distances` and `values` to `len * k` writable doubles and
/// `counts` to `len` writable 32-bit integers.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_query(
    tree: *const RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    len: usize,
    k: usize,
    within: bool,
    distances: *mut f64,
    values: *mut f64,
    counts: *mut u32,
) {
    let tree = unsafe { &*tree };
    let lon = unsafe { slice::from_raw_parts(lon, len) };
    let lat = unsafe { slice::from_raw_parts(lat, len) };
    let distances = unsafe { slice::from_raw_parts_mut(distances, len * k) };
    let values = unsafe { slice::from_raw_parts_mut(values, len * k) };
    let counts = unsafe { slice::from_raw_parts_mut(counts, len) };

    for (i, (&lon, &lat)) in izip!(lon, lat).enumerate() {
        let neighbors = tree.query(lon, lat, k, within);
        counts[i] = neighbors.len() as u32;
        for j in 0..k {
            let (distance, value) = neighbors
                .get(j)
                .copied()
                .unwrap_or((f64::NAN, f64::NAN));
            distances[i * k + j] = distance;
            values[i * k + j] = value;
        }
    }
}

/// Inverse-distance weighting of the `k` nearest neighbors of each target.
/// A non-positive `radius` means unbounded. Writes the estimates into
/// `results` and the neighbor counts into `counts`.
///
/// # Safety
///
/// `tree` must point to a valid index; `lon`, `lat` and `results` must
/// point to `len` doubles and `counts` to `len` writable 32-bit integers.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_inverse_distance_weighting(
    tree: *const RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    len: usize,
    k: usize,
    radius: f64,
    exponent: i32,
    within: bool,
    num_threads: usize,
    results: *mut f64,
    counts: *mut u32,
) -> ResultCode {
    let tree = unsafe { &*tree };
    let lon = unsafe { slice::from_raw_parts(lon, len) };
    let lat = unsafe { slice::from_raw_parts(lat, len) };
    let results = unsafe { slice::from_raw_parts_mut(results, len) };
    let counts = unsafe { slice::from_raw_parts_mut(counts, len) };

    let radius = (radius > 0.0).then_some(radius);
    let outcome =
        tree.inverse_distance_weighting(lon, lat, k, radius, exponent, within, num_threads);
    if let Ok((values, found)) = &outcome {
        results.copy_from_slice(values.as_slice().expect("contiguous result"));
        counts.copy_from_slice(found.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

/// Radial-basis-function interpolation over the `k` nearest neighbors of
/// each target. A NaN `epsilon` selects the mean neighbor distance.
///
/// # Safety
///
/// See [`geointerp_rtree_inverse_distance_weighting`].
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_radial_basis_function(
    tree: *const RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    len: usize,
    k: usize,
    rbf: Rbf,
    epsilon: f64,
    smooth: f64,
    within: bool,
    num_threads: usize,
    results: *mut f64,
    counts: *mut u32,
) -> ResultCode {
    let tree = unsafe { &*tree };
    let lon = unsafe { slice::from_raw_parts(lon, len) };
    let lat = unsafe { slice::from_raw_parts(lat, len) };
    let results = unsafe { slice::from_raw_parts_mut(results, len) };
    let counts = unsafe { slice::from_raw_parts_mut(counts, len) };

    let epsilon = (!epsilon.is_nan()).then_some(epsilon);
    let outcome = tree.radial_basis_function(
        lon,
        lat,
        k,
        rbf.into(),
        epsilon,
        smooth,
        within,
        num_threads,
    );
    if let Ok((values, found)) = &outcome {
        results.copy_from_slice(values.as_slice().expect("contiguous result"));
        counts.copy_from_slice(found.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

/// Window-function average of the neighbors within `radius` meters of each
/// target. A NaN `arg` selects the default taper parameter.
///
/// # Safety
///
/// See [`geointerp_rtree_inverse_distance_weighting`].
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_rtree_window_function(
    tree: *const RTree<f64>,
    lon: *const f64,
    lat: *const f64,
    len: usize,
    k: usize,
    radius: f64,
    window: Window,
    arg: f64,
    within: bool,
    num_threads: usize,
    results: *mut f64,
    counts: *mut u32,
) -> ResultCode {
    let tree = unsafe { &*tree };
    let lon = unsafe { slice::from_raw_parts(lon, len) };
    let lat = unsafe { slice::from_raw_parts(lat, len) };
    let results = unsafe { slice::from_raw_parts_mut(results, len) };
    let counts = unsafe { slice::from_raw_parts_mut(counts, len) };

    let arg = (!arg.is_nan()).then_some(arg);
    let outcome = tree.window_function(
        lon,
        lat,
        k,
        radius,
        window.into(),
        arg,
        within,
        num_threads,
    );
    if let Ok((values, found)) = &outcome {
        results.copy_from_slice(values.as_slice().expect("contiguous result"));
        counts.copy_from_slice(found.as_slice().expect("contiguous result"));
    }
    code_of(&outcome)
}

// ---------------------------------------------------------------------------
// binning
// ---------------------------------------------------------------------------

/// Creates a 2-D binning over the cells of the given axes and returns a
/// pointer to it. If no longer needed, the object should be deleted using
/// [`geointerp_binning2d_delete`]. With `geodetic` set, linear binning
/// weighs cells by spherical areas on WGS-84.
///
/// # Safety
///
/// The axes must be valid; they are copied into the binning.
#[no_mangle]
#[must_use]
pub unsafe extern "C" fn geointerp_binning2d_new(
    x_axis: *const Axis,
    y_axis: *const Axis,
    geodetic: bool,
) -> Box<Binning2D> {
    let x_axis = unsafe { &*x_axis };
    let y_axis = unsafe { &*y_axis };
    let system = geodetic.then(geointerp::geodetic::System::default);
    Box::new(Binning2D::new(x_axis.clone(), y_axis.clone(), system))
}

/// Delete a binning previously created with [`geointerp_binning2d_new`].
///
/// # Safety
///
/// If `binning` does not point to a valid `Binning2D` object, this function
/// is not safe to call. If `binning` is a `NULL` pointer, this function
/// does not do anything.
#[no_mangle]
#[allow(unused_variables)]
pub unsafe extern "C" fn geointerp_binning2d_delete(binning: Option<Box<Binning2D>>) {}

/// Resets every cell of the binning.
///
/// # Safety
///
/// `binning` must point to a valid binning.
#[no_mangle]
pub unsafe extern "C" fn geointerp_binning2d_clear(binning: *mut Binning2D) {
    unsafe { &mut *binning }.clear();
}

/// Pushes `len` samples into the binning; nearest-cell routing when
/// `simple`, linear binning otherwise.
///
/// # Safety
///
/// `binning` must point to a valid binning; `x`, `y` and `z` must each
/// point to `len` readable doubles.
#[allow(clippy::too_many_arguments)]
#[no_mangle]
pub unsafe extern "C" fn geointerp_binning2d_push(
    binning: *mut Binning2D,
    x: *const f64,
    y: *const f64,
    z: *const f64,
    len: usize,
    simple: bool,
    num_threads: usize,
) -> ResultCode {
    let binning = unsafe { &mut *binning };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let y = unsafe { slice::from_raw_parts(y, len) };
    let z = unsafe { slice::from_raw_parts(z, len) };

    code_of(&binning.push(x, y, z, simple, num_threads))
}

/// Merges the cells of `other` into `binning`; the axes must match.
///
/// # Safety
///
/// Both pointers must reference valid, distinct binnings.
#[no_mangle]
pub unsafe extern "C" fn geointerp_binning2d_merge(
    binning: *mut Binning2D,
    other: *const Binning2D,
) -> ResultCode {
    let binning = unsafe { &mut *binning };
    let other = unsafe { &*other };
    code_of(&binning.merge(other))
}

/// Writes the per-cell statistic into the row-major
/// `x_axis.len() × y_axis.len()` buffer `results`. `ddof` is only used by
/// [`Statistic::Variance`].
///
/// # Safety
///
/// `binning` must point to a valid binning and `results` to the full grid
/// of writable doubles.
#[no_mangle]
pub unsafe extern "C" fn geointerp_binning2d_statistic(
    binning: *const Binning2D,
    statistic: Statistic,
    ddof: f64,
    results: *mut f64,
) {
    let binning = unsafe { &*binning };
    let computed = match statistic {
        Statistic::Count => binning.count(),
        Statistic::SumOfWeights => binning.sum_of_weights(),
        Statistic::Sum => binning.sum(),
        Statistic::Mean => binning.mean(),
        Statistic::Min => binning.min(),
        Statistic::Max => binning.max(),
        Statistic::Variance => binning.variance(ddof),
        Statistic::Skewness => binning.skewness(),
        Statistic::Kurtosis => binning.kurtosis(),
    };
    let results =
        unsafe { slice::from_raw_parts_mut(results, computed.len()) };
    results.copy_from_slice(computed.as_slice().expect("contiguous result"));
}

// ---------------------------------------------------------------------------
// histograms
// ---------------------------------------------------------------------------

/// Creates a 2-D histogram binning bounded to `max_bins` centroids per
/// cell and returns a pointer to it. If no longer needed, the object
/// should be deleted using [`geointerp_histogram2d_delete`].
///
/// # Safety
///
/// The axes must be valid; they are copied into the histogram.
#[no_mangle]
#[must_use]
pub unsafe extern "C" fn geointerp_histogram2d_new(
    x_axis: *const Axis,
    y_axis: *const Axis,
    max_bins: usize,
) -> Box<Histogram2D> {
    let x_axis = unsafe { &*x_axis };
    let y_axis = unsafe { &*y_axis };
    Box::new(Histogram2D::new(x_axis.clone(), y_axis.clone(), max_bins))
}

/// Delete a histogram binning previously created with
/// [`geointerp_histogram2d_new`].
///
/// # Safety
///
/// If `histogram` does not point to a valid `Histogram2D` object, this
/// function is not safe to call. If `histogram` is a `NULL` pointer, this
/// function does not do anything.
#[no_mangle]
#[allow(unused_variables)]
pub unsafe extern "C" fn geointerp_histogram2d_delete(histogram: Option<Box<Histogram2D>>) {}

/// Pushes `len` samples into their nearest cells.
///
/// # Safety
///
/// `histogram` must point to a valid histogram; `x`, `y` and `z` must each
/// point to `len` readable doubles.
#[no_mangle]
pub unsafe extern "C" fn geointerp_histogram2d_push(
    histogram: *mut Histogram2D,
    x: *const f64,
    y: *const f64,
    z: *const f64,
    len: usize,
) -> ResultCode {
    let histogram = unsafe { &mut *histogram };
    let x = unsafe { slice::from_raw_parts(x, len) };
    let y = unsafe { slice::from_raw_parts(y, len) };
    let z = unsafe { slice::from_raw_parts(z, len) };

    code_of(&histogram.push(x, y, z))
}

/// Merges the cells of `other` into `histogram`; the axes must match.
///
/// # Safety
///
/// Both pointers must reference valid, distinct histograms.
#[no_mangle]
pub unsafe extern "C" fn geointerp_histogram2d_merge(
    histogram: *mut Histogram2D,
    other: *const Histogram2D,
) -> ResultCode {
    let histogram = unsafe { &mut *histogram };
    let other = unsafe { &*other };
    code_of(&histogram.merge(other))
}

/// Writes the approximate per-cell `q`-quantile into the row-major
/// `x_axis.len() × y_axis.len()` buffer `results`.
///
/// # Safety
///
/// `histogram` must point to a valid histogram and `results` to the full
/// grid of writable doubles.
#[no_mangle]
pub unsafe extern "C" fn geointerp_histogram2d_quantile(
    histogram: *const Histogram2D,
    q: f64,
    results: *mut f64,
) {
    let histogram = unsafe { &*histogram };
    let computed = histogram.quantile(q);
    let results =
        unsafe { slice::from_raw_parts_mut(results, computed.len()) };
    results.copy_from_slice(computed.as_slice().expect("contiguous result"));
}

/// Writes the per-cell weighted mean into the row-major buffer `results`.
///
/// # Safety
///
/// See [`geointerp_histogram2d_quantile`].
#[no_mangle]
pub unsafe extern "C" fn geointerp_histogram2d_mean(
    histogram: *const Histogram2D,
    results: *mut f64,
) {
    let histogram = unsafe { &*histogram };
    let computed = histogram.mean();
    let results =
        unsafe { slice::from_raw_parts_mut(results, computed.len()) };
    results.copy_from_slice(computed.as_slice().expect("contiguous result"));
}

/// Writes the per-cell sample count into the row-major buffer `results`.
///
/// # Safety
///
/// See [`geointerp_histogram2d_quantile`].
#[no_mangle]
pub unsafe extern "C" fn geointerp_histogram2d_count(
    histogram: *const Histogram2D,
    results: *mut f64,
) {
    let histogram = unsafe { &*histogram };
    let computed = histogram.count();
    let results =
        unsafe { slice::from_raw_parts_mut(results, computed.len()) };
    results.copy_from_slice(computed.as_slice().expect("contiguous result"));
}
