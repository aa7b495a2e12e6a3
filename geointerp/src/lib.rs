//! Optimized interpolation and binning of geo-referenced data.
//!
//! The crate answers two families of questions about scalar fields over the
//! earth: "what is the field worth at these arbitrary locations?" — for
//! fields sampled on regular grids ([`interpolation`]) or as scattered
//! point clouds ([`rtree`]) — and "what do these scattered samples amount
//! to per grid cell?" ([`binning`], [`histogram`]). Undefined regions of
//! gridded fields can be filled with [`fill`].
//!
//! Everything is built on two leaf abstractions: [`axis::Axis`], a
//! monotonic coordinate vector with constant-time lookup on evenly spaced
//! axes, bisection otherwise and wrap-around semantics for longitudes, and
//! [`geodetic::System`], the reference ellipsoid with its coordinate
//! conversions and distance formulations.
//!
//! Numerical loops are data-parallel over the output range; every entry
//! point takes a `num_threads` argument (0 = all logical CPUs). Pure
//! interpolators return bit-identical results for any worker count.

pub mod axis;
pub mod binning;
pub mod descriptive;
pub mod error;
pub mod fill;
mod frame;
pub mod geodetic;
pub mod grid;
pub mod histogram;
pub mod interpolation;
pub mod parallel;
pub mod rtree;
pub mod spline;

pub use error::{Error, Result};
