//! Geodetic reference system.
//!
//! [`System`] carries the two defining parameters of a biaxial ellipsoid,
//! the semi-major axis `a` and the flattening `f`; everything else is
//! derived. Geographic coordinates are (longitude, latitude) in degrees and
//! altitude in meters; cartesian coordinates are earth-centered earth-fixed
//! (ECEF) meters.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Semi-major axis of the WGS-84 ellipsoid, in meters.
pub const WGS84_A: f64 = 6_378_137.0;

/// Flattening of the WGS-84 ellipsoid.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Geodesic distance formulation used by queries.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum DistanceStrategy {
    /// Great-circle distance on a sphere of radius `a`.
    #[default]
    Haversine,
    /// Andoyer-Lambert first-order correction, geodetic latitudes.
    Andoyer,
    /// Andoyer-Lambert first-order correction on parametric latitudes.
    Thomas,
    /// Vincenty's iterative inverse formula.
    Vincenty,
}

/// A geodetic reference system: a biaxial ellipsoid of revolution.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct System {
    a: f64,
    f: f64,
}

impl Default for System {
    fn default() -> Self {
        Self {
            a: WGS84_A,
            f: WGS84_F,
        }
    }
}

impl System {
    /// Constructs a system from the semi-major axis `a` (meters) and the
    /// flattening `f`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidArgument`] unless `a > 0` and
    /// `0 <= f < 1`.
    pub fn new(a: f64, f: f64) -> crate::Result<Self> {
        if !(a > 0.0) || !(0.0..1.0).contains(&f) {
            return Err(crate::Error::InvalidArgument(format!(
                "invalid ellipsoid parameters a={a}, f={f}"
            )));
        }
        Ok(Self { a, f })
    }

    /// Semi-major axis, in meters.
    #[must_use]
    pub fn semi_major_axis(&self) -> f64 {
        self.a
    }

    /// Flattening.
    #[must_use]
    pub fn flattening(&self) -> f64 {
        self.f
    }

    /// Semi-minor axis `b = a(1 - f)`, in meters.
    #[must_use]
    pub fn semi_minor_axis(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// First eccentricity squared, `e² = f(2 - f)`.
    #[must_use]
    pub fn first_eccentricity_squared(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Second eccentricity squared, `e'² = e²/(1 - e²)`.
    #[must_use]
    pub fn second_eccentricity_squared(&self) -> f64 {
        let e2 = self.first_eccentricity_squared();
        e2 / (1.0 - e2)
    }

    /// Arithmetic mean radius `(2a + b)/3`, in meters.
    #[must_use]
    pub fn mean_radius(&self) -> f64 {
        (2.0 * self.a + self.semi_minor_axis()) / 3.0
    }

    /// Radius of the sphere with the same surface area, in meters.
    #[must_use]
    pub fn authalic_radius(&self) -> f64 {
        if self.f == 0.0 {
            return self.a;
        }
        let e2 = self.first_eccentricity_squared();
        let e = e2.sqrt();
        self.a * (0.5 * (1.0 + (1.0 - e2) / e * e.atanh())).sqrt()
    }

    /// Radius of the sphere with the same volume, `(a²b)^⅓`, in meters.
    #[must_use]
    pub fn volumetric_radius(&self) -> f64 {
        (self.a * self.a * self.semi_minor_axis()).cbrt()
    }

    /// Prime vertical radius of curvature at geodetic latitude `sinphi`.
    fn prime_vertical_radius(&self, sinphi: f64) -> f64 {
        self.a / (1.0 - self.first_eccentricity_squared() * sinphi * sinphi).sqrt()
    }

    /// Geographic to cartesian conversion (Bowring's formulation).
    ///
    /// `lon`/`lat` in degrees, `alt` in meters above the ellipsoid; result
    /// is an ECEF position in meters.
    #[must_use]
    pub fn to_ecef(&self, lon: f64, lat: f64, alt: f64) -> [f64; 3] {
        let (sinphi, cosphi) = lat.to_radians().sin_cos();
        let (sinlam, coslam) = lon.to_radians().sin_cos();
        let n = self.prime_vertical_radius(sinphi);

        [
            (n + alt) * cosphi * coslam,
            (n + alt) * cosphi * sinlam,
            (n * (1.0 - self.first_eccentricity_squared()) + alt) * sinphi,
        ]
    }

    /// Cartesian to geographic conversion, closed form after Heikkinen.
    ///
    /// Returns (longitude, latitude) in degrees and the altitude in meters.
    #[must_use]
    #[allow(clippy::many_single_char_names)]
    pub fn to_lla(&self, ecef: [f64; 3]) -> (f64, f64, f64) {
        let [x, y, z] = ecef;
        let a = self.a;
        let b = self.semi_minor_axis();
        let e2 = self.first_eccentricity_squared();
        let ep2 = self.second_eccentricity_squared();

        let lon = y.atan2(x);
        let r = x.hypot(y);

        // close to the rotation axis the generic solution degenerates
        if r < 1.0e-9 {
            let lat = FRAC_PI_2.copysign(z);
            return (lon.to_degrees(), lat.to_degrees(), z.abs() - b);
        }

        let f = 54.0 * b * b * z * z;
        let g = r.mul_add(r, (1.0 - e2) * z * z) - e2 * (a * a - b * b);
        let c = e2 * e2 * f * r * r / (g * g * g);
        let s = (1.0 + c + c.mul_add(c, 2.0 * c).sqrt()).cbrt();
        let p = f / (3.0 * (s + 1.0 / s + 1.0).powi(2) * g * g);
        let q = 2.0_f64.mul_add(e2 * e2 * p, 1.0).sqrt();
        let r0 = -(p * e2 * r) / (1.0 + q)
            + (0.5 * a * a * (1.0 + 1.0 / q) - p * (1.0 - e2) * z * z / (q * (1.0 + q))
                - 0.5 * p * r * r)
                .max(0.0)
                .sqrt();
        let u = (r - e2 * r0).hypot(z);
        let v = (r - e2 * r0).hypot((1.0 - e2).sqrt() * z);
        let z0 = b * b * z / (a * v);
        let alt = u * (1.0 - b * b / (a * v));
        let lat = ((z + ep2 * z0) / r).atan();

        (lon.to_degrees(), lat.to_degrees(), alt)
    }

    /// Geodesic distance between two geographic positions, in meters.
    #[must_use]
    pub fn distance(&self, a: (f64, f64), b: (f64, f64), strategy: DistanceStrategy) -> f64 {
        match strategy {
            DistanceStrategy::Haversine => self.haversine(a, b),
            DistanceStrategy::Andoyer => self.andoyer(a, b, false),
            DistanceStrategy::Thomas => self.andoyer(a, b, true),
            DistanceStrategy::Vincenty => self.vincenty(a, b),
        }
    }

    /// Great-circle distance on the sphere of radius `a`.
    fn haversine(&self, (lon1, lat1): (f64, f64), (lon2, lat2): (f64, f64)) -> f64 {
        let phi1 = lat1.to_radians();
        let phi2 = lat2.to_radians();
        let dphi = (lat2 - lat1).to_radians();
        let dlam = (lon2 - lon1).to_radians();

        let h = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlam / 2.0).sin().powi(2);
        2.0 * self.a * h.sqrt().min(1.0).asin()
    }

    /// Andoyer-Lambert distance; with `parametric` set the formula is
    /// applied to the reduced latitudes (Thomas' variant).
    fn andoyer(&self, (lon1, lat1): (f64, f64), (lon2, lat2): (f64, f64), parametric: bool) -> f64 {
        let reduce = |lat: f64| {
            let phi = lat.to_radians();
            if parametric {
                ((1.0 - self.f) * phi.tan()).atan()
            } else {
                phi
            }
        };
        let phi1 = reduce(lat1);
        let phi2 = reduce(lat2);
        let lam = (lon2 - lon1).to_radians() / 2.0;

        let fm = (phi1 + phi2) / 2.0;
        let gm = (phi1 - phi2) / 2.0;
        let s = gm.sin().powi(2).mul_add(lam.cos().powi(2), fm.cos().powi(2) * lam.sin().powi(2));
        let c = gm.cos().powi(2).mul_add(lam.cos().powi(2), fm.sin().powi(2) * lam.sin().powi(2));

        if s == 0.0 || c == 0.0 {
            // coincident or antipodal points; the correction vanishes
            return 2.0 * self.a * (s / (s + c)).sqrt().asin();
        }

        let omega = (s / c).sqrt().atan();
        let r = (s * c).sqrt() / omega;
        let d = 2.0 * omega * self.a;
        let h1 = (3.0 * r - 1.0) / (2.0 * c);
        let h2 = (3.0 * r + 1.0) / (2.0 * s);
        let correction = self.f
            * h1.mul_add(
                fm.sin().powi(2) * gm.cos().powi(2),
                -h2 * fm.cos().powi(2) * gm.sin().powi(2),
            );

        d * (1.0 + correction)
    }

    /// Vincenty's inverse formula. Near-antipodal pairs that fail to
    /// converge return the estimate of the last iteration.
    #[allow(clippy::many_single_char_names)]
    fn vincenty(&self, (lon1, lat1): (f64, f64), (lon2, lat2): (f64, f64)) -> f64 {
        let a = self.a;
        let b = self.semi_minor_axis();
        let f = self.f;

        let l = (lon2 - lon1).to_radians();
        let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
        let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut sin_sigma = 0.0;
        let mut cos_sigma = 1.0;
        let mut sigma = 0.0;
        let mut cos_sq_alpha = 1.0;
        let mut cos2_sigma_m = 0.0;

        for _ in 0..200 {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + cos_u1.mul_add(sin_u2, -(sin_u1 * cos_u2 * cos_lambda)).powi(2))
            .sqrt();
            if sin_sigma == 0.0 {
                return 0.0;
            }
            cos_sigma = sin_u1.mul_add(sin_u2, cos_u1 * cos_u2 * cos_lambda);
            sigma = sin_sigma.atan2(cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = sin_alpha.mul_add(-sin_alpha, 1.0);
            cos2_sigma_m = if cos_sq_alpha == 0.0 {
                0.0
            } else {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            };
            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let previous = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos2_sigma_m
                                + c * cos_sigma
                                    * (2.0 * cos2_sigma_m).mul_add(cos2_sigma_m, -1.0)));
            if (lambda - previous).abs() < 1e-12 {
                break;
            }
        }

        let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
        let big_a =
            1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let delta_sigma = big_b
            * sin_sigma
            * (cos2_sigma_m
                + big_b / 4.0
                    * (cos_sigma * (2.0 * cos2_sigma_m).mul_add(cos2_sigma_m, -1.0)
                        - big_b / 6.0
                            * cos2_sigma_m
                            * (4.0 * sin_sigma).mul_add(sin_sigma, -3.0)
                            * (4.0 * cos2_sigma_m).mul_add(cos2_sigma_m, -3.0)));

        b * big_a * (sigma - delta_sigma)
    }

    /// Area of the spherical rectangle bounded by two meridians and two
    /// parallels, on the sphere of radius `a`, in square meters.
    #[must_use]
    pub fn cell_area(&self, lon0: f64, lon1: f64, lat0: f64, lat1: f64) -> f64 {
        let dlam = (lon1 - lon0).to_radians().abs();
        let dsin = (lat1.to_radians().sin() - lat0.to_radians().sin()).abs();
        self.a * self.a * dlam * dsin
    }
}
