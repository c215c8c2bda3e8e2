//! Lambert Conformal Conic projection.
//!
//! This projection is used by the CAMx and CMAQ continental modeling grids.
//! It maps a cone secant (or tangent) to a spherical Earth onto a flat plane,
//! with planar coordinates expressed in meters from the projection origin.
//!
//! The projection parameters include:
//! - Origin latitude (lat_0) and central meridian (lon_0)
//! - Standard parallel(s): lat_1 and lat_2 (equal for a tangent cone)
//! - Sphere radius in meters
//! - Optional false easting / northing

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::error::{ProjectionError, ProjectionResult};

/// Sphere radius used by the CAMx/MM5 continental domain (meters).
pub const CAMX_SPHERE_RADIUS: f64 = 6_370_997.0;

/// Lambert Conformal Conic definition in degrees and meters.
///
/// Equivalent to the PROJ string
/// `+proj=lcc +lat_0=.. +lon_0=.. +lat_1=.. +lat_2=.. +a=..`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LccParams {
    /// Latitude of the projection origin (degrees)
    pub lat_0: f64,
    /// Central meridian (degrees)
    pub lon_0: f64,
    /// First standard parallel (degrees)
    pub lat_1: f64,
    /// Second standard parallel (degrees)
    pub lat_2: f64,
    /// Sphere radius (meters)
    pub radius: f64,
    /// Added to every projected x (meters)
    pub false_easting: f64,
    /// Added to every projected y (meters)
    pub false_northing: f64,
}

impl Default for LccParams {
    /// The CAMx continental US grid: 33°/45° parallels, -97° meridian, 40° origin.
    fn default() -> Self {
        Self {
            lat_0: 40.0,
            lon_0: -97.0,
            lat_1: 33.0,
            lat_2: 45.0,
            radius: CAMX_SPHERE_RADIUS,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }
}

/// Spherical Lambert Conformal Conic projection.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    params: LccParams,
    /// Central meridian in radians
    lon0: f64,
    /// Cone constant (n)
    n: f64,
    /// R * F, the scaled F constant
    rf: f64,
    /// Rho at the origin latitude
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from explicit parameters.
    pub fn new(params: LccParams) -> ProjectionResult<Self> {
        validate(&params)?;

        let lat0 = params.lat_0.to_radians();
        let lat1 = params.lat_1.to_radians();
        let lat2 = params.lat_2.to_radians();

        // Compute cone constant n
        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            lat1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (lat1.cos() / lat2.cos()).ln();
            let tan_ratio = ((FRAC_PI_4 + lat2 / 2.0).tan() / (FRAC_PI_4 + lat1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        if n.abs() < 1e-12 || !n.is_finite() {
            return Err(ProjectionError::invalid(
                "lat_1/lat_2",
                "standard parallels are symmetric about the equator",
            ));
        }

        let f = (lat1.cos() * (FRAC_PI_4 + lat1 / 2.0).tan().powf(n)) / n;
        let rf = params.radius * f;
        let rho0 = rf / (FRAC_PI_4 + lat0 / 2.0).tan().powf(n);

        Ok(Self {
            params,
            lon0: params.lon_0.to_radians(),
            n,
            rf,
            rho0,
        })
    }

    /// The CAMx continental projection.
    pub fn camx() -> Self {
        // Default parameters are statically valid.
        Self::new(LccParams::default()).unwrap_or_else(|_| unreachable!())
    }

    /// Parameters this projection was built from.
    pub fn params(&self) -> &LccParams {
        &self.params
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    /// Convert geographic coordinates (degrees) to planar (x, y) meters.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> ProjectionResult<(f64, f64)> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() {
            return Err(ProjectionError::NonFinite(lon_deg, lat_deg));
        }
        if !(-90.0..=90.0).contains(&lat_deg) {
            return Err(ProjectionError::LatitudeOutOfRange(lat_deg));
        }

        let lat = lat_deg.to_radians();
        let dlon = normalize_angle(lon_deg.to_radians() - self.lon0);

        let rho = self.rf / (FRAC_PI_4 + lat / 2.0).tan().powf(self.n);
        if !rho.is_finite() {
            return Err(ProjectionError::OutOfDomain(lon_deg, lat_deg));
        }

        let theta = self.n * dlon;
        let x = rho * theta.sin() + self.params.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.params.false_northing;

        Ok((x, y))
    }

    /// Convert planar (x, y) meters back to geographic (lon, lat) degrees.
    pub fn unproject(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFinite(x, y));
        }

        let dx = x - self.params.false_easting;
        let dy = self.rho0 - (y - self.params.false_northing);
        let sign = self.n.signum();

        let rho = sign * (dx * dx + dy * dy).sqrt();
        let theta = (sign * dx).atan2(sign * dy);

        let lat = if rho == 0.0 {
            sign * FRAC_PI_2
        } else {
            2.0 * (self.rf / rho).powf(1.0 / self.n).atan() - FRAC_PI_2
        };
        let lon = normalize_angle(self.lon0 + theta / self.n);

        Ok((lon.to_degrees(), lat.to_degrees()))
    }
}

fn validate(params: &LccParams) -> ProjectionResult<()> {
    let lats = [
        ("lat_0", params.lat_0),
        ("lat_1", params.lat_1),
        ("lat_2", params.lat_2),
    ];
    for (name, value) in lats {
        if !value.is_finite() || value.abs() >= 90.0 {
            return Err(ProjectionError::invalid(
                name,
                format!("{} must be strictly between -90 and 90", value),
            ));
        }
    }
    if !params.lon_0.is_finite() || params.lon_0.abs() > 360.0 {
        return Err(ProjectionError::invalid(
            "lon_0",
            format!("{} is not a usable meridian", params.lon_0),
        ));
    }
    if !params.radius.is_finite() || params.radius <= 0.0 {
        return Err(ProjectionError::invalid("radius", "must be > 0"));
    }
    if !params.false_easting.is_finite() || !params.false_northing.is_finite() {
        return Err(ProjectionError::invalid(
            "false_easting/false_northing",
            "must be finite",
        ));
    }
    Ok(())
}

/// Normalize an angle in radians to [-π, π].
fn normalize_angle(mut a: f64) -> f64 {
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}
