//! Wind pressure on external nodes.
//!
//! The boundary pressure of a facade node is `Pw = Cp · ½ ρo V²`, with `Cp`
//! looked up from a tabulated curve at the incidence angle and `V` the wind
//! speed at the node height.

use afn_core::NodeId;
use afn_core::numeric::lerp;

use crate::error::{SimError, SimResult};

/// How a curve's angles relate to the wind direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpAngleBasis {
    /// Angles are wind directions (clockwise from north).
    Absolute,
    /// Angles are measured from the facade normal; the facade azimuth is
    /// subtracted from the wind direction first.
    Relative,
}

/// Tabulated wind pressure coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct CpCurve {
    name: String,
    angles: Vec<f64>,
    values: Vec<f64>,
    symmetric: bool,
    basis: CpAngleBasis,
}

impl CpCurve {
    /// Build a curve from `(angle_deg, cp)` points.
    ///
    /// Angles must be finite, strictly increasing and inside `[0, 360]`, or
    /// `[0, 180]` for a symmetric curve.
    pub fn new(
        name: impl Into<String>,
        points: &[(f64, f64)],
        symmetric: bool,
        basis: CpAngleBasis,
    ) -> SimResult<Self> {
        let name = name.into();
        let span = if symmetric { 180.0 } else { 360.0 };
        if points.len() < 2 {
            return Err(curve_error(&name, "at least two points are required"));
        }
        for (angle, cp) in points {
            if !angle.is_finite() || !cp.is_finite() {
                return Err(curve_error(&name, "non-finite point"));
            }
            if *angle < 0.0 || *angle > span {
                return Err(curve_error(
                    &name,
                    &format!("angle {angle} outside [0, {span}]"),
                ));
            }
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(curve_error(&name, "angles must be strictly increasing"));
        }
        Ok(Self {
            name,
            angles: points.iter().map(|p| p.0).collect(),
            values: points.iter().map(|p| p.1).collect(),
            symmetric,
            basis,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn basis(&self) -> CpAngleBasis {
        self.basis
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.angles.iter().copied().zip(self.values.iter().copied())
    }

    /// Angle the curve is evaluated at for a wind direction and facade
    /// azimuth, in `[0, 360)` or `[0, 180]` for symmetric curves.
    pub fn lookup_angle(&self, wind_direction_deg: f64, azimuth_deg: f64) -> f64 {
        let raw = match self.basis {
            CpAngleBasis::Absolute => wind_direction_deg,
            CpAngleBasis::Relative => wind_direction_deg - azimuth_deg,
        };
        let theta = raw.rem_euclid(360.0);
        if self.symmetric && theta > 180.0 {
            360.0 - theta
        } else {
            theta
        }
    }

    /// Pressure coefficient for a wind direction on a facade.
    pub fn coefficient(&self, wind_direction_deg: f64, azimuth_deg: f64) -> f64 {
        self.at_angle(self.lookup_angle(wind_direction_deg, azimuth_deg))
    }

    /// Linear interpolation at a lookup angle; tabulated angles return the
    /// tabulated value exactly.
    pub fn at_angle(&self, theta: f64) -> f64 {
        let n = self.angles.len();
        let first = self.angles[0];
        let last = self.angles[n - 1];

        if theta < first || theta > last {
            if self.symmetric {
                return if theta < first {
                    self.values[0]
                } else {
                    self.values[n - 1]
                };
            }
            // Wrap between the last point and the first point + 360.
            let x = if theta < first { theta + 360.0 } else { theta };
            return lerp(x, last, self.values[n - 1], first + 360.0, self.values[0]);
        }

        let upper = self.angles.partition_point(|a| *a <= theta);
        if upper == n {
            return self.values[n - 1];
        }
        let lower = upper - 1;
        lerp(
            theta,
            self.angles[lower],
            self.values[lower],
            self.angles[upper],
            self.values[upper],
        )
    }

    /// Swami and Chandra's low-rise correlation as a symmetric relative
    /// curve at 10° steps.
    ///
    /// `side_ratio` is the facade width over the width of the adjacent side.
    pub fn low_rise(name: impl Into<String>, side_ratio: f64) -> SimResult<Self> {
        let name = name.into();
        if !(side_ratio.is_finite() && side_ratio > 0.0) {
            return Err(curve_error(&name, "side ratio must be finite and > 0"));
        }
        let g = side_ratio.ln();
        let points: Vec<(f64, f64)> = (0..=18)
            .map(|i| {
                let angle = 10.0 * i as f64;
                (angle, low_rise_cp(angle.to_radians(), g))
            })
            .collect();
        Self::new(name, &points, true, CpAngleBasis::Relative)
    }

    /// Surface-averaged wall coefficients of a tall building as a symmetric
    /// relative curve at 10° steps.
    ///
    /// Tabulated at side ratios 0.25, 1 and 4 and interpolated in
    /// `ln(side_ratio)`; ratios outside that range use the nearest column.
    pub fn high_rise(name: impl Into<String>, side_ratio: f64) -> SimResult<Self> {
        let name = name.into();
        if !(side_ratio.is_finite() && side_ratio > 0.0) {
            return Err(curve_error(&name, "side ratio must be finite and > 0"));
        }
        let x = side_ratio.clamp(0.25, 4.0).ln();
        let (lo, hi, t) = if x <= 0.0 {
            (0, 1, (x - 0.25f64.ln()) / -0.25f64.ln())
        } else {
            (1, 2, x / 4f64.ln())
        };
        let points: Vec<(f64, f64)> = (0..=18)
            .map(|i| {
                let a = HIGH_RISE_WALL_CP[lo][i];
                let b = HIGH_RISE_WALL_CP[hi][i];
                let cp = if t <= 0.0 {
                    a
                } else if t >= 1.0 {
                    b
                } else {
                    a + (b - a) * t
                };
                (10.0 * i as f64, cp)
            })
            .collect();
        Self::new(name, &points, true, CpAngleBasis::Relative)
    }
}

/// Tall-building wall coefficients at incidence 0..=180° in 10° steps, for
/// side ratios 0.25, 1 and 4.
const HIGH_RISE_WALL_CP: [[f64; 19]; 3] = [
    [
        0.60, 0.54, 0.49, 0.42, 0.33, 0.22, 0.10, -0.04, -0.19, -0.34, -0.47, -0.55, -0.56,
        -0.52, -0.45, -0.38, -0.33, -0.30, -0.29,
    ],
    [
        0.60, 0.57, 0.52, 0.44, 0.33, 0.20, 0.05, -0.12, -0.30, -0.47, -0.58, -0.62, -0.59,
        -0.53, -0.47, -0.42, -0.39, -0.37, -0.36,
    ],
    [
        0.60, 0.58, 0.54, 0.47, 0.37, 0.24, 0.08, -0.10, -0.30, -0.50, -0.64, -0.70, -0.68,
        -0.62, -0.56, -0.51, -0.48, -0.46, -0.45,
    ],
];

fn low_rise_cp(theta: f64, g: f64) -> f64 {
    let half = 0.5 * theta;
    let arg = 1.248 - 0.703 * half.sin() - 1.175 * theta.sin().powi(2)
        + 0.131 * (2.0 * theta * g).sin().powi(3)
        + 0.769 * half.cos()
        + 0.07 * (g * half.sin()).powi(2)
        + 0.717 * half.cos().powi(2);
    0.6 * arg.max(1e-6).ln()
}

fn curve_error(name: &str, what: &str) -> SimError {
    SimError::InvalidCurve {
        what: format!("'{name}': {what}"),
    }
}

/// Power-law boundary layer profiles of the site and the weather station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindProfile {
    /// Site terrain exponent
    pub exponent: f64,
    /// Site boundary layer thickness (m)
    pub boundary_layer: f64,
    /// Weather station terrain exponent
    pub met_exponent: f64,
    /// Weather station boundary layer thickness (m)
    pub met_boundary_layer: f64,
    /// Height of the station anemometer (m)
    pub met_height: f64,
}

impl Default for WindProfile {
    fn default() -> Self {
        Self {
            exponent: 0.14,
            boundary_layer: 270.0,
            met_exponent: 0.14,
            met_boundary_layer: 270.0,
            met_height: 10.0,
        }
    }
}

impl WindProfile {
    pub fn validate(&self) -> SimResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.exponent) && positive(self.met_exponent)) {
            return Err(SimError::InvalidWind {
                what: "profile exponents must be finite and > 0".into(),
            });
        }
        if !(positive(self.boundary_layer)
            && positive(self.met_boundary_layer)
            && positive(self.met_height))
        {
            return Err(SimError::InvalidWind {
                what: "boundary layer thicknesses and station height must be finite and > 0"
                    .into(),
            });
        }
        Ok(())
    }

    /// `V = Vmet (δmet / zmet)^αmet (z / δ)^α`; zero at or below ground.
    pub fn speed_at(&self, met_speed: f64, height: f64) -> f64 {
        if height <= 0.0 {
            return 0.0;
        }
        met_speed
            * (self.met_boundary_layer / self.met_height).powf(self.met_exponent)
            * (height / self.boundary_layer).powf(self.exponent)
    }
}

/// `Cp · ½ ρ V²`.
pub fn wind_pressure(cp: f64, density: f64, speed: f64) -> f64 {
    cp * 0.5 * density * speed * speed
}

/// Wind exposure of one external node.
#[derive(Debug, Clone, PartialEq)]
pub struct FacadeWind {
    pub node: NodeId,
    /// Index into the curve table.
    pub curve: usize,
    /// Outward normal of the facade, degrees clockwise from north.
    pub azimuth_deg: f64,
    /// Height used for the local wind speed (m).
    pub height: f64,
}
