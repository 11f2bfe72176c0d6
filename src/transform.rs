//! Per-axis coordinate mappings between physical and solver variables.
//!
//! Axis 0 is the price, axis 1 the variance; a third axis is left untouched.

use serde::{Deserialize, Serialize};

/// Bijective map of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AxisMapping {
    #[default]
    Identity,
    /// `x = ln s`.
    LogPrice,
    /// `y = √v`.
    SqrtVol,
    /// `τ = T − t`.
    TimeToMaturity { maturity: f64 },
}

impl AxisMapping {
    /// Physical to solver coordinate.
    pub fn transform(&self, x: f64) -> f64 {
        match *self {
            Self::Identity => x,
            Self::LogPrice => x.ln(),
            Self::SqrtVol => x.sqrt(),
            Self::TimeToMaturity { maturity } => maturity - x,
        }
    }

    /// Solver to physical coordinate.
    pub fn untransform(&self, y: f64) -> f64 {
        match *self {
            Self::Identity => y,
            Self::LogPrice => y.exp(),
            Self::SqrtVol => y * y,
            Self::TimeToMaturity { maturity } => maturity - y,
        }
    }
}

/// Price, variance and time mappings applied together.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateTransform {
    pub price: AxisMapping,
    pub vol: AxisMapping,
    pub time: AxisMapping,
}

impl CoordinateTransform {
    /// Combines one mapping per axis.
    pub fn new(price: AxisMapping, vol: AxisMapping, time: AxisMapping) -> Self {
        Self { price, vol, time }
    }

    /// Returns `true` when every axis is the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Physical state to solver state.
    pub fn transform_state(&self, x: &[f64], out: &mut [f64]) {
        self.map_state(x, out, AxisMapping::transform);
    }

    /// Solver state to physical state.
    pub fn untransform_state(&self, x: &[f64], out: &mut [f64]) {
        self.map_state(x, out, AxisMapping::untransform);
    }

    /// Physical time to solver time.
    pub fn transform_time(&self, t: f64) -> f64 {
        self.time.transform(t)
    }

    /// Solver time to physical time.
    pub fn untransform_time(&self, tau: f64) -> f64 {
        self.time.untransform(tau)
    }

    fn map_state(&self, x: &[f64], out: &mut [f64], f: fn(&AxisMapping, f64) -> f64) {
        out.copy_from_slice(x);
        if let Some(s) = out.first_mut() {
            *s = f(&self.price, *s);
        }
        if let Some(v) = out.get_mut(1) {
            *v = f(&self.vol, *v);
        }
    }
}
