//! Hit position collection and transverse-plane coordinates.

use crate::record::{HitPosition, Record};

/// Extracts hit coordinates from hit-like records.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitPositionCollector;

impl HitPositionCollector {
    /// Positions of every hit in `record`, in record order.
    ///
    /// Identical positions are kept.
    pub fn collect(&self, record: &Record) -> Vec<HitPosition> {
        match record {
            Record::Hit(hit) => vec![hit.position],
            Record::Event(event) => event.hits.iter().map(|hit| hit.position).collect(),
            Record::TimeWindow(window) => window
                .events
                .iter()
                .flat_map(|sub_event| self.collect(sub_event))
                .collect(),
            Record::RawSignal(_) | Record::SignalChannel(_) | Record::Unknown => Vec::new(),
        }
    }
}

/// Radius and azimuth of a point in the transverse (x, y) plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarCoordinates {
    pub r: f64,
    /// Azimuth in degrees, in (-90, 270].
    pub theta_deg: f64,
}

impl PolarCoordinates {
    /// Reconstructs the full-circle azimuth from `asin(y / r)`.
    ///
    /// For `x < 0` the angle is reflected to `180 - asin(y / r)`. The origin
    /// has `theta_deg = 0`.
    pub fn from_xy(x: f64, y: f64) -> Self {
        let r = x.hypot(y);
        if r == 0.0 {
            return Self { r, theta_deg: 0.0 };
        }
        let asin_deg = (y / r).clamp(-1.0, 1.0).asin().to_degrees();
        let theta_deg = if x >= 0.0 { asin_deg } else { 180.0 - asin_deg };
        Self { r, theta_deg }
    }
}

impl From<&HitPosition> for PolarCoordinates {
    fn from(pos: &HitPosition) -> Self {
        Self::from_xy(pos.x, pos.y)
    }
}
