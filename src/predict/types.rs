use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::elements::TrackedObject;

/// Where an object is relative to the observer at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct VisibilitySample {
    pub time: DateTime<Utc>,
    pub elevation_deg: f64,
    /// `[0, 360)`, clockwise from north.
    pub azimuth_deg: f64,
    pub range_km: f64,
    pub visible: bool,
}

impl VisibilitySample {
    /// The sample reported when no position could be produced.
    pub fn unavailable(time: DateTime<Utc>) -> Self {
        Self {
            time,
            elevation_deg: 0.0,
            azimuth_deg: 0.0,
            range_km: 0.0,
            visible: false,
        }
    }
}

/// A predicted pass
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pass {
    pub object: TrackedObject,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub peak_time: DateTime<Utc>,
    pub peak_elevation_deg: f64,
    pub duration_minutes: f64,
    /// e.g. `"NW to SE"`
    pub compass_direction: String,
    pub start_azimuth_deg: f64,
    pub peak_azimuth_deg: f64,
    pub end_azimuth_deg: f64,
    /// Closed by the end of the scan window rather than by the object setting.
    pub truncated: bool,
}
