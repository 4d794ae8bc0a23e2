use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::{
    geodetic_to_ecef, ApertureCone, LocalFrame, PointingOffset, Vec3,
};
use crate::predict::error::PredictError;

/// A point on the Earth's surface from which objects are observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub altitude_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl Default for GeoLocation {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
            accuracy_m: None,
        }
    }
}

impl GeoLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Result<Self, PredictError> {
        let location = Self {
            latitude_deg,
            longitude_deg,
            ..Self::default()
        };
        location.validate()?;
        Ok(location)
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Parses `"lat, lon"` in degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Some(Self {
            latitude_deg: lat,
            longitude_deg: lon,
            altitude_m: altitude_m.unwrap_or(0.0),
            accuracy_m: None,
        })
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if !(-90.0..=90.0).contains(&self.latitude_deg) {
            return Err(PredictError::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                self.latitude_deg
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude_deg) {
            return Err(PredictError::InvalidInput(format!(
                "longitude {} outside [-180, 180]",
                self.longitude_deg
            )));
        }
        if !self.altitude_m.is_finite() {
            return Err(PredictError::InvalidInput("altitude must be finite".into()));
        }
        Ok(())
    }

    pub fn position_ecef_km(&self) -> Vec3 {
        geodetic_to_ecef(self.latitude_deg, self.longitude_deg, self.altitude_m / 1000.0)
    }

    pub fn local_frame(&self) -> LocalFrame {
        LocalFrame::at(self.latitude_deg, self.longitude_deg)
    }

    /// Aperture cone with its apex at this location.
    pub fn aperture(
        &self,
        offset: Option<PointingOffset>,
        half_angle_deg: f64,
    ) -> Result<ApertureCone, PredictError> {
        self.validate()?;
        let cone = ApertureCone::from_local(
            self.position_ecef_km(),
            &self.local_frame(),
            offset,
            half_angle_deg,
        )?;
        Ok(cone)
    }
}
