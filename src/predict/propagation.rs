use chrono::{DateTime, Utc};
use sgp4::Constants;

use crate::geometry::Vec3;
use crate::predict::elements::OrbitalElementSet;
use crate::predict::error::PropagationError;

/// Earth-centred inertial state, km and km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vec3,
    pub velocity: Option<Vec3>,
}

impl StateVector {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: None,
        }
    }
}

/// Greenwich sidereal angle in radians.
pub fn sidereal_time(time: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&time.naive_utc()))
}

/// Source of orbital truth. Implementations must be pure: the same inputs give
/// the same answer, so scans can run on any thread in any order.
pub trait PositionProvider: Send + Sync {
    fn propagate(
        &self,
        elements: &OrbitalElementSet,
        time: DateTime<Utc>,
    ) -> Result<StateVector, PropagationError>;

    /// Rotation between the provider's inertial frame and the Earth-fixed frame.
    fn sidereal_time(&self, time: DateTime<Utc>) -> f64 {
        sidereal_time(time)
    }
}

/// SGP4/SDP4 propagation of two-line elements. Positions are TEME.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Provider;

impl PositionProvider for Sgp4Provider {
    fn propagate(
        &self,
        elements: &OrbitalElementSet,
        time: DateTime<Utc>,
    ) -> Result<StateVector, PropagationError> {
        let elements = elements.elements()?;
        let constants = Constants::from_elements(elements)
            .map_err(|e| PropagationError::InvalidElements(e.to_string()))?;

        let minutes = elements
            .datetime_to_minutes_since_epoch(&time.naive_utc())
            .map_err(|e| PropagationError::Epoch(e.to_string()))?;

        let prediction = constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Diverged(e.to_string()))?;

        Ok(StateVector {
            position: Vec3::from(prediction.position),
            velocity: Some(Vec3::from(prediction.velocity)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::elements::tests::{ISS_LINE1, ISS_LINE2, ISS_NAME};
    use chrono::TimeZone;

    #[test]
    fn propagates_iss_to_low_orbit() {
        let set = OrbitalElementSet::from_tle(Some(ISS_NAME), ISS_LINE1, ISS_LINE2);
        let time = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();
        let state = Sgp4Provider.propagate(&set, time).unwrap();
        let radius = state.position.norm();
        assert!((6600.0..6900.0).contains(&radius), "radius {radius}");
        let speed = state.velocity.unwrap().norm();
        assert!((7.0..8.0).contains(&speed), "speed {speed}");
    }

    #[test]
    fn malformed_elements_fail_every_time() {
        let set = OrbitalElementSet::from_tle(None, "1 bad", "2 bad");
        let time = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();
        for _ in 0..3 {
            assert!(matches!(
                Sgp4Provider.propagate(&set, time),
                Err(PropagationError::InvalidElements(_))
            ));
        }
    }

    #[test]
    fn sidereal_time_is_deterministic() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(sidereal_time(time), Sgp4Provider.sidereal_time(time));
    }
}
