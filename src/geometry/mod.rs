//! Shared coordinate and cone geometry.
//!
//! Every consumer in the crate converts between geographic coordinates and
//! Cartesian vectors through this module, so there is exactly one axis
//! convention: an Earth-fixed, right-handed frame with `+Z` through the north
//! pole, `+X` through latitude 0 / longitude 0 and `+Y` through longitude 90°E.
//! Distances are kilometres unless a name says otherwise.

mod cone;
mod coords;

use thiserror::Error;

pub use cone::{point_in_cone, ApertureCone, ConeDisplay, ConeStrategy, PointingOffset};
pub use coords::{
    eci_to_ecef, geodetic_to_ecef, surface_normal, to_cartesian, to_geographic, LocalFrame,
    LookAngles, EARTH_MEAN_RADIUS_KM, WGS84_A_KM, WGS84_E2,
};

pub type Vec3 = nalgebra::Vector3<f64>;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("half-angle must be in (0, 90] degrees, got {0}")]
    HalfAngle(f64),
    #[error("cone axis must be a non-zero finite vector")]
    DegenerateAxis,
    #[error("pointing azimuth must be in [0, 360] and elevation in [-90, 90], got {azimuth_deg}/{elevation_deg}")]
    Pointing { azimuth_deg: f64, elevation_deg: f64 },
}
