use chrono::{DateTime, Utc};

use crate::geometry::{eci_to_ecef, ApertureCone, ConeStrategy, Vec3};
use crate::predict::elements::TrackedObject;
use crate::predict::error::PredictError;
use crate::predict::observer::GeoLocation;
use crate::predict::propagation::PositionProvider;
use crate::predict::types::VisibilitySample;

pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityOptions {
    pub min_elevation_deg: f64,
    pub aperture: Option<ApertureCone>,
    pub strategy: ConeStrategy,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            min_elevation_deg: DEFAULT_MIN_ELEVATION_DEG,
            aperture: None,
            strategy: ConeStrategy::default(),
        }
    }
}

impl VisibilityOptions {
    pub fn with_min_elevation(mut self, min_elevation_deg: f64) -> Self {
        self.min_elevation_deg = min_elevation_deg;
        self
    }

    pub fn with_aperture(mut self, aperture: ApertureCone, strategy: ConeStrategy) -> Self {
        self.aperture = Some(aperture);
        self.strategy = strategy;
        self
    }
}

/// Look angles from `observer` to an inertial position.
///
/// `sidereal_rad` rotates the inertial position into the Earth-fixed frame.
/// Visibility is `elevation > min_elevation_deg`, additionally gated by the
/// aperture cone when one is set.
pub fn evaluate(
    position_eci: &Vec3,
    observer: &GeoLocation,
    time: DateTime<Utc>,
    sidereal_rad: f64,
    options: &VisibilityOptions,
) -> VisibilitySample {
    let position = eci_to_ecef(position_eci, sidereal_rad);
    let offset = position - observer.position_ecef_km();
    let look = observer.local_frame().look_angles(&offset);

    let above = look.elevation_deg > options.min_elevation_deg;
    let in_aperture = options
        .aperture
        .as_ref()
        .is_none_or(|cone| cone.contains(&position, options.strategy));

    VisibilitySample {
        time,
        elevation_deg: look.elevation_deg,
        azimuth_deg: look.azimuth_deg,
        range_km: look.range_km,
        visible: above && in_aperture,
    }
}

/// Propagates `object` to `time` and evaluates it.
///
/// Only an invalid observer is an error. When the provider has no position
/// the object is reported as not visible at elevation 0.
pub fn evaluate_visibility<P: PositionProvider + ?Sized>(
    provider: &P,
    object: &TrackedObject,
    observer: &GeoLocation,
    time: DateTime<Utc>,
    options: &VisibilityOptions,
) -> Result<VisibilitySample, PredictError> {
    observer.validate()?;
    let sample = match provider.propagate(&object.elements, time) {
        Ok(state) => evaluate(
            &state.position,
            observer,
            time,
            provider.sidereal_time(time),
            options,
        ),
        Err(e) => {
            log::debug!("No position for {} ({}) at {}: {}", object.name, object.id, time, e);
            VisibilitySample::unavailable(time)
        }
    };
    Ok(sample)
}
