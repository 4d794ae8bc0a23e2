mod elements;
mod engine;
mod error;
mod observer;
mod pass_finder;
mod propagation;
mod tle_loader;
mod types;
mod visibility;

pub use elements::{pivot_two_digit_year, Category, OrbitalElementSet, TrackedObject, YEAR_PIVOT};
pub use engine::{compute_passes, CancellationToken, ObjectFailure, PassEngine, ScanReport};
pub use error::{PredictError, PropagationError};
pub use observer::GeoLocation;
pub use pass_finder::{
    compass_point, predict_passes, FailurePolicy, ScanOptions, DEFAULT_STEP, MIN_PASS_MINUTES,
};
pub use propagation::{sidereal_time, PositionProvider, Sgp4Provider, StateVector};
pub use tle_loader::{parse_objects, TleLoader};
pub use types::{Pass, VisibilitySample};
pub use visibility::{evaluate, evaluate_visibility, VisibilityOptions, DEFAULT_MIN_ELEVATION_DEG};
