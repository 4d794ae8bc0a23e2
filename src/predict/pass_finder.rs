use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::geometry::{ApertureCone, ConeStrategy};
use crate::predict::elements::TrackedObject;
use crate::predict::error::PredictError;
use crate::predict::observer::GeoLocation;
use crate::predict::propagation::PositionProvider;
use crate::predict::types::{Pass, VisibilitySample};
use crate::predict::visibility::{evaluate, VisibilityOptions, DEFAULT_MIN_ELEVATION_DEG};

pub const DEFAULT_STEP: Duration = Duration::minutes(1);
/// Passes this short or shorter are dropped.
pub const MIN_PASS_MINUTES: f64 = 1.0;

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// What to do when the position provider fails mid-scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Give up on the object; it contributes no passes.
    #[default]
    AbortObject,
    /// Drop the failing sample and keep scanning.
    SkipSample,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOptions {
    pub min_elevation_deg: f64,
    pub step: Duration,
    pub aperture: Option<ApertureCone>,
    pub strategy: ConeStrategy,
    pub failure_policy: FailurePolicy,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_elevation_deg: DEFAULT_MIN_ELEVATION_DEG,
            step: DEFAULT_STEP,
            aperture: None,
            strategy: ConeStrategy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ScanOptions {
    pub fn with_min_elevation(mut self, min_elevation_deg: f64) -> Self {
        self.min_elevation_deg = min_elevation_deg;
        self
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn with_aperture(mut self, aperture: ApertureCone, strategy: ConeStrategy) -> Self {
        self.aperture = Some(aperture);
        self.strategy = strategy;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        if !(-90.0..=90.0).contains(&self.min_elevation_deg) {
            return Err(PredictError::InvalidInput(format!(
                "minimum elevation {} outside [-90, 90]",
                self.min_elevation_deg
            )));
        }
        if self.step <= Duration::zero() {
            return Err(PredictError::InvalidInput("step must be positive".into()));
        }
        Ok(())
    }

    fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            min_elevation_deg: self.min_elevation_deg,
            aperture: self.aperture,
            strategy: self.strategy,
        }
    }
}

/// Eight 45° sectors centred on the cardinal and intercardinal points.
pub fn compass_point(azimuth_deg: f64) -> &'static str {
    let sector = (azimuth_deg.rem_euclid(360.0) / 45.0).round() as usize % 8;
    COMPASS_POINTS[sector]
}

struct OpenPass {
    start: VisibilitySample,
    peak: VisibilitySample,
    last: VisibilitySample,
}

impl OpenPass {
    fn open(sample: VisibilitySample) -> Self {
        Self {
            start: sample,
            peak: sample,
            last: sample,
        }
    }

    fn track(&mut self, sample: VisibilitySample) {
        if sample.elevation_deg > self.peak.elevation_deg {
            self.peak = sample;
        }
        self.last = sample;
    }

    /// Closes the pass at `end_time`, or returns `None` if it is too short.
    fn close(
        self,
        object: &TrackedObject,
        end_time: DateTime<Utc>,
        end_azimuth_deg: f64,
        truncated: bool,
    ) -> Option<Pass> {
        let duration_minutes = (end_time - self.start.time).num_milliseconds() as f64 / 60_000.0;
        if duration_minutes <= MIN_PASS_MINUTES {
            return None;
        }
        Some(Pass {
            object: object.clone(),
            start_time: self.start.time,
            end_time,
            peak_time: self.peak.time,
            peak_elevation_deg: self.peak.elevation_deg,
            duration_minutes,
            compass_direction: format!(
                "{} to {}",
                compass_point(self.start.azimuth_deg),
                compass_point(end_azimuth_deg)
            ),
            start_azimuth_deg: self.start.azimuth_deg,
            peak_azimuth_deg: self.peak.azimuth_deg,
            end_azimuth_deg,
            truncated,
        })
    }
}

enum ScanState {
    Outside,
    InsideTracking(OpenPass),
}

/// Find all passes of one object within `[start, end]`.
///
/// Samples every `options.step` starting at `start`, including `end` itself
/// when it falls on a step. A pass opens on the first visible sample and
/// closes on the first sample that is not visible; a pass still open at
/// `end` is closed there and marked truncated.
pub fn predict_passes<P: PositionProvider + ?Sized>(
    provider: &P,
    object: &TrackedObject,
    observer: &GeoLocation,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    options: &ScanOptions,
) -> Result<Vec<Pass>, PredictError> {
    observer.validate()?;
    options.validate()?;
    if end <= start {
        return Err(PredictError::InvalidInput(
            "scan window must have a positive duration".into(),
        ));
    }

    let visibility = options.visibility();
    let mut passes = Vec::new();
    let mut state = ScanState::Outside;
    let mut cursor = start;

    while cursor <= end {
        let state_vector = match provider.propagate(&object.elements, cursor) {
            Ok(s) => s,
            Err(e) => match options.failure_policy {
                FailurePolicy::AbortObject => return Err(e.into()),
                FailurePolicy::SkipSample => {
                    log::debug!("Skipping sample for {} at {}: {}", object.id, cursor, e);
                    cursor += options.step;
                    continue;
                }
            },
        };
        let sample = evaluate(
            &state_vector.position,
            observer,
            cursor,
            provider.sidereal_time(cursor),
            &visibility,
        );

        state = match state {
            ScanState::Outside if sample.visible => ScanState::InsideTracking(OpenPass::open(sample)),
            ScanState::Outside => ScanState::Outside,
            ScanState::InsideTracking(mut open) if sample.visible => {
                open.track(sample);
                ScanState::InsideTracking(open)
            }
            ScanState::InsideTracking(open) => {
                passes.extend(open.close(object, sample.time, sample.azimuth_deg, false));
                ScanState::Outside
            }
        };

        cursor += options.step;
    }

    // Handle pass in progress at end of window
    if let ScanState::InsideTracking(open) = state {
        let end_azimuth = open.last.azimuth_deg;
        passes.extend(open.close(object, end, end_azimuth, true));
    }

    Ok(passes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::{LocalFrame, Vec3};
    use crate::predict::elements::OrbitalElementSet;
    use crate::predict::error::PropagationError;
    use crate::predict::propagation::StateVector;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    pub(crate) type Track = dyn Fn(DateTime<Utc>) -> Result<Vec3, PropagationError> + Send + Sync;

    /// Deterministic provider: positions come from a closure and the inertial
    /// frame is the Earth-fixed frame.
    pub(crate) struct Scripted(pub Box<Track>);

    impl PositionProvider for Scripted {
        fn propagate(
            &self,
            _elements: &OrbitalElementSet,
            time: DateTime<Utc>,
        ) -> Result<StateVector, PropagationError> {
            (self.0)(time).map(StateVector::at)
        }

        fn sidereal_time(&self, _time: DateTime<Utc>) -> f64 {
            0.0
        }
    }

    /// Position seen from `observer` at the given look angles, 1000 km out.
    pub(crate) fn sky_point(observer: &GeoLocation, azimuth_deg: f64, elevation_deg: f64) -> Vec3 {
        let frame = LocalFrame::at(observer.latitude_deg, observer.longitude_deg);
        observer.position_ecef_km() + frame.direction(azimuth_deg, elevation_deg) * 1000.0
    }

    pub(crate) fn object(id: &str) -> TrackedObject {
        TrackedObject::new(id, format!("OBJ {id}"), OrbitalElementSet::from_tle(None, "1", "2"))
    }

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn minutes_since_t0(time: DateTime<Utc>) -> f64 {
        (time - t0()).num_milliseconds() as f64 / 60_000.0
    }

    fn assert_well_formed(passes: &[Pass], min_elevation_deg: f64) {
        for p in passes {
            assert!(p.start_time <= p.peak_time && p.peak_time <= p.end_time);
            assert!(p.start_time < p.end_time);
            assert!(p.peak_elevation_deg >= min_elevation_deg);
            assert!(p.duration_minutes > MIN_PASS_MINUTES);
        }
    }

    #[test]
    fn compass_sectors() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(10.0), "N");
        assert_eq!(compass_point(22.4), "N");
        assert_eq!(compass_point(22.6), "NE");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(170.0), "S");
        assert_eq!(compass_point(247.0), "SW");
        assert_eq!(compass_point(350.0), "N");
        assert_eq!(compass_point(359.9), "N");
        assert_eq!(compass_point(-45.0), "NW");
    }

    #[test]
    fn overhead_for_whole_window_is_one_pass() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let provider = Scripted(Box::new(|_| Ok(Vec3::new(7000.0, 0.0, 0.0))));
        let end = t0() + Duration::hours(12);
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            end,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.start_time, t0());
        assert_eq!(pass.end_time, end);
        assert_relative_eq!(pass.peak_elevation_deg, 90.0, epsilon = 1e-9);
        assert_relative_eq!(pass.duration_minutes, 720.0);
        assert!(pass.truncated);
        assert_well_formed(&passes, 0.0);
    }

    #[test]
    fn below_horizon_gives_no_passes() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let below = sky_point(&observer, 120.0, -10.0);
        let provider = Scripted(Box::new(move |_| Ok(below)));
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            t0() + Duration::hours(24),
            &ScanOptions::default(),
        )
        .unwrap();
        assert!(passes.is_empty());
    }

    #[test]
    fn pass_open_at_window_end_is_closed_at_boundary() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let up = sky_point(&observer, 200.0, 40.0);
        let down = sky_point(&observer, 200.0, -5.0);
        // visible for the first 725 minutes, well past the window end
        let provider = Scripted(Box::new(move |t| {
            Ok(if minutes_since_t0(t) <= 725.0 { up } else { down })
        }));
        let end = t0() + Duration::minutes(720);
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            end,
            &ScanOptions::default(),
        )
        .unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].end_time, end);
        assert_relative_eq!(passes[0].duration_minutes, 720.0);
        assert!(passes[0].truncated);
    }

    #[test]
    fn direction_follows_start_and_end_azimuth() {
        let observer = GeoLocation::new(30.0, -90.0).unwrap();
        let obs = observer;
        // azimuth sweeps 10 -> 170 over 30 minutes, sets at minute 30
        let provider = Scripted(Box::new(move |t| {
            let m = minutes_since_t0(t);
            let azimuth = 10.0 + (m.min(30.0) / 30.0) * 160.0;
            let elevation = if m < 30.0 { 45.0 } else { -5.0 };
            Ok(sky_point(&obs, azimuth, elevation))
        }));
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            t0() + Duration::hours(2),
            &ScanOptions::default(),
        )
        .unwrap();
        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.compass_direction, "N to S");
        assert_eq!(pass.end_time, t0() + Duration::minutes(30));
        assert_relative_eq!(pass.duration_minutes, 30.0);
        assert_relative_eq!(pass.start_azimuth_deg, 10.0, epsilon = 1e-6);
        assert_relative_eq!(pass.end_azimuth_deg, 170.0, epsilon = 1e-6);
        assert!(!pass.truncated);
    }

    #[test]
    fn tracks_peak_and_drops_short_passes() {
        let observer = GeoLocation::new(51.5, 0.0).unwrap();
        let obs = observer;
        // one 1-minute blip at minute 10, one 20-minute arc from minute 60
        let provider = Scripted(Box::new(move |t| {
            let m = minutes_since_t0(t);
            let elevation = if m == 10.0 {
                30.0
            } else if (60.0..80.0).contains(&m) {
                60.0 - (m - 70.0).abs() * 5.5
            } else {
                -20.0
            };
            Ok(sky_point(&obs, 90.0, elevation))
        }));
        let options = ScanOptions::default().with_min_elevation(10.0);
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            t0() + Duration::hours(3),
            &options,
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert_eq!(pass.peak_time, t0() + Duration::minutes(70));
        assert_relative_eq!(pass.peak_elevation_deg, 60.0, epsilon = 1e-6);
        // first sample above 10 deg is minute 61 (elevation 10.5)
        assert_eq!(pass.start_time, t0() + Duration::minutes(61));
        assert_eq!(pass.end_time, t0() + Duration::minutes(80));
        assert_well_formed(&passes, 10.0);
    }

    #[test]
    fn two_minute_pass_is_kept_one_minute_dropped() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let obs = observer;
        let provider = Scripted(Box::new(move |t| {
            let m = minutes_since_t0(t);
            let visible = (5.0..6.0).contains(&m) || (20.0..22.0).contains(&m);
            Ok(sky_point(&obs, 0.0, if visible { 20.0 } else { -20.0 }))
        }));
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            t0() + Duration::hours(1),
            &ScanOptions::default(),
        )
        .unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].start_time, t0() + Duration::minutes(20));
        assert_relative_eq!(passes[0].duration_minutes, 2.0);
    }

    #[test]
    fn failure_aborts_object_by_default() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let provider = Scripted(Box::new(|t| {
            if minutes_since_t0(t) >= 30.0 {
                Err(PropagationError::Diverged("decayed".into()))
            } else {
                Ok(Vec3::new(7000.0, 0.0, 0.0))
            }
        }));
        let result = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            t0() + Duration::hours(1),
            &ScanOptions::default(),
        );
        assert!(matches!(result, Err(PredictError::Propagation(_))));
    }

    #[test]
    fn skip_sample_policy_keeps_scanning() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let provider = Scripted(Box::new(|t| {
            let m = minutes_since_t0(t);
            if m == 15.0 {
                Err(PropagationError::Diverged("glitch".into()))
            } else if m < 40.0 {
                Ok(Vec3::new(7000.0, 0.0, 0.0))
            } else {
                Ok(Vec3::new(-7000.0, 0.0, 0.0))
            }
        }));
        let options = ScanOptions::default().with_failure_policy(FailurePolicy::SkipSample);
        let passes = predict_passes(
            &provider,
            &object("1"),
            &observer,
            t0(),
            t0() + Duration::hours(1),
            &options,
        )
        .unwrap();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].end_time, t0() + Duration::minutes(40));
    }

    #[test]
    fn iss_passes_over_delft() {
        use crate::predict::elements::tests::{ISS_LINE1, ISS_LINE2, ISS_NAME};
        use crate::predict::propagation::Sgp4Provider;

        let iss = TrackedObject::new(
            "25544",
            ISS_NAME,
            OrbitalElementSet::from_tle(Some(ISS_NAME), ISS_LINE1, ISS_LINE2),
        );
        let observer = GeoLocation::new(52.0, 4.37).unwrap();
        let start = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();
        let passes = predict_passes(
            &Sgp4Provider,
            &iss,
            &observer,
            start,
            start + Duration::hours(24),
            &ScanOptions::default(),
        )
        .unwrap();

        assert!((3..=10).contains(&passes.len()), "{} passes", passes.len());
        assert_well_formed(&passes, 0.0);
        for pair in passes.windows(2) {
            // consecutive passes are at least most of an orbit apart
            assert!(pair[1].start_time - pair[0].start_time > Duration::minutes(60));
        }
        for pass in &passes {
            assert!(pass.duration_minutes < 15.0, "{} min", pass.duration_minutes);
            assert!(pass.peak_elevation_deg <= 90.0);
        }
        assert!(passes.iter().any(|p| p.peak_elevation_deg > 20.0));
    }

    #[test]
    fn rejects_invalid_windows_and_options() {
        let observer = GeoLocation::new(0.0, 0.0).unwrap();
        let provider = Scripted(Box::new(|_| Ok(Vec3::new(7000.0, 0.0, 0.0))));
        let obj = object("1");
        assert!(matches!(
            predict_passes(&provider, &obj, &observer, t0(), t0(), &ScanOptions::default()),
            Err(PredictError::InvalidInput(_))
        ));
        let bad_observer = GeoLocation {
            longitude_deg: -200.0,
            ..GeoLocation::default()
        };
        assert!(matches!(
            predict_passes(
                &provider,
                &obj,
                &bad_observer,
                t0(),
                t0() + Duration::hours(1),
                &ScanOptions::default()
            ),
            Err(PredictError::InvalidInput(_))
        ));
        let options = ScanOptions::default().with_step(Duration::zero());
        assert!(matches!(
            predict_passes(
                &provider,
                &obj,
                &observer,
                t0(),
                t0() + Duration::hours(1),
                &options
            ),
            Err(PredictError::InvalidInput(_))
        ));
    }
}
