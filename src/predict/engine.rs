use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::elements::TrackedObject;
use crate::predict::error::PredictError;
use crate::predict::observer::GeoLocation;
use crate::predict::pass_finder::{predict_passes, ScanOptions};
use crate::predict::propagation::PositionProvider;
use crate::predict::types::Pass;

/// Cooperative cancellation flag, checked before each object is scanned.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// An object whose scan was abandoned.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ObjectFailure {
    pub object_id: String,
    pub object_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanReport {
    /// Ordered by start time, then object id.
    pub passes: Vec<Pass>,
    pub failures: Vec<ObjectFailure>,
    pub scanned: usize,
    pub cancelled: bool,
}

enum Outcome {
    Scanned(Vec<Pass>),
    Failed(ObjectFailure),
    Skipped,
}

/// Scans many objects in parallel against one observer.
pub struct PassEngine<P> {
    provider: P,
    options: ScanOptions,
    cancel: CancellationToken,
}

impl<P: PositionProvider> PassEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            options: ScanOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validates inputs, then scans every object over `[start, start + duration_hours]`.
    ///
    /// Only contract violations are returned as errors. An object whose
    /// propagation fails is listed in [`ScanReport::failures`] and contributes
    /// no passes.
    pub fn run(
        &self,
        objects: &[TrackedObject],
        observer: &GeoLocation,
        start: DateTime<Utc>,
        duration_hours: f64,
    ) -> Result<ScanReport, PredictError> {
        observer.validate()?;
        self.options.validate()?;
        let end = window_end(start, duration_hours)?;

        let outcomes = objects
            .par_iter()
            .map(|object| {
                if self.cancel.is_cancelled() {
                    return Ok(Outcome::Skipped);
                }
                match predict_passes(&self.provider, object, observer, start, end, &self.options)
                {
                    Ok(passes) => Ok(Outcome::Scanned(passes)),
                    Err(PredictError::Propagation(e)) => {
                        log::warn!("Failed to predict passes for {} ({}): {}", object.name, object.id, e);
                        Ok(Outcome::Failed(ObjectFailure {
                            object_id: object.id.clone(),
                            object_name: object.name.clone(),
                            reason: e.to_string(),
                        }))
                    }
                    Err(e) => Err(e),
                }
            })
            .collect::<Result<Vec<Outcome>, PredictError>>()?;

        let mut report = ScanReport {
            passes: Vec::new(),
            failures: Vec::new(),
            scanned: 0,
            cancelled: false,
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Scanned(passes) => {
                    report.scanned += 1;
                    report.passes.extend(passes);
                }
                Outcome::Failed(failure) => {
                    report.scanned += 1;
                    report.failures.push(failure);
                }
                Outcome::Skipped => report.cancelled = true,
            }
        }

        report
            .passes
            .sort_by(|a, b| (a.start_time, &a.object.id).cmp(&(b.start_time, &b.object.id)));

        log::info!(
            "Scanned {}/{} objects: {} passes, {} failures{}",
            report.scanned,
            objects.len(),
            report.passes.len(),
            report.failures.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );

        Ok(report)
    }
}

/// End of a window `duration_hours` long, at millisecond resolution.
fn window_end(start: DateTime<Utc>, duration_hours: f64) -> Result<DateTime<Utc>, PredictError> {
    let invalid = || {
        PredictError::InvalidInput(format!(
            "duration must be a positive, representable number of hours, got {duration_hours}"
        ))
    };
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Err(invalid());
    }
    let millis = (duration_hours * 3_600_000.0).round();
    if millis < 1.0 || millis >= i64::MAX as f64 {
        return Err(invalid());
    }
    Duration::try_milliseconds(millis as i64)
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(invalid)
}

/// All passes of `objects` over the window, ordered by start time.
pub fn compute_passes<P: PositionProvider>(
    provider: P,
    objects: &[TrackedObject],
    observer: &GeoLocation,
    start: DateTime<Utc>,
    duration_hours: f64,
    min_elevation_deg: f64,
) -> Result<Vec<Pass>, PredictError> {
    let options = ScanOptions::default().with_min_elevation(min_elevation_deg);
    let report = PassEngine::new(provider)
        .with_options(options)
        .run(objects, observer, start, duration_hours)?;
    Ok(report.passes)
}
