use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GeometryError, LocalFrame, Vec3};

/// How a point is tested against an [`ApertureCone`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConeStrategy {
    /// Projection onto the axis; the authoritative test.
    #[default]
    ExactContainment,
    /// Angle measured at the Earth's centre instead of at the apex. Only good
    /// enough for highlighting things on screen.
    ApproximateHighlight,
}

/// Pointing of a cone axis relative to the observer's local horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PointingOffset {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// A directional visibility constraint: apex, unit axis and half-angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApertureCone {
    apex: Vec3,
    axis: Vec3,
    half_angle_deg: f64,
}

/// What a renderer needs to draw a cone truncated at `height_km`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConeDisplay {
    pub apex: Vec3,
    pub axis: Vec3,
    pub height_km: f64,
    pub base_center: Vec3,
    pub base_radius_km: f64,
}

impl PointingOffset {
    pub fn validate(&self) -> Result<(), GeometryError> {
        if (0.0..=360.0).contains(&self.azimuth_deg) && (-90.0..=90.0).contains(&self.elevation_deg)
        {
            Ok(())
        } else {
            Err(GeometryError::Pointing {
                azimuth_deg: self.azimuth_deg,
                elevation_deg: self.elevation_deg,
            })
        }
    }
}

impl ApertureCone {
    pub fn new(apex: Vec3, axis: Vec3, half_angle_deg: f64) -> Result<Self, GeometryError> {
        if !(half_angle_deg > 0.0 && half_angle_deg <= 90.0) {
            return Err(GeometryError::HalfAngle(half_angle_deg));
        }
        let norm = axis.norm();
        if !norm.is_finite() || norm == 0.0 {
            return Err(GeometryError::DegenerateAxis);
        }
        Ok(Self {
            apex,
            axis: axis / norm,
            half_angle_deg,
        })
    }

    /// Cone with its apex at `apex` and its axis pointed through the local
    /// frame. Without an offset the axis is the local zenith.
    pub fn from_local(
        apex: Vec3,
        frame: &LocalFrame,
        offset: Option<PointingOffset>,
        half_angle_deg: f64,
    ) -> Result<Self, GeometryError> {
        let axis = match offset {
            Some(o) => {
                o.validate()?;
                frame.direction(o.azimuth_deg, o.elevation_deg)
            }
            None => frame.up,
        };
        Self::new(apex, axis, half_angle_deg)
    }

    pub fn apex(&self) -> &Vec3 {
        &self.apex
    }

    pub fn axis(&self) -> &Vec3 {
        &self.axis
    }

    pub fn half_angle_deg(&self) -> f64 {
        self.half_angle_deg
    }

    pub fn contains(&self, point: &Vec3, strategy: ConeStrategy) -> bool {
        match strategy {
            ConeStrategy::ExactContainment => point_in_cone(point, self),
            ConeStrategy::ApproximateHighlight => self.approximate_highlight(point),
        }
    }

    fn approximate_highlight(&self, point: &Vec3) -> bool {
        if point.norm() == 0.0 {
            return false;
        }
        point.angle(&self.axis).to_degrees() <= self.half_angle_deg
    }

    pub fn radius_at(&self, height_km: f64) -> f64 {
        height_km * self.half_angle_deg.to_radians().tan()
    }

    pub fn display(&self, height_km: f64) -> ConeDisplay {
        ConeDisplay {
            apex: self.apex,
            axis: self.axis,
            height_km,
            base_center: self.apex + self.axis * height_km,
            base_radius_km: self.radius_at(height_km),
        }
    }
}

/// Exact containment: project onto the axis and compare the perpendicular
/// distance with the cone radius at that depth. Points at or behind the apex
/// are outside.
pub fn point_in_cone(point: &Vec3, cone: &ApertureCone) -> bool {
    let v = point - cone.apex;
    let along = v.dot(&cone.axis);
    if along <= 0.0 {
        return false;
    }
    let proj = cone.axis * along;
    let perp = v - proj;
    perp.norm() <= proj.norm() * cone.half_angle_deg.to_radians().tan()
}
