use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sgp4::Elements;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::predict::error::PropagationError;

/// Two-digit years below this pivot belong to the 2000s.
///
/// This mirrors the catalog convention only approximately: it is right for
/// everything launched 1957-2056 and wrong outside that range.
pub const YEAR_PIVOT: u32 = 57;

pub fn pivot_two_digit_year(yy: u32) -> i32 {
    if yy < YEAR_PIVOT {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

/// Orbital elements in two-line form, decoded once on construction.
///
/// A set that fails to decode is kept so that every propagation query against
/// it reports the same failure.
#[derive(Debug, Clone, Serialize)]
pub struct OrbitalElementSet {
    pub line1: String,
    pub line2: String,
    #[serde(skip)]
    decoded: Result<Elements, String>,
}

impl OrbitalElementSet {
    pub fn from_tle(name: Option<&str>, line1: &str, line2: &str) -> Self {
        let line1 = line1.trim().to_string();
        let line2 = line2.trim().to_string();
        let decoded = Elements::from_tle(
            name.map(str::to_string),
            line1.as_bytes(),
            line2.as_bytes(),
        )
        .map_err(|e| e.to_string());
        Self {
            line1,
            line2,
            decoded,
        }
    }

    pub fn elements(&self) -> Result<&Elements, PropagationError> {
        self.decoded
            .as_ref()
            .map_err(|e| PropagationError::InvalidElements(e.clone()))
    }

    pub fn is_valid(&self) -> bool {
        self.decoded.is_ok()
    }

    /// Catalog number from columns 3-7 of line 1.
    pub fn catalog_number(&self) -> Option<u64> {
        self.line1.get(2..7)?.trim().parse().ok()
    }

    /// Launch year from the international designator (line 1, columns 10-11).
    ///
    /// Uses the [`YEAR_PIVOT`] heuristic, so treat it as an estimate.
    pub fn launch_year(&self) -> Option<i32> {
        let yy: u32 = self.line1.get(9..11)?.trim().parse().ok()?;
        Some(pivot_two_digit_year(yy))
    }

    pub fn epoch(&self) -> Option<DateTime<Utc>> {
        self.decoded.as_ref().ok().map(|e| e.datetime.and_utc())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    Station,
    Payload,
    RocketBody,
    Debris,
    #[default]
    Unknown,
}

impl Category {
    /// Guesses the category from catalog naming conventions.
    pub fn from_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        if upper.contains(" R/B") || upper.ends_with("R/B") {
            Category::RocketBody
        } else if upper.contains(" DEB") {
            Category::Debris
        } else if upper.starts_with("ISS") || upper.contains("TIANGONG") || upper.starts_with("CSS")
        {
            Category::Station
        } else if upper.starts_with("NORAD ") {
            Category::Unknown
        } else {
            Category::Payload
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackedObject {
    pub id: String,
    pub name: String,
    #[schema(value_type = Object)]
    pub elements: OrbitalElementSet,
    pub category: Option<Category>,
}

impl TrackedObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, elements: OrbitalElementSet) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            category: Some(Category::from_name(&name)),
            name,
            elements,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const ISS_NAME: &str = "ISS (ZARYA)";
    pub const ISS_LINE1: &str =
        "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    pub const ISS_LINE2: &str =
        "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    #[test]
    fn decodes_valid_tle() {
        let set = OrbitalElementSet::from_tle(Some(ISS_NAME), ISS_LINE1, ISS_LINE2);
        assert!(set.is_valid());
        assert_eq!(set.catalog_number(), Some(25544));
        assert_eq!(set.elements().unwrap().norad_id, 25544);
        let epoch = set.epoch().unwrap();
        assert_eq!(epoch.format("%Y-%m-%d").to_string(), "2020-07-12");
    }

    #[test]
    fn malformed_set_reports_on_every_query() {
        let set = OrbitalElementSet::from_tle(None, "1 garbage", "2 garbage");
        assert!(!set.is_valid());
        assert!(matches!(set.elements(), Err(PropagationError::InvalidElements(_))));
        assert!(set.elements().is_err());
        assert!(set.epoch().is_none());
    }

    #[test]
    fn launch_year_uses_pivot() {
        let set = OrbitalElementSet::from_tle(Some(ISS_NAME), ISS_LINE1, ISS_LINE2);
        assert_eq!(set.launch_year(), Some(1998));
        assert_eq!(pivot_two_digit_year(56), 2056);
        assert_eq!(pivot_two_digit_year(57), 1957);
        assert_eq!(pivot_two_digit_year(0), 2000);
        assert_eq!(pivot_two_digit_year(99), 1999);
    }

    #[test]
    fn category_from_name() {
        assert_eq!(Category::from_name("ISS (ZARYA)"), Category::Station);
        assert_eq!(Category::from_name("CZ-4C R/B"), Category::RocketBody);
        assert_eq!(Category::from_name("COSMOS 2251 DEB"), Category::Debris);
        assert_eq!(Category::from_name("NOAA 19"), Category::Payload);
        assert_eq!(Category::RocketBody.to_string(), "rocket_body");
    }
}
