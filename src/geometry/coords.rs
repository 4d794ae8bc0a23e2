use super::Vec3;

pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

// WGS-84 constants
pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_E2: f64 = 0.006_694_379_990_14;

/// Spherical to Cartesian using the crate-wide Z-up convention.
pub fn to_cartesian(latitude_deg: f64, longitude_deg: f64, radius: f64) -> Vec3 {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    Vec3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.cos() * lon.sin(),
        radius * lat.sin(),
    )
}

/// Inverse of [`to_cartesian`]: returns `(latitude_deg, longitude_deg, radius)`.
///
/// The origin maps to `(0, 0, 0)`.
pub fn to_geographic(point: &Vec3) -> (f64, f64, f64) {
    let radius = point.norm();
    if radius == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let lat = (point.z / radius).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = point.y.atan2(point.x).to_degrees();
    (lat, lon, radius)
}

/// Outward unit normal at a surface point.
///
/// For a sphere this is the normalized position. The same expression is the
/// ellipsoid normal when the latitude is geodetic, which is what the observer
/// frame relies on.
pub fn surface_normal(latitude_deg: f64, longitude_deg: f64) -> Vec3 {
    to_cartesian(latitude_deg, longitude_deg, 1.0)
}

/// Geodetic latitude/longitude/altitude on the WGS-84 ellipsoid to Earth-fixed km.
///
/// The point lies along the geodetic normal at distance `N + h`, pulled
/// towards the equator by `N e² sin(lat)` along the polar axis.
pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Vec3 {
    let sin_lat = latitude_deg.to_radians().sin();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    surface_normal(latitude_deg, longitude_deg) * (n + altitude_km)
        - Vec3::z() * (n * WGS84_E2 * sin_lat)
}

/// Rotates an Earth-centred inertial vector into the Earth-fixed frame.
pub fn eci_to_ecef(position: &Vec3, sidereal_rad: f64) -> Vec3 {
    let (sin_g, cos_g) = sidereal_rad.sin_cos();
    Vec3::new(
        position.x * cos_g + position.y * sin_g,
        -position.x * sin_g + position.y * cos_g,
        position.z,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

/// East-North-Up basis at a point on the surface, expressed in the Earth-fixed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub east: Vec3,
    pub north: Vec3,
    pub up: Vec3,
}

impl LocalFrame {
    pub fn at(latitude_deg: f64, longitude_deg: f64) -> Self {
        let lat = latitude_deg.to_radians();
        let lon = longitude_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        Self {
            east: Vec3::new(-sin_lon, cos_lon, 0.0),
            north: Vec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
            up: surface_normal(latitude_deg, longitude_deg),
        }
    }

    /// Azimuth (from north, clockwise), elevation and range of an offset vector.
    pub fn look_angles(&self, offset: &Vec3) -> LookAngles {
        let east = offset.dot(&self.east);
        let north = offset.dot(&self.north);
        let up = offset.dot(&self.up);
        let range_km = offset.norm();

        let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation_deg = if range_km > 0.0 {
            (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
        } else {
            0.0
        };

        LookAngles {
            // rem_euclid can round up to exactly 360.0 for tiny negative inputs
            azimuth_deg: if azimuth_deg >= 360.0 { 0.0 } else { azimuth_deg },
            elevation_deg,
            range_km,
        }
    }

    /// Unit vector pointing at the given azimuth/elevation.
    pub fn direction(&self, azimuth_deg: f64, elevation_deg: f64) -> Vec3 {
        let (sin_az, cos_az) = azimuth_deg.to_radians().sin_cos();
        let (sin_el, cos_el) = elevation_deg.to_radians().sin_cos();
        self.east * (cos_el * sin_az) + self.north * (cos_el * cos_az) + self.up * sin_el
    }
}
