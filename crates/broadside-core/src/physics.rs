//! Speed model and navigation geometry.
//!
//! - [`SpeedModel`]: maps engine power percentage to steady-state speed.
//!   [`HullResistance`] is the stock model; any `Fn(f64) -> f64` also works.
//! - [`GeoPoint`]: latitude/longitude with great-circle movement helpers.
//!
//! Units: speeds inside the speed model are metres per second; ships work in
//! knots and convert with [`KNOTS_PER_MPS`]. Distances travelled are nautical
//! miles, converted to metres with [`METERS_PER_NAUTICAL_MILE`].

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Knots per metre-per-second.
pub const KNOTS_PER_MPS: f64 = 1.943_84;

/// Metres in one nautical mile.
pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const GRAVITY: f64 = 9.81;
const SEAWATER_DENSITY: f64 = 1025.0;
const KINEMATIC_VISCOSITY: f64 = 1.19e-6;

// =============================================================================
// Speed Model
// =============================================================================

/// Steady-state speed for an engine power setting.
///
/// Implementations must be pure: the ship calls this every tick.
pub trait SpeedModel: Send + Sync {
    /// Speed in metres per second at `power_percentage` (0-100).
    fn speed_mps(&self, power_percentage: f64) -> f64;
}

impl<F> SpeedModel for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn speed_mps(&self, power_percentage: f64) -> f64 {
        self(power_percentage)
    }
}

/// Hull resistance balance: the speed at which resistance power equals the
/// available engine power.
///
/// Resistance is a friction term (ITTC-57 line) plus a residuary term growing
/// with the fourth power of the Froude number. The balance is found by
/// bisection over 0-50 m/s to a 0.1 m/s bracket, returning the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullResistance {
    /// Waterline length in metres.
    pub length_m: f64,
    /// Displacement in tonnes. Carried for reporting; the model ignores it.
    pub displacement_t: f64,
    /// Installed engine power in kilowatts.
    pub engine_power_kw: f64,
}

impl HullResistance {
    const SEARCH_CEILING_MPS: f64 = 50.0;
    const SEARCH_TOLERANCE_MPS: f64 = 0.1;

    /// Creates a resistance model for a hull.
    #[must_use]
    pub const fn new(length_m: f64, displacement_t: f64, engine_power_kw: f64) -> Self {
        Self {
            length_m,
            displacement_t,
            engine_power_kw,
        }
    }

    /// Total resistance at `speed_mps`.
    #[must_use]
    pub fn resistance(&self, speed_mps: f64) -> f64 {
        if speed_mps <= 0.0 || self.length_m <= 0.0 {
            return 0.0;
        }
        let froude = speed_mps / (GRAVITY * self.length_m).sqrt();
        let reynolds = speed_mps * self.length_m / KINEMATIC_VISCOSITY;

        let cf = 0.075 / (reynolds.log10() - 2.0).powi(2);
        let cr = 0.0004 * froude.powi(4);

        0.5 * SEAWATER_DENSITY * speed_mps.powi(2) * self.length_m.powi(2) * (cf + cr)
    }
}

impl SpeedModel for HullResistance {
    fn speed_mps(&self, power_percentage: f64) -> f64 {
        let available = self.engine_power_kw * power_percentage / 100.0;
        let surplus = |speed: f64| self.resistance(speed) * speed - available;

        let (mut low, mut high) = (0.0, Self::SEARCH_CEILING_MPS);
        while high - low > Self::SEARCH_TOLERANCE_MPS {
            let mid = (low + high) / 2.0;
            if surplus(mid) > 0.0 {
                high = mid;
            } else {
                low = mid;
            }
        }
        low
    }
}

// =============================================================================
// Geography
// =============================================================================

/// A position on the globe in decimal degrees.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude, degrees north.
    pub latitude: f64,
    /// Longitude, degrees east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both coordinates are finite and in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Point reached by travelling `distance_m` along `bearing_deg` on a
    /// spherical Earth.
    #[must_use]
    pub fn destination(self, bearing_deg: f64, distance_m: f64) -> Self {
        let angular = distance_m / EARTH_RADIUS_M;
        let bearing = bearing_deg.to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();

        let lat2 =
            (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        Self {
            latitude: lat2.to_degrees(),
            longitude: normalize_longitude(lon2.to_degrees()),
        }
    }

    /// Great-circle distance to `other` in metres (haversine).
    #[must_use]
    pub fn distance_m(self, other: Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// Initial compass bearing towards `other`, in `[0, 360)`.
    #[must_use]
    pub fn bearing_to(self, other: Self) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let x = dlon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        normalize_heading(x.atan2(y).to_degrees())
    }

    /// Planar distance in degrees, treating latitude and longitude as
    /// Cartesian axes. Used for the coarse collision check only.
    #[must_use]
    pub fn degree_distance(self, other: Self) -> f64 {
        DVec2::new(self.latitude, self.longitude)
            .distance(DVec2::new(other.latitude, other.longitude))
    }
}

/// Wraps an angle into `[0, 360)`.
#[must_use]
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn normalize_longitude(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}
