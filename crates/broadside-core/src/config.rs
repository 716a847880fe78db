//! Scenario and ship configuration.
//!
//! Every struct here deserializes from JSON with `#[serde(default)]`, so a
//! scenario only has to spell out what differs from the stock destroyer:
//!
//! ```
//! use broadside_core::config::ScenarioConfig;
//!
//! let scenario = ScenarioConfig::from_json(r#"{
//!     "world": { "seed": 7 },
//!     "ships": [
//!         { "name": "Fubuki", "location": { "latitude": 35.6895, "longitude": 139.6917 } },
//!         { "name": "Enemy Destroyer", "location": { "latitude": 35.7895, "longitude": 139.7917 } }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(scenario.ships.len(), 2);
//! assert_eq!(scenario.ships[0].hp, 1000.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hit::HitTable;
use crate::physics::{GeoPoint, HullResistance};

// =============================================================================
// Module Specs
// =============================================================================

/// Construction parameters for a gun turret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunSpec {
    /// Rounds the turret can fire before it must be re-supplied.
    pub shells_capacity: u32,
    /// Rounds consumed per `fire()`.
    pub fire_shell_cost: u32,
    /// Minutes to load the breech.
    pub reload_time_minutes: f64,
    /// Gun crew manning the turret.
    pub staff_on_duty: u32,
    /// Gun crew in reserve.
    pub staff_off_duty: u32,
    /// Hit-probability policy for this variant.
    pub hit_table: HitTable,
}

impl Default for GunSpec {
    fn default() -> Self {
        Self {
            shells_capacity: 5,
            fire_shell_cost: 1,
            reload_time_minutes: 5.0,
            staff_on_duty: 5,
            staff_off_duty: 10,
            hit_table: HitTable::never(),
        }
    }
}

impl GunSpec {
    /// Type 3 127 mm twin mount: 300 rounds, two per salvo.
    #[must_use]
    pub fn type3_127mm() -> Self {
        Self {
            shells_capacity: 300,
            fire_shell_cost: 2,
            hit_table: HitTable::type3_127mm(),
            ..Self::default()
        }
    }
}

/// Construction parameters for a torpedo launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSpec {
    /// Number of tubes.
    pub tube_count: usize,
    /// Torpedoes held in reserve for reloading.
    pub torpedo_reserve: u32,
    /// Minutes to load one tube in combat.
    pub tube_reload_time_minutes: f64,
    /// Minutes for a full reload of every empty tube.
    pub full_reload_time_minutes: f64,
    /// Whether the mount can train through 360 degrees.
    pub tube_rotation_capable: bool,
    /// Torpedo crew manning the mount.
    pub staff_on_duty: u32,
    /// Torpedo crew in reserve.
    pub staff_off_duty: u32,
    /// Hit-probability policy for this variant.
    pub hit_table: HitTable,
}

impl Default for LauncherSpec {
    fn default() -> Self {
        Self {
            tube_count: 3,
            torpedo_reserve: 6,
            tube_reload_time_minutes: 1.0,
            full_reload_time_minutes: 90.0,
            tube_rotation_capable: true,
            staff_on_duty: 5,
            staff_off_duty: 10,
            hit_table: HitTable::never(),
        }
    }
}

impl LauncherSpec {
    /// Triple 610 mm mount with the three-die hit table.
    #[must_use]
    pub fn triple_610mm() -> Self {
        Self {
            hit_table: HitTable::triple_610mm(),
            ..Self::default()
        }
    }
}

/// Construction parameters for the engine room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSpec {
    /// Boiler description (reporting only).
    pub boilers: String,
    /// Engine description (reporting only).
    pub engines: String,
    /// Rated output in horsepower.
    pub rated_power: f64,
    /// Top speed ahead, knots.
    pub max_speed: f64,
    /// Endurance in nautical miles.
    pub range_nautical_miles: f64,
    /// Economical cruising speed, knots.
    pub cruise_speed: f64,
    /// Engineers on watch.
    pub staff_on_duty: u32,
    /// Engineers off watch.
    pub staff_off_duty: u32,
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self {
            boilers: "4 Kampon Ro-go boilers".to_string(),
            engines: "2 Kampon geared turbines, 2 shafts".to_string(),
            rated_power: 50_000.0,
            max_speed: 38.0,
            range_nautical_miles: 5000.0,
            cruise_speed: 12.0,
            staff_on_duty: 20,
            staff_off_duty: 70,
        }
    }
}

/// Hull dimensions feeding the resistance speed model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullSpec {
    /// Waterline length in metres.
    pub length_m: f64,
    /// Displacement in tonnes.
    pub displacement_t: f64,
    /// Installed power in kilowatts.
    pub engine_power_kw: f64,
}

impl Default for HullSpec {
    fn default() -> Self {
        Self {
            length_m: 118.5,
            displacement_t: 1750.0,
            engine_power_kw: 50_000.0,
        }
    }
}

impl HullSpec {
    /// Builds the resistance speed model for this hull.
    #[must_use]
    pub fn resistance_model(&self) -> HullResistance {
        HullResistance::new(self.length_m, self.displacement_t, self.engine_power_kw)
    }
}

// =============================================================================
// Ship / World / Scenario
// =============================================================================

/// Everything needed to build a ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Display name.
    pub name: String,
    /// Starting (and maximum) hull points.
    pub hp: f64,
    /// Starting position.
    pub location: GeoPoint,
    /// Starting heading in degrees, `[0, 360)`.
    pub heading: f64,
    /// Knots gained per hour when below target speed.
    pub acceleration_rate: f64,
    /// Knots shed per hour when above target speed.
    pub deceleration_rate: f64,
    /// Degrees per hour.
    pub turn_rate: f64,
    /// Minimum hours between gun salvos.
    pub gun_cooldown_hours: f64,
    /// Minimum hours between torpedo launches.
    pub torpedo_cooldown_hours: f64,
    /// Component HP pool of the engine room.
    pub engine_room_hp: f64,
    /// Component HP pool of each gun.
    pub gun_hp: f64,
    /// Component HP pool of each launcher.
    pub launcher_hp: f64,
    /// Engine room parameters.
    pub engine: EngineSpec,
    /// Hull parameters for the speed model.
    pub hull: HullSpec,
    /// Gun turrets, in firing order.
    pub guns: Vec<GunSpec>,
    /// Torpedo launchers, in launch order.
    pub launchers: Vec<LauncherSpec>,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            name: "Unnamed".to_string(),
            hp: 1000.0,
            location: GeoPoint::default(),
            heading: 0.0,
            acceleration_rate: 100.0,
            deceleration_rate: 100.0,
            turn_rate: 360.0,
            gun_cooldown_hours: 0.1,
            torpedo_cooldown_hours: 0.2,
            engine_room_hp: 100.0,
            gun_hp: 50.0,
            launcher_hp: 75.0,
            engine: EngineSpec::default(),
            hull: HullSpec::default(),
            guns: vec![GunSpec::default()],
            launchers: vec![LauncherSpec::default()],
        }
    }
}

impl ShipConfig {
    /// Creates a default ship with the given name and position.
    #[must_use]
    pub fn named(name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            name: name.into(),
            location,
            ..Self::default()
        }
    }

    /// Checks that every numeric field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = |name: &str| format!("ship `{}`.{name}", self.name);

        non_negative(&field("hp"), self.hp)?;
        non_negative(&field("acceleration_rate"), self.acceleration_rate)?;
        non_negative(&field("deceleration_rate"), self.deceleration_rate)?;
        non_negative(&field("turn_rate"), self.turn_rate)?;
        non_negative(&field("gun_cooldown_hours"), self.gun_cooldown_hours)?;
        non_negative(&field("torpedo_cooldown_hours"), self.torpedo_cooldown_hours)?;
        non_negative(&field("engine_room_hp"), self.engine_room_hp)?;
        non_negative(&field("gun_hp"), self.gun_hp)?;
        non_negative(&field("launcher_hp"), self.launcher_hp)?;

        if !self.location.is_valid() {
            return Err(ConfigError::invalid(
                field("location"),
                format!("{:?} is not a valid coordinate", self.location),
            ));
        }
        if !(0.0..360.0).contains(&self.heading) {
            return Err(ConfigError::invalid(
                field("heading"),
                format!("{} is outside [0, 360)", self.heading),
            ));
        }
        if !(self.engine.max_speed.is_finite() && self.engine.max_speed > 0.0) {
            return Err(ConfigError::invalid(
                field("engine.max_speed"),
                "must be positive",
            ));
        }
        non_negative(&field("hull.length_m"), self.hull.length_m)?;
        non_negative(&field("hull.engine_power_kw"), self.hull.engine_power_kw)?;

        for (i, gun) in self.guns.iter().enumerate() {
            if gun.fire_shell_cost == 0 {
                return Err(ConfigError::invalid(
                    field(&format!("guns[{i}].fire_shell_cost")),
                    "must be at least 1",
                ));
            }
            non_negative(
                &field(&format!("guns[{i}].reload_time_minutes")),
                gun.reload_time_minutes,
            )?;
        }
        for (i, launcher) in self.launchers.iter().enumerate() {
            if launcher.tube_count == 0 {
                return Err(ConfigError::invalid(
                    field(&format!("launchers[{i}].tube_count")),
                    "must be at least 1",
                ));
            }
            non_negative(
                &field(&format!("launchers[{i}].tube_reload_time_minutes")),
                launcher.tube_reload_time_minutes,
            )?;
            non_negative(
                &field(&format!("launchers[{i}].full_reload_time_minutes")),
                launcher.full_reload_time_minutes,
            )?;
        }
        Ok(())
    }
}

/// World-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for the world's random source (component damage targeting).
    pub seed: u64,
    /// Projectile-to-ship proximity, in degrees, that counts as a hit.
    pub collision_threshold_degrees: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            collision_threshold_degrees: 0.1,
        }
    }
}

/// A complete starting setup: world settings plus ships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// World settings.
    pub world: WorldConfig,
    /// Ships in spawn order.
    pub ships: Vec<ShipConfig>,
}

impl ScenarioConfig {
    /// Parses and validates a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Validates world settings and every ship.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.world.collision_threshold_degrees;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(ConfigError::invalid(
                "world.collision_threshold_degrees",
                format!("{threshold} must be a non-negative number"),
            ));
        }
        self.ships.iter().try_for_each(ShipConfig::validate)
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("{value} must be a non-negative number"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod default_tests {
        use super::*;

        #[test]
        fn base_gun_matches_stock_turret() {
            let gun = GunSpec::default();
            assert_eq!(gun.shells_capacity, 5);
            assert_eq!(gun.fire_shell_cost, 1);
            assert_eq!(gun.reload_time_minutes, 5.0);
        }

        #[test]
        fn type3_overrides_capacity_and_cost() {
            let gun = GunSpec::type3_127mm();
            assert_eq!(gun.shells_capacity, 300);
            assert_eq!(gun.fire_shell_cost, 2);
            assert_eq!(gun.reload_time_minutes, 5.0);
            assert!(gun.hit_table.probability(10.0) > 0.0);
        }

        #[test]
        fn stock_ship_is_valid() {
            assert!(ShipConfig::default().validate().is_ok());
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn missing_fields_take_defaults() {
            let scenario = ScenarioConfig::from_json(r#"{ "ships": [ { "name": "A" } ] }"#)
                .unwrap();
            let ship = &scenario.ships[0];
            assert_eq!(ship.name, "A");
            assert_eq!(ship.turn_rate, 360.0);
            assert_eq!(ship.guns.len(), 1);
            assert_eq!(ship.launchers[0].tube_count, 3);
            assert_eq!(scenario.world.collision_threshold_degrees, 0.1);
        }

        #[test]
        fn malformed_json_is_parse_error() {
            let err = ScenarioConfig::from_json("{ ships: ").unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
        }

        #[test]
        fn hit_table_round_trips_through_json() {
            let json = r#"{ "ships": [ { "guns": [ { "hit_table": [ { "below_range": 19.0, "one_in": [6] } ] } ] } ] }"#;
            let scenario = ScenarioConfig::from_json(json).unwrap();
            assert_eq!(scenario.ships[0].guns[0].hit_table, HitTable::type3_127mm());
        }

        #[test]
        fn unsorted_hit_bands_from_a_scenario_are_sorted() {
            let json = r#"{ "ships": [ { "guns": [ { "hit_table": [
                { "below_range": 30.0, "one_in": [10] },
                { "below_range": 10.0, "one_in": [2] }
            ] } ] } ] }"#;
            let scenario = ScenarioConfig::from_json(json).unwrap();
            let table = &scenario.ships[0].guns[0].hit_table;
            assert!((table.probability(5.0) - 0.5).abs() < 1e-12);
            assert!((table.probability(20.0) - 0.1).abs() < 1e-12);
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn rejects_negative_cooldown() {
            let ship = ShipConfig {
                gun_cooldown_hours: -0.1,
                ..ShipConfig::default()
            };
            let err = ship.validate().unwrap_err();
            assert!(err.to_string().contains("gun_cooldown_hours"));
        }

        #[test]
        fn rejects_heading_of_360() {
            let ship = ShipConfig {
                heading: 360.0,
                ..ShipConfig::default()
            };
            assert!(ship.validate().is_err());
        }

        #[test]
        fn rejects_zero_tubes() {
            let ship = ShipConfig {
                launchers: vec![LauncherSpec {
                    tube_count: 0,
                    ..LauncherSpec::default()
                }],
                ..ShipConfig::default()
            };
            let err = ship.validate().unwrap_err();
            assert!(err.to_string().contains("tube_count"));
        }

        #[test]
        fn rejects_zero_fire_cost() {
            let ship = ShipConfig {
                guns: vec![GunSpec {
                    fire_shell_cost: 0,
                    ..GunSpec::default()
                }],
                ..ShipConfig::default()
            };
            assert!(ship.validate().is_err());
        }

        #[test]
        fn rejects_invalid_location() {
            let ship = ShipConfig::named("Lost", GeoPoint::new(120.0, 0.0));
            assert!(ship.validate().is_err());
        }

        #[test]
        fn rejects_negative_collision_threshold() {
            let scenario = ScenarioConfig {
                world: WorldConfig {
                    collision_threshold_degrees: -1.0,
                    ..WorldConfig::default()
                },
                ships: vec![],
            };
            assert!(scenario.validate().is_err());
        }
    }
}
