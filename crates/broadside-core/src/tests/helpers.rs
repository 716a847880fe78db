//! Scenario setup shared by the cross-module tests.

use crate::config::{ShipConfig, WorldConfig};
use crate::module::{GunModule, GunState};
use crate::physics::{GeoPoint, KNOTS_PER_MPS};
use crate::ship::{ShipId, ShipUnit};
use crate::world::WorldSimulation;

// =============================================================================
// Ships
// =============================================================================

/// Speed model reaching 38 knots at full power, linear in between.
pub fn linear_model(power_percentage: f64) -> f64 {
    power_percentage * 0.38 / KNOTS_PER_MPS
}

/// The flagship used throughout: default destroyer fit off Tokyo Bay.
pub fn fubuki() -> ShipConfig {
    ShipConfig::named("Fubuki", GeoPoint::new(35.6895, 139.6917))
}

/// Opposing destroyer about 0.14 degrees to the north-east.
pub fn enemy_destroyer() -> ShipConfig {
    ShipConfig::named("Enemy Destroyer", GeoPoint::new(35.7895, 139.7917))
}

/// A standalone ship using [`linear_model`].
pub fn test_ship(config: &ShipConfig) -> ShipUnit {
    ShipUnit::new(ShipId::new(0), config).with_speed_model(linear_model)
}

// =============================================================================
// Worlds
// =============================================================================

/// A seeded world with [`fubuki`] and [`enemy_destroyer`], both on
/// [`linear_model`].
///
/// Returns `(world, fubuki_id, enemy_id)`.
pub fn duel(seed: u64) -> (WorldSimulation, ShipId, ShipId) {
    let mut world = WorldSimulation::new(WorldConfig {
        seed,
        ..WorldConfig::default()
    });
    let own = world.spawn_ship_with_model(&fubuki(), linear_model);
    let enemy = world.spawn_ship_with_model(&enemy_destroyer(), linear_model);
    (world, own, enemy)
}

/// Ticks the world `steps` times by `hours`.
pub fn run(world: &mut WorldSimulation, steps: usize, hours: f64) {
    for _ in 0..steps {
        world.tick(hours);
    }
}

// =============================================================================
// Modules
// =============================================================================

/// Loads a gun and ticks it well past any stock reload time.
pub fn load_fully(gun: &mut GunModule) {
    gun.load_ammo().unwrap();
    gun.tick(1.0);
    assert_eq!(gun.state(), GunState::Idle);
    assert!(gun.ammo_loaded());
}
