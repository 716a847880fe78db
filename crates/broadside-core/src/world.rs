//! World simulation: ships, projectiles and the global tick.
//!
//! Each [`WorldSimulation::tick`] advances game time, updates every ship in
//! spawn order, records their weapon discharges, and then checks every
//! projectile against every ship.
//!
//! Collision is deliberately coarse: a projectile hits the first ship (in
//! spawn order) whose position lies within the collision threshold, measured
//! as planar distance in degrees of latitude/longitude. Each projectile hits
//! at most once and is removed when it does.
//!
//! The world owns a seeded [`ChaCha8Rng`]; it is the only source of
//! randomness handed to ships, so two worlds built from the same seed and fed
//! the same inputs evolve identically.

use std::fmt;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ScenarioConfig, ShipConfig, WorldConfig};
use crate::error::ConfigError;
use crate::event::{EventRecord, WorldEvent};
use crate::physics::{GeoPoint, SpeedModel};
use crate::ship::{HitLocation, ShipId, ShipStatus, ShipUnit};

// =============================================================================
// Projectiles
// =============================================================================

/// Unique identifier for a projectile within a world.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u64);

impl ProjectileId {
    /// Creates a `ProjectileId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectileId({})", self.0)
    }
}

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of ordnance a projectile is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Gun shell
    Shell,
    /// Torpedo
    Torpedo,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projectile {
    /// Projectile id
    pub id: ProjectileId,
    /// Ordnance type
    pub kind: ProjectileKind,
    /// Current position
    pub location: GeoPoint,
    /// Ship it was aimed at, if any
    pub target: Option<ShipId>,
    /// Hull points removed on impact
    pub damage: f64,
}

// =============================================================================
// World Simulation
// =============================================================================

/// The world: every ship and projectile plus the global clock.
#[derive(Debug)]
pub struct WorldSimulation {
    ships: Vec<ShipUnit>,
    projectiles: Vec<Projectile>,
    game_time: f64,
    next_ship_id: u64,
    next_projectile_id: u64,
    collision_threshold_degrees: f64,
    seed: u64,
    rng: ChaCha8Rng,
    events: Vec<EventRecord>,
}

impl Default for WorldSimulation {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl WorldSimulation {
    /// Creates an empty world.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            ships: Vec::new(),
            projectiles: Vec::new(),
            game_time: 0.0,
            next_ship_id: 0,
            next_projectile_id: 0,
            collision_threshold_degrees: config.collision_threshold_degrees,
            seed: config.seed,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: Vec::new(),
        }
    }

    /// Validates a scenario and spawns its ships in order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the scenario fails validation.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Result<Self, ConfigError> {
        scenario.validate()?;
        let mut world = Self::new(scenario.world);
        for ship in &scenario.ships {
            world.spawn_ship(ship);
        }
        Ok(world)
    }

    // -------------------------------------------------------------------------
    // Spawning / Removal
    // -------------------------------------------------------------------------

    /// Adds a ship built from `config` and returns its id.
    pub fn spawn_ship(&mut self, config: &ShipConfig) -> ShipId {
        let id = self.allocate_ship_id();
        self.ships.push(ShipUnit::new(id, config));
        info!(ship = %config.name, %id, "ship spawned");
        id
    }

    /// Adds a ship that uses `model` instead of the hull resistance model.
    pub fn spawn_ship_with_model(
        &mut self,
        config: &ShipConfig,
        model: impl SpeedModel + 'static,
    ) -> ShipId {
        let id = self.allocate_ship_id();
        self.ships.push(ShipUnit::new(id, config).with_speed_model(model));
        info!(ship = %config.name, %id, "ship spawned");
        id
    }

    /// Adds a projectile and returns its id.
    pub fn spawn_projectile(
        &mut self,
        kind: ProjectileKind,
        location: GeoPoint,
        target: Option<ShipId>,
        damage: f64,
    ) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile {
            id,
            kind,
            location,
            target,
            damage,
        });
        debug!(%id, ?kind, damage, "projectile spawned");
        id
    }

    /// Removes a ship, returning it if it existed.
    pub fn remove_ship(&mut self, id: ShipId) -> Option<ShipUnit> {
        let index = self.ships.iter().position(|ship| ship.id() == id)?;
        let ship = self.ships.remove(index);
        info!(ship = %ship.name(), %id, "ship removed");
        Some(ship)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Game time in hours.
    #[must_use]
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Seed the world's random source was created from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Ships in spawn order.
    #[must_use]
    pub fn ships(&self) -> &[ShipUnit] {
        &self.ships
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Looks up a ship by id.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&ShipUnit> {
        self.ships.iter().find(|ship| ship.id() == id)
    }

    /// Looks up a ship by id for mutation.
    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut ShipUnit> {
        self.ships.iter_mut().find(|ship| ship.id() == id)
    }

    /// Looks up the first ship with the given name.
    #[must_use]
    pub fn ship_by_name(&self, name: &str) -> Option<&ShipUnit> {
        self.ships.iter().find(|ship| ship.name() == name)
    }

    /// Status snapshot of every ship, in spawn order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ShipStatus> {
        self.ships.iter().map(ShipUnit::status).collect()
    }

    /// Drains the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advances the world by `hours`.
    ///
    /// Events accumulate until drained with [`take_events`](Self::take_events);
    /// embedders that never drain them keep the whole log in memory.
    pub fn tick(&mut self, hours: f64) {
        self.game_time += hours;

        for ship in &mut self.ships {
            ship.update(hours);
            let id = ship.id();
            for discharge in ship.take_discharges() {
                self.events.push(EventRecord {
                    game_time: self.game_time,
                    event: WorldEvent::from_discharge(id, discharge),
                });
            }
        }

        self.resolve_collisions();
    }

    /// Applies damage to a ship directly, drawing component targeting from
    /// the world's random source. Returns `false` if no such ship exists.
    pub fn apply_damage(&mut self, id: ShipId, amount: f64, location: HitLocation) -> bool {
        let Some(ship) = self.ships.iter_mut().find(|ship| ship.id() == id) else {
            warn!(%id, "damage for unknown ship ignored");
            return false;
        };
        let was_alive = ship.is_alive();
        ship.take_damage(amount, location, &mut self.rng);
        if was_alive && !ship.is_alive() {
            info!(ship = %ship.name(), "ship destroyed");
            self.events.push(EventRecord {
                game_time: self.game_time,
                event: WorldEvent::ShipDestroyed { ship: id },
            });
        }
        true
    }

    fn resolve_collisions(&mut self) {
        let threshold = self.collision_threshold_degrees;

        // One hit per ship per tick; further projectiles wait for the next tick
        for ship in &mut self.ships {
            let Some(index) = self
                .projectiles
                .iter()
                .position(|projectile| ship.location().degree_distance(projectile.location) < threshold)
            else {
                continue;
            };
            let projectile = self.projectiles.remove(index);

            let was_alive = ship.is_alive();
            ship.take_damage(projectile.damage, HitLocation::Hull, &mut self.rng);
            info!(projectile = %projectile.id, ship = %ship.name(), damage = projectile.damage, "projectile hit");
            self.events.push(EventRecord {
                game_time: self.game_time,
                event: WorldEvent::ProjectileHit {
                    projectile: projectile.id,
                    ship: ship.id(),
                    damage: projectile.damage,
                    location: HitLocation::Hull,
                },
            });

            if was_alive && !ship.is_alive() {
                info!(ship = %ship.name(), "ship destroyed");
                self.events.push(EventRecord {
                    game_time: self.game_time,
                    event: WorldEvent::ShipDestroyed { ship: ship.id() },
                });
            }
        }
    }

    fn allocate_ship_id(&mut self) -> ShipId {
        let id = ShipId::new(self.next_ship_id);
        self.next_ship_id += 1;
        id
    }
}
