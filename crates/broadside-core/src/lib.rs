//! # Broadside Core
//!
//! Tick-driven naval combat simulation.
//!
//! Each ship is built from independent subsystems (gun turrets, torpedo
//! launchers and an engine room), each a small state machine advanced by
//! elapsed time. A ship orchestrates its subsystems, drains its order queue
//! and moves across the globe; the world steps every ship and resolves
//! projectile hits.
//!
//! ## Layout
//!
//! - [`module`]: subsystem state machines and the [`ShipModule`] seam
//! - [`ship`]: ship orchestration, orders and component damage
//! - [`world`]: the world loop, projectiles and collision
//! - [`physics`]: geodesic movement and hull resistance
//! - [`hit`]: range-banded hit probability tables
//! - [`config`]: serde-backed ship and scenario configuration
//!
//! ## Usage
//!
//! ```
//! use broadside_core::{GeoPoint, ShipCommand, ShipConfig, WorldConfig, WorldSimulation};
//!
//! let mut world = WorldSimulation::new(WorldConfig::default());
//! let fubuki = world.spawn_ship(&ShipConfig::named("Fubuki", GeoPoint::new(35.69, 139.69)));
//!
//! let ship = world.ship_mut(fubuki).unwrap();
//! ship.engine_room_mut().module.start_operations().unwrap();
//! ship.submit(ShipCommand::SetSpeed { knots: 20.0 });
//!
//! world.tick(0.1);
//! assert!(world.ship(fubuki).unwrap().speed() > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod event;
pub mod hit;
pub mod module;
pub mod physics;
pub mod ship;
pub mod world;

pub use config::{ScenarioConfig, ShipConfig, WorldConfig};
pub use error::{CommandError, ConfigError, OperationError};
pub use event::{EventRecord, WorldEvent};
pub use module::ShipModule;
pub use physics::{GeoPoint, SpeedModel};
pub use ship::{HitLocation, RawCommand, ShipCommand, ShipId, ShipStatus, ShipUnit};
pub use world::{ProjectileId, ProjectileKind, WorldSimulation};

#[cfg(test)]
mod tests;
