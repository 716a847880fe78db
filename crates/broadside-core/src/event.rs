//! World event log.
//!
//! The world records what happened during each tick: weapon discharges
//! reported by ships, projectile hits and ships losing their last hull
//! point. The log only grows until drained with
//! [`WorldSimulation::take_events`](crate::world::WorldSimulation::take_events).

use serde::Serialize;

use crate::module::TorpedoId;
use crate::ship::{Discharge, HitLocation, ShipId};
use crate::world::ProjectileId;

/// Something that happened in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    /// A gun fired.
    GunsFired {
        /// Firing ship
        ship: ShipId,
        /// Gun index on the firing ship
        gun: usize,
        /// Ship aimed at
        target: ShipId,
        /// Rounds expended
        shells: u32,
    },
    /// A torpedo was launched.
    TorpedoLaunched {
        /// Launching ship
        ship: ShipId,
        /// Launcher index on the launching ship
        launcher: usize,
        /// The torpedo
        torpedo: TorpedoId,
        /// Ship aimed at
        target: ShipId,
    },
    /// A projectile struck a ship and was removed.
    ProjectileHit {
        /// The projectile
        projectile: ProjectileId,
        /// Ship struck
        ship: ShipId,
        /// Damage applied
        damage: f64,
        /// Where it landed
        location: HitLocation,
    },
    /// A ship's hull points reached zero.
    ShipDestroyed {
        /// The ship
        ship: ShipId,
    },
}

impl WorldEvent {
    /// Converts a ship's discharge report into a world event.
    #[must_use]
    pub const fn from_discharge(ship: ShipId, discharge: Discharge) -> Self {
        match discharge {
            Discharge::Salvo {
                gun,
                target,
                shells,
            } => Self::GunsFired {
                ship,
                gun,
                target,
                shells,
            },
            Discharge::Torpedo {
                launcher,
                torpedo,
                target,
            } => Self::TorpedoLaunched {
                ship,
                launcher,
                torpedo,
                target,
            },
        }
    }
}

/// A [`WorldEvent`] stamped with the game time it occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventRecord {
    /// Game time in hours
    pub game_time: f64,
    /// What happened
    #[serde(flatten)]
    pub event: WorldEvent,
}
