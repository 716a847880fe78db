//! Hit locations and per-component hit points.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::module::{DamageLevel, ShipModule};

/// Where on the ship a hit lands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitLocation {
    /// Structural hit; only the ship's hull points are affected.
    Hull,
    /// The engine room.
    EngineRoom,
    /// One of the gun turrets, picked at random.
    Guns,
    /// One of the torpedo launchers, picked at random.
    TorpedoLaunchers,
}

impl HitLocation {
    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hull => "hull",
            Self::EngineRoom => "engine_room",
            Self::Guns => "guns",
            Self::TorpedoLaunchers => "torpedo_launchers",
        }
    }
}

impl fmt::Display for HitLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown names map to [`HitLocation::Hull`].
impl From<&str> for HitLocation {
    fn from(name: &str) -> Self {
        match name {
            "engine_room" => Self::EngineRoom,
            "guns" => Self::Guns,
            "torpedo_launchers" => Self::TorpedoLaunchers,
            _ => Self::Hull,
        }
    }
}

/// A module together with its own hit-point pool.
#[derive(Debug, Clone)]
pub struct Component<M> {
    /// The wrapped module.
    pub module: M,
    hp: f64,
    max_hp: f64,
}

impl<M: ShipModule> Component<M> {
    /// Wraps a module with a full HP pool.
    #[must_use]
    pub fn new(module: M, hp: f64) -> Self {
        Self {
            module,
            hp,
            max_hp: hp,
        }
    }

    /// Remaining component hit points.
    #[must_use]
    pub const fn hp(&self) -> f64 {
        self.hp
    }

    /// Starting component hit points.
    #[must_use]
    pub const fn max_hp(&self) -> f64 {
        self.max_hp
    }

    /// Subtracts `amount` from the pool, flooring at zero. An exhausted pool
    /// puts the module out of action with severe damage.
    pub fn apply_damage(&mut self, amount: f64) {
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= 0.0 {
            let was = self.module.state_label();
            self.module.damage(DamageLevel::Severe);
            warn!(
                module = %self.module.kind(),
                from = was,
                state = self.module.state_label(),
                "component inoperable at 0 hp"
            );
        }
    }

    /// Pairs the pool and crew figures with a module snapshot taken by
    /// `snapshot`.
    pub fn report<S>(&self, snapshot: impl FnOnce(&M) -> S) -> ComponentStatus<S> {
        ComponentStatus {
            hp: self.hp,
            max_hp: self.max_hp,
            staff_on_duty: self.module.crew().on_duty(),
            staff_off_duty: self.module.crew().off_duty(),
            module: snapshot(&self.module),
        }
    }
}

/// HP and crew figures for one component, with the module's own snapshot
/// flattened alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatus<S> {
    /// Remaining hit points
    pub hp: f64,
    /// Starting hit points
    pub max_hp: f64,
    /// Crew on duty
    pub staff_on_duty: u32,
    /// Crew off duty
    pub staff_off_duty: u32,
    /// Module snapshot
    #[serde(flatten)]
    pub module: S,
}
