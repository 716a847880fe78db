//! Gun turret state machine.
//!
//! ```text
//!            load_ammo()            timer <= 0
//!   Idle ───────────────▶ Loading ───────────────▶ Idle (ammo loaded)
//!    │                                              │
//!    │              fire()                          │
//!    └──────────────────────────────◀───────────────┘
//!                    │
//!                    ▼        tick
//!                 PostFire ─────────▶ Idle
//!
//!   any ──fault()──▶ Fault        any ──damage()──▶ Damaged
//! ```
//!
//! Firing is a single atomic transition: `fire()` moves straight from `Idle`
//! to `PostFire`, and the next tick returns the turret to `Idle`. The gun has
//! no cooldown of its own; the ship enforces salvo spacing.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    Condition, Crew, DamageLevel, FaultLevel, ModuleKind, ShipModule, MINUTES_PER_HOUR,
};
use crate::config::GunSpec;
use crate::error::OperationError;
use crate::hit::HitTable;

/// Operational state of a gun turret.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GunState {
    /// Ready for orders.
    Idle,
    /// Breech is being loaded; see the reload timer.
    Loading,
    /// A salvo just left the barrel.
    PostFire,
    /// Out of action with a recorded fault.
    Fault,
    /// Knocked out by combat damage.
    Damaged,
}

impl GunState {
    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::PostFire => "post_fire",
            Self::Fault => "fault",
            Self::Damaged => "damaged",
        }
    }
}

impl fmt::Display for GunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of a gun.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GunStatus {
    /// Current state
    pub state: GunState,
    /// Whether a round is in the breech
    pub ammo_loaded: bool,
    /// Rounds remaining before re-supply
    pub rounds_left: u32,
    /// Last recorded fault
    pub fault_level: Option<FaultLevel>,
    /// Last recorded damage
    pub damage_level: Option<DamageLevel>,
}

/// A gun turret.
#[derive(Debug, Clone)]
pub struct GunModule {
    state: GunState,
    crew: Crew,
    condition: Condition,
    breech_locked: bool,
    breech_opened: bool,
    ammo_loaded: bool,
    shells_capacity: u32,
    shells_fired: u32,
    fire_shell_cost: u32,
    reload_time_minutes: f64,
    reload_timer_minutes: f64,
    hit_table: HitTable,
}

impl GunModule {
    /// Builds an idle, unloaded turret from its spec.
    #[must_use]
    pub fn new(spec: &GunSpec) -> Self {
        Self {
            state: GunState::Idle,
            crew: Crew::new(spec.staff_on_duty, spec.staff_off_duty),
            condition: Condition::default(),
            breech_locked: true,
            breech_opened: false,
            ammo_loaded: false,
            shells_capacity: spec.shells_capacity,
            shells_fired: 0,
            fire_shell_cost: spec.fire_shell_cost,
            reload_time_minutes: spec.reload_time_minutes,
            reload_timer_minutes: 0.0,
            hit_table: spec.hit_table.clone(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GunState {
        self.state
    }

    /// Whether a round is in the breech.
    #[must_use]
    pub const fn ammo_loaded(&self) -> bool {
        self.ammo_loaded
    }

    /// Rounds fired so far, counted in shells.
    #[must_use]
    pub const fn shells_fired(&self) -> u32 {
        self.shells_fired
    }

    /// Total rounds the turret carries.
    #[must_use]
    pub const fn shells_capacity(&self) -> u32 {
        self.shells_capacity
    }

    /// Rounds consumed by one `fire()`.
    #[must_use]
    pub const fn fire_shell_cost(&self) -> u32 {
        self.fire_shell_cost
    }

    /// Rounds remaining, floored at zero.
    #[must_use]
    pub const fn rounds_left(&self) -> u32 {
        self.shells_capacity.saturating_sub(self.shells_fired)
    }

    /// Minutes left on the current load.
    #[must_use]
    pub const fn reload_timer_minutes(&self) -> f64 {
        self.reload_timer_minutes
    }

    /// Breech state as `(locked, opened)`.
    #[must_use]
    pub const fn breech(&self) -> (bool, bool) {
        (self.breech_locked, self.breech_opened)
    }

    /// The turret's hit-probability policy.
    #[must_use]
    pub const fn hit_table(&self) -> &HitTable {
        &self.hit_table
    }

    /// Idle with a round in the breech.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == GunState::Idle && self.ammo_loaded
    }

    /// Starts loading the breech.
    ///
    /// # Errors
    ///
    /// - [`OperationError::IllegalState`] unless idle and unloaded.
    /// - [`OperationError::ResourceExhausted`] once every round is spent.
    pub fn load_ammo(&mut self) -> Result<(), OperationError> {
        if self.state != GunState::Idle {
            return Err(self.refuse(OperationError::illegal("load ammo", self.state.as_str())));
        }
        if self.ammo_loaded {
            return Err(self.refuse(OperationError::illegal("load ammo", "loaded")));
        }
        if self.rounds_left() == 0 {
            return Err(self.refuse(OperationError::exhausted("load ammo", "shells")));
        }

        self.state = GunState::Loading;
        self.reload_timer_minutes = self.reload_time_minutes;
        debug!(minutes = self.reload_time_minutes, "gun loading");
        Ok(())
    }

    /// Fires one salvo.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless idle with a round in
    /// the breech.
    pub fn fire(&mut self) -> Result<(), OperationError> {
        if self.state != GunState::Idle {
            return Err(self.refuse(OperationError::illegal("fire", self.state.as_str())));
        }
        if !self.ammo_loaded {
            return Err(self.refuse(OperationError::illegal("fire", "unloaded")));
        }

        self.shells_fired = self.shells_fired.saturating_add(self.fire_shell_cost);
        if self.shells_fired >= self.shells_capacity {
            self.ammo_loaded = false;
        }
        self.state = GunState::PostFire;
        info!(
            shells_fired = self.shells_fired,
            rounds_left = self.rounds_left(),
            "gun fired"
        );
        Ok(())
    }

    /// Advances timers by `hours`.
    pub fn tick(&mut self, hours: f64) {
        match self.state {
            GunState::Loading => {
                self.reload_timer_minutes -= hours * MINUTES_PER_HOUR;
                if self.reload_timer_minutes <= 0.0 {
                    self.reload_timer_minutes = 0.0;
                    self.breech_opened = true;
                    self.breech_locked = false;
                    self.ammo_loaded = true;
                    self.state = GunState::Idle;
                    debug!("gun loaded");
                }
            }
            GunState::PostFire => self.state = GunState::Idle,
            GunState::Idle | GunState::Fault | GunState::Damaged => {}
        }
    }

    /// Rolls this turret's hit table at `range`.
    pub fn is_hit<R: Rng + ?Sized>(&self, range: f64, rng: &mut R) -> bool {
        self.hit_table.roll(range, rng)
    }

    /// Read-only snapshot.
    #[must_use]
    pub fn status(&self) -> GunStatus {
        GunStatus {
            state: self.state,
            ammo_loaded: self.ammo_loaded,
            rounds_left: self.rounds_left(),
            fault_level: self.condition.fault,
            damage_level: self.condition.damage,
        }
    }

    fn refuse(&self, err: OperationError) -> OperationError {
        debug!(state = ?self.state, error = %err, "gun operation refused");
        err
    }
}

impl ShipModule for GunModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Gun
    }

    fn state_label(&self) -> &'static str {
        self.state.as_str()
    }

    fn crew(&self) -> &Crew {
        &self.crew
    }

    fn crew_mut(&mut self) -> &mut Crew {
        &mut self.crew
    }

    fn condition(&self) -> Condition {
        self.condition
    }

    /// Always accepted.
    fn fault(&mut self, level: FaultLevel) -> Result<(), OperationError> {
        self.state = GunState::Fault;
        self.condition.fault = Some(level);
        info!(level = %level, "gun faulted");
        Ok(())
    }

    fn damage(&mut self, level: DamageLevel) {
        self.state = GunState::Damaged;
        self.condition.damage = Some(level);
        info!(level = %level, "gun damaged");
    }
}
