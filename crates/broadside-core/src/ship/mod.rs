//! Ship unit: owns the modules and drives them every tick.
//!
//! A [`ShipUnit`] owns one engine room, an ordered list of guns and an
//! ordered list of torpedo launchers, each wrapped in a [`Component`] with
//! its own hit points. Each call to [`ShipUnit::update`] runs, in order:
//!
//! 1. advance the ship clock;
//! 2. drain the command queue (FIFO);
//! 3. derive target speed from engine power through the [`SpeedModel`];
//! 4. ramp speed, then heading, toward their targets;
//! 5. move along the heading on a great circle;
//! 6. tick guns, auto-loading idle empty guns;
//! 7. tick launchers, standing down spent mounts and auto-reloading.
//!
//! Commands therefore always take effect before module timers advance, and
//! modules tick in declaration order.

mod command;
mod damage;

use std::collections::VecDeque;
use std::fmt;

use bitflags::bitflags;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ShipConfig;
use crate::error::OperationError;
use crate::module::{
    EngineRoomModule, EngineStatus, GunModule, GunState, GunStatus, LauncherState,
    LauncherStatus, ShipModule, TorpedoId, TorpedoLauncherModule,
};
use crate::physics::{
    normalize_heading, GeoPoint, SpeedModel, KNOTS_PER_MPS, METERS_PER_NAUTICAL_MILE,
};

pub use command::{RawCommand, ShipCommand};
pub(crate) use command::PendingCommand;
pub use damage::{Component, ComponentStatus, HitLocation};

// =============================================================================
// Identity / Flags
// =============================================================================

/// Unique identifier for a ship within a world.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(u64);

impl ShipId {
    /// Creates a `ShipId` from a raw value.
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

impl fmt::Debug for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShipId({})", self.0)
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Summary conditions derived from ship and component state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ShipFlags: u8 {
        /// Hull points are exhausted.
        const DESTROYED = 1 << 0;
        /// The engine room is damaged.
        const ENGINE_DISABLED = 1 << 1;
        /// Every gun is damaged.
        const GUNS_SILENCED = 1 << 2;
        /// Every torpedo launcher is damaged.
        const LAUNCHERS_SILENCED = 1 << 3;
    }
}

// =============================================================================
// Discharges / Status
// =============================================================================

/// A weapon discharge made during an update, collected by the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discharge {
    /// A gun fired.
    Salvo {
        /// Index of the gun in the ship's gun list
        gun: usize,
        /// Ship aimed at
        target: ShipId,
        /// Rounds expended
        shells: u32,
    },
    /// A torpedo left its tube.
    Torpedo {
        /// Index of the launcher in the ship's launcher list
        launcher: usize,
        /// The torpedo launched
        torpedo: TorpedoId,
        /// Ship aimed at
        target: ShipId,
    },
}

/// Read-only snapshot of a ship and all its components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipStatus {
    /// Ship id
    pub id: ShipId,
    /// Ship name
    pub name: String,
    /// Hull points
    pub hp: f64,
    /// Starting hull points
    pub max_hp: f64,
    /// Whether hull points remain
    pub alive: bool,
    /// Derived condition flags
    pub flags: ShipFlags,
    /// Position
    pub location: GeoPoint,
    /// Heading in degrees
    pub heading: f64,
    /// Speed in knots
    pub speed: f64,
    /// Ordered heading
    pub target_heading: f64,
    /// Speed the engines are driving toward
    pub target_speed: f64,
    /// Ship clock in hours
    pub clock_hours: f64,
    /// Queued orders not yet processed
    pub pending_commands: usize,
    /// Engine room
    pub engine_room: ComponentStatus<EngineStatus>,
    /// Guns in order
    pub guns: Vec<ComponentStatus<GunStatus>>,
    /// Torpedo launchers in order
    pub launchers: Vec<ComponentStatus<LauncherStatus>>,
}

// =============================================================================
// Ship Unit
// =============================================================================

/// A ship and its subsystems.
pub struct ShipUnit {
    id: ShipId,
    name: String,
    hp: f64,
    max_hp: f64,
    location: GeoPoint,
    heading: f64,
    speed: f64,
    target_speed: f64,
    target_heading: f64,
    acceleration_rate: f64,
    deceleration_rate: f64,
    turn_rate: f64,
    engine_room: Component<EngineRoomModule>,
    guns: Vec<Component<GunModule>>,
    launchers: Vec<Component<TorpedoLauncherModule>>,
    speed_model: Box<dyn SpeedModel>,
    commands: VecDeque<PendingCommand>,
    clock_hours: f64,
    last_fire_time: Option<f64>,
    last_launch_time: Option<f64>,
    gun_cooldown_hours: f64,
    torpedo_cooldown_hours: f64,
    discharges: Vec<Discharge>,
}

impl fmt::Debug for ShipUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipUnit")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("hp", &self.hp)
            .field("location", &self.location)
            .field("heading", &self.heading)
            .field("speed", &self.speed)
            .field("engine_room", &self.engine_room)
            .field("guns", &self.guns)
            .field("launchers", &self.launchers)
            .field("commands", &self.commands)
            .field("clock_hours", &self.clock_hours)
            .finish_non_exhaustive()
    }
}

impl ShipUnit {
    /// Builds a ship from its configuration, using the hull resistance model.
    #[must_use]
    pub fn new(id: ShipId, config: &ShipConfig) -> Self {
        Self {
            id,
            name: config.name.clone(),
            hp: config.hp,
            max_hp: config.hp,
            location: config.location,
            heading: config.heading,
            speed: 0.0,
            target_speed: 0.0,
            target_heading: config.heading,
            acceleration_rate: config.acceleration_rate,
            deceleration_rate: config.deceleration_rate,
            turn_rate: config.turn_rate,
            engine_room: Component::new(
                EngineRoomModule::new(&config.engine),
                config.engine_room_hp,
            ),
            guns: config
                .guns
                .iter()
                .map(|spec| Component::new(GunModule::new(spec), config.gun_hp))
                .collect(),
            launchers: config
                .launchers
                .iter()
                .map(|spec| Component::new(TorpedoLauncherModule::new(spec), config.launcher_hp))
                .collect(),
            speed_model: Box::new(config.hull.resistance_model()),
            commands: VecDeque::new(),
            clock_hours: 0.0,
            last_fire_time: None,
            last_launch_time: None,
            gun_cooldown_hours: config.gun_cooldown_hours,
            torpedo_cooldown_hours: config.torpedo_cooldown_hours,
            discharges: Vec::new(),
        }
    }

    /// Replaces the speed model.
    #[must_use]
    pub fn with_speed_model(mut self, model: impl SpeedModel + 'static) -> Self {
        self.speed_model = Box::new(model);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Ship id.
    #[must_use]
    pub const fn id(&self) -> ShipId {
        self.id
    }

    /// Ship name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hull points, never below zero.
    #[must_use]
    pub const fn hp(&self) -> f64 {
        self.hp
    }

    /// Position.
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        self.location
    }

    /// Heading in degrees, `[0, 360)`.
    #[must_use]
    pub const fn heading(&self) -> f64 {
        self.heading
    }

    /// Ordered heading.
    #[must_use]
    pub const fn target_heading(&self) -> f64 {
        self.target_heading
    }

    /// Current speed in knots.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Speed the ship is ramping toward, in knots.
    #[must_use]
    pub const fn target_speed(&self) -> f64 {
        self.target_speed
    }

    /// Ship clock in hours.
    #[must_use]
    pub const fn clock_hours(&self) -> f64 {
        self.clock_hours
    }

    /// The engine room and its HP pool.
    #[must_use]
    pub const fn engine_room(&self) -> &Component<EngineRoomModule> {
        &self.engine_room
    }

    /// Mutable access to the engine room.
    pub fn engine_room_mut(&mut self) -> &mut Component<EngineRoomModule> {
        &mut self.engine_room
    }

    /// Guns in firing order.
    #[must_use]
    pub fn guns(&self) -> &[Component<GunModule>] {
        &self.guns
    }

    /// Mutable access to the guns.
    pub fn guns_mut(&mut self) -> &mut [Component<GunModule>] {
        &mut self.guns
    }

    /// Torpedo launchers in launch order.
    #[must_use]
    pub fn launchers(&self) -> &[Component<TorpedoLauncherModule>] {
        &self.launchers
    }

    /// Mutable access to the launchers.
    pub fn launchers_mut(&mut self) -> &mut [Component<TorpedoLauncherModule>] {
        &mut self.launchers
    }

    /// Orders waiting for the next update.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// `false` once hull points reach zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Condition flags derived from current state.
    #[must_use]
    pub fn flags(&self) -> ShipFlags {
        let mut flags = ShipFlags::empty();
        flags.set(ShipFlags::DESTROYED, !self.is_alive());
        flags.set(ShipFlags::ENGINE_DISABLED, self.engine_room.module.is_damaged());
        flags.set(
            ShipFlags::GUNS_SILENCED,
            !self.guns.is_empty() && self.guns.iter().all(|g| g.module.is_damaged()),
        );
        flags.set(
            ShipFlags::LAUNCHERS_SILENCED,
            !self.launchers.is_empty() && self.launchers.iter().all(|l| l.module.is_damaged()),
        );
        flags
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Queues a typed order for the next update.
    pub fn submit(&mut self, command: ShipCommand) {
        debug!(ship = %self.name, action = command.action(), "command queued");
        self.commands.push_back(PendingCommand::Typed(command));
    }

    /// Queues a loose `{action, parameters}` order. It is parsed when the
    /// queue is drained; malformed orders are logged and dropped there.
    pub fn submit_raw(&mut self, command: RawCommand) {
        debug!(ship = %self.name, action = %command.action, "raw command queued");
        self.commands.push_back(PendingCommand::Raw(command));
    }

    /// Orders a speed. The engine room converts it to a power setting that
    /// the speed model turns into the actual target on the next update.
    pub fn set_engine_speed(&mut self, knots: f64) {
        self.target_speed = knots;
        if let Err(err) = self.engine_room.module.set_target_speed(knots) {
            info!(ship = %self.name, error = %err, "speed order not accepted");
        }
    }

    /// Orders a heading.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::OutOfRange`] outside `[0, 360)`.
    pub fn set_target_heading(&mut self, degrees: f64) -> Result<(), OperationError> {
        if !(0.0..360.0).contains(&degrees) {
            let err = OperationError::OutOfRange {
                what: "heading",
                value: degrees,
                min: 0.0,
                max: 360.0,
            };
            warn!(ship = %self.name, error = %err, "heading order rejected");
            return Err(err);
        }
        self.target_heading = degrees;
        info!(ship = %self.name, degrees, "target heading set");
        Ok(())
    }

    /// Fires the first ready gun if the gun cooldown has elapsed. Returns
    /// `true` if a gun fired.
    pub fn fire_guns(&mut self, target: ShipId) -> bool {
        if let Some(remaining) = remaining(self.clock_hours, self.last_fire_time, self.gun_cooldown_hours)
        {
            info!(ship = %self.name, remaining, "guns on cooldown");
            return false;
        }

        for (index, gun) in self.guns.iter_mut().enumerate() {
            let gun = &mut gun.module;
            if !gun.is_ready() {
                debug!(ship = %self.name, gun = index, state = %gun.state(), loaded = gun.ammo_loaded(), "gun not ready");
                continue;
            }
            if gun.fire().is_ok() {
                self.last_fire_time = Some(self.clock_hours);
                self.discharges.push(Discharge::Salvo {
                    gun: index,
                    target,
                    shells: gun.fire_shell_cost(),
                });
                info!(ship = %self.name, gun = index, %target, "gun fired");
                return true;
            }
        }
        warn!(ship = %self.name, "no guns could be fired");
        false
    }

    /// Launches from the first ready launcher if the torpedo cooldown has
    /// elapsed. Returns `true` if a torpedo left its tube.
    ///
    /// Only launchers in `Ready` are considered; an idle mount must finish a
    /// load cycle first.
    pub fn launch_torpedoes(&mut self, target: ShipId) -> bool {
        if let Some(remaining) =
            remaining(self.clock_hours, self.last_launch_time, self.torpedo_cooldown_hours)
        {
            info!(ship = %self.name, remaining, "torpedo launchers on cooldown");
            return false;
        }

        for (index, launcher) in self.launchers.iter_mut().enumerate() {
            let launcher = &mut launcher.module;
            if launcher.state() != LauncherState::Ready {
                debug!(ship = %self.name, launcher = index, state = %launcher.state(), "launcher not ready");
                continue;
            }
            if let Ok(torpedo) = launcher.launch_torpedo() {
                self.last_launch_time = Some(self.clock_hours);
                self.discharges.push(Discharge::Torpedo {
                    launcher: index,
                    torpedo,
                    target,
                });
                info!(ship = %self.name, launcher = index, %torpedo, %target, "torpedo launched");
                return true;
            }
        }
        warn!(ship = %self.name, "no torpedoes could be launched");
        false
    }

    /// Drains the discharges made since the last call.
    pub fn take_discharges(&mut self) -> Vec<Discharge> {
        std::mem::take(&mut self.discharges)
    }

    // -------------------------------------------------------------------------
    // Damage
    // -------------------------------------------------------------------------

    /// Applies `amount` to the hull and routes it to a component pool.
    ///
    /// Negative or non-finite amounts are logged and ignored. Gun and launcher hits pick one module uniformly with `rng`.
    pub fn take_damage<R: Rng + ?Sized>(&mut self, amount: f64, location: HitLocation, rng: &mut R) {
        if !amount.is_finite() || amount < 0.0 {
            warn!(ship = %self.name, amount, %location, "ignoring invalid damage amount");
            return;
        }
        self.hp = (self.hp - amount).max(0.0);
        info!(ship = %self.name, amount, %location, hp = self.hp, "damage taken");

        match location {
            HitLocation::Hull => {}
            HitLocation::EngineRoom => self.engine_room.apply_damage(amount),
            HitLocation::Guns => {
                if let Some(gun) = self.guns.choose_mut(rng) {
                    gun.apply_damage(amount);
                }
            }
            HitLocation::TorpedoLaunchers => {
                if let Some(launcher) = self.launchers.choose_mut(rng) {
                    launcher.apply_damage(amount);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advances the ship by `hours`.
    pub fn update(&mut self, hours: f64) {
        self.clock_hours += hours;

        self.process_commands();

        let power = self.engine_room.module.power_percentage();
        self.target_speed = self.speed_model.speed_mps(power) * KNOTS_PER_MPS;

        self.ramp_speed(hours);
        self.ramp_heading(hours);
        self.advance_position(hours);
        self.tick_guns(hours);
        self.tick_launchers(hours);
    }

    /// Read-only snapshot.
    #[must_use]
    pub fn status(&self) -> ShipStatus {
        ShipStatus {
            id: self.id,
            name: self.name.clone(),
            hp: self.hp,
            max_hp: self.max_hp,
            alive: self.is_alive(),
            flags: self.flags(),
            location: self.location,
            heading: self.heading,
            speed: self.speed,
            target_heading: self.target_heading,
            target_speed: self.target_speed,
            clock_hours: self.clock_hours,
            pending_commands: self.commands.len(),
            engine_room: self.engine_room.report(EngineRoomModule::status),
            guns: self.guns.iter().map(|g| g.report(GunModule::status)).collect(),
            launchers: self
                .launchers
                .iter()
                .map(|l| l.report(TorpedoLauncherModule::status))
                .collect(),
        }
    }

    fn process_commands(&mut self) {
        while let Some(pending) = self.commands.pop_front() {
            let command = match pending {
                PendingCommand::Typed(command) => command,
                PendingCommand::Raw(raw) => match ShipCommand::try_from(&raw) {
                    Ok(command) => command,
                    Err(err) => {
                        warn!(ship = %self.name, action = %raw.action, error = %err, "dropping malformed command");
                        continue;
                    }
                },
            };
            info!(ship = %self.name, ?command, "processing command");
            self.dispatch(command);
        }
    }

    fn dispatch(&mut self, command: ShipCommand) {
        match command {
            ShipCommand::SetSpeed { knots } => self.set_engine_speed(knots),
            ShipCommand::SetDirection { degrees } => {
                // refusal is already logged
                let _ = self.set_target_heading(degrees);
            }
            ShipCommand::FireGuns { target } => {
                self.fire_guns(target);
            }
            ShipCommand::LaunchTorpedoes { target } => {
                self.launch_torpedoes(target);
            }
        }
    }

    fn ramp_speed(&mut self, hours: f64) {
        if self.speed < self.target_speed {
            self.speed = (self.speed + self.acceleration_rate * hours).min(self.target_speed);
        } else if self.speed > self.target_speed {
            self.speed = (self.speed - self.deceleration_rate * hours).max(self.target_speed);
        }
    }

    fn ramp_heading(&mut self, hours: f64) {
        let mut delta = normalize_heading(self.target_heading - self.heading);
        if delta > 180.0 {
            delta -= 360.0;
        }
        let turn = self.turn_rate * hours;
        if delta.abs() <= turn {
            self.heading = self.target_heading;
        } else {
            self.heading = normalize_heading(self.heading + turn.copysign(delta));
        }
    }

    fn advance_position(&mut self, hours: f64) {
        if self.speed <= 0.0 {
            return;
        }
        let distance_m = self.speed * hours * METERS_PER_NAUTICAL_MILE;
        self.location = self.location.destination(self.heading, distance_m);
        debug!(
            ship = %self.name,
            latitude = self.location.latitude,
            longitude = self.location.longitude,
            knots = self.speed,
            "moved"
        );
    }

    fn tick_guns(&mut self, hours: f64) {
        for (index, gun) in self.guns.iter_mut().enumerate() {
            let gun = &mut gun.module;
            gun.tick(hours);
            if gun.state() == GunState::Idle
                && !gun.ammo_loaded()
                && gun.rounds_left() > 0
                && gun.load_ammo().is_ok()
            {
                debug!(ship = %self.name, gun = index, "auto-loading gun");
            }
        }
    }

    fn tick_launchers(&mut self, hours: f64) {
        for (index, launcher) in self.launchers.iter_mut().enumerate() {
            let launcher = &mut launcher.module;
            launcher.tick(hours);

            if launcher.state() == LauncherState::PostLaunch {
                // cannot fail from PostLaunch
                let _ = launcher.post_launch();
            }
            if launcher.state() != LauncherState::Idle || !launcher.has_empty_tube() {
                continue;
            }

            let started = if launcher.torpedo_reserve() > 0 {
                if launcher.all_tubes_empty() {
                    launcher.reload()
                } else {
                    launcher.load_torpedoes()
                }
            } else if launcher.loaded_tubes() > 0 {
                // nothing left to load; cycle the mount so the loaded tubes come back to Ready
                launcher.load_torpedoes()
            } else {
                continue;
            };
            if started.is_ok() {
                debug!(ship = %self.name, launcher = index, "auto-reloading launcher");
            }
        }
    }
}

/// Hours left on a cooldown, or `None` if it has elapsed.
fn remaining(now: f64, last: Option<f64>, cooldown: f64) -> Option<f64> {
    let elapsed = now - last?;
    (elapsed < cooldown).then(|| cooldown - elapsed)
}
