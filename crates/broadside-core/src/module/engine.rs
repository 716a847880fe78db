//! Engine room state machine.
//!
//! The engine room only accepts orders while `Operating`. Two setters exist:
//! [`EngineRoomModule::set_speed`] is the crew-facing direct setter and
//! respects the astern limit, while [`EngineRoomModule::set_target_speed`]
//! is what the ship drives each time a speed order arrives: it also derives
//! the power percentage that feeds the ship's speed model.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Condition, Crew, DamageLevel, FaultLevel, ModuleKind, ShipModule};
use crate::config::EngineSpec;
use crate::error::OperationError;

/// Highest speed, in knots, allowed while going astern.
pub const BACKWARD_SPEED_LIMIT_KNOTS: f64 = 12.0;

/// Operational state of the engine room.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Shut down.
    Idle,
    /// Running and accepting speed orders.
    Operating,
    /// Undergoing maintenance.
    Maintenance,
    /// Out of action with a recorded fault.
    Fault,
    /// Knocked out by combat damage.
    Damaged,
}

impl EngineState {
    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Operating => "operating",
            Self::Maintenance => "maintenance",
            Self::Fault => "fault",
            Self::Damaged => "damaged",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine order direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ahead.
    Forward,
    /// Astern, limited to [`BACKWARD_SPEED_LIMIT_KNOTS`].
    Backward,
    /// All stop.
    Stopped,
}

impl Direction {
    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of the engine room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    /// Current state
    pub state: EngineState,
    /// Ordered speed in knots
    pub speed: f64,
    /// Ordered direction
    pub direction: Direction,
    /// Power setting, 0-100
    pub power_percentage: f64,
    /// Last recorded fault
    pub fault_level: Option<FaultLevel>,
    /// Last recorded damage
    pub damage_level: Option<DamageLevel>,
    /// Boiler description
    pub boilers: String,
    /// Engine description
    pub engines: String,
}

/// The engine room.
#[derive(Debug, Clone)]
pub struct EngineRoomModule {
    state: EngineState,
    crew: Crew,
    condition: Condition,
    boilers: String,
    engines: String,
    rated_power: f64,
    max_speed: f64,
    range_nautical_miles: f64,
    cruise_speed: f64,
    speed: f64,
    direction: Direction,
    power_percentage: f64,
}

impl EngineRoomModule {
    /// Builds a shut-down engine room, stopped at zero speed.
    #[must_use]
    pub fn new(spec: &EngineSpec) -> Self {
        Self {
            state: EngineState::Idle,
            crew: Crew::new(spec.staff_on_duty, spec.staff_off_duty),
            condition: Condition::default(),
            boilers: spec.boilers.clone(),
            engines: spec.engines.clone(),
            rated_power: spec.rated_power,
            max_speed: spec.max_speed,
            range_nautical_miles: spec.range_nautical_miles,
            cruise_speed: spec.cruise_speed,
            speed: 0.0,
            direction: Direction::Stopped,
            power_percentage: 0.0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Ordered speed in knots.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Ordered direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Power setting in percent.
    #[must_use]
    pub const fn power_percentage(&self) -> f64 {
        self.power_percentage
    }

    /// Top speed ahead in knots.
    #[must_use]
    pub const fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Economical cruising speed in knots.
    #[must_use]
    pub const fn cruise_speed(&self) -> f64 {
        self.cruise_speed
    }

    /// Rated output.
    #[must_use]
    pub const fn rated_power(&self) -> f64 {
        self.rated_power
    }

    /// Endurance in nautical miles.
    #[must_use]
    pub const fn range_nautical_miles(&self) -> f64 {
        self.range_nautical_miles
    }

    /// Brings the engines online.
    ///
    /// # Errors
    ///
    /// - [`OperationError::IllegalState`] unless idle.
    /// - [`OperationError::ResourceExhausted`] with one or fewer engineers on
    ///   duty.
    pub fn start_operations(&mut self) -> Result<(), OperationError> {
        self.check_staffed("start operations", EngineState::Idle)?;
        self.state = EngineState::Operating;
        info!("engine room operations started");
        Ok(())
    }

    /// Shuts the engines down.
    ///
    /// # Errors
    ///
    /// - [`OperationError::IllegalState`] unless operating.
    /// - [`OperationError::ResourceExhausted`] with one or fewer engineers on
    ///   duty.
    pub fn stop_operations(&mut self) -> Result<(), OperationError> {
        self.check_staffed("stop operations", EngineState::Operating)?;
        self.state = EngineState::Idle;
        info!("engine room operations stopped");
        Ok(())
    }

    /// Sets the ordered speed directly.
    ///
    /// # Errors
    ///
    /// - [`OperationError::IllegalState`] unless operating.
    /// - [`OperationError::OutOfRange`] outside `0..=max_speed`, or
    ///   `0..=12` when going astern.
    pub fn set_speed(&mut self, knots: f64) -> Result<(), OperationError> {
        self.check_operating("set speed")?;
        let max = if self.direction == Direction::Backward {
            BACKWARD_SPEED_LIMIT_KNOTS
        } else {
            self.max_speed
        };
        self.check_range("speed", knots, max)?;
        self.speed = knots;
        info!(knots, direction = %self.direction, "speed set");
        Ok(())
    }

    /// Changes direction. Going astern caps the ordered speed at 12 knots.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless operating.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), OperationError> {
        self.check_operating("set direction")?;
        self.direction = direction;
        if direction == Direction::Backward && self.speed > BACKWARD_SPEED_LIMIT_KNOTS {
            self.speed = BACKWARD_SPEED_LIMIT_KNOTS;
        }
        info!(%direction, speed = self.speed, "direction set");
        Ok(())
    }

    /// Sets the ordered speed and derives the power percentage from it.
    ///
    /// # Errors
    ///
    /// - [`OperationError::IllegalState`] unless operating.
    /// - [`OperationError::OutOfRange`] outside `0..=max_speed`.
    pub fn set_target_speed(&mut self, knots: f64) -> Result<(), OperationError> {
        self.check_operating("set target speed")?;
        self.check_range("target speed", knots, self.max_speed)?;
        self.speed = knots;
        self.power_percentage = if self.max_speed > 0.0 {
            (100.0 * knots / self.max_speed).min(100.0)
        } else {
            0.0
        };
        info!(knots, power = self.power_percentage, "target speed set");
        Ok(())
    }

    /// Runs a maintenance cycle. Completes immediately.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless idle.
    pub fn maintenance(&mut self) -> Result<(), OperationError> {
        if self.state != EngineState::Idle {
            return Err(self.refuse(OperationError::illegal("maintenance", self.state.as_str())));
        }
        self.state = EngineState::Maintenance;
        self.state = EngineState::Idle;
        info!("engine room maintenance completed");
        Ok(())
    }

    /// Read-only snapshot.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            speed: self.speed,
            direction: self.direction,
            power_percentage: self.power_percentage,
            fault_level: self.condition.fault,
            damage_level: self.condition.damage,
            boilers: self.boilers.clone(),
            engines: self.engines.clone(),
        }
    }

    fn check_operating(&self, operation: &'static str) -> Result<(), OperationError> {
        if self.state == EngineState::Operating {
            Ok(())
        } else {
            Err(self.refuse(OperationError::illegal(operation, self.state.as_str())))
        }
    }

    fn check_staffed(
        &self,
        operation: &'static str,
        required: EngineState,
    ) -> Result<(), OperationError> {
        if self.state != required {
            return Err(self.refuse(OperationError::illegal(operation, self.state.as_str())));
        }
        if self.crew.on_duty() <= 1 {
            return Err(self.refuse(OperationError::exhausted(operation, "engine room staff")));
        }
        Ok(())
    }

    fn check_range(&self, what: &'static str, value: f64, max: f64) -> Result<(), OperationError> {
        if (0.0..=max).contains(&value) {
            Ok(())
        } else {
            Err(self.refuse(OperationError::OutOfRange {
                what,
                value,
                min: 0.0,
                max,
            }))
        }
    }

    fn refuse(&self, err: OperationError) -> OperationError {
        debug!(state = ?self.state, error = %err, "engine room operation refused");
        err
    }
}

impl ShipModule for EngineRoomModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::EngineRoom
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

    /// Accepted from `Operating` and `Idle` only.
    fn fault(&mut self, level: FaultLevel) -> Result<(), OperationError> {
        match self.state {
            EngineState::Operating | EngineState::Idle => {
                self.state = EngineState::Fault;
                self.condition.fault = Some(level);
                info!(level = %level, "engine room faulted");
                Ok(())
            }
            _ => Err(self.refuse(OperationError::illegal("fault", self.state.as_str()))),
        }
    }

    fn damage(&mut self, level: DamageLevel) {
        self.state = EngineState::Damaged;
        self.condition.damage = Some(level);
        info!(level = %level, "engine room damaged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> EngineRoomModule {
        let mut engine = EngineRoomModule::new(&EngineSpec::default());
        engine.start_operations().unwrap();
        engine
    }

    mod operation_tests {
        use super::*;

        #[test]
        fn starts_idle_and_stopped() {
            let engine = EngineRoomModule::new(&EngineSpec::default());
            assert_eq!(engine.state(), EngineState::Idle);
            assert_eq!(engine.direction(), Direction::Stopped);
            assert_eq!(engine.speed(), 0.0);
            assert_eq!(engine.power_percentage(), 0.0);
        }

        #[test]
        fn start_and_stop_toggle_state() {
            let mut engine = running();
            assert_eq!(engine.state(), EngineState::Operating);
            assert!(engine.start_operations().is_err());
            engine.stop_operations().unwrap();
            assert_eq!(engine.state(), EngineState::Idle);
            assert!(engine.stop_operations().is_err());
        }

        #[test]
        fn start_needs_more_than_one_engineer() {
            let spec = EngineSpec {
                staff_on_duty: 1,
                ..EngineSpec::default()
            };
            let mut engine = EngineRoomModule::new(&spec);
            let err = engine.start_operations().unwrap_err();
            assert!(matches!(err, OperationError::ResourceExhausted { .. }));

            engine.recall_staff(1);
            engine.start_operations().unwrap();
        }

        #[test]
        fn stop_needs_more_than_one_engineer() {
            let mut engine = running();
            engine.add_casualties(19);
            assert!(engine.stop_operations().is_err());
            assert_eq!(engine.state(), EngineState::Operating);
        }

        #[test]
        fn orders_refused_while_idle() {
            let mut engine = EngineRoomModule::new(&EngineSpec::default());
            assert!(engine.set_speed(10.0).is_err());
            assert!(engine.set_direction(Direction::Forward).is_err());
            assert!(engine.set_target_speed(10.0).is_err());
            assert_eq!(engine.speed(), 0.0);
        }

        #[test]
        fn maintenance_round_trips_through_idle() {
            let mut engine = EngineRoomModule::new(&EngineSpec::default());
            engine.maintenance().unwrap();
            assert_eq!(engine.state(), EngineState::Idle);

            let mut engine = running();
            assert!(engine.maintenance().is_err());
        }
    }

    mod speed_tests {
        use super::*;

        #[test]
        fn astern_limit_is_twelve_knots() {
            let mut engine = running();
            engine.set_direction(Direction::Backward).unwrap();

            let err = engine.set_speed(15.0).unwrap_err();
            assert!(matches!(err, OperationError::OutOfRange { max, .. } if max == 12.0));
            assert_eq!(engine.speed(), 0.0);

            engine.set_speed(12.0).unwrap();
            assert_eq!(engine.speed(), 12.0);
        }

        #[test]
        fn ahead_limit_is_max_speed() {
            let mut engine = running();
            engine.set_direction(Direction::Forward).unwrap();
            engine.set_speed(38.0).unwrap();
            assert!(engine.set_speed(38.5).is_err());
            assert!(engine.set_speed(-1.0).is_err());
            assert_eq!(engine.speed(), 38.0);
        }

        #[test]
        fn going_astern_caps_speed() {
            let mut engine = running();
            engine.set_direction(Direction::Forward).unwrap();
            engine.set_speed(30.0).unwrap();
            engine.set_direction(Direction::Backward).unwrap();
            assert_eq!(engine.speed(), 12.0);
        }

        #[test]
        fn target_speed_derives_power() {
            let mut engine = running();
            engine.set_target_speed(19.0).unwrap();
            assert_eq!(engine.speed(), 19.0);
            assert!((engine.power_percentage() - 50.0).abs() < 1e-12);

            engine.set_target_speed(38.0).unwrap();
            assert!((engine.power_percentage() - 100.0).abs() < 1e-12);
        }

        #[test]
        fn target_speed_out_of_range_keeps_power() {
            let mut engine = running();
            engine.set_target_speed(19.0).unwrap();
            assert!(engine.set_target_speed(40.0).is_err());
            assert_eq!(engine.speed(), 19.0);
            assert!((engine.power_percentage() - 50.0).abs() < 1e-12);
        }

        #[test]
        fn zero_max_speed_never_yields_power() {
            let mut engine = EngineRoomModule::new(&EngineSpec {
                max_speed: 0.0,
                ..EngineSpec::default()
            });
            engine.start_operations().unwrap();
            engine.set_target_speed(0.0).unwrap();
            assert_eq!(engine.power_percentage(), 0.0);
            assert!(engine.set_target_speed(5.0).is_err());
            assert_eq!(engine.power_percentage(), 0.0);
        }

        #[test]
        fn status_reports_machinery() {
            let status = running().status();
            assert_eq!(status.boilers, "4 Kampon Ro-go boilers");
            assert_eq!(status.engines, "2 Kampon geared turbines, 2 shafts");
            assert_eq!(status.state, EngineState::Operating);
        }
    }

    mod overlay_tests {
        use super::*;

        #[test]
        fn fault_accepted_when_idle_or_operating() {
            let mut engine = EngineRoomModule::new(&EngineSpec::default());
            engine.fault(FaultLevel::ImmediateRepair).unwrap();
            assert_eq!(engine.state(), EngineState::Fault);

            // already faulted
            assert!(engine.fault(FaultLevel::FieldRepair).is_err());
            assert_eq!(engine.condition().fault, Some(FaultLevel::ImmediateRepair));

            let mut engine = running();
            engine.fault(FaultLevel::FieldRepair).unwrap();
            assert!(engine.set_target_speed(10.0).is_err());
        }

        #[test]
        fn damage_is_unconditional() {
            let mut engine = running();
            engine.fault(FaultLevel::Unrepairable).unwrap();
            engine.damage(DamageLevel::Minor);
            assert_eq!(engine.state(), EngineState::Damaged);

            let json = serde_json::to_value(engine.status()).unwrap();
            assert_eq!(json["state"], "damaged");
            assert_eq!(json["damage_level"], "minor");
            assert_eq!(json["fault_level"], "unrepairable");
            assert_eq!(json["direction"], "stopped");
        }
    }
}
