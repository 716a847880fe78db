//! Ship subsystem state machines.
//!
//! Every subsystem (gun turret, torpedo launcher, engine room) is a finite-state
//! machine carrying the same three overlays:
//!
//! - a [`Crew`] split into on-duty and off-duty pools,
//! - an optional [`FaultLevel`] (repairable operability issue),
//! - an optional [`DamageLevel`] (combat damage; forces the module into its
//!   `Damaged` state and nothing in the simulation repairs it).
//!
//! Operations that are illegal in the current state are refused with an
//! [`OperationError`](crate::error::OperationError) and a log line; they never
//! panic and never leave the module half-updated.
//!
//! Timers are kept in minutes. Ticks are supplied in hours and converted with
//! [`MINUTES_PER_HOUR`].

pub mod engine;
pub mod gun;
pub mod torpedo;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::OperationError;

pub use engine::{Direction, EngineRoomModule, EngineState, EngineStatus};
pub use gun::{GunModule, GunState, GunStatus};
pub use torpedo::{LauncherState, LauncherStatus, TorpedoId, TorpedoLauncherModule, TubeStatus};

/// Conversion factor from tick hours to module timer minutes.
pub const MINUTES_PER_HOUR: f64 = 60.0;

// =============================================================================
// Fault / Damage Overlay
// =============================================================================

/// How hard a fault is to clear.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultLevel {
    /// Can be repaired on the spot.
    ImmediateRepair,
    /// Needs the module taken out of action for repair.
    FieldRepair,
    /// The module is unusable for the rest of the engagement.
    Unrepairable,
}

impl fmt::Display for FaultLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImmediateRepair => write!(f, "Immediate Repair"),
            Self::FieldRepair => write!(f, "Field Repair"),
            Self::Unrepairable => write!(f, "Unrepairable"),
        }
    }
}

/// Severity of combat damage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageLevel {
    /// Cosmetic or nearly so.
    Minor,
    /// Degrades function.
    Moderate,
    /// The module is likely unusable.
    Severe,
}

impl fmt::Display for DamageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minor => write!(f, "Minor Damage"),
            Self::Moderate => write!(f, "Moderate Damage"),
            Self::Severe => write!(f, "Severe Damage"),
        }
    }
}

/// Fault and damage levels recorded on a module.
///
/// The two are independent: a faulted module can later be damaged, and the
/// fault level is kept for reporting.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Last recorded fault, if any
    pub fault: Option<FaultLevel>,
    /// Last recorded damage, if any
    pub damage: Option<DamageLevel>,
}

// =============================================================================
// Crew
// =============================================================================

/// Staff assigned to a module.
///
/// The total head count never grows: casualties remove on-duty staff and a
/// recall only moves staff from the off-duty pool to the on-duty pool.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crew {
    on_duty: u32,
    off_duty: u32,
}

impl Crew {
    /// Creates a crew with the given pool sizes.
    #[must_use]
    pub const fn new(on_duty: u32, off_duty: u32) -> Self {
        Self { on_duty, off_duty }
    }

    /// Staff currently manning the module.
    #[must_use]
    pub const fn on_duty(&self) -> u32 {
        self.on_duty
    }

    /// Staff available for recall.
    #[must_use]
    pub const fn off_duty(&self) -> u32 {
        self.off_duty
    }

    /// Both pools together.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.on_duty + self.off_duty
    }

    /// Removes up to `casualties` on-duty staff. Returns how many were lost.
    pub fn add_casualties(&mut self, casualties: u32) -> u32 {
        let lost = casualties.min(self.on_duty);
        self.on_duty -= lost;
        lost
    }

    /// Moves up to `staff` from off duty to on duty. Returns how many moved.
    pub fn recall(&mut self, staff: u32) -> u32 {
        let moved = staff.min(self.off_duty);
        self.off_duty -= moved;
        self.on_duty += moved;
        moved
    }
}

// =============================================================================
// Module Capability Interface
// =============================================================================

/// Which kind of subsystem a module is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Gun turret
    Gun,
    /// Torpedo launcher
    TorpedoLauncher,
    /// Engine room
    EngineRoom,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gun => write!(f, "gun"),
            Self::TorpedoLauncher => write!(f, "torpedo launcher"),
            Self::EngineRoom => write!(f, "engine room"),
        }
    }
}

/// Capabilities every subsystem exposes to the ship that owns it.
///
/// Kind-specific operations (loading, launching, speed control) live on the
/// concrete module types; this trait only covers what the ship needs to route
/// casualties and damage without knowing the module kind.
pub trait ShipModule {
    /// The module's kind.
    fn kind(&self) -> ModuleKind;

    /// The module's current state, as a stable snake_case label.
    fn state_label(&self) -> &'static str;

    /// Read access to the crew pools.
    fn crew(&self) -> &Crew;

    /// Write access to the crew pools.
    fn crew_mut(&mut self) -> &mut Crew;

    /// Current fault and damage levels.
    fn condition(&self) -> Condition;

    /// Records a fault. Whether this can be refused depends on the module.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] when the module does not accept
    /// faults in its current state.
    fn fault(&mut self, level: FaultLevel) -> Result<(), OperationError>;

    /// Records combat damage and forces the module into its damaged state.
    fn damage(&mut self, level: DamageLevel);

    /// Returns `true` once the module has been damaged.
    fn is_damaged(&self) -> bool {
        self.condition().damage.is_some()
    }

    /// Removes on-duty staff, flooring at zero.
    fn add_casualties(&mut self, casualties: u32) {
        let kind = self.kind();
        let state = self.state_label();
        let crew = self.crew_mut();
        crew.add_casualties(casualties);
        info!(module = %kind, state, casualties, on_duty = crew.on_duty(), "casualties taken");
    }

    /// Recalls off-duty staff, never more than are available.
    fn recall_staff(&mut self, staff: u32) {
        let kind = self.kind();
        let crew = self.crew_mut();
        let moved = crew.recall(staff);
        info!(
            module = %kind,
            requested = staff,
            recalled = moved,
            on_duty = crew.on_duty(),
            "staff recalled"
        );
    }
}
