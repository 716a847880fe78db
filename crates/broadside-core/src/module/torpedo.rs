//! Multi-tube torpedo launcher state machine.
//!
//! Two loading modes share the `Loading` state:
//!
//! - **per-tube** (`load_torpedoes`): one tube is filled every
//!   `tube_reload_time_minutes` until the tubes are full or the reserve runs
//!   dry;
//! - **full reload** (`reload`): after `full_reload_time_minutes` every empty
//!   tube is filled at once.
//!
//! Only one of the two timers is ever armed. Either way the launcher ends in
//! `Ready`, from which `launch_torpedo` fires the lowest loaded tube and
//! leaves the mount in `PostLaunch` until `post_launch` stands it down.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    Condition, Crew, DamageLevel, FaultLevel, ModuleKind, ShipModule, MINUTES_PER_HOUR,
};
use crate::config::LauncherSpec;
use crate::error::OperationError;
use crate::hit::HitTable;

/// Operational state of a torpedo launcher.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LauncherState {
    /// Waiting for orders.
    Idle,
    /// A reload timer is running.
    Loading,
    /// Loaded and cleared to launch.
    Ready,
    /// A torpedo is leaving its tube.
    Launching,
    /// Launch complete; waiting to be stood down.
    PostLaunch,
    /// Tubes are being emptied and inspected.
    Maintenance,
    /// Out of action with a recorded fault.
    Fault,
    /// Knocked out by combat damage.
    Damaged,
}

impl LauncherState {
    /// Stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Launching => "launching",
            Self::PostLaunch => "post_launch",
            Self::Maintenance => "maintenance",
            Self::Fault => "fault",
            Self::Damaged => "damaged",
        }
    }
}

impl fmt::Display for LauncherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier stamped on a torpedo when it is loaded.
///
/// The number is the size of the reserve at the moment of loading, so the
/// first torpedo out of a full magazine of six is `Torpedo_6`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TorpedoId(pub u32);

impl fmt::Display for TorpedoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Torpedo_{}", self.0)
    }
}

/// Occupancy of one tube in a [`LauncherStatus`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "torpedo", rename_all = "snake_case")]
pub enum TubeStatus {
    /// Nothing in the tube.
    Empty,
    /// The tube holds this torpedo.
    Loaded(TorpedoId),
}

/// Read-only snapshot of a launcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LauncherStatus {
    /// Current state
    pub state: LauncherState,
    /// Per-tube occupancy, in tube order
    pub tubes: Vec<TubeStatus>,
    /// Torpedoes left for reloading
    pub torpedoes_in_reserve: u32,
    /// Last recorded fault
    pub fault_level: Option<FaultLevel>,
    /// Last recorded damage
    pub damage_level: Option<DamageLevel>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum ReloadTimer {
    None,
    Tube(f64),
    Full(f64),
}

/// A torpedo launcher mount.
#[derive(Debug, Clone)]
pub struct TorpedoLauncherModule {
    state: LauncherState,
    crew: Crew,
    condition: Condition,
    tubes: Vec<Option<TorpedoId>>,
    torpedo_reserve: u32,
    tube_reload_time_minutes: f64,
    full_reload_time_minutes: f64,
    tube_rotation_capable: bool,
    timer: ReloadTimer,
    hit_table: HitTable,
}

impl TorpedoLauncherModule {
    /// Builds an idle launcher with every tube empty.
    #[must_use]
    pub fn new(spec: &LauncherSpec) -> Self {
        Self {
            state: LauncherState::Idle,
            crew: Crew::new(spec.staff_on_duty, spec.staff_off_duty),
            condition: Condition::default(),
            tubes: vec![None; spec.tube_count],
            torpedo_reserve: spec.torpedo_reserve,
            tube_reload_time_minutes: spec.tube_reload_time_minutes,
            full_reload_time_minutes: spec.full_reload_time_minutes,
            tube_rotation_capable: spec.tube_rotation_capable,
            timer: ReloadTimer::None,
            hit_table: spec.hit_table.clone(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LauncherState {
        self.state
    }

    /// Tube contents in tube order.
    #[must_use]
    pub fn tubes(&self) -> &[Option<TorpedoId>] {
        &self.tubes
    }

    /// Torpedoes left for reloading.
    #[must_use]
    pub const fn torpedo_reserve(&self) -> u32 {
        self.torpedo_reserve
    }

    /// Whether the mount trains through 360 degrees.
    #[must_use]
    pub const fn tube_rotation_capable(&self) -> bool {
        self.tube_rotation_capable
    }

    /// The mount's hit-probability policy.
    #[must_use]
    pub const fn hit_table(&self) -> &HitTable {
        &self.hit_table
    }

    /// Number of tubes holding a torpedo.
    #[must_use]
    pub fn loaded_tubes(&self) -> usize {
        self.tubes.iter().filter(|tube| tube.is_some()).count()
    }

    /// `true` if at least one tube is empty.
    #[must_use]
    pub fn has_empty_tube(&self) -> bool {
        self.tubes.iter().any(Option::is_none)
    }

    /// `true` if every tube is empty.
    #[must_use]
    pub fn all_tubes_empty(&self) -> bool {
        self.tubes.iter().all(Option::is_none)
    }

    /// Minutes left on the per-tube timer, if it is armed.
    #[must_use]
    pub fn tube_timer_minutes(&self) -> Option<f64> {
        match self.timer {
            ReloadTimer::Tube(minutes) => Some(minutes),
            _ => None,
        }
    }

    /// Minutes left on the full-reload timer, if it is armed.
    #[must_use]
    pub fn full_reload_timer_minutes(&self) -> Option<f64> {
        match self.timer {
            ReloadTimer::Full(minutes) => Some(minutes),
            _ => None,
        }
    }

    /// Starts loading empty tubes one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless idle with an empty tube.
    pub fn load_torpedoes(&mut self) -> Result<(), OperationError> {
        self.check_can_load("load torpedoes")?;
        self.state = LauncherState::Loading;
        self.timer = ReloadTimer::Tube(self.tube_reload_time_minutes);
        info!(minutes = self.tube_reload_time_minutes, "torpedo loading started");
        Ok(())
    }

    /// Starts a full reload of every empty tube.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless idle with an empty tube.
    pub fn reload(&mut self) -> Result<(), OperationError> {
        self.check_can_load("reload")?;
        self.state = LauncherState::Loading;
        self.timer = ReloadTimer::Full(self.full_reload_time_minutes);
        info!(minutes = self.full_reload_time_minutes, "full torpedo reload started");
        Ok(())
    }

    /// Stands a ready launcher back down to idle.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless ready.
    pub fn prepare_launch(&mut self) -> Result<(), OperationError> {
        if self.state != LauncherState::Ready {
            return Err(self.refuse(OperationError::illegal("prepare launch", self.state.as_str())));
        }
        self.state = LauncherState::Idle;
        debug!("launch preparation completed");
        Ok(())
    }

    /// Launches the torpedo in the lowest-numbered loaded tube.
    ///
    /// # Errors
    ///
    /// - [`OperationError::IllegalState`] unless ready.
    /// - [`OperationError::ResourceExhausted`] if every tube is empty.
    pub fn launch_torpedo(&mut self) -> Result<TorpedoId, OperationError> {
        if self.state != LauncherState::Ready {
            return Err(self.refuse(OperationError::illegal("launch torpedo", self.state.as_str())));
        }
        let Some((index, torpedo)) = self
            .tubes
            .iter_mut()
            .enumerate()
            .find_map(|(index, tube)| tube.take().map(|torpedo| (index, torpedo)))
        else {
            return Err(self.refuse(OperationError::exhausted("launch torpedo", "loaded tubes")));
        };

        self.state = LauncherState::Launching;
        info!(%torpedo, tube = index + 1, "torpedo launched");
        self.state = LauncherState::PostLaunch;
        Ok(torpedo)
    }

    /// Returns a launcher in `PostLaunch` to idle.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] outside `PostLaunch`.
    pub fn post_launch(&mut self) -> Result<(), OperationError> {
        if self.state != LauncherState::PostLaunch {
            return Err(self.refuse(OperationError::illegal("post-launch", self.state.as_str())));
        }
        self.state = LauncherState::Idle;
        debug!("post-launch processing completed");
        Ok(())
    }

    /// Empties every tube. The torpedoes are not returned to the reserve.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::IllegalState`] unless idle.
    pub fn maintenance(&mut self) -> Result<(), OperationError> {
        if self.state != LauncherState::Idle {
            return Err(self.refuse(OperationError::illegal("maintenance", self.state.as_str())));
        }
        self.state = LauncherState::Maintenance;
        self.tubes.fill(None);
        self.state = LauncherState::Idle;
        info!("launcher maintenance completed");
        Ok(())
    }

    /// Advances timers by `hours`.
    pub fn tick(&mut self, hours: f64) {
        let elapsed = hours * MINUTES_PER_HOUR;
        match (self.state, self.timer) {
            (LauncherState::Loading, ReloadTimer::Tube(minutes)) => {
                let remaining = minutes - elapsed;
                if remaining > 0.0 {
                    self.timer = ReloadTimer::Tube(remaining);
                    return;
                }
                self.fill_next_tube();
                if self.has_empty_tube() && self.torpedo_reserve > 0 {
                    self.timer = ReloadTimer::Tube(self.tube_reload_time_minutes);
                } else {
                    self.finish_loading();
                }
            }
            (LauncherState::Loading, ReloadTimer::Full(minutes)) => {
                let remaining = minutes - elapsed;
                if remaining > 0.0 {
                    self.timer = ReloadTimer::Full(remaining);
                    return;
                }
                while self.has_empty_tube() && self.torpedo_reserve > 0 {
                    self.fill_next_tube();
                }
                self.finish_loading();
            }
            (LauncherState::Launching, _) => self.state = LauncherState::PostLaunch,
            _ => {}
        }
    }

    /// Read-only snapshot.
    #[must_use]
    pub fn status(&self) -> LauncherStatus {
        LauncherStatus {
            state: self.state,
            tubes: self
                .tubes
                .iter()
                .map(|tube| tube.map_or(TubeStatus::Empty, TubeStatus::Loaded))
                .collect(),
            torpedoes_in_reserve: self.torpedo_reserve,
            fault_level: self.condition.fault,
            damage_level: self.condition.damage,
        }
    }

    fn check_can_load(&self, operation: &'static str) -> Result<(), OperationError> {
        if self.state != LauncherState::Idle {
            return Err(self.refuse(OperationError::illegal(operation, self.state.as_str())));
        }
        if !self.has_empty_tube() {
            return Err(self.refuse(OperationError::illegal(operation, "all tubes full")));
        }
        Ok(())
    }

    fn fill_next_tube(&mut self) {
        if self.torpedo_reserve == 0 {
            return;
        }
        if let Some((index, slot)) = self
            .tubes
            .iter_mut()
            .enumerate()
            .find(|(_, tube)| tube.is_none())
        {
            let torpedo = TorpedoId(self.torpedo_reserve);
            *slot = Some(torpedo);
            self.torpedo_reserve -= 1;
            debug!(%torpedo, tube = index + 1, "torpedo loaded");
        }
    }

    fn finish_loading(&mut self) {
        self.timer = ReloadTimer::None;
        self.state = LauncherState::Ready;
        info!(
            loaded = self.loaded_tubes(),
            reserve = self.torpedo_reserve,
            "launcher ready"
        );
    }

    fn refuse(&self, err: OperationError) -> OperationError {
        debug!(state = ?self.state, error = %err, "launcher operation refused");
        err
    }
}

impl ShipModule for TorpedoLauncherModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::TorpedoLauncher
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

    /// Accepted from `Idle`, `Ready`, `Launching` and `PostLaunch` only.
    fn fault(&mut self, level: FaultLevel) -> Result<(), OperationError> {
        match self.state {
            LauncherState::Idle
            | LauncherState::Ready
            | LauncherState::Launching
            | LauncherState::PostLaunch => {
                self.state = LauncherState::Fault;
                self.timer = ReloadTimer::None;
                self.condition.fault = Some(level);
                info!(level = %level, "launcher faulted");
                Ok(())
            }
            _ => Err(self.refuse(OperationError::illegal("fault", self.state.as_str()))),
        }
    }

    fn damage(&mut self, level: DamageLevel) {
        self.state = LauncherState::Damaged;
        self.timer = ReloadTimer::None;
        self.condition.damage = Some(level);
        info!(level = %level, "launcher damaged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_MINUTE: f64 = 1.0 / 60.0;

    fn ready_launcher() -> TorpedoLauncherModule {
        let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
        launcher.load_torpedoes().unwrap();
        for _ in 0..3 {
            launcher.tick(ONE_MINUTE);
        }
        launcher
    }

    mod loading_tests {
        use super::*;

        #[test]
        fn per_tube_load_fills_one_tube_per_interval() {
            let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
            launcher.load_torpedoes().unwrap();
            assert_eq!(launcher.state(), LauncherState::Loading);
            assert_eq!(launcher.tube_timer_minutes(), Some(1.0));
            assert_eq!(launcher.full_reload_timer_minutes(), None);

            launcher.tick(ONE_MINUTE);
            assert_eq!(launcher.loaded_tubes(), 1);
            assert_eq!(launcher.state(), LauncherState::Loading);

            launcher.tick(ONE_MINUTE);
            launcher.tick(ONE_MINUTE);
            assert_eq!(launcher.loaded_tubes(), 3);
            assert_eq!(launcher.state(), LauncherState::Ready);
            assert_eq!(launcher.torpedo_reserve(), 3);
            assert_eq!(launcher.tube_timer_minutes(), None);
        }

        #[test]
        fn torpedoes_are_named_after_the_reserve() {
            let launcher = ready_launcher();
            assert_eq!(
                launcher.tubes(),
                &[Some(TorpedoId(6)), Some(TorpedoId(5)), Some(TorpedoId(4))]
            );
            assert_eq!(TorpedoId(6).to_string(), "Torpedo_6");
        }

        #[test]
        fn short_tick_only_runs_the_timer_down() {
            let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
            launcher.load_torpedoes().unwrap();
            launcher.tick(ONE_MINUTE / 2.0);
            assert_eq!(launcher.loaded_tubes(), 0);
            assert!((launcher.tube_timer_minutes().unwrap() - 0.5).abs() < 1e-9);
        }

        #[test]
        fn full_reload_fills_all_tubes_at_once() {
            let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
            launcher.reload().unwrap();
            assert_eq!(launcher.full_reload_timer_minutes(), Some(90.0));
            assert_eq!(launcher.tube_timer_minutes(), None);

            launcher.tick(1.0);
            assert_eq!(launcher.loaded_tubes(), 0);
            launcher.tick(0.5);
            assert_eq!(launcher.loaded_tubes(), 3);
            assert_eq!(launcher.state(), LauncherState::Ready);
        }

        #[test]
        fn full_reload_is_limited_by_reserve() {
            let spec = LauncherSpec {
                torpedo_reserve: 2,
                ..LauncherSpec::default()
            };
            let mut launcher = TorpedoLauncherModule::new(&spec);
            launcher.reload().unwrap();
            launcher.tick(1.5);
            assert_eq!(launcher.loaded_tubes(), 2);
            assert_eq!(launcher.torpedo_reserve(), 0);
            assert_eq!(launcher.state(), LauncherState::Ready);
        }

        #[test]
        fn per_tube_load_stops_when_reserve_runs_out() {
            let spec = LauncherSpec {
                torpedo_reserve: 1,
                ..LauncherSpec::default()
            };
            let mut launcher = TorpedoLauncherModule::new(&spec);
            launcher.load_torpedoes().unwrap();
            launcher.tick(ONE_MINUTE);
            assert_eq!(launcher.loaded_tubes(), 1);
            assert_eq!(launcher.state(), LauncherState::Ready);
        }

        #[test]
        fn load_refused_when_tubes_full_or_busy() {
            let mut launcher = ready_launcher();
            assert!(launcher.load_torpedoes().is_err());

            launcher.prepare_launch().unwrap();
            let err = launcher.reload().unwrap_err();
            assert_eq!(err, OperationError::illegal("reload", "all tubes full"));

            let mut loading = TorpedoLauncherModule::new(&LauncherSpec::default());
            loading.load_torpedoes().unwrap();
            assert!(loading.reload().is_err());
            assert_eq!(loading.tube_timer_minutes(), Some(1.0));
        }
    }

    mod launch_tests {
        use super::*;

        #[test]
        fn launch_empties_lowest_loaded_tube() {
            let mut launcher = ready_launcher();
            let torpedo = launcher.launch_torpedo().unwrap();
            assert_eq!(torpedo, TorpedoId(6));
            assert_eq!(launcher.tubes()[0], None);
            assert_eq!(launcher.loaded_tubes(), 2);
            assert_eq!(launcher.state(), LauncherState::PostLaunch);
        }

        #[test]
        fn launch_refused_unless_ready() {
            let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
            assert!(launcher.launch_torpedo().is_err());

            let mut launcher = ready_launcher();
            launcher.prepare_launch().unwrap();
            assert_eq!(launcher.state(), LauncherState::Idle);
            assert!(launcher.launch_torpedo().is_err());
            assert_eq!(launcher.loaded_tubes(), 3);
        }

        #[test]
        fn post_launch_returns_to_idle() {
            let mut launcher = ready_launcher();
            assert!(launcher.post_launch().is_err());
            launcher.launch_torpedo().unwrap();
            launcher.post_launch().unwrap();
            assert_eq!(launcher.state(), LauncherState::Idle);
            assert!(launcher.has_empty_tube());
        }

        #[test]
        fn status_reports_tube_occupancy() {
            let mut launcher = ready_launcher();
            launcher.launch_torpedo().unwrap();
            let status = launcher.status();
            assert_eq!(status.tubes[0], TubeStatus::Empty);
            assert_eq!(status.tubes[1], TubeStatus::Loaded(TorpedoId(5)));
            assert_eq!(status.torpedoes_in_reserve, 3);

            let json = serde_json::to_value(&status).unwrap();
            assert_eq!(json["state"], "post_launch");
            assert_eq!(json["tubes"][0]["status"], "empty");
            assert_eq!(json["tubes"][1]["torpedo"], 5);
        }
    }

    mod overlay_tests {
        use super::*;

        #[test]
        fn maintenance_clears_every_tube() {
            let mut launcher = ready_launcher();
            launcher.prepare_launch().unwrap();
            launcher.maintenance().unwrap();
            assert!(launcher.all_tubes_empty());
            assert_eq!(launcher.state(), LauncherState::Idle);
            // dumped torpedoes do not go back to the reserve
            assert_eq!(launcher.torpedo_reserve(), 3);
        }

        #[test]
        fn maintenance_refused_unless_idle() {
            let mut launcher = ready_launcher();
            assert!(launcher.maintenance().is_err());
            assert_eq!(launcher.loaded_tubes(), 3);
        }

        #[test]
        fn fault_refused_while_loading() {
            let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
            launcher.load_torpedoes().unwrap();
            assert!(launcher.fault(FaultLevel::ImmediateRepair).is_err());
            assert_eq!(launcher.state(), LauncherState::Loading);
            assert_eq!(launcher.condition().fault, None);
        }

        #[test]
        fn fault_accepted_when_ready() {
            let mut launcher = ready_launcher();
            launcher.fault(FaultLevel::Unrepairable).unwrap();
            assert_eq!(launcher.state(), LauncherState::Fault);
            assert!(launcher.launch_torpedo().is_err());
        }

        #[test]
        fn damage_stops_loading() {
            let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
            launcher.reload().unwrap();
            launcher.damage(DamageLevel::Severe);
            launcher.tick(2.0);
            assert_eq!(launcher.state(), LauncherState::Damaged);
            assert_eq!(launcher.loaded_tubes(), 0);
            assert_eq!(launcher.status().damage_level, Some(DamageLevel::Severe));
        }
    }
}
