//! End-to-end tests across modules, ships and the world.

use crate::config::{GunSpec, LauncherSpec, ScenarioConfig, ShipConfig};
use crate::error::OperationError;
use crate::event::WorldEvent;
use crate::module::{
    EngineState, GunModule, GunState, LauncherState, ShipModule, TorpedoId,
    TorpedoLauncherModule,
};
use crate::physics::GeoPoint;
use crate::ship::{RawCommand, ShipCommand, ShipFlags, ShipId};
use crate::world::{ProjectileKind, WorldSimulation};

use super::helpers::{duel, fubuki, linear_model, load_fully, run, test_ship};

// =============================================================================
// Module Scenarios
// =============================================================================

#[test]
fn type3_mount_empties_after_150_salvos() {
    let mut gun = GunModule::new(&GunSpec::type3_127mm());

    for salvo in 0..150 {
        gun.tick(0.01);
        if !gun.ammo_loaded() {
            load_fully(&mut gun);
        }
        assert!(gun.fire().is_ok(), "salvo {salvo} refused");
    }

    assert!(!gun.ammo_loaded());
    assert_eq!(gun.rounds_left(), 0);
    assert_eq!(gun.shells_fired(), 300);

    gun.tick(0.01);
    assert_eq!(gun.state(), GunState::Idle);
    assert!(matches!(
        gun.load_ammo(),
        Err(OperationError::ResourceExhausted { .. })
    ));
    assert!(gun.fire().is_err());
}

#[test]
fn launcher_fills_one_tube_per_minute() {
    let mut launcher = TorpedoLauncherModule::new(&LauncherSpec::default());
    launcher.load_torpedoes().unwrap();

    launcher.tick(1.0 / 60.0);
    launcher.tick(1.0 / 60.0);
    assert_eq!(launcher.state(), LauncherState::Loading);
    assert_eq!(launcher.loaded_tubes(), 2);

    launcher.tick(1.0 / 60.0);
    assert_eq!(launcher.state(), LauncherState::Ready);
    assert_eq!(launcher.loaded_tubes(), 3);
    assert_eq!(launcher.torpedo_reserve(), 3);
    assert_eq!(launcher.tubes()[0], Some(TorpedoId(6)));
}

// =============================================================================
// Ship Scenarios
// =============================================================================

#[test]
fn gun_cooldown_allows_one_salvo_per_window() {
    let count_salvos = |gap_hours: f64| {
        let mut ship = test_ship(&fubuki());
        ship.update(0.1);
        ship.update(0.1);
        assert!(ship.guns()[0].module.is_ready());

        let target = ShipId::new(1);
        ship.fire_guns(target);
        ship.update(gap_hours);
        ship.fire_guns(target);
        ship.take_discharges().len()
    };

    assert_eq!(count_salvos(0.05), 1);
    assert_eq!(count_salvos(0.11), 2);
}

#[test]
fn raw_speed_order_reaches_ordered_speed() {
    let mut ship = test_ship(&fubuki());
    ship.engine_room_mut().module.start_operations().unwrap();
    ship.submit_raw(RawCommand::new("set_speed").with("knots", 19));

    ship.update(1.0);

    assert_eq!(ship.engine_room().module.state(), EngineState::Operating);
    assert!((ship.engine_room().module.power_percentage() - 50.0).abs() < 1e-9);
    assert!((ship.speed() - 19.0).abs() < 1e-9);
    assert!(ship.location().latitude > fubuki().location.latitude);
}

#[test]
fn malformed_orders_do_not_block_the_queue() {
    let mut ship = test_ship(&fubuki());
    ship.submit_raw(RawCommand::new("ram").with("target_id", 1));
    ship.submit_raw(RawCommand::new("set_direction"));
    ship.submit(ShipCommand::SetDirection { degrees: 90.0 });
    assert_eq!(ship.pending_commands(), 3);

    ship.update(0.01);

    assert_eq!(ship.pending_commands(), 0);
    assert_eq!(ship.target_heading(), 90.0);
}

#[test]
fn engine_casualties_stop_a_cold_start() {
    let mut ship = test_ship(&fubuki());
    let engine = &mut ship.engine_room_mut().module;
    engine.add_casualties(19);
    assert!(matches!(
        engine.start_operations(),
        Err(OperationError::ResourceExhausted { .. })
    ));

    engine.recall_staff(5);
    assert!(engine.start_operations().is_ok());
}

// =============================================================================
// World Scenarios
// =============================================================================

#[test]
fn projectile_inside_threshold_hits_once() {
    let mut world = WorldSimulation::default();
    let id = world.spawn_ship_with_model(
        &ShipConfig {
            hp: 100.0,
            ..fubuki()
        },
        linear_model,
    );
    let near = GeoPoint::new(fubuki().location.latitude + 0.05, fubuki().location.longitude);
    world.spawn_projectile(ProjectileKind::Shell, near, Some(id), 30.0);

    world.tick(0.01);

    assert_eq!(world.ship(id).unwrap().hp(), 70.0);
    assert!(world.projectiles().is_empty());
}

#[test]
fn torpedo_attack_after_full_reload() {
    let (mut world, own, enemy) = duel(7);

    run(&mut world, 20, 0.1);
    let launcher = &world.ship(own).unwrap().launchers()[0].module;
    assert_eq!(launcher.state(), LauncherState::Ready);
    assert_eq!(launcher.loaded_tubes(), 3);
    assert!(world.take_events().is_empty());

    world
        .ship_mut(own)
        .unwrap()
        .submit(ShipCommand::LaunchTorpedoes { target: enemy });
    world.tick(0.1);

    let events = world.take_events();
    assert_eq!(
        events.iter().map(|r| r.event).collect::<Vec<_>>(),
        vec![WorldEvent::TorpedoLaunched {
            ship: own,
            launcher: 0,
            torpedo: TorpedoId(6),
            target: enemy,
        }]
    );
    let launcher = &world.ship(own).unwrap().launchers()[0].module;
    assert_eq!(launcher.loaded_tubes(), 2);
}

#[test]
fn sinking_sets_flags_and_keeps_ticking() {
    let (mut world, own, _) = duel(1);
    for _ in 0..3 {
        world.spawn_projectile(ProjectileKind::Torpedo, fubuki().location, None, 400.0);
    }
    // one torpedo lands per tick
    for expected_hp in [600.0, 200.0, 0.0] {
        world.tick(0.1);
        assert_eq!(world.ship(own).unwrap().hp(), expected_hp);
    }

    let ship = world.ship(own).unwrap();
    assert!(!ship.is_alive());
    assert!(ship.flags().contains(ShipFlags::DESTROYED));

    world.tick(0.1);
    assert!((world.ship(own).unwrap().clock_hours() - 0.4).abs() < 1e-12);
}

#[test]
fn scenario_json_builds_a_world() {
    let json = r#"{
        "world": { "seed": 42 },
        "ships": [
            { "name": "Fubuki", "location": { "latitude": 35.6895, "longitude": 139.6917 } },
            {
                "name": "Enemy Destroyer",
                "location": { "latitude": 35.7895, "longitude": 139.7917 },
                "hull": { "length_m": 120.0, "displacement_t": 6000.0, "engine_power_kw": 70000.0 }
            }
        ]
    }"#;
    let scenario = ScenarioConfig::from_json(json).unwrap();
    let world = WorldSimulation::from_scenario(&scenario).unwrap();

    assert_eq!(world.seed(), 42);
    assert_eq!(world.ships().len(), 2);
    let statuses = world.statuses();
    assert_eq!(statuses[1].name, "Enemy Destroyer");
    assert_eq!(statuses[1].guns.len(), 1);
    assert!(statuses.iter().all(|s| s.alive));
}
