use talos::{
    aim::geo::{Alliance, Pose},
    mechanism::{
        arm::ArmState, indexer::IndexerMode, intake::IntakeMode, shooter::ShooterMode,
    },
    superstructure::{ShotPhase, Superstructure},
    tunable::TunableStore,
};

fn run(robot: &mut Superstructure, enabled: bool, periods: usize) {
    for _ in 0..periods {
        robot.periodic(enabled);
    }
}

#[test]
fn arm_converges_and_latches() {
    let mut robot = Superstructure::simulated(&TunableStore::new());
    robot.arm_mut().set_target_pos(55.0).unwrap();
    assert_eq!(robot.arm().state(), ArmState::Seeking);
    run(&mut robot, true, 300);
    assert_eq!(robot.arm().state(), ArmState::AtGoal);
    assert!((robot.arm().angle_deg() - 55.0).abs() < 2.0);
}

#[test]
fn disable_zeroes_every_output_on_the_same_period() {
    let mut robot = Superstructure::simulated(&TunableStore::new());
    robot.arm_mut().set_target_pos(70.0).unwrap();
    robot.shooter_mut().set_deliver();
    robot.indexer_mut().index();
    robot.intake_mut().eat();
    run(&mut robot, true, 10);
    assert!(robot.shooter().voltage_command() > 0.0);
    assert!(robot.intake().voltage_command() > 0.0);

    robot.periodic(false);
    let t = robot.telemetry();
    assert_eq!(t.arm.voltage_command, 0.0);
    assert_eq!(t.shooter.voltage_command, 0.0);
    assert_eq!(t.shooter.mode, ShooterMode::Stopped);
    assert_eq!(t.indexer.mode, IndexerMode::Stopped);
    assert_eq!(t.indexer.setpoint_rpm, 0.0);
    assert_eq!(t.intake.mode, IntakeMode::Stopped);
    assert_eq!(t.intake.voltage_command, 0.0);
}

#[test]
fn note_is_detected_by_roller_speed() {
    let mut robot = Superstructure::simulated(&TunableStore::new());
    robot.collect();
    run(&mut robot, true, 50);
    assert!(!robot.intake().has_note());
    run(&mut robot, true, 100);
    assert!(robot.intake().has_note());

    robot.intake_mut().vomit();
    run(&mut robot, true, 50);
    assert!(!robot.intake().has_note());
}

#[test]
fn aims_from_pose() {
    let mut robot = Superstructure::simulated(&TunableStore::new());
    let angle = robot
        .aim_at_speaker(Pose::new(1.2, 5.5479, 0.0), Alliance::Blue)
        .unwrap();
    assert!((angle - 36.23).abs() < 0.01);
    run(&mut robot, true, 250);
    assert!(robot.arm().reached_goal());
    assert!((robot.arm().angle_deg() - angle).abs() < 2.0);
}

#[test]
fn full_shot_sequence() {
    let store = TunableStore::new();
    store.set("Shooter/SpinDurationSec", 1.0);
    let mut robot = Superstructure::simulated(&store);
    robot.begin_shot();
    run(&mut robot, true, 40);
    assert!(matches!(robot.shot_phase(), ShotPhase::SpinningUp { .. }));
    run(&mut robot, true, 10);
    assert_eq!(robot.shot_phase(), ShotPhase::Feeding);
    assert!(robot.shooter().velocity_rpm() > 1500.0);
    robot.end_shot();
    run(&mut robot, true, 1);
    assert_eq!(robot.indexer().feedforward_volts(), 0.0);
}

#[test]
fn tunable_channel_retunes_running_controllers() {
    let store = TunableStore::new();
    let mut robot = Superstructure::simulated(&store);
    robot.shooter_mut().set_shoot();
    robot.periodic(true);
    assert_eq!(robot.shooter().setpoint_rpm(), 2000.0);

    let applied = store
        .apply_json(r#"{"Shooter/ShootRPM": 1500, "Intake/EatVolts": 6}"#)
        .unwrap();
    assert_eq!(applied, 2);
    robot.intake_mut().eat();
    robot.periodic(true);
    assert_eq!(robot.shooter().setpoint_rpm(), 1500.0);
    assert_eq!(robot.intake().voltage_command(), 6.0);

    assert!(store.apply_json("[1, 2]").is_err());
    assert_eq!(store.get("Shooter/ShootRPM"), Some(1500.0));
}

#[test]
fn locked_store_keeps_defaults() {
    let store = TunableStore::locked();
    let mut robot = Superstructure::simulated(&store);
    assert_eq!(store.apply_json(r#"{"Shooter/ShootRPM": 100}"#).unwrap(), 0);
    robot.shooter_mut().set_shoot();
    robot.periodic(true);
    assert_eq!(robot.shooter().setpoint_rpm(), 2000.0);
}
