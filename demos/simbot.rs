//! A scripted stretch of a match on the simulated robot.
//!
//! Collects a note, aims from a pose, shoots, and prints the telemetry of
//! every second to stdout. Run with `cargo run --example simbot`.

use log::{LevelFilter, info, warn};
use talos::{
    aim::geo::{Alliance, Pose},
    constants::LOOP_PERIOD_SECS,
    fs::logger,
    superstructure::{ShotPhase, Superstructure},
    tunable::TunableStore,
};

const PERIODS_PER_SECOND: usize = (1.0 / LOOP_PERIOD_SECS) as usize;

fn run(robot: &mut Superstructure, seconds: f64) {
    let periods = (seconds / LOOP_PERIOD_SECS).round() as usize;
    for i in 0..periods {
        robot.periodic(true);
        if i % PERIODS_PER_SECOND == 0 {
            println!("{}", robot.to_json());
        }
    }
}

fn main() {
    if let Err(e) = logger::init(LevelFilter::Info) {
        eprintln!("Logger unavailable: {}", e);
    }

    let store = TunableStore::global();
    let mut robot = Superstructure::simulated(store);
    info!("Tunables: {}", store.to_json());

    robot.periodic(false);

    robot.collect();
    run(&mut robot, 3.0);
    if !robot.intake().has_note() {
        warn!("No note after collecting");
    }
    robot.intake_mut().stop();

    let pose = Pose::new(1.4, 5.2, 0.0);
    match robot.aim_at_speaker(pose, Alliance::Blue) {
        Ok(angle) => info!("Aiming at {:.1} deg from {:?}", angle, pose),
        Err(e) => warn!("Cannot aim from {:?}. Error: {}", pose, e),
    }
    run(&mut robot, 2.0);

    robot.begin_shot();
    while robot.shot_phase() != ShotPhase::Feeding {
        robot.periodic(true);
    }
    run(&mut robot, 1.0);
    robot.end_shot();
    run(&mut robot, 1.0);

    robot.periodic(false);
    info!("Final state: {}", robot.to_json());
    log::logger().flush();
}
