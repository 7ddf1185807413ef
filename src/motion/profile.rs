use serde::Serialize;

/// Velocity and acceleration limits of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Constraints {
    pub max_velocity:     f64,
    pub max_acceleration: f64,
}

impl Constraints {
    pub const fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
        }
    }

    /// Both limits are positive and finite.
    pub fn is_bounded(&self) -> bool {
        self.max_velocity.is_finite()
            && self.max_acceleration.is_finite()
            && self.max_velocity > 0.0
            && self.max_acceleration > 0.0
    }
}

/// A position and the velocity the mechanism has there.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct State {
    pub position: f64,
    pub velocity: f64,
}

impl State {
    pub const fn new(position: f64, velocity: f64) -> Self { Self { position, velocity } }

    fn flipped(self, direction: f64) -> Self {
        Self {
            position: self.position * direction,
            velocity: self.velocity * direction,
        }
    }
}

/// A trapezoidal motion profile.
///
/// The profile accelerates at the maximum rate until it reaches the maximum
/// velocity, cruises, and decelerates so that it arrives at the goal with the
/// goal's velocity. Short moves never reach cruise and produce a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    pub constraints: Constraints,
}

impl TrapezoidProfile {
    pub const fn new(constraints: Constraints) -> Self { Self { constraints } }

    /// The state `t` seconds after `current` on the way to `goal`.
    ///
    /// With unbounded or non-positive constraints there is nothing to shape
    /// and the goal is returned as is.
    pub fn calculate(&self, t: f64, current: State, goal: State) -> State {
        if !self.constraints.is_bounded() {
            return goal;
        }
        let max_v = self.constraints.max_velocity;
        let max_a = self.constraints.max_acceleration;

        // Solve every move as a forward move and flip the result back.
        let direction = if current.position > goal.position { -1.0 } else { 1.0 };
        let mut current = current.flipped(direction);
        let goal = goal.flipped(direction);
        if current.velocity > max_v {
            current.velocity = max_v;
        }

        // Pretend the move started (and ends) at rest and cut off the parts
        // of the trapezoid that are already behind us.
        let cutoff_begin = current.velocity / max_a;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_a / 2.0;
        let cutoff_end = goal.velocity / max_a;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_a / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;
        let mut acceleration_time = max_v / max_a;
        let mut full_speed_dist = full_trapezoid_dist - acceleration_time * acceleration_time * max_a;

        // triangle
        if full_speed_dist < 0.0 {
            acceleration_time = (full_trapezoid_dist / max_a).max(0.0).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = acceleration_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_v;
        let end_decel = end_full_speed + acceleration_time - cutoff_end;

        let result = if t < end_accel {
            State {
                position: current.position + (current.velocity + t * max_a / 2.0) * t,
                velocity: current.velocity + t * max_a,
            }
        } else if t < end_full_speed {
            State {
                position: current.position
                    + (current.velocity + end_accel * max_a / 2.0) * end_accel
                    + max_v * (t - end_accel),
                velocity: max_v,
            }
        } else if t <= end_decel {
            let time_left = end_decel - t;
            State {
                position: goal.position - (goal.velocity + time_left * max_a / 2.0) * time_left,
                velocity: goal.velocity + time_left * max_a,
            }
        } else {
            goal
        };
        result.flipped(direction)
    }
}
