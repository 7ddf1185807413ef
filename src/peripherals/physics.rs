use std::f64::consts::PI;

use crate::constants::MAX_VOLTAGE;

/// Steady-state model of a brushed or brushless DC motor (or a gang of
/// identical ones sharing a shaft).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcMotor {
    pub nominal_voltage: f64,
    /// Stall torque, N·m.
    pub stall_torque:    f64,
    pub stall_current:   f64,
    pub free_current:    f64,
    /// Free speed, rad/s.
    pub free_speed:      f64,
    /// Winding resistance, ohms.
    pub r:               f64,
    /// Speed constant, rad/s per volt.
    pub kv:              f64,
    /// Torque constant, N·m per amp.
    pub kt:              f64,
}

impl DcMotor {
    pub fn new(
        nominal_voltage: f64,
        stall_torque: f64,
        stall_current: f64,
        free_current: f64,
        free_speed: f64,
        count: usize,
    ) -> Self {
        let n = count.max(1) as f64;
        let stall_torque = stall_torque * n;
        let stall_current = stall_current * n;
        let free_current = free_current * n;
        let r = nominal_voltage / stall_current;
        Self {
            nominal_voltage,
            stall_torque,
            stall_current,
            free_current,
            free_speed,
            r,
            kv: free_speed / (nominal_voltage - r * free_current),
            kt: stall_torque / stall_current,
        }
    }

    /// `count` Falcon 500 motors.
    pub fn falcon500(count: usize) -> Self { Self::new(12.0, 4.69, 257.0, 1.5, rpm_to_rad(6380.0), count) }

    /// Current drawn at `speed` rad/s with `volts` applied.
    pub fn current(&self, speed: f64, volts: f64) -> f64 { (volts - speed / self.kv) / self.r }
}

/// A geared inertia driven by a [`DcMotor`], integrated exactly over each
/// step.
#[derive(Debug, Clone, PartialEq)]
pub struct FlywheelSim {
    motor:    DcMotor,
    gearing:  f64,
    moi:      f64,
    velocity: f64,
    volts:    f64,
}

impl FlywheelSim {
    /// `gearing` is motor rotations per output rotation, `moi` the output
    /// moment of inertia in kg·m².
    pub fn new(motor: DcMotor, gearing: f64, moi: f64) -> Self {
        Self {
            motor,
            gearing,
            moi,
            velocity: 0.0,
            volts: 0.0,
        }
    }

    /// Sets the input voltage, clamped to the battery rail.
    pub fn set_input_voltage(&mut self, volts: f64) {
        self.volts = if volts.is_finite() { volts.clamp(-MAX_VOLTAGE, MAX_VOLTAGE) } else { 0.0 };
    }

    pub fn input_voltage(&self) -> f64 { self.volts }

    /// Advances the model `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        let m = &self.motor;
        let a = -self.gearing * self.gearing * m.kt / (m.kv * m.r * self.moi);
        let b = self.gearing * m.kt / (m.r * self.moi);
        let decay = (a * dt).exp();
        self.velocity = decay * self.velocity + (decay - 1.0) / a * b * self.volts;
    }

    /// Output shaft velocity, rad/s.
    pub fn velocity(&self) -> f64 { self.velocity }

    pub fn velocity_rpm(&self) -> f64 { rad_to_rpm(self.velocity) }

    /// Forces the output velocity, e.g. when the mechanism hits a stop.
    pub fn set_velocity(&mut self, velocity: f64) { self.velocity = velocity; }

    /// Motor shaft velocity, rad/s.
    pub fn motor_velocity(&self) -> f64 { self.velocity * self.gearing }

    /// Current the motor draws right now.
    pub fn current_draw(&self) -> f64 { self.motor.current(self.motor_velocity(), self.volts) }
}

pub fn rpm_to_rad(rpm: f64) -> f64 { rpm * 2.0 * PI / 60.0 }

pub fn rad_to_rpm(rad: f64) -> f64 { rad * 60.0 / (2.0 * PI) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falcon_constants() {
        let m = DcMotor::falcon500(1);
        assert!((m.r - 12.0 / 257.0).abs() < 1e-12);
        assert!((m.kv - 56.0).abs() < 0.1);
        assert!((m.kt - 4.69 / 257.0).abs() < 1e-12);
        // two motors halve the resistance, the speed constant stays
        let m2 = DcMotor::falcon500(2);
        assert!((m2.r - m.r / 2.0).abs() < 1e-12);
        assert!((m2.kv - m.kv).abs() < 1e-9);
    }

    #[test]
    fn flywheel_settles_at_free_speed() {
        let mut sim = FlywheelSim::new(DcMotor::falcon500(1), 1.0, 0.004);
        sim.set_input_voltage(6.0);
        for _ in 0..2000 {
            sim.update(0.02);
        }
        let free_velocity = sim.motor.kv * 6.0 / sim.gearing;
        assert!((sim.velocity() - free_velocity).abs() < 1e-6);
        // at free speed only the free current is left
        assert!(sim.current_draw().abs() < 1e-3);
    }

    #[test]
    fn flywheel_spins_down_without_input() {
        let mut sim = FlywheelSim::new(DcMotor::falcon500(1), 1.0, 0.004);
        sim.set_input_voltage(12.0);
        sim.update(0.02);
        let spinning = sim.velocity();
        assert!(spinning > 0.0);
        sim.set_input_voltage(0.0);
        sim.update(0.02);
        assert!(sim.velocity() < spinning);
        assert!(sim.velocity() >= 0.0);
    }

    #[test]
    fn input_is_clamped() {
        let mut sim = FlywheelSim::new(DcMotor::falcon500(1), 1.0, 0.004);
        sim.set_input_voltage(20.0);
        assert_eq!(sim.input_voltage(), 12.0);
        sim.set_input_voltage(f64::NAN);
        assert_eq!(sim.input_voltage(), 0.0);
    }

    #[test]
    fn rpm_conversions() {
        assert!((rpm_to_rad(60.0) - 2.0 * PI).abs() < 1e-12);
        assert!((rad_to_rpm(rpm_to_rad(1234.0)) - 1234.0).abs() < 1e-9);
    }
}
