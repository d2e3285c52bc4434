use std::{f64::consts::PI, sync::Arc};

use ev3dev_devices::motor::{
    DutyCycleMotor, Motor, MotorSettings, Polarity, StopCommand, TachoMotor,
};
use snafu::ensure;
use tracing::debug;

use crate::{
    InvalidDimensionSnafu, MotionCallbacks, MotionMonitor, NavigationError, Pilot,
    ZeroRadiusSnafu, ZeroTurnRateSnafu,
};

/// Splits a travel speed between the left and right wheels for a turn rate.
///
/// The turn rate ranges from -200 to 200 and is clipped to that range. Positive rates turn
/// left. The inner wheel runs at `speed * (100 - |turn_rate|) / 100` and the outer wheel at
/// `speed`, so 100 pivots on the inner wheel and 200 spins in place.
///
/// ```
/// use ev3dev_navigation::steer_speeds;
///
/// assert_eq!(steer_speeds(0.0, 100.0), (100.0, 100.0));
/// assert_eq!(steer_speeds(50.0, 100.0), (50.0, 100.0));
/// assert_eq!(steer_speeds(-200.0, 100.0), (100.0, -100.0));
/// ```
#[must_use]
pub fn steer_speeds(turn_rate: f64, speed: f64) -> (f64, f64) {
    let turn_rate = turn_rate.clamp(-200.0, 200.0);
    let inner = speed * (100.0 - turn_rate.abs()) / 100.0;
    if turn_rate > 0.0 {
        (inner, speed)
    } else {
        (speed, inner)
    }
}

/// Returns the signed radius of the path followed at a non-zero turn rate, positive to the
/// left.
///
/// With `r = (100 - |turn_rate|) / 100` the ratio of inner to outer wheel speed, the radius is
/// `track_width / 2 * (1 + r) / (1 - r)`.
#[must_use]
pub fn turn_radius(turn_rate: f64, track_width: f64) -> f64 {
    let turn_rate = turn_rate.clamp(-200.0, 200.0);
    let ratio = (100.0 - turn_rate.abs()) / 100.0;
    turn_rate.signum() * track_width / 2.0 * (1.0 + ratio) / (1.0 - ratio)
}

/// A pilot for robots driven by two independently controlled wheels.
///
/// Steering differentially, the robot can rotate within its own footprint.
#[derive(Debug)]
pub struct DifferentialPilot {
    motors: Arc<[TachoMotor; 2]>,
    wheel_diameter: f64,
    track_width: f64,
    reverse: bool,
    dist_per_pulse: f64,
    rotation_per_pulse: f64,
    travel_speed: f64,
    rotate_speed: f64,
}

impl DifferentialPilot {
    /// Motor settings written when the pilot is created, before the caller's own.
    pub const DEFAULT_SETTINGS: MotorSettings = MotorSettings::new()
        .duty_cycle_sp(100)
        .speed_regulation(true)
        .stop_command(StopCommand::Hold)
        .ramp_up_sp(500)
        .ramp_down_sp(500);

    /// Creates a pilot, resetting both motors and configuring them with
    /// [`DifferentialPilot::DEFAULT_SETTINGS`] overridden by `settings`.
    ///
    /// The wheel diameter and track width (the distance between the wheel contact points)
    /// can use any unit, as long as it is the same for both. When `reverse` is set the robot
    /// moves forward with its motors running backwards.
    ///
    /// # Errors
    ///
    /// - A [`NavigationError::InvalidDimension`] error is returned if a dimension or the
    ///   encoder resolution of the left motor is zero.
    /// - Errors from writing to the motors are returned.
    pub fn new(
        wheel_diameter: f64,
        track_width: f64,
        left: impl Into<TachoMotor>,
        right: impl Into<TachoMotor>,
        reverse: bool,
        settings: &MotorSettings,
    ) -> Result<Self, NavigationError> {
        for (dimension, value) in [("wheel diameter", wheel_diameter), ("track width", track_width)] {
            ensure!(
                value != 0.0 && value.is_finite(),
                InvalidDimensionSnafu { dimension, value }
            );
        }

        let motors = [left.into(), right.into()];

        let count_per_rot = motors[0].count_per_rot()?;
        ensure!(
            count_per_rot != 0,
            InvalidDimensionSnafu {
                dimension: "count per rotation",
                value: f64::from(count_per_rot),
            }
        );

        let dist_per_pulse = wheel_diameter * PI / f64::from(count_per_rot);
        let rotation_per_pulse = (dist_per_pulse / track_width * 2.0).to_degrees();

        let mut settings = Self::DEFAULT_SETTINGS.merge(settings);
        if reverse {
            settings = settings.polarity(Polarity::Inversed);
        }
        for motor in &motors {
            motor.reset()?;
            motor.apply(&settings)?;
        }

        debug!(
            wheel_diameter,
            track_width, dist_per_pulse, rotation_per_pulse, reverse, "pilot ready"
        );

        Ok(Self {
            motors: Arc::new(motors),
            wheel_diameter,
            track_width,
            reverse,
            dist_per_pulse,
            rotation_per_pulse,
            travel_speed: 0.0,
            rotate_speed: 0.0,
        })
    }

    /// The left motor.
    #[must_use]
    pub fn left(&self) -> &TachoMotor {
        &self.motors[0]
    }

    /// The right motor.
    #[must_use]
    pub fn right(&self) -> &TachoMotor {
        &self.motors[1]
    }

    /// The wheel diameter.
    #[must_use]
    pub const fn wheel_diameter(&self) -> f64 {
        self.wheel_diameter
    }

    /// The distance between the wheel contact points.
    #[must_use]
    pub const fn track_width(&self) -> f64 {
        self.track_width
    }

    /// Whether the motors run backwards to move forward.
    #[must_use]
    pub const fn reverse(&self) -> bool {
        self.reverse
    }

    /// Distance travelled by a wheel per encoder pulse.
    #[must_use]
    pub const fn dist_per_pulse(&self) -> f64 {
        self.dist_per_pulse
    }

    /// Heading change in degrees per encoder pulse, with the wheels turning in opposite
    /// directions.
    #[must_use]
    pub const fn rotation_per_pulse(&self) -> f64 {
        self.rotation_per_pulse
    }

    fn linear_pulses(&self, distance: f64) -> i32 {
        (distance / self.dist_per_pulse).round() as i32
    }

    fn angular_pulses(&self, angle: f64) -> i32 {
        (angle / self.rotation_per_pulse).round() as i32
    }

    fn run_forever(&self, speeds: [i32; 2]) -> Result<(), NavigationError> {
        for (motor, speed) in self.motors.iter().zip(speeds) {
            motor.run_forever(&MotorSettings::new().speed_regulation(true).speed_sp(speed))?;
        }
        Ok(())
    }

    fn run_to_rel_pos(
        &self,
        moves: [(i32, i32); 2],
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        for (motor, (position, speed)) in self.motors.iter().zip(moves) {
            motor.run_to_rel_pos(
                position,
                &MotorSettings::new().speed_regulation(true).speed_sp(speed),
            )?;
        }
        Ok(MotionMonitor::start(Arc::clone(&self.motors), callbacks))
    }

    /// Rotates in place until stopped, counter-clockwise if `speed` (degrees per second) is
    /// positive.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    pub fn rotate_forever(&self, speed: f64) -> Result<(), NavigationError> {
        let pulses_per_sec = self.angular_pulses(speed);
        self.run_forever([-pulses_per_sec, pulses_per_sec])
    }

    /// Moves along an arc of `radius` until the heading changed by `angle` degrees.
    ///
    /// A positive radius puts the center of the arc on the left of the robot. The robot moves
    /// forward when radius and angle have the same sign and backwards otherwise. A zero
    /// radius rotates in place at the rotation speed. The sign of `speed` is ignored.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    pub fn arc(
        &self,
        radius: f64,
        angle: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        if radius == 0.0 {
            return self.rotate(angle, None, callbacks);
        }

        let speed = speed.unwrap_or(self.travel_speed).abs();
        let half_track = self.track_width / 2.0;
        let heading = angle.to_radians();

        let wheel = |side: f64| {
            let position = self.linear_pulses((radius + side * half_track) * heading);
            let speed = self.linear_pulses(speed * (1.0 + side * half_track / radius));
            (position, speed)
        };

        self.run_to_rel_pos([wheel(-1.0), wheel(1.0)], callbacks)
    }

    /// Moves along an arc of `radius` for `distance`.
    ///
    /// # Errors
    ///
    /// - A [`NavigationError::ZeroRadius`] error is returned if `radius` is zero.
    /// - Errors from writing to the motors are returned.
    pub fn travel_arc(
        &self,
        radius: f64,
        distance: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        ensure!(radius != 0.0, ZeroRadiusSnafu);
        self.arc(radius, (distance / radius).to_degrees(), speed, callbacks)
    }

    /// Moves along a curved path until stopped, see [`steer_speeds`].
    ///
    /// The robot moves forward if `speed` is positive. A zero turn rate drives straight and
    /// a rate of ±200 rotates in place.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    pub fn steer(&self, turn_rate: f64, speed: Option<f64>) -> Result<(), NavigationError> {
        let speed = speed.unwrap_or(self.travel_speed);
        if turn_rate == 0.0 {
            return self.drive(Some(speed));
        }

        let turn_rate = turn_rate.clamp(-200.0, 200.0);
        if turn_rate.abs() == 200.0 {
            // Wheels at +-speed spin the robot at speed / half track radians per second.
            let angular = (turn_rate.signum() * speed / (self.track_width / 2.0)).to_degrees();
            return self.rotate_forever(angular);
        }

        let (left, right) = steer_speeds(turn_rate, speed);
        self.run_forever([self.linear_pulses(left), self.linear_pulses(right)])
    }

    /// Steers like [`DifferentialPilot::steer`] until the heading changed by `angle` degrees.
    ///
    /// The direction of the turn comes from the turn rate, so the sign of `angle` is ignored.
    ///
    /// # Errors
    ///
    /// - A [`NavigationError::ZeroTurnRate`] error is returned if `turn_rate` is zero.
    /// - Errors from writing to the motors are returned.
    pub fn steer_angle(
        &self,
        turn_rate: f64,
        angle: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        ensure!(turn_rate != 0.0, ZeroTurnRateSnafu);
        let radius = turn_radius(turn_rate, self.track_width);
        self.arc(radius, turn_rate.signum() * angle.abs(), speed, callbacks)
    }
}

impl Pilot for DifferentialPilot {
    fn travel_speed(&self) -> f64 {
        self.travel_speed
    }

    fn set_travel_speed(&mut self, speed: f64) {
        self.travel_speed = speed.abs();
    }

    fn rotate_speed(&self) -> f64 {
        self.rotate_speed
    }

    fn set_rotate_speed(&mut self, speed: f64) {
        self.rotate_speed = speed.abs();
    }

    fn drive(&self, speed: Option<f64>) -> Result<(), NavigationError> {
        let pulses_per_sec = self.linear_pulses(speed.unwrap_or(self.travel_speed));
        self.run_forever([pulses_per_sec; 2])
    }

    fn stop(&self, command: Option<StopCommand>) -> Result<(), NavigationError> {
        for motor in self.motors.iter() {
            motor.stop(command)?;
        }
        Ok(())
    }

    fn travel(
        &self,
        distance: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        let pulses = self.linear_pulses(distance);
        let pulses_per_sec = self.linear_pulses(speed.unwrap_or(self.travel_speed));
        self.run_to_rel_pos([(pulses, pulses_per_sec); 2], callbacks)
    }

    fn rotate(
        &self,
        angle: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        let pulses = self.angular_pulses(angle);
        let pulses_per_sec = self.angular_pulses(speed.unwrap_or(self.rotate_speed).abs());
        self.run_to_rel_pos(
            [(-pulses, pulses_per_sec), (pulses, pulses_per_sec)],
            callbacks,
        )
    }
}

#[cfg(test)]
mod test {
    use std::{
        f64::consts::PI,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use ev3dev_core::mock::MockSysfs;
    use ev3dev_devices::{PluggedDevice, motor::PositionControl};

    use super::*;
    use crate::MotionOutcome;

    // With these dimensions a pulse is one distance unit and one degree of heading.
    const WHEEL: f64 = 360.0 / PI;
    const TRACK: f64 = 360.0 / PI;

    fn robot(reverse: bool) -> (MockSysfs, DifferentialPilot) {
        let sysfs = MockSysfs::new().unwrap();
        for (name, port) in [("motor0", "outB"), ("motor1", "outC")] {
            sysfs
                .add_device(
                    "tacho-motor",
                    name,
                    &[
                        ("port_name", port),
                        ("count_per_rot", "360"),
                        ("command", ""),
                        ("polarity", "normal"),
                        ("duty_cycle_sp", "0"),
                        ("speed_regulation", "off"),
                        ("stop_command", "coast"),
                        ("ramp_up_sp", "0"),
                        ("ramp_down_sp", "0"),
                        ("position", "0"),
                        ("position_sp", "0"),
                        ("speed_sp", "0"),
                        ("state", "holding"),
                    ],
                )
                .unwrap();
        }

        let left = TachoMotor::new_in(&sysfs.root(), Some("outB")).unwrap();
        let right = TachoMotor::new_in(&sysfs.root(), Some("outC")).unwrap();
        let pilot = DifferentialPilot::new(
            WHEEL,
            TRACK,
            left,
            right,
            reverse,
            &MotorSettings::new().ramp_up_sp(200),
        )
        .unwrap();
        (sysfs, pilot)
    }

    fn get(sysfs: &MockSysfs, motor: &str, attribute: &str) -> String {
        sysfs.get("tacho-motor", motor, attribute).unwrap()
    }

    fn assert_wheels(pilot: &DifferentialPilot, position_sp: [i32; 2], speed_sp: [i32; 2]) {
        assert_eq!(
            [pilot.left().position_sp().unwrap(), pilot.right().position_sp().unwrap()],
            position_sp
        );
        assert_eq!(
            [pilot.left().speed_sp().unwrap(), pilot.right().speed_sp().unwrap()],
            speed_sp
        );
    }

    #[test]
    fn turn_rate_math() {
        assert_eq!(steer_speeds(100.0, 80.0), (0.0, 80.0));
        assert_eq!(steer_speeds(-25.0, 80.0), (80.0, 60.0));
        assert_eq!(steer_speeds(500.0, 80.0), (-80.0, 80.0));

        assert!((turn_radius(100.0, 10.0) - 5.0).abs() < 1e-9);
        assert!((turn_radius(-50.0, 10.0) + 15.0).abs() < 1e-9);
        assert_eq!(turn_radius(200.0, 10.0), 0.0);
    }

    #[test]
    fn setup_writes_defaults() {
        let (sysfs, pilot) = robot(false);
        assert!((pilot.dist_per_pulse() - 1.0).abs() < 1e-9);
        assert!((pilot.rotation_per_pulse() - 1.0).abs() < 1e-9);

        for motor in ["motor0", "motor1"] {
            assert_eq!(get(&sysfs, motor, "command"), "reset");
            assert_eq!(get(&sysfs, motor, "duty_cycle_sp"), "100");
            assert_eq!(get(&sysfs, motor, "speed_regulation"), "on");
            assert_eq!(get(&sysfs, motor, "stop_command"), "hold");
            assert_eq!(get(&sysfs, motor, "ramp_up_sp"), "200");
            assert_eq!(get(&sysfs, motor, "ramp_down_sp"), "500");
            assert_eq!(get(&sysfs, motor, "polarity"), "normal");
        }

        let (sysfs, _) = robot(true);
        assert_eq!(get(&sysfs, "motor1", "polarity"), "inversed");
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let (sysfs, _) = robot(false);
        let left = TachoMotor::new_in(&sysfs.root(), Some("outB")).unwrap();
        let right = TachoMotor::new_in(&sysfs.root(), Some("outC")).unwrap();
        assert!(matches!(
            DifferentialPilot::new(0.0, TRACK, left, right, false, &MotorSettings::new()),
            Err(NavigationError::InvalidDimension { dimension: "wheel diameter", .. })
        ));
    }

    #[test]
    fn drive_and_stop() {
        let (sysfs, mut pilot) = robot(false);
        pilot.set_travel_speed(-30.0);
        assert_eq!(pilot.travel_speed(), 30.0);

        pilot.drive(Some(-50.0)).unwrap();
        assert_eq!(pilot.left().speed_sp().unwrap(), -50);
        assert_eq!(get(&sysfs, "motor0", "command"), "run-forever");

        pilot.backward(None).unwrap();
        assert_eq!(pilot.right().speed_sp().unwrap(), -30);
        pilot.forward(Some(-20.0)).unwrap();
        assert_eq!(pilot.right().speed_sp().unwrap(), 20);

        pilot.stop(Some(StopCommand::Brake)).unwrap();
        assert_eq!(get(&sysfs, "motor1", "command"), "stop");
        assert_eq!(get(&sysfs, "motor1", "stop_command"), "brake");
    }

    #[test]
    fn travel_runs_to_relative_position() {
        let (sysfs, mut pilot) = robot(false);
        pilot.set_travel_speed(100.0);

        let arrived = Arc::new(AtomicBool::new(false));
        let mut motion = pilot
            .travel(250.0, None, MotionCallbacks::new().on_complete({
                let arrived = Arc::clone(&arrived);
                move || arrived.store(true, Ordering::Release)
            }))
            .unwrap();

        assert_wheels(&pilot, [250, 250], [100, 100]);
        assert_eq!(get(&sysfs, "motor1", "command"), "run-to-rel-pos");
        assert_eq!(
            motion.wait(Some(Duration::from_secs(5))),
            Some(MotionOutcome::Completed)
        );
        assert!(arrived.load(Ordering::Acquire));
    }

    #[test]
    fn rotations() {
        let (sysfs, mut pilot) = robot(false);
        pilot.set_rotate_speed(45.0);

        pilot.rotate(90.0, None, MotionCallbacks::new()).unwrap().stop();
        assert_wheels(&pilot, [-90, 90], [45, 45]);

        pilot.rotate_right(30.0, Some(-60.0), MotionCallbacks::new()).unwrap().stop();
        assert_wheels(&pilot, [30, -30], [60, 60]);

        pilot.rotate_forever(-10.0).unwrap();
        assert_eq!(pilot.left().speed_sp().unwrap(), 10);
        assert_eq!(pilot.right().speed_sp().unwrap(), -10);
        assert_eq!(get(&sysfs, "motor0", "command"), "run-forever");
    }

    #[test]
    fn arcs() {
        let (_sysfs, mut pilot) = robot(false);
        pilot.set_rotate_speed(20.0);

        // Center of the arc one track width to the left: the inner wheel covers a third of
        // the outer wheel's distance.
        pilot.arc(TRACK, 90.0, Some(100.0), MotionCallbacks::new()).unwrap().stop();
        assert_wheels(&pilot, [90, 270], [50, 150]);

        pilot.arc(0.0, 45.0, Some(100.0), MotionCallbacks::new()).unwrap().stop();
        assert_wheels(&pilot, [-45, 45], [20, 20]);

        pilot
            .travel_arc(TRACK, TRACK * PI / 2.0, Some(100.0), MotionCallbacks::new())
            .unwrap()
            .stop();
        assert_wheels(&pilot, [90, 270], [50, 150]);

        assert!(matches!(
            pilot.travel_arc(0.0, 10.0, None, MotionCallbacks::new()),
            Err(NavigationError::ZeroRadius)
        ));
    }

    #[test]
    fn steering() {
        let (sysfs, pilot) = robot(false);

        pilot.steer(50.0, Some(100.0)).unwrap();
        assert_eq!(pilot.left().speed_sp().unwrap(), 50);
        assert_eq!(pilot.right().speed_sp().unwrap(), 100);
        assert_eq!(get(&sysfs, "motor1", "command"), "run-forever");

        pilot.steer(-300.0, Some(100.0)).unwrap();
        assert_eq!(pilot.left().speed_sp().unwrap(), 100);
        assert_eq!(pilot.right().speed_sp().unwrap(), -100);

        pilot.steer(0.0, Some(40.0)).unwrap();
        assert_eq!(pilot.right().speed_sp().unwrap(), 40);
    }

    #[test]
    fn steering_by_angle() {
        let (_sysfs, pilot) = robot(false);

        // Pivot on the left wheel.
        pilot
            .steer_angle(100.0, -90.0, Some(100.0), MotionCallbacks::new())
            .unwrap()
            .stop();
        assert_wheels(&pilot, [0, 180], [0, 200]);

        assert!(matches!(
            pilot.steer_angle(0.0, 90.0, None, MotionCallbacks::new()),
            Err(NavigationError::ZeroTurnRate)
        ));
    }
}
