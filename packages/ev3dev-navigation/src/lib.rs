//! Pilots: high level motion control of a wheeled robot.
//!
//! A pilot hides the mechanics of the robot behind moves expressed in distances and heading
//! changes. Heading changes are in degrees, positive to the left (counter-clockwise).
//! Distances use the unit of the wheel diameter given when creating the pilot.
//!
//! Moves that end by themselves (such as [`Pilot::travel`]) return a [`MotionMonitor`]
//! watching the motors in the background:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use ev3dev_devices::{PluggedDevice, motor::{LargeMotor, MotorSettings}};
//! use ev3dev_navigation::{DifferentialPilot, MotionCallbacks, Pilot};
//!
//! let left = LargeMotor::new(Some("outB")).unwrap();
//! let right = LargeMotor::new(Some("outC")).unwrap();
//! let mut pilot = DifferentialPilot::new(43.2, 150.0, left, right, false, &MotorSettings::new())
//!     .unwrap();
//! pilot.set_travel_speed(100.0);
//!
//! let mut motion = pilot
//!     .travel(250.0, None, MotionCallbacks::new().on_complete(|| println!("arrived")))
//!     .unwrap();
//! motion.wait(Some(Duration::from_secs(10)));
//! ```

mod monitor;
mod pilot;

use ev3dev_core::DeviceError;
use ev3dev_devices::motor::StopCommand;
pub use monitor::{MotionCallbacks, MotionMonitor, MotionOutcome};
pub use pilot::{DifferentialPilot, steer_speeds, turn_radius};
use snafu::Snafu;

/// Errors that can occur when piloting a robot.
#[derive(Debug, Snafu)]
pub enum NavigationError {
    /// A robot dimension is zero or not finite.
    #[snafu(display("Invalid {dimension}: {value}"))]
    InvalidDimension {
        /// The dimension
        dimension: &'static str,
        /// The offending value
        value: f64,
    },

    /// An arc of zero radius cannot cover a distance.
    #[snafu(display("An arc of zero radius cannot cover a distance"))]
    ZeroRadius,

    /// A zero turn rate drives straight and never changes the heading.
    #[snafu(display("A zero turn rate never changes the heading"))]
    ZeroTurnRate,

    /// Generic device error.
    #[snafu(display("{source}"), context(false))]
    Device {
        /// The source of the error.
        source: DeviceError,
    },
}

/// Motion commands shared by every kind of pilot.
///
/// Speeds given as `None` fall back to the pilot's default travel or rotation speed.
pub trait Pilot {
    /// Returns the default travel speed, in distance units per second.
    fn travel_speed(&self) -> f64;

    /// Sets the default travel speed. The sign is discarded.
    fn set_travel_speed(&mut self, speed: f64);

    /// Returns the default rotation speed, in degrees per second.
    fn rotate_speed(&self) -> f64;

    /// Sets the default rotation speed. The sign is discarded.
    fn set_rotate_speed(&mut self, speed: f64);

    /// Travels straight until stopped, backwards if `speed` is negative.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn drive(&self, speed: Option<f64>) -> Result<(), NavigationError>;

    /// Travels forward until stopped, whatever the sign of the speed.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn forward(&self, speed: Option<f64>) -> Result<(), NavigationError> {
        self.drive(Some(speed.unwrap_or_else(|| self.travel_speed()).abs()))
    }

    /// Travels backward until stopped, whatever the sign of the speed.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn backward(&self, speed: Option<f64>) -> Result<(), NavigationError> {
        self.drive(Some(-speed.unwrap_or_else(|| self.travel_speed()).abs()))
    }

    /// Stops immediately, with `command` if given or the configured stop command otherwise.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn stop(&self, command: Option<StopCommand>) -> Result<(), NavigationError>;

    /// Travels `distance` in a straight line, backwards if negative.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn travel(
        &self,
        distance: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError>;

    /// Turns in place by `angle` degrees, counter-clockwise if positive.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn rotate(
        &self,
        angle: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError>;

    /// Turns left in place by `angle` degrees, whatever its sign.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn rotate_left(
        &self,
        angle: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        self.rotate(angle.abs(), speed, callbacks)
    }

    /// Turns right in place by `angle` degrees, whatever its sign.
    ///
    /// # Errors
    ///
    /// Errors from writing to the motors are returned.
    fn rotate_right(
        &self,
        angle: f64,
        speed: Option<f64>,
        callbacks: MotionCallbacks,
    ) -> Result<MotionMonitor, NavigationError> {
        self.rotate(-angle.abs(), speed, callbacks)
    }
}
