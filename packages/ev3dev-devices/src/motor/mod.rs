//! Motors.
//!
//! ev3dev splits motors into three classes:
//!
//! - [`DcMotor`] (`dc-motor`): plain DC motors without an encoder, driven by duty cycle.
//! - [`TachoMotor`] (`tacho-motor`): motors with a tachometer, such as the EV3 large and medium
//!   motors. They can regulate their speed and run to a position.
//! - [`ServoMotor`] (`servo-motor`): hobby servos driven by pulse width.
//!
//! Behaviour common to several classes lives in the [`Motor`], [`DutyCycleMotor`] and
//! [`PositionControl`] traits.
//!
//! # Settings
//!
//! Every run command can be given a set of [`MotorSettings`] that are written to the motor
//! right before the command:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use ev3dev_devices::{
//!     PluggedDevice,
//!     motor::{DutyCycleMotor, MotorSettings, StopCommand, TachoMotor},
//! };
//!
//! let motor = TachoMotor::new(Some("outB")).unwrap();
//! motor
//!     .run_timed(
//!         Duration::from_secs(2),
//!         &MotorSettings::new()
//!             .duty_cycle_sp(60)
//!             .stop_command(StopCommand::Brake),
//!     )
//!     .unwrap();
//! ```

mod dc;
mod servo;
mod tacho;

use std::{fmt, str::FromStr, time::Duration};

use bitflags::bitflags;
pub use dc::DcMotor;
use ev3dev_core::{Device, DeviceError};
pub use servo::ServoMotor;
pub use tacho::{LargeMotor, MediumMotor, PidConstants, TachoMotor};

use crate::SysfsDevice;

/// The direction a positive duty cycle or speed turns the motor.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Polarity {
    /// Positive values turn the motor clockwise.
    Normal,

    /// Positive values turn the motor counter-clockwise.
    Inversed,
}

impl Polarity {
    /// The sysfs name of the polarity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Inversed => "inversed",
        }
    }
}

impl core::ops::Not for Polarity {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Normal => Self::Inversed,
            Self::Inversed => Self::Normal,
        }
    }
}

impl FromStr for Polarity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "inversed" => Ok(Self::Inversed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a motor does once it stops.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StopCommand {
    /// Power is removed and the motor coasts to a stop.
    Coast,

    /// The motor windings are shorted, stopping it faster than coasting.
    Brake,

    /// The motor actively holds its position. Only tacho motors support this.
    Hold,
}

impl StopCommand {
    /// The sysfs name of the stop command.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Coast => "coast",
            Self::Brake => "brake",
            Self::Hold => "hold",
        }
    }
}

impl FromStr for StopCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coast" => Ok(Self::Coast),
            "brake" => Ok(Self::Brake),
            "hold" => Ok(Self::Hold),
            _ => Err(()),
        }
    }
}

impl fmt::Display for StopCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// The state flags reported by a motor.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct MotorState: u8 {
        /// Power is being sent to the motor.
        const RUNNING = 0x01;

        /// The motor is ramping up or down.
        const RAMPING = 0x02;

        /// The motor is not turning, but actively holding its position.
        const HOLDING = 0x04;

        /// The motor is not turning although it should be.
        const STALLED = 0x08;

        /// The motor is drawing more current than it should.
        const OVERLOADED = 0x10;
    }
}

impl MotorState {
    /// Parses the whitespace separated `state` attribute. Unknown flags are ignored.
    #[must_use]
    pub fn parse(state: &str) -> Self {
        state
            .split_whitespace()
            .filter_map(|flag| match flag {
                "running" => Some(Self::RUNNING),
                "ramping" => Some(Self::RAMPING),
                "holding" => Some(Self::HOLDING),
                "stalled" => Some(Self::STALLED),
                "overloaded" => Some(Self::OVERLOADED),
                _ => None,
            })
            .collect()
    }
}

/// Setpoints written to a motor before a command is sent.
///
/// Only the fields that are set are written, in a fixed order: polarity, speed regulation,
/// stop command, ramps, duty cycle, speed, time.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct MotorSettings {
    /// Value for `polarity`.
    pub polarity: Option<Polarity>,
    /// Value for `speed_regulation`.
    pub speed_regulation: Option<bool>,
    /// Value for `stop_command`.
    pub stop_command: Option<StopCommand>,
    /// Value for `ramp_up_sp`, in milliseconds.
    pub ramp_up_sp: Option<i32>,
    /// Value for `ramp_down_sp`, in milliseconds.
    pub ramp_down_sp: Option<i32>,
    /// Value for `duty_cycle_sp`, in percent.
    pub duty_cycle_sp: Option<i32>,
    /// Value for `speed_sp`, in tacho counts per second.
    pub speed_sp: Option<i32>,
    /// Value for `time_sp`, in milliseconds.
    pub time_sp: Option<i32>,
}

impl MotorSettings {
    /// Creates settings that write nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            polarity: None,
            speed_regulation: None,
            stop_command: None,
            ramp_up_sp: None,
            ramp_down_sp: None,
            duty_cycle_sp: None,
            speed_sp: None,
            time_sp: None,
        }
    }

    /// Sets the polarity.
    #[must_use]
    pub const fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = Some(polarity);
        self
    }

    /// Turns speed regulation on or off.
    #[must_use]
    pub const fn speed_regulation(mut self, enabled: bool) -> Self {
        self.speed_regulation = Some(enabled);
        self
    }

    /// Sets the stop command.
    #[must_use]
    pub const fn stop_command(mut self, command: StopCommand) -> Self {
        self.stop_command = Some(command);
        self
    }

    /// Sets the ramp up time in milliseconds.
    #[must_use]
    pub const fn ramp_up_sp(mut self, ms: i32) -> Self {
        self.ramp_up_sp = Some(ms);
        self
    }

    /// Sets the ramp down time in milliseconds.
    #[must_use]
    pub const fn ramp_down_sp(mut self, ms: i32) -> Self {
        self.ramp_down_sp = Some(ms);
        self
    }

    /// Sets the duty cycle setpoint in percent.
    #[must_use]
    pub const fn duty_cycle_sp(mut self, duty_cycle: i32) -> Self {
        self.duty_cycle_sp = Some(duty_cycle);
        self
    }

    /// Sets the speed setpoint in tacho counts per second.
    #[must_use]
    pub const fn speed_sp(mut self, speed: i32) -> Self {
        self.speed_sp = Some(speed);
        self
    }

    /// Sets the run time in milliseconds.
    #[must_use]
    pub const fn time_sp(mut self, ms: i32) -> Self {
        self.time_sp = Some(ms);
        self
    }

    /// Returns these settings with every field set in `overrides` replaced.
    #[must_use]
    pub fn merge(self, overrides: &Self) -> Self {
        Self {
            polarity: overrides.polarity.or(self.polarity),
            speed_regulation: overrides.speed_regulation.or(self.speed_regulation),
            stop_command: overrides.stop_command.or(self.stop_command),
            ramp_up_sp: overrides.ramp_up_sp.or(self.ramp_up_sp),
            ramp_down_sp: overrides.ramp_down_sp.or(self.ramp_down_sp),
            duty_cycle_sp: overrides.duty_cycle_sp.or(self.duty_cycle_sp),
            speed_sp: overrides.speed_sp.or(self.speed_sp),
            time_sp: overrides.time_sp.or(self.time_sp),
        }
    }

    /// Writes the set fields to a motor.
    ///
    /// # Errors
    ///
    /// The first failed write is returned. Writing a setpoint the motor class does not have
    /// (`speed_sp` on a DC motor) fails with [`DeviceError::MissingAttribute`].
    pub fn apply(&self, device: &Device) -> Result<(), DeviceError> {
        if let Some(polarity) = self.polarity {
            device.set_attr_string("polarity", polarity.as_str())?;
        }
        if let Some(enabled) = self.speed_regulation {
            device.set_attr_string("speed_regulation", if enabled { "on" } else { "off" })?;
        }
        if let Some(command) = self.stop_command {
            device.set_attr_string("stop_command", command.as_str())?;
        }

        let setpoints = [
            ("ramp_up_sp", self.ramp_up_sp),
            ("ramp_down_sp", self.ramp_down_sp),
            ("duty_cycle_sp", self.duty_cycle_sp),
            ("speed_sp", self.speed_sp),
            ("time_sp", self.time_sp),
        ];
        for (attribute, value) in setpoints {
            if let Some(value) = value {
                device.set_attr_int(attribute, value)?;
            }
        }

        Ok(())
    }
}

/// Functionality shared by every motor class.
pub trait Motor: SysfsDevice {
    /// Returns the motor polarity.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn polarity(&self) -> Result<Polarity, DeviceError> {
        self.device().attr_parse("polarity")
    }

    /// Sets the motor polarity.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_polarity(&self, polarity: Polarity) -> Result<(), DeviceError> {
        self.device().set_attr_string("polarity", polarity.as_str())
    }

    /// Returns the current state flags.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn state(&self) -> Result<MotorState, DeviceError> {
        Ok(MotorState::parse(&self.device().attr_string("state")?))
    }

    /// Writes a set of [`MotorSettings`] to the motor.
    ///
    /// # Errors
    ///
    /// See [`MotorSettings::apply`].
    fn apply(&self, settings: &MotorSettings) -> Result<(), DeviceError> {
        settings.apply(self.device())
    }
}

/// Duty cycle control, shared by DC and tacho motors.
pub trait DutyCycleMotor: Motor {
    /// Returns the duty cycle currently applied, in percent.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn duty_cycle(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("duty_cycle")
    }

    /// Returns the duty cycle setpoint, in percent.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn duty_cycle_sp(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("duty_cycle_sp")
    }

    /// Sets the duty cycle setpoint, from -100 to 100.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_duty_cycle_sp(&self, duty_cycle: i32) -> Result<(), DeviceError> {
        self.device().set_attr_int("duty_cycle_sp", duty_cycle)
    }

    /// Returns the ramp up time, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn ramp_up_sp(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("ramp_up_sp")
    }

    /// Sets the ramp up time, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_ramp_up_sp(&self, ms: i32) -> Result<(), DeviceError> {
        self.device().set_attr_int("ramp_up_sp", ms)
    }

    /// Returns the ramp down time, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn ramp_down_sp(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("ramp_down_sp")
    }

    /// Sets the ramp down time, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_ramp_down_sp(&self, ms: i32) -> Result<(), DeviceError> {
        self.device().set_attr_int("ramp_down_sp", ms)
    }

    /// Returns what the motor does when stopped.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn stop_command(&self) -> Result<StopCommand, DeviceError> {
        self.device().attr_parse("stop_command")
    }

    /// Sets what the motor does when stopped.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_stop_command(&self, command: StopCommand) -> Result<(), DeviceError> {
        self.device().set_attr_string("stop_command", command.as_str())
    }

    /// Returns the stop commands the driver supports.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn stop_commands(&self) -> Result<Vec<String>, DeviceError> {
        self.device().attr_set("stop_commands")
    }

    /// Returns the run time used by `run-timed`, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn time_sp(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("time_sp")
    }

    /// Sets the run time used by `run-timed`, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_time_sp(&self, ms: i32) -> Result<(), DeviceError> {
        self.device().set_attr_int("time_sp", ms)
    }

    /// Runs the motor until another command is sent.
    ///
    /// # Errors
    ///
    /// Errors from writing the settings or the command are returned.
    fn run_forever(&self, settings: &MotorSettings) -> Result<(), DeviceError> {
        self.apply(settings)?;
        self.device().set_command("run-forever")
    }

    /// Runs the motor for `time`, then stops it with its stop command.
    ///
    /// # Errors
    ///
    /// Errors from writing the settings or the command are returned.
    fn run_timed(&self, time: Duration, settings: &MotorSettings) -> Result<(), DeviceError> {
        self.apply(&settings.time_sp(time.as_millis().min(i32::MAX as u128) as i32))?;
        self.device().set_command("run-timed")
    }

    /// Runs the motor at `duty_cycle`. Later changes of the duty cycle setpoint take effect
    /// immediately.
    ///
    /// # Errors
    ///
    /// Errors from writing the setpoint or the command are returned.
    fn run_direct(&self, duty_cycle: i32) -> Result<(), DeviceError> {
        self.set_duty_cycle_sp(duty_cycle)?;
        self.device().set_command("run-direct")
    }

    /// Stops the motor, with `command` if given or its configured stop command otherwise.
    ///
    /// # Errors
    ///
    /// Errors from writing the stop command or the command are returned.
    fn stop(&self, command: Option<StopCommand>) -> Result<(), DeviceError> {
        if let Some(command) = command {
            self.set_stop_command(command)?;
        }
        self.device().set_command("stop")
    }
}

/// Position setpoint, shared by tacho and servo motors.
pub trait PositionControl: Motor {
    /// Returns the position setpoint.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    fn position_sp(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("position_sp")
    }

    /// Sets the position setpoint.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    fn set_position_sp(&self, position: i32) -> Result<(), DeviceError> {
        self.device().set_attr_int("position_sp", position)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_flags() {
        assert_eq!(MotorState::parse(""), MotorState::empty());
        assert_eq!(
            MotorState::parse("running ramping"),
            MotorState::RUNNING | MotorState::RAMPING
        );
        assert_eq!(
            MotorState::parse("holding stalled overloaded bogus"),
            MotorState::HOLDING | MotorState::STALLED | MotorState::OVERLOADED
        );
    }

    #[test]
    fn settings_merge_prefers_overrides() {
        let defaults = MotorSettings::new()
            .duty_cycle_sp(100)
            .speed_regulation(true)
            .stop_command(StopCommand::Hold);
        let merged = defaults.merge(&MotorSettings::new().stop_command(StopCommand::Brake));

        assert_eq!(merged.duty_cycle_sp, Some(100));
        assert_eq!(merged.speed_regulation, Some(true));
        assert_eq!(merged.stop_command, Some(StopCommand::Brake));
        assert_eq!(merged.time_sp, None);
    }

    #[test]
    fn polarity_names() {
        assert_eq!("inversed".parse(), Ok(Polarity::Inversed));
        assert_eq!(!Polarity::Normal, Polarity::Inversed);
        assert!("reversed".parse::<Polarity>().is_err());
    }
}
