//! Motors with a rotation sensor, driven by speed and position setpoints.

use std::ops::Deref;

use ev3dev_core::{Device, DeviceError, DeviceFilter};

use super::{DutyCycleMotor, Motor, MotorSettings, Polarity, PositionControl};
use crate::{PluggedDevice, SysfsDevice};

/// Proportional, integral and derivative constants of a motor control loop.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct PidConstants {
    /// The proportional constant.
    pub kp: i32,

    /// The integral constant.
    pub ki: i32,

    /// The derivative constant.
    pub kd: i32,
}

/// A motor with a tachometer (class `tacho-motor`).
///
/// Tacho motors count encoder pulses, which lets the driver regulate their speed and run them
/// to an absolute or relative position.
#[derive(Debug)]
pub struct TachoMotor {
    device: Device,
}

impl TachoMotor {
    /// The sysfs class of tacho motors.
    pub const CLASS: &str = "tacho-motor";

    fn driver_filter(port: Option<&str>, driver: &str) -> DeviceFilter {
        Self::filter(port).attribute("driver_name", [driver])
    }

    /// Returns the number of encoder pulses in one rotation.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn count_per_rot(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("count_per_rot")
    }

    /// Returns the encoder polarity.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn encoder_polarity(&self) -> Result<Polarity, DeviceError> {
        self.device.attr_parse("encoder_polarity")
    }

    /// Sets the encoder polarity.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_encoder_polarity(&self, polarity: Polarity) -> Result<(), DeviceError> {
        self.device
            .set_attr_string("encoder_polarity", polarity.as_str())
    }

    /// Returns the position in encoder pulses.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn position(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("position")
    }

    /// Overwrites the current position.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_position(&self, position: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("position", position)
    }

    /// Returns the speed in pulses per second.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn speed(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("speed")
    }

    /// Returns the speed setpoint, used when speed regulation is on.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn speed_sp(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("speed_sp")
    }

    /// Sets the speed setpoint in pulses per second.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_speed_sp(&self, speed: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("speed_sp", speed)
    }

    /// Determines whether the driver regulates the speed (`speed_sp`) rather than the duty
    /// cycle (`duty_cycle_sp`).
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn speed_regulation(&self) -> Result<bool, DeviceError> {
        Ok(self.device.attr_string("speed_regulation")? == "on")
    }

    /// Turns speed regulation on or off.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_speed_regulation(&self, enabled: bool) -> Result<(), DeviceError> {
        self.device
            .set_attr_string("speed_regulation", if enabled { "on" } else { "off" })
    }

    /// Returns the constants of the position holding loop.
    ///
    /// # Errors
    ///
    /// Errors from reading the attributes are returned.
    pub fn hold_pid(&self) -> Result<PidConstants, DeviceError> {
        self.pid("hold_pid")
    }

    /// Sets the constants of the position holding loop.
    ///
    /// # Errors
    ///
    /// Errors from writing the attributes are returned.
    pub fn set_hold_pid(&self, constants: PidConstants) -> Result<(), DeviceError> {
        self.set_pid("hold_pid", constants)
    }

    /// Returns the constants of the speed regulation loop.
    ///
    /// # Errors
    ///
    /// Errors from reading the attributes are returned.
    pub fn speed_pid(&self) -> Result<PidConstants, DeviceError> {
        self.pid("speed_pid")
    }

    /// Sets the constants of the speed regulation loop.
    ///
    /// # Errors
    ///
    /// Errors from writing the attributes are returned.
    pub fn set_speed_pid(&self, constants: PidConstants) -> Result<(), DeviceError> {
        self.set_pid("speed_pid", constants)
    }

    fn pid(&self, group: &str) -> Result<PidConstants, DeviceError> {
        Ok(PidConstants {
            kp: self.device.attr_int(&format!("{group}/Kp"))?,
            ki: self.device.attr_int(&format!("{group}/Ki"))?,
            kd: self.device.attr_int(&format!("{group}/Kd"))?,
        })
    }

    fn set_pid(&self, group: &str, constants: PidConstants) -> Result<(), DeviceError> {
        self.device.set_attr_int(&format!("{group}/Kp"), constants.kp)?;
        self.device.set_attr_int(&format!("{group}/Ki"), constants.ki)?;
        self.device.set_attr_int(&format!("{group}/Kd"), constants.kd)
    }

    /// Runs to an absolute position, then stops with the stop command.
    ///
    /// # Errors
    ///
    /// Errors from writing the settings, the setpoint or the command are returned.
    pub fn run_to_abs_pos(
        &self,
        position: i32,
        settings: &MotorSettings,
    ) -> Result<(), DeviceError> {
        self.apply(settings)?;
        self.set_position_sp(position)?;
        self.device.set_command("run-to-abs-pos")
    }

    /// Runs `position` pulses away from the current position, then stops with the stop
    /// command.
    ///
    /// # Errors
    ///
    /// Errors from writing the settings, the setpoint or the command are returned.
    pub fn run_to_rel_pos(
        &self,
        position: i32,
        settings: &MotorSettings,
    ) -> Result<(), DeviceError> {
        self.apply(settings)?;
        self.set_position_sp(position)?;
        self.device.set_command("run-to-rel-pos")
    }

    /// Stops the motor and resets every attribute to its default, including the position.
    ///
    /// # Errors
    ///
    /// Errors from writing the command are returned.
    pub fn reset(&self) -> Result<(), DeviceError> {
        self.device.set_command("reset")
    }
}

impl SysfsDevice for TachoMotor {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl PluggedDevice for TachoMotor {
    fn filter(port: Option<&str>) -> DeviceFilter {
        DeviceFilter::new(Self::CLASS).name("motor*").port(port)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        Ok(Self { device })
    }
}

impl Motor for TachoMotor {}
impl DutyCycleMotor for TachoMotor {}
impl PositionControl for TachoMotor {}

/// The EV3 large motor (driver `lego-ev3-l-motor`).
#[derive(Debug)]
pub struct LargeMotor(TachoMotor);

/// The EV3 medium motor (driver `lego-ev3-m-motor`).
#[derive(Debug)]
pub struct MediumMotor(TachoMotor);

impl LargeMotor {
    /// Kernel driver of the large motor.
    pub const DRIVER: &str = "lego-ev3-l-motor";

    /// Unwraps the generic tacho motor.
    #[must_use]
    pub fn into_inner(self) -> TachoMotor {
        self.0
    }
}

impl MediumMotor {
    /// Kernel driver of the medium motor.
    pub const DRIVER: &str = "lego-ev3-m-motor";

    /// Unwraps the generic tacho motor.
    #[must_use]
    pub fn into_inner(self) -> TachoMotor {
        self.0
    }
}

impl Deref for LargeMotor {
    type Target = TachoMotor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Deref for MediumMotor {
    type Target = TachoMotor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl SysfsDevice for LargeMotor {
    fn device(&self) -> &Device {
        &self.0.device
    }
}

impl SysfsDevice for MediumMotor {
    fn device(&self) -> &Device {
        &self.0.device
    }
}

impl PluggedDevice for LargeMotor {
    fn filter(port: Option<&str>) -> DeviceFilter {
        TachoMotor::driver_filter(port, Self::DRIVER)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        TachoMotor::from_device(device).map(Self)
    }
}

impl PluggedDevice for MediumMotor {
    fn filter(port: Option<&str>) -> DeviceFilter {
        TachoMotor::driver_filter(port, Self::DRIVER)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        TachoMotor::from_device(device).map(Self)
    }
}

impl From<LargeMotor> for TachoMotor {
    fn from(motor: LargeMotor) -> Self {
        motor.0
    }
}

impl From<MediumMotor> for TachoMotor {
    fn from(motor: MediumMotor) -> Self {
        motor.0
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::motor::{MotorState, StopCommand};

    fn add_motor(sysfs: &MockSysfs, name: &str, port: &str, driver: &str) {
        sysfs
            .add_device(
                "tacho-motor",
                name,
                &[
                    ("port_name", port),
                    ("driver_name", driver),
                    ("count_per_rot", "360"),
                    ("position", "0"),
                    ("position_sp", "0"),
                    ("speed_sp", "0"),
                    ("speed_regulation", "off"),
                    ("stop_command", "coast"),
                    ("state", ""),
                    ("command", ""),
                    ("hold_pid/Kp", "0"),
                    ("hold_pid/Ki", "0"),
                    ("hold_pid/Kd", "0"),
                ],
            )
            .unwrap();
    }

    #[test]
    fn large_and_medium_are_told_apart() {
        let sysfs = MockSysfs::new().unwrap();
        add_motor(&sysfs, "motor0", "outA", "lego-ev3-m-motor");
        add_motor(&sysfs, "motor1", "outB", "lego-ev3-l-motor");

        let large = LargeMotor::new_in(&sysfs.root(), None).unwrap();
        assert_eq!(large.port_name().unwrap(), "outB");

        let medium = MediumMotor::new_in(&sysfs.root(), None).unwrap();
        assert_eq!(medium.port_name().unwrap(), "outA");

        assert!(LargeMotor::new_in(&sysfs.root(), Some("outA")).is_err());
    }

    #[test]
    fn run_to_rel_pos_with_settings() {
        let sysfs = MockSysfs::new().unwrap();
        add_motor(&sysfs, "motor0", "outA", "lego-ev3-l-motor");
        let motor = TachoMotor::new_in(&sysfs.root(), Some("outA")).unwrap();

        motor
            .run_to_rel_pos(
                -720,
                &MotorSettings::new()
                    .speed_regulation(true)
                    .speed_sp(500)
                    .stop_command(StopCommand::Hold),
            )
            .unwrap();

        assert!(motor.speed_regulation().unwrap());
        assert_eq!(motor.speed_sp().unwrap(), 500);
        assert_eq!(motor.position_sp().unwrap(), -720);
        assert_eq!(motor.stop_command().unwrap(), StopCommand::Hold);
        assert_eq!(
            sysfs.get("tacho-motor", "motor0", "command").unwrap(),
            "run-to-rel-pos"
        );
    }

    #[test]
    fn pid_constants() {
        let sysfs = MockSysfs::new().unwrap();
        add_motor(&sysfs, "motor0", "outA", "lego-ev3-l-motor");
        let motor = TachoMotor::new_in(&sysfs.root(), None).unwrap();

        let constants = PidConstants {
            kp: 1000,
            ki: 60,
            kd: 0,
        };
        motor.set_hold_pid(constants).unwrap();
        assert_eq!(motor.hold_pid().unwrap(), constants);
        assert_eq!(
            sysfs.get("tacho-motor", "motor0", "hold_pid/Ki").unwrap(),
            "60"
        );
    }

    #[test]
    fn state_is_read_live() {
        let sysfs = MockSysfs::new().unwrap();
        add_motor(&sysfs, "motor0", "outA", "lego-ev3-l-motor");
        let motor = TachoMotor::new_in(&sysfs.root(), None).unwrap();

        assert!(motor.state().unwrap().is_empty());
        sysfs
            .set("tacho-motor", "motor0", "state", "running stalled")
            .unwrap();
        assert!(motor.state().unwrap().contains(MotorState::STALLED));
    }
}
