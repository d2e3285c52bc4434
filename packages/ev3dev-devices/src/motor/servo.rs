//! Hobby servos.

use ev3dev_core::{Device, DeviceError, DeviceFilter};

use super::{Motor, PositionControl};
use crate::{PluggedDevice, SysfsDevice};

/// A hobby servo (class `servo-motor`).
///
/// The position setpoint ranges from -100 to 100 and is mapped onto the pulse widths between
/// [`ServoMotor::min_pulse_sp`] and [`ServoMotor::max_pulse_sp`].
#[derive(Debug)]
pub struct ServoMotor {
    device: Device,
}

impl ServoMotor {
    /// The sysfs class of servo motors.
    pub const CLASS: &str = "servo-motor";

    /// Returns the pulse width at position 100, in microseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn max_pulse_sp(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("max_pulse_sp")
    }

    /// Sets the pulse width at position 100, in microseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_max_pulse_sp(&self, us: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("max_pulse_sp", us)
    }

    /// Returns the pulse width at position 0, in microseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn mid_pulse_sp(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("mid_pulse_sp")
    }

    /// Sets the pulse width at position 0, in microseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_mid_pulse_sp(&self, us: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("mid_pulse_sp", us)
    }

    /// Returns the pulse width at position -100, in microseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn min_pulse_sp(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("min_pulse_sp")
    }

    /// Sets the pulse width at position -100, in microseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_min_pulse_sp(&self, us: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("min_pulse_sp", us)
    }

    /// Returns the time to sweep from -100 to 100, in milliseconds. Zero means as fast as
    /// possible.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn rate_sp(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("rate_sp")
    }

    /// Sets the time to sweep from -100 to 100, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_rate_sp(&self, ms: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("rate_sp", ms)
    }

    /// Drives the servo to its position setpoint.
    ///
    /// # Errors
    ///
    /// Errors from writing the command are returned.
    pub fn run(&self) -> Result<(), DeviceError> {
        self.device.set_command("run")
    }

    /// Removes power so the servo can be turned by hand.
    ///
    /// # Errors
    ///
    /// Errors from writing the command are returned.
    pub fn float(&self) -> Result<(), DeviceError> {
        self.device.set_command("float")
    }
}

impl SysfsDevice for ServoMotor {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl PluggedDevice for ServoMotor {
    fn filter(port: Option<&str>) -> DeviceFilter {
        DeviceFilter::new(Self::CLASS).name("motor*").port(port)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        Ok(Self { device })
    }
}

impl Motor for ServoMotor {}
impl PositionControl for ServoMotor {}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::motor::Polarity;

    #[test]
    fn sweep() {
        let sysfs = MockSysfs::new().unwrap();
        sysfs
            .add_device(
                "servo-motor",
                "motor5",
                &[
                    ("port_name", "in1:mux2"),
                    ("polarity", "normal"),
                    ("position_sp", "0"),
                    ("min_pulse_sp", "600"),
                    ("mid_pulse_sp", "1500"),
                    ("max_pulse_sp", "2400"),
                    ("rate_sp", "0"),
                    ("command", ""),
                ],
            )
            .unwrap();

        let servo = ServoMotor::new_in(&sysfs.root(), Some("in1:mux2")).unwrap();
        assert_eq!(servo.device_index(), Some(5));
        assert_eq!(servo.mid_pulse_sp().unwrap(), 1500);

        servo.set_polarity(Polarity::Inversed).unwrap();
        servo.set_rate_sp(1000).unwrap();
        servo.set_position_sp(-100).unwrap();
        servo.run().unwrap();

        assert_eq!(servo.polarity().unwrap(), Polarity::Inversed);
        assert_eq!(sysfs.get("servo-motor", "motor5", "command").unwrap(), "run");

        servo.float().unwrap();
        assert_eq!(sysfs.get("servo-motor", "motor5", "command").unwrap(), "float");
    }
}
