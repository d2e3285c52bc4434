//! DC motors driven by duty cycle alone.

use ev3dev_core::{Device, DeviceError, DeviceFilter};

use super::{DutyCycleMotor, Motor};
use crate::{PluggedDevice, SysfsDevice};

/// A DC motor without an encoder (class `dc-motor`).
///
/// Binding a DC motor sets its duty cycle setpoint to 75% so that run commands move it
/// without further setup.
#[derive(Debug)]
pub struct DcMotor {
    device: Device,
}

impl DcMotor {
    /// The sysfs class of DC motors.
    pub const CLASS: &str = "dc-motor";

    /// Duty cycle written when the motor is bound.
    pub const DEFAULT_DUTY_CYCLE: i32 = 75;
}

impl SysfsDevice for DcMotor {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl PluggedDevice for DcMotor {
    fn filter(port: Option<&str>) -> DeviceFilter {
        DeviceFilter::new(Self::CLASS).name("motor*").port(port)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        let motor = Self { device };
        motor.set_duty_cycle_sp(Self::DEFAULT_DUTY_CYCLE)?;
        Ok(motor)
    }
}

impl Motor for DcMotor {}
impl DutyCycleMotor for DcMotor {}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::motor::{MotorSettings, StopCommand};

    fn dc_motor(sysfs: &MockSysfs) -> DcMotor {
        sysfs
            .add_device(
                "dc-motor",
                "motor0",
                &[
                    ("port_name", "outC"),
                    ("duty_cycle_sp", "0"),
                    ("time_sp", "0"),
                    ("stop_command", "coast"),
                    ("command", ""),
                ],
            )
            .unwrap();
        DcMotor::new_in(&sysfs.root(), Some("outC")).unwrap()
    }

    #[test]
    fn binding_primes_the_duty_cycle() {
        let sysfs = MockSysfs::new().unwrap();
        let motor = dc_motor(&sysfs);
        assert_eq!(motor.duty_cycle_sp().unwrap(), 75);
    }

    #[test]
    fn run_timed_writes_time_first() {
        let sysfs = MockSysfs::new().unwrap();
        let motor = dc_motor(&sysfs);

        motor
            .run_timed(Duration::from_millis(1500), &MotorSettings::new().duty_cycle_sp(-40))
            .unwrap();
        assert_eq!(sysfs.get("dc-motor", "motor0", "time_sp").unwrap(), "1500");
        assert_eq!(sysfs.get("dc-motor", "motor0", "duty_cycle_sp").unwrap(), "-40");
        assert_eq!(sysfs.get("dc-motor", "motor0", "command").unwrap(), "run-timed");
    }

    #[test]
    fn stop_with_command() {
        let sysfs = MockSysfs::new().unwrap();
        let motor = dc_motor(&sysfs);

        motor.stop(Some(StopCommand::Brake)).unwrap();
        assert_eq!(motor.stop_command().unwrap(), StopCommand::Brake);
        assert_eq!(sysfs.get("dc-motor", "motor0", "command").unwrap(), "stop");
    }

    #[test]
    fn missing_setpoints_are_reported() {
        let sysfs = MockSysfs::new().unwrap();
        let motor = dc_motor(&sysfs);

        assert!(matches!(
            motor.run_forever(&MotorSettings::new().speed_sp(200)),
            Err(DeviceError::MissingAttribute { .. })
        ));
    }
}
