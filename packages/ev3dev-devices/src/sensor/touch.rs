use ev3dev_core::DeviceError;

driver_sensor!(
    /// The EV3 or NXT touch sensor.
    TouchSensor,
    ["lego-ev3-touch", "lego-nxt-touch"]
);

impl TouchSensor {
    /// Determines whether the sensor is pressed.
    ///
    /// # Errors
    ///
    /// Errors from reading the value are returned.
    pub fn is_pressed(&self) -> Result<bool, DeviceError> {
        Ok(self.value(0)? != 0)
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::{PluggedDevice, sensor::test::add_sensor};

    #[test]
    fn pressed() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(&sysfs, "sensor0", "in1", "lego-nxt-touch", "TOUCH", &[]);

        let touch = TouchSensor::new_in(&sysfs.root(), Some("in1")).unwrap();
        assert!(!touch.is_pressed().unwrap());

        sysfs.set("lego-sensor", "sensor0", "value0", "1").unwrap();
        assert!(touch.is_pressed().unwrap());
    }
}
