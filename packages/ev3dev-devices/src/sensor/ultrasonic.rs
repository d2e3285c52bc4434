use ev3dev_core::DeviceError;

/// Modes of the [`UltrasonicSensor`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum UltrasonicMode {
    /// Continuous distance in centimeters (`US-DIST-CM`).
    DistanceCm,
    /// Continuous distance in inches (`US-DIST-IN`).
    DistanceIn,
    /// Detects other ultrasonic sensors (`US-LISTEN`).
    Listen,
    /// Single distance measurement in centimeters (`US-SI-CM`).
    SingleCm,
    /// Single distance measurement in inches (`US-SI-IN`).
    SingleIn,
}

impl UltrasonicMode {
    /// The sysfs name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DistanceCm => "US-DIST-CM",
            Self::DistanceIn => "US-DIST-IN",
            Self::Listen => "US-LISTEN",
            Self::SingleCm => "US-SI-CM",
            Self::SingleIn => "US-SI-IN",
        }
    }
}

impl AsRef<str> for UltrasonicMode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

driver_sensor!(
    /// The EV3 or NXT ultrasonic sensor.
    UltrasonicSensor,
    ["lego-ev3-us", "lego-nxt-us"]
);

impl UltrasonicSensor {
    /// Returns the distance in centimeters.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn distance_centimeters(&self) -> Result<f64, DeviceError> {
        self.ensure_mode(UltrasonicMode::DistanceCm.as_str())?;
        self.float_value(0)
    }

    /// Returns the distance in inches.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn distance_inches(&self) -> Result<f64, DeviceError> {
        self.ensure_mode(UltrasonicMode::DistanceIn.as_str())?;
        self.float_value(0)
    }

    /// Determines whether another ultrasonic sensor is transmitting nearby.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn other_sensor_present(&self) -> Result<bool, DeviceError> {
        self.ensure_mode(UltrasonicMode::Listen.as_str())?;
        Ok(self.value(0)? != 0)
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::{PluggedDevice, SysfsDevice, sensor::test::add_sensor};

    #[test]
    fn binds_either_driver() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor0",
            "in1",
            "lego-ev3-touch",
            "TOUCH",
            &[],
        );
        add_sensor(
            &sysfs,
            "sensor1",
            "in4",
            "lego-nxt-us",
            "US-DIST-CM",
            &[("decimals", "1"), ("value0", "255")],
        );

        let sensor = UltrasonicSensor::new_in(&sysfs.root(), None).unwrap();
        assert_eq!(sensor.port_name().unwrap(), "in4");
        assert!((sensor.distance_centimeters().unwrap() - 25.5).abs() < 1e-9);
    }
}
