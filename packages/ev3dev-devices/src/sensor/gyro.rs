use ev3dev_core::DeviceError;

/// Modes of the [`GyroSensor`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GyroMode {
    /// Angle in degrees (`GYRO-ANG`).
    Angle,
    /// Rotational speed in degrees per second (`GYRO-RATE`).
    Rate,
    /// Unfiltered rotational speed (`GYRO-FAS`).
    Fast,
    /// Angle and rotational speed (`GYRO-G&A`).
    AngleAndRate,
    /// Calibration (`GYRO-CAL`).
    Calibration,
}

impl GyroMode {
    /// The sysfs name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Angle => "GYRO-ANG",
            Self::Rate => "GYRO-RATE",
            Self::Fast => "GYRO-FAS",
            Self::AngleAndRate => "GYRO-G&A",
            Self::Calibration => "GYRO-CAL",
        }
    }
}

impl AsRef<str> for GyroMode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

driver_sensor!(
    /// The EV3 gyro sensor.
    GyroSensor,
    ["lego-ev3-gyro"]
);

impl GyroSensor {
    /// Returns the angle in degrees accumulated since the sensor was plugged in or switched to
    /// angle mode.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn angle(&self) -> Result<i32, DeviceError> {
        self.ensure_mode(GyroMode::Angle.as_str())?;
        self.value(0)
    }

    /// Returns the rotational speed in degrees per second.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn rate(&self) -> Result<i32, DeviceError> {
        self.ensure_mode(GyroMode::Rate.as_str())?;
        self.value(0)
    }
}
