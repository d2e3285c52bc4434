use ev3dev_core::DeviceError;

/// Modes of the [`InfraredSensor`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InfraredMode {
    /// Proximity, from 0 (near) to 100 (far) (`IR-PROX`).
    Proximity,
    /// Heading and distance of beacons on each channel (`IR-SEEK`).
    Seek,
    /// Buttons pressed on a remote, per channel (`IR-REMOTE`).
    Remote,
    /// Alternate remote mode (`IR-REM-A`).
    RemoteAlt,
    /// Calibration (`IR-CAL`).
    Calibration,
}

impl InfraredMode {
    /// The sysfs name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proximity => "IR-PROX",
            Self::Seek => "IR-SEEK",
            Self::Remote => "IR-REMOTE",
            Self::RemoteAlt => "IR-REM-A",
            Self::Calibration => "IR-CAL",
        }
    }
}

impl AsRef<str> for InfraredMode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

driver_sensor!(
    /// The EV3 infrared sensor.
    ///
    /// To read the buttons of an infrared remote, wrap the sensor in a
    /// [`RemoteControl`](super::RemoteControl).
    InfraredSensor,
    ["lego-ev3-ir"]
);

impl InfraredSensor {
    /// Returns the proximity of the closest object, from 0 (near) to 100 (far).
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn proximity(&self) -> Result<i32, DeviceError> {
        self.ensure_mode(InfraredMode::Proximity.as_str())?;
        self.value(0)
    }
}
