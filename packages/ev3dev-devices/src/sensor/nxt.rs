//! Analog NXT sensors.

use ev3dev_core::DeviceError;

/// Modes of the [`SoundSensor`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SoundMode {
    /// Sound pressure in decibels (`DB`).
    Db,
    /// A-weighted sound pressure (`DBA`).
    Dba,
}

impl SoundMode {
    /// The sysfs name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Db => "DB",
            Self::Dba => "DBA",
        }
    }
}

impl AsRef<str> for SoundMode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Modes of the [`LightSensor`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LightMode {
    /// Reflected light with the sensor's LED on (`REFLECT`).
    Reflect,
    /// Ambient light with the LED off (`AMBIENT`).
    Ambient,
}

impl LightMode {
    /// The sysfs name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reflect => "REFLECT",
            Self::Ambient => "AMBIENT",
        }
    }
}

impl AsRef<str> for LightMode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

driver_sensor!(
    /// The NXT sound sensor.
    SoundSensor,
    ["lego-nxt-sound"]
);

driver_sensor!(
    /// The NXT light sensor.
    LightSensor,
    ["lego-nxt-light"]
);

impl SoundSensor {
    /// Returns the sound pressure in percent.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn sound_pressure(&self) -> Result<f64, DeviceError> {
        self.ensure_mode(SoundMode::Db.as_str())?;
        self.float_value(0)
    }

    /// Returns the A-weighted sound pressure in percent.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn sound_pressure_low(&self) -> Result<f64, DeviceError> {
        self.ensure_mode(SoundMode::Dba.as_str())?;
        self.float_value(0)
    }
}

impl LightSensor {
    /// Returns the reflected light intensity in percent.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn reflected_light_intensity(&self) -> Result<f64, DeviceError> {
        self.ensure_mode(LightMode::Reflect.as_str())?;
        self.float_value(0)
    }

    /// Returns the ambient light intensity in percent.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn ambient_light_intensity(&self) -> Result<f64, DeviceError> {
        self.ensure_mode(LightMode::Ambient.as_str())?;
        self.float_value(0)
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::{PluggedDevice, sensor::test::add_sensor};

    #[test]
    fn light_modes() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor2",
            "in2",
            "lego-nxt-light",
            "REFLECT",
            &[("decimals", "1"), ("value0", "487")],
        );

        let sensor = LightSensor::new_in(&sysfs.root(), Some("in2")).unwrap();
        assert!((sensor.reflected_light_intensity().unwrap() - 48.7).abs() < 1e-9);

        sensor.ambient_light_intensity().unwrap();
        assert_eq!(sysfs.get("lego-sensor", "sensor2", "mode").unwrap(), "AMBIENT");
        assert!(SoundSensor::new_in(&sysfs.root(), Some("in2")).is_err());
    }
}
