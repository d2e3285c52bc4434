use ev3dev_core::DeviceError;

use crate::SysfsDevice;

driver_sensor!(
    /// A third-party NXT I2C sensor.
    I2cSensor,
    ["nxt-i2c-sensor"]
);

impl I2cSensor {
    /// Returns the firmware version reported by the sensor.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn fw_version(&self) -> Result<String, DeviceError> {
        self.device().attr_string("fw_version")
    }

    /// Returns the polling period in milliseconds. Zero disables polling.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn poll_ms(&self) -> Result<i32, DeviceError> {
        self.device().attr_int("poll_ms")
    }

    /// Sets the polling period in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_poll_ms(&self, ms: i32) -> Result<(), DeviceError> {
        self.device().set_attr_int("poll_ms", ms)
    }
}
