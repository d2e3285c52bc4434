//! Input and output ports (class `lego_port`).
//!
//! Ports can be switched between modes (for example to force an analog sensor driver) and can
//! be told which device driver to load for what is plugged in.

use ev3dev_core::{Device, DeviceError, DeviceFilter};

use crate::{PluggedDevice, SysfsDevice};

/// A physical port of the controller.
#[derive(Debug)]
pub struct LegoPort {
    device: Device,
}

impl LegoPort {
    /// The sysfs class of ports.
    pub const CLASS: &str = "lego_port";

    /// Returns the modes the port supports.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn modes(&self) -> Result<Vec<String>, DeviceError> {
        self.device.attr_set("modes")
    }

    /// Returns the current mode.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn mode(&self) -> Result<String, DeviceError> {
        self.device.attr_string("mode")
    }

    /// Switches the port to another mode.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_mode(&self, mode: &str) -> Result<(), DeviceError> {
        self.device.set_attr_string("mode", mode)
    }

    /// Loads a device driver for the port, when the port cannot detect the device itself.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_device(&self, driver: &str) -> Result<(), DeviceError> {
        self.device.set_attr_string("set_device", driver)
    }

    /// Returns the port status, usually the same as the mode.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn status(&self) -> Result<String, DeviceError> {
        self.device.attr_string("status")
    }
}

impl SysfsDevice for LegoPort {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl PluggedDevice for LegoPort {
    fn filter(port: Option<&str>) -> DeviceFilter {
        DeviceFilter::new(Self::CLASS).port(port)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        Ok(Self { device })
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    #[test]
    fn modes_and_driver() {
        let sysfs = MockSysfs::new().unwrap();
        sysfs
            .add_device(
                "lego_port",
                "port4",
                &[
                    ("port_name", "in1"),
                    ("modes", "auto nxt-analog nxt-color nxt-i2c other-uart"),
                    ("mode", "auto"),
                    ("status", "no-device"),
                    ("set_device", ""),
                ],
            )
            .unwrap();

        let port = LegoPort::new_in(&sysfs.root(), Some("in1")).unwrap();
        assert_eq!(port.modes().unwrap().len(), 5);
        assert_eq!(port.status().unwrap(), "no-device");

        port.set_mode("nxt-analog").unwrap();
        port.set_device("lego-nxt-touch").unwrap();
        assert_eq!(port.mode().unwrap(), "nxt-analog");
        assert_eq!(
            sysfs.get("lego_port", "port4", "set_device").unwrap(),
            "lego-nxt-touch"
        );
    }
}
