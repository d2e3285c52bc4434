//! Power supplies (class `power_supply`).
//!
//! On the EV3 the battery is exposed as `legoev3-battery`. The kernel reports currents in
//! microamps and voltages in microvolts.

use ev3dev_core::{Device, DeviceError, DeviceFilter, SysfsRoot};

use crate::SysfsDevice;

/// A battery or other power source.
#[derive(Debug)]
pub struct PowerSupply {
    device: Device,
}

impl PowerSupply {
    /// The sysfs class of power supplies.
    pub const CLASS: &str = "power_supply";

    /// Binds the power supply whose name matches `name`, or the first one if `None`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if there is no such power supply.
    pub fn new(name: Option<&str>) -> Result<Self, DeviceError> {
        Self::new_in(&SysfsRoot::from_env(), name)
    }

    /// Binds the power supply whose name matches `name` under `root`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if there is no such power supply.
    pub fn new_in(root: &SysfsRoot, name: Option<&str>) -> Result<Self, DeviceError> {
        let device = DeviceFilter::new(Self::CLASS)
            .name(name.unwrap_or("*").to_owned())
            .open_in(root)?;
        Ok(Self::from_device(device))
    }

    /// Wraps an already bound entry.
    #[must_use]
    pub const fn from_device(device: Device) -> Self {
        Self { device }
    }

    /// Returns the measured current in microamps.
    ///
    /// # Errors
    ///
    /// Errors from reading `current_now` are returned.
    pub fn measured_current(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("current_now")
    }

    /// Returns the measured voltage in microvolts.
    ///
    /// # Errors
    ///
    /// Errors from reading `voltage_now` are returned.
    pub fn measured_voltage(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("voltage_now")
    }

    /// Returns the design maximum voltage in microvolts.
    ///
    /// # Errors
    ///
    /// Errors from reading `voltage_max_design` are returned.
    pub fn max_voltage(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("voltage_max_design")
    }

    /// Returns the design minimum voltage in microvolts.
    ///
    /// # Errors
    ///
    /// Errors from reading `voltage_min_design` are returned.
    pub fn min_voltage(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("voltage_min_design")
    }

    /// Returns the battery chemistry, such as `Li-ion` or `NiMH`.
    ///
    /// # Errors
    ///
    /// Errors from reading `technology` are returned.
    pub fn technology(&self) -> Result<String, DeviceError> {
        self.device.attr_string("technology")
    }

    /// Returns the supply type, such as `Battery` or `USB`.
    ///
    /// # Errors
    ///
    /// Errors from reading `type` are returned.
    pub fn supply_type(&self) -> Result<String, DeviceError> {
        self.device.attr_string("type")
    }

    /// Returns the measured current in amps.
    ///
    /// # Errors
    ///
    /// See [`PowerSupply::measured_current`].
    pub fn measured_amps(&self) -> Result<f64, DeviceError> {
        Ok(f64::from(self.measured_current()?) / 1e6)
    }

    /// Returns the measured voltage in volts.
    ///
    /// # Errors
    ///
    /// See [`PowerSupply::measured_voltage`].
    pub fn measured_volts(&self) -> Result<f64, DeviceError> {
        Ok(f64::from(self.measured_voltage()?) / 1e6)
    }
}

impl SysfsDevice for PowerSupply {
    fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    #[test]
    fn battery_readings() {
        let sysfs = MockSysfs::new().unwrap();
        sysfs
            .add_device(
                "power_supply",
                "legoev3-battery",
                &[
                    ("current_now", "182000"),
                    ("voltage_now", "7845000"),
                    ("voltage_max_design", "9000000"),
                    ("voltage_min_design", "4800000"),
                    ("technology", "Li-ion"),
                    ("type", "Battery"),
                ],
            )
            .unwrap();

        let battery = PowerSupply::new_in(&sysfs.root(), Some("legoev3-battery")).unwrap();
        assert!((battery.measured_amps().unwrap() - 0.182).abs() < 1e-9);
        assert!((battery.measured_volts().unwrap() - 7.845).abs() < 1e-9);
        assert_eq!(battery.max_voltage().unwrap(), 9_000_000);
        assert_eq!(battery.min_voltage().unwrap(), 4_800_000);
        assert_eq!(battery.technology().unwrap(), "Li-ion");
        assert_eq!(battery.supply_type().unwrap(), "Battery");
    }
}
