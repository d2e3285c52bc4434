//! Hardware abstractions for the devices of an ev3dev system.
//!
//! # Overview
//!
//! Each device type binds one entry of a sysfs device class and exposes its attributes as
//! typed getters and setters. Motors, sensors and ports are located by the port they are
//! plugged into:
//!
//! ```no_run
//! use ev3dev_devices::{PluggedDevice, motor::{DutyCycleMotor, MotorSettings, TachoMotor}};
//!
//! let motor = TachoMotor::new(Some("outA")).unwrap();
//! motor
//!     .run_forever(&MotorSettings::new().speed_sp(400).speed_regulation(true))
//!     .unwrap();
//! ```
//!
//! LEDs and power supplies are located by name instead. The platform modules ([`ev3`],
//! [`brickpi`] and [`auto`]) know the names used on each controller.
//!
//! The screen and sound modules do not go through sysfs: [`display`] maps the framebuffer and
//! [`sound`] drives the `beep`, `aplay` and `espeak` programs.

pub mod auto;
pub mod brickpi;
pub mod button;
pub mod display;
pub mod ev3;
pub mod led;
pub mod lego_port;
pub mod motor;
pub mod power_supply;
pub mod sensor;
pub mod sound;

use ev3dev_core::{Device, DeviceError, DeviceFilter, SysfsRoot};

/// Defines common functionality shared by every device bound to a sysfs entry.
pub trait SysfsDevice {
    /// Returns the bound sysfs entry.
    fn device(&self) -> &Device;

    /// Returns the entry name, such as `motor0`.
    fn name(&self) -> &str {
        self.device().name()
    }

    /// Returns the number at the end of the entry name.
    fn device_index(&self) -> Option<u32> {
        self.device().device_index()
    }

    /// Determines if the device is still plugged in.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ev3dev_devices::{PluggedDevice, SysfsDevice, sensor::TouchSensor};
    ///
    /// let touch = TouchSensor::new(Some("in1")).unwrap();
    /// if !touch.is_connected() {
    ///     println!("touch sensor was unplugged");
    /// }
    /// ```
    fn is_connected(&self) -> bool {
        self.device().is_connected()
    }

    /// Returns the name of the port the device is plugged into.
    ///
    /// # Errors
    ///
    /// Errors from reading the `port_name` attribute are returned.
    fn port_name(&self) -> Result<String, DeviceError> {
        self.device().port_name()
    }

    /// Returns the name of the kernel driver bound to the device.
    ///
    /// # Errors
    ///
    /// Errors from reading the `driver_name` attribute are returned.
    fn driver_name(&self) -> Result<String, DeviceError> {
        self.device().driver_name()
    }

    /// Returns the commands the driver accepts.
    ///
    /// # Errors
    ///
    /// Errors from reading the `commands` attribute are returned.
    fn commands(&self) -> Result<Vec<String>, DeviceError> {
        self.device().commands()
    }
}

/// A device located by the port it is plugged into.
pub trait PluggedDevice: SysfsDevice + Sized {
    /// Returns the filter selecting this kind of device, restricted to `port` if given.
    fn filter(port: Option<&str>) -> DeviceFilter;

    /// Wraps an already bound entry, performing any setup the device needs.
    ///
    /// # Errors
    ///
    /// Errors from the initial attribute writes are returned.
    fn from_device(device: Device) -> Result<Self, DeviceError>;

    /// Binds the first matching device under the configured sysfs root.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if no matching device is plugged in.
    fn new(port: Option<&str>) -> Result<Self, DeviceError> {
        Self::new_in(&SysfsRoot::from_env(), port)
    }

    /// Binds the first matching device under `root`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if no matching device is plugged in.
    fn new_in(root: &SysfsRoot, port: Option<&str>) -> Result<Self, DeviceError> {
        Self::from_device(Self::filter(port).open_in(root)?)
    }
}
