//! LEDs (class `leds`).
//!
//! An LED has a brightness between zero and its `max_brightness`, and a trigger that lets the
//! kernel drive it on its own (blinking with the `timer` trigger, pulsing with `heartbeat`).

use std::fmt;

use ev3dev_core::{Device, DeviceError, DeviceFilter, SysfsRoot};

use crate::SysfsDevice;

/// Kernel LED triggers used by the platform modules.
///
/// The full list supported by the kernel is returned by [`Led::triggers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The LED is driven only by its brightness.
    None,
    /// The LED is lit at full brightness.
    DefaultOn,
    /// The LED blinks, timed by `delay_on` and `delay_off`.
    Timer,
    /// The LED pulses like a heartbeat.
    Heartbeat,
}

impl Trigger {
    /// The kernel name of the trigger.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::DefaultOn => "default-on",
            Self::Timer => "timer",
            Self::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single LED.
#[derive(Debug)]
pub struct Led {
    device: Device,
}

impl Led {
    /// The sysfs class of LEDs.
    pub const CLASS: &str = "leds";

    /// Binds the LED whose entry name matches `name`, such as `ev3-left0:red:ev3dev`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if there is no such LED.
    pub fn new(name: &str) -> Result<Self, DeviceError> {
        Self::new_in(&SysfsRoot::from_env(), name)
    }

    /// Binds the LED whose entry name matches `name` under `root`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if there is no such LED.
    pub fn new_in(root: &SysfsRoot, name: &str) -> Result<Self, DeviceError> {
        let device = DeviceFilter::new(Self::CLASS)
            .name(name.to_owned())
            .open_in(root)?;
        Ok(Self::from_device(device))
    }

    /// Wraps an already bound entry.
    #[must_use]
    pub const fn from_device(device: Device) -> Self {
        Self { device }
    }

    /// Returns the highest brightness the LED supports.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn max_brightness(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("max_brightness")
    }

    /// Returns the brightness, between 0 and [`Led::max_brightness`].
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn brightness(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("brightness")
    }

    /// Sets the brightness.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_brightness(&self, brightness: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("brightness", brightness)
    }

    /// Returns the brightness as a fraction of [`Led::max_brightness`].
    ///
    /// # Errors
    ///
    /// Errors from reading either attribute are returned.
    pub fn brightness_pct(&self) -> Result<f64, DeviceError> {
        let max = self.max_brightness()?;
        if max == 0 {
            return Ok(0.0);
        }
        Ok(f64::from(self.brightness()?) / f64::from(max))
    }

    /// Sets the brightness as a fraction of [`Led::max_brightness`].
    ///
    /// Fractions outside of `0.0..=1.0` are clamped.
    ///
    /// # Errors
    ///
    /// Errors from reading the maximum or writing the brightness are returned.
    pub fn set_brightness_pct(&self, pct: f64) -> Result<(), DeviceError> {
        let max = self.max_brightness()?;
        let brightness = (pct * f64::from(max)).round().clamp(0.0, f64::from(max));
        self.set_brightness(brightness as i32)
    }

    /// Returns every trigger the kernel offers for this LED.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn triggers(&self) -> Result<Vec<String>, DeviceError> {
        self.device.attr_set("trigger")
    }

    /// Returns the active trigger, or `None` if the kernel marks none of them.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn trigger(&self) -> Result<Option<String>, DeviceError> {
        self.device.attr_selected("trigger")
    }

    /// Activates a trigger.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_trigger(&self, trigger: Trigger) -> Result<(), DeviceError> {
        self.set_trigger_name(trigger.as_str())
    }

    /// Activates a trigger by its kernel name, for triggers not listed in [`Trigger`].
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_trigger_name(&self, trigger: &str) -> Result<(), DeviceError> {
        self.device.set_attr_string("trigger", trigger)
    }

    /// Returns how long the LED stays on while blinking, in milliseconds.
    ///
    /// Only available while the [`Trigger::Timer`] trigger is active.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn delay_on(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("delay_on")
    }

    /// Sets how long the LED stays on while blinking, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_delay_on(&self, delay: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("delay_on", delay)
    }

    /// Returns how long the LED stays off while blinking, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn delay_off(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("delay_off")
    }

    /// Sets how long the LED stays off while blinking, in milliseconds.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned.
    pub fn set_delay_off(&self, delay: i32) -> Result<(), DeviceError> {
        self.device.set_attr_int("delay_off", delay)
    }
}

impl SysfsDevice for Led {
    fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    fn led(sysfs: &MockSysfs) -> Led {
        sysfs
            .add_device(
                "leds",
                "ev3-left0:red:ev3dev",
                &[
                    ("max_brightness", "255"),
                    ("brightness", "0"),
                    ("trigger", "[none] timer heartbeat default-on"),
                ],
            )
            .unwrap();
        Led::new_in(&sysfs.root(), "ev3-left0:red:ev3dev").unwrap()
    }

    #[test]
    fn brightness_pct_is_scaled_and_clamped() {
        let sysfs = MockSysfs::new().unwrap();
        let led = led(&sysfs);

        led.set_brightness_pct(0.5).unwrap();
        assert_eq!(led.brightness().unwrap(), 128);

        led.set_brightness_pct(1.7).unwrap();
        assert_eq!(led.brightness().unwrap(), 255);
        assert!((led.brightness_pct().unwrap() - 1.0).abs() < f64::EPSILON);

        led.set_brightness_pct(-1.0).unwrap();
        assert_eq!(led.brightness().unwrap(), 0);
    }

    #[test]
    fn triggers() {
        let sysfs = MockSysfs::new().unwrap();
        let led = led(&sysfs);

        assert_eq!(
            led.triggers().unwrap(),
            ["none", "timer", "heartbeat", "default-on"]
        );
        assert_eq!(led.trigger().unwrap().as_deref(), Some("none"));

        led.set_trigger(Trigger::Heartbeat).unwrap();
        assert_eq!(
            sysfs.get("leds", "ev3-left0:red:ev3dev", "trigger").unwrap(),
            "heartbeat"
        );
    }
}
