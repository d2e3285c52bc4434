//! The Dexter Industries BrickPi.
//!
//! Ports are reached through the Raspberry Pi serial port, hence the `ttyAMA0:` prefix. The
//! board has two blue LEDs and no buttons.

use ev3dev_core::{DeviceError, SysfsRoot};

use crate::led::Led;

/// Output port A.
pub const OUTPUT_A: &str = "ttyAMA0:outA";
/// Output port B.
pub const OUTPUT_B: &str = "ttyAMA0:outB";
/// Output port C.
pub const OUTPUT_C: &str = "ttyAMA0:outC";
/// Output port D.
pub const OUTPUT_D: &str = "ttyAMA0:outD";

/// Input port 1.
pub const INPUT_1: &str = "ttyAMA0:in1";
/// Input port 2.
pub const INPUT_2: &str = "ttyAMA0:in2";
/// Input port 3.
pub const INPUT_3: &str = "ttyAMA0:in3";
/// Input port 4.
pub const INPUT_4: &str = "ttyAMA0:in4";

/// The two blue LEDs of the board.
#[derive(Debug)]
pub struct Leds {
    blue_one: Led,
    blue_two: Led,
}

impl Leds {
    /// Binds both LEDs under the configured sysfs root.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if an LED is missing.
    pub fn new() -> Result<Self, DeviceError> {
        Self::new_in(&SysfsRoot::from_env())
    }

    /// Binds both LEDs under `root`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if an LED is missing.
    pub fn new_in(root: &SysfsRoot) -> Result<Self, DeviceError> {
        Ok(Self {
            blue_one: Led::new_in(root, "brickpi1:blue:ev3dev")?,
            blue_two: Led::new_in(root, "brickpi2:blue:ev3dev")?,
        })
    }

    /// The first blue LED.
    #[must_use]
    pub const fn blue_one(&self) -> &Led {
        &self.blue_one
    }

    /// The second blue LED.
    #[must_use]
    pub const fn blue_two(&self) -> &Led {
        &self.blue_two
    }

    /// Sets the brightness fraction of both LEDs.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn mix_colors(&self, blue: f64) -> Result<(), DeviceError> {
        self.blue_one.set_brightness_pct(blue)?;
        self.blue_two.set_brightness_pct(blue)
    }

    /// Lights both LEDs at `pct` brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_blue(&self, pct: f64) -> Result<(), DeviceError> {
        self.mix_colors(pct)
    }

    /// Lights both LEDs at full brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn blue_on(&self) -> Result<(), DeviceError> {
        self.set_blue(1.0)
    }

    /// Turns both LEDs off.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn all_off(&self) -> Result<(), DeviceError> {
        self.blue_one.set_brightness(0)?;
        self.blue_two.set_brightness(0)
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    #[test]
    fn blue_leds() {
        let sysfs = MockSysfs::new().unwrap();
        for name in ["brickpi1:blue:ev3dev", "brickpi2:blue:ev3dev"] {
            sysfs
                .add_device("leds", name, &[("max_brightness", "1"), ("brightness", "0")])
                .unwrap();
        }

        let leds = Leds::new_in(&sysfs.root()).unwrap();
        leds.blue_on().unwrap();
        assert_eq!(leds.blue_two().brightness().unwrap(), 1);

        leds.all_off().unwrap();
        assert_eq!(leds.blue_one().brightness().unwrap(), 0);
    }
}
