//! Whatever platform the program runs on.
//!
//! Programs that should run on both the EV3 and the BrickPi pick the port names and LEDs of
//! the [detected](current_platform) platform from here.

use ev3dev_core::{DeviceError, Platform, SysfsRoot};

use crate::{brickpi, ev3};

/// Detects the platform, see [`Platform::detect`].
#[must_use]
pub fn current_platform() -> Platform {
    Platform::detect()
}

/// Returns the output port names `A` to `D` of a platform.
#[must_use]
pub const fn output_ports(platform: Platform) -> Option<[&'static str; 4]> {
    match platform {
        Platform::Ev3 => Some([ev3::OUTPUT_A, ev3::OUTPUT_B, ev3::OUTPUT_C, ev3::OUTPUT_D]),
        Platform::BrickPi => Some([
            brickpi::OUTPUT_A,
            brickpi::OUTPUT_B,
            brickpi::OUTPUT_C,
            brickpi::OUTPUT_D,
        ]),
        Platform::Unsupported => None,
    }
}

/// Returns the input port names `1` to `4` of a platform.
#[must_use]
pub const fn input_ports(platform: Platform) -> Option<[&'static str; 4]> {
    match platform {
        Platform::Ev3 => Some([ev3::INPUT_1, ev3::INPUT_2, ev3::INPUT_3, ev3::INPUT_4]),
        Platform::BrickPi => Some([
            brickpi::INPUT_1,
            brickpi::INPUT_2,
            brickpi::INPUT_3,
            brickpi::INPUT_4,
        ]),
        Platform::Unsupported => None,
    }
}

/// The LEDs of the platform.
#[derive(Debug)]
pub enum Leds {
    /// Red and green LEDs of the EV3.
    Ev3(ev3::Leds),
    /// Blue LEDs of the BrickPi.
    BrickPi(brickpi::Leds),
}

impl Leds {
    /// Binds the LEDs of the detected platform, or returns `None` on an unsupported one.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if an LED is missing.
    pub fn new() -> Result<Option<Self>, DeviceError> {
        Self::new_in(current_platform(), &SysfsRoot::from_env())
    }

    /// Binds the LEDs of `platform` under `root`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if an LED is missing.
    pub fn new_in(platform: Platform, root: &SysfsRoot) -> Result<Option<Self>, DeviceError> {
        Ok(match platform {
            Platform::Ev3 => Some(Self::Ev3(ev3::Leds::new_in(root)?)),
            Platform::BrickPi => Some(Self::BrickPi(brickpi::Leds::new_in(root)?)),
            Platform::Unsupported => None,
        })
    }

    /// Turns every LED off.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn all_off(&self) -> Result<(), DeviceError> {
        match self {
            Self::Ev3(leds) => leds.all_off(),
            Self::BrickPi(leds) => leds.all_off(),
        }
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    #[test]
    fn ports_by_platform() {
        assert_eq!(output_ports(Platform::Ev3).unwrap()[1], "outB");
        assert_eq!(input_ports(Platform::BrickPi).unwrap()[3], "ttyAMA0:in4");
        assert!(output_ports(Platform::Unsupported).is_none());
    }

    #[test]
    fn leds_by_platform() {
        let sysfs = MockSysfs::new().unwrap();
        for name in ["brickpi1:blue:ev3dev", "brickpi2:blue:ev3dev"] {
            sysfs
                .add_device("leds", name, &[("max_brightness", "1"), ("brightness", "1")])
                .unwrap();
        }

        assert!(Leds::new_in(Platform::Unsupported, &sysfs.root()).unwrap().is_none());
        assert!(Leds::new_in(Platform::Ev3, &sysfs.root()).is_err());

        let leds = Leds::new_in(Platform::BrickPi, &sysfs.root()).unwrap().unwrap();
        leds.all_off().unwrap();
        assert_eq!(
            sysfs.get("leds", "brickpi2:blue:ev3dev", "brightness").unwrap(),
            "0"
        );
    }
}
