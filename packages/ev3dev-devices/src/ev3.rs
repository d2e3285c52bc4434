//! The LEGO MINDSTORMS EV3 brick.
//!
//! The EV3 has four output ports, four input ports, two bi-color (red and green) LEDs and six
//! buttons.

use std::ops::{Deref, DerefMut};

use ev3dev_core::{DeviceError, SysfsRoot};

use crate::{
    button::{ButtonError, ButtonManager, EvioButton, EvioButtons},
    led::{Led, Trigger},
};

/// Output port A.
pub const OUTPUT_A: &str = "outA";
/// Output port B.
pub const OUTPUT_B: &str = "outB";
/// Output port C.
pub const OUTPUT_C: &str = "outC";
/// Output port D.
pub const OUTPUT_D: &str = "outD";

/// Input port 1.
pub const INPUT_1: &str = "in1";
/// Input port 2.
pub const INPUT_2: &str = "in2";
/// Input port 3.
pub const INPUT_3: &str = "in3";
/// Input port 4.
pub const INPUT_4: &str = "in4";

/// A set of EV3 LEDs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LedGroup {
    /// Both red LEDs.
    Red,
    /// Both green LEDs.
    Green,
    /// The LEDs on the left side.
    Left,
    /// The LEDs on the right side.
    Right,
    /// All four LEDs.
    All,
}

/// The four LEDs of the brick.
///
/// Each side has a red and a green LED behind the same diffuser, so mixing both gives amber,
/// orange and yellow.
#[derive(Debug)]
pub struct Leds {
    red_left: Led,
    red_right: Led,
    green_left: Led,
    green_right: Led,
}

impl Leds {
    /// Binds the four LEDs under the configured sysfs root.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if an LED is missing.
    pub fn new() -> Result<Self, DeviceError> {
        Self::new_in(&SysfsRoot::from_env())
    }

    /// Binds the four LEDs under `root`.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::NotFound`] error is returned if an LED is missing.
    pub fn new_in(root: &SysfsRoot) -> Result<Self, DeviceError> {
        Ok(Self {
            red_left: Led::new_in(root, "ev3-left0:red:ev3dev")?,
            red_right: Led::new_in(root, "ev3-right0:red:ev3dev")?,
            green_left: Led::new_in(root, "ev3-left1:green:ev3dev")?,
            green_right: Led::new_in(root, "ev3-right1:green:ev3dev")?,
        })
    }

    /// The red LED on the left side.
    #[must_use]
    pub const fn red_left(&self) -> &Led {
        &self.red_left
    }

    /// The red LED on the right side.
    #[must_use]
    pub const fn red_right(&self) -> &Led {
        &self.red_right
    }

    /// The green LED on the left side.
    #[must_use]
    pub const fn green_left(&self) -> &Led {
        &self.green_left
    }

    /// The green LED on the right side.
    #[must_use]
    pub const fn green_right(&self) -> &Led {
        &self.green_right
    }

    /// Returns the LEDs of a group.
    #[must_use]
    pub fn group(&self, group: LedGroup) -> Vec<&Led> {
        match group {
            LedGroup::Red => vec![&self.red_left, &self.red_right],
            LedGroup::Green => vec![&self.green_left, &self.green_right],
            LedGroup::Left => vec![&self.red_left, &self.green_left],
            LedGroup::Right => vec![&self.red_right, &self.green_right],
            LedGroup::All => vec![
                &self.red_left,
                &self.red_right,
                &self.green_left,
                &self.green_right,
            ],
        }
    }

    /// Sets the brightness fraction of every LED in a group.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_brightness_pct(&self, group: LedGroup, pct: f64) -> Result<(), DeviceError> {
        self.group(group)
            .into_iter()
            .try_for_each(|led| led.set_brightness_pct(pct))
    }

    /// Activates a trigger on every LED in a group.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_trigger(&self, group: LedGroup, trigger: Trigger) -> Result<(), DeviceError> {
        self.group(group)
            .into_iter()
            .try_for_each(|led| led.set_trigger(trigger))
    }

    /// Sets the red and green brightness fractions of both sides.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn mix_colors(&self, red: f64, green: f64) -> Result<(), DeviceError> {
        self.set_brightness_pct(LedGroup::Red, red)?;
        self.set_brightness_pct(LedGroup::Green, green)
    }

    /// Lights the LEDs red at `pct` brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_red(&self, pct: f64) -> Result<(), DeviceError> {
        self.mix_colors(pct, 0.0)
    }

    /// Lights the LEDs green at `pct` brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_green(&self, pct: f64) -> Result<(), DeviceError> {
        self.mix_colors(0.0, pct)
    }

    /// Lights the LEDs amber (equal red and green) at `pct` brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_amber(&self, pct: f64) -> Result<(), DeviceError> {
        self.mix_colors(pct, pct)
    }

    /// Lights the LEDs orange (red-ish mix) at `pct` brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_orange(&self, pct: f64) -> Result<(), DeviceError> {
        self.mix_colors(pct, 0.5 * pct)
    }

    /// Lights the LEDs yellow (green-ish mix) at `pct` brightness.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn set_yellow(&self, pct: f64) -> Result<(), DeviceError> {
        self.mix_colors(0.5 * pct, pct)
    }

    /// Lights the LEDs full red.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn red_on(&self) -> Result<(), DeviceError> {
        self.set_red(1.0)
    }

    /// Lights the LEDs full green.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn green_on(&self) -> Result<(), DeviceError> {
        self.set_green(1.0)
    }

    /// Lights the LEDs full amber.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn amber_on(&self) -> Result<(), DeviceError> {
        self.set_amber(1.0)
    }

    /// Lights the LEDs full orange.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn orange_on(&self) -> Result<(), DeviceError> {
        self.set_orange(1.0)
    }

    /// Lights the LEDs full yellow.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn yellow_on(&self) -> Result<(), DeviceError> {
        self.set_yellow(1.0)
    }

    /// Turns every LED off and back to steady mode.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn all_off(&self) -> Result<(), DeviceError> {
        for led in self.group(LedGroup::All) {
            led.set_trigger(Trigger::DefaultOn)?;
            led.set_brightness(0)?;
        }
        Ok(())
    }

    /// Blinks a group, turning every other LED off.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn blink(&self, group: LedGroup, on_ms: i32, off_ms: i32) -> Result<(), DeviceError> {
        self.all_off()?;
        for led in self.group(group) {
            led.set_trigger(Trigger::Timer)?;
            led.set_delay_on(on_ms)?;
            led.set_delay_off(off_ms)?;
        }
        Ok(())
    }

    /// Stops blinking or pulsing, leaving every LED lit steadily.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn steady(&self) -> Result<(), DeviceError> {
        self.set_trigger(LedGroup::All, Trigger::DefaultOn)
    }

    /// Pulses every LED with the given red and green mix.
    ///
    /// # Errors
    ///
    /// The first failed write is returned.
    pub fn heartbeat(&self, red: f64, green: f64) -> Result<(), DeviceError> {
        self.steady()?;
        self.set_trigger(LedGroup::All, Trigger::Heartbeat)?;
        self.mix_colors(red, green)
    }
}

/// Input device reporting the brick buttons.
pub const BUTTONS_INPUT: &str = "/dev/input/by-path/platform-gpio-keys.0-event";

/// Name of the up button.
pub const UP: &str = "up";
/// Name of the down button.
pub const DOWN: &str = "down";
/// Name of the left button.
pub const LEFT: &str = "left";
/// Name of the right button.
pub const RIGHT: &str = "right";
/// Name of the enter (center) button.
pub const ENTER: &str = "enter";
/// Name of the back button.
pub const BACK: &str = "back";

/// Returns the definitions of the six brick buttons.
#[must_use]
pub fn button_definitions() -> Vec<EvioButton> {
    [(UP, 103), (DOWN, 108), (LEFT, 105), (RIGHT, 106), (ENTER, 28), (BACK, 14)]
        .into_iter()
        .map(|(name, code)| EvioButton::new(name, BUTTONS_INPUT, code))
        .collect()
}

/// Opens the brick buttons.
///
/// # Errors
///
/// A [`ButtonError::OpenInput`] error is returned if the input device cannot be opened.
pub fn buttons() -> Result<EvioButtons, ButtonError> {
    EvioButtons::new(button_definitions())
}

/// The brick buttons with a [`ButtonManager`] and an accessor per button.
#[derive(Debug)]
pub struct Buttons {
    manager: ButtonManager<EvioButtons>,
}

impl Buttons {
    /// Opens the brick buttons.
    ///
    /// # Errors
    ///
    /// A [`ButtonError::OpenInput`] error is returned if the input device cannot be opened.
    pub fn new() -> Result<Self, ButtonError> {
        Ok(Self {
            manager: ButtonManager::new(buttons()?),
        })
    }

    /// Unwraps the manager, for example to start a background scanner.
    #[must_use]
    pub fn into_manager(self) -> ButtonManager<EvioButtons> {
        self.manager
    }

    /// Determines whether the up button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonManager::is_pressed`].
    pub fn up(&mut self) -> Result<bool, ButtonError> {
        self.manager.is_pressed(UP)
    }

    /// Determines whether the down button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonManager::is_pressed`].
    pub fn down(&mut self) -> Result<bool, ButtonError> {
        self.manager.is_pressed(DOWN)
    }

    /// Determines whether the left button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonManager::is_pressed`].
    pub fn left(&mut self) -> Result<bool, ButtonError> {
        self.manager.is_pressed(LEFT)
    }

    /// Determines whether the right button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonManager::is_pressed`].
    pub fn right(&mut self) -> Result<bool, ButtonError> {
        self.manager.is_pressed(RIGHT)
    }

    /// Determines whether the enter button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonManager::is_pressed`].
    pub fn enter(&mut self) -> Result<bool, ButtonError> {
        self.manager.is_pressed(ENTER)
    }

    /// Determines whether the back button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonManager::is_pressed`].
    pub fn back(&mut self) -> Result<bool, ButtonError> {
        self.manager.is_pressed(BACK)
    }
}

impl Deref for Buttons {
    type Target = ButtonManager<EvioButtons>;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

impl DerefMut for Buttons {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.manager
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    fn leds(sysfs: &MockSysfs) -> Leds {
        for name in [
            "ev3-left0:red:ev3dev",
            "ev3-right0:red:ev3dev",
            "ev3-left1:green:ev3dev",
            "ev3-right1:green:ev3dev",
        ] {
            sysfs
                .add_device(
                    "leds",
                    name,
                    &[
                        ("max_brightness", "255"),
                        ("brightness", "0"),
                        ("trigger", "[none] timer heartbeat default-on"),
                        ("delay_on", "0"),
                        ("delay_off", "0"),
                    ],
                )
                .unwrap();
        }
        Leds::new_in(&sysfs.root()).unwrap()
    }

    fn brightness(sysfs: &MockSysfs, name: &str) -> String {
        sysfs.get("leds", name, "brightness").unwrap()
    }

    #[test]
    fn color_mixes() {
        let sysfs = MockSysfs::new().unwrap();
        let leds = leds(&sysfs);

        leds.orange_on().unwrap();
        assert_eq!(brightness(&sysfs, "ev3-left0:red:ev3dev"), "255");
        assert_eq!(brightness(&sysfs, "ev3-right1:green:ev3dev"), "128");

        leds.set_yellow(0.5).unwrap();
        assert_eq!(brightness(&sysfs, "ev3-right0:red:ev3dev"), "64");
        assert_eq!(brightness(&sysfs, "ev3-left1:green:ev3dev"), "128");

        leds.all_off().unwrap();
        for led in leds.group(LedGroup::All) {
            assert_eq!(led.brightness().unwrap(), 0);
        }
        assert_eq!(
            sysfs.get("leds", "ev3-left0:red:ev3dev", "trigger").unwrap(),
            "default-on"
        );
    }

    #[test]
    fn blink_sets_delays() {
        let sysfs = MockSysfs::new().unwrap();
        let leds = leds(&sysfs);

        leds.blink(LedGroup::Left, 200, 800).unwrap();
        assert_eq!(leds.green_left().delay_on().unwrap(), 200);
        assert_eq!(leds.red_left().delay_off().unwrap(), 800);
        assert_eq!(
            sysfs.get("leds", "ev3-right0:red:ev3dev", "trigger").unwrap(),
            "default-on"
        );
        assert_eq!(
            sysfs.get("leds", "ev3-left0:red:ev3dev", "trigger").unwrap(),
            "timer"
        );
    }

    #[test]
    fn button_codes() {
        let definitions = button_definitions();
        assert_eq!(definitions.len(), 6);
        assert!(
            definitions
                .iter()
                .any(|button| button.name == ENTER && button.code == 28)
        );
        assert!(definitions.iter().all(|button| button.path.ends_with(
            "platform-gpio-keys.0-event"
        )));
    }
}
