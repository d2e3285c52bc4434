use std::collections::BTreeSet;

use ev3dev_core::DeviceError;

use super::{InfraredMode, InfraredSensor};
use crate::button::{ButtonError, ButtonSource};

const BUTTONS: &[&str] = &["red_up", "red_down", "blue_up", "blue_down", "beacon"];

/// The buttons of an infrared remote, seen through an [`InfraredSensor`].
///
/// Each remote transmits on one of four channels, selected by the slider on the remote.
#[derive(Debug)]
pub struct RemoteControl {
    sensor: InfraredSensor,
    channel: u8,
}

impl RemoteControl {
    /// Listens to the remote on `channel`, switching the sensor to [`InfraredMode::Remote`].
    ///
    /// The channel is clamped to `1..=4`.
    ///
    /// # Errors
    ///
    /// Errors from switching the sensor mode are returned.
    pub fn new(sensor: InfraredSensor, channel: i32) -> Result<Self, DeviceError> {
        sensor.set_mode(InfraredMode::Remote)?;
        Ok(Self {
            sensor,
            channel: channel.clamp(1, 4) as u8,
        })
    }

    /// Returns the channel being listened to, from 1 to 4.
    #[must_use]
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Unwraps the infrared sensor.
    #[must_use]
    pub fn into_inner(self) -> InfraredSensor {
        self.sensor
    }

    fn is_held(&self, button: &str) -> Result<bool, DeviceError> {
        let code = self.sensor.value(usize::from(self.channel - 1))?;
        Ok(Self::buttons_for_code(code).contains(&button))
    }

    /// Determines whether the red up button is pressed.
    ///
    /// # Errors
    ///
    /// Errors from reading the sensor are returned.
    pub fn red_up(&self) -> Result<bool, DeviceError> {
        self.is_held("red_up")
    }

    /// Determines whether the red down button is pressed.
    ///
    /// # Errors
    ///
    /// Errors from reading the sensor are returned.
    pub fn red_down(&self) -> Result<bool, DeviceError> {
        self.is_held("red_down")
    }

    /// Determines whether the blue up button is pressed.
    ///
    /// # Errors
    ///
    /// Errors from reading the sensor are returned.
    pub fn blue_up(&self) -> Result<bool, DeviceError> {
        self.is_held("blue_up")
    }

    /// Determines whether the blue down button is pressed.
    ///
    /// # Errors
    ///
    /// Errors from reading the sensor are returned.
    pub fn blue_down(&self) -> Result<bool, DeviceError> {
        self.is_held("blue_down")
    }

    /// Determines whether beacon mode is on.
    ///
    /// # Errors
    ///
    /// Errors from reading the sensor are returned.
    pub fn beacon(&self) -> Result<bool, DeviceError> {
        self.is_held("beacon")
    }

    /// Maps a button code reported in remote mode to the buttons it stands for.
    #[must_use]
    pub const fn buttons_for_code(code: i32) -> &'static [&'static str] {
        match code {
            1 => &["red_up"],
            2 => &["red_down"],
            3 => &["blue_up"],
            4 => &["blue_down"],
            5 => &["red_up", "blue_up"],
            6 => &["red_up", "blue_down"],
            7 => &["red_down", "blue_up"],
            8 => &["red_down", "blue_down"],
            9 => &["beacon"],
            10 => &["red_up", "red_down"],
            11 => &["blue_up", "blue_down"],
            _ => &[],
        }
    }
}

impl ButtonSource for RemoteControl {
    fn buttons(&self) -> &[&'static str] {
        BUTTONS
    }

    fn pressed(&mut self) -> Result<BTreeSet<&'static str>, ButtonError> {
        let code = self.sensor.value(usize::from(self.channel - 1))?;
        Ok(Self::buttons_for_code(code).iter().copied().collect())
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::{PluggedDevice, sensor::test::add_sensor};

    #[test]
    fn codes() {
        assert!(RemoteControl::buttons_for_code(0).is_empty());
        assert_eq!(
            RemoteControl::buttons_for_code(7),
            ["red_down", "blue_up"]
        );
        assert!(RemoteControl::buttons_for_code(12).is_empty());
    }

    #[test]
    fn channel_selects_value() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor0",
            "in4",
            "lego-ev3-ir",
            "IR-PROX",
            &[
                ("num_values", "4"),
                ("value1", "0"),
                ("value2", "0"),
                ("value3", "9"),
            ],
        );

        let sensor = InfraredSensor::new_in(&sysfs.root(), None).unwrap();
        let mut remote = RemoteControl::new(sensor, 7).unwrap();
        assert_eq!(remote.channel(), 4);
        assert_eq!(sysfs.get("lego-sensor", "sensor0", "mode").unwrap(), "IR-REMOTE");

        assert_eq!(remote.pressed().unwrap().into_iter().collect::<Vec<_>>(), ["beacon"]);
        assert!(remote.beacon().unwrap());
        assert!(!remote.red_up().unwrap());

        sysfs.set("lego-sensor", "sensor0", "value3", "6").unwrap();
        assert!(remote.red_up().unwrap());
        assert!(remote.blue_down().unwrap());
        assert!(!remote.blue_up().unwrap());
        assert!(!remote.red_down().unwrap());
        assert!(!remote.beacon().unwrap());
    }
}
