use ev3dev_core::DeviceError;
use rgb::RGB;

/// Modes of the [`ColorSensor`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ColorMode {
    /// Reflected light intensity, in percent (`COL-REFLECT`).
    Reflect,
    /// Ambient light intensity, in percent (`COL-AMBIENT`).
    Ambient,
    /// Detected color code (`COL-COLOR`).
    Color,
    /// Raw reflected light (`REF-RAW`).
    RefRaw,
    /// Raw red, green and blue components (`RGB-RAW`).
    RgbRaw,
}

impl ColorMode {
    /// The sysfs name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reflect => "COL-REFLECT",
            Self::Ambient => "COL-AMBIENT",
            Self::Color => "COL-COLOR",
            Self::RefRaw => "REF-RAW",
            Self::RgbRaw => "RGB-RAW",
        }
    }
}

impl AsRef<str> for ColorMode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A color detected in [`ColorMode::Color`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Color {
    /// No color, or an unknown code.
    None,
    /// Black.
    Black,
    /// Blue.
    Blue,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Red.
    Red,
    /// White.
    White,
    /// Brown.
    Brown,
}

impl Color {
    /// Maps a color code (0 to 7) to a color.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Black,
            2 => Self::Blue,
            3 => Self::Green,
            4 => Self::Yellow,
            5 => Self::Red,
            6 => Self::White,
            7 => Self::Brown,
            _ => Self::None,
        }
    }
}

driver_sensor!(
    /// The EV3 color sensor.
    ColorSensor,
    ["lego-ev3-color"]
);

impl ColorSensor {
    /// Returns the reflected light intensity in percent, switching to
    /// [`ColorMode::Reflect`] if needed.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn reflected_light_intensity(&self) -> Result<i32, DeviceError> {
        self.ensure_mode(ColorMode::Reflect.as_str())?;
        self.value(0)
    }

    /// Returns the ambient light intensity in percent, switching to [`ColorMode::Ambient`] if
    /// needed.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn ambient_light_intensity(&self) -> Result<i32, DeviceError> {
        self.ensure_mode(ColorMode::Ambient.as_str())?;
        self.value(0)
    }

    /// Returns the detected color, switching to [`ColorMode::Color`] if needed.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the value are returned.
    pub fn color(&self) -> Result<Color, DeviceError> {
        self.ensure_mode(ColorMode::Color.as_str())?;
        Ok(Color::from_code(self.value(0)?))
    }

    /// Returns the raw color components, switching to [`ColorMode::RgbRaw`] if needed.
    ///
    /// # Errors
    ///
    /// Errors from switching modes or reading the values are returned.
    pub fn raw_rgb(&self) -> Result<RGB<i32>, DeviceError> {
        self.ensure_mode(ColorMode::RgbRaw.as_str())?;
        Ok(RGB::new(self.value(0)?, self.value(1)?, self.value(2)?))
    }
}

#[cfg(test)]
mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;
    use crate::{PluggedDevice, sensor::test::add_sensor};

    #[test]
    fn color_codes() {
        assert_eq!(Color::from_code(5), Color::Red);
        assert_eq!(Color::from_code(0), Color::None);
        assert_eq!(Color::from_code(42), Color::None);
    }

    #[test]
    fn readings_switch_mode() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor1",
            "in3",
            "lego-ev3-color",
            "COL-REFLECT",
            &[("value0", "4"), ("value1", "8"), ("value2", "15")],
        );

        let sensor = ColorSensor::new_in(&sysfs.root(), Some("in3")).unwrap();
        assert_eq!(sensor.reflected_light_intensity().unwrap(), 4);
        assert_eq!(sensor.color().unwrap(), Color::Yellow);
        assert_eq!(sysfs.get("lego-sensor", "sensor1", "mode").unwrap(), "COL-COLOR");
        assert_eq!(sensor.raw_rgb().unwrap(), RGB::new(4, 8, 15));
    }
}
