//! Sensors (class `lego-sensor`).
//!
//! Every sensor exposes the same attributes: a mode, a number of values for that mode, and
//! `value0`, `value1`, ... holding the readings as integers scaled by `10^decimals`. The
//! same readings are also available as packed binary data through `bin_data`.
//!
//! [`Sensor`] binds any sensor. The concrete types bind a specific driver and add accessors
//! for their modes:
//!
//! ```no_run
//! use ev3dev_devices::{PluggedDevice, sensor::{Color, ColorSensor}};
//!
//! let sensor = ColorSensor::new(Some("in3")).unwrap();
//! if sensor.color().unwrap() == Color::Red {
//!     println!("stop!");
//! }
//! ```

macro_rules! driver_sensor {
    ($(#[$meta:meta])* $name:ident, [$($driver:literal),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name($crate::sensor::Sensor);

        impl $name {
            /// Kernel drivers bound by this sensor type.
            pub const DRIVERS: &[&str] = &[$($driver),+];

            /// Unwraps the generic sensor.
            #[must_use]
            pub fn into_inner(self) -> $crate::sensor::Sensor {
                self.0
            }
        }

        impl ::core::ops::Deref for $name {
            type Target = $crate::sensor::Sensor;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl $crate::SysfsDevice for $name {
            fn device(&self) -> &::ev3dev_core::Device {
                $crate::SysfsDevice::device(&self.0)
            }
        }

        impl $crate::PluggedDevice for $name {
            fn filter(port: Option<&str>) -> ::ev3dev_core::DeviceFilter {
                <$crate::sensor::Sensor as $crate::PluggedDevice>::filter(port)
                    .attribute("driver_name", Self::DRIVERS.iter().copied())
            }

            fn from_device(
                device: ::ev3dev_core::Device,
            ) -> Result<Self, ::ev3dev_core::DeviceError> {
                <$crate::sensor::Sensor as $crate::PluggedDevice>::from_device(device).map(Self)
            }
        }
    };
}

mod color;
mod gyro;
mod i2c;
mod infrared;
mod nxt;
mod remote;
mod touch;
mod ultrasonic;

use std::{
    fmt,
    str::FromStr,
    sync::{Mutex, PoisonError},
};

pub use color::{Color, ColorMode, ColorSensor};
use ev3dev_core::{Device, DeviceError, DeviceFilter};
pub use gyro::{GyroMode, GyroSensor};
pub use i2c::I2cSensor;
pub use infrared::{InfraredMode, InfraredSensor};
pub use nxt::{LightMode, LightSensor, SoundMode, SoundSensor};
pub use remote::RemoteControl;
pub use touch::TouchSensor;
use tracing::debug;
pub use ultrasonic::{UltrasonicMode, UltrasonicSensor};

use crate::{PluggedDevice, SysfsDevice};

/// Layout of one value in the `bin_data` attribute.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BinDataFormat {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    S8,
    /// Unsigned 16-bit integer, native byte order.
    U16,
    /// Signed 16-bit integer, native byte order.
    S16,
    /// Signed 16-bit integer, big endian.
    S16Be,
    /// Signed 32-bit integer, native byte order.
    S32,
    /// 32-bit float, native byte order.
    Float,
}

impl BinDataFormat {
    /// Size of one value in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 | Self::S16Be => 2,
            Self::S32 | Self::Float => 4,
        }
    }

    /// The sysfs name of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S8 => "s8",
            Self::U16 => "u16",
            Self::S16 => "s16",
            Self::S16Be => "s16_be",
            Self::S32 => "s32",
            Self::Float => "float",
        }
    }

    /// Decodes packed values. Trailing bytes that do not form a whole value are ignored.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(self.size())
            .map(|chunk| match self {
                Self::U8 => f64::from(chunk[0]),
                Self::S8 => f64::from(chunk[0] as i8),
                Self::U16 => f64::from(bytemuck::pod_read_unaligned::<u16>(chunk)),
                Self::S16 => f64::from(bytemuck::pod_read_unaligned::<i16>(chunk)),
                Self::S16Be => f64::from(i16::from_be_bytes([chunk[0], chunk[1]])),
                Self::S32 => f64::from(bytemuck::pod_read_unaligned::<i32>(chunk)),
                Self::Float => f64::from(bytemuck::pod_read_unaligned::<f32>(chunk)),
            })
            .collect()
    }
}

impl FromStr for BinDataFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "u8" => Self::U8,
            "s8" => Self::S8,
            "u16" => Self::U16,
            "s16" => Self::S16,
            "s16_be" => Self::S16Be,
            "s32" => Self::S32,
            "float" => Self::Float,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for BinDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any sensor bound to the `lego-sensor` class.
#[derive(Debug)]
pub struct Sensor {
    device: Device,
    bin_data_size: Mutex<Option<usize>>,
}

impl Sensor {
    /// The sysfs class of sensors.
    pub const CLASS: &str = "lego-sensor";

    /// Returns the number of decimal places in the values.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn decimals(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("decimals")
    }

    /// Returns the current mode.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn mode(&self) -> Result<String, DeviceError> {
        self.device.attr_string("mode")
    }

    /// Switches the sensor to another mode.
    ///
    /// # Errors
    ///
    /// Errors from writing the attribute are returned. The kernel rejects modes that are not
    /// listed in [`Sensor::modes`].
    pub fn set_mode(&self, mode: impl AsRef<str>) -> Result<(), DeviceError> {
        self.device.set_attr_string("mode", mode.as_ref())?;
        *self
            .bin_data_size
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    /// Switches mode only if the sensor is not already in it.
    pub(crate) fn ensure_mode(&self, mode: &str) -> Result<(), DeviceError> {
        if self.mode()? != mode {
            debug!(sensor = %self.device.name(), mode, "switching sensor mode");
            self.set_mode(mode)?;
        }
        Ok(())
    }

    /// Returns the modes the sensor supports.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn modes(&self) -> Result<Vec<String>, DeviceError> {
        self.device.attr_set("modes")
    }

    /// Returns how many values the current mode provides.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn num_values(&self) -> Result<i32, DeviceError> {
        self.device.attr_int("num_values")
    }

    /// Returns the units of the values in the current mode, such as `pct` or `cm`.
    ///
    /// # Errors
    ///
    /// Errors from reading the attribute are returned.
    pub fn units(&self) -> Result<String, DeviceError> {
        self.device.attr_string("units")
    }

    /// Returns the raw value `n`, not scaled by [`Sensor::decimals`].
    ///
    /// A value that does not parse reads as zero.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn value(&self, n: usize) -> Result<i32, DeviceError> {
        match self.device.attr_int(&format!("value{n}")) {
            Err(DeviceError::InvalidValue { .. }) => Ok(0),
            other => other,
        }
    }

    /// Returns value `n` divided by `10^decimals`.
    ///
    /// # Errors
    ///
    /// Errors from reading the value or the decimals are returned.
    pub fn float_value(&self, n: usize) -> Result<f64, DeviceError> {
        Ok(f64::from(self.value(n)?) * 10f64.powi(-self.decimals()?))
    }

    /// Returns every raw value of the current mode.
    ///
    /// # Errors
    ///
    /// Errors from reading any value are returned.
    pub fn values(&self) -> Result<Vec<i32>, DeviceError> {
        (0..self.num_values()?.max(0) as usize)
            .map(|n| self.value(n))
            .collect()
    }

    /// Returns the layout of `bin_data` in the current mode.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::InvalidValue`] error is returned for unknown formats.
    pub fn bin_data_format(&self) -> Result<BinDataFormat, DeviceError> {
        self.device.attr_parse("bin_data_format")
    }

    /// Returns the packed values of the current mode.
    ///
    /// The length is `size(bin_data_format) * num_values`, computed on first use and kept until
    /// the mode is changed through [`Sensor::set_mode`]. An unknown format counts as one byte
    /// per value.
    ///
    /// # Errors
    ///
    /// Errors from reading the format, the count or the data are returned.
    pub fn bin_data(&self) -> Result<Vec<u8>, DeviceError> {
        let len = {
            let mut cached = self
                .bin_data_size
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match *cached {
                Some(len) => len,
                None => {
                    let size = match self.bin_data_format() {
                        Ok(format) => format.size(),
                        Err(DeviceError::InvalidValue { .. }) => 1,
                        Err(err) => return Err(err),
                    };
                    let len = size * self.num_values()?.max(0) as usize;
                    *cached = Some(len);
                    len
                }
            }
        };

        self.device.attr_bytes("bin_data", len)
    }

    /// Returns the decoded values of [`Sensor::bin_data`].
    ///
    /// # Errors
    ///
    /// See [`Sensor::bin_data`].
    pub fn bin_data_values(&self) -> Result<Vec<f64>, DeviceError> {
        let format = self.bin_data_format()?;
        Ok(format.decode(&self.bin_data()?))
    }
}

impl SysfsDevice for Sensor {
    fn device(&self) -> &Device {
        &self.device
    }
}

impl PluggedDevice for Sensor {
    fn filter(port: Option<&str>) -> DeviceFilter {
        DeviceFilter::new(Self::CLASS).name("sensor*").port(port)
    }

    fn from_device(device: Device) -> Result<Self, DeviceError> {
        Ok(Self {
            device,
            bin_data_size: Mutex::new(None),
        })
    }
}

#[cfg(test)]
pub(crate) mod test {
    use ev3dev_core::mock::MockSysfs;

    use super::*;

    /// Adds a sensor entry with the attributes every sensor has.
    pub(crate) fn add_sensor(
        sysfs: &MockSysfs,
        name: &str,
        port: &str,
        driver: &str,
        mode: &str,
        extra: &[(&str, &str)],
    ) {
        sysfs
            .add_device(
                "lego-sensor",
                name,
                &[
                    ("port_name", port),
                    ("driver_name", driver),
                    ("mode", mode),
                    ("decimals", "0"),
                    ("num_values", "1"),
                    ("units", ""),
                    ("value0", "0"),
                ],
            )
            .unwrap();
        for (attribute, value) in extra {
            sysfs.set("lego-sensor", name, attribute, value).unwrap();
        }
    }

    #[test]
    fn decoding_formats() {
        assert_eq!(BinDataFormat::S8.decode(&[0xFF, 0x02]), [-1.0, 2.0]);
        assert_eq!(BinDataFormat::S16Be.decode(&[0xFF, 0xFE]), [-2.0]);
        assert_eq!(
            BinDataFormat::U16.decode(&300u16.to_ne_bytes()),
            [300.0]
        );
        assert_eq!(
            BinDataFormat::Float.decode(&1.5f32.to_ne_bytes()),
            [1.5]
        );
        assert!(BinDataFormat::S32.decode(&[1, 2, 3]).is_empty());
        assert_eq!("s16_be".parse(), Ok(BinDataFormat::S16Be));
    }

    #[test]
    fn scaled_values() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor0",
            "in2",
            "lego-ev3-us",
            "US-DIST-CM",
            &[("decimals", "1"), ("value0", "1234"), ("value1", "garbage")],
        );

        let sensor = Sensor::new_in(&sysfs.root(), Some("in2")).unwrap();
        assert_eq!(sensor.value(0).unwrap(), 1234);
        assert!((sensor.float_value(0).unwrap() - 123.4).abs() < 1e-9);
        assert_eq!(sensor.value(1).unwrap(), 0);
        assert!(sensor.value(2).is_err());
    }

    #[test]
    fn bin_data_length_follows_mode() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor0",
            "in1",
            "lego-ev3-color",
            "RGB-RAW",
            &[
                ("num_values", "3"),
                ("bin_data_format", "s16"),
            ],
        );
        let mut data = Vec::new();
        for value in [10i16, -20, 30, 40] {
            data.extend_from_slice(&value.to_ne_bytes());
        }
        sysfs
            .set_bytes("lego-sensor", "sensor0", "bin_data", &data)
            .unwrap();

        let sensor = Sensor::new_in(&sysfs.root(), None).unwrap();
        assert_eq!(sensor.bin_data().unwrap().len(), 6);
        assert_eq!(sensor.bin_data_values().unwrap(), [10.0, -20.0, 30.0]);

        sysfs.set("lego-sensor", "sensor0", "num_values", "1").unwrap();
        sysfs
            .set("lego-sensor", "sensor0", "bin_data_format", "s8")
            .unwrap();
        assert_eq!(sensor.bin_data().unwrap().len(), 6);

        sensor.set_mode("COL-REFLECT").unwrap();
        assert_eq!(sensor.bin_data().unwrap().len(), 1);
    }

    #[test]
    fn unknown_bin_data_format_reads_bytes() {
        let sysfs = MockSysfs::new().unwrap();
        add_sensor(
            &sysfs,
            "sensor0",
            "in3",
            "nxt-i2c-sensor",
            "RAW",
            &[("num_values", "2"), ("bin_data_format", "u24")],
        );
        sysfs
            .set_bytes("lego-sensor", "sensor0", "bin_data", &[7, 8, 9, 10])
            .unwrap();

        let sensor = Sensor::new_in(&sysfs.root(), None).unwrap();
        assert_eq!(sensor.bin_data().unwrap(), [7, 8]);
        assert!(matches!(
            sensor.bin_data_values(),
            Err(DeviceError::InvalidValue { .. })
        ));
    }
}
