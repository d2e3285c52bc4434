//! # ev3dev
//!
//! Rust bindings for robots running [ev3dev](https://www.ev3dev.org), the Debian based
//! operating system of the LEGO MINDSTORMS EV3 brick and the Dexter Industries BrickPi.
//!
//! Devices are driven through the files the kernel exposes under `/sys/class`. Set the
//! `EV3DEV_SYSFS_ROOT` environment variable to run against a copy of that tree.
//!
//! # Usage
//!
//! ```no_run
//! use ev3dev::prelude::*;
//!
//! let motor = LargeMotor::new(Some(ev3::OUTPUT_A)).unwrap();
//! motor
//!     .run_to_rel_pos(360, &MotorSettings::new().speed_regulation(true).speed_sp(500))
//!     .unwrap();
//!
//! let touch = TouchSensor::new(Some(ev3::INPUT_1)).unwrap();
//! while !touch.is_pressed().unwrap() {}
//! motor.stop(Some(StopCommand::Brake)).unwrap();
//! ```
//!
//! Check out the `demos/` directory of the repository for more examples.

#![cfg_attr(docsrs, feature(doc_cfg))]

#[doc(inline)]
#[cfg(feature = "core")]
pub use ev3dev_core::{Device, DeviceError, DeviceFilter, Platform, SysfsRoot, config};
#[doc(inline)]
#[cfg(feature = "mock")]
pub use ev3dev_core::mock;
#[doc(inline)]
#[cfg(feature = "devices")]
pub use ev3dev_devices::{
    PluggedDevice, SysfsDevice, auto, brickpi, button, display, ev3, led, lego_port, motor,
    power_supply, sensor, sound,
};
#[doc(inline)]
#[cfg(feature = "devices")]
pub use ev3dev_devices::auto::current_platform;
#[doc(inline)]
#[cfg(feature = "navigation")]
pub use ev3dev_navigation as navigation;

/// Commonly used features of ev3dev.
///
/// This module is meant to be glob imported.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use crate::{DeviceError, Platform, SysfsRoot};
    #[cfg(feature = "devices")]
    pub use crate::{
        PluggedDevice, SysfsDevice, brickpi,
        button::{ButtonManager, ButtonSource},
        current_platform,
        display::Screen,
        ev3,
        led::{Led, Trigger},
        lego_port::LegoPort,
        motor::{
            DcMotor, DutyCycleMotor, LargeMotor, MediumMotor, Motor, MotorSettings, Polarity,
            PositionControl, ServoMotor, StopCommand, TachoMotor,
        },
        power_supply::PowerSupply,
        sensor::{
            ColorSensor, GyroSensor, I2cSensor, InfraredSensor, LightSensor, RemoteControl,
            Sensor, SoundSensor, TouchSensor, UltrasonicSensor,
        },
        sound,
    };
    #[cfg(feature = "navigation")]
    pub use crate::navigation::{DifferentialPilot, MotionCallbacks, MotionMonitor, Pilot};
}
