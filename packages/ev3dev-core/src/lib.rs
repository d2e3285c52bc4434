//! Low level sysfs access for [`ev3dev`](https://www.ev3dev.org).
//! The core crate is used in all other crates of the workspace.
//!
//! The ev3dev kernel exposes every motor, sensor, LED and power supply of the brick as a
//! directory under `/sys/class/<class>/`, with one small text file per attribute. Controlling
//! hardware is a matter of reading and writing those files.
//!
//! Included in this crate:
//! - Locating a device in its class directory: [`device`]
//! - Cached attribute file handles: [`attribute`]
//! - Runtime configuration (sysfs root, platform detection, framebuffer path): [`config`]
//! - A throwaway sysfs tree for tests, behind the `mock` feature: `mock`

use std::{io, path::PathBuf};

use snafu::Snafu;

pub mod attribute;
pub mod config;
pub mod device;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{Platform, SysfsRoot};
pub use device::{Device, DeviceFilter};

/// Errors that can occur when locating a device or accessing one of its attributes.
///
/// Device-specific errors in the other crates wrap this type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeviceError {
    /// The class directory could not be listed.
    #[snafu(display("Could not list device class directory {}: {source}", path.display()))]
    ClassUnavailable {
        /// The class directory
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// No entry of the class matched the requested name and attributes.
    #[snafu(display("No `{class}` device matches {filter}"))]
    NotFound {
        /// The device class that was searched
        class: String,
        /// A description of the filter that failed to match
        filter: String,
    },

    /// The device name pattern is not a valid shell pattern.
    #[snafu(display("Invalid device name pattern `{pattern}`: {source}"))]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// The parse error
        source: glob::PatternError,
    },

    /// The path given as a device directory is not a directory.
    #[snafu(display("{} is not a device directory", path.display()))]
    MissingDevice {
        /// The expected device directory
        path: PathBuf,
    },

    /// The attribute file does not exist.
    #[snafu(display("Attribute {} does not exist", path.display()))]
    MissingAttribute {
        /// The attribute path
        path: PathBuf,
    },

    /// Opening, reading or writing the attribute file failed.
    #[snafu(display("I/O error on attribute {}: {source}", path.display()))]
    Attribute {
        /// The attribute path
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The attribute content could not be interpreted.
    #[snafu(display("Attribute `{attribute}` holds `{value}`, which is not a valid value"))]
    InvalidValue {
        /// The attribute name
        attribute: String,
        /// The raw content that failed to parse
        value: String,
    },
}
