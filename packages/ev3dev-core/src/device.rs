//! Locating and binding sysfs devices.
//!
//! A [`DeviceFilter`] describes which entry of a device class to bind to: a shell-style name
//! pattern plus any number of attribute matchers. Entries are examined in name order and the
//! first one that satisfies every matcher is bound as a [`Device`].
//!
//! ```no_run
//! use ev3dev_core::DeviceFilter;
//!
//! let motor = DeviceFilter::new("tacho-motor")
//!     .name("motor*")
//!     .attribute("port_name", ["outA"])
//!     .open()
//!     .unwrap();
//! println!("bound {} ({})", motor.name(), motor.driver_name().unwrap());
//! ```

use std::{
    borrow::Cow,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use glob::Pattern;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, trace};

use crate::{
    ClassUnavailableSnafu, DeviceError, InvalidPatternSnafu, InvalidValueSnafu, NotFoundSnafu,
    SysfsRoot, attribute::AttributeCache,
};

/// Accepts a device when one of the accepted strings is a substring of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatcher {
    attribute: String,
    accepted: Vec<String>,
}

impl AttributeMatcher {
    /// Creates a matcher for `attribute`.
    pub fn new<I, S>(attribute: impl Into<String>, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute: attribute.into(),
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    /// The attribute inspected by this matcher.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Returns `true` if any accepted string occurs in `value`.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.accepted
            .iter()
            .any(|accepted| value.contains(accepted.as_str()))
    }
}

impl fmt::Display for AttributeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in [{}]", self.attribute, self.accepted.join(", "))
    }
}

/// Selects a device within a sysfs class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    class: Cow<'static, str>,
    pattern: Cow<'static, str>,
    matchers: Vec<AttributeMatcher>,
}

impl DeviceFilter {
    /// Matches any entry of `class`.
    pub fn new(class: impl Into<Cow<'static, str>>) -> Self {
        Self {
            class: class.into(),
            pattern: Cow::Borrowed("*"),
            matchers: Vec::new(),
        }
    }

    /// Restricts the entry name to a shell-style pattern (`*`, `?`, `[...]`).
    #[must_use]
    pub fn name(mut self, pattern: impl Into<Cow<'static, str>>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Requires `attribute` to contain one of the `accepted` strings.
    #[must_use]
    pub fn attribute<I, S>(mut self, attribute: impl Into<String>, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matchers.push(AttributeMatcher::new(attribute, accepted));
        self
    }

    /// Requires the device to sit on `port`, if one is given.
    #[must_use]
    pub fn port(self, port: Option<&str>) -> Self {
        match port {
            Some(port) => self.attribute("port_name", [port]),
            None => self,
        }
    }

    /// The device class searched by this filter.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The entry name pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The attribute matchers, in the order they were added.
    #[must_use]
    pub fn matchers(&self) -> &[AttributeMatcher] {
        &self.matchers
    }

    /// Binds the first matching device under the configured sysfs root.
    ///
    /// # Errors
    ///
    /// See [`DeviceFilter::open_in`].
    pub fn open(&self) -> Result<Device, DeviceError> {
        self.open_in(&SysfsRoot::from_env())
    }

    /// Binds the first matching device under `root`.
    ///
    /// # Errors
    ///
    /// - A [`DeviceError::InvalidPattern`] error is returned if the name pattern is malformed.
    /// - A [`DeviceError::ClassUnavailable`] error is returned if the class directory cannot be
    ///   listed.
    /// - A [`DeviceError::NotFound`] error is returned if no entry matches.
    pub fn open_in(&self, root: &SysfsRoot) -> Result<Device, DeviceError> {
        let pattern = Pattern::new(&self.pattern).context(InvalidPatternSnafu {
            pattern: self.pattern.as_ref(),
        })?;
        let class_path = root.class_path(&self.class);

        let mut names: Vec<String> = fs::read_dir(&class_path)
            .context(ClassUnavailableSnafu { path: &class_path })?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| pattern.matches(name))
            .collect();
        names.sort();

        for name in names {
            let Ok(device) = Device::bind(class_path.join(&name)) else {
                continue;
            };

            if self.accepts(&device) {
                debug!(class = %self.class, device = %device.name, "bound device");
                return Ok(device);
            }

            trace!(class = %self.class, device = %device.name, "device rejected by filter");
        }

        NotFoundSnafu {
            class: self.class.as_ref(),
            filter: self.to_string(),
        }
        .fail()
    }

    /// A device whose attribute cannot be read does not match.
    fn accepts(&self, device: &Device) -> bool {
        self.matchers.iter().all(|matcher| {
            device
                .attr_string(&matcher.attribute)
                .is_ok_and(|value| matcher.matches(&value))
        })
    }
}

impl fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`", self.pattern)?;
        for (i, matcher) in self.matchers.iter().enumerate() {
            f.write_str(if i == 0 { " with " } else { " and " })?;
            write!(f, "{matcher}")?;
        }
        Ok(())
    }
}

/// A bound sysfs device directory.
///
/// Attribute handles are cached, so repeated access to the same attribute costs one seek and
/// one read or write.
#[derive(Debug)]
pub struct Device {
    name: String,
    index: Option<u32>,
    attributes: AttributeCache,
}

impl Device {
    /// Binds a device directory directly, bypassing any filter.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::MissingDevice`] error is returned if `path` is not a directory.
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self, DeviceError> {
        let attributes = AttributeCache::new(path)?;
        let name = attributes
            .dir()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            index: device_index(&name),
            name,
            attributes,
        })
    }

    /// The entry name, such as `motor0` or `ev3-left0:red:ev3dev`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.attributes.dir()
    }

    /// The number at the end of the entry name, if there is one.
    #[must_use]
    pub const fn device_index(&self) -> Option<u32> {
        self.index
    }

    /// Whether the device directory is still present.
    ///
    /// The kernel removes the directory when the device is unplugged.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.attributes.exists()
    }

    /// The attribute handles of this device.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeCache {
        &self.attributes
    }

    /// Reads an attribute as trimmed text.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn attr_string(&self, attribute: &str) -> Result<String, DeviceError> {
        self.attributes.read(attribute)
    }

    /// Writes text to an attribute.
    ///
    /// # Errors
    ///
    /// Errors from opening or writing the attribute are returned.
    pub fn set_attr_string(&self, attribute: &str, value: &str) -> Result<(), DeviceError> {
        self.attributes.write(attribute, value)
    }

    /// Reads an attribute and parses it.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::InvalidValue`] error is returned if the content does not parse.
    pub fn attr_parse<T: FromStr>(&self, attribute: &str) -> Result<T, DeviceError> {
        let value = self.attr_string(attribute)?;
        value.parse().ok().context(InvalidValueSnafu { attribute, value })
    }

    /// Reads an integer attribute.
    ///
    /// # Errors
    ///
    /// See [`Device::attr_parse`].
    pub fn attr_int(&self, attribute: &str) -> Result<i32, DeviceError> {
        self.attr_parse(attribute)
    }

    /// Writes an integer attribute.
    ///
    /// # Errors
    ///
    /// See [`Device::set_attr_string`].
    pub fn set_attr_int(&self, attribute: &str, value: i32) -> Result<(), DeviceError> {
        self.set_attr_string(attribute, &value.to_string())
    }

    /// Reads a whitespace-separated list attribute.
    ///
    /// Brackets marking the selected entry (`none [timer] heartbeat`) are removed.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn attr_set(&self, attribute: &str) -> Result<Vec<String>, DeviceError> {
        Ok(self
            .attr_string(attribute)?
            .split_whitespace()
            .map(|entry| entry.trim_matches(['[', ']']).to_owned())
            .collect())
    }

    /// Returns the bracketed entry of a list attribute, or `None` if none is selected.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn attr_selected(&self, attribute: &str) -> Result<Option<String>, DeviceError> {
        Ok(self
            .attr_string(attribute)?
            .split_whitespace()
            .find_map(|entry| entry.strip_prefix('[')?.strip_suffix(']'))
            .map(ToOwned::to_owned))
    }

    /// Reads up to `len` raw bytes of an attribute.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn attr_bytes(&self, attribute: &str, len: usize) -> Result<Vec<u8>, DeviceError> {
        self.attributes.read_bytes(attribute, len)
    }

    /// Sends a command to the device through its write-only `command` attribute.
    ///
    /// # Errors
    ///
    /// Errors from opening or writing the attribute are returned. The kernel rejects commands
    /// that are not listed in [`Device::commands`].
    pub fn set_command(&self, command: &str) -> Result<(), DeviceError> {
        debug!(device = %self.name, command, "sending command");
        self.set_attr_string("command", command)
    }

    /// The commands the device driver accepts.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn commands(&self) -> Result<Vec<String>, DeviceError> {
        self.attr_set("commands")
    }

    /// The name of the port the device is connected to.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn port_name(&self) -> Result<String, DeviceError> {
        self.attr_string("port_name")
    }

    /// The name of the kernel driver bound to the device.
    ///
    /// # Errors
    ///
    /// Errors from opening or reading the attribute are returned.
    pub fn driver_name(&self) -> Result<String, DeviceError> {
        self.attr_string("driver_name")
    }
}

/// Parses the run of digits at the end of an entry name.
#[must_use]
pub fn device_index(name: &str) -> Option<u32> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    name[name.len() - digits..].parse().ok()
}
