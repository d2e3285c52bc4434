//! A throwaway sysfs tree.
//!
//! [`MockSysfs`] lays out class and device directories in a temporary directory, so device
//! code can be exercised without a brick. Every attribute is a plain file; writes made through
//! a [`Device`](crate::Device) can be inspected with [`MockSysfs::get`], and kernel-side
//! changes (a motor reaching its target, a sensor reading a new value) are simulated with
//! [`MockSysfs::set`].
//!
//! The tree is deleted when the [`MockSysfs`] is dropped.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::SysfsRoot;

/// A temporary directory laid out like `/sys/class`.
#[derive(Debug)]
pub struct MockSysfs {
    dir: TempDir,
}

impl MockSysfs {
    /// Creates an empty tree.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the temporary directory could not be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new().prefix("ev3dev-sysfs").tempdir()?,
        })
    }

    /// The root to pass to [`DeviceFilter::open_in`](crate::DeviceFilter::open_in).
    #[must_use]
    pub fn root(&self) -> SysfsRoot {
        SysfsRoot::new(self.dir.path())
    }

    /// The directory backing the tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The directory of a device entry.
    #[must_use]
    pub fn device_path(&self, class: &str, name: &str) -> PathBuf {
        self.dir.path().join(class).join(name)
    }

    /// Creates a device entry with the given attributes.
    ///
    /// Attribute names may contain `/` to create nested attributes such as `hold_pid/Kp`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if a directory or file could not be created.
    pub fn add_device(
        &self,
        class: &str,
        name: &str,
        attributes: &[(&str, &str)],
    ) -> io::Result<PathBuf> {
        let path = self.device_path(class, name);
        fs::create_dir_all(&path)?;

        for (attribute, value) in attributes {
            self.set(class, name, attribute, value)?;
        }

        Ok(path)
    }

    /// Removes a device entry, as the kernel does when a device is unplugged.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory could not be removed.
    pub fn remove_device(&self, class: &str, name: &str) -> io::Result<()> {
        fs::remove_dir_all(self.device_path(class, name))
    }

    /// Replaces the content of an attribute, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file could not be written.
    pub fn set(&self, class: &str, name: &str, attribute: &str, value: &str) -> io::Result<()> {
        self.set_bytes(class, name, attribute, value.as_bytes())
    }

    /// Replaces the raw content of an attribute, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file could not be written.
    pub fn set_bytes(
        &self,
        class: &str,
        name: &str,
        attribute: &str,
        value: &[u8],
    ) -> io::Result<()> {
        let path = self.device_path(class, name).join(attribute);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, value)
    }

    /// Reads the content of an attribute, without surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file could not be read.
    pub fn get(&self, class: &str, name: &str, attribute: &str) -> io::Result<String> {
        let value = fs::read_to_string(self.device_path(class, name).join(attribute))?;
        Ok(value.trim().to_owned())
    }
}
