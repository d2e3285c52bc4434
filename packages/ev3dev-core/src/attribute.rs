//! Attribute file handles.
//!
//! Opening a sysfs attribute is far more expensive than reading it, so every attribute a device
//! touches is opened once and kept for the lifetime of the device. Reads and writes always
//! start at offset zero, which is how sysfs expects attributes to be accessed.

use std::{
    collections::HashMap,
    ffi::CString,
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    mem,
    os::unix::{ffi::OsStrExt, io::AsRawFd},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use snafu::{ResultExt, ensure};
use tracing::trace;

use crate::{AttributeSnafu, DeviceError, MissingAttributeSnafu, MissingDeviceSnafu};

const SYSFS_MAGIC: libc::c_long = 0x6265_6572;

/// The access the current process has to an attribute file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The attribute can be read and written.
    ReadWrite,
    /// The attribute can only be written (`command` attributes, for example).
    WriteOnly,
    /// The attribute can only be read.
    ReadOnly,
}

/// A single open attribute file.
#[derive(Debug)]
pub struct Attribute {
    path: PathBuf,
    file: File,
    access: Access,
    truncate: bool,
}

impl Attribute {
    /// Opens an attribute file with the widest access the process is granted.
    ///
    /// # Errors
    ///
    /// - A [`DeviceError::MissingAttribute`] error is returned if the file does not exist.
    /// - A [`DeviceError::Attribute`] error is returned if the file could not be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DeviceError> {
        let path = path.into();
        ensure!(path.is_file(), MissingAttributeSnafu { path: &path });

        let access = access_of(&path);
        let file = match access {
            Access::ReadWrite => OpenOptions::new().read(true).write(true).open(&path),
            Access::WriteOnly => OpenOptions::new().write(true).open(&path),
            Access::ReadOnly => File::open(&path),
        }
        .context(AttributeSnafu { path: &path })?;

        // Kernel attributes replace their value on every write. Plain files (a mirrored tree
        // used for testing) need to be cut to the written length instead.
        let truncate = !is_sysfs(&file);

        Ok(Self {
            path,
            file,
            access,
            truncate,
        })
    }

    /// The attribute path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The access mode the attribute was opened with.
    #[must_use]
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Reads the attribute as text, without surrounding whitespace.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::Attribute`] error is returned if the file could not be read.
    pub fn read(&self) -> Result<String, DeviceError> {
        let mut value = String::new();
        (&self.file)
            .seek(SeekFrom::Start(0))
            .and_then(|_| (&self.file).read_to_string(&mut value))
            .context(AttributeSnafu { path: &self.path })?;

        Ok(value.trim().to_owned())
    }

    /// Reads up to `len` raw bytes from the start of the attribute.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::Attribute`] error is returned if the file could not be read.
    pub fn read_bytes(&self, len: usize) -> Result<Vec<u8>, DeviceError> {
        let mut bytes = Vec::with_capacity(len);
        (&self.file)
            .seek(SeekFrom::Start(0))
            .and_then(|_| (&self.file).take(len as u64).read_to_end(&mut bytes))
            .context(AttributeSnafu { path: &self.path })?;

        Ok(bytes)
    }

    /// Replaces the attribute value.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::Attribute`] error is returned if the value was rejected. The kernel
    /// reports unsupported values (an unknown command, an out of range speed) this way.
    pub fn write(&self, value: &str) -> Result<(), DeviceError> {
        trace!(path = %self.path.display(), value, "writing attribute");

        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(value.as_bytes()))
            .and_then(|()| file.flush())
            .and_then(|()| {
                if self.truncate {
                    file.set_len(value.len() as u64)
                } else {
                    Ok(())
                }
            })
            .context(AttributeSnafu { path: &self.path })
    }
}

fn access_of(path: &Path) -> Access {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return Access::ReadOnly;
    };

    // SAFETY: `c_path` is a valid NUL-terminated string for the duration of both calls.
    let (readable, writable) = unsafe {
        (
            libc::access(c_path.as_ptr(), libc::R_OK) == 0,
            libc::access(c_path.as_ptr(), libc::W_OK) == 0,
        )
    };

    match (readable, writable) {
        (true, true) => Access::ReadWrite,
        (false, true) => Access::WriteOnly,
        _ => Access::ReadOnly,
    }
}

fn is_sysfs(file: &File) -> bool {
    // SAFETY: `statfs` is plain old data, an all-zero value is valid.
    let mut stats: libc::statfs = unsafe { mem::zeroed() };

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    if unsafe { libc::fstatfs(file.as_raw_fd(), &raw mut stats) } != 0 {
        return false;
    }

    #[allow(clippy::unnecessary_cast, clippy::useless_conversion)]
    let magic = stats.f_type as libc::c_long;
    magic == SYSFS_MAGIC
}

/// The set of attribute files opened for one device directory.
///
/// Handles are opened lazily on first use and kept until the cache is dropped.
#[derive(Debug)]
pub struct AttributeCache {
    dir: PathBuf,
    handles: Mutex<HashMap<String, Attribute>>,
}

impl AttributeCache {
    /// Creates an empty cache for the given device directory.
    ///
    /// # Errors
    ///
    /// A [`DeviceError::MissingDevice`] error is returned if `dir` is not a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DeviceError> {
        let dir = dir.into();
        ensure!(dir.is_dir(), MissingDeviceSnafu { path: &dir });

        Ok(Self {
            dir,
            handles: Mutex::new(HashMap::new()),
        })
    }

    /// The device directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the device directory still exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Runs `f` on the handle of the attribute `name`, opening it if needed.
    ///
    /// The cache stays locked while `f` runs so that concurrent users cannot interleave their
    /// seeks.
    ///
    /// # Errors
    ///
    /// Any error from opening the attribute or from `f` is returned.
    pub fn with<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Attribute) -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);

        if !handles.contains_key(name) {
            let attribute = Attribute::open(self.dir.join(name))?;
            handles.insert(name.to_owned(), attribute);
        }

        match handles.get(name) {
            Some(attribute) => f(attribute),
            None => MissingAttributeSnafu {
                path: self.dir.join(name),
            }
            .fail(),
        }
    }

    /// Reads the attribute `name` as trimmed text.
    ///
    /// # Errors
    ///
    /// See [`Attribute::open`] and [`Attribute::read`].
    pub fn read(&self, name: &str) -> Result<String, DeviceError> {
        self.with(name, Attribute::read)
    }

    /// Reads up to `len` raw bytes of the attribute `name`.
    ///
    /// # Errors
    ///
    /// See [`Attribute::open`] and [`Attribute::read_bytes`].
    pub fn read_bytes(&self, name: &str, len: usize) -> Result<Vec<u8>, DeviceError> {
        self.with(name, |attribute| attribute.read_bytes(len))
    }

    /// Writes `value` to the attribute `name`.
    ///
    /// # Errors
    ///
    /// See [`Attribute::open`] and [`Attribute::write`].
    pub fn write(&self, name: &str, value: &str) -> Result<(), DeviceError> {
        self.with(name, |attribute| attribute.write(value))
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn reads_are_trimmed_and_fresh() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("speed"), "120\n").unwrap();

        let cache = AttributeCache::new(dir.path()).unwrap();
        assert_eq!(cache.read("speed").unwrap(), "120");

        fs::write(dir.path().join("speed"), "-45\n").unwrap();
        assert_eq!(cache.read("speed").unwrap(), "-45");
    }

    #[test]
    fn shorter_writes_replace_the_value() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("duty_cycle_sp"), "100").unwrap();

        let cache = AttributeCache::new(dir.path()).unwrap();
        cache.write("duty_cycle_sp", "75").unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("duty_cycle_sp")).unwrap(), "75");
        assert_eq!(cache.read("duty_cycle_sp").unwrap(), "75");
    }

    #[test]
    fn raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin_data"), [1u8, 2, 3, 4, 5]).unwrap();

        let cache = AttributeCache::new(dir.path()).unwrap();
        assert_eq!(cache.read_bytes("bin_data", 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(cache.read_bytes("bin_data", 16).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AttributeCache::new(dir.path()).unwrap();

        assert!(matches!(
            cache.read("nope"),
            Err(DeviceError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn missing_device_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AttributeCache::new(dir.path().join("motor9")),
            Err(DeviceError::MissingDevice { .. })
        ));
    }
}
