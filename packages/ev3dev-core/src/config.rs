//! Runtime configuration.
//!
//! Everything here is resolved from the environment so that the same program can run on the
//! brick itself or against a mirrored sysfs tree on a development machine.
//!
//! | Variable            | Default      | Meaning                                   |
//! |---------------------|--------------|-------------------------------------------|
//! | `EV3DEV_SYSFS_ROOT` | `/sys/class` | Directory holding the device classes      |
//! | `EV3DEV_PLATFORM`   | `uname -m`   | Force the platform (`ev3` or `brickpi`)   |
//! | `FRAMEBUFFER`       | `/dev/fb0`   | Framebuffer device used by the screen     |

use std::{
    env,
    ffi::CStr,
    fmt, mem,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Directory holding the device classes on a running ev3dev system.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class";

/// Environment variable overriding [`DEFAULT_SYSFS_ROOT`].
pub const SYSFS_ROOT_ENV: &str = "EV3DEV_SYSFS_ROOT";

/// Environment variable forcing the detected [`Platform`].
pub const PLATFORM_ENV: &str = "EV3DEV_PLATFORM";

/// Framebuffer device used when [`FRAMEBUFFER_ENV`] is not set.
pub const DEFAULT_FRAMEBUFFER: &str = "/dev/fb0";

/// Environment variable selecting the framebuffer device.
pub const FRAMEBUFFER_ENV: &str = "FRAMEBUFFER";

/// The directory in which device classes (`leds`, `tacho-motor`, `lego-sensor`, ...) live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsRoot {
    path: PathBuf,
}

impl SysfsRoot {
    /// Creates a root at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the root configured through `EV3DEV_SYSFS_ROOT`, or `/sys/class`.
    #[must_use]
    pub fn from_env() -> Self {
        env::var_os(SYSFS_ROOT_ENV).map_or_else(|| Self::new(DEFAULT_SYSFS_ROOT), Self::new)
    }

    /// The root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory of a given device class.
    #[must_use]
    pub fn class_path(&self, class: &str) -> PathBuf {
        self.path.join(class)
    }
}

/// The hardware the program runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// LEGO MINDSTORMS EV3 brick.
    Ev3,

    /// Dexter Industries BrickPi on a Raspberry Pi.
    BrickPi,

    /// Anything else.
    Unsupported,
}

impl Platform {
    /// Guesses the platform from the kernel machine name, unless `EV3DEV_PLATFORM` says
    /// otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if let Ok(forced) = env::var(PLATFORM_ENV) {
            return forced.parse().unwrap_or(Self::Unsupported);
        }

        machine_name().map_or(Self::Unsupported, |machine| Self::from_machine(&machine))
    }

    /// Maps a `uname -m` machine name to a platform.
    #[must_use]
    pub fn from_machine(machine: &str) -> Self {
        match machine {
            "armv5tejl" => Self::Ev3,
            "armv6l" => Self::BrickPi,
            _ => Self::Unsupported,
        }
    }

    /// Short lowercase name of the platform.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ev3 => "ev3",
            Self::BrickPi => "brickpi",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ev3" => Ok(Self::Ev3),
            "brickpi" => Ok(Self::BrickPi),
            "unsupported" => Ok(Self::Unsupported),
            _ => Err(()),
        }
    }
}

/// Returns the framebuffer device path, from `FRAMEBUFFER` or `/dev/fb0`.
#[must_use]
pub fn framebuffer_path() -> PathBuf {
    env::var_os(FRAMEBUFFER_ENV).map_or_else(|| PathBuf::from(DEFAULT_FRAMEBUFFER), PathBuf::from)
}

fn machine_name() -> Option<String> {
    // SAFETY: `utsname` is plain old data, an all-zero value is valid.
    let mut uts: libc::utsname = unsafe { mem::zeroed() };

    if unsafe { libc::uname(&raw mut uts) } != 0 {
        return None;
    }

    // SAFETY: `uname` NUL-terminates every field on success.
    let machine = unsafe { CStr::from_ptr(uts.machine.as_ptr()) };
    Some(machine.to_string_lossy().into_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn machine_names() {
        assert_eq!(Platform::from_machine("armv5tejl"), Platform::Ev3);
        assert_eq!(Platform::from_machine("armv6l"), Platform::BrickPi);
        assert_eq!(Platform::from_machine("x86_64"), Platform::Unsupported);
    }

    #[test]
    fn platform_names_round_trip() {
        for platform in [Platform::Ev3, Platform::BrickPi, Platform::Unsupported] {
            assert_eq!(platform.name().parse(), Ok(platform));
        }
        assert_eq!(" EV3\n".parse(), Ok(Platform::Ev3));
        assert!("nxt".parse::<Platform>().is_err());
    }

    #[test]
    fn class_paths() {
        let root = SysfsRoot::new("/tmp/sys");
        assert_eq!(root.class_path("leds"), PathBuf::from("/tmp/sys/leds"));
    }
}
