use std::{
    collections::BTreeSet,
    fs::File,
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::debug;

use super::{ButtonError, ButtonSource, OpenInputSnafu, ReadKeysSnafu};

/// Highest key code known to the input subsystem.
pub const KEY_MAX: usize = 0x2FF;

/// Size of the key state bitmap returned by [`EVIOCGKEY`].
pub const KEY_BUF_LEN: usize = (KEY_MAX + 7) / 8;

/// `EVIOCGKEY(KEY_BUF_LEN)`: reads the global key state of an input device.
pub const EVIOCGKEY: u64 = (2 << 30) | ((KEY_BUF_LEN as u64) << 16) | ((b'E' as u64) << 8) | 0x18;

/// Determines whether the bit of key `code` is set in a key state bitmap.
#[must_use]
pub fn key_pressed(keys: &[u8], code: u16) -> bool {
    let code = usize::from(code);
    keys.get(code / 8)
        .is_some_and(|byte| byte & (1 << (code % 8)) != 0)
}

/// A button reported by an input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvioButton {
    /// Name of the button.
    pub name: &'static str,
    /// Input device reporting the button.
    pub path: PathBuf,
    /// Key code of the button.
    pub code: u16,
}

impl EvioButton {
    /// Creates a button definition.
    pub fn new(name: &'static str, path: impl Into<PathBuf>, code: u16) -> Self {
        Self {
            name,
            path: path.into(),
            code,
        }
    }
}

#[derive(Debug)]
struct InputDevice {
    path: PathBuf,
    file: File,
    keys: [u8; KEY_BUF_LEN],
}

impl InputDevice {
    fn read_keys(&mut self) -> Result<(), ButtonError> {
        // SAFETY: `keys` is exactly the length encoded in the request, and the descriptor is
        // kept open by `file`.
        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                EVIOCGKEY as _,
                self.keys.as_mut_ptr(),
            )
        };

        if result < 0 {
            return Err(std::io::Error::last_os_error()).context(ReadKeysSnafu {
                path: &self.path,
            });
        }
        Ok(())
    }
}

/// Buttons read from Linux input devices with the `EVIOCGKEY` ioctl.
///
/// Each input device is opened once and has its own key state buffer.
#[derive(Debug)]
pub struct EvioButtons {
    buttons: Vec<EvioButton>,
    names: Vec<&'static str>,
    inputs: Vec<InputDevice>,
}

impl EvioButtons {
    /// Opens the input devices of the given buttons.
    ///
    /// # Errors
    ///
    /// A [`ButtonError::OpenInput`] error is returned if an input device cannot be opened.
    pub fn new(buttons: Vec<EvioButton>) -> Result<Self, ButtonError> {
        let mut inputs: Vec<InputDevice> = Vec::new();
        for button in &buttons {
            if inputs.iter().any(|input| input.path == button.path) {
                continue;
            }

            let file = File::open(&button.path).context(OpenInputSnafu {
                path: &button.path,
            })?;
            debug!(path = %button.path.display(), "opened input device");
            inputs.push(InputDevice {
                path: button.path.clone(),
                file,
                keys: [0; KEY_BUF_LEN],
            });
        }

        Ok(Self {
            names: buttons.iter().map(|button| button.name).collect(),
            buttons,
            inputs,
        })
    }

    /// Returns the button definitions.
    #[must_use]
    pub fn definitions(&self) -> &[EvioButton] {
        &self.buttons
    }

    fn keys_of(&self, path: &Path) -> Option<&[u8]> {
        self.inputs
            .iter()
            .find(|input| input.path == path)
            .map(|input| &input.keys[..])
    }
}

impl ButtonSource for EvioButtons {
    fn buttons(&self) -> &[&'static str] {
        &self.names
    }

    fn pressed(&mut self) -> Result<BTreeSet<&'static str>, ButtonError> {
        for input in &mut self.inputs {
            input.read_keys()?;
        }

        Ok(self
            .buttons
            .iter()
            .filter(|button| {
                self.keys_of(&button.path)
                    .is_some_and(|keys| key_pressed(keys, button.code))
            })
            .map(|button| button.name)
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_number() {
        assert_eq!(KEY_BUF_LEN, 96);
        assert_eq!(EVIOCGKEY, 0x8060_4518);
    }

    #[test]
    fn key_bits() {
        let mut keys = [0u8; KEY_BUF_LEN];
        keys[28 / 8] |= 1 << (28 % 8);
        keys[108 / 8] |= 1 << (108 % 8);

        assert!(key_pressed(&keys, 28));
        assert!(key_pressed(&keys, 108));
        assert!(!key_pressed(&keys, 103));
        assert!(!key_pressed(&keys, 0x3FF));
    }

    #[test]
    fn missing_input_device() {
        let dir = tempfile::tempdir().unwrap();
        let result = EvioButtons::new(vec![EvioButton::new(
            "enter",
            dir.path().join("event0"),
            28,
        )]);
        assert!(matches!(result, Err(ButtonError::OpenInput { .. })));
    }

    #[test]
    fn regular_files_are_not_input_devices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event0");
        std::fs::write(&path, b"").unwrap();

        let mut buttons = EvioButtons::new(vec![
            EvioButton::new("up", &path, 103),
            EvioButton::new("down", &path, 108),
        ])
        .unwrap();
        assert_eq!(buttons.buttons(), ["up", "down"]);
        assert!(matches!(buttons.pressed(), Err(ButtonError::ReadKeys { .. })));
    }
}
