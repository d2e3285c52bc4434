//! Buttons.
//!
//! A [`ButtonSource`] reports which buttons are currently held. The brick buttons are read
//! from the Linux input subsystem ([`EvioButtons`]); the buttons of an infrared remote are read
//! through the infrared sensor ([`RemoteControl`](crate::sensor::RemoteControl)).
//!
//! [`ButtonManager`] turns a source into events. Each call to [`ButtonManager::process`]
//! compares the new state with the previous one and calls the registered handlers for every
//! button that changed:
//!
//! ```no_run
//! use ev3dev_devices::{button::ButtonManager, ev3};
//!
//! let mut buttons = ButtonManager::new(ev3::buttons().unwrap());
//! buttons.on_button("enter", |pressed| println!("enter {}", if pressed { "down" } else { "up" }));
//!
//! let scanner = buttons.start_scanner();
//! std::thread::sleep(std::time::Duration::from_secs(10));
//! let buttons = scanner.stop();
//! ```

mod evio;

use std::{
    collections::{BTreeSet, HashMap},
    fmt, io, panic,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use ev3dev_core::DeviceError;
pub use evio::{EVIOCGKEY, EvioButton, EvioButtons, KEY_BUF_LEN, KEY_MAX, key_pressed};
use snafu::Snafu;
use tracing::{debug, warn};

/// Errors that can occur when reading buttons.
#[derive(Debug, Snafu)]
pub enum ButtonError {
    /// An input device could not be opened.
    #[snafu(display("Could not open input device {}: {source}", path.display()))]
    OpenInput {
        /// The input device path
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The key state of an input device could not be read.
    #[snafu(display("Could not read the key state of {}: {source}", path.display()))]
    ReadKeys {
        /// The input device path
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// Generic device error.
    #[snafu(display("{source}"), context(false))]
    Device {
        /// The source of the error.
        source: DeviceError,
    },
}

/// Something that knows which of its buttons are held.
pub trait ButtonSource {
    /// Returns the names of every button this source reports.
    fn buttons(&self) -> &[&'static str];

    /// Returns the names of the buttons currently held.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device could not be read.
    fn pressed(&mut self) -> Result<BTreeSet<&'static str>, ButtonError>;
}

/// A change of one button: its name and whether it is now pressed.
pub type ButtonChange = (&'static str, bool);

type ButtonHandler = Box<dyn FnMut(bool) + Send>;
type ChangeHandler = Box<dyn FnMut(&[ButtonChange]) + Send>;

/// Turns a [`ButtonSource`] into button events.
pub struct ButtonManager<S> {
    source: S,
    state: BTreeSet<&'static str>,
    handlers: HashMap<&'static str, ButtonHandler>,
    on_change: Option<ChangeHandler>,
}

impl<S: ButtonSource> ButtonManager<S> {
    /// Period of the background scanner.
    pub const SCAN_INTERVAL: Duration = Duration::from_millis(100);

    /// Creates a manager that considers every button released.
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: BTreeSet::new(),
            handlers: HashMap::new(),
            on_change: None,
        }
    }

    /// Returns the button source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the state seen by the last call to [`ButtonManager::process`].
    pub const fn last_state(&self) -> &BTreeSet<&'static str> {
        &self.state
    }

    /// Registers the handler called with the new state whenever `button` changes.
    ///
    /// A later registration for the same button replaces the earlier one.
    pub fn on_button(&mut self, button: &'static str, handler: impl FnMut(bool) + Send + 'static) {
        self.handlers.insert(button, Box::new(handler));
    }

    /// Registers the handler called with every non-empty list of changes.
    pub fn on_change(&mut self, handler: impl FnMut(&[ButtonChange]) + Send + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    /// Returns the names of the buttons currently held.
    ///
    /// # Errors
    ///
    /// See [`ButtonSource::pressed`].
    pub fn pressed(&mut self) -> Result<BTreeSet<&'static str>, ButtonError> {
        self.source.pressed()
    }

    /// Determines whether any button is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonSource::pressed`].
    pub fn any(&mut self) -> Result<bool, ButtonError> {
        Ok(!self.pressed()?.is_empty())
    }

    /// Determines whether exactly the buttons in `buttons` are held.
    ///
    /// # Errors
    ///
    /// See [`ButtonSource::pressed`].
    pub fn check_buttons(&mut self, buttons: &[&str]) -> Result<bool, ButtonError> {
        let expected: BTreeSet<&str> = buttons.iter().copied().collect();
        let pressed = self.pressed()?;
        Ok(pressed.len() == expected.len() && pressed.iter().all(|b| expected.contains(b)))
    }

    /// Determines whether `button` is held.
    ///
    /// # Errors
    ///
    /// See [`ButtonSource::pressed`].
    pub fn is_pressed(&mut self, button: &str) -> Result<bool, ButtonError> {
        Ok(self.pressed()?.contains(button))
    }

    /// Reads the buttons and dispatches events for every change since the last call.
    ///
    /// Button handlers run first, in button name order, followed by the change handler.
    ///
    /// # Errors
    ///
    /// See [`ButtonSource::pressed`]. The previous state is kept on error.
    pub fn process(&mut self) -> Result<Vec<ButtonChange>, ButtonError> {
        let new_state = self.source.pressed()?;
        let changes: Vec<ButtonChange> = self
            .state
            .symmetric_difference(&new_state)
            .map(|&button| (button, new_state.contains(button)))
            .collect();
        self.state = new_state;

        for &(button, pressed) in &changes {
            debug!(button, pressed, "button changed");
            if let Some(handler) = self.handlers.get_mut(button) {
                handler(pressed);
            }
        }

        if !changes.is_empty() {
            if let Some(on_change) = &mut self.on_change {
                on_change(&changes);
            }
        }

        Ok(changes)
    }
}

impl<S: ButtonSource + Send + 'static> ButtonManager<S> {
    /// Moves the manager into a thread that calls [`ButtonManager::process`] every
    /// [`ButtonManager::SCAN_INTERVAL`]. Handlers run on that thread.
    ///
    /// Read errors are logged and scanning continues.
    #[must_use = "dropping the handle leaves the scanner running"]
    pub fn start_scanner(mut self) -> ScannerHandle<S> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = thread::spawn({
            let stop = Arc::clone(&stop);
            move || {
                while !stop.load(Ordering::Acquire) {
                    if let Err(err) = self.process() {
                        warn!(%err, "button scan failed");
                    }
                    thread::sleep(Self::SCAN_INTERVAL);
                }
                self
            }
        });

        ScannerHandle { stop, thread }
    }
}

impl<S: fmt::Debug> fmt::Debug for ButtonManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonManager")
            .field("source", &self.source)
            .field("state", &self.state)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// A running background scanner.
#[derive(Debug)]
pub struct ScannerHandle<S> {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<ButtonManager<S>>,
}

impl<S> ScannerHandle<S> {
    /// Determines whether the scanner thread is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Stops the scanner, waits for it to exit and hands the manager back.
    ///
    /// A panic raised by a handler is propagated to the caller.
    pub fn stop(self) -> ButtonManager<S> {
        self.stop.store(true, Ordering::Release);
        match self.thread.join() {
            Ok(manager) => manager,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default, Clone)]
    struct FakeButtons {
        held: Arc<Mutex<BTreeSet<&'static str>>>,
    }

    impl FakeButtons {
        fn hold(&self, buttons: &[&'static str]) {
            *self.held.lock().unwrap() = buttons.iter().copied().collect();
        }
    }

    impl ButtonSource for FakeButtons {
        fn buttons(&self) -> &[&'static str] {
            &["up", "down", "enter"]
        }

        fn pressed(&mut self) -> Result<BTreeSet<&'static str>, ButtonError> {
            Ok(self.held.lock().unwrap().clone())
        }
    }

    #[test]
    fn queries() {
        let fake = FakeButtons::default();
        let mut manager = ButtonManager::new(fake.clone());
        assert!(!manager.any().unwrap());

        fake.hold(&["up", "enter"]);
        assert!(manager.any().unwrap());
        assert!(manager.is_pressed("enter").unwrap());
        assert!(manager.check_buttons(&["enter", "up"]).unwrap());
        assert!(!manager.check_buttons(&["up"]).unwrap());
    }

    #[test]
    fn process_reports_changes() {
        let fake = FakeButtons::default();
        let mut manager = ButtonManager::new(fake.clone());

        let events = Arc::new(Mutex::new(Vec::new()));
        let changes = Arc::new(Mutex::new(Vec::new()));
        manager.on_button("up", {
            let events = Arc::clone(&events);
            move |pressed| events.lock().unwrap().push(pressed)
        });
        manager.on_change({
            let changes = Arc::clone(&changes);
            move |list: &[ButtonChange]| changes.lock().unwrap().push(list.to_vec())
        });

        assert!(manager.process().unwrap().is_empty());

        fake.hold(&["up", "down"]);
        assert_eq!(
            manager.process().unwrap(),
            [("down", true), ("up", true)]
        );

        fake.hold(&["down"]);
        assert_eq!(manager.process().unwrap(), [("up", false)]);
        assert!(manager.process().unwrap().is_empty());

        assert_eq!(*events.lock().unwrap(), [true, false]);
        assert_eq!(changes.lock().unwrap().len(), 2);
    }

    #[test]
    fn scanner_dispatches_in_background() {
        let fake = FakeButtons::default();
        let mut manager = ButtonManager::new(fake.clone());

        let events = Arc::new(Mutex::new(Vec::new()));
        manager.on_button("enter", {
            let events = Arc::clone(&events);
            move |pressed| events.lock().unwrap().push(pressed)
        });

        let scanner = manager.start_scanner();
        assert!(scanner.is_running());

        fake.hold(&["enter"]);
        thread::sleep(Duration::from_millis(400));
        fake.hold(&[]);
        thread::sleep(Duration::from_millis(400));

        let manager = scanner.stop();
        assert!(manager.last_state().is_empty());
        assert_eq!(*events.lock().unwrap(), [true, false]);
    }
}
