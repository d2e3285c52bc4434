use std::{
    fmt, panic,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use ev3dev_core::DeviceError;
use ev3dev_devices::motor::{Motor, MotorState, TachoMotor};
use tracing::{debug, warn};

/// How a monitored motion ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MotionOutcome {
    /// Both motors reached their target and are holding it.
    Completed,
    /// A motor stopped moving before reaching its target.
    Stalled,
    /// Monitoring was stopped before the motion ended.
    Cancelled,
    /// The motors could not be read.
    Failed,
}

type Callback = Box<dyn FnOnce() + Send>;

/// Closures called by a [`MotionMonitor`] from its background thread.
#[derive(Default)]
pub struct MotionCallbacks {
    on_start: Option<Callback>,
    on_complete: Option<Callback>,
    on_stalled: Option<Callback>,
}

impl MotionCallbacks {
    /// Creates an empty set of callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once monitoring starts.
    #[must_use]
    pub fn on_start(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    /// Called when the motion completes.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Called when a motor stalls.
    #[must_use]
    pub fn on_stalled(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_stalled = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for MotionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_stalled", &self.on_stalled.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct Task {
    stop: Arc<AtomicBool>,
    outcome: mpsc::Receiver<MotionOutcome>,
    thread: JoinHandle<()>,
}

/// Watches a pair of motors until the motion they perform ends.
///
/// A motion is complete once both motors hold their position. A motor whose position did not
/// change between two polls while not holding is stalled.
#[derive(Debug)]
#[must_use = "dropping the monitor loses track of the motion"]
pub struct MotionMonitor {
    task: Option<Task>,
    stalled: Arc<AtomicBool>,
    outcome: Option<MotionOutcome>,
}

impl MotionMonitor {
    /// Period between two looks at the motors.
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Starts watching `motors` in a background thread.
    pub fn start(motors: Arc<[TachoMotor; 2]>, callbacks: MotionCallbacks) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stalled = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();

        let thread = thread::spawn({
            let stop = Arc::clone(&stop);
            let stalled = Arc::clone(&stalled);
            move || {
                let outcome = watch(&motors, callbacks, &stop, &stalled);
                debug!(?outcome, "motion ended");
                // The monitor may have been dropped.
                let _ = sender.send(outcome);
            }
        });

        Self {
            task: Some(Task {
                stop,
                outcome: receiver,
                thread,
            }),
            stalled,
            outcome: None,
        }
    }

    /// A monitor for a motion that does nothing. It is never running and never stalled.
    pub fn null() -> Self {
        Self {
            task: None,
            stalled: Arc::new(AtomicBool::new(false)),
            outcome: Some(MotionOutcome::Completed),
        }
    }

    /// Determines whether the motion was interrupted by a stalled motor.
    #[must_use]
    pub fn stalled(&self) -> bool {
        self.stalled.load(Ordering::Acquire)
    }

    /// Determines whether the motion is still being watched.
    #[must_use]
    pub fn running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.thread.is_finished())
    }

    /// Returns how the motion ended, once a call to [`MotionMonitor::wait`] or
    /// [`MotionMonitor::stop`] has seen it end.
    #[must_use]
    pub const fn outcome(&self) -> Option<MotionOutcome> {
        self.outcome
    }

    /// Waits for the motion to end, at most `timeout` if given.
    ///
    /// On timeout `None` is returned and monitoring is stopped, so no callback fires later.
    /// A panic raised by a callback is propagated to the caller.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Option<MotionOutcome> {
        if self.outcome.is_none() {
            let task = self.task.as_ref()?;
            let received = match timeout {
                None => task.outcome.recv().ok(),
                Some(timeout) => match task.outcome.recv_timeout(timeout) {
                    Ok(outcome) => Some(outcome),
                    Err(RecvTimeoutError::Timeout) => {
                        debug!(?timeout, "motion still running, stopping monitor");
                        task.stop.store(true, Ordering::Release);
                        return None;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                },
            };
            self.finish(received);
        }
        self.outcome
    }

    /// Stops monitoring and waits for the background thread to exit.
    ///
    /// The motors are not stopped. A panic raised by a callback is propagated to the caller.
    pub fn stop(&mut self) -> MotionOutcome {
        if let Some(task) = &self.task {
            task.stop.store(true, Ordering::Release);
            let received = task.outcome.recv().ok();
            self.finish(received);
        }
        self.outcome.unwrap_or(MotionOutcome::Cancelled)
    }

    fn finish(&mut self, received: Option<MotionOutcome>) {
        if let Some(task) = self.task.take() {
            if let Err(payload) = task.thread.join() {
                panic::resume_unwind(payload);
            }
        }
        self.outcome = Some(received.unwrap_or(MotionOutcome::Failed));
    }
}

fn sample(motors: &[TachoMotor; 2]) -> Result<[(MotorState, i32); 2], DeviceError> {
    let [left, right] = motors;
    Ok([
        (left.state()?, left.position()?),
        (right.state()?, right.position()?),
    ])
}

fn watch(
    motors: &[TachoMotor; 2],
    callbacks: MotionCallbacks,
    stop: &AtomicBool,
    stalled: &AtomicBool,
) -> MotionOutcome {
    let MotionCallbacks {
        on_start,
        on_complete,
        on_stalled,
    } = callbacks;

    if let Some(on_start) = on_start {
        on_start();
    }

    let mut previous: Option<[i32; 2]> = None;
    while !stop.load(Ordering::Acquire) {
        let samples = match sample(motors) {
            Ok(samples) => samples,
            Err(err) => {
                warn!(%err, "could not read motors while monitoring a motion");
                return MotionOutcome::Failed;
            }
        };

        if samples
            .iter()
            .all(|(state, _)| state.contains(MotorState::HOLDING))
        {
            if let Some(on_complete) = on_complete {
                on_complete();
            }
            return MotionOutcome::Completed;
        }

        if let Some(previous) = previous {
            let stuck = previous
                .iter()
                .zip(&samples)
                .any(|(before, (state, now))| before == now && !state.contains(MotorState::HOLDING));
            if stuck {
                stalled.store(true, Ordering::Release);
                if let Some(on_stalled) = on_stalled {
                    on_stalled();
                }
                return MotionOutcome::Stalled;
            }
        }

        previous = Some(samples.map(|(_, position)| position));
        thread::sleep(MotionMonitor::POLL_INTERVAL);
    }

    MotionOutcome::Cancelled
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use ev3dev_core::mock::MockSysfs;
    use ev3dev_devices::PluggedDevice;

    use super::*;

    fn motors(sysfs: &MockSysfs, states: [&str; 2]) -> Arc<[TachoMotor; 2]> {
        for (i, state) in states.into_iter().enumerate() {
            sysfs
                .add_device(
                    "tacho-motor",
                    &format!("motor{i}"),
                    &[
                        ("port_name", ["outB", "outC"][i]),
                        ("state", state),
                        ("position", "10"),
                    ],
                )
                .unwrap();
        }
        Arc::new([
            TachoMotor::new_in(&sysfs.root(), Some("outB")).unwrap(),
            TachoMotor::new_in(&sysfs.root(), Some("outC")).unwrap(),
        ])
    }

    fn recording(events: &Arc<Mutex<Vec<&'static str>>>) -> MotionCallbacks {
        let record = |event: &'static str| {
            let events = Arc::clone(events);
            move || events.lock().unwrap().push(event)
        };
        MotionCallbacks::new()
            .on_start(record("start"))
            .on_complete(record("complete"))
            .on_stalled(record("stalled"))
    }

    #[test]
    fn holding_motors_complete() {
        let sysfs = MockSysfs::new().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));

        let mut monitor = MotionMonitor::start(motors(&sysfs, ["holding", "holding"]), recording(&events));
        assert_eq!(
            monitor.wait(Some(Duration::from_secs(5))),
            Some(MotionOutcome::Completed)
        );
        assert!(!monitor.running());
        assert!(!monitor.stalled());
        assert_eq!(*events.lock().unwrap(), ["start", "complete"]);
    }

    #[test]
    fn motionless_motor_stalls() {
        let sysfs = MockSysfs::new().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));

        let mut monitor = MotionMonitor::start(motors(&sysfs, ["running", "holding"]), recording(&events));
        assert_eq!(monitor.wait(None), Some(MotionOutcome::Stalled));
        assert!(monitor.stalled());
        assert_eq!(*events.lock().unwrap(), ["start", "stalled"]);
    }

    #[test]
    fn timeout_stops_monitoring() {
        let sysfs = MockSysfs::new().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));

        let mut monitor = MotionMonitor::start(motors(&sysfs, ["running", "running"]), recording(&events));
        assert_eq!(monitor.wait(Some(Duration::from_millis(10))), None);
        assert_eq!(monitor.wait(None), Some(MotionOutcome::Cancelled));
        assert!(!monitor.stalled());
        assert_eq!(*events.lock().unwrap(), ["start"]);
    }

    #[test]
    fn stop_cancels() {
        let sysfs = MockSysfs::new().unwrap();
        let mut monitor = MotionMonitor::start(motors(&sysfs, ["running", "running"]), MotionCallbacks::new());
        assert_eq!(monitor.stop(), MotionOutcome::Cancelled);
        assert_eq!(monitor.outcome(), Some(MotionOutcome::Cancelled));
    }

    #[test]
    fn unreadable_motor_fails() {
        let sysfs = MockSysfs::new().unwrap();
        let motors = motors(&sysfs, ["running", "running"]);
        sysfs.remove_device("tacho-motor", "motor1").unwrap();

        let mut monitor = MotionMonitor::start(motors, MotionCallbacks::new());
        assert_eq!(monitor.wait(None), Some(MotionOutcome::Failed));
    }

    #[test]
    fn null_monitor() {
        let mut monitor = MotionMonitor::null();
        assert!(!monitor.running());
        assert!(!monitor.stalled());
        assert_eq!(monitor.wait(Some(Duration::ZERO)), Some(MotionOutcome::Completed));
        assert_eq!(monitor.stop(), MotionOutcome::Completed);
    }
}
