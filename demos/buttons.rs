//! Logs the brick buttons as they are pressed and released, until BACK is pressed.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::sleep,
    time::Duration,
};

use ev3dev::{button::ButtonError, ev3, prelude::*};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), ButtonError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut buttons = ButtonManager::new(ev3::buttons()?);
    let done = Arc::new(AtomicBool::new(false));

    buttons.on_change(|changes| {
        for &(button, pressed) in changes {
            info!(button, pressed, "button changed");
        }
    });
    buttons.on_button(ev3::BACK, {
        let done = Arc::clone(&done);
        move |_| done.store(true, Ordering::Release)
    });

    info!("press brick buttons (BACK to exit)");
    while !done.load(Ordering::Acquire) {
        buttons.process()?;
        sleep(Duration::from_millis(100));
    }

    info!("demo ending");
    Ok(())
}
