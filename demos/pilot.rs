//! Drives a two wheeled robot around with a differential pilot.

use std::{
    error::Error,
    sync::{Arc, Mutex},
    thread::sleep,
    time::{Duration, Instant},
};

use ev3dev::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const WAIT: Option<Duration> = Some(Duration::from_secs(5));

fn callbacks() -> MotionCallbacks {
    let started = Arc::new(Mutex::new(None));
    MotionCallbacks::new()
        .on_start({
            let started = Arc::clone(&started);
            move || {
                *started.lock().unwrap() = Some(Instant::now());
                info!("started");
            }
        })
        .on_complete(move || {
            if let Some(start) = *started.lock().unwrap() {
                info!("completed in {:.1}s", start.elapsed().as_secs_f64());
            }
        })
        .on_stalled(|| warn!("stalled"))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut pilot = DifferentialPilot::new(
        43.2,
        140.0,
        LargeMotor::new(Some(ev3::OUTPUT_B))?,
        LargeMotor::new(Some(ev3::OUTPUT_C))?,
        false,
        &MotorSettings::new().ramp_up_sp(500),
    )?;
    pilot.set_travel_speed(100.0);
    pilot.set_rotate_speed(90.0);

    let mut motion = pilot.travel(200.0, None, callbacks())?;
    info!("waiting");
    match motion.wait(WAIT) {
        None => info!("not enough time"),
        Some(_) if motion.stalled() => info!("obstacle found"),
        Some(_) => info!("success"),
    }

    pilot.travel(-200.0, Some(50.0), callbacks())?.wait(WAIT);
    info!("back home");

    info!("forward forever");
    pilot.forward(None)?;
    sleep(Duration::from_secs(1));
    pilot.stop(None)?;

    info!("backward forever");
    pilot.backward(Some(50.0))?;
    sleep(Duration::from_secs(2));
    pilot.stop(None)?;

    info!("rotate 90 left");
    pilot.rotate_left(90.0, None, callbacks())?.wait(WAIT);
    info!("rotate 90 right");
    pilot.rotate_right(90.0, Some(45.0), callbacks())?.wait(WAIT);

    info!("arc left forward");
    pilot.arc(140.0, 90.0, None, MotionCallbacks::new())?.wait(WAIT);
    info!("arc left backward");
    pilot.arc(140.0, -90.0, None, MotionCallbacks::new())?.wait(WAIT);

    info!("null radius arcs");
    pilot.arc(0.0, 90.0, None, MotionCallbacks::new())?.wait(WAIT);
    pilot.arc(0.0, -90.0, None, MotionCallbacks::new())?.wait(WAIT);

    info!("steering");
    pilot.steer_angle(50.0, 180.0, None, MotionCallbacks::new())?.wait(WAIT);

    sleep(Duration::from_secs(3));
    pilot.stop(Some(StopCommand::Coast))?;
    Ok(())
}
