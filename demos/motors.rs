//! Runs the motors connected to outB and outC in sync.

use std::{thread::sleep, time::Duration};

use ev3dev::{motor::MotorState, prelude::*};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn wait_until_holding(motors: &[LargeMotor]) -> Result<(), DeviceError> {
    info!("waiting for the motion to complete");
    for motor in motors {
        while !motor.state()?.contains(MotorState::HOLDING) {
            sleep(Duration::from_millis(100));
        }
    }
    info!("complete");
    Ok(())
}

fn main() -> Result<(), DeviceError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let motors = [
        LargeMotor::new(Some(ev3::OUTPUT_B))?,
        LargeMotor::new(Some(ev3::OUTPUT_C))?,
    ];

    let settings = MotorSettings::new()
        .duty_cycle_sp(100)
        .stop_command(StopCommand::Brake)
        .ramp_up_sp(500)
        .ramp_down_sp(500);
    for motor in &motors {
        motor.reset()?;
        motor.apply(&settings)?;
    }

    info!("two turns forward");
    for motor in &motors {
        motor.run_to_rel_pos(360 * 2, &MotorSettings::new())?;
    }
    wait_until_holding(&motors)?;
    sleep(Duration::from_millis(500));

    info!("the same backwards");
    for motor in &motors {
        motor.run_to_rel_pos(-360 * 2, &MotorSettings::new())?;
    }
    wait_until_holding(&motors)?;
    sleep(Duration::from_millis(500));

    for motor in &motors {
        motor.reset()?;
    }
    info!("that's all folks");
    Ok(())
}
