//! Shows how to use the two red-green LEDs of the EV3 brick.

use std::{f64::consts::PI, thread::sleep, time::Duration};

use ev3dev::{ev3::Leds, prelude::*};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), DeviceError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let leds = Leds::new()?;
    leds.all_off()?;
    sleep(Duration::from_secs(1));

    info!("cycling colors");
    for _ in 0..3 {
        for color in [Leds::green_on, Leds::amber_on, Leds::red_on] {
            color(&leds)?;
            sleep(Duration::from_millis(500));
        }
    }
    leds.all_off()?;
    sleep(Duration::from_millis(500));

    info!("one LED at a time");
    for _ in 0..3 {
        for led in [leds.red_left(), leds.red_right(), leds.green_left(), leds.green_right()] {
            led.set_brightness_pct(1.0)?;
            sleep(Duration::from_millis(500));
            led.set_brightness_pct(0.0)?;
        }
    }
    leds.all_off()?;
    sleep(Duration::from_millis(500));

    info!("fading");
    for i in 0..360 {
        let angle = f64::from(10 * i) * PI / 180.0;
        leds.red_left().set_brightness_pct(0.5 * (1.0 + angle.cos()))?;
        leds.green_left().set_brightness_pct(0.5 * (1.0 + angle.sin()))?;
        leds.red_right().set_brightness_pct(0.5 * (1.0 + angle.sin()))?;
        leds.green_right().set_brightness_pct(0.5 * (1.0 + angle.cos()))?;
        sleep(Duration::from_millis(50));
    }

    leds.all_off()
}
