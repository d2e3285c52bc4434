//! Draws a frame and a circle on the LCD.

use std::{error::Error, f64::consts::PI, thread::sleep, time::Duration};

use embedded_graphics_core::{pixelcolor::Rgb888, prelude::*};
use ev3dev::display::{self, Screen};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut screen = Screen::new()?;
    let (width, height) = screen.shape();
    let (w, h) = (width as i32 - 1, height as i32 - 1);
    info!(width, height, "drawing");

    display::hide_cursor()?;

    let frame = (0..=w)
        .flat_map(|x| [Point::new(x, 0), Point::new(x, h)])
        .chain((0..=h).flat_map(|y| [Point::new(0, y), Point::new(w, y)]));

    let (cx, cy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let (rx, ry) = (f64::from(w) / 4.0, f64::from(h) / 4.0);
    let circle = (0..720).map(|i| {
        let angle = f64::from(i) * PI / 360.0;
        Point::new(
            (cx + rx * angle.cos()).round() as i32,
            (cy + ry * angle.sin()).round() as i32,
        )
    });

    screen.draw_iter(frame.chain(circle).map(|point| Pixel(point, Rgb888::BLACK)))?;
    screen.update()?;

    sleep(Duration::from_secs(5));
    display::show_cursor()?;
    Ok(())
}
