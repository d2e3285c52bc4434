//! Plays a few bars on the brick speaker, then says goodbye.

use std::error::Error;

use ev3dev::sound::{self, SpeakOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

// A long time ago in a galaxy far, far away...
const SONG: &[(&str, &str)] = &[
    ("D4", "e3"),
    ("D4", "e3"),
    ("D4", "e3"),
    ("G4", "h"),
    ("D5", "h"),
    ("C5", "e3"),
    ("B4", "e3"),
    ("A4", "e3"),
    ("G5", "h"),
    ("D5", "q"),
    ("C5", "e3"),
    ("B4", "e3"),
    ("A4", "e3"),
    ("G5", "h"),
    ("D5", "q"),
    ("C5", "e3"),
    ("B4", "e3"),
    ("C5", "e3"),
    ("A4", "h."),
];

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("playing");
    sound::play_song(SONG, 120, 50)?.wait()?;

    sound::speak("That's all folks", &SpeakOptions::default())?.wait()?;
    Ok(())
}
