//! Beeps, tones, songs, sound files and speech.
//!
//! Everything here runs an external program (`beep`, `aplay`, `espeak`) and returns as soon as
//! it has started. The returned [`Playback`] can be waited on or killed.
//!
//! ```no_run
//! use ev3dev_devices::sound;
//!
//! sound::speak("Hello, I am Robot", &sound::SpeakOptions::default())
//!     .unwrap()
//!     .wait()
//!     .unwrap();
//! ```

use std::{
    ffi::OsStr,
    io,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
};

use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, warn};

const BEEP: &str = "/usr/bin/beep";
const APLAY: &str = "/usr/bin/aplay";
const ESPEAK: &str = "/usr/bin/espeak";

/// Rounded frequencies in Hz of the notes C0 to B8, a semitone apart.
const NOTE_FREQUENCIES: [u16; 108] = [
    16, 17, 18, 19, 21, 22, 23, 24, 26, 28, 29, 31, // 0
    33, 35, 37, 39, 41, 44, 46, 49, 52, 55, 58, 62, // 1
    65, 69, 73, 78, 82, 87, 92, 98, 104, 110, 117, 123, // 2
    131, 139, 147, 156, 165, 175, 185, 196, 208, 220, 233, 247, // 3
    262, 277, 294, 311, 330, 349, 370, 392, 415, 440, 466, 494, // 4
    523, 554, 587, 622, 659, 698, 740, 784, 831, 880, 932, 988, // 5
    1046, 1109, 1175, 1245, 1319, 1397, 1480, 1568, 1661, 1760, 1865, 1976, // 6
    2093, 2217, 2349, 2489, 2637, 2794, 2960, 3136, 3322, 3520, 3729, 3951, // 7
    4186, 4435, 4699, 4978, 5274, 5588, 5920, 6272, 6645, 7040, 7459, 7902, // 8
];

/// Errors that can occur when making sounds.
#[derive(Debug, Snafu)]
pub enum SoundError {
    /// A sound program could not be started.
    #[snafu(display("Could not run {program}: {source}"))]
    Spawn {
        /// The program
        program: &'static str,
        /// The underlying I/O error
        source: io::Error,
    },

    /// Waiting for or killing a sound program failed.
    #[snafu(display("Could not control the sound program: {source}"))]
    Control {
        /// The underlying I/O error
        source: io::Error,
    },

    /// A song contains a note name that is not in the note table.
    #[snafu(display("Unknown note {note:?}"))]
    UnknownNote {
        /// The offending note
        note: String,
    },

    /// A song was given a tempo of zero.
    #[snafu(display("A song needs a tempo above zero"))]
    InvalidTempo,

    /// A song contains a note value that cannot be parsed.
    #[snafu(display("Unknown note value {value:?}"))]
    UnknownValue {
        /// The offending value
        value: String,
    },
}

/// Running sound programs.
///
/// Speech runs two programs connected by a pipe; everything else runs one.
#[derive(Debug)]
pub struct Playback {
    children: Vec<Child>,
}

impl Playback {
    /// Waits for every program to exit and returns the status of the last one.
    ///
    /// # Errors
    ///
    /// A [`SoundError::Control`] error is returned if waiting fails.
    pub fn wait(mut self) -> Result<ExitStatus, SoundError> {
        let mut status = None;
        for child in &mut self.children {
            status = Some(child.wait().context(ControlSnafu)?);
        }
        status
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
            .context(ControlSnafu)
    }

    /// Determines whether every program has exited.
    ///
    /// # Errors
    ///
    /// A [`SoundError::Control`] error is returned if a status cannot be queried.
    pub fn is_finished(&mut self) -> Result<bool, SoundError> {
        for child in &mut self.children {
            if child.try_wait().context(ControlSnafu)?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Kills every program that is still running.
    ///
    /// # Errors
    ///
    /// A [`SoundError::Control`] error is returned if a program cannot be killed.
    pub fn kill(mut self) -> Result<(), SoundError> {
        for child in &mut self.children {
            if child.try_wait().context(ControlSnafu)?.is_none() {
                child.kill().context(ControlSnafu)?;
                child.wait().context(ControlSnafu)?;
            }
        }
        Ok(())
    }
}

fn spawn(program: &'static str, command: &mut Command) -> Result<Child, SoundError> {
    debug!(
        program,
        args = ?command.get_args().collect::<Vec<_>>(),
        "starting sound program"
    );
    command.spawn().context(SpawnSnafu { program })
}

fn beep_command<I, S>(args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(BEEP);
    command.args(args).stdout(Stdio::null());
    command
}

/// Runs `beep` with the given arguments.
///
/// # Errors
///
/// A [`SoundError::Spawn`] error is returned if `beep` cannot be started.
pub fn beep<I, S>(args: I) -> Result<Playback, SoundError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = spawn(BEEP, &mut beep_command(args))?;
    Ok(Playback {
        children: vec![child],
    })
}

/// One tone of a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Frequency in Hz.
    pub frequency: f64,
    /// Length in milliseconds, or the `beep` default.
    pub duration: Option<u32>,
    /// Pause after the tone in milliseconds, or the `beep` default.
    pub delay: Option<u32>,
}

impl Tone {
    /// A tone of `frequency` Hz lasting `duration` milliseconds.
    #[must_use]
    pub const fn new(frequency: f64, duration: u32) -> Self {
        Self {
            frequency,
            duration: Some(duration),
            delay: None,
        }
    }

    /// Sets the pause after the tone.
    #[must_use]
    pub const fn delay(mut self, delay: u32) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl From<(f64, u32)> for Tone {
    fn from((frequency, duration): (f64, u32)) -> Self {
        Self::new(frequency, duration)
    }
}

impl From<(f64, u32, u32)> for Tone {
    fn from((frequency, duration, delay): (f64, u32, u32)) -> Self {
        Self::new(frequency, duration).delay(delay)
    }
}

/// Builds the `beep` arguments playing `tones` in order.
#[must_use]
pub fn tone_args(tones: &[Tone]) -> Vec<String> {
    let mut args = Vec::new();
    for (i, tone) in tones.iter().enumerate() {
        if i > 0 {
            args.push("-n".to_owned());
        }
        args.extend(["-f".to_owned(), tone.frequency.to_string()]);
        if let Some(duration) = tone.duration {
            args.extend(["-l".to_owned(), duration.to_string()]);
        }
        if let Some(delay) = tone.delay {
            args.extend(["-D".to_owned(), delay.to_string()]);
        }
    }
    args
}

/// Plays a tone of `frequency` Hz for `duration` milliseconds.
///
/// # Errors
///
/// A [`SoundError::Spawn`] error is returned if `beep` cannot be started.
pub fn tone(frequency: f64, duration: u32) -> Result<Playback, SoundError> {
    tone_sequence(&[Tone::new(frequency, duration)])
}

/// Plays a sequence of tones.
///
/// # Errors
///
/// A [`SoundError::Spawn`] error is returned if `beep` cannot be started.
pub fn tone_sequence(tones: &[Tone]) -> Result<Playback, SoundError> {
    beep(tone_args(tones))
}

/// Plays a WAV file with `aplay`.
///
/// # Errors
///
/// A [`SoundError::Spawn`] error is returned if `aplay` cannot be started.
pub fn play(wav: impl AsRef<Path>) -> Result<Playback, SoundError> {
    let child = spawn(
        APLAY,
        Command::new(APLAY)
            .arg(wav.as_ref())
            .stdout(Stdio::null())
            .stderr(Stdio::null()),
    )?;
    Ok(Playback {
        children: vec![child],
    })
}

/// Looks up the rounded frequency of a note such as `A4`, `D#3` or `Gb5`.
///
/// Letters are case-insensitive. Sharps are written `#` and flats `b`.
///
/// # Errors
///
/// A [`SoundError::UnknownNote`] error is returned for names outside C0 to B8.
pub fn note_frequency(note: &str) -> Result<u16, SoundError> {
    let unknown = || UnknownNoteSnafu { note }.build();

    let mut chars = note.chars();
    let semitone: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(unknown()),
    };

    let rest = chars.as_str();
    let (semitone, octave) = match rest.as_bytes().first() {
        // E and B have no sharp, C and F have no flat.
        Some(b'#') if !matches!(semitone, 4 | 11) => (semitone + 1, &rest[1..]),
        Some(b'b' | b'B') if !matches!(semitone, 0 | 5) => (semitone - 1, &rest[1..]),
        _ => (semitone, rest),
    };

    let octave: u8 = octave.parse().map_err(|_| unknown())?;
    NOTE_FREQUENCIES
        .get(usize::from(octave) * 12 + semitone as usize)
        .copied()
        .ok_or_else(unknown)
}

fn base_fraction(base: &str) -> Option<f64> {
    match base {
        "w" => Some(1.0),
        "h" => Some(0.5),
        "q" => Some(0.25),
        "e" => Some(0.125),
        "s" => Some(0.0625),
        _ => None,
    }
}

/// Computes the length of a note value as a fraction of a whole note.
///
/// Values are `w`, `h`, `q`, `e` and `s`, optionally followed by a divider (`q/3`), a
/// multiplier (`q*1.5`), a dot (`h.`, one and a half) or a `3` (`e3`, a triplet member).
///
/// # Errors
///
/// A [`SoundError::UnknownValue`] error is returned if the value cannot be parsed.
pub fn note_value(value: &str) -> Result<f64, SoundError> {
    let parsed = if let Some((base, factor)) = value.split_once('/') {
        base_fraction(base).zip(factor.parse::<f64>().ok()).map(|(b, f)| b / f)
    } else if let Some((base, factor)) = value.split_once('*') {
        base_fraction(base).zip(factor.parse::<f64>().ok()).map(|(b, f)| b * f)
    } else if let Some(base) = value.strip_suffix('.') {
        base_fraction(base).map(|b| b * 1.5)
    } else if let Some(base) = value.strip_suffix('3') {
        base_fraction(base).map(|b| b * 2.0 / 3.0)
    } else {
        base_fraction(value)
    };

    parsed.context(UnknownValueSnafu { value })
}

/// Builds the `beep` arguments playing a song of `(note, value)` pairs.
///
/// `tempo` is in quarter notes per minute and `delay` is the pause after each note in
/// milliseconds.
///
/// # Errors
///
/// - A [`SoundError::InvalidTempo`] error is returned if `tempo` is zero.
/// - An error is returned for the first unknown note or value.
pub fn song_args(song: &[(&str, &str)], tempo: u32, delay: u32) -> Result<Vec<String>, SoundError> {
    ensure!(tempo > 0, InvalidTempoSnafu);
    let whole_note = 60000.0 / f64::from(tempo) * 4.0;

    let mut args = Vec::new();
    for (i, &(note, value)) in song.iter().enumerate() {
        if i > 0 {
            args.push("-n".to_owned());
        }
        let frequency = note_frequency(note)?;
        let duration = (whole_note * note_value(value)?) as u32;
        args.extend([
            "-f".to_owned(),
            frequency.to_string(),
            "-l".to_owned(),
            duration.to_string(),
            "-D".to_owned(),
            delay.to_string(),
        ]);
    }
    Ok(args)
}

/// Plays a song of `(note, value)` pairs, see [`note_frequency`] and [`note_value`].
///
/// Only 4/4 signatures are supported. The usual tempo is 120 with a delay of 50 ms.
///
/// ```no_run
/// use ev3dev_devices::sound;
///
/// sound::play_song(&[("D4", "e3"), ("D4", "e3"), ("D4", "e3"), ("G4", "h"), ("D5", "h")], 120, 50)
///     .unwrap()
///     .wait()
///     .unwrap();
/// ```
///
/// # Errors
///
/// A zero tempo, unknown notes or unknown values are errors, and nothing is played.
/// A [`SoundError::Spawn`] error is returned if `beep` cannot be started.
pub fn play_song(song: &[(&str, &str)], tempo: u32, delay: u32) -> Result<Playback, SoundError> {
    beep(song_args(song, tempo, delay)?)
}

/// Settings of the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakOptions {
    /// Volume, 0 to 200.
    pub amplitude: u32,
    /// Words per minute.
    pub speed: u32,
    /// espeak voice name.
    pub voice: String,
    /// Extra espeak arguments.
    pub extra: Vec<String>,
}

impl Default for SpeakOptions {
    fn default() -> Self {
        Self {
            amplitude: 200,
            speed: 150,
            voice: "en".to_owned(),
            extra: Vec::new(),
        }
    }
}

impl SpeakOptions {
    /// Builds the `espeak` arguments speaking `text` to standard output.
    #[must_use]
    pub fn args(&self, text: &str) -> Vec<String> {
        let mut args = vec![
            "-a".to_owned(),
            self.amplitude.to_string(),
            "-s".to_owned(),
            self.speed.to_string(),
            "-v".to_owned(),
            self.voice.clone(),
        ];
        args.extend(self.extra.iter().cloned());
        args.extend(["--stdout".to_owned(), text.to_owned()]);
        args
    }
}

/// Speaks `text` with `espeak`, played through `aplay`.
///
/// # Errors
///
/// A [`SoundError::Spawn`] error is returned if either program cannot be started.
pub fn speak(text: &str, options: &SpeakOptions) -> Result<Playback, SoundError> {
    let mut espeak = spawn(
        ESPEAK,
        Command::new(ESPEAK)
            .args(options.args(text))
            .stdout(Stdio::piped())
            .stderr(Stdio::null()),
    )?;

    let Some(speech) = espeak.stdout.take() else {
        // Unreachable with a piped stdout.
        abandon(espeak);
        return Err(io::Error::from(io::ErrorKind::BrokenPipe)).context(SpawnSnafu { program: ESPEAK });
    };

    let aplay = match spawn(
        APLAY,
        Command::new(APLAY)
            .stdin(speech)
            .stdout(Stdio::null())
            .stderr(Stdio::null()),
    ) {
        Ok(aplay) => aplay,
        Err(err) => {
            abandon(espeak);
            return Err(err);
        }
    };

    Ok(Playback {
        children: vec![espeak, aplay],
    })
}

/// Kills a program whose output has nowhere to go and reaps it.
fn abandon(mut child: Child) {
    if let Err(err) = child.kill() {
        warn!(%err, "could not kill sound program");
    }
    if let Err(err) = child.wait() {
        warn!(%err, "could not reap sound program");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tone_sequence_arguments() {
        assert_eq!(tone_args(&[Tone::new(440.0, 1000)]), ["-f", "440", "-l", "1000"]);
        assert_eq!(
            tone_args(&[(392.0, 350, 100).into(), (311.1, 250).into()]),
            ["-f", "392", "-l", "350", "-D", "100", "-n", "-f", "311.1", "-l", "250"]
        );

        let beep = beep_command(tone_args(&[Tone::new(440.0, 10)]));
        assert_eq!(beep.get_program(), BEEP);
        assert_eq!(beep.get_args().count(), 4);
    }

    #[test]
    fn note_names() {
        assert_eq!(note_frequency("A4").unwrap(), 440);
        assert_eq!(note_frequency("a4").unwrap(), 440);
        assert_eq!(note_frequency("D#3").unwrap(), 156);
        assert_eq!(note_frequency("Eb3").unwrap(), 156);
        assert_eq!(note_frequency("Gb5").unwrap(), 740);
        assert_eq!(note_frequency("GB5").unwrap(), 740);
        assert_eq!(note_frequency("C0").unwrap(), 16);
        assert_eq!(note_frequency("C6").unwrap(), 1046);
        assert_eq!(note_frequency("B8").unwrap(), 7902);

        for bad in ["H4", "C9", "E#4", "Cb4", "A", "", "A-1"] {
            assert!(
                matches!(note_frequency(bad), Err(SoundError::UnknownNote { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn note_values() {
        assert_eq!(note_value("w").unwrap(), 1.0);
        assert_eq!(note_value("q").unwrap(), 0.25);
        assert_eq!(note_value("h.").unwrap(), 0.75);
        assert_eq!(note_value("q/2").unwrap(), 0.125);
        assert_eq!(note_value("e*2").unwrap(), 0.25);
        assert!((note_value("e3").unwrap() - 0.125 * 2.0 / 3.0).abs() < 1e-12);

        for bad in ["x", "q/", "q*two", "3", ""] {
            assert!(
                matches!(note_value(bad), Err(SoundError::UnknownValue { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn song_arguments() {
        let args = song_args(&[("G4", "h"), ("D5", "e3")], 120, 50).unwrap();
        assert_eq!(
            args,
            ["-f", "392", "-l", "1000", "-D", "50", "-n", "-f", "587", "-l", "166", "-D", "50"]
        );

        assert!(matches!(
            song_args(&[("G4", "h"), ("X4", "h")], 120, 50),
            Err(SoundError::UnknownNote { .. })
        ));
        assert!(matches!(
            song_args(&[("A4", "q")], 0, 50),
            Err(SoundError::InvalidTempo)
        ));
    }

    #[test]
    fn abandoned_program_is_reaped() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let started = std::time::Instant::now();
        abandon(child);
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn speech_arguments() {
        let options = SpeakOptions {
            extra: vec!["-g".to_owned(), "5".to_owned()],
            ..SpeakOptions::default()
        };
        assert_eq!(
            options.args("hi there"),
            ["-a", "200", "-s", "150", "-v", "en", "-g", "5", "--stdout", "hi there"]
        );
    }
}
