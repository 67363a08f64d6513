//! Procedural audio
//!
//! Music and sound cues are produced as timestamped [`ToneEvent`]s and
//! [`NoiseEvent`]s handed to an [`AudioSink`]. The browser backend in [`web`]
//! turns them into Web Audio nodes; tests collect them in a `Vec`.

pub mod pattern;
pub mod sequencer;
pub mod sfx;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use sequencer::Sequencer;
pub use sfx::Sfx;

/// Gain every envelope starts from and decays back to
pub const ENVELOPE_FLOOR: f32 = 0.0001;
/// Smallest peak an envelope may ramp to (exponential ramps cannot reach 0)
pub const ENVELOPE_MIN_PEAK: f32 = 0.0002;
/// Attack time for oscillator voices (seconds)
pub const TONE_ATTACK: f64 = 0.01;
/// Attack time for noise hits (seconds)
pub const NOISE_ATTACK: f64 = 0.005;
/// Sources stop this long after their envelope reaches the floor (seconds)
pub const RELEASE_TAIL: f64 = 0.02;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A single oscillator note at an absolute audio-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneEvent {
    /// Start time on the audio clock (seconds)
    pub time: f64,
    pub freq: f32,
    pub waveform: Waveform,
    /// Time from start until the envelope reaches the floor (seconds)
    pub dur: f64,
    /// Peak gain
    pub vol: f32,
}

impl ToneEvent {
    pub fn peak(&self) -> f32 {
        self.vol.max(ENVELOPE_MIN_PEAK)
    }

    pub fn stop_time(&self) -> f64 {
        self.time + self.dur + RELEASE_TAIL
    }
}

/// A high-passed burst of white noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEvent {
    pub time: f64,
    pub dur: f64,
    pub vol: f32,
    /// High-pass cutoff (Hz)
    pub highpass: f32,
}

impl NoiseEvent {
    pub fn peak(&self) -> f32 {
        self.vol.max(ENVELOPE_MIN_PEAK)
    }

    pub fn stop_time(&self) -> f64 {
        self.time + self.dur + RELEASE_TAIL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    Tone(ToneEvent),
    Noise(NoiseEvent),
}

impl AudioEvent {
    pub fn time(&self) -> f64 {
        match self {
            AudioEvent::Tone(tone) => tone.time,
            AudioEvent::Noise(noise) => noise.time,
        }
    }
}

/// Anything that can realize scheduled audio events
pub trait AudioSink {
    fn tone(&mut self, event: &ToneEvent);
    fn noise(&mut self, event: &NoiseEvent);
}

/// Collects events in order, used by tests and headless runs
impl AudioSink for Vec<AudioEvent> {
    fn tone(&mut self, event: &ToneEvent) {
        self.push(AudioEvent::Tone(*event));
    }

    fn noise(&mut self, event: &NoiseEvent) {
        self.push(AudioEvent::Noise(*event));
    }
}
