//! Gameplay sound cues
//!
//! Each cue is a short run of blips with fixed offsets from the trigger time.
//! All blips are queued at once on the audio clock.

use super::{AudioSink, ToneEvent, Waveform};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    /// Either paddle returns the ball
    Hit,
    /// A point is scored
    Point,
    /// Player wins the match
    Win,
    /// Sound switched on
    Toggle,
    /// Manual match reset
    Reset,
}

/// (offset ms, freq Hz, length ms, waveform, gain)
type Blip = (f64, f32, f64, Waveform, f32);

const HIT: &[Blip] = &[
    (0.0, 740.0, 35.0, Waveform::Square, 0.04),
    (28.0, 980.0, 45.0, Waveform::Square, 0.035),
];

const POINT: &[Blip] = &[
    (0.0, 392.0, 95.0, Waveform::Sawtooth, 0.045),
    (90.0, 523.0, 120.0, Waveform::Sawtooth, 0.045),
];

const WIN: &[Blip] = &[
    (0.0, 523.0, 120.0, Waveform::Triangle, 0.05),
    (120.0, 659.0, 160.0, Waveform::Triangle, 0.05),
    (260.0, 784.0, 190.0, Waveform::Triangle, 0.045),
];

const TOGGLE: &[Blip] = &[(0.0, 880.0, 55.0, Waveform::Square, 0.04)];

const RESET: &[Blip] = &[(0.0, 880.0, 45.0, Waveform::Square, 0.04)];

/// Blips shorter than this are stretched
const MIN_BLIP_SECS: f64 = 0.02;

impl Sfx {
    fn blips(self) -> &'static [Blip] {
        match self {
            Sfx::Hit => HIT,
            Sfx::Point => POINT,
            Sfx::Win => WIN,
            Sfx::Toggle => TOGGLE,
            Sfx::Reset => RESET,
        }
    }

    /// Tone events for this cue triggered at audio time `now`
    pub fn tones(self, now: f64) -> impl Iterator<Item = ToneEvent> {
        self.blips()
            .iter()
            .map(move |&(offset_ms, freq, len_ms, waveform, vol)| ToneEvent {
                time: now + offset_ms / 1000.0,
                freq,
                waveform,
                dur: (len_ms / 1000.0).max(MIN_BLIP_SECS),
                vol,
            })
    }

    /// Queue this cue on `sink`
    pub fn emit(self, now: f64, sink: &mut dyn AudioSink) {
        for tone in self.tones(now) {
            sink.tone(&tone);
        }
    }
}
