//! The fixed 64-step music loop
//!
//! Melodic parts are MIDI note tables where 0 is a rest. Drums are derived from
//! the step position.

use super::{AudioSink, NoiseEvent, ToneEvent, Waveform};
use crate::midi_to_freq;

pub const PATTERN_STEPS: usize = 64;

#[rustfmt::skip]
const LEAD: [u8; PATTERN_STEPS] = [
    74, 0, 76, 0,  79, 0, 76, 0,  74, 0, 72, 0,  71, 0, 72, 0,
    74, 0, 76, 0,  81, 0, 79, 0,  76, 0, 74, 0,  72, 0, 71, 0,
    74, 0, 76, 0,  79, 0, 76, 0,  74, 0, 72, 0,  71, 0, 72, 0,
    81, 0, 79, 0,  76, 0, 74, 0,  72, 0, 71, 0,  69, 0, 71, 0,
];

#[rustfmt::skip]
const ARP: [u8; PATTERN_STEPS] = [
    86, 93, 89, 93,  86, 93, 89, 93,  84, 91, 88, 91,  83, 90, 86, 90,
    86, 93, 89, 93,  88, 95, 91, 95,  89, 96, 93, 96,  86, 93, 89, 93,
    86, 93, 89, 93,  86, 93, 89, 93,  84, 91, 88, 91,  83, 90, 86, 90,
    88, 95, 91, 95,  89, 96, 93, 96,  86, 93, 89, 93,  84, 91, 88, 91,
];

#[rustfmt::skip]
const BASS: [u8; PATTERN_STEPS] = [
    38, 0, 0, 0,  38, 0, 41, 0,  43, 0, 0, 0,  41, 0, 38, 0,
    38, 0, 0, 0,  45, 0, 43, 0,  41, 0, 0, 0,  38, 0, 36, 0,
    38, 0, 0, 0,  38, 0, 41, 0,  43, 0, 0, 0,  41, 0, 38, 0,
    45, 0, 0, 0,  43, 0, 41, 0,  38, 0, 0, 0,  36, 0, 35, 0,
];

pub fn is_kick(step: usize) -> bool {
    matches!(step % 16, 0 | 8)
}

pub fn is_hat(step: usize) -> bool {
    step % 4 == 2
}

pub fn is_snare(step: usize) -> bool {
    matches!(step % 16, 4 | 12)
}

fn note(table: &[u8; PATTERN_STEPS], step: usize) -> Option<u8> {
    match table[step % PATTERN_STEPS] {
        0 => None,
        n => Some(n),
    }
}

pub fn lead_note(step: usize) -> Option<u8> {
    note(&LEAD, step)
}

/// Arpeggio only sounds on even steps
pub fn arp_note(step: usize) -> Option<u8> {
    if step % 2 == 0 { note(&ARP, step) } else { None }
}

pub fn bass_note(step: usize) -> Option<u8> {
    note(&BASS, step)
}

/// Emit every voice of `step` at audio time `t`
pub fn schedule_step(step: usize, t: f64, sink: &mut dyn AudioSink) {
    let tone = |freq: f32, waveform: Waveform, dur: f64, vol: f32, time: f64| ToneEvent {
        time,
        freq,
        waveform,
        dur,
        vol,
    };

    if is_kick(step) {
        sink.tone(&tone(130.0, Waveform::Sine, 0.06, 0.08, t));
        sink.tone(&tone(65.0, Waveform::Sine, 0.07, 0.06, t + 0.01));
    }
    if is_hat(step) {
        sink.noise(&NoiseEvent {
            time: t,
            dur: 0.03,
            vol: 0.05,
            highpass: 7800.0,
        });
    }
    if is_snare(step) {
        sink.noise(&NoiseEvent {
            time: t,
            dur: 0.055,
            vol: 0.06,
            highpass: 3000.0,
        });
        sink.tone(&tone(240.0, Waveform::Triangle, 0.05, 0.03, t));
    }

    if let Some(n) = lead_note(step) {
        sink.tone(&tone(midi_to_freq(n), Waveform::Square, 0.11, 0.053, t));
    }
    if let Some(n) = arp_note(step) {
        sink.tone(&tone(midi_to_freq(n), Waveform::Sawtooth, 0.07, 0.022, t));
    }
    if let Some(n) = bass_note(step) {
        sink.tone(&tone(midi_to_freq(n), Waveform::Triangle, 0.14, 0.05, t));
    }
}
