//! Web Audio backend
//!
//! Realizes tone and noise events as short-lived oscillator and buffer source
//! nodes routed through one master gain. The context is created on first use
//! (browsers only allow it after a user gesture). Every failure degrades to
//! silence.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use web_sys::{
    AudioBuffer, AudioContext, AudioContextState, BiquadFilterType, GainNode, OscillatorType,
};

use super::{AudioSink, ENVELOPE_FLOOR, NOISE_ATTACK, NoiseEvent, TONE_ATTACK, ToneEvent, Waveform};

/// Length of the shared noise buffer (seconds)
const NOISE_SECONDS: f32 = 1.0;
const NOISE_AMPLITUDE: f32 = 0.8;

pub struct WebAudio {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    noise: Option<AudioBuffer>,
    master_volume: f32,
    seed: u64,
    failed: bool,
}

impl WebAudio {
    pub fn new(master_volume: f32, seed: u64) -> Self {
        Self {
            ctx: None,
            master: None,
            noise: None,
            master_volume: master_volume.clamp(0.0, 1.0),
            seed,
            failed: false,
        }
    }

    /// Create the context and master bus on first use
    fn ensure(&mut self) -> bool {
        if self.ctx.is_some() {
            return true;
        }
        if self.failed {
            return false;
        }

        let Some(ctx) = AudioContext::new().ok() else {
            log::warn!("Failed to create AudioContext - audio disabled");
            self.failed = true;
            return false;
        };

        let master = ctx.create_gain().ok().and_then(|gain| {
            gain.gain().set_value(self.master_volume);
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        if master.is_none() {
            log::warn!("Failed to build master gain - audio disabled");
            self.failed = true;
            return false;
        }

        self.noise = build_noise(&ctx, self.seed);
        if self.noise.is_none() {
            log::warn!("Noise buffer unavailable - drums will be tonal only");
        }
        self.master = master;
        self.ctx = Some(ctx);
        true
    }

    /// Resume a suspended context (required after a user gesture)
    pub fn resume(&mut self) {
        if !self.ensure() {
            return;
        }
        if let Some(ctx) = &self.ctx
            && ctx.state() == AudioContextState::Suspended
        {
            let _ = ctx.resume();
        }
    }

    /// Current audio clock time (seconds), 0 before the context exists
    pub fn now(&self) -> f64 {
        self.ctx.as_ref().map_or(0.0, |ctx| ctx.current_time())
    }
}

fn build_noise(ctx: &AudioContext, seed: u64) -> Option<AudioBuffer> {
    let rate = ctx.sample_rate();
    let len = (rate * NOISE_SECONDS) as u32;
    let buffer = ctx.create_buffer(1, len, rate).ok()?;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut data: Vec<f32> = (0..len)
        .map(|_| (rng.random::<f32>() * 2.0 - 1.0) * NOISE_AMPLITUDE)
        .collect();
    buffer.copy_to_channel(&mut data, 0).ok()?;
    Some(buffer)
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

/// Exponential attack from the floor to `peak`, then decay back by `end`
fn envelope(gain: &GainNode, start: f64, attack: f64, end: f64, peak: f32) -> Option<()> {
    let param = gain.gain();
    param.set_value_at_time(ENVELOPE_FLOOR, start).ok()?;
    param
        .exponential_ramp_to_value_at_time(peak, start + attack)
        .ok()?;
    param.exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, end).ok()?;
    Some(())
}

impl WebAudio {
    fn play_tone(&self, event: &ToneEvent) -> Option<()> {
        let ctx = self.ctx.as_ref()?;
        let master = self.master.as_ref()?;

        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(oscillator_type(event.waveform));
        osc.frequency().set_value_at_time(event.freq, event.time).ok()?;
        envelope(&gain, event.time, TONE_ATTACK, event.time + event.dur, event.peak())?;

        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(master).ok()?;

        osc.start_with_when(event.time).ok()?;
        osc.stop_with_when(event.stop_time()).ok()?;
        Some(())
    }

    fn play_noise(&self, event: &NoiseEvent) -> Option<()> {
        let ctx = self.ctx.as_ref()?;
        let master = self.master.as_ref()?;
        let buffer = self.noise.as_ref()?;

        let src = ctx.create_buffer_source().ok()?;
        src.set_buffer(Some(buffer));

        let filter = ctx.create_biquad_filter().ok()?;
        filter.set_type(BiquadFilterType::Highpass);
        filter
            .frequency()
            .set_value_at_time(event.highpass, event.time)
            .ok()?;

        let gain = ctx.create_gain().ok()?;
        envelope(&gain, event.time, NOISE_ATTACK, event.time + event.dur, event.peak())?;

        src.connect_with_audio_node(&filter).ok()?;
        filter.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(master).ok()?;

        src.start_with_when(event.time).ok()?;
        src.stop_with_when(event.stop_time()).ok()?;
        Some(())
    }
}

impl AudioSink for WebAudio {
    fn tone(&mut self, event: &ToneEvent) {
        if self.ensure() && self.play_tone(event).is_none() {
            log::debug!("Dropped tone at {:.3}s", event.time);
        }
    }

    fn noise(&mut self, event: &NoiseEvent) {
        if self.ensure() && self.play_noise(event).is_none() {
            log::debug!("Dropped noise hit at {:.3}s", event.time);
        }
    }
}
