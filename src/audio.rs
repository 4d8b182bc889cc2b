//! Audio cues
//!
//! The game fires named cues; an [`AudioSink`] plays them. [`Audio`] keeps at most
//! one instance of each cue playing: triggering a cue that is still playing is
//! ignored. On the web the sink synthesizes every cue with Web Audio oscillators,
//! no sound files needed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::settings::Settings;

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Welcome,
    CarMove,
    Collision,
    FlagFound,
    LevelCompleted,
    Bonus,
    GameOver,
    LowScore,
    HiScore,
    HighestScore,
    DropIn,
    Shot,
}

impl Cue {
    /// Defaults applied when the caller does not override them
    pub fn default_params(&self) -> AudioParams {
        let base = AudioParams::default();
        match self {
            Cue::CarMove => AudioParams { gain: 0.8, ..base },
            Cue::GameOver => AudioParams {
                start_in_ms: 250.0,
                ..base
            },
            Cue::LevelCompleted => AudioParams { gain: 0.3, ..base },
            Cue::DropIn => AudioParams { gain: 0.5, ..base },
            Cue::Collision => AudioParams { gain: 1.5, ..base },
            Cue::Shot => AudioParams {
                gain: 0.6,
                playback_rate: 1.5,
                ..base
            },
            _ => base,
        }
    }

    /// Length of the cue at playback rate 1
    pub fn duration_ms(&self) -> f64 {
        match self {
            Cue::Welcome => 900.0,
            Cue::CarMove => 120.0,
            Cue::Collision => 500.0,
            Cue::FlagFound => 300.0,
            Cue::LevelCompleted => 800.0,
            Cue::Bonus => 400.0,
            Cue::GameOver => 1200.0,
            Cue::LowScore => 700.0,
            Cue::HiScore => 700.0,
            Cue::HighestScore => 900.0,
            Cue::DropIn => 600.0,
            Cue::Shot => 150.0,
        }
    }
}

/// Playback options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioParams {
    pub gain: f32,
    pub playback_rate: f32,
    /// Delay before the cue starts
    pub start_in_ms: f64,
    /// Await the start of the cue instead of its end
    pub wait_start: bool,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            gain: 1.0,
            playback_rate: 1.0,
            start_in_ms: 0.0,
            wait_start: false,
        }
    }
}

/// Plays cues, fire and forget
pub trait AudioSink {
    fn play(&mut self, cue: Cue, params: &AudioParams);
}

/// Cue dispatcher with volume control and duplicate suppression
pub struct Audio {
    sink: Box<dyn AudioSink>,
    /// End time of each cue currently playing
    playing: HashMap<Cue, f64>,
    now: f64,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Audio {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            playing: HashMap::new(),
            now: 0.0,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// A silent dispatcher
    pub fn silent() -> Self {
        Self::new(Box::new(NullSink))
    }

    /// Take volume and mute from the player preferences
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.master_volume = settings.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        self.muted = settings.muted;
    }

    fn volume(&self) -> f32 {
        match self.muted {
            true => 0.0,
            false => self.master_volume * self.sfx_volume,
        }
    }

    /// Advance the clock used to expire playing cues
    pub fn update(&mut self, now: f64) {
        self.now = now;
        self.playing.retain(|_, end| *end > now);
    }

    pub fn is_playing(&self, cue: Cue) -> bool {
        self.playing.get(&cue).is_some_and(|end| *end > self.now)
    }

    pub fn play(&mut self, cue: Cue) {
        self.play_with(cue, cue.default_params());
    }

    pub fn play_with(&mut self, cue: Cue, params: AudioParams) {
        if self.is_playing(cue) {
            log::debug!("Ignore cue {:?} (already playing)", cue);
            return;
        }
        let rate = f64::from(params.playback_rate.max(0.1));
        let end = self.now + params.start_in_ms + cue.duration_ms() / rate;
        self.playing.insert(cue, end);

        let volume = self.volume();
        if volume <= 0.0 {
            return;
        }
        let params = AudioParams {
            gain: params.gain * volume,
            ..params
        };
        self.sink.play(cue, &params);
    }
}

/// Discards every cue
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _cue: Cue, _params: &AudioParams) {}
}

/// Remembers played cues. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    played: Rc<RefCell<Vec<(Cue, AudioParams)>>>,
}

impl RecordingSink {
    pub fn cues(&self) -> Vec<Cue> {
        self.played.borrow().iter().map(|(cue, _)| *cue).collect()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played.borrow().iter().filter(|(c, _)| *c == cue).count()
    }

    pub fn last_params(&self, cue: Cue) -> Option<AudioParams> {
        self.played
            .borrow()
            .iter()
            .rev()
            .find(|(c, _)| *c == cue)
            .map(|(_, params)| *params)
    }
}

impl AudioSink for RecordingSink {
    fn play(&mut self, cue: Cue, params: &AudioParams) {
        self.played.borrow_mut().push((cue, *params));
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioSink;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioParams, AudioSink, Cue};

    /// Procedural Web Audio synthesizer
    pub struct WebAudioSink {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudioSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioSink {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("No AudioContext, playing silently");
            }
            Self { ctx }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// A run of notes, `step` seconds apart, each fading over `len` seconds
        #[allow(clippy::too_many_arguments)]
        fn notes(
            ctx: &AudioContext,
            t0: f64,
            freqs: &[f32],
            step: f64,
            len: f64,
            osc_type: OscillatorType,
            vol: f32,
            rate: f32,
        ) {
            for (i, freq) in freqs.iter().enumerate() {
                let Some((osc, gain)) = Self::create_osc(ctx, freq * rate, osc_type) else {
                    continue;
                };
                let t = t0 + i as f64 * step;
                gain.gain().set_value_at_time(vol, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + len)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + len + 0.05).ok();
            }
        }

        /// A single tone sliding from `from` to `to`
        fn sweep(
            ctx: &AudioContext,
            t: f64,
            from: f32,
            to: f32,
            len: f64,
            osc_type: OscillatorType,
            vol: f32,
        ) {
            let Some((osc, gain)) = Self::create_osc(ctx, from, osc_type) else {
                return;
            };
            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + len)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }
    }

    impl AudioSink for WebAudioSink {
        fn play(&mut self, cue: Cue, params: &AudioParams) {
            let Some(ctx) = &self.ctx else { return };

            // Suspended until the first user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let t = ctx.current_time() + params.start_in_ms / 1000.0;
            let rate = params.playback_rate;
            let vol = params.gain * 0.3;
            let stretch = 1.0 / f64::from(rate.max(0.1));

            match cue {
                Cue::Welcome => Self::notes(
                    ctx,
                    t,
                    &[392.0, 523.0, 659.0, 784.0],
                    0.15 * stretch,
                    0.3 * stretch,
                    OscillatorType::Triangle,
                    vol,
                    rate,
                ),
                Cue::CarMove => Self::sweep(
                    ctx,
                    t,
                    90.0 * rate,
                    110.0 * rate,
                    0.1 * stretch,
                    OscillatorType::Sawtooth,
                    vol * 0.5,
                ),
                Cue::Collision => {
                    Self::sweep(ctx, t, 100.0, 30.0, 0.4 * stretch, OscillatorType::Sawtooth, vol);
                    Self::sweep(ctx, t, 1500.0, 400.0, 0.1 * stretch, OscillatorType::Square, vol * 0.5);
                }
                Cue::FlagFound => Self::notes(
                    ctx,
                    t,
                    &[600.0, 800.0, 1000.0],
                    0.08 * stretch,
                    0.15 * stretch,
                    OscillatorType::Sine,
                    vol,
                    rate,
                ),
                Cue::LevelCompleted => Self::notes(
                    ctx,
                    t,
                    &[400.0, 500.0, 600.0, 800.0],
                    0.1 * stretch,
                    0.4 * stretch,
                    OscillatorType::Triangle,
                    vol,
                    rate,
                ),
                Cue::Bonus => Self::notes(
                    ctx,
                    t,
                    &[800.0, 1200.0],
                    0.1 * stretch,
                    0.25 * stretch,
                    OscillatorType::Sine,
                    vol,
                    rate,
                ),
                Cue::GameOver => Self::notes(
                    ctx,
                    t,
                    &[400.0, 350.0, 300.0, 200.0],
                    0.2 * stretch,
                    0.3 * stretch,
                    OscillatorType::Sine,
                    vol,
                    rate,
                ),
                Cue::LowScore => Self::notes(
                    ctx,
                    t,
                    &[300.0, 250.0],
                    0.25 * stretch,
                    0.4 * stretch,
                    OscillatorType::Triangle,
                    vol,
                    rate,
                ),
                Cue::HiScore => Self::notes(
                    ctx,
                    t,
                    &[500.0, 600.0, 700.0, 800.0, 1000.0],
                    0.08 * stretch,
                    0.25 * stretch,
                    OscillatorType::Triangle,
                    vol,
                    rate,
                ),
                Cue::HighestScore => Self::notes(
                    ctx,
                    t,
                    &[523.0, 659.0, 784.0, 1047.0, 1319.0],
                    0.1 * stretch,
                    0.35 * stretch,
                    OscillatorType::Square,
                    vol * 0.6,
                    rate,
                ),
                Cue::DropIn => Self::sweep(
                    ctx,
                    t,
                    1200.0 * rate,
                    150.0 * rate,
                    0.5 * stretch,
                    OscillatorType::Sine,
                    vol,
                ),
                Cue::Shot => Self::sweep(
                    ctx,
                    t,
                    900.0 * rate,
                    200.0 * rate,
                    0.1 * stretch,
                    OscillatorType::Square,
                    vol * 0.5,
                ),
            }
        }
    }
}
