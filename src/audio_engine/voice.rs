//! Voices rendered by the real-time graph.
//!
//! A [`Voice`] is either a [`BufferPlayer`] reading shared decoded audio, or a
//! [`ToneGenerator`] producing the fallback tone. Both render additively into an
//! interleaved block and report whether they are still sounding.

use crate::audio_engine::constants::{
    CENTS_PER_OCTAVE, PITCH_SMOOTHING_SECS, TONE_GAIN, TONE_GAIN_FLOOR, TONE_ONE_SHOT_SECS,
    TONE_SWEEP_SECS,
};
use crate::audio_engine::param::SmoothedParam;
use crate::messages::{DecodedAudio, ToneSpec, Waveform};

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Plays decoded audio at a variable rate, optionally looping.
#[derive(Debug)]
pub struct BufferPlayer {
    audio: DecodedAudio,
    /// Read position in source frames.
    position: f64,
    rate: SmoothedParam,
    /// Source frames per output frame at rate 1.0.
    rate_scale: f64,
    looping: bool,
}

impl BufferPlayer {
    pub fn new(audio: DecodedAudio, rate: f32, looping: bool, output_rate: u32) -> Self {
        let rate_scale = if output_rate > 0 {
            audio.sample_rate as f64 / output_rate as f64
        } else {
            1.0
        };

        Self {
            audio,
            position: 0.0,
            rate: SmoothedParam::new(rate, PITCH_SMOOTHING_SECS, output_rate),
            rate_scale,
            looping,
        }
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate.set_target(rate);
    }

    pub fn rate(&self) -> f32 {
        self.rate.current()
    }

    /// Adds this voice into `output`. Returns `false` once the buffer end is reached
    /// without looping.
    pub fn render_add(&mut self, output: &mut [f32], channels: usize) -> bool {
        let frames = self.audio.frames();
        if frames == 0 || channels == 0 {
            return false;
        }
        let end = frames as f64;

        for out_frame in output.chunks_exact_mut(channels) {
            if self.position >= end {
                if !self.looping {
                    return false;
                }
                self.position = self.position.rem_euclid(end);
            }

            let index = self.position as usize;
            let frac = (self.position - index as f64) as f32;
            let next = if index + 1 < frames {
                index + 1
            } else if self.looping {
                0
            } else {
                index
            };

            for (channel, sample) in out_frame.iter_mut().enumerate() {
                let a = self.frame_sample(index, channel, channels);
                let b = self.frame_sample(next, channel, channels);
                *sample += lerp(a, b, frac);
            }

            let step = self.rate.next().max(0.0) as f64 * self.rate_scale;
            self.position += step;
        }

        true
    }

    /// Source sample feeding `out_channel` at `frame`.
    ///
    /// Mono sources feed every channel; multi-channel sources are averaged into mono
    /// outputs and otherwise wrap around the source channels.
    #[inline]
    fn frame_sample(&self, frame: usize, out_channel: usize, out_channels: usize) -> f32 {
        let src_channels = self.audio.channels;
        let base = frame * src_channels;

        if out_channels == 1 && src_channels > 1 {
            let sum: f32 = self.audio.samples[base..base + src_channels].iter().sum();
            return sum / src_channels as f32;
        }

        self.audio.samples[base + out_channel % src_channels]
    }
}

/// Synthesized fallback tone.
///
/// Sustained tones sound until stopped. One-shot tones sweep down an octave over
/// the first 100 ms and decay to silence over 300 ms, then finish.
#[derive(Debug)]
pub struct ToneGenerator {
    waveform: Waveform,
    base_hz: f32,
    detune_cents: SmoothedParam,
    sustained: bool,
    /// Oscillator phase in cycles, `0.0..1.0`.
    phase: f64,
    elapsed_frames: u64,
    sample_rate: f32,
}

impl ToneGenerator {
    pub fn new(tone: ToneSpec, sample_rate: u32) -> Self {
        Self {
            waveform: tone.waveform,
            base_hz: tone.frequency,
            detune_cents: SmoothedParam::new(tone.detune_cents, PITCH_SMOOTHING_SECS, sample_rate),
            sustained: tone.sustained,
            phase: 0.0,
            elapsed_frames: 0,
            sample_rate: sample_rate as f32,
        }
    }

    pub fn set_detune(&mut self, cents: f32) {
        self.detune_cents.set_target(cents);
    }

    pub fn detune(&self) -> f32 {
        self.detune_cents.current()
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    fn one_shot_frames(&self) -> u64 {
        (TONE_ONE_SHOT_SECS * self.sample_rate).round() as u64
    }

    #[inline]
    fn envelope(&self, t: f32) -> (f32, f32) {
        if self.sustained {
            return (self.base_hz, TONE_GAIN);
        }

        let frequency = if t < TONE_SWEEP_SECS {
            self.base_hz * 0.5f32.powf(t / TONE_SWEEP_SECS)
        } else {
            self.base_hz * 0.5
        };
        let gain = TONE_GAIN * (TONE_GAIN_FLOOR / TONE_GAIN).powf(t / TONE_ONE_SHOT_SECS);
        (frequency, gain)
    }

    #[inline]
    fn oscillator(&self) -> f32 {
        let phase = self.phase as f32;
        match self.waveform {
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }

    /// Adds this voice into `output`. Returns `false` once a one-shot has decayed.
    pub fn render_add(&mut self, output: &mut [f32], channels: usize) -> bool {
        if channels == 0 || self.sample_rate <= 0.0 {
            return false;
        }
        let end = self.one_shot_frames();

        for out_frame in output.chunks_exact_mut(channels) {
            if !self.sustained && self.elapsed_frames >= end {
                return false;
            }

            let t = self.elapsed_frames as f32 / self.sample_rate;
            let (frequency, gain) = self.envelope(t);
            let value = self.oscillator() * gain;
            for sample in out_frame.iter_mut() {
                *sample += value;
            }

            let detune = self.detune_cents.next();
            let hz = frequency * 2f32.powf(detune / CENTS_PER_OCTAVE);
            self.phase = (self.phase + (hz / self.sample_rate) as f64).fract();
            self.elapsed_frames += 1;
        }

        self.sustained || self.elapsed_frames < end
    }
}

#[derive(Debug)]
pub enum Voice {
    Buffered(BufferPlayer),
    Tone(ToneGenerator),
}

impl Voice {
    pub fn render_add(&mut self, output: &mut [f32], channels: usize) -> bool {
        match self {
            Voice::Buffered(player) => player.render_add(output, channels),
            Voice::Tone(tone) => tone.render_add(output, channels),
        }
    }

    /// Tones cannot be latched after the fact; the flag only applies to buffers.
    pub fn set_looping(&mut self, looping: bool) {
        if let Voice::Buffered(player) = self {
            player.set_looping(looping);
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        if let Voice::Buffered(player) = self {
            player.set_rate(rate);
        }
    }

    pub fn set_detune(&mut self, cents: f32) {
        if let Voice::Tone(tone) = self {
            tone.set_detune(cents);
        }
    }
}
