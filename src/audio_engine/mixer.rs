//! Real-time output graph.
//!
//! This module provides the [`RtGraph`] struct which owns every live voice and
//! renders the fixed chain voices → master gain → analyser tap → device output.
//! It drains [`ControlMessage`]s at the start of each block and reports natural
//! completions as [`AudioMessage::UnitFinished`].
//!
//! All operations are lock-free and allocation-free once constructed.

use cpal::Sample;
use rtrb::{Consumer, Producer};

use crate::audio_engine::constants::{MAX_VOICES, VOLUME_MAX, VOLUME_MIN, VOLUME_SMOOTHING_SECS};
use crate::audio_engine::param::SmoothedParam;
use crate::audio_engine::voice::{BufferPlayer, ToneGenerator, Voice};
use crate::messages::{AudioMessage, ControlMessage, UnitId};

struct VoiceSlot {
    unit: UnitId,
    voice: Voice,
}

/// Real-time renderer driven by the device callback.
pub struct RtGraph {
    /// Number of output channels (1 for mono, 2 for stereo).
    channels: usize,

    sample_rate: u32,

    /// Master gain stage; the single authority for output volume.
    master_gain: SmoothedParam,

    /// Live voices, at most MAX_VOICES.
    voices: Vec<VoiceSlot>,

    commands: Consumer<ControlMessage>,
    events: Producer<AudioMessage>,

    /// Post-gain mono samples for the analyser node.
    analyser_tap: Producer<f32>,
}

impl RtGraph {
    pub fn new(
        channels: usize,
        sample_rate: u32,
        initial_gain: f32,
        commands: Consumer<ControlMessage>,
        events: Producer<AudioMessage>,
        analyser_tap: Producer<f32>,
    ) -> Self {
        Self {
            channels,
            sample_rate,
            master_gain: SmoothedParam::new(
                initial_gain.clamp(VOLUME_MIN, VOLUME_MAX),
                VOLUME_SMOOTHING_SECS,
                sample_rate,
            ),
            voices: Vec::with_capacity(MAX_VOICES),
            commands,
            events,
            analyser_tap,
        }
    }

    /// Drains pending commands, then renders one block.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Ok(message) = self.commands.pop() {
            self.handle_message(message);
        }
        self.render(output);
    }

    fn handle_message(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::StartBuffered {
                unit,
                audio,
                rate,
                looping,
            } => {
                let player = BufferPlayer::new(audio, rate, looping, self.sample_rate);
                self.start_voice(unit, Voice::Buffered(player));
            }
            ControlMessage::StartTone { unit, tone } => {
                let generator = ToneGenerator::new(tone, self.sample_rate);
                self.start_voice(unit, Voice::Tone(generator));
            }
            ControlMessage::StopUnit { unit } => {
                if let Some(index) = self.position(unit) {
                    self.voices.swap_remove(index);
                }
            }
            ControlMessage::SetUnitLoop { unit, looping } => {
                if let Some(slot) = self.slot_mut(unit) {
                    slot.voice.set_looping(looping);
                }
            }
            ControlMessage::SetUnitRate { unit, rate } => {
                if let Some(slot) = self.slot_mut(unit) {
                    slot.voice.set_rate(rate);
                }
            }
            ControlMessage::SetUnitDetune { unit, cents } => {
                if let Some(slot) = self.slot_mut(unit) {
                    slot.voice.set_detune(cents);
                }
            }
            ControlMessage::SetMasterGain(gain) => {
                if gain.is_finite() {
                    self.master_gain
                        .set_target(gain.clamp(VOLUME_MIN, VOLUME_MAX));
                }
            }
            ControlMessage::StopAll() => {
                self.voices.clear();
            }
        }
    }

    fn start_voice(&mut self, unit: UnitId, voice: Voice) {
        if self.voices.len() >= MAX_VOICES {
            // No free voice: the unit ends before it starts.
            let _ = self.events.push(AudioMessage::UnitFinished { unit });
            return;
        }
        self.voices.push(VoiceSlot { unit, voice });
    }

    fn position(&self, unit: UnitId) -> Option<usize> {
        self.voices.iter().position(|slot| slot.unit == unit)
    }

    fn slot_mut(&mut self, unit: UnitId) -> Option<&mut VoiceSlot> {
        self.voices.iter_mut().find(|slot| slot.unit == unit)
    }

    /// Renders audio frames to the output buffer.
    ///
    /// The output buffer must contain interleaved samples with `channels` per frame.
    pub fn render(&mut self, output: &mut [f32]) {
        output.fill(Sample::EQUILIBRIUM);

        if self.channels == 0 {
            return;
        }

        let mut index = 0;
        while index < self.voices.len() {
            if self.voices[index].voice.render_add(output, self.channels) {
                index += 1;
            } else {
                let finished = self.voices.swap_remove(index);
                let _ = self.events.push(AudioMessage::UnitFinished {
                    unit: finished.unit,
                });
            }
        }

        let scale = 1.0 / self.channels as f32;
        for frame in output.chunks_exact_mut(self.channels) {
            let gain = self.master_gain.next();
            let mut mono = 0.0;
            for sample in frame.iter_mut() {
                *sample *= gain;
                mono += *sample;
            }
            let _ = self.analyser_tap.push(mono * scale);
        }
    }

    /// Gets the number of channels configured for this graph.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_sounding(&self, unit: UnitId) -> bool {
        self.position(unit).is_some()
    }

    /// Loop flag of a live buffer-backed unit.
    pub fn is_looping(&self, unit: UnitId) -> Option<bool> {
        self.voices
            .iter()
            .find(|slot| slot.unit == unit)
            .and_then(|slot| match &slot.voice {
                Voice::Buffered(player) => Some(player.is_looping()),
                Voice::Tone(_) => None,
            })
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain.current()
    }
}
