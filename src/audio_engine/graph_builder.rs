//! Builds playable units and wires them into the output graph.
//!
//! A descriptor whose audio is cached becomes a buffer-backed player; otherwise
//! a fallback tone is synthesized with a pitch derived from the pad identity.

use crate::audio_engine::audio_stream::OutputGraph;
use crate::audio_engine::buffer_cache::BufferCache;
use crate::audio_engine::constants::{FALLBACK_BASE_HZ, FALLBACK_SPAN_HZ};
use crate::audio_engine::errors::EngineError;
use crate::audio_engine::unit::{PlaybackUnit, detune_cents};
use crate::banks::SoundDescriptor;
use crate::messages::{ControlMessage, ToneSpec, UnitId, Waveform};

/// Fallback tone frequency for a pad identity.
///
/// Sum of UTF-16 code units modulo 800, offset by 100 Hz; stable per identity.
pub fn fallback_frequency(pad_id: &str) -> f32 {
    let sum: u32 = pad_id.encode_utf16().map(u32::from).sum();
    (FALLBACK_BASE_HZ + sum % FALLBACK_SPAN_HZ) as f32
}

/// Fallback tone for a descriptor at the given loop state and pitch.
pub fn fallback_tone(pad_id: &str, effective_loop: bool, pitch: f32) -> ToneSpec {
    ToneSpec {
        frequency: fallback_frequency(pad_id),
        waveform: if effective_loop {
            Waveform::Square
        } else {
            Waveform::Triangle
        },
        detune_cents: detune_cents(pitch),
        sustained: effective_loop,
    }
}

#[derive(Debug, Default)]
pub struct SourceGraphBuilder {
    next_unit: u64,
}

impl SourceGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> UnitId {
        self.next_unit += 1;
        UnitId(self.next_unit)
    }

    /// Constructs and starts one unit for `descriptor`.
    ///
    /// Fails only when the audio thread's command queue is full, in which case
    /// nothing was started.
    pub fn build(
        &mut self,
        descriptor: &SoundDescriptor,
        effective_loop: bool,
        pitch: f32,
        cache: &BufferCache,
        graph: &mut OutputGraph,
    ) -> Result<PlaybackUnit, EngineError> {
        let id = self.allocate();

        match cache.get(&descriptor.path) {
            Some(audio) => {
                graph.send(ControlMessage::StartBuffered {
                    unit: id,
                    audio,
                    rate: pitch,
                    looping: effective_loop,
                })?;
                log::debug!("{id}: playing {} from buffer", descriptor.id);
                Ok(PlaybackUnit::Buffered {
                    id,
                    rate: pitch,
                    looping: effective_loop,
                })
            }
            None => {
                let tone = fallback_tone(&descriptor.id, effective_loop, pitch);
                graph.send(ControlMessage::StartTone { unit: id, tone })?;
                log::debug!(
                    "{id}: no audio for {}, synthesizing {:.0} Hz",
                    descriptor.id,
                    tone.frequency
                );
                Ok(PlaybackUnit::Synthesized {
                    id,
                    detune_cents: tone.detune_cents,
                    sustained: tone.sustained,
                })
            }
        }
    }
}
