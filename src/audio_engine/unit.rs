//! Control-side view of one sounding instance.

use crate::audio_engine::audio_stream::OutputGraph;
use crate::audio_engine::constants::CENTS_PER_OCTAVE;
use crate::messages::{ControlMessage, UnitId};

/// Detune in cents equivalent to a pitch multiplier.
pub fn detune_cents(pitch: f32) -> f32 {
    pitch.log2() * CENTS_PER_OCTAVE
}

/// A playable unit owned by the playback registry.
///
/// Both variants can be stopped and retuned. Only buffer-backed units carry a
/// loop flag that can change after start.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackUnit {
    Buffered { id: UnitId, rate: f32, looping: bool },
    Synthesized { id: UnitId, detune_cents: f32, sustained: bool },
}

impl PlaybackUnit {
    pub fn id(&self) -> UnitId {
        match self {
            Self::Buffered { id, .. } | Self::Synthesized { id, .. } => *id,
        }
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self, Self::Buffered { .. })
    }

    pub fn is_looping(&self) -> bool {
        match self {
            Self::Buffered { looping, .. } => *looping,
            Self::Synthesized { sustained, .. } => *sustained,
        }
    }

    /// Best-effort stop; stopping a unit that already ended is a no-op on the audio side.
    pub fn stop(&self, graph: &mut OutputGraph) {
        graph.send_best_effort(ControlMessage::StopUnit { unit: self.id() });
    }

    /// Changes the loop flag of a buffer-backed unit. Returns `false` for synthesized
    /// units, which cannot be latched after the fact.
    pub fn set_looping(&mut self, graph: &mut OutputGraph, on: bool) -> bool {
        match self {
            Self::Buffered { id, looping, .. } => {
                *looping = on;
                graph.send_best_effort(ControlMessage::SetUnitLoop {
                    unit: *id,
                    looping: on,
                });
                true
            }
            Self::Synthesized { .. } => false,
        }
    }

    /// Ramps playback rate (buffers) or detune (tones) towards `pitch`.
    pub fn retune(&mut self, graph: &mut OutputGraph, pitch: f32) {
        match self {
            Self::Buffered { id, rate, .. } => {
                *rate = pitch;
                graph.send_best_effort(ControlMessage::SetUnitRate {
                    unit: *id,
                    rate: pitch,
                });
            }
            Self::Synthesized {
                id, detune_cents: cents, ..
            } => {
                *cents = detune_cents(pitch);
                graph.send_best_effort(ControlMessage::SetUnitDetune {
                    unit: *id,
                    cents: *cents,
                });
            }
        }
    }
}
