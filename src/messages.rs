//! Message definitions for communication between the control thread and the audio thread.
//!
//! This module defines the enums that serve as the wire format for messages passed through the
//! ring buffers between the engine facade and the real-time renderer.

use std::fmt;
use std::sync::Arc;

/// Decoded, immutable sample data shared by every playback of one source path.
///
/// Samples are interleaved `f32` at the file's native rate and channel count.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub channels: usize,
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn new(channels: usize, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            channels,
            sample_rate,
            samples: Arc::from(samples.into_boxed_slice()),
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Duration in seconds at the native sample rate.
    pub fn duration_sec(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }
}

/// Identity of one playback unit, unique for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Oscillator shape of the fallback tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Square,
    Triangle,
}

/// Parameters of a synthesized fallback tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    /// Base frequency in Hz before detune.
    pub frequency: f32,
    pub waveform: Waveform,
    /// Detune in cents (1200 cents per octave).
    pub detune_cents: f32,
    /// Sustained tones play until stopped; otherwise the tone decays and ends on its own.
    pub sustained: bool,
}

/// Message that is emitted from the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMessage {
    /// A unit reached its natural end (or could not be started) and no longer sounds.
    UnitFinished { unit: UnitId },
}

/// Message that is emitted from the control side.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Start a buffer-backed player from time zero.
    ///
    /// # Parameters
    /// * `unit` - Identity reported back on completion
    /// * `audio` - Shared decoded sample data
    /// * `rate` - Playback rate multiplier
    /// * `looping` - Wrap at the buffer end instead of finishing
    StartBuffered {
        unit: UnitId,
        audio: DecodedAudio,
        rate: f32,
        looping: bool,
    },

    /// Start a synthesized fallback tone.
    StartTone { unit: UnitId, tone: ToneSpec },

    /// Stop a unit immediately. Unknown units are ignored.
    StopUnit { unit: UnitId },

    /// Change the loop flag of a live buffer-backed unit.
    SetUnitLoop { unit: UnitId, looping: bool },

    /// Ramp the playback rate of a live buffer-backed unit.
    SetUnitRate { unit: UnitId, rate: f32 },

    /// Ramp the detune of a live synthesized unit.
    SetUnitDetune { unit: UnitId, cents: f32 },

    /// Ramp the master gain.
    ///
    /// # Parameters
    /// * `gain` - Gain level (0.0 to 1.0)
    SetMasterGain(f32),

    /// Stop every live unit.
    StopAll(),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_audio_frames_and_duration() {
        let audio = DecodedAudio::new(2, 4, vec![0.0; 16]);
        assert_eq!(audio.frames(), 8);
        assert!((audio.duration_sec() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decoded_audio_zero_channels() {
        let audio = DecodedAudio::new(0, 44_100, vec![]);
        assert_eq!(audio.frames(), 0);
        assert_eq!(audio.duration_sec(), 0.0);
    }

    #[test]
    fn test_decoded_audio_clone_shares_samples() {
        let audio = DecodedAudio::new(1, 44_100, vec![0.5; 8]);
        let copy = audio.clone();
        assert!(Arc::ptr_eq(&audio.samples, &copy.samples));
    }

    #[test]
    fn test_unit_id_display() {
        assert_eq!(UnitId(7).to_string(), "unit#7");
    }
}
