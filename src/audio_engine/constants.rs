//! Audio engine configuration constants and limits.

/// Maximum number of voices that can sound simultaneously.
pub const MAX_VOICES: usize = 64;

/// Minimum pitch multiplier (one octave down).
pub const PITCH_MIN: f32 = 0.5;

/// Maximum pitch multiplier.
pub const PITCH_MAX: f32 = 1.5;

/// Pitch multiplier at power-on.
pub const DEFAULT_PITCH: f32 = 1.0;

/// Minimum volume level (silence).
pub const VOLUME_MIN: f32 = 0.0;

/// Maximum volume level (100%).
pub const VOLUME_MAX: f32 = 1.0;

/// Master volume at power-on.
pub const DEFAULT_MASTER_VOLUME: f32 = 0.8;

/// Time constant of the master gain ramp, in seconds.
pub const VOLUME_SMOOTHING_SECS: f32 = 0.01;

/// Time constant of the playback-rate and detune ramps, in seconds.
pub const PITCH_SMOOTHING_SECS: f32 = 0.1;

/// Cents per octave.
pub const CENTS_PER_OCTAVE: f32 = 1200.0;

/// Lowest fallback tone frequency in Hz.
pub const FALLBACK_BASE_HZ: u32 = 100;

/// Width of the fallback tone frequency range in Hz.
pub const FALLBACK_SPAN_HZ: u32 = 800;

/// Gain of a fallback tone at its onset.
pub const TONE_GAIN: f32 = 0.5;

/// Gain a one-shot fallback tone decays to before it stops.
pub const TONE_GAIN_FLOOR: f32 = 0.01;

/// Length of a one-shot fallback tone, in seconds.
pub const TONE_ONE_SHOT_SECS: f32 = 0.3;

/// Length of the downward frequency sweep of a one-shot tone, in seconds.
pub const TONE_SWEEP_SECS: f32 = 0.1;

/// FFT size of the analyser node.
pub const ANALYSER_FFT_SIZE: usize = 64;

/// Smoothing between successive analyser reads (0.0 = none).
pub const ANALYSER_SMOOTHING: f32 = 0.8;

/// Magnitude mapped to byte value 0.
pub const ANALYSER_MIN_DB: f32 = -100.0;

/// Magnitude mapped to byte value 255.
pub const ANALYSER_MAX_DB: f32 = -30.0;

/// Capacity of the control ring.
pub const MESSAGE_RING_CAPACITY: usize = 1024;

/// Capacity of the event ring: every live voice finishing plus a full control
/// ring of starts rejected by the voice pool, between two drains.
pub const EVENT_RING_CAPACITY: usize = MESSAGE_RING_CAPACITY + MAX_VOICES;

/// Capacity of the analyser sample tap.
pub const ANALYSER_TAP_CAPACITY: usize = 4096;

/// Device buffer size in frames.
pub const STREAM_BUFFER_FRAMES: u32 = 512;
