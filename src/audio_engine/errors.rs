//! Audio-specific error types.

use thiserror::Error;

/// Errors that can occur while loading audio files.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    /// Failed to read the audio file.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the audio file.
    #[error("failed to decode audio file: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Audio file has no default track.
    #[error("audio file has no default track")]
    NoDefaultTrack,

    /// Audio file is missing sample rate information.
    #[error("audio file is missing a sample rate")]
    MissingSampleRate,

    /// Audio file is missing channel information.
    #[error("audio file is missing channel information")]
    MissingChannels,

    /// Audio file decoded to zero frames.
    #[error("audio file contains no samples")]
    Empty,
}

/// Errors raised while building or driving the output graph.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host has no default output device.
    #[error("no audio output device found")]
    NoOutputDevice,

    /// The output device has no usable default configuration.
    #[error("no default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    /// The output stream could not be built.
    #[error("failed to create audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    /// The output stream could not be started.
    #[error("failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The control ring is full; the audio thread is not draining it.
    #[error("command queue full")]
    CommandQueueFull,
}

/// Errors in the static bank configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for the expected schema.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// No banks were configured.
    #[error("config defines no banks")]
    NoBanks,

    /// A bank has no sounds.
    #[error("bank {bank} has no sounds")]
    EmptyBank { bank: String },

    /// Two banks share an id.
    #[error("duplicate bank id {bank}")]
    DuplicateBank { bank: String },

    /// Two pads in one bank share an identity.
    #[error("duplicate pad id {pad} in bank {bank}")]
    DuplicatePad { bank: String, pad: String },
}
