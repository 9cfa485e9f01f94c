//! Audio Stream Module
//!
//! This module handles the control side of the output graph:
//! - CPAL stream initialization and configuration
//! - Ring buffers for commands, completion events and the analyser tap
//! - Logger setup
//!
//! [`OutputGraph`] is the handle the engine holds once powered on. The matching
//! [`RtGraph`] lives inside the device callback, or is handed to the caller when
//! the graph is built [`detached`](OutputGraph::detached).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use env_logger::{Builder, Env};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::audio_engine::analysis::{AnalyserNode, analyser_tap};
use crate::audio_engine::constants::{
    ANALYSER_FFT_SIZE, EVENT_RING_CAPACITY, MESSAGE_RING_CAPACITY, STREAM_BUFFER_FRAMES,
};
use crate::audio_engine::errors::EngineError;
use crate::audio_engine::mixer::RtGraph;
use crate::messages::{AudioMessage, ControlMessage};

/// Setup and configure the logger for audio operations
pub fn setup_logger() {
    // Default to `info`; override via `RUST_LOG`, e.g. `RUST_LOG=debug` when troubleshooting.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Control-side handle to the output graph: master gain → analyser → device.
pub struct OutputGraph {
    stream: Option<Stream>,
    commands: Producer<ControlMessage>,
    events: Consumer<AudioMessage>,
    analyser: AnalyserNode,
    channels: usize,
    sample_rate: u32,
}

impl OutputGraph {
    /// Builds the graph on the default output device and starts the stream.
    pub fn open_default_device(initial_gain: f32) -> Result<Self, EngineError> {
        setup_logger();

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate();
        let channels = config.channels();

        log::info!(
            "Starting soundboard output graph... ({} ch@{} Hz)",
            channels,
            sample_rate
        );

        let (mut graph, mut rt) = Self::detached(channels as usize, sample_rate, initial_gain);

        let stream_config = StreamConfig {
            channels,
            sample_rate,
            buffer_size: BufferSize::Fixed(STREAM_BUFFER_FRAMES),
        };

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                rt.process(data);
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )?;
        stream.play()?;

        graph.stream = Some(stream);
        Ok(graph)
    }

    /// Builds the graph without a device.
    ///
    /// The caller drives the returned [`RtGraph`] by calling
    /// [`process`](RtGraph::process) with output blocks.
    pub fn detached(channels: usize, sample_rate: u32, initial_gain: f32) -> (Self, RtGraph) {
        let (commands, commands_rx) = RingBuffer::new(MESSAGE_RING_CAPACITY);
        let (events_tx, events) = RingBuffer::new(EVENT_RING_CAPACITY);
        let (tap, analyser) = analyser_tap(ANALYSER_FFT_SIZE);

        let rt = RtGraph::new(
            channels,
            sample_rate,
            initial_gain,
            commands_rx,
            events_tx,
            tap,
        );

        let graph = Self {
            stream: None,
            commands,
            events,
            analyser,
            channels,
            sample_rate,
        };

        (graph, rt)
    }

    /// Queues a command for the audio thread.
    pub fn send(&mut self, message: ControlMessage) -> Result<(), EngineError> {
        self.commands
            .push(message)
            .map_err(|_| EngineError::CommandQueueFull)
    }

    /// Queues a command whose loss is tolerable (e.g. a stop for a unit that may
    /// already have ended). Failures are logged.
    pub fn send_best_effort(&mut self, message: ControlMessage) {
        if let Err(err) = self.send(message) {
            log::warn!("Dropped audio command: {err}");
        }
    }

    /// Next completion event from the audio thread, if any.
    pub fn poll_event(&mut self) -> Option<AudioMessage> {
        self.events.pop().ok()
    }

    pub fn analyser(&self) -> &AnalyserNode {
        &self.analyser
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn has_device(&self) -> bool {
        self.stream.is_some()
    }
}
