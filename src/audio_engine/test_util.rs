//! Shared helpers for unit tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::audio_engine::audio_stream::OutputGraph;
use crate::audio_engine::mixer::RtGraph;
use crate::messages::DecodedAudio;

pub const TEST_CHANNELS: usize = 2;
pub const TEST_SAMPLE_RATE: u32 = 48_000;

/// Writes a PCM16 WAV file.
pub fn write_pcm16_wav(
    path: &Path,
    channels: u16,
    sample_rate_hz: u32,
    samples: &[i16],
) -> std::io::Result<()> {
    let bits_per_sample = 16u16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate_hz * u32::from(block_align);
    let data_len_bytes = u32::try_from(samples.len() * 2).expect("sample data too large");
    let chunk_size = 36 + data_len_bytes;

    let mut file = File::create(path)?;
    file.write_all(b"RIFF")?;
    file.write_all(&chunk_size.to_le_bytes())?;
    file.write_all(b"WAVE")?;

    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?; // PCM
    file.write_all(&channels.to_le_bytes())?;
    file.write_all(&sample_rate_hz.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&block_align.to_le_bytes())?;
    file.write_all(&bits_per_sample.to_le_bytes())?;

    file.write_all(b"data")?;
    file.write_all(&data_len_bytes.to_le_bytes())?;
    for sample in samples {
        file.write_all(&sample.to_le_bytes())?;
    }

    Ok(())
}

/// Constant-valued mono audio at the test sample rate.
pub fn constant_audio(frames: usize, value: f32) -> DecodedAudio {
    DecodedAudio::new(1, TEST_SAMPLE_RATE, vec![value; frames])
}

/// A device-less graph at the test format.
pub fn detached_graph(gain: f32) -> (OutputGraph, RtGraph) {
    OutputGraph::detached(TEST_CHANNELS, TEST_SAMPLE_RATE, gain)
}

/// Renders `frames` frames in device-sized blocks.
pub fn render_frames(rt: &mut RtGraph, frames: usize) {
    let mut block = vec![0.0; 512 * TEST_CHANNELS];
    let mut remaining = frames;
    while remaining > 0 {
        let n = remaining.min(512);
        rt.process(&mut block[..n * TEST_CHANNELS]);
        remaining -= n;
    }
}

/// Renders `secs` seconds of audio.
pub fn render_secs(rt: &mut RtGraph, secs: f32) {
    render_frames(rt, (secs * TEST_SAMPLE_RATE as f32).ceil() as usize);
}
