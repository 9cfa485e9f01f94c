//! Audio file loading and decoding functionality.
//!
//! This module reads raw bytes for a sound path and decodes them into [`DecodedAudio`]
//! at the file's native rate and channel layout. Rate and channel adaptation happen at
//! render time, so one decode serves every output device.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::audio_engine::errors::SampleLoadError;
use crate::messages::DecodedAudio;

/// Reads and decodes an audio file.
///
/// # Errors
///
/// - File not found or cannot be read
/// - Audio format not recognized or corrupted
/// - File decodes to no samples
pub fn load_audio_file(path: &Path) -> Result<DecodedAudio, SampleLoadError> {
    let bytes = fs::read(path)?;
    let extension = path.extension().and_then(|e| e.to_str());
    decode_audio_bytes(bytes, extension)
}

/// Decodes an in-memory encoded audio file.
///
/// # Parameters
///
/// - `bytes`: Complete file contents in any container symphonia can probe
/// - `extension`: Optional file extension used as a probing hint
pub fn decode_audio_bytes(
    bytes: Vec<u8>,
    extension: Option<&str>,
) -> Result<DecodedAudio, SampleLoadError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let track_id = track.id;
    let file_rate_hz = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;
    let file_channels = track
        .codec_params
        .channels
        .ok_or(SampleLoadError::MissingChannels)?
        .count();

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut decoded: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(buf) => buf,
            // A corrupt packet is skipped; the rest of the stream is still usable.
            Err(SymphoniaError::DecodeError(err)) => {
                log::debug!("Skipping undecodable packet: {err}");
                continue;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };
        let spec = *audio_buf.spec();
        let duration = audio_buf.capacity() as u64;

        let mut sample_buf = SymphoniaSampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        decoded.extend_from_slice(sample_buf.samples());
    }

    if file_channels == 0 || decoded.len() < file_channels {
        return Err(SampleLoadError::Empty);
    }

    Ok(DecodedAudio::new(file_channels, file_rate_hz, decoded))
}
