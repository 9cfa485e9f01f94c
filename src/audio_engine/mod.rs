//! Audio Engine Module
//!
//! This module provides the soundboard's playback engine. It is organized into
//! sub-modules, each with a specific responsibility:
//!
//! - [`audio_stream`]: CPAL output stream, ring buffers and logger setup
//! - [`mixer`]: Real-time graph running inside the device callback
//! - [`voice`]: Buffer players and fallback tone generators
//! - [`param`]: Exponentially smoothed audio parameters
//! - [`analysis`]: Spectrum analyser stage for the visualizer
//! - [`buffer_cache`]: Shared cache of decoded sounds
//! - [`sample_loader`]: Audio file loading and decoding
//! - [`graph_builder`]: Turns a pad descriptor into a playable unit
//! - [`registry`]: Tracks live units per pad
//! - [`engine`]: Facade state machine used by the UI
//! - [`constants`]: Configuration constants and limits
//! - [`errors`]: Engine-specific error types
//!
//! [`Soundboard`] wraps the [`engine::Engine`] facade for Python.

use std::path::PathBuf;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::audio_engine::engine::{Engine, TriggerOutcome};
use crate::config::SoundboardConfig;

pub mod analysis;
pub mod audio_stream;
pub mod buffer_cache;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod graph_builder;
pub mod mixer;
pub mod param;
pub mod registry;
pub mod sample_loader;
pub mod unit;
pub mod voice;

#[cfg(test)]
mod test_util;

/// Soundboard exposes the playback engine to a Python UI.
///
/// Call `process_events` from the UI loop so finished one-shots clear their
/// pad highlight.
#[pyclass(unsendable)]
pub struct Soundboard {
    engine: Engine,
}

#[pymethods]
impl Soundboard {
    /// Create a soundboard from a JSON config file, or the built-in banks.
    #[new]
    #[pyo3(signature = (config_path=None))]
    pub fn new(config_path: Option<PathBuf>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => SoundboardConfig::from_path(&path)
                .map_err(|e| PyValueError::new_err(format!("Invalid config: {e}")))?,
            None => SoundboardConfig::default(),
        };

        Ok(Self {
            engine: Engine::new(config),
        })
    }

    /// Open the default output device. A no-op when already powered on.
    pub fn power_on(&mut self) -> PyResult<()> {
        self.engine
            .power_on()
            .map_err(|e| PyRuntimeError::new_err(format!("Failed to start audio output: {e}")))
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_initialized()
    }

    /// Shut down the audio output. Volume, pitch and loop overrides are kept.
    pub fn shut_down(&mut self) {
        self.engine.shut_down();
    }

    /// Trigger a pad of the current bank.
    ///
    /// Returns a dict with `type` (`started`, `stopped`, `ignored` or `dropped`)
    /// and, for `started`, the new `unit` id.
    pub fn trigger(&mut self, py: Python<'_>, pad_id: &str) -> PyResult<Py<PyAny>> {
        let outcome = self.engine.trigger_pad(pad_id).ok_or_else(|| {
            PyValueError::new_err(format!("Unknown pad in current bank: {pad_id}"))
        })?;

        let dict = PyDict::new(py);
        match outcome {
            TriggerOutcome::Started(unit) => {
                dict.set_item("type", "started")?;
                dict.set_item("unit", unit.0)?;
            }
            TriggerOutcome::Stopped => dict.set_item("type", "stopped")?,
            TriggerOutcome::Ignored => dict.set_item("type", "ignored")?,
            TriggerOutcome::Dropped => dict.set_item("type", "dropped")?,
        }

        Ok(dict.into_any().unbind())
    }

    /// Stop every sounding instance of a pad.
    pub fn stop(&mut self, pad_id: &str) {
        self.engine.stop(pad_id);
    }

    /// Stop one instance, identified by the `unit` id `trigger` returned.
    pub fn stop_unit(&mut self, unit: u64) -> bool {
        self.engine.stop_unit(crate::messages::UnitId(unit))
    }

    /// Master kill.
    pub fn stop_all(&mut self) {
        self.engine.stop_all_pads();
    }

    /// Flip a pad's loop override. Returns the new state.
    pub fn toggle_loop(&mut self, pad_id: &str) -> bool {
        self.engine.toggle_loop(pad_id)
    }

    pub fn set_loop_override(&mut self, pad_id: &str, on: bool) {
        self.engine.set_loop_override(pad_id, on);
    }

    pub fn loop_overrides(&self) -> Vec<String> {
        self.engine.loop_overrides().iter().cloned().collect()
    }

    /// Whether the pad plays looped, counting both its default and the override.
    pub fn is_looping(&self, pad_id: &str) -> PyResult<bool> {
        let descriptor = self.engine.descriptor(pad_id).ok_or_else(|| {
            PyValueError::new_err(format!("Unknown pad in current bank: {pad_id}"))
        })?;
        Ok(self.engine.is_looping(descriptor))
    }

    /// Set master volume. Values outside [0, 1] are clamped.
    pub fn set_volume(&mut self, volume: f32) -> PyResult<()> {
        if !volume.is_finite() {
            return Err(PyValueError::new_err("volume must be a finite number"));
        }
        self.engine.set_master_volume(volume);
        Ok(())
    }

    pub fn volume(&self) -> f32 {
        self.engine.master_volume()
    }

    /// Set pitch. Values outside [0.5, 1.5] are clamped.
    pub fn set_pitch(&mut self, pitch: f32) -> PyResult<()> {
        if !pitch.is_finite() {
            return Err(PyValueError::new_err("pitch must be a finite number"));
        }
        self.engine.set_pitch(pitch);
        Ok(())
    }

    pub fn pitch(&self) -> f32 {
        self.engine.pitch()
    }

    /// Run completion handlers. Returns the number of audio events handled.
    pub fn process_events(&mut self) -> usize {
        self.engine.process_events()
    }

    pub fn active_pads(&self) -> Vec<String> {
        self.engine.active_pads().into_iter().collect()
    }

    pub fn is_active(&self, pad_id: &str) -> bool {
        self.engine.is_active(pad_id)
    }

    /// Byte spectrum for the visualizer, or `None` before power on.
    pub fn frequency_data(&self) -> Option<Vec<u8>> {
        self.engine
            .analyser()
            .map(|analyser| analyser.byte_frequency_data())
    }

    pub fn bank_ids(&self) -> Vec<String> {
        self.engine
            .banks()
            .banks()
            .iter()
            .map(|bank| bank.id.clone())
            .collect()
    }

    pub fn current_bank(&self) -> String {
        self.engine.current_bank().id.clone()
    }

    pub fn select_bank(&mut self, bank_id: &str) -> PyResult<()> {
        if self.engine.select_bank(bank_id) {
            Ok(())
        } else {
            Err(PyValueError::new_err(format!("Unknown bank: {bank_id}")))
        }
    }

    /// Pads of the current bank as dicts of `id`, `label`, `color` and `loop`.
    pub fn pads(&self, py: Python<'_>) -> PyResult<Vec<Py<PyAny>>> {
        self.engine
            .current_bank()
            .sounds
            .iter()
            .map(|sound| {
                let dict = PyDict::new(py);
                dict.set_item("id", &sound.id)?;
                dict.set_item("label", &sound.label)?;
                dict.set_item("color", sound.color.as_str())?;
                dict.set_item("loop", sound.looped)?;
                Ok(dict.into_any().unbind())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundboard_defaults() {
        let mut board = Soundboard::new(None).unwrap();
        assert!(!board.is_initialized());
        assert_eq!(board.current_bank(), "A");
        assert_eq!(board.bank_ids(), vec!["A".to_string(), "B".to_string()]);
        assert!(board.frequency_data().is_none());
        assert_eq!(board.process_events(), 0);
    }

    #[test]
    fn test_soundboard_controls_without_device() {
        let mut board = Soundboard::new(None).unwrap();
        assert!(board.toggle_loop("a1"));
        assert_eq!(board.loop_overrides(), vec!["a1".to_string()]);
        assert!(board.is_looping("a1").unwrap());
        assert!(board.is_looping("zz").is_err());

        board.set_volume(2.0).unwrap();
        assert_eq!(board.volume(), 1.0);
        assert!(board.set_pitch(f32::NAN).is_err());

        assert!(board.select_bank("B").is_ok());
        assert!(board.select_bank("Q").is_err());
        board.stop_all();
        assert!(board.active_pads().is_empty());
    }
}
