//! Frequency analysis node read by the visualizer.
//!
//! The real-time graph pushes post-gain mono samples into a ring; the
//! [`AnalyserNode`] drains it on demand, keeps the most recent FFT window and
//! returns one byte magnitude per frequency bin.

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use rtrb::{Consumer, Producer, RingBuffer};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::{Arc, Mutex, PoisonError};

use crate::audio_engine::constants::{
    ANALYSER_MAX_DB, ANALYSER_MIN_DB, ANALYSER_SMOOTHING, ANALYSER_TAP_CAPACITY,
};

struct AnalyserState {
    tap: Consumer<f32>,
    history: VecDeque<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl AnalyserState {
    fn drain_tap(&mut self, fft_size: usize) {
        while let Ok(sample) = self.tap.pop() {
            if self.history.len() == fft_size {
                self.history.pop_front();
            }
            self.history.push_back(sample);
        }
    }
}

/// Shareable handle to the analyser stage of the output graph.
#[derive(Clone)]
pub struct AnalyserNode {
    fft_size: usize,
    state: Arc<Mutex<AnalyserState>>,
}

impl std::fmt::Debug for AnalyserNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyserNode")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}

/// Creates the sample tap feeding an analyser with the given FFT size.
///
/// The producer belongs to the real-time graph.
pub fn analyser_tap(fft_size: usize) -> (Producer<f32>, AnalyserNode) {
    let (producer, consumer) = RingBuffer::new(ANALYSER_TAP_CAPACITY);
    (producer, AnalyserNode::new(fft_size, consumer))
}

/// Blackman window coefficients.
fn blackman(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}

impl AnalyserNode {
    fn new(fft_size: usize, tap: Consumer<f32>) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();

        let state = AnalyserState {
            tap,
            history: VecDeque::with_capacity(fft_size),
            fft,
            window: blackman(fft_size),
            input,
            spectrum,
            smoothed: vec![0.0; fft_size / 2],
        };

        Self {
            fft_size,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins returned by [`byte_frequency_data`](Self::byte_frequency_data).
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Snapshot of the most recent audio frame, one magnitude byte per bin.
    ///
    /// Magnitudes are smoothed against the previous read and mapped from
    /// [-100 dB, -30 dB] onto 0..=255.
    pub fn byte_frequency_data(&self) -> Vec<u8> {
        let mut data = vec![0; self.frequency_bin_count()];
        self.fill_byte_frequency_data(&mut data);
        data
    }

    /// Like [`byte_frequency_data`](Self::byte_frequency_data) but writes into `out`.
    ///
    /// Extra bins in `out` are left untouched.
    pub fn fill_byte_frequency_data(&self, out: &mut [u8]) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;
        state.drain_tap(self.fft_size);

        // Oldest samples first, zero-padded at the front until the window fills.
        let pad = self.fft_size - state.history.len();
        for (i, slot) in state.input.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { state.history[i - pad] };
            *slot = sample * state.window[i];
        }

        if let Err(err) = state.fft.process(&mut state.input, &mut state.spectrum) {
            log::error!("Analyser FFT failed: {err}");
            return;
        }

        let norm = 1.0 / self.fft_size as f32;
        let range = ANALYSER_MAX_DB - ANALYSER_MIN_DB;
        for (bin, byte) in out.iter_mut().take(state.smoothed.len()).enumerate() {
            let magnitude = state.spectrum[bin].norm() * norm;
            let smoothed =
                ANALYSER_SMOOTHING * state.smoothed[bin] + (1.0 - ANALYSER_SMOOTHING) * magnitude;
            state.smoothed[bin] = smoothed;

            let db = 20.0 * smoothed.log10();
            let scaled = (db - ANALYSER_MIN_DB) / range * 255.0;
            *byte = if scaled.is_nan() {
                0
            } else {
                scaled.clamp(0.0, 255.0) as u8
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::constants::ANALYSER_FFT_SIZE;

    fn feed(tap: &mut Producer<f32>, samples: impl IntoIterator<Item = f32>) {
        for sample in samples {
            tap.push(sample).unwrap();
        }
    }

    #[test]
    fn test_bin_count() {
        let (_tap, node) = analyser_tap(ANALYSER_FFT_SIZE);
        assert_eq!(node.fft_size(), 64);
        assert_eq!(node.frequency_bin_count(), 32);
        assert_eq!(node.byte_frequency_data().len(), 32);
    }

    #[test]
    fn test_silence_reads_zero() {
        let (mut tap, node) = analyser_tap(ANALYSER_FFT_SIZE);
        feed(&mut tap, std::iter::repeat_n(0.0, 128));
        assert!(node.byte_frequency_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let (mut tap, node) = analyser_tap(ANALYSER_FFT_SIZE);
        let bin = 4.0;
        feed(
            &mut tap,
            (0..256).map(|i| (2.0 * PI * bin * i as f32 / ANALYSER_FFT_SIZE as f32).sin()),
        );

        let data = node.byte_frequency_data();
        assert!(data[4] > 200);
        assert!(data[4] > data[14]);
        assert!(data[20] < data[4]);
    }

    #[test]
    fn test_clones_share_state() {
        let (mut tap, node) = analyser_tap(ANALYSER_FFT_SIZE);
        let reader = node.clone();
        feed(
            &mut tap,
            (0..64).map(|i| (2.0 * PI * 8.0 * i as f32 / 64.0).sin()),
        );

        // The first read drains the tap; the clone sees the same window.
        let first = node.byte_frequency_data();
        let second = reader.byte_frequency_data();
        assert!(first[8] > 0);
        assert!(second[8] > 0);
    }
}
