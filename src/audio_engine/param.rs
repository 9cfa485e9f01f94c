//! Per-sample parameter smoothing.
//!
//! A [`SmoothedParam`] approaches its target exponentially with a fixed time
//! constant, so control changes never land as an instant jump.

#[derive(Debug, Clone, Copy)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// Creates a parameter resting at `value`.
    ///
    /// # Parameters
    ///
    /// - `value`: Initial and target value
    /// - `time_constant_secs`: Time to cover ~63% of a step; `0.0` disables smoothing
    /// - `sample_rate`: Rate at which [`next`](Self::next) is called
    pub fn new(value: f32, time_constant_secs: f32, sample_rate: u32) -> Self {
        let samples = time_constant_secs * sample_rate as f32;
        let coeff = if samples.is_finite() && samples > 0.0 {
            1.0 - (-1.0 / samples).exp()
        } else {
            1.0
        };

        Self {
            current: value,
            target: value,
            coeff,
        }
    }

    /// Sets a new target. Non-finite values are ignored.
    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.coeff;
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }
}
