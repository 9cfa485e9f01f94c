use pyo3::pymodule;

pub mod audio_engine;
pub mod banks;
pub mod config;
pub mod messages;

/// The Python module implemented in Rust.
#[pymodule]
mod soundboard_audio {
    #[pymodule_export]
    use super::audio_engine::Soundboard;
}
