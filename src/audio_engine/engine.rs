//! Engine facade: the state machine behind every pad, strip and button.
//!
//! The engine starts `Uninitialized` and becomes `Ready` on an explicit
//! power-on, which builds the output graph. Volume, pitch, loop overrides and
//! the buffer cache live outside the graph and survive a power cycle.

use std::collections::BTreeSet;
use std::thread::JoinHandle;

use crate::audio_engine::analysis::AnalyserNode;
use crate::audio_engine::audio_stream::OutputGraph;
use crate::audio_engine::buffer_cache::BufferCache;
use crate::audio_engine::constants::{
    DEFAULT_MASTER_VOLUME, DEFAULT_PITCH, PITCH_MAX, PITCH_MIN, VOLUME_MAX, VOLUME_MIN,
};
use crate::audio_engine::errors::EngineError;
use crate::audio_engine::graph_builder::SourceGraphBuilder;
use crate::audio_engine::registry::PlaybackRegistry;
use crate::banks::{Bank, BankSet, SoundDescriptor};
use crate::config::{PowerOnPolicy, SoundboardConfig};
use crate::messages::{AudioMessage, ControlMessage, UnitId};

/// Result of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new unit started.
    Started(UnitId),
    /// The pad was an active loop and has been stopped.
    Stopped,
    /// The engine is not powered on.
    Ignored,
    /// The audio thread could not accept the start command.
    Dropped,
}

/// Everything that exists only while powered on.
struct ReadyState {
    graph: OutputGraph,
    registry: PlaybackRegistry,
    builder: SourceGraphBuilder,
}

enum EngineState {
    Uninitialized,
    Ready(Box<ReadyState>),
}

pub struct Engine {
    state: EngineState,
    policy: PowerOnPolicy,
    banks: BankSet,
    current_bank: usize,
    cache: BufferCache,
    master_volume: f32,
    pitch: f32,
    loop_overrides: BTreeSet<String>,
}

impl Engine {
    pub fn new(config: SoundboardConfig) -> Self {
        Self {
            state: EngineState::Uninitialized,
            policy: config.power_on_policy,
            banks: config.banks,
            current_bank: 0,
            cache: BufferCache::new(config.asset_root),
            master_volume: DEFAULT_MASTER_VOLUME,
            pitch: DEFAULT_PITCH,
            loop_overrides: BTreeSet::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Builds the output graph on the default device. No-op when already powered on.
    pub fn power_on(&mut self) -> Result<(), EngineError> {
        if self.is_initialized() {
            return Ok(());
        }
        let graph = OutputGraph::open_default_device(self.master_volume)?;
        self.power_on_with(graph);
        Ok(())
    }

    /// Powers on with a caller-built graph, e.g. [`OutputGraph::detached`].
    ///
    /// Ignored when already powered on.
    pub fn power_on_with(&mut self, graph: OutputGraph) {
        if self.is_initialized() {
            log::debug!("power_on ignored: already running");
            return;
        }

        log::info!(
            "Power on ({} ch@{} Hz, {}, volume {:.2}, pitch {:.2}, assets in {})",
            graph.channels(),
            graph.sample_rate(),
            if graph.has_device() { "device" } else { "detached" },
            self.master_volume,
            self.pitch,
            self.cache.asset_root().display()
        );
        self.state = EngineState::Ready(Box::new(ReadyState {
            graph,
            registry: PlaybackRegistry::new(),
            builder: SourceGraphBuilder::new(),
        }));
        self.preload_current_bank();
    }

    /// Stops every unit and tears the graph down.
    pub fn shut_down(&mut self) {
        if let EngineState::Ready(ready) = &mut self.state {
            ready.registry.stop_everything(&mut ready.graph);
            ready.graph.send_best_effort(ControlMessage::StopAll());
            log::info!("Shutting down output graph");
        }
        self.state = EngineState::Uninitialized;
    }

    fn ready_mut(&mut self) -> Option<&mut ReadyState> {
        match &mut self.state {
            EngineState::Ready(ready) => Some(ready),
            EngineState::Uninitialized => None,
        }
    }

    fn ready(&self) -> Option<&ReadyState> {
        match &self.state {
            EngineState::Ready(ready) => Some(ready),
            EngineState::Uninitialized => None,
        }
    }

    /// Effective loop state: default-loop flag OR manual override.
    pub fn is_looping(&self, descriptor: &SoundDescriptor) -> bool {
        descriptor.looped || self.loop_overrides.contains(&descriptor.id)
    }

    /// Plays `descriptor`, or stops it if it is an active loop.
    ///
    /// One-shots always start a new overlapping unit. On a cache miss a background
    /// load is started for next time and a fallback tone plays now.
    pub fn trigger(&mut self, descriptor: &SoundDescriptor) -> TriggerOutcome {
        if !self.is_initialized() {
            match self.policy {
                PowerOnPolicy::Explicit => {
                    log::debug!("trigger {} ignored: not powered on", descriptor.id);
                    return TriggerOutcome::Ignored;
                }
                PowerOnPolicy::OnFirstTrigger => {
                    if let Err(err) = self.power_on() {
                        log::error!("Implicit power on failed: {err}");
                        return TriggerOutcome::Ignored;
                    }
                }
            }
        }

        // Drained before every start: the event ring holds at most the live voices
        // plus one full command ring of overflowed starts.
        self.process_events();

        let effective_loop = self.is_looping(descriptor);
        let pitch = self.pitch;
        let cache = self.cache.clone();
        let Some(ready) = self.ready_mut() else {
            return TriggerOutcome::Ignored;
        };

        if effective_loop && ready.registry.is_active(&descriptor.id) {
            ready.registry.stop_all(&descriptor.id, &mut ready.graph);
            log::debug!("{} loop toggled off", descriptor.id);
            return TriggerOutcome::Stopped;
        }

        match ready
            .builder
            .build(descriptor, effective_loop, pitch, &cache, &mut ready.graph)
        {
            Ok(unit) => {
                if !unit.is_buffered() {
                    // Cache miss: load for the next trigger.
                    let _ = cache.ensure_loaded(&descriptor.path);
                }
                let id = unit.id();
                ready.registry.register(&descriptor.id, unit);
                TriggerOutcome::Started(id)
            }
            Err(err) => {
                log::warn!("Could not start {}: {err}", descriptor.id);
                TriggerOutcome::Dropped
            }
        }
    }

    /// Triggers a pad of the current bank by identity.
    pub fn trigger_pad(&mut self, pad_id: &str) -> Option<TriggerOutcome> {
        let descriptor = self.descriptor(pad_id)?.clone();
        Some(self.trigger(&descriptor))
    }

    /// Stops every unit of one pad. Stopping an idle pad is a no-op.
    pub fn stop(&mut self, pad_id: &str) {
        if let Some(ready) = self.ready_mut() {
            ready.registry.stop_all(pad_id, &mut ready.graph);
        }
    }

    /// Stops a single unit, leaving overlapping siblings playing.
    pub fn stop_unit(&mut self, unit: UnitId) -> bool {
        match self.ready_mut() {
            Some(ready) => ready.registry.stop_unit(unit, &mut ready.graph).is_some(),
            None => false,
        }
    }

    /// Master kill: stops every pad in one call.
    pub fn stop_all_pads(&mut self) {
        if let Some(ready) = self.ready_mut() {
            let stopped = ready.registry.stop_everything(&mut ready.graph);
            log::debug!("Stopped {stopped} units");
        }
    }

    /// Enables or disables the manual loop override and re-latches live units.
    ///
    /// Setting the override to its current state leaves live units untouched.
    pub fn set_loop_override(&mut self, pad_id: &str, on: bool) {
        let changed = if on {
            self.loop_overrides.insert(pad_id.to_string())
        } else {
            self.loop_overrides.remove(pad_id)
        };
        if !changed {
            return;
        }

        if let Some(ready) = self.ready_mut() {
            let stopped = ready
                .registry
                .set_loop_flag_for_live(pad_id, on, &mut ready.graph);
            if !stopped.is_empty() {
                log::debug!("{pad_id}: unlatched {} tones", stopped.len());
            }
        }
    }

    /// Flips the manual loop override. Returns the new state.
    pub fn toggle_loop(&mut self, pad_id: &str) -> bool {
        let on = !self.loop_overrides.contains(pad_id);
        self.set_loop_override(pad_id, on);
        on
    }

    /// Sets master volume, clamped to [0, 1]. The gain ramps rather than jumps.
    pub fn set_master_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }

        self.master_volume = volume.clamp(VOLUME_MIN, VOLUME_MAX);
        let gain = self.master_volume;
        if let Some(ready) = self.ready_mut() {
            ready
                .graph
                .send_best_effort(ControlMessage::SetMasterGain(gain));
        }
    }

    /// Sets pitch, clamped to [0.5, 1.5], and ramps every live unit towards it.
    pub fn set_pitch(&mut self, pitch: f32) {
        if !pitch.is_finite() {
            return;
        }

        self.pitch = pitch.clamp(PITCH_MIN, PITCH_MAX);
        let pitch = self.pitch;
        if let Some(ready) = self.ready_mut() {
            ready.registry.retune_all(pitch, &mut ready.graph);
        }
    }

    /// Runs completion handlers for units that ended on their own.
    ///
    /// Hosts call this from their event loop; [`trigger`](Self::trigger) also drains
    /// pending events before starting a unit. Returns the number of events handled.
    pub fn process_events(&mut self) -> usize {
        let Some(ready) = self.ready_mut() else {
            return 0;
        };

        let mut handled = 0;
        while let Some(event) = ready.graph.poll_event() {
            match event {
                AudioMessage::UnitFinished { unit } => {
                    if let Some(pad) = ready.registry.complete(unit) {
                        log::debug!("{unit} of {pad} finished");
                    }
                }
            }
            handled += 1;
        }
        handled
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_active(&self, pad_id: &str) -> bool {
        self.ready()
            .is_some_and(|ready| ready.registry.is_active(pad_id))
    }

    /// Pads with at least one live unit, for highlighting.
    pub fn active_pads(&self) -> BTreeSet<String> {
        self.ready()
            .map(|ready| ready.registry.active_pads().clone())
            .unwrap_or_default()
    }

    pub fn loop_overrides(&self) -> &BTreeSet<String> {
        &self.loop_overrides
    }

    /// The analyser stage, for the visualizer. `None` until powered on.
    pub fn analyser(&self) -> Option<AnalyserNode> {
        self.ready().map(|ready| ready.graph.analyser().clone())
    }

    pub fn buffer_cache(&self) -> &BufferCache {
        &self.cache
    }

    /// Starts a background load unless `path` is already cached.
    pub fn preload(&self, path: &str) -> Option<JoinHandle<()>> {
        self.cache.ensure_loaded(path)
    }

    pub fn banks(&self) -> &BankSet {
        &self.banks
    }

    pub fn current_bank(&self) -> &Bank {
        &self.banks.banks()[self.current_bank]
    }

    /// Switches the pad grid to another bank and preloads its sounds when powered on.
    ///
    /// Returns `false` for an unknown bank id. Sounds already playing keep playing.
    pub fn select_bank(&mut self, bank_id: &str) -> bool {
        let Some(index) = self.banks.position(bank_id) else {
            return false;
        };
        self.current_bank = index;
        if self.is_initialized() {
            self.preload_current_bank();
        }
        true
    }

    /// Descriptor for a pad of the current bank.
    pub fn descriptor(&self, pad_id: &str) -> Option<&SoundDescriptor> {
        self.current_bank().sound(pad_id)
    }

    fn preload_current_bank(&self) {
        let bank = self.current_bank();
        log::debug!("Preloading bank {}", bank.id);
        for sound in &bank.sounds {
            let _ = self.cache.ensure_loaded(&sound.path);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SoundboardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::mixer::RtGraph;
    use crate::audio_engine::test_util::{constant_audio, detached_graph, render_frames, render_secs};
    use crate::banks::PadColor;

    const CACHED: &str = "cached.wav";
    const MISSING: &str = "missing-asset.wav";

    /// Engine over an empty asset directory, powered on with a detached graph.
    fn ready_engine() -> (Engine, RtGraph, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let config = SoundboardConfig {
            asset_root: tmp.path().to_path_buf(),
            ..SoundboardConfig::default()
        };
        let mut engine = Engine::new(config);
        let (graph, rt) = detached_graph(engine.master_volume());
        engine.power_on_with(graph);
        (engine, rt, tmp)
    }

    fn one_shot(id: &str, path: &str) -> SoundDescriptor {
        SoundDescriptor::new(id, id, path, PadColor::Green)
    }

    fn started(outcome: TriggerOutcome) -> UnitId {
        match outcome {
            TriggerOutcome::Started(unit) => unit,
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let engine = Engine::default();
        assert!(!engine.is_initialized());
        assert!((engine.master_volume() - 0.8).abs() < f32::EPSILON);
        assert!((engine.pitch() - 1.0).abs() < f32::EPSILON);
        assert!(engine.active_pads().is_empty());
        assert!(engine.loop_overrides().is_empty());
        assert!(engine.analyser().is_none());
        assert_eq!(engine.current_bank().id, "A");
    }

    #[test]
    fn test_trigger_before_power_on_is_ignored() {
        let mut engine = Engine::default();
        let outcome = engine.trigger(&one_shot("a1", MISSING));
        assert_eq!(outcome, TriggerOutcome::Ignored);
        assert!(!engine.is_initialized());

        // Other operations are harmless before power on.
        engine.stop("a1");
        engine.stop_all_pads();
        assert_eq!(engine.process_events(), 0);
    }

    #[test]
    fn test_power_on_is_idempotent() {
        let (mut engine, _rt, _tmp) = ready_engine();
        let (graph, _other) = detached_graph(1.0);
        engine.power_on_with(graph);
        assert!(engine.is_initialized());
        assert!(engine.power_on().is_ok());
    }

    #[test]
    fn test_one_shots_stack_and_stop_independently() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(48_000, 0.2));
        let d = one_shot("a1", CACHED);

        let first = started(engine.trigger(&d));
        let second = started(engine.trigger(&d));
        assert_ne!(first, second);
        render_frames(&mut rt, 64);
        assert_eq!(rt.voice_count(), 2);

        assert!(engine.stop_unit(first));
        render_frames(&mut rt, 64);
        assert!(!rt.is_sounding(first));
        assert!(rt.is_sounding(second));
        assert!(engine.is_active("a1"));
    }

    #[test]
    fn test_one_shot_deactivates_when_last_unit_finishes() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(1_000, 0.2));
        let d = one_shot("a1", CACHED);

        started(engine.trigger(&d));
        render_frames(&mut rt, 500);
        started(engine.trigger(&d));

        // First unit ends; the second keeps the pad lit.
        render_frames(&mut rt, 600);
        assert_eq!(engine.process_events(), 1);
        assert!(engine.is_active("a1"));

        render_frames(&mut rt, 600);
        assert_eq!(engine.process_events(), 1);
        assert!(!engine.is_active("a1"));
    }

    #[test]
    fn test_loop_trigger_toggles() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(1_000, 0.2));
        let d = one_shot("b1", CACHED).looped();

        started(engine.trigger(&d));
        assert!(engine.is_active("b1"));

        assert_eq!(engine.trigger(&d), TriggerOutcome::Stopped);
        assert!(!engine.is_active("b1"));

        render_frames(&mut rt, 64);
        assert_eq!(rt.voice_count(), 0);
    }

    #[test]
    fn test_stop_idle_pad_is_noop() {
        let (mut engine, _rt, _tmp) = ready_engine();
        engine.stop("never-played");
        engine.stop("never-played");
        assert!(engine.active_pads().is_empty());
        assert!(!engine.stop_unit(UnitId(12345)));
    }

    #[test]
    fn test_loop_latch_keeps_buffer_playing() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(1_000, 0.2));
        let d = one_shot("a1", CACHED);

        let unit = started(engine.trigger(&d));
        render_frames(&mut rt, 200);

        engine.set_loop_override("a1", true);
        render_frames(&mut rt, 10_000);
        engine.process_events();

        assert!(rt.is_sounding(unit));
        assert_eq!(rt.is_looping(unit), Some(true));
        assert!(engine.is_active("a1"));
    }

    #[test]
    fn test_loop_unlatch_lets_buffer_finish() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(1_000, 0.2));
        engine.set_loop_override("a1", true);
        let d = one_shot("a1", CACHED);

        let unit = started(engine.trigger(&d));
        render_frames(&mut rt, 2_500);
        assert!(rt.is_sounding(unit));

        engine.set_loop_override("a1", false);
        assert!(engine.is_active("a1"));

        render_frames(&mut rt, 1_000);
        engine.process_events();
        assert!(!rt.is_sounding(unit));
        assert!(!engine.is_active("a1"));
    }

    #[test]
    fn test_clearing_unset_override_is_noop() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(1_000, 0.2));
        let tone_loop = one_shot("b1", MISSING).looped();
        let buffer_loop = one_shot("b2", CACHED).looped();
        let decaying = one_shot("a1", MISSING);

        let tone_unit = started(engine.trigger(&tone_loop));
        let buffer_unit = started(engine.trigger(&buffer_loop));
        let decaying_unit = started(engine.trigger(&decaying));
        render_frames(&mut rt, 64);

        engine.set_loop_override("b1", false);
        engine.set_loop_override("b2", false);
        engine.set_loop_override("a1", false);
        render_frames(&mut rt, 2_500);
        engine.process_events();

        assert!(engine.is_looping(&tone_loop));
        assert!(engine.is_active("b1"));
        assert!(rt.is_sounding(tone_unit));

        assert!(engine.is_active("b2"));
        assert_eq!(rt.is_looping(buffer_unit), Some(true));

        assert!(engine.is_active("a1"));
        assert!(rt.is_sounding(decaying_unit));
        assert!(engine.loop_overrides().is_empty());
    }

    #[test]
    fn test_setting_override_twice_does_not_relatch() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine.set_loop_override("x1", true);
        let unit = started(engine.trigger(&one_shot("x1", MISSING)));

        engine.set_loop_override("x1", true);
        render_frames(&mut rt, 64);
        assert!(engine.is_active("x1"));
        assert!(rt.is_sounding(unit));
    }

    #[test]
    fn test_trigger_drains_finished_units() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(1_000, 0.2));

        started(engine.trigger(&one_shot("a1", CACHED)));
        render_frames(&mut rt, 2_000);

        // No explicit process_events: the next trigger runs the completion.
        started(engine.trigger(&one_shot("a2", CACHED)));
        assert!(!engine.is_active("a1"));
        assert!(engine.is_active("a2"));
    }

    #[test]
    fn test_loop_unlatch_stops_synthesized_immediately() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine.set_loop_override("x1", true);
        let d = one_shot("x1", MISSING);

        let unit = started(engine.trigger(&d));
        render_frames(&mut rt, 64);
        assert!(rt.is_sounding(unit));

        engine.set_loop_override("x1", false);
        assert!(!engine.is_active("x1"));
        assert!(!engine.active_pads().contains("x1"));

        render_frames(&mut rt, 64);
        assert!(!rt.is_sounding(unit));
    }

    #[test]
    fn test_toggle_loop() {
        let mut engine = Engine::default();
        assert!(engine.toggle_loop("a1"));
        assert!(engine.loop_overrides().contains("a1"));
        assert!(engine.is_looping(&one_shot("a1", MISSING)));
        assert!(!engine.toggle_loop("a1"));
        assert!(engine.loop_overrides().is_empty());
    }

    #[test]
    fn test_pitch_bounds() {
        let mut engine = Engine::default();
        engine.set_pitch(0.3);
        assert!((engine.pitch() - 0.5).abs() < f32::EPSILON);
        engine.set_pitch(3.0);
        assert!((engine.pitch() - 1.5).abs() < f32::EPSILON);
        engine.set_pitch(f32::NAN);
        assert!((engine.pitch() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_volume_bounds() {
        let mut engine = Engine::default();
        engine.set_master_volume(-1.0);
        assert_eq!(engine.master_volume(), 0.0);
        engine.set_master_volume(5.0);
        assert_eq!(engine.master_volume(), 1.0);
        engine.set_master_volume(f32::INFINITY);
        assert_eq!(engine.master_volume(), 1.0);
    }

    #[test]
    fn test_master_volume_ramps_output_gain() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        assert!((rt.master_gain() - 0.8).abs() < 1e-6);

        engine.set_master_volume(0.2);
        render_frames(&mut rt, 1);
        assert!(rt.master_gain() > 0.7);

        render_secs(&mut rt, 0.2);
        assert!((rt.master_gain() - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_set_pitch_retunes_live_units() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(480_000, 0.2));
        let d = one_shot("a1", CACHED);
        started(engine.trigger(&d));
        started(engine.trigger(&one_shot("x1", MISSING).looped()));
        render_frames(&mut rt, 64);

        engine.set_pitch(1.5);
        render_frames(&mut rt, 64);

        let ready = engine.ready().unwrap();
        assert!(matches!(
            ready.registry.live_units("a1")[0],
            crate::audio_engine::unit::PlaybackUnit::Buffered { rate, .. } if (rate - 1.5).abs() < 1e-6
        ));
        assert!(matches!(
            ready.registry.live_units("x1")[0],
            crate::audio_engine::unit::PlaybackUnit::Synthesized { detune_cents, .. }
                if (detune_cents - 1.5f32.log2() * 1200.0).abs() < 1e-3
        ));
    }

    #[test]
    fn test_failed_decode_falls_back_and_expires() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        let d = one_shot("x1", MISSING);

        started(engine.trigger(&d));
        assert!(engine.active_pads().contains("x1"));

        render_secs(&mut rt, 0.35);
        engine.process_events();
        assert!(!engine.active_pads().contains("x1"));
        assert!(!engine.buffer_cache().contains(MISSING));
    }

    #[test]
    fn test_master_kill_clears_everything() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine
            .buffer_cache()
            .insert(CACHED, constant_audio(48_000, 0.2));
        let shot = one_shot("a1", CACHED);
        let looped = one_shot("b1", MISSING).looped();

        started(engine.trigger(&shot));
        started(engine.trigger(&shot));
        started(engine.trigger(&looped));
        render_frames(&mut rt, 64);
        assert_eq!(engine.active_pads().len(), 2);

        engine.stop_all_pads();
        assert!(engine.active_pads().is_empty());

        render_frames(&mut rt, 64);
        assert_eq!(rt.voice_count(), 0);
    }

    #[test]
    fn test_shut_down_returns_to_uninitialized() {
        let (mut engine, mut rt, _tmp) = ready_engine();
        engine.set_loop_override("b1", true);
        engine.set_master_volume(0.4);
        started(engine.trigger(&one_shot("b1", MISSING)));

        engine.shut_down();
        render_frames(&mut rt, 64);

        assert!(!engine.is_initialized());
        assert!(engine.active_pads().is_empty());
        assert_eq!(rt.voice_count(), 0);
        assert!(engine.loop_overrides().contains("b1"));
        assert!((engine.master_volume() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bank_selection_and_trigger_pad() {
        let (mut engine, _rt, _tmp) = ready_engine();
        assert!(engine.descriptor("b1").is_none());
        assert!(engine.trigger_pad("b1").is_none());

        assert!(engine.select_bank("B"));
        assert_eq!(engine.current_bank().id, "B");
        assert!(matches!(
            engine.trigger_pad("b1"),
            Some(TriggerOutcome::Started(_))
        ));
        assert_eq!(engine.trigger_pad("b1"), Some(TriggerOutcome::Stopped));

        assert!(!engine.select_bank("Z"));
        assert_eq!(engine.current_bank().id, "B");
    }

    #[test]
    fn test_trigger_starts_background_load() {
        let (mut engine, mut rt, tmp) = ready_engine();
        crate::audio_engine::test_util::write_pcm16_wav(
            &tmp.path().join("late.wav"),
            1,
            48_000,
            &[1000; 64],
        )
        .unwrap();
        let d = one_shot("a1", "late.wav");

        // First trigger falls back; the load it starts serves later triggers.
        let first = started(engine.trigger(&d));
        render_frames(&mut rt, 16);
        assert_eq!(rt.is_looping(first), None);

        if let Some(handle) = engine.preload("late.wav") {
            handle.join().unwrap();
        }
        while !engine.buffer_cache().contains("late.wav") {
            std::thread::yield_now();
        }

        let second = started(engine.trigger(&d));
        render_frames(&mut rt, 16);
        assert_eq!(rt.is_looping(second), Some(false));
    }
}
