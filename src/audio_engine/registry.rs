//! Playback registry: which units are sounding for which pad.
//!
//! The registry is the single source of truth for "is this pad active". A pad's
//! collection is emptied rather than removed, and every removal is idempotent, so
//! a completion event racing a user stop is harmless.

use std::collections::{BTreeSet, HashMap};

use crate::audio_engine::audio_stream::OutputGraph;
use crate::audio_engine::unit::PlaybackUnit;
use crate::messages::UnitId;

#[derive(Debug, Default)]
pub struct PlaybackRegistry {
    /// Live units per pad, in insertion order.
    pads: HashMap<String, Vec<PlaybackUnit>>,
    /// Cached view: pads with a non-empty collection.
    active: BTreeSet<String>,
}

impl PlaybackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `unit` to the pad's collection and marks the pad active.
    pub fn register(&mut self, pad_id: &str, unit: PlaybackUnit) {
        self.pads.entry(pad_id.to_string()).or_default().push(unit);
        self.active.insert(pad_id.to_string());
    }

    /// Stops every live unit of the pad and empties its collection.
    ///
    /// Returns the number of units stopped.
    pub fn stop_all(&mut self, pad_id: &str, graph: &mut OutputGraph) -> usize {
        let stopped = match self.pads.get_mut(pad_id) {
            Some(units) => {
                for unit in units.iter() {
                    unit.stop(graph);
                }
                let count = units.len();
                units.clear();
                count
            }
            None => 0,
        };
        self.active.remove(pad_id);
        stopped
    }

    /// Applies [`stop_all`](Self::stop_all) to every pad with live units.
    pub fn stop_everything(&mut self, graph: &mut OutputGraph) -> usize {
        let pads: Vec<String> = self.active.iter().cloned().collect();
        pads.iter().map(|pad| self.stop_all(pad, graph)).sum()
    }

    /// Stops a single unit. Returns the owning pad if the unit was live.
    pub fn stop_unit(&mut self, unit: UnitId, graph: &mut OutputGraph) -> Option<String> {
        let (pad, removed) = self.remove_unit(unit)?;
        removed.stop(graph);
        Some(pad)
    }

    /// Retroactively latches or unlatches the pad's live units.
    ///
    /// Loop on: every buffer-backed unit loops; synthesized units are unaffected.
    /// Loop off: buffer-backed units finish their current cycle; synthesized units
    /// are stopped and deregistered immediately. Returns the ids stopped.
    pub fn set_loop_flag_for_live(
        &mut self,
        pad_id: &str,
        loop_on: bool,
        graph: &mut OutputGraph,
    ) -> Vec<UnitId> {
        let Some(units) = self.pads.get_mut(pad_id) else {
            return Vec::new();
        };

        let mut stopped = Vec::new();
        units.retain_mut(|unit| {
            if unit.set_looping(graph, loop_on) || loop_on {
                return true;
            }
            unit.stop(graph);
            stopped.push(unit.id());
            false
        });

        if units.is_empty() {
            self.active.remove(pad_id);
        }
        stopped
    }

    /// Completion handler for a unit that ended on its own.
    ///
    /// Returns the owning pad, or `None` if the unit was already stopped or removed.
    pub fn complete(&mut self, unit: UnitId) -> Option<String> {
        self.remove_unit(unit).map(|(pad, _)| pad)
    }

    /// Ramps every live unit towards `pitch`.
    pub fn retune_all(&mut self, pitch: f32, graph: &mut OutputGraph) {
        for unit in self.pads.values_mut().flatten() {
            unit.retune(graph, pitch);
        }
    }

    pub fn is_active(&self, pad_id: &str) -> bool {
        self.active.contains(pad_id)
    }

    pub fn active_pads(&self) -> &BTreeSet<String> {
        &self.active
    }

    pub fn live_units(&self, pad_id: &str) -> &[PlaybackUnit] {
        self.pads.get(pad_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unit_count(&self) -> usize {
        self.pads.values().map(Vec::len).sum()
    }

    fn remove_unit(&mut self, unit: UnitId) -> Option<(String, PlaybackUnit)> {
        let (pad, units) = self
            .pads
            .iter_mut()
            .find(|(_, units)| units.iter().any(|u| u.id() == unit))?;

        let index = units.iter().position(|u| u.id() == unit)?;
        let removed = units.remove(index);
        let pad = pad.clone();
        if units.is_empty() {
            self.active.remove(&pad);
        }
        Some((pad, removed))
    }
}
