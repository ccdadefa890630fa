//! # Viewpoint classifier
//!
//! Once per tick, every live host viewpoint not seen before is judged by the interpreter and handed to the
//! synthesizer and/or the capture coordinator. A viewpoint is judged at most once, until a scene load
//! (IDs may be reused after one) or a failed judgement (retried on the next tick).

use crate::{
    capture::Capture,
    host::Host,
    interpreter::{CameraJudgement, Interpreter},
    synthesizer::Synthesizer,
    viewpoint::ViewpointID,
};

#[derive(Default)]
pub struct Classifier {
    seen: hashbrown::HashSet<ViewpointID>,
    /// Failed their last judgement. Only the first failure in a row is warned about.
    failing: hashbrown::HashSet<ViewpointID>,
    // Reused across ticks, so steady state enumeration does not allocate.
    scratch: Vec<ViewpointID>,
}
impl Classifier {
    /// Judge and dispatch every unseen viewpoint. Returns how many were judged successfully.
    ///
    /// `effects_enabled` re-applies the blueprint's post effects after each main camera copy.
    pub fn classify(
        &mut self,
        host: &mut dyn Host,
        interpreter: &dyn Interpreter,
        synthesizer: &mut Synthesizer,
        capture: &mut Capture,
        effects_enabled: bool,
    ) -> usize {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.reserve(host.viewpoint_count());
        host.collect_viewpoints(&mut scratch);
        if !self.failing.is_empty() {
            self.failing.retain(|id| scratch.contains(id));
        }

        let mut judged = 0;
        for &id in &scratch {
            // Our own viewpoints are not the host's to judge.
            if id == synthesizer.canonical() || id == capture.viewpoint() {
                continue;
            }
            if !self.seen.insert(id) {
                continue;
            }
            let Some(viewpoint) = host.viewpoint(id) else {
                // Destroyed between enumeration and now.
                self.seen.remove(&id);
                continue;
            };
            let judgement = match interpreter.judge_camera(id, viewpoint) {
                Ok(judgement) => {
                    self.failing.remove(&id);
                    judgement
                }
                Err(err) => {
                    if self.failing.insert(id) {
                        log::warn!("Failed to judge {} ({id}), retrying every tick: {err:#}", viewpoint.name);
                    } else {
                        log::debug!("Still failing to judge {} ({id}): {err:#}", viewpoint.name);
                    }
                    self.seen.remove(&id);
                    continue;
                }
            };
            log::info!("{} ({id}) judged {judgement}", viewpoint.name);
            judged += 1;

            match judgement {
                CameraJudgement::MainCamera => {
                    synthesizer.copy(host, interpreter, id, true, false);
                    if effects_enabled {
                        synthesizer.copy_effects(host, interpreter, capture);
                    }
                }
                CameraJudgement::SubCamera => synthesizer.copy(host, interpreter, id, false, false),
                CameraJudgement::Gui => capture.add_camera(host, interpreter, id),
                CameraJudgement::GuiAndCamera => {
                    synthesizer.copy(host, interpreter, id, false, true);
                    capture.add_camera(host, interpreter, id);
                }
                CameraJudgement::Ignore => (),
            }
        }
        self.scratch = scratch;
        judged
    }
    #[must_use]
    pub fn is_seen(&self, id: ViewpointID) -> bool {
        self.seen.contains(&id)
    }
    /// Did the last judgement of this viewpoint fail?
    #[must_use]
    pub fn is_failing(&self, id: ViewpointID) -> bool {
        self.failing.contains(&id)
    }
    /// Forget every judgement. Viewpoint IDs of the next scene may collide with old ones.
    pub fn on_scene_loaded(&mut self) {
        log::debug!("Forgetting {} judged viewpoints", self.seen.len());
        self.seen.clear();
        self.failing.clear();
    }
}
