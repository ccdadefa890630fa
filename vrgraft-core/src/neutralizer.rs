//! # Neutralizer
//!
//! Host viewpoints whose output is fully replaced by the stereo viewpoint still have to exist, since host logic
//! may look them up, but rendering them is wasted work. Neutralized viewpoints render nothing, as early as possible.
//! The host (or another mod) may reconfigure them at any time, so the state is re-forced every tick.

use crate::{
    host::Host,
    layers::LayerMask,
    viewpoint::{ClearMode, Viewpoint, ViewpointID},
};

/// Draw priority of neutralized viewpoints, below anything a host would reasonably use.
pub const NEUTRAL_DEPTH: f32 = -9999.0;

/// Make a viewpoint inert without disabling it.
pub fn neutralize(viewpoint: &mut Viewpoint) {
    viewpoint.culling_mask = LayerMask::empty();
    viewpoint.depth = NEUTRAL_DEPTH;
    viewpoint.occlusion_culling = false;
    viewpoint.clear_mode = ClearMode::Nothing;
}
#[must_use]
pub fn is_neutral(viewpoint: &Viewpoint) -> bool {
    viewpoint.culling_mask.is_empty()
        && viewpoint.depth == NEUTRAL_DEPTH
        && !viewpoint.occlusion_culling
        && viewpoint.clear_mode == ClearMode::Nothing
}

/// The set of viewpoints kept neutral.
#[derive(Default)]
pub struct Neutralized {
    viewpoints: hashbrown::HashSet<ViewpointID>,
}
impl Neutralized {
    pub fn attach(&mut self, host: &mut dyn Host, id: ViewpointID) {
        if let Some(viewpoint) = host.viewpoint_mut(id) {
            log::info!("Neutralizing irrelevant viewpoint {} ({id})", viewpoint.name);
            neutralize(viewpoint);
            self.viewpoints.insert(id);
        }
    }
    /// Re-force every neutralized viewpoint, forgetting those the host destroyed.
    pub fn enforce(&mut self, host: &mut dyn Host) {
        self.viewpoints.retain(|&id| match host.viewpoint_mut(id) {
            Some(viewpoint) => {
                if !is_neutral(viewpoint) {
                    log::trace!("{} ({id}) was reconfigured, neutralizing again", viewpoint.name);
                    neutralize(viewpoint);
                }
                true
            }
            None => false,
        });
    }
    #[must_use]
    pub fn contains(&self, id: ViewpointID) -> bool {
        self.viewpoints.contains(&id)
    }
    /// Forget every viewpoint without touching the host. Their IDs may already name other viewpoints.
    pub fn clear(&mut self) {
        self.viewpoints.clear();
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.viewpoints.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimHost;

    #[test]
    fn reforced_and_forgotten() {
        let mut host = SimHost::new([640, 480]);
        let id = host.add_viewpoint(Viewpoint::named("Minimap"));
        let mut neutralized = Neutralized::default();
        neutralized.attach(&mut host, id);
        assert!(is_neutral(host.viewpoint(id).unwrap()));
        // Still alive and enabled, only inert.
        assert!(host.viewpoint(id).unwrap().enabled);

        // Something resets it behind our back.
        host.viewpoint_mut(id).unwrap().culling_mask = LayerMask::all();
        neutralized.enforce(&mut host);
        assert!(is_neutral(host.viewpoint(id).unwrap()));

        host.destroy_viewpoint(id);
        neutralized.enforce(&mut host);
        assert!(neutralized.is_empty());
    }
}
