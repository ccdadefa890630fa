//! # Stereo viewpoint synthesizer
//!
//! Owns the one canonical stereo viewpoint presented to the user. Its configuration mirrors the *blueprint*, the host
//! viewpoint currently acting as "the main camera", and its culling mask is the union of everything rendered by the
//! host viewpoints it replaces (the *sub-viewpoints*).
//!
//! Sub-viewpoints join and leave the aggregate through [`Synthesizer::register_slave`] and
//! [`Synthesizer::unregister_slave`], driven by the enable/disable transitions [`Synthesizer::sync`] observes once
//! per tick.

use crate::{
    capture::Capture,
    config::{Context, Layers},
    events::{CameraCopied, CameraInitialized, Observers, SubscriptionID},
    host::Host,
    interpreter::Interpreter,
    layers::LayerMask,
    neutralizer::Neutralized,
    viewpoint::{ClearMode, StereoTargetEye, Viewpoint, ViewpointID, ViewpointSnapshot},
};

/// The stereo viewpoint never clips closer than this, whatever the blueprint says.
pub const MIN_FAR_CLIP_PLANE: f32 = 10.0;
/// Name host engines conventionally give their primary viewpoint. An elected blueprint carrying it is never
/// displaced by another candidate.
pub const PRIMARY_NAME: &str = "Main Camera";
/// Name of the stereo viewpoint in the host.
pub const STEREO_VIEWPOINT_NAME: &str = "VRGraft Stereo";
const CLONE_NAME: &str = "VRGraft Stereo Clone";
const CLONE_NEAR_CLIP_PLANE: f32 = 0.01;

/// A host viewpoint wrapped as contributing to the stereo viewpoint.
#[derive(Clone, Debug)]
pub struct SubViewpoint {
    pub viewpoint: ViewpointID,
    pub name: String,
    /// Configuration before we touched it.
    pub snapshot: ViewpointSnapshot,
    /// May this viewpoint be elected blueprint?
    pub can_be_main: bool,
}

#[derive(Clone, Copy, Debug)]
enum Lifecycle {
    Enabled,
    Disabled,
    Destroyed,
}

/// What the synthesizer needs from the [`Context`], captured once at activation.
#[derive(Clone, Copy, Debug)]
struct SynthesizerConfig {
    near_clip: f32,
    /// UI and invisible layers.
    excluded: LayerMask,
    ignore: LayerMask,
    ipd_scale: f32,
    render_scale: f32,
}

pub struct Synthesizer {
    canonical: ViewpointID,
    /// Last elected blueprint. May be stale, see [`Self::blueprint`].
    blueprint: Option<ViewpointID>,
    /// Every wrapped viewpoint, in wrapping order.
    records: Vec<SubViewpoint>,
    /// Currently registered sub-viewpoints, in registration order. Never has duplicates.
    registered: Vec<ViewpointID>,
    neutralized: Neutralized,
    copied: Observers<CameraCopied>,
    initialized: Observers<CameraInitialized>,
    config: SynthesizerConfig,
}
impl Synthesizer {
    /// Spawn the stereo viewpoint. It carries the one audio listener of the process.
    pub fn new(host: &mut dyn Host, context: &Context, layers: &Layers) -> Self {
        log::info!("Creating stereo viewpoint");
        let canonical = host.spawn_viewpoint(Viewpoint {
            name: STEREO_VIEWPOINT_NAME.to_owned(),
            near_clip: context.near_clip_plane,
            far_clip: 1000.0,
            audio_listener: true,
            // Nothing contributes yet.
            culling_mask: LayerMask::empty(),
            ..Viewpoint::default()
        });

        Self {
            canonical,
            blueprint: None,
            records: Vec::new(),
            registered: Vec::new(),
            neutralized: Neutralized::default(),
            copied: Observers::default(),
            initialized: Observers::default(),
            config: SynthesizerConfig {
                near_clip: context.near_clip_plane,
                excluded: layers.excluded_mask(),
                ignore: context.ignore_mask(),
                ipd_scale: context.settings.ipd_scale,
                render_scale: context.settings.render_scale,
            },
        }
    }
    /// The stereo viewpoint.
    #[must_use]
    pub fn canonical(&self) -> ViewpointID {
        self.canonical
    }
    /// Resolution multiplier the stereo runtime should render eye buffers at.
    #[must_use]
    pub fn render_scale(&self) -> f32 {
        self.config.render_scale
    }
    /// The elected blueprint if it is alive and enabled, otherwise the first registered sub-viewpoint
    /// not owned by the capture coordinator.
    #[must_use]
    pub fn blueprint(&self, host: &dyn Host, capture: &Capture) -> Option<ViewpointID> {
        match self.blueprint {
            Some(id) if host.viewpoint(id).is_some_and(|viewpoint| viewpoint.enabled) => Some(id),
            _ => self
                .registered
                .iter()
                .copied()
                .find(|&id| !capture.owns(id)),
        }
    }
    /// The last elected blueprint, without liveness checks.
    #[must_use]
    pub fn elected_blueprint(&self) -> Option<ViewpointID> {
        self.blueprint
    }
    #[must_use]
    pub fn record(&self, id: ViewpointID) -> Option<&SubViewpoint> {
        self.records.iter().find(|record| record.viewpoint == id)
    }
    #[must_use]
    pub fn is_sub_viewpoint(&self, id: ViewpointID) -> bool {
        self.record(id).is_some()
    }
    /// Registered sub-viewpoints, in registration order.
    #[must_use]
    pub fn registered(&self) -> &[ViewpointID] {
        &self.registered
    }
    #[must_use]
    pub fn is_neutralized(&self, id: ViewpointID) -> bool {
        self.neutralized.contains(id)
    }

    /// Wrap a host viewpoint as a sub-viewpoint, electing it blueprint if `can_be_main` and the election allows.
    ///
    /// `has_other_consumers` marks viewpoints whose output is used by someone else (e.g. captured as UI),
    /// which must never be neutralized.
    pub fn copy(
        &mut self,
        host: &mut dyn Host,
        interpreter: &dyn Interpreter,
        id: ViewpointID,
        can_be_main: bool,
        has_other_consumers: bool,
    ) {
        let Some(viewpoint) = host.viewpoint(id) else {
            log::warn!("Tried to copy {id}, which no longer exists");
            return;
        };
        log::info!("Copying viewpoint {} ({id})", viewpoint.name);

        if self.is_sub_viewpoint(id) {
            log::warn!("{} ({id}) is already a sub-viewpoint, skipping", viewpoint.name);
            return;
        }

        let snapshot = ViewpointSnapshot::from(viewpoint);
        let name = viewpoint.name.clone();
        let enabled = viewpoint.enabled;
        let neutralize = !has_other_consumers
            && viewpoint.target.is_none()
            && interpreter.is_irrelevant_camera(viewpoint);

        if can_be_main && self.use_new_camera(host, id) {
            self.change_blueprint(host, id, &snapshot);
        }

        if let Some(viewpoint) = host.viewpoint_mut(id) {
            // Only the stereo viewpoint may listen.
            if viewpoint.audio_listener {
                log::debug!("Removing audio listener from {name}");
                viewpoint.audio_listener = false;
            }
            // The host's own stereo runtime must not move it around.
            viewpoint.stereo_target = StereoTargetEye::None;
        }
        self.records.push(SubViewpoint {
            viewpoint: id,
            name,
            snapshot,
            can_be_main,
        });
        if enabled {
            self.register_slave(host, interpreter, id);
        }

        if neutralize {
            self.neutralized.attach(host, id);
        }

        if can_be_main {
            let blueprint = match self.blueprint {
                Some(id) if host.is_alive(id) => Some(id),
                _ => None,
            };
            self.initialized.notify(&CameraInitialized {
                canonical: self.canonical,
                blueprint,
            });
        }
        self.copied.notify(&CameraCopied { viewpoint: id });
    }

    /// Sticky election: a live blueprint named [`PRIMARY_NAME`] is kept over any other candidate.
    #[must_use]
    pub fn use_new_camera(&self, host: &dyn Host, candidate: ViewpointID) -> bool {
        let Some(current) = self.blueprint else {
            return true;
        };
        if current == self.canonical || current == candidate {
            return true;
        }
        match host.viewpoint(current) {
            Some(viewpoint) if viewpoint.name == PRIMARY_NAME => {
                log::info!(
                    "Keeping {} ({current}) as blueprint over {candidate}",
                    viewpoint.name
                );
                false
            }
            _ => true,
        }
    }

    /// Make `id` the blueprint and mirror its configuration onto the stereo viewpoint.
    fn change_blueprint(&mut self, host: &mut dyn Host, id: ViewpointID, source: &ViewpointSnapshot) {
        self.blueprint = Some(id);
        let Some(canonical) = host.viewpoint_mut(self.canonical) else {
            log::error!("Stereo viewpoint {} was destroyed by the host", self.canonical);
            return;
        };
        log::info!("Blueprint is now {id}");

        canonical.near_clip = self.config.near_clip;
        canonical.far_clip = source.far_clip.max(MIN_FAR_CLIP_PLANE);
        canonical.clear_mode = if source.clear_mode == ClearMode::Skybox {
            ClearMode::Skybox
        } else {
            ClearMode::SolidColor
        };
        canonical.rendering_path = source.rendering_path;
        canonical.depth_texture = source.depth_texture;
        canonical.layer_cull_spherical = source.layer_cull_spherical;
        canonical.occlusion_culling = source.occlusion_culling;
        canonical.allow_hdr = source.allow_hdr;
        canonical.background = source.background;
        if let Some(skybox) = source.skybox {
            canonical.skybox = Some(skybox);
        }
    }

    /// Add a sub-viewpoint to the aggregate. Unknown viewpoints are ignored.
    pub fn register_slave(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter, id: ViewpointID) {
        if !self.is_sub_viewpoint(id) {
            log::warn!("Tried to register {id}, which was never copied");
            return;
        }
        if !self.registered.contains(&id) {
            log::debug!("Sub-viewpoint {id} went online");
            self.registered.push(id);
        }
        self.update_camera_config(host, interpreter);
    }
    pub fn unregister_slave(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter, id: ViewpointID) {
        let before = self.registered.len();
        self.registered.retain(|&this| this != id);
        if before != self.registered.len() {
            log::debug!("Sub-viewpoint {id} went offline");
            self.update_camera_config(host, interpreter);
        }
    }

    /// Recompute the stereo viewpoint's culling mask, and elect a new blueprint if the current one left.
    pub fn update_camera_config(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter) {
        let aggregate = self
            .registered
            .iter()
            .filter_map(|&id| self.record(id))
            .fold(LayerMask::empty(), |mask, record| {
                mask | record.snapshot.culling_mask
            });
        let mask = (aggregate | interpreter.default_culling_mask())
            - self.config.excluded
            - self.config.ignore;

        if log::log_enabled!(log::Level::Info) {
            let names: Vec<&str> = self
                .registered
                .iter()
                .filter_map(|&id| self.record(id))
                .map(|record| record.name.as_str())
                .collect();
            log::info!(
                "The stereo viewpoint sees {:#010x} ({})",
                mask.bits(),
                names.join(", ")
            );
        }
        if let Some(canonical) = host.viewpoint_mut(self.canonical) {
            canonical.culling_mask = mask;
        }

        let blueprint_registered = self
            .blueprint
            .is_some_and(|blueprint| self.registered.contains(&blueprint));
        if !blueprint_registered {
            // Most recently registered candidate wins.
            let best = self
                .registered
                .iter()
                .rev()
                .filter_map(|&id| self.record(id))
                .find(|record| record.can_be_main)
                .map(|record| (record.viewpoint, record.snapshot));
            if let Some((id, snapshot)) = best {
                self.change_blueprint(host, id, &snapshot);
            }
        }
    }

    /// Per-tick upkeep: follow enable/disable transitions of sub-viewpoints, drop destroyed ones, keep neutralized
    /// viewpoints inert and the rig scaled.
    pub fn sync(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter) {
        let mut transitions = smallvec::SmallVec::<[(ViewpointID, Lifecycle); 4]>::new();
        for record in &self.records {
            let registered = self.registered.contains(&record.viewpoint);
            match host.viewpoint(record.viewpoint) {
                None => transitions.push((record.viewpoint, Lifecycle::Destroyed)),
                Some(viewpoint) if viewpoint.enabled && !registered => {
                    transitions.push((record.viewpoint, Lifecycle::Enabled));
                }
                Some(viewpoint) if !viewpoint.enabled && registered => {
                    transitions.push((record.viewpoint, Lifecycle::Disabled));
                }
                Some(_) => (),
            }
        }
        for (id, transition) in transitions {
            match transition {
                Lifecycle::Enabled => self.register_slave(host, interpreter, id),
                Lifecycle::Disabled => self.unregister_slave(host, interpreter, id),
                Lifecycle::Destroyed => {
                    log::info!("Sub-viewpoint {id} was destroyed");
                    self.records.retain(|record| record.viewpoint != id);
                    self.unregister_slave(host, interpreter, id);
                }
            }
        }

        self.neutralized.enforce(host);

        if let Some(canonical) = host.viewpoint_mut(self.canonical) {
            canonical.transform.scale = self.config.ipd_scale;
        }
    }

    /// The host replaced its scene. Sub-viewpoints are all host viewpoints and the IDs they were known by may
    /// come back on unrelated ones, so every record, registration, neutralization and the election are dropped.
    /// Survivors of the load are copied afresh once classified again.
    pub fn on_scene_loaded(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter) {
        log::info!(
            "Forgetting {} sub-viewpoints and blueprint {:?}",
            self.records.len(),
            self.blueprint
        );
        self.records.clear();
        self.registered.clear();
        self.neutralized.clear();
        self.blueprint = None;
        self.update_camera_config(host, interpreter);
    }

    /// Replace the stereo viewpoint's post effects with the allowed effects of the blueprint.
    pub fn copy_effects(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter, capture: &Capture) {
        let Some(blueprint) = self.blueprint(host, capture) else {
            return;
        };
        let Some(source) = host.viewpoint(blueprint) else {
            return;
        };
        log::info!("Copying post effects from {}", source.name);
        let effects: smallvec::SmallVec<[_; 2]> = source
            .effects
            .iter()
            .filter(|effect| {
                let allowed = interpreter.is_allowed_effect(effect);
                if !allowed {
                    log::info!("Skipping post effect {}", effect.name);
                }
                allowed
            })
            .cloned()
            .collect();
        if let Some(canonical) = host.viewpoint_mut(self.canonical) {
            log::debug!("{} post effects on the stereo viewpoint", effects.len());
            canonical.effects = effects;
        }
    }

    /// Spawn a copy of the stereo viewpoint, e.g. for a spectator view. The copy is the caller's to despawn.
    pub fn clone_canonical(&self, host: &mut dyn Host, copy_effects: bool) -> Option<ViewpointID> {
        let mut clone = host.viewpoint(self.canonical)?.clone();
        clone.name = CLONE_NAME.to_owned();
        clone.near_clip = CLONE_NEAR_CLIP_PLANE;
        clone.audio_listener = false;
        clone.stereo_target = StereoTargetEye::None;
        clone.transform.scale = 1.0;
        if !copy_effects {
            clone.effects.clear();
        }
        let id = host.spawn_viewpoint(clone);
        log::info!("Cloned the stereo viewpoint as {id}");
        Some(id)
    }

    /// Observe every copied viewpoint.
    pub fn on_copied(&mut self, observer: impl FnMut(&CameraCopied) + 'static) -> SubscriptionID {
        self.copied.subscribe(observer)
    }
    /// Observe every main-camera candidate copy.
    pub fn on_initialized(
        &mut self,
        observer: impl FnMut(&CameraInitialized) + 'static,
    ) -> SubscriptionID {
        self.initialized.subscribe(observer)
    }
    /// Returns false if no such subscription exists.
    pub fn unsubscribe(&mut self, id: SubscriptionID) -> bool {
        self.copied.unsubscribe(id) || self.initialized.unsubscribe(id)
    }

    pub fn shutdown(self, host: &mut dyn Host) {
        log::info!("Destroying stereo viewpoint");
        host.despawn_viewpoint(self.canonical);
    }
}
