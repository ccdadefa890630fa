//! # Simulated host
//!
//! An in-memory [`Host`] and a rule-driven [`Interpreter`], for running the pipeline without an engine attached.
//! Both are deterministic: objects enumerate in creation order.

use std::collections::BTreeMap;

use crate::{
    canvas::{Canvas, CanvasID},
    color::Color,
    host::Host,
    interpreter::{CameraJudgement, Interpreter},
    layers::{Layer, LayerMask},
    surfaces::{RenderSurfaceDesc, RenderSurfaceID},
    viewpoint::{PostEffect, Viewpoint, ViewpointID},
};

struct SimViewpoint {
    viewpoint: Viewpoint,
    /// Survives scene loads. Everything the core spawns is.
    persistent: bool,
}

struct SimCanvas {
    canvas: Canvas,
    /// Layers of the graphics below the canvas.
    descendants: Vec<Layer>,
    material_resets: usize,
}

pub struct SimHost {
    window: [u32; 2],
    layer_names: [Option<String>; Layer::COUNT as usize],
    viewpoints: BTreeMap<ViewpointID, SimViewpoint>,
    next_viewpoint: u64,
    /// Hand out the lowest free viewpoint ID instead of a fresh one.
    recycle_ids: bool,
    canvases: BTreeMap<CanvasID, SimCanvas>,
    next_canvas: u64,
    surfaces: hashbrown::HashMap<RenderSurfaceID, RenderSurfaceDesc>,
    active_target: Option<RenderSurfaceID>,
    clears: Vec<(Option<RenderSurfaceID>, Color)>,
}
impl SimHost {
    /// The layers engines commonly define out of the box, plus an `Invisible` layer.
    const BUILTIN_LAYERS: [(u8, &'static str); 6] = [
        (0, "Default"),
        (1, "TransparentFX"),
        (2, "Ignore Raycast"),
        (4, "Water"),
        (5, "UI"),
        (8, "Invisible"),
    ];
    #[must_use]
    pub fn new(window: [u32; 2]) -> Self {
        let mut layer_names: [Option<String>; Layer::COUNT as usize] = Default::default();
        for (index, name) in Self::BUILTIN_LAYERS {
            layer_names[usize::from(index)] = Some(name.to_owned());
        }
        Self {
            window,
            layer_names,
            viewpoints: BTreeMap::new(),
            next_viewpoint: 1,
            recycle_ids: false,
            canvases: BTreeMap::new(),
            next_canvas: 1,
            surfaces: hashbrown::HashMap::new(),
            active_target: None,
            clears: Vec::new(),
        }
    }
    /// Name a layer, replacing any previous name. Out of range indices are ignored.
    #[must_use]
    pub fn with_layer(mut self, index: u8, name: impl Into<String>) -> Self {
        if let Some(slot) = self.layer_names.get_mut(usize::from(index)) {
            *slot = Some(name.into());
        }
        self
    }
    /// Reuse the IDs of destroyed viewpoints, as engines recycling object handles do.
    #[must_use]
    pub fn recycling_ids(mut self) -> Self {
        self.recycle_ids = true;
        self
    }

    /// Add a viewpoint as the scene would, destroyed on the next scene load.
    pub fn add_viewpoint(&mut self, viewpoint: Viewpoint) -> ViewpointID {
        self.insert_viewpoint(viewpoint, false)
    }
    fn insert_viewpoint(&mut self, viewpoint: Viewpoint, persistent: bool) -> ViewpointID {
        let raw = if self.recycle_ids {
            let mut raw = 1;
            while self.viewpoints.keys().any(|id| id.raw() == raw) {
                raw += 1;
            }
            raw
        } else {
            // Starts at one and only ever grows.
            self.next_viewpoint += 1;
            self.next_viewpoint - 1
        };
        let id = ViewpointID::from_raw(raw).unwrap_or_else(|| unreachable!());
        self.viewpoints.insert(
            id,
            SimViewpoint {
                viewpoint,
                persistent,
            },
        );
        id
    }
    pub fn destroy_viewpoint(&mut self, id: ViewpointID) -> Option<Viewpoint> {
        self.viewpoints.remove(&id).map(|sim| sim.viewpoint)
    }

    /// Add a canvas with `descendants` graphics below it, all on the canvas' layer.
    pub fn add_canvas(&mut self, canvas: Canvas, descendants: usize) -> CanvasID {
        let id = CanvasID(self.next_canvas);
        self.next_canvas += 1;
        let layer = canvas.layer;
        self.canvases.insert(
            id,
            SimCanvas {
                canvas,
                descendants: vec![layer; descendants],
                material_resets: 0,
            },
        );
        id
    }
    pub fn destroy_canvas(&mut self, id: CanvasID) -> Option<Canvas> {
        self.canvases.remove(&id).map(|sim| sim.canvas)
    }
    #[must_use]
    pub fn descendant_layers(&self, id: CanvasID) -> Option<&[Layer]> {
        self.canvases.get(&id).map(|sim| sim.descendants.as_slice())
    }
    /// How many times the canvas' materials were reset to default.
    #[must_use]
    pub fn material_resets(&self, id: CanvasID) -> usize {
        self.canvases.get(&id).map_or(0, |sim| sim.material_resets)
    }

    #[must_use]
    pub fn render_surface(&self, id: RenderSurfaceID) -> Option<&RenderSurfaceDesc> {
        self.surfaces.get(&id)
    }
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }
    /// Every clear so far, with the target that was active.
    #[must_use]
    pub fn clears(&self) -> &[(Option<RenderSurfaceID>, Color)] {
        &self.clears
    }
    /// Number of live viewpoints carrying an audio listener.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.viewpoints
            .values()
            .filter(|sim| sim.viewpoint.audio_listener)
            .count()
    }
    /// Destroy every canvas and every non-persistent viewpoint.
    pub fn load_scene(&mut self) {
        self.viewpoints.retain(|_, sim| sim.persistent);
        self.canvases.clear();
        log::debug!("Scene loaded, {} persistent viewpoints survived", self.viewpoints.len());
    }
}

impl Host for SimHost {
    fn viewpoint_count(&self) -> usize {
        self.viewpoints.len()
    }
    fn collect_viewpoints(&self, out: &mut Vec<ViewpointID>) {
        out.extend(self.viewpoints.keys().copied());
    }
    fn viewpoint(&self, id: ViewpointID) -> Option<&Viewpoint> {
        self.viewpoints.get(&id).map(|sim| &sim.viewpoint)
    }
    fn viewpoint_mut(&mut self, id: ViewpointID) -> Option<&mut Viewpoint> {
        self.viewpoints.get_mut(&id).map(|sim| &mut sim.viewpoint)
    }
    fn spawn_viewpoint(&mut self, viewpoint: Viewpoint) -> ViewpointID {
        self.insert_viewpoint(viewpoint, true)
    }
    fn despawn_viewpoint(&mut self, id: ViewpointID) {
        self.viewpoints.remove(&id);
    }

    fn collect_canvases(&self, out: &mut Vec<CanvasID>) {
        out.extend(self.canvases.keys().copied());
    }
    fn canvas(&self, id: CanvasID) -> Option<&Canvas> {
        self.canvases.get(&id).map(|sim| &sim.canvas)
    }
    fn canvas_mut(&mut self, id: CanvasID) -> Option<&mut Canvas> {
        self.canvases.get_mut(&id).map(|sim| &mut sim.canvas)
    }
    fn set_canvas_layer_recursive(&mut self, id: CanvasID, layer: Layer) {
        if let Some(sim) = self.canvases.get_mut(&id) {
            sim.canvas.layer = layer;
            sim.descendants.fill(layer);
        }
    }
    fn reset_canvas_materials(&mut self, id: CanvasID) {
        if let Some(sim) = self.canvases.get_mut(&id) {
            sim.material_resets += 1;
        }
    }

    fn layer_named(&self, name: &str) -> Option<Layer> {
        let index = self
            .layer_names
            .iter()
            .position(|this| this.as_deref() == Some(name))?;
        Layer::new(u8::try_from(index).ok()?)
    }
    fn window_size(&self) -> [u32; 2] {
        self.window
    }

    fn create_render_surface(&mut self, id: RenderSurfaceID, desc: RenderSurfaceDesc) {
        self.surfaces.insert(id, desc);
    }
    fn release_render_surface(&mut self, id: RenderSurfaceID) {
        if self.active_target == Some(id) {
            log::warn!("Released {id} while it was the active render target");
            self.active_target = None;
        }
        self.surfaces.remove(&id);
    }
    fn active_render_target(&self) -> Option<RenderSurfaceID> {
        self.active_target
    }
    fn set_active_render_target(&mut self, target: Option<RenderSurfaceID>) {
        self.active_target = target;
    }
    fn clear_active_target(&mut self, color: Color) {
        self.clears.push((self.active_target, color));
    }
}

/// Decides a judgement from the viewpoint's name.
#[derive(Clone, PartialEq, Eq, Debug, serde::Deserialize)]
pub struct JudgementRule {
    /// Matches viewpoints whose name contains this.
    pub contains: String,
    pub judgement: CameraJudgement,
}

/// An [`Interpreter`] answering every question by substring matches on names.
#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RuleInterpreter {
    /// First matching rule wins.
    pub rules: Vec<JudgementRule>,
    /// Judgement when no rule matches, [`CameraJudgement::Ignore`] if unset.
    pub fallback: Option<CameraJudgement>,
    /// Viewpoints fully hidden by the stereo viewpoint.
    pub irrelevant: Vec<String>,
    pub ui_cameras: Vec<String>,
    pub ignored_canvases: Vec<String>,
    pub blocked_effects: Vec<String>,
    pub default_culling_mask: u32,
    /// Judging these viewpoints fails.
    pub failing: Vec<String>,
}
fn matches_any(patterns: &[String], name: &str) -> bool {
    patterns.iter().any(|pattern| name.contains(pattern.as_str()))
}
impl Interpreter for RuleInterpreter {
    fn judge_camera(&self, id: ViewpointID, viewpoint: &Viewpoint) -> anyhow::Result<CameraJudgement> {
        if matches_any(&self.failing, &viewpoint.name) {
            anyhow::bail!("no rule can judge {} ({id})", viewpoint.name);
        }
        Ok(self
            .rules
            .iter()
            .find(|rule| viewpoint.name.contains(rule.contains.as_str()))
            .map(|rule| rule.judgement)
            .or(self.fallback)
            .unwrap_or(CameraJudgement::Ignore))
    }
    fn is_irrelevant_camera(&self, viewpoint: &Viewpoint) -> bool {
        matches_any(&self.irrelevant, &viewpoint.name)
    }
    fn is_ui_camera(&self, viewpoint: &Viewpoint) -> bool {
        matches_any(&self.ui_cameras, &viewpoint.name)
    }
    fn is_ignored_canvas(&self, canvas: &Canvas) -> bool {
        matches_any(&self.ignored_canvases, &canvas.name)
    }
    fn is_allowed_effect(&self, effect: &PostEffect) -> bool {
        !matches_any(&self.blocked_effects, &effect.name)
    }
    fn default_culling_mask(&self) -> LayerMask {
        LayerMask::from_bits_retain(self.default_culling_mask)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn scene_load_keeps_spawned() {
        let mut host = SimHost::new([640, 480]);
        let scene = host.add_viewpoint(Viewpoint::named("Main Camera"));
        let ours = host.spawn_viewpoint(Viewpoint::named("Rig"));
        let canvas = host.add_canvas(Canvas::default(), 3);

        host.load_scene();
        assert!(!host.is_alive(scene));
        assert!(host.is_alive(ours));
        assert!(host.canvas(canvas).is_none());

        // IDs are not reused within a run.
        let next = host.add_viewpoint(Viewpoint::named("Main Camera"));
        assert_ne!(next, scene);
    }
    #[test]
    fn recycled_ids() {
        let mut host = SimHost::new([640, 480]).recycling_ids();
        let first = host.add_viewpoint(Viewpoint::named("A"));
        let second = host.add_viewpoint(Viewpoint::named("B"));
        host.destroy_viewpoint(first);
        assert_eq!(host.add_viewpoint(Viewpoint::named("C")), first);
        assert_eq!(host.viewpoint(first).unwrap().name, "C");
        assert_eq!(host.add_viewpoint(Viewpoint::named("D")).raw(), second.raw() + 1);
    }
    #[test]
    fn layers_by_name() {
        let host = SimHost::new([640, 480]).with_layer(12, "Minimap");
        assert_eq!(host.layer_named("UI").map(Layer::index), Some(5));
        assert_eq!(host.layer_named("Minimap").map(Layer::index), Some(12));
        assert!(host.layer_named("Nope").is_none());
    }
    #[test]
    fn recursive_layer() {
        let mut host = SimHost::new([640, 480]);
        let canvas = host.add_canvas(Canvas::default(), 2);
        let ui = host.layer_named("UI").unwrap();
        host.set_canvas_layer_recursive(canvas, ui);
        assert_eq!(host.canvas(canvas).unwrap().layer, ui);
        assert_eq!(host.descendant_layers(canvas).unwrap(), [ui, ui]);
    }
    #[test]
    fn rules_from_toml() {
        let interpreter: RuleInterpreter = toml::from_str(
            r#"
            ui_cameras = ["HUD"]
            failing = ["Broken"]
            fallback = "SubCamera"

            [[rules]]
            contains = "Main"
            judgement = "MainCamera"
            "#,
        )
        .unwrap();
        let id = ViewpointID::from_raw(1).unwrap();
        let judge = |name: &str| interpreter.judge_camera(id, &Viewpoint::named(name));
        assert_eq!(judge("Main Camera").unwrap(), CameraJudgement::MainCamera);
        assert_eq!(judge("Overlay").unwrap(), CameraJudgement::SubCamera);
        assert!(judge("Broken Camera").is_err());
        assert!(interpreter.is_ui_camera(&Viewpoint::named("HUD Camera")));
    }
}
