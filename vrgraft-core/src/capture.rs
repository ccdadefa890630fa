//! # UI capture
//!
//! Records the host's 2D output into off-screen surfaces, so it can be composited back into the 3D scene.
//! This works in two layers:
//!  * Retained-mode canvases are re-pointed at a dedicated orthographic viewpoint rendering into
//!    [`RenderSurfaceRegistry::retained`].
//!  * Immediate-mode drawing is caught by redirecting the global render target to
//!    [`RenderSurfaceRegistry::immediate`] between [`Capture::before_gui`] and [`Capture::after_gui`].
//!
//! The coordinator is also the [screen grabber](crate::grabber) of last resort, claiming every viewpoint the
//! interpreter calls a UI viewpoint.

use crate::{
    canvas::{CanvasID, Raycaster, RenderMode},
    color::Color,
    config::{Context, GuiType, Layers},
    grabber::{Assignment, GrabberID, Grabbers, Owner, ScreenGrabber},
    host::{GuiEvent, Host},
    interpreter::Interpreter,
    layers::{Layer, LayerMask},
    surfaces::{RenderSurfaceID, RenderSurfaceRegistry},
    viewpoint::{ClearMode, StereoTargetEye, Transform, Viewpoint, ViewpointID},
};

/// Name of the capture viewpoint in the host.
pub const CAPTURE_VIEWPOINT_NAME: &str = "VRGraft GUI";

pub struct Capture {
    /// Dedicated orthographic viewpoint every canvas is bound to.
    viewpoint: ViewpointID,
    surfaces: RenderSurfaceRegistry,
    grabbers: Grabbers,
    mappings: hashbrown::HashMap<ViewpointID, Owner>,
    /// Every viewpoint ever offered through `add_camera`, for rejudging.
    checked: hashbrown::HashSet<ViewpointID>,
    listeners: usize,
    /// Some while an immediate-mode redirect is open, holding the target to restore.
    saved_target: Option<Option<RenderSurfaceID>>,
    canvas_buffer: Vec<CanvasID>,
    ui_layer: Option<Layer>,
    ui_mask: LayerMask,
    enforce_default_materials: bool,
    alternative_sorting: bool,
}
impl Capture {
    pub fn new(host: &mut dyn Host, context: &Context, layers: &Layers) -> Self {
        let size @ [width, height] = host.window_size();
        let surfaces = RenderSurfaceRegistry::create(host, size);

        let half_width = width as f32 * 0.5;
        let half_height = height as f32 * 0.5;
        let mut transform = Transform::default();
        if context.preferred_gui == GuiType::Immediate {
            // Immediate mode draws in pixel coordinates, look at the middle of them.
            transform.position = ultraviolet::Vec3::new(half_width, half_height, -1.0);
        }
        let viewpoint = host.spawn_viewpoint(Viewpoint {
            name: CAPTURE_VIEWPOINT_NAME.to_owned(),
            transform,
            culling_mask: layers.ui_mask(),
            depth: 1.0,
            near_clip: context.gui_near_clip_plane,
            far_clip: context.gui_far_clip_plane,
            target: Some(surfaces.retained()),
            background: Color::CLEAR,
            clear_mode: ClearMode::SolidColor,
            orthographic_size: Some(half_height),
            occlusion_culling: false,
            stereo_target: StereoTargetEye::None,
            ..Viewpoint::default()
        });
        log::info!("Created capture viewpoint {viewpoint} at {width}x{height}");

        Self {
            viewpoint,
            surfaces,
            grabbers: Grabbers::default(),
            mappings: hashbrown::HashMap::new(),
            checked: hashbrown::HashSet::new(),
            listeners: 0,
            saved_target: None,
            canvas_buffer: Vec::new(),
            ui_layer: layers.ui,
            ui_mask: layers.ui_mask(),
            enforce_default_materials: context.enforce_default_gui_materials,
            alternative_sorting: context.gui_alternative_sorting_mode,
        }
    }
    /// The dedicated orthographic viewpoint.
    #[must_use]
    pub fn viewpoint(&self) -> ViewpointID {
        self.viewpoint
    }
    #[must_use]
    pub fn surfaces(&self) -> &RenderSurfaceRegistry {
        &self.surfaces
    }
    /// Is the viewpoint's output claimed by any grabber?
    #[must_use]
    pub fn owns(&self, id: ViewpointID) -> bool {
        self.mappings.contains_key(&id)
    }
    #[must_use]
    pub fn owner(&self, id: ViewpointID) -> Option<Owner> {
        self.mappings.get(&id).copied()
    }
    /// Would any grabber claim this viewpoint right now?
    #[must_use]
    pub fn is_interested(&self, host: &dyn Host, interpreter: &dyn Interpreter, id: ViewpointID) -> bool {
        host.viewpoint(id)
            .is_some_and(|viewpoint| self.find_owner(viewpoint, interpreter).is_some())
    }
    #[must_use]
    pub fn listeners(&self) -> usize {
        self.listeners
    }

    /// Start capturing canvases. Every call must be matched by an [`Self::unlisten`].
    pub fn listen(&mut self) {
        self.listeners += 1;
    }
    pub fn unlisten(&mut self) {
        if let Some(listeners) = self.listeners.checked_sub(1) {
            self.listeners = listeners;
        } else {
            log::warn!("Unbalanced unlisten, listener count is already zero");
        }
    }

    fn find_owner(&self, viewpoint: &Viewpoint, interpreter: &dyn Interpreter) -> Option<Owner> {
        if let Some(grabber) = self.grabbers.find(viewpoint, interpreter) {
            Some(Owner::External(grabber))
        } else if self.check(viewpoint, interpreter) {
            Some(Owner::Capture)
        } else {
            None
        }
    }
    /// Surfaces of the given owner, or None if it was unregistered.
    fn owner_textures(&self, owner: Owner) -> Option<&[RenderSurfaceID]> {
        match owner {
            Owner::Capture => Some(self.textures()),
            Owner::External(id) => self.grabbers.get(id).map(ScreenGrabber::textures),
        }
    }

    /// Find the grabber owning this viewpoint's output, most recently registered first.
    pub fn add_camera(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter, id: ViewpointID) {
        let Some(viewpoint) = host.viewpoint(id) else {
            return;
        };
        log::info!("Looking for a grabber for {} ({id})", viewpoint.name);
        match self.find_owner(viewpoint, interpreter) {
            Some(owner) => {
                log::info!("Assigned {} ({id}) to {owner}", viewpoint.name);
                self.mappings.insert(id, owner);
                let assignment = Assignment {
                    viewpoint: id,
                    capture_viewpoint: self.viewpoint,
                    host: &mut *host,
                };
                match owner {
                    Owner::Capture => self.on_assign(assignment),
                    Owner::External(grabber) => {
                        if let Some(grabber) = self.grabbers.get_mut(grabber) {
                            grabber.on_assign(assignment);
                        }
                    }
                }
            }
            None => {
                if self.mappings.remove(&id).is_some() {
                    log::info!("{} ({id}) is no longer claimed by any grabber", viewpoint.name);
                }
            }
        }
        self.checked.insert(id);
    }

    /// Register a grabber, asked before all previously registered ones.
    pub fn add_grabber(
        &mut self,
        host: &mut dyn Host,
        interpreter: &dyn Interpreter,
        grabber: Box<dyn ScreenGrabber>,
    ) -> GrabberID {
        let id = self.grabbers.insert_front(grabber);
        log::info!("Registered screen grabber {id}");
        self.rejudge_all(host, interpreter);
        id
    }
    pub fn remove_grabber(
        &mut self,
        host: &mut dyn Host,
        interpreter: &dyn Interpreter,
        id: GrabberID,
    ) -> Option<Box<dyn ScreenGrabber>> {
        let grabber = self.grabbers.remove(id);
        if grabber.is_some() {
            log::info!("Removed screen grabber {id}");
        }
        self.rejudge_all(host, interpreter);
        grabber
    }
    fn rejudge_all(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter) {
        let checked: smallvec::SmallVec<[ViewpointID; 8]> = self.checked.iter().copied().collect();
        for id in checked {
            if host.is_alive(id) {
                self.add_camera(host, interpreter, id);
            } else {
                self.checked.remove(&id);
                self.mappings.remove(&id);
            }
        }
    }

    /// Drop mappings of destroyed viewpoints, and re-bind owned viewpoints whose render target drifted away from
    /// their owner's first surface.
    pub fn ensure_camera_targets(&mut self, host: &mut dyn Host) {
        let mut dead = smallvec::SmallVec::<[ViewpointID; 4]>::new();
        for (&id, &owner) in &self.mappings {
            let expected = self
                .owner_textures(owner)
                .and_then(|textures| textures.first().copied());
            match host.viewpoint_mut(id) {
                None => dead.push(id),
                Some(viewpoint) => {
                    if viewpoint.target != expected {
                        log::debug!(
                            "Re-binding {} ({id}) from {:?} to {expected:?}",
                            viewpoint.name,
                            viewpoint.target
                        );
                        viewpoint.target = expected;
                    }
                }
            }
        }
        for id in dead {
            log::debug!("Forgetting destroyed viewpoint {id}");
            self.mappings.remove(&id);
            self.checked.remove(&id);
        }
    }

    /// Is the canvas still drawing somewhere other than the capture viewpoint?
    fn is_unprocessed(&self, host: &dyn Host, mode: RenderMode, world: Option<ViewpointID>) -> bool {
        match mode {
            RenderMode::ScreenSpaceOverlay => true,
            RenderMode::ScreenSpaceCamera => match world {
                Some(id) if id == self.viewpoint => false,
                // A canvas rendered into a surface on purpose is left alone.
                Some(id) => host.viewpoint(id).map_or(true, |viewpoint| viewpoint.target.is_none()),
                None => true,
            },
            RenderMode::WorldSpace => false,
        }
    }

    /// Redirect every unprocessed canvas into the capture viewpoint.
    pub fn catch_canvas(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter) {
        let retained = self.surfaces.retained();
        if let Some(viewpoint) = host.viewpoint_mut(self.viewpoint) {
            viewpoint.target = Some(retained);
        }

        let mut buffer = std::mem::take(&mut self.canvas_buffer);
        buffer.clear();
        host.collect_canvases(&mut buffer);
        for &id in &buffer {
            self.capture_canvas(host, interpreter, id);
        }
        self.canvas_buffer = buffer;
    }
    fn capture_canvas(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter, id: CanvasID) {
        let Some(canvas) = host.canvas(id) else {
            return;
        };
        if !self.is_unprocessed(host, canvas.render_mode, canvas.world_viewpoint)
            || interpreter.is_ignored_canvas(canvas)
        {
            return;
        }
        log::info!(
            "Capturing {} ({id}) [layer: {}, sorting layer: {:?}, sort order: {}, mode: {}, viewpoint: {:?}]",
            canvas.name,
            canvas.layer.index(),
            canvas.sorting_layer,
            canvas.sort_order,
            canvas.render_mode,
            canvas.world_viewpoint,
        );
        let on_ui_layer = self.ui_mask.renders(canvas.layer);

        let Some(canvas) = host.canvas_mut(id) else {
            return;
        };
        canvas.render_mode = RenderMode::ScreenSpaceCamera;
        canvas.world_viewpoint = Some(self.viewpoint);
        if self.alternative_sorting {
            if let Some(Raycaster::Standard(settings)) = canvas.raycaster {
                canvas.raycaster = Some(Raycaster::SortingAware(settings));
            }
        }

        if !on_ui_layer {
            if let Some(layer) = self.ui_layer {
                host.set_canvas_layer_recursive(id, layer);
            }
        }
        if self.enforce_default_materials {
            host.reset_canvas_materials(id);
        }
    }

    /// Open the immediate-mode redirect. Only acts on repaint events, and must be closed by
    /// [`Self::after_gui`] within the same event.
    pub fn before_gui(&mut self, host: &mut dyn Host, event: GuiEvent) {
        if event != GuiEvent::Repaint {
            return;
        }
        if self.saved_target.is_some() {
            log::warn!("Immediate-mode capture is already open, ignoring");
            return;
        }
        self.saved_target = Some(host.active_render_target());
        host.set_active_render_target(Some(self.surfaces.immediate()));
        host.clear_active_target(Color::CLEAR);
    }
    /// Close the immediate-mode redirect, restoring whatever target was active when it was opened.
    pub fn after_gui(&mut self, host: &mut dyn Host, event: GuiEvent) {
        if event != GuiEvent::Repaint {
            return;
        }
        match self.saved_target.take() {
            Some(previous) => host.set_active_render_target(previous),
            None => log::warn!("Immediate-mode capture closed without being opened"),
        }
    }
    /// Open the immediate-mode redirect for the lifetime of the returned guard.
    /// Drawing goes through the guard, which derefs to the host.
    pub fn immediate_scope<'a>(
        &'a mut self,
        host: &'a mut dyn Host,
        event: GuiEvent,
    ) -> ImmediateCapture<'a> {
        self.before_gui(host, event);
        ImmediateCapture {
            capture: self,
            host,
            event,
        }
    }

    /// Per-tick upkeep. Canvas capture only runs while someone listens.
    pub fn update(&mut self, host: &mut dyn Host, interpreter: &dyn Interpreter) {
        self.ensure_camera_targets(host);
        if self.listeners > 0 {
            self.catch_canvas(host, interpreter);
        }
    }

    /// Viewpoint IDs may be reused by the next scene.
    pub fn on_scene_loaded(&mut self) {
        self.checked.clear();
        self.mappings.clear();
    }

    pub fn shutdown(mut self, host: &mut dyn Host) {
        if let Some(previous) = self.saved_target.take() {
            host.set_active_render_target(previous);
        }
        host.despawn_viewpoint(self.viewpoint);
        self.surfaces.release(host);
    }
}

impl ScreenGrabber for Capture {
    fn check(&self, viewpoint: &Viewpoint, interpreter: &dyn Interpreter) -> bool {
        interpreter.is_ui_camera(viewpoint)
    }
    /// Draw the capture viewpoint before anything it claimed.
    fn on_assign(&mut self, assignment: Assignment<'_>) {
        let Some(claimed) = assignment.host.viewpoint(assignment.viewpoint) else {
            return;
        };
        let claimed_depth = claimed.depth;
        if let Some(capture) = assignment.host.viewpoint_mut(assignment.capture_viewpoint) {
            capture.depth = capture.depth.min(claimed_depth - 1.0);
        }
    }
    fn textures(&self) -> &[RenderSurfaceID] {
        self.surfaces.as_slice()
    }
}

/// An open immediate-mode redirect. Closed on drop, even while unwinding.
pub struct ImmediateCapture<'a> {
    capture: &'a mut Capture,
    host: &'a mut dyn Host,
    event: GuiEvent,
}
impl<'a> std::ops::Deref for ImmediateCapture<'a> {
    type Target = dyn Host + 'a;
    fn deref(&self) -> &Self::Target {
        &*self.host
    }
}
impl<'a> std::ops::DerefMut for ImmediateCapture<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.host
    }
}
impl Drop for ImmediateCapture<'_> {
    fn drop(&mut self) {
        self.capture.after_gui(&mut *self.host, self.event);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        canvas::{Canvas, RaycastSettings},
        sim::{RuleInterpreter, SimHost},
    };
    use std::{cell::Cell, rc::Rc};

    fn setup(context: &Context) -> (SimHost, Capture) {
        let mut host = SimHost::new([800, 600]);
        let layers = context.resolve_layers(&host);
        let capture = Capture::new(&mut host, context, &layers);
        (host, capture)
    }
    fn interpreter() -> RuleInterpreter {
        RuleInterpreter {
            ui_cameras: vec!["HUD".to_owned()],
            ignored_canvases: vec!["Debug".to_owned()],
            ..RuleInterpreter::default()
        }
    }

    struct TestGrabber {
        wants: &'static str,
        textures: [RenderSurfaceID; 1],
        assigned: Rc<Cell<usize>>,
    }
    impl TestGrabber {
        fn new(wants: &'static str) -> (Self, Rc<Cell<usize>>) {
            let assigned = Rc::new(Cell::new(0));
            (
                Self {
                    wants,
                    textures: [RenderSurfaceID::next()],
                    assigned: assigned.clone(),
                },
                assigned,
            )
        }
    }
    impl ScreenGrabber for TestGrabber {
        fn check(&self, viewpoint: &Viewpoint, _: &dyn Interpreter) -> bool {
            viewpoint.name.contains(self.wants)
        }
        fn on_assign(&mut self, _: Assignment<'_>) {
            self.assigned.set(self.assigned.get() + 1);
        }
        fn textures(&self) -> &[RenderSurfaceID] {
            &self.textures
        }
    }

    #[test]
    fn capture_viewpoint_config() {
        let (host, capture) = setup(&Context::default());
        let viewpoint = host.viewpoint(capture.viewpoint()).unwrap();
        assert_eq!(viewpoint.orthographic_size, Some(300.0));
        assert_eq!(viewpoint.target, Some(capture.surfaces().retained()));
        assert_eq!(viewpoint.culling_mask, LayerMask::of(host.layer_named("UI").unwrap()));
        assert_eq!(viewpoint.clear_mode, ClearMode::SolidColor);
        assert_eq!(viewpoint.background, Color::CLEAR);
        assert_eq!(viewpoint.transform.position, ultraviolet::Vec3::zero());

        let (host, capture) = setup(&Context {
            preferred_gui: GuiType::Immediate,
            ..Context::default()
        });
        let viewpoint = host.viewpoint(capture.viewpoint()).unwrap();
        assert_eq!(
            viewpoint.transform.position,
            ultraviolet::Vec3::new(400.0, 300.0, -1.0)
        );
    }
    #[test]
    fn capture_is_last_resort() {
        let (mut host, mut capture) = setup(&Context::default());
        let interpreter = interpreter();
        let hud = host.add_viewpoint(Viewpoint {
            depth: 5.0,
            ..Viewpoint::named("HUD")
        });
        let scene = host.add_viewpoint(Viewpoint::named("Main Camera"));

        capture.add_camera(&mut host, &interpreter, hud);
        capture.add_camera(&mut host, &interpreter, scene);
        assert_eq!(capture.owner(hud), Some(Owner::Capture));
        assert!(!capture.owns(scene));
        // Already below the claimed viewpoint.
        assert_eq!(host.viewpoint(capture.viewpoint()).unwrap().depth, 1.0);

        let low = host.add_viewpoint(Viewpoint {
            depth: -3.0,
            ..Viewpoint::named("HUD overlay")
        });
        capture.add_camera(&mut host, &interpreter, low);
        assert_eq!(host.viewpoint(capture.viewpoint()).unwrap().depth, -4.0);
    }
    #[test]
    fn newest_grabber_wins() {
        let (mut host, mut capture) = setup(&Context::default());
        let interpreter = interpreter();
        let hud = host.add_viewpoint(Viewpoint::named("HUD"));
        capture.add_camera(&mut host, &interpreter, hud);
        assert_eq!(capture.owner(hud), Some(Owner::Capture));

        let (first, first_assigned) = TestGrabber::new("HUD");
        let first_texture = first.textures[0];
        let first = capture.add_grabber(&mut host, &interpreter, Box::new(first));
        assert_eq!(capture.owner(hud), Some(Owner::External(first)));
        assert_eq!(first_assigned.get(), 1);

        let (second, second_assigned) = TestGrabber::new("HUD");
        let second_texture = second.textures[0];
        let second = capture.add_grabber(&mut host, &interpreter, Box::new(second));
        assert_eq!(capture.owner(hud), Some(Owner::External(second)));
        assert_eq!(second_assigned.get(), 1);
        capture.ensure_camera_targets(&mut host);
        assert_eq!(host.viewpoint(hud).unwrap().target, Some(second_texture));

        assert!(capture.remove_grabber(&mut host, &interpreter, second).is_some());
        assert_eq!(capture.owner(hud), Some(Owner::External(first)));
        capture.ensure_camera_targets(&mut host);
        assert_eq!(host.viewpoint(hud).unwrap().target, Some(first_texture));

        assert!(capture.remove_grabber(&mut host, &interpreter, first).is_some());
        assert_eq!(capture.owner(hud), Some(Owner::Capture));
    }
    #[test]
    fn grabber_claims_non_ui() {
        let (mut host, mut capture) = setup(&Context::default());
        let interpreter = interpreter();
        let minimap = host.add_viewpoint(Viewpoint::named("Minimap"));
        capture.add_camera(&mut host, &interpreter, minimap);
        assert!(!capture.owns(minimap));
        assert!(!capture.is_interested(&host, &interpreter, minimap));

        let (grabber, _) = TestGrabber::new("Minimap");
        let grabber = capture.add_grabber(&mut host, &interpreter, Box::new(grabber));
        assert_eq!(capture.owner(minimap), Some(Owner::External(grabber)));

        capture.remove_grabber(&mut host, &interpreter, grabber);
        assert!(!capture.owns(minimap));
    }
    #[test]
    fn targets_follow_owner() {
        let (mut host, mut capture) = setup(&Context::default());
        let interpreter = interpreter();
        let hud = host.add_viewpoint(Viewpoint::named("HUD"));
        capture.add_camera(&mut host, &interpreter, hud);

        host.viewpoint_mut(hud).unwrap().target = None;
        capture.ensure_camera_targets(&mut host);
        assert_eq!(
            host.viewpoint(hud).unwrap().target,
            Some(capture.surfaces().retained())
        );

        host.destroy_viewpoint(hud);
        capture.ensure_camera_targets(&mut host);
        assert!(!capture.owns(hud));
    }
    #[test]
    fn immediate_redirect_restores() {
        let (mut host, mut capture) = setup(&Context::default());
        let immediate = capture.surfaces().immediate();
        let previous = RenderSurfaceID::next();
        host.set_active_render_target(Some(previous));

        // Layout passes draw nothing.
        {
            let scope = capture.immediate_scope(&mut host, GuiEvent::Layout);
            assert_eq!(scope.active_render_target(), Some(previous));
        }
        {
            let mut scope = capture.immediate_scope(&mut host, GuiEvent::Repaint);
            assert_eq!(scope.active_render_target(), Some(immediate));
            // The drawing code retargets on its own.
            scope.set_active_render_target(Some(RenderSurfaceID::next()));
        }
        assert_eq!(host.active_render_target(), Some(previous));
        assert_eq!(host.clears(), [(Some(immediate), Color::CLEAR)]);
    }
    #[test]
    fn redirect_restored_on_panic() {
        let (mut host, mut capture) = setup(&Context::default());
        let previous = RenderSurfaceID::next();
        host.set_active_render_target(Some(previous));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = capture.immediate_scope(&mut host, GuiEvent::Repaint);
            scope.set_active_render_target(Some(RenderSurfaceID::next()));
            panic!("drawing failed");
        }));
        assert!(result.is_err());
        assert_eq!(host.active_render_target(), Some(previous));

        // Balanced, so the next scope opens normally.
        let immediate = capture.surfaces().immediate();
        let scope = capture.immediate_scope(&mut host, GuiEvent::Repaint);
        assert_eq!(scope.active_render_target(), Some(immediate));
    }
    #[test]
    fn redirect_not_reentrant() {
        let (mut host, mut capture) = setup(&Context::default());
        capture.before_gui(&mut host, GuiEvent::Repaint);
        capture.before_gui(&mut host, GuiEvent::Repaint);
        capture.after_gui(&mut host, GuiEvent::Repaint);
        // The screen was active before the first open.
        assert_eq!(host.active_render_target(), None);
        // Unmatched close leaves things be.
        capture.after_gui(&mut host, GuiEvent::Repaint);
        assert_eq!(host.active_render_target(), None);
        assert_eq!(host.clears().len(), 1);
    }
    #[test]
    fn catches_canvases() {
        let context = Context {
            enforce_default_gui_materials: true,
            ..Context::default()
        };
        let (mut host, mut capture) = setup(&context);
        let interpreter = interpreter();
        let ui = host.layer_named("UI").unwrap();

        let overlay = host.add_canvas(
            Canvas {
                name: "Menu".to_owned(),
                raycaster: Some(Raycaster::Standard(RaycastSettings::default())),
                ..Canvas::default()
            },
            2,
        );
        let world = host.add_canvas(
            Canvas {
                name: "Sign".to_owned(),
                render_mode: RenderMode::WorldSpace,
                ..Canvas::default()
            },
            1,
        );
        let debug = host.add_canvas(
            Canvas {
                name: "Debug overlay".to_owned(),
                ..Canvas::default()
            },
            1,
        );
        let mirror = host.add_viewpoint(Viewpoint {
            target: Some(RenderSurfaceID::next()),
            ..Viewpoint::named("Mirror")
        });
        let offscreen = host.add_canvas(
            Canvas {
                name: "Mirror label".to_owned(),
                render_mode: RenderMode::ScreenSpaceCamera,
                world_viewpoint: Some(mirror),
                ..Canvas::default()
            },
            1,
        );

        // Nobody listens yet.
        capture.update(&mut host, &interpreter);
        assert_eq!(
            host.canvas(overlay).unwrap().render_mode,
            RenderMode::ScreenSpaceOverlay
        );

        capture.listen();
        capture.update(&mut host, &interpreter);
        let canvas = host.canvas(overlay).unwrap();
        assert_eq!(canvas.render_mode, RenderMode::ScreenSpaceCamera);
        assert_eq!(canvas.world_viewpoint, Some(capture.viewpoint()));
        assert_eq!(canvas.layer, ui);
        assert!(matches!(canvas.raycaster, Some(Raycaster::SortingAware(_))));
        assert_eq!(host.descendant_layers(overlay).unwrap(), [ui, ui]);
        assert_eq!(host.material_resets(overlay), 1);

        // Already captured, left alone from now on.
        capture.update(&mut host, &interpreter);
        assert_eq!(host.material_resets(overlay), 1);

        for untouched in [world, debug, offscreen] {
            assert_eq!(host.canvas(untouched).unwrap().layer, Layer::DEFAULT);
            assert_eq!(host.material_resets(untouched), 0);
        }
        assert_eq!(
            host.canvas(offscreen).unwrap().world_viewpoint,
            Some(mirror)
        );

        capture.unlisten();
        capture.unlisten();
        assert_eq!(capture.listeners(), 0);
    }
    #[test]
    fn shutdown_releases() {
        let (mut host, capture) = setup(&Context::default());
        let viewpoint = capture.viewpoint();
        assert_eq!(host.surface_count(), 2);
        capture.shutdown(&mut host);
        assert_eq!(host.surface_count(), 0);
        assert!(!host.is_alive(viewpoint));
    }
}
