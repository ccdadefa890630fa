//! # Session
//!
//! The one context object of an active VR mode. Constructed at activation, it owns every service of the pipeline
//! and is driven explicitly by the integration: [`Session::tick`] once per frame, [`Session::before_gui`] and
//! [`Session::after_gui`] around immediate-mode drawing, [`Session::on_scene_loaded`] on level transitions.

use crate::{
    capture::{Capture, ImmediateCapture},
    classifier::Classifier,
    config::Context,
    events::{CameraCopied, CameraInitialized, SubscriptionID},
    grabber::{GrabberID, ScreenGrabber},
    host::{GuiEvent, Host},
    interpreter::Interpreter,
    surfaces::RenderSurfaceRegistry,
    synthesizer::Synthesizer,
    viewpoint::ViewpointID,
};

pub struct Session {
    interpreter: Box<dyn Interpreter>,
    classifier: Classifier,
    synthesizer: Synthesizer,
    capture: Capture,
    effects_enabled: bool,
    ticks: u64,
}
impl Session {
    /// Start VR mode: spawn the stereo viewpoint, then the capture viewpoint and its surfaces.
    pub fn activate(host: &mut dyn Host, context: Context, interpreter: Box<dyn Interpreter>) -> Self {
        log::info!("Activating VR mode");
        let layers = context.resolve_layers(host);
        let synthesizer = Synthesizer::new(host, &context, &layers);
        let capture = Capture::new(host, &context, &layers);
        let effects_enabled = context.settings.apply_effects;

        Self {
            interpreter,
            classifier: Classifier::default(),
            synthesizer,
            capture,
            effects_enabled,
            ticks: 0,
        }
    }
    /// Run one frame of the pipeline. Classification runs first, so viewpoints it hands to the
    /// coordinator are captured within the same tick.
    pub fn tick(&mut self, host: &mut dyn Host) {
        self.ticks += 1;
        log::trace!("Tick {}", self.ticks);
        let interpreter = self.interpreter.as_ref();
        self.classifier.classify(
            host,
            interpreter,
            &mut self.synthesizer,
            &mut self.capture,
            self.effects_enabled,
        );
        self.synthesizer.sync(host, interpreter);
        self.capture.update(host, interpreter);
    }

    pub fn before_gui(&mut self, host: &mut dyn Host, event: GuiEvent) {
        self.capture.before_gui(host, event);
    }
    pub fn after_gui(&mut self, host: &mut dyn Host, event: GuiEvent) {
        self.capture.after_gui(host, event);
    }
    /// See [`Capture::immediate_scope`].
    pub fn immediate_scope<'a>(
        &'a mut self,
        host: &'a mut dyn Host,
        event: GuiEvent,
    ) -> ImmediateCapture<'a> {
        self.capture.immediate_scope(host, event)
    }

    /// The host replaced its scene. Every viewpoint will be judged anew.
    pub fn on_scene_loaded(&mut self, host: &mut dyn Host) {
        log::info!("Scene loaded");
        self.classifier.on_scene_loaded();
        self.synthesizer
            .on_scene_loaded(host, self.interpreter.as_ref());
        self.capture.on_scene_loaded();
    }

    pub fn enable_effects(&mut self, host: &mut dyn Host) {
        self.effects_enabled = true;
        self.synthesizer
            .copy_effects(host, self.interpreter.as_ref(), &self.capture);
    }
    /// Stop duplicating post effects, removing those already on the stereo viewpoint.
    pub fn disable_effects(&mut self, host: &mut dyn Host) {
        self.effects_enabled = false;
        if let Some(canonical) = host.viewpoint_mut(self.synthesizer.canonical()) {
            canonical.effects.clear();
        }
    }
    pub fn toggle_effects(&mut self, host: &mut dyn Host) {
        if self.effects_enabled {
            self.disable_effects(host);
        } else {
            self.enable_effects(host);
        }
    }
    #[must_use]
    pub fn effects_enabled(&self) -> bool {
        self.effects_enabled
    }

    /// See [`Synthesizer::clone_canonical`].
    pub fn clone_canonical(&self, host: &mut dyn Host, copy_effects: bool) -> Option<ViewpointID> {
        self.synthesizer.clone_canonical(host, copy_effects)
    }

    pub fn add_grabber(&mut self, host: &mut dyn Host, grabber: Box<dyn ScreenGrabber>) -> GrabberID {
        self.capture
            .add_grabber(host, self.interpreter.as_ref(), grabber)
    }
    pub fn remove_grabber(
        &mut self,
        host: &mut dyn Host,
        id: GrabberID,
    ) -> Option<Box<dyn ScreenGrabber>> {
        self.capture
            .remove_grabber(host, self.interpreter.as_ref(), id)
    }
    pub fn listen(&mut self) {
        self.capture.listen();
    }
    pub fn unlisten(&mut self) {
        self.capture.unlisten();
    }

    pub fn on_copied(&mut self, observer: impl FnMut(&CameraCopied) + 'static) -> SubscriptionID {
        self.synthesizer.on_copied(observer)
    }
    pub fn on_initialized(
        &mut self,
        observer: impl FnMut(&CameraInitialized) + 'static,
    ) -> SubscriptionID {
        self.synthesizer.on_initialized(observer)
    }
    pub fn unsubscribe(&mut self, id: SubscriptionID) -> bool {
        self.synthesizer.unsubscribe(id)
    }

    #[must_use]
    pub fn canonical(&self) -> ViewpointID {
        self.synthesizer.canonical()
    }
    /// The current blueprint, see [`Synthesizer::blueprint`].
    #[must_use]
    pub fn blueprint(&self, host: &dyn Host) -> Option<ViewpointID> {
        self.synthesizer.blueprint(host, &self.capture)
    }
    #[must_use]
    pub fn surfaces(&self) -> &RenderSurfaceRegistry {
        self.capture.surfaces()
    }
    #[must_use]
    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }
    #[must_use]
    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Leave VR mode, destroying everything the session spawned in the host.
    pub fn shutdown(self, host: &mut dyn Host) {
        log::info!("Shutting down VR mode after {} ticks", self.ticks);
        self.capture.shutdown(host);
        self.synthesizer.shutdown(host);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        canvas::Canvas,
        interpreter::CameraJudgement,
        sim::{JudgementRule, RuleInterpreter, SimHost},
        viewpoint::{PostEffect, Viewpoint},
    };

    fn interpreter() -> RuleInterpreter {
        RuleInterpreter {
            rules: vec![
                JudgementRule {
                    contains: "Main".to_owned(),
                    judgement: CameraJudgement::MainCamera,
                },
                JudgementRule {
                    contains: "HUD".to_owned(),
                    judgement: CameraJudgement::GuiAndCamera,
                },
            ],
            ui_cameras: vec!["HUD".to_owned()],
            blocked_effects: vec!["Blur".to_owned()],
            ..RuleInterpreter::default()
        }
    }

    #[test]
    fn captured_in_same_tick() {
        let mut host = SimHost::new([640, 480]);
        let mut session = Session::activate(&mut host, Context::default(), Box::new(interpreter()));
        let hud = host.add_viewpoint(Viewpoint::named("HUD"));
        host.add_canvas(Canvas::default(), 0);
        session.listen();

        session.tick(&mut host);
        let retained = session.surfaces().retained();
        assert_eq!(host.viewpoint(hud).unwrap().target, Some(retained));
        assert!(session.synthesizer().is_sub_viewpoint(hud));
    }
    #[test]
    fn effects_follow_toggle() {
        let mut host = SimHost::new([640, 480]);
        let mut session = Session::activate(&mut host, Context::default(), Box::new(interpreter()));
        let effect = |name: &str| PostEffect {
            name: name.to_owned(),
            enabled: true,
        };
        let mut main = Viewpoint::named("Main Camera");
        main.effects.push(effect("Bloom"));
        main.effects.push(effect("Blur"));
        host.add_viewpoint(main);
        session.tick(&mut host);

        let canonical = session.canonical();
        assert!(host.viewpoint(canonical).unwrap().effects.is_empty());
        session.toggle_effects(&mut host);
        assert_eq!(
            host.viewpoint(canonical).unwrap().effects.as_slice(),
            [effect("Bloom")]
        );
        session.toggle_effects(&mut host);
        assert!(host.viewpoint(canonical).unwrap().effects.is_empty());
    }
    #[test]
    fn rejudged_after_scene_load() {
        let mut host = SimHost::new([640, 480]);
        let mut session = Session::activate(&mut host, Context::default(), Box::new(interpreter()));
        let first = host.add_viewpoint(Viewpoint::named("Main Camera"));
        session.tick(&mut host);
        assert_eq!(session.blueprint(&host), Some(first));

        host.load_scene();
        session.on_scene_loaded(&mut host);
        let second = host.add_viewpoint(Viewpoint::named("Main Camera"));
        session.tick(&mut host);
        assert_eq!(session.blueprint(&host), Some(second));
        // Persisted across the load.
        assert!(host.is_alive(session.canonical()));
        assert_eq!(host.listener_count(), 1);
    }
    #[test]
    fn reused_id_after_scene_load() {
        let mut host = SimHost::new([640, 480]).recycling_ids();
        let rules = RuleInterpreter {
            fallback: Some(CameraJudgement::SubCamera),
            irrelevant: vec!["Backdrop".to_owned()],
            ..interpreter()
        };
        let mut session = Session::activate(&mut host, Context::default(), Box::new(rules));
        let backdrop = host.add_viewpoint(Viewpoint::named("Backdrop"));
        session.tick(&mut host);
        assert!(session.synthesizer().is_neutralized(backdrop));

        host.load_scene();
        session.on_scene_loaded(&mut host);
        assert!(session.synthesizer().registered().is_empty());
        assert_eq!(session.synthesizer().elected_blueprint(), None);

        let main = host.add_viewpoint(Viewpoint {
            far_clip: 777.0,
            ..Viewpoint::named("Main Camera")
        });
        assert_eq!(main, backdrop);
        session.tick(&mut host);

        let synthesizer = session.synthesizer();
        assert!(!synthesizer.is_neutralized(main));
        assert!(!crate::neutralizer::is_neutral(host.viewpoint(main).unwrap()));
        assert_eq!(synthesizer.record(main).unwrap().name, "Main Camera");
        assert_eq!(synthesizer.elected_blueprint(), Some(main));
        assert_eq!(host.viewpoint(session.canonical()).unwrap().far_clip, 777.0);
    }
    #[test]
    fn shutdown_cleans_host() {
        let mut host = SimHost::new([640, 480]);
        let session = Session::activate(&mut host, Context::default(), Box::new(interpreter()));
        assert_eq!(host.viewpoint_count(), 2);
        session.shutdown(&mut host);
        assert_eq!(host.viewpoint_count(), 0);
        assert_eq!(host.surface_count(), 0);
    }
}
