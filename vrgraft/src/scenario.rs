//! Scripted host activity, played against the in-memory host one tick at a time.

use vrgraft_core::{
    canvas::{Canvas, RaycastSettings, Raycaster, RenderMode},
    color::Color,
    host::{GuiEvent, Host},
    layers::LayerMask,
    sim::{RuleInterpreter, SimHost},
    viewpoint::{PostEffect, Viewpoint, ViewpointID},
    Session,
};

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("no live viewpoint named {0:?}")]
    UnknownViewpoint(String),
    #[error("malformed scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
}

fn default_window() -> [u32; 2] {
    [1280, 720]
}
fn default_ticks() -> u64 {
    1
}

#[derive(serde::Deserialize, Debug)]
pub struct Scenario {
    #[serde(default = "default_window")]
    pub window: [u32; 2],
    /// Total ticks to run. Extended to cover the last event if too short.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default)]
    pub interpreter: RuleInterpreter,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(serde::Deserialize, Debug)]
pub struct Event {
    /// Applied before the pipeline runs on this tick.
    pub tick: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(serde::Deserialize, Debug, strum::IntoStaticStr)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    SpawnViewpoint {
        name: String,
        #[serde(default)]
        far_clip: Option<f32>,
        #[serde(default)]
        depth: Option<f32>,
        /// Raw layer bits, all layers if unset.
        #[serde(default)]
        culling_mask: Option<u32>,
        #[serde(default)]
        audio_listener: bool,
        #[serde(default)]
        disabled: bool,
        #[serde(default)]
        effects: Vec<String>,
    },
    DestroyViewpoint {
        name: String,
    },
    SetEnabled {
        name: String,
        enabled: bool,
    },
    SpawnCanvas {
        name: String,
        #[serde(default)]
        render_mode: RenderMode,
        #[serde(default)]
        sort_order: i32,
        #[serde(default)]
        descendants: usize,
        #[serde(default)]
        raycaster: bool,
    },
    LoadScene,
    Listen,
    Unlisten,
    /// Draw in immediate mode for one repaint.
    ImmediateDraw,
    ToggleEffects,
}

impl Scenario {
    pub fn load(path: &std::path::Path) -> Result<Self, ScenarioError> {
        let string = std::fs::read_to_string(path)?;
        Self::from_toml(&string)
    }
    pub fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Self = toml::from_str(text)?;
        // Stable, so same-tick events keep file order.
        scenario.events.sort_by_key(|event| event.tick);
        Ok(scenario)
    }
    /// Number of ticks the scenario actually runs.
    #[must_use]
    pub fn length(&self) -> u64 {
        let last = self.events.last().map_or(0, |event| event.tick + 1);
        self.ticks.max(last)
    }
    /// Play every tick against the host. Returns how many events were applied.
    pub fn play(&self, host: &mut SimHost, session: &mut Session) -> Result<usize, ScenarioError> {
        let mut events = self.events.iter().peekable();
        let mut applied = 0;
        for tick in 0..self.length() {
            while let Some(event) = events.next_if(|event| event.tick == tick) {
                log::debug!("Tick {tick}: {}", <&str>::from(&event.action));
                apply(&event.action, host, session)?;
                applied += 1;
            }
            session.tick(host);
        }
        Ok(applied)
    }
}

/// Most recently spawned live viewpoint of that name.
fn find_viewpoint(host: &SimHost, name: &str) -> Result<ViewpointID, ScenarioError> {
    let mut ids = Vec::with_capacity(host.viewpoint_count());
    host.collect_viewpoints(&mut ids);
    ids.into_iter()
        .rev()
        .find(|&id| host.viewpoint(id).is_some_and(|viewpoint| viewpoint.name == name))
        .ok_or_else(|| ScenarioError::UnknownViewpoint(name.to_owned()))
}

fn apply(action: &Action, host: &mut SimHost, session: &mut Session) -> Result<(), ScenarioError> {
    match action {
        Action::SpawnViewpoint {
            name,
            far_clip,
            depth,
            culling_mask,
            audio_listener,
            disabled,
            effects,
        } => {
            let defaults = Viewpoint::default();
            let viewpoint = Viewpoint {
                name: name.clone(),
                far_clip: far_clip.unwrap_or(defaults.far_clip),
                depth: depth.unwrap_or(defaults.depth),
                culling_mask: culling_mask.map_or(LayerMask::all(), LayerMask::from_bits_retain),
                audio_listener: *audio_listener,
                enabled: !disabled,
                effects: effects
                    .iter()
                    .map(|name| PostEffect {
                        name: name.clone(),
                        enabled: true,
                    })
                    .collect(),
                ..defaults
            };
            let id = host.add_viewpoint(viewpoint);
            log::info!("Host spawned {name} ({id})");
        }
        Action::DestroyViewpoint { name } => {
            let id = find_viewpoint(host, name)?;
            host.destroy_viewpoint(id);
            log::info!("Host destroyed {name} ({id})");
        }
        Action::SetEnabled { name, enabled } => {
            let id = find_viewpoint(host, name)?;
            if let Some(viewpoint) = host.viewpoint_mut(id) {
                viewpoint.enabled = *enabled;
            }
        }
        Action::SpawnCanvas {
            name,
            render_mode,
            sort_order,
            descendants,
            raycaster,
        } => {
            let canvas = Canvas {
                name: name.clone(),
                render_mode: *render_mode,
                sort_order: *sort_order,
                raycaster: raycaster.then_some(Raycaster::Standard(RaycastSettings::default())),
                ..Canvas::default()
            };
            let id = host.add_canvas(canvas, *descendants);
            log::info!("Host spawned canvas {name} ({id})");
        }
        Action::LoadScene => {
            host.load_scene();
            session.on_scene_loaded(host);
        }
        Action::Listen => session.listen(),
        Action::Unlisten => session.unlisten(),
        Action::ImmediateDraw => {
            let mut scope = session.immediate_scope(host, GuiEvent::Repaint);
            // Foreign drawing code is free to mess with the target, the scope restores it.
            scope.clear_active_target(Color::WHITE);
            scope.set_active_render_target(None);
        }
        Action::ToggleEffects => session.toggle_effects(host),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use vrgraft_core::config::Context;

    const SCENARIO: &str = r#"
        ticks = 4

        [interpreter]
        ui_cameras = ["HUD"]

        [[interpreter.rules]]
        contains = "Main"
        judgement = "MainCamera"

        [[interpreter.rules]]
        contains = "HUD"
        judgement = "Gui"

        [[events]]
        tick = 2
        action = "set_enabled"
        name = "Main Camera"
        enabled = false

        [[events]]
        tick = 0
        action = "spawn_viewpoint"
        name = "Main Camera"
        far_clip = 4.0
        audio_listener = true

        [[events]]
        tick = 0
        action = "spawn_viewpoint"
        name = "HUD"

        [[events]]
        tick = 1
        action = "immediate_draw"
    "#;

    #[test]
    fn plays_in_order() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        assert_eq!(scenario.length(), 4);
        assert!(matches!(scenario.events[0].action, Action::SpawnViewpoint { .. }));

        let mut host = SimHost::new(scenario.window);
        let mut session = Session::activate(
            &mut host,
            Context::default(),
            Box::new(scenario.interpreter.clone()),
        );
        assert_eq!(scenario.play(&mut host, &mut session).unwrap(), 4);

        let main = find_viewpoint(&host, "Main Camera").unwrap();
        let hud = find_viewpoint(&host, "HUD").unwrap();
        let canonical = host.viewpoint(session.canonical()).unwrap();
        assert_eq!(canonical.far_clip, 10.0);
        assert_eq!(host.listener_count(), 1);
        assert!(!session.synthesizer().registered().contains(&main));
        assert!(session.capture().owns(hud));
        assert_eq!(host.active_render_target(), None);
    }
    #[test]
    fn unknown_viewpoint_fails() {
        let scenario = Scenario::from_toml(
            r#"
            [[events]]
            tick = 0
            action = "destroy_viewpoint"
            name = "Nobody"
            "#,
        )
        .unwrap();
        let mut host = SimHost::new(scenario.window);
        let mut session = Session::activate(
            &mut host,
            Context::default(),
            Box::new(scenario.interpreter.clone()),
        );
        assert!(matches!(
            scenario.play(&mut host, &mut session),
            Err(ScenarioError::UnknownViewpoint(_))
        ));
    }
}
