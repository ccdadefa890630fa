//! # Configuration
//!
//! Read-only inputs of the pipeline: layer names, clip planes and 2D capture options ([`Context`]), plus the user
//! settings owned by the settings subsystem ([`Settings`]). Both deserialize from TOML with every field optional.

use crate::{
    host::Host,
    layers::{Layer, LayerMask},
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("layer {0:?} is not defined by the host")]
    UnknownLayer(String),
    #[error("malformed context: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write context: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Which 2D system the host primarily draws with. Decides where the capture viewpoint is placed.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Default, strum::Display, serde::Deserialize, serde::Serialize,
)]
pub enum GuiType {
    /// Retained-mode canvases.
    #[default]
    Canvas,
    /// Immediate-mode drawing, in pixel coordinates.
    Immediate,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Settings {
    /// Resolution multiplier of the stereo viewpoint's eye buffers.
    pub render_scale: f32,
    /// World scale of the stereo rig. Larger values make the user feel smaller.
    pub ipd_scale: f32,
    /// Duplicate the blueprint's post effects onto the stereo viewpoint.
    pub apply_effects: bool,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            render_scale: 1.0,
            ipd_scale: 1.0,
            apply_effects: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Context {
    /// Host layer captured by the 2D capture viewpoint and hidden from the stereo viewpoint.
    pub ui_layer: String,
    /// Host layer never rendered in stereo.
    pub invisible_layer: String,
    /// Raw bits of layers removed from the stereo viewpoint's culling mask.
    pub ignore_mask: u32,
    /// Near clip of the stereo viewpoint. Never taken from the blueprint.
    pub near_clip_plane: f32,
    pub gui_near_clip_plane: f32,
    pub gui_far_clip_plane: f32,
    pub preferred_gui: GuiType,
    /// Reset every captured canvas graphic to the default UI material.
    pub enforce_default_gui_materials: bool,
    /// Replace canvas raycasters with ones ordered by sort order.
    pub gui_alternative_sorting_mode: bool,
    pub settings: Settings,
}
impl Default for Context {
    fn default() -> Self {
        Self {
            ui_layer: "UI".to_owned(),
            invisible_layer: "Invisible".to_owned(),
            ignore_mask: 0,
            near_clip_plane: 0.1,
            gui_near_clip_plane: -10000.0,
            gui_far_clip_plane: 10000.0,
            preferred_gui: GuiType::Canvas,
            enforce_default_gui_materials: false,
            gui_alternative_sorting_mode: true,
            settings: Settings::default(),
        }
    }
}
impl Context {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::ser::to_string_pretty(self)?)
    }
    #[must_use]
    pub fn ignore_mask(&self) -> LayerMask {
        LayerMask::from_bits_retain(self.ignore_mask)
    }
    /// Look up the named layers in the host. Unknown names are logged and left unresolved,
    /// contributing nothing to any mask.
    #[must_use]
    pub fn resolve_layers(&self, host: &dyn Host) -> Layers {
        let resolve = |name: &str| match host.layer_named(name) {
            Some(layer) => Some(layer),
            None => {
                log::warn!("{}", ConfigError::UnknownLayer(name.to_owned()));
                None
            }
        };
        Layers {
            ui: resolve(&self.ui_layer),
            invisible: resolve(&self.invisible_layer),
        }
    }
}

/// Layers of the [`Context`], resolved against the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Layers {
    pub ui: Option<Layer>,
    pub invisible: Option<Layer>,
}
impl Layers {
    #[must_use]
    pub fn ui_mask(&self) -> LayerMask {
        self.ui.map(LayerMask::of).unwrap_or_default()
    }
    /// Layers the stereo viewpoint must never render.
    #[must_use]
    pub fn excluded_mask(&self) -> LayerMask {
        self.ui_mask() | self.invisible.map(LayerMask::of).unwrap_or_default()
    }
}
