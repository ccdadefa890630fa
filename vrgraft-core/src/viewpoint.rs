//! # Viewpoints
//!
//! A viewpoint is a render camera living in the host. The core never owns the host's viewpoints, it only reads
//! and annotates them through the [host adapter](crate::host::Host), naming them by the host-issued [`ViewpointID`].

use crate::{color::Color, layers::LayerMask, surfaces::RenderSurfaceID};

/// Host-issued identity of a viewpoint. Stable for as long as the viewpoint is alive, but the host is
/// free to reuse a value after a scene transition.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ViewpointID(std::num::NonZeroU64);
impl ViewpointID {
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        std::num::NonZeroU64::new(raw).map(Self)
    }
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}
impl std::fmt::Display for ViewpointID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Viewpoint#{}", self.0)
    }
}

/// Host-issued handle to a material, e.g. a skybox.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Deserialize, serde::Serialize)]
pub struct MaterialID(pub u64);

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Default, strum::Display, serde::Deserialize,
)]
pub enum ClearMode {
    #[default]
    Skybox,
    SolidColor,
    /// Clear depth only, keeping whatever color was drawn before.
    Depth,
    Nothing,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Default, strum::Display, serde::Deserialize,
)]
pub enum RenderingPath {
    #[default]
    HostDefault,
    Forward,
    Deferred,
    VertexLit,
}

/// Which eyes the host's own stereo runtime drives this viewpoint for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, strum::Display)]
pub enum StereoTargetEye {
    /// The host leaves the viewpoint alone.
    None,
    Left,
    Right,
    #[default]
    Both,
}

bitflags::bitflags! {
    /// Auxiliary textures a viewpoint generates alongside color.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct DepthTextureMode : u8 {
        const DEPTH          = 0b0000_0001;
        const DEPTH_NORMALS  = 0b0000_0010;
        const MOTION_VECTORS = 0b0000_0100;
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Transform {
    pub position: ultraviolet::Vec3,
    pub rotation: ultraviolet::Rotor3,
    /// Uniform scale of the viewpoint's origin.
    pub scale: f32,
}
impl Default for Transform {
    fn default() -> Self {
        Self {
            position: ultraviolet::Vec3::zero(),
            rotation: ultraviolet::Rotor3::identity(),
            scale: 1.0,
        }
    }
}

/// A post-processing effect attached to a viewpoint, identified by the host's name for it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PostEffect {
    pub name: String,
    pub enabled: bool,
}

#[derive(Clone, Debug)]
pub struct Viewpoint {
    /// The host's name for this viewpoint. Not unique.
    pub name: String,
    pub transform: Transform,
    pub near_clip: f32,
    pub far_clip: f32,
    pub clear_mode: ClearMode,
    pub background: Color,
    pub culling_mask: LayerMask,
    /// Draw priority. Lower depth draws first.
    pub depth: f32,
    /// Where this viewpoint renders to, or None for the screen.
    pub target: Option<RenderSurfaceID>,
    pub rendering_path: RenderingPath,
    pub depth_texture: DepthTextureMode,
    pub layer_cull_spherical: bool,
    pub occlusion_culling: bool,
    pub allow_hdr: bool,
    pub stereo_target: StereoTargetEye,
    pub enabled: bool,
    /// Whether an audio listener is attached. Exactly one should exist process wide.
    pub audio_listener: bool,
    pub skybox: Option<MaterialID>,
    /// Some for orthographic viewpoints, holding half the vertical extent.
    pub orthographic_size: Option<f32>,
    pub effects: smallvec::SmallVec<[PostEffect; 2]>,
}
impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            near_clip: 0.3,
            far_clip: 1000.0,
            clear_mode: ClearMode::Skybox,
            background: Color::BLACK,
            culling_mask: LayerMask::all(),
            depth: 0.0,
            target: None,
            rendering_path: RenderingPath::HostDefault,
            depth_texture: DepthTextureMode::empty(),
            layer_cull_spherical: false,
            occlusion_culling: true,
            allow_hdr: false,
            stereo_target: StereoTargetEye::Both,
            enabled: true,
            audio_listener: false,
            skybox: None,
            orthographic_size: None,
            effects: smallvec::SmallVec::new(),
        }
    }
}
impl Viewpoint {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The configuration of a viewpoint at the moment it was classified, before the core touched it.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewpointSnapshot {
    pub near_clip: f32,
    pub far_clip: f32,
    pub clear_mode: ClearMode,
    pub rendering_path: RenderingPath,
    pub depth_texture: DepthTextureMode,
    pub layer_cull_spherical: bool,
    pub occlusion_culling: bool,
    pub allow_hdr: bool,
    pub background: Color,
    pub culling_mask: LayerMask,
    pub skybox: Option<MaterialID>,
}
impl From<&Viewpoint> for ViewpointSnapshot {
    fn from(value: &Viewpoint) -> Self {
        Self {
            near_clip: value.near_clip,
            far_clip: value.far_clip,
            clear_mode: value.clear_mode,
            rendering_path: value.rendering_path,
            depth_texture: value.depth_texture,
            layer_cull_spherical: value.layer_cull_spherical,
            occlusion_culling: value.occlusion_culling,
            allow_hdr: value.allow_hdr,
            background: value.background,
            culling_mask: value.culling_mask,
            skybox: value.skybox,
        }
    }
}
