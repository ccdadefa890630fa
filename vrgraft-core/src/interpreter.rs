//! # Interpreter
//!
//! The host-specific oracle that answers questions about viewpoints and canvases. Its heuristics are the
//! integration's business; the core only consumes the answers.

use crate::{
    canvas::Canvas,
    layers::LayerMask,
    viewpoint::{PostEffect, Viewpoint, ViewpointID},
};

/// What the core should do with a newly discovered viewpoint.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    strum::Display,
    serde::Deserialize,
    serde::Serialize,
)]
pub enum CameraJudgement {
    /// Candidate for the blueprint of the stereo viewpoint.
    MainCamera,
    /// Contributes layers to the stereo viewpoint, never its configuration.
    SubCamera,
    /// Renders 2D UI only.
    Gui,
    /// Renders UI but also contributes to the 3D presentation.
    GuiAndCamera,
    Ignore,
}

pub trait Interpreter {
    /// Decide the role of a viewpoint. Errors are logged and the question is asked again next tick.
    fn judge_camera(&self, id: ViewpointID, viewpoint: &Viewpoint) -> anyhow::Result<CameraJudgement>;
    /// Would the output of this viewpoint be fully hidden by the stereo viewpoint?
    fn is_irrelevant_camera(&self, viewpoint: &Viewpoint) -> bool;
    fn is_ui_camera(&self, viewpoint: &Viewpoint) -> bool;
    fn is_ignored_canvas(&self, canvas: &Canvas) -> bool;
    /// May this post effect be duplicated onto the stereo viewpoint?
    fn is_allowed_effect(&self, effect: &PostEffect) -> bool {
        let _ = effect;
        true
    }
    /// Layers the stereo viewpoint always renders, on top of those of its sub-viewpoints.
    fn default_culling_mask(&self) -> LayerMask {
        LayerMask::empty()
    }
}
