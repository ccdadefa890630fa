//! # Host adapter
//!
//! Everything the core knows about the host application goes through [`Host`]. An integration implements it once
//! for its engine; [`crate::sim::SimHost`] is an in-memory implementation.
//!
//! Every lookup returns `None` for stale IDs rather than failing - the host may destroy anything between ticks
//! without telling us, and the core treats a missing object as simply gone.

use crate::{
    canvas::{Canvas, CanvasID},
    color::Color,
    layers::Layer,
    surfaces::{RenderSurfaceDesc, RenderSurfaceID},
    viewpoint::{Viewpoint, ViewpointID},
};

pub trait Host {
    /// Number of live viewpoints, used to size scratch buffers.
    fn viewpoint_count(&self) -> usize;
    /// Append every live viewpoint to `out`, which the caller has cleared.
    fn collect_viewpoints(&self, out: &mut Vec<ViewpointID>);
    fn viewpoint(&self, id: ViewpointID) -> Option<&Viewpoint>;
    fn viewpoint_mut(&mut self, id: ViewpointID) -> Option<&mut Viewpoint>;
    fn is_alive(&self, id: ViewpointID) -> bool {
        self.viewpoint(id).is_some()
    }
    /// Create a viewpoint owned by the core. It is enumerated like any other viewpoint.
    fn spawn_viewpoint(&mut self, viewpoint: Viewpoint) -> ViewpointID;
    fn despawn_viewpoint(&mut self, id: ViewpointID);

    /// Append every live canvas to `out`, which the caller has cleared.
    fn collect_canvases(&self, out: &mut Vec<CanvasID>);
    fn canvas(&self, id: CanvasID) -> Option<&Canvas>;
    fn canvas_mut(&mut self, id: CanvasID) -> Option<&mut Canvas>;
    /// Move the canvas and all of its descendants onto `layer`.
    fn set_canvas_layer_recursive(&mut self, id: CanvasID, layer: Layer);
    /// Reset every graphic below the canvas to the host's default UI material.
    fn reset_canvas_materials(&mut self, id: CanvasID);

    /// Look up a layer by the name the host gave it.
    fn layer_named(&self, name: &str) -> Option<Layer>;
    /// Size of the host window in physical pixels.
    fn window_size(&self) -> [u32; 2];

    fn create_render_surface(&mut self, id: RenderSurfaceID, desc: RenderSurfaceDesc);
    fn release_render_surface(&mut self, id: RenderSurfaceID);
    /// The render target immediate-mode drawing currently goes to, None for the screen.
    fn active_render_target(&self) -> Option<RenderSurfaceID>;
    fn set_active_render_target(&mut self, target: Option<RenderSurfaceID>);
    /// Clear color and depth of the active render target.
    fn clear_active_target(&mut self, color: Color);
}

/// Kind of the immediate-mode event currently being dispatched by the host.
/// Drawing only happens during [`GuiEvent::Repaint`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, strum::Display)]
pub enum GuiEvent {
    Layout,
    Repaint,
    /// Input and everything else.
    Other,
}
