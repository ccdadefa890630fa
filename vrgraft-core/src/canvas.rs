//! # Canvases
//!
//! Retained-mode 2D drawing surfaces of the host. The host adapter enumerates them for us, we never create them.

use crate::{layers::Layer, viewpoint::ViewpointID};

/// Host-issued identity of a canvas.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CanvasID(pub u64);
impl std::fmt::Display for CanvasID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Canvas#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, strum::Display, serde::Deserialize)]
pub enum RenderMode {
    /// Drawn straight onto the screen after every viewpoint.
    #[default]
    ScreenSpaceOverlay,
    /// Drawn by `world_viewpoint`, flat in front of it.
    ScreenSpaceCamera,
    /// A quad living in the 3D scene.
    WorldSpace,
}

/// Settings shared by both raycaster kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct RaycastSettings {
    pub ignore_reversed_graphics: bool,
    pub blocking_objects: BlockingObjects,
    pub blocking_mask: crate::layers::LayerMask,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum BlockingObjects {
    #[default]
    None,
    TwoD,
    ThreeD,
    All,
}

/// The component that decides which canvas receives pointer input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Raycaster {
    /// Host default. Ordering between canvases is decided by the host.
    Standard(RaycastSettings),
    /// Ordered by the canvas' sort order, higher sort order wins.
    SortingAware(RaycastSettings),
}
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    pub name: String,
    pub render_mode: RenderMode,
    pub world_viewpoint: Option<ViewpointID>,
    pub layer: Layer,
    pub sort_order: i32,
    pub sorting_layer: String,
    pub raycaster: Option<Raycaster>,
}
impl Canvas {
    /// Priority of this canvas among raycast targets, lower first.
    ///
    /// Sorting-aware raycasters report the negated sort order, so that the canvas drawn on top
    /// is also the one hit first.
    #[must_use]
    pub fn raycast_priority(&self) -> Option<i32> {
        match self.raycaster? {
            Raycaster::Standard(_) => Some(0),
            Raycaster::SortingAware(_) => Some(self.sort_order.saturating_neg()),
        }
    }
}
