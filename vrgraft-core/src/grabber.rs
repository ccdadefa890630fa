//! # Screen grabbers
//!
//! A screen grabber claims viewpoints whose output is 2D and supplies the surfaces that output is rendered into.
//! Grabbers are asked most-recently-registered first, and the [capture coordinator](crate::capture) is always the
//! grabber of last resort, so the set of owners is closed apart from the one open [`Owner::External`] slot.

use crate::{
    host::Host,
    interpreter::Interpreter,
    surfaces::RenderSurfaceID,
    viewpoint::{Viewpoint, ViewpointID},
};

pub struct GrabberMarker;
pub type GrabberID = crate::GraftID<GrabberMarker>;

/// Handed to [`ScreenGrabber::on_assign`].
pub struct Assignment<'a> {
    /// The viewpoint just claimed.
    pub viewpoint: ViewpointID,
    /// The capture coordinator's own orthographic viewpoint.
    pub capture_viewpoint: ViewpointID,
    pub host: &'a mut dyn Host,
}

pub trait ScreenGrabber {
    /// Does this grabber want to own the viewpoint?
    fn check(&self, viewpoint: &Viewpoint, interpreter: &dyn Interpreter) -> bool;
    /// Called each time the grabber is (re)assigned a viewpoint.
    fn on_assign(&mut self, assignment: Assignment<'_>) {
        let _ = assignment;
    }
    /// Surfaces this grabber renders into, in order. Owned viewpoints are bound to the first.
    fn textures(&self) -> &[RenderSurfaceID];
}

/// Who owns a viewpoint's output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Owner {
    /// The capture coordinator itself.
    Capture,
    External(GrabberID),
}
impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capture => f.write_str("capture"),
            Self::External(id) => write!(f, "{id}"),
        }
    }
}

/// Registered external grabbers, highest priority first.
#[derive(Default)]
pub struct Grabbers {
    list: Vec<(GrabberID, Box<dyn ScreenGrabber>)>,
}
impl Grabbers {
    /// Register at the front, so the new grabber is asked before all others.
    pub fn insert_front(&mut self, grabber: Box<dyn ScreenGrabber>) -> GrabberID {
        let id = GrabberID::next();
        self.list.insert(0, (id, grabber));
        id
    }
    pub fn remove(&mut self, id: GrabberID) -> Option<Box<dyn ScreenGrabber>> {
        let idx = self.list.iter().position(|(this, _)| *this == id)?;
        Some(self.list.remove(idx).1)
    }
    /// The first grabber, by priority, wanting this viewpoint.
    #[must_use]
    pub fn find(&self, viewpoint: &Viewpoint, interpreter: &dyn Interpreter) -> Option<GrabberID> {
        self.list
            .iter()
            .find(|(_, grabber)| grabber.check(viewpoint, interpreter))
            .map(|(id, _)| *id)
    }
    #[must_use]
    pub fn get(&self, id: GrabberID) -> Option<&dyn ScreenGrabber> {
        self.list
            .iter()
            .find(|(this, _)| *this == id)
            .map(|(_, grabber)| grabber.as_ref())
    }
    pub fn get_mut(&mut self, id: GrabberID) -> Option<&mut (dyn ScreenGrabber + 'static)> {
        self.list
            .iter_mut()
            .find(|(this, _)| *this == id)
            .map(|(_, grabber)| grabber.as_mut())
    }
}
