//! # Events
//!
//! Observer lists for the notifications the synthesizer emits. Observers run in registration order and stay
//! registered until explicitly unsubscribed.

use crate::viewpoint::ViewpointID;

pub struct SubscriptionMarker;
pub type SubscriptionID = crate::GraftID<SubscriptionMarker>;

/// A viewpoint was classified as contributing to the stereo presentation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CameraCopied {
    pub viewpoint: ViewpointID,
}

/// A viewpoint was copied as a main-camera candidate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CameraInitialized {
    /// The stereo viewpoint.
    pub canonical: ViewpointID,
    /// The blueprint after the copy, if any is alive.
    pub blueprint: Option<ViewpointID>,
}

pub struct Observers<E> {
    list: Vec<(SubscriptionID, Box<dyn FnMut(&E)>)>,
}
impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self { list: Vec::new() }
    }
}
impl<E> Observers<E> {
    pub fn subscribe(&mut self, observer: impl FnMut(&E) + 'static) -> SubscriptionID {
        let id = SubscriptionID::next();
        self.list.push((id, Box::new(observer)));
        id
    }
    /// Returns false if the subscription was not found here.
    pub fn unsubscribe(&mut self, id: SubscriptionID) -> bool {
        let before = self.list.len();
        self.list.retain(|(this, _)| *this != id);
        before != self.list.len()
    }
    pub fn notify(&mut self, event: &E) {
        for (_, observer) in &mut self.list {
            observer(event);
        }
    }
}
