//! # IDs
//! Objects created by the core itself (render surfaces, grabber registrations, event subscriptions) are named
//! by a `GraftID<T>`, unique for the lifetime of the process and namespaced by the marker type `T`.
//!
//! Host objects (viewpoints, canvases) are *not* named this way - their identity belongs to the host, see
//! [`crate::viewpoint::ViewpointID`].

// Next free value per namespace. Namespaces are created a handful of times over the whole run,
// so a plain mutex is plenty.
static NEXT_ID: parking_lot::Mutex<Option<hashbrown::HashMap<std::any::TypeId, u64>>> =
    parking_lot::const_mutex(None);

/// ID that is unique within this execution of the program.
/// IDs of different namespaces may share a numeric value but can never be compared.
pub struct GraftID<T: std::any::Any> {
    id: std::num::NonZeroU64,
    _namespace: std::marker::PhantomData<fn() -> T>,
}
impl<T: std::any::Any> Clone for GraftID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for GraftID<T> {}
impl<T: std::any::Any> PartialEq for GraftID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for GraftID<T> {}
impl<T: std::any::Any> std::hash::Hash for GraftID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> GraftID<T> {
    /// Allocate the next ID of this namespace.
    ///
    /// # Panics
    /// If all `u64::MAX` values of the namespace were handed out.
    #[must_use]
    pub fn next() -> Self {
        let mut lock = NEXT_ID.lock();
        let counter = lock
            .get_or_insert_with(hashbrown::HashMap::new)
            .entry(std::any::TypeId::of::<T>())
            .or_insert(0);
        *counter = counter
            .checked_add(1)
            .unwrap_or_else(|| panic!("{} ID overflow", std::any::type_name::<T>()));

        Self {
            // Never zero, we just incremented from >= 0 without overflow.
            id: std::num::NonZeroU64::new(*counter).unwrap(),
            _namespace: std::marker::PhantomData,
        }
    }
    /// Get the raw numeric value of this ID.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
}
impl<T: std::any::Any> Default for GraftID<T> {
    fn default() -> Self {
        Self::next()
    }
}
impl<T: std::any::Any> std::fmt::Display for GraftID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one element.
        write!(
            f,
            "{}#{}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or_default(),
            self.id
        )
    }
}
impl<T: std::any::Any> std::fmt::Debug for GraftID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::GraftID;
    // Tests share the global counters, so each uses its own namespace.

    #[test]
    fn ids_unique() {
        struct Namespace;
        type TestID = GraftID<Namespace>;

        let mut ids: Vec<_> = (0..512).map(|_| TestID::next()).collect();
        let before = ids.len();
        ids.sort_unstable_by_key(TestID::id);
        ids.dedup();
        assert_eq!(before, ids.len(), "had duplicate ids");
    }
    #[test]
    fn namespaces_independent() {
        struct A;
        struct B;
        let a = GraftID::<A>::next();
        let b = GraftID::<B>::next();
        // Both namespaces start counting from one.
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 1);
    }
    #[test]
    fn display_names_namespace() {
        struct Surface;
        let id = GraftID::<Surface>::next();
        assert_eq!(id.to_string(), format!("Surface#{}", id.id()));
    }
}
