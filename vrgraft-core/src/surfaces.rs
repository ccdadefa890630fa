//! # Render surfaces
//!
//! Off-screen render targets. The host backs them with real GPU memory, the core only hands out their IDs.
//! [`RenderSurfaceRegistry`] owns the two capture surfaces 2D output is redirected into.

use crate::host::Host;

pub struct RenderSurfaceMarker;
pub type RenderSurfaceID = crate::GraftID<RenderSurfaceMarker>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderSurfaceDesc {
    pub width: u32,
    pub height: u32,
    /// Bits of depth buffer, 0 for none.
    pub depth_bits: u8,
}

/// The two capture surfaces, sized to the host window.
pub struct RenderSurfaceRegistry {
    // Retained first, then immediate. Order is observable through `iter`.
    surfaces: [RenderSurfaceID; 2],
}
impl RenderSurfaceRegistry {
    /// Depth precision of the retained-mode surface, which renders through a viewpoint.
    const RETAINED_DEPTH_BITS: u8 = 24;
    /// Create both surfaces at the given pixel size.
    pub fn create(host: &mut dyn Host, size: [u32; 2]) -> Self {
        let [width, height] = size;
        let retained = RenderSurfaceID::next();
        host.create_render_surface(
            retained,
            RenderSurfaceDesc {
                width,
                height,
                depth_bits: Self::RETAINED_DEPTH_BITS,
            },
        );
        // Immediate mode draws straight into the target, no depth.
        let immediate = RenderSurfaceID::next();
        host.create_render_surface(
            immediate,
            RenderSurfaceDesc {
                width,
                height,
                depth_bits: 0,
            },
        );
        log::debug!("Created capture surfaces {retained} and {immediate} at {width}x{height}");

        Self {
            surfaces: [retained, immediate],
        }
    }
    /// Surface receiving canvases, through the capture viewpoint.
    #[must_use]
    pub fn retained(&self) -> RenderSurfaceID {
        self.surfaces[0]
    }
    /// Surface receiving immediate-mode drawing.
    #[must_use]
    pub fn immediate(&self) -> RenderSurfaceID {
        self.surfaces[1]
    }
    /// Both surfaces, retained first.
    #[must_use]
    pub fn as_slice(&self) -> &[RenderSurfaceID] {
        self.surfaces.as_slice()
    }
    pub fn iter(&self) -> impl Iterator<Item = RenderSurfaceID> + '_ {
        self.surfaces.iter().copied()
    }
    /// Give the backing memory back to the host. The IDs must not be used afterwards.
    pub fn release(self, host: &mut dyn Host) {
        for surface in self.surfaces {
            host.release_render_surface(surface);
        }
    }
}

#[cfg(test)]
mod test {
    use super::RenderSurfaceRegistry;
    use crate::sim::SimHost;
    #[test]
    fn creates_and_releases() {
        let mut host = SimHost::new([1280, 720]);
        let registry = RenderSurfaceRegistry::create(&mut host, [1280, 720]);

        let retained = host.render_surface(registry.retained()).unwrap();
        assert_eq!((retained.width, retained.height, retained.depth_bits), (1280, 720, 24));
        let immediate = host.render_surface(registry.immediate()).unwrap();
        assert_eq!(immediate.depth_bits, 0);
        assert_eq!(
            registry.iter().collect::<Vec<_>>(),
            [registry.retained(), registry.immediate()]
        );

        let ids: Vec<_> = registry.iter().collect();
        registry.release(&mut host);
        assert!(ids.iter().all(|&id| host.render_surface(id).is_none()));
    }
}
