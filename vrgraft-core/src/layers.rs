//! # Layers
//!
//! Every renderable object lives on exactly one of 32 visibility layers, and each viewpoint renders the set of layers
//! selected by its [`LayerMask`].

bitflags::bitflags! {
    /// A set of visibility layers. Bit `n` selects layer `n`.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct LayerMask : u32 {
        // Layers are named by the host, not by us. Every bit is meaningful.
        const _ = !0;
    }
}
impl Default for LayerMask {
    fn default() -> Self {
        Self::empty()
    }
}
impl LayerMask {
    /// Mask containing only `layer`.
    #[must_use]
    pub const fn of(layer: Layer) -> Self {
        Self::from_bits_retain(1 << layer.0)
    }
    /// Does this mask render `layer`?
    #[must_use]
    pub const fn renders(self, layer: Layer) -> bool {
        self.bits() & (1 << layer.0) != 0
    }
    /// Iterate the layers selected by this mask, lowest first.
    pub fn layers(self) -> impl Iterator<Item = Layer> {
        (0..Layer::COUNT).filter_map(move |idx| {
            let layer = Layer(idx);
            self.renders(layer).then_some(layer)
        })
    }
}
impl From<Layer> for LayerMask {
    fn from(value: Layer) -> Self {
        Self::of(value)
    }
}
impl FromIterator<Layer> for LayerMask {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |mask, layer| mask | Self::of(layer))
    }
}

/// Index of a single visibility layer, in `0..32`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Layer(u8);
impl Layer {
    pub const COUNT: u8 = 32;
    /// Layer everything starts on.
    pub const DEFAULT: Self = Self(0);
    /// Make a layer from its index, or None if out of range.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}
impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer {}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::{Layer, LayerMask};
    #[test]
    fn layer_range() {
        assert!(Layer::new(31).is_some());
        assert!(Layer::new(32).is_none());
    }
    #[test]
    fn mask_layers() {
        let mask = LayerMask::from_bits_retain(0b1010_0000_0000_0000_0000_0000_0000_0101);
        let indices: Vec<u8> = mask.layers().map(Layer::index).collect();
        assert_eq!(indices, [0, 2, 29, 31]);
        assert_eq!(mask.layers().collect::<LayerMask>(), mask);
    }
    #[test]
    fn high_bit_difference() {
        let all = LayerMask::all();
        let top = LayerMask::of(Layer::new(31).unwrap());
        assert_eq!((all - top).bits(), 0x7FFF_FFFF);
    }
}
