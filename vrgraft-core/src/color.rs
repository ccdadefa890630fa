use crate::util::{FiniteF32, FiniteF32Error};

/// A straight-alpha RGBA color, as used for viewpoint backgrounds and clear colors.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color([FiniteF32; 4]);
impl Color {
    /// Fully transparent black. Capture surfaces are cleared to this.
    pub const CLEAR: Self = Self([FiniteF32::ZERO; 4]);
    pub const BLACK: Self = Self([
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ONE,
    ]);
    pub const WHITE: Self = Self([FiniteF32::ONE; 4]);
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Result<Self, FiniteF32Error> {
        Ok(Self([
            FiniteF32::new(r)?,
            FiniteF32::new(g)?,
            FiniteF32::new(b)?,
            FiniteF32::new(a)?,
        ]))
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        self.0.map(FiniteF32::get)
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
impl TryFrom<[f32; 4]> for Color {
    type Error = FiniteF32Error;
    fn try_from([r, g, b, a]: [f32; 4]) -> Result<Self, Self::Error> {
        Self::new(r, g, b, a)
    }
}
impl From<Color> for [f32; 4] {
    fn from(value: Color) -> Self {
        value.as_array()
    }
}

#[cfg(test)]
mod test {
    use super::Color;
    #[test]
    fn rejects_nan() {
        assert!(Color::new(f32::NAN, 0.0, 0.0, 1.0).is_err());
        assert!(Color::try_from([0.0, f32::INFINITY, 0.0, 1.0]).is_err());
    }
    #[test]
    fn deserialize_array() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            color: Color,
        }
        let parsed: Wrapper = toml::from_str("color = [0.25, 0.5, 1.0, 1.0]").unwrap();
        assert_eq!(parsed.color.as_array(), [0.25, 0.5, 1.0, 1.0]);
    }
}
