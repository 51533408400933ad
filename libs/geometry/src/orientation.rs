//! Manhattan orientations.

use serde::{Deserialize, Serialize};

use crate::transform::Rotation;

/// The eight Manhattan orientations by name.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NamedOrientation {
    /// No rotation or reflection.
    #[default]
    R0,
    /// Rotate 90 degrees counter-clockwise.
    R90,
    /// Rotate 180 degrees.
    R180,
    /// Rotate 270 degrees counter-clockwise.
    R270,
    /// Reflect about the x-axis.
    ReflectVert,
    /// Reflect across the line y = x.
    FlipYx,
    /// Reflect about the y-axis.
    ReflectHoriz,
    /// Reflect across the line y = -x.
    FlipMinusYx,
}

impl NamedOrientation {
    /// All eight orientations, rotations first.
    pub const fn all_rectangular() -> [Self; 8] {
        use NamedOrientation::*;
        [
            R0,
            R90,
            R180,
            R270,
            ReflectVert,
            FlipYx,
            ReflectHoriz,
            FlipMinusYx,
        ]
    }
}

/// A reflection about the x-axis followed by a counter-clockwise rotation.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub(crate) reflect_vert: bool,
    pub(crate) angle: Rotation,
}

impl From<NamedOrientation> for Orientation {
    fn from(value: NamedOrientation) -> Self {
        // Rotations, then their reflected counterparts.
        let code = value as u8;
        let angle = match code % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        };
        Self::from_reflect_and_angle(code >= 4, angle)
    }
}

impl Orientation {
    /// Creates an orientation from its reflection and rotation.
    #[inline]
    pub fn from_reflect_and_angle(reflect_vert: bool, angle: Rotation) -> Self {
        Self {
            reflect_vert,
            angle,
        }
    }

    /// The orientation that leaves geometry unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// The orientation obtained by applying `self`, then `o`.
    pub fn apply(self, o: impl Into<Orientation>) -> Self {
        let o = o.into();
        if o.reflect_vert {
            // Reflecting after a rotation by `a` equals rotating by `-a` after reflecting.
            Self::from_reflect_and_angle(!self.reflect_vert, o.angle - self.angle)
        } else {
            Self::from_reflect_and_angle(self.reflect_vert, self.angle + o.angle)
        }
    }

    /// Whether geometry is reflected about the x-axis before rotating.
    #[inline]
    pub fn reflect_vert(&self) -> bool {
        self.reflect_vert
    }

    /// The counter-clockwise rotation.
    #[inline]
    pub fn angle(&self) -> Rotation {
        self.angle
    }

    /// The name of this orientation.
    pub fn named(&self) -> NamedOrientation {
        let quarter = self.angle as usize;
        NamedOrientation::all_rectangular()[quarter + if self.reflect_vert { 4 } else { 0 }]
    }

    /// All eight orientations.
    pub fn all_rectangular() -> [Self; 8] {
        NamedOrientation::all_rectangular().map(Self::from)
    }
}
