//! Axis-aligned bounding boxes

use glam::Vec3;

/// Axis-aligned bounding box.
///
/// Starts from inverted infinite sentinels so the fold of zero points stays
/// empty (`min > max`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Box containing nothing
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Smallest box containing every point
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |aabb, p| aabb.grow(p))
    }

    /// Extend to contain a point
    pub fn grow(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Componentwise union of two boxes; empty boxes contribute nothing
    pub fn union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// (min, max) as written to the file; empty boxes become zeros
    pub fn to_wire(&self) -> ([f32; 3], [f32; 3]) {
        if self.is_empty() {
            ([0.0; 3], [0.0; 3])
        } else {
            (self.min.to_array(), self.max.to_array())
        }
    }
}
