use glam::{DMat4, DVec3};

use super::constants::EPSILON;

/// Axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox3 {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for BBox3 {
    fn default() -> Self {
        Self {
            min: DVec3::ZERO,
            max: DVec3::ZERO,
        }
    }
}

impl BBox3 {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Cube centered on the origin.
    pub fn cube(half_size: f64) -> Self {
        Self {
            min: DVec3::splat(-half_size),
            max: DVec3::splat(half_size),
        }
    }

    pub fn from_center(center: DVec3, half_extents: DVec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut builder = BBox3Builder::new();
        points.into_iter().for_each(|point| builder.add_point(point));
        builder.bounds()
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) / 2.
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        (point - self.min).cmpge(DVec3::splat(-EPSILON)).all()
            && (self.max - point).cmpge(DVec3::splat(-EPSILON)).all()
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Touching boxes intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        (other.max - self.min).cmpge(DVec3::splat(-EPSILON)).all()
            && (self.max - other.min).cmpge(DVec3::splat(-EPSILON)).all()
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (min, max) = (self.min, self.max);

        [
            DVec3::new(min.x, min.y, min.z),
            DVec3::new(min.x, min.y, max.z),
            DVec3::new(min.x, max.y, min.z),
            DVec3::new(min.x, max.y, max.z),
            DVec3::new(max.x, min.y, min.z),
            DVec3::new(max.x, min.y, max.z),
            DVec3::new(max.x, max.y, min.z),
            DVec3::new(max.x, max.y, max.z),
        ]
    }

    /// Bounds of the transformed corners.
    pub fn transform(&self, transformation: &DMat4) -> Self {
        let mut builder = BBox3Builder::new();

        self.corners()
            .into_iter()
            .for_each(|corner| builder.add_point(transformation.transform_point3(corner)));

        builder.bounds().unwrap_or(*self)
    }
}

/// Accumulates bounds. Starts out empty so that the first addition is taken as is.
#[derive(Debug, Clone, Default)]
pub struct BBox3Builder {
    bounds: Option<BBox3>,
}

impl BBox3Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bounds: BBox3) {
        self.bounds = Some(match self.bounds {
            Some(current) => current.merge(&bounds),
            None => bounds,
        });
    }

    pub fn add_point(&mut self, point: DVec3) {
        self.add(BBox3::new(point, point));
    }

    pub fn initialized(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Option<BBox3> {
        self.bounds
    }
}
