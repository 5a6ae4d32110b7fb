use glam::DVec3;

use super::{
    bbox::BBox3,
    constants::{EPSILON, VERTEX_EPSILON},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOfPoint {
    In,
    Out,
    On,
}

/// Represented as an equation: normal . p = distance
///
/// The normal is unit length and points into the solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    pub normal: DVec3,
    pub distance: f64,
}

impl Plane3D {
    /// `None` if the points are collinear.
    pub fn from_three_points(p1: DVec3, p2: DVec3, p3: DVec3) -> Option<Self> {
        let normal = (p2 - p1).cross(p3 - p1);

        if !normal.is_finite() || normal.length() <= EPSILON {
            return None;
        }

        let normal = normal.normalize();

        Some(Self {
            normal,
            distance: normal.dot(p1),
        })
    }

    pub fn intersect_with_two_planes_fast(&self, plane2: &Self, plane3: &Self) -> Option<DVec3> {
        let denom = self.normal.dot(plane2.normal.cross(plane3.normal));

        if denom.abs() <= EPSILON {
            return None;
        }

        Some(
            (plane2.normal.cross(plane3.normal) * self.distance
                + plane3.normal.cross(self.normal) * plane2.distance
                + self.normal.cross(plane2.normal) * plane3.distance)
                / denom,
        )
    }

    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.distance
    }

    pub fn side_of_point(&self, point: DVec3) -> SideOfPoint {
        let distance_check = self.signed_distance(point);

        if distance_check < -EPSILON {
            SideOfPoint::Out
        } else if distance_check > EPSILON {
            SideOfPoint::In
        } else {
            SideOfPoint::On
        }
    }
}

/// A vertex of a [`Solid3D`] with the indices of the planes it lies on.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidVertex {
    pub position: DVec3,
    pub planes: Vec<usize>,
}

/// Convex volume bounded by planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid3D(Vec<Plane3D>);

impl Solid3D {
    pub fn contains_point(&self, point: DVec3) -> bool {
        self.0
            .iter()
            .all(|plane| plane.side_of_point(point) != SideOfPoint::Out)
    }

    pub fn face_count(&self) -> usize {
        self.0.len()
    }

    pub fn faces(&self) -> &[Plane3D] {
        &self.0
    }

    /// Intersects every three planes and keeps the points inside the solid.
    pub fn vertices(&self) -> Vec<SolidVertex> {
        let plane_count = self.face_count();
        let mut res: Vec<SolidVertex> = vec![];

        for i in 0..plane_count {
            for j in (i + 1)..plane_count {
                for k in (j + 1)..plane_count {
                    let Some(new_vertex) =
                        self.0[i].intersect_with_two_planes_fast(&self.0[j], &self.0[k])
                    else {
                        continue;
                    };

                    if !self.contains_point(new_vertex) {
                        continue;
                    }

                    match res
                        .iter_mut()
                        .find(|vertex| vertex.position.distance(new_vertex) <= VERTEX_EPSILON)
                    {
                        Some(vertex) => {
                            for plane in [i, j, k] {
                                if !vertex.planes.contains(&plane) {
                                    vertex.planes.push(plane);
                                }
                            }
                        }
                        None => res.push(SolidVertex {
                            position: new_vertex,
                            planes: vec![i, j, k],
                        }),
                    }
                }
            }
        }

        res
    }
}

impl From<Vec<Plane3D>> for Solid3D {
    fn from(value: Vec<Plane3D>) -> Self {
        Self(value)
    }
}

/// What the separating axis test needs to know about a convex object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConvexShape {
    pub vertices: Vec<DVec3>,
    pub face_normals: Vec<DVec3>,
    pub edge_directions: Vec<DVec3>,
}

impl ConvexShape {
    pub fn from_solid(solid: &Solid3D, vertices: &[SolidVertex]) -> Self {
        let mut edge_directions = vec![];

        // two vertices sharing two planes span an edge
        for (index, a) in vertices.iter().enumerate() {
            for b in vertices.iter().skip(index + 1) {
                let shared = a.planes.iter().filter(|p| b.planes.contains(p)).count();

                if shared >= 2 {
                    let direction = b.position - a.position;

                    if direction.length() > EPSILON {
                        edge_directions.push(direction.normalize());
                    }
                }
            }
        }

        Self {
            vertices: vertices.iter().map(|vertex| vertex.position).collect(),
            face_normals: solid.faces().iter().map(|plane| plane.normal).collect(),
            edge_directions,
        }
    }

    pub fn from_bbox(bounds: &BBox3) -> Self {
        Self {
            vertices: bounds.corners().to_vec(),
            face_normals: vec![DVec3::X, DVec3::Y, DVec3::Z],
            edge_directions: vec![DVec3::X, DVec3::Y, DVec3::Z],
        }
    }

    fn project(&self, axis: DVec3) -> (f64, f64) {
        self.vertices
            .iter()
            .map(|vertex| vertex.dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), d| {
                (min.min(d), max.max(d))
            })
    }

    fn separated_on(&self, other: &Self, axis: DVec3) -> bool {
        let (a_min, a_max) = self.project(axis);
        let (b_min, b_max) = other.project(axis);

        a_max < b_min - EPSILON || b_max < a_min - EPSILON
    }

    /// Separating axis test. Shapes that only touch intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.vertices.is_empty() || other.vertices.is_empty() {
            return false;
        }

        let face_axes = self.face_normals.iter().chain(other.face_normals.iter());

        if face_axes.copied().any(|axis| self.separated_on(other, axis)) {
            return false;
        }

        for a in &self.edge_directions {
            for b in &other.edge_directions {
                let axis = a.cross(*b);

                if axis.length() <= EPSILON {
                    continue;
                }

                if self.separated_on(other, axis.normalize()) {
                    return false;
                }
            }
        }

        true
    }
}
