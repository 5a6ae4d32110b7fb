use glam::{DMat3, DMat4, DVec2, DVec3};

use crate::{
    error::BrushError,
    utils::{
        bbox::BBox3,
        constants::{EPSILON, VERTEX_EPSILON},
        misc::linear_part,
        simple_calculs::{ConvexShape, Plane3D, Solid3D, SolidVertex},
    },
};

/// Valve 220 texture projection of a face.
///
/// A point `p` gets the texture coordinate `dot(p, u_axis) / u_scale + u_offset`,
/// and the same for v.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAttributes {
    pub texture_name: String,
    pub u_axis: DVec3,
    pub v_axis: DVec3,
    pub u_offset: f64,
    pub v_offset: f64,
    pub rotation: f64,
    pub u_scale: f64,
    pub v_scale: f64,
}

impl FaceAttributes {
    /// Axis aligned projection picked from the face normal.
    pub fn paraxial(texture_name: impl Into<String>, normal: DVec3) -> Self {
        let abs = normal.abs();

        let (u_axis, v_axis) = if abs.z >= abs.x && abs.z >= abs.y {
            (DVec3::X, DVec3::NEG_Y)
        } else if abs.x >= abs.y {
            (DVec3::Y, DVec3::NEG_Z)
        } else {
            (DVec3::X, DVec3::NEG_Z)
        };

        Self {
            texture_name: texture_name.into(),
            u_axis,
            v_axis,
            u_offset: 0.,
            v_offset: 0.,
            rotation: 0.,
            u_scale: 1.,
            v_scale: 1.,
        }
    }

    pub fn uv(&self, point: DVec3) -> DVec2 {
        DVec2::new(
            point.dot(self.u_axis) / self.u_scale + self.u_offset,
            point.dot(self.v_axis) / self.v_scale + self.v_offset,
        )
    }

    // keeps texture coordinates attached to the transformed points
    fn lock(&mut self, inverse_transpose: &DMat3, translation: DVec3) {
        (self.u_axis, self.u_scale, self.u_offset) = lock_axis(
            self.u_axis,
            self.u_scale,
            self.u_offset,
            inverse_transpose,
            translation,
        );
        (self.v_axis, self.v_scale, self.v_offset) = lock_axis(
            self.v_axis,
            self.v_scale,
            self.v_offset,
            inverse_transpose,
            translation,
        );
    }
}

fn lock_axis(
    axis: DVec3,
    scale: f64,
    offset: f64,
    inverse_transpose: &DMat3,
    translation: DVec3,
) -> (DVec3, f64, f64) {
    let moved = *inverse_transpose * axis;
    let length = moved.length();

    if length <= EPSILON || scale.abs() <= EPSILON {
        return (axis, scale, offset);
    }

    (
        moved / length,
        scale / length,
        offset - moved.dot(translation) / scale,
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrushFace {
    points: [DVec3; 3],
    plane: Plane3D,
    pub attributes: FaceAttributes,
    selected: bool,
}

impl BrushFace {
    /// `None` if the points are collinear.
    pub fn new(points: [DVec3; 3], attributes: FaceAttributes) -> Option<Self> {
        let plane = Plane3D::from_three_points(points[0], points[1], points[2])?;

        Some(Self {
            points,
            plane,
            attributes,
            selected: false,
        })
    }

    pub fn points(&self) -> &[DVec3; 3] {
        &self.points
    }

    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Points into the brush.
    pub fn normal(&self) -> DVec3 {
        self.plane.normal
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn select(&mut self) {
        self.selected = true;
    }

    pub fn deselect(&mut self) {
        self.selected = false;
    }

    fn transformed(&self, transformation: &DMat4, texture_lock: bool) -> Option<Self> {
        let linear = linear_part(transformation);
        let mut points = self.points.map(|point| transformation.transform_point3(point));

        // mirroring flips the winding, which would flip the normal
        if linear.determinant() < 0. {
            points.swap(1, 2);
        }

        let mut attributes = self.attributes.clone();

        if texture_lock {
            attributes.lock(
                &linear.inverse().transpose(),
                transformation.w_axis.truncate(),
            );
        }

        Self::new(points, attributes)
    }
}

/// Convex volume bounded by face planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    faces: Vec<BrushFace>,
    vertices: Vec<SolidVertex>,
    bounds: BBox3,
}

impl Brush {
    pub fn new(faces: Vec<BrushFace>) -> Result<Self, BrushError> {
        if faces.len() < 4 {
            return Err(BrushError::TooFewFaces(faces.len()));
        }

        let solid = Self::solid_from_faces(&faces);
        let vertices = solid.vertices();

        if vertices.len() < 4 {
            return Err(BrushError::EmptyVolume);
        }

        // every vertex lying on one plane means the brush is flat
        let flat = solid.faces().iter().any(|plane| {
            vertices
                .iter()
                .all(|vertex| plane.signed_distance(vertex.position).abs() <= VERTEX_EPSILON)
        });

        if flat {
            return Err(BrushError::EmptyVolume);
        }

        let bounds = BBox3::from_points(vertices.iter().map(|vertex| vertex.position))
            .ok_or(BrushError::EmptyVolume)?;

        Ok(Self {
            faces,
            vertices,
            bounds,
        })
    }

    pub fn from_face_points(
        faces: impl IntoIterator<Item = ([DVec3; 3], FaceAttributes)>,
    ) -> Result<Self, BrushError> {
        let faces = faces
            .into_iter()
            .enumerate()
            .map(|(index, (points, attributes))| {
                BrushFace::new(points, attributes).ok_or(BrushError::DegenerateFace(index))
            })
            .collect::<Result<Vec<BrushFace>, BrushError>>()?;

        Self::new(faces)
    }

    /// Axis aligned box with the same texture on every face.
    pub fn cuboid(bounds: &BBox3, texture_name: &str) -> Result<Self, BrushError> {
        let (min, max) = (bounds.min, bounds.max);
        let (x, y, z) = (DVec3::X, DVec3::Y, DVec3::Z);

        // (p1, p2 - p1, p3 - p1) with the cross product pointing inside
        let faces = [
            (min, y, z),
            (max, z, y),
            (min, z, x),
            (max, x, z),
            (min, x, y),
            (max, y, x),
        ];

        Self::from_face_points(faces.into_iter().map(|(p1, a, b)| {
            (
                [p1, p1 + a, p1 + b],
                FaceAttributes::paraxial(texture_name, a.cross(b)),
            )
        }))
    }

    fn solid_from_faces(faces: &[BrushFace]) -> Solid3D {
        faces
            .iter()
            .map(|face| face.plane)
            .collect::<Vec<Plane3D>>()
            .into()
    }

    pub fn faces(&self) -> &[BrushFace] {
        &self.faces
    }

    pub fn face(&self, index: usize) -> Option<&BrushFace> {
        self.faces.get(index)
    }

    pub fn face_mut(&mut self, index: usize) -> Option<&mut BrushFace> {
        self.faces.get_mut(index)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.vertices.iter().map(|vertex| vertex.position)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn bounds(&self) -> BBox3 {
        self.bounds
    }

    pub fn solid(&self) -> Solid3D {
        Self::solid_from_faces(&self.faces)
    }

    pub fn shape(&self) -> ConvexShape {
        ConvexShape::from_solid(&self.solid(), &self.vertices)
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        self.solid().contains_point(point)
    }

    pub fn contains_bounds(&self, bounds: &BBox3) -> bool {
        let solid = self.solid();

        bounds
            .corners()
            .into_iter()
            .all(|corner| solid.contains_point(corner))
    }

    pub fn contains_brush(&self, other: &Brush) -> bool {
        let solid = self.solid();

        self.bounds.contains(&other.bounds)
            && other.vertices().all(|vertex| solid.contains_point(vertex))
    }

    pub fn intersects_bounds(&self, bounds: &BBox3) -> bool {
        self.bounds.intersects(bounds) && self.shape().intersects(&ConvexShape::from_bbox(bounds))
    }

    pub fn intersects_brush(&self, other: &Brush) -> bool {
        self.bounds.intersects(&other.bounds) && self.shape().intersects(&other.shape())
    }

    /// Texture lock keeps texture coordinates attached to the moved faces.
    pub fn transformed(
        &self,
        transformation: &DMat4,
        texture_lock: bool,
    ) -> Result<Brush, BrushError> {
        let linear = linear_part(transformation);

        if !transformation.is_finite() || linear.determinant().abs() <= EPSILON {
            return Err(BrushError::SingularTransformation);
        }

        let faces = self
            .faces
            .iter()
            .enumerate()
            .map(|(index, face)| {
                face.transformed(transformation, texture_lock)
                    .ok_or(BrushError::DegenerateFace(index))
            })
            .collect::<Result<Vec<BrushFace>, BrushError>>()?;

        Self::new(faces)
    }
}
