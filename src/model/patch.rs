use glam::DMat4;
use map::PatchPoint;

use crate::{error::PatchError, utils::bbox::BBox3};

/// Bezier patch as written by `patchDef2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub texture_name: String,
    row_count: usize,
    column_count: usize,
    /// Row major.
    control_points: Vec<PatchPoint>,
}

impl Patch {
    pub fn new(
        texture_name: impl Into<String>,
        row_count: usize,
        column_count: usize,
        control_points: Vec<PatchPoint>,
    ) -> Result<Self, PatchError> {
        let valid_count = |count: usize| count >= 3 && count % 2 == 1;

        if !valid_count(row_count) || !valid_count(column_count) {
            return Err(PatchError::InvalidDimensions {
                rows: row_count,
                columns: column_count,
            });
        }

        if control_points.len() != row_count * column_count {
            return Err(PatchError::PointCount {
                expected: row_count * column_count,
                got: control_points.len(),
            });
        }

        if control_points
            .iter()
            .any(|point| !point.position.is_finite() || !point.uv.is_finite())
        {
            return Err(PatchError::NonFinite);
        }

        Ok(Self {
            texture_name: texture_name.into(),
            row_count,
            column_count,
            control_points,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn control_points(&self) -> &[PatchPoint] {
        &self.control_points
    }

    pub fn control_point(&self, row: usize, column: usize) -> Option<&PatchPoint> {
        if column >= self.column_count {
            return None;
        }

        self.control_points.get(row * self.column_count + column)
    }

    pub fn bounds(&self) -> Option<BBox3> {
        BBox3::from_points(self.control_points.iter().map(|point| point.position))
    }

    /// Texture coordinates stay with their control points.
    pub fn transformed(&self, transformation: &DMat4) -> Result<Patch, PatchError> {
        let control_points = self
            .control_points
            .iter()
            .map(|point| PatchPoint {
                position: transformation.transform_point3(point.position),
                uv: point.uv,
            })
            .collect();

        Self::new(
            self.texture_name.clone(),
            self.row_count,
            self.column_count,
            control_points,
        )
    }
}

#[cfg(test)]
mod test {
    use glam::{DVec2, DVec3};

    use super::*;

    fn grid(rows: usize, columns: usize) -> Vec<PatchPoint> {
        (0..rows)
            .flat_map(|row| {
                (0..columns).map(move |column| PatchPoint {
                    position: DVec3::new(column as f64 * 16., row as f64 * 16., 0.),
                    uv: DVec2::new(column as f64, row as f64),
                })
            })
            .collect()
    }

    #[test]
    fn dimensions_must_be_odd() {
        assert_eq!(
            Patch::new("sky", 4, 3, grid(4, 3)),
            Err(PatchError::InvalidDimensions {
                rows: 4,
                columns: 3
            })
        );
        assert_eq!(
            Patch::new("sky", 3, 3, grid(3, 5)),
            Err(PatchError::PointCount {
                expected: 9,
                got: 15
            })
        );
    }

    #[test]
    fn transform_moves_points() {
        let patch = Patch::new("sky", 3, 5, grid(3, 5)).unwrap();
        let moved = patch
            .transformed(&DMat4::from_translation(DVec3::new(0., 0., 32.)))
            .unwrap();

        assert_eq!(
            moved.bounds(),
            Some(BBox3::new(DVec3::new(0., 0., 32.), DVec3::new(64., 32., 32.)))
        );
        assert_eq!(moved.control_point(2, 4).unwrap().uv, DVec2::new(4., 2.));
        assert!(moved.control_point(0, 5).is_none());
    }

    #[test]
    fn non_finite_transform_fails() {
        let patch = Patch::new("sky", 3, 3, grid(3, 3)).unwrap();
        let transformation = DMat4::from_scale(DVec3::splat(f64::INFINITY));

        assert_eq!(patch.transformed(&transformation), Err(PatchError::NonFinite));
    }
}
