//! Homogeneous transforms between pixel, image and world space.
//!
//! Convention: spacing and orientation are kept strictly apart. The
//! pixel-to-image transform is the bare spacing diagonal, the
//! image-to-world transform holds the unscaled direction cosines and the
//! position of the first voxel, and no axis is flipped. Pixel-to-world is
//! their product. Matrices built under a convention that folds spacing
//! into the direction columns and flips Y are not interchangeable with
//! these and must not be mixed with them.

use crate::enums::Space;
use crate::record::ImageRecord;

use dicom::core::Tag;
use dicom::core::value::ConvertValueError;
use nalgebra::{Matrix4, Vector3, Vector4};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Missing attribute {name} {tag}")]
    AttributeNotFound { name: &'static str, tag: Tag },

    #[error("Unreadable attribute {name} {tag}: {source}")]
    InvalidAttribute {
        name: &'static str,
        tag: Tag,
        #[source]
        source: ConvertValueError,
    },

    #[error("{name} has {found} values, expected {expected}")]
    Precondition {
        name: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("The {0} transform is singular")]
    MatrixSingular(&'static str),
}

/// Row and column direction cosines of an image plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub row: Vector3<f64>,
    pub column: Vector3<f64>,
}

impl Orientation {
    pub fn new(row: Vector3<f64>, column: Vector3<f64>) -> Self {
        Self { row, column }
    }

    /// Build from the six values of Image Orientation (Patient).
    pub fn from_slice(values: &[f64]) -> Result<Self, GeometryError> {
        if values.len() != 6 {
            return Err(GeometryError::Precondition {
                name: "Image Orientation (Patient)",
                expected: "6",
                found: values.len(),
            });
        }
        Ok(Self {
            row: Vector3::new(values[0], values[1], values[2]),
            column: Vector3::new(values[3], values[4], values[5]),
        })
    }

    /// Row × column, not re-normalized. Unit length only if both cosines
    /// are orthonormal.
    pub fn slice_normal(&self) -> Vector3<f64> {
        self.row.cross(&self.column)
    }
}

/// Voxel size in millimetres along x, y and z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing([f64; 3]);

impl Spacing {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// Build from up to three values. Unspecified trailing directions get
    /// 1 mm.
    pub fn from_slice(values: &[f64]) -> Result<Self, GeometryError> {
        if values.len() > 3 {
            return Err(GeometryError::Precondition {
                name: "Pixel Spacing",
                expected: "at most 3",
                found: values.len(),
            });
        }
        let mut spacing = [1.0; 3];
        spacing[..values.len()].copy_from_slice(values);
        Ok(Self(spacing))
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    /// `diag(x, y, z, 1)`
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let [x, y, z] = self.0;
        Matrix4::from_diagonal(&Vector4::new(x, y, z, 1.0))
    }
}

/// Transform that sends pixel coordinates to image coordinates.
pub fn pixel_to_image<R: ImageRecord + ?Sized>(d: &R) -> Result<Matrix4<f64>, GeometryError> {
    Ok(d.spacing()?.to_homogeneous())
}

/// Transform that sends image coordinates to pixel coordinates.
pub fn image_to_pixel<R: ImageRecord + ?Sized>(d: &R) -> Result<Matrix4<f64>, GeometryError> {
    invert(pixel_to_image(d)?, "pixel-to-image")
}

/// Transform that sends image coordinates to world coordinates.
///
/// Columns are the row cosine, the column cosine, the slice normal and
/// the position of the first voxel.
pub fn image_to_world<R: ImageRecord + ?Sized>(d: &R) -> Result<Matrix4<f64>, GeometryError> {
    let o = d.orientation()?;
    let p = d.position()?;
    let (r, c, n) = (o.row, o.column, o.slice_normal());

    #[rustfmt::skip]
    let t = Matrix4::new(
        r.x, c.x, n.x, p.x,
        r.y, c.y, n.y, p.y,
        r.z, c.z, n.z, p.z,
        0.0, 0.0, 0.0, 1.0,
    );
    Ok(t)
}

/// Transform that sends world coordinates to image coordinates.
pub fn world_to_image<R: ImageRecord + ?Sized>(d: &R) -> Result<Matrix4<f64>, GeometryError> {
    invert(image_to_world(d)?, "image-to-world")
}

/// Transform that sends pixel coordinates to world coordinates.
pub fn pixel_to_world<R: ImageRecord + ?Sized>(d: &R) -> Result<Matrix4<f64>, GeometryError> {
    Ok(image_to_world(d)? * pixel_to_image(d)?)
}

/// Transform that sends world coordinates to pixel coordinates.
pub fn world_to_pixel<R: ImageRecord + ?Sized>(d: &R) -> Result<Matrix4<f64>, GeometryError> {
    invert(pixel_to_world(d)?, "pixel-to-world")
}

/// Transform between any two coordinate spaces of `d`.
pub fn transform<R: ImageRecord + ?Sized>(
    d: &R,
    from: Space,
    to: Space,
) -> Result<Matrix4<f64>, GeometryError> {
    match (from, to) {
        (Space::Pixel, Space::Image) => pixel_to_image(d),
        (Space::Image, Space::Pixel) => image_to_pixel(d),
        (Space::Image, Space::World) => image_to_world(d),
        (Space::World, Space::Image) => world_to_image(d),
        (Space::Pixel, Space::World) => pixel_to_world(d),
        (Space::World, Space::Pixel) => world_to_pixel(d),
        (Space::Pixel, Space::Pixel)
        | (Space::Image, Space::Image)
        | (Space::World, Space::World) => Ok(Matrix4::identity()),
    }
}

/// Coordinate of a world-space `point` along the slice normal of `d`.
pub fn slice_direction<R: ImageRecord + ?Sized>(
    d: &R,
    point: &Vector3<f64>,
) -> Result<f64, GeometryError> {
    Ok(point.dot(&d.orientation()?.slice_normal()))
}

/// Offset of the image plane of `d` along its own slice normal. Used as the
/// slice location key when indexing a cine series.
pub fn self_slice_direction<R: ImageRecord + ?Sized>(d: &R) -> Result<f64, GeometryError> {
    slice_direction(d, &d.position()?)
}

fn invert(m: Matrix4<f64>, kind: &'static str) -> Result<Matrix4<f64>, GeometryError> {
    m.try_inverse()
        .filter(|inv| inv.iter().all(|v| v.is_finite()))
        .ok_or(GeometryError::MatrixSingular(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_pads_missing_directions_with_one() {
        let s = Spacing::from_slice(&[0.7, 0.8]).unwrap();
        assert_eq!(s.as_array(), [0.7, 0.8, 1.0]);

        let s = Spacing::from_slice(&[]).unwrap();
        assert_eq!(s.as_array(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn spacing_rejects_four_values() {
        let err = Spacing::from_slice(&[1.0, 1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, GeometryError::Precondition { found: 4, .. }));
    }

    #[test]
    fn orientation_requires_six_values() {
        let err = Orientation::from_slice(&[1.0, 0.0, 0.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, GeometryError::Precondition { found: 5, .. }));
    }

    #[test]
    fn slice_normal_is_not_normalized() {
        let o = Orientation::new(Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 3.0, 0.0));
        assert_eq!(o.slice_normal(), Vector3::new(0.0, 0.0, 6.0));
    }

    #[test]
    fn invert_rejects_zero_spacing() {
        let m = Spacing::new(0.0, 1.0, 1.0).to_homogeneous();
        assert!(matches!(
            invert(m, "pixel-to-image"),
            Err(GeometryError::MatrixSingular("pixel-to-image"))
        ));
    }
}
