use crate::geometry::{GeometryError, Orientation, Spacing};

use dicom::core::Tag;
use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom_dictionary_std::tags;
use nalgebra::Vector3;

/// A DICOM attribute read by the accessors, with a readable name for
/// error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// Dictionary name, used in error messages.
    pub name: &'static str,
    pub tag: Tag,
}

/// Trigger Time (0018,1060).
pub const TRIGGER_TIME: Attribute = Attribute {
    name: "Trigger Time",
    tag: tags::TRIGGER_TIME,
};

/// Private respiratory signal element (0099,0099).
pub const RESP_SIGNAL: Attribute = Attribute {
    name: "Respiratory Signal",
    tag: Tag(0x0099, 0x0099),
};

/// Image Orientation (Patient) (0020,0037).
pub const IMAGE_ORIENTATION: Attribute = Attribute {
    name: "Image Orientation (Patient)",
    tag: tags::IMAGE_ORIENTATION_PATIENT,
};

/// Image Position (Patient) (0020,0032).
pub const IMAGE_POSITION: Attribute = Attribute {
    name: "Image Position (Patient)",
    tag: tags::IMAGE_POSITION_PATIENT,
};

/// Pixel Spacing (0028,0030).
pub const PIXEL_SPACING: Attribute = Attribute {
    name: "Pixel Spacing",
    tag: tags::PIXEL_SPACING,
};

/// Geometric and temporal attributes of a single cine frame.
///
/// Every accessor fails if its attribute is absent or cannot be read as
/// floating point. There are no defaults.
pub trait ImageRecord {
    /// Milliseconds since the start of the cardiac cycle.
    fn trigger_time(&self) -> Result<f64, GeometryError>;

    /// Auxiliary respiratory value from the private (0099,0099) element.
    fn resp_signal(&self) -> Result<f64, GeometryError>;

    fn orientation(&self) -> Result<Orientation, GeometryError>;

    /// World coordinate of the first voxel.
    fn position(&self) -> Result<Vector3<f64>, GeometryError>;

    fn spacing(&self) -> Result<Spacing, GeometryError>;
}

impl ImageRecord for InMemDicomObject {
    fn trigger_time(&self) -> Result<f64, GeometryError> {
        read_float(self, TRIGGER_TIME)
    }

    fn resp_signal(&self) -> Result<f64, GeometryError> {
        read_float(self, RESP_SIGNAL)
    }

    fn orientation(&self) -> Result<Orientation, GeometryError> {
        Orientation::from_slice(&read_floats(self, IMAGE_ORIENTATION)?)
    }

    fn position(&self) -> Result<Vector3<f64>, GeometryError> {
        let values = read_floats(self, IMAGE_POSITION)?;
        match values.as_slice() {
            &[x, y, z] => Ok(Vector3::new(x, y, z)),
            _ => Err(GeometryError::Precondition {
                name: IMAGE_POSITION.name,
                expected: "3",
                found: values.len(),
            }),
        }
    }

    fn spacing(&self) -> Result<Spacing, GeometryError> {
        Spacing::from_slice(&read_floats(self, PIXEL_SPACING)?)
    }
}

impl ImageRecord for FileDicomObject<InMemDicomObject> {
    fn trigger_time(&self) -> Result<f64, GeometryError> {
        (**self).trigger_time()
    }

    fn resp_signal(&self) -> Result<f64, GeometryError> {
        (**self).resp_signal()
    }

    fn orientation(&self) -> Result<Orientation, GeometryError> {
        (**self).orientation()
    }

    fn position(&self) -> Result<Vector3<f64>, GeometryError> {
        (**self).position()
    }

    fn spacing(&self) -> Result<Spacing, GeometryError> {
        (**self).spacing()
    }
}

fn read_float(obj: &InMemDicomObject, attr: Attribute) -> Result<f64, GeometryError> {
    obj.element(attr.tag)
        .map_err(|_| GeometryError::AttributeNotFound {
            name: attr.name,
            tag: attr.tag,
        })?
        .to_float64()
        .map_err(|source| GeometryError::InvalidAttribute {
            name: attr.name,
            tag: attr.tag,
            source,
        })
}

fn read_floats(obj: &InMemDicomObject, attr: Attribute) -> Result<Vec<f64>, GeometryError> {
    obj.element(attr.tag)
        .map_err(|_| GeometryError::AttributeNotFound {
            name: attr.name,
            tag: attr.tag,
        })?
        .to_multi_float64()
        .map_err(|source| GeometryError::InvalidAttribute {
            name: attr.name,
            tag: attr.tag,
            source,
        })
}
