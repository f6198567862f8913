//! # DICOM-cine library
//!
//! This crate relates the pixel, image and world coordinate systems of the
//! frames in a cardiac cine acquisition and indexes those frames by slice
//! location and cardiac phase.
//!
//! It builds on the dicom-rs ecosystem: frames are read as
//! [`FileDicomObject<InMemDicomObject>`] and their geometry is exposed
//! through the typed [`ImageRecord`] accessors, so the rest of the crate
//! never looks up tags directly. All transforms are 4x4 homogeneous
//! [`nalgebra::Matrix4<f64>`] values computed fresh on every call.
//!
//! # Geometry convention
//!
//! Spacing and orientation are kept apart and no axis is flipped:
//!
//!  - `pixel_to_image = diag(spacing_x, spacing_y, spacing_z or 1, 1)`
//!  - `image_to_world = [row | column | row × column | position]`
//!  - `pixel_to_world = image_to_world · pixel_to_image`
//!
//! The remaining three transforms are exact inverses of these. An inverse
//! of a singular matrix (zero spacing, degenerate orientation) is an error,
//! never a matrix of NaN or infinity.
//!
//! DICOM files are assumed to have the following attributes:
//!   - Single frame images
//!   - All files in a directory belong to the same cine series
//!
//! # Examples
//!
//! ## Indexing a cine directory
//!
//! Read every ".dcm" file of the cine/ directory in name order, group the
//! frames by slice location and trigger time and get the world position of
//! a pixel in the most basal slice.
//!
//! ```no_run
//! # use dicom_cine::{read_cine_dir, geometry::pixel_to_world};
//! # use nalgebra::Point3;
//! let index = read_cine_dir("cine").expect("should have indexed the directory");
//! let location = index.sorted_slice_locations()[0];
//! let (_, frame) = index.slice(location).unwrap().sorted_phases()[0];
//! let world = pixel_to_world(frame)
//!     .expect("should have read the frame geometry")
//!     .transform_point(&Point3::new(64.0, 64.0, 0.0));
//! println!("{world}");
//! ```
//!
//! [`FileDicomObject<InMemDicomObject>`]: https://docs.rs/dicom-object/latest/dicom_object/struct.FileDicomObject.html

pub mod cine_index;
pub mod cine_loader;
pub mod enums;
pub mod geometry;
pub mod pixels;
pub mod record;

pub use cine_index::{CineIndex, SliceBucket};
pub use cine_loader::{CineLoader, CineLoaderError, DicomFileDecoder, RecordDecoder, read_cine_dir};
pub use enums::Space;
pub use geometry::{GeometryError, Orientation, Spacing};
pub use record::ImageRecord;
