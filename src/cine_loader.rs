use crate::cine_index::CineIndex;
use crate::geometry::GeometryError;
use crate::record::ImageRecord;

use dicom::object::{FileDicomObject, InMemDicomObject, open_file};
use log::{debug, trace};
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type DecodeError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CineLoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("Invalid geometry in {}: {source}", path.display())]
    Geometry {
        path: PathBuf,
        #[source]
        source: GeometryError,
    },
}

/// Turns a file into an image record.
pub trait RecordDecoder {
    type Record: ImageRecord;

    fn decode(&self, path: &Path) -> Result<Self::Record, DecodeError>;
}

/// Reads files with dicom-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomFileDecoder;

impl RecordDecoder for DicomFileDecoder {
    type Record = FileDicomObject<InMemDicomObject>;

    fn decode(&self, path: &Path) -> Result<Self::Record, DecodeError> {
        Ok(open_file(path)?)
    }
}

/// Indexes a directory holding one cine series.
///
/// Every file with the configured extension is assumed to belong to the
/// same series; nothing is filtered by series, acquisition or modality.
#[derive(Debug, Clone)]
pub struct CineLoader<D = DicomFileDecoder> {
    decoder: D,
    extension: String,
}

impl Default for CineLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CineLoader {
    pub fn new() -> Self {
        Self::with_decoder(DicomFileDecoder)
    }
}

impl<D: RecordDecoder> CineLoader<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self {
            decoder,
            extension: "dcm".to_owned(),
        }
    }

    /// Extension of the files to index, without the dot. Matched
    /// case-sensitively.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// List matching files in `dir`, sorted by name.
    ///
    /// Hidden files and subdirectories are skipped. Symlinks are followed;
    /// a matching link whose target cannot be read is an IO error.
    pub fn list_files(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, CineLoaderError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if self.matches(&path) && fs::metadata(&path)?.is_file() {
                paths.push(path);
            } else {
                trace!("Skipping {}", path.display());
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Decode every matching file in `dir` in name order and index it by
    /// slice location and trigger time.
    ///
    /// The first file that fails to decode, or whose geometry cannot be
    /// read, aborts the whole read.
    pub fn read_cine_dir(
        &self,
        dir: impl AsRef<Path>,
    ) -> Result<CineIndex<D::Record>, CineLoaderError> {
        let paths = self.list_files(dir.as_ref())?;
        debug!(
            "Indexing {} files from {}",
            paths.len(),
            dir.as_ref().display()
        );
        self.index_files(&paths)
    }

    /// Decode and index `paths` in the given order.
    pub fn index_files(
        &self,
        paths: &[impl AsRef<Path>],
    ) -> Result<CineIndex<D::Record>, CineLoaderError> {
        let mut index = CineIndex::new();
        for path in paths {
            let path = path.as_ref();
            let record = self
                .decoder
                .decode(path)
                .map_err(|source| CineLoaderError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;
            index
                .insert_record(record)
                .map_err(|source| CineLoaderError::Geometry {
                    path: path.to_path_buf(),
                    source,
                })?;
            debug!("Indexed {}", path.display());
        }
        Ok(index)
    }

    fn matches(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.starts_with('.'));
        !hidden
            && path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext == self.extension)
    }
}

/// Index the `.dcm` files in `dir` with the default loader.
pub fn read_cine_dir(
    dir: impl AsRef<Path>,
) -> Result<CineIndex<FileDicomObject<InMemDicomObject>>, CineLoaderError> {
    CineLoader::new().read_cine_dir(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_extension_exactly() {
        let loader = CineLoader::new();
        assert!(loader.matches(Path::new("/cine/IM_0001.dcm")));
        assert!(!loader.matches(Path::new("/cine/IM_0001.DCM")));
        assert!(!loader.matches(Path::new("/cine/IM_0001.dcm.bak")));
        assert!(!loader.matches(Path::new("/cine/.IM_0001.dcm")));
        assert!(!loader.matches(Path::new("/cine/DICOMDIR")));

        let loader = CineLoader::new().extension("ima");
        assert!(loader.matches(Path::new("/cine/IM_0001.ima")));
        assert!(!loader.matches(Path::new("/cine/IM_0001.dcm")));
    }
}
