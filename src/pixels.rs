use dicom::{
    object::{FileDicomObject, InMemDicomObject},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use ndarray::{Array2, s};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixelError {
    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

/// Decode the first frame of `dicom_object` into a (rows, columns) array.
///
/// The first VOI LUT of the object is applied. Multi-frame objects are not
/// supported; only frame 0 is returned.
pub fn frame_pixels(
    dicom_object: &FileDicomObject<InMemDicomObject>,
) -> Result<Array2<u16>, PixelError> {
    let pixel_data = dicom_object.decode_pixel_data()?;
    let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
    let frames = pixel_data.to_ndarray_with_options::<u16>(&options)?;
    Ok(frames.slice_move(s![0, .., .., 0]))
}
