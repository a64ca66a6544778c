//! Image acquisition.

use crate::{common::*, record::ImageSource};
use image::{DynamicImage, ImageDecoder as _};

/// The channel layout of decoded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "BGR")]
    Bgr,
    /// Single-channel luminance.
    #[serde(rename = "L")]
    L,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self::Rgb
    }
}

/// Resolves image sources into pixel arrays.
pub trait ImageReader
where
    Self: fmt::Debug + Send + Sync,
{
    /// Read an image in `[h, w, c]` layout in the given color format.
    fn read_image(&self, source: &ImageSource, format: ImageFormat) -> Result<Image>;

    /// Read a single-channel label map.
    fn read_label_map(&self, path: &Path) -> Result<LabelMap>;
}

/// Reads images from the local file system.
#[derive(Debug, Clone, Default)]
pub struct DiskImageReader;

impl ImageReader for DiskImageReader {
    fn read_image(&self, source: &ImageSource, format: ImageFormat) -> Result<Image> {
        match source {
            ImageSource::File(path) => {
                let image = decode_file(path)
                    .with_context(|| format!("failed to decode image '{}'", path.display()))?;
                convert_image(&image, format)
            }
            ImageSource::Memory(image) => convert_image(image, format),
        }
    }

    fn read_label_map(&self, path: &Path) -> Result<LabelMap> {
        let image = decode_file(path)
            .with_context(|| format!("failed to decode label map '{}'", path.display()))?
            .into_luma8();
        let (w, h) = image.dimensions();
        let map = Array2::from_shape_vec((h as usize, w as usize), image.into_raw())?;
        Ok(map)
    }
}

/// Decode an image file and rotate it upright by its EXIF orientation.
pub fn decode_file(path: &Path) -> Result<DynamicImage> {
    let mut decoder = image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Convert a decoded image to a `[h, w, c]` array in the given format.
pub fn convert_image(image: &DynamicImage, format: ImageFormat) -> Result<Image> {
    let array = match format {
        ImageFormat::Rgb | ImageFormat::Bgr => {
            let rgb = image.to_rgb8();
            let (w, h) = rgb.dimensions();
            let array = Array3::from_shape_vec((h as usize, w as usize, 3), rgb.into_raw())?;
            if format == ImageFormat::Bgr {
                array.slice(ndarray::s![.., .., ..;-1]).to_owned()
            } else {
                array
            }
        }
        ImageFormat::L => {
            let luma = image.to_luma8();
            let (w, h) = luma.dimensions();
            Array3::from_shape_vec((h as usize, w as usize, 1), luma.into_raw())?
        }
    };
    Ok(array)
}

/// Check the decoded image size against the size declared by the record.
///
/// Missing declarations are not checked.
pub fn check_image_size(
    image: &Image,
    height: Option<usize>,
    width: Option<usize>,
    name: &str,
) -> Result<()> {
    let (img_h, img_w, _) = image.dim();

    let mismatch = matches!(height, Some(height) if height != img_h)
        || matches!(width, Some(width) if width != img_w);
    ensure!(
        !mismatch,
        "mismatched image size for '{}': got {}x{} (h x w), expect {}x{}",
        name,
        img_h,
        img_w,
        height.map_or_else(|| "?".to_string(), |h| h.to_string()),
        width.map_or_else(|| "?".to_string(), |w| w.to_string()),
    );
    Ok(())
}
