//! Pixel-level operations on `[h, w, c]` images and `[h, w]` label maps.

use crate::common::*;
use image::{imageops::FilterType, GrayImage};

/// An image in `[h, w, c]` layout.
pub type Image = Array3<u8>;

/// A single-channel label map in `[h, w]` layout.
pub type LabelMap = Array2<u8>;

/// Resampling method for resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interp {
    Nearest,
    Bilinear,
}

impl Default for Interp {
    fn default() -> Self {
        Self::Bilinear
    }
}

impl From<Interp> for FilterType {
    fn from(interp: Interp) -> Self {
        match interp {
            Interp::Nearest => FilterType::Nearest,
            Interp::Bilinear => FilterType::Triangle,
        }
    }
}

pub fn image_size(image: &Image) -> HW<usize> {
    let (h, w, _) = image.dim();
    HW::from_hw([h, w])
}

pub fn resize_label_map(map: &LabelMap, new_h: usize, new_w: usize, interp: Interp) -> Result<LabelMap> {
    let (h, w) = map.dim();
    let values: Vec<u8> = map.iter().copied().collect();
    let buffer = GrayImage::from_raw(w as u32, h as u32, values)
        .ok_or_else(|| format_err!("cannot wrap a {}x{} map as an image buffer", h, w))?;
    let resized = image::imageops::resize(&buffer, new_w as u32, new_h as u32, interp.into());
    let resized = Array2::from_shape_vec((new_h, new_w), resized.into_raw())?;
    Ok(resized)
}

/// Resize each channel independently.
pub fn resize_image(image: &Image, new_h: usize, new_w: usize, interp: Interp) -> Result<Image> {
    let channels: Vec<LabelMap> = image
        .axis_iter(Axis(2))
        .map(|channel| resize_label_map(&channel.to_owned(), new_h, new_w, interp))
        .try_collect()?;
    let views: Vec<_> = channels.iter().map(|channel| channel.view()).collect();
    let resized = ndarray::stack(Axis(2), &views)?;
    Ok(resized)
}

pub fn crop_image(image: &Image, x0: usize, y0: usize, w: usize, h: usize) -> Result<Image> {
    let (img_h, img_w, _) = image.dim();
    ensure!(
        x0 + w <= img_w && y0 + h <= img_h,
        "crop window ({}, {}, {}, {}) exceeds image size {}x{}",
        x0,
        y0,
        w,
        h,
        img_h,
        img_w
    );
    Ok(image.slice(s![y0..(y0 + h), x0..(x0 + w), ..]).to_owned())
}

pub fn crop_label_map(map: &LabelMap, x0: usize, y0: usize, w: usize, h: usize) -> Result<LabelMap> {
    let (map_h, map_w) = map.dim();
    ensure!(
        x0 + w <= map_w && y0 + h <= map_h,
        "crop window ({}, {}, {}, {}) exceeds map size {}x{}",
        x0,
        y0,
        w,
        h,
        map_h,
        map_w
    );
    Ok(map.slice(s![y0..(y0 + h), x0..(x0 + w)]).to_owned())
}

pub fn bitmask_to_label_map(mask: &BitMask) -> LabelMap {
    mask.mapv(|val| val as u8)
}

pub fn label_map_to_bitmask(map: &LabelMap) -> BitMask {
    map.mapv(|val| val != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_channels() -> Result<()> {
        let image = Image::from_elem((4, 6, 3), 7);
        let resized = resize_image(&image, 2, 3, Interp::Bilinear)?;
        assert_eq!(resized.dim(), (2, 3, 3));
        assert!(resized.iter().all(|&val| val == 7));
        Ok(())
    }

    #[test]
    fn nearest_resize_keeps_labels() -> Result<()> {
        let mut map = LabelMap::zeros((2, 2));
        map[[0, 1]] = 5;
        let resized = resize_label_map(&map, 4, 4, Interp::Nearest)?;
        assert_eq!(resized[[0, 3]], 5);
        assert_eq!(resized[[3, 0]], 0);
        assert!(resized.iter().all(|&val| val == 0 || val == 5));
        Ok(())
    }

    #[test]
    fn crop_out_of_range_fails() {
        let image = Image::zeros((4, 4, 3));
        assert!(crop_image(&image, 2, 2, 3, 1).is_err());
        assert_eq!(crop_image(&image, 1, 1, 2, 3).unwrap().dim(), (3, 2, 3));
    }
}
