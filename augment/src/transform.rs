//! Concrete transforms sampled by augmentations.

use crate::{
    common::*,
    image_ops::{self, Image, Interp, LabelMap},
};
use label::polygon;

/// A deterministic transform that can be replayed on the image, the
/// segmentation map and every annotation of a sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    NoOp,
    /// Resize from `h x w` to `new_h x new_w`.
    Resize {
        h: usize,
        w: usize,
        new_h: usize,
        new_w: usize,
        interp: Interp,
    },
    /// Mirror an image of width `width` horizontally.
    HFlip { width: usize },
    /// Mirror an image of height `height` vertically.
    VFlip { height: usize },
    /// Keep the `w x h` window at `(x0, y0)`.
    Crop {
        x0: usize,
        y0: usize,
        w: usize,
        h: usize,
    },
    /// Pixel-wise `src_weight * src_value + dst_weight * pixel`.
    Blend {
        src_value: f64,
        src_weight: f64,
        dst_weight: f64,
    },
}

impl Transform {
    /// The coordinate mapping of the transform.
    pub fn affine(&self) -> bbox::Transform<f64> {
        match *self {
            Self::NoOp | Self::Blend { .. } => bbox::Transform::identity(),
            Self::Resize {
                h, w, new_h, new_w, ..
            } => bbox::Transform::scale(new_h as f64 / h as f64, new_w as f64 / w as f64),
            Self::HFlip { width } => bbox::Transform::hflip(width as f64),
            Self::VFlip { height } => bbox::Transform::vflip(height as f64),
            Self::Crop { x0, y0, .. } => bbox::Transform::translate(-(y0 as f64), -(x0 as f64)),
        }
    }

    pub fn apply_image(&self, image: &Image) -> Result<Image> {
        let output = match *self {
            Self::NoOp => image.clone(),
            Self::Resize {
                h,
                w,
                new_h,
                new_w,
                interp,
            } => {
                let (img_h, img_w, _) = image.dim();
                ensure!(
                    (img_h, img_w) == (h, w),
                    "resize expects a {}x{} image, but get {}x{}",
                    h,
                    w,
                    img_h,
                    img_w
                );
                image_ops::resize_image(image, new_h, new_w, interp)?
            }
            Self::HFlip { .. } => image.slice(s![.., ..;-1, ..]).to_owned(),
            Self::VFlip { .. } => image.slice(s![..;-1, .., ..]).to_owned(),
            Self::Crop { x0, y0, w, h } => image_ops::crop_image(image, x0, y0, w, h)?,
            Self::Blend {
                src_value,
                src_weight,
                dst_weight,
            } => image.mapv(|val| {
                let blended = src_weight * src_value + dst_weight * val as f64;
                blended.max(0.0).min(255.0) as u8
            }),
        };
        Ok(output)
    }

    /// Apply on a label map. Resizing always uses nearest neighbors.
    pub fn apply_segmentation(&self, map: &LabelMap) -> Result<LabelMap> {
        let output = match *self {
            Self::NoOp | Self::Blend { .. } => map.clone(),
            Self::Resize { new_h, new_w, .. } => {
                image_ops::resize_label_map(map, new_h, new_w, Interp::Nearest)?
            }
            Self::HFlip { .. } => map.slice(s![.., ..;-1]).to_owned(),
            Self::VFlip { .. } => map.slice(s![..;-1, ..]).to_owned(),
            Self::Crop { x0, y0, w, h } => image_ops::crop_label_map(map, x0, y0, w, h)?,
        };
        Ok(output)
    }

    pub fn apply_bitmask(&self, mask: &BitMask) -> Result<BitMask> {
        let map = image_ops::bitmask_to_label_map(mask);
        let map = self.apply_segmentation(&map)?;
        Ok(image_ops::label_map_to_bitmask(&map))
    }

    /// Map `[x, y]` points in place.
    pub fn apply_coords(&self, points: &mut [[f64; 2]]) {
        let affine = self.affine();
        points
            .iter_mut()
            .for_each(|point| *point = affine.apply_xy(*point));
    }

    /// Map a box by its corners.
    pub fn apply_box(&self, rect: &TLBR<f64>) -> TLBR<f64> {
        rect.transform(&self.affine())
    }

    /// Map polygons given as `[x, y]` point lists.
    ///
    /// Cropping clips each polygon to the window and drops those falling
    /// outside of it.
    pub fn apply_polygons(&self, polygons: Vec<Vec<[f64; 2]>>) -> Vec<Vec<[f64; 2]>> {
        match *self {
            Self::Crop { x0, y0, w, h } => {
                let window = TLBR::from_tlhw([y0 as f64, x0 as f64, h as f64, w as f64]);
                polygons
                    .into_iter()
                    .map(|points| polygon::clip_to_rect(&points, &window))
                    .filter(|points| points.len() >= 3)
                    .map(|mut points| {
                        self.apply_coords(&mut points);
                        points
                    })
                    .collect()
            }
            _ => polygons
                .into_iter()
                .map(|mut points| {
                    self.apply_coords(&mut points);
                    points
                })
                .collect(),
        }
    }
}

/// The ordered sequence of transforms produced by one pass of an
/// augmentation pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformList(pub Vec<Transform>);

impl TransformList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transform: Transform) {
        self.0.push(transform);
    }

    pub fn extend(&mut self, other: TransformList) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The composed coordinate mapping.
    pub fn affine(&self) -> bbox::Transform<f64> {
        self.0
            .iter()
            .fold(bbox::Transform::identity(), |acc, transform| {
                &transform.affine() * &acc
            })
    }

    /// Check if the list mirrors left and right an odd number of times.
    pub fn flips_horizontally(&self) -> bool {
        let count = self
            .0
            .iter()
            .filter(|transform| matches!(transform, Transform::HFlip { .. }))
            .count();
        count % 2 == 1
    }

    pub fn apply_image(&self, image: &Image) -> Result<Image> {
        self.0
            .iter()
            .try_fold(image.clone(), |image, transform| transform.apply_image(&image))
    }

    pub fn apply_segmentation(&self, map: &LabelMap) -> Result<LabelMap> {
        self.0
            .iter()
            .try_fold(map.clone(), |map, transform| transform.apply_segmentation(&map))
    }

    pub fn apply_bitmask(&self, mask: &BitMask) -> Result<BitMask> {
        self.0
            .iter()
            .try_fold(mask.clone(), |mask, transform| transform.apply_bitmask(&mask))
    }

    pub fn apply_coords(&self, points: &mut [[f64; 2]]) {
        self.0
            .iter()
            .for_each(|transform| transform.apply_coords(points));
    }

    /// Map a box through each transform in turn, re-enclosing the corners at
    /// every step.
    pub fn apply_box(&self, rect: &TLBR<f64>) -> TLBR<f64> {
        self.0
            .iter()
            .fold(rect.clone(), |rect, transform| transform.apply_box(&rect))
    }

    pub fn apply_polygons(&self, polygons: Vec<Vec<[f64; 2]>>) -> Vec<Vec<[f64; 2]>> {
        self.0
            .iter()
            .fold(polygons, |polygons, transform| transform.apply_polygons(polygons))
    }
}

impl From<Vec<Transform>> for TransformList {
    fn from(transforms: Vec<Transform>) -> Self {
        Self(transforms)
    }
}
