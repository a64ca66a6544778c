//! Ground-truth instance collections.

use crate::{common::*, polygon, Annotation, InstanceMasks, Keypoints, MaskFormat, Segmentation};

/// Boxes whose sides are not longer than this are regarded empty.
pub const DEFAULT_BOX_THRESHOLD: f64 = 1e-5;

/// Per-object ground truth of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Instances {
    /// The image size in pixels.
    pub image_size: HW<usize>,
    /// Boxes in absolute pixel units.
    pub gt_boxes: Vec<TLBR<f64>>,
    pub gt_classes: Vec<usize>,
    pub gt_masks: Option<InstanceMasks>,
    pub gt_keypoints: Option<Keypoints>,
}

impl Instances {
    /// Build the collection from annotations that are already remapped to
    /// the `image_size` coordinate space.
    ///
    /// Masks and keypoints are collected only if the first annotation has
    /// them, in which case every annotation must have them.
    pub fn from_annotations(
        annotations: &[Annotation],
        image_size: HW<usize>,
        mask_format: MaskFormat,
    ) -> Result<Self> {
        let gt_boxes: Vec<_> = annotations.iter().map(|ann| ann.rect()).try_collect()?;
        let gt_classes: Vec<_> = annotations.iter().map(|ann| ann.category_id).collect();

        let has_masks = matches!(annotations.first(), Some(ann) if ann.segmentation.is_some());
        let gt_masks = has_masks
            .then(|| build_masks(annotations, image_size, mask_format))
            .transpose()?;

        let has_keypoints = matches!(annotations.first(), Some(ann) if ann.keypoints.is_some());
        let gt_keypoints = has_keypoints
            .then(|| {
                let lists: Vec<Vec<f64>> = annotations
                    .iter()
                    .map(|ann| ann.keypoints.clone().unwrap_or_default())
                    .collect();
                Keypoints::from_flat(&lists)
            })
            .transpose()?;

        Ok(Self {
            image_size,
            gt_boxes,
            gt_classes,
            gt_masks,
            gt_keypoints,
        })
    }

    pub fn len(&self) -> usize {
        self.gt_boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep the instances whose flag is set.
    pub fn select(&self, keep: &[bool]) -> Self {
        assert_eq!(keep.len(), self.len(), "mask length mismatch");

        Self {
            image_size: self.image_size,
            gt_boxes: izip!(&self.gt_boxes, keep)
                .filter(|&(_, &keep)| keep)
                .map(|(rect, _)| rect.clone())
                .collect(),
            gt_classes: izip!(&self.gt_classes, keep)
                .filter(|&(_, &keep)| keep)
                .map(|(&class, _)| class)
                .collect(),
            gt_masks: self.gt_masks.as_ref().map(|masks| masks.select(keep)),
            gt_keypoints: self.gt_keypoints.as_ref().map(|kps| kps.select(keep)),
        }
    }

    /// Replace the boxes with the tight boxes of the masks.
    ///
    /// It fails if the collection carries no masks.
    pub fn recompute_boxes(&mut self) -> Result<()> {
        let masks = self
            .gt_masks
            .as_ref()
            .ok_or_else(|| format_err!("cannot recompute boxes without instance masks"))?;
        self.gt_boxes = masks.bounding_boxes();
        Ok(())
    }

    /// Drop instances with empty boxes or empty masks.
    pub fn filter_empty(self, box_threshold: f64) -> Self {
        let mut keep: Vec<bool> = self
            .gt_boxes
            .iter()
            .map(|rect| rect.is_nonempty(box_threshold))
            .collect();
        if let Some(masks) = &self.gt_masks {
            izip!(&mut keep, masks.nonempty()).for_each(|(keep, nonempty)| *keep &= nonempty);
        }

        if keep.iter().all(|&keep| keep) {
            return self;
        }

        debug!(
            "dropped {} empty instances",
            keep.iter().filter(|&&keep| !keep).count()
        );
        self.select(&keep)
    }

    /// Distinct classes in ascending order.
    pub fn distinct_classes(&self) -> Vec<usize> {
        let classes: BTreeSet<usize> = self.gt_classes.iter().copied().collect();
        classes.into_iter().collect()
    }
}

fn build_masks(
    annotations: &[Annotation],
    image_size: HW<usize>,
    mask_format: MaskFormat,
) -> Result<InstanceMasks> {
    let [h, w] = image_size.hw();

    let segmentations: Vec<&Segmentation> = annotations
        .iter()
        .map(|ann| {
            ann.segmentation
                .as_ref()
                .ok_or_else(|| format_err!("annotations must all carry segmentation or none"))
        })
        .try_collect()?;

    let masks = match mask_format {
        MaskFormat::Polygon => {
            let polygons: Vec<_> = segmentations
                .into_iter()
                .map(|segm| -> Result<_> {
                    match segm {
                        Segmentation::Polygons(polygons) => {
                            polygons.iter().try_for_each(|p| polygon::validate(p))?;
                            Ok(polygons.clone())
                        }
                        _ => bail!("polygon mask format requires polygon segmentation"),
                    }
                })
                .try_collect()?;
            InstanceMasks::Polygons(polygons)
        }
        MaskFormat::Bitmask => {
            let masks: Vec<_> = segmentations
                .into_iter()
                .map(|segm| -> Result<_> {
                    let mask = match segm {
                        Segmentation::Polygons(polygons) => polygon::rasterize(polygons, h, w),
                        Segmentation::Rle(rle) => rle.decode()?,
                        Segmentation::Bitmask(mask) => mask.clone(),
                    };
                    ensure!(
                        mask.dim() == (h, w),
                        "mask size {:?} does not match image size {:?}",
                        mask.dim(),
                        (h, w)
                    );
                    Ok(mask)
                })
                .try_collect()?;
            InstanceMasks::BitMasks(masks)
        }
    };

    Ok(masks)
}
