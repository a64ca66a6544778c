use crate::{
    common::*,
    image_ops::{Image, LabelMap},
    AugmentationList, TransformList,
};

/// The image and the optional semantic segmentation map that an
/// augmentation pipeline transforms jointly.
#[derive(Debug, Clone)]
pub struct AugInput {
    pub image: Image,
    pub sem_seg: Option<LabelMap>,
}

impl AugInput {
    pub fn new(image: Image, sem_seg: Option<LabelMap>) -> Result<Self> {
        if let Some(sem_seg) = &sem_seg {
            let (h, w, _) = image.dim();
            ensure!(
                sem_seg.dim() == (h, w),
                "segmentation map size {:?} does not match image size {:?}",
                sem_seg.dim(),
                (h, w)
            );
        }
        Ok(Self { image, sem_seg })
    }

    /// Apply a concrete transform in place.
    pub fn transform(&mut self, transforms: &TransformList) -> Result<()> {
        self.image = transforms.apply_image(&self.image)?;
        if let Some(sem_seg) = &self.sem_seg {
            self.sem_seg = Some(transforms.apply_segmentation(sem_seg)?);
        }
        Ok(())
    }

    /// Run the pipeline and return the transforms it applied.
    pub fn apply_augmentations(
        &mut self,
        augmentations: &AugmentationList,
        rng: &mut dyn RngCore,
    ) -> Result<TransformList> {
        augmentations.apply(self, rng)
    }
}
