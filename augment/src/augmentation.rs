//! The augmentation abstraction and its sequential composition.

use crate::{common::*, AugInput, TransformList};
use std::sync::Arc;

/// A policy that samples a concrete transform for a given input.
pub trait Augmentation
where
    Self: Debug + Send + Sync,
{
    /// Sample the transform to apply on `input`.
    fn get_transform(&self, input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList>;
}

/// Augmentations applied one after another, each seeing the output of the
/// previous one.
#[derive(Debug, Clone, Default)]
pub struct AugmentationList {
    augmentations: Vec<Arc<dyn Augmentation>>,
}

impl AugmentationList {
    pub fn new(augmentations: Vec<Arc<dyn Augmentation>>) -> Self {
        Self { augmentations }
    }

    pub fn len(&self) -> usize {
        self.augmentations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.augmentations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Augmentation>> {
        self.augmentations.iter()
    }

    /// Transform `input` in place and return the concrete transforms.
    pub fn apply(&self, input: &mut AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let mut applied = TransformList::new();

        for augmentation in &self.augmentations {
            let transforms = augmentation
                .get_transform(input, rng)
                .with_context(|| format!("failed to sample {:?}", augmentation))?;
            input.transform(&transforms)?;
            applied.extend(transforms);
        }

        trace!("applied transforms {:?}", applied);
        Ok(applied)
    }
}

impl Augmentation for AugmentationList {
    fn get_transform(&self, input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let mut input = input.clone();
        self.apply(&mut input, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Image, RandomFlipInit, ResizeShortestEdgeInit, SampleStyle, Transform};

    #[test]
    fn list_records_each_step() -> Result<()> {
        let augs = AugmentationList::new(vec![
            Arc::new(
                ResizeShortestEdgeInit {
                    short_edge_length: vec![20],
                    max_size: 1000,
                    sample_style: SampleStyle::Choice,
                    interp: Default::default(),
                }
                .build()?,
            ),
            Arc::new(
                RandomFlipInit {
                    prob: r64(1.0),
                    horizontal: true,
                    vertical: false,
                }
                .build()?,
            ),
        ]);

        let mut input = AugInput::new(Image::zeros((10, 15, 3)), None)?;
        let mut rng = StdRng::seed_from_u64(0);
        let transforms = input.apply_augmentations(&augs, &mut rng)?;

        assert_eq!(input.image.dim(), (20, 30, 3));
        assert_eq!(
            transforms.0,
            vec![
                Transform::Resize {
                    h: 10,
                    w: 15,
                    new_h: 20,
                    new_w: 30,
                    interp: Default::default(),
                },
                Transform::HFlip { width: 30 },
            ]
        );
        Ok(())
    }
}
