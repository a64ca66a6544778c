//! Photometric augmentations. They leave the geometry untouched.

use crate::{common::*, AugInput, Augmentation, Transform, TransformList};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomBrightnessInit {
    pub intensity_min: R64,
    pub intensity_max: R64,
}

impl RandomBrightnessInit {
    pub fn build(self) -> Result<RandomBrightness> {
        let Self {
            intensity_min,
            intensity_max,
        } = self;

        ensure!(intensity_min >= 0.0, "intensity_min must be non-negative");
        ensure!(
            intensity_min <= intensity_max,
            "intensity_min must not exceed intensity_max"
        );

        Ok(RandomBrightness {
            intensity_min: intensity_min.raw(),
            intensity_max: intensity_max.raw(),
        })
    }
}

/// Scale pixel intensities by a random factor.
#[derive(Debug, Clone)]
pub struct RandomBrightness {
    intensity_min: f64,
    intensity_max: f64,
}

impl Augmentation for RandomBrightness {
    fn get_transform(&self, _input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let weight = if self.intensity_min < self.intensity_max {
            rng.gen_range(self.intensity_min..self.intensity_max)
        } else {
            self.intensity_min
        };

        Ok(vec![Transform::Blend {
            src_value: 0.0,
            src_weight: 1.0 - weight,
            dst_weight: weight,
        }]
        .into())
    }
}
