use crate::{common::*, image_ops, AugInput, Augmentation, Transform, TransformList};

/// How the crop window size is derived from the image size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CropSize {
    /// A fixed ratio of the image size.
    Relative { h: R64, w: R64 },
    /// A ratio sampled uniformly within `[h, 1]` and `[w, 1]`.
    RelativeRange { h: R64, w: R64 },
    /// A fixed size in pixels, capped by the image size.
    Absolute { h: usize, w: usize },
    /// Sides sampled within `[min, max]` pixels, capped by the image size.
    AbsoluteRange { min: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomCropInit {
    pub size: CropSize,
}

impl RandomCropInit {
    pub fn build(self) -> Result<RandomCrop> {
        let Self { size } = self;

        match &size {
            CropSize::Relative { h, w } | CropSize::RelativeRange { h, w } => {
                ensure!(
                    *h > 0.0 && *h <= 1.0 && *w > 0.0 && *w <= 1.0,
                    "relative crop size must be within (0, 1]"
                );
            }
            CropSize::Absolute { h, w } => {
                ensure!(*h > 0 && *w > 0, "absolute crop size must be positive");
            }
            CropSize::AbsoluteRange { min, max } => {
                ensure!(*min > 0, "crop size min must be positive");
                ensure!(min <= max, "crop size min must not exceed max");
            }
        }

        Ok(RandomCrop { size })
    }
}

/// Crop a randomly placed window.
#[derive(Debug, Clone)]
pub struct RandomCrop {
    size: CropSize,
}

impl RandomCrop {
    fn crop_size(&self, h: usize, w: usize, rng: &mut dyn RngCore) -> (usize, usize) {
        let relative = |ratio: f64, len: usize| (len as f64 * ratio + 0.5) as usize;

        match self.size {
            CropSize::Relative { h: ch, w: cw } => (relative(ch.raw(), h), relative(cw.raw(), w)),
            CropSize::RelativeRange { h: ch, w: cw } => {
                let ch = ch.raw() + rng.gen::<f64>() * (1.0 - ch.raw());
                let cw = cw.raw() + rng.gen::<f64>() * (1.0 - cw.raw());
                (relative(ch, h), relative(cw, w))
            }
            CropSize::Absolute { h: ch, w: cw } => (ch.min(h), cw.min(w)),
            CropSize::AbsoluteRange { min, max } => {
                let ch = rng.gen_range(min.min(h)..=max.min(h));
                let cw = rng.gen_range(min.min(w)..=max.min(w));
                (ch, cw)
            }
        }
    }
}

impl Augmentation for RandomCrop {
    fn get_transform(&self, input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let [h, w] = image_ops::image_size(&input.image).hw();
        let (crop_h, crop_w) = self.crop_size(h, w, rng);
        ensure!(
            crop_h <= h && crop_w <= w,
            "crop size {}x{} exceeds image size {}x{}",
            crop_h,
            crop_w,
            h,
            w
        );

        let y0 = rng.gen_range(0..=(h - crop_h));
        let x0 = rng.gen_range(0..=(w - crop_w));
        Ok(vec![Transform::Crop {
            x0,
            y0,
            w: crop_w,
            h: crop_h,
        }]
        .into())
    }
}
