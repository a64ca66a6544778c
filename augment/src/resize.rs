//! Resizing augmentations.

use crate::{common::*, image_ops, AugInput, Augmentation, Interp, Transform, TransformList};

/// How the target short edge length is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStyle {
    /// Pick one of the listed lengths.
    Choice,
    /// Pick uniformly within the inclusive `[min, max]` pair.
    Range,
}

impl Default for SampleStyle {
    fn default() -> Self {
        Self::Choice
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizeShortestEdgeInit {
    pub short_edge_length: Vec<usize>,
    pub max_size: usize,
    #[serde(default)]
    pub sample_style: SampleStyle,
    #[serde(default)]
    pub interp: Interp,
}

impl ResizeShortestEdgeInit {
    pub fn build(self) -> Result<ResizeShortestEdge> {
        let Self {
            short_edge_length,
            max_size,
            sample_style,
            interp,
        } = self;

        match sample_style {
            SampleStyle::Choice => ensure!(
                !short_edge_length.is_empty(),
                "short_edge_length must not be empty"
            ),
            SampleStyle::Range => {
                ensure!(
                    short_edge_length.len() == 2,
                    "short_edge_length must be a [min, max] pair in range style, but get {:?}",
                    short_edge_length
                );
                ensure!(
                    short_edge_length[0] <= short_edge_length[1],
                    "short_edge_length min must not exceed max"
                );
            }
        }
        ensure!(max_size > 0, "max_size must be positive");

        Ok(ResizeShortestEdge {
            short_edge_length,
            max_size,
            sample_style,
            interp,
        })
    }
}

/// Resize so that the shorter side matches a sampled length, while the
/// longer side does not exceed `max_size`.
#[derive(Debug, Clone)]
pub struct ResizeShortestEdge {
    short_edge_length: Vec<usize>,
    max_size: usize,
    sample_style: SampleStyle,
    interp: Interp,
}

impl ResizeShortestEdge {
    /// The output size of a `h x w` image when the short edge is resized to
    /// `short_edge_length`.
    pub fn output_shape(h: usize, w: usize, short_edge_length: usize, max_size: usize) -> HW<usize> {
        let (h, w) = (h as f64, w as f64);
        let size = short_edge_length as f64;
        let scale = size / h.min(w);
        let (mut new_h, mut new_w) = if h < w {
            (size, scale * w)
        } else {
            (scale * h, size)
        };

        let longer = new_h.max(new_w);
        if longer > max_size as f64 {
            let scale = max_size as f64 / longer;
            new_h *= scale;
            new_w *= scale;
        }

        HW::from_hw([(new_h + 0.5) as usize, (new_w + 0.5) as usize])
    }
}

impl Augmentation for ResizeShortestEdge {
    fn get_transform(&self, input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let [h, w] = image_ops::image_size(&input.image).hw();
        ensure!(h > 0 && w > 0, "cannot resize an empty image");

        let size = match self.sample_style {
            SampleStyle::Choice => *self
                .short_edge_length
                .choose(rng)
                .ok_or_else(|| format_err!("short_edge_length is empty"))?,
            SampleStyle::Range => {
                rng.gen_range(self.short_edge_length[0]..=self.short_edge_length[1])
            }
        };

        if size == 0 {
            return Ok(vec![Transform::NoOp].into());
        }

        let [new_h, new_w] = Self::output_shape(h, w, size, self.max_size).hw();
        Ok(vec![Transform::Resize {
            h,
            w,
            new_h,
            new_w,
            interp: self.interp,
        }]
        .into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EfficientDetResizeCropInit {
    /// The side length of the square target.
    pub size: usize,
    /// The range of the random factor on the target size.
    pub scale: (R64, R64),
    #[serde(default)]
    pub interp: Interp,
}

impl EfficientDetResizeCropInit {
    pub fn build(self) -> Result<EfficientDetResizeCrop> {
        let Self {
            size,
            scale: (lo, up),
            interp,
        } = self;

        ensure!(size > 0, "size must be positive");
        ensure!(lo > 0.0, "scale min must be positive");
        ensure!(lo <= up, "scale min must not exceed scale max");

        Ok(EfficientDetResizeCrop {
            size,
            scale: (lo.raw(), up.raw()),
            interp,
        })
    }
}

/// Resize to fit a randomly scaled square target while keeping the aspect
/// ratio, then randomly crop at most `size x size` from the result.
#[derive(Debug, Clone)]
pub struct EfficientDetResizeCrop {
    size: usize,
    scale: (f64, f64),
    interp: Interp,
}

impl Augmentation for EfficientDetResizeCrop {
    fn get_transform(&self, input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let [h, w] = image_ops::image_size(&input.image).hw();
        ensure!(h > 0 && w > 0, "cannot resize an empty image");

        let (lo, up) = self.scale;
        let factor = if lo < up { rng.gen_range(lo..up) } else { lo };
        let target = self.size as f64 * factor;
        let img_scale = (target / h as f64).min(target / w as f64);
        let scaled_h = ((h as f64 * img_scale) as usize).max(1);
        let scaled_w = ((w as f64 * img_scale) as usize).max(1);

        let offset_y = (scaled_h.saturating_sub(self.size) as f64 * rng.gen::<f64>()) as usize;
        let offset_x = (scaled_w.saturating_sub(self.size) as f64 * rng.gen::<f64>()) as usize;

        Ok(vec![
            Transform::Resize {
                h,
                w,
                new_h: scaled_h,
                new_w: scaled_w,
                interp: self.interp,
            },
            Transform::Crop {
                x0: offset_x,
                y0: offset_y,
                w: self.size.min(scaled_w - offset_x),
                h: self.size.min(scaled_h - offset_y),
            },
        ]
        .into())
    }
}
