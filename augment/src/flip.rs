use crate::{common::*, image_ops, AugInput, Augmentation, Transform, TransformList};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomFlipInit {
    pub prob: R64,
    pub horizontal: bool,
    pub vertical: bool,
}

impl RandomFlipInit {
    pub fn build(self) -> Result<RandomFlip> {
        let Self {
            prob,
            horizontal,
            vertical,
        } = self;

        ensure!(
            (0.0..=1.0).contains(&prob.raw()),
            "prob must be within [0, 1], but get {}",
            prob
        );
        ensure!(
            horizontal ^ vertical,
            "exactly one of horizontal and vertical flip must be enabled"
        );

        Ok(RandomFlip {
            prob: prob.raw(),
            horizontal,
        })
    }
}

impl Default for RandomFlipInit {
    fn default() -> Self {
        Self {
            prob: r64(0.5),
            horizontal: true,
            vertical: false,
        }
    }
}

/// Flip the image with probability `prob`.
#[derive(Debug, Clone)]
pub struct RandomFlip {
    prob: f64,
    horizontal: bool,
}

impl Augmentation for RandomFlip {
    fn get_transform(&self, input: &AugInput, rng: &mut dyn RngCore) -> Result<TransformList> {
        let [h, w] = image_ops::image_size(&input.image).hw();
        let transform = if rng.gen::<f64>() < self.prob {
            if self.horizontal {
                Transform::HFlip { width: w }
            } else {
                Transform::VFlip { height: h }
            }
        } else {
            Transform::NoOp
        };
        Ok(vec![transform].into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Image;

    #[test]
    fn flip_direction() -> Result<()> {
        let input = AugInput::new(Image::zeros((3, 5, 3)), None)?;
        let mut rng = StdRng::seed_from_u64(1);

        let hflip = RandomFlipInit {
            prob: r64(1.0),
            ..Default::default()
        }
        .build()?;
        assert_eq!(
            hflip.get_transform(&input, &mut rng)?.0,
            vec![Transform::HFlip { width: 5 }]
        );

        let vflip = RandomFlipInit {
            prob: r64(1.0),
            horizontal: false,
            vertical: true,
        }
        .build()?;
        assert_eq!(
            vflip.get_transform(&input, &mut rng)?.0,
            vec![Transform::VFlip { height: 3 }]
        );

        let never = RandomFlipInit {
            prob: r64(0.0),
            ..Default::default()
        }
        .build()?;
        assert_eq!(never.get_transform(&input, &mut rng)?.0, vec![Transform::NoOp]);
        Ok(())
    }

    #[test]
    fn both_directions_is_rejected() {
        let init = RandomFlipInit {
            prob: r64(0.5),
            horizontal: true,
            vertical: true,
        };
        assert!(init.build().is_err());
    }
}
