//! Augmentation pipelines built from the configuration.

use crate::{
    common::*,
    config::{Config, CustomAug, FlipMode},
};
use augment::{
    Augmentation, EfficientDetResizeCropInit, RandomFlipInit, ResizeShortestEdgeInit, SampleStyle,
};

/// Replacements of configured resizing parameters, used to build
/// per-dataset pipelines.
#[derive(Debug, Clone, Default)]
pub struct ResizeOverrides {
    pub scale: Option<(R64, R64)>,
    pub size: Option<usize>,
    pub min_size: Option<Vec<usize>>,
    pub max_size: Option<usize>,
}

/// The default pipeline: shortest edge resizing, followed by a random flip
/// in training.
pub fn build_augmentation(config: &Config, is_train: bool) -> Result<Vec<Arc<dyn Augmentation>>> {
    let input = &config.input;
    let resize = if is_train {
        ResizeShortestEdgeInit {
            short_edge_length: input.min_size_train.clone(),
            max_size: input.max_size_train,
            sample_style: input.min_size_train_sampling,
            interp: Default::default(),
        }
    } else {
        ResizeShortestEdgeInit {
            short_edge_length: vec![input.min_size_test],
            max_size: input.max_size_test,
            sample_style: SampleStyle::Choice,
            interp: Default::default(),
        }
    };

    let mut augmentations: Vec<Arc<dyn Augmentation>> = vec![Arc::new(resize.build()?)];

    if is_train {
        let flip = match input.random_flip {
            FlipMode::None => None,
            FlipMode::Horizontal => Some(RandomFlipInit::default()),
            FlipMode::Vertical => Some(RandomFlipInit {
                horizontal: false,
                vertical: true,
                ..Default::default()
            }),
        };
        if let Some(flip) = flip {
            augmentations.push(Arc::new(flip.build()?));
        }
    }

    Ok(augmentations)
}

/// The pipeline of the configured custom resizing policy, followed by a
/// horizontal flip in training.
pub fn build_custom_augmentation(
    config: &Config,
    custom_aug: CustomAug,
    is_train: bool,
    overrides: ResizeOverrides,
) -> Result<Vec<Arc<dyn Augmentation>>> {
    let input = &config.input;
    let ResizeOverrides {
        scale,
        size,
        min_size,
        max_size,
    } = overrides;

    let resize: Arc<dyn Augmentation> = match custom_aug {
        CustomAug::ResizeShortestEdge => {
            let init = if is_train {
                ResizeShortestEdgeInit {
                    short_edge_length: min_size.unwrap_or_else(|| input.min_size_train.clone()),
                    max_size: max_size.unwrap_or(input.max_size_train),
                    sample_style: input.min_size_train_sampling,
                    interp: Default::default(),
                }
            } else {
                ResizeShortestEdgeInit {
                    short_edge_length: vec![input.min_size_test],
                    max_size: input.max_size_test,
                    sample_style: SampleStyle::Choice,
                    interp: Default::default(),
                }
            };
            Arc::new(init.build()?)
        }
        CustomAug::EfficientDetResizeCrop => {
            let init = if is_train {
                EfficientDetResizeCropInit {
                    size: size.unwrap_or(input.train_size),
                    scale: scale.unwrap_or(input.scale_range),
                    interp: Default::default(),
                }
            } else {
                EfficientDetResizeCropInit {
                    size: input.test_size,
                    scale: (r64(1.0), r64(1.0)),
                    interp: Default::default(),
                }
            };
            Arc::new(init.build()?)
        }
    };

    let mut augmentations = vec![resize];
    if is_train {
        augmentations.push(Arc::new(RandomFlipInit::default().build()?));
    }
    Ok(augmentations)
}

/// One training pipeline per dataset source.
pub fn build_dataset_augmentations(config: &Config) -> Result<Vec<AugmentationList>> {
    let loader = &config.dataloader;
    let custom_aug = config.input.custom_aug.ok_or_else(|| {
        format_err!("per-dataset pipelines require input.custom_aug to be set")
    })?;

    let overrides: Vec<ResizeOverrides> = match custom_aug {
        CustomAug::EfficientDetResizeCrop => {
            ensure!(
                loader.dataset_input_scale.len() == loader.dataset_input_size.len(),
                "dataset_input_scale has {} entries, but dataset_input_size has {}",
                loader.dataset_input_scale.len(),
                loader.dataset_input_size.len()
            );
            izip!(&loader.dataset_input_scale, &loader.dataset_input_size)
                .map(|(&scale, &size)| ResizeOverrides {
                    scale: Some(scale),
                    size: Some(size),
                    ..Default::default()
                })
                .collect()
        }
        CustomAug::ResizeShortestEdge => {
            ensure!(
                loader.dataset_min_sizes.len() == loader.dataset_max_sizes.len(),
                "dataset_min_sizes has {} entries, but dataset_max_sizes has {}",
                loader.dataset_min_sizes.len(),
                loader.dataset_max_sizes.len()
            );
            izip!(&loader.dataset_min_sizes, &loader.dataset_max_sizes)
                .map(|(min_size, &max_size)| ResizeOverrides {
                    min_size: Some(min_size.clone()),
                    max_size: Some(max_size),
                    ..Default::default()
                })
                .collect()
        }
    };
    ensure!(
        !overrides.is_empty(),
        "per-dataset pipelines are enabled, but no dataset sizes are configured"
    );

    overrides
        .into_iter()
        .enumerate()
        .map(|(index, overrides)| -> Result<_> {
            let augmentations = build_custom_augmentation(config, custom_aug, true, overrides)
                .with_context(|| format!("invalid augmentation for dataset {}", index))?;
            Ok(AugmentationList::new(augmentations))
        })
        .try_collect()
}
