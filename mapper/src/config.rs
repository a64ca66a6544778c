//! Mapper configuration format.

use crate::{common::*, image_io::ImageFormat, policy::AnnType};
use augment::{RandomBrightnessInit, RandomCropInit, SampleStyle};

pub use dataloader::*;
pub use input::*;

/// The main mapper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// If set, samples carry the annotation type of their dataset and
    /// image-level labels.
    #[serde(default)]
    pub with_image_labels: bool,
    /// Debugging aid. Every record is tagged as dataset 0 and image-level
    /// labels are derived from the boxes when absent.
    #[serde(default)]
    pub is_debug: bool,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub dataloader: DataLoaderConfig,
    #[serde(default)]
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod input {
    use super::*;

    /// Image and augmentation options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct InputConfig {
        /// The color format of the output image.
        #[serde(default)]
        pub format: ImageFormat,
        /// The storage format of instance masks.
        #[serde(default)]
        pub mask_format: MaskFormat,
        /// Short edge lengths used in training.
        #[serde(default = "default_min_size_train")]
        pub min_size_train: Vec<usize>,
        #[serde(default = "default_max_size")]
        pub max_size_train: usize,
        #[serde(default)]
        pub min_size_train_sampling: SampleStyle,
        /// Short edge length used in inference. Zero disables resizing.
        #[serde(default = "default_min_size_test")]
        pub min_size_test: usize,
        #[serde(default = "default_max_size")]
        pub max_size_test: usize,
        #[serde(default)]
        pub random_flip: FlipMode,
        /// If set, randomly crop before resizing in training.
        #[serde(default)]
        pub crop: Option<RandomCropInit>,
        /// If set, replace the default resizing with a custom augmentation.
        #[serde(default)]
        pub custom_aug: Option<CustomAug>,
        /// The square target size of EfficientDet-style resizing in training.
        #[serde(default = "default_target_size")]
        pub train_size: usize,
        /// The square target size of EfficientDet-style resizing in inference.
        #[serde(default = "default_target_size")]
        pub test_size: usize,
        /// The random scale range of EfficientDet-style resizing.
        #[serde(default = "default_scale_range")]
        pub scale_range: (R64, R64),
        /// If set, randomly scale pixel intensities in training.
        #[serde(default)]
        pub brightness: Option<RandomBrightnessInit>,
    }

    impl Default for InputConfig {
        fn default() -> Self {
            Self {
                format: Default::default(),
                mask_format: Default::default(),
                min_size_train: default_min_size_train(),
                max_size_train: default_max_size(),
                min_size_train_sampling: Default::default(),
                min_size_test: default_min_size_test(),
                max_size_test: default_max_size(),
                random_flip: Default::default(),
                crop: None,
                custom_aug: None,
                train_size: default_target_size(),
                test_size: default_target_size(),
                scale_range: default_scale_range(),
                brightness: None,
            }
        }
    }

    /// The random flip direction in training.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FlipMode {
        None,
        Horizontal,
        Vertical,
    }

    impl Default for FlipMode {
        fn default() -> Self {
            Self::Horizontal
        }
    }

    /// Custom resizing policies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum CustomAug {
        ResizeShortestEdge,
        EfficientDetResizeCrop,
    }

    fn default_min_size_train() -> Vec<usize> {
        vec![800]
    }

    fn default_min_size_test() -> usize {
        800
    }

    fn default_max_size() -> usize {
        1333
    }

    fn default_target_size() -> usize {
        640
    }

    fn default_scale_range() -> (R64, R64) {
        (r64(0.1), r64(2.0))
    }
}

/// Which ground truth fields the model consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub mask_on: bool,
    #[serde(default)]
    pub keypoint_on: bool,
    /// If set, records carry precomputed proposals.
    #[serde(default)]
    pub load_proposals: bool,
}

mod dataloader {
    use super::*;

    /// Multi-dataset loading options. Per-dataset lists are indexed by the
    /// `dataset_source` tag of records.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct DataLoaderConfig {
        /// The annotation type of each dataset.
        #[serde(default)]
        pub dataset_ann: Vec<AnnType>,
        /// If set, each dataset has its own resizing policy in training.
        #[serde(default)]
        pub use_diff_bs_size: bool,
        /// Per-dataset scale ranges for EfficientDet-style resizing.
        #[serde(default)]
        pub dataset_input_scale: Vec<(R64, R64)>,
        /// Per-dataset target sizes for EfficientDet-style resizing.
        #[serde(default)]
        pub dataset_input_size: Vec<usize>,
        /// Per-dataset short edge `[min, max]` ranges.
        #[serde(default)]
        pub dataset_min_sizes: Vec<Vec<usize>>,
        /// Per-dataset long edge limits.
        #[serde(default)]
        pub dataset_max_sizes: Vec<usize>,
        /// Load images from a tar archive. Not supported.
        #[serde(default)]
        pub use_tar_dataset: bool,
        #[serde(default)]
        pub tarfile_path: Option<PathBuf>,
        #[serde(default)]
        pub tar_index_dir: Option<PathBuf>,
    }
}

/// Precomputed proposal options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetsConfig {
    #[serde(default = "default_topk_train")]
    pub precomputed_proposal_topk_train: usize,
    #[serde(default = "default_topk_test")]
    pub precomputed_proposal_topk_test: usize,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            precomputed_proposal_topk_train: default_topk_train(),
            precomputed_proposal_topk_test: default_topk_test(),
        }
    }
}

fn default_topk_train() -> usize {
    2000
}

fn default_topk_test() -> usize {
    1000
}

/// Dataset metadata needed for keypoint flipping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub keypoint_names: Vec<String>,
    /// Pairs of keypoint names swapped by horizontal flips.
    #[serde(default)]
    pub keypoint_flip_map: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() -> Result<()> {
        let config: Config = json5::from_str("{}")?;
        assert!(!config.with_image_labels);
        assert_eq!(config.input.min_size_train, vec![800]);
        assert_eq!(config.input.random_flip, FlipMode::Horizontal);
        assert_eq!(config.datasets.precomputed_proposal_topk_train, 2000);
        Ok(())
    }

    #[test]
    fn parse_multi_dataset_config() -> Result<()> {
        let text = r#"{
            with_image_labels: true,
            input: {
                format: "BGR",
                mask_format: "bitmask",
                custom_aug: "EfficientDetResizeCrop",
                crop: { size: { type: "relative_range", h: 0.9, w: 0.9 } },
            },
            dataloader: {
                dataset_ann: ["box", "image"],
                use_diff_bs_size: true,
                dataset_input_scale: [[0.1, 2.0], [0.5, 1.5]],
                dataset_input_size: [896, 448],
            },
        }"#;
        let config: Config = json5::from_str(text)?;
        assert_eq!(config.input.format, ImageFormat::Bgr);
        assert_eq!(config.input.mask_format, MaskFormat::Bitmask);
        assert_eq!(config.input.custom_aug, Some(CustomAug::EfficientDetResizeCrop));
        assert!(config.input.crop.is_some());
        assert_eq!(config.dataloader.dataset_ann, vec![AnnType::Box, AnnType::Image]);
        assert_eq!(config.dataloader.dataset_input_size, vec![896, 448]);
        Ok(())
    }

    #[test]
    fn unknown_custom_aug_is_rejected() {
        let text = r#"{ input: { custom_aug: "RandomErase" } }"#;
        assert!(json5::from_str::<Config>(text).is_err());
    }
}
