//! The per-sample dataset mapper.

use crate::{
    augmentation::{build_augmentation, build_custom_augmentation, build_dataset_augmentations},
    common::*,
    config::Config,
    image_io::{self, DiskImageReader, ImageFormat, ImageReader},
    policy::{AnnType, AnnotationPolicy, AugmentationPolicy},
    proposals,
    record::DatasetRecord,
    remap,
    sample::Sample,
};
use augment::AugInput;
use label::DEFAULT_BOX_THRESHOLD;

#[derive(Debug, Clone)]
pub struct MapperInit {
    /// Training mode augments randomly and keeps annotations.
    pub is_train: bool,
    /// The shared augmentation pipeline.
    pub augmentations: AugmentationList,
    pub image_format: ImageFormat,
    pub use_instance_mask: bool,
    pub instance_mask_format: MaskFormat,
    pub use_keypoint: bool,
    /// Replace boxes with the tight boxes of instance masks.
    pub recompute_boxes: bool,
    pub keypoint_hflip_indices: Option<Vec<usize>>,
    /// If set, map precomputed proposals and keep this many of them.
    pub proposal_topk: Option<usize>,
    /// Attach the annotation type of the dataset to samples.
    pub with_ann_type: bool,
    /// The annotation type of each dataset source.
    pub dataset_ann: Vec<AnnType>,
    /// Select per-dataset pipelines in training.
    pub use_diff_bs_size: bool,
    /// The per-dataset pipelines, indexed by dataset source.
    pub dataset_augs: Vec<AugmentationList>,
    pub is_debug: bool,
    pub use_tar_dataset: bool,
}

impl MapperInit {
    /// Resolve the mapper options from a configuration.
    pub fn from_config(config: &Config, is_train: bool) -> Result<Self> {
        let input = &config.input;
        let model = &config.model;
        let loader = &config.dataloader;

        let mut augmentations = match input.custom_aug {
            Some(custom_aug) => {
                build_custom_augmentation(config, custom_aug, is_train, Default::default())?
            }
            None => build_augmentation(config, is_train)?,
        };

        let crop_enabled = is_train && input.crop.is_some();
        if is_train {
            if let Some(crop) = &input.crop {
                augmentations.insert(0, Arc::new(crop.clone().build()?));
            }
            if let Some(brightness) = &input.brightness {
                augmentations.push(Arc::new(brightness.clone().build()?));
            }
        }

        let keypoint_hflip_indices = model
            .keypoint_on
            .then(|| {
                remap::create_keypoint_hflip_indices(
                    &config.metadata.keypoint_names,
                    &config.metadata.keypoint_flip_map,
                )
            })
            .transpose()?;

        let proposal_topk = model.load_proposals.then(|| {
            if is_train {
                config.datasets.precomputed_proposal_topk_train
            } else {
                config.datasets.precomputed_proposal_topk_test
            }
        });

        let dataset_augs = if loader.use_diff_bs_size && is_train {
            build_dataset_augmentations(config)?
        } else {
            vec![]
        };

        Ok(Self {
            is_train,
            augmentations: AugmentationList::new(augmentations),
            image_format: input.format,
            use_instance_mask: model.mask_on,
            instance_mask_format: input.mask_format,
            use_keypoint: model.keypoint_on,
            recompute_boxes: crop_enabled && model.mask_on,
            keypoint_hflip_indices,
            proposal_topk,
            with_ann_type: config.with_image_labels,
            dataset_ann: loader.dataset_ann.clone(),
            use_diff_bs_size: loader.use_diff_bs_size,
            dataset_augs,
            is_debug: config.is_debug,
            use_tar_dataset: loader.use_tar_dataset,
        })
    }

    /// Build a mapper that reads images from disk.
    pub fn build(self) -> Result<DatasetMapper> {
        self.build_with_reader(Arc::new(DiskImageReader))
    }

    pub fn build_with_reader(self, reader: Arc<dyn ImageReader>) -> Result<DatasetMapper> {
        let Self {
            is_train,
            augmentations,
            image_format,
            use_instance_mask,
            instance_mask_format,
            use_keypoint,
            recompute_boxes,
            keypoint_hflip_indices,
            proposal_topk,
            with_ann_type,
            dataset_ann,
            use_diff_bs_size,
            dataset_augs,
            is_debug,
            use_tar_dataset,
        } = self;

        ensure!(
            !use_tar_dataset,
            "loading images from tar archives is not supported"
        );

        let augmentation_policy = if use_diff_bs_size && is_train {
            ensure!(
                !dataset_augs.is_empty(),
                "use_diff_bs_size is set, but no per-dataset pipelines are given"
            );
            AugmentationPolicy::PerDataset(dataset_augs)
        } else {
            AugmentationPolicy::Shared(augmentations)
        };

        let annotation_policy = if with_ann_type {
            ensure!(
                !dataset_ann.is_empty(),
                "with_ann_type is set, but dataset_ann is empty"
            );
            AnnotationPolicy::Typed(dataset_ann)
        } else {
            AnnotationPolicy::Untyped
        };

        if let Some(indices) = &keypoint_hflip_indices {
            ensure!(
                indices.iter().all(|&index| index < indices.len()),
                "keypoint flip indices {:?} are not a permutation",
                indices
            );
        }

        info!(
            "built {} mapper with {} augmentation policy",
            if is_train { "training" } else { "inference" },
            match &augmentation_policy {
                AugmentationPolicy::Shared(_) => "shared",
                AugmentationPolicy::PerDataset(_) => "per-dataset",
            }
        );

        Ok(DatasetMapper {
            is_train,
            augmentation_policy,
            annotation_policy,
            reader,
            image_format,
            use_instance_mask,
            instance_mask_format,
            use_keypoint,
            recompute_boxes,
            keypoint_hflip_indices,
            proposal_topk,
            is_debug,
        })
    }
}

/// Maps dataset records into augmented samples.
///
/// The mapper is immutable once built and can be shared across threads.
#[derive(Debug, Clone)]
pub struct DatasetMapper {
    is_train: bool,
    augmentation_policy: AugmentationPolicy,
    annotation_policy: AnnotationPolicy,
    reader: Arc<dyn ImageReader>,
    image_format: ImageFormat,
    use_instance_mask: bool,
    instance_mask_format: MaskFormat,
    use_keypoint: bool,
    recompute_boxes: bool,
    keypoint_hflip_indices: Option<Vec<usize>>,
    proposal_topk: Option<usize>,
    is_debug: bool,
}

impl DatasetMapper {
    pub fn is_train(&self) -> bool {
        self.is_train
    }

    pub fn augmentation_policy(&self) -> &AugmentationPolicy {
        &self.augmentation_policy
    }

    pub fn annotation_policy(&self) -> &AnnotationPolicy {
        &self.annotation_policy
    }

    /// Map a record with a freshly seeded random generator.
    pub fn map(&self, record: &DatasetRecord) -> Result<Sample> {
        self.map_with_rng(record, &mut StdRng::from_entropy())
    }

    /// Map a record, drawing augmentation parameters from `rng`.
    pub fn map_with_rng<R>(&self, record: &DatasetRecord, rng: &mut R) -> Result<Sample>
    where
        R: Rng,
    {
        self.map_record(record, rng)
            .with_context(|| format!("failed to map record '{}'", record.display_name()))
    }

    fn map_record(&self, record: &DatasetRecord, rng: &mut dyn RngCore) -> Result<Sample> {
        let name = record.display_name();

        // read
        let image = self.reader.read_image(&record.image, self.image_format)?;
        image_io::check_image_size(&image, record.height, record.width, &name)?;
        let (orig_h, orig_w, _) = image.dim();

        let sem_seg = record
            .sem_seg_file_name
            .as_ref()
            .map(|path| self.reader.read_label_map(path))
            .transpose()?;

        let dataset_source = if self.is_debug {
            Some(0)
        } else {
            record.dataset_source
        };
        let not_full_labeled = self.annotation_policy.not_full_labeled(dataset_source)?;

        // augment
        let augmentations = self.augmentation_policy.select(dataset_source)?;
        let mut input = AugInput::new(image, sem_seg)?;
        let transforms = augmentations.apply(&mut input, rng)?;
        let AugInput { image, sem_seg } = input;

        let (h, w, _) = image.dim();
        let image_size = HW::from_hw([h, w]);
        let image = image.permuted_axes([2, 0, 1]).as_standard_layout().into_owned();
        let sem_seg = sem_seg.map(|map| map.mapv(i64::from));

        let proposals = match (self.proposal_topk, &record.proposals) {
            (Some(topk), Some(record_proposals)) => Some(proposals::transform_proposals(
                record_proposals,
                &transforms,
                image_size,
                topk,
            )?),
            _ => None,
        };

        let mut sample = Sample {
            file_name: record.file_name().map(Path::to_path_buf),
            image_id: record.image_id,
            height: record.height.unwrap_or(orig_h),
            width: record.width.unwrap_or(orig_w),
            dataset_source,
            image,
            sem_seg,
            instances: None,
            proposals,
            pos_category_ids: record.pos_category_ids.clone(),
            ann_type: None,
            not_full_labeled,
        };

        if !self.is_train {
            return Ok(sample);
        }

        // annotations
        sample.instances = record
            .annotations
            .as_ref()
            .map(|annotations| self.build_instances(annotations, &transforms, image_size))
            .transpose()?;

        if let Some(ann_type) = self.annotation_policy.ann_type(dataset_source)? {
            if sample.pos_category_ids.is_none() {
                sample.pos_category_ids = Some(vec![]);
            }
            sample.ann_type = Some(ann_type);
        }

        let no_labels = sample
            .pos_category_ids
            .as_ref()
            .map_or(true, |ids| ids.is_empty());
        if self.is_debug && no_labels {
            let classes = sample
                .instances
                .as_ref()
                .map(|instances| instances.distinct_classes())
                .unwrap_or_default();
            sample.pos_category_ids = Some(classes);
        }

        trace!(
            "mapped '{}' to {}x{} with {} instances",
            name,
            h,
            w,
            sample.instances.as_ref().map_or(0, |instances| instances.len())
        );

        Ok(sample)
    }

    fn build_instances(
        &self,
        annotations: &[Annotation],
        transforms: &TransformList,
        image_size: HW<usize>,
    ) -> Result<Instances> {
        let hflip_indices = self.keypoint_hflip_indices.as_deref();

        let remapped: Vec<Annotation> = annotations
            .iter()
            .enumerate()
            .map(|(index, ann)| -> Result<_> {
                let ann = Annotation {
                    segmentation: ann.segmentation.clone().filter(|_| self.use_instance_mask),
                    keypoints: ann.keypoints.clone().filter(|_| self.use_keypoint),
                    ..*ann
                };
                let ann =
                    remap::transform_instance_annotation(&ann, transforms, image_size, hflip_indices)
                        .with_context(|| format!("invalid annotation at index {}", index))?;
                Ok(ann)
            })
            .try_collect()?;

        let annotations: Vec<Annotation> = remapped.into_iter().filter(|ann| !ann.iscrowd).collect();
        let mut instances =
            Instances::from_annotations(&annotations, image_size, self.instance_mask_format)?;

        if self.recompute_boxes && !instances.is_empty() {
            instances.recompute_boxes()?;
        }

        Ok(instances.filter_empty(DEFAULT_BOX_THRESHOLD))
    }
}
